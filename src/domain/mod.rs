/// Pure game rules: geometry, vision, guards, entities, links and motion.
/// No I/O and no knowledge of levels or the terminal.

pub mod entity;
pub mod geom;
pub mod guard;
pub mod links;
pub mod physics;
pub mod vision;

/// Events emitted during a simulation step.
/// The front end consumes these for the message line and the log.

use crate::domain::entity::PlayerId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PlayerCaught { guard: usize },
    PlayerPunished { player: PlayerId },
    PlayerSentHome { player: PlayerId },
    KeyPicked,
    KeyDropped,
    ChestOpened,
    TrapSprung { victim: PlayerId },
    TrapCured { victim: PlayerId },
    FreezeExpired { player: PlayerId },
    LevelCleared,
}

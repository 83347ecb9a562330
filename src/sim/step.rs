/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Player motion (P1 → P2)
///   2. Status timers (freeze countdown, after the motion it held back)
///   3. Trigger sampling (switches / zones read their presser's box)
///   4. Link + signal aggregation
///   5. Status signals (trap / cure on the presser's partner)
///   6. Dynamic walls follow their link
///   7. Guards: activation → update → detection of P1
///   8. Goal chain (key → chest → pod)
///   9. Win check
///
/// Everything from 3 on reads this tick's positions, so a wall opens and a
/// guard goes dark on the same tick its switch is pressed. Only P1 is hunted.

use crate::domain::entity::{FrameInput, GoalStage, PlayerId};
use crate::domain::links::{self, Signal};
use crate::domain::physics::{self, MotionOutcome};
use super::event::GameEvent;
use super::world::{Phase, WorldState};

const MESSAGE_TICKS: u32 = 90;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.tick_message();

    resolve_player_motion(world, input, &mut events);
    resolve_status_timers(world, &mut events);
    sample_triggers(world);
    aggregate_links(world);
    resolve_signals(world, &mut events);
    resolve_dynamic_walls(world);
    if resolve_guards(world, &mut events) { return events; }
    resolve_goal(world, &mut events);
    resolve_win(world, &mut events);

    events
}

/// Send a player back to start. A carried key drops and its pickup re-arms.
pub fn reset_player(world: &mut WorldState, id: PlayerId, events: &mut Vec<GameEvent>) {
    let had_key = world.player(id).carrying_key;
    world.player_mut(id).reset();
    if had_key {
        world.goal.rearm_key();
        events.push(GameEvent::KeyDropped);
    }
    world.resets += 1;
}

// ══════════════════════════════════════════════════════════════
// Players
// ══════════════════════════════════════════════════════════════

fn resolve_status_timers(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for p in &mut world.players {
        if p.tick_status() {
            log::debug!("{:?} thawed", p.id);
            events.push(GameEvent::FreezeExpired { player: p.id });
        }
    }
}

fn resolve_player_motion(world: &mut WorldState, input: FrameInput, events: &mut Vec<GameEvent>) {
    let rules = world.policy.motion_rules(&world.arena);

    for id in [PlayerId::P1, PlayerId::P2] {
        let walls = physics::walls_for(id.side(), &world.walls, &world.dynamic_walls);
        let player = world.player_mut(id);
        player.prev = player.rect.top_left();
        let (dx, dy) = player.displacement(input.for_player(id));

        match physics::resolve_motion(player, dx, dy, &walls, &rules) {
            MotionOutcome::Punished => {
                log::info!("{id:?} touched a wall while scrambled");
                events.push(GameEvent::PlayerPunished { player: id });
                reset_player(world, id, events);
                world.set_message("Scrambled wall contact! Back to start.", MESSAGE_TICKS);
            }
            MotionOutcome::SentHome => {
                log::info!("{id:?} crossed the divider");
                events.push(GameEvent::PlayerSentHome { player: id });
                reset_player(world, id, events);
                world.set_message("Stay on your side!", MESSAGE_TICKS);
            }
            MotionOutcome::Still | MotionOutcome::Moved | MotionOutcome::Blocked => {}
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Link network
// ══════════════════════════════════════════════════════════════

fn sample_triggers(world: &mut WorldState) {
    let boxes = [world.players[0].rect, world.players[1].rect];
    let moved = [world.players[0].moved(), world.players[1].moved()];

    for d in &mut world.deactivators {
        d.update(&boxes[d.presser.index()]);
    }
    for z in &mut world.sync_zones {
        let i = z.presser.index();
        z.update(&boxes[i], moved[i]);
    }
}

fn aggregate_links(world: &mut WorldState) {
    let (links, signals) = links::aggregate(&world.deactivators, &world.sync_zones);
    if log::log_enabled!(log::Level::Trace) {
        log::trace!("tick {}: links {:?}", world.tick, links.active_ids());
    }
    world.links = links;
    world.signals = signals;
}

/// Traps land before cures, so a cure held through a trap wins the tick.
fn resolve_signals(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.signals.is_empty() { return; }

    let freeze_ticks = world.policy.freeze_ticks(&world.sim);
    let raised: Vec<_> = world.signals.iter().copied().collect();

    for &(_, by) in raised.iter().filter(|(s, _)| *s == Signal::Trap) {
        let victim = by.other();
        let p = world.player_mut(victim);
        if p.is_afflicted() { continue; }
        p.afflict(freeze_ticks);
        log::info!("{victim:?} trapped by {by:?}");
        events.push(GameEvent::TrapSprung { victim });
        world.set_message("Trap sprung! Controls scrambled.", MESSAGE_TICKS);
    }

    for &(_, by) in raised.iter().filter(|(s, _)| *s == Signal::Cure) {
        let victim = by.other();
        let p = world.player_mut(victim);
        if !p.is_afflicted() { continue; }
        p.cure();
        log::info!("{victim:?} cured by {by:?}");
        events.push(GameEvent::TrapCured { victim });
        world.set_message("Cured.", MESSAGE_TICKS);
    }
}

fn resolve_dynamic_walls(world: &mut WorldState) {
    for w in &mut world.dynamic_walls {
        let open = world.links.wall_open(w.link);
        if open != w.open {
            log::debug!("wall on link {:?} {}", w.link, if open { "opened" } else { "closed" });
        }
        w.open = open;
    }
}

// ══════════════════════════════════════════════════════════════
// Guards
// ══════════════════════════════════════════════════════════════

/// Returns true if P1 was caught (the rest of the tick is skipped).
fn resolve_guards(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    for g in &mut world.guards {
        let enabled = world.links.guard_enabled(g.link);
        if enabled != g.active {
            log::debug!("guard {} {}", g.id, if enabled { "armed" } else { "disabled" });
        }
        g.active = enabled;
        g.update();
    }

    let target = world.evader().rect;
    let Some(guard) = world.guards.iter().find(|g| g.check_collision(&target)).map(|g| g.id) else {
        return false;
    };

    log::info!("P1 spotted by guard {guard}");
    events.push(GameEvent::PlayerCaught { guard });
    reset_player(world, PlayerId::P1, events);
    world.set_message("Spotted! Back to start.", MESSAGE_TICKS);
    true
}

// ══════════════════════════════════════════════════════════════
// Goal & win
// ══════════════════════════════════════════════════════════════

fn resolve_goal(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let body = world.evader().rect;
    let carrying = world.evader().carrying_key;

    match world.goal.stage(carrying) {
        GoalStage::SeekKey => {
            let Some(key) = world.goal.key else { return };
            if world.goal.key_armed && key.intersects(&body) {
                world.goal.key_armed = false;
                world.player_mut(PlayerId::P1).carrying_key = true;
                events.push(GameEvent::KeyPicked);
                world.set_message("Key acquired.", MESSAGE_TICKS);
            }
        }
        GoalStage::SeekChest => {
            if world.goal.chest.intersects(&body) {
                world.goal.chest_opened = true;
                world.player_mut(PlayerId::P1).carrying_key = false;
                events.push(GameEvent::ChestOpened);
                if world.goal.pod.is_some() {
                    world.set_message("Chest open! Reach the escape pod.", MESSAGE_TICKS);
                }
            }
        }
        GoalStage::SeekPod => {
            if world.goal.pod.map_or(false, |pod| pod.intersects(&body)) {
                world.goal.reached_pod = true;
            }
        }
        GoalStage::Done => {}
    }
}

fn resolve_win(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.goal.stage(world.evader().carrying_key) != GoalStage::Done { return; }

    world.phase = Phase::Victory;
    events.push(GameEvent::LevelCleared);
    log::info!(
        "level {} cleared in {} ticks with {} resets",
        world.current_level + 1, world.tick, world.resets,
    );
    world.set_message("LEVEL CLEARED", u32::MAX);
}

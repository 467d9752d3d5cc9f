//! The same seed and the same input produce the same level.

use slayer2d::*;

const DT: f32 = 1.0 / 60.0;
const TICKS: usize = 600;

/// Bit patterns of everything that moves, so NaNs compare too.
fn snapshot(level: &Level) -> Vec<u32> {
    let mut state = Vec::new();
    let hitbox = level.player().body.hitbox;
    state.extend([hitbox.x, hitbox.y, level.player().health()].map(f32::to_bits));
    for enemy in level.enemies().values() {
        let center = enemy.center();
        state.extend([center.x, center.y, enemy.health()].map(f32::to_bits));
    }
    state.push(level.projectiles().len() as u32);
    state.push(level.effects().len() as u32);
    let camera = level.camera().position();
    state.extend([camera.x, camera.y].map(f32::to_bits));
    state
}

fn run_simulation(seed: u64) -> Vec<u32> {
    let config = LevelConfig::new("determinism")
        .with_obstacle(Rect::new(700.0, 200.0, 40.0, 400.0))
        .with_enemy(Species::Zombie, Vec2::new(900.0, 300.0))
        .with_enemy(Species::Bat, Vec2::new(100.0, 900.0))
        .with_enemy(Species::Skeleton, Vec2::new(1200.0, 800.0));
    let assets = MemoryAssets::with_builtin_tuning().expect("builtin tuning parses");
    let mut level = Level::new(SimConfig::default().with_seed(seed), config, Box::new(assets))
        .expect("level loads");

    let mut input = InputState::new();
    input.set_cursor(1000.0, 300.0);
    input.press_key(Key::Digit(1));
    for tick in 0..TICKS {
        match tick {
            10 => {
                input.release_key(Key::Digit(1));
                input.press_mouse(MouseButton::Left);
            }
            200 => input.press_key(Key::A),
            300 => {
                input.release_key(Key::A);
                input.release_mouse(MouseButton::Left);
                input.press_key(Key::Digit(3));
            }
            320 => input.press_mouse(MouseButton::Left),
            _ => {}
        }
        level.tick(&input, DT);
    }
    snapshot(&level)
}

#[test]
fn same_seed_same_level() {
    assert_eq!(run_simulation(42), run_simulation(42));
}

#[test]
fn seed_changes_the_rolls() {
    assert_ne!(run_simulation(42), run_simulation(43));
}

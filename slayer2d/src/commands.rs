//! Deferred world changes.
//!
//! Entities never touch the groups they are iterated from. Spawns, screen
//! shake and death notices are queued here during a tick and applied by the
//! level in its commit phase, in the order they were pushed.

use std::sync::Arc;

use crate::animation::AnimationClip;
use crate::enemy::Species;
use crate::math::Vec2;
use crate::projectile::ProjectileSpawn;

/// A change requested by an entity during its update.
#[derive(Clone, Debug)]
pub enum Command {
    SpawnProjectile(ProjectileSpawn),
    /// Cosmetic blood splash centred on a point.
    SpawnBlood(Vec2),
    /// Flame burst that hurts whatever it overlaps on its first frame.
    SpawnFlameParticle { position: Vec2, damage: f32 },
    /// Explosion sprite, `clip` frames scaled up around `center`.
    SpawnExplosion {
        center: Vec2,
        clip: Arc<AnimationClip>,
        zindex: f32,
    },
    SpawnEnemy { species: Species, position: Vec2 },
    ShakeCamera(f32),
    PlayerDied,
}

impl Command {
    /// Short label for logs.
    pub fn description(&self) -> &'static str {
        match self {
            Command::SpawnProjectile(_) => "spawn projectile",
            Command::SpawnBlood(_) => "spawn blood",
            Command::SpawnFlameParticle { .. } => "spawn flame particle",
            Command::SpawnExplosion { .. } => "spawn explosion",
            Command::SpawnEnemy { .. } => "spawn enemy",
            Command::ShakeCamera(_) => "shake camera",
            Command::PlayerDied => "player died",
        }
    }
}

/// Per-tick queue of [`Command`]s.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    queue: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        log::trace!("queued {}", command.description());
        self.queue.push(command);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.queue.iter()
    }

    /// Take everything queued so far, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }
}

//! Short-lived visuals that follow projectiles or mark impacts.

use std::sync::Arc;

use crate::animation::{AnimationClip, Animator};
use crate::enemy::Enemy;
use crate::engine::TickContext;
use crate::entities::{Body, SpriteRef, Visual};
use crate::math::{half_life_decay, Rect, Vec2};
use crate::projectile::{Projectile, ProjectileSpawn, EXPLOSION_SCALE};
use crate::render::Drawable;
use crate::weapon::{WeaponInfo, WeaponKind};
use crate::world::{EntityId, Group, Member};

pub const LINE_START_ALPHA: f32 = 100.0;
pub const LINE_MIN_ALPHA: f32 = 40.0;
pub const LINE_FADE_TIME: f32 = 2.0;
pub const LINE_LIFETIME: f32 = 1.2;
pub const LINE_WIDTH: f32 = 8.0;
pub const PARTICLE_LAYER: f32 = 2.0;
pub const PARTICLE_SPEED: f32 = 10.0;
pub const EXPLOSION_SPEED: f32 = 20.0;

/// Trail from the barrel to a bullet.
#[derive(Clone, Debug)]
pub struct BulletLine {
    pub body: Body,
    bullet: EntityId,
    barrel: Vec2,
    end: Vec2,
    color: [u8; 3],
    alpha: f32,
    remaining: f32,
}

impl BulletLine {
    pub fn new(bullet: EntityId, spawn: &ProjectileSpawn) -> Self {
        let color = match spawn.info.kind {
            WeaponKind::Gun { line_color } => line_color,
            _ => [255, 255, 255],
        };
        Self {
            body: Body::new(Rect::from_center(spawn.origin, Vec2::ZERO)).with_zindex(1.0),
            bullet,
            barrel: spawn.origin,
            end: spawn.origin,
            color,
            alpha: LINE_START_ALPHA,
            remaining: LINE_LIFETIME,
        }
    }

    pub fn bullet(&self) -> EntityId {
        self.bullet
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn end(&self) -> Vec2 {
        self.end
    }

    fn update(&mut self, projectiles: &Group<Projectile>, dt: f32) {
        // Once the bullet is gone the line keeps its last end point.
        if let Some(bullet) = projectiles.get(self.bullet) {
            self.end = bullet.center();
        }
        self.alpha -= dt / LINE_FADE_TIME * (LINE_START_ALPHA - LINE_MIN_ALPHA);
        self.alpha = self.alpha.max(LINE_MIN_ALPHA);

        let min = Vec2::new(self.barrel.x.min(self.end.x), self.barrel.y.min(self.end.y));
        let max = Vec2::new(self.barrel.x.max(self.end.x), self.barrel.y.max(self.end.y));
        self.body.rect = Rect::from_top_left(min, max - min);

        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.body.destroy();
        }
    }
}

/// Smoke puff that drifts ahead of a flame and fades.
#[derive(Clone, Debug)]
pub struct FlameSmoke {
    pub body: Body,
    info: Arc<WeaponInfo>,
    direction: Vec2,
    speed: f32,
    lifetime: f32,
    remaining: f32,
    alpha: f32,
}

impl FlameSmoke {
    /// Smoke for a flame spawn. `None` when the weapon is not a flamethrower.
    pub fn new(spawn: &ProjectileSpawn) -> Option<Self> {
        let flame = spawn.info.flame()?;
        let direction = Vec2::from_angle_deg(spawn.angle);
        let size = Vec2::new(flame.smoke_start_size, flame.smoke_start_size);
        Some(Self {
            body: Body::new(Rect::from_center(spawn.origin, size)).with_zindex(spawn.zindex - 0.25),
            direction,
            speed: flame.smoke_velocity + spawn.holder_velocity.dot(direction) * 2.0,
            lifetime: flame.smoke_lifetime,
            remaining: flame.smoke_lifetime,
            alpha: flame.smoke_start_alpha,
            info: Arc::clone(&spawn.info),
        })
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn update(&mut self, obstacles: &[Rect], dt: f32) {
        let Some(flame) = self.info.flame() else {
            self.body.destroy();
            return;
        };
        self.speed *= half_life_decay(dt, flame.smoke_velocity_decay_half_life);
        self.body.rect.translate(self.direction * (self.speed * dt));

        let t = 1.0 - self.remaining / self.lifetime;
        let side = flame.smoke_start_size + (flame.smoke_end_size - flame.smoke_start_size) * t;
        self.body.rect.set_size_centered(Vec2::new(side, side));
        self.body.hitbox = self.body.rect;
        // Opacity runs backwards from the size: the puff spawns at the end
        // alpha and reaches the start alpha as it expires.
        let left = 1.0 - t;
        self.alpha =
            (flame.smoke_start_alpha + (flame.smoke_end_alpha - flame.smoke_start_alpha) * left).max(0.0);

        if obstacles.iter().any(|wall| self.body.rect.overlaps(wall)) {
            self.body.destroy();
            return;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.body.destroy();
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParticleKind {
    Blood,
    /// Burns enemies it overlaps on its first frame.
    Flame { damage: f32, spent: bool },
    Explosion,
}

/// A one-shot animation that removes itself after the last frame.
#[derive(Clone, Debug)]
pub struct Particle {
    pub body: Body,
    kind: ParticleKind,
    clip: Arc<AnimationClip>,
    animator: Animator,
}

impl Particle {
    fn new(kind: ParticleKind, clip: Arc<AnimationClip>, center: Vec2, scale: f32, zindex: f32) -> Self {
        let speed = match kind {
            ParticleKind::Explosion => EXPLOSION_SPEED,
            _ => PARTICLE_SPEED,
        };
        let rect = Rect::from_center(center, clip.frame_size(0) * scale);
        Self {
            body: Body::new(rect).with_zindex(zindex),
            kind,
            clip,
            animator: Animator::new(speed),
        }
    }

    pub fn blood(clip: Arc<AnimationClip>, center: Vec2) -> Self {
        Self::new(ParticleKind::Blood, clip, center, 1.0, PARTICLE_LAYER)
    }

    pub fn flame(clip: Arc<AnimationClip>, center: Vec2, damage: f32) -> Self {
        Self::new(
            ParticleKind::Flame {
                damage,
                spent: false,
            },
            clip,
            center,
            1.0,
            PARTICLE_LAYER,
        )
    }

    pub fn explosion(clip: Arc<AnimationClip>, center: Vec2, zindex: f32) -> Self {
        Self::new(ParticleKind::Explosion, clip, center, EXPLOSION_SCALE, zindex)
    }

    pub fn kind(&self) -> ParticleKind {
        self.kind
    }

    pub fn frame(&self) -> usize {
        self.animator.held_index(self.clip.len())
    }

    fn update(&mut self, enemies: &mut Group<Enemy>, ctx: &mut TickContext) {
        if let ParticleKind::Flame { damage, spent } = &mut self.kind {
            if !*spent {
                *spent = true;
                let area = self.body.rect;
                for enemy in enemies.values_mut() {
                    if !enemy.is_dead() && area.overlaps(&enemy.body.hitbox) {
                        enemy.take_damage(*damage, ctx);
                    }
                }
            }
        }
        self.animator.advance(ctx.dt);
        if self.animator.is_past_end(self.clip.len()) {
            self.body.destroy();
        }
    }
}

/// Every non-projectile transient in the level.
#[derive(Clone, Debug)]
pub enum Effect {
    Line(BulletLine),
    Smoke(FlameSmoke),
    Particle(Particle),
}

impl Effect {
    pub fn update(
        &mut self,
        projectiles: &Group<Projectile>,
        obstacles: &[Rect],
        enemies: &mut Group<Enemy>,
        ctx: &mut TickContext,
    ) {
        if !self.is_alive() {
            return;
        }
        match self {
            Effect::Line(line) => line.update(projectiles, ctx.dt),
            Effect::Smoke(smoke) => smoke.update(obstacles, ctx.dt),
            Effect::Particle(particle) => particle.update(enemies, ctx),
        }
    }
}

impl Member for Effect {
    fn is_alive(&self) -> bool {
        Drawable::body(self).is_alive()
    }
}

impl Drawable for Effect {
    fn body(&self) -> &Body {
        match self {
            Effect::Line(line) => &line.body,
            Effect::Smoke(smoke) => &smoke.body,
            Effect::Particle(particle) => &particle.body,
        }
    }

    fn visual(&self) -> Visual {
        match self {
            Effect::Line(line) => Visual::Line {
                from: line.barrel,
                to: line.end,
                width: LINE_WIDTH,
                color: line.color,
                alpha: line.alpha,
            },
            Effect::Smoke(smoke) => {
                let path = smoke
                    .info
                    .sprites
                    .smoke
                    .as_ref()
                    .map(|clip| Arc::clone(&clip.path))
                    .unwrap_or_else(|| Arc::from(""));
                Visual::Sprite(SpriteRef::new(path, 0).with_alpha(smoke.alpha))
            }
            Effect::Particle(particle) => Visual::Sprite(SpriteRef::new(
                Arc::clone(&particle.clip.path),
                particle.frame(),
            )),
        }
    }
}

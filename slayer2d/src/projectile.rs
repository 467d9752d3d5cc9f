//! Bullets, flames and missiles in flight.

use std::sync::Arc;

use crate::commands::Command;
use crate::enemy::Enemy;
use crate::engine::TickContext;
use crate::entities::{Body, SpriteRef, Visual};
use crate::math::{half_life_decay, Rect, Vec2};
use crate::render::Drawable;
use crate::weapon::WeaponInfo;
use crate::world::{Group, Member};

pub const BULLET_HITBOX: Vec2 = Vec2 { x: 14.0, y: 8.0 };
pub const MISSILE_HITBOX: Vec2 = Vec2 { x: 32.0, y: 32.0 };
pub const DAMAGE_COOLDOWN: f32 = 0.5;
pub const FLAME_DAMAGE_COOLDOWN: f32 = 0.1;
/// Cooldowns closer to zero than this count as elapsed, so float residue
/// from summing frame deltas never skips a tick.
const COOLDOWN_SLACK: f32 = 1e-5;
/// Flame particles land this far (per axis) from the flame centre.
pub const FLAME_JITTER: f32 = 20.0;
pub const FLAME_MAX_TINT: f32 = 120.0;
pub const EXPLOSION_SCALE: f32 = 6.0;
pub const EXPLOSION_SHAKE: f32 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectileKind {
    Bullet,
    Flame,
    Missile,
}

/// Request to put a new projectile in flight.
#[derive(Clone, Debug)]
pub struct ProjectileSpawn {
    pub kind: ProjectileKind,
    pub info: Arc<WeaponInfo>,
    /// Barrel position the projectile is centred on.
    pub origin: Vec2,
    /// Travel direction in degrees, spread already applied.
    pub angle: f32,
    pub zindex: f32,
    /// Velocity of whoever fired, used to bias flames.
    pub holder_velocity: Vec2,
}

#[derive(Clone, Debug)]
pub struct Projectile {
    pub body: Body,
    kind: ProjectileKind,
    info: Arc<WeaponInfo>,
    origin: Vec2,
    angle: f32,
    direction: Vec2,
    speed: f32,
    lifetime: f32,
    remaining: f32,
    damage_cooldown: f32,
    cooldown_window: f32,
    tint_add: f32,
    detonated: bool,
}

impl Projectile {
    pub fn new(spawn: ProjectileSpawn) -> Self {
        let ProjectileSpawn {
            kind,
            info,
            origin,
            angle,
            zindex,
            holder_velocity,
        } = spawn;

        let direction = Vec2::from_angle_deg(angle);
        let mut speed = info.bullet_velocity;
        let sprite = Rect::rotated_bounds(info.sprites.bullet.frame_size(0), angle);
        let mut rect = Rect::from_center(origin, sprite);
        let (hitbox, cooldown_window, tint_add) = match kind {
            ProjectileKind::Bullet => (
                Rect::from_center(origin, BULLET_HITBOX),
                DAMAGE_COOLDOWN,
                0.0,
            ),
            ProjectileKind::Missile => (
                Rect::from_center(origin, MISSILE_HITBOX),
                DAMAGE_COOLDOWN,
                0.0,
            ),
            ProjectileKind::Flame => {
                speed += holder_velocity.dot(direction) * 2.0;
                if let Some(flame) = info.flame() {
                    rect = Rect::from_center(origin, Vec2::new(flame.start_size, flame.start_size));
                }
                (rect, FLAME_DAMAGE_COOLDOWN, FLAME_MAX_TINT)
            }
        };

        Self {
            body: Body::new(rect)
                .with_hitbox(hitbox)
                .with_zindex(zindex)
                .with_rotation(angle),
            kind,
            origin,
            angle,
            direction,
            speed,
            lifetime: info.bullet_lifetime,
            remaining: info.bullet_lifetime,
            damage_cooldown: 0.0,
            cooldown_window,
            tint_add,
            detonated: false,
            info,
        }
    }

    pub fn kind(&self) -> ProjectileKind {
        self.kind
    }

    pub fn info(&self) -> &Arc<WeaponInfo> {
        &self.info
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn damage_cooldown(&self) -> f32 {
        self.damage_cooldown
    }

    pub fn has_detonated(&self) -> bool {
        self.detonated
    }

    pub fn center(&self) -> Vec2 {
        self.body.rect.center()
    }

    /// Move, collide and age by one tick.
    pub fn update(&mut self, obstacles: &[Rect], enemies: &mut Group<Enemy>, ctx: &mut TickContext) {
        if !self.body.is_alive() {
            return;
        }
        self.advance(ctx.dt);
        self.collide(obstacles, enemies, ctx);
        if !self.body.is_alive() {
            return;
        }

        self.remaining -= ctx.dt;
        if self.remaining <= 0.0 {
            if self.kind == ProjectileKind::Missile {
                self.detonate(enemies, ctx);
            }
            self.body.destroy();
            return;
        }
        if self.kind == ProjectileKind::Flame {
            self.grow_flame();
        }
    }

    fn advance(&mut self, dt: f32) {
        if let Some(flame) = self.info.flame() {
            self.speed *= half_life_decay(dt, flame.velocity_decay_half_life);
        }
        let center = self.body.rect.center() + self.direction * (self.speed * dt);
        self.body.rect.set_center(center);
        self.body.hitbox.set_center(center);
    }

    fn collide(&mut self, obstacles: &[Rect], enemies: &mut Group<Enemy>, ctx: &mut TickContext) {
        self.damage_cooldown = (self.damage_cooldown - ctx.dt).max(0.0);
        if self.damage_cooldown < COOLDOWN_SLACK {
            self.damage_cooldown = 0.0;
        }

        // A wall ends the projectile before enemies are checked, so nothing
        // overlapped on the same tick takes a hit.
        if obstacles.iter().any(|wall| self.body.hitbox.overlaps(wall)) {
            if self.kind == ProjectileKind::Missile {
                self.detonate(enemies, ctx);
            }
            self.body.destroy();
            return;
        }

        match self.kind {
            ProjectileKind::Bullet => self.hit_first_enemy(enemies, ctx),
            ProjectileKind::Flame => self.ignite(enemies, ctx),
            ProjectileKind::Missile => {
                // Only the first overlapping enemy counts; a corpse shields the rest.
                let hitbox = self.body.hitbox;
                let struck = enemies
                    .values()
                    .find(|enemy| hitbox.overlaps(&enemy.body.hitbox))
                    .is_some_and(|enemy| !enemy.is_dead());
                if struck {
                    self.detonate(enemies, ctx);
                    self.body.destroy();
                }
            }
        }
    }

    fn hit_first_enemy(&mut self, enemies: &mut Group<Enemy>, ctx: &mut TickContext) {
        if self.damage_cooldown > 0.0 {
            return;
        }
        let hitbox = self.body.hitbox;
        let center = self.body.rect.center();
        let Some(target) = enemies
            .values_mut()
            .find(|enemy| !enemy.is_dead() && hitbox.overlaps(&enemy.body.hitbox))
        else {
            return;
        };
        target.bleed(center, ctx);
        target.take_damage(self.info.damage, ctx);
        self.damage_cooldown = self.cooldown_window;
        self.body.destroy();
    }

    fn ignite(&mut self, enemies: &Group<Enemy>, ctx: &mut TickContext) {
        if self.damage_cooldown > 0.0 {
            return;
        }
        let hitbox = self.body.hitbox;
        let touching = enemies
            .values()
            .any(|enemy| !enemy.is_dead() && hitbox.overlaps(&enemy.body.hitbox));
        if !touching {
            return;
        }
        let jitter = Vec2::new(ctx.signed_unit(), ctx.signed_unit()) * FLAME_JITTER;
        ctx.commands.push(Command::SpawnFlameParticle {
            position: self.body.rect.center() + jitter,
            damage: self.info.damage,
        });
        self.damage_cooldown = self.cooldown_window;
    }

    /// Area damage, shake and explosion effect. Happens at most once.
    fn detonate(&mut self, enemies: &mut Group<Enemy>, ctx: &mut TickContext) {
        if std::mem::replace(&mut self.detonated, true) {
            return;
        }
        let center = self.body.hitbox.center();
        let blast = explosion_hitbox(&self.info, center);
        let mut hit = 0;
        for enemy in enemies.values_mut() {
            if blast.overlaps(&enemy.body.hitbox) {
                enemy.take_damage(self.info.damage, ctx);
                hit += 1;
            }
        }
        log::debug!("{} missile detonated at {center:?}, {hit} caught", self.info.name);

        ctx.commands.push(Command::ShakeCamera(EXPLOSION_SHAKE));
        if let Some(sound) = &self.info.sounds.explode {
            ctx.events.play(sound);
        }
        if let Some(clip) = &self.info.sprites.explosion {
            ctx.commands.push(Command::SpawnExplosion {
                center,
                clip: Arc::clone(clip),
                zindex: self.body.zindex,
            });
        }
    }

    fn grow_flame(&mut self) {
        let Some(flame) = self.info.flame() else {
            return;
        };
        let left = (self.remaining / self.lifetime).max(0.0);
        let side = flame.start_size + (flame.end_size - flame.start_size) * (1.0 - left);
        // Only the sprite grows; the hitbox keeps its spawn size.
        self.body.rect.set_size_centered(Vec2::new(side, side));
        self.tint_add = FLAME_MAX_TINT * left;
    }
}

/// Sprite rectangle of a missile explosion centred on `center`.
pub fn explosion_rect(info: &WeaponInfo, center: Vec2) -> Rect {
    let frame = info
        .sprites
        .explosion
        .as_ref()
        .map(|clip| clip.frame_size(0))
        .unwrap_or(Vec2::ZERO);
    Rect::from_center(center, frame * EXPLOSION_SCALE)
}

/// The damaging core of an explosion: two thirds of the sprite.
pub fn explosion_hitbox(info: &WeaponInfo, center: Vec2) -> Rect {
    let rect = explosion_rect(info, center);
    Rect::from_center(center, rect.size() * (2.0 / 3.0))
}

impl Member for Projectile {
    fn is_alive(&self) -> bool {
        self.body.is_alive()
    }
}

impl Drawable for Projectile {
    fn body(&self) -> &Body {
        &self.body
    }

    fn visual(&self) -> Visual {
        let sprite = SpriteRef::new(Arc::clone(&self.info.sprites.bullet.path), 0);
        Visual::Sprite(sprite.with_tint_add(self.tint_add))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::tests::enemy_at;
    use crate::enemy::Species;
    use crate::engine::testing::Harness;
    use crate::weapon::tests::{gun_info, torch_info};

    fn bullet(origin: Vec2, angle: f32) -> Projectile {
        Projectile::new(ProjectileSpawn {
            kind: ProjectileKind::Bullet,
            info: Arc::new(gun_info(10.0, 10, 10)),
            origin,
            angle,
            zindex: 1.0,
            holder_velocity: Vec2::ZERO,
        })
    }

    #[test]
    fn bullet_flies_along_its_angle() {
        let mut harness = Harness::new(1);
        let mut enemies = Group::new();
        let mut shot = bullet(Vec2::ZERO, 90.0);
        shot.update(&[], &mut enemies, &mut harness.ctx(0.01));
        let c = shot.center();
        assert!(c.x.abs() < 1e-3);
        assert!((c.y - 10.0).abs() < 1e-3);
        assert_eq!(shot.body.hitbox.size(), BULLET_HITBOX);
    }

    #[test]
    fn obstacle_destroys_bullet() {
        let mut harness = Harness::new(1);
        let mut enemies = Group::new();
        let mut shot = bullet(Vec2::ZERO, 0.0);
        let wall = Rect::new(5.0, -50.0, 10.0, 100.0);
        shot.update(&[wall], &mut enemies, &mut harness.ctx(0.01));
        assert!(!shot.is_alive());
    }

    #[test]
    fn lifetime_expires() {
        let mut harness = Harness::new(1);
        let mut enemies = Group::new();
        let mut shot = bullet(Vec2::ZERO, 0.0);
        for _ in 0..9 {
            shot.update(&[], &mut enemies, &mut harness.ctx(0.1));
        }
        assert!(shot.is_alive());
        shot.update(&[], &mut enemies, &mut harness.ctx(0.2));
        assert!(!shot.is_alive());
    }

    fn spawn_flame(info: WeaponInfo, origin: Vec2, holder_velocity: Vec2) -> Projectile {
        Projectile::new(ProjectileSpawn {
            kind: ProjectileKind::Flame,
            info: Arc::new(info),
            origin,
            angle: 0.0,
            zindex: 1.0,
            holder_velocity,
        })
    }

    fn flame_particles(harness: &Harness) -> Vec<Vec2> {
        harness
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnFlameParticle { position, .. } => Some(*position),
                _ => None,
            })
            .collect()
    }

    fn zombie_group(center: Vec2) -> Group<Enemy> {
        let mut enemies = Group::new();
        let zombie = enemy_at(Species::Zombie, center);
        enemies.insert(zombie.id(), zombie);
        enemies
    }

    #[test]
    fn flame_is_pushed_by_holder_motion() {
        let flame = spawn_flame(torch_info(100.0, 1.0), Vec2::ZERO, Vec2::new(200.0, 0.0));
        assert_eq!(flame.speed(), 500.0);
        assert_eq!(flame.body.hitbox.size(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn flame_hitbox_keeps_its_spawn_size() {
        let mut harness = Harness::new(1);
        let mut enemies = Group::new();
        let mut flame = spawn_flame(torch_info(100.0, 1.0), Vec2::ZERO, Vec2::ZERO);
        for _ in 0..30 {
            flame.update(&[], &mut enemies, &mut harness.ctx(1.0 / 60.0));
        }
        assert!(flame.is_alive());
        assert!(flame.body.rect.w > 25.0, "sprite grows to {}", flame.body.rect.w);
        assert_eq!(flame.body.hitbox.size(), Vec2::new(10.0, 10.0));
        let drift = flame.body.hitbox.center() - flame.center();
        assert!(drift.x.abs() < 1e-3 && drift.y.abs() < 1e-3);
    }

    #[test]
    fn parked_flame_ignites_once_per_window() {
        let mut harness = Harness::new(5);
        let mut enemies = zombie_group(Vec2::ZERO);
        let mut flame = spawn_flame(torch_info(0.0, 2.0), Vec2::ZERO, Vec2::ZERO);
        for _ in 0..60 {
            flame.update(&[], &mut enemies, &mut harness.ctx(1.0 / 60.0));
        }
        assert!(flame.is_alive());

        let sparks = flame_particles(&harness);
        let expected = (1.0 / FLAME_DAMAGE_COOLDOWN).ceil() as usize;
        assert_eq!(sparks.len(), expected);
        assert!(sparks
            .iter()
            .all(|p| p.x.abs() <= FLAME_JITTER && p.y.abs() <= FLAME_JITTER));
        assert!(sparks.iter().any(|p| *p != Vec2::ZERO), "sparks are scattered");
    }

    #[test]
    fn dead_enemies_are_not_hit() {
        let mut harness = Harness::new(1);
        let mut enemies = zombie_group(Vec2::ZERO);
        for zombie in enemies.values_mut() {
            zombie.take_damage(1.0e6, &mut harness.ctx(0.0));
            assert!(zombie.is_dead());
        }

        let mut shot = bullet(Vec2::new(-5.0, 0.0), 0.0);
        shot.update(&[], &mut enemies, &mut harness.ctx(0.01));
        assert!(shot.is_alive(), "bullets pass through corpses");
        assert_eq!(shot.damage_cooldown(), 0.0);

        let mut flame = spawn_flame(torch_info(0.0, 2.0), Vec2::ZERO, Vec2::ZERO);
        for _ in 0..10 {
            flame.update(&[], &mut enemies, &mut harness.ctx(1.0 / 60.0));
        }
        assert!(flame_particles(&harness).is_empty());
        assert_eq!(flame.damage_cooldown(), 0.0);
    }

    #[test]
    fn wall_shields_an_overlapped_enemy() {
        let mut harness = Harness::new(1);
        let mut enemies = zombie_group(Vec2::ZERO);
        let wall = Rect::new(-10.0, -50.0, 20.0, 100.0);
        let mut shot = bullet(Vec2::new(-5.0, 0.0), 0.0);
        shot.update(&[wall], &mut enemies, &mut harness.ctx(0.01));

        assert!(!shot.is_alive());
        let zombie = enemies.values().next().unwrap();
        assert_eq!(zombie.health(), zombie.max_health());
    }
}

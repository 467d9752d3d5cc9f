//! Enemies: perception, wandering, chasing, attacking and dying.

mod perception;
mod species;

use std::sync::Arc;

use anyhow::{Context, Result};

pub use perception::Perception;
pub use species::*;

use crate::animation::{AnimationClip, Animator};
use crate::assets::{AssetProvider, Playlist};
use crate::commands::Command;
use crate::engine::TickContext;
use crate::entities::{Body, SpriteRef, Visual};
use crate::events::GameEvent;
use crate::math::{Rect, Vec2};
use crate::player::Player;
use crate::render::Drawable;
use crate::world::{EntityId, Member};

const WALK_THRESHOLD: f32 = 1e-2;
const FLASH_TINT: f32 = 255.0;
/// Screams are heard this far beyond the follow distance.
const SCREAM_REACH: f32 = 1.5;

/// Behaviour an enemy is currently in. Derived from its flags every time
/// it is asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AiState {
    Wandering,
    Triggered,
    Attacking,
    Dead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyAnim {
    Idle,
    Walking,
    Attacking,
    Dying,
}

#[derive(Clone, Debug)]
struct EnemyClips {
    idle: Arc<AnimationClip>,
    walking: Arc<AnimationClip>,
    attacking: Arc<AnimationClip>,
    dying: Arc<AnimationClip>,
}

impl EnemyClips {
    fn load(species: Species, assets: &mut dyn AssetProvider) -> Result<Self> {
        let dir = species.dir_name();
        let mut clip = |state: &str| {
            assets
                .animation(&format!("enemy/{dir}/{state}"))
                .with_context(|| format!("loading {state} animation for {dir}"))
        };
        Ok(Self {
            idle: clip("idle")?,
            walking: clip("walking")?,
            attacking: clip("attacking")?,
            dying: clip("dying")?,
        })
    }

    fn get(&self, anim: EnemyAnim) -> &Arc<AnimationClip> {
        match anim {
            EnemyAnim::Idle => &self.idle,
            EnemyAnim::Walking => &self.walking,
            EnemyAnim::Attacking => &self.attacking,
            EnemyAnim::Dying => &self.dying,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub body: Body,
    id: EntityId,
    species: Species,
    tuning: SpeciesTuning,

    speed: f32,
    trigger_speed: f32,
    current_speed: f32,
    attack_range: Option<f32>,
    trigger_range: f32,
    target_point: Vec2,
    direction: Vec2,
    standing: f32,
    on_trigger: bool,
    attacking: bool,
    dealt: bool,
    attack_cooldown: f32,

    health: f32,
    max_health: f32,
    dead: bool,
    corpse_timer: f32,
    scream_cooldown: f32,
    flash: f32,
    shift: Vec2,

    anim: EnemyAnim,
    animator: Animator,
    clips: EnemyClips,
    scream_sounds: Playlist,
    bleeding_sounds: Playlist,
}

impl Enemy {
    /// Spawn with the sprite's top-left at `position`, rolling size and
    /// speed within the species' ranges.
    pub fn spawn(
        id: EntityId,
        species: Species,
        position: Vec2,
        assets: &mut dyn AssetProvider,
        rng: &mut fastrand::Rng,
    ) -> Result<Self> {
        Self::spawn_with_tuning(id, species, species.tuning(), position, assets, rng)
    }

    pub fn spawn_with_tuning(
        id: EntityId,
        species: Species,
        tuning: SpeciesTuning,
        position: Vec2,
        assets: &mut dyn AssetProvider,
        rng: &mut fastrand::Rng,
    ) -> Result<Self> {
        let dir = species.dir_name();
        let clips = EnemyClips::load(species, assets)?;
        let scream_sounds = assets
            .playlist(&format!("enemy/{dir}/scream_playlist"))
            .with_context(|| format!("loading scream sounds for {dir}"))?;
        let bleeding_sounds = assets
            .playlist(&format!("enemy/{dir}/bleeding_playlist"))
            .with_context(|| format!("loading bleeding sounds for {dir}"))?;

        let size_roll = roll(rng, tuning.size_scale);
        let speed_roll = roll(rng, tuning.speed_scale);

        let frame = clips.idle.frame_size(0);
        let mut hitbox = match tuning.hitbox {
            HitboxShape::Inset {
                left,
                top,
                width,
                height,
            } => Rect::new(
                position.x + left,
                position.y + top,
                (frame.x - width).max(0.0),
                (frame.y - height).max(0.0),
            ),
            HitboxShape::Fixed { w, h } => Rect::new(position.x, position.y, w, h),
        };
        hitbox.w *= size_roll;
        hitbox.h *= size_roll;
        let rect = Rect::from_top_left(position, frame * size_roll);

        let range_scale = if tuning.ranges_scale_with_size {
            size_roll
        } else {
            1.0
        };
        let scream_cooldown = tuning.scream.map_or(0.0, |scream| {
            scream
                .initial
                .unwrap_or_else(|| jitter(rng, scream.cooldown, scream.deviation))
        });

        log::debug!("spawned {dir} #{} at {position:?}", id.to_u32());
        Ok(Self {
            body: Body::new(rect).with_hitbox(hitbox).with_zindex(1.0),
            id,
            species,
            speed: tuning.speed * speed_roll,
            trigger_speed: tuning.trigger_speed * speed_roll,
            current_speed: tuning.speed * speed_roll,
            attack_range: tuning.attack_range.map(|range| range * range_scale),
            trigger_range: tuning.trigger_range * range_scale,
            target_point: position,
            direction: Vec2::ZERO,
            standing: 0.0,
            on_trigger: false,
            attacking: false,
            dealt: false,
            attack_cooldown: 0.0,
            health: tuning.max_health,
            max_health: tuning.max_health,
            dead: false,
            corpse_timer: 0.0,
            scream_cooldown,
            flash: 0.0,
            shift: Vec2::new(0.0, tuning.shift_y),
            anim: EnemyAnim::Idle,
            animator: Animator::new(tuning.animation_speed),
            clips,
            scream_sounds,
            bleeding_sounds,
            tuning,
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn tuning(&self) -> &SpeciesTuning {
        &self.tuning
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn center(&self) -> Vec2 {
        self.body.hitbox.center()
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    pub fn trigger_speed(&self) -> f32 {
        self.trigger_speed
    }

    pub fn target_point(&self) -> Vec2 {
        self.target_point
    }

    pub fn attack_cooldown(&self) -> f32 {
        self.attack_cooldown
    }

    pub fn anim(&self) -> EnemyAnim {
        self.anim
    }

    pub fn is_flashing(&self) -> bool {
        self.flash > 0.0
    }

    /// Dead, or already removed from play.
    pub fn is_dead(&self) -> bool {
        self.dead || !self.body.is_alive()
    }

    pub fn state(&self) -> AiState {
        if self.dead {
            AiState::Dead
        } else if self.attacking {
            AiState::Attacking
        } else if self.on_trigger {
            AiState::Triggered
        } else {
            AiState::Wandering
        }
    }

    fn perception<'a>(&self, obstacles: &'a [Rect]) -> Perception<'a> {
        Perception {
            follow_distance: self.tuning.follow_distance,
            wall_penetrating: self.tuning.wall_penetrating,
            extent: self.body.hitbox.size(),
            wall_hiding_coef: self.tuning.wall_hiding_coef,
            obstacles,
        }
    }

    pub fn update(&mut self, player: &mut Player, obstacles: &[Rect], ctx: &mut TickContext) {
        if !self.body.is_alive() {
            return;
        }
        let target = player.body.hitbox.center();
        if !self.dead {
            self.move_toward(target, obstacles, ctx);
        }
        self.animate(ctx.dt);
        if !self.dead {
            self.attack(player, ctx);
        }
        if !self.dead && self.body.is_alive() {
            self.scream(target, ctx);
        }
    }

    /// Stop chasing: either stand still for a while or pick a random point
    /// nearby. Does nothing while already standing.
    fn cancel_trigger(&mut self, ctx: &mut TickContext) {
        if self.standing > 0.0 {
            return;
        }
        if ctx.rng.f32() < self.tuning.prob_standing {
            self.current_speed = 0.0;
            self.standing = self.tuning.standing_time;
            return;
        }
        let reach = self.tuning.wandering_distance.max(0.0) as i32;
        let offset = Vec2::new(
            ctx.rng.i32(-reach..=reach) as f32,
            ctx.rng.i32(-reach..=reach) as f32,
        );
        self.target_point = self.center() + offset;
        self.current_speed = self.speed;
    }

    fn move_toward(&mut self, target: Vec2, obstacles: &[Rect], ctx: &mut TickContext) {
        self.standing = (self.standing - ctx.dt).max(0.0);
        if self.standing <= 0.0 && self.current_speed == 0.0 && !self.attacking {
            self.current_speed = self.speed;
        }

        let here = self.center();
        if here.distance(self.target_point) <= self.trigger_range
            && !self.on_trigger
            && !self.attacking
        {
            self.cancel_trigger(ctx);
        }

        let eyes = self.perception(obstacles);
        let waypoint = if self.attacking {
            None
        } else if eyes.sees_target(here, target) {
            Some(target)
        } else {
            eyes.relay_point(here, target)
        };
        match waypoint {
            Some(point) => self.chase(point),
            None => self.on_trigger = false,
        }

        self.direction = (self.target_point - here).normalized();
        let before = self.body.hitbox;
        self.body
            .hitbox
            .translate(self.direction * (ctx.dt * self.current_speed));
        // Wanderers bump into walls; a chase already picked a clear line.
        if !self.on_trigger && !self.tuning.wall_penetrating && collides(&self.body.hitbox, obstacles) {
            self.body.hitbox = before;
            self.cancel_trigger(ctx);
        }
        self.body.rect.set_center(self.body.hitbox.center() + self.shift);
    }

    fn chase(&mut self, point: Vec2) {
        self.target_point = point;
        self.current_speed = self.trigger_speed;
        self.on_trigger = true;
    }

    fn attack(&mut self, player: &mut Player, ctx: &mut TickContext) {
        self.attack_cooldown = (self.attack_cooldown - ctx.dt).max(0.0);

        let distance = self.center().distance(player.body.hitbox.center());
        if distance <= self.trigger_range {
            self.attacking = true;
            if self.attack_cooldown == 0.0 {
                self.start_attack_cycle(ctx);
            }
        } else if self.attack_cooldown == 0.0 {
            self.attacking = false;
        }

        let in_range = self.attack_range.map_or(true, |range| distance <= range);
        if in_range
            && self.attacking
            && !self.dealt
            && self.tuning.in_damage_window(self.attack_cooldown)
        {
            self.dealt = true;
            match self.tuning.attack {
                AttackStyle::Melee | AttackStyle::Kamikaze => {
                    player.take_damage(self.tuning.damage, true, ctx);
                }
                AttackStyle::Summon(species) => {
                    ctx.commands.push(Command::SpawnEnemy {
                        species,
                        position: self.center(),
                    });
                }
            }
        }

        if self.tuning.attack == AttackStyle::Kamikaze && self.attacking {
            log::debug!("{} #{} spent itself", self.species.dir_name(), self.id.to_u32());
            self.body.destroy();
        }
    }

    fn start_attack_cycle(&mut self, ctx: &mut TickContext) {
        self.attack_cooldown = jitter(
            ctx.rng,
            self.tuning.attack_cooldown,
            self.tuning.attack_cooldown_deviation,
        );
        self.current_speed = 0.0;
        self.dealt = false;
        self.anim = EnemyAnim::Attacking;
        self.animator.restart();
    }

    fn animate(&mut self, dt: f32) {
        self.animator.advance(dt);
        if self.dead {
            self.corpse_timer += dt;
            if self.corpse_timer >= self.tuning.corpse_time {
                self.body.hitbox.w = 0.0;
                self.body.hitbox.h = 0.0;
                self.body.destroy();
            }
            return;
        }

        if self.anim != EnemyAnim::Attacking {
            self.anim = if self.direction.length() > WALK_THRESHOLD && self.current_speed > 0.0 {
                EnemyAnim::Walking
            } else {
                EnemyAnim::Idle
            };
        }
        if self.animator.wrap(self.clips.get(self.anim).len()) && self.anim == EnemyAnim::Attacking {
            self.anim = EnemyAnim::Walking;
        }
        self.flash = (self.flash - dt).max(0.0);
    }

    fn scream(&mut self, target: Vec2, ctx: &mut TickContext) {
        let Some(scream) = self.tuning.scream else {
            return;
        };
        self.scream_cooldown -= ctx.dt;
        if self.scream_cooldown > 0.0 {
            return;
        }
        self.scream_cooldown = jitter(ctx.rng, scream.cooldown, scream.deviation);
        let audible = scream.ignore_distance
            || self.tuning.follow_distance.map_or(true, |follow| {
                self.center().distance(target) <= follow * SCREAM_REACH
            });
        if audible {
            ctx.events.play_any(&self.scream_sounds, ctx.rng);
        }
    }

    /// Cosmetic reaction to a hit at `point`.
    pub fn bleed(&self, point: Vec2, ctx: &mut TickContext) {
        if self.tuning.bleeds {
            ctx.commands.push(Command::SpawnBlood(point));
        }
        ctx.events.play_any(&self.bleeding_sounds, ctx.rng);
    }

    /// Subtract health. Hits on a dead enemy are ignored.
    pub fn take_damage(&mut self, damage: f32, ctx: &mut TickContext) {
        if self.dead {
            return;
        }
        self.flash = self.tuning.flash_time;
        self.health = (self.health - damage).clamp(0.0, self.max_health);
        if self.health <= 0.0 {
            self.die(ctx);
        }
    }

    fn die(&mut self, ctx: &mut TickContext) {
        self.dead = true;
        self.anim = EnemyAnim::Dying;
        self.animator.restart();
        log::debug!("{} #{} died", self.species.dir_name(), self.id.to_u32());
        ctx.events.send(GameEvent::EnemyDied {
            id: self.id,
            species: self.species,
        });
    }
}

/// Uniform roll inside an inclusive `(lo, hi)` range.
fn roll(rng: &mut fastrand::Rng, (lo, hi): (f32, f32)) -> f32 {
    lo + (hi - lo) * rng.f32()
}

/// `base` moved by up to `deviation` either way.
fn jitter(rng: &mut fastrand::Rng, base: f32, deviation: f32) -> f32 {
    base + (rng.f32() * 2.0 - 1.0) * deviation
}

fn collides(hitbox: &Rect, obstacles: &[Rect]) -> bool {
    obstacles.iter().any(|obstacle| hitbox.overlaps(obstacle))
}

impl Member for Enemy {
    fn is_alive(&self) -> bool {
        self.body.is_alive()
    }
}

impl Drawable for Enemy {
    fn body(&self) -> &Body {
        &self.body
    }

    fn visual(&self) -> Visual {
        let clip = self.clips.get(self.anim);
        let sprite = SpriteRef::new(Arc::clone(&clip.path), self.animator.held_index(clip.len()))
            .flipped(self.direction.x < 0.0);
        let sprite = if self.flash > 0.0 && !self.dead {
            sprite.with_tint_add(FLASH_TINT)
        } else {
            sprite
        };
        Visual::Sprite(sprite)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::engine::testing::Harness;
    use crate::player::tests::bare_player;
    use crate::world::EntityAllocator;

    pub(crate) fn spawn_enemy(species: Species, position: Vec2) -> Enemy {
        let mut assets = MemoryAssets::new();
        let mut rng = fastrand::Rng::with_seed(11);
        Enemy::spawn(EntityAllocator::new().allocate(), species, position, &mut assets, &mut rng)
            .unwrap()
    }

    /// Spawn so the enemy's hitbox centre lands on `center`.
    pub(crate) fn enemy_at(species: Species, center: Vec2) -> Enemy {
        let offset = spawn_enemy(species, Vec2::ZERO).center();
        spawn_enemy(species, center - offset)
    }

    #[test]
    fn bat_hitbox_is_fixed_then_scaled() {
        let bat = spawn_enemy(Species::Bat, Vec2::new(10.0, 20.0));
        assert_eq!(bat.body.hitbox, Rect::new(10.0, 20.0, 51.0, 27.0));
        assert_eq!(bat.body.rect, Rect::new(10.0, 20.0, 384.0, 384.0));
        assert_eq!(bat.state(), AiState::Wandering);
    }

    #[test]
    fn zombie_hitbox_is_cut_from_the_sprite() {
        let zombie = spawn_enemy(Species::Zombie, Vec2::ZERO);
        let size = zombie.body.rect.size();
        let scale = size.x / 128.0;
        assert!((0.8..=1.5).contains(&scale));
        assert_eq!(zombie.body.hitbox.top_left(), Vec2::new(15.0, 12.0));
        assert!((zombie.body.hitbox.w - 98.0 * scale).abs() < 1e-3);
        assert!((zombie.body.hitbox.h - 116.0 * scale).abs() < 1e-3);
    }

    #[test]
    fn visible_player_triggers_a_chase() {
        let mut harness = Harness::new(5);
        let mut player = bare_player(Vec2::new(400.0, 0.0));
        let mut bat = enemy_at(Species::Bat, Vec2::new(0.0, 64.0));
        let start = bat.center();
        bat.update(&mut player, &[], &mut harness.ctx(0.1));
        assert_eq!(bat.state(), AiState::Triggered);
        assert_eq!(bat.current_speed(), bat.trigger_speed());
        assert_eq!(bat.target_point(), player.body.hitbox.center());
        assert!(bat.center().x > start.x);
    }

    #[test]
    fn wall_hides_the_player() {
        let mut harness = Harness::new(5);
        let mut player = bare_player(Vec2::new(400.0, 0.0));
        let mut bat = enemy_at(Species::Bat, Vec2::new(0.0, 64.0));
        let wall = Rect::new(150.0, -2000.0, 40.0, 4000.0);
        bat.update(&mut player, &[wall], &mut harness.ctx(0.1));
        assert_eq!(bat.state(), AiState::Wandering);
    }

    #[test]
    fn far_player_is_ignored() {
        let mut harness = Harness::new(5);
        let mut player = bare_player(Vec2::new(3000.0, 0.0));
        let mut zombie = enemy_at(Species::Zombie, Vec2::ZERO);
        zombie.update(&mut player, &[], &mut harness.ctx(0.1));
        assert_eq!(zombie.state(), AiState::Wandering);
        assert_eq!(player.health(), player.max_health());
    }

    #[test]
    fn melee_damage_lands_once_per_cycle() {
        let mut harness = Harness::new(5);
        let mut player = bare_player(Vec2::ZERO);
        let mut bat = enemy_at(Species::Bat, player.body.hitbox.center());
        // The first cycle lasts at least 1.5 s and its window closes by 1.1 s.
        for _ in 0..140 {
            bat.update(&mut player, &[], &mut harness.ctx(0.01));
        }
        assert_eq!(bat.state(), AiState::Attacking);
        assert_eq!(player.health(), player.max_health() - 5.0);
    }

    #[test]
    fn flying_sword_strikes_and_vanishes() {
        let mut harness = Harness::new(5);
        let mut player = bare_player(Vec2::ZERO);
        let mut sword = enemy_at(Species::FlyingSword, player.body.hitbox.center());
        sword.update(&mut player, &[], &mut harness.ctx(0.01));
        assert_eq!(player.health(), player.max_health() - 5.0);
        assert!(!sword.is_alive());
        assert!(sword.is_dead());
    }

    #[test]
    fn skeleton_summons_a_sword_instead_of_hitting() {
        let mut harness = Harness::new(5);
        let mut player = bare_player(Vec2::ZERO);
        let mut skeleton = enemy_at(Species::Skeleton, player.body.hitbox.center() + Vec2::new(200.0, 0.0));
        for _ in 0..120 {
            skeleton.update(&mut player, &[], &mut harness.ctx(0.01));
        }
        let summons: Vec<_> = harness
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnEnemy { species, .. } => Some(*species),
                _ => None,
            })
            .collect();
        assert_eq!(summons, vec![Species::FlyingSword]);
        assert_eq!(player.health(), player.max_health());
    }

    #[test]
    fn death_is_final_and_corpse_despawns() {
        let mut harness = Harness::new(5);
        let mut player = bare_player(Vec2::new(3000.0, 3000.0));
        let mut zombie = spawn_enemy(Species::Zombie, Vec2::ZERO);
        zombie.take_damage(1000.0, &mut harness.ctx(0.0));
        assert_eq!(zombie.health(), 0.0);
        assert_eq!(zombie.state(), AiState::Dead);
        assert_eq!(zombie.anim(), EnemyAnim::Dying);
        zombie.take_damage(5.0, &mut harness.ctx(0.0));
        let deaths = harness
            .bus
            .drain()
            .into_iter()
            .filter(|event| matches!(event, GameEvent::EnemyDied { .. }))
            .count();
        assert_eq!(deaths, 1);

        zombie.update(&mut player, &[], &mut harness.ctx(10.0));
        assert!(zombie.is_alive());
        zombie.update(&mut player, &[], &mut harness.ctx(25.0));
        assert!(!zombie.is_alive());
        assert!(zombie.body.hitbox.is_empty());
    }

    #[test]
    fn hits_flash_briefly() {
        let mut harness = Harness::new(5);
        let mut player = bare_player(Vec2::new(3000.0, 3000.0));
        let mut bat = spawn_enemy(Species::Bat, Vec2::ZERO);
        bat.take_damage(1.0, &mut harness.ctx(0.0));
        assert!(matches!(bat.visual(), Visual::Sprite(s) if s.tint_add == FLASH_TINT));
        bat.update(&mut player, &[], &mut harness.ctx(0.1));
        assert!(!bat.is_flashing());
    }

    #[test]
    fn only_bleeding_species_spill_blood() {
        let mut harness = Harness::new(5);
        spawn_enemy(Species::Bat, Vec2::ZERO).bleed(Vec2::ZERO, &mut harness.ctx(0.0));
        spawn_enemy(Species::FlyingSword, Vec2::ZERO).bleed(Vec2::ZERO, &mut harness.ctx(0.0));
        let blood = harness
            .commands
            .iter()
            .filter(|command| matches!(command, Command::SpawnBlood(_)))
            .count();
        assert_eq!(blood, 1);
    }

    #[test]
    fn wandering_into_a_wall_is_undone() {
        let mut harness = Harness::new(5);
        let mut player = bare_player(Vec2::new(5000.0, 5000.0));
        let mut zombie = spawn_enemy(Species::Zombie, Vec2::ZERO);
        let hitbox = zombie.body.hitbox;
        // Walls on every side, touching the hitbox.
        let walls = [
            Rect::new(hitbox.x - 10.0, hitbox.y - 10.0, hitbox.w + 20.0, 10.0),
            Rect::new(hitbox.x - 10.0, hitbox.bottom(), hitbox.w + 20.0, 10.0),
            Rect::new(hitbox.x - 10.0, hitbox.y, 10.0, hitbox.h),
            Rect::new(hitbox.right(), hitbox.y, 10.0, hitbox.h),
        ];
        for _ in 0..20 {
            zombie.update(&mut player, &walls, &mut harness.ctx(0.05));
            assert_eq!(zombie.body.hitbox, hitbox);
        }
    }
}

//! The player character: input, facing, movement and health.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, PI};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::animation::{AnimationClip, Animator};
use crate::assets::{AssetProvider, SoundId};
use crate::commands::Command;
use crate::config::ItemSpec;
use crate::engine::TickContext;
use crate::entities::{Body, SpriteRef, Visual};
use crate::input::{Action, InputMap};
use crate::inventory::{Grip, Inventory};
use crate::math::{angle_distance, Rect, Vec2};
use crate::render::Drawable;
use crate::weapon::Holder;

pub const WALK_SPEED: f32 = 100.0;
pub const SPRINT_SPEED: f32 = 200.0;
/// Sprinting roughly toward where the player is looking.
pub const SPRINT_AHEAD_SPEED: f32 = 300.0;
pub const MAX_HEALTH: f32 = 200.0;
pub const DAMAGE_SHAKE: f32 = 10.0;

const HITBOX_SHRINK: f32 = 75.0;
const HITBOX_SHIFT: f32 = 20.0;
const ANIMATION_SPEED: f32 = 7.0;
const FACING_THRESHOLD: f32 = FRAC_PI_4 + PI / 12.0;
const AHEAD_CONE: f32 = FRAC_PI_3;
const CHARACTER: &str = "adam";

/// One of four quantised look directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    /// Index used for per-direction asset folders.
    pub fn index(self) -> usize {
        match self {
            Facing::North => 0,
            Facing::East => 1,
            Facing::South => 2,
            Facing::West => 3,
        }
    }

    /// Angle in radians, y-up.
    pub fn angle(self) -> f32 {
        match self {
            Facing::North => FRAC_PI_2,
            Facing::East => 0.0,
            Facing::South => -FRAC_PI_2,
            Facing::West => PI,
        }
    }

    /// Unit vector in world space (y-down).
    pub fn direction(self) -> Vec2 {
        match self {
            Facing::North => Vec2::new(0.0, -1.0),
            Facing::East => Vec2::new(1.0, 0.0),
            Facing::South => Vec2::new(0.0, 1.0),
            Facing::West => Vec2::new(-1.0, 0.0),
        }
    }

    /// Where the held weapon sits relative to the body.
    pub fn weapon_shift(self) -> Vec2 {
        match self {
            Facing::North => Vec2::new(0.0, -25.0),
            Facing::East => Vec2::new(8.0, 3.0),
            Facing::South => Vec2::new(0.0, 5.0),
            Facing::West => Vec2::new(-8.0, -13.0),
        }
    }

    /// Weapons go behind the body when facing away from the screen or left.
    pub fn weapon_layer(self) -> f32 {
        match self {
            Facing::North | Facing::West => 0.5,
            Facing::East | Facing::South => 1.5,
        }
    }

    /// New facing for a world-space look direction. Small turns are
    /// ignored so the sprite does not jitter around the diagonals.
    pub fn resolve(self, look: Vec2) -> Facing {
        let angle = -look.y.atan2(look.x);
        if angle_distance(angle, self.angle()) < FACING_THRESHOLD {
            return self;
        }
        if angle.abs().min(PI - angle.abs()) <= FRAC_PI_4 {
            if angle.abs() > FRAC_PI_2 {
                Facing::West
            } else {
                Facing::East
            }
        } else if angle > 0.0 {
            Facing::North
        } else {
            Facing::South
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerAnim {
    Idle,
    Walking,
}

#[derive(Clone, Debug)]
struct PlayerClips {
    idle: [Arc<AnimationClip>; 4],
    walking: [Arc<AnimationClip>; 4],
}

impl PlayerClips {
    fn load(assets: &mut dyn AssetProvider) -> Result<Self> {
        let mut load_state = |state: &str| -> Result<[Arc<AnimationClip>; 4]> {
            let mut clips = Vec::with_capacity(4);
            for facing in Facing::ALL {
                let path = format!("player/{CHARACTER}/{state}/{}", facing.index());
                clips.push(
                    assets
                        .animation(&path)
                        .with_context(|| format!("loading player animation `{path}`"))?,
                );
            }
            clips
                .try_into()
                .map_err(|_| anyhow::anyhow!("expected four facings for `{state}`"))
        };
        Ok(Self {
            idle: load_state("idle")?,
            walking: load_state("walking")?,
        })
    }

    fn get(&self, anim: PlayerAnim, facing: Facing) -> &Arc<AnimationClip> {
        match anim {
            PlayerAnim::Idle => &self.idle[facing.index()],
            PlayerAnim::Walking => &self.walking[facing.index()],
        }
    }
}

pub struct Player {
    pub body: Body,
    health: f32,
    max_health: f32,
    facing: Facing,
    direction: Vec2,
    look: Vec2,
    speed: f32,
    current_speed: f32,
    sprint_held: bool,
    inventory: Inventory,
    anim: PlayerAnim,
    animator: Animator,
    clips: PlayerClips,
    damage_sound: SoundId,
    controls: InputMap,
}

impl Player {
    /// Spawn with the sprite's top-left at `spawn`.
    pub fn new(spawn: Vec2, loadout: &[ItemSpec], assets: &mut dyn AssetProvider) -> Result<Self> {
        let clips = PlayerClips::load(assets)?;
        let inventory = Inventory::from_loadout(loadout, assets).context("loading player loadout")?;
        let damage_sound = assets.sound(&format!("player/{CHARACTER}/taking_damage.wav"));
        Ok(Self::from_parts(spawn, clips, inventory, damage_sound))
    }

    fn from_parts(spawn: Vec2, clips: PlayerClips, inventory: Inventory, damage_sound: SoundId) -> Self {
        let frame = clips.get(PlayerAnim::Idle, Facing::East).frame_size(0);
        let mut rect = Rect::from_top_left(spawn, frame);
        let hitbox = rect.inflate(-HITBOX_SHRINK, -HITBOX_SHRINK);
        rect.set_center(hitbox.center() - Vec2::new(0.0, HITBOX_SHIFT));
        log::debug!("player spawned at {:?}", hitbox.center());
        Self {
            body: Body::new(rect).with_hitbox(hitbox).with_zindex(1.0),
            health: MAX_HEALTH,
            max_health: MAX_HEALTH,
            facing: Facing::East,
            direction: Vec2::ZERO,
            look: Vec2::ZERO,
            speed: 0.0,
            current_speed: 0.0,
            sprint_held: false,
            inventory,
            anim: PlayerAnim::Idle,
            animator: Animator::new(ANIMATION_SPEED),
            clips,
            damage_sound,
            controls: InputMap::player_defaults(),
        }
    }

    /// Start below full health. Values above the maximum are clamped.
    #[must_use]
    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health.clamp(0.0, self.max_health);
        self
    }

    #[must_use]
    pub fn with_controls(mut self, controls: InputMap) -> Self {
        self.controls = controls;
        self
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Speed applied during the last move, including the ahead bonus.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Walk or sprint speed without the ahead bonus.
    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    pub fn anim(&self) -> PlayerAnim {
        self.anim
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub fn controls(&self) -> &InputMap {
        &self.controls
    }

    pub fn is_reloading(&self) -> bool {
        self.inventory
            .active_weapon()
            .is_some_and(|weapon| weapon.is_reloading())
    }

    pub fn is_eating(&self) -> bool {
        self.inventory.active_food().is_some_and(|food| food.is_eating())
    }

    /// Fraction of the current reload or meal, for the progress bar.
    pub fn progress(&self) -> Option<f32> {
        if let Some(ratio) = self.inventory.active_weapon().and_then(|w| w.reload_progress()) {
            return Some(ratio);
        }
        self.inventory.active_food().and_then(|food| food.eating_progress())
    }

    pub fn holder(&self) -> Holder {
        Holder {
            center: self.body.rect.center(),
            facing: self.facing,
            sprinting: self.sprint_held,
            velocity: self.direction * self.current_speed,
        }
    }

    fn grip(&self, aim: Vec2) -> Grip {
        Grip {
            holder: self.holder(),
            anchor: self.body.hitbox.center(),
            aim,
        }
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Apply a hit. Indirect damage first goes through mitigation. Reaching
    /// zero health reports a death to the level and refills health.
    pub fn take_damage(&mut self, damage: f32, direct: bool, ctx: &mut TickContext) {
        let dealt = if direct { damage } else { self.mitigate(damage) };
        self.health = (self.health - dealt).max(0.0);
        if self.health == 0.0 {
            log::info!("player died");
            ctx.commands.push(Command::PlayerDied);
            self.health = self.max_health;
        }
        ctx.commands.push(Command::ShakeCamera(DAMAGE_SHAKE));
        ctx.events.play(&self.damage_sound);
    }

    /// Armour hook. Nothing reduces damage yet, so indirect hits are void.
    fn mitigate(&self, _damage: f32) -> f32 {
        0.0
    }

    /// Read input, move, animate and tick the held item.
    pub fn update(&mut self, obstacles: &[Rect], ctx: &mut TickContext) {
        self.handle_input(ctx);
        self.move_and_collide(obstacles, ctx);
        self.animate(ctx.dt);

        let holder = self.holder();
        if let Some(heal) = self.inventory.update_active(&holder, ctx) {
            self.heal(heal);
        }
    }

    fn handle_input(&mut self, ctx: &mut TickContext) {
        let input = ctx.input;
        self.direction = self.controls.movement(input).normalized();
        self.look = (ctx.mouse_world - self.body.rect.center()).normalized();
        self.facing = self.facing.resolve(self.look);

        let grip = self.grip(ctx.mouse_world);
        if let Some(slot) = input.held_slot() {
            self.inventory.select(slot, false, &grip);
        }
        if self.controls.action_down(input, Action::Holster) {
            self.inventory.holster(false);
        }

        if self.controls.action_down(input, Action::Fire) {
            let holder = self.holder();
            if let Some(weapon) = self.inventory.active_weapon_mut() {
                weapon.shoot(&holder, ctx);
            } else if let Some(food) = self.inventory.active_food_mut() {
                food.eat(ctx);
            }
        }

        let grip = self.grip(ctx.mouse_world);
        self.inventory.remove_depleted(&grip);

        if self.controls.action_down(input, Action::Reload) {
            if let Some(weapon) = self.inventory.active_weapon_mut() {
                weapon.reload(ctx);
            }
        }
    }

    fn move_and_collide(&mut self, obstacles: &[Rect], ctx: &TickContext) {
        self.sprint_held = self.controls.action_down(ctx.input, Action::Sprint);
        let sprinting = self.sprint_held && !self.is_reloading() && !self.is_eating();
        let ahead = angle_distance(self.direction.angle(), self.look.angle()) <= AHEAD_CONE;

        self.current_speed = if sprinting { SPRINT_SPEED } else { WALK_SPEED };
        self.speed = if sprinting && ahead {
            SPRINT_AHEAD_SPEED
        } else {
            self.current_speed
        };
        self.anim = if self.direction.length() > 0.0 {
            PlayerAnim::Walking
        } else {
            PlayerAnim::Idle
        };

        let step = self.direction * (ctx.dt * self.speed);
        let before = self.body.hitbox;
        self.body.hitbox.x += step.x;
        if collides(&self.body.hitbox, obstacles) {
            self.body.hitbox.x = before.x;
        }
        self.body.hitbox.y += step.y;
        if collides(&self.body.hitbox, obstacles) {
            self.body.hitbox.y = before.y;
        }
        self.body
            .rect
            .set_center(self.body.hitbox.center() - Vec2::new(0.0, HITBOX_SHIFT));
    }

    fn animate(&mut self, dt: f32) {
        let len = self.clips.get(self.anim, self.facing).len();
        self.animator.advance(dt);
        self.animator.wrap(len);
    }
}

fn collides(hitbox: &Rect, obstacles: &[Rect]) -> bool {
    obstacles.iter().any(|obstacle| hitbox.overlaps(obstacle))
}

impl Drawable for Player {
    fn body(&self) -> &Body {
        &self.body
    }

    fn visual(&self) -> Visual {
        let clip = self.clips.get(self.anim, self.facing);
        Visual::Sprite(SpriteRef::new(Arc::clone(&clip.path), self.animator.index()))
    }
}

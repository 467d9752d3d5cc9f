//! Hand-held weapons: tuning, aiming transform, ammo and firing.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::animation::AnimationClip;
use crate::assets::{AssetProvider, Playlist, SoundId};
use crate::commands::Command;
use crate::engine::TickContext;
use crate::entities::{Body, SpriteRef, Visual};
use crate::error::ConfigError;
use crate::math::{half_life_decay, Rect, Vec2};
use crate::player::Facing;
use crate::projectile::{ProjectileKind, ProjectileSpawn};
use crate::render::Drawable;

/// Stability lost per second while not firing.
pub const STABILITY_RECOVER: f32 = 3.5;
/// Shots only spread once stability climbs past this.
pub const MIN_STABILITY: f32 = 10.0;
/// Cap for guns and launchers.
pub const MAX_STABILITY: f32 = 25.0 - MIN_STABILITY;
/// Flamethrowers sit permanently at this value.
pub const FLAMETHROWER_STABILITY: f32 = 21.0;
pub const STABILITY_PER_SHOT: f32 = 0.5;
pub const STABILITY_SPRINT_BONUS: f32 = 1.0;

const ANCHOR_FORCE: f32 = 2.0;
const ANCHOR_HALF_LIFE: f32 = 0.2;

/// Flame projectile and smoke trail parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct FlameTuning {
    pub velocity_decay_half_life: f32,
    pub start_size: f32,
    pub end_size: f32,
    pub heat: f32,
    pub smoke_velocity: f32,
    pub smoke_velocity_decay_half_life: f32,
    pub smoke_start_size: f32,
    pub smoke_end_size: f32,
    pub smoke_lifetime: f32,
    pub smoke_start_alpha: f32,
    pub smoke_end_alpha: f32,
}

/// What a weapon shoots.
#[derive(Clone, Debug, PartialEq)]
pub enum WeaponKind {
    Gun { line_color: [u8; 3] },
    FlameThrower(FlameTuning),
    MissileLauncher,
}

impl WeaponKind {
    pub fn projectile(&self) -> ProjectileKind {
        match self {
            WeaponKind::Gun { .. } => ProjectileKind::Bullet,
            WeaponKind::FlameThrower(_) => ProjectileKind::Flame,
            WeaponKind::MissileLauncher => ProjectileKind::Missile,
        }
    }

    pub fn max_stability(&self) -> f32 {
        match self {
            WeaponKind::FlameThrower(_) => FLAMETHROWER_STABILITY,
            _ => MAX_STABILITY,
        }
    }
}

/// Frame geometry of the sprites a weapon and its projectiles use.
#[derive(Clone, Debug)]
pub struct WeaponSprites {
    pub weapon: Arc<AnimationClip>,
    pub bullet: Arc<AnimationClip>,
    pub smoke: Option<Arc<AnimationClip>>,
    pub explosion: Option<Arc<AnimationClip>>,
}

impl Default for WeaponSprites {
    fn default() -> Self {
        let empty = Arc::new(AnimationClip::new("", Vec::new()));
        Self {
            weapon: Arc::clone(&empty),
            bullet: empty,
            smoke: None,
            explosion: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct WeaponSounds {
    pub shoot: Playlist,
    pub reload: Option<SoundId>,
    pub explode: Option<SoundId>,
}

#[derive(Deserialize)]
struct RawWeaponInfo {
    handpoint: [f32; 2],
    barrel: [f32; 2],
    recoil: f32,
    #[serde(rename = "type")]
    kind: String,
    shooting_cooldown: f32,
    bullet_velocity: f32,
    bullet_lifetime: f32,
    damage: f32,
    clip_max_ammo: u32,
    total_ammo: u32,
    reloading_time: f32,
    bullet_line_color: Option<[u8; 3]>,
    bullet_velocity_decay_halflife: Option<f32>,
    bullet_start_size: Option<f32>,
    bullet_end_size: Option<f32>,
    bullet_heat: Option<f32>,
    flamesmoke_velocity: Option<f32>,
    flamesmoke_velocity_decay_halflife: Option<f32>,
    flamesmoke_start_size: Option<f32>,
    flamesmoke_end_size: Option<f32>,
    flamesmoke_lifetime: Option<f32>,
    flamesmoke_start_alpha: Option<f32>,
    flamesmoke_end_alpha: Option<f32>,
}

/// Immutable per-weapon tuning, shared with every projectile it fires.
#[derive(Clone, Debug)]
pub struct WeaponInfo {
    pub name: String,
    pub kind: WeaponKind,
    /// Pixel in the sprite the hand holds.
    pub handpoint: Vec2,
    /// Pixel in the sprite projectiles leave from.
    pub barrel: Vec2,
    pub recoil: f32,
    pub shooting_cooldown: f32,
    pub bullet_velocity: f32,
    pub bullet_lifetime: f32,
    pub damage: f32,
    pub clip_capacity: u32,
    pub total_ammo: u32,
    pub reloading_time: f32,
    pub sprites: WeaponSprites,
    pub sounds: WeaponSounds,
}

impl WeaponInfo {
    /// Parse and validate the contents of a weapon's `info.json`.
    pub fn from_json(name: &str, text: &str) -> Result<Self, ConfigError> {
        let raw: RawWeaponInfo = serde_json::from_str(text).map_err(|source| ConfigError::Json {
            owner: name.to_string(),
            source,
        })?;
        Self::validate(name, raw)
    }

    fn validate(name: &str, raw: RawWeaponInfo) -> Result<Self, ConfigError> {
        let require = |value: Option<f32>, field: &'static str| {
            value.ok_or_else(|| ConfigError::MissingField {
                weapon: name.to_string(),
                field,
            })
        };
        let positive = |value: f32, field: &'static str| {
            if value > 0.0 {
                Ok(value)
            } else {
                Err(ConfigError::InvalidValue {
                    owner: name.to_string(),
                    field,
                    expected: "positive",
                    value,
                })
            }
        };

        let kind = match raw.kind.as_str() {
            "gun" => WeaponKind::Gun {
                line_color: raw.bullet_line_color.ok_or_else(|| ConfigError::MissingField {
                    weapon: name.to_string(),
                    field: "bullet_line_color",
                })?,
            },
            "flamethrower" => WeaponKind::FlameThrower(FlameTuning {
                velocity_decay_half_life: positive(
                    require(raw.bullet_velocity_decay_halflife, "bullet_velocity_decay_halflife")?,
                    "bullet_velocity_decay_halflife",
                )?,
                start_size: require(raw.bullet_start_size, "bullet_start_size")?,
                end_size: require(raw.bullet_end_size, "bullet_end_size")?,
                heat: require(raw.bullet_heat, "bullet_heat")?,
                smoke_velocity: require(raw.flamesmoke_velocity, "flamesmoke_velocity")?,
                smoke_velocity_decay_half_life: positive(
                    require(
                        raw.flamesmoke_velocity_decay_halflife,
                        "flamesmoke_velocity_decay_halflife",
                    )?,
                    "flamesmoke_velocity_decay_halflife",
                )?,
                smoke_start_size: require(raw.flamesmoke_start_size, "flamesmoke_start_size")?,
                smoke_end_size: require(raw.flamesmoke_end_size, "flamesmoke_end_size")?,
                smoke_lifetime: positive(
                    require(raw.flamesmoke_lifetime, "flamesmoke_lifetime")?,
                    "flamesmoke_lifetime",
                )?,
                smoke_start_alpha: require(raw.flamesmoke_start_alpha, "flamesmoke_start_alpha")?,
                smoke_end_alpha: require(raw.flamesmoke_end_alpha, "flamesmoke_end_alpha")?,
            }),
            "missile_launcher" | "missile_laucher" => WeaponKind::MissileLauncher,
            other => {
                return Err(ConfigError::UnknownWeaponKind {
                    weapon: name.to_string(),
                    kind: other.to_string(),
                })
            }
        };

        if raw.clip_max_ammo == 0 {
            return Err(ConfigError::InvalidValue {
                owner: name.to_string(),
                field: "clip_max_ammo",
                expected: "at least 1",
                value: 0.0,
            });
        }
        if raw.shooting_cooldown < 0.0 || raw.reloading_time < 0.0 {
            return Err(ConfigError::InvalidValue {
                owner: name.to_string(),
                field: "shooting_cooldown/reloading_time",
                expected: "non-negative",
                value: raw.shooting_cooldown.min(raw.reloading_time),
            });
        }

        Ok(Self {
            name: name.to_string(),
            kind,
            handpoint: raw.handpoint.into(),
            barrel: raw.barrel.into(),
            recoil: raw.recoil,
            shooting_cooldown: raw.shooting_cooldown,
            bullet_velocity: raw.bullet_velocity,
            bullet_lifetime: positive(raw.bullet_lifetime, "bullet_lifetime")?,
            damage: raw.damage,
            clip_capacity: raw.clip_max_ammo,
            total_ammo: raw.total_ammo,
            reloading_time: raw.reloading_time,
            sprites: WeaponSprites::default(),
            sounds: WeaponSounds::default(),
        })
    }

    /// Size of the unrotated weapon sprite.
    pub fn sprite_size(&self) -> Vec2 {
        self.sprites.weapon.frame_size(0)
    }

    /// Flame parameters, when this is a flamethrower.
    pub fn flame(&self) -> Option<&FlameTuning> {
        match &self.kind {
            WeaponKind::FlameThrower(flame) => Some(flame),
            _ => None,
        }
    }
}

/// What the weapon needs to know about whoever holds it this tick.
#[derive(Clone, Copy, Debug)]
pub struct Holder {
    /// Centre of the holder's sprite; the weapon anchor chases it.
    pub center: Vec2,
    pub facing: Facing,
    pub sprinting: bool,
    /// Movement direction times current speed.
    pub velocity: Vec2,
}

/// A weapon in an inventory slot.
#[derive(Clone, Debug)]
pub struct Weapon {
    info: Arc<WeaponInfo>,
    pub body: Body,
    clip_ammo: u32,
    reserve_ammo: u32,
    reloading: bool,
    reload_remaining: f32,
    cooldown: f32,
    stability: f32,
    max_stability: f32,
    target: f32,
    angle: f32,
    flip: bool,
    anchor: Vec2,
    velocity: Vec2,
    center_to_barrel: Vec2,
    center_to_handpoint: Vec2,
    distance_to_ray: f32,
    barrel_offset: Vec2,
    handpoint_offset: Vec2,
}

impl Weapon {
    /// Load the weapon called `name` with its sprites and sounds.
    pub fn new(name: &str, assets: &mut dyn AssetProvider) -> Result<Self> {
        let mut info = assets
            .weapon_info(name)
            .with_context(|| format!("loading tuning for weapon `{name}`"))?;
        let base = format!("weapon/{name}");
        info.sprites.weapon = assets
            .animation(&format!("{base}/sprite"))
            .with_context(|| format!("loading sprite for weapon `{name}`"))?;
        info.sprites.bullet = assets
            .animation(&format!("{base}/bullet"))
            .with_context(|| format!("loading bullet sprite for weapon `{name}`"))?;
        match info.kind {
            WeaponKind::FlameThrower(_) => {
                info.sprites.smoke = Some(
                    assets
                        .animation(&format!("{base}/flamesmoke"))
                        .with_context(|| format!("loading smoke sprite for weapon `{name}`"))?,
                );
            }
            WeaponKind::MissileLauncher => {
                info.sprites.explosion = Some(
                    assets
                        .animation(&format!("{base}/explode"))
                        .with_context(|| format!("loading explosion for weapon `{name}`"))?,
                );
                info.sounds.explode = Some(assets.sound(&format!("{base}/explode.wav")));
            }
            WeaponKind::Gun { .. } => {}
        }
        info.sounds.shoot = assets
            .playlist(&format!("{base}/shoot_playlist"))
            .with_context(|| format!("loading shot sounds for weapon `{name}`"))?;
        info.sounds.reload = Some(assets.sound(&format!("{base}/reloading.wav")));

        Ok(Self::from_info(Arc::new(info)))
    }

    /// Build a weapon around already-loaded tuning. Starts disabled with a
    /// full clip.
    pub fn from_info(info: Arc<WeaponInfo>) -> Self {
        let size = info.sprite_size();
        let half = (size - Vec2::ONE) / 2.0;
        let center_to_barrel = info.barrel - half;
        let center_to_handpoint = info.handpoint - half;
        let mut body = Body::new(Rect::from_top_left(Vec2::ZERO, size));
        body.disabled = true;
        Self {
            body,
            clip_ammo: info.clip_capacity,
            reserve_ammo: info.total_ammo,
            reloading: false,
            reload_remaining: 0.0,
            cooldown: 0.0,
            stability: 0.0,
            max_stability: info.kind.max_stability(),
            target: 0.0,
            angle: 0.0,
            flip: false,
            anchor: Vec2::ZERO,
            velocity: Vec2::ZERO,
            center_to_barrel,
            center_to_handpoint,
            distance_to_ray: info.handpoint.y - info.barrel.y,
            barrel_offset: center_to_barrel,
            handpoint_offset: center_to_handpoint,
            info,
        }
    }

    /// Override the starting ammo. The clip is capped at capacity.
    #[must_use]
    pub fn with_ammo(mut self, clip: u32, reserve: u32) -> Self {
        self.clip_ammo = clip.min(self.info.clip_capacity);
        self.reserve_ammo = reserve;
        self
    }

    pub fn info(&self) -> &Arc<WeaponInfo> {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn clip_ammo(&self) -> u32 {
        self.clip_ammo
    }

    pub fn reserve_ammo(&self) -> u32 {
        self.reserve_ammo
    }

    pub fn clip_capacity(&self) -> u32 {
        self.info.clip_capacity
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    pub fn reload_remaining(&self) -> f32 {
        self.reload_remaining
    }

    /// Fraction of the current reload already done.
    pub fn reload_progress(&self) -> Option<f32> {
        if !self.reloading {
            return None;
        }
        if self.info.reloading_time <= 0.0 {
            return Some(1.0);
        }
        Some(1.0 - self.reload_remaining / self.info.reloading_time)
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    pub fn stability(&self) -> f32 {
        self.stability
    }

    pub fn max_stability(&self) -> f32 {
        self.max_stability
    }

    /// Sprite rotation in degrees, before mirroring.
    pub fn target_angle(&self) -> f32 {
        self.target
    }

    /// Direction shots travel in, degrees.
    pub fn aim_angle(&self) -> f32 {
        self.angle
    }

    pub fn is_flipped(&self) -> bool {
        self.flip
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    pub fn anchor_velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_enabled(&self) -> bool {
        !self.body.disabled
    }

    /// Where the next projectile leaves from.
    pub fn barrel_position(&self) -> Vec2 {
        self.body.rect.center() + self.barrel_offset
    }

    /// Put the weapon in the holder's hands.
    pub fn activate(&mut self, holder: &Holder, anchor: Vec2, aim: Vec2) {
        self.anchor = anchor;
        self.body.rect.set_center(anchor);
        self.update_transform(holder, aim, 0.0);
        self.body.disabled = false;
    }

    pub fn disable(&mut self) {
        self.body.disabled = true;
    }

    /// Per-tick upkeep: stability recovery, cooldown, aiming and reload.
    /// Does nothing while holstered.
    pub fn update(&mut self, holder: &Holder, ctx: &mut TickContext) {
        if self.body.disabled {
            return;
        }
        let dt = ctx.dt;
        self.stability = (self.stability - dt * STABILITY_RECOVER).max(0.0);
        self.cooldown = (self.cooldown - dt).max(0.0);
        self.update_transform(holder, ctx.mouse_world, dt);
        self.update_reloading(dt);
    }

    fn update_transform(&mut self, holder: &Holder, aim: Vec2, dt: f32) {
        let pull = holder.center - self.anchor;
        self.velocity += pull * dt * ANCHOR_FORCE;
        self.velocity *= half_life_decay(dt, ANCHOR_HALF_LIFE);
        self.anchor += self.velocity;

        let shift = holder.facing.weapon_shift();
        let pivot = self.anchor + shift + self.center_to_handpoint;
        let mut aim = aim;
        self.flip = aim.x < pivot.x;
        if self.flip {
            aim.x = pivot.x * 2.0 - aim.x;
        }

        let to_aim = aim - pivot;
        let reach = to_aim.length();
        if reach > 0.0 && self.distance_to_ray <= reach {
            let alpha = (-to_aim.y.atan2(to_aim.x)).to_degrees();
            let beta = (self.distance_to_ray / reach).clamp(-1.0, 1.0).acos().to_degrees();
            self.target = (90.0 - beta) - alpha;
            self.angle = if self.flip {
                180.0 - self.target
            } else {
                self.target
            };
        }

        let size = Rect::rotated_bounds(self.info.sprite_size(), self.target);
        self.handpoint_offset = self.center_to_handpoint.rotated_deg(self.target);
        self.barrel_offset = self.center_to_barrel.rotated_deg(self.target);
        let center = self.anchor + shift + self.center_to_handpoint - self.handpoint_offset;
        self.body.rect = Rect::from_center(center, size);
        if self.flip {
            self.body.rect.x = pivot.x * 2.0 - self.body.rect.right();
            self.barrel_offset.x = -self.barrel_offset.x;
            self.handpoint_offset.x = -self.handpoint_offset.x;
        }
        self.body.rotation = self.target;
        self.body.zindex = holder.facing.weapon_layer();
    }

    fn update_reloading(&mut self, dt: f32) {
        if !self.reloading {
            return;
        }
        self.reload_remaining = (self.reload_remaining - dt).max(0.0);
        if self.reload_remaining == 0.0 {
            let moved = self.reserve_ammo.min(self.info.clip_capacity);
            self.reserve_ammo -= moved;
            self.clip_ammo += moved;
            self.reloading = false;
            log::debug!("{} reloaded, clip {}", self.info.name, self.clip_ammo);
        }
    }

    /// Start a reload. Ignored while already reloading or with an empty
    /// reserve; the clip is returned to the reserve first.
    pub fn reload(&mut self, ctx: &mut TickContext) -> bool {
        if self.reserve_ammo == 0 || self.reloading {
            return false;
        }
        self.reserve_ammo += self.clip_ammo;
        self.clip_ammo = 0;
        self.reloading = true;
        self.reload_remaining = self.info.reloading_time;
        if let Some(sound) = &self.info.sounds.reload {
            ctx.events.play(sound);
        }
        true
    }

    /// Fire once if the weapon is ready. Returns whether a shot went out.
    pub fn shoot(&mut self, holder: &Holder, ctx: &mut TickContext) -> bool {
        if self.cooldown > 0.0 || self.reloading || self.clip_ammo == 0 {
            return false;
        }
        self.clip_ammo -= 1;

        let flame = matches!(self.info.kind, WeaponKind::FlameThrower(_));
        if flame {
            self.stability = self.max_stability;
        }
        let mut angle = self.angle;
        if self.stability > MIN_STABILITY {
            angle += ctx.signed_unit() * (self.stability - MIN_STABILITY).min(self.max_stability);
        }
        ctx.commands.push(Command::SpawnProjectile(ProjectileSpawn {
            kind: self.info.kind.projectile(),
            info: Arc::clone(&self.info),
            origin: self.barrel_position(),
            angle,
            zindex: self.body.zindex,
            holder_velocity: holder.velocity,
        }));

        self.velocity -= Vec2::from_angle_deg(self.angle) * self.info.recoil;
        self.cooldown = self.info.shooting_cooldown;
        if !flame {
            self.stability += STABILITY_PER_SHOT;
            if holder.sprinting {
                self.stability += STABILITY_SPRINT_BONUS;
            }
            self.stability = self.stability.min(self.max_stability);
        }
        ctx.events.play_any(&self.info.sounds.shoot, ctx.rng);
        true
    }
}

impl Drawable for Weapon {
    fn body(&self) -> &Body {
        &self.body
    }

    fn visual(&self) -> Visual {
        Visual::Sprite(
            SpriteRef::new(Arc::clone(&self.info.sprites.weapon.path), 0).flipped(self.flip),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::testing::Harness;

    pub(crate) fn gun_info(damage: f32, clip: u32, total: u32) -> WeaponInfo {
        let json = format!(
            r#"{{"handpoint": [10, 12], "barrel": [40, 8], "recoil": 5, "type": "gun",
                "shooting_cooldown": 0.1, "bullet_velocity": 1000, "bullet_lifetime": 1,
                "damage": {damage}, "clip_max_ammo": {clip}, "total_ammo": {total},
                "reloading_time": 1, "bullet_line_color": [255, 255, 0]}}"#
        );
        let mut info = WeaponInfo::from_json("test_gun", &json).unwrap();
        info.sprites.weapon = Arc::new(AnimationClip::uniform("weapon/test_gun/sprite", Vec2::new(48.0, 16.0), 1));
        info.sprites.bullet = Arc::new(AnimationClip::uniform("weapon/test_gun/bullet", Vec2::new(8.0, 4.0), 1));
        info
    }

    /// A flamethrower that sheds 10-to-50 flames and smoke fading from 100 to 0.
    pub(crate) fn torch_info(velocity: f32, lifetime: f32) -> WeaponInfo {
        let json = format!(
            r#"{{"handpoint": [0, 0], "barrel": [10, 0], "recoil": 1, "type": "flamethrower",
            "shooting_cooldown": 0.1, "bullet_velocity": {velocity}, "bullet_lifetime": {lifetime},
            "damage": 1, "clip_max_ammo": 10, "total_ammo": 10, "reloading_time": 1,
            "bullet_velocity_decay_halflife": 0.5, "bullet_start_size": 10, "bullet_end_size": 50,
            "bullet_heat": 100, "flamesmoke_velocity": 50, "flamesmoke_velocity_decay_halflife": 0.5,
            "flamesmoke_start_size": 10, "flamesmoke_end_size": 40, "flamesmoke_lifetime": 1,
            "flamesmoke_start_alpha": 100, "flamesmoke_end_alpha": 0}}"#
        );
        let mut info = WeaponInfo::from_json("torch", &json).unwrap();
        info.sprites.bullet = Arc::new(AnimationClip::uniform("weapon/torch/bullet", Vec2::new(4.0, 4.0), 1));
        info
    }

    fn holder() -> Holder {
        Holder {
            center: Vec2::new(100.0, 100.0),
            facing: Facing::East,
            sprinting: false,
            velocity: Vec2::ZERO,
        }
    }

    fn ready_gun(clip: u32, total: u32) -> Weapon {
        let mut weapon = Weapon::from_info(Arc::new(gun_info(10.0, clip, total)));
        weapon.activate(&holder(), Vec2::new(100.0, 100.0), Vec2::new(400.0, 100.0));
        weapon
    }

    #[test]
    fn missing_flame_field_is_reported() {
        let json = r#"{"handpoint": [0, 0], "barrel": [1, 0], "recoil": 1, "type": "flamethrower",
            "shooting_cooldown": 0.1, "bullet_velocity": 1, "bullet_lifetime": 1, "damage": 1,
            "clip_max_ammo": 1, "total_ammo": 1, "reloading_time": 1}"#;
        let err = WeaponInfo::from_json("torch", json).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let json = r#"{"handpoint": [0, 0], "barrel": [1, 0], "recoil": 1, "type": "bow",
            "shooting_cooldown": 0.1, "bullet_velocity": 1, "bullet_lifetime": 1, "damage": 1,
            "clip_max_ammo": 1, "total_ammo": 1, "reloading_time": 1}"#;
        assert!(matches!(
            WeaponInfo::from_json("bow", json),
            Err(ConfigError::UnknownWeaponKind { .. })
        ));
    }

    #[test]
    fn reload_from_empty_fills_clip() {
        let mut harness = Harness::new(1);
        let mut gun = ready_gun(30, 30).with_ammo(0, 30);
        assert!(gun.reload(&mut harness.ctx(0.0)));
        assert_eq!(gun.clip_ammo() + gun.reserve_ammo(), 30);
        for _ in 0..10 {
            gun.update(&holder(), &mut harness.ctx(0.1));
            assert_eq!(gun.clip_ammo() + gun.reserve_ammo(), 30);
        }
        gun.update(&holder(), &mut harness.ctx(0.01));
        assert!(!gun.is_reloading());
        assert_eq!(gun.clip_ammo(), 30);
        assert_eq!(gun.reserve_ammo(), 0);
    }

    #[test]
    fn partial_clip_returns_to_reserve_before_reload() {
        let mut harness = Harness::new(1);
        let mut gun = ready_gun(30, 100).with_ammo(12, 5);
        gun.reload(&mut harness.ctx(0.0));
        assert_eq!((gun.clip_ammo(), gun.reserve_ammo()), (0, 17));
        gun.update(&holder(), &mut harness.ctx(2.0));
        assert_eq!((gun.clip_ammo(), gun.reserve_ammo()), (17, 0));
    }

    #[test]
    fn reload_is_a_no_op_without_reserve_or_while_reloading() {
        let mut harness = Harness::new(1);
        let mut gun = ready_gun(30, 0);
        assert!(!gun.reload(&mut harness.ctx(0.0)));
        let mut gun = ready_gun(30, 10);
        assert!(gun.reload(&mut harness.ctx(0.0)));
        assert!(!gun.reload(&mut harness.ctx(0.0)));
    }

    #[test]
    fn firing_is_gated_by_cooldown() {
        let mut harness = Harness::new(1);
        let mut gun = ready_gun(30, 0);
        assert!(gun.shoot(&holder(), &mut harness.ctx(0.0)));
        assert!(!gun.shoot(&holder(), &mut harness.ctx(0.0)));
        for _ in 0..5 {
            gun.update(&holder(), &mut harness.ctx(0.025));
            assert!(gun.cooldown() >= 0.0);
        }
        assert_eq!(gun.cooldown(), 0.0);
        assert!(gun.shoot(&holder(), &mut harness.ctx(0.0)));
        assert_eq!(gun.clip_ammo(), 28);
        assert_eq!(harness.commands.len(), 2);
    }

    #[test]
    fn empty_clip_does_not_fire() {
        let mut harness = Harness::new(1);
        let mut gun = ready_gun(30, 10).with_ammo(0, 10);
        assert!(!gun.shoot(&holder(), &mut harness.ctx(0.0)));
        assert!(harness.commands.is_empty());
    }

    #[test]
    fn stability_accumulates_and_caps() {
        let mut harness = Harness::new(1);
        let mut gun = ready_gun(100, 0);
        let mut sprinting = holder();
        sprinting.sprinting = true;
        for _ in 0..20 {
            gun.cooldown = 0.0;
            gun.shoot(&sprinting, &mut harness.ctx(0.0));
        }
        assert_eq!(gun.stability(), MAX_STABILITY);
    }

    #[test]
    fn recoil_pushes_anchor_against_aim() {
        let mut harness = Harness::new(1);
        let mut gun = ready_gun(30, 0);
        let before = gun.anchor_velocity();
        gun.shoot(&holder(), &mut harness.ctx(0.0));
        let kick = gun.anchor_velocity() - before;
        let aim = Vec2::from_angle_deg(gun.aim_angle());
        assert!(kick.dot(aim) < 0.0);
    }

    #[test]
    fn aim_left_of_pivot_flips() {
        let mut gun = ready_gun(30, 0);
        gun.activate(&holder(), Vec2::new(100.0, 100.0), Vec2::new(-300.0, 100.0));
        assert!(gun.is_flipped());
        let dir = Vec2::from_angle_deg(gun.aim_angle());
        assert!(dir.x < 0.0);
    }

    #[test]
    fn aim_inside_ray_distance_keeps_previous_angle() {
        let mut gun = ready_gun(30, 0);
        let before = gun.target_angle();
        let pivot = gun.anchor() + Facing::East.weapon_shift() + gun.center_to_handpoint;
        gun.activate(&holder(), gun.anchor(), pivot + Vec2::new(1.0, 0.0));
        assert_eq!(gun.target_angle(), before);
        gun.activate(&holder(), gun.anchor(), pivot);
        assert_eq!(gun.target_angle(), before);
    }

    #[test]
    fn disabled_weapon_does_not_tick() {
        let mut harness = Harness::new(1);
        let mut gun = ready_gun(30, 30).with_ammo(0, 30);
        gun.reload(&mut harness.ctx(0.0));
        gun.disable();
        gun.update(&holder(), &mut harness.ctx(5.0));
        assert!(gun.is_reloading());
    }
}

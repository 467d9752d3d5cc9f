//! Per-species tuning.

use serde::{Deserialize, Serialize};

/// Kinds of enemy a level can contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Zombie,
    Bat,
    FlyingSword,
    Skeleton,
}

impl Species {
    pub const ALL: [Species; 4] = [
        Species::Zombie,
        Species::Bat,
        Species::FlyingSword,
        Species::Skeleton,
    ];

    /// Asset folder under `enemy/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Species::Zombie => "zombie",
            Species::Bat => "bat",
            Species::FlyingSword => "flying_sword",
            Species::Skeleton => "skeleton",
        }
    }

    pub fn tuning(self) -> SpeciesTuning {
        let base = SpeciesTuning::default();
        match self {
            Species::Zombie => SpeciesTuning {
                max_health: 100.0,
                corpse_time: 30.0,
                damage: 10.0,
                attack_range: Some(150.0),
                trigger_range: 60.0,
                ranges_scale_with_size: true,
                hitbox: HitboxShape::Inset {
                    left: 15.0,
                    top: 12.0,
                    width: 30.0,
                    height: 12.0,
                },
                size_scale: (0.8, 1.5),
                speed_scale: (0.8, 2.5),
                scream: Some(ScreamTuning {
                    cooldown: 5.0,
                    ..ScreamTuning::default()
                }),
                ..base
            },
            Species::Bat => SpeciesTuning {
                max_health: 60.0,
                corpse_time: 30.0,
                follow_distance: Some(900.0),
                damage: 5.0,
                attack_range: Some(150.0),
                trigger_range: 45.0,
                hitbox: HitboxShape::Fixed { w: 17.0, h: 9.0 },
                size_scale: (3.0, 3.0),
                shift_y: 10.0,
                speed_scale: (2.0, 2.5),
                scream: Some(ScreamTuning {
                    cooldown: 6.0,
                    ..ScreamTuning::default()
                }),
                ..base
            },
            Species::FlyingSword => SpeciesTuning {
                animation_speed: 16.0,
                max_health: 20.0,
                corpse_time: 0.1,
                follow_distance: None,
                damage: 5.0,
                wall_penetrating: true,
                damage_after: -10.0,
                attack_range: Some(30.0),
                trigger_range: 30.0,
                hitbox: HitboxShape::Fixed { w: 27.0, h: 27.0 },
                size_scale: (2.0, 2.0),
                speed_scale: (3.0, 3.5),
                attack: AttackStyle::Kamikaze,
                bleeds: false,
                scream: Some(ScreamTuning {
                    cooldown: 1.0,
                    deviation: 0.0,
                    initial: Some(0.0),
                    ignore_distance: true,
                }),
                ..base
            },
            Species::Skeleton => SpeciesTuning {
                max_health: 100.0,
                corpse_time: 30.0,
                follow_distance: Some(900.0),
                damage: 5.0,
                attack_cooldown: 3.0,
                damage_after: 0.3,
                attack_range: None,
                trigger_range: 500.0,
                hitbox: HitboxShape::Fixed { w: 31.0, h: 52.0 },
                size_scale: (2.0, 2.5),
                shift_y: 10.0,
                speed_scale: (2.0, 2.5),
                attack: AttackStyle::Summon(Species::FlyingSword),
                scream: None,
                ..base
            },
        }
    }
}

/// How the hitbox is cut out of the first idle frame, before scaling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum HitboxShape {
    /// Offset the top-left by `left`/`top` and shrink by `width`/`height`.
    Inset {
        left: f32,
        top: f32,
        width: f32,
        height: f32,
    },
    /// Fixed size at the sprite's top-left.
    Fixed { w: f32, h: f32 },
}

/// What happens when an attack window opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackStyle {
    /// Hit the player directly.
    Melee,
    /// Hit the player, then vanish as soon as it commits to attacking.
    Kamikaze,
    /// Throw a new enemy of the given species instead of hitting.
    Summon(Species),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreamTuning {
    pub cooldown: f32,
    pub deviation: f32,
    /// First cooldown; drawn like later ones when unset.
    pub initial: Option<f32>,
    pub ignore_distance: bool,
}

impl Default for ScreamTuning {
    fn default() -> Self {
        Self {
            cooldown: 3.0,
            deviation: 1.0,
            initial: None,
            ignore_distance: false,
        }
    }
}

/// Everything that distinguishes one species from another. Speeds are
/// multiplied by a per-spawn roll from `speed_scale`; sprite and hitbox by
/// a roll from `size_scale`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesTuning {
    pub speed: f32,
    pub trigger_speed: f32,
    /// `None` follows at any distance.
    pub follow_distance: Option<f32>,
    pub standing_time: f32,
    pub prob_standing: f32,
    pub wandering_distance: f32,
    /// `None` lets attacks land from any distance.
    pub attack_range: Option<f32>,
    pub trigger_range: f32,
    pub ranges_scale_with_size: bool,
    pub attack_cooldown: f32,
    pub attack_cooldown_deviation: f32,
    pub damage_after: f32,
    pub damage_after_limit: f32,
    pub attack: AttackStyle,
    pub max_health: f32,
    pub corpse_time: f32,
    pub damage: f32,
    pub wall_penetrating: bool,
    pub wall_hiding_coef: f32,
    pub flash_time: f32,
    pub animation_speed: f32,
    pub hitbox: HitboxShape,
    pub size_scale: (f32, f32),
    pub speed_scale: (f32, f32),
    pub shift_y: f32,
    pub bleeds: bool,
    pub scream: Option<ScreamTuning>,
}

impl Default for SpeciesTuning {
    fn default() -> Self {
        Self {
            speed: 50.0,
            trigger_speed: 150.0,
            follow_distance: Some(800.0),
            standing_time: 1.5,
            prob_standing: 0.5,
            wandering_distance: 200.0,
            attack_range: Some(100.0),
            trigger_range: 20.0,
            ranges_scale_with_size: false,
            attack_cooldown: 2.0,
            attack_cooldown_deviation: 0.5,
            damage_after: 0.5,
            damage_after_limit: 0.6,
            attack: AttackStyle::Melee,
            max_health: 69.0,
            corpse_time: 2.0,
            damage: 0.0,
            wall_penetrating: false,
            wall_hiding_coef: 0.02,
            flash_time: 0.05,
            animation_speed: 10.0,
            hitbox: HitboxShape::Fixed { w: 64.0, h: 64.0 },
            size_scale: (1.0, 1.0),
            speed_scale: (1.0, 1.0),
            shift_y: 0.0,
            bleeds: true,
            scream: Some(ScreamTuning::default()),
        }
    }
}

impl SpeciesTuning {
    /// Whether a cooldown value lies inside the damage window of a cycle.
    pub fn in_damage_window(&self, cooldown: f32) -> bool {
        cooldown <= self.attack_cooldown - self.damage_after
            && cooldown >= self.attack_cooldown - self.damage_after_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_names_round_trip_through_json() {
        let parsed: Vec<Species> =
            serde_json::from_str(r#"["zombie", "flying_sword", "skeleton"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![Species::Zombie, Species::FlyingSword, Species::Skeleton]
        );
    }

    #[test]
    fn partial_tuning_keeps_defaults() {
        let tuning: SpeciesTuning = serde_json::from_str(r#"{"damage": 12, "follow_distance": null}"#).unwrap();
        assert_eq!(tuning.damage, 12.0);
        assert_eq!(tuning.follow_distance, None);
        assert_eq!(tuning.speed, 50.0);
    }

    #[test]
    fn flying_sword_window_is_always_open_early() {
        let sword = Species::FlyingSword.tuning();
        assert!(sword.in_damage_window(2.0));
        assert!(sword.in_damage_window(1.5));
        assert!(!sword.in_damage_window(1.3));
    }

    #[test]
    fn skeleton_window_matches_cooldown() {
        let skeleton = Species::Skeleton.tuning();
        assert!(skeleton.in_damage_window(2.5));
        assert!(!skeleton.in_damage_window(2.8));
        assert!(!skeleton.in_damage_window(2.3));
    }
}

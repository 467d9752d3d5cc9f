//! Runtime and per-level configuration.

use serde::{Deserialize, Serialize};

use crate::enemy::Species;
use crate::error::ConfigError;
use crate::math::{Rect, Vec2};

/// Configuration values for the simulation runtime.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    /// Seed for the level's random number generator.
    pub seed: u64,
    /// When set, `Level::advance` steps the world in slices of this many
    /// seconds instead of once per frame.
    pub fixed_step: Option<f32>,
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the screen size in pixels.
    #[must_use]
    pub fn with_screen_size(mut self, width: u32, height: u32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Step the world with a fixed delta (seconds).
    #[must_use]
    pub fn with_fixed_step(mut self, step: f32) -> Self {
        self.fixed_step = Some(step);
        self
    }

    pub fn screen_size(&self) -> Vec2 {
        Vec2::new(self.screen_width as f32, self.screen_height as f32)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            screen_width: 1280,
            screen_height: 720,
            seed: 0x5eed,
            fixed_step: None,
        }
    }
}

/// One inventory slot in a level's starting loadout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", content = "name", rename_all = "snake_case")]
pub enum ItemSpec {
    Weapon(String),
    Food(String),
}

/// Where an enemy starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub species: Species,
    /// Top-left of the enemy's sprite.
    pub position: Vec2,
}

/// Everything needed to build one level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub name: String,
    /// Top-left of the player's sprite.
    pub player_spawn: Vec2,
    pub obstacles: Vec<Rect>,
    pub enemies: Vec<EnemySpawn>,
    /// Starting health; `None` keeps the player's maximum.
    pub player_health: Option<f32>,
    pub loadout: Vec<ItemSpec>,
}

impl LevelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Json {
            owner: "level".to_string(),
            source,
        })?;
        if let Some(health) = config.player_health {
            if health <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    owner: config.name,
                    field: "player_health",
                    expected: "positive",
                    value: health,
                });
            }
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_player_spawn(mut self, spawn: Vec2) -> Self {
        self.player_spawn = spawn;
        self
    }

    #[must_use]
    pub fn with_obstacle(mut self, rect: Rect) -> Self {
        self.obstacles.push(rect);
        self
    }

    #[must_use]
    pub fn with_enemy(mut self, species: Species, position: Vec2) -> Self {
        self.enemies.push(EnemySpawn { species, position });
        self
    }

    #[must_use]
    pub fn with_player_health(mut self, health: f32) -> Self {
        self.player_health = Some(health);
        self
    }

    #[must_use]
    pub fn with_loadout(mut self, loadout: Vec<ItemSpec>) -> Self {
        self.loadout = loadout;
        self
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            name: "level".to_string(),
            player_spawn: Vec2::new(400.0, 400.0),
            obstacles: Vec::new(),
            enemies: Vec::new(),
            player_health: None,
            loadout: default_loadout(),
        }
    }
}

/// The stock six-slot inventory.
pub fn default_loadout() -> Vec<ItemSpec> {
    vec![
        ItemSpec::Weapon("ak47".into()),
        ItemSpec::Weapon("flamethrower".into()),
        ItemSpec::Weapon("missile_launcher".into()),
        ItemSpec::Food("bread".into()),
        ItemSpec::Weapon("bluetagon".into()),
        ItemSpec::Food("icescream".into()),
    ]
}

//! Consumables that heal the player over an eating delay.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::assets::{AssetProvider, SoundId};
use crate::engine::TickContext;
use crate::error::ConfigError;

/// Tuning read from `food/{name}/info.json`.
#[derive(Clone, Debug, PartialEq)]
pub struct FoodInfo {
    pub name: String,
    pub hp_recover: f32,
    pub eating_time: f32,
    pub quantity: u32,
}

#[derive(Deserialize)]
struct RawFoodInfo {
    hp_recover: f32,
    eating_time: f32,
    quantity: u32,
}

impl FoodInfo {
    pub fn from_json(name: &str, text: &str) -> Result<Self, ConfigError> {
        let raw: RawFoodInfo = serde_json::from_str(text).map_err(|source| ConfigError::Json {
            owner: name.to_string(),
            source,
        })?;
        let info = Self {
            name: name.to_string(),
            hp_recover: raw.hp_recover,
            eating_time: raw.eating_time,
            quantity: raw.quantity,
        };
        info.validate()?;
        Ok(info)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hp_recover < 0.0 {
            return Err(ConfigError::InvalidValue {
                owner: self.name.clone(),
                field: "hp_recover",
                expected: "non-negative",
                value: self.hp_recover,
            });
        }
        if self.eating_time < 0.0 {
            return Err(ConfigError::InvalidValue {
                owner: self.name.clone(),
                field: "eating_time",
                expected: "non-negative",
                value: self.eating_time,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Food {
    info: FoodInfo,
    quantity: u32,
    eating: bool,
    remaining: f32,
    selected: bool,
    eating_sound: SoundId,
    healing_sound: SoundId,
}

impl Food {
    pub fn new(name: &str, assets: &mut dyn AssetProvider) -> Result<Self> {
        let info = assets
            .food_info(name)
            .with_context(|| format!("loading food `{name}`"))?;
        let eating_sound = assets.sound("food/eating.wav");
        let healing_sound = assets.sound("food/healing.wav");
        Ok(Self::from_info(info, eating_sound, healing_sound))
    }

    pub fn from_info(info: FoodInfo, eating_sound: SoundId, healing_sound: SoundId) -> Self {
        Self {
            quantity: info.quantity,
            info,
            eating: false,
            remaining: 0.0,
            selected: false,
            eating_sound,
            healing_sound,
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &FoodInfo {
        &self.info
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn is_eating(&self) -> bool {
        self.eating
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// No portions left and nothing being eaten.
    pub fn is_depleted(&self) -> bool {
        self.quantity == 0 && !self.eating
    }

    pub fn eating_progress(&self) -> Option<f32> {
        if !self.eating {
            return None;
        }
        if self.info.eating_time <= 0.0 {
            return Some(1.0);
        }
        Some(1.0 - self.remaining / self.info.eating_time)
    }

    pub fn activate(&mut self) {
        self.selected = true;
    }

    pub fn disable(&mut self) {
        self.selected = false;
    }

    /// Start eating one portion. Returns whether a portion was taken.
    pub fn eat(&mut self, ctx: &mut TickContext) -> bool {
        if self.quantity == 0 || self.eating {
            return false;
        }
        self.eating = true;
        self.remaining = self.info.eating_time;
        self.quantity -= 1;
        ctx.events.play(&self.eating_sound);
        true
    }

    /// Advance the eating timer. Yields the amount to heal when a portion
    /// is finished.
    pub fn update(&mut self, ctx: &mut TickContext) -> Option<f32> {
        if !self.selected || !self.eating {
            return None;
        }
        self.remaining = (self.remaining - ctx.dt).max(0.0);
        if self.remaining > 0.0 {
            return None;
        }
        self.eating = false;
        ctx.events.play(&self.healing_sound);
        log::debug!("finished eating {}", self.info.name);
        Some(self.info.hp_recover)
    }
}

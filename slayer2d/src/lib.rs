//! Slayer2D - the simulation core of a top-down shooter.
//!
//! A [`Level`] owns the player, enemies, projectiles and effects, steps
//! them once per tick and composes a sorted, screen-space draw list. The
//! host supplies input, assets and a renderer, and reacts to the
//! [`GameEvent`]s a level publishes.

pub mod animation;
pub mod assets;
pub mod camera;
pub mod commands;
pub mod config;
pub mod effects;
pub mod enemy;
pub mod engine;
pub mod entities;
pub mod error;
pub mod events;
pub mod flow;
pub mod food;
pub mod input;
pub mod inventory;
pub mod level;
pub mod math;
pub mod player;
pub mod projectile;
pub mod render;
pub mod weapon;
pub mod world;

pub use crate::assets::{AssetProvider, FsAssets, MemoryAssets};
pub use crate::camera::CameraRig;
pub use crate::config::{LevelConfig, SimConfig};
pub use crate::enemy::{Enemy, Species};
pub use crate::engine::{Clock, TickContext};
pub use crate::error::{AssetError, ConfigError};
pub use crate::events::GameEvent;
pub use crate::flow::{FlowTarget, GameFlow, LevelSelector};
pub use crate::input::{Action, InputState, Key, MouseButton};
pub use crate::level::{Level, Outcome};
pub use crate::math::{Rect, Vec2};
pub use crate::player::Player;
pub use crate::render::{DrawCommand, Drawable, Frame};

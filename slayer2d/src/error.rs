//! Typed errors raised while loading tuning data and assets.
//!
//! Construction boundaries (`Level::new`, `Player::new`, `Weapon::new`,
//! `Enemy::spawn`) wrap these in `anyhow::Error` with context naming the
//! entity being built.

use std::path::PathBuf;

use thiserror::Error;

/// Problems with the contents of a tuning file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown weapon type `{kind}` for weapon `{weapon}`")]
    UnknownWeaponKind { weapon: String, kind: String },

    #[error("weapon `{weapon}` is missing field `{field}`")]
    MissingField { weapon: String, field: &'static str },

    #[error("`{field}` of `{owner}` must be {expected}, got {value}")]
    InvalidValue {
        owner: String,
        field: &'static str,
        expected: &'static str,
        value: f32,
    },

    #[error("malformed json for `{owner}`: {source}")]
    Json {
        owner: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Problems locating or decoding assets.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image `{path}`: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no weapon named `{0}`")]
    UnknownWeapon(String),

    #[error("no food named `{0}`")]
    UnknownFood(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

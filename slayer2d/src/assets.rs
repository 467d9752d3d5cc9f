use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::animation::AnimationClip;
use crate::error::AssetError;
use crate::food::FoodInfo;
use crate::math::Vec2;
use crate::weapon::WeaponInfo;

/// Handle to a sound file. Playing it is the host's business.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SoundId(Arc<str>);

impl SoundId {
    pub fn new(path: impl Into<Arc<str>>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &str {
        &self.0
    }
}

/// A set of interchangeable sounds; one is picked at random per play.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Playlist {
    sounds: Vec<SoundId>,
}

impl Playlist {
    pub fn new(sounds: Vec<SoundId>) -> Self {
        Self { sounds }
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    pub fn pick(&self, rng: &mut fastrand::Rng) -> Option<SoundId> {
        if self.sounds.is_empty() {
            return None;
        }
        Some(self.sounds[rng.usize(..self.sounds.len())].clone())
    }
}

/// Services the simulation asks for while constructing entities.
///
/// Paths are relative to the asset root, e.g. `enemy/zombie/walking`.
pub trait AssetProvider {
    /// Frame geometry of the animation stored under `path`.
    fn animation(&mut self, path: &str) -> Result<Arc<AnimationClip>, AssetError>;

    /// Parsed and validated `weapon/<name>/info.json`.
    fn weapon_info(&mut self, name: &str) -> Result<WeaponInfo, AssetError>;

    /// Parsed and validated `food/<name>/info.json`.
    fn food_info(&mut self, name: &str) -> Result<FoodInfo, AssetError>;

    /// Every sound in the folder at `path`.
    fn playlist(&mut self, path: &str) -> Result<Playlist, AssetError>;

    fn sound(&mut self, path: &str) -> SoundId {
        SoundId::new(path)
    }
}

/// Reads assets from a directory tree, caching animation geometry.
///
/// Animation folders hold frames named `0.png`, `1.png`, ... and are
/// ordered numerically.
pub struct FsAssets {
    root: PathBuf,
    clips: HashMap<String, Arc<AnimationClip>>,
}

impl FsAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            clips: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drop cached clips (they will be re-read on next access).
    pub fn clear(&mut self) {
        self.clips.clear();
    }

    fn numbered_entries(&self, path: &str) -> Result<Vec<(u32, PathBuf)>, AssetError> {
        let dir = self.root.join(path);
        let read = std::fs::read_dir(&dir).map_err(|source| AssetError::Io {
            path: dir.clone(),
            source,
        })?;
        let mut entries = Vec::new();
        for entry in read {
            let entry = entry.map_err(|source| AssetError::Io {
                path: dir.clone(),
                source,
            })?;
            let file = entry.path();
            let index = file
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u32>().ok());
            if let Some(index) = index {
                entries.push((index, file));
            }
        }
        entries.sort_by_key(|(index, _)| *index);
        Ok(entries)
    }

    fn read_text(&self, relative: &str) -> Result<String, AssetError> {
        let path = self.root.join(relative);
        std::fs::read_to_string(&path).map_err(|source| AssetError::Io { path, source })
    }
}

impl AssetProvider for FsAssets {
    fn animation(&mut self, path: &str) -> Result<Arc<AnimationClip>, AssetError> {
        if let Some(clip) = self.clips.get(path) {
            return Ok(Arc::clone(clip));
        }

        let mut frames = Vec::new();
        for (_, file) in self.numbered_entries(path)? {
            let (w, h) = image::image_dimensions(&file).map_err(|source| AssetError::Image {
                path: file.clone(),
                source,
            })?;
            frames.push(Vec2::new(w as f32, h as f32));
        }
        if frames.is_empty() {
            log::warn!("animation folder `{path}` has no frames");
        }

        let clip = Arc::new(AnimationClip::new(path, frames));
        self.clips.insert(path.to_string(), Arc::clone(&clip));
        Ok(clip)
    }

    fn weapon_info(&mut self, name: &str) -> Result<WeaponInfo, AssetError> {
        let text = self.read_text(&format!("weapon/{name}/info.json"))?;
        Ok(WeaponInfo::from_json(name, &text)?)
    }

    fn food_info(&mut self, name: &str) -> Result<FoodInfo, AssetError> {
        let text = self.read_text(&format!("food/{name}/info.json"))?;
        Ok(FoodInfo::from_json(name, &text)?)
    }

    fn playlist(&mut self, path: &str) -> Result<Playlist, AssetError> {
        let sounds = self
            .numbered_entries(path)?
            .into_iter()
            .map(|(_, file)| SoundId::new(file.to_string_lossy().as_ref()))
            .collect();
        Ok(Playlist::new(sounds))
    }

    fn sound(&mut self, path: &str) -> SoundId {
        SoundId::new(self.root.join(path).to_string_lossy().as_ref())
    }
}

const BUILTIN_WEAPONS: &[(&str, &str)] = &[
    (
        "ak47",
        r#"{
            "handpoint": [14, 20], "barrel": [62, 9], "recoil": 5, "type": "gun",
            "shooting_cooldown": 0.1, "bullet_velocity": 2000, "bullet_lifetime": 1,
            "damage": 20, "clip_max_ammo": 30, "total_ammo": 120, "reloading_time": 1.5,
            "bullet_line_color": [255, 230, 150]
        }"#,
    ),
    (
        "bluetagon",
        r#"{
            "handpoint": [12, 18], "barrel": [70, 8], "recoil": 8, "type": "gun",
            "shooting_cooldown": 0.25, "bullet_velocity": 2600, "bullet_lifetime": 1,
            "damage": 45, "clip_max_ammo": 12, "total_ammo": 60, "reloading_time": 2,
            "bullet_line_color": [120, 190, 255]
        }"#,
    ),
    (
        "flamethrower",
        r#"{
            "handpoint": [20, 22], "barrel": [76, 12], "recoil": 1, "type": "flamethrower",
            "shooting_cooldown": 0.03, "bullet_velocity": 900, "bullet_lifetime": 0.8,
            "damage": 4, "clip_max_ammo": 200, "total_ammo": 600, "reloading_time": 2.5,
            "bullet_velocity_decay_halflife": 0.25, "bullet_start_size": 12,
            "bullet_end_size": 96, "bullet_heat": 120,
            "flamesmoke_velocity": 500, "flamesmoke_velocity_decay_halflife": 0.3,
            "flamesmoke_start_size": 16, "flamesmoke_end_size": 128,
            "flamesmoke_lifetime": 1.2, "flamesmoke_start_alpha": 120,
            "flamesmoke_end_alpha": 0
        }"#,
    ),
    (
        "missile_launcher",
        r#"{
            "handpoint": [24, 24], "barrel": [90, 12], "recoil": 20, "type": "missile_launcher",
            "shooting_cooldown": 0.8, "bullet_velocity": 700, "bullet_lifetime": 2,
            "damage": 80, "clip_max_ammo": 4, "total_ammo": 12, "reloading_time": 3
        }"#,
    ),
];

const BUILTIN_FOODS: &[(&str, &str)] = &[
    (
        "bread",
        r#"{ "hp_recover": 40, "eating_time": 1.5, "quantity": 3 }"#,
    ),
    (
        "icescream",
        r#"{ "hp_recover": 80, "eating_time": 2.5, "quantity": 1 }"#,
    ),
];

/// In-memory provider for tests and hosts that bundle their data.
///
/// Unknown animation paths resolve to a fallback clip so a level can be
/// built without any files on disk.
pub struct MemoryAssets {
    clips: HashMap<String, Arc<AnimationClip>>,
    weapons: HashMap<String, WeaponInfo>,
    foods: HashMap<String, FoodInfo>,
    fallback_size: Vec2,
    fallback_frames: usize,
}

impl MemoryAssets {
    /// Empty provider with a 128x128, 4-frame fallback clip.
    pub fn new() -> Self {
        Self {
            clips: HashMap::new(),
            weapons: HashMap::new(),
            foods: HashMap::new(),
            fallback_size: Vec2::new(128.0, 128.0),
            fallback_frames: 4,
        }
    }

    /// Provider preloaded with the stock weapons and foods.
    pub fn with_builtin_tuning() -> Result<Self, AssetError> {
        let mut assets = Self::new();
        for (name, json) in BUILTIN_WEAPONS {
            assets.insert_weapon(WeaponInfo::from_json(name, json)?);
        }
        for (name, json) in BUILTIN_FOODS {
            assets.insert_food(FoodInfo::from_json(name, json)?);
        }
        Ok(assets)
    }

    pub fn with_fallback(mut self, size: Vec2, frames: usize) -> Self {
        self.fallback_size = size;
        self.fallback_frames = frames;
        self
    }

    pub fn with_clip(mut self, path: &str, size: Vec2, frames: usize) -> Self {
        self.insert_clip(AnimationClip::uniform(path, size, frames));
        self
    }

    pub fn insert_clip(&mut self, clip: AnimationClip) {
        self.clips.insert(clip.path.to_string(), Arc::new(clip));
    }

    pub fn insert_weapon(&mut self, info: WeaponInfo) {
        self.weapons.insert(info.name.clone(), info);
    }

    pub fn insert_food(&mut self, info: FoodInfo) {
        self.foods.insert(info.name.clone(), info);
    }
}

impl Default for MemoryAssets {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetProvider for MemoryAssets {
    fn animation(&mut self, path: &str) -> Result<Arc<AnimationClip>, AssetError> {
        let (size, frames) = (self.fallback_size, self.fallback_frames);
        let clip = self
            .clips
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(AnimationClip::uniform(path, size, frames)));
        Ok(Arc::clone(clip))
    }

    fn weapon_info(&mut self, name: &str) -> Result<WeaponInfo, AssetError> {
        self.weapons
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::UnknownWeapon(name.to_string()))
    }

    fn food_info(&mut self, name: &str) -> Result<FoodInfo, AssetError> {
        self.foods
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::UnknownFood(name.to_string()))
    }

    fn playlist(&mut self, path: &str) -> Result<Playlist, AssetError> {
        Ok(Playlist::new(vec![SoundId::new(path)]))
    }
}

//! Level selection between runs.

use serde::{Deserialize, Serialize};

/// Where a level asks the game to go next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelSelector {
    Menu,
    Next,
    Restart,
    Exit,
    Index(usize),
}

/// What the host should show after resolving a selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowTarget {
    Menu,
    Level(usize),
    Exit,
}

/// Tracks the current level index and resolves transition requests
/// against the number of available levels.
#[derive(Debug, Clone)]
pub struct GameFlow {
    level_count: usize,
    current: Option<usize>,
    running: bool,
}

impl GameFlow {
    /// Starts on the menu.
    pub fn new(level_count: usize) -> Self {
        Self {
            level_count,
            current: None,
            running: true,
        }
    }

    /// `None` while the menu is showing.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn level_count(&self) -> usize {
        self.level_count
    }

    pub fn go_to(&mut self, selector: LevelSelector) -> FlowTarget {
        let target = match selector {
            LevelSelector::Menu => FlowTarget::Menu,
            LevelSelector::Exit => FlowTarget::Exit,
            LevelSelector::Next => match self.current {
                Some(index) if index + 1 < self.level_count => FlowTarget::Level(index + 1),
                Some(_) => FlowTarget::Menu,
                None if self.level_count > 0 => FlowTarget::Level(0),
                None => FlowTarget::Menu,
            },
            LevelSelector::Restart => match self.current {
                Some(index) => FlowTarget::Level(index),
                None => FlowTarget::Menu,
            },
            LevelSelector::Index(index) if index < self.level_count => FlowTarget::Level(index),
            LevelSelector::Index(index) => {
                log::warn!("level {index} does not exist, returning to menu");
                FlowTarget::Menu
            }
        };

        match target {
            FlowTarget::Menu => self.current = None,
            FlowTarget::Level(index) => self.current = Some(index),
            FlowTarget::Exit => self.running = false,
        }
        log::info!("level flow: {selector:?} -> {target:?}");
        target
    }
}

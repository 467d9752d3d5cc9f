use std::collections::{HashMap, HashSet};

use crate::math::Vec2;

/// Keys the simulation reacts to. Hosts translate their window events
/// into these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    R,
    Shift,
    Escape,
    Backquote,
    /// Number row, `1..=9`.
    Digit(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Tracks keyboard and mouse state across frames.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    keys_down: HashSet<Key>,
    keys_pressed: HashSet<Key>,
    keys_released: HashSet<Key>,

    mouse_x: f32,
    mouse_y: f32,
    mouse_down: [bool; 3],
    mouse_pressed: [bool; 3],
    mouse_released: [bool; 3],
    scroll: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame pressed/released flags and the scroll delta.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_pressed.fill(false);
        self.mouse_released.fill(false);
        self.scroll = 0.0;
    }

    pub fn press_key(&mut self, key: Key) {
        if !self.keys_down.contains(&key) {
            self.keys_pressed.insert(key);
        }
        self.keys_down.insert(key);
    }

    pub fn release_key(&mut self, key: Key) {
        self.keys_down.remove(&key);
        self.keys_released.insert(key);
    }

    pub fn press_mouse(&mut self, button: MouseButton) {
        let idx = mouse_button_index(button);
        if !self.mouse_down[idx] {
            self.mouse_pressed[idx] = true;
        }
        self.mouse_down[idx] = true;
    }

    pub fn release_mouse(&mut self, button: MouseButton) {
        let idx = mouse_button_index(button);
        self.mouse_down[idx] = false;
        self.mouse_released[idx] = true;
    }

    /// Handle mouse cursor movement, in screen pixels.
    pub fn set_cursor(&mut self, x: f32, y: f32) {
        self.mouse_x = x;
        self.mouse_y = y;
    }

    /// Accumulate wheel movement. Positive scrolls up.
    pub fn add_scroll(&mut self, delta: f32) {
        self.scroll += delta;
    }

    /// Returns true if the key is currently held down.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the key was pressed this frame.
    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the key was released this frame.
    pub fn is_key_released(&self, key: Key) -> bool {
        self.keys_released.contains(&key)
    }

    /// Returns true if the mouse button is currently held down.
    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_down[mouse_button_index(button)]
    }

    /// Returns true if the mouse button was pressed this frame.
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed[mouse_button_index(button)]
    }

    /// Returns true if the mouse button was released this frame.
    pub fn is_mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_released[mouse_button_index(button)]
    }

    /// Current mouse cursor position in screen pixels.
    pub fn mouse_position(&self) -> Vec2 {
        Vec2::new(self.mouse_x, self.mouse_y)
    }

    /// Wheel movement since the last `begin_frame`.
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// First held number-row key, as a zero-based slot index.
    pub fn held_slot(&self) -> Option<usize> {
        (1..=9u8)
            .find(|&n| self.is_key_down(Key::Digit(n)))
            .map(|n| usize::from(n - 1))
    }
}

/// Logical actions the player controller queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Fire,
    Aim,
    Sprint,
    Reload,
    Holster,
    Leave,
}

/// Movement axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A physical button that can be bound to an action or axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Key(Key),
    Mouse(MouseButton),
}

impl Button {
    fn is_down(self, input: &InputState) -> bool {
        match self {
            Button::Key(k) => input.is_key_down(k),
            Button::Mouse(b) => input.is_mouse_down(b),
        }
    }
}

/// A one-dimensional axis binding (-1..1).
#[derive(Clone, Debug)]
pub struct AxisBinding {
    pub negative: Vec<Button>,
    pub positive: Vec<Button>,
}

impl AxisBinding {
    pub fn new(negative: Vec<Button>, positive: Vec<Button>) -> Self {
        Self { negative, positive }
    }
}

/// Mapping from actions/axes to physical inputs.
#[derive(Clone, Debug)]
pub struct InputMap {
    actions: HashMap<Action, Vec<Button>>,
    axes: HashMap<Axis, AxisBinding>,
}

impl InputMap {
    /// Create an empty input map.
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
            axes: HashMap::new(),
        }
    }

    /// WASD movement, Shift sprint, left click fire, right click aim, R
    /// reload, backquote holster, Escape leave.
    pub fn player_defaults() -> Self {
        let mut map = Self::new();
        map.set_axis(
            Axis::Horizontal,
            AxisBinding::new(vec![Button::Key(Key::A)], vec![Button::Key(Key::D)]),
        );
        map.set_axis(
            Axis::Vertical,
            AxisBinding::new(vec![Button::Key(Key::W)], vec![Button::Key(Key::S)]),
        );
        map.bind(Action::Fire, Button::Mouse(MouseButton::Left));
        map.bind(Action::Aim, Button::Mouse(MouseButton::Right));
        map.bind(Action::Sprint, Button::Key(Key::Shift));
        map.bind(Action::Reload, Button::Key(Key::R));
        map.bind(Action::Holster, Button::Key(Key::Backquote));
        map.bind(Action::Leave, Button::Key(Key::Escape));
        map
    }

    pub fn bind(&mut self, action: Action, button: Button) {
        self.actions.entry(action).or_default().push(button);
    }

    /// Define or replace an axis binding.
    pub fn set_axis(&mut self, axis: Axis, binding: AxisBinding) {
        self.axes.insert(axis, binding);
    }

    /// Check if an action is currently held down.
    pub fn action_down(&self, input: &InputState, action: Action) -> bool {
        self.actions
            .get(&action)
            .map(|buttons| buttons.iter().any(|&b| b.is_down(input)))
            .unwrap_or(false)
    }

    /// Value of an axis. Opposite sides cancel out.
    pub fn axis(&self, input: &InputState, axis: Axis) -> f32 {
        let Some(binding) = self.axes.get(&axis) else {
            return 0.0;
        };
        let mut value = 0.0;
        if binding.negative.iter().any(|&b| b.is_down(input)) {
            value -= 1.0;
        }
        if binding.positive.iter().any(|&b| b.is_down(input)) {
            value += 1.0;
        }
        value
    }

    /// Both movement axes as a vector (not normalised).
    pub fn movement(&self, input: &InputState) -> Vec2 {
        Vec2::new(
            self.axis(input, Axis::Horizontal),
            self.axis(input, Axis::Vertical),
        )
    }
}

impl Default for InputMap {
    fn default() -> Self {
        Self::player_defaults()
    }
}

fn mouse_button_index(button: MouseButton) -> usize {
    match button {
        MouseButton::Left => 0,
        MouseButton::Right => 1,
        MouseButton::Middle => 2,
    }
}

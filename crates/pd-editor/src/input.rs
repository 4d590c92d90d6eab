//! Input abstraction layer.
//!
//! The shell normalizes mouse, wheel and keyboard events into
//! [`InputEvent`]s in scene coordinates. Raw key state is translated once
//! per event into semantic [`InputModifiers`] so tools never look at
//! physical keys.

use kurbo::Point;

/// Physical modifier keys held while an event fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyState {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Platform command key: ⌘ on macOS, Ctrl elsewhere.
    pub fn cmd(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// What the held modifiers *mean* to the tools.
///
/// | Key | Meaning |
/// |-----|---------|
/// | Alt | bypass grid snapping |
/// | Shift | constrain angle (line), reverse arc direction, extend selection |
/// | Ctrl / ⌘ | major arc |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputModifiers {
    pub bypass_snap: bool,
    pub constrain_angle: bool,
    pub reverse_arc: bool,
    pub major_arc: bool,
    pub extend_selection: bool,
}

impl InputModifiers {
    pub const NONE: Self = Self {
        bypass_snap: false,
        constrain_angle: false,
        reverse_arc: false,
        major_arc: false,
        extend_selection: false,
    };

    pub fn from_keys(keys: KeyState) -> Self {
        Self {
            bypass_snap: keys.alt,
            constrain_angle: keys.shift,
            reverse_arc: keys.shift,
            major_arc: keys.cmd(),
            extend_selection: keys.shift,
        }
    }
}

/// Which pointer button went down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed.
    PointerDown {
        pos: Point,
        button: PointerButton,
        keys: KeyState,
    },

    /// Pointer moved, with or without a button held.
    PointerMove { pos: Point, keys: KeyState },

    /// Pointer released.
    PointerUp { pos: Point, keys: KeyState },

    /// Wheel rotation. `delta` is in eighths of a degree (120 per notch).
    Wheel {
        pos: Point,
        delta: f64,
        keys: KeyState,
    },

    /// Key pressed. `key` is the `KeyboardEvent.key` value.
    Key { key: String, keys: KeyState },

    /// Key released. Only held keys such as Space care about this.
    KeyUp { key: String, keys: KeyState },

    /// The canvas lost input focus; in-flight gestures are abandoned.
    FocusLost,
}

impl InputEvent {
    /// Primary-button press with no modifiers.
    pub fn press(x: f64, y: f64) -> Self {
        Self::PointerDown {
            pos: Point::new(x, y),
            button: PointerButton::Primary,
            keys: KeyState::NONE,
        }
    }

    pub fn drag(x: f64, y: f64) -> Self {
        Self::PointerMove {
            pos: Point::new(x, y),
            keys: KeyState::NONE,
        }
    }

    /// Whether this is a press or release of the Space bar.
    pub fn is_space(&self) -> bool {
        matches!(self, Self::Key { key, .. } | Self::KeyUp { key, .. } if key == " ")
    }

    pub fn release(x: f64, y: f64) -> Self {
        Self::PointerUp {
            pos: Point::new(x, y),
            keys: KeyState::NONE,
        }
    }

    /// Same event with different modifier keys. Events without key state
    /// are returned unchanged.
    pub fn with_keys(mut self, new_keys: KeyState) -> Self {
        match &mut self {
            Self::PointerDown { keys, .. }
            | Self::PointerMove { keys, .. }
            | Self::PointerUp { keys, .. }
            | Self::Wheel { keys, .. }
            | Self::Key { keys, .. }
            | Self::KeyUp { keys, .. } => *keys = new_keys,
            Self::FocusLost => {}
        }
        self
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { pos, .. }
            | Self::PointerMove { pos, .. }
            | Self::PointerUp { pos, .. }
            | Self::Wheel { pos, .. } => Some(*pos),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> InputModifiers {
        match self {
            Self::PointerDown { keys, .. }
            | Self::PointerMove { keys, .. }
            | Self::PointerUp { keys, .. }
            | Self::Wheel { keys, .. }
            | Self::Key { keys, .. }
            | Self::KeyUp { keys, .. } => InputModifiers::from_keys(*keys),
            Self::FocusLost => InputModifiers::NONE,
        }
    }
}

//! # EGE Events
//!
//! Everything a backend reports and layers react to.
//!
//! ```text
//! ┌─────────────┐  poll_input   ┌─────────────┐  on_event (top-first)  ┌─────────┐
//! │   Backend   │──────────────>│   Runtime   │───────────────────────>│ Layers  │
//! └─────────────┘               └─────────────┘                        └─────────┘
//! ```
//!
//! Events are small and `Copy` so they can travel through an
//! [`SpscQueue`](ege_core::SpscQueue) without allocation.

/// Left mouse button number.
pub const MOUSE_LEFT: u8 = 1;

/// Middle mouse button number.
pub const MOUSE_MIDDLE: u8 = 2;

/// Right mouse button number.
pub const MOUSE_RIGHT: u8 = 3;

/// An engine event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// User input from the backend.
    Input(InputEvent),

    /// Request to play a tone.
    Sound {
        /// Sound identifier.
        id: u32,
        /// Tone frequency in Hz.
        frequency: f32,
        /// Length in seconds.
        duration: f32,
    },

    /// An animation cue.
    Animation {
        /// Animation identifier.
        id: u32,
    },
}

/// User input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// The user asked the application to close.
    Quit,

    /// A key changed state.
    Key {
        /// Backend key code.
        code: u32,
        /// True on press, false on release.
        pressed: bool,
    },

    /// A mouse button changed state.
    MouseButton {
        /// Button number ([`MOUSE_LEFT`], [`MOUSE_MIDDLE`], [`MOUSE_RIGHT`], ...).
        button: u8,
        /// True on press, false on release.
        pressed: bool,
        /// Cursor x in pixels.
        x: i32,
        /// Cursor y in pixels.
        y: i32,
    },

    /// The cursor moved.
    MouseMotion {
        /// Cursor x in pixels.
        x: i32,
        /// Cursor y in pixels.
        y: i32,
    },
}

impl Event {
    /// Shorthand for `Event::Input(InputEvent::Quit)`.
    pub const QUIT: Self = Self::Input(InputEvent::Quit);

    /// Returns the input payload, if this is an input event.
    #[inline]
    #[must_use]
    pub const fn as_input(&self) -> Option<&InputEvent> {
        match self {
            Self::Input(input) => Some(input),
            _ => None,
        }
    }

    /// Returns true for a quit request.
    #[inline]
    #[must_use]
    pub const fn is_shutdown(&self) -> bool {
        matches!(self, Self::Input(InputEvent::Quit))
    }

    /// Returns true for a left button press.
    #[inline]
    #[must_use]
    pub const fn is_left_click(&self) -> bool {
        self.is_press_of(MOUSE_LEFT)
    }

    /// Returns true for a right button press.
    #[inline]
    #[must_use]
    pub const fn is_right_click(&self) -> bool {
        self.is_press_of(MOUSE_RIGHT)
    }

    const fn is_press_of(&self, expected: u8) -> bool {
        matches!(
            self,
            Self::Input(InputEvent::MouseButton { button, pressed: true, .. }) if *button == expected
        )
    }
}

impl From<InputEvent> for Event {
    fn from(input: InputEvent) -> Self {
        Self::Input(input)
    }
}

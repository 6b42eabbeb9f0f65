use std::fmt;

/// Keyboard key identifier.
///
/// Only the keys the runtime maps; everything else arrives as `Unknown`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Tab,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    BracketLeft,
    BracketRight,
    Minus,
    Equal,

    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    /// Platform key code not represented above.
    Unknown(u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Platform-agnostic input events emitted by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: KeyState,
        /// True for auto-repeat presses.
        repeat: bool,
    },

    /// Pointer position in physical pixels, origin top-left.
    PointerMoved { x: f32, y: f32 },

    /// Pointer left the window surface.
    PointerLeft,

    Focused(bool),
}

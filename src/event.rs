//! Raw input events, as reported by device back-ends.
//!
//! Devices deliver their state as a stream of [`InputEvent`]s. Each event names a key or
//! button through an exhaustive, device-tagged code, and a phase: just pressed, held, or just
//! released. Everything downstream (binding tables, focus and hover routing) works purely on
//! these values and never talks to a device directly.

/// A key on the keyboard. Values name physical keys in a US layout; text input is delivered
/// separately through the focus system's text queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyboardKey {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    LeftShift,
    RightShift,
    LeftControl,
    RightControl,
    LeftAlt,
    RightAlt,
    LeftSuper,
    RightSuper,
    Comma,
    Period,
    Slash,
    Backslash,
    Semicolon,
    Apostrophe,
    Minus,
    Equal,
    Grave,
    LeftBracket,
    RightBracket,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
}

/// A button on a mouse or other pointing device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
}

/// A button on a gamepad, named after positions rather than glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadButton {
    /// Bottom face button; "cross" on a DualShock.
    Cross,
    /// Right face button; "circle" on a DualShock.
    Circle,
    /// Left face button; "square" on a DualShock.
    Square,
    /// Top face button; "triangle" on a DualShock.
    Triangle,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
    Select,
    Start,
    LeftStick,
    RightStick,
}

/// The class of device an event code belongs to. Routing uses this to decide whether an
/// action goes to the focused node (keyboard, gamepad) or the hovered one (mouse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Keyboard,
    Mouse,
    Gamepad,
}

/// Uniquely identifies a pressed key or button across all supported device classes.
///
/// This is also the item type of input strokes: a stroke is an ordered sequence of these
/// codes, and equality is element-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEventCode {
    Keyboard(KeyboardKey),
    Mouse(MouseButton),
    Gamepad(GamepadButton),
}

impl InputEventCode {
    pub const fn device(&self) -> DeviceKind {
        match self {
            Self::Keyboard(_) => DeviceKind::Keyboard,
            Self::Mouse(_) => DeviceKind::Mouse,
            Self::Gamepad(_) => DeviceKind::Gamepad,
        }
    }
}

impl From<KeyboardKey> for InputEventCode {
    fn from(key: KeyboardKey) -> Self {
        Self::Keyboard(key)
    }
}

impl From<MouseButton> for InputEventCode {
    fn from(button: MouseButton) -> Self {
        Self::Mouse(button)
    }
}

impl From<GamepadButton> for InputEventCode {
    fn from(button: GamepadButton) -> Self {
        Self::Gamepad(button)
    }
}

/// Which part of a press the event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPhase {
    /// The key or button went down this frame.
    Press,

    /// The key or button remains down. Re-sent every frame between press and release;
    /// keyboards additionally re-send `Press` through OS key repeat.
    Hold,

    /// The key or button went up this frame.
    Release,
}

/// An event coming from an input device: a key or button changing or holding its state.
///
/// Only binary events are covered; analog sources such as joystick axes need translation
/// before they can participate in bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputEvent {
    /// The key or button the event describes.
    pub code: InputEventCode,

    /// State the key or button is in.
    pub phase: EventPhase,
}

impl InputEvent {
    pub fn new(code: impl Into<InputEventCode>, phase: EventPhase) -> Self {
        Self { code: code.into(), phase }
    }

    /// True if this event should trigger input actions bound to its code.
    ///
    /// A key or button is down for many frames, but only one of them activates the binding:
    /// the press for keyboards and gamepads, the release for mouse buttons. Firing mouse
    /// actions on release is what makes it possible to cancel a click by dragging away.
    pub const fn is_active(&self) -> bool {
        match self.code.device() {
            DeviceKind::Keyboard | DeviceKind::Gamepad => {
                matches!(self.phase, EventPhase::Press)
            }
            DeviceKind::Mouse => matches!(self.phase, EventPhase::Release),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_phase_depends_on_device() {
        let key = InputEvent::new(KeyboardKey::Space, EventPhase::Press);
        assert!(key.is_active());
        let key = InputEvent::new(KeyboardKey::Space, EventPhase::Release);
        assert!(!key.is_active());

        let mouse = InputEvent::new(MouseButton::Left, EventPhase::Press);
        assert!(!mouse.is_active());
        let mouse = InputEvent::new(MouseButton::Left, EventPhase::Release);
        assert!(mouse.is_active());
    }
}

//! Small host-side service contracts: devices, clipboard, files, time, preferences and
//! debug signals.
//!
//! Everything here is an interface the core consumes; concrete device polling and OS
//! integration live with the host. The few implementations provided (`StdFileIo`,
//! `SystemClock`, `DefaultPreferences`, `DiscardSignals`) cover the cases that need no
//! platform glue.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::event::InputEvent;
use crate::hover::HoverIo;

/// A mouse or other pointing device back-end.
///
/// Once per frame the device reports its buttons as events and registers its pointers with
/// the hover system of the branch it lives under.
pub trait MouseIo {
    /// Collect the button events that occurred since the last poll.
    fn poll(&mut self) -> Vec<InputEvent>;

    /// Register the device's pointers for this frame.
    fn load_pointers(&mut self, hover: &mut dyn HoverIo);
}

/// A keyboard back-end: reports key events once per frame. Typed text goes through the
/// focus system's text queue instead.
pub trait KeyboardIo {
    fn poll(&mut self) -> Vec<InputEvent>;
}

/// A gamepad back-end: reports button events once per frame.
pub trait GamepadIo {
    fn poll(&mut self) -> Vec<InputEvent>;
}

/// System clipboard access. Holds a single current selection.
pub trait ClipboardIo {
    fn value(&self) -> String;

    fn set_value(&mut self, value: &str);
}

/// Filesystem access for nodes that load or save resources.
pub trait FileIo {
    fn load_file(&mut self, path: &Path) -> std::io::Result<Vec<u8>>;

    fn write_file(&mut self, path: &Path, data: &[u8]) -> std::io::Result<()>;
}

/// [`FileIo`] over the process's real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileIo;

impl FileIo for StdFileIo {
    fn load_file(&mut self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write_file(&mut self, path: &Path, data: &[u8]) -> std::io::Result<()> {
        std::fs::write(path, data)
    }
}

/// Time source. Tests substitute a steppable clock, so nodes must never read the system
/// time directly.
pub trait TimeIo {
    fn now(&self) -> Instant;

    fn time_since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }
}

/// [`TimeIo`] over the system's monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeIo for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// User preferences relevant to input handling.
pub trait PreferenceIo {
    /// Maximum time between two presses for them to count as a double click.
    fn double_click_interval(&self) -> Duration {
        Duration::from_millis(500)
    }
}

/// [`PreferenceIo`] with every default left in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPreferences;

impl PreferenceIo for DefaultPreferences {}

/// Sink for test-oriented signals nodes may emit while they work.
pub trait DebugSignalIo {
    fn emit_signal(&mut self, name: &str);
}

/// [`DebugSignalIo`] that drops everything; for production hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSignals;

impl DebugSignalIo for DiscardSignals {
    fn emit_signal(&mut self, _name: &str) {}
}

//! Headless implementations of every service contract, plus a ready-made test tree.
//!
//! Nothing here touches a window or a GPU: the canvas records its draw primitives, the
//! clock only moves when told to, and devices are plain structs fed by the test. The
//! [`TestTree`] wires the standard chain of input map, focus, hover and overlay around a
//! root node, matching how a real host assembles the tree.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::action::{InputMapChain, InputMapState};
use crate::canvas::{CanvasIo, ImageCache, ImageHandle};
use crate::context::{ResizeError, SharedIo};
use crate::event::{EventPhase, GamepadButton, InputEvent, KeyboardKey, MouseButton};
use crate::focus::{FocusChain, FocusIo, FocusState};
use crate::geometry::{Color, Rectangle, Vector2};
use crate::hover::{HoverChain, HoverIo, HoverState};
use crate::image::Image;
use crate::input::{InputMap, default_input_map};
use crate::io::{
    ClipboardIo, DebugSignalIo, DefaultPreferences, GamepadIo, KeyboardIo, MouseIo, StdFileIo,
    TimeIo,
};
use crate::node::Node;
use crate::overlay::{OverlayChain, OverlayState};
use crate::tree::LayoutTree;

/// One recorded canvas operation. Tint is already folded into the colors.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasCommand {
    Rectangle {
        rectangle: Rectangle,
        color: Color,
    },
    Line {
        start: Vector2,
        end: Vector2,
        width: f32,
        color: Color,
    },
    Circle {
        center: Vector2,
        radius: f32,
        color: Color,
    },
    CircleOutline {
        center: Vector2,
        radius: f32,
        width: f32,
        color: Color,
    },
    Image {
        handle: ImageHandle,
        destination: Rectangle,
        tint: Color,
        hinted: bool,
    },
    CropTo(Rectangle),
    CropOff,
}

/// A canvas that records everything drawn to it instead of rendering.
pub struct HeadlessCanvas {
    commands: Vec<CanvasCommand>,
    crop: Option<Rectangle>,
    tint: Color,
    scale: f32,
    dpi: Vector2,
    cache: ImageCache,
}

impl HeadlessCanvas {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            crop: None,
            tint: Color::WHITE,
            scale: 1.0,
            dpi: Vector2::new(96.0, 96.0),
            cache: ImageCache::new(),
        }
    }

    pub fn with_dpi(dpi: Vector2) -> Self {
        Self { dpi, ..Self::new() }
    }

    /// Everything recorded since the last [`clear`](Self::clear).
    pub fn commands(&self) -> &[CanvasCommand] {
        &self.commands
    }

    /// Drop the recording; typically called right before the frame under test.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// The rectangles drawn, with tint folded in. A convenience for the common assertion.
    pub fn rectangles(&self) -> Vec<(Rectangle, Color)> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                CanvasCommand::Rectangle { rectangle, color } => Some((*rectangle, *color)),
                _ => None,
            })
            .collect()
    }

    /// A stable textual form of the recording, for fixture comparison by hash.
    pub fn command_log(&self) -> String {
        format!("{:#?}", self.commands)
    }

    pub fn image_cache(&self) -> &ImageCache {
        &self.cache
    }
}

impl Default for HeadlessCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasIo for HeadlessCanvas {
    fn dpi(&self) -> Vector2 {
        self.dpi
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn scale(&self) -> f32 {
        self.scale
    }

    fn crop_to(&mut self, rect: Rectangle) -> Option<Rectangle> {
        self.commands.push(CanvasCommand::CropTo(rect));
        self.crop.replace(rect)
    }

    fn restore_crop(&mut self, previous: Option<Rectangle>) {
        self.commands.push(match previous {
            Some(rect) => CanvasCommand::CropTo(rect),
            None => CanvasCommand::CropOff,
        });
        self.crop = previous;
    }

    fn set_tint(&mut self, tint: Color) -> Color {
        std::mem::replace(&mut self.tint, tint)
    }

    fn tint(&self) -> Color {
        self.tint
    }

    fn draw_rectangle(&mut self, rectangle: Rectangle, color: Color) {
        let color = color.multiply(self.tint);
        self.commands.push(CanvasCommand::Rectangle { rectangle, color });
    }

    fn draw_line(&mut self, start: Vector2, end: Vector2, width: f32, color: Color) {
        let color = color.multiply(self.tint);
        self.commands.push(CanvasCommand::Line { start, end, width, color });
    }

    fn draw_circle(&mut self, center: Vector2, radius: f32, color: Color) {
        let color = color.multiply(self.tint);
        self.commands.push(CanvasCommand::Circle { center, radius, color });
    }

    fn draw_circle_outline(&mut self, center: Vector2, radius: f32, width: f32, color: Color) {
        let color = color.multiply(self.tint);
        self.commands.push(CanvasCommand::CircleOutline { center, radius, width, color });
    }

    fn draw_image(&mut self, handle: ImageHandle, destination: Rectangle, tint: Color) {
        self.cache.mark_used(handle);
        let tint = tint.multiply(self.tint);
        self.commands.push(CanvasCommand::Image { handle, destination, tint, hinted: false });
    }

    fn draw_hinted_image(&mut self, handle: ImageHandle, destination: Rectangle, tint: Color) {
        self.cache.mark_used(handle);
        let tint = tint.multiply(self.tint);
        self.commands.push(CanvasCommand::Image { handle, destination, tint, hinted: true });
    }

    fn load_image(&mut self, image: &Image) -> ImageHandle {
        self.cache.load(image)
    }

    fn unload_image(&mut self, handle: ImageHandle) {
        self.cache.unload(handle);
    }

    fn next_frame(&mut self) {
        self.cache.sweep();
    }
}

/// A clock that only moves when the test advances it.
pub struct HeadlessClock {
    base: Instant,
    offset: Duration,
}

impl HeadlessClock {
    pub fn new() -> Self {
        Self { base: Instant::now(), offset: Duration::ZERO }
    }

    pub fn advance(&mut self, by: Duration) {
        self.offset += by;
    }
}

impl Default for HeadlessClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeIo for HeadlessClock {
    fn now(&self) -> Instant {
        self.base + self.offset
    }
}

/// An in-process clipboard.
#[derive(Debug, Clone, Default)]
pub struct LocalClipboard {
    value: String,
}

impl ClipboardIo for LocalClipboard {
    fn value(&self) -> String {
        self.value.clone()
    }

    fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }
}

/// A debug-signal sink that counts emissions by name.
#[derive(Debug, Default)]
pub struct CountingSignals {
    counts: HashMap<String, usize>,
}

impl CountingSignals {
    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }
}

impl DebugSignalIo for CountingSignals {
    fn emit_signal(&mut self, name: &str) {
        *self.counts.entry(name.to_string()).or_default() += 1;
    }
}

/// A scriptable keyboard device.
#[derive(Debug, Default)]
pub struct VirtualKeyboard {
    events: Vec<InputEvent>,
}

impl VirtualKeyboard {
    pub fn press(&mut self, key: KeyboardKey) {
        self.events.push(InputEvent::new(key, EventPhase::Press));
    }

    pub fn release(&mut self, key: KeyboardKey) {
        self.events.push(InputEvent::new(key, EventPhase::Release));
    }

    pub fn hold(&mut self, key: KeyboardKey) {
        self.events.push(InputEvent::new(key, EventPhase::Hold));
    }
}

impl KeyboardIo for VirtualKeyboard {
    fn poll(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }
}

/// A scriptable gamepad device.
#[derive(Debug, Default)]
pub struct VirtualGamepad {
    events: Vec<InputEvent>,
}

impl VirtualGamepad {
    pub fn press(&mut self, button: GamepadButton) {
        self.events.push(InputEvent::new(button, EventPhase::Press));
    }

    pub fn release(&mut self, button: GamepadButton) {
        self.events.push(InputEvent::new(button, EventPhase::Release));
    }
}

impl GamepadIo for VirtualGamepad {
    fn poll(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }
}

/// A scriptable mouse with a single pointer.
#[derive(Debug)]
pub struct VirtualMouse {
    pub position: Vector2,
    pressed: bool,
    scroll: Vector2,
    scroll_held: bool,
    active: bool,
    events: Vec<InputEvent>,
}

impl VirtualMouse {
    pub fn new() -> Self {
        Self {
            position: Vector2::ZERO,
            pressed: false,
            scroll: Vector2::ZERO,
            scroll_held: false,
            active: false,
            events: Vec::new(),
        }
    }

    /// Move the pointer, registering it with the hover system from the next frame on.
    pub fn move_to(&mut self, position: Vector2) {
        self.position = position;
        self.active = true;
    }

    pub fn press(&mut self) {
        self.active = true;
        self.pressed = true;
        self.events.push(InputEvent::new(MouseButton::Left, EventPhase::Press));
    }

    pub fn release(&mut self) {
        self.pressed = false;
        self.events.push(InputEvent::new(MouseButton::Left, EventPhase::Release));
    }

    /// Scroll by the given delta on the next frame.
    pub fn scroll(&mut self, delta: Vector2, held: bool) {
        self.active = true;
        self.scroll = delta;
        self.scroll_held = held;
    }
}

impl Default for VirtualMouse {
    fn default() -> Self {
        Self::new()
    }
}

impl MouseIo for VirtualMouse {
    fn poll(&mut self) -> Vec<InputEvent> {
        let mut events = std::mem::take(&mut self.events);
        if self.pressed {
            events.push(InputEvent::new(MouseButton::Left, EventPhase::Hold));
        }
        events
    }

    fn load_pointers(&mut self, hover: &mut dyn HoverIo) {
        if !self.active {
            return;
        }
        hover.load_pointer(
            0,
            0,
            self.position,
            self.scroll,
            self.pressed,
            self.scroll_held,
        );
        // Scroll deltas are per frame.
        self.scroll = Vector2::ZERO;
    }
}

/// A complete headless tree: the standard chain wired around a root node, every service
/// contract satisfied by a headless implementation.
///
/// The chain matches a typical host: input map, then focus, then hover, then the overlay
/// layer, then the user's root.
pub struct TestTree {
    tree: LayoutTree,
    canvas: Rc<RefCell<HeadlessCanvas>>,
    clock: Rc<RefCell<HeadlessClock>>,
    clipboard: Rc<RefCell<LocalClipboard>>,
    signals: Rc<RefCell<CountingSignals>>,
    keyboard: Rc<RefCell<VirtualKeyboard>>,
    gamepad: Rc<RefCell<VirtualGamepad>>,
    mouse: Rc<RefCell<VirtualMouse>>,
    input_map: SharedIo<InputMapState>,
    focus: SharedIo<FocusState>,
    hover_state: SharedIo<HoverState>,
    overlay: SharedIo<OverlayState>,
}

impl TestTree {
    /// Wrap the root in the standard chain, with the default binding table.
    pub fn new(root: impl Node) -> Self {
        Self::with_map(default_input_map(), root)
    }

    pub fn with_map(map: InputMap, root: impl Node) -> Self {
        let overlay_chain = OverlayChain::new(root);
        let overlay = overlay_chain.state();
        let hover_chain = HoverChain::new(overlay_chain);
        let hover_state = hover_chain.state();
        let focus_chain = FocusChain::new(hover_chain);
        let focus = focus_chain.state();
        let input_chain = InputMapChain::new(map, focus_chain);
        let input_map = input_chain.state();

        let mut tree = LayoutTree::new(input_chain);

        let canvas = Rc::new(RefCell::new(HeadlessCanvas::new()));
        let clock = Rc::new(RefCell::new(HeadlessClock::new()));
        let clipboard = Rc::new(RefCell::new(LocalClipboard::default()));
        let signals = Rc::new(RefCell::new(CountingSignals::default()));
        let keyboard = Rc::new(RefCell::new(VirtualKeyboard::default()));
        let gamepad = Rc::new(RefCell::new(VirtualGamepad::default()));
        let mouse = Rc::new(RefCell::new(VirtualMouse::new()));

        let io = &mut tree.context_mut().io;
        io.replace_canvas(Some(canvas.clone()));
        io.replace_time(Some(clock.clone()));
        io.replace_clipboard(Some(clipboard.clone()));
        io.replace_debug_signal(Some(signals.clone()));
        io.replace_preference(Some(Rc::new(RefCell::new(DefaultPreferences))));
        io.replace_file(Some(Rc::new(RefCell::new(StdFileIo))));
        io.replace_keyboard(Some(keyboard.clone()));
        io.replace_gamepad(Some(gamepad.clone()));
        io.replace_mouse(Some(mouse.clone()));

        Self {
            tree,
            canvas,
            clock,
            clipboard,
            signals,
            keyboard,
            gamepad,
            mouse,
            input_map,
            focus,
            hover_state,
            overlay,
        }
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.tree.set_viewport(Vector2::new(width, height));
        self
    }

    /// Run one frame: poll the virtual devices, register the pointer, draw the tree, and
    /// sweep the image cache.
    pub fn draw(&mut self) -> Result<(), ResizeError> {
        for event in self.keyboard.borrow_mut().poll() {
            self.tree.queue_event(event);
        }
        for event in self.gamepad.borrow_mut().poll() {
            self.tree.queue_event(event);
        }
        for event in self.mouse.borrow_mut().poll() {
            self.tree.queue_event(event);
        }
        self.mouse
            .borrow_mut()
            .load_pointers(&mut *self.hover_state.borrow_mut());

        self.tree.draw()
    }

    pub fn draw_frames(&mut self, count: usize) -> Result<(), ResizeError> {
        for _ in 0..count {
            self.draw()?;
        }
        Ok(())
    }

    // Device shortcuts.

    pub fn key_press(&mut self, key: KeyboardKey) {
        self.keyboard.borrow_mut().press(key);
    }

    pub fn key_release(&mut self, key: KeyboardKey) {
        self.keyboard.borrow_mut().release(key);
    }

    pub fn gamepad_press(&mut self, button: GamepadButton) {
        self.gamepad.borrow_mut().press(button);
    }

    pub fn mouse_move(&mut self, x: f32, y: f32) {
        self.mouse.borrow_mut().move_to(Vector2::new(x, y));
    }

    pub fn mouse_press(&mut self) {
        self.mouse.borrow_mut().press();
    }

    pub fn mouse_release(&mut self) {
        self.mouse.borrow_mut().release();
    }

    pub fn mouse_scroll(&mut self, delta: Vector2) {
        self.mouse.borrow_mut().scroll(delta, false);
    }

    /// Touch-style scroll: locks to its initial scrollable while the pointer is pressed.
    pub fn mouse_scroll_held(&mut self, delta: Vector2) {
        self.mouse.borrow_mut().scroll(delta, true);
    }

    pub fn type_text(&mut self, text: &str) {
        self.focus.borrow_mut().type_text(text);
    }

    // Service handles.

    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut LayoutTree {
        &mut self.tree
    }

    pub fn canvas(&self) -> Rc<RefCell<HeadlessCanvas>> {
        self.canvas.clone()
    }

    pub fn clock(&self) -> Rc<RefCell<HeadlessClock>> {
        self.clock.clone()
    }

    pub fn clipboard(&self) -> Rc<RefCell<LocalClipboard>> {
        self.clipboard.clone()
    }

    pub fn signals(&self) -> Rc<RefCell<CountingSignals>> {
        self.signals.clone()
    }

    pub fn input_map(&self) -> SharedIo<InputMapState> {
        self.input_map.clone()
    }

    pub fn focus(&self) -> SharedIo<FocusState> {
        self.focus.clone()
    }

    pub fn hover(&self) -> SharedIo<HoverState> {
        self.hover_state.clone()
    }

    pub fn overlay(&self) -> SharedIo<OverlayState> {
        self.overlay.clone()
    }
}

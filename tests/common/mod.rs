//! Shared fixtures: minimal interactive nodes and a recording tree action.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use trellis_ui::action::Actionable;
use trellis_ui::canvas::{CanvasIo, ImageHandle};
use trellis_ui::context::{ResizeError, TreeContext};
use trellis_ui::focus::{FocusIo, Focusable};
use trellis_ui::geometry::{Color, Rectangle, Vector2};
use trellis_ui::hover::Hoverable;
use trellis_ui::image::Image;
use trellis_ui::input::{InputActionId, actions};
use trellis_ui::layout::Layout;
use trellis_ui::node::{Node, NodeCore, NodeId};
use trellis_ui::tree::{ActionControl, TreeAction};

/// A fixed-size, focusable, pressable node that counts its presses.
pub struct TestButton {
    core: NodeCore,
    size: Vector2,
    color: Color,
    presses: Rc<Cell<usize>>,
}

impl TestButton {
    pub fn new(width: f32, height: f32) -> Self {
        Self::colored(width, height, Color::rgb(0x60, 0x60, 0x60))
    }

    pub fn colored(width: f32, height: f32, color: Color) -> Self {
        Self {
            core: NodeCore::new(Layout::default()),
            size: Vector2::new(width, height),
            color,
            presses: Rc::new(Cell::new(0)),
        }
    }

    pub fn id(&self) -> NodeId {
        self.core.id()
    }

    pub fn presses(&self) -> Rc<Cell<usize>> {
        self.presses.clone()
    }

    pub fn disabled(mut self) -> Self {
        self.core.set_disabled(true);
        self
    }
}

impl Node for TestButton {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn resize_impl(&mut self, _ctx: &mut TreeContext, _space: Vector2) -> Result<(), ResizeError> {
        self.core.set_min_size(self.size);
        Ok(())
    }

    fn draw_impl(&mut self, ctx: &mut TreeContext, _outer: Rectangle, inner: Rectangle) {
        if let Some(canvas) = ctx.io.canvas() {
            canvas.borrow_mut().draw_rectangle(inner, self.color);
        }
    }

    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        Some(self)
    }

    fn as_hoverable(&mut self) -> Option<&mut dyn Hoverable> {
        Some(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl Actionable for TestButton {
    fn blocks_input(&self) -> bool {
        self.core.is_disabled_effective()
    }

    fn action_impl(
        &mut self,
        _ctx: &mut TreeContext,
        _pointer: Option<i32>,
        action: InputActionId,
        is_active: bool,
    ) -> bool {
        if action == actions::press() && is_active {
            self.presses.set(self.presses.get() + 1);
            return true;
        }
        false
    }
}

impl Focusable for TestButton {}
impl Hoverable for TestButton {}

/// A plain leaf with a fixed minimum size, counting its resizes and draws.
pub struct SizedBox {
    core: NodeCore,
    size: Vector2,
    color: Option<Color>,
    resizes: Rc<Cell<usize>>,
    draws: Rc<Cell<usize>>,
}

impl SizedBox {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            core: NodeCore::new(Layout::default()),
            size: Vector2::new(width, height),
            color: None,
            resizes: Rc::new(Cell::new(0)),
            draws: Rc::new(Cell::new(0)),
        }
    }

    pub fn colored(width: f32, height: f32, color: Color) -> Self {
        Self {
            color: Some(color),
            ..Self::new(width, height)
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.core.layout = layout;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.core.set_hidden(true);
        self
    }

    pub fn id(&self) -> NodeId {
        self.core.id()
    }

    pub fn resizes(&self) -> Rc<Cell<usize>> {
        self.resizes.clone()
    }

    pub fn draws(&self) -> Rc<Cell<usize>> {
        self.draws.clone()
    }
}

impl Node for SizedBox {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn resize_impl(&mut self, _ctx: &mut TreeContext, _space: Vector2) -> Result<(), ResizeError> {
        self.resizes.set(self.resizes.get() + 1);
        self.core.set_min_size(self.size);
        Ok(())
    }

    fn draw_impl(&mut self, ctx: &mut TreeContext, _outer: Rectangle, inner: Rectangle) {
        self.draws.set(self.draws.get() + 1);
        if let Some(color) = self.color {
            if let Some(canvas) = ctx.io.canvas() {
                canvas.borrow_mut().draw_rectangle(inner, color);
            }
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Forces its child into a box of exactly the given size.
pub struct FixedBox {
    core: NodeCore,
    size: Vector2,
    child: Box<dyn Node>,
}

impl FixedBox {
    pub fn new(width: f32, height: f32, child: impl Node) -> Self {
        Self {
            core: NodeCore::new(Layout::default()),
            size: Vector2::new(width, height),
            child: Box::new(child),
        }
    }
}

impl Node for FixedBox {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn resize_impl(&mut self, ctx: &mut TreeContext, _space: Vector2) -> Result<(), ResizeError> {
        self.child.resize(ctx, self.size)?;
        self.core.set_min_size(self.size);
        Ok(())
    }

    fn draw_impl(&mut self, ctx: &mut TreeContext, _outer: Rectangle, inner: Rectangle) {
        self.child.draw(ctx, inner);
    }

    fn for_each_child(&mut self, callback: &mut dyn FnMut(&mut dyn Node)) {
        callback(self.child.as_mut());
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Draws one image, loading it through the canvas it requires.
pub struct ImageBox {
    core: NodeCore,
    image: Image,
    handle: Option<ImageHandle>,
}

impl ImageBox {
    pub fn new(image: Image) -> Self {
        Self {
            core: NodeCore::new(Layout::default()),
            image,
            handle: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.core.id()
    }

    pub fn handle(&self) -> Option<ImageHandle> {
        self.handle
    }
}

impl Node for ImageBox {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn resize_impl(&mut self, ctx: &mut TreeContext, _space: Vector2) -> Result<(), ResizeError> {
        let canvas = ctx.io.require_canvas()?;
        self.handle = Some(canvas.borrow_mut().load_image(&self.image));
        self.core.set_min_size(self.image.canvas_size());
        Ok(())
    }

    fn draw_impl(&mut self, ctx: &mut TreeContext, _outer: Rectangle, inner: Rectangle) {
        if let (Some(canvas), Some(handle)) = (ctx.io.canvas(), self.handle) {
            canvas.borrow_mut().draw_image(handle, inner, Color::WHITE);
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// A focusable node that drains the text queue from its `focus_impl`.
pub struct TextSink {
    core: NodeCore,
    pub collected: Rc<RefCell<String>>,
}

impl TextSink {
    pub fn new() -> Self {
        Self {
            core: NodeCore::new(Layout::default()),
            collected: Rc::new(RefCell::new(String::new())),
        }
    }

    pub fn id(&self) -> NodeId {
        self.core.id()
    }
}

impl Node for TextSink {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn resize_impl(&mut self, _ctx: &mut TreeContext, _space: Vector2) -> Result<(), ResizeError> {
        self.core.set_min_size(Vector2::new(10.0, 10.0));
        Ok(())
    }

    fn draw_impl(&mut self, _ctx: &mut TreeContext, _outer: Rectangle, _inner: Rectangle) {}

    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        Some(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl Actionable for TextSink {
    fn blocks_input(&self) -> bool {
        self.core.is_disabled_effective()
    }

    fn action_impl(
        &mut self,
        _ctx: &mut TreeContext,
        _pointer: Option<i32>,
        _action: InputActionId,
        _is_active: bool,
    ) -> bool {
        false
    }
}

impl Focusable for TextSink {
    fn focus_impl(&mut self, ctx: &mut TreeContext) -> bool {
        let Some(focus) = ctx.io.focus() else { return false };
        let mut buffer = [0u8; 8];
        let mut offset = 0;
        let mut read_any = false;
        loop {
            let chunk = {
                let mut focus = focus.borrow_mut();
                focus.read_text(&mut buffer, &mut offset).map(str::to_owned)
            };
            match chunk {
                Some(chunk) => {
                    self.collected.borrow_mut().push_str(&chunk);
                    read_any = true;
                }
                None => break,
            }
        }
        read_any
    }
}

/// Counters shared with a [`RecordingAction`].
#[derive(Clone, Default)]
pub struct Recorder {
    pub before_trees: Rc<Cell<usize>>,
    pub before_resizes: Rc<RefCell<Vec<NodeId>>>,
    pub before_draws: Rc<RefCell<Vec<NodeId>>>,
    pub after_draws: Rc<RefCell<Vec<NodeId>>>,
    pub stops: Rc<Cell<usize>>,
    pub after_inputs: Rc<RefCell<Vec<bool>>>,
}

/// A tree action that records every hook it sees.
pub struct RecordingAction {
    control: ActionControl,
    recorder: Recorder,
    persistent: bool,
}

impl RecordingAction {
    /// Returns the action (ready to queue) and the shared counters.
    pub fn new(persistent: bool) -> (Rc<RefCell<Self>>, Recorder) {
        let recorder = Recorder::default();
        let action = Rc::new(RefCell::new(Self {
            control: ActionControl::new(),
            recorder: recorder.clone(),
            persistent,
        }));
        (action, recorder)
    }
}

impl TreeAction for RecordingAction {
    fn control(&mut self) -> &mut ActionControl {
        &mut self.control
    }

    fn before_tree(&mut self, _root: &mut dyn Node, _viewport: Rectangle) {
        self.recorder.before_trees.set(self.recorder.before_trees.get() + 1);
    }

    fn before_resize(&mut self, node: &mut dyn Node, _space: Vector2) {
        self.recorder.before_resizes.borrow_mut().push(node.core().id());
    }

    fn before_draw(
        &mut self,
        node: &mut dyn Node,
        _outer: Rectangle,
        _padding_box: Rectangle,
        _content: Rectangle,
    ) {
        self.recorder.before_draws.borrow_mut().push(node.core().id());
    }

    fn after_draw(
        &mut self,
        node: &mut dyn Node,
        _outer: Rectangle,
        _padding_box: Rectangle,
        _content: Rectangle,
    ) {
        self.recorder.after_draws.borrow_mut().push(node.core().id());
    }

    fn after_tree(&mut self) {
        if !self.persistent {
            self.control().stop();
        }
    }

    fn after_input(&mut self, keyboard_handled: bool) {
        self.recorder.after_inputs.borrow_mut().push(keyboard_handled);
    }

    fn stopped(&mut self) {
        self.recorder.stops.set(self.recorder.stops.get() + 1);
    }
}

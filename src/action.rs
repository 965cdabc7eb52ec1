//! Translating input events into input actions, and the nodes that respond to them.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::{ResizeError, SharedIo, TreeContext};
use crate::event::{DeviceKind, InputEvent};
use crate::geometry::{Rectangle, Vector2};
use crate::input::{FrameActions, InputActionId, InputMap, InputState, InputStroke};
use crate::layout::Layout;
use crate::node::{HitFilter, Node, NodeCore};

/// An input action aimed at a specific node, as delivered by the focus or hover systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionEvent {
    /// The action to handle.
    pub action: InputActionId,

    /// If true, this is an active event: the stroke changed state this frame. An inactive
    /// event merely means the stroke is held; most handlers only react to active events.
    pub is_active: bool,

    /// Class of the device the triggering stroke came from.
    pub device: DeviceKind,
}

/// Base interface for nodes that respond to input actions.
///
/// The input-map system doesn't interact with nodes directly; input handling systems like
/// the focus and hover services expect nodes to implement this interface if they support
/// input actions.
pub trait Actionable {
    /// Determine if the node can currently handle input.
    ///
    /// A blocked node must not have its handlers called, and if the input method has a node
    /// selection concept like focus or hover, blocked nodes are excluded from selection.
    fn blocks_input(&self) -> bool;

    /// Handle an input action.
    ///
    /// `pointer` carries the hover pointer number when the action arrived through a pointer,
    /// and is `None` for focus-directed actions. `is_active` distinguishes the one frame the
    /// stroke fires from the frames it is merely held; handlers interested in "while held"
    /// behavior react to inactive events too.
    ///
    /// Returns true if the action was handled; unhandled actions fall through to the next
    /// candidate, such as the focus space's own navigation handling.
    fn action_impl(
        &mut self,
        ctx: &mut TreeContext,
        pointer: Option<i32>,
        action: InputActionId,
        is_active: bool,
    ) -> bool;
}

/// I/O interface for mapping input events to input actions.
///
/// Input events correspond to direct events from input devices, like keyboard or mouse. The
/// job of this system is to translate them into more meaningful input actions, which nodes
/// can set up listeners for.
///
/// The system withholds matched actions until the hover and focus systems below it pick
/// them up during their own draw and route them to their selected nodes.
pub trait ActionIo {
    /// The bindings matched against the device state this frame.
    fn frame_actions(&self) -> FrameActions;

    /// Pass a device event into the system directly, bypassing the tree's event queue. Used
    /// by device nodes that poll their hardware during the draw.
    fn emit_event(&mut self, event: InputEvent);

    /// Bind an input stroke to an action.
    fn bind_input(&mut self, action: InputActionId, stroke: InputStroke);

    /// Bind an input stroke to an action, clearing conflicting bindings in its layer first.
    fn bind_input_replace(&mut self, action: InputActionId, stroke: InputStroke);

    /// Remove all bindings of an action.
    fn clear_bound_input(&mut self, action: InputActionId);

    /// The current binding table.
    fn map(&self) -> &InputMap;
}

/// The standard [`ActionIo`] implementation: a binding table plus cross-frame device state.
pub struct InputMapState {
    map: InputMap,
    state: InputState,
    current: FrameActions,
    inbox: Vec<InputEvent>,
}

impl InputMapState {
    pub fn new(map: InputMap) -> Self {
        Self {
            map,
            state: InputState::new(),
            current: FrameActions::default(),
            inbox: Vec::new(),
        }
    }

    /// Fold the frame's events into the device state and evaluate the binding table.
    pub(crate) fn begin_frame(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        self.state.next_frame();
        let inbox = std::mem::take(&mut self.inbox);
        for event in inbox.into_iter().chain(events) {
            self.state.record(event);
        }
        self.current = self.state.evaluate(&self.map);
    }
}

impl ActionIo for InputMapState {
    fn frame_actions(&self) -> FrameActions {
        self.current.clone()
    }

    fn emit_event(&mut self, event: InputEvent) {
        self.inbox.push(event);
    }

    fn bind_input(&mut self, action: InputActionId, stroke: InputStroke) {
        self.map.bind_input(action, stroke);
    }

    fn bind_input_replace(&mut self, action: InputActionId, stroke: InputStroke) {
        self.map.bind_input_replace(action, stroke);
    }

    fn clear_bound_input(&mut self, action: InputActionId) {
        self.map.clear_bound_input(action);
    }

    fn map(&self) -> &InputMap {
        &self.map
    }
}

/// A node that publishes an [`ActionIo`] system over its branch.
///
/// Each frame, it drains the tree's inbound event queue, matches the events against its
/// binding table, and holds the result for the focus and hover systems below to pick up.
/// Any input handling node must sit inside this chain to react to actions.
pub struct InputMapChain {
    core: NodeCore,
    state: Rc<RefCell<InputMapState>>,
    child: Box<dyn Node>,
}

impl InputMapChain {
    pub fn new(map: InputMap, child: impl Node) -> Self {
        Self::from_boxed(map, Box::new(child))
    }

    pub fn from_boxed(map: InputMap, child: Box<dyn Node>) -> Self {
        Self {
            core: NodeCore::new(Layout::fill(0)),
            state: Rc::new(RefCell::new(InputMapState::new(map))),
            child,
        }
    }

    /// Shared handle to the binding state, e.g. for rebinding at runtime.
    pub fn state(&self) -> SharedIo<InputMapState> {
        self.state.clone()
    }

    fn io_handle(&self) -> SharedIo<dyn ActionIo> {
        self.state.clone()
    }
}

impl Node for InputMapChain {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn resize_impl(&mut self, ctx: &mut TreeContext, space: Vector2) -> Result<(), ResizeError> {
        let previous = ctx.io.replace_action(Some(self.io_handle()));
        let result = self.child.resize(ctx, space);
        ctx.io.replace_action(previous);
        result?;
        self.core.set_min_size(self.child.core().min_size());
        Ok(())
    }

    fn draw_impl(&mut self, ctx: &mut TreeContext, _outer: Rectangle, inner: Rectangle) {
        let events = ctx.take_events();
        self.state.borrow_mut().begin_frame(events);

        let previous = ctx.io.replace_action(Some(self.io_handle()));
        self.child.draw(ctx, inner);
        ctx.io.replace_action(previous);
    }

    fn in_bounds(&self, _outer: Rectangle, _inner: Rectangle, _position: Vector2) -> HitFilter {
        HitFilter::MISS
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

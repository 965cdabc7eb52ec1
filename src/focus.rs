//! Keyboard focus: the focus space, tab and positional navigation, and text input.
//!
//! A focus space tracks the one node holding keyboard focus within its branch. Focus spaces
//! nest: a modal popup publishes its own space, capturing navigation until it is dismissed.

use std::cell::RefCell;
use std::rc::Rc;

use crate::action::{ActionEvent, ActionIo, Actionable};
use crate::context::{ResizeError, SharedIo, TreeContext};
use crate::event::DeviceKind;
use crate::geometry::{Rectangle, Vector2};
use crate::input::{self, FrameActions, InputActionId};
use crate::layout::Layout;
use crate::node::{HitFilter, Node, NodeCore, NodeId};
use crate::style::Side;

/// Nodes implementing this interface can be focused by a [`FocusIo`] system.
pub trait Focusable: Actionable {
    /// Handle focus input. Called once per frame while the node is focused and no input
    /// action consumed the frame's events; the usual place to drain the text queue.
    ///
    /// Returns true if focus input was handled, false if it was ignored.
    fn focus_impl(&mut self, ctx: &mut TreeContext) -> bool {
        let _ = ctx;
        false
    }
}

/// A focusable node observed during the current frame's traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusEntry {
    pub id: NodeId,
    /// The node's outer box; positional navigation measures distances between these.
    pub bounds: Rectangle,
    /// True if the node or an ancestor was disabled; such entries block hover but are
    /// skipped by navigation.
    pub disabled: bool,
}

/// I/O interface of a focus space.
///
/// The traversal wrappers talk to this interface to register focusable nodes and pick up
/// pending actions; nodes use it to move focus around.
pub trait FocusIo {
    /// Record a focusable node in this frame's traversal order.
    fn register(&mut self, entry: FocusEntry);

    /// The node currently holding focus, if any.
    fn current_focus(&self) -> Option<NodeId>;

    fn is_focused(&self, id: NodeId) -> bool {
        self.current_focus() == Some(id)
    }

    /// Focus the given node. The request is ignored when the node was seen by the last
    /// traversal and found disabled; a node not seen yet is trusted.
    fn focus(&mut self, id: NodeId);

    /// Drop focus; no node receives keyboard input until something is focused again.
    fn clear_focus(&mut self);

    /// Focus the node only if the last traversal saw it as a focusable, enabled node.
    /// Used by pointer presses, which transfer focus to focusable targets and leave the
    /// rest alone. Returns true when focus was taken.
    fn focus_if_focusable(&mut self, id: NodeId) -> bool;

    /// Focus the next node in traversal order, wrapping at the end and skipping disabled
    /// nodes. With no focus set, picks the first focusable.
    fn focus_next(&mut self) -> Option<NodeId>;

    /// Focus the previous node in traversal order, wrapping at the start. With no focus
    /// set, picks the last focusable.
    fn focus_previous(&mut self) -> Option<NodeId>;

    /// Move focus to the nearest focusable in the given direction from the current focus
    /// box. Keeps the current focus when no candidate exists in that direction.
    fn focus_direction(&mut self, side: Side) -> Option<NodeId>;

    fn focus_above(&mut self) -> Option<NodeId> {
        self.focus_direction(Side::Top)
    }

    fn focus_below(&mut self) -> Option<NodeId> {
        self.focus_direction(Side::Bottom)
    }

    fn focus_left(&mut self) -> Option<NodeId> {
        self.focus_direction(Side::Left)
    }

    fn focus_right(&mut self) -> Option<NodeId> {
        self.focus_direction(Side::Right)
    }

    /// Queue an input action for the focused node, delivered when it is next drawn.
    fn emit_event(&mut self, event: ActionEvent);

    /// Drain the actions queued for the focused node. Wrapper-facing.
    fn take_pending(&mut self) -> Vec<ActionEvent>;

    /// Note that the focused node consumed an active keyboard action this frame.
    fn note_handled(&mut self);

    /// Fallback handling for navigation actions the focused node ignored. Returns true if
    /// the action was recognized and performed.
    fn navigate(&mut self, action: InputActionId) -> bool;

    /// Append text to the input queue, to be read by the focused node.
    fn type_text(&mut self, text: &str);

    /// Read queued text into `buffer`, starting at `offset`.
    ///
    /// Text longer than the buffer is chunked: each call copies as much as fits and advances
    /// `offset`, returning `None` once the queue is exhausted. Reads within one frame see
    /// the same queue; the queue resets when the frame ends.
    fn read_text<'b>(&mut self, buffer: &'b mut [u8], offset: &mut usize) -> Option<&'b str>;

    /// The outer box the focused node was last drawn at.
    fn focus_box(&self) -> Option<Rectangle>;
}

/// The standard focus space implementation.
pub struct FocusState {
    current: Option<NodeId>,

    /// Focusable nodes registered this frame, in draw order.
    order: Vec<FocusEntry>,

    /// The completed order of the previous frame; navigation works on this.
    last_order: Vec<FocusEntry>,

    /// Outer box of the focused node after the last frame.
    focus_box: Option<Rectangle>,

    /// Actions waiting for the focused node to be drawn.
    pending: Vec<ActionEvent>,

    keyboard_handled: bool,

    /// Queued text input. Cleared at the end of every frame.
    text_queue: String,
}

impl FocusState {
    pub fn new() -> Self {
        Self {
            current: None,
            order: Vec::new(),
            last_order: Vec::new(),
            focus_box: None,
            pending: Vec::new(),
            keyboard_handled: false,
            text_queue: String::new(),
        }
    }

    /// The navigation entries to work from: the last completed frame when available, the
    /// partially built current frame otherwise.
    fn entries(&self) -> &[FocusEntry] {
        if self.last_order.is_empty() {
            &self.order
        } else {
            &self.last_order
        }
    }

    fn focus_step(&mut self, backwards: bool) -> Option<NodeId> {
        let enabled: Vec<FocusEntry> = self
            .entries()
            .iter()
            .filter(|entry| !entry.disabled)
            .copied()
            .collect();
        if enabled.is_empty() {
            return None;
        }
        let position = self
            .current
            .and_then(|id| enabled.iter().position(|entry| entry.id == id));
        let next = match (position, backwards) {
            (Some(index), false) => (index + 1) % enabled.len(),
            (Some(index), true) => (index + enabled.len() - 1) % enabled.len(),
            (None, false) => 0,
            (None, true) => enabled.len() - 1,
        };
        self.current = Some(enabled[next].id);
        tracing::trace!(focus = ?self.current, "focus moved");
        self.current
    }

    /// Queue the frame's matched keyboard and gamepad actions for the focused node, along
    /// with the once-per-frame fallback tick.
    pub(crate) fn route_actions(&mut self, frame: &FrameActions) {
        for binding in &frame.held {
            let device = binding.trigger.device();
            if device != DeviceKind::Mouse {
                self.pending.push(ActionEvent {
                    action: binding.action,
                    is_active: false,
                    device,
                });
            }
        }
        for binding in &frame.active {
            let device = binding.trigger.device();
            if device != DeviceKind::Mouse {
                self.pending.push(ActionEvent {
                    action: binding.action,
                    is_active: true,
                    device,
                });
            }
        }
        self.pending.push(ActionEvent {
            action: input::actions::frame_event(),
            is_active: true,
            device: DeviceKind::Keyboard,
        });
    }

    /// Close the frame: handle actions nothing picked up, rotate the traversal order, record
    /// the focus box and reset per-frame state. Returns whether keyboard input was handled.
    ///
    /// With `allow_navigation` false, leftover navigation actions are dropped instead of
    /// performed; the outer space of a modal popup uses this so two spaces never react to
    /// the same Tab press.
    pub(crate) fn finish_frame(&mut self, allow_navigation: bool) -> bool {
        let leftover = std::mem::take(&mut self.pending);
        if allow_navigation {
            for event in leftover {
                if event.is_active && self.navigate(event.action) {
                    self.keyboard_handled = true;
                }
            }
        }

        self.last_order = std::mem::take(&mut self.order);
        self.focus_box = self.current.and_then(|id| {
            self.last_order
                .iter()
                .find(|entry| entry.id == id)
                .map(|entry| entry.bounds)
        });
        self.text_queue.clear();
        std::mem::replace(&mut self.keyboard_handled, false)
    }

    /// Restore a previously focused node, e.g. when a popup is dismissed.
    pub fn set_focus(&mut self, id: Option<NodeId>) {
        self.current = id;
    }
}

impl Default for FocusState {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusIo for FocusState {
    fn register(&mut self, entry: FocusEntry) {
        self.order.push(entry);
    }

    fn current_focus(&self) -> Option<NodeId> {
        self.current
    }

    fn focus(&mut self, id: NodeId) {
        let blocked = self
            .entries()
            .iter()
            .any(|entry| entry.id == id && entry.disabled);
        if blocked {
            return;
        }
        self.current = Some(id);
    }

    fn clear_focus(&mut self) {
        self.current = None;
    }

    fn focus_if_focusable(&mut self, id: NodeId) -> bool {
        let accepts = self
            .entries()
            .iter()
            .any(|entry| entry.id == id && !entry.disabled);
        if accepts {
            self.current = Some(id);
        }
        accepts
    }

    fn focus_next(&mut self) -> Option<NodeId> {
        self.focus_step(false)
    }

    fn focus_previous(&mut self) -> Option<NodeId> {
        self.focus_step(true)
    }

    fn focus_direction(&mut self, side: Side) -> Option<NodeId> {
        let reference = self.focus_box.or_else(|| {
            self.current.and_then(|id| {
                self.entries()
                    .iter()
                    .find(|entry| entry.id == id)
                    .map(|entry| entry.bounds)
            })
        })?;
        let origin = reference.center();

        let mut best: Option<(f32, f32, NodeId)> = None;
        for entry in self.entries() {
            if entry.disabled || Some(entry.id) == self.current {
                continue;
            }
            let center = entry.bounds.center();
            let (axis, perpendicular) = match side {
                Side::Left => (origin.x - center.x, (origin.y - center.y).abs()),
                Side::Right => (center.x - origin.x, (origin.y - center.y).abs()),
                Side::Top => (origin.y - center.y, (origin.x - center.x).abs()),
                Side::Bottom => (center.y - origin.y, (origin.x - center.x).abs()),
            };
            if axis <= 0.0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_axis, best_perpendicular, _)) => {
                    axis < best_axis || (axis == best_axis && perpendicular < best_perpendicular)
                }
            };
            if better {
                best = Some((axis, perpendicular, entry.id));
            }
        }

        if let Some((_, _, id)) = best {
            self.current = Some(id);
        }
        self.current
    }

    fn emit_event(&mut self, event: ActionEvent) {
        self.pending.push(event);
    }

    fn take_pending(&mut self) -> Vec<ActionEvent> {
        std::mem::take(&mut self.pending)
    }

    fn note_handled(&mut self) {
        self.keyboard_handled = true;
    }

    fn navigate(&mut self, action: InputActionId) -> bool {
        use input::actions;
        let moved = if action == actions::focus_next() {
            self.focus_next()
        } else if action == actions::focus_previous() {
            self.focus_previous()
        } else if action == actions::focus_left() {
            self.focus_direction(Side::Left)
        } else if action == actions::focus_right() {
            self.focus_direction(Side::Right)
        } else if action == actions::focus_up() {
            self.focus_direction(Side::Top)
        } else if action == actions::focus_down() {
            self.focus_direction(Side::Bottom)
        } else {
            return false;
        };
        moved.is_some()
    }

    fn type_text(&mut self, text: &str) {
        self.text_queue.push_str(text);
    }

    fn read_text<'b>(&mut self, buffer: &'b mut [u8], offset: &mut usize) -> Option<&'b str> {
        let remaining = self.text_queue.get(*offset..)?;
        if remaining.is_empty() || buffer.is_empty() {
            return None;
        }
        let mut length = remaining.len().min(buffer.len());
        while length > 0 && !remaining.is_char_boundary(length) {
            length -= 1;
        }
        if length == 0 {
            return None;
        }
        buffer[..length].copy_from_slice(&remaining.as_bytes()[..length]);
        *offset += length;
        std::str::from_utf8(&buffer[..length]).ok()
    }

    fn focus_box(&self) -> Option<Rectangle> {
        self.focus_box
    }
}

/// A node that publishes a focus space over its branch.
///
/// Picks up the frame's keyboard and gamepad actions from the input-map system above it and
/// queues them for the focused node, which receives them as it is drawn.
pub struct FocusChain {
    core: NodeCore,
    state: Rc<RefCell<FocusState>>,
    child: Box<dyn Node>,
}

impl FocusChain {
    pub fn new(child: impl Node) -> Self {
        Self::from_boxed(Box::new(child))
    }

    pub fn from_boxed(child: Box<dyn Node>) -> Self {
        Self {
            core: NodeCore::new(Layout::fill(0)),
            state: Rc::new(RefCell::new(FocusState::new())),
            child,
        }
    }

    /// Shared handle to the focus state.
    pub fn state(&self) -> SharedIo<FocusState> {
        self.state.clone()
    }

    fn io_handle(&self) -> SharedIo<dyn FocusIo> {
        self.state.clone()
    }
}

impl Node for FocusChain {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn resize_impl(&mut self, ctx: &mut TreeContext, space: Vector2) -> Result<(), ResizeError> {
        let previous = ctx.io.replace_focus(Some(self.io_handle()));
        let result = self.child.resize(ctx, space);
        ctx.io.replace_focus(previous);
        result?;
        self.core.set_min_size(self.child.core().min_size());
        Ok(())
    }

    fn draw_impl(&mut self, ctx: &mut TreeContext, _outer: Rectangle, inner: Rectangle) {
        let frame = ctx
            .io
            .action()
            .map(|action| action.borrow().frame_actions())
            .unwrap_or_default();
        self.state.borrow_mut().route_actions(&frame);

        let previous = ctx.io.replace_focus(Some(self.io_handle()));
        self.child.draw(ctx, inner);
        ctx.io.replace_focus(previous);

        let allow_navigation = !ctx.focus_captured;
        if self.state.borrow_mut().finish_frame(allow_navigation) {
            ctx.keyboard_handled = true;
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: NodeId, x: f32, y: f32, disabled: bool) -> FocusEntry {
        FocusEntry {
            id,
            bounds: Rectangle::new(x, y, 10.0, 10.0),
            disabled,
        }
    }

    fn fresh_ids(count: usize) -> Vec<NodeId> {
        (0..count)
            .map(|_| NodeCore::new(Layout::default()).id())
            .collect()
    }

    #[test]
    fn tab_navigation_skips_disabled_and_wraps() {
        let ids = fresh_ids(3);
        let mut state = FocusState::new();
        state.register(entry(ids[0], 0.0, 0.0, false));
        state.register(entry(ids[1], 0.0, 20.0, true));
        state.register(entry(ids[2], 0.0, 40.0, false));

        state.focus(ids[0]);
        assert_eq!(state.focus_next(), Some(ids[2]));
        assert_eq!(state.focus_previous(), Some(ids[0]));
        assert_eq!(state.focus_previous(), Some(ids[2]));
    }

    #[test]
    fn focus_uniqueness() {
        let ids = fresh_ids(2);
        let mut state = FocusState::new();
        state.register(entry(ids[0], 0.0, 0.0, false));
        state.register(entry(ids[1], 0.0, 20.0, false));
        state.focus(ids[0]);
        state.focus(ids[1]);
        assert_eq!(state.current_focus(), Some(ids[1]));
        assert!(!state.is_focused(ids[0]));
    }

    #[test]
    fn directional_navigation_prefers_axis_distance() {
        let ids = fresh_ids(4);
        let mut state = FocusState::new();
        // Reference in the middle, one close on the right, one far right, one below.
        state.register(entry(ids[0], 50.0, 50.0, false));
        state.register(entry(ids[1], 80.0, 50.0, false));
        state.register(entry(ids[2], 200.0, 50.0, false));
        state.register(entry(ids[3], 50.0, 90.0, false));
        state.focus(ids[0]);
        state.finish_frame(true);

        assert_eq!(state.focus_direction(Side::Right), Some(ids[1]));
    }

    #[test]
    fn directional_navigation_without_candidates_keeps_focus() {
        let ids = fresh_ids(1);
        let mut state = FocusState::new();
        state.register(entry(ids[0], 0.0, 0.0, false));
        state.focus(ids[0]);
        state.finish_frame(true);
        assert_eq!(state.focus_direction(Side::Left), Some(ids[0]));
    }

    #[test]
    fn text_queue_chunks_to_buffer() {
        let mut state = FocusState::new();
        state.type_text("hello world");

        let mut buffer = [0u8; 4];
        let mut offset = 0;
        let mut collected = String::new();
        while let Some(chunk) = state.read_text(&mut buffer, &mut offset) {
            collected.push_str(chunk);
        }
        assert_eq!(collected, "hello world");

        // Same frame, fresh offset: same data again.
        let mut offset = 0;
        let first = state.read_text(&mut buffer, &mut offset);
        assert_eq!(first, Some("hell"));

        state.finish_frame(true);
        let mut offset = 0;
        assert_eq!(state.read_text(&mut buffer, &mut offset), None);
    }
}

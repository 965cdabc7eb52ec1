//! Pointer input: hover tracking, press arming, and scroll routing.
//!
//! A hover system reads events off devices with the ability to point at the screen, like
//! mouses, touchpads or pens. Pointers are registered every frame; the traversal hit-tests
//! each of them against the tree, and the deepest node answering [`HitFilter::HIT`] becomes
//! the pointer's hover target.
//!
//! Pressing *arms* a pointer: a twin frozen at the press target, carrying the negated ID.
//! Subsequent hold and release events route to the armed target even as the live pointer
//! moves away, which is what makes dragging off a button cancel the click.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use smallvec::SmallVec;

use crate::action::{ActionEvent, ActionIo, Actionable};
use crate::context::{ResizeError, SharedIo, TreeContext};
use crate::event::DeviceKind;
use crate::focus::FocusIo;
use crate::geometry::{Rectangle, Vector2};
use crate::input::{self, FrameActions};
use crate::io::{PreferenceIo, TimeIo};
use crate::layout::Layout;
use crate::node::{HitFilter, Node, NodeCore, NodeId};

/// Nodes implementing this interface can be hovered and pressed by a [`HoverIo`] system.
pub trait Hoverable: Actionable {
    /// Handle hover input. Called once per frame for the hover target of each pointer.
    ///
    /// Returns true if hover input was handled, false if it was ignored.
    fn hover_impl(&mut self, ctx: &mut TreeContext, pointer: &HoverPointer) -> bool {
        let _ = (ctx, pointer);
        false
    }
}

/// A pointing device position as seen by the hover system.
///
/// Live pointers carry positive IDs, stable across frames for the same device and pointer
/// number. The armed twin of a pointer carries the negated ID and stays frozen at the
/// position the press began at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverPointer {
    /// Handle of the device that owns the pointer.
    pub device: usize,

    /// Number of the pointer within its device; a touchscreen reports one per finger.
    pub number: u32,

    pub position: Vector2,

    /// Scroll motion this frame, both axes.
    pub scroll: Vector2,

    /// True while the pointer's primary button (or touch contact) is down.
    pub is_pressed: bool,

    /// True if scroll motion should lock to its initial scrollable for the duration of the
    /// press, mimicking touchscreen dragging.
    pub is_scroll_held: bool,

    /// A disabled pointer keeps its ID but stops interacting.
    pub is_disabled: bool,

    /// Stable ID assigned by the hover system; negative for armed twins.
    pub id: i32,
}

/// Restores per-pointer hit-test state once a subtree is done drawing. Returned by
/// [`HoverIo::test_node`], consumed by [`HoverIo::untest_node`].
#[derive(Debug, Default)]
pub struct HitGuard {
    saved: SmallVec<[(usize, Option<u32>); 4]>,
}

/// I/O interface for pointer input over a branch.
pub trait HoverIo {
    /// Register or refresh a pointer. Devices call this every frame, before the tree is
    /// drawn; a (device, number) pair keeps its ID across frames.
    fn load_pointer(
        &mut self,
        device: usize,
        number: u32,
        position: Vector2,
        scroll: Vector2,
        pressed: bool,
        scroll_held: bool,
    ) -> i32;

    /// Disable or re-enable a pointer.
    fn set_pointer_disabled(&mut self, id: i32, disabled: bool);

    /// All pointers currently alive: live pointers and the armed twins of pressed ones.
    fn pointers(&self) -> Vec<HoverPointer>;

    /// Positions and scroll deltas of the live pointers. Wrapper-facing, for scrollable
    /// candidate reporting.
    fn pointer_probes(&self) -> SmallVec<[(i32, Vector2, Vector2); 4]>;

    /// Hit-test every live pointer against a node. Wrapper-facing; the guard must be handed
    /// back through [`Self::untest_node`] after the node's subtree is drawn.
    fn test_node(
        &mut self,
        id: NodeId,
        depth: u32,
        crop: Rectangle,
        outer: Rectangle,
        test: &mut dyn FnMut(Vector2) -> HitFilter,
    ) -> HitGuard;

    fn untest_node(&mut self, guard: HitGuard);

    /// Record that a scrollable node lies under the pointer, and whether it could consume
    /// this frame's scroll delta.
    fn report_scrollable(&mut self, pointer: i32, node: NodeId, depth: u32, can_consume: bool);

    /// Drain the input actions queued for the node. Wrapper-facing.
    fn take_pending(&mut self, node: NodeId) -> SmallVec<[(ActionEvent, i32); 4]>;

    /// Take the scroll motion routed to the node this frame, if any.
    fn take_scroll(&mut self, node: NodeId) -> Option<Vector2>;

    /// True if any pointer hovers the node, or is armed on it.
    fn is_hovered(&self, node: NodeId) -> bool;

    /// The node a pointer points at: the hover target for live (positive) IDs, the armed
    /// target for armed (negative) ones.
    fn hover_of(&self, pointer: i32) -> Option<NodeId>;

    /// Live pointers whose hover target is the given node.
    fn pointers_over(&self, node: NodeId) -> SmallVec<[HoverPointer; 2]>;

    /// Positions of the presses that began this frame. Popups dismiss themselves when one
    /// lands outside their bounds.
    fn fresh_presses(&self) -> SmallVec<[Vector2; 2]>;

    /// Number of presses in the pointer's current click streak: 1 for a single click, 2
    /// for a double click, counted against the host's double-click interval.
    fn click_streak(&self, pointer: i32) -> u32;
}

struct PointerRecord {
    pointer: HoverPointer,

    /// Refreshed this frame; unloaded pointers don't participate.
    loaded: bool,

    was_pressed: bool,

    /// Hover target as finalized at the end of the last frame.
    hover: Option<NodeId>,

    /// Armed target: where the current press began.
    armed: Option<NodeId>,

    /// Position the press began at; carried by the armed twin.
    armed_position: Vector2,

    /// Deepest hit so far in the current traversal.
    candidate: Option<(NodeId, u32)>,

    /// When set, a node at this depth blocked its children from hitting.
    block: Option<u32>,

    /// Scrollables under the pointer this frame, in draw order, with their consumption
    /// answers for the frame's delta.
    scroll_chain: Vec<(NodeId, u32, bool)>,

    /// Scrollable a held scroll locked onto.
    locked_scrollable: Option<NodeId>,

    /// Presses in the current click streak, and when the last one happened.
    click_streak: u32,
    last_press: Option<Instant>,
}

/// The standard [`HoverIo`] implementation.
pub struct HoverState {
    records: Vec<PointerRecord>,
    next_id: i32,
    pending: Vec<(NodeId, ActionEvent, i32)>,
    pending_scroll: Vec<(NodeId, Vector2)>,
}

impl HoverState {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
            pending: Vec::new(),
            pending_scroll: Vec::new(),
        }
    }

    fn record(&self, id: i32) -> Option<&PointerRecord> {
        self.records.iter().find(|record| record.pointer.id == id)
    }

    /// Open the frame: arm and disarm pointers, transfer focus on presses, and route the
    /// frame's mouse actions and scroll motion. Runs before the subtree draws, so targets
    /// pick their events up within the same frame.
    pub(crate) fn begin_frame(
        &mut self,
        frame: &FrameActions,
        focus: Option<SharedIo<dyn FocusIo>>,
        time: Option<SharedIo<dyn TimeIo>>,
        preferences: Option<SharedIo<dyn PreferenceIo>>,
    ) {
        self.pending.clear();
        for record in &mut self.records {
            record.scroll_chain.clear();
        }

        let now = time.map(|time| time.borrow().now());
        let double_click_interval = preferences
            .map(|preferences| preferences.borrow().double_click_interval())
            .unwrap_or(Duration::from_millis(500));

        // Presses arm the pointer, extend the click streak, and move focus.
        for record in &mut self.records {
            if !record.loaded || record.pointer.is_disabled {
                continue;
            }
            if record.pointer.is_pressed && !record.was_pressed {
                record.armed = record.hover;
                record.armed_position = record.pointer.position;

                let in_streak = match (now, record.last_press) {
                    (Some(now), Some(last)) => {
                        now.saturating_duration_since(last) <= double_click_interval
                    }
                    _ => false,
                };
                record.click_streak = if in_streak { record.click_streak + 1 } else { 1 };
                record.last_press = now;

                tracing::debug!(pointer = record.pointer.id, target = ?record.armed, "pointer armed");
                if let Some(focus) = &focus {
                    let mut focus = focus.borrow_mut();
                    let focused = record
                        .hover
                        .map(|target| focus.focus_if_focusable(target))
                        .unwrap_or(false);
                    if !focused {
                        focus.clear_focus();
                    }
                }
            }
        }

        // Mouse-triggered actions go to the armed target; active ones only fire if the
        // pointer is still over it.
        for binding in &frame.active {
            if binding.trigger.device() != DeviceKind::Mouse {
                continue;
            }
            for record in &self.records {
                if !record.loaded || record.pointer.is_disabled {
                    continue;
                }
                let releasing = record.was_pressed && !record.pointer.is_pressed;
                if !releasing {
                    continue;
                }
                let Some(armed) = record.armed else { continue };
                if record.hover != Some(armed) {
                    tracing::debug!(pointer = record.pointer.id, "press cancelled off-target");
                    continue;
                }
                self.pending.push((
                    armed,
                    ActionEvent {
                        action: binding.action,
                        is_active: true,
                        device: DeviceKind::Mouse,
                    },
                    record.pointer.id,
                ));
            }
        }
        for binding in &frame.held {
            if binding.trigger.device() != DeviceKind::Mouse {
                continue;
            }
            for record in &self.records {
                if !record.loaded || record.pointer.is_disabled || !record.pointer.is_pressed {
                    continue;
                }
                let Some(armed) = record.armed else { continue };
                // Held handlers only fire while the pointer stays over its armed target.
                if record.hover != Some(armed) {
                    continue;
                }
                self.pending.push((
                    armed,
                    ActionEvent {
                        action: binding.action,
                        is_active: false,
                        device: DeviceKind::Mouse,
                    },
                    -record.pointer.id,
                ));
            }
        }

        // The fallback tick for every hovered node.
        for record in &self.records {
            if !record.loaded || record.pointer.is_disabled {
                continue;
            }
            if let Some(target) = record.hover {
                self.pending.push((
                    target,
                    ActionEvent {
                        action: input::actions::frame_event(),
                        is_active: true,
                        device: DeviceKind::Mouse,
                    },
                    record.pointer.id,
                ));
            }
        }

    }

    /// Close the frame: route scroll motion against the chain just collected, finalize
    /// hover targets, and release ended presses. Routed scroll is delivered when its
    /// target draws next frame.
    pub(crate) fn end_frame(&mut self) {
        self.pending_scroll.clear();
        for record in &mut self.records {
            if record.loaded && !record.pointer.is_disabled {
                let delta = record.pointer.scroll;
                if delta != Vector2::ZERO {
                    let deepest_capable = record
                        .scroll_chain
                        .iter()
                        .rev()
                        .find(|&&(_, _, can)| can)
                        .map(|&(node, _, _)| node);
                    let target = if record.pointer.is_scroll_held {
                        // A held scroll locks onto the scrollable it first matched and
                        // never walks up, even once that scrollable is saturated.
                        if record.locked_scrollable.is_none() {
                            record.locked_scrollable = deepest_capable;
                        }
                        record.locked_scrollable
                    } else {
                        // Deepest scrollable that can still consume the delta; saturated
                        // ones pass the motion to the next capable ancestor.
                        deepest_capable
                    };
                    if let Some(node) = target {
                        self.pending_scroll.push((node, delta));
                    }
                }
            }

            record.hover = record.candidate.map(|(id, _)| id);
            record.candidate = None;
            record.block = None;
            if !record.pointer.is_pressed {
                record.armed = None;
                record.locked_scrollable = None;
            }
            record.was_pressed = record.pointer.is_pressed;
            record.pointer.scroll = Vector2::ZERO;
            record.loaded = false;
        }
    }
}

impl Default for HoverState {
    fn default() -> Self {
        Self::new()
    }
}

impl HoverIo for HoverState {
    fn load_pointer(
        &mut self,
        device: usize,
        number: u32,
        position: Vector2,
        scroll: Vector2,
        pressed: bool,
        scroll_held: bool,
    ) -> i32 {
        if let Some(record) = self
            .records
            .iter_mut()
            .find(|record| record.pointer.device == device && record.pointer.number == number)
        {
            record.pointer.position = position;
            record.pointer.scroll = scroll;
            record.pointer.is_pressed = pressed;
            record.pointer.is_scroll_held = scroll_held;
            record.loaded = true;
            return record.pointer.id;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.records.push(PointerRecord {
            pointer: HoverPointer {
                device,
                number,
                position,
                scroll,
                is_pressed: pressed,
                is_scroll_held: scroll_held,
                is_disabled: false,
                id,
            },
            loaded: true,
            was_pressed: false,
            hover: None,
            armed: None,
            armed_position: position,
            candidate: None,
            block: None,
            scroll_chain: Vec::new(),
            locked_scrollable: None,
            click_streak: 0,
            last_press: None,
        });
        id
    }

    fn set_pointer_disabled(&mut self, id: i32, disabled: bool) {
        if let Some(record) = self
            .records
            .iter_mut()
            .find(|record| record.pointer.id == id)
        {
            record.pointer.is_disabled = disabled;
        }
    }

    fn pointers(&self) -> Vec<HoverPointer> {
        let mut result = Vec::new();
        for record in &self.records {
            if !record.loaded {
                continue;
            }
            result.push(record.pointer);
            if record.armed.is_some() {
                let mut twin = record.pointer;
                twin.id = -record.pointer.id;
                twin.position = record.armed_position;
                result.push(twin);
            }
        }
        result
    }

    fn pointer_probes(&self) -> SmallVec<[(i32, Vector2, Vector2); 4]> {
        self.records
            .iter()
            .filter(|record| record.loaded && !record.pointer.is_disabled)
            .map(|record| (record.pointer.id, record.pointer.position, record.pointer.scroll))
            .collect()
    }

    fn test_node(
        &mut self,
        id: NodeId,
        depth: u32,
        crop: Rectangle,
        outer: Rectangle,
        test: &mut dyn FnMut(Vector2) -> HitFilter,
    ) -> HitGuard {
        let mut guard = HitGuard::default();
        for (index, record) in self.records.iter_mut().enumerate() {
            if !record.loaded || record.pointer.is_disabled {
                continue;
            }
            // An ancestor absorbed or blanked this subtree for the pointer.
            if record.block.is_some() {
                continue;
            }
            let position = record.pointer.position;
            if !outer.contains(position) || !crop.contains(position) {
                continue;
            }
            let filter = test(position);
            if filter.in_self() {
                record.candidate = Some((id, depth));
            }
            if !filter.in_children() {
                guard.saved.push((index, record.block));
                record.block = Some(depth);
            }
        }
        guard
    }

    fn untest_node(&mut self, guard: HitGuard) {
        for (index, previous) in guard.saved {
            if let Some(record) = self.records.get_mut(index) {
                record.block = previous;
            }
        }
    }

    fn report_scrollable(&mut self, pointer: i32, node: NodeId, depth: u32, can_consume: bool) {
        if let Some(record) = self
            .records
            .iter_mut()
            .find(|record| record.pointer.id == pointer)
        {
            record.scroll_chain.push((node, depth, can_consume));
        }
    }

    fn take_pending(&mut self, node: NodeId) -> SmallVec<[(ActionEvent, i32); 4]> {
        let mut taken = SmallVec::new();
        self.pending.retain(|&(target, event, pointer)| {
            if target == node {
                taken.push((event, pointer));
                false
            } else {
                true
            }
        });
        taken
    }

    fn take_scroll(&mut self, node: NodeId) -> Option<Vector2> {
        let mut total: Option<Vector2> = None;
        self.pending_scroll.retain(|&(target, delta)| {
            if target == node {
                total = Some(total.unwrap_or(Vector2::ZERO) + delta);
                false
            } else {
                true
            }
        });
        total
    }

    fn is_hovered(&self, node: NodeId) -> bool {
        self.records.iter().any(|record| {
            record.hover == Some(node) || record.armed == Some(node)
        })
    }

    fn hover_of(&self, pointer: i32) -> Option<NodeId> {
        if pointer < 0 {
            self.record(-pointer)?.armed
        } else {
            self.record(pointer)?.hover
        }
    }

    fn pointers_over(&self, node: NodeId) -> SmallVec<[HoverPointer; 2]> {
        self.records
            .iter()
            .filter(|record| record.loaded && record.hover == Some(node))
            .map(|record| record.pointer)
            .collect()
    }

    fn fresh_presses(&self) -> SmallVec<[Vector2; 2]> {
        self.records
            .iter()
            .filter(|record| {
                record.loaded
                    && !record.pointer.is_disabled
                    && record.pointer.is_pressed
                    && !record.was_pressed
            })
            .map(|record| record.pointer.position)
            .collect()
    }

    fn click_streak(&self, pointer: i32) -> u32 {
        self.record(pointer.abs())
            .map(|record| record.click_streak)
            .unwrap_or(0)
    }
}

/// A node that publishes a [`HoverIo`] system over its branch.
///
/// Routes the frame's mouse actions to the pointers' targets before the subtree draws, and
/// finalizes hover targets and scroll chains after.
pub struct HoverChain {
    core: NodeCore,
    state: Rc<RefCell<HoverState>>,
    child: Box<dyn Node>,
}

impl HoverChain {
    pub fn new(child: impl Node) -> Self {
        Self::from_boxed(Box::new(child))
    }

    pub fn from_boxed(child: Box<dyn Node>) -> Self {
        Self {
            core: NodeCore::new(Layout::fill(0)),
            state: Rc::new(RefCell::new(HoverState::new())),
            child,
        }
    }

    /// Shared handle to the pointer table.
    pub fn state(&self) -> SharedIo<HoverState> {
        self.state.clone()
    }

    fn io_handle(&self) -> SharedIo<dyn HoverIo> {
        self.state.clone()
    }
}

impl Node for HoverChain {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn resize_impl(&mut self, ctx: &mut TreeContext, space: Vector2) -> Result<(), ResizeError> {
        let previous = ctx.io.replace_hover(Some(self.io_handle()));
        let result = self.child.resize(ctx, space);
        ctx.io.replace_hover(previous);
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
        self.state.borrow_mut().begin_frame(
            &frame,
            ctx.io.focus(),
            ctx.io.time(),
            ctx.io.preference(),
        );

        let previous = ctx.io.replace_hover(Some(self.io_handle()));
        self.child.draw(ctx, inner);
        ctx.io.replace_hover(previous);

        self.state.borrow_mut().end_frame();
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

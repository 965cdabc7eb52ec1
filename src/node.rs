use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::action::Actionable;
use crate::canvas::CanvasIo;
use crate::context::{ResizeError, TreeContext};
use crate::focus::{FocusEntry, FocusIo, Focusable};
use crate::geometry::{Rectangle, Vector2};
use crate::hover::{HoverIo, Hoverable};
use crate::input::{self, InputActionId};
use crate::layout::Layout;
use crate::scroll::Scrollable;
use crate::style::Style;
use crate::tag_list::TagList;
use crate::tree::TreeAction;

bitflags! {
    /// This bitmask defines whether a node contains a point in its boundaries.
    ///
    /// To allow this to default to [`Self::HIT`] while being zero-initialized, each bit is
    /// inverted; i.e. `0` means *yes, in bounds* and `1` means *no, not in bounds*.
    ///
    /// `HitFilter` is used as a return value of [`Node::in_bounds`]. For most use-cases,
    /// [`Self::HIT`] and [`Self::MISS`] are the most appropriate, specifying that the point in
    /// question is, or is not, in the node's bounds. This defines the way nodes interact with
    /// mouse, touchscreen or other hover events.
    ///
    /// The node is not normally responsible for the bounds of its children, so neither a `MISS`
    /// nor a `HIT` answer prevents children from overriding it. It is sometimes desirable to
    /// keep children from occupying space, though, for example to hijack and control mouse
    /// input. To specify that children *cannot* be in bounds, use [`Self::MISS_BRANCH`]
    /// (none of the nodes in the branch include the point) or [`Self::HIT_BRANCH`] (the node
    /// captures all events, including those of its children).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HitFilter: u8 {
        /// The point is in bounds of this node.
        const HIT = 0;

        /// The point is *not* in bounds of this node.
        const MISS = 1;

        /// The point is in bounds, and absorbed from the children: the node captures every
        /// hit in its subtree for itself.
        const HIT_BRANCH = 2;

        /// The point is *not* in bounds of any of the nodes in the branch; neither of self,
        /// nor any of the children nodes.
        const MISS_BRANCH = 3;
    }
}

impl HitFilter {
    /// True if the queried point can be found in the node itself.
    pub const fn in_self(self) -> bool {
        !self.contains(Self::MISS)
    }

    /// True if the queried point may be found in the children of the node. A false value
    /// indicates that children should not be tested at all.
    pub const fn in_children(self) -> bool {
        !self.contains(Self::HIT_BRANCH)
    }

    /// Create a value that combines the restrictions of both masks; either of the masks acts
    /// as a "filter", hence the name.
    ///
    /// For example, combining [`Self::HIT`] with [`Self::MISS`] returns [`Self::MISS`], and
    /// combining [`Self::MISS`] with [`Self::HIT_BRANCH`] returns [`Self::MISS_BRANCH`].
    pub const fn filter(self, other: Self) -> Self {
        self.union(other)
    }
}

const _: () = assert!(HitFilter::empty().bits() == HitFilter::HIT.bits());
const _: () = assert!(!HitFilter::MISS.in_self());
const _: () = assert!(HitFilter::MISS.in_children());
const _: () = assert!(HitFilter::HIT.in_self());
const _: () = assert!(HitFilter::HIT.in_children());
const _: () = assert!(!HitFilter::MISS_BRANCH.in_self());
const _: () = assert!(!HitFilter::MISS_BRANCH.in_children());
const _: () = assert!(HitFilter::HIT_BRANCH.in_self());
const _: () = assert!(!HitFilter::HIT_BRANCH.in_children());
const _: () = assert!(HitFilter::HIT.filter(HitFilter::MISS).bits() == HitFilter::MISS.bits());
const _: () =
    assert!(HitFilter::MISS.filter(HitFilter::HIT_BRANCH).bits() == HitFilter::MISS_BRANCH.bits());

/// Identity of a node, unique within the process and stable for the node's lifetime.
///
/// Services refer to nodes by ID rather than by reference: the parent owns the node, and the
/// traversal is the only place references exist.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// State common to every UI node.
///
/// Node implementations embed this struct and expose it through [`Node::core`]; the traversal
/// wrappers read and update it on every pass.
pub struct NodeCore {
    id: NodeId,

    /// Layout for this node.
    pub layout: Layout,

    /// Style of this node. Only the box model and the tint are consumed by the tree.
    pub style: Style,

    /// Tags assigned to this node. Pushed onto the tree's breadcrumbs whenever the node is
    /// resized or drawn.
    pub tags: TagList,

    /// Filter to apply to every result of [`Node::in_bounds`], controlling how the node
    /// reacts to hover events such as a mouse click or a finger touch.
    ///
    /// Changing this to [`HitFilter::MISS`] prevents the node from accepting hover input,
    /// making it "invisible". [`HitFilter::MISS_BRANCH`] extends that to the whole branch,
    /// and [`HitFilter::HIT_BRANCH`] absorbs the children's input. The default allows all
    /// events.
    pub hit_filter: HitFilter,

    /// Minimum size of the node, including its margin, border and padding. Recorded by the
    /// last resize.
    min_size: Vector2,

    /// If true, this node must update its size before the next draw.
    is_resize_pending: bool,

    /// If true, a node somewhere in this branch (self included) has a resize pending.
    /// Recomputed at the start of every draw.
    branch_pending: bool,

    /// If true, this node is hidden and won't be rendered.
    is_hidden: bool,

    /// If true, this node is currently disabled.
    is_disabled: bool,

    /// True if an ancestor of this node was disabled during the last draw.
    is_disabled_inherited: bool,

    /// If true, this node requested removal, and the parent will drop it after the current
    /// draw.
    to_remove: bool,

    /// Actions queued for this node. Moved into the tree context once traversal reaches the
    /// node.
    queued_actions: Vec<Rc<RefCell<dyn TreeAction>>>,
}

impl NodeCore {
    pub fn new(layout: Layout) -> Self {
        Self {
            id: NodeId::next(),
            layout,
            style: Style::default(),
            tags: TagList::new(),
            hit_filter: HitFilter::HIT,
            min_size: Vector2::ZERO,
            is_resize_pending: true,
            branch_pending: true,
            is_hidden: false,
            is_disabled: false,
            is_disabled_inherited: false,
            to_remove: false,
            queued_actions: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Minimum size recorded by the last resize. An upper bound contract: parents allot at
    /// least this much space, unless the window itself is too small.
    #[inline]
    pub fn min_size(&self) -> Vector2 {
        self.min_size
    }

    /// Record the node's minimum size. Must be called by every
    /// [`resize_impl`](Node::resize_impl).
    pub fn set_min_size(&mut self, size: Vector2) {
        debug_assert!(size.x >= 0.0 && size.y >= 0.0, "minimum size must not be negative");
        self.min_size = size;
    }

    /// Recalculate the size of this branch before the next draw.
    ///
    /// Multiple calls within one frame coalesce into a single resize.
    #[inline]
    pub fn update_size(&mut self) {
        self.is_resize_pending = true;
    }

    /// Check if the node is hidden.
    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.is_hidden || self.to_remove
    }

    /// Set the visibility. A hidden node keeps its place in the tree but contributes no
    /// minimum size and is never drawn.
    pub fn set_hidden(&mut self, value: bool) {
        // If changed, trigger a resize.
        if self.is_hidden != value {
            self.update_size();
        }
        self.is_hidden = value;
    }

    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.is_disabled
    }

    pub fn set_disabled(&mut self, value: bool) {
        self.is_disabled = value;
    }

    /// Check if this node is disabled, directly or through an ancestor. The inherited half
    /// updates as the tree is drawn.
    #[inline]
    pub fn is_disabled_effective(&self) -> bool {
        self.is_disabled || self.is_disabled_inherited
    }

    /// Ask the parent to remove this node from the tree after the current draw.
    #[inline]
    pub fn remove(&mut self) {
        self.to_remove = true;
    }

    /// True if the node requested removal.
    #[inline]
    pub fn to_remove(&self) -> bool {
        self.to_remove
    }

    /// Queue a tree action to start from this node: its hooks will fire for this node and
    /// its descendants only, starting the next time traversal reaches the node.
    pub fn queue_action(&mut self, action: Rc<RefCell<dyn TreeAction>>) {
        self.queued_actions.push(action);
    }

    pub(crate) fn set_disabled_inherited(&mut self, value: bool) {
        self.is_disabled_inherited = value;
    }

    pub(crate) fn clear_resize_pending(&mut self) {
        self.is_resize_pending = false;
        self.branch_pending = false;
    }

    pub(crate) fn is_resize_pending(&self) -> bool {
        self.is_resize_pending
    }

    pub(crate) fn set_branch_pending(&mut self, value: bool) {
        self.branch_pending = value;
    }

    pub(crate) fn is_branch_pending(&self) -> bool {
        self.branch_pending
    }
}

/// A unit of the UI tree.
///
/// Nodes are owned by their parents; the tree context carries everything else they need.
/// Implementations provide the two traversal halves, [`resize_impl`](Self::resize_impl) and
/// [`draw_impl`](Self::draw_impl), and advertise input capabilities through the `as_*`
/// accessors. The corresponding wrappers on `dyn Node` ([`resize`](Node::resize) and
/// [`draw`](Node::draw)) handle everything shared: dirty tracking, visibility, the box model,
/// tree action hooks and input delivery.
pub trait Node: 'static {
    /// Tree data common to all nodes.
    fn core(&self) -> &NodeCore;
    fn core_mut(&mut self) -> &mut NodeCore;

    /// Compute the node's layout for the suggested available space and record the result
    /// with [`NodeCore::set_min_size`].
    ///
    /// Children are resized from here via [`Node::resize`]. The space is a suggestion and
    /// must not be retained; in the absence of state changes, the result must not change
    /// between calls. Collaborators should be `require`d here, not during the draw, so a
    /// missing capability fails the frame before anything is half-painted.
    fn resize_impl(&mut self, ctx: &mut TreeContext, space: Vector2) -> Result<(), ResizeError>;

    /// Paint the node within `inner`; `outer` additionally includes the node's border and
    /// padding. Children are drawn from here, in declaration order, via [`Node::draw`].
    fn draw_impl(&mut self, ctx: &mut TreeContext, outer: Rectangle, inner: Rectangle);

    /// Decide if the given point belongs to the node. The wrapper has already checked the
    /// point against `outer` and the current crop; this hook only refines the answer, for
    /// example to carve out rounded corners or to pass hits through.
    fn in_bounds(&self, outer: Rectangle, inner: Rectangle, position: Vector2) -> HitFilter {
        let _ = (outer, inner, position);
        HitFilter::HIT
    }

    /// Visit every direct child. Used by the dirty scan; containers must implement this,
    /// leaves keep the default.
    fn for_each_child(&mut self, callback: &mut dyn FnMut(&mut dyn Node)) {
        let _ = callback;
    }

    /// The concrete node, for hosts that need to reach a specific type. Implementations
    /// return `self`.
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    /// The node's focus capability, if it accepts keyboard focus.
    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        None
    }

    /// The node's hover capability, if it responds to pointer input.
    fn as_hoverable(&mut self) -> Option<&mut dyn Hoverable> {
        None
    }

    /// The node's scroll capability, if it can consume scroll input.
    fn as_scrollable(&mut self) -> Option<&mut dyn Scrollable> {
        None
    }
}

impl dyn Node {
    /// Resize the node if its branch has a resize pending, reusing the recorded minimum size
    /// otherwise. Parents call this for each child before reading
    /// [`NodeCore::min_size`].
    pub fn resize(&mut self, ctx: &mut TreeContext, space: Vector2) -> Result<(), ResizeError> {
        self.pickup_queued_actions(ctx);

        if self.core().is_hidden() {
            // A hidden branch is skipped entirely; clear its flags so it doesn't keep the
            // tree dirty. It is marked again when shown.
            clear_pending(self);
            return Ok(());
        }
        if !self.core().is_branch_pending() && !self.core().is_resize_pending() {
            return Ok(());
        }

        let id = self.core().id();
        let tags = self.core().tags.clone();
        let has_tags = !tags.is_empty();
        if has_tags {
            ctx.breadcrumbs.push(tags);
        }

        ctx.actions.enter_node(id);
        ctx.actions.fire_before_resize(self, space);
        let result = self.resize_impl(ctx, space);
        self.core_mut().clear_resize_pending();
        ctx.actions.leave_node(id);

        if has_tags {
            ctx.breadcrumbs.pop();
        }
        result
    }

    /// Draw the node into the given space.
    ///
    /// The wrapper aligns the node inside `space` per its layout, computes the box model,
    /// publishes breadcrumbs and tint, performs the hover hit test, delivers pending input
    /// actions, fires tree action hooks, and finally calls
    /// [`draw_impl`](Node::draw_impl).
    pub fn draw(&mut self, ctx: &mut TreeContext, space: Rectangle) {
        self.pickup_queued_actions(ctx);
        if self.core().is_hidden() {
            return;
        }

        let id = self.core().id();
        let aligned = self.core().layout.align_box(space, self.core().min_size());
        let style = self.core().style.clone();
        let outer = style.outer_box(aligned);
        let padding_box = style.border.shrink(outer);
        let inner = style.inner_box(outer);

        // Disabled state flows down; remember what we inherited.
        let was_branch_disabled = ctx.is_branch_disabled;
        self.core_mut().set_disabled_inherited(was_branch_disabled);
        ctx.is_branch_disabled |= self.core().is_disabled();

        let tags = self.core().tags.clone();
        let has_tags = !tags.is_empty();
        if has_tags {
            ctx.breadcrumbs.push(tags);
        }

        ctx.depth += 1;
        let parent_node = std::mem::replace(&mut ctx.current_node, Some(id));
        let previous_tint = ctx.push_tint(style.tint);
        let canvas_tint = ctx.io.canvas().map(|canvas| {
            let previous = canvas.borrow_mut().set_tint(ctx.tint());
            previous
        });

        ctx.actions.enter_node(id);
        ctx.actions.fire_before_draw(self, outer, padding_box, inner);

        let hit_guard = self.hit_test(ctx, outer, inner);
        self.report_scrollables(ctx, outer);
        self.deliver_input(ctx, outer);

        self.draw_impl(ctx, outer, inner);

        ctx.actions.fire_after_draw(self, outer, padding_box, inner);

        if let (Some(guard), Some(hover)) = (hit_guard, ctx.io.hover()) {
            hover.borrow_mut().untest_node(guard);
        }
        if let (Some(previous), Some(canvas)) = (canvas_tint, ctx.io.canvas()) {
            canvas.borrow_mut().set_tint(previous);
        }
        ctx.restore_tint(previous_tint);
        ctx.current_node = parent_node;
        ctx.depth -= 1;
        if has_tags {
            ctx.breadcrumbs.pop();
        }
        ctx.is_branch_disabled = was_branch_disabled;
        ctx.actions.leave_node(id);
    }

    /// Dispatch an input action straight to this node's handler, skipping the input queue.
    ///
    /// Unlike queued dispatch, this runs synchronously: the handler has run by the time this
    /// returns. Returns true if the node handled the action.
    pub fn run_input_action(
        &mut self,
        ctx: &mut TreeContext,
        action: InputActionId,
        is_active: bool,
    ) -> bool {
        if let Some(focusable) = self.as_focusable() {
            if focusable.blocks_input() {
                return false;
            }
            return focusable.action_impl(ctx, None, action, is_active);
        }
        if let Some(hoverable) = self.as_hoverable() {
            if hoverable.blocks_input() {
                return false;
            }
            return hoverable.action_impl(ctx, None, action, is_active);
        }
        false
    }

    fn pickup_queued_actions(&mut self, ctx: &mut TreeContext) {
        if self.core().queued_actions.is_empty() {
            return;
        }
        let id = self.core().id();
        let queued = std::mem::take(&mut self.core_mut().queued_actions);
        for action in queued {
            ctx.actions.start(action, Some(id));
        }
    }

    /// Test every live pointer against this node, updating hover candidates. Returns a guard
    /// that the wrapper hands back once the subtree is drawn.
    fn hit_test(
        &mut self,
        ctx: &mut TreeContext,
        outer: Rectangle,
        inner: Rectangle,
    ) -> Option<crate::hover::HitGuard> {
        let hover = ctx.io.hover()?;
        let id = self.core().id();
        let base_filter = self.core().hit_filter;
        let crop = ctx.crop();
        let depth = ctx.depth;
        let mut test = |position: Vector2| self.in_bounds(outer, inner, position).filter(base_filter);
        let guard = hover.borrow_mut().test_node(id, depth, crop, outer, &mut test);
        Some(guard)
    }

    /// Tell the hover system which pointers this node could consume scroll input for.
    fn report_scrollables(&mut self, ctx: &mut TreeContext, outer: Rectangle) {
        if self.as_scrollable().is_none() {
            return;
        }
        let Some(hover) = ctx.io.hover() else { return };
        let id = self.core().id();
        let depth = ctx.depth;
        let crop = ctx.crop();

        let probes: SmallVec<[(i32, Vector2, Vector2); 4]> = hover.borrow().pointer_probes();
        for (pointer, position, delta) in probes {
            if !crop.intersect(outer).contains(position) {
                continue;
            }
            let can_consume = self
                .as_scrollable()
                .map(|scrollable| scrollable.can_scroll(delta))
                .unwrap_or(false);
            hover
                .borrow_mut()
                .report_scrollable(pointer, id, depth, can_consume);
        }
    }

    /// Hand the node every input action addressed to it this frame: focus actions if it is
    /// focused, hover actions if a pointer is aimed at it, and queued scroll motion.
    fn deliver_input(&mut self, ctx: &mut TreeContext, outer: Rectangle) {
        let id = self.core().id();
        let disabled = ctx.is_branch_disabled;

        if let Some(focus) = ctx.io.focus() {
            if self.as_focusable().is_some() {
                focus.borrow_mut().register(FocusEntry {
                    id,
                    bounds: outer,
                    disabled,
                });
            }

            let is_focused = focus.borrow().is_focused(id);
            if is_focused {
                let pending = focus.borrow_mut().take_pending();
                let mut handled_active = false;
                let mut unhandled: SmallVec<[InputActionId; 4]> = SmallVec::new();
                for event in pending {
                    let handled = !disabled
                        && self
                            .as_focusable()
                            .map(|focusable| {
                                focusable.action_impl(ctx, None, event.action, event.is_active)
                            })
                            .unwrap_or(false);
                    if handled {
                        if event.is_active && event.action != input::actions::frame_event() {
                            handled_active = true;
                        }
                    } else if event.is_active {
                        unhandled.push(event.action);
                    }
                }
                for action in unhandled {
                    // Navigation falls back to the focus space itself.
                    if focus.borrow_mut().navigate(action) {
                        handled_active = true;
                    }
                }
                if handled_active {
                    focus.borrow_mut().note_handled();
                    ctx.keyboard_handled = true;
                } else if !disabled {
                    let ticked = self
                        .as_focusable()
                        .map(|focusable| focusable.focus_impl(ctx))
                        .unwrap_or(false);
                    if ticked {
                        focus.borrow_mut().note_handled();
                        ctx.keyboard_handled = true;
                    }
                }
            }
        }

        if let Some(hover) = ctx.io.hover() {
            let pending = hover.borrow_mut().take_pending(id);
            for (event, pointer) in pending {
                if disabled {
                    break;
                }
                if let Some(hoverable) = self.as_hoverable() {
                    hoverable.action_impl(ctx, Some(pointer), event.action, event.is_active);
                }
            }
            if !disabled && self.as_hoverable().is_some() {
                let over: SmallVec<[crate::hover::HoverPointer; 2]> =
                    hover.borrow().pointers_over(id);
                for pointer in over {
                    if let Some(hoverable) = self.as_hoverable() {
                        hoverable.hover_impl(ctx, &pointer);
                    }
                }
            }
            let scroll = hover.borrow_mut().take_scroll(id);
            if let Some(delta) = scroll {
                if !disabled {
                    if let Some(scrollable) = self.as_scrollable() {
                        scrollable.scroll_impl(delta);
                    }
                }
            }
        }
    }
}

fn clear_pending(node: &mut dyn Node) {
    node.core_mut().clear_resize_pending();
    node.for_each_child(&mut |child| clear_pending(child));
}

/// Mark the whole subtree for resize. Used when an input every node's layout depends on
/// changes, such as the viewport size.
pub(crate) fn mark_subtree_dirty(node: &mut dyn Node) {
    node.core_mut().update_size();
    node.for_each_child(&mut |child| mark_subtree_dirty(child));
}

/// Visit the node and every descendant, depth-first in declaration order.
pub fn visit_nodes(node: &mut dyn Node, visitor: &mut dyn FnMut(&mut dyn Node)) {
    visitor(node);
    node.for_each_child(&mut |child| visit_nodes(child, visitor));
}

/// Recompute the branch-pending flags for the subtree; returns true if anything within needs
/// a resize. Runs once per frame, before the resize pass.
pub(crate) fn scan_dirty(node: &mut dyn Node) -> bool {
    let mut pending = node.core().is_resize_pending();
    node.for_each_child(&mut |child| {
        pending |= scan_dirty(child);
    });
    node.core_mut().set_branch_pending(pending);
    pending
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_filter_truth_table() {
        assert!(HitFilter::HIT.in_self() && HitFilter::HIT.in_children());
        assert!(!HitFilter::MISS.in_self() && HitFilter::MISS.in_children());
        assert!(HitFilter::HIT_BRANCH.in_self() && !HitFilter::HIT_BRANCH.in_children());
        assert!(!HitFilter::MISS_BRANCH.in_self() && !HitFilter::MISS_BRANCH.in_children());
        assert_eq!(
            HitFilter::MISS.filter(HitFilter::HIT_BRANCH),
            HitFilter::MISS_BRANCH
        );
    }

    #[test]
    fn node_ids_are_unique() {
        let a = NodeCore::new(Layout::default());
        let b = NodeCore::new(Layout::default());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn hiding_marks_the_node_dirty() {
        let mut core = NodeCore::new(Layout::default());
        core.clear_resize_pending();
        assert!(!core.is_resize_pending());
        core.set_hidden(true);
        assert!(core.is_resize_pending());
        assert!(core.is_hidden());
    }
}

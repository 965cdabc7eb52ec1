//! Scrolling: the [`Scrollable`] seam consumed by the hover system, a one-axis scroll
//! container, and the scroll-into-view tree action.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::{ResizeError, TreeContext};
use crate::geometry::{Rectangle, Vector2};
use crate::layout::Layout;
use crate::node::{Node, NodeCore, NodeId};
use crate::space::Space;
use crate::tree::{ActionControl, LayoutTree, TreeAction};

/// Nodes that can consume scroll input.
///
/// The hover system routes each pointer's scroll motion to the deepest scrollable under it
/// that reports it can still move in the requested direction; a saturated scrollable passes
/// the motion on to the next capable ancestor, unless the scroll is held (touch-style), in
/// which case it stays locked to its initial target.
pub trait Scrollable {
    /// True if a scroll by `delta` would move the content: there is room left in the
    /// requested direction and the delta touches the node's axis.
    fn can_scroll(&self, delta: Vector2) -> bool;

    /// Apply scroll motion. Out-of-range motion clamps; this must not fail.
    fn scroll_impl(&mut self, delta: Vector2);

    /// Adjust the scroll so `child_box` becomes visible within `view`, moving as little as
    /// possible. Both rectangles are in this frame's coordinates.
    fn scroll_to_reveal(&mut self, child_box: Rectangle, view: Rectangle);
}

/// A container that stacks children along one axis and scrolls them when they don't fit.
///
/// This only supports scrolling in one axis. The content is laid out at its full minimum
/// size; drawing and hit testing are cropped to the frame's own box.
pub struct ScrollFrame {
    core: NodeCore,
    content: Space,
    horizontal: bool,

    /// Amount of pixels the content is scrolled by, towards the end of the axis.
    scroll: f32,

    /// Full content length along the scroll axis, as determined by the last resize.
    content_length: f32,

    /// Length of the visible part of the axis, as determined by the last draw.
    view_length: f32,
}

impl ScrollFrame {
    pub fn vertical(children: Vec<Box<dyn Node>>) -> Self {
        Self {
            core: NodeCore::new(Layout::fill(1)),
            content: Space::vertical(children),
            horizontal: false,
            scroll: 0.0,
            content_length: 0.0,
            view_length: 0.0,
        }
    }

    pub fn horizontal(children: Vec<Box<dyn Node>>) -> Self {
        Self {
            core: NodeCore::new(Layout::fill(1)),
            content: Space::horizontal(children),
            horizontal: true,
            scroll: 0.0,
            content_length: 0.0,
            view_length: 0.0,
        }
    }

    /// Current scroll offset, clamped on the next draw.
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn set_scroll(&mut self, value: f32) {
        self.scroll = value.max(0.0);
    }

    /// The furthest the content can scroll, given the sizes recorded by the last frame.
    pub fn max_scroll(&self) -> f32 {
        (self.content_length - self.view_length).max(0.0)
    }

    pub fn children(&self) -> &[Box<dyn Node>] {
        self.content.children()
    }

    fn axis(&self, size: Vector2) -> f32 {
        if self.horizontal { size.x } else { size.y }
    }
}

impl Node for ScrollFrame {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn resize_impl(&mut self, ctx: &mut TreeContext, space: Vector2) -> Result<(), ResizeError> {
        let (overhead_x, overhead_y) = self.core.style.box_overhead();
        let suggestion = Vector2::new(
            (space.x - overhead_x).max(0.0),
            (space.y - overhead_y).max(0.0),
        );
        let content = self.content.resize_children(ctx, suggestion)?;
        self.content_length = self.axis(content);

        // The frame itself can shrink to nothing along its axis; that's what the scrolling
        // is for. Across the axis it needs as much as its content.
        let min = if self.horizontal {
            Vector2::new(0.0, content.y)
        } else {
            Vector2::new(content.x, 0.0)
        };
        self.core
            .set_min_size(min + Vector2::new(overhead_x, overhead_y));
        Ok(())
    }

    fn draw_impl(&mut self, ctx: &mut TreeContext, _outer: Rectangle, inner: Rectangle) {
        self.view_length = self.axis(inner.size());
        self.scroll = self.scroll.clamp(0.0, self.max_scroll());

        let virtual_box = if self.horizontal {
            Rectangle::new(inner.x - self.scroll, inner.y, self.content_length, inner.height)
        } else {
            Rectangle::new(inner.x, inner.y - self.scroll, inner.width, self.content_length)
        };

        let previous_crop = ctx.push_crop(inner);
        let canvas_crop = ctx
            .io
            .canvas()
            .map(|canvas| canvas.borrow_mut().crop_to(ctx.crop()));
        self.content.draw_children(ctx, virtual_box);
        if let (Some(previous), Some(canvas)) = (canvas_crop, ctx.io.canvas()) {
            canvas.borrow_mut().restore_crop(previous);
        }
        ctx.restore_crop(previous_crop);
    }

    fn for_each_child(&mut self, callback: &mut dyn FnMut(&mut dyn Node)) {
        self.content.for_each_child(callback);
    }

    fn as_scrollable(&mut self) -> Option<&mut dyn Scrollable> {
        Some(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl Scrollable for ScrollFrame {
    fn can_scroll(&self, delta: Vector2) -> bool {
        let motion = self.axis(delta);
        if motion > 0.0 {
            self.scroll < self.max_scroll()
        } else if motion < 0.0 {
            self.scroll > 0.0
        } else {
            false
        }
    }

    fn scroll_impl(&mut self, delta: Vector2) {
        let motion = self.axis(delta);
        self.scroll = (self.scroll + motion).clamp(0.0, self.max_scroll());
    }

    fn scroll_to_reveal(&mut self, child_box: Rectangle, view: Rectangle) {
        let (child_start, child_end, view_start, view_end) = if self.horizontal {
            (child_box.x, child_box.end().x, view.x, view.end().x)
        } else {
            (child_box.y, child_box.end().y, view.y, view.end().y)
        };
        if child_end > view_end {
            self.scroll += child_end - view_end;
        } else if child_start < view_start {
            self.scroll -= view_start - child_start;
        }
        self.scroll = self.scroll.clamp(0.0, self.max_scroll());
    }
}

/// A tree action that adjusts every scrollable ancestor of a target node so the target
/// becomes visible. Single-frame: it observes one draw and stops.
pub struct ScrollIntoView {
    control: ActionControl,
    target: NodeId,

    /// IDs of the nodes currently being drawn, outermost first.
    stack: Vec<NodeId>,

    /// Ancestors of the target, captured the moment the target finishes drawing.
    ancestors: Vec<NodeId>,

    /// Where the target was drawn.
    found: Option<Rectangle>,
}

impl ScrollIntoView {
    pub fn new(target: NodeId) -> Self {
        Self {
            control: ActionControl::new(),
            target,
            stack: Vec::new(),
            ancestors: Vec::new(),
            found: None,
        }
    }
}

impl TreeAction for ScrollIntoView {
    fn control(&mut self) -> &mut ActionControl {
        &mut self.control
    }

    fn before_draw(
        &mut self,
        node: &mut dyn Node,
        _outer: Rectangle,
        _padding_box: Rectangle,
        _content: Rectangle,
    ) {
        self.stack.push(node.core().id());
    }

    fn after_draw(
        &mut self,
        node: &mut dyn Node,
        outer: Rectangle,
        _padding_box: Rectangle,
        content: Rectangle,
    ) {
        let id = node.core().id();
        self.stack.pop();

        if id == self.target {
            self.found = Some(outer);
            self.ancestors = self.stack.clone();
            return;
        }
        // Scrollable ancestors reveal the recorded box, innermost first as the traversal
        // unwinds.
        if let Some(found) = self.found {
            if self.ancestors.contains(&id) {
                if let Some(scrollable) = node.as_scrollable() {
                    scrollable.scroll_to_reveal(found, content);
                }
            }
        }
    }
}

/// Queue a [`ScrollIntoView`] action for the next draw.
pub fn scroll_into_view(tree: &mut LayoutTree, target: NodeId) {
    tree.queue_action(Rc::new(RefCell::new(ScrollIntoView::new(target))));
}

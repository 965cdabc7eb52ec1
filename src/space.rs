//! Structural containers: [`Space`] lays children out along an axis without painting
//! anything; [`Frame`] is the same with an opaque background.

use crate::context::{ResizeError, TreeContext};
use crate::geometry::{Color, Rectangle, Vector2};
use crate::layout::Layout;
use crate::node::{HitFilter, Node, NodeCore};

/// A container that stacks its children along one axis.
///
/// Children are drawn in declaration order. Each child is allotted its minimum size plus a
/// share of the surplus proportional to its expand weight; inter-child gaps apply only
/// between visible children. The space itself is transparent to hover input.
pub struct Space {
    core: NodeCore,
    children: Vec<Box<dyn Node>>,
    horizontal: bool,
}

/// Shorthand for a vertical [`Space`].
pub fn vspace(children: Vec<Box<dyn Node>>) -> Space {
    Space::vertical(children)
}

/// Shorthand for a horizontal [`Space`].
pub fn hspace(children: Vec<Box<dyn Node>>) -> Space {
    Space::horizontal(children)
}

impl Space {
    pub fn vertical(children: Vec<Box<dyn Node>>) -> Self {
        Self {
            core: NodeCore::new(Layout::fill(0)),
            children,
            horizontal: false,
        }
    }

    pub fn horizontal(children: Vec<Box<dyn Node>>) -> Self {
        Self {
            core: NodeCore::new(Layout::fill(0)),
            children,
            horizontal: true,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        self.horizontal
    }

    pub fn children(&self) -> &[Box<dyn Node>] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Box<dyn Node>> {
        self.core.update_size();
        &mut self.children
    }

    /// Append a child, marking the container for resize.
    pub fn push(&mut self, child: impl Node) {
        self.children.push(Box::new(child));
        self.core.update_size();
    }

    fn gap(&self) -> f32 {
        let gap = self.core.style.gap;
        if self.horizontal { gap[0] } else { gap[1] }
    }

    pub(crate) fn resize_children(
        &mut self,
        ctx: &mut TreeContext,
        space: Vector2,
    ) -> Result<Vector2, ResizeError> {
        let horizontal = self.horizontal;
        let axis = |size: Vector2| if horizontal { size.x } else { size.y };
        let cross = |size: Vector2| if horizontal { size.y } else { size.x };
        let gap = self.gap();

        let mut along = 0.0;
        let mut across: f32 = 0.0;
        let mut visible = 0usize;

        for child in &mut self.children {
            child.resize(ctx, space)?;
            if child.core().is_hidden() {
                continue;
            }
            let min = child.core().min_size();
            visible += 1;
            along += axis(min);
            across = across.max(cross(min));
        }
        if visible > 1 {
            along += gap * (visible - 1) as f32;
        }

        Ok(if horizontal {
            Vector2::new(along, across)
        } else {
            Vector2::new(across, along)
        })
    }

    pub(crate) fn draw_children(&mut self, ctx: &mut TreeContext, inner: Rectangle) {
        let horizontal = self.horizontal;
        let axis = |size: Vector2| if horizontal { size.x } else { size.y };
        let gap = self.gap();

        // Surplus to distribute between expanding children.
        let mut content = 0.0;
        let mut visible = 0usize;
        let mut total_expand = 0u32;
        let mut last_expanded = None;
        for (index, child) in self.children.iter().enumerate() {
            if child.core().is_hidden() {
                continue;
            }
            visible += 1;
            content += axis(child.core().min_size());
            let expand = child.core().layout.expand;
            total_expand += expand;
            if expand > 0 {
                last_expanded = Some(index);
            }
        }
        if visible > 1 {
            content += gap * (visible - 1) as f32;
        }
        let available = axis(inner.size());
        let surplus = (available - content).max(0.0);

        let mut cursor = if horizontal { inner.x } else { inner.y };
        let mut handed_out = 0.0;
        let mut remaining_visible = visible;
        for (index, child) in self.children.iter_mut().enumerate() {
            if child.core().is_hidden() {
                continue;
            }
            let min = child.core().min_size();
            let expand = child.core().layout.expand;
            let extra = if total_expand == 0 || expand == 0 {
                0.0
            } else if Some(index) == last_expanded {
                // Whatever rounding left behind lands on the last expanding child.
                surplus - handed_out
            } else {
                let share = (surplus * expand as f32 / total_expand as f32).floor();
                handed_out += share;
                share
            };

            let length = axis(min) + extra;
            let rect = if horizontal {
                Rectangle::new(cursor, inner.y, length, inner.height)
            } else {
                Rectangle::new(inner.x, cursor, inner.width, length)
            };
            child.draw(ctx, rect);

            cursor += length;
            remaining_visible -= 1;
            if remaining_visible > 0 {
                cursor += gap;
            }
        }

        // Children may have asked to leave the tree during this draw.
        let before = self.children.len();
        self.children.retain(|child| !child.core().to_remove());
        if self.children.len() != before {
            self.core.update_size();
        }
    }
}

impl Node for Space {
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
        let content = self.resize_children(ctx, suggestion)?;
        self.core
            .set_min_size(content + Vector2::new(overhead_x, overhead_y));
        Ok(())
    }

    fn draw_impl(&mut self, ctx: &mut TreeContext, _outer: Rectangle, inner: Rectangle) {
        self.draw_children(ctx, inner);
    }

    fn in_bounds(&self, _outer: Rectangle, _inner: Rectangle, _position: Vector2) -> HitFilter {
        // Purely structural; hover falls through to whatever is behind.
        HitFilter::MISS
    }

    fn for_each_child(&mut self, callback: &mut dyn FnMut(&mut dyn Node)) {
        for child in &mut self.children {
            callback(child.as_mut());
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// A [`Space`] with an opaque background.
pub struct Frame {
    space: Space,
    pub background: Color,
}

/// Shorthand for a vertical [`Frame`].
pub fn vframe(background: Color, children: Vec<Box<dyn Node>>) -> Frame {
    Frame::vertical(background, children)
}

/// Shorthand for a horizontal [`Frame`].
pub fn hframe(background: Color, children: Vec<Box<dyn Node>>) -> Frame {
    Frame::horizontal(background, children)
}

impl Frame {
    pub fn vertical(background: Color, children: Vec<Box<dyn Node>>) -> Self {
        Self {
            space: Space::vertical(children),
            background,
        }
    }

    pub fn horizontal(background: Color, children: Vec<Box<dyn Node>>) -> Self {
        Self {
            space: Space::horizontal(children),
            background,
        }
    }

    pub fn children(&self) -> &[Box<dyn Node>] {
        self.space.children()
    }

    pub fn push(&mut self, child: impl Node) {
        self.space.push(child);
    }
}

impl Node for Frame {
    fn core(&self) -> &NodeCore {
        self.space.core()
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        self.space.core_mut()
    }

    fn resize_impl(&mut self, ctx: &mut TreeContext, space: Vector2) -> Result<(), ResizeError> {
        self.space.resize_impl(ctx, space)
    }

    fn draw_impl(&mut self, ctx: &mut TreeContext, outer: Rectangle, inner: Rectangle) {
        if let Some(canvas) = ctx.io.canvas() {
            canvas.borrow_mut().draw_rectangle(outer, self.background);
        }
        self.space.draw_children(ctx, inner);
    }

    // Frames are opaque: the default HIT answer stands.

    fn for_each_child(&mut self, callback: &mut dyn FnMut(&mut dyn Node)) {
        self.space.for_each_child(callback);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

use crate::geometry::{Color, Rectangle};
use crate::tag_list::{TagId, TagList};

/// A side of a box. Used to index [`SideArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// Side array is a static array defining a property separately for each side of a box, for
/// example margin and border size. Order is as follows: `[left, right, top, bottom]`. The
/// array can be indexed with the [`Side`] enum.
///
/// To manipulate whole axes at once, use the `horizontal`/`vertical` accessors, which return
/// the `[left, right]` and `[top, bottom]` pairs, and the matching setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideArray<T>(pub [T; 4]);

impl<T> std::ops::Index<Side> for SideArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Side) -> &Self::Output {
        self.side(index)
    }
}

impl<T> std::ops::IndexMut<Side> for SideArray<T> {
    #[inline]
    fn index_mut(&mut self, index: Side) -> &mut Self::Output {
        self.side_mut(index)
    }
}

impl<T> SideArray<T> {
    #[inline]
    pub const fn side(&self, side: Side) -> &T {
        &self.0[side as usize]
    }

    #[inline]
    pub const fn side_mut(&mut self, side: Side) -> &mut T {
        &mut self.0[side as usize]
    }

    /// The `[left, right]` pair.
    #[inline]
    pub fn horizontal(&self) -> &[T] {
        &self.0[0..2]
    }

    /// The `[top, bottom]` pair.
    #[inline]
    pub fn vertical(&self) -> &[T] {
        &self.0[2..4]
    }
}

impl<T: Copy> SideArray<T> {
    /// Set the value for all sides at once.
    #[inline]
    pub const fn uniform(value: T) -> Self {
        Self([value; 4])
    }

    /// Assign both horizontal sides.
    #[inline]
    pub fn set_horizontal(&mut self, value: T) {
        self.0[0] = value;
        self.0[1] = value;
    }

    /// Assign both vertical sides.
    #[inline]
    pub fn set_vertical(&mut self, value: T) {
        self.0[2] = value;
        self.0[3] = value;
    }
}

impl SideArray<f32> {
    /// Total size the array takes along the horizontal axis.
    #[inline]
    pub const fn total_horizontal(&self) -> f32 {
        self.0[0] + self.0[1]
    }

    /// Total size the array takes along the vertical axis.
    #[inline]
    pub const fn total_vertical(&self) -> f32 {
        self.0[2] + self.0[3]
    }

    /// Shrink a rectangle by this array's sizes, clamping at zero.
    pub fn shrink(&self, rect: Rectangle) -> Rectangle {
        Rectangle {
            x: rect.x + self.0[0],
            y: rect.y + self.0[2],
            width: (rect.width - self.total_horizontal()).max(0.0),
            height: (rect.height - self.total_vertical()).max(0.0),
        }
    }
}

/// The layout-relevant portion of a node's style.
///
/// Theme and rule matching are host concerns; the tree only consumes the box model and the
/// tint, so this is all a node carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Margin (outer margin) of the node. `[left, right, top, bottom]`.
    ///
    /// Updating margins requires a resize.
    pub margin: SideArray<f32>,

    /// Border size, placed between margin and padding. `[left, right, top, bottom]`.
    ///
    /// Updating border requires a resize.
    pub border: SideArray<f32>,

    /// Padding (inner margin) of the node. `[left, right, top, bottom]`.
    ///
    /// Updating padding requires a resize.
    pub padding: SideArray<f32>,

    /// Margin/gap between two neighboring elements; for container nodes that support it.
    ///
    /// Updating the gap requires a resize.
    pub gap: [f32; 2],

    /// Apply tint to all node contents, including children.
    pub tint: Color,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            margin: SideArray::default(),
            border: SideArray::default(),
            padding: SideArray::default(),
            gap: [0.0; 2],
            tint: Color::WHITE,
        }
    }
}

impl Style {
    /// The node's outer box: the space allotted by the parent, less the margin. Borders and
    /// padding are drawn inside this box.
    pub fn outer_box(&self, space: Rectangle) -> Rectangle {
        self.margin.shrink(space)
    }

    /// The node's content box: the outer box less border and padding.
    pub fn inner_box(&self, outer: Rectangle) -> Rectangle {
        self.padding.shrink(self.border.shrink(outer))
    }

    /// Extra size the box model adds around the content on each axis.
    pub fn box_overhead(&self) -> (f32, f32) {
        (
            self.margin.total_horizontal()
                + self.border.total_horizontal()
                + self.padding.total_horizontal(),
            self.margin.total_vertical()
                + self.border.total_vertical()
                + self.padding.total_vertical(),
        )
    }
}

/// A stack of identity tokens accumulated along a draw path.
///
/// Every node that declares tags pushes them while its branch is resized or drawn, and pops
/// once finished. Observers can ask whether a given tag is anywhere on the current path.
#[derive(Debug, Clone, Default)]
pub struct Breadcrumbs {
    crumbs: Vec<TagList>,
}

impl Breadcrumbs {
    #[inline]
    pub const fn new() -> Self {
        Self { crumbs: Vec::new() }
    }

    pub(crate) fn push(&mut self, tags: TagList) {
        self.crumbs.push(tags);
    }

    pub(crate) fn pop(&mut self) {
        self.crumbs.pop();
    }

    /// Number of tag lists on the path.
    #[inline]
    pub fn depth(&self) -> usize {
        self.crumbs.len()
    }

    /// Check if the tag appears anywhere on the current path.
    pub fn contains(&self, tag: TagId) -> bool {
        self.crumbs.iter().any(|list| list.contains(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_array_axes() {
        let mut array = SideArray([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(array[Side::Left], 1.0);
        assert_eq!(array[Side::Bottom], 4.0);
        assert_eq!(array.horizontal(), &[1.0, 2.0]);
        assert_eq!(array.vertical(), &[3.0, 4.0]);

        array.set_horizontal(8.0);
        assert_eq!(array.total_horizontal(), 16.0);
        assert_eq!(array.total_vertical(), 7.0);
    }

    #[test]
    fn shrink_clamps_at_zero() {
        let rect = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let shrunk = SideArray::uniform(8.0).shrink(rect);
        assert_eq!(shrunk.width, 0.0);
        assert_eq!(shrunk.height, 0.0);
        assert_eq!(shrunk.x, 8.0);
    }

    #[test]
    fn box_model_nesting() {
        let style = Style {
            margin: SideArray::uniform(1.0),
            border: SideArray::uniform(2.0),
            padding: SideArray::uniform(3.0),
            ..Style::default()
        };
        let space = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let outer = style.outer_box(space);
        let inner = style.inner_box(outer);
        assert_eq!(outer, Rectangle::new(1.0, 1.0, 98.0, 98.0));
        assert_eq!(inner, Rectangle::new(6.0, 6.0, 88.0, 88.0));
        assert_eq!(style.box_overhead(), (12.0, 12.0));
    }
}

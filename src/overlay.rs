//! Popups: anchored child roots displayed atop the primary child, each with its own focus
//! space and dismiss rules.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::action::ActionIo;
use crate::context::{ResizeError, SharedIo, TreeContext};
use crate::focus::{FocusIo, FocusState};
use crate::geometry::{Rectangle, Vector2};
use crate::hover::HoverIo;
use crate::input;
use crate::io::DebugSignalIo;
use crate::layout::{Layout, NodeAlign};
use crate::node::{HitFilter, Node, NodeCore, NodeId};

/// I/O interface for attaching popups to the nearest overlay chain.
pub trait OverlayIo {
    /// Display a popup above the primary child. It appears on the next frame.
    fn add_popup(&mut self, popup: PopupFrame);

    /// Display a popup chained to another popup: the parent stays alive, focus transfers to
    /// the child, and dismissing the child hands focus back to the parent.
    fn add_child_popup(&mut self, parent: NodeId, popup: PopupFrame);
}

/// The standard [`OverlayIo`] implementation: an inbox the owning chain drains every frame.
#[derive(Default)]
pub struct OverlayState {
    incoming: Vec<PopupFrame>,
}

impl OverlayIo for OverlayState {
    fn add_popup(&mut self, popup: PopupFrame) {
        self.incoming.push(popup);
    }

    fn add_child_popup(&mut self, parent: NodeId, mut popup: PopupFrame) {
        popup.parent_popup = Some(parent);
        self.incoming.push(popup);
    }
}

/// Compute one axis of a popup's position relative to its anchor.
///
/// `start` and `end` place the popup outside the anchor, toward the respective side;
/// `center` centers it on the anchor; `fill` picks whichever side has more free viewport
/// space (the end side when both are equal) and slides the popup into the viewport if it
/// pokes out.
fn place_axis(
    align: NodeAlign,
    anchor_start: f32,
    anchor_end: f32,
    size: f32,
    view_start: f32,
    view_end: f32,
) -> f32 {
    match align {
        NodeAlign::Start => anchor_start - size,
        NodeAlign::End => anchor_end,
        NodeAlign::Center => (anchor_start + anchor_end) / 2.0 - size / 2.0,
        NodeAlign::Fill => {
            let space_before = anchor_start - view_start;
            let space_after = view_end - anchor_end;
            let position = if space_after >= space_before {
                anchor_end
            } else {
                anchor_start - size
            };
            position.min(view_end - size).max(view_start)
        }
    }
}

/// Position a popup of the given size around its anchor within the viewport.
pub fn place_popup(
    anchor: Rectangle,
    viewport: Rectangle,
    align: [NodeAlign; 2],
    size: Vector2,
) -> Rectangle {
    let x = place_axis(
        align[0],
        anchor.x,
        anchor.end().x,
        size.x,
        viewport.x,
        viewport.end().x,
    );
    let y = place_axis(
        align[1],
        anchor.y,
        anchor.end().y,
        size.y,
        viewport.y,
        viewport.end().y,
    );
    Rectangle::from_vectors(Vector2::new(x, y), size)
}

/// An anchored child root with its own focus space.
///
/// While a popup is the topmost one, it captures keyboard navigation; the focus that was
/// active when it opened is recorded and restored once the popup goes away.
pub struct PopupFrame {
    core: NodeCore,
    child: Box<dyn Node>,

    /// Anchor rectangle, in viewport coordinates.
    pub anchor: Rectangle,

    /// The popup's own focus space.
    focus: Rc<RefCell<FocusState>>,

    /// Focus of the outer space at the moment the popup opened.
    previous_focus: Option<NodeId>,

    /// Set for popups opened as a child of another popup.
    parent_popup: Option<NodeId>,

    /// True while this popup is the topmost one and receives keyboard input.
    active: bool,

    opened: bool,

    /// Where the popup was last drawn; outside-press dismissal tests against this.
    placed: Rectangle,
}

impl PopupFrame {
    /// Create a popup anchored to the given rectangle. Placement per axis comes from the
    /// popup's layout alignment; the default puts it below and to the right of the anchor.
    pub fn new(child: impl Node, anchor: Rectangle) -> Self {
        Self::from_boxed(Box::new(child), anchor)
    }

    pub fn from_boxed(child: Box<dyn Node>, anchor: Rectangle) -> Self {
        Self {
            core: NodeCore::new(Layout::aligned(NodeAlign::End)),
            child,
            anchor,
            focus: Rc::new(RefCell::new(FocusState::new())),
            previous_focus: None,
            parent_popup: None,
            active: false,
            opened: false,
            placed: Rectangle::default(),
        }
    }

    /// The popup's own focus space.
    pub fn focus_space(&self) -> SharedIo<FocusState> {
        self.focus.clone()
    }

    pub fn parent_popup(&self) -> Option<NodeId> {
        self.parent_popup
    }

    /// Ask for the popup to go away. It stops drawing with the next frame.
    pub fn dismiss(&mut self) {
        tracing::debug!(popup = ?self.core.id(), "popup dismissed");
        self.core.remove();
    }

    fn io_handle(&self) -> SharedIo<dyn FocusIo> {
        self.focus.clone()
    }
}

impl Node for PopupFrame {
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
        let (overhead_x, overhead_y) = self.core.style.box_overhead();
        self.core.set_min_size(
            self.child.core().min_size() + Vector2::new(overhead_x, overhead_y),
        );
        Ok(())
    }

    fn draw_impl(&mut self, ctx: &mut TreeContext, outer: Rectangle, inner: Rectangle) {
        self.placed = outer;

        if !self.opened {
            self.opened = true;
            // Record and take over the outer focus; it comes back when we are dismissed.
            if let Some(outer_focus) = ctx.io.focus() {
                let mut outer_focus = outer_focus.borrow_mut();
                self.previous_focus = outer_focus.current_focus();
                outer_focus.clear_focus();
            }
        }

        if self.active {
            ctx.focus_captured = true;
            let frame = ctx
                .io
                .action()
                .map(|action| action.borrow().frame_actions())
                .unwrap_or_default();
            self.focus.borrow_mut().route_actions(&frame);
        }

        let previous = ctx.io.replace_focus(Some(self.io_handle()));
        self.child.draw(ctx, inner);
        ctx.io.replace_focus(previous);

        // An inactive popup still closes its focus space's frame, so the registration
        // order doesn't pile up while a child popup holds the keyboard.
        self.focus.borrow_mut().finish_frame(self.active);
        if self.active {
            // Modal behavior: something inside the popup always holds focus.
            let mut focus = self.focus.borrow_mut();
            if focus.current_focus().is_none() {
                focus.focus_next();
            }
        }
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

/// A node that layers popups above its primary child and publishes [`OverlayIo`].
///
/// Dismissal rules, applied at the end of every frame: a press outside a popup's area
/// removes it, the cancel action removes the topmost popup, and focus moving back into the
/// outer space removes all of them. Dismissing a popup also dismisses the popups chained to
/// it, and restores the focus recorded when the oldest dismissed popup opened.
pub struct OverlayChain {
    core: NodeCore,
    child: Box<dyn Node>,
    popups: Vec<PopupFrame>,
    state: Rc<RefCell<OverlayState>>,
}

impl OverlayChain {
    pub fn new(child: impl Node) -> Self {
        Self::from_boxed(Box::new(child))
    }

    pub fn from_boxed(child: Box<dyn Node>) -> Self {
        Self {
            core: NodeCore::new(Layout::fill(0)),
            child,
            popups: Vec::new(),
            state: Rc::new(RefCell::new(OverlayState::default())),
        }
    }

    /// Shared handle for adding popups from outside the tree.
    pub fn state(&self) -> SharedIo<OverlayState> {
        self.state.clone()
    }

    pub fn popups(&self) -> &[PopupFrame] {
        &self.popups
    }

    fn io_handle(&self) -> SharedIo<dyn OverlayIo> {
        self.state.clone()
    }

    fn drain_incoming(&mut self) {
        let incoming = std::mem::take(&mut self.state.borrow_mut().incoming);
        if !incoming.is_empty() {
            self.core.update_size();
            self.popups.extend(incoming);
        }
    }

    /// True if the position falls inside the popup at `index` or any popup chained to it.
    fn press_within(&self, index: usize, position: Vector2) -> bool {
        let id = self.popups[index].core.id();
        if self.popups[index].placed.contains(position) {
            return true;
        }
        self.popups
            .iter()
            .enumerate()
            .any(|(child_index, popup)| {
                popup.parent_popup == Some(id) && self.press_within(child_index, position)
            })
    }

    fn apply_dismissals(&mut self, ctx: &mut TreeContext) {
        if self.popups.is_empty() {
            return;
        }

        // A press outside a popup's bounding area removes it.
        if let Some(hover) = ctx.io.hover() {
            let presses: SmallVec<[Vector2; 2]> = hover.borrow().fresh_presses();
            for position in presses {
                for index in 0..self.popups.len() {
                    if !self.press_within(index, position) {
                        self.popups[index].dismiss();
                    }
                }
            }
        }

        // The cancel action removes the topmost popup.
        let cancelled = ctx
            .io
            .action()
            .map(|action| {
                action
                    .borrow()
                    .frame_actions()
                    .active
                    .iter()
                    .any(|binding| binding.action == input::actions::cancel())
            })
            .unwrap_or(false);
        if cancelled {
            if let Some(top) = self.popups.last_mut() {
                top.dismiss();
            }
        }

        // Focus moving back into the outer space removes the stack.
        if let Some(outer_focus) = ctx.io.focus() {
            if outer_focus.borrow().current_focus().is_some() {
                for popup in &mut self.popups {
                    popup.dismiss();
                }
            }
        }

        // Dismissing a parent takes its chained popups along.
        loop {
            let orphaned: Vec<NodeId> = self
                .popups
                .iter()
                .filter(|popup| popup.core.to_remove())
                .map(|popup| popup.core.id())
                .collect();
            let mut changed = false;
            for popup in &mut self.popups {
                if let Some(parent) = popup.parent_popup {
                    if !popup.core.to_remove() && orphaned.contains(&parent) {
                        popup.dismiss();
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        // Drop dismissed popups, restoring focus where they recorded it.
        let mut restore: Option<NodeId> = None;
        for popup in &self.popups {
            if popup.core.to_remove() {
                if restore.is_none() {
                    restore = popup.previous_focus;
                }
            }
        }
        let removed = self.popups.iter().any(|popup| popup.core.to_remove());
        self.popups.retain(|popup| !popup.core.to_remove());
        if removed {
            self.core.update_size();
            if let Some(signals) = ctx.io.debug_signal() {
                signals.borrow_mut().emit_signal("popup.dismissed");
            }
            if let Some(outer_focus) = ctx.io.focus() {
                let mut outer_focus = outer_focus.borrow_mut();
                if outer_focus.current_focus().is_none() {
                    if let Some(id) = restore {
                        outer_focus.focus(id);
                    }
                }
            }
        }
    }
}

impl Node for OverlayChain {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn resize_impl(&mut self, ctx: &mut TreeContext, space: Vector2) -> Result<(), ResizeError> {
        self.drain_incoming();
        let previous = ctx.io.replace_overlay(Some(self.io_handle()));
        let result = self.child.resize(ctx, space);
        let popups = {
            let mut result = Ok(());
            for popup in &mut self.popups {
                let popup: &mut dyn Node = popup;
                if let Err(error) = popup.resize(ctx, space) {
                    result = Err(error);
                    break;
                }
            }
            result
        };
        ctx.io.replace_overlay(previous);
        result?;
        popups?;
        self.core.set_min_size(self.child.core().min_size());
        Ok(())
    }

    fn draw_impl(&mut self, ctx: &mut TreeContext, _outer: Rectangle, inner: Rectangle) {
        self.drain_incoming();

        let previous = ctx.io.replace_overlay(Some(self.io_handle()));
        self.child.draw(ctx, inner);

        // Only the topmost popup takes keyboard input.
        let top = self.popups.len().saturating_sub(1);
        for (index, popup) in self.popups.iter_mut().enumerate() {
            popup.active = index == top;
        }
        for popup in &mut self.popups {
            let placed = place_popup(
                popup.anchor,
                inner,
                popup.core.layout.align,
                popup.core.min_size(),
            );
            let popup: &mut dyn Node = popup;
            popup.draw(ctx, placed);
        }

        self.apply_dismissals(ctx);
        ctx.io.replace_overlay(previous);
    }

    fn in_bounds(&self, _outer: Rectangle, _inner: Rectangle, _position: Vector2) -> HitFilter {
        HitFilter::MISS
    }

    fn for_each_child(&mut self, callback: &mut dyn FnMut(&mut dyn Node)) {
        callback(self.child.as_mut());
        for popup in &mut self.popups {
            callback(popup);
        }
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

    #[test]
    fn fill_placement_prefers_the_roomier_side() {
        let viewport = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let anchor = Rectangle::new(10.0, 10.0, 10.0, 10.0);
        let align = [NodeAlign::Fill, NodeAlign::Fill];
        let placed = place_popup(anchor, viewport, align, Vector2::new(20.0, 20.0));
        // More room after the anchor on both axes.
        assert_eq!(placed.position(), Vector2::new(20.0, 20.0));
    }

    #[test]
    fn fill_placement_breaks_ties_toward_the_end() {
        let viewport = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let anchor = Rectangle::new(45.0, 45.0, 10.0, 10.0);
        let placed = place_popup(
            anchor,
            viewport,
            [NodeAlign::Fill, NodeAlign::Fill],
            Vector2::new(10.0, 10.0),
        );
        assert_eq!(placed.position(), Vector2::new(55.0, 55.0));
    }

    #[test]
    fn fill_placement_slides_into_the_viewport() {
        let viewport = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let anchor = Rectangle::new(0.0, 90.0, 10.0, 10.0);
        let placed = place_popup(
            anchor,
            viewport,
            [NodeAlign::Fill, NodeAlign::Fill],
            Vector2::new(30.0, 30.0),
        );
        // Below the anchor there is no room at all; the popup goes above and is slid to
        // stay inside.
        assert!(placed.end().y <= 100.0);
        assert!(placed.y >= 0.0);
        assert!(placed.end().x <= 100.0);
    }

    #[test]
    fn centered_placement() {
        let viewport = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let anchor = Rectangle::new(40.0, 40.0, 20.0, 20.0);
        let placed = place_popup(
            anchor,
            viewport,
            [NodeAlign::Center, NodeAlign::Start],
            Vector2::new(10.0, 10.0),
        );
        assert_eq!(placed.x, 45.0);
        // `start` places the popup outside the anchor, toward the start.
        assert_eq!(placed.y, 30.0);
    }
}

//! The layout tree driver and tree actions.
//!
//! [`LayoutTree`] owns the root node and the tree context, and coordinates each frame:
//! dirty-branch scan, resize pass, draw pass, and the end-of-frame hooks. A [`TreeAction`] is
//! a transient observer attached to the traversal; it sees the tree exactly as it is
//! processed, hook by hook, and stops itself once done.

use std::cell::RefCell;
use std::rc::Rc;

use crate::canvas::CanvasIo;
use crate::context::{ResizeError, TreeContext};
use crate::event::InputEvent;
use crate::geometry::{Rectangle, Vector2};
use crate::node::{Node, NodeId, mark_subtree_dirty, scan_dirty};

/// Book-keeping embedded in every tree action, exposed through
/// [`TreeAction::control`].
///
/// Tracks the action's lifecycle: whether it wants to stop, the subtree it is scoped to, and
/// the generation counter used to replace a still-running instance when the action is
/// started again.
#[derive(Default)]
pub struct ActionControl {
    /// If true, this action is complete and no further callbacks should run. Hooks of the
    /// event that prompted stopping still fire; the action leaves the queue before the next
    /// event.
    to_stop: bool,

    /// Keeps track of the number of times the action has been started or stopped. Every
    /// start bumps the generation number.
    ///
    /// The action runner compares this against the number it stored when the action was
    /// scheduled; a greater value means the action was restarted and the old run should be
    /// discarded, preventing the action from running twice at a time.
    generation: u64,

    /// Node to descend into; `before_draw` and `after_draw` hooks are only emitted for this
    /// node and its children. `None` observes the entire tree.
    start_node: Option<NodeId>,

    /// For branch actions: the node whose draw scope bounds the action's life.
    branch_publisher: Option<NodeId>,

    /// Set to true while traversal is inside `start_node`.
    in_start_node: bool,

    /// Set once `before_tree` fires, cleared after `after_tree`.
    in_tree: bool,

    /// Subscribers notified when the action stops.
    finished: Vec<Box<dyn FnOnce()>>,
}

impl ActionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the action to stop. Remaining hooks of the current event still fire; the
    /// action is removed from the queue before the next one. Completion subscribers run
    /// immediately.
    pub fn stop(&mut self) {
        if self.to_stop {
            return;
        }
        self.to_stop = true;
        self.generation += 1;
        for subscriber in self.finished.drain(..) {
            subscriber();
        }
    }

    /// Subscribe to the action's completion.
    pub fn then(&mut self, subscriber: impl FnOnce() + 'static) {
        self.finished.push(Box::new(subscriber));
    }

    /// True if the action has stopped or was asked to.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.to_stop
    }

    /// The node this action is scoped to, if any.
    #[inline]
    pub fn start_node(&self) -> Option<NodeId> {
        self.start_node
    }
}

/// An observer over the node tree's traversal.
///
/// Implementations embed an [`ActionControl`] and return it from
/// [`control`](Self::control); every other hook is optional. By default `after_tree` stops
/// the action, making actions single-frame; override it to keep observing.
#[allow(unused_variables)]
pub trait TreeAction: 'static {
    /// The action's lifecycle state.
    fn control(&mut self) -> &mut ActionControl;

    /// Called when the action is started or restarted.
    fn started(&mut self) {}

    /// Called when the action is removed from the queue.
    fn stopped(&mut self) {}

    /// Called once per frame before the tree is resized or drawn.
    fn before_tree(&mut self, root: &mut dyn Node, viewport: Rectangle) {}

    /// Called before a node's resize, with the space the parent suggested.
    fn before_resize(&mut self, node: &mut dyn Node, space: Vector2) {}

    /// Called before a node is painted.
    fn before_draw(
        &mut self,
        node: &mut dyn Node,
        outer: Rectangle,
        padding_box: Rectangle,
        content: Rectangle,
    ) {
    }

    /// Called after a node and its children were painted.
    fn after_draw(
        &mut self,
        node: &mut dyn Node,
        outer: Rectangle,
        padding_box: Rectangle,
        content: Rectangle,
    ) {
    }

    /// Called once per frame after the whole tree was drawn. The default implementation
    /// stops the action.
    fn after_tree(&mut self) {
        self.control().stop();
    }

    /// Called at the very end of the frame, reporting whether any node consumed an active
    /// keyboard action.
    fn after_input(&mut self, keyboard_handled: bool) {}
}

struct RunningAction {
    action: Rc<RefCell<dyn TreeAction>>,
    /// Generation at schedule time; a mismatch means the action was restarted and this run
    /// is stale.
    generation: u64,
}

/// Keeps track of currently active tree actions and dispatches their hooks.
pub struct TreeActionContext {
    running: Vec<RunningAction>,
}

impl TreeActionContext {
    pub(crate) fn new() -> Self {
        Self { running: Vec::new() }
    }

    /// Schedule an action, optionally scoped to a subtree. Restarting an action that is
    /// still running replaces the previous run.
    pub(crate) fn start(
        &mut self,
        action: Rc<RefCell<dyn TreeAction>>,
        start_node: Option<NodeId>,
    ) {
        let generation = {
            let mut handle = action.borrow_mut();
            let control = handle.control();
            control.generation += 1;
            control.to_stop = false;
            control.start_node = start_node;
            control.branch_publisher = None;
            control.in_start_node = start_node.is_none();
            control.in_tree = false;
            control.generation
        };
        action.borrow_mut().started();
        tracing::trace!(?start_node, "tree action started");
        self.running.push(RunningAction { action, generation });
    }

    /// Schedule a branch action: scoped to the publishing node, stopped automatically when
    /// that node's draw returns.
    pub(crate) fn start_branch(
        &mut self,
        action: Rc<RefCell<dyn TreeAction>>,
        publisher: NodeId,
    ) {
        let generation = {
            let mut handle = action.borrow_mut();
            let control = handle.control();
            control.generation += 1;
            control.to_stop = false;
            control.start_node = Some(publisher);
            control.branch_publisher = Some(publisher);
            // Started from within the publisher's draw, so we are already inside the scope.
            control.in_start_node = true;
            control.in_tree = true;
            control.generation
        };
        action.borrow_mut().started();
        self.running.push(RunningAction { action, generation });
    }

    /// Drop stale and stopped runs. Stopped actions receive their `stopped` hook here.
    fn prune(&mut self) {
        self.running.retain(|entry| {
            let mut handle = entry.action.borrow_mut();
            if handle.control().generation != entry.generation {
                // Restarted elsewhere; this run is stale and a newer entry owns the action.
                return false;
            }
            if handle.control().is_stopped() {
                handle.stopped();
                return false;
            }
            true
        });
    }

    /// For each running action: note that traversal entered the node, activating subtree
    /// scopes.
    pub(crate) fn enter_node(&mut self, id: NodeId) {
        for entry in &self.running {
            let mut handle = entry.action.borrow_mut();
            let control = handle.control();
            if control.generation == entry.generation && control.start_node == Some(id) {
                control.in_start_node = true;
            }
        }
    }

    /// Counterpart of [`Self::enter_node`]: deactivates subtree scopes and stops branch
    /// actions bound to the node.
    pub(crate) fn leave_node(&mut self, id: NodeId) {
        for entry in &self.running {
            let mut handle = entry.action.borrow_mut();
            let control = handle.control();
            if control.generation != entry.generation {
                continue;
            }
            if control.start_node == Some(id) {
                control.in_start_node = false;
            }
            if control.branch_publisher == Some(id) {
                control.stop();
            }
        }
    }

    pub(crate) fn fire_before_tree(&mut self, root: &mut dyn Node, viewport: Rectangle) {
        self.prune();
        for entry in &self.running {
            let mut handle = entry.action.borrow_mut();
            if handle.control().generation != entry.generation {
                continue;
            }
            handle.control().in_tree = true;
            handle.before_tree(root, viewport);
        }
    }

    pub(crate) fn fire_before_resize(&mut self, node: &mut dyn Node, space: Vector2) {
        self.prune();
        for entry in &self.running {
            let mut handle = entry.action.borrow_mut();
            let control = handle.control();
            if control.generation != entry.generation || !control.in_start_node {
                continue;
            }
            handle.before_resize(node, space);
        }
    }

    pub(crate) fn fire_before_draw(
        &mut self,
        node: &mut dyn Node,
        outer: Rectangle,
        padding_box: Rectangle,
        content: Rectangle,
    ) {
        self.prune();
        for entry in &self.running {
            let mut handle = entry.action.borrow_mut();
            let control = handle.control();
            if control.generation != entry.generation || !control.in_start_node {
                continue;
            }
            handle.before_draw(node, outer, padding_box, content);
        }
    }

    pub(crate) fn fire_after_draw(
        &mut self,
        node: &mut dyn Node,
        outer: Rectangle,
        padding_box: Rectangle,
        content: Rectangle,
    ) {
        self.prune();
        for entry in &self.running {
            let mut handle = entry.action.borrow_mut();
            let control = handle.control();
            if control.generation != entry.generation || !control.in_start_node {
                continue;
            }
            handle.after_draw(node, outer, padding_box, content);
        }
    }

    pub(crate) fn fire_after_tree(&mut self) {
        self.prune();
        for entry in &self.running {
            let mut handle = entry.action.borrow_mut();
            if handle.control().generation != entry.generation || !handle.control().in_tree {
                continue;
            }
            handle.control().in_tree = false;
            handle.after_tree();
        }
    }

    pub(crate) fn fire_after_input(&mut self, keyboard_handled: bool) {
        self.prune();
        for entry in &self.running {
            let mut handle = entry.action.borrow_mut();
            if handle.control().generation != entry.generation {
                continue;
            }
            handle.after_input(keyboard_handled);
        }
    }

    pub(crate) fn end_frame(&mut self) {
        self.prune();
    }

    /// Number of actions currently scheduled.
    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }
}

/// Global data for the layout tree: the root node, the shared context, and the viewport.
///
/// The host drives the tree by feeding events with [`queue_event`](Self::queue_event) and
/// calling [`draw`](Self::draw) once per frame.
pub struct LayoutTree {
    root: Box<dyn Node>,
    context: TreeContext,
    viewport: Vector2,
    last_viewport: Option<Vector2>,
}

impl LayoutTree {
    pub fn new(root: impl Node) -> Self {
        Self::from_boxed(Box::new(root))
    }

    pub fn from_boxed(root: Box<dyn Node>) -> Self {
        Self {
            root,
            context: TreeContext::new(),
            viewport: Vector2::new(800.0, 600.0),
            last_viewport: None,
        }
    }

    /// Resize the tree's viewport; takes effect on the next draw.
    pub fn set_viewport(&mut self, size: Vector2) {
        self.viewport = size;
    }

    #[inline]
    pub fn viewport(&self) -> Vector2 {
        self.viewport
    }

    #[inline]
    pub fn root(&self) -> &dyn Node {
        self.root.as_ref()
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut dyn Node {
        self.root.as_mut()
    }

    #[inline]
    pub fn context(&self) -> &TreeContext {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut TreeContext {
        &mut self.context
    }

    /// Queue a device event for the next draw's input evaluation.
    pub fn queue_event(&mut self, event: InputEvent) {
        self.context.queue_event(event);
    }

    /// Schedule a tree action observing the whole tree, starting with the next draw.
    pub fn queue_action(&mut self, action: Rc<RefCell<dyn TreeAction>>) {
        self.context.actions.start(action, None);
    }

    /// Process one frame: scan for dirty branches, resize them, draw the tree, and run the
    /// end-of-frame hooks.
    pub fn draw(&mut self) -> Result<(), ResizeError> {
        let viewport = Rectangle::from_vectors(Vector2::ZERO, self.viewport);
        self.context.begin_frame(viewport);
        self.context.actions.fire_before_tree(self.root.as_mut(), viewport);

        if self.last_viewport != Some(self.viewport) {
            // Every node's layout depends on the available space, so a viewport change
            // dirties the whole tree, not just the root.
            mark_subtree_dirty(self.root.as_mut());
            self.last_viewport = Some(self.viewport);
        }
        if scan_dirty(self.root.as_mut()) {
            self.root.resize(&mut self.context, self.viewport)?;
        }

        self.root.draw(&mut self.context, viewport);

        self.context.actions.fire_after_tree();
        let keyboard_handled = self.context.keyboard_handled;
        self.context.actions.fire_after_input(keyboard_handled);
        self.context.actions.end_frame();

        // Advance the image retention window.
        if let Some(canvas) = self.context.io.canvas() {
            canvas.borrow_mut().next_frame();
        }
        Ok(())
    }
}

//! Per-tree state carried through traversal, including the capability table.
//!
//! Nodes never hold references to the services they use. Instead, ancestors *publish*
//! capabilities into the [`TreeContext`] while their branch is resized or drawn, and
//! descendants look them up by kind. The innermost active service wins, so wrapping a subtree
//! in a different service instance shadows the outer one without recompiling anything.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::event::InputEvent;
use crate::geometry::{Color, Rectangle};
use crate::node::NodeId;
use crate::style::Breadcrumbs;
use crate::tree::{TreeAction, TreeActionContext};

/// A fatal traversal error. Resize errors propagate to the host; there is no in-tree
/// recovery, because a node without its collaborators cannot lay itself out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResizeError {
    /// A node `require`d a capability no ancestor provides. The host must install the
    /// missing service, or the node must be moved under a provider.
    #[error("required capability {0} is not available in this branch")]
    CapabilityMissing(&'static str),
}

/// Shorthand for the shared, single-threaded handles services are published through.
pub type SharedIo<T> = Rc<RefCell<T>>;

macro_rules! io_slots {
    ($(
        $(#[$attr:meta])*
        $slot:ident / $replace:ident / $require:ident: $ty:ty = $name:literal;
    )+) => {
        /// Active context for I/O operations; keeps track of the innermost active system for
        /// each service kind.
        ///
        /// Services are changed by a replace operation: `replace` takes the new system and
        /// returns the one set previously. Publishing nodes use this to manage services as a
        /// stack along the call stack:
        ///
        /// ```text
        /// let previous = ctx.io.replace_canvas(Some(mine));
        /// // ... resize or draw the children ...
        /// ctx.io.replace_canvas(previous);
        /// ```
        #[derive(Default)]
        pub struct TreeIoContext {
            $($slot: Option<SharedIo<$ty>>,)+
        }

        impl TreeIoContext {
            $(
                $(#[$attr])*
                #[inline]
                pub fn $slot(&self) -> Option<SharedIo<$ty>> {
                    self.$slot.clone()
                }

                /// Install a new active system of this kind, returning the previous one.
                /// Publishers must restore the previous value once their branch is done.
                pub fn $replace(
                    &mut self,
                    io: Option<SharedIo<$ty>>,
                ) -> Option<SharedIo<$ty>> {
                    std::mem::replace(&mut self.$slot, io)
                }

                /// Like the plain accessor, but failing the resize when absent.
                pub fn $require(&self) -> Result<SharedIo<$ty>, ResizeError> {
                    self.$slot
                        .clone()
                        .ok_or(ResizeError::CapabilityMissing($name))
                }
            )+
        }
    };
}

io_slots! {
    /// Canvas the branch draws to.
    canvas / replace_canvas / require_canvas: dyn crate::canvas::CanvasIo = "CanvasIo";
    /// Hover (pointer) input handler of the branch.
    hover / replace_hover / require_hover: dyn crate::hover::HoverIo = "HoverIo";
    /// Keyboard focus handler of the branch.
    focus / replace_focus / require_focus: dyn crate::focus::FocusIo = "FocusIo";
    /// Input-map system translating device events into input actions.
    action / replace_action / require_action: dyn crate::action::ActionIo = "ActionIo";
    /// Overlay system popups of the branch attach to.
    overlay / replace_overlay / require_overlay: dyn crate::overlay::OverlayIo = "OverlayIo";
    /// Mouse device of the branch.
    mouse / replace_mouse / require_mouse: dyn crate::io::MouseIo = "MouseIo";
    /// Keyboard device of the branch.
    keyboard / replace_keyboard / require_keyboard: dyn crate::io::KeyboardIo = "KeyboardIo";
    /// Gamepad device of the branch.
    gamepad / replace_gamepad / require_gamepad: dyn crate::io::GamepadIo = "GamepadIo";
    /// Clipboard access.
    clipboard / replace_clipboard / require_clipboard: dyn crate::io::ClipboardIo = "ClipboardIo";
    /// Filesystem access.
    file / replace_file / require_file: dyn crate::io::FileIo = "FileIo";
    /// Time source.
    time / replace_time / require_time: dyn crate::io::TimeIo = "TimeIo";
    /// User preference source.
    preference / replace_preference / require_preference: dyn crate::io::PreferenceIo = "PreferenceIo";
    /// Debug signal sink.
    debug_signal / replace_debug_signal / require_debug_signal: dyn crate::io::DebugSignalIo = "DebugSignalIo";
}

/// Mutable state of a single tree, shared by all nodes as traversal passes through them.
pub struct TreeContext {
    /// Currently active I/O systems.
    pub io: TreeIoContext,

    /// Manages and runs tree actions.
    pub(crate) actions: TreeActionContext,

    /// Inbound device events, drained by the input-map system at the start of its draw.
    pub(crate) events: Vec<InputEvent>,

    /// Current breadcrumbs. Any node that introduces tags pushes onto this stack while its
    /// branch is processed, and pops once finished.
    pub(crate) breadcrumbs: Breadcrumbs,

    /// True if the current tree branch is marked as disabled and can't take input.
    pub(crate) is_branch_disabled: bool,

    /// True once any node consumed an active keyboard action this frame.
    pub(crate) keyboard_handled: bool,

    /// True while a nested focus space (a modal popup) captured navigation this frame; the
    /// outer space then leaves unhandled navigation actions alone.
    pub(crate) focus_captured: bool,

    /// ID of the node currently being drawn, when inside a draw.
    pub(crate) current_node: Option<NodeId>,

    /// Current node drawing depth.
    pub(crate) depth: u32,

    /// Current rectangle drawing is limited to.
    crop: Rectangle,

    /// Tint inherited by everything drawn right now.
    tint: Color,

    /// Number of completed `draw` calls on the tree.
    frame: u64,
}

impl TreeContext {
    pub(crate) fn new() -> Self {
        Self {
            io: TreeIoContext::default(),
            actions: TreeActionContext::new(),
            events: Vec::new(),
            breadcrumbs: Breadcrumbs::new(),
            is_branch_disabled: false,
            keyboard_handled: false,
            focus_captured: false,
            current_node: None,
            depth: 0,
            crop: Rectangle::default(),
            tint: Color::WHITE,
            frame: 0,
        }
    }

    /// Current node drawing depth; the root is drawn at depth 1.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Rectangle drawing and hit testing are currently limited to.
    #[inline]
    pub fn crop(&self) -> Rectangle {
        self.crop
    }

    /// Tint applied to everything drawn right now.
    #[inline]
    pub fn tint(&self) -> Color {
        self.tint
    }

    /// Number of completed draws since the tree was created.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Breadcrumbs of the current traversal position.
    #[inline]
    pub fn breadcrumbs(&self) -> &Breadcrumbs {
        &self.breadcrumbs
    }

    /// True if an ancestor of the current node is disabled.
    #[inline]
    pub fn is_branch_disabled(&self) -> bool {
        self.is_branch_disabled
    }

    /// Queue a device event for the next input-map evaluation.
    pub fn queue_event(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub(crate) fn take_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    /// Limit drawing and hit testing to the intersection of the current crop and `rect`,
    /// returning the previous crop for [`Self::restore_crop`].
    pub fn push_crop(&mut self, rect: Rectangle) -> Rectangle {
        let new_crop = self.crop.intersect(rect);
        std::mem::replace(&mut self.crop, new_crop)
    }

    pub fn restore_crop(&mut self, previous: Rectangle) {
        self.crop = previous;
    }

    /// Multiply the current tint, returning the previous value for [`Self::restore_tint`].
    pub fn push_tint(&mut self, color: Color) -> Color {
        let new_tint = self.tint.multiply(color);
        std::mem::replace(&mut self.tint, new_tint)
    }

    pub fn restore_tint(&mut self, previous: Color) {
        self.tint = previous;
    }

    /// Start an action scoped to the node currently being drawn; it stops automatically when
    /// that node's draw returns. Only valid while a draw is in progress.
    pub fn start_branch_action(&mut self, action: Rc<RefCell<dyn TreeAction>>) {
        let publisher = self
            .current_node
            .expect("branch actions can only be started during a draw");
        self.actions.start_branch(action, publisher);
    }

    pub(crate) fn begin_frame(&mut self, viewport: Rectangle) {
        self.depth = 0;
        self.crop = viewport;
        self.tint = Color::WHITE;
        self.is_branch_disabled = false;
        self.keyboard_handled = false;
        self.focus_captured = false;
        self.current_node = None;
        self.frame += 1;
    }
}

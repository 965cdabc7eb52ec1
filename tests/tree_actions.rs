//! Tree actions: subtree scoping, lifecycle, and completion subscribers.

mod common;

use std::collections::HashSet;

use common::{RecordingAction, SizedBox, TestButton};
use trellis_ui::event::KeyboardKey;
use trellis_ui::focus::FocusIo;
use trellis_ui::headless::TestTree;
use trellis_ui::node::{Node, NodeId};
use trellis_ui::pipe::Pipe;
use trellis_ui::space::{hspace, vspace};
use trellis_ui::tree::{LayoutTree, TreeAction};

#[test]
fn start_node_scopes_hooks_to_the_subtree() {
    let inner = SizedBox::new(10.0, 10.0);
    let inner_id = inner.id();
    let mut first = hspace(vec![Box::new(inner)]);
    let first_id = first.core().id();
    let second = hspace(vec![]);
    let second_id = second.core().id();

    let (action, recorder) = RecordingAction::new(false);
    first.core_mut().queue_action(action);

    let root = vspace(vec![Box::new(first), Box::new(second)]);
    let root_id = root.core().id();
    let mut tree = LayoutTree::new(root);
    tree.draw().unwrap();

    // Hooks covered the start node and its descendant, nothing else: two invocations.
    assert_eq!(*recorder.before_draws.borrow(), vec![first_id, inner_id]);
    let after: HashSet<NodeId> = recorder.after_draws.borrow().iter().copied().collect();
    assert_eq!(after, HashSet::from([first_id, inner_id]));
    assert!(!recorder.before_draws.borrow().contains(&root_id));
    assert!(!recorder.before_draws.borrow().contains(&second_id));
}

#[test]
fn actions_are_single_frame_by_default() {
    let (action, recorder) = RecordingAction::new(false);
    let mut tree = LayoutTree::new(vspace(vec![]));
    tree.queue_action(action);

    tree.draw().unwrap();
    assert_eq!(recorder.before_trees.get(), 1);
    assert_eq!(recorder.stops.get(), 1);

    tree.draw().unwrap();
    assert_eq!(recorder.before_trees.get(), 1);
}

#[test]
fn requeueing_replaces_the_running_instance() {
    let (action, recorder) = RecordingAction::new(true);
    let mut tree = LayoutTree::new(vspace(vec![]));

    tree.queue_action(action.clone());
    tree.queue_action(action.clone());
    tree.draw().unwrap();

    // Only the most recent start runs; the stale instance was discarded, not doubled.
    assert_eq!(recorder.before_trees.get(), 1);
}

#[test]
fn persistent_actions_run_until_stopped() {
    let (action, recorder) = RecordingAction::new(true);
    let mut tree = LayoutTree::new(vspace(vec![]));
    tree.queue_action(action.clone());

    tree.draw().unwrap();
    tree.draw().unwrap();
    tree.draw().unwrap();
    assert_eq!(recorder.before_trees.get(), 3);
    assert_eq!(recorder.stops.get(), 0);

    action.borrow_mut().control().stop();
    tree.draw().unwrap();
    assert_eq!(recorder.before_trees.get(), 3);
    assert_eq!(recorder.stops.get(), 1);
}

#[test]
fn completion_resolves_a_pipe() {
    let (action, _recorder) = RecordingAction::new(false);
    let pipe: Pipe<i32> = Pipe::pending();
    let resolver = pipe.clone();
    action.borrow_mut().control().then(move || resolver.resolve(7));

    let mut tree = LayoutTree::new(vspace(vec![]));
    tree.queue_action(action);

    let finished = pipe.run_while_drawing(&mut tree, 4).unwrap();
    assert!(finished);
    pipe.then_assert_equals(7);
}

#[test]
fn after_input_reports_keyboard_handling() {
    let button = TestButton::new(50.0, 50.0);
    let id = button.id();
    let mut tree = TestTree::new(button);
    tree.focus().borrow_mut().focus(id);

    let (action, recorder) = RecordingAction::new(true);
    tree.tree_mut().queue_action(action);

    // Nothing pressed: the frame ends with keyboard input unhandled.
    tree.draw().unwrap();
    assert_eq!(*recorder.after_inputs.borrow(), vec![false]);

    // Enter is bound to press, which the button consumes.
    tree.key_press(KeyboardKey::Enter);
    tree.draw().unwrap();
    assert_eq!(*recorder.after_inputs.borrow(), vec![false, true]);
}

//! Focus: tab order, positional navigation, and the text queue.

mod common;

use common::{TestButton, TextSink};
use trellis_ui::event::KeyboardKey;
use trellis_ui::focus::FocusIo;
use trellis_ui::headless::TestTree;
use trellis_ui::space::{hspace, vspace};

#[test]
fn tab_navigation_skips_disabled_and_wraps() {
    let a = TestButton::new(50.0, 20.0);
    let b = TestButton::new(50.0, 20.0).disabled();
    let c = TestButton::new(50.0, 20.0);
    let (a_id, c_id) = (a.id(), c.id());

    let mut tree = TestTree::new(vspace(vec![Box::new(a), Box::new(b), Box::new(c)]));
    tree.draw().unwrap();

    let focus = tree.focus();
    focus.borrow_mut().focus(a_id);
    assert_eq!(focus.borrow_mut().focus_next(), Some(c_id));
    assert_eq!(focus.borrow_mut().focus_previous(), Some(a_id));
    // Wrapping: going backwards from the first focusable lands on the last.
    assert_eq!(focus.borrow_mut().focus_previous(), Some(c_id));
}

#[test]
fn focus_is_unique_per_space() {
    let a = TestButton::new(50.0, 20.0);
    let b = TestButton::new(50.0, 20.0);
    let (a_id, b_id) = (a.id(), b.id());
    let mut tree = TestTree::new(vspace(vec![Box::new(a), Box::new(b)]));
    tree.draw().unwrap();

    let focus = tree.focus();
    focus.borrow_mut().focus(a_id);
    focus.borrow_mut().focus(b_id);
    assert_eq!(focus.borrow().current_focus(), Some(b_id));
    assert!(!focus.borrow().is_focused(a_id));
}

#[test]
fn tab_key_drives_navigation() {
    let a = TestButton::new(50.0, 20.0);
    let b = TestButton::new(50.0, 20.0);
    let (a_id, b_id) = (a.id(), b.id());
    let mut tree = TestTree::new(vspace(vec![Box::new(a), Box::new(b)]));
    tree.draw().unwrap();

    // With nothing focused, Tab picks the first focusable.
    tree.key_press(KeyboardKey::Tab);
    tree.draw().unwrap();
    assert_eq!(tree.focus().borrow().current_focus(), Some(a_id));

    tree.key_release(KeyboardKey::Tab);
    tree.key_press(KeyboardKey::Tab);
    tree.draw().unwrap();
    assert_eq!(tree.focus().borrow().current_focus(), Some(b_id));
}

#[test]
fn arrow_keys_move_positionally() {
    let a = TestButton::new(50.0, 20.0);
    let b = TestButton::new(50.0, 20.0);
    let c = TestButton::new(50.0, 20.0);
    let d = TestButton::new(50.0, 20.0);
    let (a_id, b_id, d_id) = (a.id(), b.id(), d.id());

    let grid = vspace(vec![
        Box::new(hspace(vec![Box::new(a), Box::new(b)])),
        Box::new(hspace(vec![Box::new(c), Box::new(d)])),
    ]);
    let mut tree = TestTree::new(grid);
    tree.draw().unwrap();

    tree.focus().borrow_mut().focus(a_id);
    tree.draw().unwrap();

    tree.key_press(KeyboardKey::Right);
    tree.draw().unwrap();
    assert_eq!(tree.focus().borrow().current_focus(), Some(b_id));

    tree.key_release(KeyboardKey::Right);
    tree.key_press(KeyboardKey::Down);
    tree.draw().unwrap();
    assert_eq!(tree.focus().borrow().current_focus(), Some(d_id));
}

#[test]
fn typed_text_reaches_the_focused_node_once() {
    let sink = TextSink::new();
    let (id, collected) = (sink.id(), sink.collected.clone());
    let mut tree = TestTree::new(sink);
    tree.draw().unwrap();

    tree.focus().borrow_mut().focus(id);
    tree.type_text("hello world");
    tree.draw().unwrap();
    assert_eq!(*collected.borrow(), "hello world");

    // The queue resets at the end of the frame; nothing is read twice.
    tree.draw().unwrap();
    assert_eq!(*collected.borrow(), "hello world");
}

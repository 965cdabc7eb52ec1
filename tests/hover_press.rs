//! Pointer input: presses, arming, drag semantics and hit filters.

mod common;

use std::time::Duration;

use common::TestButton;
use trellis_ui::canvas::CanvasIo;
use trellis_ui::focus::FocusIo;
use trellis_ui::geometry::Color;
use trellis_ui::headless::TestTree;
use trellis_ui::hover::HoverIo;
use trellis_ui::io::ClipboardIo;
use trellis_ui::node::{HitFilter, Node};
use trellis_ui::space::{hframe, hspace};

#[test]
fn mouse_press_on_button() {
    let button = TestButton::new(100.0, 100.0);
    let (id, presses) = (button.id(), button.presses());
    let mut tree = TestTree::new(button).with_viewport(100.0, 100.0);

    tree.mouse_move(10.0, 10.0);
    tree.draw().unwrap();
    assert!(tree.hover().borrow().is_hovered(id));

    tree.mouse_press();
    tree.draw().unwrap();
    assert_eq!(presses.get(), 0);

    tree.mouse_release();
    tree.draw().unwrap();
    assert_eq!(presses.get(), 1);

    // Pressing transferred focus to the button.
    assert_eq!(tree.focus().borrow().current_focus(), Some(id));
}

#[test]
fn armed_target_is_stable_under_drag() {
    let left = TestButton::new(100.0, 100.0);
    let right = TestButton::new(100.0, 100.0);
    let (left_id, left_presses) = (left.id(), left.presses());
    let right_presses = right.presses();
    let row = hspace(vec![Box::new(left), Box::new(right)]);
    let mut tree = TestTree::new(row).with_viewport(200.0, 100.0);

    tree.mouse_move(10.0, 10.0);
    tree.draw().unwrap();
    tree.mouse_press();
    tree.draw().unwrap();

    // Drag away while the press is held: the armed target stays put and keeps reporting
    // as hovered.
    tree.mouse_move(150.0, 10.0);
    tree.draw().unwrap();
    assert!(tree.hover().borrow().is_hovered(left_id));

    // Releasing away from the armed target cancels the press entirely.
    tree.mouse_release();
    tree.draw().unwrap();
    tree.draw().unwrap();
    assert_eq!(left_presses.get(), 0);
    assert_eq!(right_presses.get(), 0);
}

#[test]
fn hit_branch_absorbs_the_subtree() {
    let button = TestButton::new(100.0, 100.0);
    let button_id = button.id();
    // An opaque container that hijacks its children's hover input.
    let mut row = hframe(Color::BLACK, vec![Box::new(button)]);
    row.core_mut().hit_filter = HitFilter::HIT_BRANCH;
    let row_id = row.core().id();

    let mut tree = TestTree::new(row).with_viewport(100.0, 100.0);
    tree.mouse_move(10.0, 10.0);
    tree.draw().unwrap();

    let hover = tree.hover();
    let hover = hover.borrow();
    assert!(hover.is_hovered(row_id));
    assert!(!hover.is_hovered(button_id));
}

#[test]
fn miss_branch_blanks_the_subtree() {
    let button = TestButton::new(100.0, 100.0);
    let button_id = button.id();
    let mut row = hspace(vec![Box::new(button)]);
    row.core_mut().hit_filter = HitFilter::MISS_BRANCH;
    let row_id = row.core().id();

    let mut tree = TestTree::new(row).with_viewport(100.0, 100.0);
    tree.mouse_move(10.0, 10.0);
    tree.draw().unwrap();

    let hover = tree.hover();
    let hover = hover.borrow();
    assert!(!hover.is_hovered(row_id));
    assert!(!hover.is_hovered(button_id));
}

#[test]
fn disabled_nodes_block_hover_but_ignore_presses() {
    let button = TestButton::new(100.0, 100.0).disabled();
    let (id, presses) = (button.id(), button.presses());
    let mut tree = TestTree::new(button).with_viewport(100.0, 100.0);

    tree.mouse_move(10.0, 10.0);
    tree.draw().unwrap();
    assert!(tree.hover().borrow().is_hovered(id));

    tree.mouse_press();
    tree.draw().unwrap();
    tree.mouse_release();
    tree.draw().unwrap();
    assert_eq!(presses.get(), 0);
    // Pressing a non-focusable target drops focus instead of moving it.
    assert_eq!(tree.focus().borrow().current_focus(), None);
}

#[test]
fn click_streaks_follow_the_double_click_interval() {
    let button = TestButton::new(100.0, 100.0);
    let mut tree = TestTree::new(button).with_viewport(100.0, 100.0);
    tree.mouse_move(10.0, 10.0);
    tree.draw().unwrap();

    let click = |tree: &mut TestTree| {
        tree.mouse_press();
        tree.draw().unwrap();
        tree.mouse_release();
        tree.draw().unwrap();
    };

    click(&mut tree);
    assert_eq!(tree.hover().borrow().click_streak(1), 1);

    // A quick second press continues the streak.
    tree.clock().borrow_mut().advance(Duration::from_millis(100));
    click(&mut tree);
    assert_eq!(tree.hover().borrow().click_streak(1), 2);

    // Waiting past the double-click interval starts over.
    tree.clock().borrow_mut().advance(Duration::from_secs(2));
    click(&mut tree);
    assert_eq!(tree.hover().borrow().click_streak(1), 1);
}

#[test]
fn clipboard_round_trips_through_the_tree() {
    let mut tree = TestTree::new(TestButton::new(10.0, 10.0));
    tree.draw().unwrap();
    tree.clipboard().borrow_mut().set_value("copied text");
    assert_eq!(tree.clipboard().borrow().value(), "copied text");
}

#[test]
fn canvas_scale_does_not_affect_hit_testing() {
    let button = TestButton::new(100.0, 100.0);
    let presses = button.presses();
    let mut tree = TestTree::new(button).with_viewport(100.0, 100.0);
    tree.canvas().borrow_mut().set_scale(2.0);

    tree.mouse_move(10.0, 10.0);
    tree.draw().unwrap();
    tree.mouse_press();
    tree.draw().unwrap();
    tree.mouse_release();
    tree.draw().unwrap();
    assert_eq!(presses.get(), 1);
}

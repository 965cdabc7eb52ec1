//! Scroll routing: reveal-on-demand, saturation walk-up, and held-scroll locking.

mod common;

use common::{FixedBox, SizedBox};
use trellis_ui::geometry::{Color, Vector2};
use trellis_ui::headless::TestTree;
use trellis_ui::node::{Node, NodeId, visit_nodes};
use trellis_ui::scroll::{ScrollFrame, scroll_into_view};
use trellis_ui::tree::LayoutTree;

fn scroll_of(root: &mut dyn Node, id: NodeId) -> f32 {
    let mut result = None;
    visit_nodes(root, &mut |node| {
        if node.core().id() == id {
            if let Some(frame) = node.as_any().downcast_ref::<ScrollFrame>() {
                result = Some(frame.scroll());
            }
        }
    });
    result.expect("scroll frame not found")
}

#[test]
fn scroll_into_view_reveals_the_target() {
    // Boxes and tall fillers, alternating; the target is the child at index 2.
    let mut children: Vec<Box<dyn Node>> = Vec::new();
    let mut target = None;
    for index in 0..6 {
        let tall = index % 2 == 1;
        let height = if tall { 1000.0 } else { 100.0 };
        let child = SizedBox::colored(100.0, height, Color::WHITE);
        if index == 2 {
            target = Some(child.id());
        }
        children.push(Box::new(child));
    }
    let target = target.expect("target box exists");

    let frame = ScrollFrame::vertical(children);
    let frame_id = frame.core().id();
    let mut tree = LayoutTree::new(frame);
    tree.set_viewport(Vector2::new(500.0, 500.0));
    tree.draw().unwrap();
    assert_eq!(scroll_of(tree.root_mut(), frame_id), 0.0);

    scroll_into_view(&mut tree, target);
    tree.draw().unwrap();

    // 100 + 1000 - 500 + 100: the target sits flush with the bottom of the viewport.
    assert_eq!(scroll_of(tree.root_mut(), frame_id), 700.0);
}

/// Two nested scroll frames: the inner one is 200 tall with 400 of content, the outer one
/// views 300 of 1200.
fn nested_scroll_tree() -> (TestTree, NodeId, NodeId) {
    let inner = ScrollFrame::vertical(vec![Box::new(SizedBox::new(100.0, 400.0))]);
    let inner_id = inner.core().id();
    let fixed = FixedBox::new(100.0, 200.0, inner);

    let outer = ScrollFrame::vertical(vec![
        Box::new(fixed),
        Box::new(SizedBox::new(100.0, 1000.0)),
    ]);
    let outer_id = outer.core().id();

    let tree = TestTree::new(outer).with_viewport(300.0, 300.0);
    (tree, inner_id, outer_id)
}

/// Feed one scroll event and run the two frames it takes to see the result: one to
/// evaluate the routing, one for the target to pick the motion up.
fn scroll_and_settle(tree: &mut TestTree, delta: Vector2, held: bool) {
    if held {
        tree.mouse_scroll_held(delta);
    } else {
        tree.mouse_scroll(delta);
    }
    tree.draw_frames(2).unwrap();
}

#[test]
fn scroll_goes_to_the_deepest_capable_scrollable() {
    let (mut tree, inner_id, outer_id) = nested_scroll_tree();
    tree.mouse_move(50.0, 50.0);
    tree.draw_frames(2).unwrap();

    scroll_and_settle(&mut tree, Vector2::new(0.0, 120.0), false);
    assert_eq!(scroll_of(tree.tree_mut().root_mut(), inner_id), 120.0);
    assert_eq!(scroll_of(tree.tree_mut().root_mut(), outer_id), 0.0);
}

#[test]
fn saturated_scrollables_pass_motion_to_ancestors() {
    let (mut tree, inner_id, outer_id) = nested_scroll_tree();
    tree.mouse_move(50.0, 50.0);
    tree.draw_frames(2).unwrap();

    // Two large scrolls saturate the inner frame (its limit is 200).
    scroll_and_settle(&mut tree, Vector2::new(0.0, 150.0), false);
    scroll_and_settle(&mut tree, Vector2::new(0.0, 150.0), false);
    assert_eq!(scroll_of(tree.tree_mut().root_mut(), inner_id), 200.0);
    assert_eq!(scroll_of(tree.tree_mut().root_mut(), outer_id), 0.0);

    // The next scroll cannot move the inner frame; it walks up to the outer one, and the
    // inner offset stays untouched.
    scroll_and_settle(&mut tree, Vector2::new(0.0, 50.0), false);
    assert_eq!(scroll_of(tree.tree_mut().root_mut(), inner_id), 200.0);
    assert_eq!(scroll_of(tree.tree_mut().root_mut(), outer_id), 50.0);
}

#[test]
fn held_scroll_locks_to_its_initial_scrollable() {
    let (mut tree, inner_id, outer_id) = nested_scroll_tree();
    tree.mouse_move(50.0, 50.0);
    tree.draw_frames(2).unwrap();

    tree.mouse_press();
    tree.draw().unwrap();

    scroll_and_settle(&mut tree, Vector2::new(0.0, 300.0), true);
    assert_eq!(scroll_of(tree.tree_mut().root_mut(), inner_id), 200.0);

    // Saturated, but held: the lock keeps the motion on the inner frame instead of
    // walking up.
    scroll_and_settle(&mut tree, Vector2::new(0.0, 100.0), true);
    assert_eq!(scroll_of(tree.tree_mut().root_mut(), inner_id), 200.0);
    assert_eq!(scroll_of(tree.tree_mut().root_mut(), outer_id), 0.0);

    tree.mouse_release();
    tree.draw().unwrap();
}

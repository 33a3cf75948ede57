//! Idempotent badge rendering
//!
//! The renderer never replaces an existing badge element - identity is
//! preserved so the watcher can recognize the overlay's own nodes - and
//! never touches nodes of other classes.

use crate::dom::{Dom, NodeId};

/// Return the existing child badge of `parent` with `class`, or create one
/// and insert it immediately before `before` (appending when `before` is
/// absent).
pub fn find_or_insert(dom: &mut Dom, parent: NodeId, class: &str, before: Option<NodeId>) -> NodeId {
    if let Some(existing) = dom.find_class(parent, class) {
        return existing;
    }
    let badge = dom.create_element("span", &[class]);
    dom.insert_before(parent, badge, before);
    badge
}

/// Remove the child of `parent` with `class`, if any.
pub fn remove_if_exists(dom: &mut Dom, parent: NodeId, class: &str) {
    if let Some(existing) = dom.find_class(parent, class) {
        dom.remove(existing);
    }
}

/// Write the badge's display text, touching the tree only when the text
/// actually differs.
pub fn set_badge_text(dom: &mut Dom, badge: NodeId, text: &str) {
    match dom.last_child(badge) {
        Some(node) if dom.text(node) == Some(text) => {}
        Some(node) if dom.text(node).is_some() => dom.set_text(node, text),
        _ => {
            let node = dom.create_text(text);
            dom.append_child(badge, node);
        }
    }
}

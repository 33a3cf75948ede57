//! Mutation classification and recompute scheduling
//!
//! The classifier is a pure function over one mutation record, so the
//! trigger rules are unit-testable apart from any timing. Scheduling is a
//! single shared leading-edge debouncer: the first trigger of a burst
//! fires immediately, every further trigger inside the quiet window is
//! absorbed, and the window re-anchors on each trigger.

use crate::dom::{Dom, MutationKind, MutationRecord, NodeId};
use crate::host;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::trace;

/// What a classified mutation asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Not our concern, or caused by our own badge writes
    Ignore,
    /// Structural change somewhere in the board; recompute everything
    RecomputeBoard,
    /// A card title changed; flag it so the extractor re-reads the live
    /// text, then recompute. Carries the title element.
    MarkCardMutated(NodeId),
}

/// Classify one mutation record, in priority order.
pub fn classify(dom: &Dom, record: &MutationRecord) -> Action {
    // Self-caused filter: a badge write adds or removes exactly one
    // overlay-classed node, and cached-state writes touch only the
    // overlay's attribute namespace. Filtering both here is what breaks
    // the observer feedback loop.
    match &record.kind {
        MutationKind::ChildList { added, removed } => {
            let sole_node = match (added.as_slice(), removed.as_slice()) {
                ([node], []) | ([], [node]) => Some(*node),
                _ => None,
            };
            if let Some(node) = sole_node {
                if host::is_overlay_class_list(dom.classes(node)) {
                    return Action::Ignore;
                }
            }
        }
        MutationKind::Attribute { name } => {
            if host::is_overlay_attribute(name) {
                return Action::Ignore;
            }
        }
        MutationKind::CharacterData => {}
    }

    let target = record.target;
    if dom.has_class(target, host::LIST_CARDS)
        || dom.has_class(target, host::LIST_HEADER_NUM_CARDS)
        || dom.has_class(target, host::LIST_SORTABLE)
    {
        return Action::RecomputeBoard;
    }

    if dom.has_class(target, host::CARD_NAME) {
        return Action::MarkCardMutated(target);
    }

    Action::Ignore
}

/// Debouncer with one shared identity across the system. Fires on the
/// leading edge; absorbed triggers stay pending and are serviced by
/// `poll` once the quiet window has elapsed, so a burst that goes quiet
/// is always eventually rendered.
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    anchor: Option<Instant>,
    pending: bool,
}

/// Quiet window between recompute passes.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(100);

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            anchor: None,
            pending: false,
        }
    }

    /// Register a trigger at `now`. Returns true when the caller should
    /// fire immediately; triggers landing inside the quiet window are
    /// absorbed, re-anchor it, and leave a pending pass for `poll`.
    pub fn trigger(&mut self, now: Instant) -> bool {
        let fire = match self.anchor {
            None => true,
            Some(anchor) => now.duration_since(anchor) >= self.quiet,
        };
        self.anchor = Some(now);
        if fire {
            self.pending = false;
        } else {
            self.pending = true;
            trace!("Trigger absorbed by quiet window");
        }
        fire
    }

    /// Service an absorbed trigger. Returns true exactly once per absorbed
    /// burst, as soon as a full quiet window has passed since the last
    /// trigger.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }
        match self.anchor {
            Some(anchor) if now.duration_since(anchor) >= self.quiet => {
                self.pending = false;
                self.anchor = Some(now);
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_WINDOW)
    }
}

/// Watcher bookkeeping for one page session: the shared debounce timer and
/// the set of lists currently under observation.
#[derive(Debug, Default)]
pub struct WatcherState {
    pub debouncer: Debouncer,
    observed_lists: HashSet<NodeId>,
}

impl WatcherState {
    pub fn new(quiet: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(quiet),
            observed_lists: HashSet::new(),
        }
    }

    /// (Re-)attach observation to every list currently on the board.
    /// Called on every recompute so newly appeared lists are covered.
    /// Returns how many lists are newly observed.
    pub fn observe_lists(&mut self, dom: &Dom) -> usize {
        let mut new_lists = 0;
        for list in dom.find_all_class(dom.root(), host::LIST) {
            if self.observed_lists.insert(list) {
                new_lists += 1;
            }
        }
        if new_lists > 0 {
            trace!(new_lists, "Observing new lists");
        }
        new_lists
    }

    pub fn observed_list_count(&self) -> usize {
        self.observed_lists.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with_list(dom: &mut Dom) -> (NodeId, NodeId, NodeId) {
        let list = dom.create_element("div", &[host::LIST]);
        dom.append_child(dom.root(), list);
        let cards = dom.create_element("div", &[host::LIST_CARDS]);
        dom.append_child(list, cards);
        let card = dom.create_element("div", &[host::LIST_CARD]);
        dom.append_child(cards, card);
        (list, cards, card)
    }

    #[test]
    fn test_own_badge_insert_is_ignored() {
        let mut dom = Dom::new();
        let (_, cards, card) = board_with_list(&mut dom);
        let name = dom.create_element("span", &[host::CARD_NAME]);
        dom.append_child(card, name);
        dom.take_mutations();

        // A badge write lands inside the card container subtree
        let badge = dom.create_element("span", &["scrumlay-points"]);
        dom.append_child(name, badge);
        let record = MutationRecord {
            target: cards,
            kind: MutationKind::ChildList {
                added: vec![badge],
                removed: vec![],
            },
        };
        assert_eq!(classify(&dom, &record), Action::Ignore);

        // Removal of our own badge is equally ignored
        let record = MutationRecord {
            target: cards,
            kind: MutationKind::ChildList {
                added: vec![],
                removed: vec![badge],
            },
        };
        assert_eq!(classify(&dom, &record), Action::Ignore);
    }

    #[test]
    fn test_own_attribute_write_is_ignored() {
        let mut dom = Dom::new();
        let name = dom.create_element("span", &[host::CARD_NAME]);
        dom.append_child(dom.root(), name);
        // The extractor clearing the mutated flag must not re-trigger
        let record = MutationRecord {
            target: name,
            kind: MutationKind::Attribute {
                name: host::ATTR_MUTATED.to_string(),
            },
        };
        assert_eq!(classify(&dom, &record), Action::Ignore);
    }

    #[test]
    fn test_card_container_change_recomputes() {
        let mut dom = Dom::new();
        let (_, cards, _) = board_with_list(&mut dom);
        let new_card = dom.create_element("div", &[host::LIST_CARD]);
        let record = MutationRecord {
            target: cards,
            kind: MutationKind::ChildList {
                added: vec![new_card],
                removed: vec![],
            },
        };
        assert_eq!(classify(&dom, &record), Action::RecomputeBoard);
    }

    #[test]
    fn test_card_count_attribute_change_recomputes() {
        let mut dom = Dom::new();
        let counter = dom.create_element("span", &[host::LIST_HEADER_NUM_CARDS]);
        dom.append_child(dom.root(), counter);
        let record = MutationRecord {
            target: counter,
            kind: MutationKind::Attribute {
                name: "data-count".to_string(),
            },
        };
        assert_eq!(classify(&dom, &record), Action::RecomputeBoard);
    }

    #[test]
    fn test_list_sortable_change_recomputes() {
        let mut dom = Dom::new();
        let sortable = dom.create_element("div", &[host::LIST_SORTABLE]);
        dom.append_child(dom.root(), sortable);
        let list = dom.create_element("div", &[host::LIST]);
        let record = MutationRecord {
            target: sortable,
            kind: MutationKind::ChildList {
                added: vec![list],
                removed: vec![],
            },
        };
        assert_eq!(classify(&dom, &record), Action::RecomputeBoard);
    }

    #[test]
    fn test_title_change_marks_card() {
        let mut dom = Dom::new();
        let name = dom.create_element("span", &[host::CARD_NAME]);
        dom.append_child(dom.root(), name);
        let record = MutationRecord {
            target: name,
            kind: MutationKind::CharacterData,
        };
        assert_eq!(classify(&dom, &record), Action::MarkCardMutated(name));
    }

    #[test]
    fn test_unrelated_mutation_is_ignored() {
        let mut dom = Dom::new();
        let div = dom.create_element("div", &["unrelated"]);
        dom.append_child(dom.root(), div);
        let record = MutationRecord {
            target: div,
            kind: MutationKind::Attribute {
                name: "class".to_string(),
            },
        };
        assert_eq!(classify(&dom, &record), Action::Ignore);
    }

    #[test]
    fn test_debouncer_leading_edge_collapses_burst() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();

        assert!(debouncer.trigger(start));
        // A burst inside the window is absorbed entirely
        assert!(!debouncer.trigger(start + Duration::from_millis(10)));
        assert!(!debouncer.trigger(start + Duration::from_millis(50)));
        assert!(!debouncer.trigger(start + Duration::from_millis(90)));
    }

    #[test]
    fn test_debouncer_window_reanchors_on_trigger() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();

        assert!(debouncer.trigger(start));
        assert!(!debouncer.trigger(start + Duration::from_millis(90)));
        // 150ms after start but only 60ms after the last trigger
        assert!(!debouncer.trigger(start + Duration::from_millis(150)));
        // A full quiet window after the last trigger fires again
        assert!(debouncer.trigger(start + Duration::from_millis(260)));
    }

    #[test]
    fn test_debouncer_poll_services_absorbed_trigger() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();

        assert!(debouncer.trigger(start));
        assert!(!debouncer.trigger(start + Duration::from_millis(20)));

        // Still inside the window of the absorbed trigger
        assert!(!debouncer.poll(start + Duration::from_millis(60)));
        // A full quiet window after the last trigger, the pending pass runs
        assert!(debouncer.poll(start + Duration::from_millis(130)));
        // Exactly once
        assert!(!debouncer.poll(start + Duration::from_millis(140)));
    }

    #[test]
    fn test_debouncer_poll_quiet_without_pending() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();

        assert!(!debouncer.poll(start));
        // A fired trigger leaves nothing pending
        assert!(debouncer.trigger(start));
        assert!(!debouncer.poll(start + Duration::from_millis(500)));
    }

    #[test]
    fn test_observe_lists_counts_new_only() {
        let mut dom = Dom::new();
        board_with_list(&mut dom);
        let mut state = WatcherState::default();

        assert_eq!(state.observe_lists(&dom), 1);
        assert_eq!(state.observe_lists(&dom), 0);

        board_with_list(&mut dom);
        assert_eq!(state.observe_lists(&dom), 1);
        assert_eq!(state.observed_list_count(), 2);
    }
}

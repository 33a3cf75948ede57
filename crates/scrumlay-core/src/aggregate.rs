//! Bottom-up aggregation of card values into list and board totals
//!
//! Sums are accumulated in document order from each kind's zero default.
//! Addition makes the order numerically irrelevant, but keeping it
//! deterministic keeps test runs reproducible.

use crate::badge;
use crate::dom::{Dom, NodeId};
use crate::extract;
use crate::grammar::{format_value, ExtractedValue, ValueIndex};
use crate::host;
use crate::kinds::KindCatalog;
use crate::settings::Settings;
use tracing::debug;

/// Sum the given children with `extract_fn` and, when totals are enabled
/// and the container has a header slot, render one badge per activated
/// kind into it.
pub fn aggregate_into(
    dom: &mut Dom,
    container: NodeId,
    children: &[NodeId],
    mut extract_fn: impl FnMut(&mut Dom, NodeId) -> ValueIndex,
    header_slot_class: &str,
    totals_enabled: bool,
    catalog: &KindCatalog,
) -> ValueIndex {
    let mut totals = ValueIndex::zeroed(catalog);
    for &child in children {
        let values = extract_fn(dom, child);
        totals.accumulate(&values);
    }

    let header_slot = dom.find_class(container, header_slot_class);
    if totals_enabled {
        if let Some(slot) = header_slot {
            let anchor = dom.find_class(slot, host::LIST_NAME_INPUT);
            for spec in catalog.specs() {
                if !spec.activated {
                    continue;
                }
                let badge_el = badge::find_or_insert(dom, slot, spec.badge_class, anchor);
                let text = format_value(ExtractedValue::Number(totals.get(spec.kind)));
                badge::set_badge_text(dom, badge_el, &text);
            }
        }
    }

    totals
}

/// Aggregate one list: every non-hidden card, totals into the list header.
pub fn aggregate_list(
    dom: &mut Dom,
    list: NodeId,
    catalog: &KindCatalog,
    settings: &Settings,
) -> ValueIndex {
    let cards: Vec<NodeId> = dom
        .find_all_class(list, host::LIST_CARD)
        .into_iter()
        .filter(|&c| !dom.has_class(c, host::HIDE))
        .collect();

    aggregate_into(
        dom,
        list,
        &cards,
        |dom, card| extract::extract_card(dom, card, catalog, settings),
        host::LIST_HEADER,
        settings.show_column_totals,
        catalog,
    )
}

/// Aggregate the whole board: every list, totals into the board header.
pub fn recompute_board(dom: &mut Dom, catalog: &KindCatalog, settings: &Settings) -> ValueIndex {
    let root = dom.root();
    let lists = dom.find_all_class(root, host::LIST);
    debug!(lists = lists.len(), "Recomputing board");

    aggregate_into(
        dom,
        root,
        &lists,
        |dom, list| aggregate_list(dom, list, catalog, settings),
        host::BOARD_HEADER,
        settings.show_board_totals,
        catalog,
    )
}

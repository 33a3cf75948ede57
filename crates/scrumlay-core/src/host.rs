//! Host application contract
//!
//! The overlay depends on the host kanban app exposing a known set of CSS
//! classes and on one undocumented behavior: committing a title edit by
//! dispatching a keydown carrying the Enter key code, because the host has
//! no public save API. Both are isolated here so a host markup change is a
//! compatibility break in one place, and so the keyboard hack can be
//! swapped for a better integration without touching extraction logic.

use crate::error::CoreError;
use tracing::warn;

// ===================
// Host selectors
// ===================

/// A list (column) container
pub const LIST: &str = "list";
/// The card container inside a list
pub const LIST_CARDS: &str = "list-cards";
/// One card
pub const LIST_CARD: &str = "list-card";
/// Cards hidden by host-side filtering
pub const HIDE: &str = "hide";
/// The card title element; its last child is the title text node
pub const CARD_NAME: &str = "js-card-name";
/// The host's short card id element
pub const CARD_SHORT_ID: &str = "card-short-id";
/// List header, the slot for list aggregate badges
pub const LIST_HEADER: &str = "js-list-header";
/// Name input inside the list header; badges insert before it
pub const LIST_NAME_INPUT: &str = "js-list-name-input";
/// The host's card counter; attribute changes here mean cards moved
pub const LIST_HEADER_NUM_CARDS: &str = "list-header-num-cards";
/// Container whose child list changes mean lists were added or removed
pub const LIST_SORTABLE: &str = "js-list-sortable";
/// Board header, the slot for board aggregate badges
pub const BOARD_HEADER: &str = "js-board-header";
/// The card-detail title input
pub const CARD_DETAIL_TITLE_INPUT: &str = "js-card-detail-title-input";
/// Class the title input carries while in edit mode
pub const IS_EDITING: &str = "is-editing";
/// Edit controls container the picker inserts into
pub const CURRENT_LIST: &str = "js-current-list";

// ===================
// Overlay namespace
// ===================

/// Prefix of every class the overlay owns. The watcher's self-caused
/// filter keys off this.
pub const OVERLAY_CLASS_PREFIX: &str = "scrumlay-";

/// Class added to the host's short-id element when card numbers are shown
pub const CARD_ID_CLASS: &str = "scrumlay-card-id";
/// Picker container class
pub const PICKER_CONTAINER_CLASS: &str = "scrumlay-picker-container";
/// Picker row class
pub const PICKER_ROW_CLASS: &str = "scrumlay-picker-row";

/// Cached raw title, as last observed before badge stripping
pub const ATTR_ORIGINAL_TITLE: &str = "data-original-title";
/// Set by the watcher when title content changed since the last extraction
pub const ATTR_MUTATED: &str = "data-mutated";
/// The input element's current value
pub const ATTR_VALUE: &str = "value";
/// Prefix of the per-kind persisted value attributes
pub const ATTR_CALCULATED_PREFIX: &str = "data-calculated-";

/// True if any class on the node is in the overlay's namespace.
pub fn is_overlay_class_list(classes: &[String]) -> bool {
    classes.iter().any(|c| c.starts_with(OVERLAY_CLASS_PREFIX))
}

/// True for attributes the overlay itself writes. A browser observer
/// configured with `attributes: false` would never deliver these; here the
/// journal carries everything, so the self-caused filter screens them out.
pub fn is_overlay_attribute(name: &str) -> bool {
    name == ATTR_ORIGINAL_TITLE
        || name == ATTR_MUTATED
        || name.starts_with(ATTR_CALCULATED_PREFIX)
}

// ===================
// Commit keystroke
// ===================

/// Key code of the commit keystroke the host's save handler listens for.
pub const ENTER_KEY_CODE: u32 = 13;

/// Low-level keyboard event dispatch into the host page.
///
/// Implementations return the key code the dispatched event actually
/// reported, which lets `commit_edit` verify the host did not rewrite it.
pub trait EventSink {
    fn dispatch_keydown(&mut self, key_code: u32) -> u32;
}

/// Commit a title edit by synthesizing the Enter keydown the host's save
/// handler expects.
///
/// This is the single loud diagnostic in the crate: if the reported key
/// code differs from the requested one, the save handler never saw Enter
/// and silent tolerance would lose the user's edit.
pub fn commit_edit(sink: &mut dyn EventSink) -> Result<(), CoreError> {
    let reported = sink.dispatch_keydown(ENTER_KEY_CODE);
    if reported != ENTER_KEY_CODE {
        warn!(
            requested = ENTER_KEY_CODE,
            reported, "Host rewrote the key code of the synthesized commit keystroke"
        );
        return Err(CoreError::KeyCodeMismatch {
            requested: ENTER_KEY_CODE,
            reported,
        });
    }
    Ok(())
}

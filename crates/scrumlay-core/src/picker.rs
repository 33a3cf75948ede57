//! Value picker shown while a card title is being edited
//!
//! A separate, user-invoked path next to the watcher/extractor cycle: when
//! the card-detail title input enters edit mode, one row of preset values
//! per activated kind is offered. Picking a value rewrites the input's
//! text through the same grammar the extractor uses and defers to the
//! host's own save handler via the synthesized commit keystroke.

use crate::dom::{Dom, MutationKind, MutationRecord, NodeId};
use crate::error::CoreError;
use crate::grammar::{self, ExtractedValue};
use crate::host::{self, EventSink};
use crate::kinds::{AnnotationKind, KindCatalog};
use crate::settings::Settings;
use tracing::debug;

/// Preset values offered per kind, the usual estimation scale.
pub const POINTS_SCALE: [f64; 11] = [0.0, 0.5, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 20.0, 40.0, 100.0];

/// True when this mutation means the card-detail title input just entered
/// edit mode. Only class changes count; the input's value churns on every
/// keystroke (and on the picker's own rewrite).
pub fn detect_edit_start(dom: &Dom, record: &MutationRecord) -> bool {
    let MutationKind::Attribute { name } = &record.kind else {
        return false;
    };
    name == "class"
        && dom.has_class(record.target, host::CARD_DETAIL_TITLE_INPUT)
        && dom.has_class(record.target, host::IS_EDITING)
}

/// Render the picker at the start of the edit controls.
///
/// No-op when the picker is disabled, already shown, or the edit controls
/// are missing from the page.
pub fn show_picker(dom: &mut Dom, catalog: &KindCatalog, settings: &Settings) -> Option<NodeId> {
    if !settings.show_picker {
        return None;
    }
    if dom.find_class(dom.root(), host::PICKER_CONTAINER_CLASS).is_some() {
        return None;
    }
    let edit_controls = dom.find_class(dom.root(), host::CURRENT_LIST)?;

    let container = dom.create_element("div", &[host::PICKER_CONTAINER_CLASS]);
    for spec in catalog.specs() {
        if !spec.activated {
            continue;
        }
        let row = dom.create_element("div", &[host::PICKER_ROW_CLASS]);
        for value in POINTS_SCALE {
            let button = dom.create_element("a", &[spec.picker_class]);
            let label = dom.create_text(&grammar::format_value(ExtractedValue::Number(value)));
            dom.append_child(button, label);
            dom.append_child(row, button);
        }
        dom.append_child(container, row);
    }

    let first = dom.first_child(edit_controls);
    dom.insert_before(edit_controls, container, first);
    debug!("Picker shown");
    Some(container)
}

/// Apply a picked value to the title input and commit it.
///
/// Strips any existing token of the kind from the input's current text,
/// prepends the new token, synthesizes the commit keystroke, and removes
/// the picker. The picker is dismissed even when the commit diagnostic
/// fires, matching the affordance's one-shot nature.
pub fn apply_pick(
    dom: &mut Dom,
    kind: AnnotationKind,
    value: f64,
    catalog: &KindCatalog,
    sink: &mut dyn EventSink,
) -> Result<(), CoreError> {
    let title_field = dom
        .find_class(dom.root(), host::CARD_DETAIL_TITLE_INPUT)
        .ok_or(CoreError::TitleInputNotFound)?;
    let spec = catalog.spec(kind);

    let current = dom
        .attribute(title_field, host::ATTR_VALUE)
        .unwrap_or_default()
        .to_string();
    let cleaned = grammar::strip(&current, spec);
    let token = format!(
        "{}{}{}",
        spec.delimiters.0,
        grammar::format_value(ExtractedValue::Number(value)),
        spec.delimiters.1
    );
    dom.set_attribute(title_field, host::ATTR_VALUE, &format!("{token}  {cleaned}"));

    let committed = host::commit_edit(sink);

    if let Some(picker) = dom.find_class(dom.root(), host::PICKER_CONTAINER_CLASS) {
        dom.remove(picker);
    }

    committed
}

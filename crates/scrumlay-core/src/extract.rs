//! Per-card annotation extraction
//!
//! Reads a card's title, parses every activated kind out of it, and keeps
//! the card's badges, cached attributes, and visible title text in sync.
//! The short-circuit in the middle is the crate's idempotence guarantee:
//! when nothing changed since the last pass, the card is returned without
//! a single DOM write, which is what keeps the watcher from feeding on the
//! extractor's own output.

use crate::badge;
use crate::dom::{Dom, NodeId};
use crate::grammar::{self, ExtractedValue, ValueIndex};
use crate::host;
use crate::kinds::KindCatalog;
use crate::settings::Settings;
use tracing::trace;

/// Extract every kind's value from one card, redrawing its badges when
/// needed. Returns sanitized values (`?` and absent count as zero).
pub fn extract_card(
    dom: &mut Dom,
    card: NodeId,
    catalog: &KindCatalog,
    settings: &Settings,
) -> ValueIndex {
    let Some(title_el) = dom.find_class(card, host::CARD_NAME) else {
        return ValueIndex::zeroed(catalog);
    };

    let mut content_mutated = false;

    // Reveal the host's short card id when configured
    if settings.show_card_numbers {
        if let Some(short_id) = dom.find_class(title_el, host::CARD_SHORT_ID) {
            if !dom.has_class(short_id, host::CARD_ID_CLASS) {
                dom.add_class(short_id, host::CARD_ID_CLASS);
            }
        }
    }

    // Authoritative original title: re-read the live text node when no
    // baseline is cached yet or the watcher flagged the title as mutated.
    let cached_title = dom.attribute(card, host::ATTR_ORIGINAL_TITLE).map(String::from);
    let flagged_mutated = dom.attribute(title_el, host::ATTR_MUTATED) == Some("1");

    let original_title = if cached_title.is_none() || flagged_mutated {
        let live = dom
            .last_child(title_el)
            .and_then(|n| dom.text(n))
            .unwrap_or_default()
            .to_string();
        if live.is_empty() {
            return ValueIndex::zeroed(catalog);
        }
        dom.set_attribute(title_el, host::ATTR_MUTATED, "0");
        dom.set_attribute(card, host::ATTR_ORIGINAL_TITLE, &live);
        content_mutated = true;
        live
    } else {
        cached_title.unwrap_or_default()
    };

    // Parse each kind and decide whether a redraw is due
    let mut extracted: Vec<ExtractedValue> = Vec::with_capacity(catalog.specs().len());
    for spec in catalog.specs() {
        let value = grammar::parse(&original_title, spec);
        extracted.push(value);

        // The host sometimes redraws a card and drops our badge; a persisted
        // attribute without its badge node forces the redraw path.
        if dom.attribute(card, spec.attribute).is_some()
            && dom.find_class(card, spec.badge_class).is_none()
        {
            content_mutated = true;
        }
        if dom.attribute(card, spec.attribute) != value.persisted().as_deref() {
            content_mutated = true;
        }
    }

    if !content_mutated {
        return sanitize(catalog, &extracted);
    }

    trace!(?card, "Redrawing card badges");

    // Redraw: badges, attributes, and the cleaned visible title
    let mut cleaned_title = original_title;
    for (spec, value) in catalog.specs().iter().zip(&extracted) {
        if !value.is_present() {
            badge::remove_if_exists(dom, title_el, spec.badge_class);
            dom.remove_attribute(card, spec.attribute);
            continue;
        }

        let anchor = dom.last_child(title_el);
        let badge_el = badge::find_or_insert(dom, title_el, spec.badge_class, anchor);
        badge::set_badge_text(dom, badge_el, &grammar::format_value(*value));
        if let Some(persisted) = value.persisted() {
            dom.set_attribute(card, spec.attribute, &persisted);
        }
        cleaned_title = grammar::strip(&cleaned_title, spec);
    }

    if let Some(text_node) = dom.last_child(title_el) {
        if dom.text(text_node).is_some() && dom.text(text_node) != Some(cleaned_title.as_str()) {
            dom.set_text(text_node, &cleaned_title);
        }
    }

    sanitize(catalog, &extracted)
}

fn sanitize(catalog: &KindCatalog, extracted: &[ExtractedValue]) -> ValueIndex {
    let mut index = ValueIndex::zeroed(catalog);
    for (spec, value) in catalog.specs().iter().zip(extracted) {
        index.set(spec.kind, value.sanitized());
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::AnnotationKind;

    fn build_card(dom: &mut Dom, title: &str) -> NodeId {
        let card = dom.create_element("div", &[host::LIST_CARD]);
        dom.append_child(dom.root(), card);
        let name = dom.create_element("span", &[host::CARD_NAME]);
        dom.append_child(card, name);
        let text = dom.create_text(title);
        dom.append_child(name, text);
        card
    }

    fn defaults() -> (Settings, KindCatalog) {
        let settings = Settings::default();
        let catalog = KindCatalog::from_settings(&settings);
        (settings, catalog)
    }

    #[test]
    fn test_extracts_story_and_post_points() {
        let (settings, catalog) = defaults();
        let mut dom = Dom::new();
        let card = build_card(&mut dom, "Fix login (3) [2]");

        let values = extract_card(&mut dom, card, &catalog, &settings);
        assert_eq!(values.get(AnnotationKind::Story), 3.0);
        assert_eq!(values.get(AnnotationKind::Post), 2.0);

        let title_el = dom.find_class(card, host::CARD_NAME).unwrap();
        let text = dom.last_child(title_el).unwrap();
        assert_eq!(dom.text(text), Some("Fix login"));

        let story_badge = dom.find_class(card, "scrumlay-points").unwrap();
        let post_badge = dom.find_class(card, "scrumlay-post-points").unwrap();
        assert_eq!(dom.text(dom.last_child(story_badge).unwrap()), Some("3"));
        assert_eq!(dom.text(dom.last_child(post_badge).unwrap()), Some("2"));

        assert_eq!(dom.attribute(card, "data-calculated-points"), Some("3"));
        assert_eq!(dom.attribute(card, "data-calculated-post-points"), Some("2"));
    }

    #[test]
    fn test_placeholder_badge_and_zero_contribution() {
        let (settings, catalog) = defaults();
        let mut dom = Dom::new();
        let card = build_card(&mut dom, "Investigate (?)");

        let values = extract_card(&mut dom, card, &catalog, &settings);
        assert_eq!(values.get(AnnotationKind::Story), 0.0);

        let badge = dom.find_class(card, "scrumlay-points").unwrap();
        assert_eq!(dom.text(dom.last_child(badge).unwrap()), Some("?"));
        assert_eq!(dom.attribute(card, "data-calculated-points"), Some("?"));
    }

    #[test]
    fn test_second_pass_writes_nothing() {
        let (settings, catalog) = defaults();
        let mut dom = Dom::new();
        let card = build_card(&mut dom, "Fix login (3) [2]");

        let first = extract_card(&mut dom, card, &catalog, &settings);
        dom.take_mutations();

        let second = extract_card(&mut dom, card, &catalog, &settings);
        assert_eq!(dom.pending_mutations(), 0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_title_element_returns_defaults() {
        let (settings, catalog) = defaults();
        let mut dom = Dom::new();
        let card = dom.create_element("div", &[host::LIST_CARD]);
        dom.append_child(dom.root(), card);
        dom.take_mutations();

        let values = extract_card(&mut dom, card, &catalog, &settings);
        assert_eq!(values, ValueIndex::zeroed(&catalog));
        assert_eq!(dom.pending_mutations(), 0);
    }

    #[test]
    fn test_dropped_badge_is_redrawn() {
        let (settings, catalog) = defaults();
        let mut dom = Dom::new();
        let card = build_card(&mut dom, "Fix login (3)");
        extract_card(&mut dom, card, &catalog, &settings);

        // Host redraw dropped the injected badge
        let badge = dom.find_class(card, "scrumlay-points").unwrap();
        dom.remove(badge);
        dom.take_mutations();

        let values = extract_card(&mut dom, card, &catalog, &settings);
        assert_eq!(values.get(AnnotationKind::Story), 3.0);
        assert!(dom.find_class(card, "scrumlay-points").is_some());
    }

    #[test]
    fn test_mutated_flag_rereads_live_title() {
        let (settings, catalog) = defaults();
        let mut dom = Dom::new();
        let card = build_card(&mut dom, "Fix login (3)");
        extract_card(&mut dom, card, &catalog, &settings);

        // User edited the title; the watcher flags it and the host rewrote
        // the text node
        let title_el = dom.find_class(card, host::CARD_NAME).unwrap();
        let text = dom.last_child(title_el).unwrap();
        dom.set_text(text, "Fix login and signup (5)");
        dom.set_attribute(title_el, host::ATTR_MUTATED, "1");

        let values = extract_card(&mut dom, card, &catalog, &settings);
        assert_eq!(values.get(AnnotationKind::Story), 5.0);
        assert_eq!(
            dom.attribute(card, host::ATTR_ORIGINAL_TITLE),
            Some("Fix login and signup (5)")
        );
        assert_eq!(dom.text(text), Some("Fix login and signup"));
        assert_eq!(dom.attribute(title_el, host::ATTR_MUTATED), Some("0"));
    }

    #[test]
    fn test_removed_token_clears_badge_and_attribute() {
        let (settings, catalog) = defaults();
        let mut dom = Dom::new();
        let card = build_card(&mut dom, "Fix login (3)");
        extract_card(&mut dom, card, &catalog, &settings);

        let title_el = dom.find_class(card, host::CARD_NAME).unwrap();
        let text = dom.last_child(title_el).unwrap();
        dom.set_text(text, "Fix login");
        dom.set_attribute(title_el, host::ATTR_MUTATED, "1");

        let values = extract_card(&mut dom, card, &catalog, &settings);
        assert_eq!(values.get(AnnotationKind::Story), 0.0);
        assert!(dom.find_class(card, "scrumlay-points").is_none());
        assert_eq!(dom.attribute(card, "data-calculated-points"), None);
    }

    #[test]
    fn test_deactivated_kind_is_ignored() {
        let settings = Settings {
            show_post_points: false,
            ..Settings::default()
        };
        let catalog = KindCatalog::from_settings(&settings);
        let mut dom = Dom::new();
        let card = build_card(&mut dom, "Fix login (3) [2]");

        let values = extract_card(&mut dom, card, &catalog, &settings);
        assert_eq!(values.get(AnnotationKind::Story), 3.0);
        assert_eq!(values.get(AnnotationKind::Post), 0.0);
        assert!(dom.find_class(card, "scrumlay-post-points").is_none());

        // The deactivated token stays in the visible title
        let title_el = dom.find_class(card, host::CARD_NAME).unwrap();
        let text = dom.last_child(title_el).unwrap();
        assert_eq!(dom.text(text), Some("Fix login [2]"));
    }

    #[test]
    fn test_card_number_class_applied_once() {
        let (settings, catalog) = defaults();
        let mut dom = Dom::new();
        let card = build_card(&mut dom, "Fix login");
        let title_el = dom.find_class(card, host::CARD_NAME).unwrap();
        let short_id = dom.create_element("span", &[host::CARD_SHORT_ID]);
        dom.insert_before(title_el, short_id, dom.first_child(title_el));

        extract_card(&mut dom, card, &catalog, &settings);
        assert!(dom.has_class(short_id, host::CARD_ID_CLASS));

        dom.take_mutations();
        extract_card(&mut dom, card, &catalog, &settings);
        assert_eq!(dom.pending_mutations(), 0);
    }
}

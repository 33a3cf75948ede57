//! Annotation kind catalog
//!
//! Each kind of numeric annotation a card title can carry (story points,
//! post points, hour estimates) is described by a [`KindSpec`]: its
//! delimiter pair, the compiled pattern that recognizes its token, the
//! card attribute it persists under, its badge and picker CSS classes,
//! and whether the current settings activate it.

use crate::settings::Settings;
use once_cell::sync::Lazy;
use regex::Regex;

/// The fixed set of annotation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnnotationKind {
    /// Story points, `(3)` or `(?)`
    Story,
    /// Post-estimation points, `[2]`
    Post,
    /// Hour estimates, `$1.5$`
    Hour,
}

impl AnnotationKind {
    /// All kinds, in the order they are evaluated and displayed.
    pub const ALL: [AnnotationKind; 3] = [
        AnnotationKind::Story,
        AnnotationKind::Post,
        AnnotationKind::Hour,
    ];
}

// Token patterns anchor on the kind's delimiter pair and capture `?` or a
// decimal numeral with `.` or `,` as separator. Leading whitespace is part
// of the match so stripping a mid-title token does not leave a double space.
static STORY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\((\?|\d+(?:[.,]\d*)?)\)").expect("story pattern"));
static POST_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\[(\?|\d+(?:[.,]\d*)?)\]").expect("post pattern"));
static HOUR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\$(\?|\d+(?:[.,]\d*)?)\$").expect("hour pattern"));

/// Full description of one annotation kind, with its activation flag bound
/// from the current settings.
#[derive(Debug, Clone)]
pub struct KindSpec {
    pub kind: AnnotationKind,
    /// Card attribute the raw extracted value persists under
    pub attribute: &'static str,
    /// Badge element class (cards and header totals)
    pub badge_class: &'static str,
    /// Picker button class
    pub picker_class: &'static str,
    /// Delimiter pair wrapping the value in the title
    pub delimiters: (&'static str, &'static str),
    /// Whether the current settings evaluate this kind at all
    pub activated: bool,
    /// Contribution of an absent or placeholder value
    pub default_value: f64,
}

impl KindSpec {
    /// The compiled token pattern for this kind.
    pub fn pattern(&self) -> &'static Regex {
        match self.kind {
            AnnotationKind::Story => &STORY_PATTERN,
            AnnotationKind::Post => &POST_PATTERN,
            AnnotationKind::Hour => &HOUR_PATTERN,
        }
    }
}

/// The kind specs for one page session, activation flags bound once from
/// the loaded settings.
#[derive(Debug, Clone)]
pub struct KindCatalog {
    specs: Vec<KindSpec>,
}

impl KindCatalog {
    pub fn from_settings(settings: &Settings) -> Self {
        let specs = vec![
            KindSpec {
                kind: AnnotationKind::Story,
                attribute: "data-calculated-points",
                badge_class: "scrumlay-points",
                picker_class: "scrumlay-picker-button",
                delimiters: ("(", ")"),
                activated: settings.show_story_points,
                default_value: 0.0,
            },
            KindSpec {
                kind: AnnotationKind::Post,
                attribute: "data-calculated-post-points",
                badge_class: "scrumlay-post-points",
                picker_class: "scrumlay-picker-post-button",
                delimiters: ("[", "]"),
                activated: settings.show_post_points,
                default_value: 0.0,
            },
            KindSpec {
                kind: AnnotationKind::Hour,
                attribute: "data-calculated-hour-points",
                badge_class: "scrumlay-hour-points",
                picker_class: "scrumlay-picker-hour-button",
                delimiters: ("$", "$"),
                activated: settings.show_hour_points,
                default_value: 0.0,
            },
        ];
        Self { specs }
    }

    /// Specs in evaluation order.
    pub fn specs(&self) -> &[KindSpec] {
        &self.specs
    }

    pub fn spec(&self, kind: AnnotationKind) -> &KindSpec {
        self.specs
            .iter()
            .find(|s| s.kind == kind)
            .expect("catalog covers every kind")
    }
}

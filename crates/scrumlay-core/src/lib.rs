//! scrumlay-core - Core library for scrumlay
//!
//! Provides the annotation grammar, per-card extractor, list/board
//! aggregator, mutation watcher, and picker affordance for overlaying
//! story-point badges onto a kanban board.

pub mod aggregate;
pub mod badge;
pub mod dom;
pub mod error;
pub mod event;
pub mod extract;
pub mod grammar;
pub mod host;
pub mod kinds;
pub mod overlay;
pub mod picker;
pub mod settings;
pub mod watcher;

pub use dom::{Dom, MutationKind, MutationRecord, NodeId};
pub use error::CoreError;
pub use event::{EventBus, OverlayEvent};
pub use grammar::{ExtractedValue, ValueIndex};
pub use kinds::{AnnotationKind, KindCatalog, KindSpec};
pub use overlay::{Overlay, OverlayConfig};
pub use settings::{MemoryStore, Settings, SettingsStore};
pub use watcher::{classify, Action, Debouncer, WatcherState};

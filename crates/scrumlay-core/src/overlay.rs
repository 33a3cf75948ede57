//! The overlay engine
//!
//! Owns the loaded settings, the kind catalog, the watcher state, and the
//! event bus for one page session. `pump` is the synchronous heart:
//! drain the mutation journal, classify, mark, debounce, recompute. `run`
//! wraps it in an async driver that polls the shared document and honors a
//! shutdown signal.

use crate::aggregate;
use crate::dom::Dom;
use crate::error::CoreError;
use crate::event::{EventBus, OverlayEvent};
use crate::host::{self, EventSink};
use crate::kinds::{AnnotationKind, KindCatalog};
use crate::picker;
use crate::settings::Settings;
use crate::watcher::{Action, WatcherState, DEFAULT_QUIET_WINDOW};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Timing configuration for the engine
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Debounce quiet window between recompute passes
    pub quiet_window: Duration,

    /// How often the async driver drains the mutation journal
    pub poll_interval: Duration,

    /// Retry interval while waiting for the host to render its first list
    pub list_poll_interval: Duration,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            quiet_window: DEFAULT_QUIET_WINDOW,
            poll_interval: Duration::from_millis(50),
            list_poll_interval: Duration::from_millis(300),
        }
    }
}

/// One page session of the overlay.
pub struct Overlay {
    settings: Settings,
    catalog: KindCatalog,
    watcher: WatcherState,
    config: OverlayConfig,
    bus: EventBus,
}

impl Overlay {
    pub fn new(settings: Settings) -> Self {
        Self::with_config(settings, OverlayConfig::default())
    }

    pub fn with_config(settings: Settings, config: OverlayConfig) -> Self {
        let catalog = KindCatalog::from_settings(&settings);
        Self {
            settings,
            catalog,
            watcher: WatcherState::new(config.quiet_window),
            config,
            bus: EventBus::default_capacity(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &KindCatalog {
        &self.catalog
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Full board pass: aggregate everything and (re-)observe every list.
    pub fn scan(&mut self, dom: &mut Dom) {
        aggregate::recompute_board(dom, &self.catalog, &self.settings);
        self.watcher.observe_lists(dom);
        self.bus.publish(OverlayEvent::RecomputeCompleted {
            lists: self.watcher.observed_list_count(),
        });
    }

    /// Drain and classify pending mutations, then recompute if the
    /// debouncer lets the trigger through. Also services a pass deferred
    /// by an earlier absorbed trigger, so a burst that goes quiet is
    /// still rendered. Returns true when a recompute pass ran.
    pub fn pump(&mut self, dom: &mut Dom, now: Instant) -> bool {
        let records = dom.take_mutations();
        let mut triggered = false;

        for record in &records {
            if picker::detect_edit_start(dom, record)
                && picker::show_picker(dom, &self.catalog, &self.settings).is_some()
            {
                self.bus.publish(OverlayEvent::PickerShown);
            }

            match crate::watcher::classify(dom, record) {
                Action::Ignore => {}
                Action::RecomputeBoard => triggered = true,
                Action::MarkCardMutated(title_el) => {
                    dom.set_attribute(title_el, host::ATTR_MUTATED, "1");
                    self.bus.publish(OverlayEvent::CardMutated(title_el));
                    triggered = true;
                }
            }
        }

        let fire = if triggered {
            self.bus.publish(OverlayEvent::RecomputeScheduled);
            self.watcher.debouncer.trigger(now)
        } else {
            self.watcher.debouncer.poll(now)
        };

        if fire {
            debug!("Debouncer fired, recomputing board");
            self.scan(dom);
            true
        } else {
            false
        }
    }

    /// Apply a picker value to the open title edit, commit it through the
    /// host keyboard sink, and publish the outcome.
    pub fn apply_pick(
        &mut self,
        dom: &mut Dom,
        kind: AnnotationKind,
        value: f64,
        sink: &mut dyn EventSink,
    ) -> Result<(), CoreError> {
        picker::apply_pick(dom, kind, value, &self.catalog, sink)?;
        self.bus.publish(OverlayEvent::PickerApplied);
        Ok(())
    }

    /// Async driver: wait for the host to render its lists, run the first
    /// scan, then pump on an interval until shutdown.
    pub async fn run(mut self, dom: Arc<Mutex<Dom>>, mut shutdown: mpsc::Receiver<()>) {
        // The host may rebuild the page late; hold off until a list exists
        loop {
            let has_lists = {
                let dom = dom.lock();
                !dom.find_all_class(dom.root(), host::LIST).is_empty()
            };
            if has_lists {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.list_poll_interval) => {}
                _ = shutdown.recv() => {
                    info!("Overlay shutting down before first scan");
                    return;
                }
            }
        }

        {
            let mut dom = dom.lock();
            // The startup scan's own writes must not count as triggers
            self.scan(&mut dom);
            dom.take_mutations();
        }
        info!("Overlay started");

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let mut dom = dom.lock();
                    self.pump(&mut dom, Instant::now());
                }
                _ = shutdown.recv() => {
                    info!("Overlay shutting down");
                    break;
                }
            }
        }
    }
}

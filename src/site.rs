//! Wires the synchronizers to one page and routes page events to them.
//!
//! Each component owns a disjoint surface of the page, so events are handed
//! to exactly one of them and nothing is shared beyond the page itself.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::Config;
use crate::feed::FeedSource;
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::modal::{ModalController, ModalEvent, ModalState};
use crate::nav::{IntersectionEntry, NavSync, Observer, ObserverOptions};
use crate::page::{Page, Rect, StatusSurface};
use crate::poller::{PollSettings, Poller};
use crate::reveal::{RevealSettings, RevealState, RevealSync};

#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Scroll { scroll_y: f64, hero: Option<Rect> },
    /// Fresh section geometry, fed through the intersection observer.
    Layout {
        viewport_height: f64,
        sections: Vec<(String, Rect)>,
    },
    /// Entries delivered directly by an external observer.
    Intersections(Vec<IntersectionEntry>),
    LinkClick { href: String },
    /// Click on an element carrying `id`; opens the modal when it is a trigger.
    Click { id: String },
    CloseClick,
    ModalClick { on_backdrop: bool },
    KeyDown { key: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteLayout {
    pub trigger_ids: HashSet<String>,
    pub section_ids: Vec<String>,
}

impl SiteLayout {
    pub fn new<T, S>(triggers: T, sections: S) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            trigger_ids: triggers.into_iter().map(Into::into).collect(),
            section_ids: sections.into_iter().map(Into::into).collect(),
        }
    }
}

pub struct Site<P: Page + 'static> {
    poller: Poller,
    reveal: RevealSync<P>,
    observer: Observer,
    nav: NavSync<P>,
    modal: ModalController<P>,
    triggers: HashSet<String>,
}

impl<P: Page + 'static> Site<P> {
    pub fn new(cfg: &Config, page: Arc<P>, feed: Arc<dyn FeedSource>, layout: SiteLayout) -> Self {
        let status: Arc<dyn StatusSurface> = page.clone();
        Self {
            poller: Poller::new(feed, status, PollSettings::from_config(cfg)),
            reveal: RevealSync::new(page.clone(), RevealSettings::from_config(cfg)),
            observer: Observer::new(ObserverOptions::from_config(cfg)),
            nav: NavSync::new(page.clone(), layout.section_ids),
            modal: ModalController::new(page),
            triggers: layout.trigger_ids,
        }
    }

    /// First paint: reveal state from the current geometry right away, then
    /// the poller, whose first cycle runs without waiting for the interval.
    pub fn start(&mut self, hero: Option<Rect>, scroll_y: f64) -> JoinHandle<()> {
        self.reveal.sync(hero, scroll_y);
        log(
            Level::Info,
            Domain::System,
            "site_started",
            obj(&[
                ("nav", v_str(if self.nav.is_enabled() { "wired" } else { "inactive" })),
                ("triggers", serde_json::json!(self.triggers.len())),
            ]),
        );
        self.poller.clone().spawn()
    }

    pub fn dispatch(&mut self, event: PageEvent) {
        match event {
            PageEvent::Scroll { scroll_y, hero } => {
                self.reveal.sync(hero, scroll_y);
            }
            PageEvent::Layout {
                viewport_height,
                sections,
            } => {
                let entries = self.observer.observe(viewport_height, &sections);
                if !entries.is_empty() {
                    self.nav.on_intersections(&entries);
                }
            }
            PageEvent::Intersections(entries) => {
                self.nav.on_intersections(&entries);
            }
            PageEvent::LinkClick { href } => {
                self.nav.on_link_click(&href);
            }
            PageEvent::Click { id } => {
                if self.triggers.contains(&id) {
                    self.modal.handle(ModalEvent::Trigger);
                }
            }
            PageEvent::CloseClick => {
                self.modal.handle(ModalEvent::CloseControl);
            }
            PageEvent::ModalClick { on_backdrop } => {
                self.modal.handle(ModalEvent::Click { on_backdrop });
            }
            PageEvent::KeyDown { key } => {
                self.modal.handle(ModalEvent::KeyDown { key });
            }
        }
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn reveal_state(&self) -> Option<RevealState> {
        self.reveal.current()
    }

    pub fn active_section(&self) -> Option<&str> {
        self.nav.active()
    }

    pub fn modal_state(&self) -> ModalState {
        self.modal.state()
    }
}

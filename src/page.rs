//! Document surfaces touched by the synchronizers.
//!
//! Each component writes to its own surface only: status text and beat
//! duration, body classes, nav link classes, modal attribute and body scroll.
//! `MemoryPage` implements all of them behind one mutex so the daemon and the
//! tests can run the whole site headless.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

pub const BEAT_DURATION_PROPERTY: &str = "--beat-duration";
pub const FALLBACK_STATUS: &str = "Checking for a pulse...";

/// Vertical extent of an element's bounding box, relative to the viewport top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub top: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    pub fn height(&self) -> f64 {
        (self.bottom - self.top).max(0.0)
    }

    /// Same box after the page scrolls down by `dy`.
    pub fn shifted(&self, dy: f64) -> Rect {
        Rect::new(self.top - dy, self.bottom - dy)
    }
}

pub trait StatusSurface: Send + Sync {
    /// Number of status elements on the page (0..N).
    fn status_targets(&self) -> usize;
    fn set_status_text(&self, text: &str);
    /// Writes the animation duration onto every heartbeat element.
    fn set_beat_duration(&self, value: &str);
}

pub trait BodyClasses: Send + Sync {
    fn set_body_class(&self, name: &str, on: bool);
}

pub trait NavLinks: Send + Sync {
    fn link_hrefs(&self) -> Vec<String>;
    /// Marks the link whose href equals `href` active and clears every other one.
    fn set_active_link(&self, href: &str);
}

pub trait ModalSurface: Send + Sync {
    fn has_modal(&self) -> bool;
    fn set_modal_hidden(&self, hidden: bool);
    /// Background page scroll lock (`overflow: hidden` on the body).
    fn set_scroll_locked(&self, locked: bool);
}

/// Everything a site needs from its document.
pub trait Page: StatusSurface + BodyClasses + NavLinks + ModalSurface {}

impl<T> Page for T where T: StatusSurface + BodyClasses + NavLinks + ModalSurface {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkState {
    pub href: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageState {
    pub status_texts: Vec<String>,
    pub beat_durations: Vec<Option<String>>,
    pub body_classes: BTreeSet<String>,
    pub scroll_locked: bool,
    pub links: Vec<LinkState>,
    /// `None` when the page has no modal container.
    pub modal_hidden: Option<bool>,
    /// Attribute writes on the modal container.
    pub modal_writes: u64,
}

impl PageState {
    pub fn active_links(&self) -> Vec<&str> {
        self.links
            .iter()
            .filter(|l| l.active)
            .map(|l| l.href.as_str())
            .collect()
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.body_classes.contains(name)
    }
}

#[derive(Debug, Default)]
pub struct MemoryPage {
    state: Mutex<PageState>,
}

impl MemoryPage {
    pub fn builder() -> MemoryPageBuilder {
        MemoryPageBuilder::default()
    }

    pub fn snapshot(&self) -> PageState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        // A panicking writer cannot leave PageState half-updated, so keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Default)]
pub struct MemoryPageBuilder {
    status_elements: usize,
    heartbeats: usize,
    links: Vec<String>,
    modal: bool,
}

impl MemoryPageBuilder {
    pub fn status_elements(mut self, n: usize) -> Self {
        self.status_elements = n;
        self
    }

    pub fn heartbeats(mut self, n: usize) -> Self {
        self.heartbeats = n;
        self
    }

    pub fn links<I, S>(mut self, hrefs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links = hrefs.into_iter().map(Into::into).collect();
        self
    }

    pub fn modal(mut self) -> Self {
        self.modal = true;
        self
    }

    pub fn build(self) -> MemoryPage {
        MemoryPage {
            state: Mutex::new(PageState {
                status_texts: vec![FALLBACK_STATUS.to_string(); self.status_elements],
                beat_durations: vec![None; self.heartbeats],
                links: self
                    .links
                    .into_iter()
                    .map(|href| LinkState { href, active: false })
                    .collect(),
                // Markup ships the modal hidden.
                modal_hidden: self.modal.then_some(true),
                ..PageState::default()
            }),
        }
    }
}

impl StatusSurface for MemoryPage {
    fn status_targets(&self) -> usize {
        self.lock().status_texts.len()
    }

    fn set_status_text(&self, text: &str) {
        for el in self.lock().status_texts.iter_mut() {
            *el = text.to_string();
        }
    }

    fn set_beat_duration(&self, value: &str) {
        for el in self.lock().beat_durations.iter_mut() {
            *el = Some(value.to_string());
        }
    }
}

impl BodyClasses for MemoryPage {
    fn set_body_class(&self, name: &str, on: bool) {
        let mut state = self.lock();
        if on {
            state.body_classes.insert(name.to_string());
        } else {
            state.body_classes.remove(name);
        }
    }
}

impl NavLinks for MemoryPage {
    fn link_hrefs(&self) -> Vec<String> {
        self.lock().links.iter().map(|l| l.href.clone()).collect()
    }

    fn set_active_link(&self, href: &str) {
        for link in self.lock().links.iter_mut() {
            link.active = link.href == href;
        }
    }
}

impl ModalSurface for MemoryPage {
    fn has_modal(&self) -> bool {
        self.lock().modal_hidden.is_some()
    }

    fn set_modal_hidden(&self, hidden: bool) {
        let mut state = self.lock();
        if state.modal_hidden.is_some() {
            state.modal_hidden = Some(hidden);
            state.modal_writes += 1;
        }
    }

    fn set_scroll_locked(&self, locked: bool) {
        self.lock().scroll_locked = locked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_initial_state() {
        let page = MemoryPage::builder()
            .status_elements(2)
            .heartbeats(1)
            .links(["#about", "#work"])
            .modal()
            .build();
        let s = page.snapshot();
        assert_eq!(s.status_texts, vec![FALLBACK_STATUS, FALLBACK_STATUS]);
        assert_eq!(s.beat_durations, vec![None]);
        assert_eq!(s.modal_hidden, Some(true));
        assert!(s.active_links().is_empty());
        assert!(!s.scroll_locked);
    }

    #[test]
    fn test_status_written_to_every_element() {
        let page = MemoryPage::builder().status_elements(3).heartbeats(2).build();
        page.set_status_text("Alive - Cruising | 80 bpm");
        page.set_beat_duration("0.75s");
        let s = page.snapshot();
        assert!(s.status_texts.iter().all(|t| t == "Alive - Cruising | 80 bpm"));
        assert!(s.beat_durations.iter().all(|d| d.as_deref() == Some("0.75s")));
    }

    #[test]
    fn test_active_link_is_unique() {
        let page = MemoryPage::builder().links(["#a", "#b", "#c"]).build();
        page.set_active_link("#b");
        page.set_active_link("#c");
        assert_eq!(page.snapshot().active_links(), vec!["#c"]);
    }

    #[test]
    fn test_missing_modal_ignores_writes() {
        let page = MemoryPage::builder().build();
        assert!(!page.has_modal());
        page.set_modal_hidden(false);
        let s = page.snapshot();
        assert_eq!(s.modal_hidden, None);
        assert_eq!(s.modal_writes, 0);
    }

    #[test]
    fn test_body_class_toggle() {
        let page = MemoryPage::builder().build();
        page.set_body_class("scrolled", true);
        assert!(page.snapshot().has_class("scrolled"));
        page.set_body_class("scrolled", false);
        assert!(!page.snapshot().has_class("scrolled"));
    }
}

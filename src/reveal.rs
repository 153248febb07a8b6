//! Scroll-driven page chrome.
//!
//! Recomputed from scratch on every scroll tick. With a hero element the two
//! flags follow its geometry; without one both fall back to a plain scroll
//! offset check.

use std::sync::Arc;

use crate::config::Config;
use crate::logging::{log_transition, Domain};
use crate::page::{BodyClasses, Rect};

pub const CONTENT_REVEALED_CLASS: &str = "scrolled";
pub const PILL_VISIBLE_CLASS: &str = "pill-visible";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealSettings {
    pub fallback_px: f64,
    pub reveal_ratio: f64,
}

impl RevealSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            fallback_px: cfg.scroll_fallback_px,
            reveal_ratio: cfg.reveal_ratio,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevealState {
    pub content_revealed: bool,
    pub pill_visible: bool,
}

impl RevealState {
    pub fn compute(hero: Option<Rect>, scroll_y: f64, settings: &RevealSettings) -> Self {
        match hero {
            Some(rect) => RevealState {
                content_revealed: rect.bottom <= rect.height() * settings.reveal_ratio,
                pill_visible: rect.bottom <= 0.0,
            },
            None => {
                let past = scroll_y > settings.fallback_px;
                RevealState {
                    content_revealed: past,
                    pill_visible: past,
                }
            }
        }
    }

    fn label(&self) -> String {
        format!(
            "content={},pill={}",
            self.content_revealed, self.pill_visible
        )
    }
}

pub struct RevealSync<B: BodyClasses + ?Sized> {
    body: Arc<B>,
    settings: RevealSettings,
    last: Option<RevealState>,
}

impl<B: BodyClasses + ?Sized> RevealSync<B> {
    pub fn new(body: Arc<B>, settings: RevealSettings) -> Self {
        Self {
            body,
            settings,
            last: None,
        }
    }

    /// Applies the state for the current geometry to the body classes.
    pub fn sync(&mut self, hero: Option<Rect>, scroll_y: f64) -> RevealState {
        let next = RevealState::compute(hero, scroll_y, &self.settings);
        self.body
            .set_body_class(CONTENT_REVEALED_CLASS, next.content_revealed);
        self.body.set_body_class(PILL_VISIBLE_CLASS, next.pill_visible);

        if self.last != Some(next) {
            let from = self.last.map(|s| s.label()).unwrap_or_else(|| "init".to_string());
            log_transition(Domain::Reveal, &from, &next.label());
            self.last = Some(next);
        }
        next
    }

    pub fn current(&self) -> Option<RevealState> {
        self.last
    }
}

//! Active-section highlighting for the in-page navigation.
//!
//! `Observer` turns section geometry into intersection entries the way a
//! browser intersection observer reports them (only on threshold crossings);
//! `NavSync` picks the most visible section from those entries and keeps
//! exactly one matching link active.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::logging::{log_transition, Domain};
use crate::page::{NavLinks, Rect};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntersectionEntry {
    pub section_id: String,
    pub is_intersecting: bool,
    pub ratio: f64,
}

impl IntersectionEntry {
    pub fn new(section_id: impl Into<String>, is_intersecting: bool, ratio: f64) -> Self {
        Self {
            section_id: section_id.into(),
            is_intersecting,
            ratio,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// Fraction of the viewport height cut from the top of the root.
    pub margin_top: f64,
    /// Fraction of the viewport height cut from the bottom of the root.
    pub margin_bottom: f64,
    pub thresholds: Vec<f64>,
}

impl ObserverOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            margin_top: cfg.nav_margin_top,
            margin_bottom: cfg.nav_margin_bottom,
            thresholds: cfg.nav_thresholds.clone(),
        }
    }

    /// Observation band in viewport coordinates.
    pub fn root(&self, viewport_height: f64) -> Rect {
        Rect::new(
            viewport_height * self.margin_top,
            viewport_height * (1.0 - self.margin_bottom),
        )
    }
}

pub struct Observer {
    options: ObserverOptions,
    // section id -> (is_intersecting, threshold index)
    previous: HashMap<String, (bool, i64)>,
}

impl Observer {
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            options,
            previous: HashMap::new(),
        }
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }

    /// Entries for the sections whose intersecting state or threshold bucket changed.
    /// The first observation of a section always reports.
    pub fn observe(&mut self, viewport_height: f64, sections: &[(String, Rect)]) -> Vec<IntersectionEntry> {
        let root = self.options.root(viewport_height);
        let mut out = Vec::new();
        for (id, rect) in sections {
            let overlap = rect.bottom.min(root.bottom) - rect.top.max(root.top);
            let is_intersecting = overlap >= 0.0 && root.height() > 0.0;
            let ratio = if !is_intersecting {
                0.0
            } else if rect.height() > 0.0 {
                (overlap / rect.height()).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let index = if is_intersecting {
                self.options.thresholds.iter().filter(|t| **t <= ratio).count() as i64
            } else {
                -1
            };

            let key = (is_intersecting, index);
            if self.previous.get(id) != Some(&key) {
                self.previous.insert(id.clone(), key);
                out.push(IntersectionEntry::new(id.clone(), is_intersecting, ratio));
            }
        }
        out
    }
}

pub struct NavSync<L: NavLinks + ?Sized> {
    links: Arc<L>,
    hrefs: Vec<String>,
    section_ids: Vec<String>,
    active: Option<String>,
}

impl<L: NavLinks + ?Sized> NavSync<L> {
    pub fn new(links: Arc<L>, section_ids: Vec<String>) -> Self {
        let hrefs = links
            .link_hrefs()
            .into_iter()
            .filter(|h| h.starts_with('#'))
            .collect();
        Self {
            links,
            hrefs,
            section_ids,
            active: None,
        }
    }

    /// Only wired when the page has both sections and in-page links.
    pub fn is_enabled(&self) -> bool {
        !self.section_ids.is_empty() && !self.hrefs.is_empty()
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Most visible intersecting section wins. With none intersecting the
    /// current link stays active.
    pub fn on_intersections(&mut self, entries: &[IntersectionEntry]) -> Option<&str> {
        if !self.is_enabled() {
            return None;
        }
        let mut visible: Vec<&IntersectionEntry> = entries
            .iter()
            .filter(|e| e.is_intersecting)
            .filter(|e| self.section_ids.iter().any(|id| *id == e.section_id))
            .collect();
        visible.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
        if let Some(top) = visible.first() {
            let id = top.section_id.clone();
            self.set_active(&id);
        }
        self.active()
    }

    /// Optimistic highlight on click, before the scroll it triggers is observed.
    pub fn on_link_click(&mut self, href: &str) -> Option<&str> {
        if !self.is_enabled() {
            return None;
        }
        if let Some(id) = href.strip_prefix('#') {
            self.set_active(id);
        }
        self.active()
    }

    fn set_active(&mut self, id: &str) {
        self.links.set_active_link(&format!("#{}", id));
        if self.active.as_deref() != Some(id) {
            log_transition(Domain::Nav, self.active.as_deref().unwrap_or("none"), id);
            self.active = Some(id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::MemoryPage;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn nav() -> (Arc<MemoryPage>, NavSync<MemoryPage>) {
        let page = Arc::new(
            MemoryPage::builder()
                .links(["#about", "#work", "#contact", "https://example.com"])
                .build(),
        );
        let sync = NavSync::new(page.clone(), ids(&["about", "work", "contact"]));
        (page, sync)
    }

    #[test]
    fn test_highest_ratio_wins() {
        let (page, mut sync) = nav();
        sync.on_intersections(&[
            IntersectionEntry::new("about", true, 0.3),
            IntersectionEntry::new("work", true, 0.5),
        ]);
        assert_eq!(sync.active(), Some("work"));
        assert_eq!(page.snapshot().active_links(), vec!["#work"]);
    }

    #[test]
    fn test_non_intersecting_entries_ignored() {
        let (_page, mut sync) = nav();
        sync.on_intersections(&[
            IntersectionEntry::new("about", false, 0.9),
            IntersectionEntry::new("contact", true, 0.2),
        ]);
        assert_eq!(sync.active(), Some("contact"));
    }

    #[test]
    fn test_nothing_intersecting_keeps_previous() {
        let (page, mut sync) = nav();
        sync.on_intersections(&[IntersectionEntry::new("about", true, 0.6)]);
        sync.on_intersections(&[
            IntersectionEntry::new("about", false, 0.0),
            IntersectionEntry::new("work", false, 0.0),
        ]);
        sync.on_intersections(&[]);
        assert_eq!(sync.active(), Some("about"));
        assert_eq!(page.snapshot().active_links(), vec!["#about"]);
    }

    #[test]
    fn test_click_overrides_immediately() {
        let (page, mut sync) = nav();
        sync.on_intersections(&[IntersectionEntry::new("about", true, 0.6)]);
        sync.on_link_click("#contact");
        assert_eq!(sync.active(), Some("contact"));
        assert_eq!(page.snapshot().active_links(), vec!["#contact"]);
    }

    #[test]
    fn test_click_on_external_link_ignored() {
        let (_page, mut sync) = nav();
        sync.on_link_click("#work");
        sync.on_link_click("https://example.com");
        assert_eq!(sync.active(), Some("work"));
    }

    #[test]
    fn test_disabled_without_sections() {
        let page = Arc::new(MemoryPage::builder().links(["#about"]).build());
        let mut sync = NavSync::new(page.clone(), Vec::new());
        assert!(!sync.is_enabled());
        sync.on_link_click("#about");
        assert!(page.snapshot().active_links().is_empty());
    }

    #[test]
    fn test_observer_root_band() {
        let opts = ObserverOptions::from_config(&Config::default());
        let root = opts.root(1000.0);
        assert!((root.top - 350.0).abs() < 1e-9);
        assert!((root.bottom - 450.0).abs() < 1e-9);
    }

    #[test]
    fn test_observer_reports_first_then_only_crossings() {
        let mut obs = Observer::new(ObserverOptions::from_config(&Config::default()));
        // Root band is [350, 450] on a 1000px viewport.
        let sections = vec![
            ("about".to_string(), Rect::new(300.0, 400.0)), // 50/100 inside
            ("work".to_string(), Rect::new(900.0, 1400.0)), // outside
        ];
        let first = obs.observe(1000.0, &sections);
        assert_eq!(first.len(), 2);
        assert!(first[0].is_intersecting);
        assert!((first[0].ratio - 0.5).abs() < 1e-9);
        assert!(!first[1].is_intersecting);

        // Same bucket (0.4..0.6): nothing new.
        let nudged = vec![
            ("about".to_string(), Rect::new(305.0, 405.0)),
            ("work".to_string(), Rect::new(890.0, 1390.0)),
        ];
        assert!(obs.observe(1000.0, &nudged).is_empty());

        // Fully inside the band crosses 0.6.
        let inside = vec![
            ("about".to_string(), Rect::new(360.0, 440.0)),
            ("work".to_string(), Rect::new(890.0, 1390.0)),
        ];
        let crossed = obs.observe(1000.0, &inside);
        assert_eq!(crossed.len(), 1);
        assert_eq!(crossed[0].section_id, "about");
        assert!((crossed[0].ratio - 1.0).abs() < 1e-9);
    }
}

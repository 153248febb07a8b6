use anyhow::{bail, Context, Result};
use serde::Serialize;

pub const DEFAULT_FEED_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vTf9LEUBGvKLUj21scsKLQtDQ-ucL0RccRz-eNfB76MNM2U_hz-RuJe3reKNU22XtR-8xX8HpC63ol3/pub?gid=663029337&single=true&output=csv";

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub feed_url: String,
    pub poll_secs: u64,
    pub request_timeout_secs: u64,
    /// Scroll offset that reveals the page when there is no hero element.
    pub scroll_fallback_px: f64,
    /// Fraction of the hero height its bottom edge must pass to reveal content.
    pub reveal_ratio: f64,
    pub period_min_secs: f64,
    pub period_max_secs: f64,
    /// Fractions of viewport height excluded from the observation root.
    pub nav_margin_top: f64,
    pub nav_margin_bottom: f64,
    pub nav_thresholds: Vec<f64>,
    pub reject_non_positive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            poll_secs: 30,
            request_timeout_secs: 10,
            scroll_fallback_px: 10.0,
            reveal_ratio: 0.5,
            period_min_secs: 0.4,
            period_max_secs: 2.0,
            nav_margin_top: 0.35,
            nav_margin_bottom: 0.55,
            nav_thresholds: vec![0.2, 0.4, 0.6],
            reject_non_positive: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            feed_url: std::env::var("FEED_URL").unwrap_or(d.feed_url),
            poll_secs: std::env::var("POLL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.poll_secs),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.request_timeout_secs),
            scroll_fallback_px: std::env::var("SCROLL_FALLBACK_PX").ok().and_then(|v| v.parse().ok()).unwrap_or(d.scroll_fallback_px),
            reveal_ratio: std::env::var("REVEAL_RATIO").ok().and_then(|v| v.parse().ok()).unwrap_or(d.reveal_ratio),
            period_min_secs: std::env::var("PERIOD_MIN_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.period_min_secs),
            period_max_secs: std::env::var("PERIOD_MAX_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.period_max_secs),
            nav_margin_top: std::env::var("NAV_MARGIN_TOP").ok().and_then(|v| v.parse().ok()).unwrap_or(d.nav_margin_top),
            nav_margin_bottom: std::env::var("NAV_MARGIN_BOTTOM").ok().and_then(|v| v.parse().ok()).unwrap_or(d.nav_margin_bottom),
            nav_thresholds: std::env::var("NAV_THRESHOLDS").ok().and_then(|v| parse_thresholds(&v)).unwrap_or(d.nav_thresholds),
            reject_non_positive: std::env::var("REJECT_NON_POSITIVE").map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")).unwrap_or(d.reject_non_positive),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.feed_url)
            .with_context(|| format!("invalid FEED_URL {:?}", self.feed_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("feed url must be http(s), got {}", url.scheme());
        }
        if self.poll_secs == 0 {
            bail!("poll interval must be positive");
        }
        if !(self.period_min_secs > 0.0 && self.period_min_secs <= self.period_max_secs) {
            bail!(
                "invalid animation period range [{}, {}]",
                self.period_min_secs,
                self.period_max_secs
            );
        }
        if self.nav_margin_top < 0.0
            || self.nav_margin_bottom < 0.0
            || self.nav_margin_top + self.nav_margin_bottom >= 1.0
        {
            bail!("nav margins leave no observation band");
        }
        if self.nav_thresholds.iter().any(|t| !(0.0..=1.0).contains(t)) {
            bail!("nav thresholds must lie in [0, 1]");
        }
        Ok(())
    }
}

/// Parses "0.2,0.4,0.6" into a sorted threshold list.
fn parse_thresholds(raw: &str) -> Option<Vec<f64>> {
    let mut out = raw
        .split(',')
        .map(|s| s.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    if out.is_empty() {
        return None;
    }
    out.sort_by(|a, b| a.total_cmp(b));
    Some(out)
}

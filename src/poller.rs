use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::Config;
use crate::feed::FeedSource;
use crate::logging::{log_poll_cycle, log_status_applied, sample_hash};
use crate::page::StatusSurface;
use crate::status::{accept_reading, animation_period, format_period, parse_reading, StatusBand};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub every: Duration,
    pub period_min_secs: f64,
    pub period_max_secs: f64,
    pub reject_non_positive: bool,
}

impl PollSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            every: Duration::from_secs(cfg.poll_secs),
            period_min_secs: cfg.period_min_secs,
            period_max_secs: cfg.period_max_secs,
            reject_non_positive: cfg.reject_non_positive,
        }
    }
}

/// What one successful cycle wrote to the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub reading: f64,
    pub band: StatusBand,
    pub message: String,
    /// `None` when the beat duration was left untouched.
    pub period_secs: Option<f64>,
}

/// Drives fetch -> parse -> classify -> apply on a fixed schedule.
#[derive(Clone)]
pub struct Poller {
    feed: Arc<dyn FeedSource>,
    surface: Arc<dyn StatusSurface>,
    settings: PollSettings,
    cycles: Arc<AtomicU64>,
}

impl Poller {
    pub fn new(
        feed: Arc<dyn FeedSource>,
        surface: Arc<dyn StatusSurface>,
        settings: PollSettings,
    ) -> Self {
        Self {
            feed,
            surface,
            settings,
            cycles: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// One poll cycle. Any failure leaves the page as it was.
    pub async fn run_cycle(&self) -> Option<StatusUpdate> {
        if self.surface.status_targets() == 0 {
            return None;
        }
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(sample) = self.feed.fetch().await else {
            log_poll_cycle(cycle, "no_data", None, None);
            return None;
        };
        let hash = sample_hash(&sample);
        let Some(reading) = parse_reading(&sample)
            .and_then(|bpm| accept_reading(bpm, self.settings.reject_non_positive))
        else {
            log_poll_cycle(cycle, "unparsable", None, Some(&hash));
            return None;
        };
        log_poll_cycle(cycle, "reading", Some(reading), Some(&hash));

        let update = self.apply(reading);
        log_status_applied(
            update.band.as_str(),
            &update.message,
            update.period_secs,
            self.surface.status_targets(),
        );
        Some(update)
    }

    fn apply(&self, reading: f64) -> StatusUpdate {
        let band = StatusBand::for_reading(reading);
        let message = band.message(reading);
        self.surface.set_status_text(&message);

        let period_secs = animation_period(
            Some(reading),
            self.settings.period_min_secs,
            self.settings.period_max_secs,
        );
        if let Some(secs) = period_secs {
            self.surface.set_beat_duration(&format_period(secs));
        }
        StatusUpdate {
            reading,
            band,
            message,
            period_secs,
        }
    }

    /// Polls now, then every `settings.every`. Cycles are not serialized:
    /// a slow fetch may overlap the next tick and the last write wins.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.settings.every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let poller = self.clone();
                tokio::spawn(async move {
                    poller.run_cycle().await;
                });
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{MemoryPage, FALLBACK_STATUS};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct ScriptedFeed {
        samples: Mutex<VecDeque<Option<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFeed {
        fn new(samples: &[Option<&str>]) -> Self {
            Self {
                samples: Mutex::new(samples.iter().map(|s| s.map(str::to_string)).collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FeedSource for ScriptedFeed {
        async fn fetch(&self) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.samples.lock().unwrap().pop_front().flatten()
        }
    }

    fn settings() -> PollSettings {
        PollSettings::from_config(&Config::default())
    }

    #[tokio::test]
    async fn test_cycle_applies_status_and_period() {
        let feed = Arc::new(ScriptedFeed::new(&[Some("2024-01-01,45")]));
        let page = Arc::new(MemoryPage::builder().status_elements(2).heartbeats(1).build());
        let poller = Poller::new(feed, page.clone(), settings());

        let update = poller.run_cycle().await.unwrap();
        assert_eq!(update.band, StatusBand::BorderlineLow);
        assert!((update.period_secs.unwrap() - 60.0 / 45.0).abs() < 1e-9);

        let s = page.snapshot();
        assert!(s.status_texts.iter().all(|t| t.contains("45")));
        assert_eq!(s.beat_durations, vec![Some("1.33s".to_string())]);
    }

    #[tokio::test]
    async fn test_failures_keep_previous_status() {
        let feed = Arc::new(ScriptedFeed::new(&[
            Some("x,72"),
            None,
            Some(""),
            Some("date,bpm"),
        ]));
        let page = Arc::new(MemoryPage::builder().status_elements(1).heartbeats(1).build());
        let poller = Poller::new(feed, page.clone(), settings());

        assert!(poller.run_cycle().await.is_some());
        let before = page.snapshot();
        for _ in 0..3 {
            assert!(poller.run_cycle().await.is_none());
        }
        assert_eq!(page.snapshot(), before);
        assert_eq!(poller.cycles(), 4);
    }

    #[tokio::test]
    async fn test_no_status_element_skips_fetch() {
        let feed = Arc::new(ScriptedFeed::new(&[Some("x,72")]));
        let page = Arc::new(MemoryPage::builder().heartbeats(1).build());
        let poller = Poller::new(feed.clone(), page, settings());
        assert!(poller.run_cycle().await.is_none());
        assert_eq!(feed.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_reading_rejected_by_default() {
        let feed = Arc::new(ScriptedFeed::new(&[Some("x,0")]));
        let page = Arc::new(MemoryPage::builder().status_elements(1).build());
        let poller = Poller::new(feed, page.clone(), settings());
        assert!(poller.run_cycle().await.is_none());
        assert_eq!(page.snapshot().status_texts, vec![FALLBACK_STATUS]);
    }

    #[tokio::test]
    async fn test_zero_reading_passes_through_when_allowed() {
        let feed = Arc::new(ScriptedFeed::new(&[Some("x,0")]));
        let page = Arc::new(MemoryPage::builder().status_elements(1).heartbeats(1).build());
        let poller = Poller::new(
            feed,
            page.clone(),
            PollSettings {
                reject_non_positive: false,
                ..settings()
            },
        );
        let update = poller.run_cycle().await.unwrap();
        assert_eq!(update.band, StatusBand::CriticalLow);
        assert_eq!(update.period_secs, None);
        assert_eq!(page.snapshot().beat_durations, vec![None]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_polls_immediately_then_on_interval() {
        let feed = Arc::new(ScriptedFeed::new(&[
            Some("x,55"),
            Some("x,95"),
            Some("x,80"),
        ]));
        let page = Arc::new(MemoryPage::builder().status_elements(1).build());
        let handle = Poller::new(feed.clone(), page.clone(), settings()).spawn();

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
        assert!(page.snapshot().status_texts[0].contains("Asleep"));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);
        assert!(page.snapshot().status_texts[0].contains("chickens"));

        handle.abort();
    }
}

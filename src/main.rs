use std::sync::Arc;

use anyhow::Result;
use lifepulse::config::Config;
use lifepulse::feed::HttpFeed;
use lifepulse::logging::{log, obj, Domain, Level};
use lifepulse::page::MemoryPage;
use lifepulse::site::{Site, SiteLayout};

const SECTIONS: &[&str] = &["about", "work", "gallery", "contact"];
const TRIGGERS: &[&str] = &["life-bar-chip", "life-pill"];

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    cfg.validate()?;
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[("config", serde_json::to_value(&cfg)?)]),
    );

    let feed = Arc::new(HttpFeed::from_config(&cfg)?);
    let page = Arc::new(
        MemoryPage::builder()
            .status_elements(1)
            .heartbeats(1)
            .links(SECTIONS.iter().map(|s| format!("#{}", s)))
            .modal()
            .build(),
    );
    let layout = SiteLayout::new(TRIGGERS.iter().copied(), SECTIONS.iter().copied());
    let mut site = Site::new(&cfg, page.clone(), feed, layout);

    let poll = site.start(None, 0.0);
    tokio::signal::ctrl_c().await?;
    poll.abort();

    log(
        Level::Info,
        Domain::System,
        "shutdown",
        obj(&[
            ("cycles", serde_json::json!(site.poller().cycles())),
            ("page", serde_json::to_value(page.snapshot())?),
        ]),
    );
    Ok(())
}

pub mod config;
pub mod feed;
pub mod logging;
pub mod modal;
pub mod nav;
pub mod page;
pub mod poller;
pub mod reveal;
pub mod site;
pub mod status;

pub mod config;
pub mod error;
pub mod gateway;
pub mod routes;
pub mod scrape;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use config::Config;
use gateway::fanout::BroadcastHub;
use scrape::PageScraper;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<BroadcastHub>,
    pub config: Arc<Config>,
    pub scraper: Arc<dyn PageScraper>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, scraper: Arc<dyn PageScraper>) -> Self {
        let hub = BroadcastHub::new(config.queue_capacity, config.backpressure);
        Self {
            hub: Arc::new(hub),
            config: Arc::new(config),
            scraper,
            started_at: Utc::now(),
        }
    }
}

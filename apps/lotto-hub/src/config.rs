use std::time::Duration;

use crate::gateway::fanout::Backpressure;
use crate::scrape::CrawlTarget;

const DEFAULT_CRAWL_URL: &str = "https://dhlottery.co.kr/gameResult.do?method=byWin";
const DEFAULT_CRAWL_SELECTOR: &str = "div.win_result";

/// Hub configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Period of the value-set producer.
    pub broadcast_interval: Duration,
    /// Maximum number of value sets waiting for dispatch.
    pub queue_capacity: usize,
    /// Policy applied when the broadcast queue is full.
    pub backpressure: Backpressure,
    /// Per-connection outbound queue length. A client this far behind is dropped.
    pub send_buffer: usize,
    /// Deadline for writing one frame to a client socket.
    pub write_timeout: Duration,
    /// Page scraped on a `crawl` request.
    pub crawl: CrawlTarget,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            broadcast_interval: Duration::from_secs(60),
            queue_capacity: 10,
            backpressure: Backpressure::DropOldest,
            send_buffer: 16,
            write_timeout: Duration::from_secs(10),
            crawl: CrawlTarget {
                url: DEFAULT_CRAWL_URL.to_string(),
                selector: DEFAULT_CRAWL_SELECTOR.to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let enqueue_timeout = Duration::from_millis(parsed_var("ENQUEUE_TIMEOUT_MS").unwrap_or(1000));

        Self {
            port: parsed_var("PORT").unwrap_or(defaults.port),
            broadcast_interval: parsed_var("BROADCAST_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.broadcast_interval),
            queue_capacity: parsed_var::<usize>("QUEUE_CAPACITY")
                .unwrap_or(defaults.queue_capacity)
                .max(1),
            backpressure: std::env::var("BACKPRESSURE")
                .ok()
                .and_then(|mode| parse_backpressure(&mode, enqueue_timeout))
                .unwrap_or(defaults.backpressure),
            send_buffer: parsed_var::<usize>("SEND_BUFFER")
                .unwrap_or(defaults.send_buffer)
                .max(1),
            write_timeout: parsed_var("WRITE_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.write_timeout),
            crawl: CrawlTarget {
                url: non_empty_var("CRAWL_URL").unwrap_or(defaults.crawl.url),
                selector: non_empty_var("CRAWL_SELECTOR").unwrap_or(defaults.crawl.selector),
            },
        }
    }
}

/// `drop-oldest` or `block`; anything else is rejected.
pub fn parse_backpressure(mode: &str, timeout: Duration) -> Option<Backpressure> {
    match mode.trim().to_ascii_lowercase().as_str() {
        "drop-oldest" | "drop_oldest" => Some(Backpressure::DropOldest),
        "block" => Some(Backpressure::Block { timeout }),
        _ => None,
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

pub mod cli;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod manager;
pub mod pipeline;
pub mod readability;
pub mod record;
pub mod sitemap;

pub use cli::{handle_command, CrawlArgs};
pub use config::{CrawlConfig, CrawlConfigBuilder, ExtractionConfig};
pub use fetch::{Fetcher, HttpFetcher};
pub use logging::{init_logging, Logger};
pub use manager::{CrawlManager, CrawlReport};
pub use pipeline::{AbandonReason, Outcome, Pipeline, Task};

pub mod prelude {
    pub use super::fetch::Fetcher;
    pub use super::pipeline::{Outcome, Task};
    pub use ns_core::{ArticleRecord, Error, Result};
}

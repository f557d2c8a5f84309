use clap::Args;
use ns_core::{ArticleStorage, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CrawlConfig, DEFAULT_SITEMAP_URL};
use crate::logging::Logger;
use crate::manager::{CrawlManager, CrawlReport};

#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Sitemap index to start from
    #[arg(long, default_value = DEFAULT_SITEMAP_URL)]
    pub sitemap_url: String,

    /// Host the crawl may fetch from (repeatable)
    #[arg(long = "allowed-domain", default_values_t = vec!["www.bbc.com".to_string()])]
    pub allowed_domains: Vec<String>,

    /// Maximum number of requests in flight
    #[arg(long, default_value_t = 16)]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Store records without a readability score
    #[arg(long)]
    pub no_readability: bool,
}

impl CrawlArgs {
    pub fn to_config(&self) -> CrawlConfig {
        CrawlConfig::builder()
            .sitemap_url(self.sitemap_url.clone())
            .allowed_domains(self.allowed_domains.clone())
            .concurrency(self.concurrency)
            .request_timeout(Duration::from_secs(self.timeout_secs))
            .score_readability(!self.no_readability)
            .build()
    }
}

/// Runs one crawl over HTTP into `storage`.
pub async fn handle_command(
    args: &CrawlArgs,
    storage: Arc<dyn ArticleStorage>,
    logger: &Logger,
) -> Result<CrawlReport> {
    let manager = CrawlManager::with_http(args.to_config(), storage, logger)?;
    manager.run().await
}

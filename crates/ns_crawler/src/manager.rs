use futures::stream::{FuturesUnordered, StreamExt};
use ns_core::{ArticleStorage, Result};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::config::CrawlConfig;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::logging::Logger;
use crate::pipeline::{AbandonReason, Outcome, Pipeline, Task};

/// Totals of one crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Child sitemaps discovered in the index
    pub sitemaps: usize,
    /// Qualified news entries discovered in child sitemaps
    pub candidates: usize,
    pub persisted: usize,
    pub abandoned: usize,
    /// URLs dropped for being outside the allowed domains
    pub offsite: usize,
    /// URLs dropped for having been queued earlier in the same crawl
    pub duplicates: usize,
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sitemaps, {} candidates, {} persisted, {} abandoned, {} offsite, {} duplicates",
            self.sitemaps,
            self.candidates,
            self.persisted,
            self.abandoned,
            self.offsite,
            self.duplicates
        )
    }
}

/// Runs crawls: a queue of tasks drained by at most `concurrency` fetches at
/// a time, each fetched body handed to the [`Pipeline`].
pub struct CrawlManager {
    config: CrawlConfig,
    fetcher: Arc<dyn Fetcher>,
    storage: Arc<dyn ArticleStorage>,
    pipeline: Pipeline,
    logger: Logger,
}

impl CrawlManager {
    pub fn new(
        config: CrawlConfig,
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<dyn ArticleStorage>,
        logger: &Logger,
    ) -> Self {
        let logger = logger.child("crawl");
        Self {
            pipeline: Pipeline::new(&config, &logger),
            config,
            fetcher,
            storage,
            logger,
        }
    }

    /// A manager fetching over HTTP.
    pub fn with_http(
        config: CrawlConfig,
        storage: Arc<dyn ArticleStorage>,
        logger: &Logger,
    ) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        Ok(Self::new(config, fetcher, storage, logger))
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawls from the configured sitemap index until no task is left.
    ///
    /// Each URL is queued at most once per crawl; later sightings are
    /// counted as duplicates. Failures of single URLs are counted and
    /// logged, never returned.
    /// Records are stored as soon as they are built, so a crawl dropped
    /// halfway keeps everything persisted so far.
    pub async fn run(&self) -> Result<CrawlReport> {
        let mut report = CrawlReport::default();
        let mut queue = VecDeque::from([Task::SitemapIndex(self.config.sitemap_url.clone())]);
        let mut seen = HashSet::from([self.config.sitemap_url.clone()]);
        let mut in_flight = FuturesUnordered::new();

        self.logger
            .info(&format!("Starting crawl at {}", self.config.sitemap_url));

        loop {
            while in_flight.len() < self.config.concurrency {
                let Some(task) = queue.pop_front() else {
                    break;
                };
                if !self.config.allows(task.url()) {
                    self.logger
                        .debug(&format!("Filtered offsite request to {}", task.url()));
                    report.offsite += 1;
                    continue;
                }
                in_flight.push(self.process(task));
            }

            let Some((task, outcome)) = in_flight.next().await else {
                break;
            };

            match outcome {
                Outcome::Dispatch(tasks) => {
                    for next in tasks {
                        if !seen.insert(next.url().to_string()) {
                            self.logger
                                .debug(&format!("Filtered duplicate request to {}", next.url()));
                            report.duplicates += 1;
                            continue;
                        }
                        match next {
                            Task::NewsSitemap(_) => report.sitemaps += 1,
                            Task::Article(_) => report.candidates += 1,
                            Task::SitemapIndex(_) => {}
                        }
                        queue.push_back(next);
                    }
                }
                Outcome::Persist(record) => {
                    self.logger.debug(&format!("Stored {}", record.url));
                    report.persisted += 1;
                }
                Outcome::Abandon(reason) => {
                    if !matches!(reason, AbandonReason::ArticleNotFound | AbandonReason::ArticleEmpty) {
                        self.logger
                            .warn(&format!("Abandoned {} {}: {}", task.stage(), task.url(), reason));
                    }
                    report.abandoned += 1;
                }
            }
        }

        self.logger.info(&format!("Crawl finished: {}", report));
        Ok(report)
    }

    /// Fetches `task`, runs its stage and stores a resulting record.
    async fn process(&self, task: Task) -> (Task, Outcome) {
        let body = match self.fetcher.fetch(task.url()).await {
            Ok(body) => body,
            Err(e) => {
                return (task, Outcome::Abandon(AbandonReason::FetchFailed(e.to_string())));
            }
        };

        let outcome = match self.pipeline.handle(&task, &body) {
            Outcome::Persist(record) => match self.storage.upsert(&record).await {
                Ok(()) => Outcome::Persist(record),
                Err(e) => Outcome::Abandon(AbandonReason::StoreFailed(e.to_string())),
            },
            other => other,
        };
        (task, outcome)
    }
}

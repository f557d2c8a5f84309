//! Stage dispatch: one fetched document in, the next step out.
//!
//! A crawl moves every URL through `sitemap index -> news sitemap -> article`
//! and ends it either persisted or abandoned. [`Pipeline::handle`] does no
//! I/O; fetching, queueing and storing belong to the crawl manager.

use crate::config::CrawlConfig;
use crate::extract::ArticleExtractor;
use crate::logging::Logger;
use crate::readability::ReadabilityScorer;
use crate::record::build_record;
use crate::sitemap::{parse_news_sitemap, parse_sitemap_index};
use ns_core::{ArticleRecord, NewsCandidate, SitemapEntry};
use thiserror::Error;

/// A URL waiting to be fetched, tagged with the stage that handles its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    SitemapIndex(String),
    NewsSitemap(SitemapEntry),
    Article(NewsCandidate),
}

impl Task {
    pub fn url(&self) -> &str {
        match self {
            Task::SitemapIndex(url) => url,
            Task::NewsSitemap(entry) => &entry.url,
            Task::Article(candidate) => &candidate.url,
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Task::SitemapIndex(_) => "index",
            Task::NewsSitemap(_) => "sitemap",
            Task::Article(_) => "article",
        }
    }
}

/// Why a URL ended without a stored record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbandonReason {
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("article not found")]
    ArticleNotFound,

    #[error("article empty")]
    ArticleEmpty,

    #[error("store failed: {0}")]
    StoreFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Further URLs to fetch, in document order.
    Dispatch(Vec<Task>),
    /// A record ready for the store.
    Persist(ArticleRecord),
    Abandon(AbandonReason),
}

pub struct Pipeline {
    extractor: ArticleExtractor,
    scorer: Option<ReadabilityScorer>,
    logger: Logger,
}

impl Pipeline {
    pub fn new(config: &CrawlConfig, logger: &Logger) -> Self {
        Self {
            extractor: ArticleExtractor::new(config.extraction.clone()),
            scorer: config.score_readability.then(ReadabilityScorer::new),
            logger: logger.child("pipeline"),
        }
    }

    /// Runs the stage for `task` over its fetched `body`.
    pub fn handle(&self, task: &Task, body: &str) -> Outcome {
        match task {
            Task::SitemapIndex(url) => Outcome::Dispatch(self.sitemap_index(url, body)),
            Task::NewsSitemap(entry) => Outcome::Dispatch(self.news_sitemap(&entry.url, body)),
            Task::Article(candidate) => self.article(candidate, body),
        }
    }

    fn sitemap_index(&self, url: &str, body: &str) -> Vec<Task> {
        let mut tasks = Vec::new();
        for entry in parse_sitemap_index(body) {
            match entry {
                Ok(entry) => tasks.push(Task::NewsSitemap(entry)),
                Err(e) => self
                    .logger
                    .warn(&format!("Sitemap index {} is malformed: {}", url, e)),
            }
        }
        self.logger
            .debug(&format!("{} child sitemaps in {}", tasks.len(), url));
        tasks
    }

    fn news_sitemap(&self, url: &str, body: &str) -> Vec<Task> {
        let mut tasks = Vec::new();
        for candidate in parse_news_sitemap(body) {
            match candidate {
                Ok(candidate) => tasks.push(Task::Article(candidate)),
                Err(e) => self
                    .logger
                    .warn(&format!("Skipping entry in {}: {}", url, e)),
            }
        }
        self.logger
            .debug(&format!("{} news candidates in {}", tasks.len(), url));
        tasks
    }

    fn article(&self, candidate: &NewsCandidate, body: &str) -> Outcome {
        match build_record(candidate.clone(), body, &self.extractor, self.scorer.as_ref()) {
            Ok(record) => Outcome::Persist(record),
            Err(reason) => {
                self.logger
                    .warn(&format!("{}. Url: {}", capitalize(&reason.to_string()), candidate.url));
                Outcome::Abandon(reason)
            }
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Layout of `<news:publication_date>` values accepted by the news sitemap parser.
pub const PUBLICATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Hard cap on the number of records a single query may return.
pub const MAX_QUERY_LIMIT: usize = 100;

/// A child sitemap referenced from the sitemap index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub url: String,
}

impl SitemapEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// An English news entry from a child sitemap, carried forward to the article fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsCandidate {
    pub url: String,
    pub title: String,
    pub publication_date: DateTime<Utc>,
}

impl NewsCandidate {
    /// Builds a candidate, parsing `publication_date` with [`PUBLICATION_DATE_FORMAT`].
    pub fn parse(
        url: impl Into<String>,
        title: impl Into<String>,
        publication_date: &str,
    ) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            title: title.into(),
            publication_date: parse_publication_date(publication_date)?,
        })
    }
}

pub fn parse_publication_date(value: &str) -> Result<DateTime<Utc>> {
    Ok(NaiveDateTime::parse_from_str(value, PUBLICATION_DATE_FORMAT)?.and_utc())
}

/// The persisted article. `url` is the identity of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    pub publication_date: DateTime<Utc>,
    pub article: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readability: Option<f64>,
}

impl ArticleRecord {
    pub fn from_candidate(
        candidate: NewsCandidate,
        article: String,
        keywords: Vec<String>,
        readability: Option<f64>,
    ) -> Self {
        Self {
            url: candidate.url,
            title: candidate.title,
            publication_date: candidate.publication_date,
            article,
            keywords,
            readability,
        }
    }
}

/// How a keyword filter is applied to a record's keyword list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordMatch {
    /// At least one requested keyword must be present.
    #[default]
    Any,
    /// Every requested keyword must be present.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub text: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub keyword_match: KeywordMatch,
    pub limit: usize,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            text: None,
            keywords: None,
            keyword_match: KeywordMatch::Any,
            limit: MAX_QUERY_LIMIT,
        }
    }
}

impl NewsQuery {
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_keyword_match(mut self, keyword_match: KeywordMatch) -> Self {
        self.keyword_match = keyword_match;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether a record tagged with `keywords` passes the keyword filter.
    /// Without a filter every record passes; an empty filter matches nothing.
    pub fn matches_keywords(&self, keywords: &[String]) -> bool {
        let Some(wanted) = &self.keywords else {
            return true;
        };
        if wanted.is_empty() {
            return false;
        }
        match self.keyword_match {
            KeywordMatch::Any => wanted.iter().any(|k| keywords.contains(k)),
            KeywordMatch::All => wanted.iter().all(|k| keywords.contains(k)),
        }
    }

    /// Lowercased alphanumeric terms of the full-text search, if any.
    pub fn text_terms(&self) -> Option<Vec<String>> {
        self.text.as_deref().map(tokenize)
    }
}

/// Splits text into lowercase alphanumeric terms.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

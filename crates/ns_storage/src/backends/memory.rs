use async_trait::async_trait;
use ns_core::types::tokenize;
use ns_core::{ArticleRecord, ArticleStorage, NewsQuery, Result};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::StorageBackend;

#[derive(Default)]
pub struct MemoryStore {
    articles: HashMap<String, ArticleRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, record: &ArticleRecord) {
        self.articles.insert(record.url.clone(), record.clone());
    }

    /// Term-frequency relevance of `record` for the search terms; zero means no match.
    fn relevance(record: &ArticleRecord, terms: &[String]) -> usize {
        let words = tokenize(&record.article);
        terms
            .iter()
            .map(|term| words.iter().filter(|w| *w == term).count())
            .sum()
    }

    pub fn query(&self, query: &NewsQuery) -> Vec<ArticleRecord> {
        let terms = query.text_terms();
        let mut hits: Vec<(usize, &ArticleRecord)> = self
            .articles
            .values()
            .filter(|record| query.matches_keywords(&record.keywords))
            .filter_map(|record| match &terms {
                Some(terms) => match Self::relevance(record, terms) {
                    0 => None,
                    score => Some((score, record)),
                },
                None => Some((0, record)),
            })
            .collect();

        hits.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .cmp(score_a)
                .then_with(|| b.publication_date.cmp(&a.publication_date))
                .then_with(|| a.url.cmp(&b.url))
        });

        hits.into_iter()
            .take(query.limit)
            .map(|(_, record)| record.clone())
            .collect()
    }

    pub fn distinct_keywords(&self) -> Vec<String> {
        self.articles
            .values()
            .flat_map(|record| record.keywords.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn clear(&mut self) {
        self.articles.clear();
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Process-local storage. Records live as long as the value does.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn new(_location: Option<&str>) -> Result<Self> {
        Ok(InMemoryStorage::new())
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, record: &ArticleRecord) -> Result<()> {
        self.store.write().await.upsert(record);
        Ok(())
    }

    async fn query(&self, query: &NewsQuery) -> Result<Vec<ArticleRecord>> {
        Ok(self.store.read().await.query(query))
    }

    async fn distinct_keywords(&self) -> Result<Vec<String>> {
        Ok(self.store.read().await.distinct_keywords())
    }

    async fn drop_all(&self) -> Result<()> {
        self.store.write().await.clear();
        Ok(())
    }

    async fn clear_content(&self) -> Result<()> {
        self.store.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ns_core::KeywordMatch;

    fn record(url: &str, day: u32, article: &str, keywords: &[&str]) -> ArticleRecord {
        ArticleRecord {
            url: url.to_string(),
            title: format!("Title of {}", url),
            publication_date: Utc.with_ymd_and_hms(2020, 11, day, 12, 0, 0).unwrap(),
            article: article.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            readability: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_url() {
        let storage = InMemoryStorage::new();
        storage
            .upsert(&record("http://test.com/a", 1, "First version", &["One"]))
            .await
            .unwrap();
        storage
            .upsert(&record("http://test.com/a", 1, "Second version", &["Two"]))
            .await
            .unwrap();

        assert_eq!(storage.len().await, 1);
        let stored = storage.query(&NewsQuery::default()).await.unwrap();
        assert_eq!(stored[0].article, "Second version");
        assert_eq!(storage.distinct_keywords().await.unwrap(), vec!["Two"]);
    }

    #[tokio::test]
    async fn test_keyword_query() {
        let storage = InMemoryStorage::new();
        storage
            .upsert(&record("http://test.com/ms", 30, "Patent story", &["Microsoft", "Patents"]))
            .await
            .unwrap();
        storage
            .upsert(&record("http://test.com/snooker", 29, "Snooker story", &["Snooker"]))
            .await
            .unwrap();

        let found = storage
            .query(&NewsQuery::default().with_keywords(["Microsoft"]).with_limit(100))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "http://test.com/ms");

        let none = storage
            .query(&NewsQuery::default().with_keywords(["Nonexistent"]))
            .await
            .unwrap();
        assert!(none.is_empty());

        let all = storage
            .query(
                &NewsQuery::default()
                    .with_keywords(["Microsoft", "Snooker"])
                    .with_keyword_match(KeywordMatch::All),
            )
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_text_query_orders_by_relevance() {
        let storage = InMemoryStorage::new();
        storage
            .upsert(&record("http://test.com/1", 1, "patent office", &[]))
            .await
            .unwrap();
        storage
            .upsert(&record("http://test.com/2", 2, "patent patent patent", &[]))
            .await
            .unwrap();
        storage
            .upsert(&record("http://test.com/3", 3, "snooker results", &[]))
            .await
            .unwrap();

        let found = storage
            .query(&NewsQuery::default().with_text("Patent"))
            .await
            .unwrap();
        let urls: Vec<&str> = found.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["http://test.com/2", "http://test.com/1"]);

        let limited = storage
            .query(&NewsQuery::default().with_limit(2))
            .await
            .unwrap();
        let urls: Vec<&str> = limited.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["http://test.com/3", "http://test.com/2"]);
    }

    #[tokio::test]
    async fn test_clear_content() {
        let storage = InMemoryStorage::new();
        storage
            .upsert(&record("http://test.com/a", 1, "Body", &["One"]))
            .await
            .unwrap();
        storage.clear_content().await.unwrap();
        assert!(storage.is_empty().await);
        assert!(storage.distinct_keywords().await.unwrap().is_empty());
    }
}

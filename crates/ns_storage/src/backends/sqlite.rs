use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use ns_core::{ArticleRecord, ArticleStorage, Error, KeywordMatch, NewsQuery, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use crate::StorageBackend;

const DEFAULT_DB_PATH: &str = "news.db";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS news (
        url TEXT NOT NULL,
        title TEXT NOT NULL,
        publication_date TEXT NOT NULL,
        article TEXT NOT NULL,
        keywords TEXT NOT NULL,
        readability REAL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS news_url ON news (url ASC)",
    "CREATE INDEX IF NOT EXISTS news_publication_date ON news (publication_date ASC)",
    "CREATE INDEX IF NOT EXISTS news_title ON news (title ASC)",
    r#"
    CREATE TABLE IF NOT EXISTS news_keywords (
        url TEXT NOT NULL,
        position INTEGER NOT NULL,
        keyword TEXT NOT NULL,
        PRIMARY KEY (url, position)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS news_keywords_keyword ON news_keywords (keyword ASC)",
    r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS news_fts USING fts5(
        url UNINDEXED,
        article,
        tokenize = 'porter unicode61'
    )
    "#,
];

const DROP: &[&str] = &[
    "DROP TABLE IF EXISTS news_fts",
    "DROP TABLE IF EXISTS news_keywords",
    "DROP TABLE IF EXISTS news",
];

const CLEAR: &[&str] = &[
    "DELETE FROM news_fts",
    "DELETE FROM news_keywords",
    "DELETE FROM news",
];

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> Error {
    move |e| Error::Database(format!("{}: {}", context, e))
}

/// FTS5 expression matching any of the terms, or `None` when there is nothing to search for.
fn fts_expression(terms: &[String]) -> Option<String> {
    if terms.is_empty() {
        return None;
    }
    Some(
        terms
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}

fn record_from_row(row: &SqliteRow) -> Result<ArticleRecord> {
    let publication_date: String = row
        .try_get("publication_date")
        .map_err(db_error("Failed to read publication_date"))?;
    let keywords: String = row
        .try_get("keywords")
        .map_err(db_error("Failed to read keywords"))?;

    Ok(ArticleRecord {
        url: row.try_get("url").map_err(db_error("Failed to read url"))?,
        title: row.try_get("title").map_err(db_error("Failed to read title"))?,
        publication_date: DateTime::parse_from_rfc3339(&publication_date)
            .map_err(|e| Error::Database(format!("Failed to parse date: {}", e)))?
            .with_timezone(&Utc),
        article: row
            .try_get("article")
            .map_err(db_error("Failed to read article"))?,
        keywords: serde_json::from_str(&keywords)?,
        readability: row
            .try_get::<Option<f64>, _>("readability")
            .map_err(db_error("Failed to read readability"))?,
    })
}

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be writable at the configured path"
    }

    async fn new(location: Option<&str>) -> Result<Self> {
        let db_path = PathBuf::from(location.unwrap_or(DEFAULT_DB_PATH));
        Self::new_with_path(&db_path).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        let storage = Self {
            pool,
            db_path: db_path.to_path_buf(),
        };
        storage.init().await?;
        Ok(storage)
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn execute_all(&self, statements: &[&str], context: &'static str) -> Result<()> {
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_error(context))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn init(&self) -> Result<()> {
        self.execute_all(SCHEMA, "Failed to create schema").await
    }

    async fn upsert(&self, record: &ArticleRecord) -> Result<()> {
        let keywords = serde_json::to_string(&record.keywords)?;
        let publication_date = record
            .publication_date
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin upsert"))?;

        sqlx::query(
            r#"
            INSERT INTO news (url, title, publication_date, article, keywords, readability)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (url) DO UPDATE SET
                title = excluded.title,
                publication_date = excluded.publication_date,
                article = excluded.article,
                keywords = excluded.keywords,
                readability = excluded.readability
            "#,
        )
        .bind(&record.url)
        .bind(&record.title)
        .bind(&publication_date)
        .bind(&record.article)
        .bind(&keywords)
        .bind(record.readability)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to store article"))?;

        sqlx::query("DELETE FROM news_keywords WHERE url = ?")
            .bind(&record.url)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to replace keywords"))?;

        for (position, keyword) in record.keywords.iter().enumerate() {
            sqlx::query("INSERT INTO news_keywords (url, position, keyword) VALUES (?, ?, ?)")
                .bind(&record.url)
                .bind(position as i64)
                .bind(keyword)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to store keyword"))?;
        }

        sqlx::query("DELETE FROM news_fts WHERE url = ?")
            .bind(&record.url)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to replace search entry"))?;

        sqlx::query("INSERT INTO news_fts (url, article) VALUES (?, ?)")
            .bind(&record.url)
            .bind(&record.article)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to store search entry"))?;

        tx.commit().await.map_err(db_error("Failed to commit upsert"))?;
        debug!("Upserted {}", record.url);
        Ok(())
    }

    async fn query(&self, query: &NewsQuery) -> Result<Vec<ArticleRecord>> {
        let fts = match query.text_terms() {
            Some(terms) => match fts_expression(&terms) {
                Some(expression) => Some(expression),
                None => return Ok(Vec::new()),
            },
            None => None,
        };
        if matches!(&query.keywords, Some(k) if k.is_empty()) || query.limit == 0 {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT n.url, n.title, n.publication_date, n.article, n.keywords, n.readability FROM news n",
        );
        if fts.is_some() {
            builder.push(" JOIN news_fts ON news_fts.url = n.url");
        }
        builder.push(" WHERE 1 = 1");
        if let Some(expression) = &fts {
            builder.push(" AND news_fts MATCH ").push_bind(expression.clone());
        }

        if let Some(keywords) = &query.keywords {
            let wanted: BTreeSet<&String> = keywords.iter().collect();
            match query.keyword_match {
                KeywordMatch::Any => {
                    builder.push(" AND n.url IN (SELECT url FROM news_keywords WHERE keyword IN (");
                }
                KeywordMatch::All => {
                    builder.push(
                        " AND (SELECT COUNT(DISTINCT k.keyword) FROM news_keywords k WHERE k.url = n.url AND k.keyword IN (",
                    );
                }
            }
            {
                let mut separated = builder.separated(", ");
                for keyword in &wanted {
                    separated.push_bind((*keyword).clone());
                }
            }
            match query.keyword_match {
                KeywordMatch::Any => {
                    builder.push("))");
                }
                KeywordMatch::All => {
                    builder.push(")) = ").push_bind(wanted.len() as i64);
                }
            }
        }

        builder.push(" ORDER BY ");
        if fts.is_some() {
            builder.push("bm25(news_fts), ");
        }
        builder.push("n.publication_date DESC, n.url LIMIT ");
        builder.push_bind(query.limit as i64);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to query news"))?;

        rows.iter().map(record_from_row).collect()
    }

    async fn distinct_keywords(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT keyword FROM news_keywords ORDER BY keyword")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list keywords"))?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("keyword").map_err(db_error("Failed to read keyword")))
            .collect()
    }

    async fn drop_all(&self) -> Result<()> {
        self.execute_all(DROP, "Failed to drop tables").await
    }

    async fn clear_content(&self) -> Result<()> {
        self.execute_all(CLEAR, "Failed to delete content").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn record(url: &str, day: u32, article: &str, keywords: &[&str]) -> ArticleRecord {
        ArticleRecord {
            url: url.to_string(),
            title: format!("Title of {}", url),
            publication_date: Utc.with_ymd_and_hms(2020, 11, day, 17, 0, 12).unwrap(),
            article: article.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            readability: Some(52.5),
        }
    }

    #[tokio::test]
    async fn test_sqlite_storage_round_trip() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("test.db"))
            .await
            .unwrap();

        let original = record(
            "https://www.bbc.com/news/technology-55133141",
            30,
            "Microsoft has filed a patent for a meeting scoring system.",
            &["Microsoft", "Patents"],
        );
        storage.upsert(&original).await.unwrap();

        let stored = storage.query(&NewsQuery::default()).await.unwrap();
        assert_eq!(stored, vec![original.clone()]);

        let mut updated = original.clone();
        updated.article = "The patent describes body language analysis.".to_string();
        updated.keywords = vec!["Microsoft".to_string()];
        updated.readability = None;
        storage.upsert(&updated).await.unwrap();

        let stored = storage.query(&NewsQuery::default()).await.unwrap();
        assert_eq!(stored, vec![updated]);
        assert_eq!(storage.distinct_keywords().await.unwrap(), vec!["Microsoft"]);

        let by_text = storage
            .query(&NewsQuery::default().with_text("scoring system"))
            .await
            .unwrap();
        assert!(by_text.is_empty(), "old article text is no longer searchable");
    }

    #[tokio::test]
    async fn test_sqlite_query_filters() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("test.db"))
            .await
            .unwrap();

        storage
            .upsert(&record("http://test.com/ms", 30, "Patents about meetings", &["Microsoft", "Patents"]))
            .await
            .unwrap();
        storage
            .upsert(&record("http://test.com/snooker", 29, "Snooker championship schedule", &["Snooker"]))
            .await
            .unwrap();

        let found = storage
            .query(&NewsQuery::default().with_keywords(["Microsoft"]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "http://test.com/ms");

        let none = storage
            .query(&NewsQuery::default().with_keywords(["Nonexistent"]))
            .await
            .unwrap();
        assert!(none.is_empty());

        let any = storage
            .query(&NewsQuery::default().with_keywords(["Microsoft", "Snooker"]))
            .await
            .unwrap();
        assert_eq!(any.len(), 2);
        assert_eq!(any[0].url, "http://test.com/ms", "newest first");

        let all = storage
            .query(
                &NewsQuery::default()
                    .with_keywords(["Microsoft", "Patents"])
                    .with_keyword_match(KeywordMatch::All),
            )
            .await
            .unwrap();
        assert_eq!(all.len(), 1);

        let text = storage
            .query(&NewsQuery::default().with_text("championship"))
            .await
            .unwrap();
        assert_eq!(text.len(), 1);
        assert_eq!(text[0].url, "http://test.com/snooker");

        let limited = storage
            .query(&NewsQuery::default().with_limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);

        assert_eq!(
            storage.distinct_keywords().await.unwrap(),
            vec!["Microsoft", "Patents", "Snooker"]
        );
    }

    #[tokio::test]
    async fn test_concurrent_upserts_keep_one_record() {
        let temp_dir = tempdir().unwrap();
        let storage = Arc::new(
            SQLiteStorage::new_with_path(&temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    let article = format!("Revision {}", i);
                    storage
                        .upsert(&record("http://test.com/same", 1, &article, &["Race"]))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = storage.query(&NewsQuery::default()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].article.starts_with("Revision "));
        assert_eq!(storage.distinct_keywords().await.unwrap(), vec!["Race"]);
    }

    #[tokio::test]
    async fn test_clear_and_drop() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        storage
            .upsert(&record("http://test.com/a", 1, "Body", &["One"]))
            .await
            .unwrap();

        storage.clear_content().await.unwrap();
        assert!(storage.query(&NewsQuery::default()).await.unwrap().is_empty());

        storage.drop_all().await.unwrap();
        assert!(storage.query(&NewsQuery::default()).await.is_err());

        storage.init().await.unwrap();
        assert!(storage.query(&NewsQuery::default()).await.unwrap().is_empty());
    }
}

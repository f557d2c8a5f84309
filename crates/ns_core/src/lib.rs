pub mod error;
pub mod storage;
pub mod types;

pub use error::Error;
pub use storage::ArticleStorage;
pub use types::{ArticleRecord, KeywordMatch, NewsCandidate, NewsQuery, SitemapEntry};

pub type Result<T> = std::result::Result<T, Error>;

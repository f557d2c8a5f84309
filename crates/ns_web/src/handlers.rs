use axum::{
    extract::{Query, State},
    Json,
};
use ns_core::types::MAX_QUERY_LIMIT;
use ns_core::{ArticleRecord, KeywordMatch, NewsQuery};
use serde::Serialize;
use std::num::IntErrorKind;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub news: Vec<ArticleRecord>,
}

#[derive(Debug, Serialize)]
pub struct KeywordsResponse {
    pub keywords: Vec<String>,
}

pub async fn index() -> &'static str {
    ""
}

pub async fn get_news(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<NewsResponse>, ApiError> {
    let query = parse_news_query(&params)?;
    tracing::debug!("News query: {:?}", query);
    let news = state.storage.query(&query).await?;
    Ok(Json(NewsResponse { news }))
}

pub async fn get_keywords(State(state): State<AppState>) -> Result<Json<KeywordsResponse>, ApiError> {
    let keywords = state.storage.distinct_keywords().await?;
    Ok(Json(KeywordsResponse { keywords }))
}

fn first<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Builds the storage query from `text`, repeated `keywords` and `limit`.
///
/// A missing `limit` or one above [`MAX_QUERY_LIMIT`] is clamped; a negative
/// or non-integer one is rejected.
pub fn parse_news_query(params: &[(String, String)]) -> Result<NewsQuery, ApiError> {
    let mut query = NewsQuery::default().with_keyword_match(KeywordMatch::Any);

    if let Some(text) = first(params, "text") {
        query = query.with_text(text);
    }

    let keywords: Vec<&str> = params
        .iter()
        .filter(|(key, _)| key == "keywords")
        .map(|(_, value)| value.as_str())
        .collect();
    if !keywords.is_empty() {
        query = query.with_keywords(keywords);
    }

    let limit = match first(params, "limit") {
        Some(raw) => parse_limit(raw)?,
        None => MAX_QUERY_LIMIT,
    };
    Ok(query.with_limit(limit))
}

fn parse_limit(raw: &str) -> Result<usize, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(limit) if limit < 0 => Err(ApiError::BadRequest(format!(
            "limit must not be negative, got {}",
            limit
        ))),
        Ok(limit) => Ok((limit as u64).min(MAX_QUERY_LIMIT as u64) as usize),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(MAX_QUERY_LIMIT),
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => Err(ApiError::BadRequest(format!(
            "limit must not be negative, got {}",
            raw
        ))),
        Err(_) => Err(ApiError::BadRequest(format!(
            "limit must be an integer, got '{}'",
            raw
        ))),
    }
}

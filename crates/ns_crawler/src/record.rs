use crate::extract::ArticleExtractor;
use crate::pipeline::AbandonReason;
use crate::readability::ReadabilityScorer;
use ns_core::{ArticleRecord, NewsCandidate};

/// Combines a candidate with what its article page yields.
///
/// Only a missing `<article>` or a blank body abandon the record. Missing
/// keywords leave the list empty; an unscorable body leaves `readability`
/// unset.
pub fn build_record(
    candidate: NewsCandidate,
    html: &str,
    extractor: &ArticleExtractor,
    scorer: Option<&ReadabilityScorer>,
) -> Result<ArticleRecord, AbandonReason> {
    let extracted = extractor.extract(html).ok_or(AbandonReason::ArticleNotFound)?;
    if extracted.body.trim().is_empty() {
        return Err(AbandonReason::ArticleEmpty);
    }

    let readability = scorer.and_then(|scorer| scorer.score(&extracted.body).ok());
    Ok(ArticleRecord::from_candidate(
        candidate,
        extracted.body,
        extracted.keywords,
        readability,
    ))
}

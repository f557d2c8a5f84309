use ns_core::{NewsCandidate, Result};
use super::{XmlNode, XmlNodes};

const LOC: &str = "sm:loc";
const LANGUAGE: &str = "news:news/news:publication/news:language";
const TITLE: &str = "news:news/news:title";
const PUBLICATION_DATE: &str = "news:news/news:publication_date";

/// Only English news entries are crawled.
pub const NEWS_LANGUAGE: &str = "en";

/// English news entries of a news sitemap, in document order.
///
/// A `<url>` node qualifies when it carries exactly one location, language,
/// title and publication date and the language is [`NEWS_LANGUAGE`].
/// Nodes that do not qualify are skipped. A qualifying node whose date does
/// not parse yields an error and iteration continues with the next node.
pub fn parse_news_sitemap(xml: &str) -> NewsEntries<'_> {
    NewsEntries {
        nodes: XmlNodes::new(xml, "url"),
    }
}

pub struct NewsEntries<'a> {
    nodes: XmlNodes<'a>,
}

fn qualifies(node: &XmlNode) -> bool {
    [LOC, LANGUAGE, TITLE, PUBLICATION_DATE]
        .iter()
        .all(|path| node.count(path) == 1)
        && node.text(LANGUAGE) == Some(NEWS_LANGUAGE)
}

fn candidate(node: &XmlNode) -> Option<Result<NewsCandidate>> {
    if !qualifies(node) {
        return None;
    }
    let url = node.text(LOC)?;
    let title = node.text(TITLE)?;
    let date = node.text(PUBLICATION_DATE)?;
    Some(NewsCandidate::parse(url, title, date))
}

impl<'a> Iterator for NewsEntries<'a> {
    type Item = Result<NewsCandidate>;

    fn next(&mut self) -> Option<Self::Item> {
        for node in self.nodes.by_ref() {
            match node {
                Ok(node) => {
                    if let Some(candidate) = candidate(&node) {
                        return Some(candidate);
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ns_core::Error;

    fn urlset(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:news="http://www.google.com/schemas/sitemap-news/0.9">
{}
</urlset>"#,
            body
        )
    }

    fn url(loc: &str, language: &str, title: &str, date: &str) -> String {
        format!(
            r#"<url>
  <loc>{}</loc>
  <news:news>
    <news:publication>
      <news:name>BBC News</news:name>
      <news:language>{}</news:language>
    </news:publication>
    <news:publication_date>{}</news:publication_date>
    <news:title>{}</news:title>
  </news:news>
</url>"#,
            loc, language, date, title
        )
    }

    #[test]
    fn test_parse_news_sitemap() {
        let xml = urlset(&url(
            "https://www.bbc.com/sport/snooker/55132804",
            "en",
            "UK Snooker Championship 2020: BBC coverage times, schedule and results",
            "2020-11-30T11:10:53Z",
        ));

        let candidates: Vec<NewsCandidate> = parse_news_sitemap(&xml).collect::<Result<_>>().unwrap();
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.url, "https://www.bbc.com/sport/snooker/55132804");
        assert_eq!(
            candidate.title,
            "UK Snooker Championship 2020: BBC coverage times, schedule and results"
        );
        assert_eq!(
            candidate.publication_date,
            Utc.with_ymd_and_hms(2020, 11, 30, 11, 10, 53).unwrap()
        );
    }

    #[test]
    fn test_skips_other_languages() {
        let xml = urlset(&[
            url("https://www.bbc.com/mundo/a", "es", "Titular", "2020-11-30T11:10:53Z"),
            url("https://www.bbc.com/news/b", "en", "Headline", "2020-11-30T12:00:00Z"),
        ]
        .concat());

        let candidates: Vec<_> = parse_news_sitemap(&xml).filter_map(Result::ok).collect();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://www.bbc.com/news/b");
    }

    #[test]
    fn test_language_must_match_exactly() {
        let xml = urlset(&[
            url("https://www.bbc.com/news/a", " en ", "Padded", "2020-11-30T11:10:53Z"),
            url("https://www.bbc.com/news/b", "EN", "Upper case", "2020-11-30T11:10:53Z"),
        ]
        .concat());

        assert_eq!(parse_news_sitemap(&xml).count(), 0);
    }

    #[test]
    fn test_skips_incomplete_entries() {
        let missing_title = r#"<url>
  <loc>https://www.bbc.com/news/a</loc>
  <news:news>
    <news:publication><news:language>en</news:language></news:publication>
    <news:publication_date>2020-11-30T11:10:53Z</news:publication_date>
  </news:news>
</url>"#;
        let two_titles = r#"<url>
  <loc>https://www.bbc.com/news/b</loc>
  <news:news>
    <news:publication><news:language>en</news:language></news:publication>
    <news:publication_date>2020-11-30T11:10:53Z</news:publication_date>
    <news:title>One</news:title>
    <news:title>Two</news:title>
  </news:news>
</url>"#;
        let xml = urlset(&[missing_title, two_titles].concat());

        assert_eq!(parse_news_sitemap(&xml).count(), 0);
    }

    #[test]
    fn test_bad_date_does_not_stop_iteration() {
        let xml = urlset(&[
            url("https://www.bbc.com/news/a", "en", "First", "30/11/2020 11:10"),
            url("https://www.bbc.com/news/b", "en", "Second", "2020-11-30T12:00:00Z"),
        ]
        .concat());

        let results: Vec<_> = parse_news_sitemap(&xml).collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err(Error::InvalidDate(_))));
        assert_eq!(results[1].as_ref().unwrap().title, "Second");
    }

    #[test]
    fn test_date_with_offset_is_rejected() {
        let xml = urlset(&url(
            "https://www.bbc.com/news/a",
            "en",
            "Offset",
            "2020-11-30T11:10:53+00:00",
        ));

        let results: Vec<_> = parse_news_sitemap(&xml).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}

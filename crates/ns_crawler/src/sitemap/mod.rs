//! Sitemap documents.
//!
//! Both parsers walk the document once, node by node, and hand back lazy
//! iterators. Parsing the same document again yields the same sequence.
//!
//! Children of an iterated node are addressed by namespace-qualified paths
//! relative to that node: `sm:` is the sitemap protocol namespace and
//! `news:` the Google News extension, e.g. `news:news/news:title`.
//! Element text is kept exactly as written, surrounding whitespace included.

use ns_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

pub mod index;
pub mod news;

pub use index::{parse_sitemap_index, SitemapEntries};
pub use news::{parse_news_sitemap, NewsEntries};

pub const SITEMAP_NS: &[u8] = b"http://www.sitemaps.org/schemas/sitemap/0.9";
pub const NEWS_NS: &[u8] = b"http://www.google.com/schemas/sitemap-news/0.9";

fn qualify(ns: &ResolveResult<'_>) -> &'static str {
    match ns {
        ResolveResult::Bound(Namespace(uri)) if *uri == SITEMAP_NS => "sm",
        ResolveResult::Bound(Namespace(uri)) if *uri == NEWS_NS => "news",
        _ => "*",
    }
}

/// The descendants of one iterated node, in document order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct XmlNode {
    elements: Vec<(String, String)>,
}

impl XmlNode {
    /// Number of descendants at `path`.
    pub(crate) fn count(&self, path: &str) -> usize {
        self.elements.iter().filter(|(p, _)| p == path).count()
    }

    /// Text of the first descendant at `path`.
    pub(crate) fn text(&self, path: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, text)| text.as_str())
    }

    fn open(&mut self, parent: Option<usize>, prefix: &str, local: &str) -> usize {
        let path = match parent {
            Some(idx) => format!("{}/{}:{}", self.elements[idx].0, prefix, local),
            None => format!("{}:{}", prefix, local),
        };
        self.elements.push((path, String::new()));
        self.elements.len() - 1
    }
}

/// Iterates over every element named `item` (by local name), yielding its
/// descendants. A malformed document ends the iteration with one error.
pub(crate) struct XmlNodes<'a> {
    reader: NsReader<&'a [u8]>,
    item: &'static str,
    done: bool,
}

impl<'a> XmlNodes<'a> {
    pub(crate) fn new(xml: &'a str, item: &'static str) -> Self {
        let reader = NsReader::from_str(xml);
        Self {
            reader,
            item,
            done: false,
        }
    }

    fn fail(&mut self, message: String) -> Result<XmlNode> {
        self.done = true;
        Err(Error::Xml(format!(
            "{} at byte {}",
            message,
            self.reader.buffer_position()
        )))
    }
}

impl<'a> Iterator for XmlNodes<'a> {
    type Item = Result<XmlNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // The node being collected and the indices of its open descendants.
        let mut current: Option<(XmlNode, Vec<usize>)> = None;

        loop {
            let (prefix, event) = match self.reader.read_resolved_event() {
                Ok((ns, event)) => (qualify(&ns), event),
                Err(e) => return Some(self.fail(e.to_string())),
            };

            match event {
                Event::Start(start) => {
                    let local = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    match current.as_mut() {
                        Some((node, open)) => {
                            let idx = node.open(open.last().copied(), prefix, &local);
                            open.push(idx);
                        }
                        None if local == self.item => current = Some((XmlNode::default(), Vec::new())),
                        None => {}
                    }
                }
                Event::Empty(empty) => {
                    let local = String::from_utf8_lossy(empty.local_name().as_ref()).into_owned();
                    match current.as_mut() {
                        Some((node, open)) => {
                            node.open(open.last().copied(), prefix, &local);
                        }
                        None if local == self.item => return Some(Ok(XmlNode::default())),
                        None => {}
                    }
                }
                Event::Text(text) => {
                    if let Some((node, open)) = current.as_mut() {
                        if let Some(&idx) = open.last() {
                            match text.unescape() {
                                Ok(text) => node.elements[idx].1.push_str(&text),
                                Err(e) => return Some(self.fail(e.to_string())),
                            }
                        }
                    }
                }
                Event::CData(data) => {
                    if let Some((node, open)) = current.as_mut() {
                        if let Some(&idx) = open.last() {
                            node.elements[idx].1.push_str(&String::from_utf8_lossy(data.as_ref()));
                        }
                    }
                }
                Event::End(_) => {
                    let finished = match current.as_mut() {
                        Some((_, open)) => open.pop().is_none(),
                        None => false,
                    };
                    if finished {
                        if let Some((node, _)) = current.take() {
                            return Some(Ok(node));
                        }
                    }
                }
                Event::Eof => {
                    self.done = true;
                    if current.is_some() {
                        return Some(Err(Error::Xml(format!(
                            "Unexpected end of document inside <{}>",
                            self.item
                        ))));
                    }
                    return None;
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_namespace_qualified() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
                    xmlns:news="http://www.google.com/schemas/sitemap-news/0.9"
                    xmlns:other="urn:other">
                <url>
                    <loc>https://example.com/a</loc>
                    <news:news><news:title>Fish &amp; chips</news:title></news:news>
                    <other:loc>ignored</other:loc>
                    <loc/>
                </url>
            </urlset>"#;

        let nodes: Vec<XmlNode> = XmlNodes::new(xml, "url").collect::<Result<_>>().unwrap();
        assert_eq!(nodes.len(), 1);
        let node = &nodes[0];
        assert_eq!(node.count("sm:loc"), 2);
        assert_eq!(node.text("sm:loc"), Some("https://example.com/a"));
        assert_eq!(node.text("news:news/news:title"), Some("Fish & chips"));
        assert_eq!(node.count("*:loc"), 1);
    }

    #[test]
    fn test_text_is_not_trimmed() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <url>
                <loc> https://example.com/a
                </loc>
            </url>
        </urlset>"#;

        let nodes: Vec<XmlNode> = XmlNodes::new(xml, "url").collect::<Result<_>>().unwrap();
        assert_eq!(
            nodes[0].text("sm:loc"),
            Some(" https://example.com/a\n                ")
        );
    }

    #[test]
    fn test_malformed_document_stops_with_error() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <url><loc>https://example.com/a</loc></url>
            <url><loc>https://example.com/b</wrong></url>
            <url><loc>https://example.com/c</loc></url>
        </urlset>"#;

        let mut nodes = XmlNodes::new(xml, "url");
        assert!(nodes.next().unwrap().is_ok());
        assert!(nodes.next().unwrap().is_err());
        assert!(nodes.next().is_none());
    }
}

use ns_core::{Result, SitemapEntry};
use super::{XmlNode, XmlNodes};

const LOC: &str = "sm:loc";

/// Child sitemaps of a sitemap index, in document order.
///
/// Every `<sitemap>` node with exactly one `<loc>` yields an entry; other
/// nodes are skipped without error.
pub fn parse_sitemap_index(xml: &str) -> SitemapEntries<'_> {
    SitemapEntries {
        nodes: XmlNodes::new(xml, "sitemap"),
    }
}

pub struct SitemapEntries<'a> {
    nodes: XmlNodes<'a>,
}

fn entry(node: &XmlNode) -> Option<SitemapEntry> {
    if node.count(LOC) != 1 {
        return None;
    }
    node.text(LOC).map(SitemapEntry::new)
}

impl<'a> Iterator for SitemapEntries<'a> {
    type Item = Result<SitemapEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        for node in self.nodes.by_ref() {
            match node {
                Ok(node) => {
                    if let Some(entry) = entry(&node) {
                        return Some(Ok(entry));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

//! Article pages: body text and tag-list keywords from the page's `<article>`.

mod clean;

pub use clean::clean_text;

use crate::config::ExtractionConfig;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    static ref ARTICLE: Selector = Selector::parse("article").unwrap();
    static ref LIST_ITEM: Selector = Selector::parse("li").unwrap();
}

/// What an article page yielded. `body` may be empty; deciding what an empty
/// body means is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub body: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ArticleExtractor {
    config: ExtractionConfig,
}

impl ArticleExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extracts body and keywords, or `None` when the page has no `<article>`.
    pub fn extract(&self, html: &str) -> Option<ExtractedArticle> {
        let document = Html::parse_document(html);
        let article = find_article(&document)?;
        Some(ExtractedArticle {
            body: self.extract_body(article),
            keywords: self.harvest_keywords(article),
        })
    }

    fn component<'a>(&self, element: &ElementRef<'a>) -> Option<&'a str> {
        element.value().attr(&self.config.component_attribute)
    }

    fn direct_children<'a>(&self, article: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
        article.children().filter_map(ElementRef::wrap)
    }

    /// Text of every direct child fragment that is not an excluded
    /// component, joined with a single space in document order.
    pub fn extract_body(&self, article: ElementRef) -> String {
        self.direct_children(article)
            .filter(|child| child.value().name() == self.config.fragment_tag)
            .filter(|child| match self.component(child) {
                Some(component) => !self.config.excluded_components.iter().any(|c| c == component),
                None => true,
            })
            .map(clean_text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Trimmed text of every list item of the tag-list section, in document
    /// order. Empty items are kept. Pages without a tag list have no keywords.
    pub fn harvest_keywords(&self, article: ElementRef) -> Vec<String> {
        self.direct_children(article)
            .filter(|child| child.value().name() == "section")
            .filter(|child| self.component(child) == Some(self.config.tag_list_component.as_str()))
            .flat_map(|section| section.select(&LIST_ITEM).collect::<Vec<_>>())
            .map(|item| clean_text(item).trim().to_string())
            .collect()
    }
}

/// The first `<article>` element of the page.
pub fn find_article(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&ARTICLE).next()
}

//! Crawl configuration, built once and handed to every crawler component.

use std::time::Duration;

pub const DEFAULT_SITEMAP_URL: &str = "https://www.bbc.com/sitemaps/https-index-com-news.xml";

/// Which `<article>` children count as body text and which carry the tag list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Attribute naming the component a fragment renders.
    pub component_attribute: String,

    /// Component values never treated as body text.
    pub excluded_components: Vec<String>,

    /// Component value of the keyword section.
    pub tag_list_component: String,

    /// Element name of body fragments.
    pub fragment_tag: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            component_attribute: "data-component".to_string(),
            excluded_components: vec![
                "media-block".to_string(),
                "image-block".to_string(),
                "tag-list".to_string(),
            ],
            tag_list_component: "tag-list".to_string(),
            fragment_tag: "div".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Sitemap index the crawl starts from
    pub sitemap_url: String,

    /// Hosts the crawl may fetch from; empty allows every host
    pub allowed_domains: Vec<String>,

    /// Maximum number of fetches in flight
    pub concurrency: usize,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// User agent sent with every request
    pub user_agent: String,

    /// Whether records get a readability score
    pub score_readability: bool,

    pub extraction: ExtractionConfig,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            sitemap_url: DEFAULT_SITEMAP_URL.to_string(),
            allowed_domains: vec!["www.bbc.com".to_string()],
            concurrency: 16,
            request_timeout: Duration::from_secs(30),
            user_agent: format!("ns-crawler/{}", env!("CARGO_PKG_VERSION")),
            score_readability: true,
            extraction: ExtractionConfig::default(),
        }
    }
}

/// Builder for CrawlConfig
#[derive(Debug, Default)]
pub struct CrawlConfigBuilder {
    config: CrawlConfig,
}

impl CrawlConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CrawlConfig::default(),
        }
    }

    pub fn sitemap_url(mut self, sitemap_url: impl Into<String>) -> Self {
        self.config.sitemap_url = sitemap_url.into();
        self
    }

    pub fn allowed_domains(mut self, allowed_domains: Vec<String>) -> Self {
        self.config.allowed_domains = allowed_domains;
        self
    }

    /// Values below one are raised to one.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.config.request_timeout = request_timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn score_readability(mut self, score_readability: bool) -> Self {
        self.config.score_readability = score_readability;
        self
    }

    pub fn extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.config.extraction = extraction;
        self
    }

    pub fn build(self) -> CrawlConfig {
        self.config
    }
}

impl CrawlConfig {
    pub fn builder() -> CrawlConfigBuilder {
        CrawlConfigBuilder::new()
    }

    /// Whether `url` may be fetched under `allowed_domains`.
    pub fn allows(&self, url: &str) -> bool {
        if self.allowed_domains.is_empty() {
            return true;
        }
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.allowed_domains.iter().any(|domain| {
            host == domain || host.ends_with(&format!(".{}", domain))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = CrawlConfig::builder()
            .sitemap_url("http://localhost/index.xml")
            .allowed_domains(vec!["localhost".to_string()])
            .concurrency(0)
            .score_readability(false)
            .build();

        assert_eq!(config.sitemap_url, "http://localhost/index.xml");
        assert_eq!(config.concurrency, 1);
        assert!(!config.score_readability);
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_allows() {
        let config = CrawlConfig::default();
        assert!(config.allows("https://www.bbc.com/news/technology-55133141"));
        assert!(!config.allows("https://www.example.com/news"));
        assert!(!config.allows("not a url"));

        let open = CrawlConfig::builder().allowed_domains(vec![]).build();
        assert!(open.allows("https://www.example.com/news"));

        let parent = CrawlConfig::builder()
            .allowed_domains(vec!["bbc.com".to_string()])
            .build();
        assert!(parent.allows("https://www.bbc.com/sport"));
        assert!(!parent.allows("https://notbbc.com/sport"));
    }
}

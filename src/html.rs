//! HTML document adapter backed by the `scraper` crate.
//!
//! The adapter type always exists so it can be named in configuration, but it
//! only works when the `scraper-adapter` feature is compiled in. Without it,
//! [`DocumentAdapter::install_requirements`] fails and the adapter cannot be
//! assigned.

#[cfg(feature = "scraper-adapter")]
use scraper::{ElementRef, Html, Selector};

#[cfg(feature = "scraper-adapter")]
use crate::document::Node;
use crate::document::{Document, DocumentAdapter};
use crate::{ProxyFetcherError, Result};

/// Adapter name reported by [`ScraperAdapter`].
pub const SCRAPER_ADAPTER: &str = "scraper";

/// Parses HTML with CSS selector support.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScraperAdapter;

impl ScraperAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentAdapter for ScraperAdapter {
    fn name(&self) -> &str {
        SCRAPER_ADAPTER
    }

    fn install_requirements(&self) -> Result<()> {
        if cfg!(feature = "scraper-adapter") {
            Ok(())
        } else {
            Err(ProxyFetcherError::AdapterSetup {
                adapter: SCRAPER_ADAPTER.to_string(),
                reason: "compiled without the `scraper-adapter` feature".to_string(),
            })
        }
    }

    #[cfg(feature = "scraper-adapter")]
    fn parse(&self, markup: &str) -> Result<Document> {
        Ok(Document::new(HtmlDocument {
            html: Html::parse_document(markup),
        }))
    }

    #[cfg(not(feature = "scraper-adapter"))]
    fn parse(&self, _markup: &str) -> Result<Document> {
        self.install_requirements()?;
        Err(ProxyFetcherError::Parse("HTML parsing unavailable".to_string()))
    }
}

#[cfg(feature = "scraper-adapter")]
fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ProxyFetcherError::Parse(format!("Failed to parse selector '{}': {:?}", selector, e)))
}

#[cfg(feature = "scraper-adapter")]
struct HtmlDocument {
    html: Html,
}

#[cfg(feature = "scraper-adapter")]
impl Node for HtmlDocument {
    fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn Node + '_>>> {
        let selector = parse_selector(selector)?;
        Ok(self
            .html
            .select(&selector)
            .map(|element| Box::new(HtmlNode(element)) as Box<dyn Node + '_>)
            .collect())
    }

    fn text(&self) -> String {
        self.html.root_element().text().collect()
    }

    fn attr(&self, _name: &str) -> Option<String> {
        None
    }
}

#[cfg(feature = "scraper-adapter")]
struct HtmlNode<'a>(ElementRef<'a>);

#[cfg(feature = "scraper-adapter")]
impl<'a> Node for HtmlNode<'a> {
    fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn Node + '_>>> {
        let selector = parse_selector(selector)?;
        Ok(self
            .0
            .select(&selector)
            .map(|element| Box::new(HtmlNode(element)) as Box<dyn Node + '_>)
            .collect())
    }

    fn text(&self) -> String {
        self.0.text().collect()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.0.value().attr(name).map(str::to_string)
    }
}


#[cfg(all(test, not(feature = "scraper-adapter")))]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Configuration;

    #[test]
    fn test_scraper_adapter_setup_fails_without_feature() {
        match ScraperAdapter::new().install_requirements() {
            Err(ProxyFetcherError::AdapterSetup { adapter, .. }) => {
                assert_eq!(adapter, SCRAPER_ADAPTER)
            }
            other => panic!("Expected AdapterSetup, got {:?}", other),
        }
    }

    #[test]
    fn test_scraper_adapter_parse_fails_without_feature() {
        assert!(ScraperAdapter::new().parse("<html></html>").is_err());
    }

    #[test]
    fn test_set_scraper_adapter_keeps_previous_adapter() {
        let config = Configuration::new();
        let previous = config.adapter();

        assert!(matches!(
            config.set_adapter(Arc::new(ScraperAdapter::new())),
            Err(ProxyFetcherError::AdapterSetup { .. })
        ));
        assert!(Arc::ptr_eq(&config.adapter(), &previous));
        assert_eq!(config.adapter().name(), "line");
    }
}

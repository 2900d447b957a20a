//! Built-in proxy list providers.

use std::sync::Arc;

use crate::Provider;

mod free_proxy_list;
mod proxyscrape;
mod xroxy;

pub use free_proxy_list::FreeProxyList;
pub use proxyscrape::Proxyscrape;
pub use xroxy::Xroxy;

/// Name of the provider used when none is configured.
pub const DEFAULT_PROVIDER: &str = "free_proxy_list";

/// Providers registered in every new registry.
pub fn builtin() -> Vec<Arc<dyn Provider>> {
    vec![
        Arc::new(FreeProxyList::new()),
        Arc::new(FreeProxyList::ssl()),
        Arc::new(Xroxy::new()),
        Arc::new(Proxyscrape::http()),
        Arc::new(Proxyscrape::socks4()),
        Arc::new(Proxyscrape::socks5()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_names_are_unique() {
        let names: HashSet<String> = builtin().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names.len(), builtin().len());
    }

    #[test]
    fn test_builtin_contains_default() {
        assert!(builtin().iter().any(|p| p.name() == DEFAULT_PROVIDER));
        assert!(builtin().iter().any(|p| p.name() == "xroxy"));
    }

    #[test]
    fn test_builtin_listing_urls_are_https() {
        for provider in builtin() {
            for url in provider.listing_urls() {
                assert!(url.starts_with("https://"), "{} -> {}", provider.name(), url);
            }
        }
    }
}

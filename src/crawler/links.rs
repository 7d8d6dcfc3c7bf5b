//! HTML link extractor
//!
//! This module scans a fetched HTML document for the references a crawl can
//! follow:
//! - `<a href="...">` hyperlinks
//! - `<img src="...">` images
//!
//! Targets are resolved against the page URL and classified as internal or
//! external.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Kind of reference found on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// `<a href>` target
    Hyperlink,
    /// `<img src>` target
    Image,
}

/// A reference discovered on a page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub kind: LinkKind,

    /// Absolute target URL, resolved against the referring page
    pub target: Url,

    /// True when the target host or explicit port differs from the referring page's
    pub external: bool,
}

/// Extracts hyperlinks and images from an HTML document
///
/// # Extraction Rules
///
/// **Include:**
/// - `<a href="...">` as [`LinkKind::Hyperlink`]
/// - `<img src="...">` as [`LinkKind::Image`]
///
/// **Exclude:**
/// - fragment-only hrefs (`#top`)
/// - inline data URIs (`data:...`)
/// - targets that cannot be resolved to a URL (logged)
/// - non-HTTP(S) targets such as `mailto:` or `javascript:`
///
/// Each `(kind, target)` pair is returned once, in document order.
///
/// # Example
///
/// ```
/// use crowlet::crawler::{extract_links, LinkKind};
/// use url::Url;
///
/// let page = Url::parse("http://a.com/x").unwrap();
/// let links = extract_links(r#"<a href="/y">y</a>"#, &page);
/// assert_eq!(links[0].kind, LinkKind::Hyperlink);
/// assert_eq!(links[0].target.as_str(), "http://a.com/y");
/// assert!(!links[0].external);
/// ```
pub fn extract_links(html: &str, page_url: &Url) -> Vec<Link> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for (kind, selector, attr) in [
        (LinkKind::Hyperlink, "a[href]", "href"),
        (LinkKind::Image, "img[src]", "src"),
    ] {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };

        for element in document.select(&selector) {
            let Some(raw) = element.value().attr(attr) else {
                continue;
            };

            if let Some(link) = resolve_link(kind, raw, page_url) {
                if seen.insert((link.kind, link.target.clone())) {
                    links.push(link);
                }
            }
        }
    }

    links
}

/// Resolves a raw attribute value into a [`Link`]
///
/// Returns None if the reference should be skipped.
fn resolve_link(kind: LinkKind, raw: &str, page_url: &Url) -> Option<Link> {
    let raw = raw.trim();

    if raw.is_empty() {
        return None;
    }

    match kind {
        LinkKind::Hyperlink if raw.starts_with('#') => return None,
        LinkKind::Image if raw.starts_with("data:") => return None,
        _ => {}
    }

    let target = match page_url.join(raw) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!("Skipping malformed link {:?} on {}: {}", raw, page_url, e);
            return None;
        }
    };

    if target.scheme() != "http" && target.scheme() != "https" {
        tracing::debug!("Skipping non-HTTP link {} on {}", target, page_url);
        return None;
    }

    // Explicit ports count as part of the host; scheme default ports do not
    let external = target.host_str() != page_url.host_str() || target.port() != page_url.port();

    Some(Link {
        kind,
        target,
        external,
    })
}

//! Sitemap retrieval
//!
//! Turns a sitemap URL into the list of seed URLs for a crawl. Both plain
//! `<urlset>` documents and `<sitemapindex>` documents are accepted; an index
//! is followed exactly one level down.

use crate::SitemapError;
use reqwest::Client;
use url::Url;

/// Fetches a sitemap and returns every valid page URL it declares
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `sitemap_url` - Location of the sitemap or sitemap index
///
/// # Returns
///
/// * `Ok(Vec<String>)` - The declared URLs, in document order
/// * `Err(SitemapError)` - The top-level sitemap could not be retrieved
///
/// A child sitemap of an index that cannot be retrieved is logged and
/// skipped. Entries that do not parse as absolute URLs are dropped.
pub async fn fetch_sitemap_urls(
    client: &Client,
    sitemap_url: &str,
) -> Result<Vec<String>, SitemapError> {
    Url::parse(sitemap_url)
        .map_err(|e| SitemapError::InvalidUrl(format!("{}: {}", sitemap_url, e)))?;

    tracing::info!("Reading sitemap {}", sitemap_url);
    let document = fetch_document(client, sitemap_url).await?;

    if !is_sitemap_index(&document) {
        return Ok(page_urls(&document));
    }

    let children = extract_loc_values(&document);
    tracing::info!("Sitemap index lists {} sitemap(s)", children.len());

    let mut urls = Vec::new();
    for child in children {
        match fetch_document(client, &child).await {
            Ok(body) if is_sitemap_index(&body) => {
                tracing::warn!("Skipping nested sitemap index {}", child);
            }
            Ok(body) => urls.extend(page_urls(&body)),
            Err(e) => tracing::warn!("Skipping sitemap {}: {}", child, e),
        }
    }

    Ok(urls)
}

async fn fetch_document(client: &Client, url: &str) -> Result<String, SitemapError> {
    let http_error = |source| SitemapError::Http {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(http_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(SitemapError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(http_error)
}

fn is_sitemap_index(document: &str) -> bool {
    document.contains("<sitemapindex")
}

fn page_urls(document: &str) -> Vec<String> {
    extract_loc_values(document)
        .into_iter()
        .filter_map(|loc| match Url::parse(&loc) {
            Ok(url) => Some(String::from(url)),
            Err(e) => {
                tracing::warn!("Ignoring invalid sitemap entry {}: {}", loc, e);
                None
            }
        })
        .collect()
}

/// Returns the text of every `<loc>` element, unescaped and trimmed
pub fn extract_loc_values(xml: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0usize;

    while let Some(open_idx) = xml[start..].find("<loc>") {
        let open = start + open_idx + "<loc>".len();
        let Some(close_rel) = xml[open..].find("</loc>") else {
            break;
        };
        let close = open + close_rel;

        let value = strip_cdata(xml[open..close].trim());
        if !value.is_empty() {
            out.push(unescape(value));
        }
        start = close + "</loc>".len();
    }

    out
}

fn strip_cdata(value: &str) -> &str {
    value
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
        .map(str::trim)
        .unwrap_or(value)
}

fn unescape(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }

    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

//! URL host rewriting
//!
//! Lets a crawl target a different server (staging, localhost) than the one
//! named in the sitemap while keeping scheme, path and query intact.

use crate::{UrlError, UrlResult};
use url::Url;

/// Replaces the host of every URL with `host`
///
/// `host` may carry a port (`localhost:8080`); without one, any port in the
/// original URL is cleared. Entries that cannot be parsed or rewritten are
/// logged and dropped, so the output may be shorter than the input.
///
/// # Examples
///
/// ```
/// use crowlet::rewrite_url_host;
///
/// let urls = vec!["http://example.com/path".to_string()];
/// assert_eq!(
///     rewrite_url_host(&urls, "newhost.com"),
///     vec!["http://newhost.com/path".to_string()]
/// );
/// ```
pub fn rewrite_url_host(urls: &[String], host: &str) -> Vec<String> {
    let (hostname, port) = match split_host(host) {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!("Cannot rewrite URLs: {}", e);
            return Vec::new();
        }
    };

    urls.iter()
        .filter_map(|url| match with_host(url, &hostname, port) {
            Ok(rewritten) => Some(rewritten),
            Err(e) => {
                tracing::warn!("Dropping URL: {}", e);
                None
            }
        })
        .collect()
}

/// Splits `host[:port]` into its parts
fn split_host(host: &str) -> UrlResult<(String, Option<u16>)> {
    let parsed_host = Url::parse(&format!("http://{}/", host))
        .map_err(|e| UrlError::Parse(format!("{}: {}", host, e)))?;
    let hostname = parsed_host
        .host_str()
        .ok_or_else(|| UrlError::MissingHost(host.to_string()))?;

    // `port()` hides the scheme default, so http://h:80/ would lose an explicit 80
    let port = parsed_host.port().or_else(|| {
        host.rsplit_once(':')
            .and_then(|(_, port)| port.parse::<u16>().ok())
    });

    Ok((hostname.to_string(), port))
}

fn with_host(url: &str, hostname: &str, port: Option<u16>) -> UrlResult<String> {
    let mut parsed = Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;

    let set_host_error = |message: String| UrlError::SetHost {
        url: url.to_string(),
        message,
    };
    parsed
        .set_host(Some(hostname))
        .map_err(|e| set_host_error(e.to_string()))?;
    parsed
        .set_port(port)
        .map_err(|_| set_host_error("URL cannot carry a port".to_string()))?;

    Ok(parsed.into())
}

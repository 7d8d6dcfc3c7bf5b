//! Human-readable and JSON crawl summaries

use crate::output::stats::CrawlStatistics;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct JsonSummary<'a> {
    total: GeneralInfo,
    status: StatusInfo<'a>,
    #[serde(rename = "response-time")]
    response_time: ResponseTimeInfo,
}

#[derive(Debug, Serialize)]
struct GeneralInfo {
    crawled: usize,
}

#[derive(Debug, Serialize)]
struct StatusInfo<'a> {
    #[serde(rename = "status-codes")]
    status_codes: &'a BTreeMap<u16, usize>,
    errors: Vec<ErrorEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct ErrorEntry<'a> {
    url: &'a str,
    status_code: u16,
    server_time_ms: u64,
    #[serde(skip_serializing_if = "no_linking_urls")]
    linking_urls: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct ResponseTimeInfo {
    avg_time_ms: u64,
    max_time_ms: u64,
}

fn no_linking_urls(urls: &&[String]) -> bool {
    urls.is_empty()
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Renders the statistics as a single-line JSON document
pub fn render_json_summary(stats: &CrawlStatistics) -> serde_json::Result<String> {
    let summary = JsonSummary {
        total: GeneralInfo {
            crawled: stats.total,
        },
        status: StatusInfo {
            status_codes: &stats.status_codes,
            errors: stats
                .non_200_urls
                .iter()
                .map(|result| ErrorEntry {
                    url: &result.url,
                    status_code: result.status_code,
                    server_time_ms: millis(result.time),
                    linking_urls: &result.linking_urls,
                })
                .collect(),
        },
        response_time: ResponseTimeInfo {
            avg_time_ms: millis(stats.average_200_time),
            max_time_ms: millis(stats.max_200_time),
        },
    };

    serde_json::to_string(&summary)
}

/// Renders the statistics as an indented text report
pub fn render_summary(stats: &CrawlStatistics) -> String {
    let mut out = String::new();

    out.push_str("-------- Summary -------\n");
    out.push_str("general:\n");
    out.push_str(&format!("    crawled: {}\n", stats.total));

    out.push_str("\nstatus:\n");
    for (code, count) in &stats.status_codes {
        out.push_str(&format!("    status-{}: {}\n", code, count));
    }

    out.push_str("\nstatus-errors-detail:\n");
    if stats.non_200_urls.is_empty() {
        out.push_str("    - none\n");
    }
    for result in &stats.non_200_urls {
        out.push_str(&format!("    - {}:\n", result.url));
        out.push_str(&format!("        status-code: {}\n", result.status_code));
        for linking_url in &result.linking_urls {
            out.push_str(&format!("        linking-url: {}\n", linking_url));
        }
    }

    out.push_str("\nserver-time:\n");
    out.push_str(&format!("    avg-time: {}ms\n", millis(stats.average_200_time)));
    out.push_str(&format!("    max-time: {}ms\n", millis(stats.max_200_time)));
    out.push_str("------------------------");

    out
}

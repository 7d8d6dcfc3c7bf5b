//! Process exit-code contract

use crate::config::ExitCodeConfig;
use crate::output::stats::CrawlStatistics;

/// Computes the process exit code for a finished run
///
/// | Condition | Code |
/// |-----------|------|
/// | any outcome other than 200 | `non_200_error` |
/// | max 200 time above `response_time_max` (when > 0) | `response_time_error` |
/// | otherwise | 0 |
///
/// The non-200 check takes precedence when both conditions hold.
pub fn exit_code(stats: &CrawlStatistics, config: &ExitCodeConfig) -> i32 {
    if stats.total != stats.count_200() {
        return config.non_200_error;
    }

    if config.response_time_max > 0 {
        let max_ms = stats.max_200_time.as_millis();
        if max_ms > u128::from(config.response_time_max) {
            tracing::warn!(
                "Max response time ({}ms) was exceeded: {}ms",
                config.response_time_max,
                max_ms
            );
            return config.response_time_error;
        }
    }

    0
}

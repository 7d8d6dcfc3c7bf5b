//! Integration tests driven by wiremock servers

mod crawl_tests;
mod fetch_tests;

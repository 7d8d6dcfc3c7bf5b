//! Crowlet main entry point
//!
//! This is the command-line interface for the Crowlet sitemap crawler.

use clap::Parser;
use crowlet::config::{load_config, validate, Config};
use crowlet::crawler::{build_http_client, HttpFetcher, IterationController};
use crowlet::hooks::run_command;
use crowlet::output::{exit_code, render_json_summary, render_summary, CrawlStatistics};
use crowlet::sitemap::fetch_sitemap_urls;
use crowlet::{rewrite_url_host, CrowletError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Crowlet: a sitemap crawler
///
/// Crowlet fetches every URL listed in a sitemap, optionally following the
/// links found on those pages, and reports status codes and response times.
#[derive(Parser, Debug)]
#[command(name = "crowlet")]
#[command(version)]
#[command(about = "A basic sitemap.xml crawler", long_about = None)]
struct Cli {
    /// URL of the sitemap (or sitemap index) to crawl
    #[arg(value_name = "SITEMAP_URL")]
    sitemap_url: String,

    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Follow hyperlinks found on crawled pages
    #[arg(long)]
    crawl_hyperlinks: bool,

    /// Follow image sources found on crawled pages
    #[arg(long)]
    crawl_images: bool,

    /// Follow links pointing to other hosts
    #[arg(long)]
    crawl_external: bool,

    /// Crawl until interrupted
    #[arg(short, long)]
    forever: bool,

    /// Number of crawl iterations
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Seconds to wait between iterations
    #[arg(short, long, env = "CRAWL_WAIT_INTERVAL")]
    wait_interval: Option<u64>,

    /// Number of HTTP requests to run at once
    #[arg(short, long, env = "CRAWL_THROTTLE", allow_negative_numbers = true)]
    throttle: Option<i64>,

    /// Per-request timeout in milliseconds
    #[arg(short = 'y', long)]
    timeout: Option<u64>,

    /// Suppress logs and the summary
    #[arg(short, long, conflicts_with_all = ["verbose", "debug"])]
    quiet: bool,

    /// Print logs and the summary as JSON
    #[arg(short, long)]
    json: bool,

    /// Exit code when a URL does not answer 200
    #[arg(short = 'e', long)]
    non_200_error: Option<i32>,

    /// Exit code when the response time limit is exceeded
    #[arg(short = 'l', long)]
    response_time_error: Option<i32>,

    /// Maximum 200 response time in milliseconds; 0 disables the check
    #[arg(short = 'm', long)]
    response_time_max: Option<u64>,

    /// Only print the summary
    #[arg(long, conflicts_with = "quiet")]
    summary_only: bool,

    /// Replace the host of every sitemap URL (host or host:port)
    #[arg(long, env = "CRAWL_HOST")]
    override_host: Option<String>,

    /// Basic auth user
    #[arg(short, long, env = "CRAWL_HTTP_USER")]
    user: Option<String>,

    /// Basic auth password
    #[arg(short, long, env = "CRAWL_HTTP_PASSWORD", hide_env_values = true)]
    pass: Option<String>,

    /// Command to run before crawling
    #[arg(long)]
    pre_cmd: Option<String>,

    /// Command to run after crawling
    #[arg(long)]
    post_cmd: Option<String>,

    /// Log per-request timing details
    #[arg(long)]
    debug: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Loads the configuration file, if any, applies the flags on top, and
    /// validates the merged result
    fn resolve_config(&self) -> crowlet::Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                load_config(path)?
            }
            None => Config::default(),
        };

        let crawler = &mut config.crawler;
        crawler.forever |= self.forever;
        if let Some(iterations) = self.iterations {
            crawler.iterations = iterations;
        }
        if let Some(wait_interval) = self.wait_interval {
            crawler.wait_interval = wait_interval;
        }
        if let Some(throttle) = self.throttle {
            crawler.throttle = throttle;
        }
        if let Some(timeout) = self.timeout {
            crawler.timeout = timeout;
        }
        if self.override_host.is_some() {
            crawler.override_host = self.override_host.clone();
        }

        if self.user.is_some() {
            config.http.user = self.user.clone();
        }
        if self.pass.is_some() {
            config.http.pass = self.pass.clone();
        }

        config.links.crawl_hyperlinks |= self.crawl_hyperlinks;
        config.links.crawl_images |= self.crawl_images;
        config.links.crawl_external |= self.crawl_external;

        if let Some(code) = self.non_200_error {
            config.exit.non_200_error = code;
        }
        if let Some(code) = self.response_time_error {
            config.exit.response_time_error = code;
        }
        if let Some(max) = self.response_time_max {
            config.exit.response_time_max = max;
        }

        if self.pre_cmd.is_some() {
            config.hooks.pre_cmd = self.pre_cmd.clone();
        }
        if self.post_cmd.is_some() {
            config.hooks.post_cmd = self.post_cmd.clone();
        }

        validate(&config)?;
        Ok(config)
    }
}

/// How much the crawler logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Normal,
    Debug,
    Trace,
}

/// Logging settings handed to [`setup_logging`]
#[derive(Debug, Clone, Copy)]
struct LogConfig {
    verbosity: Verbosity,
    json: bool,
}

impl LogConfig {
    fn from_cli(cli: &Cli) -> Self {
        let verbosity = if cli.quiet || cli.summary_only {
            Verbosity::Quiet
        } else if cli.verbose >= 2 {
            Verbosity::Trace
        } else if cli.debug || cli.verbose == 1 {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        };

        Self {
            verbosity,
            json: cli.json,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(LogConfig::from_cli(&cli));

    let config = cli.resolve_config()?;
    let code = run(&cli, &config).await?;

    std::process::exit(code);
}

/// Sets up the tracing subscriber; logs go to stderr so the summary owns stdout
fn setup_logging(config: LogConfig) {
    let filter = match config.verbosity {
        Verbosity::Quiet => EnvFilter::new("error"),
        Verbosity::Normal => EnvFilter::new("crowlet=info,warn"),
        Verbosity::Debug => EnvFilter::new("crowlet=debug,info"),
        Verbosity::Trace => EnvFilter::new("crowlet=trace,debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Runs hooks and the crawl, returning the process exit code
async fn run(cli: &Cli, config: &Config) -> crowlet::Result<i32> {
    if let Some(command) = &config.hooks.pre_cmd {
        run_command(command).await?;
    }

    let client = build_http_client(config.crawler.timeout())?;
    let mut urls = fetch_sitemap_urls(&client, &cli.sitemap_url).await?;

    if let Some(host) = config.crawler.override_host.as_deref() {
        urls = rewrite_url_host(&urls, host);
    }
    tracing::info!("Crawling {} URL(s)", urls.len());

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let controller = IterationController::new(Arc::new(HttpFetcher::with_client(client)), config);
    let summary = controller.run(&urls, &cancel).await;
    tracing::info!(
        "Finished after {} iteration(s){}",
        summary.iterations,
        if summary.stopped { " (interrupted)" } else { "" }
    );

    if !cli.quiet {
        print_summary(&summary.stats, cli.json)?;
    }

    let mut code = exit_code(&summary.stats, &config.exit);

    if let Some(command) = &config.hooks.post_cmd {
        if let Err(e) = run_command(command).await {
            tracing::error!("Post-crawl command failed: {}", e);
            if code == 0 {
                code = 1;
            }
        }
    }

    Ok(code)
}

fn print_summary(stats: &CrawlStatistics, json: bool) -> Result<(), CrowletError> {
    if json {
        println!("{}", render_json_summary(stats)?);
    } else {
        println!("{}", render_summary(stats));
    }
    Ok(())
}

/// Cancels `cancel` on Ctrl-C, or SIGTERM on unix
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::warn!("Interrupt signal received, stopping...");
        cancel.cancel();
    });
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

//! High-level application orchestration layer.
//!
//! This module provides the CLI-facing `App` façade. It resolves the query,
//! loads the dataset through the configured source, runs the search and
//! renders either structured (JSON/YAML) or human-oriented output
//! (styled / plain / TSV / HTML).
//!
//! Major steps in `App::run`:
//!   1. Schema generation early-exit
//!   2. Config load / validation
//!   3. Query resolution (argument or share link)
//!   4. Dataset load (degrades to an empty dataset on failure)
//!   5. Search + report assembly
//!   6. Rendering
//!
//! Interactive mode (`--interactive`) replaces steps 3 to 6 with a loop over
//! stdin: every line is a new edit of the query, edits are debounced, and
//! the dataset loads concurrently so early edits see an empty catalog.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use once_cell::sync::OnceCell;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::credits::Credits;
use crate::debounce::Debouncer;
use crate::errors::{CspBypassError, Result};
use crate::facade::Catalog;
use crate::output::{self, OutputFormat as RenderFormat, SearchReport};
use crate::query;
use crate::share;
use crate::sources::{TextSource, load_credits, source_from_config};
use crate::structured_output::SearchOutput;
use crate::styled_output::StyledFormatter;

/// Everything needed to turn a query into rendered output.
struct RenderContext {
    cli: Cli,
    config: Config,
    credits: OnceCell<Credits>,
    warnings: Mutex<Vec<String>>,
}

impl RenderContext {
    fn new(cli: &Cli, config: Config) -> Self {
        Self {
            cli: cli.clone(),
            config,
            credits: OnceCell::new(),
            warnings: Mutex::new(Vec::new()),
        }
    }

    fn warn(&self, message: String) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(message);
        }
    }

    fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }
}

/// Application façade.
pub struct App;

impl App {
    /// Execute the search workflow.
    ///
    /// Returns: intended process exit code (0 = success, including no
    /// matches and a failed dataset load).
    pub async fn run(cli: &Cli) -> Result<i32> {
        if Self::maybe_print_schema(cli)? {
            return Ok(0);
        }
        let config = Self::load_config(cli)?;

        if cli.interactive {
            return Self::run_interactive(cli, config).await;
        }

        let query = Self::resolve_query(cli)?;
        let source: Arc<dyn TextSource> = source_from_config(&config.source)?.into();
        let ctx = RenderContext::new(cli, config);

        let catalog = Catalog::new();
        Self::load_all(&ctx, &catalog, source.as_ref()).await;

        let report = Self::build_report(&ctx, &catalog, &query)?;
        Self::render(&ctx.cli, &report)?;
        Ok(0)
    }

    fn maybe_print_schema(cli: &Cli) -> Result<bool> {
        if cli.generate_schema {
            let schema = SearchOutput::generate_json_schema()
                .map_err(|e| CspBypassError::render("schema", e.to_string()))?;
            println!("{schema}");
            return Ok(true);
        }
        Ok(false)
    }

    fn load_config(cli: &Cli) -> Result<Config> {
        let mut config = Config::from_env();
        config.merge_with_cli(cli);
        config.validate()?;
        debug!(source = %config.source_label(), "configuration loaded");
        Ok(config)
    }

    /// Query from the positional argument or a share link.
    fn resolve_query(cli: &Cli) -> Result<String> {
        if let Some(ref link) = cli.from_link {
            return share::query_from_link(link)?.ok_or_else(|| {
                CspBypassError::invalid_link(link.as_str(), "link does not contain a query")
            });
        }
        cli.query.clone().ok_or(CspBypassError::MissingQuery)
    }

    /// Credits, then the dataset. Credits must be in place before the swap
    /// wakes catalog subscribers.
    async fn load_all(ctx: &RenderContext, catalog: &Catalog, source: &dyn TextSource) -> bool {
        Self::load_credits_into(ctx, source).await;
        Self::load_into(ctx, catalog, source).await
    }

    /// Load the dataset once. A failure leaves the catalog empty.
    async fn load_into(ctx: &RenderContext, catalog: &Catalog, source: &dyn TextSource) -> bool {
        let loaded = catalog
            .load_or_empty(source, &ctx.config.source.data_path)
            .await;
        if !loaded {
            ctx.warn(format!(
                "dataset could not be loaded from {}, searching an empty dataset",
                ctx.config.source_label()
            ));
        }
        loaded
    }

    async fn load_credits_into(ctx: &RenderContext, source: &dyn TextSource) {
        if !ctx.config.output.show_credits {
            return;
        }
        match load_credits(source, &ctx.config.source.credits_path).await {
            Ok(credits) => {
                let _ = ctx.credits.set(credits);
            }
            Err(e) => {
                warn!(category = %e.category(), "credits unavailable: {e}");
                ctx.warn(format!("credits unavailable: {e}"));
            }
        }
    }

    fn build_report(ctx: &RenderContext, catalog: &Catalog, raw_query: &str) -> Result<SearchReport> {
        let snapshot = catalog.snapshot();

        let started = Instant::now();
        let results = query::search(&snapshot, raw_query);
        let elapsed = started.elapsed();
        info!(
            mode = %results.mode,
            terms = results.terms.len(),
            matches = results.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "search finished"
        );

        let mut report = SearchReport::new(results, ctx.config.output.max_results);
        report.metadata.source = ctx.config.source_label();
        report.metadata.dataset_size = snapshot.len();
        report.metadata.duration_us = Some(elapsed.as_micros() as u64);
        report.metadata.credits = ctx.credits.get().cloned();
        report.metadata.warnings = ctx.warnings();

        if ctx.cli.link {
            let link = share::link_for(&ctx.config.output.share_base_url, raw_query)?;
            report.metadata.share_link = Some(link.to_string());
        }

        Ok(report)
    }

    fn render(cli: &Cli, report: &SearchReport) -> Result<()> {
        match cli.format {
            OutputFormat::Json => {
                let json = SearchOutput::from_report(report)
                    .to_json()
                    .map_err(|e| CspBypassError::render("json", e.to_string()))?;
                println!("{json}");
            }
            OutputFormat::Yaml => {
                let yaml = SearchOutput::from_report(report)
                    .to_yaml()
                    .map_err(|e| CspBypassError::render("yaml", e.to_string()))?;
                print!("{yaml}");
            }
            OutputFormat::Tsv => Self::print_with(&RenderFormat::Tsv, report)?,
            OutputFormat::Html => Self::print_with(&RenderFormat::Html, report)?,
            OutputFormat::Text if cli.should_use_styling() => {
                let formatter = if cli.no_color {
                    StyledFormatter::without_colors()
                } else {
                    StyledFormatter::new()
                };
                if let Err(e) = formatter.print_report(report) {
                    error!("styled output failed, falling back to plain text: {e}");
                    Self::print_with(&Self::plain_format(cli), report)?;
                }
            }
            OutputFormat::Text => Self::print_with(&Self::plain_format(cli), report)?,
        }
        Ok(())
    }

    fn plain_format(cli: &Cli) -> RenderFormat {
        RenderFormat::Text {
            show_author: true,
            show_metadata: cli.info_enabled(),
        }
    }

    fn print_with(format: &RenderFormat, report: &SearchReport) -> Result<()> {
        let formatter = output::create_formatter(format);
        let text = formatter
            .format_report(report)
            .map_err(|e| CspBypassError::render(formatter.file_extension(), e.to_string()))?;
        print!("{text}");
        Ok(())
    }

    /* ------------------------------------------------------------------ */
    /*                           Interactive mode                         */
    /* ------------------------------------------------------------------ */

    async fn run_interactive(cli: &Cli, config: Config) -> Result<i32> {
        let source: Arc<dyn TextSource> = source_from_config(&config.source)?.into();
        let debounce_delay = config.search.debounce_delay;
        let ctx = Arc::new(RenderContext::new(cli, config));
        let catalog = Arc::new(Catalog::new());
        let mut reloads = catalog.subscribe();

        // The load runs alongside input handling; it is never cancelled.
        let loader = {
            let ctx = ctx.clone();
            let catalog = catalog.clone();
            let source = source.clone();
            tokio::spawn(async move { Self::load_all(&ctx, &catalog, source.as_ref()).await })
        };

        let mut debouncer = Debouncer::new(debounce_delay);
        let mut latest: Option<String> = None;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = line.map_err(|e| CspBypassError::io("<stdin>", "read", e))?;
                    let Some(edit) = line else { break };
                    debug!(query = %edit, "query edited");
                    latest = Some(edit.clone());
                    debouncer.schedule(Self::evaluate(ctx.clone(), catalog.clone(), edit));
                }
                changed = reloads.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    reloads.borrow_and_update();
                    if let Some(ref query) = latest
                        && !catalog.snapshot().is_empty()
                    {
                        debug!("dataset arrived, re-running the latest query");
                        debouncer.schedule(Self::evaluate(ctx.clone(), catalog.clone(), query.clone()));
                    }
                }
            }
        }

        // Input closed: let the load finish so the last query sees real data.
        let loaded = loader.await.unwrap_or(false);
        if loaded
            && reloads.has_changed().unwrap_or(false)
            && let Some(query) = latest
        {
            reloads.borrow_and_update();
            debouncer.schedule(Self::evaluate(ctx.clone(), catalog.clone(), query));
        }
        debouncer.flush().await;
        Ok(0)
    }

    /// Search and render one debounced query edit.
    async fn evaluate(ctx: Arc<RenderContext>, catalog: Arc<Catalog>, raw_query: String) {
        if query::normalize(&raw_query).is_empty() {
            debug!("query cleared");
            return;
        }
        let rendered =
            Self::build_report(&ctx, &catalog, &raw_query).and_then(|r| Self::render(&ctx.cli, &r));
        if let Err(e) = rendered {
            error!(category = %e.category(), "query evaluation failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use std::time::Duration;

    use super::*;
    use crate::dataset::parse;
    use crate::sources::testing::MemorySource;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cspbypass").chain(args.iter().copied())).unwrap()
    }

    fn context(args: &[&str]) -> RenderContext {
        let cli = cli(args);
        let mut config = Config::default();
        config.merge_with_cli(&cli);
        RenderContext::new(&cli, config)
    }

    fn catalog() -> Catalog {
        Catalog::with_dataset(parse(
            "Domain\tCode\n\
             www.google.com\t<script src=\"https://www.google.com/jsonp?callback=alert\"></script>\n\
             www.youtube.com\t<script src=\"https://www.youtube.com/oembed?callback=alert\"></script>\n",
        ))
    }

    #[test]
    fn query_comes_from_argument() {
        assert_eq!(App::resolve_query(&cli(&["google"])).unwrap(), "google");
    }

    #[test]
    fn missing_query_is_input_error() {
        let err = App::resolve_query(&cli(&[])).unwrap_err();
        assert!(matches!(err, CspBypassError::MissingQuery));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn query_comes_from_link() {
        let link = share::link_for("https://cspbypass.com/", "script-src *.google.com").unwrap();
        let query = App::resolve_query(&cli(&["--from-link", link.as_str()])).unwrap();
        assert_eq!(query, "script-src *.google.com");

        let err = App::resolve_query(&cli(&["--from-link", "https://cspbypass.com/"])).unwrap_err();
        assert!(matches!(err, CspBypassError::InvalidLink { .. }));
    }

    #[test]
    fn report_applies_limit_and_link() {
        let ctx = context(&["google", "--limit", "1", "--link"]);
        let report = App::build_report(&ctx, &catalog(), "script-src *.google.com *.youtube.com")
            .unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.metadata.total_matches, 2);
        assert_eq!(report.metadata.dataset_size, 2);
        assert!(
            report
                .metadata
                .share_link
                .as_deref()
                .unwrap()
                .starts_with("https://cspbypass.com/#script-src")
        );
    }

    #[test]
    fn report_carries_warnings() {
        let ctx = context(&["x"]);
        ctx.warn("dataset could not be loaded".into());
        let report = App::build_report(&ctx, &Catalog::new(), "x").unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.metadata.warnings.len(), 1);
    }

    #[tokio::test]
    async fn failed_load_is_recorded_as_warning() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&["x", "--data-dir", dir.path().to_str().unwrap()]);
        let source = source_from_config(&ctx.config.source).unwrap();
        let catalog = catalog();
        assert!(!App::load_into(&ctx, &catalog, source.as_ref()).await);
        assert!(catalog.snapshot().is_empty());
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[tokio::test]
    async fn credits_load_only_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("credits.txt"), "alice\nbob\n").unwrap();
        let data_dir = dir.path().to_str().unwrap();

        let ctx = context(&["x", "--data-dir", data_dir]);
        let source = source_from_config(&ctx.config.source).unwrap();
        App::load_credits_into(&ctx, source.as_ref()).await;
        assert!(ctx.credits.get().is_none());

        let ctx = context(&["x", "--data-dir", data_dir, "--credits"]);
        App::load_credits_into(&ctx, source.as_ref()).await;
        assert_eq!(ctx.credits.get().unwrap().to_string(), "alice, bob");
    }

    #[tokio::test(start_paused = true)]
    async fn credits_are_ready_when_dataset_arrives() {
        let ctx = Arc::new(context(&["x", "--credits"]));
        let catalog = Arc::new(Catalog::new());
        let source: Arc<dyn TextSource> = Arc::new(
            MemorySource::default()
                .with("data.tsv", "Domain\tCode\nwww.google.com\t<script></script>\n")
                .with("credits.txt", "alice\nbob\n")
                .with_latency("credits.txt", Duration::from_millis(500)),
        );
        let mut reloads = catalog.subscribe();

        let loader = {
            let (ctx, catalog, source) = (ctx.clone(), catalog.clone(), source.clone());
            tokio::spawn(async move { App::load_all(&ctx, &catalog, source.as_ref()).await })
        };

        reloads.changed().await.unwrap();
        assert_eq!(catalog.snapshot().len(), 1);
        let report = App::build_report(&ctx, &catalog, "google").unwrap();
        assert_eq!(report.metadata.credits.unwrap().to_string(), "alice, bob");
        assert!(loader.await.unwrap());
    }
}

//! CLI command handler: resolve options, install Ctrl+C, run the pipeline, report.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::engine::tools::timeout_from_secs;
use crate::pipeline::StopFlag;
use crate::utils::{PackagePaths, apply_file_to_opts, load_corpus_toml, setup_logging};

/// Overwrite opts field from a CLI flag when given.
macro_rules! apply_cli_opt {
    ($cli:expr, $opts:expr, $cli_field:ident => $opts_field:ident) => {
        if let Some(ref v) = $cli.$cli_field {
            $opts.$opts_field = v.clone();
        }
    };
}

/// Defaults, then the config file (if any), then CLI flags. An explicit `--config` must exist.
pub fn build_opts(cli: &Cli) -> Result<Opts> {
    let mut opts = Opts::default();
    let config_path = match &cli.config {
        Some(path) if !path.exists() => bail!("config file {} not found", path.display()),
        Some(path) => path.clone(),
        None => PathBuf::from(PackagePaths::get().config_filename()),
    };
    if let Some(file) = load_corpus_toml(&config_path)? {
        apply_file_to_opts(&file, &mut opts);
    }
    apply_cli_opt!(cli, opts, input_dir => input_dir);
    apply_cli_opt!(cli, opts, output_file => output_file);
    apply_cli_opt!(cli, opts, workers => num_workers);
    if cli.queue_capacity.is_some() {
        opts.queue_capacity = cli.queue_capacity;
    }
    if let Some(secs) = cli.timeout {
        opts.fetch_timeout = timeout_from_secs(secs);
    }
    if let Some(n) = cli.retries {
        opts.retry.max_retries = n;
    }
    if let Some(ms) = cli.retry_backoff_ms {
        opts.retry.initial_backoff = Duration::from_millis(ms);
    }
    apply_cli_opt!(cli, opts, base_url => base_url);
    apply_cli_opt!(cli, opts, file_prefix => file_prefix);
    if cli.rules.is_some() {
        opts.rules_path = cli.rules.clone();
    }
    apply_cli_opt!(cli, opts, user_agent => user_agent);
    apply_cli_opt!(cli, opts, strict => strict);
    apply_cli_opt!(cli, opts, verbose => verbose);
    Ok(opts)
}

/// Run the scrape for `cli`. Ctrl+C requests a cooperative stop; the run then drains and
/// returns an error so the exit status reflects the interruption.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = build_opts(cli)?;
    setup_logging(opts.verbose);

    let stop = StopFlag::new();
    let stop_handler = stop.clone();
    ctrlc::set_handler(move || {
        stop_handler.request();
    })
    .context("set Ctrl+C handler")?;

    debug!(
        "Scraping {} into {}",
        opts.input_dir.display(),
        opts.output_file.display()
    );
    let report = crate::run_corpus(&opts, stop)?;
    info!("{}", report);
    if report.cancelled {
        warn!("Stopped before the dump was exhausted; every record written so far is kept");
        return Err(anyhow::anyhow!("Scrape cancelled by user"));
    }
    Ok(())
}

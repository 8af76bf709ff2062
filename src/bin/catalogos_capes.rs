use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use catalogos_capes::app::{App, BatchReport};
use catalogos_capes::catalog::CatalogHttpClient;
use catalogos_capes::config::ConfigLoader;
use catalogos_capes::download::HttpDownloader;
use catalogos_capes::error::CatalogError;
use catalogos_capes::output::{JsonOutput, OutputMode};
use catalogos_capes::progress::ConsoleProgress;

#[derive(Parser)]
#[command(name = "catalogos-capes")]
#[command(about = "Download the CAPES theses and dissertations catalog from the open-data portal")]
#[command(version, author)]
struct Cli {
    /// Directory the resource files are written to [default: ./data]
    #[arg(long, short = 'd')]
    dest_dir: Option<Utf8PathBuf>,

    /// JSON config file [default: ./catalogos-capes.json when present]
    #[arg(long)]
    config: Option<String>,

    /// Dataset name to match (case-insensitive substring)
    #[arg(long)]
    name: Option<String>,

    /// Only download resources with this format, e.g. CSV or XLSX
    #[arg(long)]
    format: Option<String>,

    /// List the matching resources without downloading them
    #[arg(long)]
    dry_run: bool,

    /// Print the batch report as JSON instead of progress output
    #[arg(long)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    match error {
        CatalogError::MissingConfig(_)
        | CatalogError::ConfigRead(_)
        | CatalogError::ConfigParse(_) => 2,
        error if error.is_catalog_error() => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let mut resolved = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(name) = cli.name {
        resolved.dataset_name = name;
    }
    if let Some(format) = cli.format {
        resolved.format = Some(format);
    }
    let dest_dir = cli.dest_dir.unwrap_or_else(|| resolved.dest_dir.clone());
    let options = resolved.batch_options(cli.dry_run);

    let catalog = CatalogHttpClient::with_settings(resolved.catalog.clone())?;
    let downloader =
        HttpDownloader::with_policy(resolved.retry.clone(), resolved.catalog.timeout)?;
    let app = App::new(catalog, downloader);

    match output_mode {
        OutputMode::NonInteractive => {
            let report = app.run(&dest_dir, &options, &JsonOutput)?;
            JsonOutput::print_report(&report).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let progress = ConsoleProgress::new();
            let report = app.run(&dest_dir, &options, &progress)?;
            drop(progress);
            print_summary(&report);
        }
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    println!("{cyan}CAPES catalog: {}{reset}", report.dataset_name);
    if report.dry_run {
        println!("{yellow}Dry run, {} matching resource(s):{reset}", report.matched.len());
        for row in &report.matched {
            println!("  [{}] {}", row.resource_format, row.resource_url);
        }
        return;
    }
    if report.matched.is_empty() {
        println!("{yellow}No resources matched.{reset}");
        return;
    }

    println!(
        "{green}Downloaded: {} of {} into {}{reset}",
        report.downloaded.len(),
        report.matched.len(),
        report.dest_dir
    );
    for item in &report.downloaded {
        println!("{green}  {} ({}){reset}", item.path, item.format);
    }
    if !report.failures.is_empty() {
        println!("{red}Failed: {}{reset}", report.failures.len());
        for failure in &report.failures {
            println!("{red}  {}: {}{reset}", failure.url, failure.error);
        }
    }
}

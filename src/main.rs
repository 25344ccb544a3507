//! docsplit - split a single-page language reference into markdown files

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use docsplit::{BatchSummary, ConvertConfig, DocumentSource, VersionOutcome, convert_batch};

#[derive(Parser)]
#[command(name = "docsplit")]
#[command(version, about = "Split an HTML language reference into markdown files", long_about = None)]
#[command(after_help = "EXAMPLES:
    docsplit master.html                    Write docs/NN-*.md and docs/README.md
    docsplit --doc-version 0.11.0 ref.html  Label the output as version 0.11.0
    docsplit -o out 0.10.0.html 0.11.0.html Write out/docs-0.10.0 and out/docs-0.11.0")]
struct Cli {
    /// Input HTML files, one per version
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Version label for a single input (default: file stem)
    #[arg(long, value_name = "ID")]
    doc_version: Option<String>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = "docs")]
    output: PathBuf,

    /// Project name used in the index heading
    #[arg(long, value_name = "NAME")]
    title: Option<String>,

    /// Source URL of the page; `{version}` is replaced with the version
    #[arg(long, value_name = "TEMPLATE")]
    source_url: Option<String>,

    /// Table-of-contents depth listed in the index
    #[arg(long, value_name = "N", default_value_t = 1)]
    index_depth: usize,

    /// Emit an HTML anchor before every heading
    #[arg(long)]
    anchors: bool,

    /// Print the summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn config(&self) -> ConvertConfig {
        let mut config = ConvertConfig::default()
            .with_index_depth(self.index_depth)
            .with_heading_anchors(self.anchors);
        if let Some(title) = &self.title {
            config = config.with_project_name(title);
        }
        if let Some(url) = &self.source_url {
            config = config.with_source_url(url);
        }
        config
    }

    /// Checks clap cannot express declaratively.
    fn validate(&self) -> Result<(), clap::Error> {
        if self.doc_version.is_some() && self.inputs.len() > 1 {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "--doc-version applies to a single input; with several inputs each \
                 version is taken from its file stem",
            ));
        }
        Ok(())
    }

    fn default_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

#[derive(Serialize)]
struct SummaryJson<'a> {
    succeeded: usize,
    failed: usize,
    versions: Vec<VersionJson<'a>>,
}

#[derive(Serialize)]
struct VersionJson<'a> {
    version: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    variant: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dir: Option<String>,
    files: usize,
    unresolved_links: usize,
    fallbacks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> VersionJson<'a> {
    fn from_outcome(outcome: &'a VersionOutcome) -> Self {
        match &outcome.result {
            Ok(report) => VersionJson {
                version: &outcome.version,
                ok: true,
                variant: Some(report.variant.as_str()),
                output_dir: Some(report.output_dir.display().to_string()),
                files: report.files.len(),
                unresolved_links: report.diagnostics.unresolved_links.len(),
                fallbacks: report.diagnostics.fallbacks.len(),
                error: None,
            },
            Err(e) => VersionJson {
                version: &outcome.version,
                ok: false,
                variant: None,
                output_dir: None,
                files: 0,
                unresolved_links: 0,
                fallbacks: 0,
                error: Some(e.to_string()),
            },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = cli.validate() {
        e.exit();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.default_log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let sources = match read_sources(&cli) {
        Ok(sources) => sources,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = cli.config();
    let summary = if let [source] = sources.as_slice() {
        // A single input goes straight into the output directory
        let result = docsplit::convert_to_dir(source, &cli.output, &config);
        BatchSummary {
            outcomes: vec![VersionOutcome {
                version: source.version.clone(),
                result,
            }],
        }
    } else {
        convert_batch(&sources, &cli.output, &config)
    };

    if cli.json {
        if let Err(e) = print_json(&summary) {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    } else {
        print_summary(&summary, cli.quiet);
    }

    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn read_sources(cli: &Cli) -> docsplit::Result<Vec<DocumentSource>> {
    cli.inputs
        .iter()
        .map(|path| DocumentSource::from_path(path, cli.doc_version.as_deref()))
        .collect()
}

fn print_json(summary: &BatchSummary) -> serde_json::Result<()> {
    let json = SummaryJson {
        succeeded: summary.succeeded().count(),
        failed: summary.failure_count(),
        versions: summary.outcomes.iter().map(VersionJson::from_outcome).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_summary(summary: &BatchSummary, quiet: bool) {
    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(report) if !quiet => {
                println!(
                    "{}: {} files in {} ({} schema)",
                    outcome.version,
                    report.files.len(),
                    report.output_dir.display(),
                    report.variant
                );
            }
            Ok(_) => {}
            Err(e) => eprintln!("error: {}: {e}", outcome.version),
        }
    }
    if summary.outcomes.len() > 1 && !quiet {
        println!(
            "{}/{} versions converted",
            summary.succeeded().count(),
            summary.outcomes.len()
        );
    }
}

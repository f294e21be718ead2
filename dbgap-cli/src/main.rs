use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use clap::Parser;
use dbgap_client::{ClientConfig, GapClient, KeywordFilter, ValidationPolicy};
use indicatif::ProgressStyle;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(
    name = "dbgap-cli",
    about = "List smoking-related dbGaP variables of a study",
    long_about = "Searches dbGaP for every variable of a study and prints those whose \
                  description mentions smoking, tobacco, nicotine or vaping as \
                  tab-separated name, phv accession and description, sorted by accession"
)]
struct Cli {
    /// Contact email sent to NCBI with every request
    #[arg(value_name = "EMAIL")]
    email: String,

    /// Study accession to search, e.g. phs000280 or phs000280.v8.p1
    #[arg(value_name = "STUDY")]
    study: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// API key for NCBI E-utilities (increases rate limit)
    #[arg(long, env = "NCBI_API_KEY")]
    api_key: Option<String>,

    /// Tool name for NCBI requests
    #[arg(long, env = "NCBI_TOOL", default_value = "dbgap-cli")]
    tool: String,

    /// Keyword to match in descriptions (repeatable, replaces the default list)
    #[arg(short, long = "keyword", value_name = "KEYWORD")]
    keywords: Vec<String>,

    /// Skip and log records that fail validation instead of aborting
    #[arg(long)]
    skip_invalid: bool,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new()
            .with_email(&self.email)
            .with_tool(&self.tool)
            .with_timeout_seconds(self.timeout);

        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }

        config
    }

    fn keyword_filter(&self) -> KeywordFilter {
        if self.keywords.is_empty() {
            KeywordFilter::default()
        } else {
            KeywordFilter::new(&self.keywords)
        }
    }

    fn validation_policy(&self) -> ValidationPolicy {
        if self.skip_invalid {
            ValidationPolicy::SkipAndLog
        } else {
            ValidationPolicy::FailFast
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let filter = if verbose { "debug" } else { "info" };

    // One spinner per active client span (search, each ESummary page)
    let style = ProgressStyle::with_template(
        "{spinner:.green} {span_child_prefix}{span_name}{{{span_fields}}} [{elapsed}]",
    )
    .context("Failed to set progress style")?;
    let indicatif_layer = IndicatifLayer::new().with_progress_style(style);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(indicatif_layer.get_stderr_writer()),
        )
        .with(indicatif_layer)
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let client = GapClient::with_config(cli.client_config()).context("Failed to create client")?;
    let filter = cli.keyword_filter();

    tracing::info!(study = %cli.study, keywords = ?filter.keywords(), "Searching dbGaP variables");

    let (table, summary) = client
        .collect_phenotypes(&cli.study, &filter, cli.validation_policy())
        .await
        .with_context(|| format!("Failed to collect variables for {}", cli.study))?;

    if summary.skipped > 0 {
        tracing::warn!(skipped = summary.skipped, "Some records failed validation");
    }

    table
        .write_to(BufWriter::new(io::stdout().lock()))
        .context("Failed to write results")?;

    Ok(())
}

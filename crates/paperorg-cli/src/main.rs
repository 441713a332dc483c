use std::{
  path::{Path, PathBuf},
  process::ExitCode,
};

use clap::{builder::ArgAction, Parser};
use console::{style, Emoji};
use errors::CliError;
use paperorg::{
  config::ExtractionConfig, download::Downloader, extract::MetadataExtractor,
  input::detect_input_type,
};
use processors::{processor_for, Context, InputProcessor};
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

pub mod errors;
pub mod processors;

static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static SUMMARY: Emoji<'_, '_> = Emoji("📊 ", "");

#[derive(Parser)]
#[command(
  author,
  version,
  about = "Organize academic papers with metadata extraction and descriptive filenames",
  after_help = "INPUT can be a URL to download, a PDF file, or a directory of PDFs.\nDirectory \
                priority: --dir > PAPERS_DIR > ~/Papers"
)]
struct Cli {
  /// URL, PDF file or directory to organize
  #[arg(value_name = "INPUT")]
  input: String,

  /// Directory to save organized files
  #[arg(long, env = "PAPERS_DIR")]
  dir: Option<PathBuf>,

  /// Custom filename for the organized file
  #[arg(long)]
  name: Option<String>,

  /// Keep file names instead of generating them from PDF metadata
  #[arg(long)]
  no_auto_name: bool,

  /// Skip text mining and arXiv/CrossRef lookups
  #[arg(long)]
  no_enrich: bool,

  /// Suppress progress output for scripting
  #[arg(long)]
  quiet: bool,

  /// Verbose mode (-v, -vv, -vvv)
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging verbosity"
    )]
  verbose: u8,
}

/// Setup logging with the specified verbosity level
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_target(true)
    .init();
}

/// Replaces a leading `~` with the home directory.
fn expand_home(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), dirs::home_dir()) {
    (Ok(rest), Some(home)) => home.join(rest),
    _ => path.to_path_buf(),
  }
}

/// Resolves and creates the destination directory.
///
/// An explicit directory (`--dir` or `PAPERS_DIR`) must be creatable. The default
/// `~/Papers` falls back to the working directory when it cannot be created.
fn setup_destination(dir: Option<&Path>, quiet: bool) -> Result<PathBuf, CliError> {
  if let Some(dir) = dir {
    let dir = expand_home(dir);
    std::fs::create_dir_all(&dir)
      .map_err(|source| CliError::Directory { path: dir.clone(), source })?;
    return Ok(dir);
  }

  let Some(papers) = dirs::home_dir().map(|home| home.join("Papers")) else {
    debug!("No home directory, using the working directory");
    return Ok(std::env::current_dir()?);
  };
  let first_run = !papers.exists();

  if let Err(e) = std::fs::create_dir_all(&papers) {
    debug!("Cannot create {}: {e}, using the working directory", papers.display());
    return Ok(std::env::current_dir()?);
  }

  if first_run && !quiet {
    eprintln!(
      "{}Created {} directory for your organized papers",
      style(FOLDER).cyan(),
      style(papers.display()).yellow()
    );
    eprintln!("   Use --dir to specify a different location, or set PAPERS_DIR");
  }
  Ok(papers)
}

async fn run(cli: Cli) -> Result<(), CliError> {
  let kind = detect_input_type(&cli.input)?;
  trace!("Input {} is a {kind}", cli.input);
  let destination = setup_destination(cli.dir.as_deref(), cli.quiet)?;
  debug!("Organizing into {}", destination.display());

  let config = ExtractionConfig { enhanced: !cli.no_enrich, ..ExtractionConfig::default() };
  let context = Context {
    destination,
    custom_name: cli.name,
    auto_name: !cli.no_auto_name,
    quiet: cli.quiet,
    extractor: MetadataExtractor::new(config),
    downloader: Downloader::new(),
  };

  let results = processor_for(kind).process(&cli.input, &context).await?;
  if !cli.quiet && results.len() > 1 {
    println!(
      "\n{}Summary: Processed {} files",
      style(SUMMARY).cyan(),
      style(results.len()).yellow()
    );
  }
  Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  match run(cli).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("{} {e}", style("✗").red());
      ExitCode::FAILURE
    },
  }
}

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use medcode_extractor::{
    config, init_tracing, render_report, write_export, AutoSource, BatchReport, ExtractorConfig,
    ReportView, EXPORT_FILE_NAME,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "medcode-extractor", version, about = "Extract CPT, HCPCS and PLA codes from documents")]
struct Cli {
    /// Extra `code,description` CSV layered over the built-in descriptions
    #[arg(long, global = true, env = "MEDCODE_DESCRIPTIONS")]
    descriptions: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract codes from one or more documents and export them as CSV
    Extract {
        #[command(flatten)]
        batch: BatchArgs,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Skip writing the CSV export
        #[arg(long)]
        no_export: bool,
    },
    /// Print the description of each code
    Describe {
        /// Codes to look up
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Browse extracted codes in a terminal UI
    Ui {
        #[command(flatten)]
        batch: BatchArgs,
    },
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Documents to process (.pdf, .txt)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Where to write the combined CSV export
    #[arg(short, long, env = "MEDCODE_OUTPUT", default_value = EXPORT_FILE_NAME)]
    output: PathBuf,

    /// Only accept letter/digit codes that form a whole token
    #[arg(long)]
    strict_boundaries: bool,

    /// Abort the whole batch if any document cannot be read
    #[arg(long)]
    fail_fast: bool,
}

impl BatchArgs {
    fn config(&self, descriptions: Option<PathBuf>) -> ExtractorConfig {
        ExtractorConfig::default()
            .with_strict_boundaries(self.strict_boundaries)
            .with_fail_fast(self.fail_fast)
            .with_descriptions(descriptions)
            .with_output(self.output.clone())
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);

    match cli.command {
        Commands::Extract { batch, json, no_export } => {
            run_extract(&batch.config(cli.descriptions), &batch.files, json, no_export)?;
        }
        Commands::Describe { codes } => {
            run_describe(&ExtractorConfig::default().with_descriptions(cli.descriptions), &codes)?;
        }
        Commands::Ui { batch } => {
            run_ui_mode(&batch.config(cli.descriptions), &batch.files)?;
        }
    }

    Ok(())
}

fn progress_line(index: usize, total: usize, name: &str) -> String {
    format!("Processing: {} ({}/{})", name, index, total)
}

fn run_batch(
    config: &ExtractorConfig,
    files: &[PathBuf],
    show_progress: bool,
) -> Result<BatchReport> {
    config
        .aggregator()
        .extract_files_with_progress(&AutoSource, files, |index, total, name| {
            if show_progress {
                println!("{}", progress_line(index, total, name));
            }
        })
        .context("Error processing files. Please make sure every file is a readable document")
}

fn run_extract(config: &ExtractorConfig, files: &[PathBuf], json: bool, no_export: bool) -> Result<()> {
    let table = config.load_descriptions()?;
    let report = run_batch(config, files, !json)?;

    if json {
        let view = ReportView::new(&report, &table);
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render_report(&report, &table));
    }

    if !no_export && report.summary.documents_processed > 0 {
        let rows = write_export(&config.output_path, &report.combined)?;
        if !json {
            println!("✓ Wrote {} codes to {}", rows, config.output_path.display());
        }
    }

    if report.summary.has_failures() && report.summary.documents_processed == 0 {
        anyhow::bail!("No documents could be processed");
    }

    Ok(())
}

fn run_describe(config: &ExtractorConfig, codes: &[String]) -> Result<()> {
    let table = config.load_descriptions()?;

    for code in codes {
        println!("{}", table.format_line(code.trim()));
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &ExtractorConfig, files: &[PathBuf]) -> Result<()> {
    let table = config.load_descriptions()?;
    let report = run_batch(config, files, false)?;

    let mut app = ui::App::new(report, table, config.output_path.clone());
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &ExtractorConfig, _files: &[PathBuf]) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: medcode-extractor extract <files>");
    std::process::exit(1);
}

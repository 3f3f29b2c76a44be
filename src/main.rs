use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use env_logger::Env;
use serde::de::DeserializeOwned;

use siteforge_export::docx::ModernTemplateBuilder;
use siteforge_export::{ExportConfig, ExportOutput, SurveyJob, WorkbookJob, xlsx};

#[derive(Parser)]
#[command(
    name = "siteforge-export",
    version,
    about = "Export SiteForge survey reports and quantity workbooks"
)]
struct Cli {
    /// Export config (default: <config dir>/siteforge/export.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export a survey report from a JSON job
    Survey {
        #[arg(long, value_name = "PATH")]
        job: PathBuf,
        /// Directory the document is written to
        #[arg(long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
    },
    /// Fill the quantity workbook from a JSON job
    Workbook {
        #[arg(long, value_name = "PATH")]
        job: PathBuf,
        #[arg(long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
    },
    /// Import catalog anchors from a catalog workbook and print them as JSON
    Catalog {
        #[arg(long, value_name = "PATH")]
        workbook: PathBuf,
    },
    /// Write a blank modern survey template
    Template {
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
        /// Date stamped in the header, today when omitted
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },
}

fn read_job<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read job {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid job {}", path.display()))
}

fn write_output(dir: &Path, output: &ExportOutput) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(&output.filename);
    fs::write(&path, &output.bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    let summary = serde_json::json!({
        "path": path,
        "version": output.version,
    });
    println!("{summary}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ExportConfig::load_from(path)?,
        None => ExportConfig::load(),
    };

    match cli.command {
        Command::Survey { job, out } => {
            let job: SurveyJob = read_job(&job)?;
            let output = siteforge_export::export_survey_document(&config, &job).context("Survey export failed")?;
            write_output(&out, &output)?;
        }
        Command::Workbook { job, out } => {
            let job: WorkbookJob = read_job(&job)?;
            let output =
                siteforge_export::export_quantity_workbook(&config, &job).context("Workbook export failed")?;
            write_output(&out, &output)?;
        }
        Command::Catalog { workbook } => {
            let file = fs::File::open(&workbook)
                .with_context(|| format!("Failed to open catalog workbook {}", workbook.display()))?;
            let entries = xlsx::import_catalog(io::BufReader::new(file), &config.catalog_layout)?;
            log::info!("Imported {} catalog anchors", entries.len());
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Command::Template { out, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let bytes = ModernTemplateBuilder::new(date).build()?.to_bytes()?;
            fs::write(&out, bytes).with_context(|| format!("Failed to write {}", out.display()))?;
        }
    }
    Ok(())
}

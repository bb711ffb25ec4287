// Entry point and high-level CLI flow.
//
// One run goes through the whole batch:
// - load every region source (or explicit files) and report skipped regions,
// - write the data-quality report computed on the raw rows,
// - clean, then derive regional statistics, cleaning impact and the site
//   recommendations from the cleaned rows,
// - print short previews, then export every table into the output directory.
use clap::Parser;
use log::{error, info};
use solar_report::config::Config;
use solar_report::errors::{OutputError, PipelineError};
use solar_report::loader::{self, LoadReport};
use solar_report::summary::{self, Overview};
use solar_report::types::{
    CorrelationMatrix, Dataset, ImpactRow, QualityRow, Recommendation, RegionStatsRow, SummaryRow,
};
use solar_report::{aggregate, cleaner, impact, output, quality, recommend, util};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "solar_report")]
#[command(about = "Quality, cleaning and site recommendations for regional solar sensor data", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding `<Region>_solar_data.csv` sources
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory the reports are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Region identifier to load (repeatable); replaces the configured list
    #[arg(long = "region")]
    regions: Vec<String>,

    /// Load these CSV files instead of the configured regions
    #[arg(long, num_args = 1..)]
    files: Vec<PathBuf>,

    /// Rows shown in each console preview
    #[arg(long, default_value_t = 3)]
    preview_rows: usize,

    /// Write log output to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Only print previews, write nothing to disk
    #[arg(long)]
    no_export: bool,
}

fn init_logging(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(args: &Args) -> Result<Config, PipelineError> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if !args.regions.is_empty() {
        config.regions = args.regions.clone();
    }
    config.validate()?;
    Ok(config)
}

fn print_load_report(report: &LoadReport) {
    println!(
        "Processing dataset... ({} rows loaded from {} regions)",
        util::format_int(report.total_rows),
        report.loaded.len()
    );
    let rejected: usize = report.loaded.iter().map(|l| l.rejected_rows).sum();
    if rejected > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            util::format_int(rejected)
        );
    }
    for err in &report.skipped {
        println!("Warning: {}", err);
    }
    println!();
}

/// Every table of a run, computed before anything is shown or written.
struct Analysis {
    quality: Vec<QualityRow>,
    overview: Overview,
    summary: Vec<SummaryRow>,
    correlation: CorrelationMatrix,
    stats: Vec<RegionStatsRow>,
    impact: Vec<ImpactRow>,
    recommendation: Recommendation,
}

fn analyze(raw: &Dataset, cleaned: &Dataset) -> Result<Analysis, PipelineError> {
    let report = quality::generate_quality_report(raw);
    let stats = aggregate::calculate_regional_stats(cleaned)?;
    let impact = impact::analyze_cleaning_impact(cleaned)?;
    let recommendation = recommend::generate_recommendations(cleaned)?;
    Ok(Analysis {
        quality: output::quality_rows(&report),
        overview: Overview::new(raw, cleaned),
        summary: output::summary_rows(&summary::describe(cleaned)),
        correlation: summary::correlation_matrix(cleaned, &summary::correlation_columns()),
        stats: output::regional_rows(&stats),
        impact: output::impact_rows(&impact),
        recommendation,
    })
}

fn print_previews(analysis: &Analysis, rows: usize) {
    output::preview_table("Data Quality Report", Some("raw data"), &analysis.quality, analysis.quality.len());

    let overview = &analysis.overview;
    println!(
        "Total Records: {} | Clean Records: {} | Removed: {}\n",
        util::format_int(overview.total_records),
        util::format_int(overview.clean_records),
        util::format_int(overview.removed())
    );
    output::preview_table("Cleaned Data Summary", None, &analysis.summary, analysis.summary.len());
    output::preview_table("Regional Statistics", None, &analysis.stats, rows);
    output::preview_table(
        "Cleaning Impact",
        Some("mean change after cleaning events"),
        &analysis.impact,
        rows,
    );
    let rec_rows = output::recommendation_rows(&analysis.recommendation);
    output::preview_table("Strategic Installation Recommendations", None, &rec_rows, rec_rows.len());
}

fn export(out: &Path, cleaned: &Dataset, analysis: &Analysis) -> Result<(), PipelineError> {
    fs::create_dir_all(out).map_err(|source| OutputError::Io {
        path: out.to_path_buf(),
        source,
    })?;
    output::write_csv(&out.join("data_quality_report.csv"), &analysis.quality)?;
    output::write_csv(&out.join("cleaned_data.csv"), &output::cleaned_rows(cleaned))?;
    output::write_csv(&out.join("summary_stats.csv"), &analysis.summary)?;
    output::write_correlation_csv(&out.join("correlation_matrix.csv"), &analysis.correlation)?;
    output::write_csv(&out.join("regional_stats.csv"), &analysis.stats)?;
    output::write_csv(&out.join("cleaning_impact.csv"), &analysis.impact)?;
    output::write_json(
        &out.join("recommendations.json"),
        &output::recommendations_json(&analysis.recommendation),
    )?;
    output::write_text(
        &out.join("recommendations.txt"),
        &output::recommendations_text(&analysis.recommendation),
    )?;
    info!("Outputs written to {}", out.display());
    println!("(Full tables exported to {})", out.display());
    Ok(())
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = build_config(args)?;
    info!("Starting data processing pipeline");

    let (raw, load_report) = if args.files.is_empty() {
        loader::load_all_regions(&config)?
    } else {
        loader::load_files(&args.files)?
    };
    print_load_report(&load_report);
    info!("Regions in dataset: {}", raw.regions().join(", "));

    let cleaned = cleaner::clean_data(&raw, &config.policy);
    let analysis = analyze(&raw, &cleaned)?;
    print_previews(&analysis, args.preview_rows);
    if !args.no_export {
        export(&config.output_dir, &cleaned, &analysis)?;
    }
    info!("Processing completed successfully");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(args.log_file.as_deref()) {
        eprintln!("Failed to set up logging: {}", e);
        return ExitCode::FAILURE;
    }
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Processing failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

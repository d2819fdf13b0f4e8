use anyhow::{Result, bail};
use audio_inventory::{Inventory, InventoryOptions, TaxonomyIndex, build_inventory};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// dataset directory, holding train_audio/ and taxonomy.csv by default
    data_dir: PathBuf,

    /// audio root with one subdirectory per label, default to <DATA_DIR>/train_audio
    #[arg(long)]
    audio_dir: Option<PathBuf>,

    /// taxonomy table, default to <DATA_DIR>/taxonomy.csv
    #[arg(long)]
    taxonomy: Option<PathBuf>,

    /// write metadata_inventory.csv and summary_statistics.json into this directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// number of threads to use, default to CPU core count
    #[arg(short, long)]
    threads: Option<usize>,

    /// per-file extraction timeout in seconds, 0 disables it
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// do not draw a progress bar
    #[arg(long)]
    no_progress: bool,

    /// how many of the rarest labels to list
    #[arg(long, default_value_t = 10)]
    rarest: usize,
}

fn main() -> Result<()> {
    _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .parse_filters("symphonia=error")
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();
    let audio_dir = cli
        .audio_dir
        .clone()
        .unwrap_or_else(|| cli.data_dir.join("train_audio"));
    let taxonomy_path = cli
        .taxonomy
        .clone()
        .unwrap_or_else(|| cli.data_dir.join("taxonomy.csv"));

    info!("Verifying data access...");
    if !audio_dir.exists() || !taxonomy_path.exists() {
        bail!(
            "Required data not found: audio dir {:?}, taxonomy {:?}",
            audio_dir,
            taxonomy_path
        );
    }

    let taxonomy = TaxonomyIndex::from_csv_path(&taxonomy_path)?;
    info!("Taxonomy loaded: {} species.", taxonomy.len());

    let options = InventoryOptions {
        num_threads: cli.threads,
        decode_timeout: (cli.timeout_secs > 0).then(|| Duration::from_secs(cli.timeout_secs)),
        show_progress: !cli.no_progress,
    };

    let inventory = match build_inventory(&audio_dir, &taxonomy, &options) {
        Ok(inventory) => inventory,
        Err(e) => {
            error!("Inventory failed: {}", e);
            Err(e)?
        }
    };

    if let Some(output_dir) = &cli.output_dir {
        inventory.save_to(output_dir)?;
    }

    print_report(&inventory, cli.rarest);
    Ok(())
}

fn print_report(inventory: &Inventory, rarest: usize) {
    let summary = &inventory.summary;
    info!("--- Data Inventory Summary ---");
    info!("Total Files: {}", summary.total_files);
    info!("Total Species: {}", summary.total_species);
    info!("Total Taxonomic Groups: {}", summary.total_groups);
    info!("Errors Encountered: {}", summary.error_count);
    match summary.duration_stats.total_hours {
        Some(hours) => info!("Total Audio Duration: {:.2} hours", hours),
        None => info!("Total Audio Duration: no readable files"),
    }
    if let (Some(mean), Some(median), Some(min), Some(max), Some(std)) = (
        summary.duration_stats.mean,
        summary.duration_stats.median,
        summary.duration_stats.min,
        summary.duration_stats.max,
        summary.duration_stats.std,
    ) {
        info!(
            "Duration (s): mean {:.2}, median {:.2}, min {:.2}, max {:.2}, std {:.2}",
            mean, median, min, max, std
        );
    }

    info!("Files per group:");
    for (group, count) in &inventory.group_counts.per_group {
        info!("  - {}: {} files", group, count);
    }
    info!("Sampling Rates:");
    for (rate, count) in &summary.sampling_rate_stats {
        info!("  - {} Hz: {} files", rate, count);
    }
    info!("Formats:");
    for (format, count) in &summary.format_counts {
        info!("  - .{}: {} files", format, count);
    }
    info!("Species with Fewest Files:");
    for (label, count) in summary.rarest_labels(rarest) {
        info!("  - {}: {} files", label, count);
    }
}

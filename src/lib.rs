/// Module for label and group counting
pub mod counts;
/// Module for recursive audio file discovery
pub mod discovery;
/// Module for error handling
pub mod error;
/// Module for per-file metadata extraction
pub mod extract;
/// Module for the taxonomy-joined inventory table
pub mod inventory;
/// Module for saving inventory results
pub mod save;
/// Module for summary statistics
pub mod summary;
/// Module for the taxonomy lookup table
pub mod taxonomy;

pub use crate::counts::{GroupCounts, UNKNOWN_GROUP, count_files_per_group};
pub use crate::discovery::find_audio_files;
pub use crate::error::Error;
pub use crate::extract::{FileRecord, MetadataExtractor};
pub use crate::inventory::{InventoryRow, InventoryTable};
pub use crate::summary::{DurationStats, SummaryReport};
pub use crate::taxonomy::{TaxonomyEntry, TaxonomyIndex};

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum_macros::Display;

/// Audio container formats accepted by discovery and extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AudioFormat {
    Ogg,
    Wav,
    Mp3,
    Flac,
    Aiff,
    Aif,
}

impl AudioFormat {
    /// Returns the allow-list of file extensions (lowercase, without the dot)
    #[inline]
    pub fn supported_extensions() -> &'static [&'static str] {
        &["ogg", "wav", "mp3", "flac", "aiff", "aif"]
    }

    /// Creates an AudioFormat from a file path based on its extension, case-insensitively
    #[inline]
    pub fn from_path(value: impl AsRef<Path>) -> Option<Self> {
        Some(match format_of(value).as_str() {
            "ogg" => Self::Ogg,
            "wav" => Self::Wav,
            "mp3" => Self::Mp3,
            "flac" => Self::Flac,
            "aiff" => Self::Aiff,
            "aif" => Self::Aif,
            _ => return None,
        })
    }
}

/// Lowercased extension of `path` without the dot; empty if there is none.
pub fn format_of(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .extension()
        .unwrap_or_default()
        .to_string_lossy()
        .to_lowercase()
}

/// Configuration options for building an inventory
#[derive(Debug, Clone)]
pub struct InventoryOptions {
    /// Number of threads for parallel extraction
    pub num_threads: Option<usize>,
    /// Per-file extraction budget. Files exceeding it are recorded as failures.
    pub decode_timeout: Option<Duration>,
    /// Draw a progress bar while extracting
    pub show_progress: bool,
}

impl Default for InventoryOptions {
    fn default() -> Self {
        InventoryOptions {
            num_threads: None,
            decode_timeout: Some(extract::DEFAULT_DECODE_TIMEOUT),
            show_progress: true,
        }
    }
}

/// Everything produced for one dataset root
#[derive(Debug, Clone)]
pub struct Inventory {
    pub group_counts: GroupCounts,
    pub table: InventoryTable,
    pub summary: SummaryReport,
}

impl Inventory {
    /// Writes `metadata_inventory.csv` and `summary_statistics.json` into `output_dir`.
    pub fn save_to(&self, output_dir: impl AsRef<Path>) -> Result<(), Error> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir).map_err(|e| Error::Save {
            path: output_dir.to_path_buf(),
            source: e.into(),
        })?;

        let csv_path = output_dir.join("metadata_inventory.csv");
        save::save_inventory_csv(&csv_path, &self.table).map_err(|e| Error::Save {
            path: csv_path.clone(),
            source: e,
        })?;
        let json_path = output_dir.join("summary_statistics.json");
        save::save_summary_json(&json_path, &self.summary).map_err(|e| Error::Save {
            path: json_path.clone(),
            source: e,
        })?;
        info!("Results saved to {:?}", output_dir);
        Ok(())
    }
}

/// Discovers, extracts, joins and summarizes every audio file under `audio_dir`.
///
/// Only discovery can fail. Unreadable files end up as rows with `error` set.
pub fn build_inventory(
    audio_dir: impl AsRef<Path>,
    taxonomy: &TaxonomyIndex,
    options: &InventoryOptions,
) -> Result<Inventory, Error> {
    let audio_dir = audio_dir.as_ref();

    info!("Discovering audio files in {:?}...", audio_dir);
    let audio_files = find_audio_files(audio_dir)?;
    if audio_files.is_empty() {
        warn!("No audio files found in {:?}.", audio_dir);
    } else {
        info!("Found {} audio files.", audio_files.len());
    }

    let group_counts = count_files_per_group(&audio_files, taxonomy);
    info!(
        "Counted {} labels in {} groups.",
        group_counts.per_label.len(),
        group_counts.per_group.len()
    );

    let extractor = MetadataExtractor::new(options.decode_timeout);
    let records = extract_all(&extractor, &audio_files, options)?;

    let table = InventoryTable::build(records, taxonomy);
    let summary = SummaryReport::from_table(&table);
    if summary.error_count > 0 {
        warn!(
            "{} of {} files could not be read.",
            summary.error_count, summary.total_files
        );
    }
    info!("Inventory complete.");

    Ok(Inventory {
        group_counts,
        table,
        summary,
    })
}

/// Extracts metadata for every path in parallel. The output order matches `paths`.
pub fn extract_all(
    extractor: &MetadataExtractor,
    paths: &[PathBuf],
    options: &InventoryOptions,
) -> Result<Vec<FileRecord>, Error> {
    let pb = if options.show_progress {
        ProgressBar::new(paths.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .map_err(|e| Error::InvalidOptions(format!("progress bar template: {}", e)))?
            .progress_chars("#>-"),
    );
    pb.set_message("Extracting metadata");

    let run = || -> Vec<FileRecord> {
        paths
            .par_iter()
            .progress_with(pb.clone())
            .map(|path| {
                let record = extractor.extract(path);
                if let Some(e) = record.error() {
                    warn!("{:?}: {}", path.file_name().unwrap_or_default(), e);
                }
                record
            })
            .collect()
    };

    // Configure a dedicated Rayon pool if a thread count is given
    let records = match options.num_threads {
        Some(num_threads) if num_threads > 0 => {
            match rayon::ThreadPoolBuilder::new().num_threads(num_threads).build() {
                Ok(pool) => {
                    info!("Using {} threads for extraction.", num_threads);
                    pool.install(run)
                }
                Err(e) => {
                    warn!(
                        "Failed to configure Rayon thread pool: {}. Using default number of threads.",
                        e
                    );
                    run()
                }
            }
        }
        _ => run(),
    };
    pb.finish_with_message("Extraction done");
    Ok(records)
}

//! Dataset-wide statistics over an [`InventoryTable`].
//!
//! Missing durations and sample rates are left out of the numeric aggregates.
//! With nothing left to aggregate, statistics are `None` rather than zero.

use crate::inventory::InventoryTable;
use serde::Serialize;
use std::collections::BTreeMap;

/// Distribution of file durations, in seconds except for `total_hours`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DurationStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Population standard deviation
    pub std: Option<f64>,
    pub total_hours: Option<f64>,
}

impl DurationStats {
    pub fn from_durations(durations: &[f64]) -> Self {
        if durations.is_empty() {
            return Self::default();
        }
        let mut sorted = durations.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len() as f64;
        let sum: f64 = sorted.iter().sum();
        let mean = sum / count;
        let variance = sorted.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / count;
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Self {
            mean: Some(mean),
            median: Some(median),
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            std: Some(variance.sqrt()),
            total_hours: Some(sum / 3600.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryReport {
    pub total_files: usize,
    pub total_species: usize,
    pub total_groups: usize,
    pub files_per_label: BTreeMap<String, usize>,
    /// Only rows whose label joined to a group
    pub files_per_group: BTreeMap<String, usize>,
    pub duration_stats: DurationStats,
    pub sampling_rate_stats: BTreeMap<u32, usize>,
    pub format_counts: BTreeMap<String, usize>,
    pub error_count: usize,
}

impl SummaryReport {
    pub fn from_table(table: &InventoryTable) -> Self {
        let mut files_per_label: BTreeMap<String, usize> = BTreeMap::new();
        let mut files_per_group: BTreeMap<String, usize> = BTreeMap::new();
        let mut sampling_rate_stats: BTreeMap<u32, usize> = BTreeMap::new();
        let mut format_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut durations = Vec::with_capacity(table.len());
        let mut error_count = 0;

        for row in table.iter() {
            let record = &row.record;
            if !record.label().is_empty() {
                *files_per_label.entry(record.label().to_string()).or_default() += 1;
            }
            if let Some(group) = row.class_group() {
                *files_per_group.entry(group.to_string()).or_default() += 1;
            }
            if let Some(duration) = record.duration() {
                durations.push(duration);
            }
            if let Some(rate) = record.sampling_rate() {
                *sampling_rate_stats.entry(rate).or_default() += 1;
            }
            *format_counts.entry(record.format().to_string()).or_default() += 1;
            if record.error().is_some() {
                error_count += 1;
            }
        }

        Self {
            total_files: table.len(),
            total_species: files_per_label.len(),
            total_groups: files_per_group.len(),
            files_per_label,
            files_per_group,
            duration_stats: DurationStats::from_durations(&durations),
            sampling_rate_stats,
            format_counts,
            error_count,
        }
    }

    /// The `n` labels with the fewest files, fewest first; ties by label name.
    pub fn rarest_labels(&self, n: usize) -> Vec<(&str, usize)> {
        let mut labels: Vec<(&str, usize)> = self
            .files_per_label
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        labels.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        labels.truncate(n);
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{AudioMetadata, FileRecord};
    use crate::taxonomy::{TaxonomyEntry, TaxonomyIndex};

    fn ok(path: &str, duration: f64, rate: u32) -> FileRecord {
        let frames = (duration * rate as f64).round() as u64;
        FileRecord::extracted(path, AudioMetadata::from_frames(frames, rate).unwrap())
    }

    fn taxonomy() -> TaxonomyIndex {
        TaxonomyIndex::from_entries([
            TaxonomyEntry::new("bird1", "Aves"),
            TaxonomyEntry::new("bird2", "Aves"),
            TaxonomyEntry::new("frog1", "Amphibia"),
            TaxonomyEntry::new("insect1", "Insecta"),
        ])
    }

    #[test]
    fn failed_rows_are_excluded_from_duration_stats() {
        let records = vec![
            ok("p/bird1/1.ogg", 10.0, 32_000),
            ok("p/bird1/2.ogg", 12.5, 32_000),
            ok("p/bird2/3.wav", 5.0, 44_100),
            ok("p/frog1/4.ogg", 8.0, 32_000),
            FileRecord::failed("p/insect1/5.ogg", "Error X"),
        ];
        let report = SummaryReport::from_table(&InventoryTable::build(records, &taxonomy()));

        assert_eq!(report.total_files, 5);
        assert_eq!(report.total_species, 4);
        assert_eq!(report.total_groups, 3);
        assert_eq!(report.files_per_label["bird1"], 2);
        assert_eq!(report.files_per_group["Aves"], 3);
        assert_eq!(report.error_count, 1);

        let stats = report.duration_stats;
        assert_eq!(stats.mean, Some(8.875));
        assert_eq!(stats.median, Some(9.0));
        assert_eq!(stats.min, Some(5.0));
        assert_eq!(stats.max, Some(12.5));
        assert!((stats.std.unwrap() - 2.747_157_6).abs() < 1e-6);
        assert!((stats.total_hours.unwrap() - 35.5 / 3600.0).abs() < 1e-12);

        assert_eq!(report.sampling_rate_stats, BTreeMap::from([(32_000, 3), (44_100, 1)]));
        assert_eq!(
            report.format_counts,
            BTreeMap::from([("ogg".to_string(), 4), ("wav".to_string(), 1)])
        );
    }

    #[test]
    fn all_failed_yields_no_data() {
        let records = vec![
            FileRecord::failed("p/bird1/1.ogg", "bad header"),
            FileRecord::failed("p/bird1/2.ogg", "bad header"),
        ];
        let report = SummaryReport::from_table(&InventoryTable::build(records, &taxonomy()));

        assert_eq!(report.duration_stats, DurationStats::default());
        assert_eq!(report.duration_stats.mean, None);
        assert!(report.sampling_rate_stats.is_empty());
        assert_eq!(report.error_count, 2);
        assert_eq!(report.format_counts["ogg"], 2);
    }

    #[test]
    fn empty_table_is_an_empty_report() {
        let report = SummaryReport::from_table(&InventoryTable::default());
        assert_eq!(report, SummaryReport::default());
        assert!(report.rarest_labels(10).is_empty());
    }

    #[test]
    fn unknown_labels_count_as_species_but_not_groups() {
        let records = vec![ok("p/bird1/1.ogg", 1.0, 16_000), ok("p/mystery/2.ogg", 2.0, 16_000)];
        let report = SummaryReport::from_table(&InventoryTable::build(records, &taxonomy()));
        assert_eq!(report.total_species, 2);
        assert_eq!(report.total_groups, 1);
        assert!(!report.files_per_group.contains_key("Unknown"));
    }

    #[test]
    fn odd_count_median_and_single_value_spread() {
        let stats = DurationStats::from_durations(&[3.0, 1.0, 2.0]);
        assert_eq!(stats.median, Some(2.0));
        let single = DurationStats::from_durations(&[4.0]);
        assert_eq!(single.std, Some(0.0));
        assert_eq!(single.min, single.max);
    }

    #[test]
    fn rarest_labels_sorted_by_count_then_name() {
        let records = vec![
            ok("p/bird1/1.ogg", 1.0, 16_000),
            ok("p/bird1/2.ogg", 1.0, 16_000),
            ok("p/frog1/3.ogg", 1.0, 16_000),
            ok("p/bird2/4.ogg", 1.0, 16_000),
        ];
        let report = SummaryReport::from_table(&InventoryTable::build(records, &taxonomy()));
        assert_eq!(report.rarest_labels(2), vec![("bird2", 1), ("frog1", 1)]);
    }
}

use crate::discovery::label_for;
use crate::taxonomy::TaxonomyIndex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Group assigned to labels missing from the taxonomy
pub const UNKNOWN_GROUP: &str = "Unknown";

/// File counts per label and per taxonomic group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupCounts {
    pub per_label: BTreeMap<String, usize>,
    pub per_group: BTreeMap<String, usize>,
}

/// Counts discovered files by label, then rolls the labels up to their group.
///
/// Unlike the inventory join, labels with no group go to [`UNKNOWN_GROUP`].
pub fn count_files_per_group<P: AsRef<Path>>(files: &[P], taxonomy: &TaxonomyIndex) -> GroupCounts {
    let mut per_label: BTreeMap<String, usize> = BTreeMap::new();
    for file in files {
        *per_label.entry(label_for(file)).or_default() += 1;
    }

    let mut per_group: BTreeMap<String, usize> = BTreeMap::new();
    for (label, count) in &per_label {
        let group = taxonomy.group_of(label).unwrap_or(UNKNOWN_GROUP);
        *per_group.entry(group.to_string()).or_default() += count;
    }

    GroupCounts {
        per_label,
        per_group,
    }
}

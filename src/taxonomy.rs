//! Label → taxonomy lookup, built once and shared read-only.

use crate::error::TaxonomyError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Taxonomic attributes of one label. Attribute cells left empty in the table are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    #[serde(alias = "primary_label")]
    pub label: String,
    #[serde(default)]
    pub species_code: Option<String>,
    #[serde(default)]
    pub genus: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default, alias = "class", alias = "class_name")]
    pub class_group: Option<String>,
}

impl TaxonomyEntry {
    pub fn new(label: impl Into<String>, class_group: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            species_code: None,
            genus: None,
            family: None,
            order: None,
            class_group: Some(class_group.into()),
        }
    }
}

/// Immutable mapping from label to [`TaxonomyEntry`]. Labels are unique.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyIndex {
    entries: HashMap<String, TaxonomyEntry>,
}

impl TaxonomyIndex {
    /// Builds the index. When a label repeats, the first entry is kept.
    pub fn from_entries(entries: impl IntoIterator<Item = TaxonomyEntry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            match map.entry(entry.label.clone()) {
                Entry::Occupied(_) => {
                    warn!("Duplicate taxonomy label {:?}, keeping the first row", entry.label)
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
            }
        }
        Self { entries: map }
    }

    /// Reads a CSV table with a header row.
    pub fn from_reader(reader: impl Read) -> Result<Self, TaxonomyError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let entries = csv_reader
            .deserialize::<TaxonomyEntry>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TaxonomyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_reader(file)?;
        debug!("Loaded {} taxonomy entries from {:?}", index.len(), path);
        Ok(index)
    }

    pub fn get(&self, label: &str) -> Option<&TaxonomyEntry> {
        self.entries.get(label)
    }

    /// The top-level group of `label`, if the label is known and has one.
    pub fn group_of(&self, label: &str) -> Option<&str> {
        self.get(label).and_then(|e| e.class_group.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
primary_label,species_code,genus,family,order,class,common_name
bird1,bir1,GenusB,FamilyB,OrderB,Aves,Some bird
bird2,bir2,GenusB,FamilyB,OrderB,Aves,Other bird
frog1,fro1,GenusF,FamilyF,OrderF,Amphibia,A frog
insect1,,,,,Insecta,
";

    #[test]
    fn loads_original_column_names_and_ignores_extras() {
        let index = TaxonomyIndex::from_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(index.len(), 4);

        let bird = index.get("bird1").unwrap();
        assert_eq!(bird.species_code.as_deref(), Some("bir1"));
        assert_eq!(bird.genus.as_deref(), Some("GenusB"));
        assert_eq!(bird.class_group.as_deref(), Some("Aves"));

        let insect = index.get("insect1").unwrap();
        assert_eq!(insect.species_code, None);
        assert_eq!(index.group_of("insect1"), Some("Insecta"));
        assert_eq!(index.group_of("missing"), None);
    }

    #[test]
    fn loads_canonical_column_names() {
        let table = "label,species_code,genus,family,order,class_group\nbird1,bir1,G,F,O,Aves\n";
        let index = TaxonomyIndex::from_reader(table.as_bytes()).unwrap();
        assert_eq!(index.group_of("bird1"), Some("Aves"));
    }

    #[test]
    fn first_duplicate_wins() {
        let index = TaxonomyIndex::from_entries([
            TaxonomyEntry::new("bird1", "Aves"),
            TaxonomyEntry::new("bird1", "Reptilia"),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.group_of("bird1"), Some("Aves"));
    }

    #[test]
    fn missing_label_column_is_an_error() {
        let table = "genus,class\nG,Aves\n";
        assert!(matches!(
            TaxonomyIndex::from_reader(table.as_bytes()),
            Err(TaxonomyError::Csv(_))
        ));
    }
}

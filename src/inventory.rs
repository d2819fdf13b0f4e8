//! One row per file: the extraction record left-joined with its taxonomy.

use crate::discovery::label_for;
use crate::extract::FileRecord;
use crate::taxonomy::{TaxonomyEntry, TaxonomyIndex};

/// A [`FileRecord`] with the taxonomy of its label, if the label is known.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow {
    pub record: FileRecord,
    pub taxonomy: Option<TaxonomyEntry>,
}

impl InventoryRow {
    pub fn label(&self) -> &str {
        self.record.label()
    }

    pub fn species_code(&self) -> Option<&str> {
        self.taxonomy.as_ref()?.species_code.as_deref()
    }

    pub fn genus(&self) -> Option<&str> {
        self.taxonomy.as_ref()?.genus.as_deref()
    }

    pub fn family(&self) -> Option<&str> {
        self.taxonomy.as_ref()?.family.as_deref()
    }

    pub fn order(&self) -> Option<&str> {
        self.taxonomy.as_ref()?.order.as_deref()
    }

    /// `None` when the label is missing from the taxonomy.
    pub fn class_group(&self) -> Option<&str> {
        self.taxonomy.as_ref()?.class_group.as_deref()
    }
}

/// Ordered inventory; row `i` corresponds to input record `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryTable {
    rows: Vec<InventoryRow>,
}

impl InventoryTable {
    /// Left join of `records` against `taxonomy` on the parent-directory label.
    ///
    /// Never drops a row: unmatched labels get `taxonomy: None`.
    pub fn build(records: Vec<FileRecord>, taxonomy: &TaxonomyIndex) -> Self {
        let rows = records
            .into_iter()
            .map(|record| {
                let taxonomy = taxonomy.get(&label_for(record.path())).cloned();
                InventoryRow { record, taxonomy }
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[InventoryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InventoryRow> {
        self.rows.iter()
    }
}

impl FromIterator<InventoryRow> for InventoryTable {
    fn from_iter<T: IntoIterator<Item = InventoryRow>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::AudioMetadata;

    fn taxonomy() -> TaxonomyIndex {
        TaxonomyIndex::from_reader(
            "primary_label,species_code,genus,family,order,class\n\
             bird1,bir1,GenusB,FamilyB,OrderB,Aves\n\
             bird2,bir2,GenusB,FamilyB,OrderB,Aves\n"
                .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn left_join_keeps_every_row_in_order() {
        let records = vec![
            FileRecord::extracted("path/bird1/f1.ogg", AudioMetadata::from_frames(320_000, 32_000).unwrap()),
            FileRecord::extracted("path/bird2/f2.ogg", AudioMetadata::from_frames(242_550, 44_100).unwrap()),
            FileRecord::failed("path/bird1/f3.wav", "Load Error"),
            FileRecord::extracted("path/mystery/f4.flac", AudioMetadata::from_frames(48_000, 48_000).unwrap()),
        ];

        let table = InventoryTable::build(records.clone(), &taxonomy());

        assert_eq!(table.len(), records.len());
        for (row, record) in table.iter().zip(&records) {
            assert_eq!(&row.record, record);
        }

        let rows = table.rows();
        assert_eq!(rows[0].label(), "bird1");
        assert_eq!(rows[0].class_group(), Some("Aves"));
        assert_eq!(rows[0].species_code(), Some("bir1"));
        assert_eq!(rows[1].record.sampling_rate(), Some(44_100));
        assert_eq!(rows[2].record.duration(), None);
        assert_eq!(rows[2].record.error(), Some("Load Error"));
        assert_eq!(rows[2].genus(), Some("GenusB"));

        assert_eq!(rows[3].label(), "mystery");
        assert_eq!(rows[3].taxonomy, None);
        assert_eq!(rows[3].class_group(), None);
        assert_eq!(rows[3].order(), None);
    }

    #[test]
    fn empty_taxonomy_still_preserves_cardinality() {
        let records = vec![
            FileRecord::failed("a/x.ogg", "bad"),
            FileRecord::failed("b/y.ogg", "bad"),
        ];
        let table = InventoryTable::build(records, &TaxonomyIndex::default());
        assert_eq!(table.len(), 2);
        assert!(table.iter().all(|row| row.taxonomy.is_none()));
    }
}

use crate::error::SaveError;
use crate::inventory::InventoryTable;
use crate::summary::SummaryReport;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Column order of the inventory CSV
pub const INVENTORY_COLUMNS: [&str; 11] = [
    "path",
    "label",
    "format",
    "duration",
    "sampling_rate",
    "error",
    "species_code",
    "genus",
    "family",
    "order",
    "class_group",
];

/// Writes the inventory as CSV, one row per file. Missing values are empty cells.
pub fn write_inventory_csv(writer: impl Write, table: &InventoryTable) -> Result<(), SaveError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(INVENTORY_COLUMNS)?;
    for row in table.iter() {
        let record = &row.record;
        let duration = record.duration().map(|d| d.to_string()).unwrap_or_default();
        let sampling_rate = record.sampling_rate().map(|r| r.to_string()).unwrap_or_default();
        let path = record.path().to_string_lossy();
        csv_writer.write_record([
            path.as_ref(),
            record.label(),
            record.format(),
            duration.as_str(),
            sampling_rate.as_str(),
            record.error().unwrap_or_default(),
            row.species_code().unwrap_or_default(),
            row.genus().unwrap_or_default(),
            row.family().unwrap_or_default(),
            row.order().unwrap_or_default(),
            row.class_group().unwrap_or_default(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Saves the inventory table as a CSV file
pub fn save_inventory_csv(path: &Path, table: &InventoryTable) -> Result<(), SaveError> {
    let file = File::create(path)?;
    write_inventory_csv(BufWriter::new(file), table)
}

/// Saves the summary report as pretty-printed JSON; undefined statistics become `null`.
pub fn save_summary_json(path: &Path, report: &SummaryReport) -> Result<(), SaveError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}

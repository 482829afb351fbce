//! CSV encoding of datasets.
//!
//! Both the spreadsheet export and the on-disk cache use this text-only
//! columnar form.

use crate::error::PipelineError;
use crate::models::{Dataset, FieldValue, Record};
use std::collections::{HashMap, HashSet};
use std::io;
use tracing::debug;

/// Read a dataset from CSV with a header row.
///
/// Rows may be shorter or longer than the header; missing cells are absent
/// and extra cells are ignored. Blank header cells become `Unnamed: <i>` and
/// repeated names get a `.<n>` suffix.
pub fn read_dataset<R: io::Read>(reader: R) -> Result<Dataset, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let columns = normalize_headers(reader.headers()?.iter());
    let mut dataset = Dataset::new(columns);

    for result in reader.records() {
        let row = result?;
        if row.len() > dataset.columns.len() {
            debug!(
                "Row {} has {} cells for {} columns; extra cells ignored",
                dataset.len() + 1,
                row.len(),
                dataset.columns.len()
            );
        }

        let mut record = Record::new();
        for (column, value) in dataset.columns.iter().zip(row.iter()) {
            record.insert(column.clone(), FieldValue::from_text(value));
        }
        dataset.push(record);
    }

    Ok(dataset)
}

/// Write a dataset as CSV, every value rendered as text.
pub fn write_dataset<W: io::Write>(writer: W, dataset: &Dataset) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_writer(writer);

    writer.write_record(&dataset.columns)?;
    for record in &dataset.records {
        writer.write_record(
            dataset
                .columns
                .iter()
                .map(|c| record.get(c).map(|v| v.to_string()).unwrap_or_default()),
        )?;
    }
    writer.flush()?;

    Ok(())
}

fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut emitted: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::new();

    for (i, header) in raw.enumerate() {
        let header = header.trim();
        let base = if header.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header.to_string()
        };

        let mut name = base.clone();
        if emitted.contains(&name) {
            let suffix = next_suffix.entry(base.clone()).or_insert(1);
            loop {
                name = format!("{}.{}", base, suffix);
                *suffix += 1;
                if !emitted.contains(&name) {
                    break;
                }
            }
        }

        emitted.insert(name.clone());
        columns.push(name);
    }

    columns
}

//! Comma-separated export and import.

use crate::atomic::write_atomically;
use crate::error::Result;
use crate::layout::{Cell, HeaderMap, Layout};
use prowl_core::Record;
use std::fs::File;
use std::path::Path;

pub fn write(path: &Path, records: &[Record], layout: &Layout) -> Result<()> {
    write_atomically(path, |out| {
        let mut writer = csv::WriterBuilder::new().from_writer(out);
        writer.write_record(layout.headers())?;
        for record in records {
            let row: Vec<String> = layout.cells(record).iter().map(Cell::as_text).collect();
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    })
}

pub fn read(path: &Path) -> Result<(Vec<Record>, bool)> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader.headers()?.iter().map(ToString::to_string).collect();
    let map = HeaderMap::parse(&headers)?;

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        let record = map.record(index + 2, |col| {
            row.get(col)
                .filter(|value| !value.is_empty())
                .map(ToString::to_string)
        })?;
        records.push(record);
    }

    Ok((records, map.has_enrichment()))
}

use crate::models::ResultTable;
use crate::topics::TopicRegistry;
use anyhow::Result;
use csv::WriterBuilder;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Prefix cells that a spreadsheet would evaluate as a formula.
fn sanitize(cell: &str) -> String {
    let risky = match cell.chars().next() {
        Some('=') | Some('+') | Some('@') => true,
        Some('-') => cell.parse::<f64>().is_err(),
        _ => false,
    };
    if risky {
        format!("'{cell}")
    } else {
        cell.to_string()
    }
}

/// Write the table as CSV with header.
pub fn write_csv<W: Write>(table: &ResultTable, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(table.header().iter().map(|h| sanitize(h)))?;
    for rec in table.records() {
        wtr.write_record(rec.iter().map(|c| sanitize(c)))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save the table as CSV at `path`.
pub fn save_csv<P: AsRef<Path>>(table: &ResultTable, path: P) -> Result<()> {
    write_csv(table, BufWriter::new(File::create(path)?))
}

struct JsonRow<'a> {
    header: &'a [String],
    record: Vec<String>,
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.header.len()))?;
        for (k, v) in self.header.iter().zip(&self.record) {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Write the table as a pretty JSON array of objects, keys in header order.
pub fn write_json<W: Write>(table: &ResultTable, mut writer: W) -> Result<()> {
    let header = table.header();
    let rows: Vec<JsonRow<'_>> = table
        .records()
        .map(|record| JsonRow {
            header: &header,
            record,
        })
        .collect();
    serde_json::to_writer_pretty(&mut writer, &rows)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Save the table as pretty JSON at `path`.
pub fn save_json<P: AsRef<Path>>(table: &ResultTable, path: P) -> Result<()> {
    write_json(table, BufWriter::new(File::create(path)?))
}

/// Long-form profile: one `County,Field,Value` line per cell (plus `Year` when present).
pub fn write_profile_csv<W: Write>(table: &ResultTable, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    if table.multi_year {
        wtr.write_record(["Year", "County", "Field", "Value"])?;
    } else {
        wtr.write_record(["County", "Field", "Value"])?;
    }
    for row in &table.rows {
        for (label, value) in table.plan.labels().zip(&row.values) {
            let mut rec = Vec::with_capacity(4);
            if table.multi_year {
                rec.push(row.year.map(|y| y.to_string()).unwrap_or_default());
            }
            rec.push(sanitize(&row.county.name));
            rec.push(sanitize(label));
            rec.push(sanitize(value));
            wtr.write_record(&rec)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// The topic catalog as CSV: `Topic,Description,Variable Code,Label,Format`.
pub fn write_topics_csv<W: Write>(registry: &TopicRegistry, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(["Topic", "Description", "Variable Code", "Label", "Format"])?;
    for topic in registry.topics() {
        for v in &topic.variables {
            wtr.write_record([
                topic.name.as_str(),
                topic.description.as_str(),
                v.code.as_str(),
                v.label.as_str(),
                v.format.as_str(),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

// src/formats/table.rs
use crossbeam_channel::Receiver;
use indexmap::IndexMap;
use std::io::{BufWriter, Write};

use crate::error::PipelineError;
use crate::record::Record;

/// Hard cap on rendered column width, header included.
pub const MAX_COL_WIDTH: usize = 80;

/// Collector writing a plain-text table. Write-only: there is no table
/// producer.
///
/// The whole stream is buffered so the column set (the first-seen-ordered
/// union of all field names) and per-column widths can be computed before
/// anything is written. Cells are left-justified, padded to the column
/// width with two spaces between columns, and hard-truncated at the cap
/// with no ellipsis.
pub fn collector<W>(output: W) -> impl FnOnce(Receiver<Record>) -> Result<(), PipelineError>
where
    W: Write,
{
    move |rx| {
        let mut records = Vec::new();
        let mut widths: IndexMap<String, usize> = IndexMap::new();

        for record in rx {
            for key in record.keys() {
                let rendered = record.string(key).chars().count();
                let width = widths.entry(key.to_string()).or_insert(0);
                *width = (*width).max(rendered);
            }
            records.push(record);
        }

        for (column, width) in widths.iter_mut() {
            *width = (*width).max(column.chars().count()).min(MAX_COL_WIDTH);
        }

        write_table(output, &records, &widths)
    }
}

fn write_table<W: Write>(
    output: W,
    records: &[Record],
    widths: &IndexMap<String, usize>,
) -> Result<(), PipelineError> {
    let mut writer = BufWriter::new(output);

    for (column, width) in widths {
        write!(writer, "{:<w$}  ", truncate(column), w = *width)?;
    }
    writeln!(writer)?;

    for width in widths.values() {
        write!(writer, "{}  ", "-".repeat(*width))?;
    }
    writeln!(writer)?;

    for record in records {
        for (column, width) in widths {
            write!(writer, "{:<w$}  ", truncate(&record.string(column)), w = *width)?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// The leading MAX_COL_WIDTH characters of a cell, or the cell itself when
/// it fits.
fn truncate(s: &str) -> String {
    if s.chars().count() <= MAX_COL_WIDTH {
        s.to_string()
    } else {
        s.chars().take(MAX_COL_WIDTH).collect()
    }
}

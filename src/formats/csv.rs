// src/formats/csv.rs
use crossbeam_channel::{Receiver, Sender};
use indexmap::IndexMap;
use std::io::{Read, Write};

use crate::error::PipelineError;
use crate::record::Record;
use crate::value::Value;

/// Producer reading CSV. The first row is the header; every later row
/// becomes one record of raw string fields in header order. No type
/// guessing happens here; that is an explicit pipeline stage.
pub fn producer<R>(input: R) -> impl FnOnce(Sender<Record>) -> Result<(), PipelineError>
where
    R: Read,
{
    move |tx| {
        let mut reader = csv::Reader::from_reader(input);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        for row in reader.records() {
            // Wrong column counts and encoding errors abort the run here.
            let row = row?;
            let mut fields = IndexMap::with_capacity(headers.len());
            for (header, cell) in headers.iter().zip(row.iter()) {
                fields.insert(header.clone(), Value::from(cell));
            }
            if tx.send(Record::new(Value::Map(fields))).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Collector writing CSV. The header row is the field set of the first
/// record, in its insertion order; later records render into exactly those
/// columns (missing fields become empty cells, extra fields are not
/// written). An empty stream writes nothing at all, not even headers.
pub fn collector<W>(output: W) -> impl FnOnce(Receiver<Record>) -> Result<(), PipelineError>
where
    W: Write,
{
    move |rx| {
        let first = match rx.recv() {
            Ok(record) => record,
            Err(_) => return Ok(()),
        };

        let mut writer = csv::Writer::from_writer(output);
        let headers: Vec<String> = first.keys().map(str::to_string).collect();
        writer.write_record(&headers)?;

        write_row(&mut writer, &headers, &first)?;
        for record in rx {
            write_row(&mut writer, &headers, &record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn write_row<W: Write>(
    writer: &mut csv::Writer<W>,
    headers: &[String],
    record: &Record,
) -> Result<(), PipelineError> {
    let row: Vec<String> = headers.iter().map(|h| record.string(h)).collect();
    writer.write_record(&row)?;
    Ok(())
}

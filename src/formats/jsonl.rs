// src/formats/jsonl.rs
use crossbeam_channel::{Receiver, Sender};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};

use crate::error::PipelineError;
use crate::record::Record;
use crate::value::Value;

/// Producer reading JSON lines: one complete JSON value per line. A blank
/// line or a parse error aborts the run.
pub fn producer<R>(input: R) -> impl FnOnce(Sender<Record>) -> Result<(), PipelineError>
where
    R: Read,
{
    move |tx| {
        let reader = BufReader::new(input);
        for line in reader.lines() {
            let line = line?;
            let value: serde_json::Value = serde_json::from_str(&line)?;
            if tx.send(Record::new(Value::from(value))).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Write one record as compact single-line JSON. This is the shared
/// primitive behind both the collector and the tee stage; a dropped record
/// serializes as a bare `null` line.
pub fn write_record<W: Write>(output: &mut W, record: &Record) -> Result<(), PipelineError> {
    let line = serde_json::to_string(record)?;
    output.write_all(line.as_bytes())?;
    output.write_all(b"\n")?;
    Ok(())
}

/// Collector writing JSON lines. Records are independent, so nothing is
/// buffered beyond the write buffer.
pub fn collector<W>(output: W) -> impl FnOnce(Receiver<Record>) -> Result<(), PipelineError>
where
    W: Write,
{
    move |rx| {
        let mut writer = BufWriter::new(output);
        for record in rx {
            write_record(&mut writer, &record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Tee stage: write each record as a JSON line and pass it through
/// unchanged. Use with `Pipeline::try_process`.
pub fn tee<W>(mut output: W) -> impl FnMut(Record) -> Result<Record, PipelineError> + Send
where
    W: Write + Send,
{
    move |record| {
        write_record(&mut output, &record)?;
        Ok(record)
    }
}

// src/formats/json.rs
use crossbeam_channel::{Receiver, Sender};
use serde::de::{IgnoredAny, SeqAccess, Visitor};
use serde::{Deserializer, Serialize};
use std::fmt;
use std::io::{BufWriter, Read, Write};

use crate::error::PipelineError;
use crate::record::Record;
use crate::value::Value;

/// Producer reading a single top-level JSON array. Elements are decoded one
/// at a time and emitted as they parse; the document is never buffered
/// whole. Any other top-level shape, or a malformed element, aborts the run.
pub fn producer<R>(input: R) -> impl FnOnce(Sender<Record>) -> Result<(), PipelineError>
where
    R: Read,
{
    move |tx| {
        let mut de = serde_json::Deserializer::from_reader(input);
        (&mut de).deserialize_seq(ArrayStream { tx: &tx })?;
        de.end()?;
        Ok(())
    }
}

/// Streaming visitor: sends each array element downstream as it decodes.
struct ArrayStream<'a> {
    tx: &'a Sender<Record>,
}

impl<'de, 'a> Visitor<'de> for ArrayStream<'a> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a top-level JSON array")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(element) = seq.next_element::<serde_json::Value>()? {
            if self.tx.send(Record::new(Value::from(element))).is_err() {
                // Downstream hung up mid-array; parse out the remaining
                // elements so the deserializer finishes cleanly.
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                break;
            }
        }
        Ok(())
    }
}

/// Collector writing one JSON array: `[`, each record pretty-printed with a
/// 4-space indent, `]`. An empty stream still frames an empty array.
pub fn collector<W>(output: W) -> impl FnOnce(Receiver<Record>) -> Result<(), PipelineError>
where
    W: Write,
{
    move |rx| {
        let mut writer = BufWriter::new(output);
        writer.write_all(b"[")?;

        let mut first = true;
        for record in rx {
            if !first {
                writer.write_all(b",")?;
            }
            first = false;
            writer.write_all(b"\n    ")?;
            write_indented(&mut writer, &record)?;
        }

        writer.write_all(b"\n]\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Pretty-print one record at one indent level: 4-space inner indent, every
/// continuation line shifted right by the array's own indent.
fn write_indented<W: Write>(writer: &mut W, record: &Record) -> Result<(), PipelineError> {
    let mut body = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut body, formatter);
    record.serialize(&mut ser)?;

    let mut lines = body.split(|&b| b == b'\n');
    if let Some(line) = lines.next() {
        writer.write_all(line)?;
    }
    for line in lines {
        writer.write_all(b"\n    ")?;
        writer.write_all(line)?;
    }
    Ok(())
}

// tests/pipeline_tests.rs
//
// End-to-end pipeline semantics: stage composition, tombstoning, ordering.

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use rill::formats;
use rill::guess;
use rill::{Pipeline, Record};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn csv_filter_transform_to_jsonl() {
    let input = "name,score\nAda,90\nLin,40\nGrace,75\n";
    let out = SharedBuf::default();

    Pipeline::from_producer(formats::csv::producer(Cursor::new(input.to_string())))
        .process(guess::guess_record)
        .include(|r| r.int("score") >= 50)
        .process(|r| {
            let passed = r.int("score") >= 60;
            r.set("passed", passed)
        })
        .collect(formats::jsonl::collector(out.clone()))
        .unwrap();

    assert_eq!(
        out.contents(),
        "{\"name\":\"Ada\",\"score\":90,\"passed\":true}\n\
         {\"name\":\"Grace\",\"score\":75,\"passed\":true}\n"
    );
}

#[test]
fn surviving_records_keep_relative_order() {
    let rows: String = (0..200).fold("n\n".to_string(), |mut acc, i| {
        acc.push_str(&i.to_string());
        acc.push('\n');
        acc
    });
    let out = SharedBuf::default();

    Pipeline::from_producer(formats::csv::producer(Cursor::new(rows)))
        .process(guess::guess_record)
        .exclude(|r| r.int("n") % 3 == 0)
        .include(|r| r.int("n") % 2 == 1)
        .collect(formats::jsonl::collector(out.clone()))
        .unwrap();

    let got: Vec<i64> = out
        .contents()
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["n"].as_i64().unwrap())
        .collect();
    let want: Vec<i64> = (0..200).filter(|n| n % 3 != 0 && n % 2 == 1).collect();
    assert_eq!(got, want);
}

#[test]
fn rendezvous_chain_handles_long_streams() {
    // Every send is a rendezvous; a four-stage chain over a few thousand
    // records must neither deadlock nor reorder.
    let rows: String = (0..5000).fold("n\n".to_string(), |mut acc, i| {
        acc.push_str(&i.to_string());
        acc.push('\n');
        acc
    });
    let out = SharedBuf::default();

    Pipeline::from_producer(formats::csv::producer(Cursor::new(rows)))
        .process(guess::guess_record)
        .process(|r| {
            let n = r.int("n");
            r.set("n", n + 1)
        })
        .include(|r| r.int("n") > 0)
        .collect(formats::jsonl::collector(out.clone()))
        .unwrap();

    assert_eq!(out.contents().lines().count(), 5000);
}

#[test]
fn dropped_records_never_reach_the_collector() {
    let (sink, seen) = std::sync::mpsc::channel();
    Pipeline::from_producer(move |tx| {
        for i in 0..10 {
            let record = Record::default().set("i", i).drop_if(i % 2 == 0);
            if tx.send(record).is_err() {
                break;
            }
        }
        Ok(())
    })
    .collect(move |rx| {
        for record in rx {
            assert!(!record.is_dropped());
            sink.send(record.int("i")).ok();
        }
        Ok(())
    })
    .unwrap();

    let got: Vec<i64> = seen.try_iter().collect();
    assert_eq!(got, vec![1, 3, 5, 7, 9]);
}

#[test]
#[should_panic(expected = "int called on dropped record")]
fn accessor_fault_in_a_stage_kills_the_run() {
    Pipeline::from_producer(|tx| {
        let _ = tx.send(Record::tombstone());
        Ok(())
    })
    // A stage reading a field without checking drop status is a caller
    // bug; the panic crosses the stage thread boundary.
    .process(|r| {
        let n = r.int("n");
        r.set("n", n)
    })
    .collect(|rx| {
        for _ in rx {}
        Ok(())
    })
    .unwrap();
}

#[test]
fn include_and_exclude_tombstone_without_removing() {
    let passed_through = Arc::new(Mutex::new(0usize));
    let counter = passed_through.clone();

    Pipeline::from_producer(|tx| {
        for i in 0..6 {
            if tx.send(Record::default().set("i", i)).is_err() {
                break;
            }
        }
        Ok(())
    })
    .exclude(|r| r.int("i") < 3)
    // Dropped records still flow through later stages until collection.
    .process(move |r| {
        *counter.lock().unwrap() += 1;
        r
    })
    .collect(|rx| {
        assert_eq!(rx.iter().count(), 3);
        Ok(())
    })
    .unwrap();

    assert_eq!(*passed_through.lock().unwrap(), 6);
}

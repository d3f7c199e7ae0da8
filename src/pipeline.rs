// src/pipeline.rs
//
// The composition engine. A pipeline starts from a producer feeding records
// into a rendezvous channel, grows by stage combinators that each run on
// their own thread, and ends when a collector drains the filtered stream.
//
// Every channel is bounded at capacity zero, so each send is a rendezvous
// with the downstream receive: a fast producer blocks until the next stage
// is ready, and a slow collector throttles the whole upstream chain. No
// stage reorders records; sink-side behaviors ("first record defines the
// CSV header") depend on that.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::error::PipelineError;
use crate::record::Record;

/// A stream source: runs on its own thread, sends records until the input
/// is exhausted or fails.
pub type Producer = Box<dyn FnOnce(Sender<Record>) -> Result<(), PipelineError> + Send>;

/// A stream sink: drains the receiver completely, writing records out.
pub type Collector = Box<dyn FnOnce(Receiver<Record>) -> Result<(), PipelineError> + Send>;

/// A record pipeline under construction: the head of the stream plus the
/// stage threads feeding it.
pub struct Pipeline {
    rx: Receiver<Record>,
    stages: Vec<JoinHandle<Result<(), PipelineError>>>,
}

impl Pipeline {
    /// Start a pipeline from a producer. The producer runs on its own
    /// thread immediately; records rendezvous with the first consumer.
    pub fn from_producer<P>(producer: P) -> Pipeline
    where
        P: FnOnce(Sender<Record>) -> Result<(), PipelineError> + Send + 'static,
    {
        let (tx, rx) = bounded(0);
        let handle = thread::spawn(move || producer(tx));
        Pipeline {
            rx,
            stages: vec![handle],
        }
    }

    /// Apply a one-to-one transformation to every record, in order.
    pub fn process<F>(self, mut stage: F) -> Pipeline
    where
        F: FnMut(Record) -> Record + Send + 'static,
    {
        self.try_process(move |record| Ok(stage(record)))
    }

    /// Like `process` for stages that can fail (e.g. a tee writing records
    /// out as a side effect). An error aborts the run.
    pub fn try_process<F>(self, mut stage: F) -> Pipeline
    where
        F: FnMut(Record) -> Result<Record, PipelineError> + Send + 'static,
    {
        let (tx, rx) = bounded(0);
        let upstream = self.rx;
        let mut stages = self.stages;
        stages.push(thread::spawn(move || {
            for record in upstream {
                if tx.send(stage(record)?).is_err() {
                    // Downstream hung up; the run is already aborting.
                    break;
                }
            }
            Ok(())
        }));
        Pipeline { rx, stages }
    }

    /// Tombstone every record the predicate rejects. Records are not
    /// removed from the stream here (the terminal drop filter does that),
    /// so later stages still see them pass through.
    pub fn include<F>(self, mut predicate: F) -> Pipeline
    where
        F: FnMut(&Record) -> bool + Send + 'static,
    {
        self.process(move |record| {
            if record.is_dropped() {
                record
            } else {
                let keep = predicate(&record);
                record.keep(keep)
            }
        })
    }

    /// Tombstone every record the predicate matches.
    pub fn exclude<F>(self, mut predicate: F) -> Pipeline
    where
        F: FnMut(&Record) -> bool + Send + 'static,
    {
        self.process(move |record| {
            if record.is_dropped() {
                record
            } else {
                let drop = predicate(&record);
                record.drop_if(drop)
            }
        })
    }

    /// Drain the stream into a collector and wait for the run to finish.
    ///
    /// Dropped records are filtered out just before the collector; the
    /// collector only ever sees live records. The collector runs on the
    /// calling thread. Returns the collector's error if it failed, else the
    /// first stage error in pipeline order.
    pub fn collect<C>(self, collector: C) -> Result<(), PipelineError>
    where
        C: FnOnce(Receiver<Record>) -> Result<(), PipelineError>,
    {
        let (tx, rx) = bounded(0);
        let upstream = self.rx;
        let mut stages = self.stages;
        stages.push(thread::spawn(move || {
            for record in upstream {
                if record.is_dropped() {
                    continue;
                }
                if tx.send(record).is_err() {
                    break;
                }
            }
            Ok(())
        }));

        let result = collector(rx);
        join_stages(stages, result)
    }

    /// Terminal consumption without a collector: read the stream to the end
    /// and discard everything. For pipelines run purely for stage side
    /// effects.
    pub fn drain(self) -> Result<(), PipelineError> {
        for _ in &self.rx {}
        join_stages(self.stages, Ok(()))
    }
}

/// Wait for every stage thread. A collector error wins over stage errors
/// (the stages' send failures are a consequence of the abort, not a cause);
/// a panicking stage (a dropped-record accessor fault) is re-raised here
/// so the contract violation still kills the process.
fn join_stages(
    stages: Vec<JoinHandle<Result<(), PipelineError>>>,
    result: Result<(), PipelineError>,
) -> Result<(), PipelineError> {
    let mut first_stage_err = None;
    for handle in stages {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if first_stage_err.is_none() {
                    first_stage_err = Some(e);
                }
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
    match (result, first_stage_err) {
        (Err(e), _) => Err(e),
        (Ok(()), Some(e)) => Err(e),
        (Ok(()), None) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: i64) -> Producer {
        Box::new(move |tx| {
            for i in 0..n {
                if tx.send(Record::default().set("n", i)).is_err() {
                    break;
                }
            }
            Ok(())
        })
    }

    fn collect_ints(sink: std::sync::mpsc::Sender<i64>) -> impl FnOnce(Receiver<Record>) -> Result<(), PipelineError>
    {
        move |rx| {
            for record in rx {
                sink.send(record.int("n")).ok();
            }
            Ok(())
        }
    }

    #[test]
    fn preserves_order_through_stage_chain() {
        let (sink, seen) = std::sync::mpsc::channel();
        Pipeline::from_producer(numbers(100))
            .process(|r| {
                let n = r.int("n");
                r.set("n", n * 2)
            })
            .process(|r| {
                let n = r.int("n");
                r.set("n", n + 1)
            })
            .collect(collect_ints(sink))
            .unwrap();
        let got: Vec<i64> = seen.try_iter().collect();
        let want: Vec<i64> = (0..100).map(|i| i * 2 + 1).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn include_drops_failing_records_before_collector() {
        let (sink, seen) = std::sync::mpsc::channel();
        Pipeline::from_producer(numbers(10))
            .include(|r| r.int("n") % 2 == 0)
            .collect(collect_ints(sink))
            .unwrap();
        let got: Vec<i64> = seen.try_iter().collect();
        assert_eq!(got, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn exclude_is_the_inverse_filter() {
        let (sink, seen) = std::sync::mpsc::channel();
        Pipeline::from_producer(numbers(10))
            .exclude(|r| r.int("n") < 7)
            .collect(collect_ints(sink))
            .unwrap();
        let got: Vec<i64> = seen.try_iter().collect();
        assert_eq!(got, vec![7, 8, 9]);
    }

    #[test]
    fn dropped_records_stay_dropped_through_later_stages() {
        let (sink, seen) = std::sync::mpsc::channel();
        Pipeline::from_producer(numbers(6))
            .exclude(|r| r.int("n") % 2 == 0)
            // Stages after a filter still see every record; the predicate
            // must not run on tombstones.
            .include(|r| r.int("n") > 0)
            .process(|r| if r.is_dropped() { r } else { r.set("seen", true) })
            .collect(collect_ints(sink))
            .unwrap();
        let got: Vec<i64> = seen.try_iter().collect();
        assert_eq!(got, vec![1, 3, 5]);
    }

    #[test]
    fn producer_error_surfaces_from_collect() {
        let failing: Producer = Box::new(|tx| {
            tx.send(Record::default().set("n", 1)).ok();
            Err(PipelineError::UnknownInputFormat("boom".to_string()))
        });
        let err = Pipeline::from_producer(failing)
            .collect(|rx| {
                for _ in rx {}
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownInputFormat(_)));
    }

    #[test]
    fn collector_error_wins_and_unwinds_upstream() {
        let err = Pipeline::from_producer(numbers(1000))
            .collect(|rx| {
                // Abort after one record; upstream stages must exit rather
                // than block forever on their rendezvous sends.
                let _ = rx.recv();
                Err(PipelineError::UnknownOutputFormat("sink".to_string()))
            })
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownOutputFormat(_)));
    }

    #[test]
    fn try_process_error_aborts_the_run() {
        let err = Pipeline::from_producer(numbers(10))
            .try_process(|r| {
                if r.int("n") == 3 {
                    Err(PipelineError::UnknownInputFormat("stage".to_string()))
                } else {
                    Ok(r)
                }
            })
            .collect(|rx| {
                for _ in rx {}
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownInputFormat(_)));
    }

    #[test]
    fn drain_consumes_everything() {
        Pipeline::from_producer(numbers(50)).drain().unwrap();
    }

    #[test]
    fn empty_producer_completes_cleanly() {
        let (sink, seen) = std::sync::mpsc::channel();
        Pipeline::from_producer(numbers(0))
            .collect(collect_ints(sink))
            .unwrap();
        assert_eq!(seen.try_iter().count(), 0);
    }
}

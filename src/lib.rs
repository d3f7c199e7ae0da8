// src/lib.rs
pub mod dispatch;
pub mod error;
pub mod formats;
pub mod guess;
pub mod pipeline;
pub mod record;
pub mod value;

pub use error::PipelineError;
pub use pipeline::{Collector, Pipeline, Producer};
pub use record::Record;
pub use value::Value;

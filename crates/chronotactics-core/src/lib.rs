//! Core types: normalized events, sync results, time windows, tracing.

pub mod event;
pub mod mapper;
pub mod time;
pub mod tracing;

pub use event::{
    NormalizedEvent, SyncResult, SyncSource, UNTITLED_SUMMARY, sort_by_start, summary_or_default,
};
pub use mapper::UnitMapper;
pub use time::TimeWindow;
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};

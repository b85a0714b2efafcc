//! Query executor
//!
//! Runs a parsed statement as a chain of concurrent stages joined by bounded
//! channels:
//!
//! ```text
//! source -> where -> group by -> having -> order by -> limit -> select -> distinct
//! ```
//!
//! Each stage owns one task. Errors travel down the chain in-band; the first
//! error a stage sees is forwarded once and the stage stops. Every stage
//! checks the shared [`CancelToken`] before it handles an item.

mod cancel;
mod distinct;
mod errors;
mod filters;
mod grouper;
mod having;
mod limit;
mod preprocess;
mod runner;
mod select;
mod sorter;
mod source;
mod stream;

pub use cancel::CancelToken;
pub use distinct::Deduplicator;
pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult};
pub use filters::WhereFilter;
pub use grouper::{resolve_key, Grouper};
pub use having::HavingFilter;
pub use limit::Limiter;
pub use preprocess::{expand_select_all, preprocess, SELECT_ALL};
pub use runner::QueryRunner;
pub use select::{contains_aggregation, Projector};
pub use sorter::ResultSorter;
pub use source::{file_row, mode_string, FsSource, MemorySource, RowSource};
pub use stream::{
    bind_envelope, bind_group, bind_row, bind_rows, Envelope, FileRow, GroupedRow, ProjectedRow,
    RowItem, StageContext, StreamItem, COLUMNS, DEFAULT_CHANNEL_CAPACITY,
};

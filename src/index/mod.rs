//! Secondary rsid index: construction and random access.
//!
//! | Module | Role |
//! |--------|------|
//! | [`format`] | Entry line layout and the sparse block index |
//! | [`sort`] | Stable external sort by rsid |
//! | [`pipeline`] | Concurrent decompress, transform, sort and compress stages |
//! | [`writer`] | BGZF output with block sampling |
//! | [`builder`] | Atomic publication of the data file and sidecar |
//! | [`reader`] | Lookup by rsid |

pub mod builder;
pub mod format;
pub mod pipeline;
pub mod reader;
pub mod sort;
pub mod writer;

pub use builder::{BuildConfig, BuildError, BuildJob, BuildSummary, IndexBuilder};
pub use format::{index_path, BlockIndex, RsidEntry};
pub use reader::RsidIndexReader;

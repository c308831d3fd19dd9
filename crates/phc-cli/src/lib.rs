//! Library side of the `phc-warehouse` binary: logging setup, pipeline
//! stages and the end-to-end build.

pub mod build;
pub mod logging;
pub mod pipeline;
pub mod types;

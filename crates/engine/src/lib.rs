//! The reputation pipeline: record source → score resolver → ranker, driven
//! by a controller that supersedes stale in-flight runs.

pub mod pipeline;
pub mod ranker;
pub mod records;
pub mod resolver;
pub mod submission;
pub mod watcher;

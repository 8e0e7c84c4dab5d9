//! BMCTrace engine: rebuilds a source-level counterexample trace from a
//! bounded model checker's textual report.
//!
//! The pipeline is [`scanner`] (static tables from the source),
//! [`classifier`] (one token per report line), [`machine`] (the trace state
//! machine) and [`emitter`] (step deduplication), driven by [`parser`].
//! [`report`], [`harness`] and [`response`] build the surrounding result.

pub mod classifier;
pub use classifier::*;

pub mod emitter;
pub use emitter::*;

pub mod harness;
pub use harness::*;

pub mod machine;
pub use machine::*;

pub mod parser;
pub use parser::*;

pub mod report;
pub use report::*;

pub mod response;
pub use response::*;

pub mod scanner;
pub use scanner::*;

//! leakwarden: lifecycle management for heap snapshot diagnostics.
//!
//! A long-running process that suspects an object is leaked hands a
//! [`analyze::CandidateRecord`] to the [`analyze::Orchestrator`]. The
//! orchestrator reserves a slot in the quota-bounded [`store::DumpStore`],
//! lets an out-of-process [`analyze::inspector::HeapInspector`] capture and
//! classify the heap under a deadline, publishes confirmed leaks to an
//! [`issue::IssueSink`], and deletes the snapshot on every exit path.
//!
//! The store is also usable on its own for periodic maintenance (expiry
//! sweep, full clear); the bundled binary exposes exactly that surface.

pub mod analyze;
pub mod cli;
pub mod config;
pub mod issue;
pub mod store;
pub mod util;

//! Pure domain logic for the curio moderation workflow.
//!
//! Everything in this crate is I/O-free: the edit state machine, the
//! relation diff engine, the vote-threshold arithmetic, and the typed
//! edit payload that is persisted alongside each pending edit. The
//! storage layer lives in `curio-db`, the workflow orchestration in
//! `curio-edits`.

pub mod data;
pub mod diff;
pub mod edit;
pub mod error;
pub mod field;
pub mod snapshot;
pub mod types;
pub mod voting;

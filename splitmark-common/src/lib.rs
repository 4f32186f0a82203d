//! # SplitMark Common Library
//!
//! Shared code for the SplitMark splitsheet workflow service including:
//! - Splitsheet document model and participant categories
//! - Allocation engine (category totals, caps, equal redistribution)
//! - Signature workflow state derivation and access gate
//! - Submission validation
//! - Event types (SplitmarkEvent enum)
//! - Configuration loading
//! - Database schema and initialization

pub mod allocation;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod participant;
pub mod signature;
pub mod splitsheet;
pub mod sse;
pub mod validate;

pub use error::{Error, Result};
pub use participant::{Participant, ParticipantCategory};
pub use signature::WorkflowState;
pub use splitsheet::Splitsheet;

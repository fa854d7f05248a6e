//! API route modules.

pub mod messages;
pub mod tab;
pub mod transcripts;

//! Core library for matching mailbox document attachments to enrollment
//! records.
//!
//! This crate provides:
//! - inbound message/attachment models and structured outcome records
//! - PDF text-layer decoding
//! - regex field extraction (institutes, currency amounts, date strings)
//! - date normalization and candidate lookup by inferred birth date
//! - whole-word surname matching with ambiguous fan-out
//! - the per-attachment extraction pipeline with batch orchestration
//! - routing classification and report summarization over the output

pub mod error;
pub mod extract;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod population;
pub mod report;
pub mod routing;

pub use error::{DocmatchError, PopulationError, ResolverError, Result};
pub use models::{
    Attachment, DocmatchConfig, ExtractionOutcome, Message, PopulationRecord, TerminalStage,
};
pub use pdf::{DocumentDecoder, PdfTextDecoder};
pub use pipeline::Pipeline;
pub use population::{CandidateResolver, PopulationSnapshot};
pub use report::ReportSummary;
pub use routing::{
    MessageStatus, RoutingKind, classify_message, group_by_message, resolve_recipient,
    routing_kind,
};

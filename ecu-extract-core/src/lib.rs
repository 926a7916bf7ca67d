//! ECU Extract Library
//!
//! A stateless library for reading AUTOSAR ECU extracts (ARXML) into flat
//! records and for diffing two extracts record by record.
//!
//! # Architecture
//!
//! This library is intentionally limited to extraction and comparison:
//! - Parses one in-memory document into signals, messages, signal groups and message groups
//! - Resolves cross references (scaling, PDU placement, CAN ids, directions, timing)
//! - Compares two parsed documents by name with a fixed field list per kind
//!
//! The library does NOT:
//! - Validate documents against the AUTOSAR meta-model
//! - Write ARXML back out
//! - Render tables, spreadsheets or reports
//!
//! Presentation lives in the application layer (ecu-extract-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use ecu_extract_core::{compare, parse_file, ExtractConfig};
//!
//! let config = ExtractConfig::new();
//! let base = parse_file("ecu_v1.arxml", &config).unwrap();
//! let new = parse_file("ecu_v2.arxml", &config).unwrap();
//!
//! let result = compare(&base, &new);
//! for entry in &result.signals.modified {
//!     println!("{}: {:?}", entry.new.name, entry.changed_fields);
//! }
//! ```

// Public modules
pub mod arxml;
pub mod compare;
pub mod config;
pub mod model;
pub mod types;

// Re-export main types for convenience
pub use arxml::{parse, parse_file, parse_with_config};
pub use compare::{compare, ComparisonResult, ComparisonSummary, EntityDiff, ModifiedEntry};
pub use config::ExtractConfig;
pub use model::{
    ByteOrder, Direction, DocumentStats, MessageGroupRecord, MessageRecord, ParsedDocument,
    PduKind, SignalGroupRecord, SignalRecord, TransmissionType,
};
pub use types::{ExtractError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

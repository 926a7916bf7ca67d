//! ARXML ECU extract parsing
//!
//! Parsing runs in three steps over one in-memory document:
//! 1. [`document`] parses the text and exposes it through [`MarkupNode`]
//! 2. [`index`] resolves cross references into a [`ReferenceIndex`]
//! 3. [`extract`] builds the record collections of a [`ParsedDocument`]
//!
//! Every call builds its own index; nothing is shared between calls.

pub mod document;
pub mod extract;
pub mod index;
pub mod values;

pub use document::{ArxmlDocument, MarkupNode};
pub use index::ReferenceIndex;

use crate::config::ExtractConfig;
use crate::model::ParsedDocument;
use crate::types::{ExtractError, Result};
use std::path::Path;

/// Parse an ECU extract with the default configuration
pub fn parse(text: &str) -> Result<ParsedDocument> {
    parse_with_config(text, &ExtractConfig::default())
}

/// Parse an ECU extract
///
/// Fails only when `text` is not well-formed markup. Unresolvable
/// references leave the affected fields empty.
pub fn parse_with_config(text: &str, config: &ExtractConfig) -> Result<ParsedDocument> {
    let document = ArxmlDocument::parse(text)?;
    Ok(parse_document(document.root(), config))
}

/// Build a [`ParsedDocument`] from an already parsed tree
pub fn parse_document<N: MarkupNode>(root: N, config: &ExtractConfig) -> ParsedDocument {
    let index = ReferenceIndex::build(root, config);

    let signals = extract::extract_signals(root, &index);
    let messages = extract::extract_messages(root, &index, &signals, config);
    let signal_groups = extract::extract_signal_groups(root, &index);
    let message_groups = extract::extract_message_groups(root);

    ParsedDocument {
        signals,
        messages,
        signal_groups,
        message_groups,
    }
}

/// Read and parse an ECU extract from disk
pub fn parse_file<P: AsRef<Path>>(path: P, config: &ExtractConfig) -> Result<ParsedDocument> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ExtractError::FileNotFound(path.to_path_buf()));
    }

    log::info!("Parsing ECU extract: {:?}", path);
    let text = std::fs::read_to_string(path)?;
    let parsed = parse_with_config(&text, config)?;

    let stats = parsed.stats();
    log::info!(
        "Parsed {} messages and {} signals ({} signal groups, {} message groups)",
        stats.num_messages,
        stats.num_signals,
        stats.num_signal_groups,
        stats.num_message_groups
    );

    Ok(parsed)
}

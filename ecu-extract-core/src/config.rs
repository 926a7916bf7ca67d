//! Extraction configuration types
//!
//! The extractor has very few knobs: which PDU kinds count as messages and
//! which special data group carries the per-signal transmission attributes.
//! Defaults reproduce the behavior expected for ECU extracts.

use crate::model::PduKind;
use serde::{Deserialize, Serialize};

/// Special data group GID holding `LaunchType` and `CycleTime`
pub const DEFAULT_TRANSMISSION_ATTRIBUTES_GROUP: &str = "XDISTransmissionAttributes";

/// Configuration for one parse call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// PDU kinds scanned for messages, in output order
    #[serde(default = "default_pdu_kinds")]
    pub pdu_kinds: Vec<PduKind>,

    /// GID of the SDG carrying launch type and cycle time on signal triggerings
    #[serde(default = "default_transmission_attributes_group")]
    pub transmission_attributes_group: String,
}

fn default_pdu_kinds() -> Vec<PduKind> {
    PduKind::ALL.to_vec()
}

fn default_transmission_attributes_group() -> String {
    DEFAULT_TRANSMISSION_ATTRIBUTES_GROUP.to_string()
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            pdu_kinds: default_pdu_kinds(),
            transmission_attributes_group: default_transmission_attributes_group(),
        }
    }
}

impl ExtractConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: restrict the PDU kinds extracted as messages
    pub fn with_pdu_kinds(mut self, kinds: Vec<PduKind>) -> Self {
        self.pdu_kinds = kinds;
        self
    }

    /// Builder method: use a different SDG GID for transmission attributes
    pub fn with_transmission_attributes_group(mut self, gid: impl Into<String>) -> Self {
        self.transmission_attributes_group = gid.into();
        self
    }
}

//! Extracted data model
//!
//! Flat, immutable records produced by one parse of an ECU extract. Member
//! lists inside messages and groups hold names only; the signal records own
//! every signal attribute.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Byte order of a signal inside its PDU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Motorola format (`MOST-SIGNIFICANT-BYTE-FIRST`)
    #[serde(rename = "Big-Endian")]
    BigEndian,
    /// Intel format (everything else, including an absent byte order)
    #[serde(rename = "Little-Endian")]
    LittleEndian,
}

impl ByteOrder {
    /// Normalize an AUTOSAR `PACKING-BYTE-ORDER` value
    pub fn from_packing(text: Option<&str>) -> Self {
        match text {
            Some("MOST-SIGNIFICANT-BYTE-FIRST") => ByteOrder::BigEndian,
            _ => ByteOrder::LittleEndian,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ByteOrder::BigEndian => "Big-Endian",
            ByteOrder::LittleEndian => "Little-Endian",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a message is sent on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransmissionType {
    Periodic,
    Spontaneous,
}

impl TransmissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransmissionType::Periodic => "Periodic",
            TransmissionType::Spontaneous => "Spontaneous",
        }
    }
}

impl fmt::Display for TransmissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Communication direction of a PDU as seen from the ECU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Tx,
    Rx,
}

impl Direction {
    /// Map an I-PDU port `COMMUNICATION-DIRECTION` value (`OUT` is Tx, anything else Rx)
    pub fn from_communication_direction(text: &str) -> Self {
        if text == "OUT" {
            Direction::Tx
        } else {
            Direction::Rx
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Tx => "Tx",
            Direction::Rx => "Rx",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AUTOSAR PDU kinds recognized as messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PduKind {
    #[serde(rename = "I-SIGNAL-I-PDU")]
    ISignalIPdu,
    #[serde(rename = "DCM-I-PDU")]
    DcmIPdu,
    #[serde(rename = "NM-PDU")]
    NmPdu,
    #[serde(rename = "N-PDU")]
    NPdu,
    #[serde(rename = "CONTAINER-I-PDU")]
    ContainerIPdu,
    #[serde(rename = "MULTIPLEXED-I-PDU")]
    MultiplexedIPdu,
    #[serde(rename = "GENERAL-PURPOSE-I-PDU")]
    GeneralPurposeIPdu,
}

impl PduKind {
    /// All kinds, in the order messages are extracted
    pub const ALL: [PduKind; 7] = [
        PduKind::ISignalIPdu,
        PduKind::DcmIPdu,
        PduKind::NmPdu,
        PduKind::NPdu,
        PduKind::ContainerIPdu,
        PduKind::MultiplexedIPdu,
        PduKind::GeneralPurposeIPdu,
    ];

    /// The element tag declaring a PDU of this kind
    pub fn tag(&self) -> &'static str {
        match self {
            PduKind::ISignalIPdu => "I-SIGNAL-I-PDU",
            PduKind::DcmIPdu => "DCM-I-PDU",
            PduKind::NmPdu => "NM-PDU",
            PduKind::NPdu => "N-PDU",
            PduKind::ContainerIPdu => "CONTAINER-I-PDU",
            PduKind::MultiplexedIPdu => "MULTIPLEXED-I-PDU",
            PduKind::GeneralPurposeIPdu => "GENERAL-PURPOSE-I-PDU",
        }
    }
}

impl fmt::Display for PduKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PduKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PduKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| format!("Unknown PDU kind: {}", s))
    }
}

/// An elementary signal (I-SIGNAL) with its placement and scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    /// Signal short name (diff identity)
    pub name: String,
    /// PDU the signal is mapped into (empty when unmapped)
    pub pdu_name: String,
    /// Start bit inside the PDU
    pub start_position: u64,
    /// Length in bits
    pub length: u64,
    pub byte_order: ByteOrder,
    /// Base type name from `BASE-TYPE-REF`
    pub data_type: String,
    pub init_value: Option<String>,
    pub description: String,
    /// Lower physical bound; `"0"` when no scaling method resolved
    pub min_value: String,
    /// Upper physical bound; `"0"` when no scaling method resolved
    pub max_value: String,
    pub factor: Option<String>,
    pub offset: Option<String>,
    pub port_interface: Option<String>,
}

/// A PDU of any recognized kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// PDU short name (diff identity)
    pub name: String,
    pub frame_name: Option<String>,
    #[serde(rename = "type")]
    pub transmission_type: TransmissionType,
    /// Cycle time in milliseconds
    pub cycle_time: Option<f64>,
    /// Length in bytes
    pub length: u64,
    /// Names of the signals mapped into this PDU
    pub signals: Vec<String>,
    pub description: String,
    pub pdu_type: PduKind,
    pub direction: Option<Direction>,
    pub addressing_format: Option<String>,
    pub can_id: Option<u64>,
    /// CAN identifier as uppercase hex with `0x` prefix
    pub can_id_hex: Option<String>,
    pub can_addressing_mode: Option<String>,
    pub can_frame_behavior: Option<String>,
}

/// An I-SIGNAL-GROUP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalGroupRecord {
    pub name: String,
    pub signals: Vec<String>,
    pub description: String,
    pub port_interface: Option<String>,
}

/// An I-SIGNAL-I-PDU-GROUP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageGroupRecord {
    pub name: String,
    pub messages: Vec<String>,
    pub description: String,
}

/// Everything extracted from one ECU extract document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub signals: Vec<SignalRecord>,
    pub messages: Vec<MessageRecord>,
    pub signal_groups: Vec<SignalGroupRecord>,
    pub message_groups: Vec<MessageGroupRecord>,
}

impl ParsedDocument {
    /// Get document statistics
    pub fn stats(&self) -> DocumentStats {
        let messages_per_kind = PduKind::ALL
            .iter()
            .map(|kind| {
                let count = self.messages.iter().filter(|m| m.pdu_type == *kind).count();
                (*kind, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();

        DocumentStats {
            num_messages: self.messages.len(),
            num_signals: self.signals.len(),
            num_signal_groups: self.signal_groups.len(),
            num_message_groups: self.message_groups.len(),
            messages_per_kind,
        }
    }

    /// Find a message by PDU name (last declaration wins)
    pub fn message(&self, name: &str) -> Option<&MessageRecord> {
        self.messages.iter().rev().find(|m| m.name == name)
    }

    /// Find a signal by name (last declaration wins)
    pub fn signal(&self, name: &str) -> Option<&SignalRecord> {
        self.signals.iter().rev().find(|s| s.name == name)
    }
}

/// Document statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub num_messages: usize,
    pub num_signals: usize,
    pub num_signal_groups: usize,
    pub num_message_groups: usize,
    /// Message count per PDU kind (kinds without messages are omitted)
    pub messages_per_kind: Vec<(PduKind, usize)>,
}

//! Comparable fields per record kind
//!
//! Each kind has a fixed list of [`FieldDescriptor`]s. A descriptor names
//! the field as it appears in the serialized record and reads the field as a
//! [`FieldValue`], whose equality is the comparison rule: scalars by value,
//! member lists elementwise in order.

use crate::arxml::values::format_number;
use crate::model::{MessageGroupRecord, MessageRecord, SignalGroupRecord, SignalRecord};
use std::fmt;

/// Borrowed view of one comparable field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Integer(Option<u64>),
    Number(Option<f64>),
    List(&'a [String]),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(Some(text)) => f.write_str(text),
            FieldValue::Integer(Some(value)) => write!(f, "{}", value),
            FieldValue::Number(Some(value)) => f.write_str(&format_number(*value)),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
            FieldValue::Text(None) | FieldValue::Integer(None) | FieldValue::Number(None) => {
                f.write_str("-")
            }
        }
    }
}

/// A named accessor for one comparable field of `T`
pub struct FieldDescriptor<T> {
    pub name: &'static str,
    pub get: fn(&T) -> FieldValue<'_>,
}

impl<T> FieldDescriptor<T> {
    /// Whether the field differs between two records
    pub fn differs(&self, old: &T, new: &T) -> bool {
        (self.get)(old) != (self.get)(new)
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

macro_rules! field {
    ($record:ty, $name:literal, |$r:ident| $value:expr) => {
        FieldDescriptor {
            name: $name,
            get: {
                fn get($r: &$record) -> FieldValue<'_> {
                    $value
                }
                get
            },
        }
    };
}

pub const MESSAGE_FIELDS: &[FieldDescriptor<MessageRecord>] = &[
    field!(MessageRecord, "frameName", |m| FieldValue::Text(m.frame_name.as_deref())),
    field!(MessageRecord, "canIdHex", |m| FieldValue::Text(m.can_id_hex.as_deref())),
    field!(MessageRecord, "canId", |m| FieldValue::Integer(m.can_id)),
    field!(MessageRecord, "pduType", |m| FieldValue::Text(Some(m.pdu_type.tag()))),
    field!(MessageRecord, "direction", |m| FieldValue::Text(
        m.direction.as_ref().map(|d| d.as_str())
    )),
    field!(MessageRecord, "canAddressingMode", |m| FieldValue::Text(
        m.can_addressing_mode.as_deref()
    )),
    field!(MessageRecord, "addressingFormat", |m| FieldValue::Text(
        m.addressing_format.as_deref()
    )),
    field!(MessageRecord, "type", |m| FieldValue::Text(Some(
        m.transmission_type.as_str()
    ))),
    field!(MessageRecord, "cycleTime", |m| FieldValue::Number(m.cycle_time)),
    field!(MessageRecord, "length", |m| FieldValue::Integer(Some(m.length))),
    field!(MessageRecord, "description", |m| FieldValue::Text(Some(m.description.as_str()))),
];

pub const SIGNAL_FIELDS: &[FieldDescriptor<SignalRecord>] = &[
    field!(SignalRecord, "pduName", |s| FieldValue::Text(Some(s.pdu_name.as_str()))),
    field!(SignalRecord, "startPosition", |s| FieldValue::Integer(Some(s.start_position))),
    field!(SignalRecord, "length", |s| FieldValue::Integer(Some(s.length))),
    field!(SignalRecord, "byteOrder", |s| FieldValue::Text(Some(s.byte_order.as_str()))),
    field!(SignalRecord, "dataType", |s| FieldValue::Text(Some(s.data_type.as_str()))),
    field!(SignalRecord, "initValue", |s| FieldValue::Text(s.init_value.as_deref())),
    field!(SignalRecord, "minValue", |s| FieldValue::Text(Some(s.min_value.as_str()))),
    field!(SignalRecord, "maxValue", |s| FieldValue::Text(Some(s.max_value.as_str()))),
    field!(SignalRecord, "description", |s| FieldValue::Text(Some(s.description.as_str()))),
];

pub const SIGNAL_GROUP_FIELDS: &[FieldDescriptor<SignalGroupRecord>] = &[
    field!(SignalGroupRecord, "signals", |g| FieldValue::List(&g.signals)),
    field!(SignalGroupRecord, "description", |g| FieldValue::Text(Some(g.description.as_str()))),
];

pub const MESSAGE_GROUP_FIELDS: &[FieldDescriptor<MessageGroupRecord>] = &[
    field!(MessageGroupRecord, "messages", |g| FieldValue::List(&g.messages)),
    field!(MessageGroupRecord, "description", |g| FieldValue::Text(Some(g.description.as_str()))),
];

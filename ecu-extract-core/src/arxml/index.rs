//! Reference index built from one ECU extract
//!
//! ARXML relates its elements through textual reference paths. Before any
//! record is materialized, one pass over the document resolves those
//! references into name-keyed lookup tables. Each table is built by its own
//! function from a single descendant-tag scan, so the tables are independent
//! of each other and of build order. Duplicate keys keep the last value seen.
//!
//! AUTOSAR structure walked here:
//! - COMPU-METHOD → COMPU-INTERNAL-TO-PHYS → COMPU-SCALES → COMPU-SCALE
//! - SYSTEM-SIGNAL → PHYSICAL-PROPS → ... → COMPU-METHOD-REF
//! - SENDER-RECEIVER-TO-SIGNAL(-GROUP)-MAPPING → TARGET-DATA-PROTOTYPE-REF
//! - I-SIGNAL-I-PDU → I-SIGNAL-TO-I-PDU-MAPPING → I-SIGNAL-REF
//! - CAN-FRAME-TRIGGERING → FRAME-REF + IDENTIFIER + PDU-TRIGGERING-REF
//! - PDU-TRIGGERING → I-PDU-REF + I-PDU-PORT-REFS
//! - CAN-TP-CONNECTION → DATA-PDU-REF / TP-SDU-REF
//! - CAN-NM-CLUSTER → NM-MSG-CYCLE-TIME + CAN-NM-NODE PDU refs
//! - I-SIGNAL-TRIGGERING → ADMIN-DATA → SDGS → SDG → SD

use crate::arxml::document::MarkupNode;
use crate::arxml::values::{
    format_can_id, format_number, last_segment, parent_segment, parse_count,
    parse_float_prefix, parse_int_prefix,
};
use crate::config::ExtractConfig;
use crate::model::Direction;
use std::collections::HashMap;

/// Physical scaling resolved from one COMPU-METHOD
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalingInfo {
    pub min: Option<String>,
    pub max: Option<String>,
    pub factor: Option<String>,
    pub offset: Option<String>,
}

/// Where an elementary signal sits inside its PDU
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalPlacement {
    pub pdu_name: String,
    pub start_position: Option<u64>,
    /// Raw `PACKING-BYTE-ORDER` text
    pub byte_order: Option<String>,
}

/// CAN bus binding of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct CanFrameInfo {
    pub can_id: Option<u64>,
    pub can_id_hex: Option<String>,
    pub addressing_mode: String,
    pub frame_behavior: String,
}

/// Transmission attributes attached to a signal triggering
#[derive(Debug, Clone, PartialEq)]
pub struct SignalTiming {
    pub launch_type: String,
    /// Milliseconds
    pub cycle_time: Option<f64>,
}

/// Immutable bundle of every lookup table the extractor needs
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    scaling: HashMap<String, ScalingInfo>,
    system_signal_scaling: HashMap<String, String>,
    system_signal_port_interface: HashMap<String, String>,
    signal_group_port_interface: HashMap<String, String>,
    signal_placement: HashMap<String, SignalPlacement>,
    can_frames: HashMap<String, CanFrameInfo>,
    pdu_frame: HashMap<String, String>,
    pdu_direction: HashMap<String, Direction>,
    pdu_addressing_format: HashMap<String, String>,
    nm_pdu_cycle_time: HashMap<String, f64>,
    signal_timing: HashMap<String, SignalTiming>,
}

impl ReferenceIndex {
    /// Build all lookup tables from the document below `root`
    pub fn build<N: MarkupNode>(root: N, config: &ExtractConfig) -> Self {
        let index = Self {
            scaling: scaling_table(root),
            system_signal_scaling: system_signal_scaling(root),
            system_signal_port_interface: port_interface_table(
                root,
                "SENDER-RECEIVER-TO-SIGNAL-MAPPING",
                "SYSTEM-SIGNAL-REF",
            ),
            signal_group_port_interface: port_interface_table(
                root,
                "SENDER-RECEIVER-TO-SIGNAL-GROUP-MAPPING",
                "SIGNAL-GROUP-REF",
            ),
            signal_placement: signal_placement(root),
            can_frames: can_frames(root),
            pdu_frame: pdu_frames(root),
            pdu_direction: pdu_directions(root),
            pdu_addressing_format: pdu_addressing_formats(root),
            nm_pdu_cycle_time: nm_pdu_cycle_times(root),
            signal_timing: signal_timings(root, &config.transmission_attributes_group),
        };

        log::debug!(
            "Reference index: {} compu methods, {} system signals, {} signal placements, \
             {} CAN frames, {} PDU-frame links, {} PDU directions, {} addressing formats, \
             {} NM PDUs, {} signal timings",
            index.scaling.len(),
            index.system_signal_scaling.len(),
            index.signal_placement.len(),
            index.can_frames.len(),
            index.pdu_frame.len(),
            index.pdu_direction.len(),
            index.pdu_addressing_format.len(),
            index.nm_pdu_cycle_time.len(),
            index.signal_timing.len(),
        );

        index
    }

    /// Scaling of a COMPU-METHOD by name
    pub fn scaling(&self, compu_method: &str) -> Option<&ScalingInfo> {
        self.scaling.get(compu_method)
    }

    /// COMPU-METHOD name referenced by a SYSTEM-SIGNAL's physical props
    pub fn system_signal_scaling(&self, system_signal: &str) -> Option<&str> {
        self.system_signal_scaling.get(system_signal).map(String::as_str)
    }

    /// Port interface a SYSTEM-SIGNAL is mapped to
    pub fn system_signal_port_interface(&self, system_signal: &str) -> Option<&str> {
        self.system_signal_port_interface
            .get(system_signal)
            .map(String::as_str)
    }

    /// Port interface a SYSTEM-SIGNAL-GROUP is mapped to
    pub fn signal_group_port_interface(&self, signal_group: &str) -> Option<&str> {
        self.signal_group_port_interface
            .get(signal_group)
            .map(String::as_str)
    }

    /// PDU placement of an I-SIGNAL
    pub fn signal_placement(&self, signal: &str) -> Option<&SignalPlacement> {
        self.signal_placement.get(signal)
    }

    /// CAN binding of a frame
    pub fn can_frame(&self, frame: &str) -> Option<&CanFrameInfo> {
        self.can_frames.get(frame)
    }

    /// Frame carrying a PDU
    pub fn pdu_frame(&self, pdu: &str) -> Option<&str> {
        self.pdu_frame.get(pdu).map(String::as_str)
    }

    /// Direction of a PDU
    pub fn pdu_direction(&self, pdu: &str) -> Option<Direction> {
        self.pdu_direction.get(pdu).copied()
    }

    /// CAN-TP addressing format of a PDU
    pub fn pdu_addressing_format(&self, pdu: &str) -> Option<&str> {
        self.pdu_addressing_format.get(pdu).map(String::as_str)
    }

    /// NM cluster cycle time of an NM-PDU, in milliseconds
    pub fn nm_pdu_cycle_time(&self, pdu: &str) -> Option<f64> {
        self.nm_pdu_cycle_time.get(pdu).copied()
    }

    /// Launch type and cycle time of a signal
    pub fn signal_timing(&self, signal: &str) -> Option<&SignalTiming> {
        self.signal_timing.get(signal)
    }

    /// Whether a COMPU-METHOD with this name made it into the scaling table
    pub fn has_scaling(&self, compu_method: &str) -> bool {
        self.scaling.contains_key(compu_method)
    }
}

/// Text of the first `tag` element below `node`, if present and non-empty
fn text_of<N: MarkupNode>(node: N, tag: &str) -> Option<String> {
    node.first_child_text(tag).filter(|text| !text.is_empty())
}

/// Short name of an identifiable element (empty when missing)
fn short_name<N: MarkupNode>(node: N) -> String {
    node.first_child_text("SHORT-NAME").unwrap_or_default()
}

/// Running min/max over COMPU-SCALE limits
#[derive(Debug, Default)]
struct Bounds {
    min: Option<f64>,
    max: Option<f64>,
}

impl Bounds {
    fn include<N: MarkupNode>(&mut self, scale: N) {
        if let Some(lower) = scale
            .first_child_text("LOWER-LIMIT")
            .and_then(|text| parse_float_prefix(&text))
        {
            self.min = Some(self.min.map_or(lower, |min| min.min(lower)));
        }
        if let Some(upper) = scale
            .first_child_text("UPPER-LIMIT")
            .and_then(|text| parse_float_prefix(&text))
        {
            self.max = Some(self.max.map_or(upper, |max| max.max(upper)));
        }
    }

    fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Factor and offset of a linear scale: (num[1] / den[0], num[0] / den[0])
fn linear_coefficients<N: MarkupNode>(rational: N) -> Option<(f64, f64)> {
    let numerator = rational.select(&["COMPU-NUMERATOR", "V"]);
    let denominator = rational.select(&["COMPU-DENOMINATOR", "V"]);
    if numerator.len() < 2 || denominator.is_empty() {
        return None;
    }

    let coefficient = |node: N, default: f64| {
        let text = node.text_content();
        if text.is_empty() {
            Some(default)
        } else {
            parse_float_prefix(&text)
        }
    };

    let num0 = coefficient(numerator[0], 0.0)?;
    let num1 = coefficient(numerator[1], 1.0)?;
    let denom = coefficient(denominator[0], 1.0)?;
    if denom == 0.0 {
        return None;
    }

    Some((num1 / denom, num0 / denom))
}

/// COMPU-METHOD name → min/max/factor/offset
///
/// Only linear scales (those carrying COMPU-RATIONAL-COEFFS) bound the value
/// range, so text-table entries such as SNA or ERR do not widen it. When no
/// linear scale yields a limit, a TEXTTABLE method takes its range from all
/// scales and any other method from the scales without a COMPU-CONST.
pub(crate) fn scaling_table<N: MarkupNode>(root: N) -> HashMap<String, ScalingInfo> {
    let mut table = HashMap::new();

    for method in root.all_descendants("COMPU-METHOD") {
        let name = short_name(method);
        let category = method.first_child_text("CATEGORY").unwrap_or_default();
        let scales = method.select(&["COMPU-INTERNAL-TO-PHYS", "COMPU-SCALES", "COMPU-SCALE"]);

        let mut bounds = Bounds::default();
        let mut coefficients = None;

        for scale in &scales {
            let Some(rational) = scale.select_first(&["COMPU-RATIONAL-COEFFS"]) else {
                continue;
            };
            bounds.include(*scale);
            if coefficients.is_none() {
                coefficients = linear_coefficients(rational);
            }
        }

        if bounds.is_empty() && category == "TEXTTABLE" {
            for scale in &scales {
                bounds.include(*scale);
            }
        }

        if bounds.is_empty() {
            for scale in scales
                .iter()
                .filter(|scale| scale.select_first(&["COMPU-CONST"]).is_none())
            {
                bounds.include(*scale);
            }
        }

        if name.is_empty() || (bounds.is_empty() && coefficients.is_none()) {
            log::trace!("COMPU-METHOD '{}' has no usable scaling, skipping", name);
            continue;
        }

        table.insert(
            name,
            ScalingInfo {
                min: bounds.min.map(format_number),
                max: bounds.max.map(format_number),
                factor: coefficients.map(|(factor, _)| format_number(factor)),
                offset: coefficients.map(|(_, offset)| format_number(offset)),
            },
        );
    }

    table
}

/// SYSTEM-SIGNAL name → COMPU-METHOD name
pub(crate) fn system_signal_scaling<N: MarkupNode>(root: N) -> HashMap<String, String> {
    let mut table = HashMap::new();

    for system_signal in root.all_descendants("SYSTEM-SIGNAL") {
        let name = short_name(system_signal);
        let compu_method = system_signal
            .select_text(&[
                "PHYSICAL-PROPS",
                "SW-DATA-DEF-PROPS-VARIANTS",
                "SW-DATA-DEF-PROPS-CONDITIONAL",
                "COMPU-METHOD-REF",
            ])
            .map(|path| last_segment(&path).to_string())
            .unwrap_or_default();

        if !name.is_empty() && !compu_method.is_empty() {
            table.insert(name, compu_method);
        }
    }

    table
}

/// Mapped element name → port interface, from sender/receiver mappings
///
/// The interface is the second-to-last segment of TARGET-DATA-PROTOTYPE-REF.
pub(crate) fn port_interface_table<N: MarkupNode>(
    root: N,
    mapping_tag: &str,
    source_ref_tag: &str,
) -> HashMap<String, String> {
    let mut table = HashMap::new();

    for mapping in root.all_descendants(mapping_tag) {
        let (Some(source_ref), Some(target_ref)) = (
            text_of(mapping, source_ref_tag),
            text_of(mapping, "TARGET-DATA-PROTOTYPE-REF"),
        ) else {
            continue;
        };

        let source = last_segment(&source_ref);
        match parent_segment(&target_ref) {
            Some(interface) if !source.is_empty() => {
                table.insert(source.to_string(), interface.to_string());
            }
            _ => {}
        }
    }

    table
}

/// I-SIGNAL name → PDU name, start bit, byte order
pub(crate) fn signal_placement<N: MarkupNode>(root: N) -> HashMap<String, SignalPlacement> {
    let mut table: HashMap<String, SignalPlacement> = HashMap::new();

    for pdu in root.all_descendants("I-SIGNAL-I-PDU") {
        // Direct child only, a nested element must not rename the PDU
        let pdu_name = pdu
            .direct_children("SHORT-NAME")
            .first()
            .map(|node| node.text_content())
            .unwrap_or_default();

        for mapping in pdu.all_descendants("I-SIGNAL-TO-I-PDU-MAPPING") {
            let Some(signal_ref) = mapping.select_first(&["I-SIGNAL-REF"]) else {
                continue;
            };
            let signal_name = last_segment(&signal_ref.text_content()).to_string();

            let start_position = mapping
                .first_child_text("START-POSITION")
                .map(|text| parse_count(Some(text.as_str())));
            let byte_order = mapping.first_child_text("PACKING-BYTE-ORDER").map(|text| {
                if text.is_empty() {
                    "MOST-SIGNIFICANT-BYTE-LAST".to_string()
                } else {
                    text
                }
            });

            let entry = table.entry(signal_name).or_default();
            entry.pdu_name = pdu_name.clone();
            if start_position.is_some() {
                entry.start_position = start_position;
            }
            if byte_order.is_some() {
                entry.byte_order = byte_order;
            }
        }
    }

    table
}

/// Frame name → CAN identifier, addressing mode, frame behavior
pub(crate) fn can_frames<N: MarkupNode>(root: N) -> HashMap<String, CanFrameInfo> {
    let mut table = HashMap::new();

    for triggering in root.all_descendants("CAN-FRAME-TRIGGERING") {
        let (Some(frame_ref), Some(identifier)) = (
            triggering.first_child_text("FRAME-REF"),
            triggering.first_child_text("IDENTIFIER"),
        ) else {
            continue;
        };

        let frame_name = last_segment(&frame_ref).to_string();
        let identifier = if identifier.is_empty() { "0".to_string() } else { identifier };
        let can_id = parse_int_prefix(&identifier).and_then(|id| u64::try_from(id).ok());
        if can_id.is_none() {
            log::warn!(
                "CAN-FRAME-TRIGGERING for frame '{}' has an unparseable or out of range IDENTIFIER '{}'",
                frame_name,
                identifier
            );
        }

        let addressing_mode =
            text_of(triggering, "CAN-ADDRESSING-MODE").unwrap_or_else(|| "STANDARD".to_string());
        let frame_behavior = text_of(triggering, "CAN-FRAME-TX-BEHAVIOR")
            .or_else(|| text_of(triggering, "CAN-FRAME-RX-BEHAVIOR"))
            .unwrap_or_else(|| "CAN".to_string());

        table.insert(
            frame_name,
            CanFrameInfo {
                can_id,
                can_id_hex: can_id.map(format_can_id),
                addressing_mode,
                frame_behavior,
            },
        );
    }

    table
}

/// PDU name → frame name
///
/// A PDU belongs to a frame when its PDU-TRIGGERING short name is contained
/// in the frame triggering's PDU-TRIGGERING-REF text. This is substring
/// containment, not path equality, so a short name that is a substring of
/// another triggering's path also matches.
pub(crate) fn pdu_frames<N: MarkupNode>(root: N) -> HashMap<String, String> {
    let mut table = HashMap::new();

    let frame_links: Vec<(Option<String>, Option<String>)> = root
        .all_descendants("CAN-FRAME-TRIGGERING")
        .into_iter()
        .map(|triggering| {
            (
                triggering.first_child_text("PDU-TRIGGERING-REF"),
                triggering.first_child_text("FRAME-REF"),
            )
        })
        .collect();

    for pdu_triggering in root.all_descendants("PDU-TRIGGERING") {
        let Some(pdu_ref) = pdu_triggering.first_child_text("I-PDU-REF") else {
            continue;
        };
        let pdu_name = last_segment(&pdu_ref);
        let triggering_name = short_name(pdu_triggering);

        for (pdu_triggering_ref, frame_ref) in &frame_links {
            let contains = pdu_triggering_ref
                .as_deref()
                .is_some_and(|text| text.contains(triggering_name.as_str()));
            if !contains {
                continue;
            }
            if let Some(frame_ref) = frame_ref {
                table.insert(pdu_name.to_string(), last_segment(frame_ref).to_string());
            }
        }
    }

    table
}

/// PDU name → Tx/Rx, joined through PDU-TRIGGERING port references
pub(crate) fn pdu_directions<N: MarkupNode>(root: N) -> HashMap<String, Direction> {
    let mut ports = HashMap::new();
    for port in root.all_descendants("I-PDU-PORT") {
        let name = short_name(port);
        if name.is_empty() {
            continue;
        }
        if let Some(direction) = text_of(port, "COMMUNICATION-DIRECTION") {
            ports.insert(name, Direction::from_communication_direction(&direction));
        }
    }

    let mut table = HashMap::new();
    for pdu_triggering in root.all_descendants("PDU-TRIGGERING") {
        let Some(pdu_ref) = pdu_triggering.first_child_text("I-PDU-REF") else {
            continue;
        };
        let pdu_name = last_segment(&pdu_ref);
        if pdu_name.is_empty() {
            continue;
        }

        for port_ref in pdu_triggering.select(&["I-PDU-PORT-REFS", "I-PDU-PORT-REF"]) {
            let port_name = last_segment(&port_ref.text_content()).to_string();
            if let Some(direction) = ports.get(&port_name) {
                table.insert(pdu_name.to_string(), *direction);
            }
        }
    }

    table
}

/// PDU name → CAN-TP addressing format
///
/// One connection may register both its data PDU and its TP SDU.
pub(crate) fn pdu_addressing_formats<N: MarkupNode>(root: N) -> HashMap<String, String> {
    let mut table = HashMap::new();

    for connection in root.all_descendants("CAN-TP-CONNECTION") {
        let Some(format) = text_of(connection, "ADDRESSING-FORMAT") else {
            continue;
        };

        for ref_tag in ["DATA-PDU-REF", "TP-SDU-REF"] {
            let pdu_name = connection
                .first_child_text(ref_tag)
                .map(|path| last_segment(&path).to_string())
                .unwrap_or_default();
            if !pdu_name.is_empty() {
                table.insert(pdu_name, format.clone());
            }
        }
    }

    table
}

/// NM-PDU name → cluster cycle time in milliseconds
///
/// NM-MSG-CYCLE-TIME is given in seconds. A zero or missing cycle time leaves
/// the cluster's PDUs out of the table.
pub(crate) fn nm_pdu_cycle_times<N: MarkupNode>(root: N) -> HashMap<String, f64> {
    let mut table = HashMap::new();

    for cluster in root.all_descendants("CAN-NM-CLUSTER") {
        let cycle_time_ms = cluster
            .first_child_text("NM-MSG-CYCLE-TIME")
            .and_then(|text| {
                if text.is_empty() {
                    Some(0.0)
                } else {
                    parse_float_prefix(&text)
                }
            })
            .map(|seconds| seconds * 1000.0)
            .filter(|ms| *ms != 0.0);
        let Some(cycle_time_ms) = cycle_time_ms else {
            continue;
        };

        for node in cluster.all_descendants("CAN-NM-NODE") {
            let refs = node
                .select(&["TX-NM-PDU-REFS", "TX-NM-PDU-REF"])
                .into_iter()
                .chain(node.select(&["RX-NM-PDU-REFS", "RX-NM-PDU-REF"]));
            for pdu_ref in refs {
                let pdu_name = last_segment(&pdu_ref.text_content()).to_string();
                if !pdu_name.is_empty() {
                    table.insert(pdu_name, cycle_time_ms);
                }
            }
        }
    }

    table
}

/// I-SIGNAL name → launch type and cycle time (already in milliseconds)
pub(crate) fn signal_timings<N: MarkupNode>(
    root: N,
    attributes_group: &str,
) -> HashMap<String, SignalTiming> {
    let mut table = HashMap::new();

    for triggering in root.all_descendants("I-SIGNAL-TRIGGERING") {
        let (Some(signal_ref), Some(admin_data)) = (
            triggering.first_child_text("I-SIGNAL-REF"),
            triggering.select_first(&["ADMIN-DATA"]),
        ) else {
            continue;
        };
        let Some(sdgs) = admin_data.select_first(&["SDGS"]) else {
            continue;
        };
        let Some(group) = sdgs
            .all_descendants("SDG")
            .into_iter()
            .find(|sdg| sdg.attribute_value("GID").as_deref() == Some(attributes_group))
        else {
            continue;
        };

        let item = |gid: &str| {
            group
                .all_descendants("SD")
                .into_iter()
                .find(|sd| sd.attribute_value("GID").as_deref() == Some(gid))
        };

        let launch_type = item("LaunchType")
            .map(|sd| sd.text_content())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "Spontaneous".to_string());
        let cycle_time = item("CycleTime").and_then(|sd| {
            let text = sd.text_content();
            if text.is_empty() {
                Some(0.0)
            } else {
                parse_float_prefix(&text)
            }
        });

        table.insert(
            last_segment(&signal_ref).to_string(),
            SignalTiming {
                launch_type,
                cycle_time,
            },
        );
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arxml::document::ArxmlDocument;

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<AUTOSAR xmlns="http://autosar.org/schema/r4.0"><AR-PACKAGES><AR-PACKAGE>
<SHORT-NAME>Test</SHORT-NAME><ELEMENTS>{}</ELEMENTS></AR-PACKAGE></AR-PACKAGES></AUTOSAR>"#,
            body
        )
    }

    fn compu_method(name: &str, category: &str, scales: &str) -> String {
        format!(
            "<COMPU-METHOD><SHORT-NAME>{}</SHORT-NAME><CATEGORY>{}</CATEGORY>\
             <COMPU-INTERNAL-TO-PHYS><COMPU-SCALES>{}</COMPU-SCALES></COMPU-INTERNAL-TO-PHYS>\
             </COMPU-METHOD>",
            name, category, scales
        )
    }

    fn linear_scale(lower: &str, upper: &str, num: [&str; 2], den: &str) -> String {
        format!(
            "<COMPU-SCALE><LOWER-LIMIT>{}</LOWER-LIMIT><UPPER-LIMIT>{}</UPPER-LIMIT>\
             <COMPU-RATIONAL-COEFFS><COMPU-NUMERATOR><V>{}</V><V>{}</V></COMPU-NUMERATOR>\
             <COMPU-DENOMINATOR><V>{}</V></COMPU-DENOMINATOR></COMPU-RATIONAL-COEFFS></COMPU-SCALE>",
            lower, upper, num[0], num[1], den
        )
    }

    fn const_scale(lower: &str, upper: &str, label: &str) -> String {
        format!(
            "<COMPU-SCALE><LOWER-LIMIT>{}</LOWER-LIMIT><UPPER-LIMIT>{}</UPPER-LIMIT>\
             <COMPU-CONST><VT>{}</VT></COMPU-CONST></COMPU-SCALE>",
            lower, upper, label
        )
    }

    #[test]
    fn test_linear_scale_resolves_factor_offset_and_bounds() {
        let text = wrap(&compu_method(
            "CM_Speed",
            "LINEAR",
            &linear_scale("0", "255", ["0", "1"], "1"),
        ));
        let doc = ArxmlDocument::parse(&text).unwrap();
        let table = scaling_table(doc.root());

        assert_eq!(
            table.get("CM_Speed"),
            Some(&ScalingInfo {
                min: Some("0".to_string()),
                max: Some("255".to_string()),
                factor: Some("1".to_string()),
                offset: Some("0".to_string()),
            })
        );
    }

    #[test]
    fn test_linear_bounds_ignore_text_table_entries() {
        let scales = format!(
            "{}{}{}",
            linear_scale("0", "200", ["-40", "1"], "2"),
            const_scale("254", "254", "ERR"),
            linear_scale("201", "250", ["0", "3"], "1"),
        );
        let text = wrap(&compu_method("CM_Temp", "SCALE_LINEAR_AND_TEXTTABLE", &scales));
        let doc = ArxmlDocument::parse(&text).unwrap();
        let info = scaling_table(doc.root()).remove("CM_Temp").unwrap();

        assert_eq!(info.min.as_deref(), Some("0"));
        assert_eq!(info.max.as_deref(), Some("250"));
        // first linear scale wins
        assert_eq!(info.factor.as_deref(), Some("0.5"));
        assert_eq!(info.offset.as_deref(), Some("-20"));
    }

    #[test]
    fn test_text_table_bounds_span_all_scales() {
        let scales = format!(
            "{}{}",
            const_scale("0", "0", "Off"),
            const_scale("3", "3", "SNA")
        );
        let text = wrap(&compu_method("CM_State", "TEXTTABLE", &scales));
        let doc = ArxmlDocument::parse(&text).unwrap();
        let info = scaling_table(doc.root()).remove("CM_State").unwrap();

        assert_eq!(info.min.as_deref(), Some("0"));
        assert_eq!(info.max.as_deref(), Some("3"));
        assert_eq!(info.factor, None);
        assert_eq!(info.offset, None);
    }

    #[test]
    fn test_other_categories_skip_const_scales() {
        let scales = format!(
            "<COMPU-SCALE><LOWER-LIMIT>-10</LOWER-LIMIT><UPPER-LIMIT>10</UPPER-LIMIT></COMPU-SCALE>{}",
            const_scale("100", "100", "SNA")
        );
        let text = wrap(&compu_method("CM_Ident", "IDENTICAL", &scales));
        let doc = ArxmlDocument::parse(&text).unwrap();
        let info = scaling_table(doc.root()).remove("CM_Ident").unwrap();

        assert_eq!(info.min.as_deref(), Some("-10"));
        assert_eq!(info.max.as_deref(), Some("10"));
    }

    #[test]
    fn test_method_without_scaling_is_dropped() {
        let body = format!(
            "{}{}",
            compu_method("CM_Empty", "IDENTICAL", ""),
            compu_method("CM_OnlyConst", "BITFIELD_TEXTTABLE", &const_scale("1", "1", "On")),
        );
        let text = wrap(&body);
        let doc = ArxmlDocument::parse(&text).unwrap();
        let table = scaling_table(doc.root());

        assert!(table.is_empty());
    }

    #[test]
    fn test_zero_denominator_keeps_bounds_only() {
        let text = wrap(&compu_method(
            "CM_Bad",
            "LINEAR",
            &linear_scale("1", "2", ["0", "1"], "0"),
        ));
        let doc = ArxmlDocument::parse(&text).unwrap();
        let info = scaling_table(doc.root()).remove("CM_Bad").unwrap();

        assert_eq!(info.min.as_deref(), Some("1"));
        assert_eq!(info.factor, None);
    }

    #[test]
    fn test_port_interface_is_second_to_last_segment() {
        let text = wrap(
            "<SENDER-RECEIVER-TO-SIGNAL-MAPPING>\
               <DATA-ELEMENT-IREF><TARGET-DATA-PROTOTYPE-REF DEST=\"VARIABLE-DATA-PROTOTYPE\">/PortInterfaces/PI_Speed/Speed</TARGET-DATA-PROTOTYPE-REF></DATA-ELEMENT-IREF>\
               <SYSTEM-SIGNAL-REF DEST=\"SYSTEM-SIGNAL\">/SystemSignals/SS_Speed</SYSTEM-SIGNAL-REF>\
             </SENDER-RECEIVER-TO-SIGNAL-MAPPING>\
             <SENDER-RECEIVER-TO-SIGNAL-MAPPING>\
               <TARGET-DATA-PROTOTYPE-REF>/TooShort</TARGET-DATA-PROTOTYPE-REF>\
               <SYSTEM-SIGNAL-REF>/SystemSignals/SS_Other</SYSTEM-SIGNAL-REF>\
             </SENDER-RECEIVER-TO-SIGNAL-MAPPING>",
        );
        let doc = ArxmlDocument::parse(&text).unwrap();
        let table = port_interface_table(
            doc.root(),
            "SENDER-RECEIVER-TO-SIGNAL-MAPPING",
            "SYSTEM-SIGNAL-REF",
        );

        assert_eq!(table.get("SS_Speed").map(String::as_str), Some("PI_Speed"));
        assert!(!table.contains_key("SS_Other"));
    }

    #[test]
    fn test_signal_placement_uses_direct_pdu_name() {
        let text = wrap(
            "<I-SIGNAL-I-PDU><SHORT-NAME>PDU_Engine</SHORT-NAME>\
               <I-SIGNAL-TO-PDU-MAPPINGS>\
                 <I-SIGNAL-TO-I-PDU-MAPPING><SHORT-NAME>Map_Rpm</SHORT-NAME>\
                   <I-SIGNAL-REF>/Signals/Rpm</I-SIGNAL-REF>\
                   <PACKING-BYTE-ORDER>MOST-SIGNIFICANT-BYTE-FIRST</PACKING-BYTE-ORDER>\
                   <START-POSITION>12</START-POSITION>\
                 </I-SIGNAL-TO-I-PDU-MAPPING>\
                 <I-SIGNAL-TO-I-PDU-MAPPING><SHORT-NAME>Map_Gear</SHORT-NAME>\
                   <I-SIGNAL-REF>/Signals/Gear</I-SIGNAL-REF>\
                 </I-SIGNAL-TO-I-PDU-MAPPING>\
               </I-SIGNAL-TO-PDU-MAPPINGS>\
             </I-SIGNAL-I-PDU>",
        );
        let doc = ArxmlDocument::parse(&text).unwrap();
        let table = signal_placement(doc.root());

        assert_eq!(
            table.get("Rpm"),
            Some(&SignalPlacement {
                pdu_name: "PDU_Engine".to_string(),
                start_position: Some(12),
                byte_order: Some("MOST-SIGNIFICANT-BYTE-FIRST".to_string()),
            })
        );
        let gear = table.get("Gear").unwrap();
        assert_eq!(gear.pdu_name, "PDU_Engine");
        assert_eq!(gear.start_position, None);
        assert_eq!(gear.byte_order, None);
    }

    #[test]
    fn test_can_frame_defaults_and_hex() {
        let text = wrap(
            "<CAN-FRAME-TRIGGERING><SHORT-NAME>FT_Diag</SHORT-NAME>\
               <FRAME-REF>/Frames/Diag_Resp</FRAME-REF>\
               <IDENTIFIER>2024</IDENTIFIER>\
             </CAN-FRAME-TRIGGERING>\
             <CAN-FRAME-TRIGGERING><SHORT-NAME>FT_Fd</SHORT-NAME>\
               <FRAME-REF>/Frames/Fd_Frame</FRAME-REF>\
               <IDENTIFIER>419361024</IDENTIFIER>\
               <CAN-ADDRESSING-MODE>EXTENDED</CAN-ADDRESSING-MODE>\
               <CAN-FRAME-RX-BEHAVIOR>CAN-FD</CAN-FRAME-RX-BEHAVIOR>\
               <CAN-FRAME-TX-BEHAVIOR>CAN-20</CAN-FRAME-TX-BEHAVIOR>\
             </CAN-FRAME-TRIGGERING>\
             <CAN-FRAME-TRIGGERING><SHORT-NAME>FT_NoId</SHORT-NAME>\
               <FRAME-REF>/Frames/NoId</FRAME-REF>\
             </CAN-FRAME-TRIGGERING>",
        );
        let doc = ArxmlDocument::parse(&text).unwrap();
        let table = can_frames(doc.root());

        let diag = table.get("Diag_Resp").unwrap();
        assert_eq!(diag.can_id, Some(2024));
        assert_eq!(diag.can_id_hex.as_deref(), Some("0x7E8"));
        assert_eq!(diag.addressing_mode, "STANDARD");
        assert_eq!(diag.frame_behavior, "CAN");

        let fd = table.get("Fd_Frame").unwrap();
        assert_eq!(fd.can_id_hex.as_deref(), Some("0x18FEF100"));
        assert_eq!(fd.addressing_mode, "EXTENDED");
        assert_eq!(fd.frame_behavior, "CAN-20");

        assert!(!table.contains_key("NoId"));
    }

    #[test]
    fn test_unusable_identifiers_leave_can_id_empty() {
        let text = wrap(
            "<CAN-FRAME-TRIGGERING><FRAME-REF>/Frames/Huge</FRAME-REF>\
               <IDENTIFIER>99999999999999999999</IDENTIFIER></CAN-FRAME-TRIGGERING>\
             <CAN-FRAME-TRIGGERING><FRAME-REF>/Frames/Negative</FRAME-REF>\
               <IDENTIFIER>-5</IDENTIFIER></CAN-FRAME-TRIGGERING>\
             <CAN-FRAME-TRIGGERING><FRAME-REF>/Frames/Text</FRAME-REF>\
               <IDENTIFIER>abc</IDENTIFIER></CAN-FRAME-TRIGGERING>",
        );
        let doc = ArxmlDocument::parse(&text).unwrap();
        let table = can_frames(doc.root());

        for frame in ["Huge", "Negative", "Text"] {
            let info = table.get(frame).unwrap();
            assert_eq!(info.can_id, None, "{}", frame);
            assert_eq!(info.can_id_hex, None, "{}", frame);
        }
    }

    #[test]
    fn test_pdu_frame_link_uses_substring_match() {
        let text = wrap(
            "<CAN-FRAME-TRIGGERING><SHORT-NAME>FT_A</SHORT-NAME>\
               <FRAME-REF>/Frames/Frame_A</FRAME-REF>\
               <PDU-TRIGGERINGS><PDU-TRIGGERING-REF-CONDITIONAL>\
                 <PDU-TRIGGERING-REF>/Cluster/Channel/PT_Status_Long</PDU-TRIGGERING-REF>\
               </PDU-TRIGGERING-REF-CONDITIONAL></PDU-TRIGGERINGS>\
               <IDENTIFIER>1</IDENTIFIER>\
             </CAN-FRAME-TRIGGERING>\
             <PDU-TRIGGERING><SHORT-NAME>PT_Status</SHORT-NAME>\
               <I-PDU-REF>/Pdus/Status</I-PDU-REF>\
             </PDU-TRIGGERING>\
             <PDU-TRIGGERING><SHORT-NAME>PT_Other</SHORT-NAME>\
               <I-PDU-REF>/Pdus/Other</I-PDU-REF>\
             </PDU-TRIGGERING>",
        );
        let doc = ArxmlDocument::parse(&text).unwrap();
        let table = pdu_frames(doc.root());

        // PT_Status is contained in PT_Status_Long
        assert_eq!(table.get("Status").map(String::as_str), Some("Frame_A"));
        assert!(!table.contains_key("Other"));
    }

    #[test]
    fn test_pdu_direction_through_port_refs() {
        let text = wrap(
            "<I-PDU-PORT><SHORT-NAME>Port_Out</SHORT-NAME><COMMUNICATION-DIRECTION>OUT</COMMUNICATION-DIRECTION></I-PDU-PORT>\
             <I-PDU-PORT><SHORT-NAME>Port_In</SHORT-NAME><COMMUNICATION-DIRECTION>IN</COMMUNICATION-DIRECTION></I-PDU-PORT>\
             <PDU-TRIGGERING><SHORT-NAME>PT_Tx</SHORT-NAME>\
               <I-PDU-PORT-REFS><I-PDU-PORT-REF>/Ecu/Connector/Port_Out</I-PDU-PORT-REF></I-PDU-PORT-REFS>\
               <I-PDU-REF>/Pdus/TxPdu</I-PDU-REF>\
             </PDU-TRIGGERING>\
             <PDU-TRIGGERING><SHORT-NAME>PT_Rx</SHORT-NAME>\
               <I-PDU-PORT-REFS><I-PDU-PORT-REF>/Ecu/Connector/Port_In</I-PDU-PORT-REF></I-PDU-PORT-REFS>\
               <I-PDU-REF>/Pdus/RxPdu</I-PDU-REF>\
             </PDU-TRIGGERING>\
             <PDU-TRIGGERING><SHORT-NAME>PT_Unknown</SHORT-NAME>\
               <I-PDU-PORT-REFS><I-PDU-PORT-REF>/Ecu/Connector/Missing</I-PDU-PORT-REF></I-PDU-PORT-REFS>\
               <I-PDU-REF>/Pdus/Orphan</I-PDU-REF>\
             </PDU-TRIGGERING>",
        );
        let doc = ArxmlDocument::parse(&text).unwrap();
        let table = pdu_directions(doc.root());

        assert_eq!(table.get("TxPdu"), Some(&Direction::Tx));
        assert_eq!(table.get("RxPdu"), Some(&Direction::Rx));
        assert!(!table.contains_key("Orphan"));
    }

    #[test]
    fn test_addressing_format_registers_both_refs() {
        let text = wrap(
            "<CAN-TP-CONNECTION>\
               <ADDRESSING-FORMAT>NORMAL</ADDRESSING-FORMAT>\
               <DATA-PDU-REF>/Pdus/Diag_NPdu</DATA-PDU-REF>\
               <TP-SDU-REF>/Pdus/Diag_Request</TP-SDU-REF>\
             </CAN-TP-CONNECTION>\
             <CAN-TP-CONNECTION>\
               <DATA-PDU-REF>/Pdus/NoFormat</DATA-PDU-REF>\
             </CAN-TP-CONNECTION>",
        );
        let doc = ArxmlDocument::parse(&text).unwrap();
        let table = pdu_addressing_formats(doc.root());

        assert_eq!(table.get("Diag_NPdu").map(String::as_str), Some("NORMAL"));
        assert_eq!(table.get("Diag_Request").map(String::as_str), Some("NORMAL"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_nm_cycle_time_converted_to_ms() {
        let text = wrap(
            "<CAN-NM-CLUSTER><SHORT-NAME>Nm</SHORT-NAME>\
               <NM-MSG-CYCLE-TIME>0.5</NM-MSG-CYCLE-TIME>\
               <NM-NODES><CAN-NM-NODE><SHORT-NAME>Node</SHORT-NAME>\
                 <RX-NM-PDU-REFS><RX-NM-PDU-REF>/Pdus/Nm_Rx</RX-NM-PDU-REF></RX-NM-PDU-REFS>\
                 <TX-NM-PDU-REFS><TX-NM-PDU-REF>/Pdus/Nm_Tx</TX-NM-PDU-REF></TX-NM-PDU-REFS>\
               </CAN-NM-NODE></NM-NODES>\
             </CAN-NM-CLUSTER>\
             <CAN-NM-CLUSTER><SHORT-NAME>Idle</SHORT-NAME>\
               <NM-MSG-CYCLE-TIME>0</NM-MSG-CYCLE-TIME>\
               <NM-NODES><CAN-NM-NODE>\
                 <TX-NM-PDU-REFS><TX-NM-PDU-REF>/Pdus/Nm_Idle</TX-NM-PDU-REF></TX-NM-PDU-REFS>\
               </CAN-NM-NODE></NM-NODES>\
             </CAN-NM-CLUSTER>",
        );
        let doc = ArxmlDocument::parse(&text).unwrap();
        let table = nm_pdu_cycle_times(doc.root());

        assert_eq!(table.get("Nm_Tx"), Some(&500.0));
        assert_eq!(table.get("Nm_Rx"), Some(&500.0));
        assert!(!table.contains_key("Nm_Idle"));
    }

    #[test]
    fn test_signal_timing_from_transmission_attributes() {
        let text = wrap(
            "<I-SIGNAL-TRIGGERING><SHORT-NAME>ST_Speed</SHORT-NAME>\
               <ADMIN-DATA><SDGS>\
                 <SDG GID=\"Other\"><SD GID=\"LaunchType\">Ignored</SD></SDG>\
                 <SDG GID=\"XDISTransmissionAttributes\">\
                   <SD GID=\"LaunchType\">Cyclic</SD><SD GID=\"CycleTime\">20</SD>\
                 </SDG>\
               </SDGS></ADMIN-DATA>\
               <I-SIGNAL-REF>/Signals/Speed</I-SIGNAL-REF>\
             </I-SIGNAL-TRIGGERING>\
             <I-SIGNAL-TRIGGERING><SHORT-NAME>ST_Door</SHORT-NAME>\
               <ADMIN-DATA><SDGS><SDG GID=\"XDISTransmissionAttributes\"/></SDGS></ADMIN-DATA>\
               <I-SIGNAL-REF>/Signals/Door</I-SIGNAL-REF>\
             </I-SIGNAL-TRIGGERING>\
             <I-SIGNAL-TRIGGERING><SHORT-NAME>ST_Bare</SHORT-NAME>\
               <I-SIGNAL-REF>/Signals/Bare</I-SIGNAL-REF>\
             </I-SIGNAL-TRIGGERING>",
        );
        let doc = ArxmlDocument::parse(&text).unwrap();
        let table = signal_timings(doc.root(), "XDISTransmissionAttributes");

        assert_eq!(
            table.get("Speed"),
            Some(&SignalTiming {
                launch_type: "Cyclic".to_string(),
                cycle_time: Some(20.0),
            })
        );
        assert_eq!(
            table.get("Door"),
            Some(&SignalTiming {
                launch_type: "Spontaneous".to_string(),
                cycle_time: None,
            })
        );
        assert!(!table.contains_key("Bare"));
    }

    #[test]
    fn test_build_on_empty_document() {
        let text = wrap("");
        let doc = ArxmlDocument::parse(&text).unwrap();
        let index = ReferenceIndex::build(doc.root(), &ExtractConfig::default());

        assert!(index.scaling("anything").is_none());
        assert!(index.pdu_frame("anything").is_none());
        assert!(index.signal_timing("anything").is_none());
    }
}

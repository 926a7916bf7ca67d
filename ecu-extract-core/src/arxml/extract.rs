//! Entity extraction
//!
//! Materializes the four record collections from the document and a built
//! [`ReferenceIndex`]. Lookups that chain through several optional sources
//! are written as ordered resolver lists: the first resolver returning a
//! value wins, later ones are not consulted.

use crate::arxml::document::MarkupNode;
use crate::arxml::index::ReferenceIndex;
use crate::arxml::values::{last_segment, parse_count, parse_float_prefix};
use crate::config::ExtractConfig;
use crate::model::{
    ByteOrder, MessageGroupRecord, MessageRecord, PduKind, SignalGroupRecord, SignalRecord,
    TransmissionType,
};
use std::collections::HashMap;

/// Inputs visible to a scaling resolver for one I-SIGNAL
pub struct SignalScope<'a, N> {
    pub element: N,
    pub name: &'a str,
    /// Last segment of the signal's SYSTEM-SIGNAL-REF (may be empty)
    pub system_signal: &'a str,
    pub index: &'a ReferenceIndex,
}

/// Finds the COMPU-METHOD name for a signal
pub type ScalingResolver<N> = fn(&SignalScope<'_, N>) -> Option<String>;

/// Inputs visible to a periodicity resolver for one PDU
pub struct PduScope<'a, N> {
    pub element: N,
    pub kind: PduKind,
    pub name: &'a str,
    /// Names of the signals mapped into this PDU
    pub signals: &'a [String],
    pub index: &'a ReferenceIndex,
}

/// A PDU found to be sent periodically
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Periodic {
    /// Milliseconds
    pub cycle_time: Option<f64>,
}

/// Decides whether a PDU is periodic
pub type PeriodicityResolver<N> = fn(&PduScope<'_, N>) -> Option<Periodic>;

fn ref_name(path: Option<String>) -> Option<String> {
    path.map(|path| last_segment(&path).to_string())
        .filter(|name| !name.is_empty())
}

fn compu_method_via_system_signal<N: MarkupNode>(scope: &SignalScope<'_, N>) -> Option<String> {
    if scope.system_signal.is_empty() {
        return None;
    }
    scope
        .index
        .system_signal_scaling(scope.system_signal)
        .map(str::to_string)
}

fn compu_method_direct_ref<N: MarkupNode>(scope: &SignalScope<'_, N>) -> Option<String> {
    ref_name(scope.element.first_child_text("COMPU-METHOD-REF"))
}

fn compu_method_network_representation<N: MarkupNode>(
    scope: &SignalScope<'_, N>,
) -> Option<String> {
    ref_name(scope.element.select_text(&[
        "NETWORK-REPRESENTATION-PROPS",
        "SW-DATA-DEF-PROPS-VARIANTS",
        "SW-DATA-DEF-PROPS-CONDITIONAL",
        "COMPU-METHOD-REF",
    ]))
}

fn compu_method_same_name<N: MarkupNode>(scope: &SignalScope<'_, N>) -> Option<String> {
    scope
        .index
        .has_scaling(scope.name)
        .then(|| scope.name.to_string())
}

/// Scaling resolvers in precedence order
///
/// A resolver that names a method ends the search even if that method has no
/// scaling entry; the signal then falls back to the default bounds.
pub fn scaling_resolvers<N: MarkupNode>() -> [(&'static str, ScalingResolver<N>); 4] {
    [
        ("system signal", compu_method_via_system_signal::<N>),
        ("direct reference", compu_method_direct_ref::<N>),
        ("network representation", compu_method_network_representation::<N>),
        ("signal name", compu_method_same_name::<N>),
    ]
}

fn periodic_from_signal_timing<N: MarkupNode>(scope: &PduScope<'_, N>) -> Option<Periodic> {
    scope
        .signals
        .iter()
        .filter_map(|signal| scope.index.signal_timing(signal))
        .find(|timing| timing.launch_type == "Cyclic")
        .map(|timing| Periodic {
            cycle_time: timing.cycle_time,
        })
}

fn periodic_from_cyclic_timing<N: MarkupNode>(scope: &PduScope<'_, N>) -> Option<Periodic> {
    let value = scope
        .element
        .select_first(&["CYCLIC-TIMING", "REPEATING-TIME", "VALUE"])?;
    let text = value.text_content();
    let seconds = if text.is_empty() {
        Some(0.0)
    } else {
        parse_float_prefix(&text)
    };

    Some(Periodic {
        cycle_time: seconds.map(|seconds| seconds * 1000.0),
    })
}

fn periodic_from_nm_cluster<N: MarkupNode>(scope: &PduScope<'_, N>) -> Option<Periodic> {
    if scope.kind != PduKind::NmPdu {
        return None;
    }
    scope.index.nm_pdu_cycle_time(scope.name).map(|ms| Periodic {
        cycle_time: Some(ms),
    })
}

/// Periodicity resolvers in precedence order
pub fn periodicity_resolvers<N: MarkupNode>() -> [(&'static str, PeriodicityResolver<N>); 3] {
    [
        ("signal launch type", periodic_from_signal_timing::<N>),
        ("cyclic timing", periodic_from_cyclic_timing::<N>),
        ("nm cluster", periodic_from_nm_cluster::<N>),
    ]
}

fn short_name<N: MarkupNode>(node: N) -> String {
    node.first_child_text("SHORT-NAME").unwrap_or_default()
}

fn description<N: MarkupNode>(node: N) -> String {
    node.select_text(&["DESC", "L-2"]).unwrap_or_default()
}

/// Extract every I-SIGNAL in document order
pub fn extract_signals<N: MarkupNode>(root: N, index: &ReferenceIndex) -> Vec<SignalRecord> {
    let resolvers = scaling_resolvers::<N>();

    root.all_descendants("I-SIGNAL")
        .into_iter()
        .map(|element| {
            let name = short_name(element);
            if name.is_empty() {
                log::warn!("I-SIGNAL without SHORT-NAME, keeping it with an empty name");
            }
            let system_signal = element
                .first_child_text("SYSTEM-SIGNAL-REF")
                .map(|path| last_segment(&path).to_string())
                .unwrap_or_default();

            let scope = SignalScope {
                element,
                name: &name,
                system_signal: &system_signal,
                index,
            };
            let compu_method = resolvers.iter().find_map(|(label, resolve)| {
                let found = resolve(&scope);
                if let Some(method) = &found {
                    log::trace!("Signal '{}': COMPU-METHOD '{}' via {}", name, method, label);
                }
                found
            });
            let scaling = compu_method
                .as_deref()
                .and_then(|method| index.scaling(method));

            let placement = index.signal_placement(&name);

            SignalRecord {
                pdu_name: placement.map(|p| p.pdu_name.clone()).unwrap_or_default(),
                start_position: placement.and_then(|p| p.start_position).unwrap_or(0),
                length: parse_count(element.first_child_text("LENGTH").as_deref()),
                byte_order: ByteOrder::from_packing(
                    placement.and_then(|p| p.byte_order.as_deref()),
                ),
                data_type: element
                    .first_child_text("BASE-TYPE-REF")
                    .map(|path| last_segment(&path).to_string())
                    .unwrap_or_default(),
                init_value: element
                    .select_text(&["INIT-VALUE", "VALUE"])
                    .filter(|value| !value.is_empty()),
                description: description(element),
                min_value: scaling
                    .and_then(|s| s.min.clone())
                    .unwrap_or_else(|| "0".to_string()),
                max_value: scaling
                    .and_then(|s| s.max.clone())
                    .unwrap_or_else(|| "0".to_string()),
                factor: scaling.and_then(|s| s.factor.clone()),
                offset: scaling.and_then(|s| s.offset.clone()),
                port_interface: if system_signal.is_empty() {
                    None
                } else {
                    index
                        .system_signal_port_interface(&system_signal)
                        .map(str::to_string)
                },
                name,
            }
        })
        .collect()
}

/// Extract PDUs of every configured kind as messages
///
/// Kinds are visited in `config.pdu_kinds` order, PDUs of one kind in
/// document order.
pub fn extract_messages<N: MarkupNode>(
    root: N,
    index: &ReferenceIndex,
    signals: &[SignalRecord],
    config: &ExtractConfig,
) -> Vec<MessageRecord> {
    let mut members: HashMap<&str, Vec<String>> = HashMap::new();
    for signal in signals {
        members
            .entry(signal.pdu_name.as_str())
            .or_default()
            .push(signal.name.clone());
    }

    let resolvers = periodicity_resolvers::<N>();
    let mut messages = Vec::new();

    for kind in &config.pdu_kinds {
        for element in root.all_descendants(kind.tag()) {
            let name = short_name(element);
            if name.is_empty() {
                log::warn!("{} without SHORT-NAME, keeping it with an empty name", kind);
            }
            let pdu_signals = members.get(name.as_str()).cloned().unwrap_or_default();

            let scope = PduScope {
                element,
                kind: *kind,
                name: &name,
                signals: &pdu_signals,
                index,
            };
            let periodic = resolvers.iter().find_map(|(label, resolve)| {
                let found = resolve(&scope);
                if found.is_some() {
                    log::trace!("PDU '{}': periodic via {}", name, label);
                }
                found
            });

            let frame_name = index.pdu_frame(&name).map(str::to_string);
            let can = frame_name.as_deref().and_then(|frame| index.can_frame(frame));

            messages.push(MessageRecord {
                transmission_type: if periodic.is_some() {
                    TransmissionType::Periodic
                } else {
                    TransmissionType::Spontaneous
                },
                cycle_time: periodic.and_then(|p| p.cycle_time),
                length: parse_count(element.first_child_text("LENGTH").as_deref()),
                description: description(element),
                pdu_type: *kind,
                direction: index.pdu_direction(&name),
                addressing_format: index.pdu_addressing_format(&name).map(str::to_string),
                can_id: can.and_then(|c| c.can_id),
                can_id_hex: can.and_then(|c| c.can_id_hex.clone()),
                can_addressing_mode: can.map(|c| c.addressing_mode.clone()),
                can_frame_behavior: can.map(|c| c.frame_behavior.clone()),
                frame_name,
                signals: pdu_signals,
                name,
            });
        }
    }

    messages
}

/// Extract every I-SIGNAL-GROUP in document order
pub fn extract_signal_groups<N: MarkupNode>(
    root: N,
    index: &ReferenceIndex,
) -> Vec<SignalGroupRecord> {
    root.all_descendants("I-SIGNAL-GROUP")
        .into_iter()
        .map(|group| {
            let signals = group
                .all_descendants("I-SIGNAL-REF")
                .into_iter()
                .filter_map(|signal_ref| ref_name(Some(signal_ref.text_content())))
                .collect();
            let port_interface = ref_name(group.first_child_text("SYSTEM-SIGNAL-GROUP-REF"))
                .and_then(|system_group| index.signal_group_port_interface(&system_group))
                .map(str::to_string);

            SignalGroupRecord {
                name: short_name(group),
                signals,
                description: description(group),
                port_interface,
            }
        })
        .collect()
}

/// Extract every I-SIGNAL-I-PDU-GROUP in document order
///
/// Members are taken from both `I-PDU-REF` and `I-SIGNAL-I-PDU-REF`.
pub fn extract_message_groups<N: MarkupNode>(root: N) -> Vec<MessageGroupRecord> {
    root.all_descendants("I-SIGNAL-I-PDU-GROUP")
        .into_iter()
        .map(|group| {
            let messages = group
                .element_descendants()
                .filter(|node| matches!(node.tag(), "I-PDU-REF" | "I-SIGNAL-I-PDU-REF"))
                .filter_map(|pdu_ref| ref_name(Some(pdu_ref.text_content())))
                .collect();

            MessageGroupRecord {
                name: short_name(group),
                messages,
                description: description(group),
            }
        })
        .collect()
}

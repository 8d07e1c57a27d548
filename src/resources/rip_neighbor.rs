// This file is part of the terraform-provider-junos project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tf_provider::value::{Value, ValueBool, ValueList, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Schema};

use crate::adapter::JunosResource;
use crate::diag;
use crate::junos::secret::{decode_secret, is_secret};
use crate::junos::{
    config_lines, cut_prefix, join_id, parse_number, quote, routing_instance_prefix, split_id,
    trim_quotes, Session, DEFAULT_ROUTING_INSTANCE,
};
use crate::schema::{
    block, block_list, id, optional_bool, optional_number, optional_string, optional_strings,
    required_string, resource_schema, sensitive_string,
};
use crate::utils::{
    conflict, first_block, missing, new_number, new_str, push_str, single_block_mut,
    validate_name, validate_one_of, validate_range, validate_single_block, validate_text,
    value_bool, value_number, value_str, value_strings, NameFormat, WithSchema, WithValidate,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RipNeighborState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub group: ValueString<'a>,
    pub ng: ValueBool,
    pub routing_instance: ValueString<'a>,
    pub any_sender: ValueBool,
    pub authentication_key: ValueString<'a>,
    pub authentication_type: ValueString<'a>,
    pub bfd_liveness_detection: ValueList<Value<BfdLivenessDetection<'a>>>,
    pub check_zero: ValueBool,
    pub no_check_zero: ValueBool,
    pub demand_circuit: ValueBool,
    pub dynamic_peers: ValueBool,
    pub export: ValueList<ValueString<'a>>,
    pub import: ValueList<ValueString<'a>>,
    pub interface_type_p2mp: ValueBool,
    pub max_retrans_time: ValueNumber,
    pub message_size: ValueNumber,
    pub metric_in: ValueNumber,
    pub peer: ValueList<ValueString<'a>>,
    pub receive: ValueString<'a>,
    pub route_timeout: ValueNumber,
    pub send: ValueString<'a>,
    pub update_interval: ValueNumber,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BfdLivenessDetection<'a> {
    pub authentication_algorithm: ValueString<'a>,
    pub authentication_key_chain: ValueString<'a>,
    pub authentication_loose_check: ValueBool,
    pub detection_time_threshold: ValueNumber,
    pub minimum_interval: ValueNumber,
    pub minimum_receive_interval: ValueNumber,
    pub multiplier: ValueNumber,
    pub no_adaptation: ValueBool,
    pub transmit_interval_minimum_interval: ValueNumber,
    pub transmit_interval_threshold: ValueNumber,
    pub version: ValueString<'a>,
}

impl<'a> WithSchema for RipNeighborState<'a> {
    fn schema() -> Schema {
        let bfd = block(
            "Bidirectional Forwarding Detection (BFD) options",
            map! {
                "authentication_algorithm" => optional_string("Authentication algorithm name"),
                "authentication_key_chain" => optional_string("Authentication key chain name"),
                "authentication_loose_check" => optional_bool("Verify authentication only if authentication is negotiated"),
                "detection_time_threshold" => optional_number("High detection-time triggering a trap (milliseconds)"),
                "minimum_interval" => optional_number("Minimum transmit and receive interval (milliseconds)"),
                "minimum_receive_interval" => optional_number("Minimum receive interval (milliseconds)"),
                "multiplier" => optional_number("Detection time multiplier"),
                "no_adaptation" => optional_bool("Disable adaptation"),
                "transmit_interval_minimum_interval" => optional_number("Minimum transmit interval (milliseconds)"),
                "transmit_interval_threshold" => optional_number("High transmit interval triggering a trap (milliseconds)"),
                "version" => optional_string("BFD protocol version number"),
            },
            map! {},
        );
        resource_schema(block(
            "Provides a RIP or RIPng neighbor resource",
            map! {
                "id" => id("<name>_-_<group>_-_<routing_instance>` or `<name>_-_<group>_-_ng_-_<routing_instance>"),
                "name" => required_string("Interface name"),
                "group" => required_string("Name of RIP or RIPng group"),
                "ng" => optional_bool("Protocol `ripng` instead of `rip`"),
                "routing_instance" => optional_string("Routing instance for the group (`default` if not set)"),
                "any_sender" => optional_bool("Disable strict checks on sender address"),
                "authentication_key" => sensitive_string("Authentication key (password)"),
                "authentication_type" => optional_string("Authentication type"),
                "check_zero" => optional_bool("Check reserved fields on incoming RIPv1 packets"),
                "no_check_zero" => optional_bool("Don't check reserved fields on incoming RIPv1 packets"),
                "demand_circuit" => optional_bool("Enable demand circuit"),
                "dynamic_peers" => optional_bool("Learn peers dynamically on a p2mp interface"),
                "export" => optional_strings("Export policy"),
                "import" => optional_strings("Import policy"),
                "interface_type_p2mp" => optional_bool("Point-to-multipoint link"),
                "max_retrans_time" => optional_number("Maximum time to re-transmit a message in demand-circuit"),
                "message_size" => optional_number("Number of route entries per update message"),
                "metric_in" => optional_number("Metric value to add to incoming routes"),
                "peer" => optional_strings("P2MP peer"),
                "receive" => optional_string("Configure RIP receive options"),
                "route_timeout" => optional_number("Delay before routes time out (seconds)"),
                "send" => optional_string("Configure RIP send options"),
                "update_interval" => optional_number("Interval between regular route updates (seconds)"),
            },
            map! {
                "bfd_liveness_detection" => block_list(bfd),
            },
        ))
    }
}

impl<'a> BfdLivenessDetection<'a> {
    fn is_empty(&self) -> bool {
        [
            &self.authentication_algorithm,
            &self.authentication_key_chain,
            &self.version,
        ]
        .iter()
        .all(|value| value_str(value).is_none())
            && !value_bool(&self.authentication_loose_check)
            && !value_bool(&self.no_adaptation)
            && [
                &self.detection_time_threshold,
                &self.minimum_interval,
                &self.minimum_receive_interval,
                &self.multiplier,
                &self.transmit_interval_minimum_interval,
                &self.transmit_interval_threshold,
            ]
            .iter()
            .all(|value| value_number(value).is_none())
    }

    fn set(&self, set_prefix: &str, lines: &mut Vec<String>) {
        let set_prefix = format!("{set_prefix}bfd-liveness-detection ");
        lines.push(set_prefix.trim_end().to_owned());
        for (statement, value) in [
            ("authentication algorithm", &self.authentication_algorithm),
            ("authentication key-chain", &self.authentication_key_chain),
            ("version", &self.version),
        ] {
            if let Some(value) = value_str(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        if value_bool(&self.authentication_loose_check) {
            lines.push(format!("{set_prefix}authentication loose-check"));
        }
        if value_bool(&self.no_adaptation) {
            lines.push(format!("{set_prefix}no-adaptation"));
        }
        for (statement, value) in [
            ("detection-time threshold", &self.detection_time_threshold),
            ("minimum-interval", &self.minimum_interval),
            ("minimum-receive-interval", &self.minimum_receive_interval),
            ("multiplier", &self.multiplier),
            (
                "transmit-interval minimum-interval",
                &self.transmit_interval_minimum_interval,
            ),
            ("transmit-interval threshold", &self.transmit_interval_threshold),
        ] {
            if let Some(value) = value_number(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
    }

    fn read(&mut self, item: &str) -> anyhow::Result<()> {
        let mut item = item;
        if item == "authentication loose-check" {
            self.authentication_loose_check = Value::Value(true);
            return Ok(());
        }
        if item == "no-adaptation" {
            self.no_adaptation = Value::Value(true);
            return Ok(());
        }
        for (statement, value) in [
            ("authentication algorithm ", &mut self.authentication_algorithm),
            ("authentication key-chain ", &mut self.authentication_key_chain),
            ("version ", &mut self.version),
        ] {
            if cut_prefix(&mut item, statement) {
                *value = new_str(item);
                return Ok(());
            }
        }
        for (statement, value) in [
            ("detection-time threshold ", &mut self.detection_time_threshold),
            ("minimum-interval ", &mut self.minimum_interval),
            ("minimum-receive-interval ", &mut self.minimum_receive_interval),
            ("multiplier ", &mut self.multiplier),
            (
                "transmit-interval minimum-interval ",
                &mut self.transmit_interval_minimum_interval,
            ),
            ("transmit-interval threshold ", &mut self.transmit_interval_threshold),
        ] {
            if cut_prefix(&mut item, statement) {
                *value = new_number(parse_number(item)?);
                return Ok(());
            }
        }
        Ok(())
    }
}

impl<'a> WithValidate for BfdLivenessDetection<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if self.is_empty() {
            missing(
                diags,
                attr_path.clone(),
                "bfd_liveness_detection block is empty",
            );
        }
        for (name, value, min, max) in [
            ("detection_time_threshold", &self.detection_time_threshold, 1, 4294967295),
            ("minimum_interval", &self.minimum_interval, 1, 255000),
            ("minimum_receive_interval", &self.minimum_receive_interval, 1, 255000),
            ("multiplier", &self.multiplier, 1, 255),
            (
                "transmit_interval_minimum_interval",
                &self.transmit_interval_minimum_interval,
                1,
                255000,
            ),
            (
                "transmit_interval_threshold",
                &self.transmit_interval_threshold,
                1,
                4294967295,
            ),
        ] {
            validate_range(diags, value, attr_path.clone().attribute(name), min, max);
        }
        validate_one_of(
            diags,
            &self.version,
            attr_path.attribute("version"),
            &["0", "1", "automatic"],
        );
    }
}

/// Attributes only available with `rip`
const RIP_ONLY: &[&str] = &[
    "any_sender",
    "authentication_key",
    "authentication_type",
    "bfd_liveness_detection",
    "check_zero",
    "no_check_zero",
    "demand_circuit",
    "dynamic_peers",
    "interface_type_p2mp",
    "max_retrans_time",
    "message_size",
    "peer",
];

impl<'a> RipNeighborState<'a> {
    fn protocol(&self) -> &'static str {
        if value_bool(&self.ng) {
            "ripng"
        } else {
            "rip"
        }
    }

    fn routing_instance(&self) -> &str {
        value_str(&self.routing_instance).unwrap_or(DEFAULT_ROUTING_INSTANCE)
    }

    /// Whether a `rip` only attribute is set
    fn is_set(&self, attribute: &str) -> bool {
        match attribute {
            "any_sender" => value_bool(&self.any_sender),
            "authentication_key" => value_str(&self.authentication_key).is_some(),
            "authentication_type" => value_str(&self.authentication_type).is_some(),
            "bfd_liveness_detection" => first_block(&self.bfd_liveness_detection).is_some(),
            "check_zero" => value_bool(&self.check_zero),
            "no_check_zero" => value_bool(&self.no_check_zero),
            "demand_circuit" => value_bool(&self.demand_circuit),
            "dynamic_peers" => value_bool(&self.dynamic_peers),
            "interface_type_p2mp" => value_bool(&self.interface_type_p2mp),
            "max_retrans_time" => value_number(&self.max_retrans_time).is_some(),
            "message_size" => value_number(&self.message_size).is_some(),
            "peer" => value_strings(&self.peer).next().is_some(),
            _ => false,
        }
    }
}

impl<'a> WithValidate for RipNeighborState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            250,
            NameFormat::Address,
        );
        validate_name(
            diags,
            &self.group,
            attr_path.clone().attribute("group"),
            48,
            NameFormat::Default,
        );
        validate_name(
            diags,
            &self.routing_instance,
            attr_path.clone().attribute("routing_instance"),
            63,
            NameFormat::Default,
        );

        if value_bool(&self.ng) {
            for attribute in RIP_ONLY {
                if self.is_set(attribute) {
                    conflict(diags, attr_path.clone().attribute(*attribute), attribute, "ng");
                }
            }
            validate_one_of(
                diags,
                &self.receive,
                attr_path.clone().attribute("receive"),
                &["enable", "none"],
            );
            validate_one_of(
                diags,
                &self.send,
                attr_path.clone().attribute("send"),
                &["enable", "none"],
            );
        } else {
            validate_one_of(
                diags,
                &self.receive,
                attr_path.clone().attribute("receive"),
                &["both", "none", "version-1", "version-2"],
            );
            validate_one_of(
                diags,
                &self.send,
                attr_path.clone().attribute("send"),
                &["broadcast", "multicast", "none", "version-1"],
            );
        }
        if value_bool(&self.check_zero) && value_bool(&self.no_check_zero) {
            conflict(
                diags,
                attr_path.clone().attribute("check_zero"),
                "check_zero",
                "no_check_zero",
            );
        }
        for attribute in ["dynamic_peers", "peer"] {
            if self.is_set(attribute) && !value_bool(&self.interface_type_p2mp) {
                missing(
                    diags,
                    attr_path.clone().attribute(attribute),
                    format!("interface_type_p2mp must be set with {attribute}"),
                );
            }
        }
        validate_one_of(
            diags,
            &self.authentication_type,
            attr_path.clone().attribute("authentication_type"),
            &["md5", "none", "simple"],
        );
        validate_text(
            diags,
            &self.authentication_key,
            attr_path.clone().attribute("authentication_key"),
        );
        for (name, value, min, max) in [
            ("max_retrans_time", &self.max_retrans_time, 5, 180),
            ("message_size", &self.message_size, 25, 255),
            ("metric_in", &self.metric_in, 1, 15),
            ("route_timeout", &self.route_timeout, 30, 360),
            ("update_interval", &self.update_interval, 10, 60),
        ] {
            validate_range(diags, value, attr_path.clone().attribute(name), min, max);
        }

        validate_single_block(
            diags,
            &self.bfd_liveness_detection,
            attr_path.clone().attribute("bfd_liveness_detection"),
        );
        self.bfd_liveness_detection
            .validate(diags, attr_path.attribute("bfd_liveness_detection"));
    }
}

/// `protocols rip|ripng group <group> neighbor <name>`, possibly in a routing instance
#[derive(Debug, Default, Clone, Copy)]
pub struct RipNeighbor;

#[async_trait]
impl JunosResource for RipNeighbor {
    const TYPE_NAME: &'static str = "junos_rip_neighbor";
    const KEYS: &'static [&'static str] = &["name", "group", "ng", "routing_instance"];
    const ID_FORMAT: &'static str =
        "<name>_-_<group>_-_<routing_instance> or <name>_-_<group>_-_ng_-_<routing_instance>";

    type State<'a> = RipNeighborState<'a>;

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn id(state: &Self::State<'_>) -> String {
        let name = value_str(&state.name).unwrap_or_default();
        let group = value_str(&state.group).unwrap_or_default();
        if value_bool(&state.ng) {
            join_id(&[name, group, "ng", state.routing_instance()])
        } else {
            join_id(&[name, group, state.routing_instance()])
        }
    }

    fn from_id<'a>(id: &str) -> Option<Self::State<'a>> {
        let (parts, ng) = match split_id(id, 4) {
            Some(parts) if parts[2] == "ng" => (vec![parts[0], parts[1], parts[3]], true),
            Some(_) => return None,
            None => (split_id(id, 3)?, false),
        };
        Some(RipNeighborState {
            name: new_str(parts[0]),
            group: new_str(parts[1]),
            ng: if ng { Value::Value(true) } else { Value::Null },
            routing_instance: if parts[2] == DEFAULT_ROUTING_INSTANCE {
                Value::Null
            } else {
                new_str(parts[2])
            },
            ..Default::default()
        })
    }

    fn describe(state: &Self::State<'_>) -> String {
        format!(
            "{} neighbor {:?} in group {:?} (routing instance {:?})",
            state.protocol(),
            value_str(&state.name).unwrap_or_default(),
            value_str(&state.group).unwrap_or_default(),
            state.routing_instance(),
        )
    }

    fn config_path(state: &Self::State<'_>) -> String {
        format!(
            "{}protocols {} group {} neighbor {}",
            routing_instance_prefix(state.routing_instance()),
            state.protocol(),
            value_str(&state.group).unwrap_or_default(),
            value_str(&state.name).unwrap_or_default(),
        )
    }

    fn set(state: &Self::State<'_>) -> anyhow::Result<Vec<String>> {
        let set_prefix = format!("set {} ", Self::config_path(state));
        let mut lines = vec![set_prefix.trim_end().to_owned()];

        for (statement, value) in [
            ("any-sender", &state.any_sender),
            ("check-zero", &state.check_zero),
            ("no-check-zero", &state.no_check_zero),
            ("demand-circuit", &state.demand_circuit),
            ("dynamic-peers", &state.dynamic_peers),
            ("interface-type p2mp", &state.interface_type_p2mp),
        ] {
            if value_bool(value) {
                lines.push(format!("{set_prefix}{statement}"));
            }
        }
        if let Some(key) = value_str(&state.authentication_key) {
            lines.push(format!("{set_prefix}authentication-key {}", quote(key)));
        }
        for (statement, value) in [
            ("authentication-type", &state.authentication_type),
            ("receive", &state.receive),
            ("send", &state.send),
        ] {
            if let Some(value) = value_str(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        if let Some(bfd) = first_block(&state.bfd_liveness_detection) {
            bfd.set(&set_prefix, &mut lines);
        }
        for (statement, list) in [
            ("export", &state.export),
            ("import", &state.import),
            ("peer", &state.peer),
        ] {
            for value in value_strings(list) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        for (statement, value) in [
            ("max-retrans-time", &state.max_retrans_time),
            ("message-size", &state.message_size),
            ("metric-in", &state.metric_in),
            ("route-timeout", &state.route_timeout),
            ("update-interval", &state.update_interval),
        ] {
            if let Some(value) = value_number(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }

        Ok(lines)
    }

    fn parse<'a>(keys: &Self::State<'a>, output: &str) -> anyhow::Result<Self::State<'a>> {
        let mut state = RipNeighborState {
            name: keys.name.clone(),
            group: keys.group.clone(),
            ng: keys.ng.clone(),
            routing_instance: keys.routing_instance.clone(),
            ..Default::default()
        };

        'lines: for item in config_lines(output) {
            let mut item = item;
            for (statement, value) in [
                ("any-sender", &mut state.any_sender),
                ("check-zero", &mut state.check_zero),
                ("no-check-zero", &mut state.no_check_zero),
                ("demand-circuit", &mut state.demand_circuit),
                ("dynamic-peers", &mut state.dynamic_peers),
                ("interface-type p2mp", &mut state.interface_type_p2mp),
            ] {
                if item == statement {
                    *value = Value::Value(true);
                    continue 'lines;
                }
            }
            if cut_prefix(&mut item, "authentication-key ") {
                let key = trim_quotes(item);
                state.authentication_key = if is_secret(key) {
                    new_str(&decode_secret(key)?)
                } else {
                    new_str(key)
                };
            } else if cut_prefix(&mut item, "authentication-type ") {
                state.authentication_type = new_str(item);
            } else if cut_prefix(&mut item, "receive ") {
                state.receive = new_str(item);
            } else if cut_prefix(&mut item, "send ") {
                state.send = new_str(item);
            } else if cut_prefix(&mut item, "bfd-liveness-detection") {
                let bfd = single_block_mut(&mut state.bfd_liveness_detection);
                if cut_prefix(&mut item, " ") {
                    bfd.read(item)?;
                }
            } else if cut_prefix(&mut item, "export ") {
                push_str(&mut state.export, item);
            } else if cut_prefix(&mut item, "import ") {
                push_str(&mut state.import, item);
            } else if cut_prefix(&mut item, "peer ") {
                push_str(&mut state.peer, item);
            } else if cut_prefix(&mut item, "max-retrans-time ") {
                state.max_retrans_time = new_number(parse_number(item)?);
            } else if cut_prefix(&mut item, "message-size ") {
                state.message_size = new_number(parse_number(item)?);
            } else if cut_prefix(&mut item, "metric-in ") {
                state.metric_in = new_number(parse_number(item)?);
            } else if cut_prefix(&mut item, "route-timeout ") {
                state.route_timeout = new_number(parse_number(item)?);
            } else if cut_prefix(&mut item, "update-interval ") {
                state.update_interval = new_number(parse_number(item)?);
            }
        }

        Ok(state)
    }

    fn del(state: &Self::State<'_>) -> Vec<String> {
        vec![format!("delete {}", Self::config_path(state))]
    }

    async fn pre_check<'a>(
        session: &Session<'_>,
        state: &Self::State<'a>,
        diags: &mut Diagnostics,
    ) -> Option<()> {
        match session.routing_instance_exists(state.routing_instance()).await {
            Ok(true) => Some(()),
            Ok(false) => {
                diags.error(
                    diag::MISSING_CONFIG,
                    format!("routing instance {:?} doesn't exist", state.routing_instance()),
                    AttributePath::new("routing_instance"),
                );
                None
            }
            Err(err) => {
                diags.root_error(diag::PRE_CHECK, err.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, RwLock};

    use tf_provider::Resource;

    use crate::adapter::JunosResourceAdapter;
    use crate::connection::mock::MockConnection;
    use crate::junos::{JunosClient, Settings};

    use super::*;

    fn neighbor(ng: bool) -> RipNeighborState<'static> {
        RipNeighborState {
            name: new_str("ge-0/0/3.0"),
            group: new_str("core"),
            ng: if ng { Value::Value(true) } else { Value::Null },
            routing_instance: new_str("blue"),
            ..Default::default()
        }
    }

    #[test]
    fn ids() {
        assert_eq!(RipNeighbor::id(&neighbor(false)), "ge-0/0/3.0_-_core_-_blue");
        assert_eq!(RipNeighbor::id(&neighbor(true)), "ge-0/0/3.0_-_core_-_ng_-_blue");

        assert_eq!(
            RipNeighbor::from_id("ge-0/0/3.0_-_core_-_ng_-_blue"),
            Some(neighbor(true))
        );
        assert_eq!(
            RipNeighbor::from_id("ge-0/0/3.0_-_core_-_blue"),
            Some(neighbor(false))
        );
        assert_eq!(RipNeighbor::from_id("ge-0/0/3.0_-_core_-_x_-_blue"), None);
        assert_eq!(RipNeighbor::from_id("ge-0/0/3.0"), None);
    }

    #[test]
    fn import_in_default_instance_matches_config() {
        // routing_instance and ng left out of the configuration
        let configured = RipNeighborState {
            name: new_str("ge-0/0/3.0"),
            group: new_str("core"),
            ..Default::default()
        };
        let imported = RipNeighbor::from_id("ge-0/0/3.0_-_core_-_default").unwrap();
        assert_eq!(imported, configured);
        assert_eq!(RipNeighbor::id(&imported), "ge-0/0/3.0_-_core_-_default");

        let parsed = RipNeighbor::parse(&imported, "set metric-in 3\n").unwrap();
        assert_eq!(parsed.routing_instance, Value::Null);
        assert_eq!(parsed.ng, Value::Null);
    }

    #[test]
    fn parse_encrypted_authentication_key() {
        let parsed = RipNeighbor::parse(
            &neighbor(false),
            "set authentication-key \"$9$QabcnA0IEcleW1RrvM8Vb\"\nset authentication-type md5\n",
        )
        .unwrap();
        assert_eq!(parsed.authentication_key, new_str("s3cret"));
        assert_eq!(parsed.authentication_type, new_str("md5"));

        assert!(RipNeighbor::parse(&neighbor(false), "set authentication-key \"$9$LbHX-\"\n").is_err());
    }

    #[test]
    fn config_path_follows_protocol_and_instance() {
        assert_eq!(
            RipNeighbor::config_path(&neighbor(true)),
            "routing-instances blue protocols ripng group core neighbor ge-0/0/3.0"
        );
        let state = RipNeighborState {
            routing_instance: Value::Null,
            ..neighbor(false)
        };
        assert_eq!(
            RipNeighbor::config_path(&state),
            "protocols rip group core neighbor ge-0/0/3.0"
        );
    }

    #[test]
    fn set_then_parse() {
        let state = RipNeighborState {
            authentication_key: new_str("s3cret"),
            authentication_type: new_str("md5"),
            bfd_liveness_detection: Value::Value(vec![Value::Value(BfdLivenessDetection {
                minimum_interval: new_number(300),
                multiplier: new_number(3),
                ..Default::default()
            })]),
            export: Value::Value(vec![new_str("rip-out")]),
            interface_type_p2mp: Value::Value(true),
            peer: Value::Value(vec![new_str("192.0.2.1"), new_str("192.0.2.2")]),
            metric_in: new_number(2),
            ..neighbor(false)
        };
        let lines = RipNeighbor::set(&state).unwrap();
        let prefix = "set routing-instances blue protocols rip group core neighbor ge-0/0/3.0";
        assert!(lines.contains(&format!("{prefix} interface-type p2mp")));
        assert!(lines.contains(&format!("{prefix} authentication-key \"s3cret\"")));
        assert!(lines.contains(&format!("{prefix} bfd-liveness-detection minimum-interval 300")));
        assert!(lines.contains(&format!("{prefix} peer 192.0.2.2")));

        let output: String = lines
            .iter()
            .map(|line| format!("set{}\n", line.strip_prefix(prefix).unwrap()))
            .collect();
        let parsed = RipNeighbor::parse(&neighbor(false), &output).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn ripng_rejects_rip_only_attributes() {
        let state = RipNeighborState {
            any_sender: Value::Value(true),
            demand_circuit: Value::Value(true),
            send: new_str("broadcast"),
            ..neighbor(true)
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        // two conflicts with ng, broadcast not allowed for ripng
        assert_eq!(diags.errors.len(), 3);
    }

    #[test]
    fn peers_need_p2mp() {
        let state = RipNeighborState {
            peer: Value::Value(vec![new_str("192.0.2.1")]),
            check_zero: Value::Value(true),
            no_check_zero: Value::Value(true),
            bfd_liveness_detection: Value::Value(vec![Value::Value(Default::default())]),
            ..neighbor(false)
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 3);
    }

    #[tokio::test]
    async fn pre_check_needs_routing_instance() {
        let client = JunosClient::new(
            Box::new(MockConnection::default()),
            Settings::default(),
        );
        let session = client.start_session().await;
        let mut diags = Diagnostics::default();
        assert!(RipNeighbor::pre_check(&session, &neighbor(false), &mut diags)
            .await
            .is_none());
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].summary, diag::MISSING_CONFIG);
        assert_eq!(diags.errors[0].attribute, AttributePath::new("routing_instance"));

        let state = RipNeighborState {
            routing_instance: new_str(DEFAULT_ROUTING_INSTANCE),
            ..neighbor(false)
        };
        let mut diags = Diagnostics::default();
        assert!(RipNeighbor::pre_check(&session, &state, &mut diags)
            .await
            .is_some());
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn import_rejects_malformed_id() {
        let connect = MockConnection::default();
        let client = JunosClient::new(Box::new(connect), Settings::default());
        let resource =
            JunosResourceAdapter::<RipNeighbor>::new(Arc::new(RwLock::new(Some(Arc::new(client)))));

        let mut diags = Diagnostics::default();
        assert!(resource
            .import(&mut diags, "ge-0/0/3.0_-_core".to_owned())
            .await
            .is_none());
        assert_eq!(diags.errors.len(), 1);
        assert!(diags.errors[0]
            .detail
            .starts_with("can't parse id 'ge-0/0/3.0_-_core' (id must be <name>_-_<group>_-_<routing_instance>"));
    }
}

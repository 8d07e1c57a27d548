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
use crate::junos::{config_lines, cut_prefix, parse_number};
use crate::schema::{
    block, block_list, id, optional_bool, optional_number, optional_string, optional_strings,
    required_string, resource_schema,
};
use crate::utils::{
    block_by_key_mut, conflict, duplicate, first_block, has_items, missing, new_number, new_str, push_str,
    single_block_mut, validate_cidr, validate_ip, validate_name, validate_one_of,
    validate_range, validate_single_block, value_blocks, value_bool, value_number, value_str,
    value_strings, NameFormat, WithSchema, WithValidate,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpsecVpnState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub bind_interface: ValueString<'a>,
    pub copy_outer_dscp: ValueBool,
    pub df_bit: ValueString<'a>,
    pub establish_tunnels: ValueString<'a>,
    pub ike: ValueList<Value<IpsecVpnIke<'a>>>,
    pub multi_sa_forwarding_class: ValueList<ValueString<'a>>,
    pub traffic_selector: ValueList<Value<TrafficSelector<'a>>>,
    pub udp_encapsulate: ValueList<Value<UdpEncapsulate>>,
    pub vpn_monitor: ValueList<Value<VpnMonitor<'a>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpsecVpnIke<'a> {
    pub gateway: ValueString<'a>,
    pub policy: ValueString<'a>,
    pub identity_local: ValueString<'a>,
    pub identity_remote: ValueString<'a>,
    pub identity_service: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSelector<'a> {
    pub name: ValueString<'a>,
    pub local_ip: ValueString<'a>,
    pub remote_ip: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdpEncapsulate {
    pub dest_port: ValueNumber,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpnMonitor<'a> {
    pub destination_ip: ValueString<'a>,
    pub optimized: ValueBool,
    pub source_interface: ValueString<'a>,
    pub source_interface_auto: ValueBool,
}

impl<'a> WithSchema for IpsecVpnState<'a> {
    fn schema() -> Schema {
        resource_schema(block(
            "Provides a security IPsec VPN resource",
            map! {
                "id" => id("<name>"),
                "name" => required_string("The name of IPsec VPN"),
                "bind_interface" => optional_string("Interface to bind the VPN to (st0.x)"),
                "copy_outer_dscp" => optional_bool("Enable copying outer IP header DSCP and ECN to inner IP header"),
                "df_bit" => optional_string("Specifies how to handle the Don't Fragment bit (clear, copy or set)"),
                "establish_tunnels" => optional_string("When the VPN should be established (immediately or on-traffic)"),
                "multi_sa_forwarding_class" => optional_strings("Negotiate multiple SAs with forwarding-classes"),
            },
            map! {
                "ike" => block_list(block(
                    "IKE-keyed IPsec VPN",
                    map! {
                        "gateway" => required_string("The name of IKE gateway"),
                        "policy" => required_string("The name of IPsec policy"),
                        "identity_local" => optional_string("IPv4 or IPv6 prefix of the local proxy identity"),
                        "identity_remote" => optional_string("IPv4 or IPv6 prefix of the remote proxy identity"),
                        "identity_service" => optional_string("Name of the service of the proxy identity"),
                    },
                    map! {},
                )),
                "traffic_selector" => block_list(block(
                    "Traffic selector",
                    map! {
                        "name" => required_string("Name of traffic selector"),
                        "local_ip" => required_string("IPv4 or IPv6 local address prefix"),
                        "remote_ip" => required_string("IPv4 or IPv6 remote address prefix"),
                    },
                    map! {},
                )),
                "udp_encapsulate" => block_list(block(
                    "UDP encapsulation of IPsec data traffic",
                    map! {
                        "dest_port" => optional_number("UDP destination port"),
                    },
                    map! {},
                )),
                "vpn_monitor" => block_list(block(
                    "Monitor VPN liveliness",
                    map! {
                        "destination_ip" => optional_string("IP destination for monitor message"),
                        "optimized" => optional_bool("Optimize for scalability"),
                        "source_interface" => optional_string("Source interface for monitor message"),
                        "source_interface_auto" => optional_bool("Use `bind_interface` as source interface for monitor message"),
                    },
                    map! {},
                )),
            },
        ))
    }
}

impl<'a> IpsecVpnIke<'a> {
    fn has_proxy_identity(&self) -> bool {
        [
            &self.identity_local,
            &self.identity_remote,
            &self.identity_service,
        ]
        .iter()
        .any(|value| value_str(value).is_some())
    }
}

impl<'a> WithValidate for IpsecVpnIke<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        for (name, value) in [
            ("identity_local", &self.identity_local),
            ("identity_remote", &self.identity_remote),
        ] {
            if let Some(value) = value_str(value) {
                validate_cidr(diags, value, attr_path.clone().attribute(name));
            }
        }
    }
}

impl<'a> WithValidate for TrafficSelector<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            31,
            NameFormat::Default,
        );
        if let Some(local_ip) = value_str(&self.local_ip) {
            validate_cidr(diags, local_ip, attr_path.clone().attribute("local_ip"));
        }
        if let Some(remote_ip) = value_str(&self.remote_ip) {
            validate_cidr(diags, remote_ip, attr_path.attribute("remote_ip"));
        }
    }
}

impl WithValidate for UdpEncapsulate {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_range(
            diags,
            &self.dest_port,
            attr_path.attribute("dest_port"),
            1025,
            65536,
        );
    }
}

impl<'a> WithValidate for VpnMonitor<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_ip(
            diags,
            &self.destination_ip,
            attr_path.clone().attribute("destination_ip"),
        );
        if value_str(&self.source_interface).is_some() && value_bool(&self.source_interface_auto)
        {
            conflict(
                diags,
                attr_path.attribute("source_interface"),
                "source_interface",
                "source_interface_auto",
            );
        }
    }
}

impl<'a> WithValidate for IpsecVpnState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            32,
            NameFormat::Default,
        );
        validate_one_of(
            diags,
            &self.df_bit,
            attr_path.clone().attribute("df_bit"),
            &["clear", "copy", "set"],
        );
        validate_one_of(
            diags,
            &self.establish_tunnels,
            attr_path.clone().attribute("establish_tunnels"),
            &["immediately", "on-traffic"],
        );

        if !has_items(&self.ike) {
            missing(diags, attr_path.clone().attribute("ike"), "ike block is required");
        }
        validate_single_block(diags, &self.ike, attr_path.clone().attribute("ike"));
        validate_single_block(
            diags,
            &self.udp_encapsulate,
            attr_path.clone().attribute("udp_encapsulate"),
        );
        validate_single_block(
            diags,
            &self.vpn_monitor,
            attr_path.clone().attribute("vpn_monitor"),
        );
        self.ike.validate(diags, attr_path.clone().attribute("ike"));
        self.udp_encapsulate
            .validate(diags, attr_path.clone().attribute("udp_encapsulate"));
        self.vpn_monitor
            .validate(diags, attr_path.clone().attribute("vpn_monitor"));

        let has_selectors = value_blocks(&self.traffic_selector).next().is_some();
        if has_selectors && first_block(&self.ike).is_some_and(IpsecVpnIke::has_proxy_identity) {
            conflict(
                diags,
                attr_path.clone().attribute("traffic_selector"),
                "traffic_selector",
                "ike identity_*",
            );
        }
        let mut names = Vec::new();
        for (i, selector) in value_blocks(&self.traffic_selector).enumerate() {
            if let Some(name) = value_str(&selector.name) {
                if names.contains(&name) {
                    duplicate(
                        diags,
                        attr_path.clone().attribute("traffic_selector").index(i as i64),
                        "traffic_selector",
                        name,
                    );
                }
                names.push(name);
            }
        }
        self.traffic_selector
            .validate(diags, attr_path.clone().attribute("traffic_selector"));

        if first_block(&self.vpn_monitor)
            .is_some_and(|monitor| value_bool(&monitor.source_interface_auto))
            && value_str(&self.bind_interface).is_none()
        {
            missing(
                diags,
                attr_path.attribute("vpn_monitor"),
                "bind_interface must be set with vpn_monitor source_interface_auto",
            );
        }
    }
}

/// `security ipsec vpn <name>`
#[derive(Debug, Default, Clone, Copy)]
pub struct IpsecVpn;

#[async_trait]
impl JunosResource for IpsecVpn {
    const TYPE_NAME: &'static str = "junos_security_ipsec_vpn";
    const KEYS: &'static [&'static str] = &["name"];
    const ID_FORMAT: &'static str = "<name>";
    const SECURITY: bool = true;

    type State<'a> = IpsecVpnState<'a>;

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn id(state: &Self::State<'_>) -> String {
        value_str(&state.name).unwrap_or_default().to_owned()
    }

    fn from_id<'a>(id: &str) -> Option<Self::State<'a>> {
        (!id.is_empty()).then(|| IpsecVpnState {
            name: new_str(id),
            ..Default::default()
        })
    }

    fn describe(state: &Self::State<'_>) -> String {
        format!(
            "security ipsec vpn {:?}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn config_path(state: &Self::State<'_>) -> String {
        format!(
            "security ipsec vpn {}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn set(state: &Self::State<'_>) -> anyhow::Result<Vec<String>> {
        let set_prefix = format!("set {} ", Self::config_path(state));
        let mut lines = Vec::new();

        for (statement, value) in [
            ("bind-interface", &state.bind_interface),
            ("df-bit", &state.df_bit),
            ("establish-tunnels", &state.establish_tunnels),
        ] {
            if let Some(value) = value_str(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        if value_bool(&state.copy_outer_dscp) {
            lines.push(format!("{set_prefix}copy-outer-dscp"));
        }
        if let Some(ike) = first_block(&state.ike) {
            for (statement, value) in [
                ("ike gateway", &ike.gateway),
                ("ike ipsec-policy", &ike.policy),
                ("ike proxy-identity local", &ike.identity_local),
                ("ike proxy-identity remote", &ike.identity_remote),
                ("ike proxy-identity service", &ike.identity_service),
            ] {
                if let Some(value) = value_str(value) {
                    lines.push(format!("{set_prefix}{statement} {value}"));
                }
            }
        }
        for forwarding_class in value_strings(&state.multi_sa_forwarding_class) {
            lines.push(format!(
                "{set_prefix}multi-sa forwarding-class {forwarding_class}"
            ));
        }
        for selector in value_blocks(&state.traffic_selector) {
            let selector_prefix = format!(
                "{set_prefix}traffic-selector {} ",
                value_str(&selector.name).unwrap_or_default()
            );
            if let Some(local_ip) = value_str(&selector.local_ip) {
                lines.push(format!("{selector_prefix}local-ip {local_ip}"));
            }
            if let Some(remote_ip) = value_str(&selector.remote_ip) {
                lines.push(format!("{selector_prefix}remote-ip {remote_ip}"));
            }
        }
        if let Some(udp) = first_block(&state.udp_encapsulate) {
            match value_number(&udp.dest_port) {
                Some(port) => lines.push(format!("{set_prefix}udp-encapsulate dest-port {port}")),
                None => lines.push(format!("{set_prefix}udp-encapsulate")),
            }
        }
        if let Some(monitor) = first_block(&state.vpn_monitor) {
            lines.push(format!("{set_prefix}vpn-monitor"));
            if let Some(destination) = value_str(&monitor.destination_ip) {
                lines.push(format!("{set_prefix}vpn-monitor destination-ip {destination}"));
            }
            if value_bool(&monitor.optimized) {
                lines.push(format!("{set_prefix}vpn-monitor optimized"));
            }
            let source_interface = if value_bool(&monitor.source_interface_auto) {
                value_str(&state.bind_interface)
            } else {
                value_str(&monitor.source_interface)
            };
            if let Some(source_interface) = source_interface {
                lines.push(format!(
                    "{set_prefix}vpn-monitor source-interface {source_interface}"
                ));
            }
        }

        Ok(lines)
    }

    fn parse<'a>(keys: &Self::State<'a>, output: &str) -> anyhow::Result<Self::State<'a>> {
        let mut state = IpsecVpnState {
            name: keys.name.clone(),
            ..Default::default()
        };

        for item in config_lines(output) {
            let mut item = item;
            if item == "copy-outer-dscp" {
                state.copy_outer_dscp = Value::Value(true);
            } else if cut_prefix(&mut item, "bind-interface ") {
                state.bind_interface = new_str(item);
            } else if cut_prefix(&mut item, "df-bit ") {
                state.df_bit = new_str(item);
            } else if cut_prefix(&mut item, "establish-tunnels ") {
                state.establish_tunnels = new_str(item);
            } else if cut_prefix(&mut item, "ike ") {
                let ike = single_block_mut(&mut state.ike);
                if cut_prefix(&mut item, "gateway ") {
                    ike.gateway = new_str(item);
                } else if cut_prefix(&mut item, "ipsec-policy ") {
                    ike.policy = new_str(item);
                } else if cut_prefix(&mut item, "proxy-identity local ") {
                    ike.identity_local = new_str(item);
                } else if cut_prefix(&mut item, "proxy-identity remote ") {
                    ike.identity_remote = new_str(item);
                } else if cut_prefix(&mut item, "proxy-identity service ") {
                    ike.identity_service = new_str(item);
                }
            } else if cut_prefix(&mut item, "multi-sa forwarding-class ") {
                push_str(&mut state.multi_sa_forwarding_class, item);
            } else if cut_prefix(&mut item, "traffic-selector ") {
                let (name, rest) = item.split_once(' ').unwrap_or((item, ""));
                let selector = block_by_key_mut(
                    &mut state.traffic_selector,
                    |selector| value_str(&selector.name) == Some(name),
                    || TrafficSelector {
                        name: new_str(name),
                        ..Default::default()
                    },
                );
                let mut rest = rest;
                if cut_prefix(&mut rest, "local-ip ") {
                    selector.local_ip = new_str(rest);
                } else if cut_prefix(&mut rest, "remote-ip ") {
                    selector.remote_ip = new_str(rest);
                }
            } else if cut_prefix(&mut item, "udp-encapsulate") {
                let udp = single_block_mut(&mut state.udp_encapsulate);
                if cut_prefix(&mut item, " dest-port ") {
                    udp.dest_port = new_number(parse_number(item)?);
                }
            } else if cut_prefix(&mut item, "vpn-monitor") {
                let monitor = single_block_mut(&mut state.vpn_monitor);
                if cut_prefix(&mut item, " destination-ip ") {
                    monitor.destination_ip = new_str(item);
                } else if item == " optimized" {
                    monitor.optimized = Value::Value(true);
                } else if cut_prefix(&mut item, " source-interface ") {
                    monitor.source_interface = new_str(item);
                }
            }
        }

        // a monitor source matching the bound interface was configured from it
        let bind_interface = state.bind_interface.clone();
        if let Value::Value(monitors) = &mut state.vpn_monitor {
            for monitor in monitors.iter_mut() {
                if let Value::Value(monitor) = monitor {
                    if value_str(&bind_interface).is_some()
                        && value_str(&monitor.source_interface) == value_str(&bind_interface)
                    {
                        monitor.source_interface = Value::Null;
                        monitor.source_interface_auto = Value::Value(true);
                    }
                }
            }
        }

        Ok(state)
    }

    fn del(state: &Self::State<'_>) -> Vec<String> {
        vec![format!("delete {}", Self::config_path(state))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = "\
set bind-interface st0.1
set df-bit clear
set ike gateway gw-paris
set ike ipsec-policy policy-1
set traffic-selector ts-1 local-ip 192.0.2.0/24
set traffic-selector ts-1 remote-ip 198.51.100.0/24
set vpn-monitor
set vpn-monitor optimized
set vpn-monitor source-interface st0.1
set establish-tunnels immediately
";

    fn sample() -> IpsecVpnState<'static> {
        IpsecVpnState {
            name: new_str("vpn-paris"),
            bind_interface: new_str("st0.1"),
            df_bit: new_str("clear"),
            establish_tunnels: new_str("immediately"),
            ike: Value::Value(vec![Value::Value(IpsecVpnIke {
                gateway: new_str("gw-paris"),
                policy: new_str("policy-1"),
                ..Default::default()
            })]),
            traffic_selector: Value::Value(vec![Value::Value(TrafficSelector {
                name: new_str("ts-1"),
                local_ip: new_str("192.0.2.0/24"),
                remote_ip: new_str("198.51.100.0/24"),
            })]),
            vpn_monitor: Value::Value(vec![Value::Value(VpnMonitor {
                optimized: Value::Value(true),
                source_interface_auto: Value::Value(true),
                ..Default::default()
            })]),
            ..Default::default()
        }
    }

    #[test]
    fn parse_config() {
        let keys = IpsecVpn::from_id("vpn-paris").unwrap();
        assert_eq!(IpsecVpn::parse(&keys, SAMPLE_CONFIG).unwrap(), sample());
    }

    #[test]
    fn set_lines() {
        let lines = IpsecVpn::set(&sample()).unwrap();
        let prefix = "set security ipsec vpn vpn-paris ";
        for line in [
            "ike gateway gw-paris",
            "traffic-selector ts-1 remote-ip 198.51.100.0/24",
            "vpn-monitor source-interface st0.1",
        ] {
            assert!(lines.contains(&format!("{prefix}{line}")), "{line}");
        }
    }

    #[test]
    fn udp_encapsulate_without_port() {
        let keys = IpsecVpn::from_id("v").unwrap();
        let state = IpsecVpn::parse(&keys, "set udp-encapsulate\n").unwrap();
        assert_eq!(
            state.udp_encapsulate,
            Value::Value(vec![Value::Value(UdpEncapsulate::default())])
        );
        assert_eq!(
            IpsecVpn::set(&state).unwrap(),
            vec!["set security ipsec vpn v udp-encapsulate"]
        );
    }

    #[test]
    fn validation() {
        let mut diags = Diagnostics::default();
        sample().validate(&mut diags, AttributePath::default());
        assert!(diags.errors.is_empty(), "{:?}", diags.errors);

        let state = IpsecVpnState {
            name: new_str("vpn"),
            ike: Value::Value(vec![Value::Value(IpsecVpnIke {
                gateway: new_str("gw"),
                policy: new_str("p"),
                identity_local: new_str("10.0.0.0/8"),
                ..Default::default()
            })]),
            traffic_selector: Value::Value(vec![
                Value::Value(TrafficSelector {
                    name: new_str("ts"),
                    local_ip: new_str("10.0.0.0/8"),
                    remote_ip: new_str("10.1.0.0/16"),
                }),
                Value::Value(TrafficSelector {
                    name: new_str("ts"),
                    local_ip: new_str("10.0.0.0/8"),
                    remote_ip: new_str("10.2.0.0/16"),
                }),
            ]),
            vpn_monitor: Value::Value(vec![Value::Value(VpnMonitor {
                source_interface: new_str("st0.0"),
                source_interface_auto: Value::Value(true),
                ..Default::default()
            })]),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        // proxy identity conflict, duplicate selector, source interface
        // conflict, auto source without bind_interface
        assert_eq!(diags.errors.len(), 4);

        let mut diags = Diagnostics::default();
        IpsecVpnState {
            name: new_str("vpn"),
            ..Default::default()
        }
        .validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 1);
    }
}

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
    block, block_list, id, optional_bool, optional_number, optional_string, optional_string_set,
    required_string, resource_schema,
};
use crate::utils::{
    conflict, first_block, new_number, new_str, push_str, single_block_mut, validate_ip,
    validate_name, validate_one_of, validate_range, validate_single_block, value_bool,
    value_number, value_str, value_strings, NameFormat, WithSchema, WithValidate,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogStreamState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub category: ValueList<ValueString<'a>>,
    pub file: ValueList<Value<LogStreamFile<'a>>>,
    pub filter_threat_attack: ValueBool,
    pub format: ValueString<'a>,
    pub host: ValueList<Value<LogStreamHost<'a>>>,
    pub rate_limit: ValueNumber,
    pub severity: ValueString<'a>,
    pub source_address: ValueString<'a>,
    pub transport: ValueList<Value<LogStreamTransport<'a>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogStreamFile<'a> {
    pub name: ValueString<'a>,
    pub allow_duplicates: ValueBool,
    pub rotation: ValueNumber,
    pub size: ValueNumber,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogStreamHost<'a> {
    pub ip_address: ValueString<'a>,
    pub port: ValueNumber,
    pub routing_instance: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogStreamTransport<'a> {
    pub protocol: ValueString<'a>,
    pub tcp_connections: ValueNumber,
    pub tls_profile: ValueString<'a>,
}

impl<'a> WithSchema for LogStreamState<'a> {
    fn schema() -> Schema {
        resource_schema(block(
            "Provides a security log stream resource",
            map! {
                "id" => id("<name>"),
                "name" => required_string("Name of security log stream"),
                "category" => optional_string_set("Selects the type of events that may be logged"),
                "filter_threat_attack" => optional_bool("Threat-attack security events are logged"),
                "format" => optional_string("Specify the log stream format"),
                "rate_limit" => optional_number("Rate-limit for security logs"),
                "severity" => optional_string("Severity threshold for security logs"),
                "source_address" => optional_string("Source ip address used when exporting security logs"),
            },
            map! {
                "file" => block_list(block(
                    "Security log file options for logs in local mode",
                    map! {
                        "name" => required_string("Name of local log file"),
                        "allow_duplicates" => optional_bool("To disable log consolidation"),
                        "rotation" => optional_number("Maximum number of rotate files"),
                        "size" => optional_number("Maximum size of local log file in megabytes"),
                    },
                    map! {},
                )),
                "host" => block_list(block(
                    "Destination to send security logs to",
                    map! {
                        "ip_address" => required_string("IP address or hostname"),
                        "port" => optional_number("Host port number"),
                        "routing_instance" => optional_string("Routing instance name"),
                    },
                    map! {},
                )),
                "transport" => block_list(block(
                    "Set security log transport settings",
                    map! {
                        "protocol" => optional_string("Set security log transport protocol for the device"),
                        "tcp_connections" => optional_number("Set tcp connection number per-stream"),
                        "tls_profile" => optional_string("TLS profile"),
                    },
                    map! {},
                )),
            },
        ))
    }
}

impl<'a> WithValidate for LogStreamFile<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            255,
            NameFormat::Address,
        );
        validate_range(
            diags,
            &self.rotation,
            attr_path.clone().attribute("rotation"),
            2,
            19,
        );
        validate_range(diags, &self.size, attr_path.attribute("size"), 1, 3);
    }
}

impl<'a> WithValidate for LogStreamHost<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_range(
            diags,
            &self.port,
            attr_path.clone().attribute("port"),
            0,
            65535,
        );
        validate_name(
            diags,
            &self.routing_instance,
            attr_path.attribute("routing_instance"),
            63,
            NameFormat::Default,
        );
    }
}

impl<'a> WithValidate for LogStreamTransport<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_one_of(
            diags,
            &self.protocol,
            attr_path.clone().attribute("protocol"),
            &["tcp", "tls", "udp"],
        );
        validate_range(
            diags,
            &self.tcp_connections,
            attr_path.attribute("tcp_connections"),
            1,
            5,
        );
    }
}

impl<'a> WithValidate for LogStreamState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            63,
            NameFormat::Default,
        );
        validate_one_of(
            diags,
            &self.format,
            attr_path.clone().attribute("format"),
            &["binary", "sd-syslog", "syslog", "welf"],
        );
        validate_one_of(
            diags,
            &self.severity,
            attr_path.clone().attribute("severity"),
            &[
                "alert",
                "critical",
                "debug",
                "emergency",
                "error",
                "info",
                "notice",
                "warning",
            ],
        );
        validate_ip(
            diags,
            &self.source_address,
            attr_path.clone().attribute("source_address"),
        );
        validate_range(
            diags,
            &self.rate_limit,
            attr_path.clone().attribute("rate_limit"),
            0,
            65535,
        );

        if first_block(&self.file).is_some() && first_block(&self.host).is_some() {
            conflict(diags, attr_path.clone().attribute("file"), "file", "host");
        }
        validate_single_block(diags, &self.file, attr_path.clone().attribute("file"));
        validate_single_block(diags, &self.host, attr_path.clone().attribute("host"));
        validate_single_block(
            diags,
            &self.transport,
            attr_path.clone().attribute("transport"),
        );
        self.file.validate(diags, attr_path.clone().attribute("file"));
        self.host.validate(diags, attr_path.clone().attribute("host"));
        self.transport
            .validate(diags, attr_path.attribute("transport"));
    }
}

/// `security log stream <name>`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStream;

#[async_trait]
impl JunosResource for LogStream {
    const TYPE_NAME: &'static str = "junos_security_log_stream";
    const KEYS: &'static [&'static str] = &["name"];
    const ID_FORMAT: &'static str = "<name>";
    const SECURITY: bool = true;

    type State<'a> = LogStreamState<'a>;

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn id(state: &Self::State<'_>) -> String {
        value_str(&state.name).unwrap_or_default().to_owned()
    }

    fn from_id<'a>(id: &str) -> Option<Self::State<'a>> {
        (!id.is_empty()).then(|| LogStreamState {
            name: new_str(id),
            ..Default::default()
        })
    }

    fn describe(state: &Self::State<'_>) -> String {
        format!(
            "security log stream {:?}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn config_path(state: &Self::State<'_>) -> String {
        format!(
            "security log stream {}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn set(state: &Self::State<'_>) -> anyhow::Result<Vec<String>> {
        let set_prefix = format!("set {} ", Self::config_path(state));
        let mut lines = vec![set_prefix.trim_end().to_owned()];

        for category in value_strings(&state.category) {
            lines.push(format!("{set_prefix}category {category}"));
        }
        if value_bool(&state.filter_threat_attack) {
            lines.push(format!("{set_prefix}filter threat-attack"));
        }
        for (statement, value) in [
            ("format", &state.format),
            ("severity", &state.severity),
            ("source-address", &state.source_address),
        ] {
            if let Some(value) = value_str(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        if let Some(rate_limit) = value_number(&state.rate_limit) {
            lines.push(format!("{set_prefix}rate-limit {rate_limit}"));
        }
        if let Some(file) = first_block(&state.file) {
            let file_prefix = format!("{set_prefix}file ");
            if let Some(name) = value_str(&file.name) {
                lines.push(format!("{file_prefix}name {name}"));
            }
            if value_bool(&file.allow_duplicates) {
                lines.push(format!("{file_prefix}allow-duplicates"));
            }
            for (statement, value) in [("rotation", &file.rotation), ("size", &file.size)] {
                if let Some(value) = value_number(value) {
                    lines.push(format!("{file_prefix}{statement} {value}"));
                }
            }
        }
        if let Some(host) = first_block(&state.host) {
            let host_prefix = format!("{set_prefix}host ");
            if let Some(ip_address) = value_str(&host.ip_address) {
                lines.push(format!("{host_prefix}{ip_address}"));
            }
            if let Some(port) = value_number(&host.port) {
                lines.push(format!("{host_prefix}port {port}"));
            }
            if let Some(routing_instance) = value_str(&host.routing_instance) {
                lines.push(format!("{host_prefix}routing-instance {routing_instance}"));
            }
        }
        if let Some(transport) = first_block(&state.transport) {
            let transport_prefix = format!("{set_prefix}transport");
            lines.push(transport_prefix.clone());
            if let Some(protocol) = value_str(&transport.protocol) {
                lines.push(format!("{transport_prefix} protocol {protocol}"));
            }
            if let Some(tcp_connections) = value_number(&transport.tcp_connections) {
                lines.push(format!("{transport_prefix} tcp-connections {tcp_connections}"));
            }
            if let Some(tls_profile) = value_str(&transport.tls_profile) {
                lines.push(format!("{transport_prefix} tls-profile {tls_profile}"));
            }
        }

        Ok(lines)
    }

    fn parse<'a>(keys: &Self::State<'a>, output: &str) -> anyhow::Result<Self::State<'a>> {
        let mut state = LogStreamState {
            name: keys.name.clone(),
            ..Default::default()
        };

        for item in config_lines(output) {
            let mut item = item;
            if item == "filter threat-attack" {
                state.filter_threat_attack = Value::Value(true);
            } else if cut_prefix(&mut item, "category ") {
                push_str(&mut state.category, item);
            } else if cut_prefix(&mut item, "format ") {
                state.format = new_str(item);
            } else if cut_prefix(&mut item, "severity ") {
                state.severity = new_str(item);
            } else if cut_prefix(&mut item, "source-address ") {
                state.source_address = new_str(item);
            } else if cut_prefix(&mut item, "rate-limit ") {
                state.rate_limit = new_number(parse_number(item)?);
            } else if cut_prefix(&mut item, "file ") {
                let file = single_block_mut(&mut state.file);
                if item == "allow-duplicates" {
                    file.allow_duplicates = Value::Value(true);
                } else if cut_prefix(&mut item, "name ") {
                    file.name = new_str(item);
                } else if cut_prefix(&mut item, "rotation ") {
                    file.rotation = new_number(parse_number(item)?);
                } else if cut_prefix(&mut item, "size ") {
                    file.size = new_number(parse_number(item)?);
                }
            } else if cut_prefix(&mut item, "host ") {
                let host = single_block_mut(&mut state.host);
                if cut_prefix(&mut item, "port ") {
                    host.port = new_number(parse_number(item)?);
                } else if cut_prefix(&mut item, "routing-instance ") {
                    host.routing_instance = new_str(item);
                } else {
                    host.ip_address = new_str(item);
                }
            } else if cut_prefix(&mut item, "transport") {
                let transport = single_block_mut(&mut state.transport);
                if cut_prefix(&mut item, " protocol ") {
                    transport.protocol = new_str(item);
                } else if cut_prefix(&mut item, " tcp-connections ") {
                    transport.tcp_connections = new_number(parse_number(item)?);
                } else if cut_prefix(&mut item, " tls-profile ") {
                    transport.tls_profile = new_str(item);
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
    use std::sync::{Arc, RwLock};

    use tf_provider::Resource;

    use crate::adapter::JunosResourceAdapter;
    use crate::connection::mock::MockConnection;
    use crate::diag;
    use crate::junos::{JunosClient, Settings};

    use super::*;

    fn sample() -> LogStreamState<'static> {
        LogStreamState {
            name: new_str("to-siem"),
            category: Value::Value(vec![new_str("idp"), new_str("screen")]),
            format: new_str("sd-syslog"),
            severity: new_str("warning"),
            host: Value::Value(vec![Value::Value(LogStreamHost {
                ip_address: new_str("192.0.2.10"),
                port: new_number(514),
                routing_instance: new_str("mgmt"),
            })]),
            transport: Value::Value(vec![Value::Value(LogStreamTransport {
                protocol: new_str("tcp"),
                tcp_connections: new_number(2),
                ..Default::default()
            })]),
            ..Default::default()
        }
    }

    #[test]
    fn set_lines() {
        let lines = LogStream::set(&sample()).unwrap();
        assert_eq!(
            lines,
            vec![
                "set security log stream to-siem",
                "set security log stream to-siem category idp",
                "set security log stream to-siem category screen",
                "set security log stream to-siem format sd-syslog",
                "set security log stream to-siem severity warning",
                "set security log stream to-siem host 192.0.2.10",
                "set security log stream to-siem host port 514",
                "set security log stream to-siem host routing-instance mgmt",
                "set security log stream to-siem transport",
                "set security log stream to-siem transport protocol tcp",
                "set security log stream to-siem transport tcp-connections 2",
            ]
        );
    }

    #[test]
    fn parse_config() {
        let output = "\
set category idp
set category screen
set format sd-syslog
set severity warning
set host 192.0.2.10
set host port 514
set host routing-instance mgmt
set transport protocol tcp
set transport tcp-connections 2
";
        let keys = LogStream::from_id("to-siem").unwrap();
        assert_eq!(LogStream::parse(&keys, output).unwrap(), sample());
    }

    #[test]
    fn file_conflicts_with_host() {
        let state = LogStreamState {
            file: Value::Value(vec![Value::Value(LogStreamFile {
                name: new_str("security.log"),
                size: new_number(10),
                ..Default::default()
            })]),
            ..sample()
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        // conflict and size out of range
        assert_eq!(diags.errors.len(), 2);
    }

    fn adapter(connect: MockConnection) -> JunosResourceAdapter<LogStream> {
        let client = JunosClient::new(Box::new(connect), Settings::default());
        JunosResourceAdapter::new(Arc::new(RwLock::new(Some(Arc::new(client)))))
    }

    #[tokio::test]
    async fn create_needs_security_device() {
        let connect = MockConnection::default().with_command("show version", "Model: mx204\n");
        let scripts = Arc::clone(&connect.scripts);
        let resource = adapter(connect);

        let mut diags = Diagnostics::default();
        let res = resource
            .create(&mut diags, sample(), sample(), Default::default(), Default::default())
            .await;
        assert!(res.is_none());
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].summary, diag::COMPATIBILITY);
        assert_eq!(
            diags.errors[0].detail,
            "junos_security_log_stream not compatible with Junos device"
        );
        assert!(scripts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_on_security_device() {
        let show = "show configuration security log stream to-siem | display set relative";
        let connect = MockConnection::default()
            .with_command("show version", "Hostname: fw1\nModel: srx345\n")
            .with_committed(show, "set format sd-syslog\n");
        let scripts = Arc::clone(&connect.scripts);
        let resource = adapter(connect);

        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .create(&mut diags, sample(), sample(), Default::default(), Default::default())
            .await
            .unwrap();
        assert!(diags.errors.is_empty());
        assert_eq!(state.id, new_str("to-siem"));
        assert_eq!(scripts.lock().unwrap().len(), 1);
    }
}

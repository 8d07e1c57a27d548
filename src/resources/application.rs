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
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use tf_provider::value::{Value, ValueBool, ValueList, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Schema};

use crate::adapter::JunosResource;
use crate::junos::{config_lines, cut_prefix, parse_number, quote, trim_quotes};
use crate::schema::{
    block, block_list, id, optional_bool, optional_number, optional_string, required_string,
    resource_schema,
};
use crate::utils::{
    block_by_key_mut, conflict, duplicate, new_number, new_str, validate_name, validate_range,
    validate_regex, validate_text, value_blocks, value_bool, value_number, value_str, NameFormat,
    WithSchema, WithValidate,
};

lazy_static! {
    static ref ETHER_TYPE: Regex = Regex::new(r"^0[xX][0-9a-fA-F]{4}$").unwrap();
    static ref RPC_PROGRAM_NUMBER: Regex = Regex::new(r"^\d+(-\d+)?$").unwrap();
    static ref UUID: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    )
    .unwrap();
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub application_protocol: ValueString<'a>,
    pub description: ValueString<'a>,
    pub destination_port: ValueString<'a>,
    pub ether_type: ValueString<'a>,
    pub inactivity_timeout: ValueNumber,
    pub inactivity_timeout_never: ValueBool,
    pub protocol: ValueString<'a>,
    pub rpc_program_number: ValueString<'a>,
    pub source_port: ValueString<'a>,
    pub uuid: ValueString<'a>,
    pub term: ValueList<Value<ApplicationTerm<'a>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationTerm<'a> {
    pub name: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub alg: ValueString<'a>,
    pub destination_port: ValueString<'a>,
    pub icmp_code: ValueString<'a>,
    pub icmp_type: ValueString<'a>,
    pub icmp6_code: ValueString<'a>,
    pub icmp6_type: ValueString<'a>,
    pub inactivity_timeout: ValueNumber,
    pub inactivity_timeout_never: ValueBool,
    pub rpc_program_number: ValueString<'a>,
    pub source_port: ValueString<'a>,
    pub uuid: ValueString<'a>,
}

impl<'a> WithSchema for ApplicationState<'a> {
    fn schema() -> Schema {
        let term = block(
            "For each term of the application",
            map! {
                "name" => required_string("Term name"),
                "protocol" => required_string("Match IP protocol type"),
                "alg" => optional_string("Application Layer Gateway"),
                "destination_port" => optional_string("Port(s) destination used by application"),
                "icmp_code" => optional_string("Match ICMP message code"),
                "icmp_type" => optional_string("Match ICMP message type"),
                "icmp6_code" => optional_string("Match ICMP6 message code"),
                "icmp6_type" => optional_string("Match ICMP6 message type"),
                "inactivity_timeout" => optional_number("Application-specific inactivity timeout"),
                "inactivity_timeout_never" => optional_bool("Disables inactivity timeout"),
                "rpc_program_number" => optional_string("Match range of RPC program numbers"),
                "source_port" => optional_string("Port(s) source used by application"),
                "uuid" => optional_string("Match universal unique identifier for DCE RPC objects"),
            },
            map! {},
        );

        resource_schema(block(
            "Provides an application resource",
            map! {
                "id" => id("<name>"),
                "name" => required_string("The name of application"),
                "application_protocol" => optional_string("Application protocol type"),
                "description" => optional_string("Text description of application"),
                "destination_port" => optional_string("Port(s) destination used by application"),
                "ether_type" => optional_string("Match ether type"),
                "inactivity_timeout" => optional_number("Application-specific inactivity timeout"),
                "inactivity_timeout_never" => optional_bool("Disables inactivity timeout"),
                "protocol" => optional_string("Protocol used by application"),
                "rpc_program_number" => optional_string("Match range of RPC program numbers"),
                "source_port" => optional_string("Port(s) source used by application"),
                "uuid" => optional_string("Match universal unique identifier for DCE RPC objects"),
            },
            map! {
                "term" => block_list(term),
            },
        ))
    }
}

fn validate_timeout(
    diags: &mut Diagnostics,
    attr_path: &AttributePath,
    timeout: &ValueNumber,
    never: &ValueBool,
) {
    validate_range(
        diags,
        timeout,
        attr_path.clone().attribute("inactivity_timeout"),
        0,
        4294967295,
    );
    if value_number(timeout).is_some() && value_bool(never) {
        conflict(
            diags,
            attr_path.clone().attribute("inactivity_timeout"),
            "inactivity_timeout",
            "inactivity_timeout_never",
        );
    }
}

impl<'a> WithValidate for ApplicationState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            63,
            NameFormat::Default,
        );
        validate_regex(
            diags,
            &self.ether_type,
            attr_path.clone().attribute("ether_type"),
            &ETHER_TYPE,
            "an hexadecimal ether type like 0x0800",
        );
        validate_regex(
            diags,
            &self.rpc_program_number,
            attr_path.clone().attribute("rpc_program_number"),
            &RPC_PROGRAM_NUMBER,
            "a number or a range of numbers",
        );
        validate_regex(
            diags,
            &self.uuid,
            attr_path.clone().attribute("uuid"),
            &UUID,
            "an uuid",
        );
        validate_text(
            diags,
            &self.description,
            attr_path.clone().attribute("description"),
        );
        validate_timeout(
            diags,
            &attr_path,
            &self.inactivity_timeout,
            &self.inactivity_timeout_never,
        );

        let mut terms = value_blocks(&self.term).peekable();
        if terms.peek().is_some() {
            let direct = [
                ("application_protocol", value_str(&self.application_protocol).is_some()),
                ("destination_port", value_str(&self.destination_port).is_some()),
                ("ether_type", value_str(&self.ether_type).is_some()),
                ("inactivity_timeout", value_number(&self.inactivity_timeout).is_some()),
                ("inactivity_timeout_never", value_bool(&self.inactivity_timeout_never)),
                ("protocol", value_str(&self.protocol).is_some()),
                ("rpc_program_number", value_str(&self.rpc_program_number).is_some()),
                ("source_port", value_str(&self.source_port).is_some()),
                ("uuid", value_str(&self.uuid).is_some()),
            ];
            for (attribute, _) in direct.iter().filter(|(_, set)| *set) {
                conflict(
                    diags,
                    attr_path.clone().attribute(*attribute),
                    attribute,
                    "term",
                );
            }
        }

        let mut names = Vec::new();
        for (i, term) in terms.enumerate() {
            if let Some(name) = value_str(&term.name) {
                if names.contains(&name) {
                    duplicate(
                        diags,
                        attr_path.clone().attribute("term").index(i as i64),
                        "term",
                        name,
                    );
                }
                names.push(name);
            }
        }
        self.term.validate(diags, attr_path.attribute("term"));
    }
}

impl<'a> WithValidate for ApplicationTerm<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            63,
            NameFormat::Default,
        );
        validate_regex(
            diags,
            &self.rpc_program_number,
            attr_path.clone().attribute("rpc_program_number"),
            &RPC_PROGRAM_NUMBER,
            "a number or a range of numbers",
        );
        validate_regex(
            diags,
            &self.uuid,
            attr_path.clone().attribute("uuid"),
            &UUID,
            "an uuid",
        );
        validate_timeout(
            diags,
            &attr_path,
            &self.inactivity_timeout,
            &self.inactivity_timeout_never,
        );
    }
}

impl<'a> ApplicationTerm<'a> {
    fn set(&self, set_prefix: &str, lines: &mut Vec<String>) {
        let set_prefix = format!(
            "{set_prefix}term {} ",
            value_str(&self.name).unwrap_or_default()
        );
        lines.push(format!(
            "{set_prefix}protocol {}",
            value_str(&self.protocol).unwrap_or_default()
        ));
        for (statement, value) in [
            ("alg", &self.alg),
            ("destination-port", &self.destination_port),
            ("icmp-code", &self.icmp_code),
            ("icmp-type", &self.icmp_type),
            ("icmp6-code", &self.icmp6_code),
            ("icmp6-type", &self.icmp6_type),
            ("rpc-program-number", &self.rpc_program_number),
            ("source-port", &self.source_port),
            ("uuid", &self.uuid),
        ] {
            if let Some(value) = value_str(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        if value_bool(&self.inactivity_timeout_never) {
            lines.push(format!("{set_prefix}inactivity-timeout never"));
        } else if let Some(timeout) = value_number(&self.inactivity_timeout) {
            lines.push(format!("{set_prefix}inactivity-timeout {timeout}"));
        }
    }

    fn read(&mut self, item: &str) -> anyhow::Result<()> {
        let mut item = item;
        if cut_prefix(&mut item, "protocol ") {
            self.protocol = new_str(item);
        } else if cut_prefix(&mut item, "alg ") {
            self.alg = new_str(item);
        } else if cut_prefix(&mut item, "destination-port ") {
            self.destination_port = new_str(item);
        } else if cut_prefix(&mut item, "icmp-code ") {
            self.icmp_code = new_str(item);
        } else if cut_prefix(&mut item, "icmp-type ") {
            self.icmp_type = new_str(item);
        } else if cut_prefix(&mut item, "icmp6-code ") {
            self.icmp6_code = new_str(item);
        } else if cut_prefix(&mut item, "icmp6-type ") {
            self.icmp6_type = new_str(item);
        } else if item == "inactivity-timeout never" {
            self.inactivity_timeout_never = Value::Value(true);
        } else if cut_prefix(&mut item, "inactivity-timeout ") {
            self.inactivity_timeout = new_number(parse_number(item)?);
        } else if cut_prefix(&mut item, "rpc-program-number ") {
            self.rpc_program_number = new_str(item);
        } else if cut_prefix(&mut item, "source-port ") {
            self.source_port = new_str(item);
        } else if cut_prefix(&mut item, "uuid ") {
            self.uuid = new_str(item);
        }
        Ok(())
    }
}

/// `applications application <name>`
#[derive(Debug, Default, Clone, Copy)]
pub struct Application;

#[async_trait]
impl JunosResource for Application {
    const TYPE_NAME: &'static str = "junos_application";
    const KEYS: &'static [&'static str] = &["name"];
    const ID_FORMAT: &'static str = "<name>";

    type State<'a> = ApplicationState<'a>;

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn id(state: &Self::State<'_>) -> String {
        value_str(&state.name).unwrap_or_default().to_owned()
    }

    fn from_id<'a>(id: &str) -> Option<Self::State<'a>> {
        (!id.is_empty()).then(|| ApplicationState {
            name: new_str(id),
            ..Default::default()
        })
    }

    fn describe(state: &Self::State<'_>) -> String {
        format!(
            "application {:?}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn config_path(state: &Self::State<'_>) -> String {
        format!(
            "applications application {}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn set(state: &Self::State<'_>) -> anyhow::Result<Vec<String>> {
        let set_prefix = format!("set {} ", Self::config_path(state));
        let mut lines = vec![set_prefix.trim_end().to_owned()];

        for (statement, value) in [
            ("application-protocol", &state.application_protocol),
            ("destination-port", &state.destination_port),
            ("ether-type", &state.ether_type),
            ("protocol", &state.protocol),
            ("rpc-program-number", &state.rpc_program_number),
            ("source-port", &state.source_port),
            ("uuid", &state.uuid),
        ] {
            if let Some(value) = value_str(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        if let Some(description) = value_str(&state.description) {
            lines.push(format!("{set_prefix}description {}", quote(description)));
        }
        if value_bool(&state.inactivity_timeout_never) {
            lines.push(format!("{set_prefix}inactivity-timeout never"));
        } else if let Some(timeout) = value_number(&state.inactivity_timeout) {
            lines.push(format!("{set_prefix}inactivity-timeout {timeout}"));
        }
        for term in value_blocks(&state.term) {
            term.set(&set_prefix, &mut lines);
        }

        Ok(lines)
    }

    fn parse<'a>(keys: &Self::State<'a>, output: &str) -> anyhow::Result<Self::State<'a>> {
        let mut state = ApplicationState {
            name: keys.name.clone(),
            ..Default::default()
        };

        for item in config_lines(output) {
            let mut item = item;
            if cut_prefix(&mut item, "term ") {
                let (name, rest) = item.split_once(' ').unwrap_or((item, ""));
                block_by_key_mut(
                    &mut state.term,
                    |term| value_str(&term.name) == Some(name),
                    || ApplicationTerm {
                        name: new_str(name),
                        ..Default::default()
                    },
                )
                .read(rest)?;
            } else if cut_prefix(&mut item, "application-protocol ") {
                state.application_protocol = new_str(item);
            } else if cut_prefix(&mut item, "description ") {
                state.description = new_str(trim_quotes(item));
            } else if cut_prefix(&mut item, "destination-port ") {
                state.destination_port = new_str(item);
            } else if cut_prefix(&mut item, "ether-type ") {
                state.ether_type = new_str(item);
            } else if item == "inactivity-timeout never" {
                state.inactivity_timeout_never = Value::Value(true);
            } else if cut_prefix(&mut item, "inactivity-timeout ") {
                state.inactivity_timeout = new_number(parse_number(item)?);
            } else if cut_prefix(&mut item, "protocol ") {
                state.protocol = new_str(item);
            } else if cut_prefix(&mut item, "rpc-program-number ") {
                state.rpc_program_number = new_str(item);
            } else if cut_prefix(&mut item, "source-port ") {
                state.source_port = new_str(item);
            } else if cut_prefix(&mut item, "uuid ") {
                state.uuid = new_str(item);
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

    use tf_provider::{DataSource, Resource};

    use crate::adapter::{JunosDataSource, JunosResourceAdapter};
    use crate::connection::mock::MockConnection;
    use crate::junos::{JunosClient, Settings};

    use super::*;

    fn sample() -> ApplicationState<'static> {
        ApplicationState {
            name: new_str("app1"),
            description: new_str("web app"),
            term: Value::Value(vec![
                Value::Value(ApplicationTerm {
                    name: new_str("t1"),
                    protocol: new_str("tcp"),
                    destination_port: new_str("8080"),
                    ..Default::default()
                }),
                Value::Value(ApplicationTerm {
                    name: new_str("t2"),
                    protocol: new_str("udp"),
                    inactivity_timeout_never: Value::Value(true),
                    ..Default::default()
                }),
            ]),
            ..Default::default()
        }
    }

    const SAMPLE_CONFIG: &str = "\
set description \"web app\"
set term t1 protocol tcp
set term t1 destination-port 8080
set term t2 protocol udp
set term t2 inactivity-timeout never
";

    #[test]
    fn set_lines() {
        assert_eq!(
            Application::set(&sample()).unwrap(),
            vec![
                "set applications application app1",
                "set applications application app1 description \"web app\"",
                "set applications application app1 term t1 protocol tcp",
                "set applications application app1 term t1 destination-port 8080",
                "set applications application app1 term t2 protocol udp",
                "set applications application app1 term t2 inactivity-timeout never",
            ]
        );
    }

    #[test]
    fn parse_config() {
        let keys = Application::from_id("app1").unwrap();
        let state = Application::parse(&keys, SAMPLE_CONFIG).unwrap();
        assert_eq!(state, sample());
    }

    #[test]
    fn parse_bad_timeout() {
        let keys = Application::from_id("app1").unwrap();
        assert!(Application::parse(&keys, "set inactivity-timeout soon\n").is_err());
    }

    #[test]
    fn validate_conflicts_and_duplicates() {
        let mut state = sample();
        state.protocol = new_str("tcp");
        if let Value::Value(terms) = &mut state.term {
            terms.push(Value::Value(ApplicationTerm {
                name: new_str("t1"),
                protocol: new_str("icmp"),
                inactivity_timeout: Value::Value(60),
                inactivity_timeout_never: Value::Value(true),
                ..Default::default()
            }));
        }

        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        // protocol vs term, duplicate t1, timeout vs never in the last term
        assert_eq!(diags.errors.len(), 3);
    }

    #[test]
    fn validate_formats() {
        let state = ApplicationState {
            name: new_str("app1"),
            ether_type: new_str("0800"),
            rpc_program_number: new_str("100-"),
            inactivity_timeout: Value::Value(-1),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 3);

        let mut diags = Diagnostics::default();
        sample().validate(&mut diags, AttributePath::default());
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn validate_timeout_bounds() {
        for (timeout, errors) in [(0, 0), (100000, 0), (4294967295, 0), (4294967296, 1)] {
            let state = ApplicationState {
                name: new_str("app1"),
                inactivity_timeout: Value::Value(timeout),
                ..Default::default()
            };
            let mut diags = Diagnostics::default();
            state.validate(&mut diags, AttributePath::default());
            assert_eq!(diags.errors.len(), errors, "inactivity_timeout = {timeout}");
        }
    }

    #[test]
    fn validate_description_quotes() {
        let state = ApplicationState {
            name: new_str("app1"),
            description: new_str("the \"web\" app"),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].attribute, AttributePath::new("description"));
    }

    fn handle(client: JunosClient) -> crate::adapter::ClientHandle {
        Arc::new(RwLock::new(Some(Arc::new(client))))
    }

    const SHOW_APP1: &str = "show configuration applications application app1 | display set relative";

    #[tokio::test]
    async fn create_refuses_existing_application() {
        let connect = MockConnection::default().with_command(SHOW_APP1, SAMPLE_CONFIG);
        let scripts = Arc::clone(&connect.scripts);
        let resource =
            JunosResourceAdapter::<Application>::new(handle(JunosClient::new(Box::new(connect), Settings::default())));

        let mut diags = Diagnostics::default();
        let res = resource
            .create(&mut diags, sample(), sample(), Default::default(), Default::default())
            .await;
        assert!(res.is_none());
        assert_eq!(diags.errors.len(), 1);
        assert!(scripts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_fails_post_check_when_nothing_is_configured() {
        let connect = MockConnection::default();
        let scripts = Arc::clone(&connect.scripts);
        let resource =
            JunosResourceAdapter::<Application>::new(handle(JunosClient::new(Box::new(connect), Settings::default())));

        let mut diags = Diagnostics::default();
        let res = resource
            .create(&mut diags, sample(), sample(), Default::default(), Default::default())
            .await;
        // the mock device never shows the committed configuration
        assert!(res.is_none());
        assert_eq!(diags.errors.len(), 1);

        let scripts = scripts.lock().unwrap();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("commit comment \"create resource junos_application\""));
        assert!(scripts[0].contains("set applications application app1 term t1 protocol tcp\n"));
    }

    #[tokio::test]
    async fn update_replaces_configuration() {
        let connect = MockConnection::default().with_command(SHOW_APP1, SAMPLE_CONFIG);
        let scripts = Arc::clone(&connect.scripts);
        let resource =
            JunosResourceAdapter::<Application>::new(handle(JunosClient::new(Box::new(connect), Settings::default())));

        let mut prior = sample();
        prior.id = new_str("app1");
        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .update(&mut diags, prior, sample(), sample(), Default::default(), Default::default())
            .await
            .unwrap();
        assert!(diags.errors.is_empty());
        assert_eq!(state.id, new_str("app1"));

        let scripts = scripts.lock().unwrap();
        assert!(scripts[0].starts_with(
            "configure private\ndelete applications application app1\nset applications application app1\n"
        ));
    }

    #[tokio::test]
    async fn read_and_import() {
        let connect = MockConnection::default().with_command(SHOW_APP1, SAMPLE_CONFIG);
        let resource =
            JunosResourceAdapter::<Application>::new(handle(JunosClient::new(Box::new(connect), Settings::default())));

        let mut diags = Diagnostics::default();
        let mut prior = Application::from_id("app1").unwrap();
        prior.id = new_str("app1");
        let (state, _) = resource
            .read(&mut diags, prior, Default::default(), Default::default())
            .await
            .unwrap();
        let mut expected = sample();
        expected.id = new_str("app1");
        assert_eq!(state, expected);

        let (state, _) = resource
            .import(&mut diags, "app1".to_owned())
            .await
            .unwrap();
        assert_eq!(state, expected);

        assert!(resource
            .import(&mut diags, "app2".to_owned())
            .await
            .is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn read_removes_missing_application() {
        let resource = JunosResourceAdapter::<Application>::new(handle(JunosClient::new(
            Box::new(MockConnection::default()),
            Settings::default(),
        )));
        let mut diags = Diagnostics::default();
        let res = resource
            .read(&mut diags, sample(), Default::default(), Default::default())
            .await;
        assert!(res.is_none());
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn fake_create_writes_setfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junos.set");
        let connect = MockConnection::default();
        let scripts = Arc::clone(&connect.scripts);
        let settings = Settings {
            fake_create_with_setfile: Some(path.clone()),
            ..Default::default()
        };
        let resource =
            JunosResourceAdapter::<Application>::new(handle(JunosClient::new(Box::new(connect), settings)));

        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .create(&mut diags, sample(), sample(), Default::default(), Default::default())
            .await
            .unwrap();
        assert_eq!(state.id, new_str("app1"));
        assert!(scripts.lock().unwrap().is_empty());

        // delete is committed on the device without fake_delete_also
        resource
            .destroy(&mut diags, state, Default::default())
            .await
            .unwrap();
        assert_eq!(scripts.lock().unwrap().len(), 1);

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            content,
            Application::set(&sample()).unwrap().join("\n") + "\n"
        );
    }

    #[tokio::test]
    async fn data_source_reads_application() {
        let connect = MockConnection::default().with_command(SHOW_APP1, SAMPLE_CONFIG);
        let data_source =
            JunosDataSource::<Application>::new(handle(JunosClient::new(Box::new(connect), Settings::default())));

        let mut diags = Diagnostics::default();
        let state = data_source
            .read(&mut diags, Application::from_id("app1").unwrap(), Default::default())
            .await
            .unwrap();
        assert_eq!(state.id, new_str("app1"));
        assert_eq!(state.term, sample().term);

        let schema = DataSource::schema(&data_source, &mut diags).unwrap();
        assert!(schema.block.blocks.is_empty());
    }

    #[tokio::test]
    async fn create_sets_id_once_committed() {
        let connect = MockConnection::default().with_committed(SHOW_APP1, SAMPLE_CONFIG);
        let scripts = Arc::clone(&connect.scripts);
        let resource =
            JunosResourceAdapter::<Application>::new(handle(JunosClient::new(Box::new(connect), Settings::default())));

        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .create(&mut diags, sample(), sample(), Default::default(), Default::default())
            .await
            .unwrap();
        assert!(diags.errors.is_empty());
        assert_eq!(state.id, new_str("app1"));
        assert_eq!(scripts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fake_update_and_delete_write_setfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junos.set");
        let connect = MockConnection::default();
        let scripts = Arc::clone(&connect.scripts);
        let settings = Settings {
            fake_create_with_setfile: Some(path.clone()),
            fake_update_also: true,
            fake_delete_also: true,
            ..Default::default()
        };
        let resource =
            JunosResourceAdapter::<Application>::new(handle(JunosClient::new(Box::new(connect), settings)));

        let mut prior = sample();
        prior.id = new_str("app1");
        let mut planned = sample();
        planned.description = new_str("api");

        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .update(&mut diags, prior, planned.clone(), planned, Default::default(), Default::default())
            .await
            .unwrap();
        resource
            .destroy(&mut diags, state, Default::default())
            .await
            .unwrap();
        assert!(diags.errors.is_empty());
        assert!(scripts.lock().unwrap().is_empty());

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.first(), Some(&"delete applications application app1"));
        assert!(lines.contains(&"set applications application app1 description \"api\""));
        assert_eq!(lines.last(), Some(&"delete applications application app1"));
    }

    #[tokio::test]
    async fn data_source_reports_missing_application() {
        let data_source = JunosDataSource::<Application>::new(handle(JunosClient::new(
            Box::new(MockConnection::default()),
            Settings::default(),
        )));

        let mut diags = Diagnostics::default();
        let state = data_source
            .read(&mut diags, Application::from_id("app2").unwrap(), Default::default())
            .await;
        assert!(state.is_none());
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].summary, crate::diag::NOT_FOUND);
        assert_eq!(
            diags.errors[0].detail,
            "application \"app2\" not found"
        );
    }
}

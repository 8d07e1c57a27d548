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

use tf_provider::schema::Block;
use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Schema};

use crate::adapter::JunosResource;
use crate::junos::{config_lines, cut_prefix, expect_fields};
use crate::schema::{block, block_list, id, optional_string, required_string, resource_schema};
use crate::utils::{
    block_by_key_mut, duplicate, has_items, missing, new_str, validate_name, validate_one_of,
    value_blocks, value_str, NameFormat, WithSchema, WithValidate,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessGroupState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub default_context_prefix: ValueList<Value<AccessConfig<'a>>>,
    pub context_prefix: ValueList<Value<ContextPrefix<'a>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessConfig<'a> {
    pub model: ValueString<'a>,
    pub level: ValueString<'a>,
    pub context_match: ValueString<'a>,
    pub notify_view: ValueString<'a>,
    pub read_view: ValueString<'a>,
    pub write_view: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPrefix<'a> {
    pub prefix: ValueString<'a>,
    pub access_config: ValueList<Value<AccessConfig<'a>>>,
}

fn access_config_block(description: &str) -> Block {
    block(
        description,
        map! {
            "model" => required_string("Security model access configuration (any, usm, v1 or v2c)"),
            "level" => required_string("Security level access configuration (authentication, none or privacy)"),
            "context_match" => optional_string("Type of match to perform on context-prefix (exact or prefix)"),
            "notify_view" => optional_string("View used to notifications"),
            "read_view" => optional_string("View used for read access"),
            "write_view" => optional_string("View used for write access"),
        },
        map! {},
    )
}

impl<'a> WithSchema for AccessGroupState<'a> {
    fn schema() -> Schema {
        resource_schema(block(
            "Provides a snmp v3 VACM access group resource",
            map! {
                "id" => id("<name>"),
                "name" => required_string("SNMPv3 VACM group name"),
            },
            map! {
                "default_context_prefix" => block_list(access_config_block("Default context-prefix access configuration")),
                "context_prefix" => block_list(block(
                    "Context-prefix access configuration",
                    map! {
                        "prefix" => required_string("SNMPv3 VACM context prefix"),
                    },
                    map! {
                        "access_config" => block_list(access_config_block("Access configuration for this context-prefix")),
                    },
                )),
            },
        ))
    }
}

impl<'a> AccessConfig<'a> {
    fn key(&self) -> (&str, &str) {
        (
            value_str(&self.model).unwrap_or_default(),
            value_str(&self.level).unwrap_or_default(),
        )
    }

    fn views(&self) -> [(&'static str, &ValueString<'a>); 3] {
        [
            ("notify-view", &self.notify_view),
            ("read-view", &self.read_view),
            ("write-view", &self.write_view),
        ]
    }

    fn set(&self, set_prefix: &str, lines: &mut Vec<String>) {
        let (model, level) = self.key();
        let set_prefix = format!("{set_prefix}security-model {model} security-level {level} ");
        lines.push(set_prefix.trim_end().to_owned());
        if let Some(context_match) = value_str(&self.context_match) {
            lines.push(format!("{set_prefix}context-match {context_match}"));
        }
        for (statement, value) in self.views() {
            if let Some(value) = value_str(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
    }

    fn read(&mut self, item: &str) {
        let mut item = item;
        if cut_prefix(&mut item, "context-match ") {
            self.context_match = new_str(item);
        } else if cut_prefix(&mut item, "notify-view ") {
            self.notify_view = new_str(item);
        } else if cut_prefix(&mut item, "read-view ") {
            self.read_view = new_str(item);
        } else if cut_prefix(&mut item, "write-view ") {
            self.write_view = new_str(item);
        }
    }
}

impl<'a> WithValidate for AccessConfig<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_one_of(
            diags,
            &self.model,
            attr_path.clone().attribute("model"),
            &["any", "usm", "v1", "v2c"],
        );
        validate_one_of(
            diags,
            &self.level,
            attr_path.clone().attribute("level"),
            &["authentication", "none", "privacy"],
        );
        validate_one_of(
            diags,
            &self.context_match,
            attr_path.clone().attribute("context_match"),
            &["exact", "prefix"],
        );
        if self.views().iter().all(|(_, view)| matches!(view, Value::Null)) {
            missing(
                diags,
                attr_path,
                "one of notify_view, read_view or write_view must be specified",
            );
        }
    }
}

/// Validate a list of access configs, reporting duplicated model and level
fn validate_access_configs(
    diags: &mut Diagnostics,
    configs: &ValueList<Value<AccessConfig>>,
    attr_path: AttributePath,
) {
    let mut keys = Vec::new();
    for (i, config) in value_blocks(configs).enumerate() {
        let key = config.key();
        if keys.contains(&key) {
            duplicate(
                diags,
                attr_path.clone().index(i as i64),
                "access config",
                &format!("{} {}", key.0, key.1),
            );
        }
        keys.push(key);
    }
    configs.validate(diags, attr_path);
}

/// Read a `security-model <model> security-level <level> ...` statement
fn read_access_config(
    configs: &mut ValueList<Value<AccessConfig>>,
    item: &str,
    what: &str,
) -> anyhow::Result<()> {
    let fields = expect_fields(item, 4, what)?;
    let (model, level) = (fields[1], fields[3]);
    let config = block_by_key_mut(
        configs,
        |config| config.key() == (model, level),
        || AccessConfig {
            model: new_str(model),
            level: new_str(level),
            ..Default::default()
        },
    );
    if let Some(rest) = item.splitn(5, ' ').nth(4) {
        config.read(rest);
    }
    Ok(())
}

impl<'a> WithValidate for ContextPrefix<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if !has_items(&self.access_config) {
            missing(
                diags,
                attr_path.clone().attribute("access_config"),
                "at least one access_config block must be specified",
            );
        }
        validate_access_configs(
            diags,
            &self.access_config,
            attr_path.attribute("access_config"),
        );
    }
}

impl<'a> WithValidate for AccessGroupState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            32,
            NameFormat::Word,
        );
        if !has_items(&self.default_context_prefix) && !has_items(&self.context_prefix) {
            missing(
                diags,
                attr_path.clone(),
                "one of default_context_prefix or context_prefix must be specified",
            );
        }
        validate_access_configs(
            diags,
            &self.default_context_prefix,
            attr_path.clone().attribute("default_context_prefix"),
        );

        let mut prefixes = Vec::new();
        for (i, context) in value_blocks(&self.context_prefix).enumerate() {
            if let Some(prefix) = value_str(&context.prefix) {
                if prefixes.contains(&prefix) {
                    duplicate(
                        diags,
                        attr_path.clone().attribute("context_prefix").index(i as i64),
                        "context_prefix",
                        prefix,
                    );
                }
                prefixes.push(prefix);
            }
        }
        self.context_prefix
            .validate(diags, attr_path.attribute("context_prefix"));
    }
}

/// `snmp v3 vacm access group <name>`
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessGroup;

#[async_trait]
impl JunosResource for AccessGroup {
    const TYPE_NAME: &'static str = "junos_snmp_v3_vacm_accessgroup";
    const KEYS: &'static [&'static str] = &["name"];
    const ID_FORMAT: &'static str = "<name>";

    type State<'a> = AccessGroupState<'a>;

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn id(state: &Self::State<'_>) -> String {
        value_str(&state.name).unwrap_or_default().to_owned()
    }

    fn from_id<'a>(id: &str) -> Option<Self::State<'a>> {
        (!id.is_empty()).then(|| AccessGroupState {
            name: new_str(id),
            ..Default::default()
        })
    }

    fn describe(state: &Self::State<'_>) -> String {
        format!(
            "snmp v3 vacm access group {:?}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn config_path(state: &Self::State<'_>) -> String {
        format!(
            "snmp v3 vacm access group {}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn set(state: &Self::State<'_>) -> anyhow::Result<Vec<String>> {
        let set_prefix = format!("set {} ", Self::config_path(state));
        let mut lines = Vec::new();

        for config in value_blocks(&state.default_context_prefix) {
            config.set(&format!("{set_prefix}default-context-prefix "), &mut lines);
        }
        for context in value_blocks(&state.context_prefix) {
            let context_prefix = format!(
                "{set_prefix}context-prefix {} ",
                value_str(&context.prefix).unwrap_or_default()
            );
            for config in value_blocks(&context.access_config) {
                config.set(&context_prefix, &mut lines);
            }
        }

        Ok(lines)
    }

    fn parse<'a>(keys: &Self::State<'a>, output: &str) -> anyhow::Result<Self::State<'a>> {
        let mut state = AccessGroupState {
            name: keys.name.clone(),
            ..Default::default()
        };

        for item in config_lines(output) {
            let mut item = item;
            if cut_prefix(&mut item, "default-context-prefix ") {
                read_access_config(
                    &mut state.default_context_prefix,
                    item,
                    "default-context-prefix",
                )?;
            } else if cut_prefix(&mut item, "context-prefix ") {
                let (prefix, rest) = item.split_once(' ').unwrap_or((item, ""));
                let context = block_by_key_mut(
                    &mut state.context_prefix,
                    |context| value_str(&context.prefix) == Some(prefix),
                    || ContextPrefix {
                        prefix: new_str(prefix),
                        ..Default::default()
                    },
                );
                if !rest.is_empty() {
                    read_access_config(&mut context.access_config, rest, "context-prefix")?;
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
set default-context-prefix security-model usm security-level privacy
set default-context-prefix security-model usm security-level privacy read-view all
set context-prefix ctx security-model v2c security-level none
set context-prefix ctx security-model v2c security-level none context-match exact
set context-prefix ctx security-model v2c security-level none notify-view traps
";

    fn sample() -> AccessGroupState<'static> {
        AccessGroupState {
            name: new_str("ops"),
            default_context_prefix: Value::Value(vec![Value::Value(AccessConfig {
                model: new_str("usm"),
                level: new_str("privacy"),
                read_view: new_str("all"),
                ..Default::default()
            })]),
            context_prefix: Value::Value(vec![Value::Value(ContextPrefix {
                prefix: new_str("ctx"),
                access_config: Value::Value(vec![Value::Value(AccessConfig {
                    model: new_str("v2c"),
                    level: new_str("none"),
                    context_match: new_str("exact"),
                    notify_view: new_str("traps"),
                    ..Default::default()
                })]),
            })]),
            ..Default::default()
        }
    }

    #[test]
    fn set_lines() {
        let expected: Vec<String> = SAMPLE_CONFIG
            .lines()
            .map(|line| line.replacen("set ", "set snmp v3 vacm access group ops ", 1))
            .collect();
        assert_eq!(AccessGroup::set(&sample()).unwrap(), expected);
    }

    #[test]
    fn parse_config() {
        let keys = AccessGroup::from_id("ops").unwrap();
        assert_eq!(AccessGroup::parse(&keys, SAMPLE_CONFIG).unwrap(), sample());
    }

    #[test]
    fn parse_truncated_statement() {
        let keys = AccessGroup::from_id("ops").unwrap();
        let err = AccessGroup::parse(&keys, "set default-context-prefix security-model usm\n")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "can't read values for default-context-prefix in \"security-model usm\": not enough fields"
        );
    }

    #[test]
    fn validation() {
        let mut diags = Diagnostics::default();
        sample().validate(&mut diags, AttributePath::default());
        assert!(diags.errors.is_empty(), "{:?}", diags.errors);

        let mut diags = Diagnostics::default();
        AccessGroupState {
            name: new_str("ops"),
            ..Default::default()
        }
        .validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 1);

        let config = AccessConfig {
            model: new_str("usm"),
            level: new_str("privacy"),
            ..Default::default()
        };
        let state = AccessGroupState {
            name: new_str("ops"),
            default_context_prefix: Value::Value(vec![
                Value::Value(config.clone()),
                Value::Value(config),
            ]),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        // duplicate key, and no view in both blocks
        assert_eq!(diags.errors.len(), 3);

        // written unquoted in the configuration path
        let mut diags = Diagnostics::default();
        AccessGroupState {
            name: new_str("ops team"),
            ..sample()
        }
        .validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].attribute, AttributePath::new("name"));
    }
}

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
use crate::junos::{config_lines, cut_prefix, parse_number, quote, trim_quotes};
use crate::schema::{
    block, block_list, id, optional_bool, optional_number, optional_string, required_string,
    resource_schema,
};
use crate::utils::{
    first_block, missing, new_number, new_str, single_block_mut, validate_name, validate_one_of,
    validate_range, validate_single_block, value_bool, value_number, value_str, NameFormat,
    WithSchema, WithValidate,
};

const FALLBACK_ACTIONS: &[&str] = &["block", "log-and-permit"];

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebFilteringJuniperLocalState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub custom_block_message: ValueString<'a>,
    pub default_action: ValueString<'a>,
    pub fallback_settings: ValueList<Value<FallbackSettings<'a>>>,
    pub no_safe_search: ValueBool,
    pub timeout: ValueNumber,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackSettings<'a> {
    pub default: ValueString<'a>,
    pub server_connectivity: ValueString<'a>,
    pub timeout: ValueString<'a>,
    pub too_many_requests: ValueString<'a>,
}

impl<'a> WithSchema for WebFilteringJuniperLocalState<'a> {
    fn schema() -> Schema {
        resource_schema(block(
            "Provides a security UTM web-filtering juniper-local profile resource",
            map! {
                "id" => id("<name>"),
                "name" => required_string("The name of security utm feature-profile web-filtering juniper-local profile"),
                "custom_block_message" => optional_string("Custom block message sent to HTTP client"),
                "default_action" => optional_string("Default action"),
                "no_safe_search" => optional_bool("Do not perform safe-search for Juniper local protocol"),
                "timeout" => optional_number("Set timeout"),
            },
            map! {
                "fallback_settings" => block_list(block(
                    "Fallback settings",
                    map! {
                        "default" => optional_string("Default action"),
                        "server_connectivity" => optional_string("Action when device cannot connect to server"),
                        "timeout" => optional_string("Action when connection to server timeout"),
                        "too_many_requests" => optional_string("Action when requests exceed the limit of engine"),
                    },
                    map! {},
                )),
            },
        ))
    }
}

impl<'a> FallbackSettings<'a> {
    /// (attribute, statement, value) of each fallback action
    fn statements(&self) -> [(&'static str, &'static str, &ValueString<'a>); 4] {
        [
            ("default", "default", &self.default),
            (
                "server_connectivity",
                "server-connectivity",
                &self.server_connectivity,
            ),
            ("timeout", "timeout", &self.timeout),
            ("too_many_requests", "too-many-requests", &self.too_many_requests),
        ]
    }
}

impl<'a> WithValidate for FallbackSettings<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        let statements = self.statements();
        if statements
            .iter()
            .all(|(_, _, value)| value_str(value).is_none())
        {
            missing(diags, attr_path.clone(), "fallback_settings block is empty");
        }
        for (attribute, _, value) in statements {
            validate_one_of(
                diags,
                value,
                attr_path.clone().attribute(attribute),
                FALLBACK_ACTIONS,
            );
        }
    }
}

impl<'a> WithValidate for WebFilteringJuniperLocalState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            29,
            NameFormat::Any,
        );
        if value_str(&self.custom_block_message).is_some_and(|message| message.contains('"')) {
            diags.error(
                diag::BAD_FORMAT,
                "custom_block_message cannot contain double quotes",
                attr_path.clone().attribute("custom_block_message"),
            );
        }
        validate_one_of(
            diags,
            &self.default_action,
            attr_path.clone().attribute("default_action"),
            &["block", "log-and-permit", "permit"],
        );
        validate_range(
            diags,
            &self.timeout,
            attr_path.clone().attribute("timeout"),
            1,
            1800,
        );
        validate_single_block(
            diags,
            &self.fallback_settings,
            attr_path.clone().attribute("fallback_settings"),
        );
        self.fallback_settings
            .validate(diags, attr_path.attribute("fallback_settings"));
    }
}

/// `security utm feature-profile web-filtering juniper-local profile "<name>"`
#[derive(Debug, Default, Clone, Copy)]
pub struct WebFilteringJuniperLocal;

#[async_trait]
impl JunosResource for WebFilteringJuniperLocal {
    const TYPE_NAME: &'static str = "junos_security_utm_profile_web_filtering_juniper_local";
    const KEYS: &'static [&'static str] = &["name"];
    const ID_FORMAT: &'static str = "<name>";
    const SECURITY: bool = true;

    type State<'a> = WebFilteringJuniperLocalState<'a>;

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn id(state: &Self::State<'_>) -> String {
        value_str(&state.name).unwrap_or_default().to_owned()
    }

    fn from_id<'a>(id: &str) -> Option<Self::State<'a>> {
        (!id.is_empty()).then(|| WebFilteringJuniperLocalState {
            name: new_str(id),
            ..Default::default()
        })
    }

    fn describe(state: &Self::State<'_>) -> String {
        format!(
            "web-filtering juniper-local profile {:?}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn config_path(state: &Self::State<'_>) -> String {
        format!(
            "security utm feature-profile web-filtering juniper-local profile {}",
            quote(value_str(&state.name).unwrap_or_default())
        )
    }

    fn set(state: &Self::State<'_>) -> anyhow::Result<Vec<String>> {
        let set_prefix = format!("set {} ", Self::config_path(state));
        let mut lines = vec![set_prefix.trim_end().to_owned()];

        if let Some(message) = value_str(&state.custom_block_message) {
            lines.push(format!("{set_prefix}custom-block-message {}", quote(message)));
        }
        if let Some(default_action) = value_str(&state.default_action) {
            lines.push(format!("{set_prefix}default {default_action}"));
        }
        if let Some(fallback) = first_block(&state.fallback_settings) {
            lines.push(format!("{set_prefix}fallback-settings"));
            for (_, statement, value) in fallback.statements() {
                if let Some(value) = value_str(value) {
                    lines.push(format!("{set_prefix}fallback-settings {statement} {value}"));
                }
            }
        }
        if value_bool(&state.no_safe_search) {
            lines.push(format!("{set_prefix}no-safe-search"));
        }
        if let Some(timeout) = value_number(&state.timeout) {
            lines.push(format!("{set_prefix}timeout {timeout}"));
        }

        Ok(lines)
    }

    fn parse<'a>(keys: &Self::State<'a>, output: &str) -> anyhow::Result<Self::State<'a>> {
        let mut state = WebFilteringJuniperLocalState {
            name: keys.name.clone(),
            ..Default::default()
        };

        for item in config_lines(output) {
            let mut item = item;
            if item == "no-safe-search" {
                state.no_safe_search = Value::Value(true);
            } else if cut_prefix(&mut item, "custom-block-message ") {
                state.custom_block_message = new_str(trim_quotes(item));
            } else if cut_prefix(&mut item, "default ") {
                state.default_action = new_str(item);
            } else if cut_prefix(&mut item, "fallback-settings") {
                let fallback = single_block_mut(&mut state.fallback_settings);
                if cut_prefix(&mut item, " default ") {
                    fallback.default = new_str(item);
                } else if cut_prefix(&mut item, " server-connectivity ") {
                    fallback.server_connectivity = new_str(item);
                } else if cut_prefix(&mut item, " timeout ") {
                    fallback.timeout = new_str(item);
                } else if cut_prefix(&mut item, " too-many-requests ") {
                    fallback.too_many_requests = new_str(item);
                }
            } else if cut_prefix(&mut item, "timeout ") {
                state.timeout = new_number(parse_number(item)?);
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

    fn sample() -> WebFilteringJuniperLocalState<'static> {
        WebFilteringJuniperLocalState {
            name: new_str("local filter"),
            custom_block_message: new_str("Blocked by policy"),
            default_action: new_str("log-and-permit"),
            fallback_settings: Value::Value(vec![Value::Value(FallbackSettings {
                default: new_str("block"),
                too_many_requests: new_str("log-and-permit"),
                ..Default::default()
            })]),
            timeout: new_number(3),
            ..Default::default()
        }
    }

    #[test]
    fn profile_name_is_quoted() {
        let lines = WebFilteringJuniperLocal::set(&sample()).unwrap();
        let prefix =
            "set security utm feature-profile web-filtering juniper-local profile \"local filter\"";
        assert_eq!(lines[0], prefix);
        assert!(lines.contains(&format!(
            "{prefix} custom-block-message \"Blocked by policy\""
        )));
        assert!(lines.contains(&format!("{prefix} fallback-settings default block")));
        assert_eq!(
            WebFilteringJuniperLocal::del(&sample()),
            vec![
                "delete security utm feature-profile web-filtering juniper-local profile \"local filter\""
            ]
        );
    }

    #[test]
    fn parse_config() {
        let output = "\
set custom-block-message \"Blocked by policy\"
set default log-and-permit
set fallback-settings default block
set fallback-settings too-many-requests log-and-permit
set timeout 3
";
        let keys = WebFilteringJuniperLocal::from_id("local filter").unwrap();
        assert_eq!(
            WebFilteringJuniperLocal::parse(&keys, output).unwrap(),
            sample()
        );
    }

    #[test]
    fn validation() {
        let mut diags = Diagnostics::default();
        sample().validate(&mut diags, AttributePath::default());
        assert!(diags.errors.is_empty(), "{:?}", diags.errors);

        let state = WebFilteringJuniperLocalState {
            timeout: new_number(1801),
            fallback_settings: Value::Value(vec![Value::Value(FallbackSettings {
                timeout: new_str("permit"),
                ..Default::default()
            })]),
            ..sample()
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 2);
    }
}

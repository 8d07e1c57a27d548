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

use tf_provider::value::{Value, ValueBool, ValueList, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Schema};

use crate::adapter::JunosResource;
use crate::junos::{config_lines, cut_prefix, quote, trim_quotes};
use crate::schema::{block, id, optional_bool, optional_string, optional_string_set, required_string, resource_schema};
use crate::utils::{
    conflict, is_cidr, new_str, push_str, validate_cidr, validate_name, validate_text, value_bool,
    value_str, value_strings, NameFormat, WithSchema, WithValidate,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixListState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub apply_path: ValueString<'a>,
    pub dynamic_db: ValueBool,
    pub prefix: ValueList<ValueString<'a>>,
}

impl<'a> WithSchema for PrefixListState<'a> {
    fn schema() -> Schema {
        resource_schema(block(
            "Provides a prefix list resource",
            map! {
                "id" => id("<name>"),
                "name" => required_string("Prefix list name"),
                "apply_path" => optional_string("Apply IP prefixes from a configuration statement"),
                "dynamic_db" => optional_bool("Object may exist in dynamic database"),
                "prefix" => optional_string_set("Address prefixes"),
            },
            map! {},
        ))
    }
}

impl<'a> WithValidate for PrefixListState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            250,
            NameFormat::Address,
        );
        validate_text(
            diags,
            &self.apply_path,
            attr_path.clone().attribute("apply_path"),
        );
        for prefix in value_strings(&self.prefix) {
            validate_cidr(diags, prefix, attr_path.clone().attribute("prefix"));
        }
        if value_bool(&self.dynamic_db) && value_str(&self.apply_path).is_some() {
            conflict(
                diags,
                attr_path.attribute("dynamic_db"),
                "dynamic_db",
                "apply_path",
            );
        }
    }
}

/// `policy-options prefix-list <name>`
#[derive(Debug, Default, Clone, Copy)]
pub struct PrefixList;

#[async_trait]
impl JunosResource for PrefixList {
    const TYPE_NAME: &'static str = "junos_policyoptions_prefix_list";
    const KEYS: &'static [&'static str] = &["name"];
    const ID_FORMAT: &'static str = "<name>";

    type State<'a> = PrefixListState<'a>;

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn id(state: &Self::State<'_>) -> String {
        value_str(&state.name).unwrap_or_default().to_owned()
    }

    fn from_id<'a>(id: &str) -> Option<Self::State<'a>> {
        (!id.is_empty()).then(|| PrefixListState {
            name: new_str(id),
            ..Default::default()
        })
    }

    fn describe(state: &Self::State<'_>) -> String {
        format!(
            "policy-options prefix-list {:?}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn config_path(state: &Self::State<'_>) -> String {
        format!(
            "policy-options prefix-list {}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn set(state: &Self::State<'_>) -> anyhow::Result<Vec<String>> {
        let set_prefix = format!("set {} ", Self::config_path(state));
        let mut lines = vec![set_prefix.trim_end().to_owned()];

        if let Some(apply_path) = value_str(&state.apply_path) {
            lines.push(format!("{set_prefix}apply-path {}", quote(apply_path)));
        }
        if value_bool(&state.dynamic_db) {
            lines.push(format!("{set_prefix}dynamic-db"));
        }
        for prefix in value_strings(&state.prefix) {
            lines.push(format!("{set_prefix}{prefix}"));
        }

        Ok(lines)
    }

    fn parse<'a>(keys: &Self::State<'a>, output: &str) -> anyhow::Result<Self::State<'a>> {
        let mut state = PrefixListState {
            name: keys.name.clone(),
            ..Default::default()
        };

        for item in config_lines(output) {
            let mut item = item;
            if cut_prefix(&mut item, "apply-path ") {
                state.apply_path = new_str(trim_quotes(item));
            } else if item == "dynamic-db" {
                state.dynamic_db = Value::Value(true);
            } else if is_cidr(item) {
                push_str(&mut state.prefix, item);
            }
        }

        Ok(state)
    }

    fn del(state: &Self::State<'_>) -> Vec<String> {
        vec![format!("delete {}", Self::config_path(state))]
    }
}

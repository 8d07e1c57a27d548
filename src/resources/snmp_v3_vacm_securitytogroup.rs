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

use tf_provider::value::ValueString;
use tf_provider::{map, AttributePath, Diagnostics, Schema};

use crate::adapter::JunosResource;
use crate::junos::{config_lines, cut_prefix, join_id, split_id};
use crate::schema::{block, id, required_string, resource_schema};
use crate::utils::{
    new_str, validate_name, validate_one_of, value_str, NameFormat, WithSchema, WithValidate,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityToGroupState<'a> {
    pub id: ValueString<'a>,
    pub model: ValueString<'a>,
    pub name: ValueString<'a>,
    pub group: ValueString<'a>,
}

impl<'a> WithSchema for SecurityToGroupState<'a> {
    fn schema() -> Schema {
        resource_schema(block(
            "Assign a security name to a group in SNMPv3 VACM",
            map! {
                "id" => id("<model>_-_<name>"),
                "model" => required_string("Security model context for group assignment (usm, v1 or v2c)"),
                "name" => required_string("Security name to assign to group"),
                "group" => required_string("Group to which to assign security name"),
            },
            map! {},
        ))
    }
}

impl<'a> WithValidate for SecurityToGroupState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_one_of(
            diags,
            &self.model,
            attr_path.clone().attribute("model"),
            &["usm", "v1", "v2c"],
        );
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            32,
            NameFormat::Word,
        );
        validate_name(
            diags,
            &self.group,
            attr_path.attribute("group"),
            32,
            NameFormat::Word,
        );
    }
}

/// `snmp v3 vacm security-to-group security-model <model> security-name <name>`
#[derive(Debug, Default, Clone, Copy)]
pub struct SecurityToGroup;

#[async_trait]
impl JunosResource for SecurityToGroup {
    const TYPE_NAME: &'static str = "junos_snmp_v3_vacm_securitytogroup";
    const KEYS: &'static [&'static str] = &["model", "name"];
    const ID_FORMAT: &'static str = "<model>_-_<name>";

    type State<'a> = SecurityToGroupState<'a>;

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn id(state: &Self::State<'_>) -> String {
        join_id(&[
            value_str(&state.model).unwrap_or_default(),
            value_str(&state.name).unwrap_or_default(),
        ])
    }

    fn from_id<'a>(id: &str) -> Option<Self::State<'a>> {
        let parts = split_id(id, 2)?;
        Some(SecurityToGroupState {
            model: new_str(parts[0]),
            name: new_str(parts[1]),
            ..Default::default()
        })
    }

    fn describe(state: &Self::State<'_>) -> String {
        format!(
            "snmp v3 vacm security-to-group security-model {} security-name {:?}",
            value_str(&state.model).unwrap_or_default(),
            value_str(&state.name).unwrap_or_default(),
        )
    }

    fn config_path(state: &Self::State<'_>) -> String {
        format!(
            "snmp v3 vacm security-to-group security-model {} security-name {}",
            value_str(&state.model).unwrap_or_default(),
            value_str(&state.name).unwrap_or_default(),
        )
    }

    fn set(state: &Self::State<'_>) -> anyhow::Result<Vec<String>> {
        let group = value_str(&state.group).unwrap_or_default();
        Ok(vec![format!("set {} group {group}", Self::config_path(state))])
    }

    fn parse<'a>(keys: &Self::State<'a>, output: &str) -> anyhow::Result<Self::State<'a>> {
        let mut state = SecurityToGroupState {
            model: keys.model.clone(),
            name: keys.name.clone(),
            ..Default::default()
        };
        for item in config_lines(output) {
            let mut item = item;
            if cut_prefix(&mut item, "group ") {
                state.group = new_str(item);
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

    #[test]
    fn id_has_model_and_name() {
        let state = SecurityToGroup::from_id("usm_-_monitoring").unwrap();
        assert_eq!(state.model, new_str("usm"));
        assert_eq!(state.name, new_str("monitoring"));
        assert_eq!(SecurityToGroup::id(&state), "usm_-_monitoring");
        assert!(SecurityToGroup::from_id("monitoring").is_none());
    }

    #[test]
    fn set_and_parse() {
        let state = SecurityToGroupState {
            group: new_str("readers"),
            ..SecurityToGroup::from_id("v2c_-_public").unwrap()
        };
        assert_eq!(
            SecurityToGroup::set(&state).unwrap(),
            vec!["set snmp v3 vacm security-to-group security-model v2c security-name public group readers"]
        );
        let keys = SecurityToGroup::from_id("v2c_-_public").unwrap();
        assert_eq!(
            SecurityToGroup::parse(&keys, "set group readers\n").unwrap(),
            state
        );
    }

    #[test]
    fn model_is_checked() {
        let state = SecurityToGroupState {
            group: new_str("readers"),
            ..SecurityToGroup::from_id("v3_-_public").unwrap()
        };
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 1);
    }
}

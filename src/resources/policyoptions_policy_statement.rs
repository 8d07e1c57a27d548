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
use tf_provider::value::{Value, ValueBool, ValueList, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Schema};

use crate::adapter::JunosResource;
use crate::junos::{config_lines, cut_prefix, expect_fields, parse_number, quote, trim_quotes, Session};
use crate::schema::{
    block, block_list, id, optional_bool, optional_number, optional_string, optional_string_set,
    optional_strings, required_number, required_string, resource_schema,
};
use crate::diag;
use crate::utils::{
    block_by_key_mut, duplicate, has_items, known_mut, missing, new_number, new_str, push_str,
    single_block_mut, validate_cidr, validate_name, validate_one_of, validate_single_block,
    value_blocks, value_bool, value_number, value_str, value_strings, NameFormat, WithSchema,
    WithValidate,
};

const ROUTE_FILTER_OPTIONS: &[&str] = &[
    "address-mask",
    "exact",
    "longer",
    "orlonger",
    "prefix-length-range",
    "through",
    "upto",
];
const ROUTE_FILTER_OPTIONS_WITH_VALUE: &[&str] =
    &["address-mask", "prefix-length-range", "through", "upto"];

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyStatementState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub add_it_to_forwarding_table_export: ValueBool,
    pub dynamic_db: ValueBool,
    pub from: ValueList<Value<PolicyFrom<'a>>>,
    pub then: ValueList<Value<PolicyThen<'a>>>,
    pub to: ValueList<Value<PolicyTo<'a>>>,
    pub term: ValueList<Value<PolicyTerm<'a>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTerm<'a> {
    pub name: ValueString<'a>,
    pub from: ValueList<Value<PolicyFrom<'a>>>,
    pub then: ValueList<Value<PolicyThen<'a>>>,
    pub to: ValueList<Value<PolicyTo<'a>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyFrom<'a> {
    pub aggregate_contributor: ValueBool,
    pub bgp_as_path: ValueList<ValueString<'a>>,
    pub bgp_community: ValueList<ValueString<'a>>,
    pub bgp_origin: ValueString<'a>,
    pub family: ValueString<'a>,
    pub interface: ValueList<ValueString<'a>>,
    pub local_preference: ValueNumber,
    pub metric: ValueNumber,
    pub neighbor: ValueList<ValueString<'a>>,
    pub next_hop: ValueList<ValueString<'a>>,
    pub ospf_area: ValueString<'a>,
    pub policy: ValueList<ValueString<'a>>,
    pub preference: ValueNumber,
    pub prefix_list: ValueList<ValueString<'a>>,
    pub protocol: ValueList<ValueString<'a>>,
    pub route_filter: ValueList<Value<RouteFilter<'a>>>,
    pub route_type: ValueString<'a>,
    pub routing_instance: ValueString<'a>,
    pub tag: ValueNumber,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteFilter<'a> {
    pub route: ValueString<'a>,
    pub option: ValueString<'a>,
    pub option_value: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyThen<'a> {
    pub action: ValueString<'a>,
    pub as_path_expand: ValueString<'a>,
    pub as_path_prepend: ValueString<'a>,
    pub community: ValueList<Value<ThenCommunity<'a>>>,
    pub default_action: ValueString<'a>,
    pub load_balance: ValueString<'a>,
    pub local_preference: ValueList<Value<ThenValue<'a>>>,
    pub metric: ValueList<Value<ThenValue<'a>>>,
    pub next: ValueString<'a>,
    pub next_hop: ValueString<'a>,
    pub origin: ValueString<'a>,
    pub preference: ValueList<Value<ThenValue<'a>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThenCommunity<'a> {
    pub action: ValueString<'a>,
    pub value: ValueString<'a>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThenValue<'a> {
    pub action: ValueString<'a>,
    pub value: ValueNumber,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTo<'a> {
    pub bgp_as_path: ValueList<ValueString<'a>>,
    pub bgp_community: ValueList<ValueString<'a>>,
    pub bgp_origin: ValueString<'a>,
    pub family: ValueString<'a>,
    pub interface: ValueList<ValueString<'a>>,
    pub local_preference: ValueNumber,
    pub metric: ValueNumber,
    pub neighbor: ValueList<ValueString<'a>>,
    pub next_hop: ValueList<ValueString<'a>>,
    pub ospf_area: ValueString<'a>,
    pub policy: ValueList<ValueString<'a>>,
    pub preference: ValueNumber,
    pub protocol: ValueList<ValueString<'a>>,
    pub routing_instance: ValueString<'a>,
}

fn from_block() -> Block {
    let route_filter = block(
        "Routes to match",
        map! {
            "route" => required_string("IP address"),
            "option" => required_string("Mask option"),
            "option_value" => optional_string("For options that need an argument"),
        },
        map! {},
    );
    block(
        "Conditions to match the source of a route",
        map! {
            "aggregate_contributor" => optional_bool("Match more specifics of an aggregate"),
            "bgp_as_path" => optional_string_set("Name of AS path regular expression"),
            "bgp_community" => optional_string_set("BGP community"),
            "bgp_origin" => optional_string("BGP origin attribute"),
            "family" => optional_string("IP family"),
            "interface" => optional_string_set("Interface name or address"),
            "local_preference" => optional_number("Local preference associated with a route"),
            "metric" => optional_number("Metric value"),
            "neighbor" => optional_string_set("Neighboring router"),
            "next_hop" => optional_string_set("Next-hop router"),
            "ospf_area" => optional_string("OSPF area identifier"),
            "policy" => optional_strings("Name of policy to evaluate"),
            "preference" => optional_number("Preference value"),
            "prefix_list" => optional_string_set("Prefix-lists of routes to match"),
            "protocol" => optional_string_set("Protocol from which route was learned"),
            "route_type" => optional_string("Route type"),
            "routing_instance" => optional_string("Routing protocol instance"),
            "tag" => optional_number("Tag string"),
        },
        map! {
            "route_filter" => block_list(route_filter),
        },
    )
}

fn then_block() -> Block {
    let community = block(
        "BGP community properties associated with a route",
        map! {
            "action" => required_string("Action on BGP community"),
            "value" => required_string("Value for action"),
        },
        map! {},
    );
    let value = |description: &str| {
        block(
            description,
            map! {
                "action" => required_string("Action on the value (add, subtract or none)"),
                "value" => required_number("Value for action"),
            },
            map! {},
        )
    };
    block(
        "Actions to take if 'from' and 'to' conditions match",
        map! {
            "action" => optional_string("Action accept or reject"),
            "as_path_expand" => optional_string("Prepend AS numbers prior to adding local-as"),
            "as_path_prepend" => optional_string("Prepend AS numbers to an AS path"),
            "default_action" => optional_string("Set default policy action"),
            "load_balance" => optional_string("Type of load balancing in forwarding table"),
            "next" => optional_string("Skip to next `policy` or `term`"),
            "next_hop" => optional_string("Set the address of the next-hop router"),
            "origin" => optional_string("BGP path origin"),
        },
        map! {
            "community" => block_list(community),
            "local_preference" => block_list(value("Set local preference")),
            "metric" => block_list(value("Set metric")),
            "preference" => block_list(value("Set preference")),
        },
    )
}

fn to_block() -> Block {
    block(
        "Conditions to match the destination of a route",
        map! {
            "bgp_as_path" => optional_string_set("Name of AS path regular expression"),
            "bgp_community" => optional_string_set("BGP community"),
            "bgp_origin" => optional_string("BGP origin attribute"),
            "family" => optional_string("IP family"),
            "interface" => optional_string_set("Interface name or address"),
            "local_preference" => optional_number("Local preference associated with a route"),
            "metric" => optional_number("Metric value"),
            "neighbor" => optional_string_set("Neighboring router"),
            "next_hop" => optional_string_set("Next-hop router"),
            "ospf_area" => optional_string("OSPF area identifier"),
            "policy" => optional_strings("Name of policy to evaluate"),
            "preference" => optional_number("Preference value"),
            "protocol" => optional_string_set("Protocol from which route was learned"),
            "routing_instance" => optional_string("Routing protocol instance"),
        },
        map! {},
    )
}

impl<'a> WithSchema for PolicyStatementState<'a> {
    fn schema() -> Schema {
        let term = block(
            "For each policy term",
            map! {
                "name" => required_string("Name of term"),
            },
            map! {
                "from" => block_list(from_block()),
                "then" => block_list(then_block()),
                "to" => block_list(to_block()),
            },
        );
        resource_schema(block(
            "Provides a routing policy resource",
            map! {
                "id" => id("<name>"),
                "name" => required_string("Name to identify the policy"),
                "add_it_to_forwarding_table_export" => optional_bool(
                    "Add the policy to `routing-options forwarding-table export`"
                ),
                "dynamic_db" => optional_bool("Object may exist in dynamic database"),
            },
            map! {
                "from" => block_list(from_block()),
                "then" => block_list(then_block()),
                "to" => block_list(to_block()),
                "term" => block_list(term),
            },
        ))
    }
}

impl<'a> PolicyFrom<'a> {
    fn is_empty(&self) -> bool {
        !value_bool(&self.aggregate_contributor)
            && [
                &self.bgp_as_path,
                &self.bgp_community,
                &self.interface,
                &self.neighbor,
                &self.next_hop,
                &self.policy,
                &self.prefix_list,
                &self.protocol,
            ]
            .iter()
            .all(|list| !has_items(*list))
            && !has_items(&self.route_filter)
            && [
                &self.bgp_origin,
                &self.family,
                &self.ospf_area,
                &self.route_type,
                &self.routing_instance,
            ]
            .iter()
            .all(|value| value_str(value).is_none())
            && [&self.local_preference, &self.metric, &self.preference, &self.tag]
                .iter()
                .all(|value| value_number(value).is_none())
    }

    fn set(&self, set_prefix: &str, lines: &mut Vec<String>) {
        let set_prefix = format!("{set_prefix}from ");
        if value_bool(&self.aggregate_contributor) {
            lines.push(format!("{set_prefix}aggregate-contributor"));
        }
        for (statement, list) in [
            ("as-path", &self.bgp_as_path),
            ("community", &self.bgp_community),
            ("interface", &self.interface),
            ("neighbor", &self.neighbor),
            ("next-hop", &self.next_hop),
            ("policy", &self.policy),
            ("prefix-list", &self.prefix_list),
            ("protocol", &self.protocol),
        ] {
            for value in value_strings(list) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        for (statement, value) in [
            ("origin", &self.bgp_origin),
            ("family", &self.family),
            ("area", &self.ospf_area),
            ("route-type", &self.route_type),
            ("instance", &self.routing_instance),
        ] {
            if let Some(value) = value_str(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        for (statement, value) in [
            ("local-preference", &self.local_preference),
            ("metric", &self.metric),
            ("preference", &self.preference),
            ("tag", &self.tag),
        ] {
            if let Some(value) = value_number(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        for route_filter in value_blocks(&self.route_filter) {
            let mut line = format!(
                "{set_prefix}route-filter {} {}",
                value_str(&route_filter.route).unwrap_or_default(),
                value_str(&route_filter.option).unwrap_or_default(),
            );
            if let Some(option_value) = value_str(&route_filter.option_value) {
                line.push(' ');
                line.push_str(option_value);
            }
            lines.push(line);
        }
    }

    fn read(&mut self, item: &str) -> anyhow::Result<()> {
        let mut item = item;
        if item == "aggregate-contributor" {
            self.aggregate_contributor = Value::Value(true);
            return Ok(());
        }
        if cut_prefix(&mut item, "route-filter ") {
            let fields = expect_fields(item, 2, "route-filter")?;
            let route_filter = RouteFilter {
                route: new_str(fields[0]),
                option: new_str(fields[1]),
                option_value: if fields.len() > 2 {
                    new_str(&fields[2..].join(" "))
                } else {
                    Value::Null
                },
            };
            known_mut(&mut self.route_filter).push(Value::Value(route_filter));
            return Ok(());
        }
        for (statement, list) in [
            ("as-path ", &mut self.bgp_as_path),
            ("community ", &mut self.bgp_community),
            ("interface ", &mut self.interface),
            ("neighbor ", &mut self.neighbor),
            ("next-hop ", &mut self.next_hop),
            ("policy ", &mut self.policy),
            ("prefix-list ", &mut self.prefix_list),
            ("protocol ", &mut self.protocol),
        ] {
            if cut_prefix(&mut item, statement) {
                push_str(list, item);
                return Ok(());
            }
        }
        for (statement, value) in [
            ("origin ", &mut self.bgp_origin),
            ("family ", &mut self.family),
            ("area ", &mut self.ospf_area),
            ("route-type ", &mut self.route_type),
            ("instance ", &mut self.routing_instance),
        ] {
            if cut_prefix(&mut item, statement) {
                *value = new_str(item);
                return Ok(());
            }
        }
        for (statement, value) in [
            ("local-preference ", &mut self.local_preference),
            ("metric ", &mut self.metric),
            ("preference ", &mut self.preference),
            ("tag ", &mut self.tag),
        ] {
            if cut_prefix(&mut item, statement) {
                *value = new_number(parse_number(item)?);
                return Ok(());
            }
        }
        Ok(())
    }
}

impl<'a> WithValidate for PolicyFrom<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if self.is_empty() {
            missing(
                diags,
                attr_path.clone(),
                "at least one attribute must be specified in `from` block",
            );
        }
        self.route_filter
            .validate(diags, attr_path.attribute("route_filter"));
    }
}

impl<'a> WithValidate for RouteFilter<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Some(route) = value_str(&self.route) {
            validate_cidr(diags, route, attr_path.clone().attribute("route"));
        }
        validate_one_of(
            diags,
            &self.option,
            attr_path.clone().attribute("option"),
            ROUTE_FILTER_OPTIONS,
        );
        if let Some(option) = value_str(&self.option) {
            let needs_value = ROUTE_FILTER_OPTIONS_WITH_VALUE.contains(&option);
            match (needs_value, value_str(&self.option_value).is_some()) {
                (true, false) => missing(
                    diags,
                    attr_path.attribute("option_value"),
                    format!("`option_value` must be specified with option {option:?}"),
                ),
                (false, true) => diags.error(
                    diag::CONFLICT_CONFIG,
                    format!("`option_value` cannot be specified with option {option:?}"),
                    attr_path.attribute("option_value"),
                ),
                _ => (),
            }
        }
    }
}

impl<'a> ThenValue<'a> {
    fn set(&self, line_prefix: &str, lines: &mut Vec<String>) {
        let Some(value) = value_number(&self.value) else {
            return;
        };
        match value_str(&self.action) {
            Some(action @ ("add" | "subtract")) => {
                lines.push(format!("{line_prefix} {action} {value}"));
            }
            _ => lines.push(format!("{line_prefix} {value}")),
        }
    }

    fn read(&mut self, item: &str, what: &str) -> anyhow::Result<()> {
        let fields = expect_fields(item, 1, what)?;
        match fields[0] {
            action @ ("add" | "subtract") => {
                let fields = expect_fields(item, 2, what)?;
                self.action = new_str(action);
                self.value = new_number(parse_number(fields[1])?);
            }
            value => {
                self.action = new_str("none");
                self.value = new_number(parse_number(value)?);
            }
        }
        Ok(())
    }
}

impl<'a> WithValidate for ThenValue<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_one_of(
            diags,
            &self.action,
            attr_path.attribute("action"),
            &["add", "subtract", "none"],
        );
    }
}

impl<'a> WithValidate for ThenCommunity<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_one_of(
            diags,
            &self.action,
            attr_path.attribute("action"),
            &["add", "delete", "set"],
        );
    }
}

impl<'a> PolicyThen<'a> {
    fn is_empty(&self) -> bool {
        [
            &self.action,
            &self.as_path_expand,
            &self.as_path_prepend,
            &self.default_action,
            &self.load_balance,
            &self.next,
            &self.next_hop,
            &self.origin,
        ]
        .iter()
        .all(|value| value_str(value).is_none())
            && !has_items(&self.community)
            && [&self.local_preference, &self.metric, &self.preference]
                .iter()
                .all(|list| !has_items(*list))
    }

    fn set(&self, set_prefix: &str, lines: &mut Vec<String>) {
        let set_prefix = format!("{set_prefix}then ");
        if let Some(action) = value_str(&self.action) {
            lines.push(format!("{set_prefix}{action}"));
        }
        if let Some(as_path_expand) = value_str(&self.as_path_expand) {
            lines.push(format!("{set_prefix}as-path-expand {as_path_expand}"));
        }
        if let Some(as_path_prepend) = value_str(&self.as_path_prepend) {
            lines.push(format!("{set_prefix}as-path-prepend {}", quote(as_path_prepend)));
        }
        for community in value_blocks(&self.community) {
            lines.push(format!(
                "{set_prefix}community {} {}",
                value_str(&community.action).unwrap_or_default(),
                value_str(&community.value).unwrap_or_default(),
            ));
        }
        for (statement, value) in [
            ("default-action", &self.default_action),
            ("load-balance", &self.load_balance),
            ("next", &self.next),
            ("next-hop", &self.next_hop),
            ("origin", &self.origin),
        ] {
            if let Some(value) = value_str(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        for (statement, list) in [
            ("local-preference", &self.local_preference),
            ("metric", &self.metric),
            ("preference", &self.preference),
        ] {
            if let Some(value) = value_blocks(list).next() {
                value.set(&format!("{set_prefix}{statement}"), lines);
            }
        }
    }

    fn read(&mut self, item: &str) -> anyhow::Result<()> {
        let mut item = item;
        if item == "accept" || item == "reject" {
            self.action = new_str(item);
        } else if cut_prefix(&mut item, "as-path-expand ") {
            self.as_path_expand = new_str(item);
        } else if cut_prefix(&mut item, "as-path-prepend ") {
            self.as_path_prepend = new_str(trim_quotes(item));
        } else if cut_prefix(&mut item, "community ") {
            let fields = expect_fields(item, 2, "community")?;
            known_mut(&mut self.community).push(Value::Value(ThenCommunity {
                action: new_str(fields[0]),
                value: new_str(fields[1]),
            }));
        } else if cut_prefix(&mut item, "default-action ") {
            self.default_action = new_str(item);
        } else if cut_prefix(&mut item, "load-balance ") {
            self.load_balance = new_str(item);
        } else if cut_prefix(&mut item, "next-hop ") {
            self.next_hop = new_str(item);
        } else if cut_prefix(&mut item, "next ") {
            self.next = new_str(item);
        } else if cut_prefix(&mut item, "origin ") {
            self.origin = new_str(item);
        } else if cut_prefix(&mut item, "local-preference ") {
            single_block_mut(&mut self.local_preference).read(item, "local-preference")?;
        } else if cut_prefix(&mut item, "metric ") {
            single_block_mut(&mut self.metric).read(item, "metric")?;
        } else if cut_prefix(&mut item, "preference ") {
            single_block_mut(&mut self.preference).read(item, "preference")?;
        }
        Ok(())
    }
}

impl<'a> WithValidate for PolicyThen<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if self.is_empty() {
            missing(
                diags,
                attr_path.clone(),
                "at least one attribute must be specified in `then` block",
            );
        }
        validate_one_of(
            diags,
            &self.action,
            attr_path.clone().attribute("action"),
            &["accept", "reject"],
        );
        validate_one_of(
            diags,
            &self.default_action,
            attr_path.clone().attribute("default_action"),
            &["accept", "reject"],
        );
        validate_one_of(
            diags,
            &self.load_balance,
            attr_path.clone().attribute("load_balance"),
            &["consistent-hash", "per-packet"],
        );
        validate_one_of(
            diags,
            &self.next,
            attr_path.clone().attribute("next"),
            &["policy", "term"],
        );
        self.community
            .validate(diags, attr_path.clone().attribute("community"));
        for (name, list) in [
            ("local_preference", &self.local_preference),
            ("metric", &self.metric),
            ("preference", &self.preference),
        ] {
            validate_single_block(diags, list, attr_path.clone().attribute(name));
            list.validate(diags, attr_path.clone().attribute(name));
        }
    }
}

impl<'a> PolicyTo<'a> {
    fn is_empty(&self) -> bool {
        [
            &self.bgp_as_path,
            &self.bgp_community,
            &self.interface,
            &self.neighbor,
            &self.next_hop,
            &self.policy,
            &self.protocol,
        ]
        .iter()
        .all(|list| !has_items(*list))
            && [
                &self.bgp_origin,
                &self.family,
                &self.ospf_area,
                &self.routing_instance,
            ]
            .iter()
            .all(|value| value_str(value).is_none())
            && [&self.local_preference, &self.metric, &self.preference]
                .iter()
                .all(|value| value_number(value).is_none())
    }

    fn set(&self, set_prefix: &str, lines: &mut Vec<String>) {
        let set_prefix = format!("{set_prefix}to ");
        for (statement, list) in [
            ("as-path", &self.bgp_as_path),
            ("community", &self.bgp_community),
            ("interface", &self.interface),
            ("neighbor", &self.neighbor),
            ("next-hop", &self.next_hop),
            ("policy", &self.policy),
            ("protocol", &self.protocol),
        ] {
            for value in value_strings(list) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        for (statement, value) in [
            ("origin", &self.bgp_origin),
            ("family", &self.family),
            ("area", &self.ospf_area),
            ("instance", &self.routing_instance),
        ] {
            if let Some(value) = value_str(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
        for (statement, value) in [
            ("local-preference", &self.local_preference),
            ("metric", &self.metric),
            ("preference", &self.preference),
        ] {
            if let Some(value) = value_number(value) {
                lines.push(format!("{set_prefix}{statement} {value}"));
            }
        }
    }

    fn read(&mut self, item: &str) -> anyhow::Result<()> {
        let mut item = item;
        for (statement, list) in [
            ("as-path ", &mut self.bgp_as_path),
            ("community ", &mut self.bgp_community),
            ("interface ", &mut self.interface),
            ("neighbor ", &mut self.neighbor),
            ("next-hop ", &mut self.next_hop),
            ("policy ", &mut self.policy),
            ("protocol ", &mut self.protocol),
        ] {
            if cut_prefix(&mut item, statement) {
                push_str(list, item);
                return Ok(());
            }
        }
        for (statement, value) in [
            ("origin ", &mut self.bgp_origin),
            ("family ", &mut self.family),
            ("area ", &mut self.ospf_area),
            ("instance ", &mut self.routing_instance),
        ] {
            if cut_prefix(&mut item, statement) {
                *value = new_str(item);
                return Ok(());
            }
        }
        for (statement, value) in [
            ("local-preference ", &mut self.local_preference),
            ("metric ", &mut self.metric),
            ("preference ", &mut self.preference),
        ] {
            if cut_prefix(&mut item, statement) {
                *value = new_number(parse_number(item)?);
                return Ok(());
            }
        }
        Ok(())
    }
}

impl<'a> WithValidate for PolicyTo<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if self.is_empty() {
            missing(
                diags,
                attr_path,
                "at least one attribute must be specified in `to` block",
            );
        }
    }
}

/// Validate the from/then/to blocks shared by the policy and its terms
fn validate_conditions(
    diags: &mut Diagnostics,
    attr_path: &AttributePath,
    from: &ValueList<Value<PolicyFrom>>,
    then: &ValueList<Value<PolicyThen>>,
    to: &ValueList<Value<PolicyTo>>,
) {
    validate_single_block(diags, from, attr_path.clone().attribute("from"));
    validate_single_block(diags, then, attr_path.clone().attribute("then"));
    validate_single_block(diags, to, attr_path.clone().attribute("to"));
    from.validate(diags, attr_path.clone().attribute("from"));
    then.validate(diags, attr_path.clone().attribute("then"));
    to.validate(diags, attr_path.clone().attribute("to"));
}

/// Write the from/then/to blocks shared by the policy and its terms
fn set_conditions(
    set_prefix: &str,
    lines: &mut Vec<String>,
    from: &ValueList<Value<PolicyFrom>>,
    then: &ValueList<Value<PolicyThen>>,
    to: &ValueList<Value<PolicyTo>>,
) {
    if let Some(from) = value_blocks(from).next() {
        from.set(set_prefix, lines);
    }
    if let Some(then) = value_blocks(then).next() {
        then.set(set_prefix, lines);
    }
    if let Some(to) = value_blocks(to).next() {
        to.set(set_prefix, lines);
    }
}

/// Read a from/then/to statement, returns false if `item` is something else
fn read_conditions<'a>(
    item: &str,
    from: &mut ValueList<Value<PolicyFrom<'a>>>,
    then: &mut ValueList<Value<PolicyThen<'a>>>,
    to: &mut ValueList<Value<PolicyTo<'a>>>,
) -> anyhow::Result<bool> {
    let mut item = item;
    if cut_prefix(&mut item, "from ") {
        single_block_mut(from).read(item)?;
    } else if cut_prefix(&mut item, "then ") {
        single_block_mut(then).read(item)?;
    } else if cut_prefix(&mut item, "to ") {
        single_block_mut(to).read(item)?;
    } else {
        return Ok(false);
    }
    Ok(true)
}

impl<'a> WithValidate for PolicyTerm<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            64,
            NameFormat::Word,
        );
        validate_conditions(diags, &attr_path, &self.from, &self.then, &self.to);
    }
}

impl<'a> WithValidate for PolicyStatementState<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(
            diags,
            &self.name,
            attr_path.clone().attribute("name"),
            250,
            NameFormat::Default,
        );
        validate_conditions(diags, &attr_path, &self.from, &self.then, &self.to);

        let mut names = Vec::new();
        for (i, term) in value_blocks(&self.term).enumerate() {
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

/// `policy-options policy-statement <name>`
#[derive(Debug, Default, Clone, Copy)]
pub struct PolicyStatement;

#[async_trait]
impl JunosResource for PolicyStatement {
    const TYPE_NAME: &'static str = "junos_policyoptions_policy_statement";
    const KEYS: &'static [&'static str] = &["name"];
    const ID_FORMAT: &'static str = "<name>";

    type State<'a> = PolicyStatementState<'a>;

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn id(state: &Self::State<'_>) -> String {
        value_str(&state.name).unwrap_or_default().to_owned()
    }

    fn from_id<'a>(id: &str) -> Option<Self::State<'a>> {
        (!id.is_empty()).then(|| PolicyStatementState {
            name: new_str(id),
            ..Default::default()
        })
    }

    fn describe(state: &Self::State<'_>) -> String {
        format!(
            "policy-options policy-statement {:?}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn config_path(state: &Self::State<'_>) -> String {
        format!(
            "policy-options policy-statement {}",
            value_str(&state.name).unwrap_or_default()
        )
    }

    fn set(state: &Self::State<'_>) -> anyhow::Result<Vec<String>> {
        let name = value_str(&state.name).unwrap_or_default();
        let set_prefix = format!("set {} ", Self::config_path(state));
        let mut lines = vec![set_prefix.trim_end().to_owned()];

        if value_bool(&state.add_it_to_forwarding_table_export) {
            lines.push(format!("set routing-options forwarding-table export {name}"));
        }
        if value_bool(&state.dynamic_db) {
            lines.push(format!("{set_prefix}dynamic-db"));
        }
        set_conditions(&set_prefix, &mut lines, &state.from, &state.then, &state.to);
        for term in value_blocks(&state.term) {
            let term_prefix = format!(
                "{set_prefix}term {} ",
                value_str(&term.name).unwrap_or_default()
            );
            lines.push(term_prefix.trim_end().to_owned());
            set_conditions(&term_prefix, &mut lines, &term.from, &term.then, &term.to);
        }

        Ok(lines)
    }

    fn parse<'a>(keys: &Self::State<'a>, output: &str) -> anyhow::Result<Self::State<'a>> {
        let mut state = PolicyStatementState {
            name: keys.name.clone(),
            ..Default::default()
        };

        for item in config_lines(output) {
            let mut item = item;
            if item == "dynamic-db" {
                state.dynamic_db = Value::Value(true);
            } else if cut_prefix(&mut item, "term ") {
                let (name, rest) = item.split_once(' ').unwrap_or((item, ""));
                let term = block_by_key_mut(
                    &mut state.term,
                    |term| value_str(&term.name) == Some(name),
                    || PolicyTerm {
                        name: new_str(name),
                        ..Default::default()
                    },
                );
                read_conditions(rest, &mut term.from, &mut term.then, &mut term.to)?;
            } else {
                read_conditions(item, &mut state.from, &mut state.then, &mut state.to)?;
            }
        }

        Ok(state)
    }

    fn del(state: &Self::State<'_>) -> Vec<String> {
        let mut lines = vec![format!("delete {}", Self::config_path(state))];
        if value_bool(&state.add_it_to_forwarding_table_export) {
            lines.push(format!(
                "delete routing-options forwarding-table export {}",
                value_str(&state.name).unwrap_or_default()
            ));
        }
        lines
    }

    async fn read_more<'a>(
        session: &Session<'_>,
        state: &mut Self::State<'a>,
    ) -> anyhow::Result<()> {
        let output = session
            .show_config("routing-options forwarding-table")
            .await?;
        let export = format!("export {}", value_str(&state.name).unwrap_or_default());
        if config_lines(&output).any(|line| line == export) {
            state.add_it_to_forwarding_table_export = Value::Value(true);
        }
        Ok(())
    }
}

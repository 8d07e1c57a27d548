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

//! Shorthands to describe resource schemas

use std::collections::HashMap;

use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};

pub(crate) fn attribute(
    attr_type: AttributeType,
    constraint: AttributeConstraint,
    description: &str,
) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

pub(crate) fn id(format: &str) -> Attribute {
    attribute(
        AttributeType::String,
        AttributeConstraint::Computed,
        &format!("An identifier for the resource with format `{format}`"),
    )
}

pub(crate) fn required_string(description: &str) -> Attribute {
    attribute(AttributeType::String, AttributeConstraint::Required, description)
}

pub(crate) fn optional_string(description: &str) -> Attribute {
    attribute(AttributeType::String, AttributeConstraint::Optional, description)
}

pub(crate) fn sensitive_string(description: &str) -> Attribute {
    Attribute {
        sensitive: true,
        ..optional_string(description)
    }
}

pub(crate) fn optional_bool(description: &str) -> Attribute {
    attribute(AttributeType::Bool, AttributeConstraint::Optional, description)
}

pub(crate) fn optional_number(description: &str) -> Attribute {
    attribute(AttributeType::Number, AttributeConstraint::Optional, description)
}

pub(crate) fn required_number(description: &str) -> Attribute {
    attribute(AttributeType::Number, AttributeConstraint::Required, description)
}

/// Ordered list of strings
pub(crate) fn optional_strings(description: &str) -> Attribute {
    attribute(
        AttributeType::List(Box::new(AttributeType::String)),
        AttributeConstraint::Optional,
        description,
    )
}

pub(crate) fn optional_string_set(description: &str) -> Attribute {
    attribute(
        AttributeType::Set(Box::new(AttributeType::String)),
        AttributeConstraint::Optional,
        description,
    )
}

pub(crate) fn block(
    description: &str,
    attributes: HashMap<String, Attribute>,
    blocks: HashMap<String, NestedBlock>,
) -> Block {
    Block {
        attributes,
        blocks,
        description: Description::plain(description),
        ..Default::default()
    }
}

/// Blocks are always lists; single blocks are validated to have at most one element
pub(crate) fn block_list(block: Block) -> NestedBlock {
    NestedBlock::List(block)
}

pub(crate) fn resource_schema(block: Block) -> Schema {
    Schema { version: 1, block }
}

/// Data source flavour of a resource schema: `keys` are required, everything
/// else is computed and nested blocks become lists of objects.
pub(crate) fn computed_schema(schema: Schema, keys: &[&str]) -> Schema {
    Schema {
        version: schema.version,
        block: computed_block(schema.block, keys),
    }
}

fn computed_block(block: Block, keys: &[&str]) -> Block {
    let mut attributes: HashMap<String, Attribute> = block
        .attributes
        .into_iter()
        .map(|(name, mut attr)| {
            attr.constraint = if keys.contains(&name.as_str()) {
                AttributeConstraint::Required
            } else {
                AttributeConstraint::Computed
            };
            (name, attr)
        })
        .collect();

    for (name, nested) in block.blocks {
        let NestedBlock::List(inner) = nested else {
            continue;
        };
        attributes.insert(
            name,
            Attribute {
                attr_type: AttributeType::List(Box::new(object_type(&inner))),
                description: inner.description.clone(),
                constraint: AttributeConstraint::Computed,
                ..Default::default()
            },
        );
    }

    Block {
        attributes,
        blocks: HashMap::new(),
        ..block
    }
}

fn object_type(block: &Block) -> AttributeType {
    let mut fields: HashMap<String, AttributeType> = block
        .attributes
        .iter()
        .map(|(name, attr)| (name.clone(), attr.attr_type.clone()))
        .collect();
    for (name, nested) in &block.blocks {
        if let NestedBlock::List(inner) = nested {
            fields.insert(
                name.clone(),
                AttributeType::List(Box::new(object_type(inner))),
            );
        }
    }
    AttributeType::Object(fields)
}

#[cfg(test)]
mod tests {
    use tf_provider::map;

    use super::*;

    #[test]
    fn computed_schema_keeps_keys_required() {
        let schema = resource_schema(block(
            "test",
            map! {
                "id" => id("<name>"),
                "name" => required_string("name"),
                "protocol" => optional_string("protocol"),
            },
            map! {
                "term" => block_list(block("term", map! { "name" => required_string("name") }, map! {})),
            },
        ));
        let schema = computed_schema(schema, &["name"]);

        let attributes = &schema.block.attributes;
        assert!(schema.block.blocks.is_empty());
        assert_eq!(attributes["name"].constraint, AttributeConstraint::Required);
        assert_eq!(attributes["id"].constraint, AttributeConstraint::Computed);
        assert_eq!(attributes["protocol"].constraint, AttributeConstraint::Computed);
        assert_eq!(
            attributes["term"].attr_type,
            AttributeType::List(Box::new(AttributeType::Object(map! {
                "name" => AttributeType::String,
            })))
        );
    }
}

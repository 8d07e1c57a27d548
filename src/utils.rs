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

use std::borrow::Cow;
use std::cell::RefCell;
use std::net::IpAddr;

use lazy_static::lazy_static;
use regex::Regex;
use tf_provider::value::{Value, ValueBool, ValueList, ValueNumber, ValueString};
use tf_provider::{AttributePath, Diagnostics, Schema};

use crate::diag;

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

pub(crate) trait WithValidate {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath);
}

impl<T: WithValidate> WithValidate for ValueList<Value<T>> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(items) = self {
            for (i, item) in items.iter().enumerate() {
                if let Value::Value(item) = item {
                    item.validate(diags, attr_path.clone().index(i as i64));
                }
            }
        }
    }
}

/// Known and non-empty string
pub(crate) fn value_str<'s>(value: &'s ValueString<'_>) -> Option<&'s str> {
    match value {
        Value::Value(s) if !s.is_empty() => Some(s.as_ref()),
        _ => None,
    }
}

pub(crate) fn value_bool(value: &ValueBool) -> bool {
    matches!(value, Value::Value(true))
}

pub(crate) fn value_number(value: &ValueNumber) -> Option<i64> {
    match value {
        Value::Value(n) => Some(*n),
        _ => None,
    }
}

/// Known and non-empty strings of a list
pub(crate) fn value_strings<'s, 'a: 's>(
    value: &'s ValueList<ValueString<'a>>,
) -> impl Iterator<Item = &'s str> + 's {
    known_items(value).filter_map(|s| (!s.is_empty()).then_some(s.as_ref()))
}

/// Known blocks of a block list
pub(crate) fn value_blocks<T>(value: &ValueList<Value<T>>) -> impl Iterator<Item = &T> {
    known_items(value)
}

pub(crate) fn first_block<T>(value: &ValueList<Value<T>>) -> Option<&T> {
    value_blocks(value).next()
}

fn known_items<T>(value: &ValueList<Value<T>>) -> impl Iterator<Item = &T> {
    let items = match value {
        Value::Value(items) => items.as_slice(),
        _ => &[],
    };
    items.iter().filter_map(|item| match item {
        Value::Value(item) => Some(item),
        _ => None,
    })
}

/// Whether a list has at least one element, known or not
pub(crate) fn has_items<T>(value: &ValueList<T>) -> bool {
    match value {
        Value::Value(items) => !items.is_empty(),
        Value::Unknown => true,
        Value::Null => false,
    }
}

pub(crate) fn new_str<'a>(value: &str) -> ValueString<'a> {
    Value::Value(Cow::Owned(value.to_owned()))
}

pub(crate) fn new_number(value: i64) -> ValueNumber {
    Value::Value(value)
}

/// Make `value` known, defaulting it if it was null or unknown
pub(crate) fn known_mut<T: Default>(value: &mut Value<T>) -> &mut T {
    if !matches!(value, Value::Value(_)) {
        *value = Value::Value(T::default());
    }
    match value {
        Value::Value(inner) => inner,
        _ => unreachable!("value has just been set"),
    }
}

pub(crate) fn push_str<'a>(list: &mut ValueList<ValueString<'a>>, value: &str) {
    known_mut(list).push(new_str(value));
}

/// The block of a list limited to a single element, created on demand
pub(crate) fn single_block_mut<T: Default>(list: &mut ValueList<Value<T>>) -> &mut T {
    let items = known_mut(list);
    if items.is_empty() {
        items.push(Value::Value(T::default()));
    }
    known_mut(&mut items[0])
}

/// The first block matching `matches`, pushed from `init` when missing
pub(crate) fn block_by_key_mut<T, M, I>(list: &mut ValueList<Value<T>>, matches: M, init: I) -> &mut T
where
    T: Default,
    M: Fn(&T) -> bool,
    I: FnOnce() -> T,
{
    let items = known_mut(list);
    let index = match items
        .iter()
        .position(|item| matches!(item, Value::Value(item) if matches(item)))
    {
        Some(index) => index,
        None => {
            items.push(Value::Value(init()));
            items.len() - 1
        }
    };
    known_mut(&mut items[index])
}

lazy_static! {
    static ref DEFAULT_NAME_FORMAT: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    static ref ADDRESS_NAME_FORMAT: Regex = Regex::new(r"^[a-zA-Z0-9._:/-]+$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameFormat {
    /// letters, digits, dashes and underscores
    Default,
    /// [`NameFormat::Default`] plus dots, colons and slashes
    Address,
    /// anything without quotes or spaces
    Word,
    /// anything without quotes, for names quoted in the configuration path
    Any,
}

pub(crate) fn validate_name(
    diags: &mut Diagnostics,
    value: &ValueString,
    attr_path: AttributePath,
    max_len: usize,
    format: NameFormat,
) {
    let Some(name) = value_str(value) else {
        if matches!(value, Value::Value(_)) {
            diags.error(diag::MISSING_CONFIG, "the value must not be empty", attr_path);
        }
        return;
    };
    if name.len() > max_len {
        diags.error(
            diag::BAD_FORMAT,
            format!("{name:?} is longer than {max_len} characters"),
            attr_path,
        );
        return;
    }
    let valid = match format {
        NameFormat::Default => DEFAULT_NAME_FORMAT.is_match(name),
        NameFormat::Address => ADDRESS_NAME_FORMAT.is_match(name),
        NameFormat::Word => !name.contains(|c: char| c == '"' || c == ' '),
        NameFormat::Any => !name.contains('"'),
    };
    if !valid {
        diags.error(
            diag::BAD_FORMAT,
            format!("{name:?} contains characters not allowed in this name"),
            attr_path,
        );
    }
}

/// Free text written between quotes in a statement
pub(crate) fn validate_text(diags: &mut Diagnostics, value: &ValueString, attr_path: AttributePath) {
    if value_str(value).is_some_and(|text| text.contains('"')) {
        diags.error(
            diag::BAD_FORMAT,
            "the value must not contain double quotes",
            attr_path,
        );
    }
}

pub(crate) fn validate_one_of(
    diags: &mut Diagnostics,
    value: &ValueString,
    attr_path: AttributePath,
    allowed: &[&str],
) {
    if let Some(value) = value_str(value) {
        if !allowed.contains(&value) {
            diags.error(
                diag::BAD_FORMAT,
                format!("{value:?} must be one of: {}", allowed.iter().join_with(", ")),
                attr_path,
            );
        }
    }
}

pub(crate) fn validate_range(
    diags: &mut Diagnostics,
    value: &ValueNumber,
    attr_path: AttributePath,
    min: i64,
    max: i64,
) {
    if let Some(n) = value_number(value) {
        if n < min || n > max {
            diags.error(
                diag::BAD_FORMAT,
                format!("{n} must be between {min} and {max}"),
                attr_path,
            );
        }
    }
}

pub(crate) fn validate_regex(
    diags: &mut Diagnostics,
    value: &ValueString,
    attr_path: AttributePath,
    re: &Regex,
    expected: &str,
) {
    if let Some(value) = value_str(value) {
        if !re.is_match(value) {
            diags.error(
                diag::BAD_FORMAT,
                format!("{value:?} must be {expected}"),
                attr_path,
            );
        }
    }
}

pub(crate) fn is_cidr(value: &str) -> bool {
    let Some((address, length)) = value.split_once('/') else {
        return false;
    };
    let Ok(length) = length.parse::<u8>() else {
        return false;
    };
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => length <= 32,
        Ok(IpAddr::V6(_)) => length <= 128,
        Err(_) => false,
    }
}

pub(crate) fn validate_cidr(diags: &mut Diagnostics, value: &str, attr_path: AttributePath) {
    if !is_cidr(value) {
        diags.error(
            diag::BAD_FORMAT,
            format!("{value:?} is not a valid CIDR network"),
            attr_path,
        );
    }
}

pub(crate) fn validate_ip(diags: &mut Diagnostics, value: &ValueString, attr_path: AttributePath) {
    if let Some(value) = value_str(value) {
        if value.parse::<IpAddr>().is_err() {
            diags.error(
                diag::BAD_FORMAT,
                format!("{value:?} is not a valid IP address"),
                attr_path,
            );
        }
    }
}

/// Reject a block list holding more than one block
pub(crate) fn validate_single_block<T>(
    diags: &mut Diagnostics,
    value: &ValueList<T>,
    attr_path: AttributePath,
) {
    if let Value::Value(items) = value {
        if items.len() > 1 {
            diags.error(
                diag::CONFLICT_CONFIG,
                "at most one block can be specified",
                attr_path,
            );
        }
    }
}

pub(crate) fn conflict(diags: &mut Diagnostics, attr_path: AttributePath, a: &str, b: &str) {
    diags.error(
        diag::CONFLICT_CONFIG,
        format!("`{a}` and `{b}` cannot be configured together"),
        attr_path,
    );
}

pub(crate) fn duplicate(diags: &mut Diagnostics, attr_path: AttributePath, what: &str, key: &str) {
    diags.error(
        diag::DUPLICATE_CONFIG,
        format!("multiple {what} blocks with the same key {key:?}"),
        attr_path,
    );
}

pub(crate) fn missing(diags: &mut Diagnostics, attr_path: AttributePath, detail: impl Into<String>) {
    diags.error(diag::MISSING_CONFIG, detail.into(), attr_path);
}

pub struct DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    iter: RefCell<T>,
    sep: &'a str,
}

pub trait DisplayJoinable {
    type Joiner<'a>;
    fn join_with(self, sep: &str) -> Self::Joiner<'_>;
}

impl<T, I> DisplayJoinable for T
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    type Joiner<'a> = DisplayJoiner<'a, T, I>;

    fn join_with(self, sep: &str) -> Self::Joiner<'_> {
        DisplayJoiner {
            iter: RefCell::new(self),
            sep,
        }
    }
}

impl<'a, T, I> std::fmt::Display for DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sep = "";
        let mut iter = self.iter.try_borrow_mut().or(Err(std::fmt::Error))?;
        for elt in iter.by_ref() {
            f.write_str(sep)?;
            f.write_fmt(format_args!("{elt}"))?;
            sep = self.sep;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joiner() {
        assert_eq!(["a", "b", "c"].iter().join_with(", ").to_string(), "a, b, c");
        assert_eq!(std::iter::empty::<&str>().join_with(", ").to_string(), "");
    }

    #[test]
    fn blocks_are_created_on_demand() {
        let mut list: ValueList<Value<(String, i64)>> = Value::Null;
        block_by_key_mut(&mut list, |b| b.0 == "a", || ("a".to_owned(), 0)).1 = 1;
        block_by_key_mut(&mut list, |b| b.0 == "b", || ("b".to_owned(), 0)).1 = 2;
        block_by_key_mut(&mut list, |b| b.0 == "a", || ("a".to_owned(), 0)).1 += 10;
        let blocks: Vec<_> = value_blocks(&list).cloned().collect();
        assert_eq!(blocks, vec![("a".to_owned(), 11), ("b".to_owned(), 2)]);

        let mut single: ValueList<Value<i64>> = Value::Unknown;
        *single_block_mut(&mut single) += 3;
        *single_block_mut(&mut single) += 3;
        assert_eq!(first_block(&single), Some(&6));
    }

    #[test]
    fn string_helpers() {
        let mut list: ValueList<ValueString> = Value::Null;
        push_str(&mut list, "x");
        push_str(&mut list, "");
        assert_eq!(value_strings(&list).collect::<Vec<_>>(), vec!["x"]);
        assert_eq!(value_str(&new_str("")), None);
        assert_eq!(value_str(&Value::Unknown), None);
        assert!(value_bool(&Value::Value(true)));
        assert!(!value_bool(&Value::Null));
    }

    #[test]
    fn cidr() {
        assert!(is_cidr("192.0.2.0/24"));
        assert!(is_cidr("2001:db8::/32"));
        assert!(!is_cidr("192.0.2.0/33"));
        assert!(!is_cidr("192.0.2.0"));
        assert!(!is_cidr("host/24"));
    }

    #[test]
    fn name_validation() {
        let mut diags = Diagnostics::default();
        validate_name(&mut diags, &new_str("app_1-a"), AttributePath::new("name"), 63, NameFormat::Default);
        assert!(diags.errors.is_empty());
        validate_name(&mut diags, &new_str("app 1"), AttributePath::new("name"), 63, NameFormat::Default);
        validate_name(&mut diags, &new_str(&"a".repeat(64)), AttributePath::new("name"), 63, NameFormat::Default);
        validate_name(&mut diags, &new_str(""), AttributePath::new("name"), 63, NameFormat::Default);
        assert_eq!(diags.errors.len(), 3);
    }

    #[test]
    fn words_and_text() {
        let mut diags = Diagnostics::default();
        validate_name(&mut diags, &new_str("ro view"), AttributePath::new("name"), 32, NameFormat::Any);
        validate_text(&mut diags, &new_str("web app"), AttributePath::new("description"));
        assert!(diags.errors.is_empty());

        validate_name(&mut diags, &new_str("ro view"), AttributePath::new("name"), 32, NameFormat::Word);
        validate_name(&mut diags, &new_str("ro\"view"), AttributePath::new("name"), 32, NameFormat::Word);
        validate_text(&mut diags, &new_str("the \"web\" app"), AttributePath::new("description"));
        assert_eq!(diags.errors.len(), 3);
    }
}

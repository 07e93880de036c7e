// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Label selectors in their string form (`app=nginx,tier in (web,api),!canary`).

use crate::error::{InformerError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

/// A single requirement of a selector
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    Equal(String, String),
    NotEqual(String, String),
    In(String, BTreeSet<String>),
    NotIn(String, BTreeSet<String>),
    Exists(String),
    DoesNotExist(String),
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Requirement::Equal(key, value) => labels.get(key) == Some(value),
            Requirement::NotEqual(key, value) => labels.get(key) != Some(value),
            Requirement::In(key, values) => labels.get(key).is_some_and(|v| values.contains(v)),
            Requirement::NotIn(key, values) => !labels.get(key).is_some_and(|v| values.contains(v)),
            Requirement::Exists(key) => labels.contains_key(key),
            Requirement::DoesNotExist(key) => !labels.contains_key(key),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |values: &BTreeSet<String>| values.iter().cloned().collect::<Vec<_>>().join(",");
        match self {
            Requirement::Equal(key, value) => write!(f, "{key}={value}"),
            Requirement::NotEqual(key, value) => write!(f, "{key}!={value}"),
            Requirement::In(key, values) => write!(f, "{key} in ({})", join(values)),
            Requirement::NotIn(key, values) => write!(f, "{key} notin ({})", join(values)),
            Requirement::Exists(key) => write!(f, "{key}"),
            Requirement::DoesNotExist(key) => write!(f, "!{key}"),
        }
    }
}

/// A conjunction of label requirements. The empty selector matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector(Vec<Requirement>);

impl Selector {
    /// A selector that matches every object
    pub fn everything() -> Self {
        Self::default()
    }

    /// Parse the string form of a label selector
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::everything());
        }

        split_terms(input)?
            .into_iter()
            .map(parse_requirement)
            .collect::<Result<Vec<_>>>()
            .map(Selector)
    }

    pub fn is_everything(&self) -> bool {
        self.0.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.0
    }

    /// Check a label set against every requirement
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.0.iter().all(|r| r.matches(labels))
    }
}

impl FromStr for Selector {
    type Err = InformerError;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Split on top-level commas; commas inside `( )` belong to value sets
fn split_terms(input: &str) -> Result<Vec<&str>> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| invalid(input, "unbalanced ')'"))?;
            }
            ',' if depth == 0 => {
                terms.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(invalid(input, "unbalanced '('"));
    }
    terms.push(&input[start..]);
    Ok(terms)
}

fn parse_requirement(term: &str) -> Result<Requirement> {
    let term = term.trim();
    if term.is_empty() {
        return Err(invalid(term, "empty requirement"));
    }

    if let Some(key) = term.strip_prefix('!') {
        let key = key.trim();
        validate_key(key)?;
        return Ok(Requirement::DoesNotExist(key.to_string()));
    }

    if let Some(open) = term.find('(') {
        return parse_set_requirement(term, open);
    }

    if let Some((key, value)) = term.split_once("!=") {
        let (key, value) = (key.trim(), value.trim());
        validate_key(key)?;
        validate_value(value)?;
        return Ok(Requirement::NotEqual(key.to_string(), value.to_string()));
    }

    if let Some((key, value)) = term.split_once('=') {
        // `==` is accepted as a synonym of `=`
        let value = value.strip_prefix('=').unwrap_or(value);
        let (key, value) = (key.trim(), value.trim());
        validate_key(key)?;
        validate_value(value)?;
        return Ok(Requirement::Equal(key.to_string(), value.to_string()));
    }

    validate_key(term)?;
    Ok(Requirement::Exists(term.to_string()))
}

fn parse_set_requirement(term: &str, open: usize) -> Result<Requirement> {
    let Some(inner) = term[open + 1..].strip_suffix(')') else {
        return Err(invalid(term, "value set must end with ')'"));
    };

    let mut head = term[..open].split_whitespace();
    let (Some(key), Some(op), None) = (head.next(), head.next(), head.next()) else {
        return Err(invalid(term, "expected '<key> in (...)' or '<key> notin (...)'"));
    };
    validate_key(key)?;

    let values: BTreeSet<String> = inner.split(',').map(|v| v.trim().to_string()).collect();
    if values.iter().all(|v| v.is_empty()) {
        return Err(invalid(term, "value set can't be empty"));
    }
    for value in &values {
        validate_value(value)?;
    }

    match op {
        "in" => Ok(Requirement::In(key.to_string(), values)),
        "notin" => Ok(Requirement::NotIn(key.to_string(), values)),
        other => Err(invalid(term, &format!("unknown operator '{other}'"))),
    }
}

/// Label keys are `[prefix/]name` where prefix is a DNS subdomain
fn validate_key(key: &str) -> Result<()> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        let prefix_ok = !prefix.is_empty()
            && prefix.len() <= MAX_PREFIX_LEN
            && prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
        if !prefix_ok {
            return Err(invalid(key, "invalid key prefix"));
        }
    }

    if name.is_empty() || !is_label_name(name) {
        return Err(invalid(key, "invalid key"));
    }
    Ok(())
}

fn validate_value(value: &str) -> Result<()> {
    if value.is_empty() || is_label_name(value) {
        Ok(())
    } else {
        Err(invalid(value, "invalid value"))
    }
}

fn is_label_name(s: &str) -> bool {
    let bytes = s.as_bytes();
    s.len() <= MAX_NAME_LEN
        && bytes.first().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.last().is_some_and(u8::is_ascii_alphanumeric)
        && bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(*b, b'-' | b'_' | b'.'))
}

fn invalid(input: &str, reason: &str) -> InformerError {
    InformerError::InvalidSelector(format!("{input:?}: {reason}"))
}

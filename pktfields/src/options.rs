// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Case-insensitive bidirectional name/value registries for symbolic
//! protocol constants and flags.

use std::collections::HashMap;

use crate::error::FieldError;

/// A registry of named constants attached to a field.
///
/// Lookups by name are case-insensitive, but the casing supplied at
/// registration is preserved for enumeration. Each value maps back to
/// exactly one display name; when two names share a value, the
/// last-registered name wins. Name space and value space are treated as
/// disjoint sets.
#[derive(Clone, Debug, Default)]
pub struct OptionTable {
    // keyed by lowercased name; holds the original casing alongside the value
    by_name: HashMap<String, (String, u64)>,
    by_value: HashMap<u64, String>,
}

impl OptionTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` with `value`, replacing any existing entry whose
    /// name matches case-insensitively.
    pub fn set(&mut self, name: &str, value: u64) {
        self.by_name
            .insert(name.to_lowercase(), (name.to_string(), value));
        self.by_value.insert(value, name.to_string());
    }

    /// Chainable form of [`set`](Self::set) for building tables inline.
    #[inline]
    pub fn with(mut self, name: &str, value: u64) -> Self {
        self.set(name, value);
        self
    }

    /// Looks up `name` case-insensitively.
    pub fn get(&self, name: &str) -> Result<u64, FieldError> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|(_, v)| *v)
            .ok_or_else(|| FieldError::unknown_option("no option registered under that name"))
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_lowercase())
    }

    /// The registered names, in their original casing.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.values().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = u64> + '_ {
        self.by_name.values().map(|(_, v)| *v)
    }

    /// The display name registered for `value`, or its decimal rendering
    /// when no name is registered.
    pub fn display_name(&self, value: u64) -> String {
        match self.by_value.get(&value) {
            Some(name) => name.clone(),
            None => value.to_string(),
        }
    }
}

impl<'a> FromIterator<(&'a str, u64)> for OptionTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, u64)>>(iter: I) -> Self {
        let mut table = OptionTable::new();
        for (name, value) in iter {
            table.set(name, value);
        }
        table
    }
}

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input attributes the rendering layer understands. Anything else is not forwarded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_mode: Option<InputMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_complete: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputType {
    Text,
    Number,
    Email,
    Tel,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputMode {
    Text,
    Numeric,
}

impl InputAttrs {
    pub fn digits() -> Self {
        Self {
            input_type: Some(InputType::Text),
            input_mode: Some(InputMode::Numeric),
            pattern: Some(r"\d+".to_string()),
            required: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormEntry {
    pub name: String,
    pub placeholder: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub extra_props: InputAttrs,
}

impl FormEntry {
    pub fn new(name: &str, placeholder: &str) -> Self {
        Self {
            name: name.to_string(),
            placeholder: placeholder.to_string(),
            value: String::new(),
            extra_props: InputAttrs::default(),
        }
    }

    #[must_use]
    pub fn with_props(mut self, extra_props: InputAttrs) -> Self {
        self.extra_props = extra_props;
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("duplicate form field: {0}")]
    Duplicate(String),
}

/// The values of one form instance, in display order.
///
/// Every update hands back a new store; the entries a store was built from
/// are copied in, so nothing the caller holds can change underneath it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldStore {
    entries: Vec<FormEntry>,
}

impl FieldStore {
    pub fn init(entries: &[FormEntry]) -> Result<Self, FieldError> {
        let mut seen = HashSet::new();
        for entry in entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(FieldError::Duplicate(entry.name.clone()));
            }
        }

        Ok(Self {
            entries: entries.to_vec(),
        })
    }

    /// Unknown names leave the store as it was.
    #[must_use]
    pub fn on_change(&self, name: &str, value: &str) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|entry| {
                    if entry.name == name {
                        FormEntry {
                            value: value.to_string(),
                            ..entry.clone()
                        }
                    } else {
                        entry.clone()
                    }
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn reset(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|entry| FormEntry {
                    value: String::new(),
                    ..entry.clone()
                })
                .collect(),
        }
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.as_str())
    }

    pub fn values(&self) -> BTreeMap<&str, &str> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.value.as_str()))
            .collect()
    }

    pub fn entries(&self) -> &[FormEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

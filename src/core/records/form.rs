//! Submitted form values and the field descriptions forms are rendered from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Champs obligatoires manquants : {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("Valeur invalide pour {field} : {value}")]
    InvalidValue { field: String, value: String },
}

impl ValidationError {
    pub fn invalid(field: &str, value: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    TextArea,
    Date,
    Number { min: Option<f64>, max: Option<f64> },
    Select(&'static [(&'static str, &'static str)]),
}

/// One input of a creation form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub placeholder: Option<&'static str>,
}

impl FieldSpec {
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            required: false,
            placeholder: None,
        }
    }

    pub const fn textarea(name: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::TextArea,
            ..Self::text(name, label)
        }
    }

    pub const fn date(name: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::Date,
            ..Self::text(name, label)
        }
    }

    pub const fn number(name: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::Number {
                min: None,
                max: None,
            },
            ..Self::text(name, label)
        }
    }

    pub const fn range(name: &'static str, label: &'static str, min: f64, max: f64) -> Self {
        Self {
            kind: FieldKind::Number {
                min: Some(min),
                max: Some(max),
            },
            ..Self::text(name, label)
        }
    }

    pub const fn select(
        name: &'static str,
        label: &'static str,
        options: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            kind: FieldKind::Select(options),
            ..Self::text(name, label)
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

/// Field values keyed by field name. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<String, String>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), value.to_string());
    }

    pub fn raw(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| v.trim().is_empty())
    }

    /// Converts a JSON object; numbers and booleans keep their literal text.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::invalid("body", &value.to_string()))?;
        let mut form = Self::new();
        for (key, value) in object {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(s) => form.set(key, s),
                serde_json::Value::Number(n) => form.set(key, &n.to_string()),
                serde_json::Value::Bool(b) => form.set(key, &b.to_string()),
                other => return Err(ValidationError::invalid(key, &other.to_string())),
            }
        }
        Ok(form)
    }

    pub fn check_required(&self, fields: &[FieldSpec]) -> Result<(), ValidationError> {
        let missing: Vec<String> = fields
            .iter()
            .filter(|f| f.required && self.text(f.name).is_none())
            .map(|f| f.label.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(missing))
        }
    }

    pub fn text(&self, name: &str) -> Option<String> {
        let value = self.raw(name).trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    pub fn required(&self, name: &str) -> Result<String, ValidationError> {
        self.text(name)
            .ok_or_else(|| ValidationError::MissingFields(vec![name.to_string()]))
    }

    pub fn parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>, ValidationError> {
        match self.text(name) {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| ValidationError::invalid(name, &value)),
            None => Ok(None),
        }
    }

    pub fn required_parsed<T: FromStr>(&self, name: &str) -> Result<T, ValidationError> {
        self.parsed(name)?
            .ok_or_else(|| ValidationError::MissingFields(vec![name.to_string()]))
    }

    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>, ValidationError> {
        match self.text(name) {
            Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| ValidationError::invalid(name, &value)),
            None => Ok(None),
        }
    }

    pub fn required_date(&self, name: &str) -> Result<NaiveDate, ValidationError> {
        self.date(name)?
            .ok_or_else(|| ValidationError::MissingFields(vec![name.to_string()]))
    }

    /// Accepts RFC 3339 or `datetime-local` input (`2025-03-01T09:30`, taken as UTC).
    pub fn timestamp(&self, name: &str) -> Result<Option<DateTime<Utc>>, ValidationError> {
        let Some(value) = self.text(name) else {
            return Ok(None);
        };
        if let Ok(ts) = DateTime::parse_from_rfc3339(&value) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
        chrono::NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M")
            .map(|naive| Some(naive.and_utc()))
            .map_err(|_| ValidationError::invalid(name, &value))
    }

    pub fn number(&self, name: &str) -> Result<Option<f64>, ValidationError> {
        let parsed = self.parsed::<f64>(name)?;
        match parsed {
            Some(n) if !n.is_finite() => Err(ValidationError::invalid(name, self.raw(name))),
            other => Ok(other),
        }
    }

    pub fn integer_in(&self, name: &str, min: i32, max: i32) -> Result<Option<i32>, ValidationError> {
        match self.parsed::<i32>(name)? {
            Some(n) if !(min..=max).contains(&n) => {
                Err(ValidationError::invalid(name, &n.to_string()))
            }
            other => Ok(other),
        }
    }

    pub fn uuid(&self, name: &str) -> Result<Option<Uuid>, ValidationError> {
        self.parsed::<Uuid>(name)
    }

    pub fn flag(&self, name: &str) -> Result<Option<bool>, ValidationError> {
        match self.text(name).as_deref() {
            None => Ok(None),
            Some("true" | "on" | "1" | "yes") => Ok(Some(true)),
            Some("false" | "off" | "0" | "no") => Ok(Some(false)),
            Some(other) => Err(ValidationError::invalid(name, other)),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

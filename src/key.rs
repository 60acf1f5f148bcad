//! Typed, named slots referenced by a [Definition](crate::definition::Definition).
//!
//! [Key] is the capability contract every concrete key kind implements.
//! Concrete kinds ([`StringKey`], [`IntegerKey`], [`SequenceKey`], [`EnumKey`],
//! [`TimestampKey`]) are the variants of [`KeyDef`], which is what templates
//! actually store and dispatch on.

use crate::error::ConversionError;
use chrono::{NaiveDateTime, TimeZone, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A value produced by parsing, or consumed by applying, a template field
#[derive(Clone, Debug, Display, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::String(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Capability contract for a typed template key. Implemented by each
/// concrete key kind, and dispatched over by [`KeyDef`].
pub trait Key {
    /// The key's canonical name, as referenced in a `{name}` token
    fn name(&self) -> &str;

    /// Fixed substring length this key's values must occupy, if any
    fn length(&self) -> Option<usize> {
        None
    }

    /// Parse a substring of an input into this key's value type
    fn value_from_str(&self, s: &str) -> Result<Value, ConversionError>;

    /// Render a value as the string to substitute into an applied template.
    /// When `ignore_type` is set, type checking on `value` is relaxed (e.g. a
    /// [`SequenceKey`] accepting a literal frame-number format specifier).
    fn str_from_value(
        &self,
        value: &Value,
        ignore_type: bool,
    ) -> Result<String, ConversionError>;
}

/// A plain textual key, optionally restricted to a fixed length and/or a
/// finite set of valid choices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StringKey {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub default: Option<String>,
}

impl Key for StringKey {
    fn name(&self) -> &str {
        &self.name
    }

    fn length(&self) -> Option<usize> {
        self.length
    }

    fn value_from_str(&self, s: &str) -> Result<Value, ConversionError> {
        if let Some(length) = self.length
            && s.len() < length
        {
            return Err(ConversionError::TooShort {
                value: s.to_string(),
                length,
            });
        }
        if !self.choices.is_empty() && !self.choices.iter().any(|c| c == s) {
            return Err(ConversionError::NotAChoice {
                value: s.to_string(),
                choices: self.choices.clone(),
            });
        }
        Ok(Value::String(s.to_string()))
    }

    fn str_from_value(
        &self,
        value: &Value,
        ignore_type: bool,
    ) -> Result<String, ConversionError> {
        let s = match value {
            Value::String(s) => s.clone(),
            Value::Integer(i) if ignore_type => i.to_string(),
            Value::Integer(_) => {
                return Err(ConversionError::WrongType {
                    value: value.clone(),
                    expected: "string",
                });
            }
        };
        if let Some(length) = self.length
            && s.len() < length
        {
            return Err(ConversionError::TooShort {
                value: s,
                length,
            });
        }
        Ok(s)
    }
}

/// A zero-padded integer key, e.g. a 3-digit version number
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegerKey {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub default: Option<i64>,
}

impl Key for IntegerKey {
    fn name(&self) -> &str {
        &self.name
    }

    fn length(&self) -> Option<usize> {
        self.length
    }

    fn value_from_str(&self, s: &str) -> Result<Value, ConversionError> {
        if let Some(length) = self.length
            && s.len() < length
        {
            return Err(ConversionError::TooShort {
                value: s.to_string(),
                length,
            });
        }
        s.parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| ConversionError::NotAnInteger {
                value: s.to_string(),
            })
    }

    fn str_from_value(
        &self,
        value: &Value,
        ignore_type: bool,
    ) -> Result<String, ConversionError> {
        let i = match value {
            Value::Integer(i) => *i,
            Value::String(s) if ignore_type => {
                return Ok(s.clone());
            }
            Value::String(_) => {
                return Err(ConversionError::WrongType {
                    value: value.clone(),
                    expected: "integer",
                });
            }
        };
        match self.length {
            Some(length) => Ok(format!("{i:0length$}")),
            None => Ok(i.to_string()),
        }
    }
}

/// Like [`IntegerKey`], but `str_from_value` additionally accepts a literal
/// frame-number format specifier (e.g. `%04d`) when `ignore_type` is set,
/// for building printf-style sequence globs/patterns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceKey {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub default: Option<i64>,
}

impl Key for SequenceKey {
    fn name(&self) -> &str {
        &self.name
    }

    fn length(&self) -> Option<usize> {
        self.length
    }

    fn value_from_str(&self, s: &str) -> Result<Value, ConversionError> {
        IntegerKey {
            name: self.name.clone(),
            length: self.length,
            default: self.default,
        }
        .value_from_str(s)
    }

    fn str_from_value(
        &self,
        value: &Value,
        ignore_type: bool,
    ) -> Result<String, ConversionError> {
        if ignore_type
            && let Value::String(s) = value
            && (s == "FORMAT" || s.starts_with('%'))
        {
            let width = self.length.unwrap_or(1);
            return Ok(format!("%0{width}d"));
        }
        IntegerKey {
            name: self.name.clone(),
            length: self.length,
            default: self.default,
        }
        .str_from_value(value, ignore_type)
    }
}

/// A key whose value must be one of a fixed, finite set of choices
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumKey {
    #[serde(default)]
    pub name: String,
    pub choices: Vec<String>,
    #[serde(default)]
    pub default: Option<String>,
}

impl Key for EnumKey {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_from_str(&self, s: &str) -> Result<Value, ConversionError> {
        if self.choices.iter().any(|c| c == s) {
            Ok(Value::String(s.to_string()))
        } else {
            Err(ConversionError::NotAChoice {
                value: s.to_string(),
                choices: self.choices.clone(),
            })
        }
    }

    fn str_from_value(
        &self,
        value: &Value,
        ignore_type: bool,
    ) -> Result<String, ConversionError> {
        let s = match value {
            Value::String(s) => s.clone(),
            Value::Integer(i) if ignore_type => i.to_string(),
            Value::Integer(_) => {
                return Err(ConversionError::WrongType {
                    value: value.clone(),
                    expected: "string",
                });
            }
        };
        if self.choices.iter().any(|c| c == &s) {
            Ok(s)
        } else {
            Err(ConversionError::NotAChoice {
                value: s,
                choices: self.choices.clone(),
            })
        }
    }
}

/// A key whose substring is a fixed-width timestamp, e.g. `%Y%m%d`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimestampKey {
    #[serde(default)]
    pub name: String,
    pub format: String,
}

impl Key for TimestampKey {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_from_str(&self, s: &str) -> Result<Value, ConversionError> {
        NaiveDateTime::parse_from_str(s, &self.format)
            .or_else(|_| {
                chrono::NaiveDate::parse_from_str(s, &self.format)
                    .map(|date| date.and_hms_opt(0, 0, 0).unwrap())
            })
            .map(|dt| Value::Integer(dt.and_utc().timestamp()))
            .map_err(|_| ConversionError::BadTimestamp {
                value: s.to_string(),
                format: self.format.clone(),
            })
    }

    fn str_from_value(
        &self,
        value: &Value,
        ignore_type: bool,
    ) -> Result<String, ConversionError> {
        match value {
            Value::Integer(epoch) => {
                let dt = Utc
                    .timestamp_opt(*epoch, 0)
                    .single()
                    .ok_or_else(|| ConversionError::BadTimestamp {
                        value: epoch.to_string(),
                        format: self.format.clone(),
                    })?;
                Ok(dt.format(&self.format).to_string())
            }
            Value::String(s) if ignore_type => Ok(s.clone()),
            Value::String(_) => Err(ConversionError::WrongType {
                value: value.clone(),
                expected: "timestamp",
            }),
        }
    }
}

/// The concrete kinds of key a template definition can reference. This is
/// the sum type the re-architecture guidance calls for in place of a class
/// hierarchy: `KeyDef` dispatches the [Key] contract to whichever variant it
/// holds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyDef {
    String(StringKey),
    Integer(IntegerKey),
    Sequence(SequenceKey),
    Enum(EnumKey),
    Timestamp(TimestampKey),
}

impl KeyDef {
    /// Set the canonical name of this key. Used when loading a templates
    /// document, where a key's name is the map key it's defined under
    /// rather than a field of its own value.
    pub(crate) fn set_name(&mut self, name: String) {
        match self {
            Self::String(k) => k.name = name,
            Self::Integer(k) => k.name = name,
            Self::Sequence(k) => k.name = name,
            Self::Enum(k) => k.name = name,
            Self::Timestamp(k) => k.name = name,
        }
    }

    pub fn default_value(&self) -> Option<Value> {
        match self {
            Self::String(k) => k.default.clone().map(Value::String),
            Self::Integer(k) => k.default.map(Value::Integer),
            Self::Sequence(k) => k.default.map(Value::Integer),
            Self::Enum(k) => k.default.clone().map(Value::String),
            Self::Timestamp(_) => None,
        }
    }
}

impl Key for KeyDef {
    fn name(&self) -> &str {
        match self {
            Self::String(k) => k.name(),
            Self::Integer(k) => k.name(),
            Self::Sequence(k) => k.name(),
            Self::Enum(k) => k.name(),
            Self::Timestamp(k) => k.name(),
        }
    }

    fn length(&self) -> Option<usize> {
        match self {
            Self::String(k) => k.length(),
            Self::Integer(k) => k.length(),
            Self::Sequence(k) => k.length(),
            Self::Enum(k) => k.length(),
            Self::Timestamp(k) => k.length(),
        }
    }

    fn value_from_str(&self, s: &str) -> Result<Value, ConversionError> {
        match self {
            Self::String(k) => k.value_from_str(s),
            Self::Integer(k) => k.value_from_str(s),
            Self::Sequence(k) => k.value_from_str(s),
            Self::Enum(k) => k.value_from_str(s),
            Self::Timestamp(k) => k.value_from_str(s),
        }
    }

    fn str_from_value(
        &self,
        value: &Value,
        ignore_type: bool,
    ) -> Result<String, ConversionError> {
        match self {
            Self::String(k) => k.str_from_value(value, ignore_type),
            Self::Integer(k) => k.str_from_value(value, ignore_type),
            Self::Sequence(k) => k.str_from_value(value, ignore_type),
            Self::Enum(k) => k.str_from_value(value, ignore_type),
            Self::Timestamp(k) => k.str_from_value(value, ignore_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_key_length() {
        let key = StringKey {
            name: "name".into(),
            length: Some(3),
            ..Default::default()
        };
        assert!(key.value_from_str("ab").is_err());
        assert!(key.str_from_value(&Value::String("ab".into()), false).is_err());
        assert!(key.str_from_value(&Value::String("abc".into()), false).is_ok());
    }

    #[test]
    fn integer_key_padding() {
        let key = IntegerKey {
            name: "version".into(),
            length: Some(3),
            default: None,
        };
        assert_eq!(
            key.str_from_value(&Value::Integer(3), false).unwrap(),
            "003"
        );
        assert_eq!(key.value_from_str("003").unwrap(), Value::Integer(3));
        assert!(key.value_from_str("3").is_err());
    }

    #[test]
    fn enum_key_rejects_unknown_choice() {
        let key = EnumKey {
            name: "step".into(),
            choices: vec!["comp".into(), "anim".into()],
            default: None,
        };
        assert!(key.value_from_str("comp").is_ok());
        assert!(key.value_from_str("lighting").is_err());
    }

    #[test]
    fn timestamp_key_round_trips() {
        let key = TimestampKey {
            name: "date".into(),
            format: "%Y%m%d".into(),
        };
        let value = key.value_from_str("20240131").unwrap();
        assert_eq!(key.str_from_value(&value, false).unwrap(), "20240131");
    }
}

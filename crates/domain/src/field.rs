//! Field Schema
//!
//! Each exercise declares which of the numeric set fields can be recorded for it. The
//! declaration is stored by the server as an opaque payload, usually the serialized JSON object
//! `{"allowed_fields": ["reps", "weight"]}`. A payload that is missing, cannot be parsed or does
//! not contain a usable field list resolves to the default field set (reps and weight).

use log::debug;
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

pub const ALLOWED_FIELDS_KEY: &str = "allowed_fields";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsRefStr, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Reps,
    Weight,
    Duration,
    Distance,
}

impl Field {
    #[must_use]
    pub fn all() -> Vec<Field> {
        Field::iter().collect()
    }
}

/// Ordered, duplicate-free and non-empty set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet(Vec<Field>);

impl FieldSet {
    /// Returns `None` if no field is given.
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Option<Self> {
        let mut result: Vec<Field> = Vec::new();
        for field in fields {
            if !result.contains(&field) {
                result.push(field);
            }
        }
        if result.is_empty() {
            None
        } else {
            Some(Self(result))
        }
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Field> {
        self.0.clone()
    }

    /// Serialized configuration payload as expected by the server.
    #[must_use]
    pub fn to_config(&self) -> String {
        serde_json::json!({
            ALLOWED_FIELDS_KEY: self.0.iter().map(AsRef::<str>::as_ref).collect::<Vec<_>>()
        })
        .to_string()
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self(vec![Field::Reps, Field::Weight])
    }
}

/// Field configuration as received from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldConfig {
    Absent,
    Serialized(String),
    Structured(Value),
}

impl From<Option<Value>> for FieldConfig {
    fn from(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => FieldConfig::Absent,
            Some(Value::String(string)) => FieldConfig::Serialized(string),
            Some(value) => FieldConfig::Structured(value),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldConfigError {
    #[error("no field configuration")]
    Absent,
    #[error("malformed field configuration: {0}")]
    Malformed(String),
    #[error("field configuration has no field list")]
    MissingFieldList,
    #[error("field configuration has no known fields")]
    NoKnownFields,
}

impl FieldConfig {
    /// Parse the configuration without falling back to the default.
    ///
    /// Unknown field names are ignored. A list that contains only unknown names is treated like
    /// an empty list.
    pub fn parse(&self) -> Result<FieldSet, FieldConfigError> {
        match self {
            FieldConfig::Absent => Err(FieldConfigError::Absent),
            FieldConfig::Serialized(string) => {
                if string.trim().is_empty() {
                    return Err(FieldConfigError::Absent);
                }
                let value = serde_json::from_str::<Value>(string)
                    .map_err(|err| FieldConfigError::Malformed(err.to_string()))?;
                field_list(&value)
            }
            FieldConfig::Structured(value) => field_list(value),
        }
    }
}

fn field_list(value: &Value) -> Result<FieldSet, FieldConfigError> {
    let list = value
        .get(ALLOWED_FIELDS_KEY)
        .and_then(Value::as_array)
        .ok_or(FieldConfigError::MissingFieldList)?;
    FieldSet::new(
        list.iter()
            .filter_map(Value::as_str)
            .filter_map(|name| name.parse::<Field>().ok()),
    )
    .ok_or(FieldConfigError::NoKnownFields)
}

/// Determine the legal fields for set entry, using the default field set for any unusable
/// configuration.
#[must_use]
pub fn resolve_fields(config: &FieldConfig) -> FieldSet {
    match config.parse() {
        Ok(fields) => fields,
        Err(FieldConfigError::Absent) => FieldSet::default(),
        Err(err) => {
            debug!("using default fields: {err}");
            FieldSet::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::absent(FieldConfig::Absent)]
    #[case::empty_string(FieldConfig::Serialized(String::new()))]
    #[case::invalid_json(FieldConfig::Serialized("{allowed_fields".to_string()))]
    #[case::plain_text(FieldConfig::Serialized("Keep your back straight.".to_string()))]
    #[case::json_number(FieldConfig::Serialized("42".to_string()))]
    #[case::missing_key(FieldConfig::Structured(json!({"fields": ["duration"]})))]
    #[case::not_a_list(FieldConfig::Structured(json!({"allowed_fields": "duration"})))]
    #[case::empty_list(FieldConfig::Serialized(r#"{"allowed_fields": []}"#.to_string()))]
    #[case::unknown_fields(FieldConfig::Structured(json!({"allowed_fields": ["pace"]})))]
    fn test_resolve_fields_default(#[case] config: FieldConfig) {
        assert_eq!(resolve_fields(&config).to_vec(), vec![Field::Reps, Field::Weight]);
    }

    #[rstest]
    #[case::serialized(
        FieldConfig::Serialized(r#"{"allowed_fields": ["duration", "distance"]}"#.to_string()),
        vec![Field::Duration, Field::Distance]
    )]
    #[case::structured(
        FieldConfig::Structured(json!({"allowed_fields": ["weight", "reps"]})),
        vec![Field::Weight, Field::Reps]
    )]
    #[case::duplicates_and_unknown(
        FieldConfig::Structured(json!({"allowed_fields": ["reps", "pace", "reps", 3, "duration"]})),
        vec![Field::Reps, Field::Duration]
    )]
    fn test_resolve_fields(#[case] config: FieldConfig, #[case] expected: Vec<Field>) {
        assert_eq!(resolve_fields(&config).to_vec(), expected);
    }

    #[rstest]
    #[case(FieldConfig::Absent, Err(FieldConfigError::Absent))]
    #[case(
        FieldConfig::Structured(json!({"x": 1})),
        Err(FieldConfigError::MissingFieldList)
    )]
    #[case(
        FieldConfig::Structured(json!({"allowed_fields": []})),
        Err(FieldConfigError::NoKnownFields)
    )]
    fn test_field_config_parse_errors(
        #[case] config: FieldConfig,
        #[case] expected: Result<FieldSet, FieldConfigError>,
    ) {
        assert_eq!(config.parse(), expected);
    }

    #[test]
    fn test_field_config_parse_malformed() {
        assert!(matches!(
            FieldConfig::Serialized("{".to_string()).parse(),
            Err(FieldConfigError::Malformed(_))
        ));
    }

    #[rstest]
    #[case(None, FieldConfig::Absent)]
    #[case(Some(Value::Null), FieldConfig::Absent)]
    #[case(Some(json!("{}")), FieldConfig::Serialized("{}".to_string()))]
    #[case(Some(json!({})), FieldConfig::Structured(json!({})))]
    fn test_field_config_from_value(#[case] value: Option<Value>, #[case] expected: FieldConfig) {
        assert_eq!(FieldConfig::from(value), expected);
    }

    #[test]
    fn test_field_set_to_config() {
        let fields = FieldSet::new([Field::Duration, Field::Distance]).unwrap();
        assert_eq!(
            fields.to_config(),
            r#"{"allowed_fields":["duration","distance"]}"#
        );
        assert_eq!(
            resolve_fields(&FieldConfig::Serialized(fields.to_config())),
            fields
        );
    }

    #[test]
    fn test_field_set_new() {
        assert_eq!(FieldSet::new([]), None);
        assert_eq!(
            FieldSet::new([Field::Weight, Field::Weight]).unwrap().to_vec(),
            vec![Field::Weight]
        );
    }

    #[rstest]
    #[case(Field::Reps, "reps")]
    #[case(Field::Weight, "weight")]
    #[case(Field::Duration, "duration")]
    #[case(Field::Distance, "distance")]
    fn test_field_names(#[case] field: Field, #[case] name: &str) {
        assert_eq!(field.as_ref(), name);
        assert_eq!(name.parse::<Field>(), Ok(field));
    }
}

//! Data types - coercion strategies between stored text and typed values
//!
//! Every attribute type names a strategy by identifier (`integer`, `text`, ...)
//! plus a colon-separated parameter list. The identifier is resolved once,
//! through a [`DataTypeRegistry`], into a [`DataType`] that does the actual
//! conversion in both directions.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Name of the variant, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Decimal(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// Built-in coercion strategy kinds, before parameters are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataTypeKind {
    Text,
    Integer,
    Decimal,
    Boolean,
    Choice,
}

impl DataTypeKind {
    /// Canonical identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            DataTypeKind::Text => "text",
            DataTypeKind::Integer => "integer",
            DataTypeKind::Decimal => "decimal",
            DataTypeKind::Boolean => "boolean",
            DataTypeKind::Choice => "choice",
        }
    }

    /// Get all kinds
    pub fn all() -> &'static [DataTypeKind] {
        &[
            DataTypeKind::Text,
            DataTypeKind::Integer,
            DataTypeKind::Decimal,
            DataTypeKind::Boolean,
            DataTypeKind::Choice,
        ]
    }

    /// Apply the strategy-specific parameters
    pub fn build(self, params: &[String]) -> Result<DataType> {
        match self {
            DataTypeKind::Text => Ok(DataType::Text {
                max_length: optional_param(params, 0, "max_length")?,
            }),
            DataTypeKind::Integer => {
                let min = optional_param(params, 0, "min")?;
                let max = optional_param(params, 1, "max")?;
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(Error::Configuration(format!(
                            "integer bounds are inverted: {}:{}",
                            min, max
                        )));
                    }
                }
                Ok(DataType::Integer { min, max })
            }
            DataTypeKind::Decimal => Ok(DataType::Decimal {
                scale: optional_param(params, 0, "scale")?,
            }),
            DataTypeKind::Boolean => Ok(DataType::Boolean),
            DataTypeKind::Choice => {
                if params.is_empty() {
                    return Err(Error::Configuration(
                        "choice type needs at least one option".to_string(),
                    ));
                }
                if params.iter().any(|o| o.is_empty()) {
                    return Err(Error::Configuration(
                        "choice options may not be empty".to_string(),
                    ));
                }
                Ok(DataType::Choice {
                    options: params.to_vec(),
                })
            }
        }
    }
}

fn optional_param<T: std::str::FromStr>(
    params: &[String],
    index: usize,
    label: &str,
) -> Result<Option<T>> {
    match params.get(index).map(|p| p.trim()) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            Error::Configuration(format!("invalid {} parameter: {}", label, raw))
        }),
    }
}

/// A resolved coercion strategy with its parameters applied.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    /// Free text, optionally length-limited
    Text { max_length: Option<usize> },
    /// Signed integer, optionally bounded
    Integer { min: Option<i64>, max: Option<i64> },
    /// Floating point number, optionally rendered with a fixed scale
    Decimal { scale: Option<usize> },
    Boolean,
    /// Text restricted to a fixed set of options
    Choice { options: Vec<String> },
}

impl DataType {
    pub fn text() -> Self {
        DataType::Text { max_length: None }
    }

    pub fn integer() -> Self {
        DataType::Integer { min: None, max: None }
    }

    pub fn decimal() -> Self {
        DataType::Decimal { scale: None }
    }

    pub fn choice<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DataType::Choice {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self) -> DataTypeKind {
        match self {
            DataType::Text { .. } => DataTypeKind::Text,
            DataType::Integer { .. } => DataTypeKind::Integer,
            DataType::Decimal { .. } => DataTypeKind::Decimal,
            DataType::Boolean => DataTypeKind::Boolean,
            DataType::Choice { .. } => DataTypeKind::Choice,
        }
    }

    /// Canonical identifier, as persisted in `attribute_type.data_type`
    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Parameters, as persisted (colon-joined) in `attribute_type.type_parameters`
    pub fn parameters(&self) -> Vec<String> {
        fn opt<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map(ToString::to_string).unwrap_or_default()
        }

        match self {
            DataType::Text { max_length: None }
            | DataType::Integer { min: None, max: None }
            | DataType::Decimal { scale: None }
            | DataType::Boolean => Vec::new(),
            DataType::Text { max_length } => vec![opt(max_length)],
            DataType::Integer { min, max: None } => vec![opt(min)],
            DataType::Integer { min, max } => vec![opt(min), opt(max)],
            DataType::Decimal { scale } => vec![opt(scale)],
            DataType::Choice { options } => options.clone(),
        }
    }

    /// Parameters in their persisted form.
    ///
    /// Fails when they would not resolve back to this data type, e.g. a choice
    /// option containing the separator.
    pub fn stored_parameters(&self) -> Result<Option<String>> {
        let stored = join_parameters(&self.parameters())?;
        let reread = self.kind().build(&split_parameters(stored.as_deref()))?;
        if reread != *self {
            return Err(Error::Configuration(format!(
                "parameters of {} cannot be stored",
                self
            )));
        }
        Ok(stored)
    }

    /// Convert a typed value into its stored string form
    pub fn to_stored(&self, value: &Value) -> Result<String> {
        match (self, value) {
            (DataType::Text { max_length }, Value::Text(s)) => {
                if let Some(max) = max_length {
                    if s.chars().count() > *max {
                        return Err(Error::Coercion(format!(
                            "text longer than {} characters",
                            max
                        )));
                    }
                }
                Ok(s.clone())
            }
            (DataType::Integer { min, max }, Value::Integer(i)) => {
                if min.is_some_and(|min| *i < min) || max.is_some_and(|max| *i > max) {
                    return Err(Error::Coercion(format!("{} is out of range", i)));
                }
                Ok(i.to_string())
            }
            (DataType::Decimal { scale }, Value::Decimal(d)) => store_decimal(*scale, *d),
            (DataType::Decimal { scale }, Value::Integer(i)) => store_decimal(*scale, *i as f64),
            (DataType::Boolean, Value::Boolean(b)) => Ok(b.to_string()),
            (DataType::Choice { options }, Value::Text(s)) => {
                if options.iter().any(|o| o == s) {
                    Ok(s.clone())
                } else {
                    Err(Error::Coercion(format!(
                        "'{}' is not one of [{}]",
                        s,
                        options.join(", ")
                    )))
                }
            }
            (data_type, value) => Err(Error::Coercion(format!(
                "cannot store a {} value as {}",
                value.kind_name(),
                data_type.name()
            ))),
        }
    }

    /// Convert a stored string back into a typed value
    pub fn from_stored(&self, text: &str) -> Result<Value> {
        match self {
            DataType::Text { .. } | DataType::Choice { .. } => Ok(Value::Text(text.to_string())),
            DataType::Integer { .. } => text
                .trim()
                .parse()
                .map(Value::Integer)
                .map_err(|_| Error::Coercion(format!("stored value '{}' is not an integer", text))),
            DataType::Decimal { .. } => text
                .trim()
                .parse()
                .map(Value::Decimal)
                .map_err(|_| Error::Coercion(format!("stored value '{}' is not a number", text))),
            DataType::Boolean => match text.trim().to_lowercase().as_str() {
                "true" | "y" | "yes" | "1" => Ok(Value::Boolean(true)),
                "false" | "n" | "no" | "0" => Ok(Value::Boolean(false)),
                _ => Err(Error::Coercion(format!("stored value '{}' is not a boolean", text))),
            },
        }
    }
}

fn store_decimal(scale: Option<usize>, d: f64) -> Result<String> {
    if !d.is_finite() {
        return Err(Error::Coercion(format!("{} is not a finite number", d)));
    }
    Ok(match scale {
        Some(scale) => format!("{:.*}", scale, d),
        None => d.to_string(),
    })
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.parameters();
        if params.is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}({})", self.name(), params.join(":"))
        }
    }
}

const PARAMETER_SEPARATOR: char = ':';

/// Split a persisted `type_parameters` column. Empty or absent means no parameters.
pub fn split_parameters(raw: Option<&str>) -> Vec<String> {
    match raw {
        None | Some("") => Vec::new(),
        Some(raw) => raw.split(PARAMETER_SEPARATOR).map(str::to_string).collect(),
    }
}

/// Join parameters for persistence; `None` when there are none
pub fn join_parameters(params: &[String]) -> Result<Option<String>> {
    if let Some(bad) = params.iter().find(|p| p.contains(PARAMETER_SEPARATOR)) {
        return Err(Error::Configuration(format!(
            "parameter '{}' may not contain '{}'",
            bad, PARAMETER_SEPARATOR
        )));
    }
    if params.is_empty() {
        Ok(None)
    } else {
        Ok(Some(params.join(&PARAMETER_SEPARATOR.to_string())))
    }
}

/// Registry of data type identifiers
#[derive(Debug, Clone, Default)]
pub struct DataTypeRegistry {
    kinds: HashMap<String, DataTypeKind>,
}

impl DataTypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identifier for a strategy (case-insensitive)
    pub fn register(&mut self, name: &str, kind: DataTypeKind) {
        self.kinds.insert(name.to_lowercase(), kind);
    }

    /// Register `alias` as another name for the strategy behind `target`
    pub fn register_alias(&mut self, alias: &str, target: &str) -> Result<()> {
        let kind = self.kind(target).ok_or_else(|| {
            Error::Configuration(format!(
                "alias '{}' points at unknown data type '{}'",
                alias, target
            ))
        })?;
        self.register(alias, kind);
        Ok(())
    }

    /// Look up a strategy kind by identifier
    pub fn kind(&self, name: &str) -> Option<DataTypeKind> {
        self.kinds.get(&name.trim().to_lowercase()).copied()
    }

    /// Resolve an identifier and its parameters into a data type
    pub fn resolve(&self, name: &str, params: &[String]) -> Result<DataType> {
        let kind = self
            .kind(name)
            .ok_or_else(|| Error::Configuration(format!("unknown data type '{}'", name)))?;
        kind.build(params)
    }
}

/// Create a registry with all built-in strategies and their common aliases
pub fn default_registry() -> DataTypeRegistry {
    let mut registry = DataTypeRegistry::new();
    for kind in DataTypeKind::all() {
        registry.register(kind.as_str(), *kind);
    }
    registry.register("string", DataTypeKind::Text);
    registry.register("int", DataTypeKind::Integer);
    registry.register("long", DataTypeKind::Integer);
    registry.register("double", DataTypeKind::Decimal);
    registry.register("float", DataTypeKind::Decimal);
    registry.register("number", DataTypeKind::Decimal);
    registry.register("bool", DataTypeKind::Boolean);
    registry.register("enum", DataTypeKind::Choice);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unknown_data_type_is_configuration_error() {
        let err = default_registry().resolve("bogus", &[]).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_identifiers_are_case_insensitive() {
        let registry = default_registry();
        assert_eq!(registry.resolve("Integer", &[]).unwrap(), DataType::integer());
        assert_eq!(registry.resolve("STRING", &[]).unwrap(), DataType::text());
    }

    #[test]
    fn test_alias_registration() {
        let mut registry = default_registry();
        registry.register_alias("money", "decimal").unwrap();
        assert_eq!(
            registry.resolve("money", &params(&["2"])).unwrap(),
            DataType::Decimal { scale: Some(2) }
        );
        assert!(registry.register_alias("broken", "nope").is_err());
    }

    #[test]
    fn test_split_parameters() {
        assert!(split_parameters(None).is_empty());
        assert!(split_parameters(Some("")).is_empty());
        assert_eq!(split_parameters(Some("1:10")), params(&["1", "10"]));
        assert_eq!(split_parameters(Some(":10")), params(&["", "10"]));
    }

    #[test]
    fn test_parameters_with_separator_cannot_be_stored() {
        let err = DataType::choice(["a:b", "c"]).stored_parameters().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(join_parameters(&params(&["a:b"])).is_err());
    }

    #[test]
    fn test_empty_choice_option_cannot_be_stored() {
        assert!(DataType::choice([""]).stored_parameters().is_err());
        assert!(DataType::choice(["", "a"]).stored_parameters().is_err());
        assert!(default_registry().resolve("choice", &params(&["a", ""])).is_err());
    }

    #[test]
    fn test_stored_parameters() {
        assert_eq!(DataType::text().stored_parameters().unwrap(), None);
        assert_eq!(
            DataType::Integer { min: None, max: Some(10) }.stored_parameters().unwrap().as_deref(),
            Some(":10")
        );
        assert_eq!(
            DataType::choice(["red", "green"]).stored_parameters().unwrap().as_deref(),
            Some("red:green")
        );
    }

    #[test]
    fn test_parameters_roundtrip_through_registry() {
        let registry = default_registry();
        for data_type in [
            DataType::text(),
            DataType::Text { max_length: Some(5) },
            DataType::Integer { min: None, max: Some(10) },
            DataType::Integer { min: Some(-1), max: None },
            DataType::Decimal { scale: Some(2) },
            DataType::Boolean,
            DataType::choice(["red", "green"]),
        ] {
            let resolved = registry.resolve(data_type.name(), &data_type.parameters()).unwrap();
            assert_eq!(resolved, data_type);
        }
    }

    #[test]
    fn test_integer_bounds() {
        let ty = default_registry().resolve("integer", &params(&["1", "10"])).unwrap();
        assert_eq!(ty.to_stored(&Value::Integer(5)).unwrap(), "5");
        assert!(ty.to_stored(&Value::Integer(11)).is_err());
        assert!(ty.to_stored(&Value::text("5")).is_err());
        assert!(default_registry().resolve("integer", &params(&["10", "1"])).is_err());
    }

    #[test]
    fn test_decimal_scale() {
        let ty = DataType::Decimal { scale: Some(2) };
        assert_eq!(ty.to_stored(&Value::Decimal(1.5)).unwrap(), "1.50");
        assert_eq!(ty.to_stored(&Value::Integer(3)).unwrap(), "3.00");
        assert_eq!(ty.from_stored("1.50").unwrap(), Value::Decimal(1.5));
    }

    #[test]
    fn test_boolean_reads_flags() {
        let ty = DataType::Boolean;
        assert_eq!(ty.from_stored("Y").unwrap(), Value::Boolean(true));
        assert_eq!(ty.from_stored("n").unwrap(), Value::Boolean(false));
        assert_eq!(ty.from_stored("TRUE").unwrap(), Value::Boolean(true));
        assert!(ty.from_stored("maybe").is_err());
        assert_eq!(ty.to_stored(&Value::Boolean(false)).unwrap(), "false");
    }

    #[test]
    fn test_choice() {
        let ty = DataType::choice(["red", "green"]);
        assert!(ty.to_stored(&Value::text("red")).is_ok());
        assert!(ty.to_stored(&Value::text("blue")).is_err());
        // Reads stay lenient so removed options still load.
        assert_eq!(ty.from_stored("blue").unwrap(), Value::text("blue"));
        assert!(default_registry().resolve("choice", &[]).is_err());
    }

    #[test]
    fn test_text_max_length() {
        let ty = DataType::Text { max_length: Some(3) };
        assert!(ty.to_stored(&Value::text("abc")).is_ok());
        assert!(ty.to_stored(&Value::text("abcd")).is_err());
    }
}

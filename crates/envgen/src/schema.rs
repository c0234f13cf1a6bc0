// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Variable schema declarations and typed values.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

#[cfg(test)]
#[path = "./schema_test.rs"]
mod schema_test;

/// Declared type of a variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    #[default]
    String,
    Number,
    Boolean,
    Array,
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
        };
        f.write_str(name)
    }
}

/// A typed variable value.
///
/// Deserialization is untagged so YAML scalars map onto the matching
/// variant; quoted scalars always become strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<String>),
}

impl Value {
    /// The variable type this value satisfies.
    pub fn kind(&self) -> VariableType {
        match self {
            Self::Boolean(_) => VariableType::Boolean,
            Self::Number(_) => VariableType::Number,
            Self::String(_) => VariableType::String,
            Self::Array(_) => VariableType::Array,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Numbers without a fractional part are written as integers.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Renders the value the way it appears in a `.env` file.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => f.write_str(&items.join(",")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => items.serialize(serializer),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Self::Array(value)
    }
}

/// Outcome of a programmatic validator.
///
/// `true` and `false` convert to accept and a bare reject, a string converts
/// to a reject carrying that message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(Option<String>),
}

impl From<bool> for Verdict {
    fn from(ok: bool) -> Self {
        if ok { Self::Accept } else { Self::Reject(None) }
    }
}

impl From<String> for Verdict {
    fn from(message: String) -> Self {
        Self::Reject(Some(message))
    }
}

impl From<&str> for Verdict {
    fn from(message: &str) -> Self {
        Self::Reject(Some(message.to_string()))
    }
}

impl From<std::result::Result<(), String>> for Verdict {
    fn from(result: std::result::Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::Accept,
            Err(message) => Self::Reject(Some(message)),
        }
    }
}

pub type ValidateFn = Arc<dyn Fn(&Value) -> Verdict + Send + Sync>;
pub type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Programmatic hooks attached from Rust code; never serialized.
#[derive(Clone, Default)]
pub struct Hooks {
    validate: Option<ValidateFn>,
    transform: Option<TransformFn>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("validate", &self.validate.is_some())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Declarative constraint on a value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Min(f64),
    Max(f64),
    MinLength(usize),
    MaxLength(usize),
    Pattern(String),
    OneOf(Vec<String>),
}

impl Check {
    /// Whether this check makes sense for a variable of type `kind`.
    pub fn applies_to(&self, kind: VariableType) -> bool {
        match self {
            Self::Min(_) | Self::Max(_) => kind == VariableType::Number,
            Self::MinLength(_) | Self::MaxLength(_) | Self::Pattern(_) => {
                matches!(kind, VariableType::String | VariableType::Array)
            }
            Self::OneOf(_) => kind != VariableType::Boolean,
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Min(min), Value::Number(n)) => n >= min,
            (Self::Max(max), Value::Number(n)) => n <= max,
            (Self::MinLength(min), Value::String(s)) => s.chars().count() >= *min,
            (Self::MaxLength(max), Value::String(s)) => s.chars().count() <= *max,
            (Self::MinLength(min), Value::Array(items)) => items.len() >= *min,
            (Self::MaxLength(max), Value::Array(items)) => items.len() <= *max,
            (Self::Pattern(pattern), Value::String(s)) => matches_pattern(pattern, s),
            (Self::Pattern(pattern), Value::Array(items)) => {
                items.iter().all(|item| matches_pattern(pattern, item))
            }
            (Self::OneOf(allowed), Value::Array(items)) => {
                items.iter().all(|item| allowed.contains(item))
            }
            (Self::OneOf(allowed), other) => allowed.contains(&other.to_string()),
            _ => false,
        }
    }
}

fn matches_pattern(pattern: &str, candidate: &str) -> bool {
    // config validation rejects patterns that do not compile
    regex::Regex::new(pattern).is_ok_and(|re| re.is_match(candidate))
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Min(n) => write!(f, "must be at least {}", format_number(*n)),
            Self::Max(n) => write!(f, "must be at most {}", format_number(*n)),
            Self::MinLength(n) => write!(f, "must have a length of at least {n}"),
            Self::MaxLength(n) => write!(f, "must have a length of at most {n}"),
            Self::Pattern(p) => write!(f, "must match pattern {p}"),
            Self::OneOf(allowed) => write!(f, "must be one of: {}", allowed.join(", ")),
        }
    }
}

/// A check plus the message reported when it fails.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Rule {
    #[serde(flatten)]
    pub check: Check,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Rule {
    pub fn new(check: Check) -> Self {
        Self {
            check,
            message: None,
        }
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn evaluate(&self, value: &Value) -> Verdict {
        if self.check.accepts(value) {
            Verdict::Accept
        } else {
            Verdict::Reject(Some(
                self.message
                    .clone()
                    .unwrap_or_else(|| format!("value '{value}' {}", self.check)),
            ))
        }
    }
}

/// Declarative transformation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    Trim,
    Lowercase,
    Uppercase,
}

impl Transform {
    /// Applies to strings and array elements, other values pass through.
    pub fn apply(self, value: Value) -> Value {
        let step = |s: &str| match self {
            Self::Trim => s.trim().to_string(),
            Self::Lowercase => s.to_lowercase(),
            Self::Uppercase => s.to_uppercase(),
        };
        match value {
            Value::String(s) => Value::String(step(&s)),
            Value::Array(items) => Value::Array(items.iter().map(|s| step(s)).collect()),
            other => other,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !value
}

/// Static description of one variable in a project.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VariableSchema {
    /// Declared type, defaults to string.
    #[serde(rename = "type", default)]
    pub kind: VariableType,

    /// Value used when no source provides one. Must match `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Fail resolution when no value is available.
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Marks secrets. Generators may mask or avoid inlining these.
    #[serde(default, skip_serializing_if = "is_false")]
    pub sensitive: bool,

    /// Declarative validation rules, checked in order.
    #[serde(default, rename = "validate", skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,

    /// Declarative transforms, applied in order before validation.
    #[serde(default, rename = "transform", skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<Transform>,

    /// Name of a variable in the project's base project to read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(skip)]
    hooks: Hooks,
}

impl VariableSchema {
    pub fn new(kind: VariableType) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::new(VariableType::String)
    }

    pub fn number() -> Self {
        Self::new(VariableType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(VariableType::Boolean)
    }

    pub fn array() -> Self {
        Self::new(VariableType::Array)
    }

    pub fn with_default<V: Into<Value>>(mut self, value: V) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn describe<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn transform(mut self, step: Transform) -> Self {
        self.transforms.push(step);
        self
    }

    /// Read the value from `variable` in the base project.
    pub fn from_base<S: Into<String>>(mut self, variable: S) -> Self {
        self.from = Some(variable.into());
        self
    }

    /// Attach a programmatic validator, run after the declarative rules.
    pub fn validate_with<F, V>(mut self, validate: F) -> Self
    where
        F: Fn(&Value) -> V + Send + Sync + 'static,
        V: Into<Verdict>,
    {
        self.hooks.validate = Some(Arc::new(move |value| validate(value).into()));
        self
    }

    /// Attach a programmatic transform, run after the declarative steps.
    pub fn transform_with<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.hooks.transform = Some(Arc::new(transform));
        self
    }

    /// True when the variable may be absent from resolved output.
    pub fn is_optional(&self) -> bool {
        !self.required && self.default.is_none()
    }

    pub(crate) fn apply_transforms(&self, value: Value) -> Value {
        let value = self
            .transforms
            .iter()
            .fold(value, |value, step| step.apply(value));
        match &self.hooks.transform {
            Some(transform) => transform(value),
            None => value,
        }
    }

    /// Run every rule then the validator hook, returning the first rejection.
    pub(crate) fn check(&self, value: &Value) -> Verdict {
        for rule in &self.rules {
            let verdict = rule.evaluate(value);
            if verdict != Verdict::Accept {
                return verdict;
            }
        }
        match &self.hooks.validate {
            Some(validate) => validate(value),
            None => Verdict::Accept,
        }
    }
}

//! Function references and signatures
//!
//! Schemas name functions with a small text language:
//!
//! - `trim` calls one function without arguments
//! - `round:2` passes arguments after the first `:`, separated by `,`
//! - `trim|lower` pipes transforms left to right
//!
//! `\,` and `\|` escape the separators inside arguments. Arguments that parse
//! as JSON (`2`, `true`, `null`, `"quoted"`) keep their JSON type; anything
//! else is passed as a string. References are parsed once, when the schema is
//! built or deserialized.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error as ThisError;

use crate::context::TransformContext;
use crate::{Error, Result};

/// Failure raised by a transform, condition, or validation function
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FunctionError {
    message: String,
}

impl FunctionError {
    /// Create a function error with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type returned by registered functions
pub type FunctionResult<T> = std::result::Result<T, FunctionError>;

/// Transform signature: `(value, row, context, args) -> value`
pub type TransformFn = Arc<
    dyn Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<Value>
        + Send
        + Sync,
>;

/// Predicate signature shared by conditions and validations:
/// `(value, row, context, args) -> bool`
pub type PredicateFn = Arc<
    dyn Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<bool>
        + Send
        + Sync,
>;

/// Condition signature
pub type ConditionFn = PredicateFn;

/// Validation signature; `row` is the transformed record
pub type ValidationFn = PredicateFn;

/// One parsed function stage: a name plus its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Value>,
}

impl FunctionCall {
    /// Create a call without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Create a call with arguments
    pub fn with_args(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl FromStr for FunctionCall {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_stage(s)
    }
}

impl FunctionCall {
    /// Write the call in reference syntax. Pipes only need escaping inside
    /// transform pipelines; predicates are never split on them.
    fn write_reference(&self, f: &mut fmt::Formatter<'_>, escape_pipes: bool) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| match arg {
                Value::String(s) if escape_pipes => s.replace(',', "\\,").replace('|', "\\|"),
                Value::String(s) => s.replace(',', "\\,"),
                other => other.to_string(),
            })
            .collect();
        write!(f, ":{}", args.join(","))
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_reference(f, true)
    }
}

fn parse_stage(text: &str) -> Result<FunctionCall> {
    let text = text.trim();
    let (name, raw_args) = match text.split_once(':') {
        Some((name, args)) => (name.trim(), Some(args)),
        None => (text, None),
    };

    if name.is_empty() {
        return Err(Error::invalid_function_ref(text, "missing function name"));
    }
    if name.contains(char::is_whitespace) {
        return Err(Error::invalid_function_ref(
            text,
            "function names cannot contain whitespace",
        ));
    }

    let args = raw_args
        .map(|raw| split_unescaped(raw, ','))
        .unwrap_or_default()
        .into_iter()
        .map(|arg| parse_arg(&arg))
        .collect();

    Ok(FunctionCall::with_args(name, args))
}

fn parse_arg(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Split on `separator`, turning `\separator` into a literal separator.
/// Other escapes are left untouched for later stages.
fn split_unescaped(raw: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&separator) {
            current.push(separator);
            chars.next();
        } else if ch == separator {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    parts.push(current);
    parts
}

/// Reference to a transform: a named pipeline or an inline closure
#[derive(Clone)]
pub enum TransformRef {
    /// Ordered stages; each stage's output feeds the next
    Pipeline(Vec<FunctionCall>),
    /// Caller-supplied closure
    Inline(TransformFn),
}

impl TransformRef {
    /// Wrap a closure as an inline transform
    pub fn inline(
        func: impl Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<Value>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self::Inline(Arc::new(func))
    }

    /// Named stages of this reference; empty for inline transforms
    #[must_use]
    pub fn stages(&self) -> &[FunctionCall] {
        match self {
            Self::Pipeline(stages) => stages,
            Self::Inline(_) => &[],
        }
    }
}

impl FromStr for TransformRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::invalid_function_ref(s, "empty transform"));
        }
        let stages = split_unescaped(s, '|')
            .iter()
            .map(|stage| parse_stage(stage))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::Pipeline(stages))
    }
}

impl fmt::Display for TransformRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pipeline(stages) => {
                for (index, stage) in stages.iter().enumerate() {
                    if index > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{stage}")?;
                }
                Ok(())
            }
            Self::Inline(_) => f.write_str("<inline>"),
        }
    }
}

impl fmt::Debug for TransformRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pipeline(stages) => f.debug_tuple("Pipeline").field(stages).finish(),
            Self::Inline(_) => f.write_str("Inline(<fn>)"),
        }
    }
}

impl Serialize for TransformRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Pipeline(_) => serializer.serialize_str(&self.to_string()),
            Self::Inline(_) => Err(serde::ser::Error::custom(
                "inline transforms cannot be serialized",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for TransformRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Reference to a condition or validation predicate
#[derive(Clone)]
pub enum PredicateRef {
    /// A single named function; pipes are not split for predicates
    Named(FunctionCall),
    /// Caller-supplied closure
    Inline(PredicateFn),
}

/// Field-mapping and filter conditions
pub type ConditionRef = PredicateRef;

/// Row validation rule functions
pub type RuleRef = PredicateRef;

impl PredicateRef {
    /// Wrap a closure as an inline predicate
    pub fn inline(
        func: impl Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<bool>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self::Inline(Arc::new(func))
    }

    /// Name of the referenced function, if it is a named reference
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(call) => Some(&call.name),
            Self::Inline(_) => None,
        }
    }
}

impl FromStr for PredicateRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_stage(s).map(Self::Named)
    }
}

impl fmt::Display for PredicateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(call) => call.write_reference(f, false),
            Self::Inline(_) => f.write_str("<inline>"),
        }
    }
}

impl fmt::Debug for PredicateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(call) => f.debug_tuple("Named").field(call).finish(),
            Self::Inline(_) => f.write_str("Inline(<fn>)"),
        }
    }
}

impl Serialize for PredicateRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Named(call) => serializer.serialize_str(&call.to_string()),
            Self::Inline(_) => Err(serde::ser::Error::custom(
                "inline predicates cannot be serialized",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for PredicateRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

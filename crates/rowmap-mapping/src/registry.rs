//! Function registry
//!
//! Three independent namespaces (transforms, conditions, validations) map
//! names to shared closures. Registering a name that already exists
//! replaces the previous function.

use rowmap_schema::{
    ConditionFn, ConditionRef, DataMappingSchema, FunctionResult, GlobalTransform, PredicateFn,
    PredicateRef, RuleRef, TransformContext, TransformFn, TransformRef, ValidationFn,
};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{Error, Result};

const NO_ARGS: &[Value] = &[];

/// The three kinds of registered functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Transform,
    Condition,
    Validation,
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform => f.write_str("transform"),
            Self::Condition => f.write_str("condition"),
            Self::Validation => f.write_str("validation"),
        }
    }
}

/// Registry resolving function names used by schemas
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    transforms: HashMap<String, TransformFn>,
    conditions: HashMap<String, ConditionFn>,
    validations: HashMap<String, ValidationFn>,
}

impl FunctionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in function registered
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::register_all(&mut registry);
        registry
    }

    /// Register a transform
    pub fn register_transform(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<Value>
        + Send
        + Sync
        + 'static,
    ) -> &mut Self {
        self.transforms.insert(name.into(), Arc::new(func));
        self
    }

    /// Register a transform that only looks at the value and its arguments
    pub fn register_value_transform(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &[Value]) -> FunctionResult<Value> + Send + Sync + 'static,
    ) -> &mut Self {
        self.register_transform(name, move |value, _, _, args| func(value, args))
    }

    /// Register a condition
    pub fn register_condition(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<bool>
        + Send
        + Sync
        + 'static,
    ) -> &mut Self {
        self.conditions.insert(name.into(), Arc::new(func));
        self
    }

    /// Register a condition that only looks at the value and its arguments
    pub fn register_value_condition(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &[Value]) -> FunctionResult<bool> + Send + Sync + 'static,
    ) -> &mut Self {
        self.register_condition(name, move |value, _, _, args| func(value, args))
    }

    /// Register a validation; the second argument is the transformed record
    pub fn register_validation(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &Value, &mut TransformContext<'_>, &[Value]) -> FunctionResult<bool>
        + Send
        + Sync
        + 'static,
    ) -> &mut Self {
        self.validations.insert(name.into(), Arc::new(func));
        self
    }

    /// Register a validation that only looks at the value and its arguments
    pub fn register_value_validation(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &[Value]) -> FunctionResult<bool> + Send + Sync + 'static,
    ) -> &mut Self {
        self.register_validation(name, move |value, _, _, args| func(value, args))
    }

    /// Check if a function exists
    #[must_use]
    pub fn contains(&self, kind: FunctionKind, name: &str) -> bool {
        match kind {
            FunctionKind::Transform => self.transforms.contains_key(name),
            FunctionKind::Condition => self.conditions.contains_key(name),
            FunctionKind::Validation => self.validations.contains_key(name),
        }
    }

    /// Registered names of one kind, sorted
    #[must_use]
    pub fn names(&self, kind: FunctionKind) -> Vec<String> {
        let mut names: Vec<String> = match kind {
            FunctionKind::Transform => self.transforms.keys().cloned().collect(),
            FunctionKind::Condition => self.conditions.keys().cloned().collect(),
            FunctionKind::Validation => self.validations.keys().cloned().collect(),
        };
        names.sort();
        names
    }

    /// Look up a transform
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFunction`] if the name is not registered.
    pub fn transform(&self, name: &str) -> Result<&TransformFn> {
        self.transforms
            .get(name)
            .ok_or_else(|| Error::unknown_function(FunctionKind::Transform, name))
    }

    fn predicate(&self, kind: FunctionKind, name: &str) -> Result<&PredicateFn> {
        let table = match kind {
            FunctionKind::Condition => &self.conditions,
            FunctionKind::Validation => &self.validations,
            FunctionKind::Transform => return Err(Error::unknown_function(kind, name)),
        };
        table.get(name).ok_or_else(|| Error::unknown_function(kind, name))
    }

    /// Apply a transform reference to a value
    ///
    /// Pipeline stages run left to right; each stage receives the previous
    /// stage's output, while `row` and `context` are the same for every stage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFunction`] for an unregistered stage, or
    /// [`Error::Function`] when a stage fails. Later stages do not run.
    pub fn apply_transform(
        &self,
        transform: &TransformRef,
        value: Value,
        row: &Value,
        context: &mut TransformContext<'_>,
    ) -> Result<Value> {
        match transform {
            TransformRef::Pipeline(stages) => {
                let mut current = value;
                for stage in stages {
                    let func = self.transform(&stage.name)?;
                    current = func(&current, row, context, &stage.args).map_err(|source| {
                        Error::Function {
                            name: stage.name.clone(),
                            source,
                        }
                    })?;
                }
                Ok(current)
            }
            TransformRef::Inline(func) => {
                func(&value, row, context, NO_ARGS).map_err(|source| Error::Function {
                    name: "<inline>".to_string(),
                    source,
                })
            }
        }
    }

    /// Evaluate a condition reference
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFunction`] or [`Error::Function`].
    pub fn evaluate_condition(
        &self,
        condition: &ConditionRef,
        value: &Value,
        row: &Value,
        context: &mut TransformContext<'_>,
    ) -> Result<bool> {
        self.evaluate(FunctionKind::Condition, condition, value, row, context)
    }

    /// Evaluate a validation rule against a transformed record
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFunction`] or [`Error::Function`].
    pub fn evaluate_validation(
        &self,
        rule: &RuleRef,
        value: &Value,
        record: &Value,
        context: &mut TransformContext<'_>,
    ) -> Result<bool> {
        self.evaluate(FunctionKind::Validation, rule, value, record, context)
    }

    fn evaluate(
        &self,
        kind: FunctionKind,
        predicate: &PredicateRef,
        value: &Value,
        row: &Value,
        context: &mut TransformContext<'_>,
    ) -> Result<bool> {
        let (name, func, args) = match predicate {
            PredicateRef::Named(call) => (
                call.name.as_str(),
                self.predicate(kind, &call.name)?,
                call.args.as_slice(),
            ),
            PredicateRef::Inline(func) => ("<inline>", func, NO_ARGS),
        };
        func(value, row, context, args).map_err(|source| Error::Function {
            name: name.to_string(),
            source,
        })
    }

    /// Every function name `schema` references that is not registered,
    /// in schema order and without duplicates
    #[must_use]
    pub fn check_schema(&self, schema: &DataMappingSchema) -> Vec<(FunctionKind, String)> {
        let mut referenced: Vec<(FunctionKind, &str)> = Vec::new();

        for transform in &schema.global_transforms {
            if let GlobalTransform::Filter { condition } = transform {
                referenced.extend(condition.name().map(|n| (FunctionKind::Condition, n)));
            }
        }
        for field in &schema.fields {
            if let Some(condition) = &field.condition {
                referenced.extend(condition.name().map(|n| (FunctionKind::Condition, n)));
            }
            if let Some(transform) = &field.transform {
                referenced.extend(
                    transform
                        .stages()
                        .iter()
                        .map(|stage| (FunctionKind::Transform, stage.name.as_str())),
                );
            }
        }
        for rule in &schema.validation {
            referenced.extend(rule.rule.name().map(|n| (FunctionKind::Validation, n)));
        }

        let mut unknown: Vec<(FunctionKind, String)> = Vec::new();
        for (kind, name) in referenced {
            if !self.contains(kind, name) && !unknown.iter().any(|(k, n)| *k == kind && n == name) {
                unknown.push((kind, name.to_string()));
            }
        }
        unknown
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("transforms", &self.names(FunctionKind::Transform))
            .field("conditions", &self.names(FunctionKind::Condition))
            .field("validations", &self.names(FunctionKind::Validation))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_schema::{FieldMapping, FunctionError, SourceType, TargetType, ValidationRule};
    use serde_json::{json, Map};

    fn with_context<R>(row: &Value, f: impl FnOnce(&mut TransformContext<'_>) -> R) -> R {
        let rows = std::slice::from_ref(row);
        let mut metadata = Map::new();
        let mut context = TransformContext::new(rows, &rows[0], 0, &[], &mut metadata);
        f(&mut context)
    }

    #[test]
    fn test_pipeline_threads_values() {
        let mut registry = FunctionRegistry::new();
        registry
            .register_value_transform("double", |v, _| {
                Ok(json!(v.as_i64().unwrap_or_default() * 2))
            })
            .register_value_transform("add", |v, args| {
                Ok(json!(v.as_i64().unwrap_or_default() + args[0].as_i64().unwrap_or_default()))
            });

        let pipeline: TransformRef = "double|add:3|double".parse().unwrap();
        let row = json!({});
        let out = with_context(&row, |ctx| {
            registry.apply_transform(&pipeline, json!(5), &row, ctx)
        })
        .unwrap();
        assert_eq!(out, json!(26));
    }

    #[test]
    fn test_unknown_transform() {
        let registry = FunctionRegistry::new();
        let pipeline: TransformRef = "missing".parse().unwrap();
        let row = json!({});
        let err = with_context(&row, |ctx| {
            registry.apply_transform(&pipeline, Value::Null, &row, ctx)
        })
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownFunction { kind: FunctionKind::Transform, ref name } if name == "missing"
        ));
    }

    #[test]
    fn test_failing_stage_stops_pipeline() {
        let mut registry = FunctionRegistry::new();
        registry
            .register_value_transform("fail", |_, _| Err(FunctionError::new("boom")))
            .register_value_transform("never", |_, _| panic!("must not run"));

        let pipeline: TransformRef = "fail|never".parse().unwrap();
        let row = json!({});
        let err = with_context(&row, |ctx| {
            registry.apply_transform(&pipeline, Value::Null, &row, ctx)
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Function 'fail' failed: boom");
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = FunctionRegistry::new();
        registry.register_value_transform("pick", |_, _| Ok(json!(1)));
        registry.register_value_transform("pick", |_, _| Ok(json!(2)));

        let pipeline: TransformRef = "pick".parse().unwrap();
        let row = json!({});
        let out = with_context(&row, |ctx| {
            registry.apply_transform(&pipeline, Value::Null, &row, ctx)
        })
        .unwrap();
        assert_eq!(out, json!(2));
        assert_eq!(registry.names(FunctionKind::Transform), vec!["pick"]);
    }

    #[test]
    fn test_namespaces_are_separate() {
        let mut registry = FunctionRegistry::new();
        registry.register_value_condition("check", |_, _| Ok(true));

        let rule: RuleRef = "check".parse().unwrap();
        let row = json!({});
        let err = with_context(&row, |ctx| {
            registry.evaluate_validation(&rule, &Value::Null, &row, ctx)
        })
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownFunction { kind: FunctionKind::Validation, .. }
        ));
        assert!(registry.contains(FunctionKind::Condition, "check"));
    }

    #[test]
    fn test_condition_sees_row() {
        let mut registry = FunctionRegistry::new();
        registry.register_condition("rowHasFlag", |_, row, _, _| {
            Ok(row.get("flag").is_some())
        });
        let condition: ConditionRef = "rowHasFlag".parse().unwrap();

        let row = json!({"flag": true});
        let passed = with_context(&row, |ctx| {
            registry.evaluate_condition(&condition, &Value::Null, &row, ctx)
        })
        .unwrap();
        assert!(passed);
    }

    #[test]
    fn test_inline_transform_needs_no_registration() {
        let registry = FunctionRegistry::new();
        let inline = TransformRef::inline(|value, _, ctx, _| {
            Ok(json!(format!("{}#{}", value.as_str().unwrap_or(""), ctx.row_number())))
        });
        let row = json!({});
        let out = with_context(&row, |ctx| {
            registry.apply_transform(&inline, json!("x"), &row, ctx)
        })
        .unwrap();
        assert_eq!(out, json!("x#1"));
    }

    #[test]
    fn test_check_schema_lists_unknown_names_once() {
        let registry = FunctionRegistry::with_builtins();
        let schema = DataMappingSchema::new("s", "s", SourceType::Json, TargetType::User)
            .with_global_transform(GlobalTransform::filter("isVip").unwrap())
            .with_field(
                FieldMapping::new("a", "a")
                    .unwrap()
                    .with_transform("trim|shout|shout")
                    .unwrap(),
            )
            .with_field(
                FieldMapping::new("b", "b")
                    .unwrap()
                    .with_condition("notEmpty")
                    .unwrap(),
            )
            .with_rule(
                ValidationRule::new("a", "loud", "not loud", rowmap_schema::Severity::Error)
                    .unwrap(),
            );

        let unknown = registry.check_schema(&schema);
        assert_eq!(
            unknown,
            vec![
                (FunctionKind::Condition, "isVip".to_string()),
                (FunctionKind::Transform, "shout".to_string()),
                (FunctionKind::Validation, "loud".to_string()),
            ]
        );
    }
}

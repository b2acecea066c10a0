//! Schema resolution.
//!
//! Turns a raw JSON-Schema document (with `$defs`/`definitions` and local
//! `$ref` pointers) into a fully-inlined [`SchemaNode`] tree. Resolution is
//! pure; [`SchemaResolver`] adds a per-process cache keyed by document class
//! and a structural hash of the raw schema.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::method::EvaluationMethod;
use super::node::{EvaluationDirectives, NodeKind, ScalarType, SchemaNode};
use crate::domain::foundation::{ComparisonConfigError, EngineError, SchemaResolutionError};

const KEY_METHOD: &str = "x-eval-method";
const KEY_THRESHOLD: &str = "x-eval-threshold";
const KEY_WEIGHT: &str = "x-eval-weight";
const KEY_CONFIDENCE: &str = "x-confidence-threshold";

/// A resolved schema for one document class.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    pub document_class: String,
    pub root: SchemaNode,
    /// Hex SHA-256 of the raw schema this was resolved from.
    pub fingerprint: String,
}

impl ResolvedSchema {
    /// Top-level properties in schema order.
    pub fn properties(&self) -> &[SchemaNode] {
        self.root.properties()
    }
}

/// Structural hash of a raw schema document.
pub fn schema_fingerprint(schema: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(schema.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Resolves a raw schema document. Pure: the same input always yields the
/// same tree.
pub fn resolve_schema(document_class: &str, schema: &Value) -> Result<ResolvedSchema, EngineError> {
    let resolution = Resolution { root: schema };
    let mut stack = vec!["#".to_string()];
    let root = resolution.resolve_node(document_class, document_class, schema, &mut stack)?;
    if !root.is_object() {
        return Err(SchemaResolutionError::invalid(
            document_class,
            "root schema must describe an object",
        )
        .into());
    }
    Ok(ResolvedSchema {
        document_class: document_class.to_string(),
        root,
        fingerprint: schema_fingerprint(schema),
    })
}

struct Resolution<'a> {
    root: &'a Value,
}

impl<'a> Resolution<'a> {
    fn resolve_node(
        &self,
        name: &str,
        path: &str,
        value: &'a Value,
        stack: &mut Vec<String>,
    ) -> Result<SchemaNode, EngineError> {
        let obj = match value {
            Value::Object(obj) => obj,
            Value::Bool(true) => return Ok(SchemaNode::scalar(name, ScalarType::Unknown)),
            _ => {
                return Err(
                    SchemaResolutionError::invalid(path, "schema node must be an object").into(),
                )
            }
        };

        let mut node = match obj.get("$ref") {
            Some(reference) => self.follow_reference(name, path, reference, stack)?,
            None => self.resolve_inline(name, path, obj, stack)?,
        };

        // Keys next to a $ref override the referenced definition.
        if let Some(description) = obj.get("description").and_then(Value::as_str) {
            node.description = Some(description.to_string());
        }
        node.directives.overlay(&parse_directives(path, obj)?);
        validate_directives(path, &node)?;
        Ok(node)
    }

    fn follow_reference(
        &self,
        name: &str,
        path: &str,
        reference: &Value,
        stack: &mut Vec<String>,
    ) -> Result<SchemaNode, EngineError> {
        let reference = reference.as_str().ok_or_else(|| {
            SchemaResolutionError::invalid(path, "$ref must be a string")
        })?;
        let pointer = reference.strip_prefix('#').ok_or_else(|| {
            SchemaResolutionError::UnsupportedReference {
                reference: reference.to_string(),
            }
        })?;
        if stack.iter().any(|seen| seen == reference) {
            let mut chain = stack.clone();
            chain.push(reference.to_string());
            return Err(SchemaResolutionError::CyclicReference { chain }.into());
        }
        let target = self
            .root
            .pointer(pointer)
            .ok_or_else(|| SchemaResolutionError::unresolved(reference))?;

        stack.push(reference.to_string());
        let resolved = self.resolve_node(name, path, target, stack);
        stack.pop();
        resolved
    }

    fn resolve_inline(
        &self,
        name: &str,
        path: &str,
        obj: &'a Map<String, Value>,
        stack: &mut Vec<String>,
    ) -> Result<SchemaNode, EngineError> {
        let type_name = declared_type(path, obj)?;
        let kind = match type_name.as_deref() {
            Some("object") => self.resolve_object(path, obj, stack)?,
            Some("array") => self.resolve_array(name, path, obj, stack)?,
            Some(other) => NodeKind::Scalar(ScalarType::from_type_name(other)),
            None if obj.contains_key("properties") => self.resolve_object(path, obj, stack)?,
            None if obj.contains_key("items") => self.resolve_array(name, path, obj, stack)?,
            None => NodeKind::Scalar(ScalarType::Unknown),
        };
        Ok(SchemaNode {
            name: name.to_string(),
            description: None,
            kind,
            directives: EvaluationDirectives::default(),
        })
    }

    fn resolve_object(
        &self,
        path: &str,
        obj: &'a Map<String, Value>,
        stack: &mut Vec<String>,
    ) -> Result<NodeKind, EngineError> {
        let mut properties = Vec::new();
        if let Some(props) = obj.get("properties") {
            let props = props.as_object().ok_or_else(|| {
                SchemaResolutionError::invalid(path, "properties must be an object")
            })?;
            for (child_name, child) in props {
                let child_path = format!("{}.{}", path, child_name);
                properties.push(self.resolve_node(child_name, &child_path, child, stack)?);
            }
        }
        Ok(NodeKind::Object { properties })
    }

    fn resolve_array(
        &self,
        name: &str,
        path: &str,
        obj: &'a Map<String, Value>,
        stack: &mut Vec<String>,
    ) -> Result<NodeKind, EngineError> {
        let items = match obj.get("items") {
            None => SchemaNode::scalar(name, ScalarType::Unknown),
            Some(Value::Array(_)) => {
                return Err(SchemaResolutionError::invalid(
                    path,
                    "tuple-style items are not supported",
                )
                .into())
            }
            Some(items) => self.resolve_node(name, &format!("{}[]", path), items, stack)?,
        };
        Ok(NodeKind::Array {
            items: Box::new(items),
        })
    }
}

/// Reads `type`, taking the first non-null entry of a union.
fn declared_type(path: &str, obj: &Map<String, Value>) -> Result<Option<String>, EngineError> {
    match obj.get("type") {
        None => Ok(None),
        Some(Value::String(name)) => Ok(Some(name.clone())),
        Some(Value::Array(names)) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            Ok(names
                .iter()
                .find(|n| **n != "null")
                .or_else(|| names.first())
                .map(|n| n.to_string()))
        }
        Some(_) => Err(SchemaResolutionError::invalid(path, "type must be a string or array").into()),
    }
}

fn parse_directives(path: &str, obj: &Map<String, Value>) -> Result<EvaluationDirectives, EngineError> {
    let method = match obj.get(KEY_METHOD) {
        None => None,
        Some(Value::String(name)) => Some(name.parse::<EvaluationMethod>()?),
        Some(_) => {
            return Err(
                ComparisonConfigError::invalid_directive(path, KEY_METHOD, "must be a string").into(),
            )
        }
    };
    Ok(EvaluationDirectives {
        method,
        threshold: number_directive(path, obj, KEY_THRESHOLD)?,
        weight: number_directive(path, obj, KEY_WEIGHT)?,
        confidence_threshold: number_directive(path, obj, KEY_CONFIDENCE)?,
    })
}

fn number_directive(
    path: &str,
    obj: &Map<String, Value>,
    key: &str,
) -> Result<Option<f64>, EngineError> {
    match obj.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| ComparisonConfigError::invalid_directive(path, key, "must be a number").into()),
    }
}

fn validate_directives(path: &str, node: &SchemaNode) -> Result<(), EngineError> {
    let method = node.effective_method();
    let applicable = match method {
        EvaluationMethod::Llm => true,
        EvaluationMethod::Hungarian => node.is_array(),
        _ => node.is_scalar(),
    };
    if node.directives.method.is_some() && !applicable {
        return Err(ComparisonConfigError::MethodNotApplicable {
            method: method.to_string(),
            kind: node.kind.label().to_string(),
            path: path.to_string(),
        }
        .into());
    }

    let d = &node.directives;
    if let Some(threshold) = d.threshold {
        let valid = if method.threshold_is_tolerance() {
            threshold.is_finite() && threshold >= 0.0
        } else {
            (0.0..=1.0).contains(&threshold)
        };
        if !valid {
            let reason = if method.threshold_is_tolerance() {
                "tolerance must be a non-negative number"
            } else {
                "threshold must be within [0, 1]"
            };
            return Err(ComparisonConfigError::invalid_directive(path, KEY_THRESHOLD, reason).into());
        }
    }
    if let Some(weight) = d.weight {
        if !(weight.is_finite() && weight > 0.0) {
            return Err(ComparisonConfigError::invalid_directive(
                path,
                KEY_WEIGHT,
                "weight must be a positive number",
            )
            .into());
        }
    }
    if let Some(confidence) = d.confidence_threshold {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ComparisonConfigError::invalid_directive(
                path,
                KEY_CONFIDENCE,
                "confidence threshold must be within [0, 1]",
            )
            .into());
        }
    }
    Ok(())
}

/// Caching front for [`resolve_schema`].
///
/// Entries are keyed by document class and schema fingerprint, so a changed
/// schema for the same class is resolved afresh.
#[derive(Debug, Default)]
pub struct SchemaResolver {
    cache: RwLock<HashMap<(String, String), Arc<ResolvedSchema>>>,
}

impl SchemaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `schema`, reusing a cached result when the same class and
    /// schema content were resolved before.
    pub fn resolve(&self, document_class: &str, schema: &Value) -> Result<Arc<ResolvedSchema>, EngineError> {
        let key = (document_class.to_string(), schema_fingerprint(schema));
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            return Ok(Arc::clone(hit));
        }

        let resolved = Arc::new(resolve_schema(document_class, schema)?);
        tracing::debug!(
            document_class,
            properties = resolved.properties().len(),
            "Resolved schema"
        );
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Number of cached resolutions.
    pub fn cached_count(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

//! Resolved schema tree.
//!
//! A [`SchemaNode`] is the fully-resolved form of a JSON-Schema property:
//! every `$ref` has been inlined and every evaluation directive parsed.

use serde_json::{Map, Number, Value};

use super::method::{EvaluationMethod, MethodDefaults};

/// Value type of a scalar node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// A `type` keyword this engine does not interpret.
    Other(String),
    /// No `type` keyword at all.
    Unknown,
}

impl ScalarType {
    pub(crate) fn from_type_name(name: &str) -> Self {
        match name {
            "string" => ScalarType::String,
            "number" => ScalarType::Number,
            "integer" => ScalarType::Integer,
            "boolean" => ScalarType::Boolean,
            "null" => ScalarType::Null,
            other => ScalarType::Other(other.to_string()),
        }
    }

    /// The JSON-Schema `type` name, if any.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            ScalarType::String => Some("string"),
            ScalarType::Number => Some("number"),
            ScalarType::Integer => Some("integer"),
            ScalarType::Boolean => Some("boolean"),
            ScalarType::Null => Some("null"),
            ScalarType::Other(name) => Some(name),
            ScalarType::Unknown => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarType::Number | ScalarType::Integer)
    }
}

/// Structural kind of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar(ScalarType),
    Object { properties: Vec<SchemaNode> },
    Array { items: Box<SchemaNode> },
}

impl NodeKind {
    /// Short label used in errors and reports.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Scalar(_) => "scalar",
            NodeKind::Object { .. } => "object",
            NodeKind::Array { .. } => "array",
        }
    }
}

/// Evaluation directives attached to a node.
///
/// Only explicitly configured values are stored; defaults are applied by
/// the accessors on [`SchemaNode`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationDirectives {
    pub method: Option<EvaluationMethod>,
    pub threshold: Option<f64>,
    pub weight: Option<f64>,
    pub confidence_threshold: Option<f64>,
}

impl EvaluationDirectives {
    /// Overlays explicitly set values from `other` onto `self`.
    pub fn overlay(&mut self, other: &EvaluationDirectives) {
        if other.method.is_some() {
            self.method = other.method;
        }
        if other.threshold.is_some() {
            self.threshold = other.threshold;
        }
        if other.weight.is_some() {
            self.weight = other.weight;
        }
        if other.confidence_threshold.is_some() {
            self.confidence_threshold = other.confidence_threshold;
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &EvaluationDirectives::default()
    }
}

/// A resolved schema property.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub name: String,
    pub description: Option<String>,
    pub kind: NodeKind,
    pub directives: EvaluationDirectives,
}

impl SchemaNode {
    /// Creates a scalar node with no directives.
    pub fn scalar(name: impl Into<String>, value_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: NodeKind::Scalar(value_type),
            directives: EvaluationDirectives::default(),
        }
    }

    /// Creates an object node with no directives.
    pub fn object(name: impl Into<String>, properties: Vec<SchemaNode>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: NodeKind::Object { properties },
            directives: EvaluationDirectives::default(),
        }
    }

    /// Creates an array node with no directives.
    pub fn array(name: impl Into<String>, items: SchemaNode) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: NodeKind::Array {
                items: Box::new(items),
            },
            directives: EvaluationDirectives::default(),
        }
    }

    pub fn with_method(mut self, method: EvaluationMethod) -> Self {
        self.directives.method = Some(method);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.directives.threshold = Some(threshold);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.directives.weight = Some(weight);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, NodeKind::Scalar(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, NodeKind::Array { .. })
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, NodeKind::Object { .. })
    }

    /// Child properties of an object node; empty for other kinds.
    pub fn properties(&self) -> &[SchemaNode] {
        match &self.kind {
            NodeKind::Object { properties } => properties,
            _ => &[],
        }
    }

    /// Item schema of an array node.
    pub fn items(&self) -> Option<&SchemaNode> {
        match &self.kind {
            NodeKind::Array { items } => Some(items),
            _ => None,
        }
    }

    /// Looks up a direct child property by name.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties().iter().find(|p| p.name == name)
    }

    /// Whether this node is compared as a single value instead of being
    /// decomposed into its children.
    pub fn is_unit(&self) -> bool {
        match &self.kind {
            NodeKind::Scalar(_) => true,
            NodeKind::Object { properties } => {
                properties.is_empty() || self.directives.method == Some(EvaluationMethod::Llm)
            }
            NodeKind::Array { .. } => self.directives.method == Some(EvaluationMethod::Llm),
        }
    }

    /// The configured method, or the default for this node's kind.
    pub fn effective_method(&self) -> EvaluationMethod {
        if let Some(method) = self.directives.method {
            return method;
        }
        match &self.kind {
            NodeKind::Scalar(t) if t.is_numeric() => EvaluationMethod::NumericExact,
            NodeKind::Scalar(_) => EvaluationMethod::Exact,
            NodeKind::Array { .. } => EvaluationMethod::Hungarian,
            NodeKind::Object { .. } => EvaluationMethod::Llm,
        }
    }

    /// The configured threshold, or the default for the effective method.
    pub fn effective_threshold(&self, defaults: &MethodDefaults) -> f64 {
        self.directives
            .threshold
            .unwrap_or_else(|| defaults.threshold_for(self.effective_method()))
    }

    /// Weight in the weighted score. Defaults to 1.0.
    pub fn weight(&self) -> f64 {
        self.directives.weight.unwrap_or(1.0)
    }

    /// Number of scalar leaves reachable without crossing an array.
    pub fn leaf_count(&self) -> usize {
        match &self.kind {
            NodeKind::Object { properties } if !self.is_unit() => {
                properties.iter().map(SchemaNode::leaf_count).sum()
            }
            _ => 1,
        }
    }

    /// Renders the node back into JSON-Schema form, emitting only the keys
    /// this engine understands.
    pub fn to_schema_value(&self) -> Value {
        let mut map = Map::new();
        match &self.kind {
            NodeKind::Scalar(t) => {
                if let Some(name) = t.type_name() {
                    map.insert("type".into(), Value::String(name.to_string()));
                }
            }
            NodeKind::Object { properties } => {
                map.insert("type".into(), Value::String("object".into()));
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|p| (p.name.clone(), p.to_schema_value()))
                    .collect();
                map.insert("properties".into(), Value::Object(props));
            }
            NodeKind::Array { items } => {
                map.insert("type".into(), Value::String("array".into()));
                map.insert("items".into(), items.to_schema_value());
            }
        }
        if let Some(description) = &self.description {
            map.insert("description".into(), Value::String(description.clone()));
        }
        let d = &self.directives;
        if let Some(method) = d.method {
            map.insert("x-eval-method".into(), Value::String(method.as_str().into()));
        }
        insert_number(&mut map, "x-eval-threshold", d.threshold);
        insert_number(&mut map, "x-eval-weight", d.weight);
        insert_number(&mut map, "x-confidence-threshold", d.confidence_threshold);
        Value::Object(map)
    }
}

fn insert_number(map: &mut Map<String, Value>, key: &str, value: Option<f64>) {
    if let Some(number) = value.and_then(Number::from_f64) {
        map.insert(key.to_string(), Value::Number(number));
    }
}

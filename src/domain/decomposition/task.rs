//! Comparison tasks produced by the decomposer.

use serde_json::Value;

use crate::domain::foundation::TaskId;
use crate::domain::schema::SchemaNode;

/// What a task covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// A batch of top-level scalar attributes.
    ScalarBatch,
    /// One top-level object, or one top-level field compared as a unit.
    Group,
    /// One element of a top-level array.
    ListItem,
}

/// One attribute inside a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskAttribute {
    /// Dotted path, with `[i]` for list indices, e.g. `Items[2].Amount`.
    pub path: String,
    pub node: SchemaNode,
    /// Ground-truth value, `Null` when absent.
    pub expected: Value,
    /// Extracted value, `Null` when absent.
    pub actual: Value,
}

impl TaskAttribute {
    pub fn new(path: impl Into<String>, node: &SchemaNode, expected: Value, actual: Value) -> Self {
        Self {
            path: path.into(),
            node: node.clone(),
            expected,
            actual,
        }
    }
}

/// A unit of comparison or assessment work.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTask {
    pub id: TaskId,
    pub kind: TaskKind,
    /// Top-level property the task belongs to. `None` for scalar batches.
    pub property: Option<String>,
    /// Schema of the top-level property. `None` for scalar batches.
    pub node: Option<SchemaNode>,
    /// Array index for list items; `None` when the array was empty.
    pub item_index: Option<usize>,
    /// Expected sub-value, `None` when absent from the ground truth.
    pub expected: Option<Value>,
    /// Actual sub-value, `None` when absent from the extraction.
    pub actual: Option<Value>,
    pub attributes: Vec<TaskAttribute>,
}

impl ComparisonTask {
    /// Paths of the attributes in this task.
    pub fn attribute_paths(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.path.as_str()).collect()
    }

    pub fn is_list_item(&self) -> bool {
        self.kind == TaskKind::ListItem
    }
}

/// A scalar-or-unit leaf reached by walking an actual value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueLeaf<'a> {
    pub path: String,
    pub node: &'a SchemaNode,
    pub value: Value,
}

/// Walks `actual` along `node`, expanding objects and non-empty arrays into
/// their leaves. Units (scalars and LLM-compared structures) stay whole.
pub fn flatten_actual<'a>(node: &'a SchemaNode, actual: &Value, path: &str) -> Vec<ValueLeaf<'a>> {
    let mut leaves = Vec::new();
    collect_leaves(node, actual, path, &mut leaves);
    leaves
}

fn collect_leaves<'a>(node: &'a SchemaNode, actual: &Value, path: &str, out: &mut Vec<ValueLeaf<'a>>) {
    if node.is_unit() {
        out.push(ValueLeaf {
            path: path.to_string(),
            node,
            value: actual.clone(),
        });
        return;
    }
    if let Some(items) = node.items() {
        match actual.as_array() {
            Some(values) if !values.is_empty() => {
                for (index, value) in values.iter().enumerate() {
                    collect_leaves(items, value, &format!("{}[{}]", path, index), out);
                }
            }
            _ => out.push(ValueLeaf {
                path: path.to_string(),
                node,
                value: actual.clone(),
            }),
        }
        return;
    }
    for child in node.properties() {
        let value = actual.get(&child.name).cloned().unwrap_or(Value::Null);
        collect_leaves(child, &value, &format!("{}.{}", path, child.name), out);
    }
}

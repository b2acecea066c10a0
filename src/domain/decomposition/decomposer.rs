//! Splits a resolved schema plus instance data into comparison tasks.
//!
//! Top-level scalars are batched; each top-level object becomes one task
//! carrying all of its leaves; each top-level array becomes one task per
//! element. Task order follows schema property order, then array index.

use serde_json::Value;

use super::task::{ComparisonTask, TaskAttribute, TaskKind};
use crate::domain::foundation::TaskId;
use crate::domain::schema::{ResolvedSchema, SchemaNode};

/// Decomposer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecomposerConfig {
    /// Maximum number of scalar attributes per batch. Zero is treated as one.
    pub max_batch_size: usize,
}

impl Default for DecomposerConfig {
    fn default() -> Self {
        Self { max_batch_size: 5 }
    }
}

/// Task decomposer.
#[derive(Debug, Clone, Default)]
pub struct TaskDecomposer {
    config: DecomposerConfig,
}

impl TaskDecomposer {
    pub fn new(config: DecomposerConfig) -> Self {
        Self { config }
    }

    /// Decomposes `actual` (and, in evaluation mode, `expected`) into tasks.
    ///
    /// Without `expected`, list tasks are sized by the actual array only.
    pub fn decompose(
        &self,
        schema: &ResolvedSchema,
        actual: &Value,
        expected: Option<&Value>,
    ) -> Vec<ComparisonTask> {
        let mut builder = TaskBuilder::new(self.config.max_batch_size.max(1));

        for property in schema.properties() {
            let actual_value = actual.get(&property.name);
            let expected_value = expected.and_then(|e| e.get(&property.name));

            if property.is_scalar() {
                builder.push_scalar(property, expected_value, actual_value);
                continue;
            }
            builder.flush_batch();

            if property.is_array() && !property.is_unit() {
                builder.push_list(property, expected_value, actual_value, expected.is_some());
            } else {
                builder.push_group(property, expected_value, actual_value);
            }
        }
        builder.finish()
    }
}

struct TaskBuilder<'a> {
    max_batch_size: usize,
    tasks: Vec<ComparisonTask>,
    batch: Vec<(&'a SchemaNode, Option<&'a Value>, Option<&'a Value>)>,
}

impl<'a> TaskBuilder<'a> {
    fn new(max_batch_size: usize) -> Self {
        Self {
            max_batch_size,
            tasks: Vec::new(),
            batch: Vec::new(),
        }
    }

    fn next_id(&self) -> TaskId {
        TaskId::from_sequence(self.tasks.len() + 1)
    }

    fn push_scalar(&mut self, node: &'a SchemaNode, expected: Option<&'a Value>, actual: Option<&'a Value>) {
        self.batch.push((node, expected, actual));
        if self.batch.len() >= self.max_batch_size {
            self.flush_batch();
        }
    }

    fn flush_batch(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let mut expected = serde_json::Map::new();
        let mut actual = serde_json::Map::new();
        let mut attributes = Vec::with_capacity(self.batch.len());
        for (node, e, a) in self.batch.drain(..) {
            if let Some(e) = e {
                expected.insert(node.name.clone(), e.clone());
            }
            if let Some(a) = a {
                actual.insert(node.name.clone(), a.clone());
            }
            attributes.push(TaskAttribute::new(
                node.name.clone(),
                node,
                e.cloned().unwrap_or(Value::Null),
                a.cloned().unwrap_or(Value::Null),
            ));
        }
        let id = self.next_id();
        self.tasks.push(ComparisonTask {
            id,
            kind: TaskKind::ScalarBatch,
            property: None,
            node: None,
            item_index: None,
            expected: Some(Value::Object(expected)),
            actual: Some(Value::Object(actual)),
            attributes,
        });
    }

    fn push_group(&mut self, node: &SchemaNode, expected: Option<&Value>, actual: Option<&Value>) {
        let expected_value = expected.cloned().unwrap_or(Value::Null);
        let actual_value = actual.cloned().unwrap_or(Value::Null);
        let mut attributes = Vec::new();
        flatten_pair(node, &expected_value, &actual_value, &node.name, &mut attributes);
        let id = self.next_id();
        self.tasks.push(ComparisonTask {
            id,
            kind: TaskKind::Group,
            property: Some(node.name.clone()),
            node: Some(node.clone()),
            item_index: None,
            expected: expected.cloned(),
            actual: actual.cloned(),
            attributes,
        });
    }

    fn push_list(
        &mut self,
        node: &SchemaNode,
        expected: Option<&Value>,
        actual: Option<&Value>,
        evaluating: bool,
    ) {
        let empty = Vec::new();
        let expected_items = expected.and_then(Value::as_array).unwrap_or(&empty);
        let actual_items = actual.and_then(Value::as_array).unwrap_or(&empty);
        let count = if evaluating {
            expected_items.len().max(actual_items.len())
        } else {
            actual_items.len()
        };

        if count == 0 {
            let id = self.next_id();
            self.tasks.push(ComparisonTask {
                id,
                kind: TaskKind::ListItem,
                property: Some(node.name.clone()),
                node: Some(node.clone()),
                item_index: None,
                expected: expected.cloned(),
                actual: actual.cloned(),
                attributes: vec![TaskAttribute::new(
                    node.name.clone(),
                    node,
                    expected.cloned().unwrap_or(Value::Null),
                    actual.cloned().unwrap_or(Value::Null),
                )],
            });
            return;
        }

        let Some(item_node) = node.items() else {
            return;
        };
        for index in 0..count {
            let e = expected_items.get(index);
            let a = actual_items.get(index);
            let mut attributes = Vec::new();
            flatten_pair(
                item_node,
                e.unwrap_or(&Value::Null),
                a.unwrap_or(&Value::Null),
                &format!("{}[{}]", node.name, index),
                &mut attributes,
            );
            let id = self.next_id();
            self.tasks.push(ComparisonTask {
                id,
                kind: TaskKind::ListItem,
                property: Some(node.name.clone()),
                node: Some(node.clone()),
                item_index: Some(index),
                expected: e.cloned(),
                actual: a.cloned(),
                attributes,
            });
        }
    }

    fn finish(mut self) -> Vec<ComparisonTask> {
        self.flush_batch();
        self.tasks
    }
}

/// Walks a node, emitting one attribute per unit. Arrays below the top level
/// are kept whole.
fn flatten_pair(node: &SchemaNode, expected: &Value, actual: &Value, path: &str, out: &mut Vec<TaskAttribute>) {
    if node.is_unit() || node.is_array() {
        out.push(TaskAttribute::new(path, node, expected.clone(), actual.clone()));
        return;
    }
    for child in node.properties() {
        let e = expected.get(&child.name).unwrap_or(&Value::Null);
        let a = actual.get(&child.name).unwrap_or(&Value::Null);
        flatten_pair(child, e, a, &format!("{}.{}", path, child.name), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::resolve_schema;
    use serde_json::json;

    fn schema() -> ResolvedSchema {
        resolve_schema(
            "Invoice",
            &json!({
                "type": "object",
                "properties": {
                    "A": { "type": "string" },
                    "B": { "type": "string" },
                    "C": { "type": "string" },
                    "Vendor": {
                        "type": "object",
                        "properties": {
                            "Name": { "type": "string" },
                            "Address": {
                                "type": "object",
                                "properties": { "City": { "type": "string" } }
                            }
                        }
                    },
                    "Items": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "Sku": { "type": "string" },
                                "Qty": { "type": "integer" }
                            }
                        }
                    },
                    "D": { "type": "number" }
                }
            }),
        )
        .unwrap()
    }

    #[test]
    fn batches_scalars_up_to_limit() {
        let decomposer = TaskDecomposer::new(DecomposerConfig { max_batch_size: 2 });
        let tasks = decomposer.decompose(&schema(), &json!({}), Some(&json!({})));
        assert_eq!(tasks[0].kind, TaskKind::ScalarBatch);
        assert_eq!(tasks[0].attribute_paths(), vec!["A", "B"]);
        assert_eq!(tasks[1].attribute_paths(), vec!["C"]);
    }

    #[test]
    fn preserves_property_order_and_sequential_ids() {
        let tasks = TaskDecomposer::default().decompose(
            &schema(),
            &json!({ "Items": [{ "Sku": "x" }] }),
            Some(&json!({ "Items": [{ "Sku": "x" }, { "Sku": "y" }] })),
        );
        let kinds: Vec<_> = tasks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TaskKind::ScalarBatch,
                TaskKind::Group,
                TaskKind::ListItem,
                TaskKind::ListItem,
                TaskKind::ScalarBatch,
            ]
        );
        let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["task-0001", "task-0002", "task-0003", "task-0004", "task-0005"]);
    }

    #[test]
    fn group_carries_nested_leaves() {
        let tasks = TaskDecomposer::default().decompose(
            &schema(),
            &json!({ "Vendor": { "Name": "Acme", "Address": { "City": "Oslo" } } }),
            None,
        );
        let group = tasks.iter().find(|t| t.kind == TaskKind::Group).unwrap();
        assert_eq!(group.attribute_paths(), vec!["Vendor.Name", "Vendor.Address.City"]);
        assert_eq!(group.attributes[1].actual, json!("Oslo"));
    }

    #[test]
    fn list_items_cover_longer_side_when_evaluating() {
        let tasks = TaskDecomposer::default().decompose(
            &schema(),
            &json!({ "Items": [{ "Sku": "a", "Qty": 1 }] }),
            Some(&json!({ "Items": [{ "Sku": "a", "Qty": 1 }, { "Sku": "b", "Qty": 2 }] })),
        );
        let items: Vec<_> = tasks.iter().filter(|t| t.is_list_item()).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].item_index, Some(1));
        assert_eq!(items[1].actual, None);
        assert_eq!(items[1].attribute_paths(), vec!["Items[1].Sku", "Items[1].Qty"]);
        assert_eq!(items[1].attributes[0].actual, Value::Null);
    }

    #[test]
    fn list_items_follow_actual_when_assessing() {
        let tasks = TaskDecomposer::default().decompose(
            &schema(),
            &json!({ "Items": [{ "Sku": "a" }, { "Sku": "b" }, { "Sku": "c" }] }),
            None,
        );
        assert_eq!(tasks.iter().filter(|t| t.is_list_item()).count(), 3);
    }

    #[test]
    fn empty_list_yields_single_unit_task() {
        let tasks = TaskDecomposer::default().decompose(&schema(), &json!({ "Items": [] }), Some(&json!({})));
        let items: Vec<_> = tasks.iter().filter(|t| t.is_list_item()).collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_index, None);
        assert_eq!(items[0].attribute_paths(), vec!["Items"]);
    }

    #[test]
    fn every_leaf_is_covered_exactly_once() {
        let tasks = TaskDecomposer::new(DecomposerConfig { max_batch_size: 1 }).decompose(
            &schema(),
            &json!({}),
            Some(&json!({})),
        );
        let mut paths: Vec<String> = tasks
            .iter()
            .flat_map(|t| t.attributes.iter().map(|a| a.path.clone()))
            .collect();
        let total = paths.len();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), total);
        assert_eq!(
            paths,
            vec!["A", "B", "C", "D", "Items", "Vendor.Address.City", "Vendor.Name"]
        );
    }

    #[test]
    fn zero_batch_size_is_treated_as_one() {
        let tasks = TaskDecomposer::new(DecomposerConfig { max_batch_size: 0 }).decompose(
            &schema(),
            &json!({}),
            None,
        );
        assert!(tasks
            .iter()
            .filter(|t| t.kind == TaskKind::ScalarBatch)
            .all(|t| t.attributes.len() == 1));
    }
}

//! SectionEvaluator - Evaluates one section against its ground truth.
//!
//! Resolves the section's schema, decomposes the values into tasks and runs
//! each unit of work through the worker pool: scalar batches and groups are
//! compared field by field, the list-item tasks of one array are matched
//! together. Configuration errors fail the section, never the caller.

use std::sync::Arc;

use serde_json::Value;

use super::list_matcher::ListMatcher;
use super::worker_pool::{TaskOutcome, WorkerPool};
use crate::domain::decomposition::{ComparisonTask, TaskDecomposer, TaskKind};
use crate::domain::evaluation::{AttributeResult, SectionResult};
use crate::domain::foundation::{
    ComparisonConfigError, EngineError, SchemaResolutionError, SectionId,
};
use crate::domain::schema::{SchemaNode, SchemaResolver};

/// Work unit: tasks that must be evaluated together.
enum EvaluationUnit<'a> {
    Scalars(&'a ComparisonTask),
    Group(&'a ComparisonTask),
    /// All list-item tasks of one array property, in index order.
    List {
        node: &'a SchemaNode,
        property: &'a str,
        tasks: Vec<&'a ComparisonTask>,
    },
}

/// Section evaluator.
pub struct SectionEvaluator {
    resolver: Arc<SchemaResolver>,
    decomposer: TaskDecomposer,
    matcher: Arc<ListMatcher>,
    pool: WorkerPool,
}

impl SectionEvaluator {
    pub fn new(
        resolver: Arc<SchemaResolver>,
        decomposer: TaskDecomposer,
        matcher: Arc<ListMatcher>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            resolver,
            decomposer,
            matcher,
            pool,
        }
    }

    /// Evaluates `actual` against `expected` under the class's schema.
    ///
    /// A missing or invalid schema, or a method whose endpoint is not
    /// configured, yields a failed section with all metrics zero.
    pub async fn evaluate(
        &self,
        section_id: SectionId,
        document_class: &str,
        schema: Option<&Value>,
        expected: &Value,
        actual: &Value,
    ) -> SectionResult {
        match self.try_evaluate(document_class, schema, expected, actual).await {
            Ok(attributes) => {
                let result = SectionResult::evaluated(section_id, document_class, attributes);
                tracing::info!(
                    section_id = %result.section_id,
                    document_class,
                    precision = result.metrics.precision,
                    recall = result.metrics.recall,
                    weighted_score = result.metrics.weighted_score,
                    "Section evaluated"
                );
                result
            }
            Err(error) => {
                tracing::warn!(
                    section_id = %section_id,
                    document_class,
                    error = %error,
                    "Section evaluation failed"
                );
                SectionResult::failed(section_id, document_class, &error)
            }
        }
    }

    async fn try_evaluate(
        &self,
        document_class: &str,
        schema: Option<&Value>,
        expected: &Value,
        actual: &Value,
    ) -> Result<Vec<AttributeResult>, EngineError> {
        let schema = schema.ok_or_else(|| SchemaResolutionError::MissingSchema {
            document_class: document_class.to_string(),
        })?;
        let resolved = self.resolver.resolve(document_class, schema)?;
        self.matcher.comparator().check_node(&resolved.root, "")?;

        let tasks = self.decomposer.decompose(&resolved, actual, Some(expected));
        let units: Vec<(usize, EvaluationUnit<'_>)> = group_units(&tasks).into_iter().enumerate().collect();
        tracing::debug!(tasks = tasks.len(), units = units.len(), "Decomposed section");

        let results = self
            .pool
            .run(units, None, |_, unit| self.evaluate_unit(unit))
            .await;

        let mut attributes = Vec::new();
        for (_, outcome) in results.into_outcomes() {
            if let TaskOutcome::Completed(unit_results) = outcome {
                attributes.extend(unit_results?);
            }
        }
        Ok(attributes)
    }

    async fn evaluate_unit(&self, unit: EvaluationUnit<'_>) -> Result<Vec<AttributeResult>, ComparisonConfigError> {
        match unit {
            EvaluationUnit::Scalars(task) => {
                let mut results = Vec::with_capacity(task.attributes.len());
                for attribute in &task.attributes {
                    tracing::debug!(task_id = %task.id, path = %attribute.path, "Comparing scalar");
                    results.push(
                        self.matcher
                            .compare_node(
                                attribute.path.clone(),
                                &attribute.node,
                                &attribute.expected,
                                &attribute.actual,
                                1.0,
                            )
                            .await?,
                    );
                }
                Ok(results)
            }
            EvaluationUnit::Group(task) => {
                let Some(node) = task.node.as_ref() else {
                    return Ok(Vec::new());
                };
                tracing::debug!(task_id = %task.id, property = %node.name, "Comparing group");
                let expected = task.expected.clone().unwrap_or(Value::Null);
                let actual = task.actual.clone().unwrap_or(Value::Null);
                let result = self
                    .matcher
                    .compare_node(node.name.clone(), node, &expected, &actual, 1.0)
                    .await?;
                Ok(vec![result])
            }
            EvaluationUnit::List { node, property, tasks } => {
                let (expected, actual) = list_values(&tasks);
                tracing::debug!(property, items = tasks.len(), "Matching list");
                let result = self
                    .matcher
                    .match_list(property.to_string(), node, &expected, &actual, 1.0)
                    .await?;
                Ok(vec![result])
            }
        }
    }
}

/// Groups consecutive list-item tasks of the same property.
fn group_units(tasks: &[ComparisonTask]) -> Vec<EvaluationUnit<'_>> {
    let mut units: Vec<EvaluationUnit<'_>> = Vec::new();
    for task in tasks {
        match task.kind {
            TaskKind::ScalarBatch => units.push(EvaluationUnit::Scalars(task)),
            TaskKind::Group => units.push(EvaluationUnit::Group(task)),
            TaskKind::ListItem => {
                let (Some(node), Some(property)) = (task.node.as_ref(), task.property.as_deref()) else {
                    continue;
                };
                if let Some(EvaluationUnit::List {
                    property: current,
                    tasks,
                    ..
                }) = units.last_mut()
                {
                    if *current == property {
                        tasks.push(task);
                        continue;
                    }
                }
                units.push(EvaluationUnit::List {
                    node,
                    property,
                    tasks: vec![task],
                });
            }
        }
    }
    units
}

/// Rebuilds the expected and actual arrays from list-item tasks.
fn list_values(tasks: &[&ComparisonTask]) -> (Value, Value) {
    match tasks.first() {
        // Empty on both sides: one task carrying the whole values.
        Some(task) if task.item_index.is_none() => (
            task.expected.clone().unwrap_or(Value::Null),
            task.actual.clone().unwrap_or(Value::Null),
        ),
        _ => (
            Value::Array(tasks.iter().filter_map(|t| t.expected.clone()).collect()),
            Value::Array(tasks.iter().filter_map(|t| t.actual.clone()).collect()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{ComparatorSettings, FieldComparator};
    use crate::domain::decomposition::DecomposerConfig;
    use crate::domain::evaluation::MatchCategory;
    use serde_json::json;

    fn evaluator() -> SectionEvaluator {
        let comparator = Arc::new(FieldComparator::new(ComparatorSettings::default()));
        SectionEvaluator::new(
            Arc::new(SchemaResolver::new()),
            TaskDecomposer::new(DecomposerConfig { max_batch_size: 2 }),
            Arc::new(ListMatcher::new(comparator, WorkerPool::with_workers(3))),
            WorkerPool::with_workers(3),
        )
    }

    fn section() -> SectionId {
        SectionId::new("s-1").unwrap()
    }

    fn invoice_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "InvoiceNumber": {"type": "string"},
                "Date": {"type": "string"},
                "Total": {"type": "number", "x-eval-threshold": 0.01, "x-eval-weight": 2},
                "Vendor": {"$ref": "#/$defs/Vendor"},
                "Lines": {"type": "array", "items": {"$ref": "#/$defs/Line"}}
            },
            "$defs": {
                "Vendor": {"type": "object", "properties": {"Name": {"type": "string", "x-eval-method": "FUZZY"}}},
                "Line": {"type": "object", "properties": {"Sku": {"type": "string"}, "Qty": {"type": "integer"}}}
            }
        })
    }

    #[tokio::test]
    async fn evaluates_every_property_in_schema_order() {
        let expected = json!({
            "InvoiceNumber": "INV-1",
            "Date": "2024-01-01",
            "Total": 100.0,
            "Vendor": {"Name": "Acme Corp"},
            "Lines": [{"Sku": "A", "Qty": 1}, {"Sku": "B", "Qty": 2}]
        });
        let actual = json!({
            "InvoiceNumber": "INV-1",
            "Total": "100.004",
            "Vendor": {"Name": "Acme Corp."},
            "Lines": [{"Sku": "B", "Qty": 2}, {"Sku": "A", "Qty": 1}]
        });

        let result = evaluator()
            .evaluate(section(), "invoice", Some(&invoice_schema()), &expected, &actual)
            .await;

        assert!(!result.is_failed());
        let paths: Vec<_> = result.attributes.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["InvoiceNumber", "Date", "Total", "Vendor", "Lines"]);
        assert_eq!(result.attributes[1].category, Some(MatchCategory::FalseNegative));
        assert_eq!(result.metrics.counts.true_positives, 5);
        assert_eq!(result.metrics.counts.false_negatives, 1);
        assert_eq!(result.metrics.precision, 1.0);
    }

    #[tokio::test]
    async fn missing_schema_fails_the_section() {
        let result = evaluator()
            .evaluate(section(), "W2", None, &json!({}), &json!({}))
            .await;
        assert!(result.is_failed());
        assert_eq!(result.metrics.weighted_score, 0.0);
        assert!(result.failure_reason().unwrap().contains("W2"));
    }

    #[tokio::test]
    async fn unresolvable_reference_fails_the_section() {
        let schema = json!({"type": "object", "properties": {"A": {"$ref": "#/$defs/Missing"}}});
        let result = evaluator()
            .evaluate(section(), "bad", Some(&schema), &json!({}), &json!({}))
            .await;
        assert!(result.is_failed());
    }

    #[tokio::test]
    async fn endpoint_methods_without_endpoint_fail_the_section() {
        let schema = json!({"type": "object", "properties": {"Notes": {"type": "string", "x-eval-method": "LLM"}}});
        let result = evaluator()
            .evaluate(section(), "memo", Some(&schema), &json!({"Notes": "a"}), &json!({"Notes": "a"}))
            .await;
        assert!(result.is_failed());
        assert!(result.failure_reason().unwrap().contains("LLM"));
    }

    #[test]
    fn list_tasks_are_grouped_per_property() {
        let schema = SchemaResolver::new().resolve("invoice", &invoice_schema()).unwrap();
        let tasks = TaskDecomposer::default().decompose(
            &schema,
            &json!({"Lines": [{"Sku": "A"}, {"Sku": "B"}, {"Sku": "C"}]}),
            Some(&json!({})),
        );
        let units = group_units(&tasks);
        let lists: Vec<usize> = units
            .iter()
            .filter_map(|u| match u {
                EvaluationUnit::List { tasks, .. } => Some(tasks.len()),
                _ => None,
            })
            .collect();
        assert_eq!(lists, vec![3]);

        let EvaluationUnit::List { tasks, .. } = units.last().unwrap() else {
            panic!("expected a list unit");
        };
        let (expected, actual) = list_values(tasks);
        assert_eq!(expected, json!([]));
        assert_eq!(actual.as_array().unwrap().len(), 3);
    }
}

//! ListMatcher - Structure-aware comparison of nested values.
//!
//! Objects are compared attribute by attribute. Arrays are matched item to
//! item: every (expected, actual) pair is scored, the optimal one-to-one
//! assignment is solved, and unpaired items become misses (expected side)
//! or false alarms (actual side). A pairing below the item threshold counts
//! as both: the expected item is a miss that still shows its closest actual
//! item, and that actual item is reported again as a false alarm.
//!
//! Item results are the counted units of a list; categories on the fields
//! inside an item are cleared so each item counts once.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use super::field_comparator::FieldComparator;
use super::worker_pool::{TaskOutcome, WorkerPool};
use crate::domain::comparison::{is_empty_value, ComparisonOutcome};
use crate::domain::evaluation::{AttributeResult, MatchCategory};
use crate::domain::foundation::{ComparisonConfigError, Score};
use crate::domain::matching::solve_assignment;
use crate::domain::schema::{EvaluationMethod, NodeKind, SchemaNode};

/// Compares nodes and matches lists.
pub struct ListMatcher {
    comparator: Arc<FieldComparator>,
    pool: WorkerPool,
}

impl ListMatcher {
    pub fn new(comparator: Arc<FieldComparator>, pool: WorkerPool) -> Self {
        Self { comparator, pool }
    }

    pub fn comparator(&self) -> &FieldComparator {
        &self.comparator
    }

    /// Compares `expected` with `actual` along `node`.
    ///
    /// `weight_scale` is the product of the weights of every enclosing node;
    /// leaf weights are multiplied by it.
    pub fn compare_node<'a>(
        &'a self,
        path: String,
        node: &'a SchemaNode,
        expected: &'a Value,
        actual: &'a Value,
        weight_scale: f64,
    ) -> BoxFuture<'a, Result<AttributeResult, ComparisonConfigError>> {
        Box::pin(async move {
            let weight = weight_scale * node.weight();
            if node.is_unit() {
                let outcome = self
                    .comparator
                    .compare_node_values(&path, node, expected, actual)
                    .await?;
                let category = MatchCategory::classify(
                    !is_empty_value(expected),
                    !is_empty_value(actual),
                    outcome.matched,
                );
                return Ok(AttributeResult::compared(
                    path,
                    node.name.clone(),
                    expected.clone(),
                    actual.clone(),
                    outcome,
                    node.effective_method(),
                    weight,
                    Some(category),
                ));
            }

            match &node.kind {
                NodeKind::Array { .. } => self.match_list(path, node, expected, actual, weight_scale).await,
                NodeKind::Object { properties } => {
                    let mut children = Vec::with_capacity(properties.len());
                    for child in properties {
                        let e = expected.get(&child.name).unwrap_or(&Value::Null);
                        let a = actual.get(&child.name).unwrap_or(&Value::Null);
                        let child_path = format!("{}.{}", path, child.name);
                        children.push(self.compare_node(child_path, child, e, a, weight).await?);
                    }
                    Ok(AttributeResult::group(
                        path,
                        node.name.clone(),
                        expected.clone(),
                        actual.clone(),
                        weight,
                        children,
                    ))
                }
                NodeKind::Scalar(_) => unreachable_scalar(&path, node),
            }
        })
    }

    /// Matches the items of two arrays described by the array `node`.
    pub async fn match_list(
        &self,
        path: String,
        node: &SchemaNode,
        expected: &Value,
        actual: &Value,
        weight_scale: f64,
    ) -> Result<AttributeResult, ComparisonConfigError> {
        let Some(item_node) = node.items() else {
            return Err(ComparisonConfigError::MethodNotApplicable {
                method: EvaluationMethod::Hungarian.to_string(),
                kind: node.kind.label().to_string(),
                path,
            });
        };
        let weight = weight_scale * node.weight();
        let item_threshold = node.effective_threshold(self.comparator.defaults());
        let expected_items = as_items(expected);
        let actual_items = as_items(actual);
        let (n, m) = (expected_items.len(), actual_items.len());

        if n == 0 && m == 0 {
            return Ok(AttributeResult::compared(
                path,
                node.name.clone(),
                expected.clone(),
                actual.clone(),
                ComparisonOutcome::both_empty(item_threshold),
                EvaluationMethod::Hungarian,
                weight,
                Some(MatchCategory::TrueNegative),
            ));
        }

        // Score every pair; each cell keeps its field-level results so the
        // chosen pairs need no second comparison.
        let cells: Vec<((usize, usize), ())> = (0..n)
            .flat_map(|i| (0..m).map(move |j| ((i, j), ())))
            .collect();
        let item_path = |i: usize| format!("{}[{}]", path, i);
        let scored = self
            .pool
            .run(cells, None, |(i, j), ()| {
                self.compare_node(item_path(i), item_node, &expected_items[i], &actual_items[j], weight)
            })
            .await;

        let mut matrix = vec![vec![0.0; m]; n];
        let mut cell_results: Vec<Vec<Option<AttributeResult>>> = vec![vec![None; m]; n];
        for ((i, j), outcome) in scored.into_outcomes() {
            if let TaskOutcome::Completed(result) = outcome {
                let result = result?;
                matrix[i][j] = result.score_value();
                cell_results[i][j] = Some(result);
            }
        }

        let assignment = solve_assignment(&matrix, m);
        let mut items = Vec::with_capacity(n.max(m));
        let mut paired_similarity = 0.0;

        let mut expected_side: Vec<(usize, AttributeResult)> = Vec::new();
        let mut unpaired_actual = assignment.unassigned_actual.clone();
        let mut missed = assignment.unassigned_expected.len();
        for &(i, j) in &assignment.pairs {
            let Some(result) = cell_results[i][j].take() else {
                tracing::warn!(
                    path = %path,
                    expected_index = i,
                    actual_index = j,
                    "No comparison result for assigned pair; treating both items as unpaired"
                );
                unpaired_actual.push(j);
                missed += 1;
                let result = self
                    .compare_node(item_path(i), item_node, &expected_items[i], &Value::Null, weight)
                    .await?;
                let reason = "No actual item was paired with this expected item".to_string();
                expected_side.push((i, finish_item(result, MatchCategory::FalseNegative, false, 0.0, item_threshold, reason)));
                continue;
            };
            let similarity = matrix[i][j];
            paired_similarity += similarity;
            if similarity >= item_threshold {
                let reason = format!("Paired with actual item {} (similarity {:.3})", j, similarity);
                expected_side.push((i, finish_item(result, MatchCategory::TruePositive, true, similarity, item_threshold, reason)));
            } else {
                // Closest actual item stays attached for the report; the
                // actual item is still counted on its own as a false alarm.
                let reason = format!(
                    "Closest actual item {} scored {:.3}, below item threshold {:.3}",
                    j, similarity, item_threshold
                );
                expected_side.push((i, finish_item(result, MatchCategory::FalseNegative, false, similarity, item_threshold, reason)));
                unpaired_actual.push(j);
                missed += 1;
            }
        }

        for &i in &assignment.unassigned_expected {
            let result = self
                .compare_node(item_path(i), item_node, &expected_items[i], &Value::Null, weight)
                .await?;
            let reason = "No actual item was paired with this expected item".to_string();
            expected_side.push((i, finish_item(result, MatchCategory::FalseNegative, false, 0.0, item_threshold, reason)));
        }
        expected_side.sort_by_key(|(i, _)| *i);
        items.extend(expected_side.into_iter().map(|(_, r)| r));

        unpaired_actual.sort_unstable();
        for &j in &unpaired_actual {
            let result = self
                .compare_node(format!("{}[a{}]", path, j), item_node, &Value::Null, &actual_items[j], weight)
                .await?;
            let reason = format!("Actual item {} has no expected counterpart above the item threshold", j);
            items.push(finish_item(result, MatchCategory::FalsePositive, false, 0.0, item_threshold, reason));
        }

        let all_matched = n == m && items.iter().all(AttributeResult::is_matched);
        let score = paired_similarity / n.max(m) as f64;
        let matched_count = items.iter().filter(|r| r.is_matched()).count();
        let outcome = ComparisonOutcome {
            matched: all_matched,
            score: Score::new(score),
            threshold: item_threshold,
            reason: format!(
                "{} of {} expected items matched; {} missed, {} unexpected",
                matched_count,
                n,
                missed,
                unpaired_actual.len()
            ),
        };

        tracing::debug!(
            path = %path,
            expected = n,
            actual = m,
            total_similarity = assignment.total_similarity,
            "Matched list"
        );

        Ok(AttributeResult::compared(
            path,
            node.name.clone(),
            expected.clone(),
            actual.clone(),
            outcome,
            EvaluationMethod::Hungarian,
            weight,
            None,
        )
        .with_children(items))
    }
}

fn unreachable_scalar(path: &str, node: &SchemaNode) -> Result<AttributeResult, ComparisonConfigError> {
    // Scalars are always units; reaching here means the node is malformed.
    Err(ComparisonConfigError::MethodNotApplicable {
        method: node.effective_method().to_string(),
        kind: node.kind.label().to_string(),
        path: path.to_string(),
    })
}

/// Items of an array value. Null and empty are no items; a lone non-array
/// value is a one-item list.
fn as_items(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        v if is_empty_value(v) => Vec::new(),
        other => vec![other.clone()],
    }
}

fn finish_item(
    mut result: AttributeResult,
    category: MatchCategory,
    matched: bool,
    similarity: f64,
    item_threshold: f64,
    note: String,
) -> AttributeResult {
    result.clear_categories();
    result.category = Some(category);
    result.matched = Some(matched);
    if !result.is_leaf() {
        result.method = Some(EvaluationMethod::Hungarian);
        result.threshold = Some(item_threshold);
        result.score = Some(Score::new(similarity));
    }
    result.reason = format!("{}; {}", note, result.reason);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::ComparatorSettings;
    use crate::domain::evaluation::Aggregator;
    use crate::domain::schema::ScalarType;
    use serde_json::json;

    fn matcher() -> ListMatcher {
        ListMatcher::new(
            Arc::new(FieldComparator::new(ComparatorSettings::default())),
            WorkerPool::with_workers(4),
        )
    }

    fn line_items() -> SchemaNode {
        SchemaNode::array(
            "Lines",
            SchemaNode::object(
                "Lines",
                vec![
                    SchemaNode::scalar("d", ScalarType::String),
                    SchemaNode::scalar("r", ScalarType::Number),
                ],
            ),
        )
        .with_threshold(0.8)
    }

    #[tokio::test]
    async fn pairs_by_content_not_position() {
        let node = line_items();
        let expected = json!([{"d": "A", "r": 10}, {"d": "B", "r": 20}]);
        let actual = json!([{"d": "B", "r": 20}, {"d": "C", "r": 5}]);

        let result = matcher()
            .match_list("Lines".into(), &node, &expected, &actual, 1.0)
            .await
            .unwrap();

        let categories: Vec<_> = result
            .children
            .iter()
            .map(|c| (c.path.as_str(), c.category))
            .collect();
        assert_eq!(
            categories,
            vec![
                ("Lines[0]", Some(MatchCategory::FalseNegative)),
                ("Lines[1]", Some(MatchCategory::TruePositive)),
                ("Lines[a1]", Some(MatchCategory::FalsePositive)),
            ]
        );

        let b = &result.children[1];
        assert!(b.reason.starts_with("Paired with actual item 0"));

        let a = &result.children[0];
        assert_eq!(a.matched, Some(false));
        assert!(a.reason.contains("Closest actual item 1"));
        assert_eq!(a.actual, json!({"d": "C", "r": 5}));

        let c = &result.children[2];
        assert_eq!(c.actual, json!({"d": "C", "r": 5}));
        assert_eq!(c.expected, Some(Value::Null));

        let metrics = Aggregator::section_metrics(std::slice::from_ref(&result));
        assert_eq!(metrics.counts.true_positives, 1);
        assert_eq!(metrics.counts.false_negatives, 1);
        assert_eq!(metrics.counts.false_positives, 1);
        assert_eq!(metrics.counts.false_discoveries, 0);
        assert_eq!(metrics.precision, 0.5);
        assert_eq!(metrics.recall, 0.5);
    }

    #[tokio::test]
    async fn unpaired_items_are_misses_and_false_alarms() {
        let node = line_items();
        let expected = json!([{"d": "A", "r": 1}, {"d": "B", "r": 2}]);
        let actual = json!([{"d": "B", "r": 2}]);

        let result = matcher()
            .match_list("Lines".into(), &node, &expected, &actual, 1.0)
            .await
            .unwrap();
        let categories: Vec<_> = result.children.iter().map(|c| c.category).collect();
        assert_eq!(
            categories,
            vec![Some(MatchCategory::FalseNegative), Some(MatchCategory::TruePositive)]
        );
        assert_eq!(result.matched, Some(false));
        assert!((result.score_value() - 0.5).abs() < 1e-9);

        let result = matcher()
            .match_list("Lines".into(), &node, &json!([]), &actual, 1.0)
            .await
            .unwrap();
        assert_eq!(result.children[0].path, "Lines[a0]");
        assert_eq!(result.children[0].category, Some(MatchCategory::FalsePositive));
    }

    #[tokio::test]
    async fn both_empty_lists_are_true_negative() {
        let result = matcher()
            .match_list("Lines".into(), &line_items(), &Value::Null, &json!([]), 1.0)
            .await
            .unwrap();
        assert_eq!(result.category, Some(MatchCategory::TrueNegative));
        assert_eq!(result.matched, Some(true));
    }

    #[tokio::test]
    async fn item_fields_are_not_counted_separately() {
        let node = line_items();
        let items = json!([{"d": "A", "r": 1}]);
        let result = matcher()
            .match_list("Lines".into(), &node, &items, &items, 2.0)
            .await
            .unwrap();
        let counts = Aggregator::count(std::slice::from_ref(&result));
        assert_eq!(counts.true_positives, 1);
        let leaves = Aggregator::leaves(std::slice::from_ref(&result));
        assert_eq!(leaves.len(), 2);
        assert!(leaves.iter().all(|l| l.weight == 2.0));
        assert_eq!(leaves[0].path, "Lines[0].d");
    }

    #[tokio::test]
    async fn scalar_lists_match_by_value() {
        let node = SchemaNode::array("Tags", SchemaNode::scalar("Tags", ScalarType::String));
        let result = matcher()
            .match_list("Tags".into(), &node, &json!(["x", "y"]), &json!(["y", "x"]), 1.0)
            .await
            .unwrap();
        assert_eq!(result.matched, Some(true));
        assert_eq!(result.score_value(), 1.0);
    }

    #[tokio::test]
    async fn nested_objects_keep_dotted_paths() {
        let node = SchemaNode::object(
            "Vendor",
            vec![
                SchemaNode::scalar("Name", ScalarType::String),
                SchemaNode::object(
                    "Address",
                    vec![SchemaNode::scalar("City", ScalarType::String)],
                ),
            ],
        );
        let value = json!({"Name": "Acme", "Address": {"City": "Oslo"}});
        let result = matcher()
            .compare_node("Vendor".into(), &node, &value, &value, 1.0)
            .await
            .unwrap();
        let paths: Vec<_> = Aggregator::leaves(std::slice::from_ref(&result))
            .iter()
            .map(|l| l.path.clone())
            .collect();
        assert_eq!(paths, vec!["Vendor.Name", "Vendor.Address.City"]);
        assert_eq!(result.matched, Some(true));
    }
}

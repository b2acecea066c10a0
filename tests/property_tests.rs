//! Property tests over the public engine surface.

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use extraction_evaluator::application::{
    ComparatorSettings, FieldComparator, ListMatcher, SectionEvaluator, WorkerPool,
};
use extraction_evaluator::domain::comparison::compare_numeric;
use extraction_evaluator::domain::decomposition::TaskDecomposer;
use extraction_evaluator::domain::foundation::SectionId;
use extraction_evaluator::domain::schema::{resolve_schema, SchemaResolver};

#[derive(Debug, Clone)]
enum Field {
    Text { fuzzy: bool, weight: f64 },
    Number { tolerance: f64, weight: f64 },
}

impl Field {
    fn schema(&self) -> Value {
        match self {
            Field::Text { fuzzy, weight } => {
                let method = if *fuzzy { "FUZZY" } else { "EXACT" };
                json!({"type": "string", "x-eval-method": method, "x-eval-weight": weight})
            }
            Field::Number { tolerance, weight } => {
                json!({"type": "number", "x-eval-threshold": tolerance, "x-eval-weight": weight})
            }
        }
    }
}

fn field() -> impl Strategy<Value = Field> {
    prop_oneof![
        (any::<bool>(), 0.1f64..5.0).prop_map(|(fuzzy, weight)| Field::Text { fuzzy, weight }),
        (0.0f64..1.0, 0.1f64..5.0).prop_map(|(tolerance, weight)| Field::Number { tolerance, weight }),
    ]
}

fn fields() -> impl Strategy<Value = BTreeMap<String, Field>> {
    proptest::collection::btree_map("[A-Z][a-z]{1,6}", field(), 1..8)
}

fn schema_of(fields: &BTreeMap<String, Field>) -> Value {
    let properties: Map<String, Value> = fields.iter().map(|(name, f)| (name.clone(), f.schema())).collect();
    json!({"type": "object", "properties": properties})
}

fn value_for(field: &Field, seed: u32) -> Value {
    match field {
        Field::Text { .. } => json!(format!("value-{}", seed)),
        Field::Number { .. } => json!(f64::from(seed) / 4.0),
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn numeric_score_never_rises_with_distance(
        expected in -1.0e6f64..1.0e6,
        near in 0.0f64..1.0e4,
        extra in 0.0f64..1.0e4,
        tolerance in 0.0f64..10.0,
    ) {
        let closer = compare_numeric(&json!(expected), &json!(expected + near), tolerance);
        let farther = compare_numeric(&json!(expected), &json!(expected + near + extra), tolerance);
        prop_assert!(closer.score >= farther.score);
        prop_assert!(!farther.matched || closer.matched);
    }

    #[test]
    fn resolution_is_idempotent_and_round_trips(fields in fields()) {
        let schema = schema_of(&fields);
        let first = resolve_schema("Generated", &schema).unwrap();
        let second = resolve_schema("Generated", &schema).unwrap();
        prop_assert_eq!(&first, &second);

        let resolver = SchemaResolver::new();
        let cached = resolver.resolve("Generated", &schema).unwrap();
        let again = resolver.resolve("Generated", &schema).unwrap();
        prop_assert!(Arc::ptr_eq(&cached, &again));
        prop_assert_eq!(&cached.root, &first.root);

        let rebuilt = resolve_schema("Generated", &first.root.to_schema_value()).unwrap();
        prop_assert_eq!(rebuilt.root, first.root);
    }

    #[test]
    fn identical_values_score_one(fields in fields(), seed in 0u32..10_000) {
        let schema = schema_of(&fields);
        let values: Map<String, Value> = fields
            .iter()
            .enumerate()
            .map(|(i, (name, f))| (name.clone(), value_for(f, seed + i as u32)))
            .collect();
        let values = Value::Object(values);

        let comparator = Arc::new(FieldComparator::new(ComparatorSettings::default()));
        let evaluator = SectionEvaluator::new(
            Arc::new(SchemaResolver::new()),
            TaskDecomposer::default(),
            Arc::new(ListMatcher::new(comparator, WorkerPool::with_workers(2))),
            WorkerPool::with_workers(2),
        );
        let result = runtime().block_on(evaluator.evaluate(
            SectionId::new("s").unwrap(),
            "Generated",
            Some(&schema),
            &values,
            &values,
        ));

        prop_assert!(!result.is_failed());
        prop_assert_eq!(result.metrics.weighted_score, 1.0);
        prop_assert_eq!(result.metrics.counts.true_positives as usize, fields.len());
    }

    #[test]
    fn weighted_score_stays_in_unit_interval(
        fields in fields(),
        expected_seed in 0u32..100,
        actual_seed in 0u32..100,
    ) {
        let schema = schema_of(&fields);
        let build = |seed: u32| {
            Value::Object(
                fields
                    .iter()
                    .map(|(name, f)| (name.clone(), value_for(f, seed)))
                    .collect(),
            )
        };

        let comparator = Arc::new(FieldComparator::new(ComparatorSettings::default()));
        let evaluator = SectionEvaluator::new(
            Arc::new(SchemaResolver::new()),
            TaskDecomposer::default(),
            Arc::new(ListMatcher::new(comparator, WorkerPool::with_workers(2))),
            WorkerPool::with_workers(2),
        );
        let result = runtime().block_on(evaluator.evaluate(
            SectionId::new("s").unwrap(),
            "Generated",
            Some(&schema),
            &build(expected_seed),
            &build(actual_seed),
        ));

        let m = &result.metrics;
        for value in [m.precision, m.recall, m.f1_score, m.accuracy, m.weighted_score] {
            prop_assert!((0.0..=1.0).contains(&value));
        }
        prop_assert_eq!(m.attribute_count, fields.len());
    }
}

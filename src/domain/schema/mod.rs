//! Schema module - resolved schema trees and evaluation directives.

mod method;
mod node;
mod resolver;

pub use method::{EvaluationMethod, MethodDefaults};
pub use node::{EvaluationDirectives, NodeKind, ScalarType, SchemaNode};
pub use resolver::{resolve_schema, schema_fingerprint, ResolvedSchema, SchemaResolver};

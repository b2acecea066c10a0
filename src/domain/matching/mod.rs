//! Matching module - optimal bipartite assignment for list comparison.

mod assignment;

pub use assignment::{solve_assignment, Assignment};

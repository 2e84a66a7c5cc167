//! camatrix-domain: Core impact-matrix logic
//!
//! This crate contains the pure decision logic of the Conditional Access
//! impact matrix:
//! - Policy applicability engine (include/exclude precedence rules)
//! - Transitive group closure resolver
//! - Matrix builder orchestrating policies x users
//! - Snapshot differ for comparing two matrix runs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               camatrix-domain               │
//! ├─────────────────────────────────────────────┤
//! │  model/    - Policies, users, matrix rows   │
//! │  engine/   - Applicability decision rules   │
//! │  resolver/ - Group closure traversal        │
//! │  matrix/   - Per-run matrix assembly        │
//! │  diff/     - Snapshot comparison            │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! All directory reads go through the [`DirectoryReader`] and
//! [`GroupReader`] traits, so the crate has no transport dependency and is
//! fully testable with in-memory mocks.

pub mod diff;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod model;
pub mod resolver;

#[cfg(test)]
mod tests;

// Re-export commonly used types at the crate root
pub use diff::{diff_snapshots, DiffEntry, DiffOptions};
pub use error::{DomainError, DomainResult};
pub use matrix::{DirectoryReader, Matrix, MatrixBuilder, MatrixOptions};
pub use model::{MatrixRow, Policy, PolicyState, User, UserKind};
pub use resolver::{ClosureResolver, DirectoryObjectKind, DirectoryObjectRef, GroupReader};

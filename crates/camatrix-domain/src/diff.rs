//! Snapshot differ: field-level changes between two matrix runs.
//!
//! Rows are matched by principal name. Only policy columns are compared;
//! the identity/metadata fields of a row (display name, principal name, job
//! title, external flag, enabled flag, user type) are structural fields of
//! [`MatrixRow`] and never produce diff entries, even when they changed.

use std::collections::HashMap;

use crate::model::MatrixRow;

/// Human-readable label for an applicability value.
///
/// The three-way state matters: a policy can mark a user included or
/// excluded, or not exist at all in one of the two snapshots.
pub fn applicability_label(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "✅ Included",
        Some(false) => "❌ Excluded",
        None => "/",
    }
}

/// One changed policy field on one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// Principal name of the affected user.
    pub upn: String,
    /// Display name of the policy whose applicability changed.
    pub policy: String,
    /// Rendered previous value.
    pub old: &'static str,
    /// Rendered new value.
    pub new: &'static str,
}

/// Differ behavior toggles.
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Also report users that have no row in the previous snapshot. Off by
    /// default: the report then only covers changes to known users. When
    /// enabled, every policy column of a new user is emitted with `/` as
    /// the previous value.
    pub report_new_users: bool,
}

/// Compares two matrix snapshots and returns the changed policy fields.
///
/// Entries follow the order of `current` rows; within a row, policy columns
/// are visited in their (sorted) map order. A policy present only in the
/// current row is reported with an absent (`/`) previous value; policies
/// that disappeared entirely produce no entries, mirroring a report that
/// describes the current policy set.
pub fn diff_snapshots(
    previous: &[MatrixRow],
    current: &[MatrixRow],
    options: &DiffOptions,
) -> Vec<DiffEntry> {
    let previous_by_upn: HashMap<&str, &MatrixRow> = previous
        .iter()
        .map(|row| (row.upn.as_str(), row))
        .collect();

    let mut changes = Vec::new();
    for row in current {
        match previous_by_upn.get(row.upn.as_str()) {
            Some(previous_row) => {
                for (policy, value) in &row.policies {
                    let old = previous_row.policies.get(policy).copied();
                    if old != Some(*value) {
                        changes.push(DiffEntry {
                            upn: row.upn.clone(),
                            policy: policy.clone(),
                            old: applicability_label(old),
                            new: applicability_label(Some(*value)),
                        });
                    }
                }
            }
            None if options.report_new_users => {
                for (policy, value) in &row.policies {
                    changes.push(DiffEntry {
                        upn: row.upn.clone(),
                        policy: policy.clone(),
                        old: applicability_label(None),
                        new: applicability_label(Some(*value)),
                    });
                }
            }
            None => {}
        }
    }

    changes
}

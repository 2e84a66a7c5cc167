//! Data model: policies, users and matrix rows.
//!
//! All entities are immutable snapshots taken at the start of a run. Matrix
//! rows are additionally the persisted snapshot format, so their serialized
//! shape (`user`, `upn`, `job`, `external`, `enabled`, `userType`, plus one
//! key per policy display name) is stable across runs and feeds the
//! snapshot differ.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// Sentinel in `include_users` meaning the policy targets every user.
pub const ALL_USERS: &str = "All";

/// Marker embedded in guest principal names by the directory.
const EXTERNAL_MARKER: &str = "#EXT#@";

/// Lifecycle state of a Conditional Access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicyState {
    Enabled,
    /// Evaluated and logged by the directory, but not enforced.
    ReportOnly,
    Disabled,
}

/// A Conditional Access policy's user-scoping rules.
///
/// Only the user/group assignment conditions are modelled; other policy
/// conditions (platforms, locations, ...) play no role in the applicability
/// decision.
#[derive(Debug, Clone)]
pub struct Policy {
    pub id: String,
    pub display_name: String,
    pub state: PolicyState,
    /// User ids excluded directly (never contains the "All" sentinel).
    pub exclude_users: HashSet<String>,
    /// Seed group ids whose transitive members are excluded.
    pub exclude_groups: Vec<String>,
    /// User ids included directly, or the [`ALL_USERS`] sentinel.
    pub include_users: HashSet<String>,
    /// Seed group ids whose transitive members are included.
    pub include_groups: Vec<String>,
}

impl Policy {
    /// Whether this policy targets all users before exclusions.
    pub fn includes_all_users(&self) -> bool {
        self.include_users.contains(ALL_USERS)
    }
}

/// Member/guest classification carried by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Member,
    Guest,
}

/// A directory user, snapshotted at fetch time.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    /// Unique key for matrix rows.
    pub principal_name: String,
    pub display_name: Option<String>,
    pub job_title: Option<String>,
    pub enabled: bool,
    pub kind: UserKind,
}

impl User {
    /// Guests invited from another tenant carry a `#EXT#@` marker in their
    /// principal name.
    pub fn is_external(&self) -> bool {
        self.principal_name.contains(EXTERNAL_MARKER)
    }
}

/// One matrix row: user metadata plus policy display name -> applicability.
///
/// A policy key absent from `policies` means "not applicable" (the policy
/// did not exist in that run), which the differ renders distinctly from
/// included/excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub user: String,
    pub upn: String,
    pub job: String,
    pub external: bool,
    pub enabled: bool,
    #[serde(rename = "userType")]
    pub user_type: UserKind,
    #[serde(flatten)]
    pub policies: BTreeMap<String, bool>,
}

impl MatrixRow {
    /// Builds the metadata portion of a row from a user snapshot.
    ///
    /// Free-text fields are sanitized for CSV output the same way the
    /// exported snapshot stores them, so snapshots and exports agree.
    pub fn from_user(user: &User) -> Self {
        Self {
            user: sanitize(user.display_name.as_deref().unwrap_or_default()),
            upn: user.principal_name.replace(',', ""),
            job: sanitize(user.job_title.as_deref().unwrap_or_default()),
            external: user.is_external(),
            enabled: user.enabled,
            user_type: user.kind,
            policies: BTreeMap::new(),
        }
    }
}

/// Strips CSV-hostile separators from free-text directory fields.
fn sanitize(value: &str) -> String {
    value.replace([',', ';'], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(principal_name: &str) -> User {
        User {
            id: "u1".into(),
            principal_name: principal_name.into(),
            display_name: Some("Doe, Jane; QA".into()),
            job_title: Some("Head, of; Testing".into()),
            enabled: true,
            kind: UserKind::Member,
        }
    }

    #[test]
    fn external_flag_derived_from_principal_name() {
        assert!(user("jane_ext.com#EXT#@corp.onmicrosoft.com").is_external());
        assert!(!user("jane@corp.com").is_external());
    }

    #[test]
    fn row_sanitizes_free_text_fields() {
        let row = MatrixRow::from_user(&user("jane@corp.com"));
        assert_eq!(row.user, "Doe Jane QA");
        assert_eq!(row.job, "Head of Testing");
        assert_eq!(row.upn, "jane@corp.com");
    }

    #[test]
    fn row_round_trips_through_json_with_policy_columns() {
        let mut row = MatrixRow::from_user(&user("jane@corp.com"));
        row.policies.insert("Block legacy auth".into(), true);
        row.policies.insert("Require MFA".into(), false);

        let json = serde_json::to_string(&row).unwrap();
        let back: MatrixRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
        assert_eq!(back.policies.get("Require MFA"), Some(&false));
    }

    #[test]
    fn all_users_sentinel_detected() {
        let policy = Policy {
            id: "p1".into(),
            display_name: "Require MFA".into(),
            state: PolicyState::Enabled,
            exclude_users: HashSet::new(),
            exclude_groups: Vec::new(),
            include_users: [ALL_USERS.to_string()].into_iter().collect(),
            include_groups: Vec::new(),
        };
        assert!(policy.includes_all_users());
    }
}

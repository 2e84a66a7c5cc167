//! Matrix builder: assembles the per-user policy applicability matrix.
//!
//! One builder instance corresponds to one run. The builder pulls policies
//! and users through the [`DirectoryReader`] seam, expands each policy's
//! group lists once via the closure resolver, and evaluates the
//! applicability engine per (user, policy) pair.
//!
//! # Failure policy
//!
//! Every directory error aborts the run, including a single user's
//! membership fetch. This is deliberate: a partially evaluated row in an
//! access-impact report is worse than no report, so there is no silent
//! partial success.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::engine;
use crate::error::DomainResult;
use crate::model::{MatrixRow, Policy, User, UserKind};
use crate::resolver::{ClosureResolver, GroupReader};

/// Seam for the directory lookups a matrix run needs.
#[async_trait]
pub trait DirectoryReader: GroupReader {
    /// Fetches Conditional Access policies: enabled ones, plus report-only
    /// ones when requested.
    async fn list_policies(&self, include_report_only: bool) -> DomainResult<Vec<Policy>>;

    /// Fetches all users in the directory.
    async fn list_users(&self) -> DomainResult<Vec<User>>;

    /// Fetches the ids of the groups a user is a direct member of.
    async fn direct_group_ids(&self, user_id: &str) -> DomainResult<HashSet<String>>;

    /// Fetches the ids of every transitive member of a group (used for the
    /// group-restriction filter).
    async fn group_member_ids(&self, group_id: &str) -> DomainResult<HashSet<String>>;
}

/// Run-scoped options restricting the evaluated user set.
#[derive(Debug, Clone, Default)]
pub struct MatrixOptions {
    /// Also evaluate report-only policies, not just enforced ones.
    pub include_report_only: bool,
    /// Keep only members or only guests.
    pub user_kind: Option<UserKind>,
    /// Keep only users that are (transitive) members of this group.
    pub group_id: Option<String>,
    /// Cap the number of evaluated users.
    pub limit: Option<usize>,
}

/// The assembled matrix of one run.
#[derive(Debug, Clone)]
pub struct Matrix {
    /// Policy display names in output column order.
    pub policy_names: Vec<String>,
    /// One row per evaluated user.
    pub rows: Vec<MatrixRow>,
}

/// Orchestrates one matrix run.
pub struct MatrixBuilder<R> {
    reader: Arc<R>,
    resolver: ClosureResolver<R>,
    options: MatrixOptions,
}

impl<R> MatrixBuilder<R>
where
    R: DirectoryReader,
{
    /// Creates a builder for one run over the given directory reader.
    pub fn new(reader: Arc<R>, options: MatrixOptions) -> Self {
        let resolver = ClosureResolver::new(Arc::clone(&reader));
        Self {
            reader,
            resolver,
            options,
        }
    }

    /// Fetches policies and users, evaluates applicability for every pair
    /// and returns the assembled matrix.
    ///
    /// Policies are sorted by display name for deterministic column order.
    /// Group closures are computed once per policy; they depend only on the
    /// policy's group lists, not on the user under evaluation.
    pub async fn build(&self) -> DomainResult<Matrix> {
        let mut policies = self
            .reader
            .list_policies(self.options.include_report_only)
            .await?;
        policies.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        info!(count = policies.len(), "conditional access policies fetched");

        let users = self.select_users().await?;
        info!(count = users.len(), "users selected for evaluation");

        // Expand each policy's group lists up front; the resolver memoizes
        // shared seed sets across policies.
        let mut closures = Vec::with_capacity(policies.len());
        for policy in &policies {
            let exclude = self.resolver.closure(&policy.exclude_groups).await?;
            let include = self.resolver.closure(&policy.include_groups).await?;
            closures.push((exclude, include));
        }

        let total = users.len();
        let mut rows = Vec::with_capacity(total);
        for (index, user) in users.iter().enumerate() {
            let direct_groups = self.reader.direct_group_ids(&user.id).await?;

            let mut row = MatrixRow::from_user(user);
            for (policy, (exclude, include)) in policies.iter().zip(&closures) {
                let included = engine::is_included(policy, user, &direct_groups, exclude, include);
                row.policies.insert(policy.display_name.clone(), included);
            }
            rows.push(row);

            let progress = (index + 1) as f64 / total as f64 * 100.0;
            debug!(
                user = %user.principal_name,
                progress,
                remaining = total - (index + 1),
                "user evaluated"
            );
        }

        Ok(Matrix {
            policy_names: policies.into_iter().map(|p| p.display_name).collect(),
            rows,
        })
    }

    /// Applies the type, group and limit filters to the full user list.
    async fn select_users(&self) -> DomainResult<Vec<User>> {
        let mut users = self.reader.list_users().await?;

        if let Some(kind) = self.options.user_kind {
            users.retain(|user| user.kind == kind);
        }

        if let Some(group_id) = &self.options.group_id {
            let members = self.reader.group_member_ids(group_id).await?;
            users.retain(|user| members.contains(&user.id));
        }

        if let Some(limit) = self.options.limit {
            users.truncate(limit);
        }

        Ok(users)
    }
}

//! Mock directory implementations for domain testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{DomainError, DomainResult};
use crate::matrix::DirectoryReader;
use crate::model::{Policy, PolicyState, User, UserKind};
use crate::resolver::{DirectoryObjectKind, DirectoryObjectRef, GroupReader};

/// In-memory directory for testing the resolver and matrix builder.
pub struct MockDirectory {
    policies: RwLock<Vec<Policy>>,
    users: RwLock<Vec<User>>,
    /// user id -> direct group ids
    direct_groups: RwLock<HashMap<String, HashSet<String>>>,
    /// group id -> transitive members
    members: RwLock<HashMap<String, Vec<DirectoryObjectRef>>>,
    /// Counts transitive-membership fetches for call-budget assertions.
    pub transitive_calls: AtomicUsize,
    /// When set, membership lookups fail to simulate a mid-run outage.
    pub fail_memberships: AtomicBool,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self {
            policies: RwLock::new(Vec::new()),
            users: RwLock::new(Vec::new()),
            direct_groups: RwLock::new(HashMap::new()),
            members: RwLock::new(HashMap::new()),
            transitive_calls: AtomicUsize::new(0),
            fail_memberships: AtomicBool::new(false),
        }
    }

    pub async fn add_policy(&self, policy: Policy) {
        self.policies.write().await.push(policy);
    }

    pub async fn add_user(&self, user: User, direct_groups: &[&str]) {
        self.direct_groups.write().await.insert(
            user.id.clone(),
            direct_groups.iter().map(|g| g.to_string()).collect(),
        );
        self.users.write().await.push(user);
    }

    /// Registers `member` as a transitive member of `group_id`.
    pub async fn add_member(&self, group_id: &str, member_id: &str, kind: DirectoryObjectKind) {
        self.members
            .write()
            .await
            .entry(group_id.to_string())
            .or_default()
            .push(DirectoryObjectRef {
                id: member_id.to_string(),
                kind,
            });
    }
}

#[async_trait]
impl GroupReader for MockDirectory {
    async fn transitive_members(&self, group_id: &str) -> DomainResult<Vec<DirectoryObjectRef>> {
        self.transitive_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .members
            .read()
            .await
            .get(group_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl DirectoryReader for MockDirectory {
    async fn list_policies(&self, include_report_only: bool) -> DomainResult<Vec<Policy>> {
        Ok(self
            .policies
            .read()
            .await
            .iter()
            .filter(|p| {
                p.state == PolicyState::Enabled
                    || (include_report_only && p.state == PolicyState::ReportOnly)
            })
            .cloned()
            .collect())
    }

    async fn list_users(&self) -> DomainResult<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn direct_group_ids(&self, user_id: &str) -> DomainResult<HashSet<String>> {
        if self.fail_memberships.load(Ordering::Relaxed) {
            return Err(DomainError::directory("membership fetch failed"));
        }
        Ok(self
            .direct_groups
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn group_member_ids(&self, group_id: &str) -> DomainResult<HashSet<String>> {
        Ok(self
            .members
            .read()
            .await
            .get(group_id)
            .map(|members| members.iter().map(|m| m.id.clone()).collect())
            .unwrap_or_default())
    }
}

/// Policy with empty rule sets; tests fill in what they exercise.
pub fn policy(id: &str, display_name: &str) -> Policy {
    Policy {
        id: id.to_string(),
        display_name: display_name.to_string(),
        state: PolicyState::Enabled,
        exclude_users: HashSet::new(),
        exclude_groups: Vec::new(),
        include_users: HashSet::new(),
        include_groups: Vec::new(),
    }
}

/// Enabled member user with a principal name derived from the id.
pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        principal_name: format!("{id}@corp.com"),
        display_name: Some(format!("User {id}")),
        job_title: None,
        enabled: true,
        kind: UserKind::Member,
    }
}

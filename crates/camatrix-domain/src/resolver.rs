//! Transitive group closure resolver.
//!
//! Conditional Access policies scope users via groups, and groups nest:
//! a user in group A is also covered by a policy targeting group B when A
//! is (transitively) a member of B. The resolver expands a policy's seed
//! group list into the full set of group ids reachable through membership
//! edges.
//!
//! The membership graph lives in the remote directory, is queried a page at
//! a time, and may contain cycles. Traversal is therefore an iterative
//! work queue driven by a visited set rather than unbounded recursion: no
//! group id is expanded more than once per closure call, which both breaks
//! cycles and bounds the number of remote fetches.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::error::DomainResult;

/// Discriminator for directory objects appearing in membership responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryObjectKind {
    Group,
    User,
    /// Devices, service principals and anything else the directory nests in
    /// groups; never expanded.
    Other,
}

/// A directory object reference from a transitive-membership response.
#[derive(Debug, Clone)]
pub struct DirectoryObjectRef {
    pub id: String,
    pub kind: DirectoryObjectKind,
}

/// Seam for the membership lookups the resolver needs.
#[async_trait]
pub trait GroupReader: Send + Sync {
    /// Returns every directory object that is a transitive member of the
    /// given group, pagination already flattened.
    async fn transitive_members(&self, group_id: &str) -> DomainResult<Vec<DirectoryObjectRef>>;
}

/// Computes transitive group closures over a [`GroupReader`].
///
/// Closures are memoized per seed set for the lifetime of the resolver:
/// policies frequently share exclusion lists (break-glass and service
/// account groups), and a closure depends only on its seeds. The memo is
/// concurrency-safe, so the resolver can be shared if fetches are ever
/// fanned out across users.
pub struct ClosureResolver<R> {
    reader: Arc<R>,
    memo: DashMap<String, Arc<HashSet<String>>>,
}

impl<R> ClosureResolver<R>
where
    R: GroupReader,
{
    /// Creates a resolver over the given reader.
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            reader,
            memo: DashMap::new(),
        }
    }

    /// Returns the seed groups plus every group transitively reachable from
    /// them through membership edges.
    ///
    /// An empty seed list yields an empty set without any remote calls.
    /// Terminates on arbitrarily cyclic graphs: the visited set guarantees
    /// each group id is expanded at most once per call.
    pub async fn closure(&self, seeds: &[String]) -> DomainResult<Arc<HashSet<String>>> {
        if seeds.is_empty() {
            return Ok(Arc::new(HashSet::new()));
        }

        let key = memo_key(seeds);
        if let Some(cached) = self.memo.get(&key) {
            return Ok(Arc::clone(&cached));
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = seeds.iter().cloned().collect();

        while let Some(group_id) = queue.pop_front() {
            if !visited.insert(group_id.clone()) {
                continue;
            }

            let members = self.reader.transitive_members(&group_id).await?;
            for member in members {
                if member.kind == DirectoryObjectKind::Group && !visited.contains(&member.id) {
                    queue.push_back(member.id);
                }
            }
        }

        debug!(seeds = seeds.len(), closure = visited.len(), "group closure resolved");

        let closure = Arc::new(visited);
        self.memo.insert(key, Arc::clone(&closure));
        Ok(closure)
    }
}

/// Memo key: seed order must not matter.
fn memo_key(seeds: &[String]) -> String {
    let mut sorted: Vec<&str> = seeds.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join("\n")
}

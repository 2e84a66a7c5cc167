//! Policy applicability engine.
//!
//! Decides whether a single policy applies to a single user, given the
//! user's direct group memberships and the transitive closures of the
//! policy's exclude/include group lists.
//!
//! The precedence order is the core business rule of the whole system and
//! must not be reordered: direct exclusion dominates every form of
//! inclusion, matching the directory's own conflict resolution.

use std::collections::HashSet;

use crate::model::{Policy, User};

/// Decides policy applicability for one user.
///
/// Evaluated in strict precedence order, first matching rule wins:
///
/// 1. user id in `exclude_users` -> excluded
/// 2. direct groups intersect the exclude closure -> excluded
/// 3. `include_users` contains the `"All"` sentinel -> included
/// 4. user id in `include_users` -> included
/// 5. direct groups intersect the include closure -> included
/// 6. otherwise excluded (default deny)
///
/// `exclude_closure` and `include_closure` are the transitive closures of
/// `policy.exclude_groups` / `policy.include_groups`, computed by
/// [`crate::resolver::ClosureResolver`]. They depend only on the policy,
/// never on the user, so callers evaluate them once per policy per run.
pub fn is_included(
    policy: &Policy,
    user: &User,
    direct_groups: &HashSet<String>,
    exclude_closure: &HashSet<String>,
    include_closure: &HashSet<String>,
) -> bool {
    if policy.exclude_users.contains(&user.id) {
        return false;
    }

    if sets_intersect(direct_groups, exclude_closure) {
        return false;
    }

    if policy.includes_all_users() {
        return true;
    }

    if policy.include_users.contains(&user.id) {
        return true;
    }

    if sets_intersect(direct_groups, include_closure) {
        return true;
    }

    false
}

/// True iff the two sets share at least one element.
///
/// Iterates the smaller side and probes the larger, so the test is
/// O(min(|a|, |b|)) instead of the quadratic scan it replaces. Empty sets
/// never intersect.
pub fn sets_intersect(a: &HashSet<String>, b: &HashSet<String>) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().any(|item| large.contains(item))
}

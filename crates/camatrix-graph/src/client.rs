//! Authenticated, cached, paginated directory client.
//!
//! All directory queries funnel through [`GraphClient::fetch_all`]: it
//! consults the response cache, attaches the bearer token, follows
//! `@odata.nextLink` until the collection is exhausted and concatenates the
//! pages in order. Typed endpoint wrappers sit on top and the domain trait
//! implementations at the bottom of this file plug the client into the
//! matrix builder and closure resolver.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use camatrix_domain::{
    DirectoryObjectRef, DirectoryReader, DomainResult, GroupReader, Policy, User,
};

use crate::auth::TokenProvider;
use crate::cache::ResponseCache;
use crate::error::{GraphError, GraphResult};
use crate::odata::{Page, WireDirectoryObject, WirePolicy, WireUser};

const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com";

/// `$filter` expressions, pre-encoded because they are constant.
const FILTER_ENABLED: &str = "state%20eq%20%27enabled%27";
const FILTER_ENABLED_OR_REPORT_ONLY: &str =
    "state%20eq%20%27enabled%27%20or%20state%20eq%20%27enabledForReportingButNotEnforced%27";

/// Microsoft Graph client for one matrix run.
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    token: TokenProvider,
    cache: ResponseCache,
}

impl GraphClient {
    /// Creates a client with the production base URL and response cache.
    pub fn new(http: reqwest::Client, token: TokenProvider) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            token,
            cache: ResponseCache::new(),
        }
    }

    /// Overrides the directory base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replaces the response cache (tests shorten the TTL).
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    /// Acquires a token without issuing a directory query, so credential
    /// problems surface before the run starts.
    pub async fn verify_connection(&self) -> GraphResult<()> {
        self.token.bearer_token().await.map(|_| ())
    }

    /// One authenticated GET, cache consulted first.
    async fn get_json(&self, url: &str) -> GraphResult<Arc<Value>> {
        if let Some(hit) = self.cache.get(url).await {
            trace!(%url, "response cache hit");
            return Ok(hit);
        }

        let token = self.token.bearer_token().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Transport {
                message: format!("GET {url} returned {status}: {body}"),
            });
        }

        let payload: Value = response.json().await?;
        let payload = Arc::new(payload);
        self.cache.insert(url, Arc::clone(&payload)).await;
        Ok(payload)
    }

    /// Fetches a single collection page.
    pub async fn fetch_page(&self, url: &str) -> GraphResult<Page> {
        let payload = self.get_json(url).await?;
        Ok(serde_json::from_value(payload.as_ref().clone())?)
    }

    /// Fetches a whole collection, following `@odata.nextLink` until absent
    /// and concatenating items in page order.
    ///
    /// `path` is resolved against the base URL; continuation links are
    /// absolute and used as-is.
    pub async fn fetch_all(&self, path: &str) -> GraphResult<Vec<Value>> {
        let mut url = self.resolve(path);
        let mut items = Vec::new();

        loop {
            let page = self.fetch_page(&url).await?;
            items.extend(page.value);
            match page.next_link {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(items)
    }

    fn resolve(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Fetches Conditional Access policies, filtered by state server-side.
    pub async fn list_conditional_access_policies(
        &self,
        include_report_only: bool,
    ) -> GraphResult<Vec<Policy>> {
        let filter = if include_report_only {
            FILTER_ENABLED_OR_REPORT_ONLY
        } else {
            FILTER_ENABLED
        };
        let path = format!("/v1.0/policies/conditionalAccessPolicies?$filter={filter}");

        self.fetch_all(&path)
            .await?
            .into_iter()
            .map(|item| Ok(serde_json::from_value::<WirePolicy>(item)?.into()))
            .collect()
    }

    /// Fetches every user with the fields the matrix needs.
    pub async fn list_directory_users(&self) -> GraphResult<Vec<User>> {
        let path = "/beta/users?$select=userPrincipalName,displayName,jobTitle,id,accountEnabled,userType";

        self.fetch_all(path)
            .await?
            .into_iter()
            .map(|item| Ok(serde_json::from_value::<WireUser>(item)?.into()))
            .collect()
    }

    /// Fetches the ids of the objects a user is a direct member of.
    pub async fn member_of(&self, user_id: &str) -> GraphResult<HashSet<String>> {
        let path = format!("/v1.0/users/{user_id}/memberOf?$select=id");

        self.fetch_all(&path)
            .await?
            .into_iter()
            .map(|item| Ok(serde_json::from_value::<WireDirectoryObject>(item)?.id))
            .collect()
    }

    /// Fetches the transitive members of a group with their type
    /// discriminator.
    pub async fn group_transitive_members(
        &self,
        group_id: &str,
    ) -> GraphResult<Vec<DirectoryObjectRef>> {
        let path = format!("/v1.0/groups/{group_id}/transitiveMembers?$select=id");

        self.fetch_all(&path)
            .await?
            .into_iter()
            .map(|item| Ok(serde_json::from_value::<WireDirectoryObject>(item)?.into()))
            .collect()
    }
}

#[async_trait]
impl GroupReader for GraphClient {
    async fn transitive_members(&self, group_id: &str) -> DomainResult<Vec<DirectoryObjectRef>> {
        Ok(self.group_transitive_members(group_id).await?)
    }
}

#[async_trait]
impl DirectoryReader for GraphClient {
    async fn list_policies(&self, include_report_only: bool) -> DomainResult<Vec<Policy>> {
        Ok(self
            .list_conditional_access_policies(include_report_only)
            .await?)
    }

    async fn list_users(&self) -> DomainResult<Vec<User>> {
        Ok(self.list_directory_users().await?)
    }

    async fn direct_group_ids(&self, user_id: &str) -> DomainResult<HashSet<String>> {
        Ok(self.member_of(user_id).await?)
    }

    async fn group_member_ids(&self, group_id: &str) -> DomainResult<HashSet<String>> {
        let members = self.group_transitive_members(group_id).await?;
        Ok(members.into_iter().map(|member| member.id).collect())
    }
}

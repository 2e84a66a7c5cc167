//! Wire shapes for Microsoft Graph responses.
//!
//! Collections arrive as `{ "value": [...], "@odata.nextLink": "..." }`
//! pages; membership responses discriminate object kinds via the
//! `@odata.type` field.

use serde::Deserialize;
use serde_json::Value;

use camatrix_domain::{DirectoryObjectKind, DirectoryObjectRef, Policy, PolicyState, User, UserKind};

/// One page of a Graph collection.
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub value: Vec<Value>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// A directory object as it appears in membership responses.
#[derive(Debug, Deserialize)]
pub struct WireDirectoryObject {
    pub id: String,
    #[serde(rename = "@odata.type")]
    pub odata_type: Option<String>,
}

impl From<WireDirectoryObject> for DirectoryObjectRef {
    fn from(object: WireDirectoryObject) -> Self {
        let kind = match object.odata_type.as_deref() {
            Some("#microsoft.graph.group") => DirectoryObjectKind::Group,
            Some("#microsoft.graph.user") => DirectoryObjectKind::User,
            _ => DirectoryObjectKind::Other,
        };
        Self {
            id: object.id,
            kind,
        }
    }
}

/// A Conditional Access policy as served by the policies endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePolicy {
    pub id: String,
    pub display_name: String,
    pub state: String,
    #[serde(default)]
    pub conditions: WireConditions,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireConditions {
    #[serde(default)]
    pub users: WireUserScope,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUserScope {
    #[serde(default)]
    pub include_users: Vec<String>,
    #[serde(default)]
    pub exclude_users: Vec<String>,
    #[serde(default)]
    pub include_groups: Vec<String>,
    #[serde(default)]
    pub exclude_groups: Vec<String>,
}

impl From<WirePolicy> for Policy {
    fn from(wire: WirePolicy) -> Self {
        let state = match wire.state.as_str() {
            "enabled" => PolicyState::Enabled,
            "enabledForReportingButNotEnforced" => PolicyState::ReportOnly,
            _ => PolicyState::Disabled,
        };
        Self {
            id: wire.id,
            display_name: wire.display_name,
            state,
            exclude_users: wire.conditions.users.exclude_users.into_iter().collect(),
            exclude_groups: wire.conditions.users.exclude_groups,
            include_users: wire.conditions.users.include_users.into_iter().collect(),
            include_groups: wire.conditions.users.include_groups,
        }
    }
}

/// A user as served by the users endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    pub id: String,
    pub user_principal_name: String,
    pub display_name: Option<String>,
    pub job_title: Option<String>,
    #[serde(default)]
    pub account_enabled: bool,
    pub user_type: Option<String>,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        // Graph reports "Guest" for invited accounts; anything else
        // (including an absent field) is a member.
        let kind = match wire.user_type.as_deref() {
            Some("Guest") => UserKind::Guest,
            _ => UserKind::Member,
        };
        Self {
            id: wire.id,
            principal_name: wire.user_principal_name,
            display_name: wire.display_name,
            job_title: wire.job_title,
            enabled: wire.account_enabled,
            kind,
        }
    }
}

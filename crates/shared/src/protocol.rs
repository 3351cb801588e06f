use serde::{Deserialize, Serialize};

use crate::domain::{Entity, EntityId, EntityStatus, ModerationAction};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub data: Option<Vec<Entity>>,
    #[serde(rename = "totalPages", default)]
    pub total_pages: Option<u32>,
}

/// Id field of a single approve/reject body; the key differs per domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionTarget {
    ListingId(EntityId),
    UserId(EntityId),
    InterestId(EntityId),
}

#[derive(Debug, Clone, Serialize)]
pub struct ApproveRejectRequest {
    #[serde(flatten)]
    pub target: ActionTarget,
    pub action: ModerationAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkTargets {
    ListingIds(Vec<EntityId>),
    UserIds(Vec<EntityId>),
    InterestIds(Vec<EntityId>),
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkActionRequest {
    #[serde(flatten)]
    pub targets: BulkTargets,
    pub action: ModerationAction,
}

/// Admin-role listing status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: EntityStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionEcho {
    #[serde(default)]
    pub status: Option<EntityStatus>,
}

/// Body of an approve/reject response. Every field is optional; backends
/// variously reply with a success flag, the new status, or the updated record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub status: Option<EntityStatus>,
    #[serde(default)]
    pub data: Option<ActionEcho>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ActionResponse {
    /// Status the backend reports for the entity, if it names a known one.
    /// Acks such as `{"status":"success"}` do not count.
    pub fn echoed_status(&self) -> Option<EntityStatus> {
        let known = |status: &EntityStatus| *status != EntityStatus::Unknown;
        self.status
            .filter(known)
            .or_else(|| self.data.as_ref().and_then(|data| data.status).filter(known))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllIdsResponse {
    #[serde(rename = "userIds")]
    pub user_ids: Vec<EntityId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingCounts {
    pub active: i64,
    pub pending: i64,
    pub rejected: i64,
    pub active_change: i64,
    pub pending_change: i64,
    pub rejected_change: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserCounts {
    pub active: i64,
    pub inactive: i64,
    pub active_change: i64,
    pub inactive_change: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterestCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_ads_live: i64,
    pub total_ads_pending: i64,
    pub total_active_users: i64,
    pub total_deactivated_users: i64,
    pub total_ads_rejected: i64,
    pub ads_live_change: i64,
    pub ads_pending_change: i64,
    pub active_users_change: i64,
    pub deactivated_users_change: i64,
    pub ads_rejected_change: i64,
}

impl DashboardStats {
    pub fn from_counts(listings: &ListingCounts, users: &UserCounts) -> Self {
        Self {
            total_ads_live: listings.active,
            total_ads_pending: listings.pending,
            total_active_users: users.active,
            total_deactivated_users: users.inactive,
            total_ads_rejected: listings.rejected,
            ads_live_change: listings.active_change,
            ads_pending_change: listings.pending_change,
            active_users_change: users.active_change,
            deactivated_users_change: users.inactive_change,
            ads_rejected_change: listings.rejected_change,
        }
    }
}

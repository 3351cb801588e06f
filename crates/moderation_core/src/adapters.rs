//! HTTP adapters for the listing, user and interest moderation endpoints.

use async_trait::async_trait;
use shared::{
    domain::{EntityId, EntityStatus, ModerationAction, ModerationDomain, Role},
    error::{ActionError, FetchError},
    protocol::{
        ActionTarget, AllIdsResponse, ApproveRejectRequest, BulkActionRequest, BulkTargets,
        ListResponse, StatusUpdateRequest,
    },
};
use tracing::info;

use crate::{
    adapter::{FilterSpec, Filters, ModerationAdapter},
    api::ApiClient,
    pagination::{Page, PagingMode, DEFAULT_CLIENT_PAGE_SIZE},
};

pub const LISTING_TYPES: &[&str] = &["all", "product", "service", "job", "matrimony"];
pub const LISTING_STATUSES: &[&str] = &["pending", "active", "rejected", "all"];

fn listing_response(response: ListResponse, page_number: u32) -> Result<Page, FetchError> {
    let items = response.data.ok_or(FetchError::EmptyResponse)?;
    Ok(Page::from_server(items, page_number, response.total_pages))
}

pub struct ListingAdapter {
    api: ApiClient,
    role: Role,
}

impl ListingAdapter {
    pub fn new(api: ApiClient, role: Role) -> Self {
        Self { api, role }
    }

    fn scope(&self) -> &'static str {
        match self.role {
            Role::Moderator => "mod",
            Role::Admin => "admin",
        }
    }
}

#[async_trait]
impl ModerationAdapter for ListingAdapter {
    fn domain(&self) -> ModerationDomain {
        ModerationDomain::Listings
    }

    fn describe_filters(&self) -> Vec<FilterSpec> {
        vec![
            FilterSpec {
                name: "type",
                allowed_values: LISTING_TYPES,
                default: "all",
            },
            FilterSpec {
                name: "status",
                allowed_values: LISTING_STATUSES,
                default: "pending",
            },
        ]
    }

    fn target_status(&self, action: ModerationAction) -> EntityStatus {
        match action {
            ModerationAction::Approve => EntityStatus::Active,
            ModerationAction::Reject => EntityStatus::Rejected,
        }
    }

    async fn list(&self, filters: &Filters, page_number: u32) -> Result<Page, FetchError> {
        let filter = |name: &str, fallback: &str| {
            filters
                .get(name)
                .cloned()
                .unwrap_or_else(|| fallback.to_string())
        };
        let response: ListResponse = self
            .api
            .get_json(
                &["api", self.scope(), "listings"],
                &[
                    ("page", page_number.to_string()),
                    ("type", filter("type", "all")),
                    ("status", filter("status", "pending")),
                ],
            )
            .await?;
        listing_response(response, page_number)
    }

    async fn act(
        &self,
        id: &EntityId,
        action: ModerationAction,
    ) -> Result<EntityStatus, ActionError> {
        let target = self.target_status(action);
        let response = match self.role {
            Role::Admin => {
                self.api
                    .post_action(
                        &["api", "admin", "listings", id.as_str(), "status"],
                        &StatusUpdateRequest { status: target },
                    )
                    .await?
            }
            Role::Moderator => {
                self.api
                    .post_action(
                        &["api", "mod", "listings", "approve-reject"],
                        &ApproveRejectRequest {
                            target: ActionTarget::ListingId(id.clone()),
                            action,
                            reason: Some(String::new()),
                        },
                    )
                    .await?
            }
        };
        Ok(response.echoed_status().unwrap_or(target))
    }

    async fn bulk_act(
        &self,
        ids: &[EntityId],
        action: ModerationAction,
    ) -> Result<EntityStatus, ActionError> {
        let segments: &[&str] = match self.role {
            Role::Admin => &["api", "admin", "listings", "bulk"],
            Role::Moderator => &["api", "mod", "listings", "bulk-approve-reject"],
        };
        self.api
            .post_action(
                segments,
                &BulkActionRequest {
                    targets: BulkTargets::ListingIds(ids.to_vec()),
                    action,
                },
            )
            .await?;
        Ok(self.target_status(action))
    }
}

pub struct UserAdapter {
    api: ApiClient,
}

impl UserAdapter {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ModerationAdapter for UserAdapter {
    fn domain(&self) -> ModerationDomain {
        ModerationDomain::Users
    }

    fn target_status(&self, action: ModerationAction) -> EntityStatus {
        match action {
            ModerationAction::Approve => EntityStatus::Active,
            ModerationAction::Reject => EntityStatus::Inactive,
        }
    }

    async fn list(&self, _filters: &Filters, page_number: u32) -> Result<Page, FetchError> {
        let response: ListResponse = self
            .api
            .get_json(
                &["api", "mod", "profiles"],
                &[("page", page_number.to_string())],
            )
            .await?;
        listing_response(response, page_number)
    }

    async fn act(
        &self,
        id: &EntityId,
        action: ModerationAction,
    ) -> Result<EntityStatus, ActionError> {
        let response = self
            .api
            .post_action(
                &["api", "mod", "profiles", "approve-reject"],
                &ApproveRejectRequest {
                    target: ActionTarget::UserId(id.clone()),
                    action,
                    reason: None,
                },
            )
            .await?;
        Ok(response
            .echoed_status()
            .unwrap_or_else(|| self.target_status(action)))
    }

    async fn bulk_act(
        &self,
        ids: &[EntityId],
        action: ModerationAction,
    ) -> Result<EntityStatus, ActionError> {
        self.api
            .post_action(
                &["api", "mod", "profiles", "bulk-approve-reject"],
                &BulkActionRequest {
                    targets: BulkTargets::UserIds(ids.to_vec()),
                    action,
                },
            )
            .await?;
        Ok(self.target_status(action))
    }

    async fn all_ids(&self, _filters: &Filters) -> Result<Option<Vec<EntityId>>, FetchError> {
        let response: AllIdsResponse = self
            .api
            .get_json(&["api", "mod", "profiles", "all-ids"], &[])
            .await?;
        info!(count = response.user_ids.len(), "moderation: fetched all user ids");
        Ok(Some(response.user_ids))
    }
}

pub struct InterestAdapter {
    api: ApiClient,
    page_size: u32,
}

impl InterestAdapter {
    pub fn new(api: ApiClient) -> Self {
        Self::with_page_size(api, DEFAULT_CLIENT_PAGE_SIZE)
    }

    pub fn with_page_size(api: ApiClient, page_size: u32) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl ModerationAdapter for InterestAdapter {
    fn domain(&self) -> ModerationDomain {
        ModerationDomain::Interests
    }

    fn paging(&self) -> PagingMode {
        PagingMode::Client {
            page_size: self.page_size,
        }
    }

    fn target_status(&self, action: ModerationAction) -> EntityStatus {
        match action {
            ModerationAction::Approve => EntityStatus::Approved,
            ModerationAction::Reject => EntityStatus::Rejected,
        }
    }

    async fn list(&self, _filters: &Filters, _page_number: u32) -> Result<Page, FetchError> {
        let response: ListResponse = self
            .api
            .get_json(&["api", "mod", "interests"], &[])
            .await?;
        let items = response.data.ok_or(FetchError::EmptyResponse)?;
        Ok(Page::from_server(items, 1, None))
    }

    async fn act(
        &self,
        id: &EntityId,
        action: ModerationAction,
    ) -> Result<EntityStatus, ActionError> {
        let response = self
            .api
            .post_action(
                &["api", "mod", "interests", "approve-reject"],
                &ApproveRejectRequest {
                    target: ActionTarget::InterestId(id.clone()),
                    action,
                    reason: None,
                },
            )
            .await?;
        Ok(response
            .echoed_status()
            .unwrap_or_else(|| self.target_status(action)))
    }

    async fn bulk_act(
        &self,
        ids: &[EntityId],
        action: ModerationAction,
    ) -> Result<EntityStatus, ActionError> {
        self.api
            .post_action(
                &["api", "mod", "interests", "bulk-approve-reject"],
                &BulkActionRequest {
                    targets: BulkTargets::InterestIds(ids.to_vec()),
                    action,
                },
            )
            .await?;
        Ok(self.target_status(action))
    }
}

#[cfg(test)]
#[path = "tests/adapters_tests.rs"]
mod tests;

//! Moderation list controller and the HTTP adapters that feed it.

pub mod adapter;
pub mod adapters;
pub mod api;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod pagination;

use std::sync::Arc;

use shared::domain::ModerationDomain;

pub use adapter::{FilterError, FilterSpec, Filters, ModerationAdapter};
pub use adapters::{InterestAdapter, ListingAdapter, UserAdapter};
pub use api::ApiClient;
pub use config::Settings;
pub use controller::{
    ActionOutcome, ModerationListController, Notification, NotificationCause, NotificationLevel,
};
pub use pagination::{Page, PagingMode};

/// Builds the adapter for `domain` over an authenticated client.
pub fn adapter_for(
    domain: ModerationDomain,
    api: ApiClient,
    settings: &Settings,
) -> Arc<dyn ModerationAdapter> {
    match domain {
        ModerationDomain::Listings => Arc::new(ListingAdapter::new(api, settings.role)),
        ModerationDomain::Users => Arc::new(UserAdapter::new(api)),
        ModerationDomain::Interests => Arc::new(InterestAdapter::with_page_size(
            api,
            settings.client_page_size,
        )),
    }
}

pub fn controller_for(
    domain: ModerationDomain,
    api: ApiClient,
    settings: &Settings,
) -> ModerationListController {
    ModerationListController::with_timeout(
        adapter_for(domain, api, settings),
        settings.request_timeout(),
    )
}

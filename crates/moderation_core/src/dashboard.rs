//! Moderator dashboard figures.

use shared::{
    error::FetchError,
    protocol::{DashboardStats, InterestCounts, ListingCounts, UserCounts},
};
use tracing::{info, warn};

use crate::api::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increase,
    Decrease,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub title: &'static str,
    pub value: i64,
    pub change: i64,
    pub positive_is_good: bool,
}

impl StatCard {
    pub fn trend(&self) -> Trend {
        match self.change {
            change if change > 0 => Trend::Increase,
            change if change < 0 => Trend::Decrease,
            _ => Trend::Flat,
        }
    }

    /// `None` when nothing changed.
    pub fn is_favourable(&self) -> Option<bool> {
        match self.trend() {
            Trend::Flat => None,
            Trend::Increase => Some(self.positive_is_good),
            Trend::Decrease => Some(!self.positive_is_good),
        }
    }
}

pub fn stat_cards(stats: &DashboardStats) -> Vec<StatCard> {
    vec![
        StatCard {
            title: "Total Ads Live",
            value: stats.total_ads_live,
            change: stats.ads_live_change,
            positive_is_good: true,
        },
        StatCard {
            title: "Total Ads waiting for approval",
            value: stats.total_ads_pending,
            change: stats.ads_pending_change,
            positive_is_good: false,
        },
        StatCard {
            title: "Total Active Users",
            value: stats.total_active_users,
            change: stats.active_users_change,
            positive_is_good: true,
        },
        StatCard {
            title: "Total Users Deactivated",
            value: stats.total_deactivated_users,
            change: stats.deactivated_users_change,
            positive_is_good: false,
        },
        StatCard {
            title: "Total Ads Rejected",
            value: stats.total_ads_rejected,
            change: stats.ads_rejected_change,
            positive_is_good: false,
        },
    ]
}

/// Combines the per-domain count endpoints, falling back to the aggregate
/// stats endpoint when any of them fails.
pub async fn fetch_dashboard_stats(api: &ApiClient) -> Result<DashboardStats, FetchError> {
    let combined = futures::try_join!(
        api.get_json::<ListingCounts>(&["api", "mod", "listings", "counts"], &[]),
        api.get_json::<UserCounts>(&["api", "mod", "users", "counts"], &[]),
        api.get_json::<InterestCounts>(&["api", "mod", "interests", "counts"], &[]),
    );

    match combined {
        Ok((listings, users, interests)) => {
            info!(
                pending_listings = listings.pending,
                active_users = users.active,
                pending_interests = interests.pending,
                "dashboard: counts loaded"
            );
            Ok(DashboardStats::from_counts(&listings, &users))
        }
        Err(err) => {
            warn!(error = %err, "dashboard: count endpoints failed, trying aggregate stats");
            api.get_json::<DashboardStats>(&["api", "mod", "stats"], &[])
                .await
        }
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Union of the status sets used by the moderation domains.
///
/// Listings move between `pending|active|rejected`, users between
/// `pending|active|inactive` and interests between `pending|approved|rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    #[default]
    Pending,
    Active,
    Inactive,
    Approved,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl EntityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Approve,
    Reject,
}

impl ModerationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationDomain {
    Listings,
    Users,
    Interests,
}

impl ModerationDomain {
    pub fn singular(self) -> &'static str {
        match self {
            Self::Listings => "listing",
            Self::Users => "user",
            Self::Interests => "interest",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Self::Listings => "listings",
            Self::Users => "users",
            Self::Interests => "interests",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Moderator,
    Admin,
}

/// A moderated record as returned by the backend.
///
/// Only `_id`, `status` and `createdAt` are interpreted; every other field is
/// kept as-is in `attributes` for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "status_or_pending")]
    pub status: EntityStatus,
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Entity {
    pub fn new(id: impl Into<String>, status: EntityStatus) -> Self {
        Self {
            id: EntityId::new(id),
            status,
            created_at: None,
            attributes: Map::new(),
        }
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Front-end route for a listing, keyed by its `type` attribute.
    pub fn listing_detail_path(&self) -> Option<String> {
        let prefix = match self.attribute_str("type")? {
            "product" => "/productDetail",
            "service" => "/serviceDetail",
            "job" => "/jobDetail",
            "matrimony" => "/matrimonyProfile",
            _ => return None,
        };
        Some(format!("{prefix}/{}", self.id))
    }
}

fn status_or_pending<'de, D>(deserializer: D) -> Result<EntityStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<EntityStatus>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_reads_underscore_id_and_defaults_missing_status() {
        let entity: Entity = serde_json::from_str(
            r#"{"_id":"u1","firstName":"Ada","createdAt":"2024-03-01T10:00:00Z"}"#,
        )
        .expect("parse entity");
        assert_eq!(entity.id, EntityId::from("u1"));
        assert_eq!(entity.status, EntityStatus::Pending);
        assert!(entity.created_at.is_some());
        assert_eq!(entity.attribute_str("firstName"), Some("Ada"));
    }

    #[test]
    fn null_and_unrecognised_statuses_are_tolerated() {
        let null_status: Entity =
            serde_json::from_str(r#"{"id":"a","status":null}"#).expect("null status");
        assert_eq!(null_status.status, EntityStatus::Pending);

        let odd_status: Entity =
            serde_json::from_str(r#"{"_id":"b","status":"archived"}"#).expect("odd status");
        assert_eq!(odd_status.status, EntityStatus::Unknown);
    }

    #[test]
    fn listing_detail_path_follows_listing_type() {
        let mut listing = Entity::new("l9", EntityStatus::Pending);
        assert_eq!(listing.listing_detail_path(), None);

        listing
            .attributes
            .insert("type".into(), Value::String("job".into()));
        assert_eq!(listing.listing_detail_path().as_deref(), Some("/jobDetail/l9"));

        listing
            .attributes
            .insert("type".into(), Value::String("vehicle".into()));
        assert_eq!(listing.listing_detail_path(), None);
    }
}

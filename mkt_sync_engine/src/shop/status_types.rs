use std::fmt::Display;

use serde::{Deserialize, Serialize};

//--------------------------------------  AuthoritativeStatus  ---------------------------------------------------------
/// The `shopStatus` field of the authoritative status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthoritativeStatus {
    NotRegistered,
    PendingReview,
    Approved,
    Rejected,
    Active,
    Blocked,
    Suspended,
}

impl AuthoritativeStatus {
    pub const ALL: [AuthoritativeStatus; 7] = [
        AuthoritativeStatus::NotRegistered,
        AuthoritativeStatus::PendingReview,
        AuthoritativeStatus::Approved,
        AuthoritativeStatus::Rejected,
        AuthoritativeStatus::Active,
        AuthoritativeStatus::Blocked,
        AuthoritativeStatus::Suspended,
    ];
}

/// The shop record attached to the authoritative status. `status` is the shop's own, finer grained status string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub status: String,
}

impl ShopSummary {
    pub fn new<S: Into<String>>(id: S, name: S, status: S) -> Self {
        Self { id: id.into(), name: name.into(), slug: None, status: status.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopStatusResponse {
    pub shop_status: AuthoritativeStatus,
    #[serde(default)]
    pub shop: Option<ShopSummary>,
}

impl ShopStatusResponse {
    pub fn new(shop_status: AuthoritativeStatus, shop: Option<ShopSummary>) -> Self {
        Self { shop_status, shop }
    }
}

//--------------------------------------      LegacyShop       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyShopStatus {
    Pending,
    Active,
    Blocked,
}

/// The pre-lifecycle shop record. It predates the authoritative endpoint and knows only three states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyShop {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub status: LegacyShopStatus,
}

//--------------------------------------      ShopStatus       ---------------------------------------------------------
/// The seller lifecycle state the client routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopStatus {
    PendingRegistration,
    InformationInput,
    PendingReview,
    Approved,
    Rejected,
    SetupInProgress,
    Active,
    Suspended,
    Blocked,
    AwaitingRemedy,
}

impl ShopStatus {
    pub const ALL: [ShopStatus; 10] = [
        ShopStatus::PendingRegistration,
        ShopStatus::InformationInput,
        ShopStatus::PendingReview,
        ShopStatus::Approved,
        ShopStatus::Rejected,
        ShopStatus::SetupInProgress,
        ShopStatus::Active,
        ShopStatus::Suspended,
        ShopStatus::Blocked,
        ShopStatus::AwaitingRemedy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShopStatus::PendingRegistration => "pending_registration",
            ShopStatus::InformationInput => "information_input",
            ShopStatus::PendingReview => "pending_review",
            ShopStatus::Approved => "approved",
            ShopStatus::Rejected => "rejected",
            ShopStatus::SetupInProgress => "setup_in_progress",
            ShopStatus::Active => "active",
            ShopStatus::Suspended => "suspended",
            ShopStatus::Blocked => "blocked",
            ShopStatus::AwaitingRemedy => "awaiting_remedy",
        }
    }
}

impl Display for ShopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Data models for the Commission Engine.
//!
//! The `models` module defines the hierarchy nodes, commission records
//! and request payloads exchanged with the PayBazaar backend.  Wire
//! types derive `Serialize` and `Deserialize` and keep the backend's
//! field spelling (`commision`); the rest of the crate only sees the
//! Rust names.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Service type every commission record in this console is scoped to.
pub const PAYOUT_SERVICE: &str = "PAYOUT";

/// The fixed total every split must add up to (100%).
pub const TOTAL_COMMISSION: Decimal = Decimal::ONE;

/// Level of a node in the reseller hierarchy, below the Admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    MasterDistributor,
    Distributor,
    Retailer,
}

impl HierarchyLevel {
    /// Describes which part of the network a commission saved at this
    /// level applies to.  Shown in the confirmation preview.
    pub fn scope_description(self) -> &'static str {
        match self {
            HierarchyLevel::Retailer => "This commission applies only to the selected retailer.",
            HierarchyLevel::Distributor => {
                "This commission cascades to all retailers below the selected distributor."
            }
            HierarchyLevel::MasterDistributor => {
                "This commission cascades to all distributors and retailers below the selected master distributor."
            }
        }
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HierarchyLevel::MasterDistributor => "master distributor",
            HierarchyLevel::Distributor => "distributor",
            HierarchyLevel::Retailer => "retailer",
        };
        f.write_str(name)
    }
}

/// A node of the reseller network as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyNode {
    MasterDistributor { id: String, name: String },
    Distributor { id: String, name: String, parent_id: String },
    Retailer { id: String, name: String, parent_id: String },
}

impl HierarchyNode {
    pub fn id(&self) -> &str {
        match self {
            HierarchyNode::MasterDistributor { id, .. }
            | HierarchyNode::Distributor { id, .. }
            | HierarchyNode::Retailer { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HierarchyNode::MasterDistributor { name, .. }
            | HierarchyNode::Distributor { name, .. }
            | HierarchyNode::Retailer { name, .. } => name,
        }
    }

    /// The immediate ancestor, if any.  Master distributors hang off the
    /// admin, which is not modelled as a node.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            HierarchyNode::MasterDistributor { .. } => None,
            HierarchyNode::Distributor { parent_id, .. } | HierarchyNode::Retailer { parent_id, .. } => {
                Some(parent_id)
            }
        }
    }

    pub fn level(&self) -> HierarchyLevel {
        match self {
            HierarchyNode::MasterDistributor { .. } => HierarchyLevel::MasterDistributor,
            HierarchyNode::Distributor { .. } => HierarchyLevel::Distributor,
            HierarchyNode::Retailer { .. } => HierarchyLevel::Retailer,
        }
    }
}

/// Master distributor entry of the admin listing.
#[derive(Debug, Clone, Deserialize)]
pub struct MasterDistributorDto {
    pub master_distributor_id: String,
    #[serde(default)]
    pub master_distributor_name: String,
}

impl From<MasterDistributorDto> for HierarchyNode {
    fn from(dto: MasterDistributorDto) -> Self {
        HierarchyNode::MasterDistributor {
            id: dto.master_distributor_id,
            name: dto.master_distributor_name,
        }
    }
}

/// Distributor entry of a master distributor's listing.
#[derive(Debug, Clone, Deserialize)]
pub struct DistributorDto {
    pub distributor_id: String,
    #[serde(default)]
    pub distributor_name: String,
    pub master_distributor_id: String,
}

impl From<DistributorDto> for HierarchyNode {
    fn from(dto: DistributorDto) -> Self {
        HierarchyNode::Distributor {
            id: dto.distributor_id,
            name: dto.distributor_name,
            parent_id: dto.master_distributor_id,
        }
    }
}

/// Retailer entry of a distributor's listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RetailerDto {
    pub retailer_id: String,
    #[serde(default)]
    pub retailer_name: String,
    pub distributor_id: String,
}

impl From<RetailerDto> for HierarchyNode {
    fn from(dto: RetailerDto) -> Self {
        HierarchyNode::Retailer {
            id: dto.retailer_id,
            name: dto.retailer_name,
            parent_id: dto.distributor_id,
        }
    }
}

/// `data` payloads of the three listing endpoints.  A missing list is
/// treated as empty.
#[derive(Debug, Default, Deserialize)]
pub struct MasterDistributorList {
    #[serde(default)]
    pub master_distributors: Vec<MasterDistributorDto>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DistributorList {
    #[serde(default)]
    pub distributors: Vec<DistributorDto>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetailerList {
    #[serde(default)]
    pub retailers: Vec<RetailerDto>,
}

/// Standard response envelope of the backend.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: Option<String>,
    pub message: Option<String>,
    pub data: Option<T>,
}

/// A persisted commission split for one service and one owning node.
///
/// `user_id` is the owner of the record, which is not necessarily the
/// node that was asked for: the backend answers a lookup with the
/// nearest ancestor's record when the node has none of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRecord {
    #[serde(rename = "commision_id", default, skip_serializing_if = "Option::is_none")]
    pub commission_id: Option<String>,
    pub user_id: String,
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(rename = "total_commision", with = "rust_decimal::serde::float")]
    pub total_commission: Decimal,
    #[serde(rename = "admin_commision", with = "rust_decimal::serde::float")]
    pub admin_commission: Decimal,
    #[serde(rename = "master_distributor_commision", with = "rust_decimal::serde::float")]
    pub master_distributor_commission: Decimal,
    #[serde(rename = "distributor_commision", with = "rust_decimal::serde::float")]
    pub distributor_commission: Decimal,
    #[serde(rename = "retailer_commision", with = "rust_decimal::serde::float")]
    pub retailer_commission: Decimal,
}

fn default_service() -> String {
    PAYOUT_SERVICE.to_string()
}

impl CommissionRecord {
    /// Sum of the four shares, or `None` if it overflows `Decimal`.
    pub fn share_sum(&self) -> Option<Decimal> {
        self.admin_commission
            .checked_add(self.master_distributor_commission)?
            .checked_add(self.distributor_commission)?
            .checked_add(self.retailer_commission)
    }
}

/// The four shares of a split, as submitted to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitShares {
    #[serde(rename = "total_commision", with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(rename = "admin_commision", with = "rust_decimal::serde::float")]
    pub admin: Decimal,
    #[serde(rename = "master_distributor_commision", with = "rust_decimal::serde::float")]
    pub master_distributor: Decimal,
    #[serde(rename = "distributor_commision", with = "rust_decimal::serde::float")]
    pub distributor: Decimal,
    #[serde(rename = "retailer_commision", with = "rust_decimal::serde::float")]
    pub retailer: Decimal,
}

/// Body of `POST /commision/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCommissionRequest {
    pub user_id: String,
    pub service: String,
    #[serde(flatten)]
    pub shares: SplitShares,
}

/// Body of `PUT /commision/update/commision`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateCommissionRequest {
    #[serde(rename = "commision_id")]
    pub commission_id: String,
    #[serde(flatten)]
    pub shares: SplitShares,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_commission_record_from_backend_json() {
        let body = json!({
            "commision_id": "C-17",
            "user_id": "MD001",
            "service": "PAYOUT",
            "total_commision": 1.0,
            "admin_commision": 0.1,
            "master_distributor_commision": 0.5,
            "distributor_commision": 0.3,
            "retailer_commision": 0.1
        });
        let record: CommissionRecord = serde_json::from_value(body).unwrap();
        assert_eq!(record.commission_id.as_deref(), Some("C-17"));
        assert_eq!(record.user_id, "MD001");
        assert_eq!(record.master_distributor_commission, dec("0.5"));
        assert_eq!(record.share_sum().map(|sum| sum.round_dp(2)), Some(dec("1.00")));
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: ApiEnvelope<CommissionRecord> =
            serde_json::from_value(json!({"status": "failed", "message": "db unavailable"})).unwrap();
        assert_eq!(envelope.status.as_deref(), Some("failed"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_create_request_uses_backend_field_names() {
        let req = CreateCommissionRequest {
            user_id: "MD001".into(),
            service: PAYOUT_SERVICE.into(),
            shares: SplitShares {
                total: TOTAL_COMMISSION,
                admin: dec("0.10"),
                master_distributor: dec("0.50"),
                distributor: dec("0.30"),
                retailer: dec("0.10"),
            },
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["user_id"], "MD001");
        assert_eq!(value["service"], "PAYOUT");
        assert_eq!(value["admin_commision"].as_f64(), Some(0.1));
        assert_eq!(value["total_commision"].as_f64(), Some(1.0));
        assert!(value.get("commision_id").is_none());
    }

    #[test]
    fn test_node_accessors() {
        let node: HierarchyNode = DistributorDto {
            distributor_id: "D001".into(),
            distributor_name: "North".into(),
            master_distributor_id: "MD001".into(),
        }
        .into();
        assert_eq!(node.id(), "D001");
        assert_eq!(node.name(), "North");
        assert_eq!(node.parent_id(), Some("MD001"));
        assert_eq!(node.level(), HierarchyLevel::Distributor);
    }
}

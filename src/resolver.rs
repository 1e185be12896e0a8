//! Inheritance resolution.
//!
//! The backend answers a commission lookup with the nearest record up
//! the hierarchy.  Whether that record belongs to the node itself
//! decides what a save does: update the node's own record, or create
//! one for the node.

use crate::client::CommissionBackend;
use crate::error::BackendError;
use crate::models::{CommissionRecord, PAYOUT_SERVICE};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The node has its own record.
    Direct(CommissionRecord),
    /// The record belongs to an ancestor; the node inherits it.
    Inherited(CommissionRecord),
    /// Nothing is configured anywhere above the node.
    NotConfigured,
}

impl Resolution {
    /// Classifies a lookup result for `node_id`.
    pub fn classify(node_id: &str, record: Option<CommissionRecord>) -> Self {
        match record {
            Some(record) if record.user_id == node_id => Resolution::Direct(record),
            Some(record) => Resolution::Inherited(record),
            None => Resolution::NotConfigured,
        }
    }

    pub fn record(&self) -> Option<&CommissionRecord> {
        match self {
            Resolution::Direct(record) | Resolution::Inherited(record) => Some(record),
            Resolution::NotConfigured => None,
        }
    }

    pub fn is_inherited(&self) -> bool {
        matches!(self, Resolution::Inherited(_))
    }

    /// The id to update on save, present only for a direct record.
    pub fn direct_commission_id(&self) -> Option<&str> {
        match self {
            Resolution::Direct(record) => record.commission_id.as_deref(),
            _ => None,
        }
    }
}

/// Looks up the payout commission that applies to `node_id`.
pub async fn resolve<B>(backend: &B, node_id: &str) -> Result<Resolution, BackendError>
where
    B: CommissionBackend + ?Sized,
{
    let record = backend.get_commission(node_id, PAYOUT_SERVICE).await?;
    let resolution = Resolution::classify(node_id, record);
    debug!(
        node_id,
        inherited = resolution.is_inherited(),
        configured = resolution.record().is_some(),
        "resolved commission"
    );
    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn record(owner: &str) -> CommissionRecord {
        CommissionRecord {
            commission_id: Some("C1".into()),
            user_id: owner.into(),
            service: PAYOUT_SERVICE.into(),
            total_commission: Decimal::ONE,
            admin_commission: Decimal::new(10, 2),
            master_distributor_commission: Decimal::new(50, 2),
            distributor_commission: Decimal::new(30, 2),
            retailer_commission: Decimal::new(10, 2),
        }
    }

    #[test]
    fn test_own_record_is_direct() {
        let resolution = Resolution::classify("MD001", Some(record("MD001")));
        assert!(!resolution.is_inherited());
        assert_eq!(resolution.direct_commission_id(), Some("C1"));
    }

    #[test]
    fn test_ancestor_record_is_inherited() {
        let resolution = Resolution::classify("D001", Some(record("MD001")));
        assert!(resolution.is_inherited());
        assert_eq!(resolution.direct_commission_id(), None);
        assert_eq!(resolution.record().map(|r| r.user_id.as_str()), Some("MD001"));
    }

    #[test]
    fn test_missing_record_is_not_configured() {
        let resolution = Resolution::classify("MD001", None);
        assert_eq!(resolution, Resolution::NotConfigured);
        assert!(!resolution.is_inherited());
    }
}

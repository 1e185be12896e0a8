//! Batch audit of commission records.
//!
//! Checks a set of records fetched from the backend against the split
//! rules: the total is 100%, no share is negative, and the four shares
//! add up to the total at two decimal places.  Records are checked in
//! parallel with [`rayon`], one task per record.

use crate::models::{CommissionRecord, TOTAL_COMMISSION};
use crate::split::round2;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditIssue {
    /// `total_commission` is not 1.00.
    UnexpectedTotal,
    /// At least one of the four shares is below zero.
    NegativeShare,
    /// The four shares do not add up to the total.
    SharesDoNotSum,
}

/// Audit result for a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordAudit {
    pub user_id: String,
    pub commission_id: Option<String>,
    /// `None` when the shares are too large to add up.
    pub share_sum: Option<Decimal>,
    pub issues: Vec<AuditIssue>,
}

impl RecordAudit {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub records: Vec<RecordAudit>,
    pub inconsistent: usize,
}

/// Audits one record.
pub fn audit_record(record: &CommissionRecord) -> RecordAudit {
    let mut issues = Vec::new();
    if round2(record.total_commission) != TOTAL_COMMISSION {
        issues.push(AuditIssue::UnexpectedTotal);
    }
    let shares = [
        record.admin_commission,
        record.master_distributor_commission,
        record.distributor_commission,
        record.retailer_commission,
    ];
    if shares.iter().any(|share| *share < Decimal::ZERO) {
        issues.push(AuditIssue::NegativeShare);
    }
    let share_sum = record.share_sum();
    if share_sum.map(round2) != Some(round2(record.total_commission)) {
        issues.push(AuditIssue::SharesDoNotSum);
    }
    RecordAudit {
        user_id: record.user_id.clone(),
        commission_id: record.commission_id.clone(),
        share_sum,
        issues,
    }
}

/// Audits every record.  Results keep the input order.
pub fn audit_records(records: &[CommissionRecord]) -> AuditReport {
    let records: Vec<RecordAudit> = records.par_iter().map(audit_record).collect();
    let inconsistent = records.iter().filter(|audit| !audit.is_consistent()).count();
    AuditReport { records, inconsistent }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PAYOUT_SERVICE;

    fn record(owner: &str, admin: i64, md: i64, distributor: i64, retailer: i64) -> CommissionRecord {
        CommissionRecord {
            commission_id: None,
            user_id: owner.into(),
            service: PAYOUT_SERVICE.into(),
            total_commission: TOTAL_COMMISSION,
            admin_commission: Decimal::new(admin, 2),
            master_distributor_commission: Decimal::new(md, 2),
            distributor_commission: Decimal::new(distributor, 2),
            retailer_commission: Decimal::new(retailer, 2),
        }
    }

    #[test]
    fn test_consistent_record() {
        let audit = audit_record(&record("MD001", 10, 50, 30, 10));
        assert!(audit.is_consistent());
        assert_eq!(audit.share_sum, Some(Decimal::new(100, 2)));
    }

    #[test]
    fn test_report_flags_bad_records_in_order() {
        let report = audit_records(&[
            record("MD001", 10, 50, 30, 10),
            record("MD002", 20, 50, 30, 10),
            record("MD003", -10, 60, 30, 20),
        ]);
        assert_eq!(report.inconsistent, 2);
        assert_eq!(report.records[1].user_id, "MD002");
        assert_eq!(report.records[1].issues, vec![AuditIssue::SharesDoNotSum]);
        assert_eq!(report.records[2].issues, vec![AuditIssue::NegativeShare]);
    }

    #[test]
    fn test_unexpected_total() {
        let mut bad = record("MD001", 10, 50, 30, 10);
        bad.total_commission = Decimal::new(90, 2);
        let audit = audit_record(&bad);
        assert_eq!(
            audit.issues,
            vec![AuditIssue::UnexpectedTotal, AuditIssue::SharesDoNotSum]
        );
    }

    #[test]
    fn test_overflowing_shares_are_flagged() {
        let mut huge = record("MD001", 10, 50, 30, 10);
        huge.master_distributor_commission = Decimal::MAX;
        huge.distributor_commission = Decimal::MAX;
        let report = audit_records(&[huge]);
        assert_eq!(report.inconsistent, 1);
        assert_eq!(report.records[0].share_sum, None);
        assert_eq!(report.records[0].issues, vec![AuditIssue::SharesDoNotSum]);
    }
}

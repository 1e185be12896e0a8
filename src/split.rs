//! Split validation and the editable draft.
//!
//! The operator enters three shares (master distributor, distributor,
//! retailer); the admin keeps whatever is left of the total.  All
//! arithmetic is done on exact decimals so that sums such as
//! `0.1 + 0.2 + 0.7` compare equal to the total.

use crate::models::{CommissionRecord, SplitShares, TOTAL_COMMISSION};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

lazy_static! {
    static ref PERCENT_INPUT: Regex = Regex::new(r"^\d*\.?\d{0,2}$").unwrap();
    static ref OVERLONG_FRACTION: Regex = Regex::new(r"^(\d*\.\d{2})\d+$").unwrap();
}

/// One of the three operator-editable shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitField {
    MasterDistributor,
    Distributor,
    Retailer,
}

impl fmt::Display for SplitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SplitField::MasterDistributor => "master distributor commission",
            SplitField::Distributor => "distributor commission",
            SplitField::Retailer => "retailer commission",
        };
        f.write_str(name)
    }
}

/// Reasons a split cannot be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitError {
    #[error("total of all commissions cannot exceed the total commission")]
    ExceedsTotal,
    #[error("admin commission cannot be negative")]
    NegativeAdminShare,
    #[error("commission values cannot be negative")]
    NegativeInput,
    #[error("{0} is required")]
    MissingField(SplitField),
}

/// Outcome of [`validate`]: the admin remainder and the first rule the
/// split breaks, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitVerdict {
    pub admin_remainder: Decimal,
    pub error: Option<SplitError>,
}

impl SplitVerdict {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Rounds half away from zero to two decimal places.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Validates a split of `total` and derives the admin remainder.
///
/// Rules are checked in order: the three shares exceeding the total,
/// a negative admin remainder, then any negative share.  The remainder
/// is reported even when the split is invalid so it can be displayed.
/// Shares too large to add up exceed the total, with a zero remainder.
pub fn validate(md: Decimal, distributor: Decimal, retailer: Decimal, total: Decimal) -> SplitVerdict {
    let sums = md
        .checked_add(distributor)
        .and_then(|partial| partial.checked_add(retailer))
        .and_then(|entered| total.checked_sub(entered).map(|remainder| (entered, remainder)));
    let Some((entered, remainder)) = sums else {
        return SplitVerdict {
            admin_remainder: Decimal::ZERO,
            error: Some(SplitError::ExceedsTotal),
        };
    };

    let error = if entered > total {
        Some(SplitError::ExceedsTotal)
    } else if remainder < Decimal::ZERO {
        Some(SplitError::NegativeAdminShare)
    } else if md < Decimal::ZERO || distributor < Decimal::ZERO || retailer < Decimal::ZERO {
        Some(SplitError::NegativeInput)
    } else {
        None
    };

    SplitVerdict {
        admin_remainder: round2(remainder),
        error,
    }
}

/// Applies the input rule for percentage fields to a candidate text.
///
/// Conforming text (digits, at most one point, at most two fractional
/// digits) is accepted as is.  Text that only breaks the rule by
/// carrying extra fractional digits is truncated to two.  Anything else
/// is rejected with `None`, and the field should keep its old value.
pub fn constrain_input(candidate: &str) -> Option<String> {
    if PERCENT_INPUT.is_match(candidate) {
        return Some(candidate.to_string());
    }
    OVERLONG_FRACTION
        .captures(candidate)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parses constrained field text; empty text counts as zero.  `None`
/// when the number is too large for a `Decimal`.
fn parse_field(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "." {
        return Some(Decimal::ZERO);
    }
    trimmed.parse().ok()
}

fn format_share(value: Decimal) -> String {
    format!("{:.2}", round2(value))
}

/// The three operator-entered shares, held as text exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitDraft {
    pub md: String,
    pub distributor: String,
    pub retailer: String,
}

impl SplitDraft {
    /// Fills the draft from a stored record, formatted to two decimals.
    pub fn from_record(record: &CommissionRecord) -> Self {
        Self {
            md: format_share(record.master_distributor_commission),
            distributor: format_share(record.distributor_commission),
            retailer: format_share(record.retailer_commission),
        }
    }

    pub fn field(&self, field: SplitField) -> &str {
        match field {
            SplitField::MasterDistributor => &self.md,
            SplitField::Distributor => &self.distributor,
            SplitField::Retailer => &self.retailer,
        }
    }

    /// Offers new text for a field.  Returns whether the field changed;
    /// rejected text leaves the previous value in place.
    pub fn set_field(&mut self, field: SplitField, text: &str) -> bool {
        let Some(accepted) = constrain_input(text) else {
            return false;
        };
        let slot = match field {
            SplitField::MasterDistributor => &mut self.md,
            SplitField::Distributor => &mut self.distributor,
            SplitField::Retailer => &mut self.retailer,
        };
        *slot = accepted;
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The first empty field, in display order.
    pub fn missing_field(&self) -> Option<SplitField> {
        [SplitField::MasterDistributor, SplitField::Distributor, SplitField::Retailer]
            .into_iter()
            .find(|field| self.field(*field).trim().is_empty())
    }

    pub fn is_complete(&self) -> bool {
        self.missing_field().is_none()
    }

    /// Parsed `(md, distributor, retailer)`; empty fields are zero.
    /// `None` if a field holds a number too large to represent.
    pub fn values(&self) -> Option<(Decimal, Decimal, Decimal)> {
        Some((
            parse_field(&self.md)?,
            parse_field(&self.distributor)?,
            parse_field(&self.retailer)?,
        ))
    }

    /// Recomputes the verdict against the fixed total.  A share that
    /// cannot be represented necessarily exceeds it.
    pub fn verdict(&self) -> SplitVerdict {
        match self.values() {
            Some((md, distributor, retailer)) => validate(md, distributor, retailer, TOTAL_COMMISSION),
            None => SplitVerdict {
                admin_remainder: Decimal::ZERO,
                error: Some(SplitError::ExceedsTotal),
            },
        }
    }

    /// Checks the draft can be submitted: all fields present, then the
    /// split rules.  Returns the shares to send on success.
    pub fn submittable_shares(&self) -> Result<SplitShares, SplitError> {
        if let Some(field) = self.missing_field() {
            return Err(SplitError::MissingField(field));
        }
        let verdict = self.verdict();
        if let Some(err) = verdict.error {
            return Err(err);
        }
        let (md, distributor, retailer) = self.values().ok_or(SplitError::ExceedsTotal)?;
        Ok(SplitShares {
            total: TOTAL_COMMISSION,
            admin: verdict.admin_remainder,
            master_distributor: round2(md),
            distributor: round2(distributor),
            retailer: round2(retailer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_full_share_to_master_distributor_leaves_nothing_for_admin() {
        let verdict = validate(dec("1.00"), Decimal::ZERO, Decimal::ZERO, TOTAL_COMMISSION);
        assert!(verdict.is_valid());
        assert_eq!(verdict.admin_remainder, dec("0.00"));
    }

    #[test]
    fn test_shares_over_total_are_rejected() {
        let verdict = validate(dec("0.50"), dec("0.30"), dec("0.25"), TOTAL_COMMISSION);
        assert_eq!(verdict.error, Some(SplitError::ExceedsTotal));
    }

    #[test]
    fn test_exceeding_total_takes_precedence_over_negative_input() {
        let verdict = validate(dec("1.50"), dec("-0.10"), Decimal::ZERO, TOTAL_COMMISSION);
        assert_eq!(verdict.error, Some(SplitError::ExceedsTotal));
    }

    #[test]
    fn test_negative_input_is_rejected() {
        let verdict = validate(dec("0.50"), dec("-0.10"), dec("0.20"), TOTAL_COMMISSION);
        assert_eq!(verdict.error, Some(SplitError::NegativeInput));
        assert_eq!(verdict.admin_remainder, dec("0.40"));
    }

    #[test]
    fn test_exact_decimal_sums_do_not_drift() {
        let verdict = validate(dec("0.1"), dec("0.2"), dec("0.7"), TOTAL_COMMISSION);
        assert!(verdict.is_valid());
        assert_eq!(verdict.admin_remainder, Decimal::ZERO);
    }

    #[test]
    fn test_valid_split_adds_back_up_to_total() {
        for (md, d, r) in [("0.50", "0.30", "0.10"), ("0.33", "0.33", "0.33"), ("0", "0", "0")] {
            let (md, d, r) = (dec(md), dec(d), dec(r));
            let verdict = validate(md, d, r, TOTAL_COMMISSION);
            assert!(verdict.is_valid());
            assert_eq!(round2(verdict.admin_remainder + md + d + r), dec("1.00"));
        }
    }

    #[test]
    fn test_round2_is_half_away_from_zero() {
        assert_eq!(round2(dec("0.125")), dec("0.13"));
        assert_eq!(round2(dec("-0.125")), dec("-0.13"));
        assert_eq!(round2(dec("0.124")), dec("0.12"));
    }

    #[test]
    fn test_constrain_input() {
        assert_eq!(constrain_input("0.5").as_deref(), Some("0.5"));
        assert_eq!(constrain_input("").as_deref(), Some(""));
        assert_eq!(constrain_input(".").as_deref(), Some("."));
        assert_eq!(constrain_input("12.345").as_deref(), Some("12.34"));
        assert_eq!(constrain_input("1.2.3"), None);
        assert_eq!(constrain_input("-1"), None);
        assert_eq!(constrain_input("abc"), None);
    }

    #[test]
    fn test_rejected_text_keeps_previous_value() {
        let mut draft = SplitDraft::default();
        assert!(draft.set_field(SplitField::Retailer, "0.1"));
        assert!(!draft.set_field(SplitField::Retailer, "0.1x"));
        assert_eq!(draft.retailer, "0.1");
    }

    #[test]
    fn test_empty_field_blocks_submission_but_counts_as_zero() {
        let mut draft = SplitDraft::default();
        draft.set_field(SplitField::MasterDistributor, "0.50");
        draft.set_field(SplitField::Retailer, "0.10");
        assert_eq!(draft.verdict().admin_remainder, dec("0.40"));
        assert_eq!(
            draft.submittable_shares(),
            Err(SplitError::MissingField(SplitField::Distributor))
        );
    }

    #[test]
    fn test_submittable_shares_carry_admin_remainder() {
        let draft = SplitDraft {
            md: "0.50".into(),
            distributor: "0.30".into(),
            retailer: "0.10".into(),
        };
        let shares = draft.submittable_shares().unwrap();
        assert_eq!(shares.admin, dec("0.10"));
        assert_eq!(shares.total, TOTAL_COMMISSION);
    }

    #[test]
    fn test_draft_from_record_formats_two_decimals() {
        let record = CommissionRecord {
            commission_id: Some("C1".into()),
            user_id: "MD001".into(),
            service: "PAYOUT".into(),
            total_commission: dec("1"),
            admin_commission: dec("0.1"),
            master_distributor_commission: dec("0.5"),
            distributor_commission: dec("0.3"),
            retailer_commission: dec("0.1"),
        };
        let draft = SplitDraft::from_record(&record);
        assert_eq!(draft.md, "0.50");
        assert_eq!(draft.distributor, "0.30");
        assert_eq!(draft.retailer, "0.10");
    }

    #[test]
    fn test_overflowing_shares_exceed_total() {
        let max = "79228162514264337593543950335";
        let mut draft = SplitDraft::default();
        assert!(draft.set_field(SplitField::MasterDistributor, max));
        assert!(draft.set_field(SplitField::Distributor, max));
        assert!(draft.set_field(SplitField::Retailer, "0"));
        assert_eq!(draft.verdict().error, Some(SplitError::ExceedsTotal));
        assert_eq!(draft.submittable_shares(), Err(SplitError::ExceedsTotal));
    }

    #[test]
    fn test_validate_overflow_is_exceeds_total() {
        let verdict = validate(Decimal::MAX, Decimal::MAX, Decimal::ZERO, TOTAL_COMMISSION);
        assert_eq!(verdict.error, Some(SplitError::ExceedsTotal));
    }

    #[test]
    fn test_unrepresentable_share_is_never_read_as_zero() {
        let draft = SplitDraft {
            md: "100000000000000000000000000000".into(),
            distributor: "0.30".into(),
            retailer: "0.10".into(),
        };
        assert_eq!(draft.values(), None);
        assert_eq!(draft.verdict().error, Some(SplitError::ExceedsTotal));
        assert_eq!(draft.submittable_shares(), Err(SplitError::ExceedsTotal));
    }
}

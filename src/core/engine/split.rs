use crate::core::errors::ReconcilioError;
use crate::core::models::shared_account::SplitType;
use log::debug;
use std::collections::BTreeMap;

/// Computes per-member shares, in minor units, for a split transaction.
pub fn split_shares(
    split_type: SplitType,
    paid_by: &str,
    total_minor: i128,
    members: &[String],
) -> Result<BTreeMap<String, i128>, ReconcilioError> {
    match split_type {
        SplitType::Equal => equal_shares(paid_by, total_minor, members),
        SplitType::Percentage | SplitType::Custom => Err(ReconcilioError::UnsupportedSplitType(split_type.to_string())),
    }
}

/// Every member gets `total / n` rounded half away from zero; whatever that
/// leaves over (positive or negative) lands on the payer's share.
pub fn equal_shares(paid_by: &str, total_minor: i128, members: &[String]) -> Result<BTreeMap<String, i128>, ReconcilioError> {
    if members.is_empty() {
        return Err(ReconcilioError::NoMembers);
    }
    if !members.iter().any(|m| m == paid_by) {
        return Err(ReconcilioError::NotMember(paid_by.to_string()));
    }

    let mut shares: BTreeMap<String, i128> = members.iter().map(|m| (m.clone(), 0)).collect();
    let count = shares.len() as i128;
    let share = rounded_div(total_minor, count);
    shares.values_mut().for_each(|s| *s = share);

    let residual = total_minor - share * count;
    if let Some(payer_share) = shares.get_mut(paid_by) {
        *payer_share += residual;
    }

    let actual: i128 = shares.values().sum();
    if actual != total_minor {
        return Err(ReconcilioError::RoundingInvariantViolation {
            expected: total_minor,
            actual,
        });
    }
    debug!(
        "Equal split of {} across {} members, residual {} to {}",
        total_minor, count, residual, paid_by
    );
    Ok(shares)
}

fn rounded_div(total: i128, count: i128) -> i128 {
    let quotient = total / count;
    let remainder = total % count;
    if 2 * remainder.abs() >= count {
        quotient + total.signum()
    } else {
        quotient
    }
}

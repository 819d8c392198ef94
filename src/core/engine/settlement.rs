use crate::core::errors::ReconcilioError;
use crate::core::models::currency::Currency;
use crate::core::models::shared_account::{BalanceStatus, MemberBalance, SplitTransaction, Transfer};
use log::debug;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

/// Net position per member: what they paid minus what they owe. Members
/// without any activity are reported as settled.
pub fn compute_balances(
    members: &[String],
    splits: &[SplitTransaction],
    currency: &Currency,
) -> Result<Vec<MemberBalance>, ReconcilioError> {
    let mut net: BTreeMap<String, i128> = members.iter().map(|m| (m.clone(), 0)).collect();

    for split in splits {
        *net.entry(split.paid_by.clone()).or_insert(0) += currency.to_minor_units("total_amount", split.total_amount)?;
        for (user, share) in &split.shares {
            *net.entry(user.clone()).or_insert(0) -= currency.to_minor_units("share", *share)?;
        }
    }

    let mut balances = net
        .into_iter()
        .map(|(user, minor)| {
            let status = match minor.signum() {
                1 => BalanceStatus::Owed,
                -1 => BalanceStatus::Owes,
                _ => BalanceStatus::Settled,
            };
            Ok(MemberBalance {
                user,
                amount: currency.from_minor_units(minor)?,
                status,
            })
        })
        .collect::<Result<Vec<_>, ReconcilioError>>()?;

    balances.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.user.cmp(&b.user)));
    debug!("Balances calculated: {:?}", balances);
    Ok(balances)
}

/// Greedy largest-creditor/largest-debtor pairing. Produces at most
/// `non_zero_balances - 1` transfers for a zero-sum input.
pub fn settle(balances: &[MemberBalance], currency: &Currency) -> Result<Vec<Transfer>, ReconcilioError> {
    // Max-heaps keyed by amount, ties going to the smaller identifier.
    let mut creditors: BinaryHeap<(i128, Reverse<String>)> = BinaryHeap::new();
    let mut debtors: BinaryHeap<(i128, Reverse<String>)> = BinaryHeap::new();

    for balance in balances {
        let minor = currency.to_minor_units("amount", balance.amount)?;
        if minor > 0 {
            creditors.push((minor, Reverse(balance.user.clone())));
        } else if minor < 0 {
            debtors.push((-minor, Reverse(balance.user.clone())));
        }
    }

    let mut transfers = Vec::new();
    while let (Some((credit, Reverse(creditor))), Some((debt, Reverse(debtor)))) = (creditors.pop(), debtors.pop()) {
        let amount = credit.min(debt);
        transfers.push(Transfer {
            from: debtor.clone(),
            to: creditor.clone(),
            amount: currency.from_minor_units(amount)?,
        });
        if credit > amount {
            creditors.push((credit - amount, Reverse(creditor)));
        }
        if debt > amount {
            debtors.push((debt - amount, Reverse(debtor)));
        }
    }

    debug!("Simplified debts: {:?}", transfers);
    Ok(transfers)
}

//! Pairs bank statement rows with recorded ledger transactions.
//!
//! Matching is a single greedy pass over the bank rows in input order. Each
//! row tries the exact tier, then the fuzzy amount+date tier, then the fuzzy
//! description tier, and claims the first eligible ledger transaction. A
//! claimed ledger transaction is never offered to a later row, so an earlier
//! row's fuzzy claim can take a pair a later row would match exactly. This is
//! intentionally not a globally optimal assignment.

use crate::core::models::ledger::LedgerTransaction;
use crate::core::models::reconciliation::{BankRow, MatchStatus, MatchType};
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeSet;

/// Bank posting delay tolerated by the fuzzy amount+date tier.
pub const FUZZY_DATE_WINDOW_DAYS: i64 = 3;
pub const DESCRIPTION_DATE_WINDOW_DAYS: i64 = 7;
pub const MIN_TOKEN_OVERLAP: f64 = 0.5;
const MIN_FUZZY_CONFIDENCE: i64 = 70;

#[derive(Clone, Debug, PartialEq)]
pub struct MatchOutcome {
    pub bank_row: Option<BankRow>,
    pub ledger_transaction: Option<LedgerTransaction>,
    pub status: MatchStatus,
    pub confidence: u8,
    pub match_type: Option<MatchType>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tier {
    Exact,
    FuzzyAmountDate,
    FuzzyDescription,
}

impl Tier {
    const ORDER: [Tier; 3] = [Tier::Exact, Tier::FuzzyAmountDate, Tier::FuzzyDescription];

    fn match_type(self) -> MatchType {
        match self {
            Tier::Exact => MatchType::Exact,
            Tier::FuzzyAmountDate => MatchType::FuzzyAmountDate,
            Tier::FuzzyDescription => MatchType::FuzzyDescription,
        }
    }

    /// Confidence for the pair if it qualifies for this tier.
    fn score(self, row: &BankRow, tx: &LedgerTransaction) -> Option<u8> {
        if row.amount != tx.amount {
            return None;
        }
        let delta = day_delta(row.date, tx.date);
        match self {
            Tier::Exact => (delta == 0).then_some(100),
            Tier::FuzzyAmountDate => {
                (delta <= FUZZY_DATE_WINDOW_DAYS).then(|| (100 - 10 * delta).max(MIN_FUZZY_CONFIDENCE) as u8)
            }
            Tier::FuzzyDescription => {
                if delta > DESCRIPTION_DATE_WINDOW_DAYS {
                    return None;
                }
                let ratio = token_overlap(&row.description, &tx.description);
                (ratio >= MIN_TOKEN_OVERLAP).then(|| (50.0 + 40.0 * ratio).round() as u8)
            }
        }
    }
}

struct Claim {
    ledger_index: usize,
    tier: Tier,
    confidence: u8,
}

fn day_delta(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

/// Lowercases, drops punctuation and splits on whitespace.
pub fn normalize_description(description: &str) -> BTreeSet<String> {
    description
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Jaccard overlap of the normalized word sets, 0.0 when both are empty.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let left = normalize_description(a);
    let right = normalize_description(b);
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

/// Produces one outcome per bank row, in input order, followed by one
/// `unmatched_app` outcome per unclaimed ledger transaction in id order.
pub fn match_transactions(bank_rows: &[BankRow], ledger: &[LedgerTransaction]) -> Vec<MatchOutcome> {
    let mut claimed = vec![false; ledger.len()];
    let mut claims: Vec<Option<Claim>> = bank_rows.iter().map(|_| None).collect();

    for (bank_index, row) in bank_rows.iter().enumerate() {
        for tier in Tier::ORDER {
            let best = ledger
                .iter()
                .enumerate()
                .filter(|(ledger_index, _)| !claimed[*ledger_index])
                .filter_map(|(ledger_index, tx)| {
                    tier.score(row, tx)
                        .map(|confidence| (ledger_index, day_delta(row.date, tx.date), confidence))
                })
                .min_by(|a, b| a.1.cmp(&b.1).then_with(|| ledger[a.0].id.cmp(&ledger[b.0].id)));

            if let Some((ledger_index, _, confidence)) = best {
                debug!(
                    "Bank row {} claimed ledger transaction {} ({:?}, confidence {})",
                    bank_index, ledger[ledger_index].id, tier, confidence
                );
                claimed[ledger_index] = true;
                claims[bank_index] = Some(Claim {
                    ledger_index,
                    tier,
                    confidence,
                });
                break;
            }
        }
    }

    let mut outcomes: Vec<MatchOutcome> = bank_rows
        .iter()
        .zip(claims)
        .map(|(row, claim)| match claim {
            Some(claim) => MatchOutcome {
                bank_row: Some(row.clone()),
                ledger_transaction: Some(ledger[claim.ledger_index].clone()),
                status: MatchStatus::Matched,
                confidence: claim.confidence,
                match_type: Some(claim.tier.match_type()),
            },
            None => MatchOutcome {
                bank_row: Some(row.clone()),
                ledger_transaction: None,
                status: MatchStatus::UnmatchedBank,
                confidence: 0,
                match_type: None,
            },
        })
        .collect();

    let mut leftovers: Vec<&LedgerTransaction> = ledger
        .iter()
        .enumerate()
        .filter(|(i, _)| !claimed[*i])
        .map(|(_, tx)| tx)
        .collect();
    leftovers.sort_by_key(|tx| tx.id);
    outcomes.extend(leftovers.into_iter().map(|tx| MatchOutcome {
        bank_row: None,
        ledger_transaction: Some(tx.clone()),
        status: MatchStatus::UnmatchedApp,
        confidence: 0,
        match_type: None,
    }));

    debug!(
        "Matched {} bank rows against {} ledger transactions into {} outcomes",
        bank_rows.len(),
        ledger.len(),
        outcomes.len()
    );
    outcomes
}

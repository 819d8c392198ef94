use super::{date, dec, ledger_tx};
use crate::core::engine::matcher::{match_transactions, normalize_description, token_overlap};
use crate::core::models::reconciliation::{BankRow, MatchStatus, MatchType};
use chrono::NaiveDate;

fn bank_row(on: NaiveDate, amount: &str, description: &str) -> BankRow {
    BankRow {
        date: on,
        amount: dec(amount),
        description: description.to_string(),
        reference: None,
    }
}

#[test]
fn test_exact_match_has_full_confidence() {
    let _ = env_logger::try_init();
    let rows = vec![bank_row(date(2024, 6, 10), "-120.00", "SBB CFF FFS")];
    let ledger = vec![ledger_tx(1, date(2024, 6, 10), "-120.00", "Train ticket")];

    let outcomes = match_transactions(&rows, &ledger);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, MatchStatus::Matched);
    assert_eq!(outcomes[0].match_type, Some(MatchType::Exact));
    assert_eq!(outcomes[0].confidence, 100);
    assert_eq!(outcomes[0].ledger_transaction.as_ref().map(|t| t.id), Some(1));
}

#[test]
fn test_posting_delay_is_fuzzy_amount_date() {
    let _ = env_logger::try_init();
    let rows = vec![bank_row(date(2024, 6, 1), "-45.50", "Migros Basel")];
    let ledger = vec![ledger_tx(7, date(2024, 6, 3), "-45.50", "Migros Einkauf")];

    let outcomes = match_transactions(&rows, &ledger);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, MatchStatus::Matched);
    assert_eq!(outcomes[0].match_type, Some(MatchType::FuzzyAmountDate));
    assert_eq!(outcomes[0].confidence, 80);
}

#[test]
fn test_fuzzy_amount_date_confidence_per_day() {
    let _ = env_logger::try_init();
    for (offset, expected) in [(1, 90), (2, 80), (3, 70)] {
        let rows = vec![bank_row(date(2024, 6, 10), "-9.90", "Kiosk")];
        let ledger = vec![ledger_tx(1, date(2024, 6, 10 + offset), "-9.90", "Newspaper")];

        let outcomes = match_transactions(&rows, &ledger);

        assert_eq!(outcomes[0].match_type, Some(MatchType::FuzzyAmountDate));
        assert_eq!(outcomes[0].confidence, expected, "offset {} days", offset);
    }
}

#[test]
fn test_description_tier_reaches_a_week() {
    let _ = env_logger::try_init();
    let rows = vec![bank_row(date(2024, 6, 1), "-18.40", "COOP PRONTO, Basel!")];
    let ledger = vec![ledger_tx(3, date(2024, 6, 6), "-18.40", "coop pronto basel")];

    let outcomes = match_transactions(&rows, &ledger);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].match_type, Some(MatchType::FuzzyDescription));
    assert_eq!(outcomes[0].confidence, 90);
}

#[test]
fn test_description_tier_needs_half_the_words() {
    let _ = env_logger::try_init();
    let rows = vec![bank_row(date(2024, 6, 1), "-45.50", "Migros Basel")];
    let ledger = vec![ledger_tx(4, date(2024, 6, 6), "-45.50", "Migros Einkauf")];

    let outcomes = match_transactions(&rows, &ledger);

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].status, MatchStatus::UnmatchedBank);
    assert_eq!(outcomes[0].confidence, 0);
    assert_eq!(outcomes[0].match_type, None);
    assert_eq!(outcomes[1].status, MatchStatus::UnmatchedApp);
    assert!(outcomes[1].bank_row.is_none());
    assert_eq!(outcomes[1].ledger_transaction.as_ref().map(|t| t.id), Some(4));
}

#[test]
fn test_amounts_must_be_equal() {
    let _ = env_logger::try_init();
    let rows = vec![bank_row(date(2024, 6, 1), "-45.50", "Migros Basel")];
    let ledger = vec![ledger_tx(1, date(2024, 6, 1), "-45.55", "Migros Basel")];

    let outcomes = match_transactions(&rows, &ledger);

    assert_eq!(outcomes[0].status, MatchStatus::UnmatchedBank);
    assert_eq!(outcomes[1].status, MatchStatus::UnmatchedApp);
}

#[test]
fn test_rows_claim_in_input_order() {
    let _ = env_logger::try_init();
    let rows = vec![
        bank_row(date(2024, 6, 2), "-10.00", "Bakery"),
        bank_row(date(2024, 6, 1), "-10.00", "Bakery"),
    ];
    let ledger = vec![ledger_tx(1, date(2024, 6, 1), "-10.00", "Bread")];

    let outcomes = match_transactions(&rows, &ledger);

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].status, MatchStatus::Matched);
    assert_eq!(outcomes[0].ledger_transaction.as_ref().map(|t| t.id), Some(1));
    assert_eq!(outcomes[0].match_type, Some(MatchType::FuzzyAmountDate));
    assert_eq!(outcomes[0].confidence, 90);
    assert_eq!(outcomes[1].status, MatchStatus::UnmatchedBank);
    assert_eq!(outcomes[1].match_type, None);
}

#[test]
fn test_later_row_falls_back_to_what_is_left() {
    let _ = env_logger::try_init();
    let rows = vec![
        bank_row(date(2024, 6, 2), "-10.00", "Bakery"),
        bank_row(date(2024, 6, 1), "-10.00", "Bakery"),
    ];
    let ledger = vec![
        ledger_tx(1, date(2024, 6, 1), "-10.00", "Bread"),
        ledger_tx(2, date(2024, 6, 4), "-10.00", "Bread"),
    ];

    let outcomes = match_transactions(&rows, &ledger);

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].ledger_transaction.as_ref().map(|t| t.id), Some(1));
    assert_eq!(outcomes[0].confidence, 90);
    assert_eq!(outcomes[1].ledger_transaction.as_ref().map(|t| t.id), Some(2));
    assert_eq!(outcomes[1].match_type, Some(MatchType::FuzzyAmountDate));
    assert_eq!(outcomes[1].confidence, 70);
}

#[test]
fn test_description_confidence_rounds_partial_overlap() {
    let _ = env_logger::try_init();
    let cases = [
        ("Coop Pronto Basel", "coop pronto", 77),
        ("Coop Pronto Basel Bahnhof SBB", "coop pronto basel", 74),
    ];
    for (bank_text, ledger_text, expected) in cases {
        let rows = vec![bank_row(date(2024, 6, 1), "-18.40", bank_text)];
        let ledger = vec![ledger_tx(3, date(2024, 6, 6), "-18.40", ledger_text)];

        let outcomes = match_transactions(&rows, &ledger);

        assert_eq!(outcomes.len(), 1, "{}", bank_text);
        assert_eq!(outcomes[0].match_type, Some(MatchType::FuzzyDescription));
        assert_eq!(outcomes[0].confidence, expected, "{}", bank_text);
    }
}

#[test]
fn test_ties_go_to_the_closest_date_then_the_lowest_id() {
    let _ = env_logger::try_init();
    let rows = vec![bank_row(date(2024, 6, 2), "-10.00", "Bakery")];
    let ledger = vec![
        ledger_tx(5, date(2024, 6, 1), "-10.00", "Bread"),
        ledger_tx(9, date(2024, 6, 4), "-10.00", "Bread"),
        ledger_tx(3, date(2024, 6, 3), "-10.00", "Bread"),
    ];

    let outcomes = match_transactions(&rows, &ledger);

    assert_eq!(outcomes[0].ledger_transaction.as_ref().map(|t| t.id), Some(3));
    let leftover: Vec<u64> = outcomes[1..]
        .iter()
        .filter_map(|o| o.ledger_transaction.as_ref().map(|t| t.id))
        .collect();
    assert_eq!(leftover, vec![5, 9]);
}

#[test]
fn test_ledger_transaction_is_consumed_once() {
    let _ = env_logger::try_init();
    let rows = vec![
        bank_row(date(2024, 6, 1), "-5.00", "Coffee"),
        bank_row(date(2024, 6, 1), "-5.00", "Coffee"),
    ];
    let ledger = vec![ledger_tx(1, date(2024, 6, 1), "-5.00", "Coffee")];

    let outcomes = match_transactions(&rows, &ledger);

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].status, MatchStatus::Matched);
    assert_eq!(outcomes[1].status, MatchStatus::UnmatchedBank);
}

#[test]
fn test_every_row_and_transaction_appears_exactly_once() {
    let _ = env_logger::try_init();
    let rows = vec![
        bank_row(date(2024, 6, 1), "-45.50", "Migros Basel"),
        bank_row(date(2024, 6, 10), "-120.00", "SBB"),
        bank_row(date(2024, 6, 20), "-80.00", "Unknown shop"),
        bank_row(date(2024, 6, 25), "2500.00", "Salary June"),
    ];
    let ledger = vec![
        ledger_tx(1, date(2024, 6, 3), "-45.50", "Migros Einkauf"),
        ledger_tx(2, date(2024, 6, 10), "-120.00", "Train"),
        ledger_tx(3, date(2024, 6, 28), "2500.00", "salary june"),
        ledger_tx(4, date(2024, 6, 15), "-12.00", "Lunch"),
    ];

    let outcomes = match_transactions(&rows, &ledger);

    let with_bank = outcomes.iter().filter(|o| o.bank_row.is_some()).count();
    let matched = outcomes.iter().filter(|o| o.status == MatchStatus::Matched).count();
    let unmatched_bank = outcomes.iter().filter(|o| o.status == MatchStatus::UnmatchedBank).count();
    assert_eq!(with_bank, rows.len());
    assert_eq!(matched + unmatched_bank, rows.len());

    let mut seen: Vec<u64> = outcomes
        .iter()
        .filter_map(|o| o.ledger_transaction.as_ref().map(|t| t.id))
        .collect();
    seen.sort();
    assert_eq!(seen, vec![1, 2, 3, 4]);

    assert_eq!(outcomes[3].match_type, Some(MatchType::FuzzyAmountDate));
    assert_eq!(outcomes[3].confidence, 70);
    assert_eq!(outcomes[4].status, MatchStatus::UnmatchedApp);
}

#[test]
fn test_description_normalization() {
    let words = normalize_description("  Migros-Basel   AG, Filiale 12! ");
    let expected: Vec<&str> = vec!["12", "ag", "filiale", "migrosbasel"];
    assert_eq!(words.iter().map(String::as_str).collect::<Vec<_>>(), expected);

    assert_eq!(token_overlap("Migros Basel", "migros basel"), 1.0);
    assert!((token_overlap("Migros Basel", "Migros Einkauf") - 1.0 / 3.0).abs() < f64::EPSILON);
    assert_eq!(token_overlap("", "!!"), 0.0);
}

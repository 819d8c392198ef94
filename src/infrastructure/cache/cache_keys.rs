pub fn shared_balances_key(shared_account_id: &str) -> String {
    format!("shared_balances:{}", shared_account_id)
}

use crate::core::errors::ReconcilioError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
    pub decimal_places: u32,
}

pub const CURRENCIES: &[Currency] = &[
    Currency { code: "CHF", name: "Swiss Franc", decimal_places: 2 },
    Currency { code: "EUR", name: "Euro", decimal_places: 2 },
    Currency { code: "USD", name: "US Dollar", decimal_places: 2 },
    Currency { code: "THB", name: "Thai Baht", decimal_places: 2 },
    Currency { code: "GBP", name: "British Pound", decimal_places: 2 },
    Currency { code: "JPY", name: "Japanese Yen", decimal_places: 0 },
    Currency { code: "CNY", name: "Chinese Yuan", decimal_places: 2 },
    Currency { code: "AUD", name: "Australian Dollar", decimal_places: 2 },
    Currency { code: "CAD", name: "Canadian Dollar", decimal_places: 2 },
    Currency { code: "SGD", name: "Singapore Dollar", decimal_places: 2 },
    Currency { code: "INR", name: "Indian Rupee", decimal_places: 2 },
    Currency { code: "BRL", name: "Brazilian Real", decimal_places: 2 },
    Currency { code: "ZAR", name: "South African Rand", decimal_places: 2 },
    Currency { code: "BTC", name: "Bitcoin", decimal_places: 8 },
    Currency { code: "ETH", name: "Ethereum", decimal_places: 18 },
];

impl Currency {
    pub fn lookup(code: &str) -> Result<Currency, ReconcilioError> {
        let upper = code.trim().to_uppercase();
        CURRENCIES
            .iter()
            .find(|c| c.code == upper)
            .copied()
            .ok_or(ReconcilioError::UnsupportedCurrency(code.to_string()))
    }

    /// Converts a decimal amount into integer minor units. Fails when the amount
    /// carries more fractional digits than the currency allows.
    pub fn to_minor_units(&self, field: &str, amount: Decimal) -> Result<i128, ReconcilioError> {
        let factor = Decimal::from(10u64.pow(self.decimal_places));
        let scaled = amount.checked_mul(factor).ok_or_else(|| {
            ReconcilioError::invalid_input(field, "Amount Too Large", format!("{} overflows {}", amount, self.code))
        })?;
        if !scaled.fract().is_zero() {
            return Err(ReconcilioError::invalid_input(
                field,
                "Invalid Amount",
                format!("{} cannot have more than {} decimal places", self.code, self.decimal_places),
            ));
        }
        scaled.to_i128().ok_or_else(|| {
            ReconcilioError::invalid_input(field, "Amount Too Large", format!("{} overflows {}", amount, self.code))
        })
    }

    pub fn from_minor_units(&self, minor: i128) -> Result<Decimal, ReconcilioError> {
        Decimal::try_from_i128_with_scale(minor, self.decimal_places)
            .map_err(|e| ReconcilioError::InternalServerError(format!("Amount out of range: {}", e)))
    }
}

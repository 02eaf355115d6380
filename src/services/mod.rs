use rust_decimal::{Decimal, RoundingStrategy};

pub mod commission_engine;
pub mod commission_ledger;
pub mod fee_calculator;
pub mod pricing_service;

/// Round a monetary amount to the currency's minimal unit, half-up.
pub fn round_to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

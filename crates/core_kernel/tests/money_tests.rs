//! Integration tests for money types

use core_kernel::{Currency, Money, MoneyError};
use rust_decimal_macros::dec;

#[test]
fn display_includes_currency_code() {
    let m = Money::new(dec!(1500), Currency::USD);
    assert_eq!(m.to_string(), "USD 1500.00");
}

#[test]
fn new_rounds_to_currency_precision() {
    let m = Money::new(dec!(10.005), Currency::EUR);
    // Banker's rounding at two decimal places
    assert_eq!(m.amount(), dec!(10.00));
}

#[test]
fn checked_sub_currency_mismatch() {
    let usd = Money::from_minor(5_000, Currency::USD);
    let gbp = Money::from_minor(5_000, Currency::GBP);

    assert!(matches!(
        usd.checked_sub(&gbp),
        Err(MoneyError::CurrencyMismatch(_, _))
    ));
}

#[test]
fn zero_is_not_positive() {
    let zero = Money::zero(Currency::INR);
    assert!(zero.is_zero());
    assert!(!zero.is_positive());
}

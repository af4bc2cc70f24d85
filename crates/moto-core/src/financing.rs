//! # Financing Module
//!
//! French amortization (level payment) schedules.
//!
//! ## The French System
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every installment pays the same amount. Early installments are mostly │
//! │  interest, late ones mostly principal.                                 │
//! │                                                                         │
//! │    r       = annual_rate / periods_per_year                             │
//! │    payment = P · r / (1 − (1 + r)^−n)          rounded UP to the cent   │
//! │                                                                         │
//! │  For each period k = 1..n:                                              │
//! │    interest_k  = ceil(balance · r)                                      │
//! │    principal_k = payment − interest_k                                   │
//! │    balance     = balance − principal_k                                  │
//! │                                                                         │
//! │  The last installment pays whatever balance remains, so the schedule   │
//! │  always closes at exactly 0.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Degenerate Inputs
//! | Input                | Result                                            |
//! |----------------------|---------------------------------------------------|
//! | principal <= 0       | no rows, every total zero                         |
//! | installments == 0    | no rows, `total_paid = principal` (paid in cash)  |
//! | rate == 0            | `payment = ceil(P / n)`, no interest              |

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Rate;
use crate::validation::{self, ValidationResult};

// =============================================================================
// Frequency
// =============================================================================

/// How often installments are due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Biweekly,
    #[default]
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl Frequency {
    pub const ALL: [Frequency; 7] = [
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
        Frequency::Bimonthly,
        Frequency::Quarterly,
        Frequency::Semiannual,
        Frequency::Annual,
    ];

    /// Installment periods in one year.
    pub const fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Weekly => 52,
            Frequency::Biweekly => 26,
            Frequency::Monthly => 12,
            Frequency::Bimonthly => 6,
            Frequency::Quarterly => 4,
            Frequency::Semiannual => 2,
            Frequency::Annual => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Bimonthly => "bimonthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Semiannual => "semiannual",
            Frequency::Annual => "annual",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|freq| freq.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "frequency".to_string(),
                allowed: Frequency::ALL.iter().map(|f| f.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Loan Terms & Schedule
// =============================================================================

/// Inputs of the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    pub principal: Money,
    /// Nominal annual rate (TNA).
    pub annual_rate: Rate,
    pub installments: u32,
    #[serde(default)]
    pub frequency: Frequency,
}

impl LoanTerms {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_price_cents("principal", self.principal.cents())?;
        validation::validate_rate_bps("annual_rate", self.annual_rate.bps())?;
        validation::validate_installments(self.installments)
    }

    /// Rate applied per installment period, as a fraction.
    pub fn periodic_rate(&self) -> f64 {
        self.annual_rate.as_fraction() / self.frequency.periods_per_year() as f64
    }
}

/// One row of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    /// 1-based.
    pub number: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Outstanding balance after this payment.
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationSchedule {
    /// The level payment (the last row may differ by the rounding residual).
    pub installment_amount: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub rows: Vec<Installment>,
}

// =============================================================================
// Calculator
// =============================================================================

/// Builds the French amortization schedule for `terms`.
///
/// ## Example
/// ```rust
/// use moto_core::financing::{amortize, Frequency, LoanTerms};
/// use moto_core::{Money, Rate};
///
/// let schedule = amortize(&LoanTerms {
///     principal: Money::from_cents(100_000),
///     annual_rate: Rate::from_bps(1200),
///     installments: 12,
///     frequency: Frequency::Monthly,
/// });
///
/// assert_eq!(schedule.rows.len(), 12);
/// assert_eq!(schedule.installment_amount.cents(), 8_885);
/// assert!(schedule.rows.last().unwrap().balance.is_zero());
/// ```
pub fn amortize(terms: &LoanTerms) -> AmortizationSchedule {
    let principal = terms.principal;

    if !principal.is_positive() {
        return AmortizationSchedule::default();
    }

    if terms.installments == 0 {
        return AmortizationSchedule {
            total_paid: principal,
            ..AmortizationSchedule::default()
        };
    }

    let n = terms.installments;
    let rate = terms.periodic_rate();
    let payment = level_payment(principal, rate, n);

    let mut rows = Vec::with_capacity(n as usize);
    let mut balance = principal;

    for number in 1..=n {
        let interest = interest_for(balance, rate);
        let amortized = if number == n {
            balance
        } else {
            // Ceiling rounding can over-pay a small loan before the last row
            (payment - interest).clamp_non_negative().min(balance)
        };
        balance -= amortized;

        rows.push(Installment {
            number,
            payment: amortized + interest,
            interest,
            principal: amortized,
            balance,
        });
    }

    AmortizationSchedule {
        installment_amount: payment,
        total_paid: rows.iter().map(|row| row.payment).sum(),
        total_interest: rows.iter().map(|row| row.interest).sum(),
        rows,
    }
}

/// Level payment rounded up to the cent.
fn level_payment(principal: Money, rate: f64, n: u32) -> Money {
    if rate <= 0.0 {
        return principal.ceil_div(n);
    }
    let factor = rate / (1.0 - (1.0 + rate).powi(-(n as i32)));
    Money::from_cents_f64_ceil(principal.cents() as f64 * factor)
}

fn interest_for(balance: Money, rate: f64) -> Money {
    if rate <= 0.0 || !balance.is_positive() {
        return Money::zero();
    }
    Money::from_cents_f64_ceil(balance.cents() as f64 * rate)
}

/// Total interest as a fraction of the principal (CFT-style figure for display).
///
/// Zero principal yields a zero rate.
pub fn effective_total_cost(schedule: &AmortizationSchedule, principal: Money) -> Rate {
    if !principal.is_positive() {
        return Rate::zero();
    }
    let bps = (schedule.total_interest.cents() as i128 * 10_000 + principal.cents() as i128 / 2)
        / principal.cents() as i128;
    Rate::from_bps(bps.clamp(0, u32::MAX as i128) as u32)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_INSTALLMENTS, MAX_PRICE_CENTS, MAX_RATE_BPS};

    fn terms(principal: i64, bps: u32, installments: u32, frequency: Frequency) -> LoanTerms {
        LoanTerms {
            principal: Money::from_cents(principal),
            annual_rate: Rate::from_bps(bps),
            installments,
            frequency,
        }
    }

    fn assert_closes(schedule: &AmortizationSchedule, principal: i64) {
        let amortized: Money = schedule.rows.iter().map(|r| r.principal).sum();
        assert_eq!(amortized.cents(), principal);
        assert!(schedule.rows.last().unwrap().balance.is_zero());
        assert_eq!(
            schedule.total_paid,
            schedule.total_interest + Money::from_cents(principal)
        );
    }

    #[test]
    fn test_periods_per_year() {
        assert_eq!(Frequency::Weekly.periods_per_year(), 52);
        assert_eq!(Frequency::Biweekly.periods_per_year(), 26);
        assert_eq!(Frequency::Monthly.periods_per_year(), 12);
        assert_eq!(Frequency::Bimonthly.periods_per_year(), 6);
        assert_eq!(Frequency::Quarterly.periods_per_year(), 4);
        assert_eq!(Frequency::Semiannual.periods_per_year(), 2);
        assert_eq!(Frequency::Annual.periods_per_year(), 1);
    }

    #[test]
    fn test_monthly_schedule() {
        let schedule = amortize(&terms(100_000, 1200, 12, Frequency::Monthly));

        assert_eq!(schedule.rows.len(), 12);
        assert_eq!(schedule.installment_amount.cents(), 8_885);

        let first = schedule.rows[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.interest.cents(), 1_000);
        assert_eq!(first.principal.cents(), 7_885);
        assert_eq!(first.balance.cents(), 92_115);

        // Interest share decreases every period
        for pair in schedule.rows.windows(2) {
            assert!(pair[1].interest <= pair[0].interest);
        }

        assert_closes(&schedule, 100_000);
    }

    #[test]
    fn test_payment_is_rounded_up() {
        // 1000.00 at 12% for 3 months: exact payment is 340.0221...
        let schedule = amortize(&terms(100_000, 1200, 3, Frequency::Monthly));
        assert_eq!(schedule.installment_amount.cents(), 34_003);
        assert_closes(&schedule, 100_000);
    }

    #[test]
    fn test_zero_rate_splits_evenly() {
        let schedule = amortize(&terms(1_000, 0, 3, Frequency::Monthly));

        assert_eq!(schedule.installment_amount.cents(), 334);
        let payments: Vec<i64> = schedule.rows.iter().map(|r| r.payment.cents()).collect();
        assert_eq!(payments, vec![334, 334, 332]);
        assert!(schedule.total_interest.is_zero());
        assert_closes(&schedule, 1_000);
    }

    #[test]
    fn test_zero_installments() {
        let schedule = amortize(&terms(500_000, 4500, 0, Frequency::Monthly));

        assert!(schedule.rows.is_empty());
        assert!(schedule.installment_amount.is_zero());
        assert!(schedule.total_interest.is_zero());
        assert_eq!(schedule.total_paid.cents(), 500_000);
    }

    #[test]
    fn test_zero_principal() {
        let schedule = amortize(&terms(0, 4500, 12, Frequency::Monthly));
        assert_eq!(schedule, AmortizationSchedule::default());

        let schedule = amortize(&terms(-100, 4500, 12, Frequency::Monthly));
        assert_eq!(schedule, AmortizationSchedule::default());
    }

    #[test]
    fn test_single_installment() {
        // 12% annual paid once a year: one payment of principal + 12%
        let schedule = amortize(&terms(100_000, 1200, 1, Frequency::Annual));
        assert_eq!(schedule.rows.len(), 1);
        assert_eq!(schedule.rows[0].payment.cents(), 112_000);
        assert_eq!(schedule.total_interest.cents(), 12_000);
    }

    #[test]
    fn test_tiny_loan_never_goes_negative() {
        let schedule = amortize(&terms(2, 0, 5, Frequency::Weekly));
        assert_eq!(schedule.rows.len(), 5);
        assert!(schedule.rows.iter().all(|r| !r.balance.is_negative()));
        assert!(schedule.rows.iter().all(|r| !r.principal.is_negative()));
        assert_closes(&schedule, 2);
    }

    #[test]
    fn test_every_frequency_closes() {
        for frequency in Frequency::ALL {
            let schedule = amortize(&terms(450_000_000, 6500, 24, frequency));
            assert_eq!(schedule.rows.len(), 24);
            assert_closes(&schedule, 450_000_000);
        }
    }

    #[test]
    fn test_largest_accepted_loan_closes() {
        for frequency in Frequency::ALL {
            let terms = terms(MAX_PRICE_CENTS, MAX_RATE_BPS, MAX_INSTALLMENTS, frequency);
            assert!(terms.validate().is_ok());

            let schedule = amortize(&terms);
            assert_eq!(schedule.rows.len(), MAX_INSTALLMENTS as usize);
            assert!(schedule.total_interest.is_positive());
            assert_closes(&schedule, MAX_PRICE_CENTS);
        }
    }

    #[test]
    fn test_principal_over_cap_is_rejected() {
        let terms = terms(i64::MAX / 2, MAX_RATE_BPS, MAX_INSTALLMENTS, Frequency::Monthly);
        assert!(matches!(
            terms.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_effective_total_cost() {
        let schedule = amortize(&terms(100_000, 1200, 12, Frequency::Monthly));
        let cost = effective_total_cost(&schedule, Money::from_cents(100_000));
        // 12 * 88.85 - 1000 = 66.2 (6.62%), give or take the last row's residual
        assert!((650..=670).contains(&cost.bps()), "got {}", cost.bps());

        assert_eq!(
            effective_total_cost(&AmortizationSchedule::default(), Money::zero()),
            Rate::zero()
        );
    }

    #[test]
    fn test_frequency_parse() {
        assert_eq!("quarterly".parse::<Frequency>().unwrap(), Frequency::Quarterly);
        assert!("daily".parse::<Frequency>().is_err());
    }
}

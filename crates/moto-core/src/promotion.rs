//! # Banking Promotions
//!
//! Decides which promotions apply to a payment and what they do to a price.
//!
//! ## Matching
//! ```text
//! Promotion                       PaymentSelection
//! ─────────                       ────────────────
//! payment_method_id  ══ must equal ══  payment_method_id
//! bank_id?           ── when set ──►   bank_id
//! card_type_id?      ── when set ──►   card_type_id
//!
//! Active on a date when: enabled, starts_on <= date <= ends_on (either end
//! open) and the weekday is in the set (empty set = every day).
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{BankingPromotion, Rate};
use crate::validation::{self, ValidationResult};

/// How the customer intends to pay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSelection {
    pub payment_method_id: String,
    #[serde(default)]
    pub bank_id: Option<String>,
    #[serde(default)]
    pub card_type_id: Option<String>,
}

impl PaymentSelection {
    pub fn method(payment_method_id: impl Into<String>) -> Self {
        PaymentSelection {
            payment_method_id: payment_method_id.into(),
            bank_id: None,
            card_type_id: None,
        }
    }

    pub fn with_card(mut self, bank_id: impl Into<String>, card_type_id: impl Into<String>) -> Self {
        self.bank_id = Some(bank_id.into());
        self.card_type_id = Some(card_type_id.into());
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_uuid_field("payment_method_id", &self.payment_method_id)?;
        if let Some(bank_id) = &self.bank_id {
            validation::validate_uuid_field("bank_id", bank_id)?;
        }
        if let Some(card_type_id) = &self.card_type_id {
            validation::validate_uuid_field("card_type_id", card_type_id)?;
        }
        Ok(())
    }
}

/// What a promotion does to a given price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PromotionEffect {
    pub discount: Money,
    pub surcharge: Money,
    pub interest_free_installments: u32,
}

impl PromotionEffect {
    /// `price - discount + surcharge`.
    pub fn apply_to(&self, price: Money) -> Money {
        price - self.discount + self.surcharge
    }
}

impl BankingPromotion {
    /// Enabled, inside its date window and running on that weekday.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.is_enabled
            && self.starts_on.map_or(true, |start| start <= date)
            && self.ends_on.map_or(true, |end| date <= end)
            && self.weekdays.allows_date(date)
    }

    /// Whether the payment qualifies. Bank and card only narrow when the
    /// promotion names them.
    pub fn matches(&self, payment: &PaymentSelection) -> bool {
        fn narrows(required: &Option<String>, given: &Option<String>) -> bool {
            match required {
                Some(required) => given.as_deref() == Some(required.as_str()),
                None => true,
            }
        }

        self.payment_method_id == payment.payment_method_id
            && narrows(&self.bank_id, &payment.bank_id)
            && narrows(&self.card_type_id, &payment.card_type_id)
    }

    pub fn effect(&self, price: Money) -> PromotionEffect {
        PromotionEffect {
            discount: price.percentage_of(Rate::from_bps(self.discount_bps)),
            surcharge: price.percentage_of(Rate::from_bps(self.surcharge_bps)),
            interest_free_installments: self.interest_free_installments,
        }
    }

    /// Discount minus surcharge, in basis points.
    pub fn net_benefit_bps(&self) -> i64 {
        self.discount_bps as i64 - self.surcharge_bps as i64
    }
}

/// Promotions that apply to `payment` on `date`, in input order.
pub fn applicable_promotions<'a>(
    promotions: &'a [BankingPromotion],
    payment: &PaymentSelection,
    date: NaiveDate,
) -> Vec<&'a BankingPromotion> {
    promotions
        .iter()
        .filter(|promo| promo.is_active_on(date) && promo.matches(payment))
        .collect()
}

/// The applicable promotion with the highest net benefit.
///
/// Ties go to more interest-free installments, then to the name that sorts first.
pub fn best_promotion<'a>(
    promotions: &'a [BankingPromotion],
    payment: &PaymentSelection,
    date: NaiveDate,
) -> Option<&'a BankingPromotion> {
    applicable_promotions(promotions, payment, date)
        .into_iter()
        .max_by(|a, b| rank(a, b))
}

fn rank(a: &BankingPromotion, b: &BankingPromotion) -> Ordering {
    a.net_benefit_bps()
        .cmp(&b.net_benefit_bps())
        .then_with(|| a.interest_free_installments.cmp(&b.interest_free_installments))
        .then_with(|| b.name.cmp(&a.name))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WeekdaySet;
    use chrono::{Utc, Weekday};

    const CARD: &str = "pm-card";
    const CASH: &str = "pm-cash";

    fn promo(name: &str, method: &str) -> BankingPromotion {
        BankingPromotion {
            id: format!("promo-{name}"),
            organization_id: "org".into(),
            name: name.into(),
            description: None,
            payment_method_id: method.into(),
            bank_id: None,
            card_type_id: None,
            discount_bps: 0,
            surcharge_bps: 0,
            interest_free_installments: 0,
            weekdays: WeekdaySet::empty(),
            starts_on: None,
            ends_on: None,
            is_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_active_window_and_weekday() {
        let mut p = promo("Martes", CARD);
        p.starts_on = Some(date(2026, 3, 1));
        p.ends_on = Some(date(2026, 3, 31));
        p.weekdays = WeekdaySet::from_days(&[Weekday::Tue]);

        // 2026-03-03 is a Tuesday
        assert!(p.is_active_on(date(2026, 3, 3)));
        assert!(!p.is_active_on(date(2026, 3, 4)));
        assert!(!p.is_active_on(date(2026, 4, 7)));
        // Both ends inclusive
        assert!(p.is_active_on(date(2026, 3, 31)));

        p.is_enabled = false;
        assert!(!p.is_active_on(date(2026, 3, 3)));
    }

    #[test]
    fn test_bank_and_card_narrow_only_when_set() {
        let open = promo("Cualquier tarjeta", CARD);
        let mut bank_only = promo("Banco Nación", CARD);
        bank_only.bank_id = Some("nacion".into());

        let plain = PaymentSelection::method(CARD);
        let nacion_visa = PaymentSelection::method(CARD).with_card("nacion", "visa");
        let galicia_visa = PaymentSelection::method(CARD).with_card("galicia", "visa");

        assert!(open.matches(&plain));
        assert!(open.matches(&nacion_visa));
        assert!(!bank_only.matches(&plain));
        assert!(bank_only.matches(&nacion_visa));
        assert!(!bank_only.matches(&galicia_visa));
        assert!(!open.matches(&PaymentSelection::method(CASH)));
    }

    #[test]
    fn test_best_promotion_ranking() {
        let mut ten = promo("Diez", CARD);
        ten.discount_bps = 1000;
        let mut ten_with_installments = promo("Diez y cuotas", CARD);
        ten_with_installments.discount_bps = 1000;
        ten_with_installments.interest_free_installments = 6;
        let mut surcharged = promo("Recargo", CARD);
        surcharged.discount_bps = 1500;
        surcharged.surcharge_bps = 1000;

        let promos = vec![ten, surcharged, ten_with_installments];
        let best = best_promotion(&promos, &PaymentSelection::method(CARD), date(2026, 3, 3));
        assert_eq!(best.map(|p| p.name.as_str()), Some("Diez y cuotas"));
    }

    #[test]
    fn test_best_promotion_name_tiebreak() {
        let mut b = promo("Beta", CARD);
        b.discount_bps = 500;
        let mut a = promo("Alfa", CARD);
        a.discount_bps = 500;

        let promos = vec![b, a];
        let best = best_promotion(&promos, &PaymentSelection::method(CARD), date(2026, 3, 3));
        assert_eq!(best.map(|p| p.name.as_str()), Some("Alfa"));
    }

    #[test]
    fn test_no_applicable_promotion() {
        let promos = vec![promo("Tarjeta", CARD)];
        let found = applicable_promotions(&promos, &PaymentSelection::method(CASH), date(2026, 3, 3));
        assert!(found.is_empty());
        assert!(best_promotion(&promos, &PaymentSelection::method(CASH), date(2026, 3, 3)).is_none());
    }

    #[test]
    fn test_effect_on_price() {
        let mut p = promo("Efectivo", CASH);
        p.discount_bps = 1000;
        p.surcharge_bps = 250;
        let price = Money::from_cents(1_000_000);

        let effect = p.effect(price);
        assert_eq!(effect.discount.cents(), 100_000);
        assert_eq!(effect.surcharge.cents(), 25_000);
        assert_eq!(effect.apply_to(price).cents(), 925_000);
    }
}

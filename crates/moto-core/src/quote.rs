//! # Quote Module
//!
//! Builds a price quote for one motorcycle and renders it as printable HTML.
//!
//! ## Quote Math
//! ```text
//! list price                      retail_price_cents
//!   − promotion discount          best (or chosen) applicable promotion
//!   + promotion surcharge
//! = total
//!   − down payment                must not exceed total
//! = financed amount ──────────►   amortize(financed, rate, n, frequency)
//!                                 rate forced to 0 when the promotion grants
//!                                 at least n interest-free installments
//! ```
//!
//! The HTML document is self-contained (inline CSS) so the browser can print
//! it straight to PDF.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::financing::{amortize, AmortizationSchedule, Frequency, LoanTerms};
use crate::money::Money;
use crate::motorcycle::{Motorcycle, MotorcycleState};
use crate::promotion::{applicable_promotions, best_promotion, PaymentSelection};
use crate::types::{BankingPromotion, Client, Currency, Rate};
use crate::validation::{self, ValidationResult};
use crate::DEFAULT_QUOTE_VALID_DAYS;

/// Longest validity a quote may be issued with.
pub const MAX_QUOTE_VALID_DAYS: u32 = 90;

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FinancingRequest {
    pub installments: u32,
    #[serde(default)]
    pub annual_rate_bps: u32,
    #[serde(default)]
    pub frequency: Frequency,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub motorcycle_id: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub payment: Option<PaymentSelection>,
    /// Pin a specific promotion instead of picking the best one.
    #[serde(default)]
    pub promotion_id: Option<String>,
    #[serde(default)]
    pub down_payment_cents: i64,
    #[serde(default)]
    pub financing: Option<FinancingRequest>,
    #[serde(default = "default_valid_days")]
    pub valid_days: u32,
}

fn default_valid_days() -> u32 {
    DEFAULT_QUOTE_VALID_DAYS
}

impl QuoteRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_uuid_field("motorcycle_id", &self.motorcycle_id)?;
        if let Some(client_id) = &self.client_id {
            validation::validate_uuid_field("client_id", client_id)?;
        }
        if let Some(payment) = &self.payment {
            payment.validate()?;
        }
        if self.promotion_id.is_some() && self.payment.is_none() {
            return Err(ValidationError::required("payment"));
        }
        validation::validate_price_cents("down_payment_cents", self.down_payment_cents)?;
        if let Some(financing) = &self.financing {
            validation::validate_installments(financing.installments)?;
            validation::validate_rate_bps("annual_rate_bps", financing.annual_rate_bps)?;
        }
        if !(1..=MAX_QUOTE_VALID_DAYS).contains(&self.valid_days) {
            return Err(ValidationError::OutOfRange {
                field: "valid_days".to_string(),
                min: 1,
                max: MAX_QUOTE_VALID_DAYS as i64,
            });
        }
        Ok(())
    }
}

/// Everything the quote needs that lives in the database.
#[derive(Debug, Clone)]
pub struct QuoteContext {
    pub organization_name: String,
    pub motorcycle: Motorcycle,
    pub brand_name: String,
    pub model_name: String,
    pub color_name: Option<String>,
    pub client: Option<Client>,
    /// Enabled promotions of the organization; matching happens here.
    pub promotions: Vec<BankingPromotion>,
}

// =============================================================================
// Quote
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPromotion {
    pub id: String,
    pub name: String,
    pub discount_bps: u32,
    pub surcharge_bps: u32,
    pub interest_free_installments: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFinancing {
    pub installments: u32,
    pub frequency: Frequency,
    /// Rate actually used (zero when interest-free).
    pub annual_rate: Rate,
    pub interest_free: bool,
    pub schedule: AmortizationSchedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub organization_name: String,
    pub motorcycle_id: String,
    /// "Brand Model Year".
    pub description: String,
    pub chassis_number: String,
    pub color_name: Option<String>,
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub currency: Currency,
    pub list_price: Money,
    pub promotion: Option<AppliedPromotion>,
    pub discount: Money,
    pub surcharge: Money,
    pub total: Money,
    pub down_payment: Money,
    pub financed_amount: Money,
    pub financing: Option<QuoteFinancing>,
    #[ts(as = "String")]
    pub issued_on: NaiveDate,
    #[ts(as = "String")]
    pub valid_until: NaiveDate,
}

/// Builds a quote for `request` as of `today`.
///
/// ## Errors
/// - `Validation` for malformed requests or a down payment above the total
/// - `MotorcycleUnavailable` unless the unit is in stock, or reserved for the
///   quoted client
/// - `PromotionNotApplicable` when a pinned promotion does not match
pub fn build_quote(ctx: &QuoteContext, request: &QuoteRequest, today: NaiveDate) -> CoreResult<Quote> {
    request.validate()?;

    let moto = &ctx.motorcycle;
    if moto.id != request.motorcycle_id {
        return Err(CoreError::not_found("Motorcycle", request.motorcycle_id.clone()));
    }

    let client_id = request
        .client_id
        .clone()
        .or_else(|| ctx.client.as_ref().map(|c| c.id.clone()));

    let quotable = match moto.state {
        MotorcycleState::InStock => true,
        MotorcycleState::Reserved => client_id.is_some() && moto.client_id == client_id,
        _ => false,
    };
    if !quotable {
        return Err(CoreError::MotorcycleUnavailable {
            id: moto.id.clone(),
            state: moto.state,
        });
    }

    let promotion = match (&request.payment, &request.promotion_id) {
        (Some(payment), Some(promotion_id)) => Some(
            applicable_promotions(&ctx.promotions, payment, today)
                .into_iter()
                .find(|p| &p.id == promotion_id)
                .ok_or_else(|| CoreError::PromotionNotApplicable {
                    id: promotion_id.clone(),
                })?,
        ),
        (Some(payment), None) => best_promotion(&ctx.promotions, payment, today),
        _ => None,
    };

    let list_price = moto.retail_price();
    let effect = promotion.map(|p| p.effect(list_price)).unwrap_or_default();
    let total = effect.apply_to(list_price);

    let down_payment = Money::from_cents(request.down_payment_cents);
    if down_payment > total {
        return Err(ValidationError::OutOfRange {
            field: "down_payment_cents".to_string(),
            min: 0,
            max: total.cents(),
        }
        .into());
    }
    let financed_amount = total - down_payment;

    let financing = request.financing.map(|req| {
        let interest_free =
            req.installments > 0 && effect.interest_free_installments >= req.installments;
        let annual_rate = if interest_free {
            Rate::zero()
        } else {
            Rate::from_bps(req.annual_rate_bps)
        };
        let schedule = amortize(&LoanTerms {
            principal: financed_amount,
            annual_rate,
            installments: req.installments,
            frequency: req.frequency,
        });
        QuoteFinancing {
            installments: req.installments,
            frequency: req.frequency,
            annual_rate,
            interest_free,
            schedule,
        }
    });

    Ok(Quote {
        organization_name: ctx.organization_name.clone(),
        motorcycle_id: moto.id.clone(),
        description: format!("{} {} {}", ctx.brand_name, ctx.model_name, moto.year),
        chassis_number: moto.chassis_number.clone(),
        color_name: ctx.color_name.clone(),
        client_id,
        client_name: ctx.client.as_ref().map(Client::full_name),
        currency: moto.currency,
        list_price,
        promotion: promotion.map(|p| AppliedPromotion {
            id: p.id.clone(),
            name: p.name.clone(),
            discount_bps: p.discount_bps,
            surcharge_bps: p.surcharge_bps,
            interest_free_installments: p.interest_free_installments,
        }),
        discount: effect.discount,
        surcharge: effect.surcharge,
        total,
        down_payment,
        financed_amount,
        financing,
        issued_on: today,
        valid_until: today + Duration::days(request.valid_days as i64),
    })
}

// =============================================================================
// HTML Rendering
// =============================================================================

/// Escapes text for HTML element and attribute content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn amount(currency: Currency, money: Money) -> String {
    format!("{} {}", currency.code(), money)
}

fn row(label: &str, value: &str) -> String {
    format!(
        "<tr><th>{}</th><td>{}</td></tr>\n",
        escape_html(label),
        escape_html(value)
    )
}

const QUOTE_CSS: &str = "body{font-family:sans-serif;margin:2rem;color:#222}\
h1{font-size:1.4rem;margin-bottom:0}\
.muted{color:#666}\
table{border-collapse:collapse;width:100%;margin-top:1rem}\
th,td{border-bottom:1px solid #ddd;padding:.35rem .5rem;text-align:left}\
td.num,th.num{text-align:right}\
.total th,.total td{font-weight:bold}\
@media print{body{margin:0}}";

/// Renders a printable HTML document for `quote`.
pub fn render_html(quote: &Quote) -> String {
    let cur = quote.currency;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Quote {}</title>\n<style>{}</style>\n</head>\n<body>\n",
        escape_html(&quote.description),
        QUOTE_CSS
    ));
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&quote.organization_name)));
    html.push_str(&format!(
        "<p class=\"muted\">Issued {} &middot; valid until {}</p>\n",
        quote.issued_on, quote.valid_until
    ));

    html.push_str("<table>\n");
    html.push_str(&row("Motorcycle", &quote.description));
    html.push_str(&row("Chassis", &quote.chassis_number));
    if let Some(color) = &quote.color_name {
        html.push_str(&row("Color", color));
    }
    if let Some(client) = &quote.client_name {
        html.push_str(&row("Client", client));
    }
    html.push_str("</table>\n");

    html.push_str("<table>\n");
    html.push_str(&row("List price", &amount(cur, quote.list_price)));
    if let Some(promo) = &quote.promotion {
        html.push_str(&row("Promotion", &promo.name));
    }
    if quote.discount.is_positive() {
        html.push_str(&row("Discount", &amount(cur, -quote.discount)));
    }
    if quote.surcharge.is_positive() {
        html.push_str(&row("Surcharge", &amount(cur, quote.surcharge)));
    }
    html.push_str(&format!(
        "<tr class=\"total\"><th>Total</th><td>{}</td></tr>\n",
        escape_html(&amount(cur, quote.total))
    ));
    if quote.down_payment.is_positive() {
        html.push_str(&row("Down payment", &amount(cur, quote.down_payment)));
        html.push_str(&row("Balance", &amount(cur, quote.financed_amount)));
    }
    html.push_str("</table>\n");

    if let Some(financing) = &quote.financing {
        let rate_label = if financing.interest_free {
            "interest free".to_string()
        } else {
            format!("{:.2}% nominal annual", financing.annual_rate.percentage())
        };
        html.push_str(&format!(
            "<h2>{} {} installments ({})</h2>\n",
            financing.installments,
            financing.frequency,
            escape_html(&rate_label)
        ));
        html.push_str(
            "<table>\n<tr><th>#</th><th class=\"num\">Payment</th><th class=\"num\">Interest</th>\
             <th class=\"num\">Principal</th><th class=\"num\">Balance</th></tr>\n",
        );
        for inst in &financing.schedule.rows {
            html.push_str(&format!(
                "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
                 <td class=\"num\">{}</td><td class=\"num\">{}</td></tr>\n",
                inst.number, inst.payment, inst.interest, inst.principal, inst.balance
            ));
        }
        html.push_str(&format!(
            "<tr class=\"total\"><th>Total</th><td class=\"num\">{}</td><td class=\"num\">{}</td>\
             <td></td><td></td></tr>\n</table>\n",
            financing.schedule.total_paid, financing.schedule.total_interest
        ));
    }

    html.push_str("<p class=\"muted\">Prices subject to change without notice.</p>\n");
    html.push_str("</body>\n</html>\n");
    html
}

// =============================================================================
// Unit Tests
// =============================================================================

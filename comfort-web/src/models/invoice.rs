//! Invoice models and the total-calculation rules.
//!
//! An invoice is a header row plus one or more detail lines, created
//! atomically and immutable afterwards; the only permitted transition is
//! Active to Cancelled. Totals are always recomputed here from the submitted
//! lines, never accepted from the caller.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use comfort_core::error::AppError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Active,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Active => "Active",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Active" => Some(InvoiceStatus::Active),
            "Cancelled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }
}

/// Invoice header row holding the stored totals and status.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceHeader {
    pub invoice_no: i64,
    pub customer_id: Uuid,
    pub invoice_amount: Decimal,
    pub discount_amount: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub remark: Option<String>,
    pub entered_by: Uuid,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Header joined to its customer for listing. The join is a LEFT JOIN so a
/// header whose customer row is gone still lists, with no name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceSummary {
    pub invoice_no: i64,
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub customer_mobile: Option<String>,
    pub invoice_amount: Decimal,
    pub discount_amount: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub remark: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Detail line row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceLine {
    pub id: Uuid,
    pub invoice_no: i64,
    pub itemname: String,
    pub qty: i32,
    pub amount: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl InvoiceLine {
    /// Line total, derived and never stored.
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.qty) * self.amount
    }
}

/// Full read model for one invoice: header + customer + lines.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub summary: InvoiceSummary,
    pub items: Vec<InvoiceLine>,
}

/// Input line for invoice creation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoiceLine {
    pub itemname: String,
    pub qty: i32,
    pub amount: Decimal,
}

/// Input for invoice creation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    pub customer_id: Uuid,
    #[serde(default)]
    pub discount_amount: Decimal,
    pub items: Vec<NewInvoiceLine>,
}

/// The stored totals of a new invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub invoice_amount: Decimal,
    pub discount_amount: Decimal,
    pub net_amount: Decimal,
}

impl NewInvoice {
    /// Validate the submitted lines and compute the totals to store.
    ///
    /// `invoice_amount` is the sum of `qty * amount` over the lines and
    /// `net_amount = invoice_amount - discount_amount`; both must come out
    /// non-negative. Runs before any row is written, so a rejected invoice
    /// leaves no partial state behind.
    pub fn totals(&self) -> Result<InvoiceTotals, AppError> {
        if self.items.is_empty() {
            return Err(AppError::BadRequest(anyhow!(
                "At least one line item is required"
            )));
        }

        for item in &self.items {
            if item.itemname.trim().is_empty() {
                return Err(AppError::BadRequest(anyhow!("Item name is required")));
            }
            if item.qty < 1 {
                return Err(AppError::BadRequest(anyhow!(
                    "Quantity must be at least 1"
                )));
            }
            if item.amount < Decimal::ZERO {
                return Err(AppError::BadRequest(anyhow!("Amounts cannot be negative")));
            }
        }

        if self.discount_amount < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow!("Amounts cannot be negative")));
        }

        // Checked arithmetic: an extreme amount must reject, not panic.
        let mut invoice_amount = Decimal::ZERO;
        for item in &self.items {
            invoice_amount = Decimal::from(item.qty)
                .checked_mul(item.amount)
                .and_then(|line_total| invoice_amount.checked_add(line_total))
                .ok_or_else(|| {
                    AppError::BadRequest(anyhow!("Invoice amount is too large"))
                })?;
        }

        let net_amount = invoice_amount - self.discount_amount;
        if net_amount < Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow!(
                "Discount cannot exceed the invoice amount"
            )));
        }

        Ok(InvoiceTotals {
            invoice_amount,
            discount_amount: self.discount_amount,
            net_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(itemname: &str, qty: i32, amount: Decimal) -> NewInvoiceLine {
        NewInvoiceLine {
            itemname: itemname.to_string(),
            qty,
            amount,
        }
    }

    fn invoice(discount: Decimal, items: Vec<NewInvoiceLine>) -> NewInvoice {
        NewInvoice {
            customer_id: Uuid::new_v4(),
            discount_amount: discount,
            items,
        }
    }

    #[test]
    fn totals_sum_line_totals() {
        let inv = invoice(
            dec!(0),
            vec![line("Widget", 3, dec!(100.00)), line("Gadget", 2, dec!(9.99))],
        );
        let totals = inv.totals().expect("valid invoice");
        assert_eq!(totals.invoice_amount, dec!(319.98));
        assert_eq!(totals.net_amount, dec!(319.98));
    }

    #[test]
    fn net_amount_subtracts_discount() {
        let inv = invoice(dec!(20.50), vec![line("Widget", 1, dec!(100.00))]);
        let totals = inv.totals().expect("valid invoice");
        assert_eq!(totals.invoice_amount, dec!(100.00));
        assert_eq!(totals.discount_amount, dec!(20.50));
        assert_eq!(totals.net_amount, dec!(79.50));
    }

    #[test]
    fn no_cent_drift_on_decimal_amounts() {
        // 0.1 + 0.2 style cases must come out exact under decimal arithmetic.
        let inv = invoice(
            dec!(0),
            vec![line("A", 1, dec!(0.10)), line("B", 1, dec!(0.20))],
        );
        let totals = inv.totals().expect("valid invoice");
        assert_eq!(totals.invoice_amount, dec!(0.30));
    }

    #[test]
    fn empty_item_list_is_rejected() {
        let inv = invoice(dec!(0), vec![]);
        assert!(matches!(inv.totals(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn blank_item_name_is_rejected() {
        let inv = invoice(dec!(0), vec![line("   ", 1, dec!(10))]);
        assert!(inv.totals().is_err());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let inv = invoice(dec!(0), vec![line("Widget", 0, dec!(10))]);
        assert!(inv.totals().is_err());
    }

    #[test]
    fn negative_amount_is_rejected() {
        let inv = invoice(dec!(0), vec![line("Widget", 1, dec!(-1))]);
        assert!(inv.totals().is_err());
    }

    #[test]
    fn negative_discount_is_rejected() {
        let inv = invoice(dec!(-5), vec![line("Widget", 1, dec!(10))]);
        assert!(inv.totals().is_err());
    }

    #[test]
    fn overflowing_line_total_is_rejected() {
        let inv = invoice(dec!(0), vec![line("Widget", 2, Decimal::MAX)]);
        assert!(matches!(inv.totals(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn overflowing_line_sum_is_rejected() {
        let inv = invoice(
            dec!(0),
            vec![line("A", 1, Decimal::MAX), line("B", 1, Decimal::MAX)],
        );
        assert!(matches!(inv.totals(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn discount_exceeding_invoice_amount_is_rejected() {
        let inv = invoice(dec!(11), vec![line("Widget", 1, dec!(10))]);
        assert!(inv.totals().is_err());
    }

    #[test]
    fn status_round_trips() {
        assert_eq!(InvoiceStatus::parse("Active"), Some(InvoiceStatus::Active));
        assert_eq!(
            InvoiceStatus::parse("Cancelled"),
            Some(InvoiceStatus::Cancelled)
        );
        assert_eq!(InvoiceStatus::parse("active"), None);
        assert_eq!(InvoiceStatus::Active.as_str(), "Active");
    }

    #[test]
    fn line_total_is_qty_times_amount() {
        let row = InvoiceLine {
            id: Uuid::new_v4(),
            invoice_no: 1,
            itemname: "Widget".to_string(),
            qty: 3,
            amount: dec!(100.00),
            created_utc: Utc::now(),
            updated_utc: Utc::now(),
        };
        assert_eq!(row.line_total(), dec!(300.00));
    }
}

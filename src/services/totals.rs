//! Invoice totals engine.
//!
//! The single shared implementation of subtotal/tax/total computation. Both
//! the live-preview endpoint and the persistence path call [`compute_totals`]
//! with the same inputs and therefore store and display identical values.
//! All arithmetic is `Decimal`; no floating point anywhere in the money path.

use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Tax percentages per catalog item, resolved from a single catalog snapshot.
/// Items with no taxes map to an empty set; items absent from the snapshot do
/// not resolve.
pub type TaxCatalog = HashMap<Uuid, Vec<Decimal>>;

/// One line of input to the engine: an item reference with the quantity and
/// unit price the caller intends to snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEntry {
    pub item_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
}

/// Aggregate output of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TotalsError {
    #[error("invalid line item: {0}")]
    InvalidLineItem(String),
}

/// Compute the line total for a single entry: quantity x unit price, no
/// intermediate rounding.
pub fn line_total(quantity: i64, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price
}

/// Compute invoice totals from line entries and the catalog's tax
/// percentages.
///
/// Per line: subtotal = quantity x unit price; tax = sum of
/// subtotal x pct / 100 over the item's taxes. Aggregates are plain sums and
/// the final total is `subtotal + tax - discount`, floored at zero. A missing
/// discount is zero and a negative discount is clamped to zero before use.
pub fn compute_totals(
    lines: &[LineEntry],
    catalog: &TaxCatalog,
    discount: Option<Decimal>,
) -> Result<InvoiceTotals, TotalsError> {
    let mut subtotal = Decimal::ZERO;
    let mut total_tax = Decimal::ZERO;

    for line in lines {
        if line.quantity <= 0 {
            return Err(TotalsError::InvalidLineItem(format!(
                "quantity must be positive, got {}",
                line.quantity
            )));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(TotalsError::InvalidLineItem(format!(
                "unit price must be non-negative, got {}",
                line.unit_price
            )));
        }
        let percentages = catalog.get(&line.item_id).ok_or_else(|| {
            TotalsError::InvalidLineItem(format!("unknown item {}", line.item_id))
        })?;

        let line_subtotal = line_total(line.quantity, line.unit_price);
        for pct in percentages {
            total_tax += line_subtotal * *pct / Decimal::ONE_HUNDRED;
        }
        subtotal += line_subtotal;
    }

    let discount = discount.unwrap_or(Decimal::ZERO).max(Decimal::ZERO);
    let total = (subtotal + total_tax - discount).max(Decimal::ZERO);

    Ok(InvoiceTotals {
        subtotal,
        total_tax,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn entry(item_id: Uuid, quantity: i64, unit_price: &str) -> LineEntry {
        LineEntry {
            item_id,
            quantity,
            unit_price: dec(unit_price),
        }
    }

    fn catalog(entries: &[(Uuid, &[&str])]) -> TaxCatalog {
        entries
            .iter()
            .map(|(id, pcts)| (*id, pcts.iter().map(|p| dec(p)).collect()))
            .collect()
    }

    #[test]
    fn no_taxes_no_discount_total_equals_subtotal() {
        let widget = Uuid::new_v4();
        let catalog = catalog(&[(widget, &[])]);
        let totals =
            compute_totals(&[entry(widget, 3, "19.99")], &catalog, None).unwrap();

        assert_eq!(totals.subtotal, dec("59.97"));
        assert_eq!(totals.total_tax, Decimal::ZERO);
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn widget_scenario_18_percent_tax() {
        let widget = Uuid::new_v4();
        let catalog = catalog(&[(widget, &["18"])]);
        let totals = compute_totals(&[entry(widget, 2, "100")], &catalog, None).unwrap();

        assert_eq!(totals.subtotal, dec("200"));
        assert_eq!(totals.total_tax, dec("36"));
        assert_eq!(totals.total, dec("236"));
    }

    #[test]
    fn discount_reduces_total() {
        let widget = Uuid::new_v4();
        let catalog = catalog(&[(widget, &["18"])]);
        let totals =
            compute_totals(&[entry(widget, 2, "100")], &catalog, Some(dec("36"))).unwrap();

        assert_eq!(totals.total, dec("200"));
    }

    #[test]
    fn oversized_discount_clamps_total_to_zero() {
        let widget = Uuid::new_v4();
        let catalog = catalog(&[(widget, &["18"])]);
        let totals =
            compute_totals(&[entry(widget, 2, "100")], &catalog, Some(dec("500"))).unwrap();

        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn full_discount_yields_exactly_zero() {
        let widget = Uuid::new_v4();
        let catalog = catalog(&[(widget, &["18"])]);
        let totals =
            compute_totals(&[entry(widget, 2, "100")], &catalog, Some(dec("236"))).unwrap();

        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn negative_discount_is_treated_as_zero() {
        let widget = Uuid::new_v4();
        let catalog = catalog(&[(widget, &[])]);
        let totals =
            compute_totals(&[entry(widget, 1, "100")], &catalog, Some(dec("-25"))).unwrap();

        assert_eq!(totals.total, dec("100"));
    }

    #[test]
    fn line_order_does_not_change_totals() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let catalog = catalog(&[(a, &["5"]), (b, &["12", "6"])]);
        let lines = [entry(a, 4, "12.50"), entry(b, 1, "99.99")];
        let reversed = [lines[1].clone(), lines[0].clone()];

        let forward = compute_totals(&lines, &catalog, Some(dec("10"))).unwrap();
        let backward = compute_totals(&reversed, &catalog, Some(dec("10"))).unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn tax_sets_affect_tax_but_not_subtotal() {
        let plain = Uuid::new_v4();
        let taxed = Uuid::new_v4();
        let catalog = catalog(&[(plain, &[]), (taxed, &["18"])]);

        let without = compute_totals(&[entry(plain, 2, "100")], &catalog, None).unwrap();
        let with = compute_totals(&[entry(taxed, 2, "100")], &catalog, None).unwrap();

        assert_eq!(without.subtotal, with.subtotal);
        assert_ne!(without.total_tax, with.total_tax);
    }

    #[test]
    fn multiple_taxes_sum_per_line() {
        let item = Uuid::new_v4();
        // CGST 9 + SGST 9
        let catalog = catalog(&[(item, &["9", "9"])]);
        let totals = compute_totals(&[entry(item, 1, "1000")], &catalog, None).unwrap();

        assert_eq!(totals.total_tax, dec("180"));
        assert_eq!(totals.total, dec("1180"));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let item = Uuid::new_v4();
        let catalog = catalog(&[(item, &[])]);
        let err = compute_totals(&[entry(item, 0, "10")], &catalog, None).unwrap_err();

        assert!(matches!(err, TotalsError::InvalidLineItem(_)));
    }

    #[test]
    fn negative_price_is_rejected() {
        let item = Uuid::new_v4();
        let catalog = catalog(&[(item, &[])]);
        let err = compute_totals(&[entry(item, 1, "-10")], &catalog, None).unwrap_err();

        assert!(matches!(err, TotalsError::InvalidLineItem(_)));
    }

    #[test]
    fn unknown_item_is_rejected() {
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let catalog = catalog(&[(known, &[])]);
        let err = compute_totals(&[entry(unknown, 1, "10")], &catalog, None).unwrap_err();

        assert!(matches!(err, TotalsError::InvalidLineItem(_)));
    }

    #[test]
    fn empty_line_set_is_all_zeros() {
        let totals = compute_totals(&[], &TaxCatalog::new(), None).unwrap();

        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.total_tax, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn fractional_prices_accumulate_without_drift() {
        let item = Uuid::new_v4();
        let catalog = catalog(&[(item, &[])]);
        let lines: Vec<LineEntry> = (0..1000).map(|_| entry(item, 1, "0.10")).collect();
        let totals = compute_totals(&lines, &catalog, None).unwrap();

        assert_eq!(totals.subtotal, dec("100.00"));
    }
}

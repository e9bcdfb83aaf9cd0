//! Property-based tests for the tax engine.
//!
//! - Determinism: identical input gives identical output
//! - Exempt items always contribute zero tax
//! - Aggregates equal the sum of their parts

use ledgerline_shared::types::{ProductId, TenantId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::engine::calculate_tax;
use super::types::{LineItem, TaxRule, TaxScope, TaxType};

fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..10_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn price() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn rate() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Products shared between items and rules so explicit scopes can match.
fn product_pool() -> Vec<ProductId> {
    (0..4).map(|_| ProductId::new()).collect()
}

fn item(pool: Vec<ProductId>) -> impl Strategy<Value = LineItem> {
    (quantity(), price(), prop::sample::select(pool), any::<bool>(), any::<bool>()).prop_map(
        |(qty, price, product, with_product, exempt)| {
            let mut item = LineItem::new(qty, price);
            if with_product {
                item = item.with_product(product);
            }
            if exempt {
                item = item.exempt(None);
            }
            item
        },
    )
}

/// A conflict-free rule set: one default GST, one explicit IGST per product
/// subset, and an optional cess.
fn rules(pool: Vec<ProductId>) -> impl Strategy<Value = Vec<TaxRule>> {
    (rate(), rate(), prop::sample::subsequence(pool, 0..=4), prop::option::of(rate())).prop_map(
        |(default_rate, explicit_rate, products, cess)| {
            let tenant = TenantId::new();
            let mut rules = vec![TaxRule::new(tenant, TaxType::Gst, default_rate, TaxScope::All).as_default()];
            if !products.is_empty() {
                rules.push(TaxRule::new(tenant, TaxType::Igst, explicit_rate, TaxScope::Products(products)));
            }
            if let Some(cess) = cess {
                rules.push(TaxRule::new(tenant, TaxType::Cess, cess, TaxScope::All).as_default());
            }
            rules
        },
    )
}

fn scenario() -> impl Strategy<Value = (Vec<LineItem>, Vec<TaxRule>)> {
    let pool = product_pool();
    (prop::collection::vec(item(pool.clone()), 1..8), rules(pool))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Same items, rules and customer always give the same result.
    #[test]
    fn prop_calculation_is_deterministic((items, rules) in scenario()) {
        let first = calculate_tax(&items, &rules, None).unwrap();
        let second = calculate_tax(&items, &rules, None).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Exempt items contribute nothing whatever else matches.
    #[test]
    fn prop_exempt_items_pay_no_tax((items, rules) in scenario()) {
        let result = calculate_tax(&items, &rules, None).unwrap();
        for (item, taxed) in items.iter().zip(&result.items) {
            if item.is_exempt {
                prop_assert_eq!(taxed.tax_amount, Decimal::ZERO);
                prop_assert!(taxed.components.is_empty());
                prop_assert!(taxed.exemption_reason.is_some());
            }
        }
    }

    /// Totals and per-type buckets add up to the item amounts.
    #[test]
    fn prop_aggregates_sum_items((items, rules) in scenario()) {
        let result = calculate_tax(&items, &rules, None).unwrap();
        let item_tax: Decimal = result.items.iter().map(|i| i.tax_amount).sum();
        let by_type: Decimal = result.tax_by_type.values().copied().sum();
        prop_assert_eq!(result.total_tax, item_tax);
        prop_assert_eq!(result.total_tax, by_type);
        prop_assert_eq!(result.grand_total, result.total_taxable + result.total_tax);
        for taxed in &result.items {
            prop_assert_eq!(taxed.tax_amount.round_dp(2), taxed.tax_amount);
        }
    }
}

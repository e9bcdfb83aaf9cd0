//! Tax rule resolution and computation.
//!
//! Resolution per item:
//! 1. keep rules whose scope includes the item, its category or the customer
//! 2. an exempt item or any matching exempt rule means zero tax
//! 3. explicit non-default rules beat non-default catch-alls, which beat defaults
//! 4. inside the winning tier every rule applies once; ties and double-applied
//!    rates are reported as [`TaxError::RuleConflict`]

use std::collections::BTreeMap;

use ledgerline_shared::types::{CustomerId, apply_rate_pct, checked_sum, round_money};
use rust_decimal::Decimal;

use super::error::TaxError;
use super::types::{ItemTax, LineItem, TaxCalculation, TaxComponent, TaxRule, TaxType};

const EXEMPT: &str = "exempt";

/// Computes tax for `items` under `rules`. Pure: same input, same output.
pub fn calculate_tax(
    items: &[LineItem],
    rules: &[TaxRule],
    customer_id: Option<CustomerId>,
) -> Result<TaxCalculation, TaxError> {
    for rule in rules {
        if rule.rate < Decimal::ZERO || rule.rate > Decimal::ONE_HUNDRED {
            return Err(TaxError::InvalidRate {
                rule_id: rule.id,
                rate: rule.rate,
            });
        }
    }

    let mut result = TaxCalculation {
        items: Vec::with_capacity(items.len()),
        total_taxable: Decimal::ZERO,
        total_tax: Decimal::ZERO,
        tax_by_type: BTreeMap::new(),
        grand_total: Decimal::ZERO,
    };

    for (index, item) in items.iter().enumerate() {
        let item_tax = tax_item(index, item, rules, customer_id)?;
        let overflow = || TaxError::AmountOverflow { index };
        result.total_taxable = result
            .total_taxable
            .checked_add(item_tax.taxable_amount)
            .ok_or_else(overflow)?;
        result.total_tax = result
            .total_tax
            .checked_add(item_tax.tax_amount)
            .ok_or_else(overflow)?;
        for component in &item_tax.components {
            let slot = result
                .tax_by_type
                .entry(component.tax_type)
                .or_insert(Decimal::ZERO);
            *slot = slot
                .checked_add(component.amount)
                .ok_or_else(overflow)?;
        }
        result.items.push(item_tax);
    }
    result.grand_total = result
        .total_taxable
        .checked_add(result.total_tax)
        .ok_or(TaxError::AmountOverflow {
            index: items.len().saturating_sub(1),
        })?;

    Ok(result)
}

fn tax_item(
    index: usize,
    item: &LineItem,
    rules: &[TaxRule],
    customer_id: Option<CustomerId>,
) -> Result<ItemTax, TaxError> {
    if item.quantity <= Decimal::ZERO {
        return Err(TaxError::InvalidQuantity {
            index,
            quantity: item.quantity,
        });
    }
    if item.unit_price < Decimal::ZERO {
        return Err(TaxError::NegativeUnitPrice {
            index,
            unit_price: item.unit_price,
        });
    }

    let overflow = || TaxError::AmountOverflow { index };
    let taxable = item.taxable_amount().ok_or_else(overflow)?;
    let taxable_amount = round_money(taxable);
    let matching: Vec<&TaxRule> = rules
        .iter()
        .filter(|rule| rule.applies_to.matches(item, customer_id))
        .collect();

    if let Some(reason) = exemption_reason(item, &matching) {
        return Ok(ItemTax {
            index,
            taxable_amount,
            components: Vec::new(),
            tax_amount: Decimal::ZERO,
            exemption_reason: Some(reason),
            line_total: taxable_amount,
        });
    }

    let applicable = top_tier(&matching);
    check_compatible(index, &applicable)?;

    let components = applicable
        .iter()
        .map(|rule| {
            let amount = apply_rate_pct(taxable, rule.rate).map_err(|_| overflow())?;
            Ok(TaxComponent {
                rule_id: rule.id,
                tax_type: rule.tax_type,
                rate: rule.rate,
                amount: round_money(amount),
            })
        })
        .collect::<Result<Vec<_>, TaxError>>()?;
    let tax_amount = checked_sum(components.iter().map(|c| c.amount)).map_err(|_| overflow())?;
    let line_total = taxable_amount
        .checked_add(tax_amount)
        .ok_or_else(overflow)?;

    Ok(ItemTax {
        index,
        taxable_amount,
        components,
        tax_amount,
        exemption_reason: None,
        line_total,
    })
}

fn exemption_reason(item: &LineItem, matching: &[&TaxRule]) -> Option<String> {
    let exempt_rule = matching.iter().find(|rule| rule.is_exempt);
    if item.is_exempt {
        return Some(
            item.exemption_reason
                .clone()
                .or_else(|| exempt_rule.and_then(|r| r.exemption_reason.clone()))
                .unwrap_or_else(|| EXEMPT.to_string()),
        );
    }
    exempt_rule.map(|rule| {
        rule.exemption_reason
            .clone()
            .unwrap_or_else(|| EXEMPT.to_string())
    })
}

/// Non-exempt rules of the highest-precedence non-empty tier.
fn top_tier<'a>(matching: &[&'a TaxRule]) -> Vec<&'a TaxRule> {
    let Some(best) = matching.iter().map(|rule| rule.tier()).min() else {
        return Vec::new();
    };
    matching
        .iter()
        .copied()
        .filter(|rule| rule.tier() == best)
        .collect()
}

fn check_compatible(item_index: usize, rules: &[&TaxRule]) -> Result<(), TaxError> {
    let conflict = |reason: String, involved: Vec<&TaxRule>| TaxError::RuleConflict {
        item_index,
        reason,
        rule_ids: involved.iter().map(|r| r.id).collect(),
    };

    let mut by_type: BTreeMap<TaxType, Vec<&TaxRule>> = BTreeMap::new();
    for rule in rules {
        by_type.entry(rule.tax_type).or_default().push(rule);
    }
    if let Some((tax_type, tied)) = by_type.iter().find(|(_, tied)| tied.len() > 1) {
        return Err(conflict(
            format!("{} equally specific {tax_type} rules", tied.len()),
            tied.clone(),
        ));
    }

    let full: Vec<&TaxRule> = rules
        .iter()
        .copied()
        .filter(|r| r.tax_type.is_full_rate())
        .collect();
    if full.len() > 1 {
        return Err(conflict("more than one full-rate tax".to_string(), full));
    }

    let split: Vec<&TaxRule> = rules
        .iter()
        .copied()
        .filter(|r| r.tax_type.is_split_component())
        .collect();
    if !full.is_empty() && !split.is_empty() {
        let mut involved = full;
        involved.extend(split);
        return Err(conflict(
            "full-rate tax combined with CGST/SGST components".to_string(),
            involved,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::TaxScope;
    use ledgerline_shared::types::{ProductId, TenantId};
    use rust_decimal_macros::dec;

    fn gst(rate: Decimal) -> TaxRule {
        TaxRule::new(TenantId::new(), TaxType::Gst, rate, TaxScope::All)
    }

    #[test]
    fn test_default_rule_applies() {
        let rules = [gst(dec!(18)).as_default()];
        let result = calculate_tax(&[LineItem::new(dec!(1), dec!(10000))], &rules, None).unwrap();
        assert_eq!(result.total_tax, dec!(1800.00));
        assert_eq!(result.total_taxable, dec!(10000.00));
        assert_eq!(result.grand_total, dec!(11800.00));
        assert_eq!(result.tax_by_type[&TaxType::Gst], dec!(1800.00));
    }

    #[test]
    fn test_explicit_beats_default() {
        let tenant = TenantId::new();
        let product = ProductId::new();
        let rules = [
            TaxRule::new(tenant, TaxType::Gst, dec!(18), TaxScope::All).as_default(),
            TaxRule::new(tenant, TaxType::Gst, dec!(5), TaxScope::Products(vec![product])),
        ];
        let item = LineItem::new(dec!(2), dec!(500)).with_product(product);
        let result = calculate_tax(&[item], &rules, None).unwrap();
        assert_eq!(result.total_tax, dec!(50.00));
        assert_eq!(result.items[0].components.len(), 1);
        assert_eq!(result.items[0].components[0].rate, dec!(5));
    }

    #[test]
    fn test_non_default_catch_all_beats_default() {
        let tenant = TenantId::new();
        let rules = [
            TaxRule::new(tenant, TaxType::Gst, dec!(18), TaxScope::All).as_default(),
            TaxRule::new(tenant, TaxType::Igst, dec!(12), TaxScope::All),
        ];
        let result = calculate_tax(&[LineItem::new(dec!(1), dec!(100))], &rules, None).unwrap();
        assert_eq!(result.total_tax, dec!(12.00));
        assert!(result.tax_by_type.contains_key(&TaxType::Igst));
        assert!(!result.tax_by_type.contains_key(&TaxType::Gst));
    }

    #[test]
    fn test_cgst_sgst_split() {
        let tenant = TenantId::new();
        let rules = [
            TaxRule::new(tenant, TaxType::Cgst, dec!(9), TaxScope::Categories(vec!["electronics".into()])),
            TaxRule::new(tenant, TaxType::Sgst, dec!(9), TaxScope::Categories(vec!["Electronics".into()])),
            TaxRule::new(tenant, TaxType::Gst, dec!(18), TaxScope::All).as_default(),
        ];
        let item = LineItem::new(dec!(1), dec!(1000)).with_category("Electronics");
        let result = calculate_tax(&[item], &rules, None).unwrap();
        assert_eq!(result.total_tax, dec!(180.00));
        assert_eq!(result.tax_by_type[&TaxType::Cgst], dec!(90.00));
        assert_eq!(result.tax_by_type[&TaxType::Sgst], dec!(90.00));
        assert_eq!(result.tax_by_type.len(), 2);
    }

    #[test]
    fn test_tied_rules_conflict() {
        let tenant = TenantId::new();
        let product = ProductId::new();
        let rules = [
            TaxRule::new(tenant, TaxType::Gst, dec!(5), TaxScope::Products(vec![product])),
            TaxRule::new(tenant, TaxType::Gst, dec!(12), TaxScope::Categories(vec!["food".into()])),
        ];
        let item = LineItem::new(dec!(1), dec!(100))
            .with_product(product)
            .with_category("food");
        let err = calculate_tax(&[item], &rules, None).unwrap_err();
        assert!(matches!(err, TaxError::RuleConflict { item_index: 0, ref rule_ids, .. } if rule_ids.len() == 2));
        assert_eq!(err.kind(), ledgerline_shared::ErrorKind::Conflict);
    }

    #[test]
    fn test_full_rate_with_components_conflict() {
        let tenant = TenantId::new();
        let rules = [
            TaxRule::new(tenant, TaxType::Gst, dec!(18), TaxScope::All),
            TaxRule::new(tenant, TaxType::Cgst, dec!(9), TaxScope::All),
        ];
        let err = calculate_tax(&[LineItem::new(dec!(1), dec!(100))], &rules, None).unwrap_err();
        assert_eq!(err.error_code(), "TAX_RULE_CONFLICT");
    }

    #[test]
    fn test_cess_is_additive() {
        let tenant = TenantId::new();
        let rules = [
            TaxRule::new(tenant, TaxType::Igst, dec!(28), TaxScope::All),
            TaxRule::new(tenant, TaxType::Cess, dec!(12), TaxScope::All),
        ];
        let result = calculate_tax(&[LineItem::new(dec!(1), dec!(1000))], &rules, None).unwrap();
        assert_eq!(result.total_tax, dec!(400.00));
    }

    #[test]
    fn test_exempt_item_and_rule() {
        let tenant = TenantId::new();
        let rules = [
            gst(dec!(18)),
            TaxRule::new(tenant, TaxType::Gst, dec!(0), TaxScope::Categories(vec!["books".into()]))
                .exempting("Educational material"),
        ];
        let items = [
            LineItem::new(dec!(1), dec!(100)).exempt(Some("SEZ supply".into())),
            LineItem::new(dec!(3), dec!(200)).with_category("Books"),
            LineItem::new(dec!(1), dec!(100)).exempt(None),
        ];
        let result = calculate_tax(&items, &rules, None).unwrap();
        assert_eq!(result.items[0].tax_amount, Decimal::ZERO);
        assert_eq!(result.items[0].exemption_reason.as_deref(), Some("SEZ supply"));
        assert_eq!(result.items[1].tax_amount, Decimal::ZERO);
        assert_eq!(
            result.items[1].exemption_reason.as_deref(),
            Some("Educational material")
        );
        assert_eq!(result.items[2].exemption_reason.as_deref(), Some("exempt"));
        assert_eq!(result.total_tax, Decimal::ZERO);
        assert_eq!(result.grand_total, dec!(800.00));
    }

    #[test]
    fn test_customer_scope_needs_customer() {
        let tenant = TenantId::new();
        let customer = CustomerId::new();
        let rules = [
            gst(dec!(18)).as_default(),
            TaxRule::new(tenant, TaxType::Igst, dec!(0), TaxScope::Customers(vec![customer]))
                .exempting("Export customer"),
        ];
        let items = [LineItem::new(dec!(1), dec!(100))];

        let anonymous = calculate_tax(&items, &rules, None).unwrap();
        assert_eq!(anonymous.total_tax, dec!(18.00));

        let exporter = calculate_tax(&items, &rules, Some(customer)).unwrap();
        assert_eq!(exporter.total_tax, Decimal::ZERO);
    }

    #[test]
    fn test_rounding_is_half_up_per_component() {
        let rules = [gst(dec!(18))];
        // 0.25 * 18% = 0.045 -> 0.05
        let result = calculate_tax(&[LineItem::new(dec!(1), dec!(0.25))], &rules, None).unwrap();
        assert_eq!(result.total_tax, dec!(0.05));
    }

    #[test]
    fn test_no_matching_rule_means_no_tax() {
        let rules = [TaxRule::new(
            TenantId::new(),
            TaxType::Gst,
            dec!(18),
            TaxScope::Products(vec![ProductId::new()]),
        )];
        let result = calculate_tax(&[LineItem::new(dec!(1), dec!(100))], &rules, None).unwrap();
        assert_eq!(result.total_tax, Decimal::ZERO);
        assert!(result.items[0].components.is_empty());
        assert!(result.items[0].exemption_reason.is_none());
    }

    #[test]
    fn test_validation() {
        let rules = [gst(dec!(18))];
        assert!(matches!(
            calculate_tax(&[LineItem::new(dec!(0), dec!(1))], &rules, None),
            Err(TaxError::InvalidQuantity { index: 0, .. })
        ));
        assert!(matches!(
            calculate_tax(&[LineItem::new(dec!(1), dec!(-1))], &rules, None),
            Err(TaxError::NegativeUnitPrice { index: 0, .. })
        ));
        assert!(matches!(
            calculate_tax(&[LineItem::new(dec!(1), dec!(1))], &[gst(dec!(101))], None),
            Err(TaxError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_line_amount_overflow_is_an_error() {
        let huge = Decimal::from(1_000_000_000_000_000_i64);
        let result = calculate_tax(&[LineItem::new(huge, huge)], &[gst(dec!(18)).as_default()], None);
        assert_eq!(result.unwrap_err(), TaxError::AmountOverflow { index: 0 });
    }

    #[test]
    fn test_total_overflow_names_the_item() {
        let items = [LineItem::new(dec!(1), Decimal::MAX), LineItem::new(dec!(1), dec!(1))];
        let err = calculate_tax(&items, &[], None).unwrap_err();
        assert_eq!(err, TaxError::AmountOverflow { index: 1 });
        assert_eq!(err.kind(), ledgerline_shared::ErrorKind::Arithmetic);
        assert_eq!(err.error_code(), "TAX_AMOUNT_OVERFLOW");
    }
}

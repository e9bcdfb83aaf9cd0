//! Tax rule engine domain types.

use std::collections::BTreeMap;
use std::fmt;

use ledgerline_shared::types::{CustomerId, ProductId, TaxRuleId, TenantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tax component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxType {
    /// Combined goods and services tax.
    Gst,
    /// Central GST component.
    Cgst,
    /// State GST component.
    Sgst,
    /// Integrated GST (inter-state).
    Igst,
    /// Additional cess.
    Cess,
    /// Value added tax.
    Vat,
}

impl TaxType {
    /// Types that already carry the full rate for an item.
    #[must_use]
    pub const fn is_full_rate(self) -> bool {
        matches!(self, Self::Gst | Self::Igst | Self::Vat)
    }

    /// Intra-state split components.
    #[must_use]
    pub const fn is_split_component(self) -> bool {
        matches!(self, Self::Cgst | Self::Sgst)
    }
}

impl fmt::Display for TaxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gst => "GST",
            Self::Cgst => "CGST",
            Self::Sgst => "SGST",
            Self::Igst => "IGST",
            Self::Cess => "CESS",
            Self::Vat => "VAT",
        };
        f.write_str(name)
    }
}

/// What a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum TaxScope {
    /// Every item.
    All,
    /// Items with one of these products.
    Products(Vec<ProductId>),
    /// Items in one of these categories (case-insensitive).
    Categories(Vec<String>),
    /// Every item sold to one of these customers.
    Customers(Vec<CustomerId>),
}

impl TaxScope {
    /// Whether the scope names specific products, categories or customers.
    #[must_use]
    pub const fn is_explicit(&self) -> bool {
        !matches!(self, Self::All)
    }

    /// Whether the scope includes `item` sold to `customer_id`.
    #[must_use]
    pub fn matches(&self, item: &LineItem, customer_id: Option<CustomerId>) -> bool {
        match self {
            Self::All => true,
            Self::Products(ids) => item.product_id.is_some_and(|id| ids.contains(&id)),
            Self::Categories(names) => item
                .category
                .as_deref()
                .is_some_and(|cat| names.iter().any(|n| n.eq_ignore_ascii_case(cat))),
            Self::Customers(ids) => customer_id.is_some_and(|id| ids.contains(&id)),
        }
    }
}

/// A tenant's tax rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRule {
    /// Rule ID.
    pub id: TaxRuleId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Component kind.
    pub tax_type: TaxType,
    /// Percentage rate (18 means 18%).
    pub rate: Decimal,
    /// Catch-all rule applied when nothing more specific matches.
    #[serde(default)]
    pub is_default: bool,
    /// Scope.
    pub applies_to: TaxScope,
    /// Matching items are exempt.
    #[serde(default)]
    pub is_exempt: bool,
    /// Reason recorded on exempt items.
    #[serde(default)]
    pub exemption_reason: Option<String>,
}

impl TaxRule {
    /// A non-exempt rule.
    #[must_use]
    pub fn new(tenant_id: TenantId, tax_type: TaxType, rate: Decimal, applies_to: TaxScope) -> Self {
        Self {
            id: TaxRuleId::new(),
            tenant_id,
            name: format!("{tax_type} {rate}%"),
            tax_type,
            rate,
            is_default: false,
            applies_to,
            is_exempt: false,
            exemption_reason: None,
        }
    }

    /// Marks the rule as the tenant default.
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Turns the rule into an exemption.
    #[must_use]
    pub fn exempting(mut self, reason: impl Into<String>) -> Self {
        self.is_exempt = true;
        self.exemption_reason = Some(reason.into());
        self
    }

    /// Precedence tier; lower wins.
    pub(crate) fn tier(&self) -> u8 {
        match (self.is_default, self.applies_to.is_explicit()) {
            (false, true) => 0,
            (false, false) => 1,
            (true, _) => 2,
        }
    }
}

/// A line item to tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product sold.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Product category.
    #[serde(default)]
    pub category: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Quantity, must be positive.
    pub quantity: Decimal,
    /// Unit price, must not be negative.
    pub unit_price: Decimal,
    /// Item-level exemption.
    #[serde(default)]
    pub is_exempt: bool,
    /// Reason for the item-level exemption.
    #[serde(default)]
    pub exemption_reason: Option<String>,
}

impl LineItem {
    /// A taxable item.
    #[must_use]
    pub fn new(quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            product_id: None,
            category: None,
            description: String::new(),
            quantity,
            unit_price,
            is_exempt: false,
            exemption_reason: None,
        }
    }

    /// Sets the product.
    #[must_use]
    pub fn with_product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Marks the item exempt.
    #[must_use]
    pub fn exempt(mut self, reason: Option<String>) -> Self {
        self.is_exempt = true;
        self.exemption_reason = reason;
        self
    }

    /// `quantity × unit_price`, unrounded; `None` when the product overflows.
    #[must_use]
    pub fn taxable_amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }
}

/// One applied tax component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComponent {
    /// Rule that produced it.
    pub rule_id: TaxRuleId,
    /// Component kind.
    pub tax_type: TaxType,
    /// Percentage rate.
    pub rate: Decimal,
    /// Rounded amount.
    pub amount: Decimal,
}

/// Tax outcome for one line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTax {
    /// Position in the input.
    pub index: usize,
    /// Rounded `quantity × unit_price`.
    pub taxable_amount: Decimal,
    /// Applied components; empty when exempt or untaxed.
    pub components: Vec<TaxComponent>,
    /// Sum of component amounts.
    pub tax_amount: Decimal,
    /// Set when the item is exempt.
    pub exemption_reason: Option<String>,
    /// Taxable amount plus tax.
    pub line_total: Decimal,
}

/// Result of [`super::calculate_tax`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCalculation {
    /// Per-item outcomes, in input order.
    pub items: Vec<ItemTax>,
    /// Sum of taxable amounts.
    pub total_taxable: Decimal,
    /// Sum of item tax.
    pub total_tax: Decimal,
    /// Tax grouped by component kind.
    pub tax_by_type: BTreeMap<TaxType, Decimal>,
    /// `total_taxable + total_tax`.
    pub grand_total: Decimal,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Header columns every upload must carry (case-insensitive, any order;
/// extra columns are ignored)
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "id",
    "title",
    "brand",
    "category",
    "product_type",
    "description",
    "price",
    "currency",
    "stock",
    "sku",
    "rating",
    "created_at",
];

/// Canonical product record. No field is globally required; absence is
/// represented by omission, never by null placeholders. The same shape
/// doubles as the normalized patch carried by an upsert operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,

    /// Primary business key when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// True when every field is absent; such a patch never reaches the store
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.brand.is_none()
            && self.category.is_none()
            && self.product_type.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.currency.is_none()
            && self.stock.is_none()
            && self.sku.is_none()
            && self.rating.is_none()
            && self.created_at.is_none()
    }

    /// Upsert identity: `sku` when non-empty, otherwise the non-empty
    /// subset of `(title, brand, category, product_type)`. `None` means
    /// the record is not indexable and must be dropped.
    pub fn identity(&self) -> Option<IdentityFilter> {
        if let Some(sku) = self.sku.as_deref().filter(|s| !s.is_empty()) {
            return Some(IdentityFilter::Sku(sku.to_string()));
        }

        if self.title.is_none()
            && self.brand.is_none()
            && self.category.is_none()
            && self.product_type.is_none()
        {
            return None;
        }

        Some(IdentityFilter::Logical {
            title: self.title.clone(),
            brand: self.brand.clone(),
            category: self.category.clone(),
            product_type: self.product_type.clone(),
        })
    }

    /// `$set`-style merge: present patch fields overwrite, absent fields
    /// leave the existing value untouched
    pub fn apply(&mut self, patch: &Product) {
        if patch.title.is_some() {
            self.title = patch.title.clone();
        }
        if patch.brand.is_some() {
            self.brand = patch.brand.clone();
        }
        if patch.category.is_some() {
            self.category = patch.category.clone();
        }
        if patch.product_type.is_some() {
            self.product_type = patch.product_type.clone();
        }
        if patch.description.is_some() {
            self.description = patch.description.clone();
        }
        if patch.price.is_some() {
            self.price = patch.price;
        }
        if patch.currency.is_some() {
            self.currency = patch.currency.clone();
        }
        if patch.stock.is_some() {
            self.stock = patch.stock;
        }
        if patch.sku.is_some() {
            self.sku = patch.sku.clone();
        }
        if patch.rating.is_some() {
            self.rating = patch.rating;
        }
        if patch.created_at.is_some() {
            self.created_at = patch.created_at;
        }
    }
}

/// Identity projection used as the upsert filter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityFilter {
    /// Matched solely by `sku`
    Sku(String),

    /// Matched by the non-empty subset of the logical key fields;
    /// at least one of the four is present
    Logical {
        title: Option<String>,
        brand: Option<String>,
        category: Option<String>,
        product_type: Option<String>,
    },
}

impl IdentityFilter {
    /// Whether a stored document satisfies this filter. Absent filter
    /// fields leave the corresponding document field unconstrained.
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            IdentityFilter::Sku(sku) => product.sku.as_deref() == Some(sku.as_str()),
            IdentityFilter::Logical {
                title,
                brand,
                category,
                product_type,
            } => {
                fn field_matches(filter: &Option<String>, value: &Option<String>) -> bool {
                    match filter {
                        Some(expected) => value.as_deref() == Some(expected.as_str()),
                        None => true,
                    }
                }

                field_matches(title, &product.title)
                    && field_matches(brand, &product.brand)
                    && field_matches(category, &product.category)
                    && field_matches(product_type, &product.product_type)
            }
        }
    }
}

/// A single upsert instruction: created per valid CSV row, accumulated
/// in-memory, and drained into an unordered bulk write
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOp {
    pub filter: IdentityFilter,
    pub patch: Product,
}

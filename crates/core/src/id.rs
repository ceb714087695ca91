//! Strongly-typed identifiers used across the domain.
//!
//! Every persisted table uses a numeric (BIGSERIAL) primary key, so identifiers
//! wrap an `i64` and serialize transparently as a JSON number.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a warehouse.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarehouseId(i64);

/// Identifier of a product (owned by the product service).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

/// Identifier of a shop (owned by the shop service).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopId(i64);

/// Identifier of a user (owned by the user service).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

/// Identifier of a ledger row in `warehouse_stocks`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarehouseStockId(i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderDetailId(i64);

macro_rules! impl_numeric_id {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }

            /// Ids are assigned by the database and are always positive.
            pub const fn is_valid(self) -> bool {
                self.0 > 0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid(format!("{}: {}", $name, e)))?;
                let id = Self(value);
                if !id.is_valid() {
                    return Err(DomainError::invalid(format!("{}: must be positive", $name)));
                }
                Ok(id)
            }
        }
    };
}

impl_numeric_id!(WarehouseId, "WarehouseId");
impl_numeric_id!(ProductId, "ProductId");
impl_numeric_id!(ShopId, "ShopId");
impl_numeric_id!(UserId, "UserId");
impl_numeric_id!(WarehouseStockId, "WarehouseStockId");
impl_numeric_id!(OrderId, "OrderId");
impl_numeric_id!(OrderDetailId, "OrderDetailId");

/// Distinct values in first-seen order.
///
/// Used wherever a batch references the same warehouse/product more than once
/// and a lookup should ask for each id only once.
pub fn distinct<T, I>(values: I) -> Vec<T>
where
    T: Copy + Eq + core::hash::Hash,
    I: IntoIterator<Item = T>,
{
    let mut seen = std::collections::HashSet::new();
    values.into_iter().filter(|v| seen.insert(*v)).collect()
}

/// Parse a comma-separated id list (`"1,2,3"`), ignoring empty segments.
pub fn parse_id_list<T>(raw: &str) -> Result<Vec<T>, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(T::from_str)
        .collect()
}

//! List queries: a base SELECT, optional equality filters and a fixed ordering
//!
//! Filters are AND-ed and bound as parameters. A filter whose value is `None`
//! is left out entirely, so an endpoint called without query parameters
//! lists everything in its default order.

use serde::{de, Deserialize, Deserializer};
use sqlx::{Postgres, QueryBuilder};

use shared::EntityId;

/// Deserialize an optional id filter from a query string.
///
/// An empty value (`?plot=`) means "no filter"; anything else must be an
/// integer id.
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<EntityId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<EntityId>().map(Some).map_err(|_| {
            de::Error::custom(format!("expected an integer id, got \"{}\"", value))
        }),
    }
}

#[derive(Debug, Clone)]
pub struct ListQuery {
    select: &'static str,
    filters: Vec<(&'static str, EntityId)>,
    order_by: &'static str,
}

impl ListQuery {
    pub fn new(select: &'static str, order_by: &'static str) -> Self {
        Self {
            select,
            filters: Vec::new(),
            order_by,
        }
    }

    /// Add `column = value` when a value was supplied
    pub fn filter(mut self, column: &'static str, value: Option<EntityId>) -> Self {
        if let Some(value) = value {
            self.filters.push((column, value));
        }
        self
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    pub fn build(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(self.select);
        for (i, (column, value)) in self.filters.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            builder.push(*column).push(" = ").push_bind(*value);
        }
        builder.push(" ORDER BY ").push(self.order_by);
        builder
    }
}

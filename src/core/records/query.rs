use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{BackendError, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(format!("Unknown direction: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// Equality filter against the textual form of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub order: Option<Order>,
    pub filters: Vec<Filter>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Builds a query from URL parameters: `order`, `direction`, `limit` and
    /// `offset` are reserved, every other key becomes an equality filter.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, BackendError> {
        let mut query = Self::new();
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();

        for key in keys {
            let value = &params[key];
            match key.as_str() {
                "order" | "direction" => {}
                "limit" => {
                    let limit = value
                        .parse::<i64>()
                        .map_err(|_| BackendError::query(format!("invalid limit: {value}")))?;
                    query = query.limit(limit.max(0));
                }
                "offset" => {
                    let offset = value
                        .parse::<i64>()
                        .map_err(|_| BackendError::query(format!("invalid offset: {value}")))?;
                    query = query.offset(offset.max(0));
                }
                column => query = query.filter(column, value.clone()),
            }
        }

        if let Some(column) = params.get("order") {
            let direction = match params.get("direction") {
                Some(raw) => raw.parse::<Direction>().map_err(BackendError::query)?,
                None => Direction::Descending,
            };
            query = query.order_by(column.clone(), direction);
        }

        Ok(query)
    }

    /// Rejects filters or ordering on columns the record does not have.
    pub fn check_columns<E: Record>(&self) -> Result<(), BackendError> {
        check_filter_columns::<E>(&self.filters)?;
        if let Some(order) = &self.order {
            if !E::COLUMNS.contains(&order.column.as_str()) {
                return Err(BackendError::unknown_column(E::TABLE, &order.column));
            }
        }
        Ok(())
    }
}

pub fn check_filter_columns<E: Record>(filters: &[Filter]) -> Result<(), BackendError> {
    for filter in filters {
        if !E::COLUMNS.contains(&filter.column.as_str()) {
            return Err(BackendError::unknown_column(E::TABLE, &filter.column));
        }
    }
    Ok(())
}

//! Product catalog models and the product listing query.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A sellable product as stored in the system of record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: String,
    pub color_ids: Vec<String>,
    pub size_ids: Vec<String>,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub items: Vec<Product>,
    /// Number of products matching the filters, across all pages
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

// == Sorting ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
    Name,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Price => "price",
            Self::Name => "name",
        }
    }
}

impl FromStr for SortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "createdAt" => Ok(Self::CreatedAt),
            "price" => Ok(Self::Price),
            "name" => Ok(Self::Name),
            other => Err(AppError::InvalidRequest(format!("Unknown sort field: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(AppError::InvalidRequest(format!("Unknown sort order: {other}"))),
        }
    }
}

// == Product List Query ==
/// Filters, pagination and ordering for a product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub categories: Vec<String>,
    pub colors: Vec<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<SortField>,
    pub order: Option<SortOrder>,
}

impl ProductListQuery {
    pub const DEFAULT_LIMIT: u32 = 12;
    pub const MAX_LIMIT: u32 = 100;

    /// Parses `key=value` pairs from a query string. Repeated `category` and
    /// `color` parameters accumulate; unknown parameters are ignored.
    pub fn from_query_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                "search" => query.search = Some(value.into_owned()),
                "minPrice" => query.min_price = Some(parse_param("minPrice", &value)?),
                "maxPrice" => query.max_price = Some(parse_param("maxPrice", &value)?),
                "category" | "categories" => query.categories.push(value.into_owned()),
                "color" | "colors" => query.colors.push(value.into_owned()),
                "page" => query.page = Some(parse_param("page", &value)?),
                "limit" => query.limit = Some(parse_param("limit", &value)?),
                "sort" => query.sort = Some(value.parse()?),
                "order" => query.order = Some(value.parse()?),
                _ => {}
            }
        }
        Ok(query)
    }

    /// Parses a raw (still percent-encoded) query string.
    pub fn from_query_string(raw: &str) -> Result<Self> {
        Self::from_query_pairs(url::form_urlencoded::parse(raw.as_bytes()))
    }

    /// Returns the equivalent query with every field in canonical form.
    ///
    /// Two queries that select the same page of the same listing normalize to
    /// equal values.
    pub fn normalized(&self) -> Self {
        Self {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            min_price: self.min_price.map(|p| p.normalize()),
            max_price: self.max_price.map(|p| p.normalize()),
            categories: sorted_unique(&self.categories),
            colors: sorted_unique(&self.colors),
            page: Some(self.page.unwrap_or(1).max(1)),
            limit: Some(
                self.limit
                    .unwrap_or(Self::DEFAULT_LIMIT)
                    .clamp(1, Self::MAX_LIMIT),
            ),
            sort: Some(self.sort.unwrap_or_default()),
            order: Some(self.order.unwrap_or_default()),
        }
    }
}

fn sorted_unique(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    out.sort();
    out.dedup();
    out
}

fn parse_param<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidRequest(format!("Invalid value for {name}: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repeated_filters() {
        let query =
            ProductListQuery::from_query_string("category=b&category=a&color=red&page=2").unwrap();

        assert_eq!(query.categories, vec!["b", "a"]);
        assert_eq!(query.colors, vec!["red"]);
        assert_eq!(query.page, Some(2));
    }

    #[test]
    fn test_parse_prices_and_sort() {
        let query = ProductListQuery::from_query_string(
            "search=linen%20shirt&minPrice=9.5&maxPrice=40&sort=price&order=asc",
        )
        .unwrap();

        assert_eq!(query.search.as_deref(), Some("linen shirt"));
        assert_eq!(query.min_price, Some(Decimal::from_str("9.5").unwrap()));
        assert_eq!(query.max_price, Some(Decimal::from(40)));
        assert_eq!(query.sort, Some(SortField::Price));
        assert_eq!(query.order, Some(SortOrder::Asc));
    }

    #[test]
    fn test_parse_rejects_bad_numbers() {
        assert!(matches!(
            ProductListQuery::from_query_string("page=two"),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            ProductListQuery::from_query_string("sort=popularity"),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_normalized_fills_defaults_and_clamps() {
        let query = ProductListQuery {
            page: Some(0),
            limit: Some(5_000),
            categories: vec!["b".into(), " a ".into(), "b".into(), "".into()],
            ..Default::default()
        }
        .normalized();

        assert_eq!(query.page, Some(1));
        assert_eq!(query.limit, Some(ProductListQuery::MAX_LIMIT));
        assert_eq!(query.categories, vec!["a", "b"]);
        assert_eq!(query.sort, Some(SortField::CreatedAt));
        assert_eq!(query.order, Some(SortOrder::Desc));
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let product = Product {
            id: "42".into(),
            name: "Tee".into(),
            description: String::new(),
            price: Decimal::from(10),
            category_id: "shirts".into(),
            color_ids: vec![],
            size_ids: vec![],
            stock: 3,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["categoryId"], "shirts");
        assert_eq!(json["price"], "10");
    }
}

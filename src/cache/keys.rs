//! Cache Key Scheme
//!
//! Deterministic key construction for every cached resource family.
//!
//! | Family       | Rendered key                         |
//! |--------------|--------------------------------------|
//! | product      | `product:{id}`                       |
//! | product list | `products:list:{canonical query}`    |
//! | cart         | `cart:{cart_id}:{content hash}`      |
//! | admin        | `admin:{endpoint}`                   |
//!
//! Identities are percent-encoded, so an id containing `:` can never make one
//! key a prefix of another family member's key.

use std::fmt;

use sha2::{Digest, Sha256};
use url::form_urlencoded;

use crate::models::{CartLine, ProductListQuery};

// == Namespaces ==
pub const PRODUCT_NAMESPACE: &str = "product";
pub const PRODUCT_LIST_NAMESPACE: &str = "products:list";
pub const CART_NAMESPACE: &str = "cart";
pub const ADMIN_NAMESPACE: &str = "admin";

/// Separator between cart lines before hashing.
const CART_LINE_SEPARATOR: &str = "|";

// == Cache Key ==
/// A structured cache key: a namespace plus the identity it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A single product by id
    Product { id: String },
    /// One filtered, paginated product listing
    ProductList { canonical_query: String },
    /// A cart snapshot for one exact set of contents
    Cart { cart_id: String, content_hash: String },
    /// A whole admin list resource
    Admin { endpoint: String },
}

impl CacheKey {
    pub fn product(id: &str) -> Self {
        Self::Product { id: id.to_string() }
    }

    /// Key for a product listing. Logically equivalent queries map to the
    /// same key.
    pub fn product_list(query: &ProductListQuery) -> Self {
        Self::ProductList {
            canonical_query: canonical_query_string(query),
        }
    }

    /// Key for a cart with the given contents. Line order is irrelevant.
    pub fn cart(cart_id: &str, lines: &[CartLine]) -> Self {
        Self::Cart {
            cart_id: cart_id.to_string(),
            content_hash: cart_content_hash(lines),
        }
    }

    pub fn admin(endpoint: &str) -> Self {
        Self::Admin {
            endpoint: endpoint.to_string(),
        }
    }

    /// Namespace tag this key belongs to.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Product { .. } => PRODUCT_NAMESPACE,
            Self::ProductList { .. } => PRODUCT_LIST_NAMESPACE,
            Self::Cart { .. } => CART_NAMESPACE,
            Self::Admin { .. } => ADMIN_NAMESPACE,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product { id } => write!(f, "{PRODUCT_NAMESPACE}:{}", encode_segment(id)),
            Self::ProductList { canonical_query } => {
                write!(f, "{PRODUCT_LIST_NAMESPACE}:{canonical_query}")
            }
            Self::Cart {
                cart_id,
                content_hash,
            } => write!(f, "{}{content_hash}", cart_key_prefix(cart_id)),
            Self::Admin { endpoint } => write!(f, "{}", admin_key(endpoint)),
        }
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.to_string()
    }
}

// == Helpers ==
/// Percent-encodes one identity segment.
pub fn encode_segment(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

/// Every key of one cart starts with this, whatever its contents.
pub fn cart_key_prefix(cart_id: &str) -> String {
    format!("{CART_NAMESPACE}:{}:", encode_segment(cart_id))
}

pub fn admin_key(endpoint: &str) -> String {
    format!("{ADMIN_NAMESPACE}:{}", encode_segment(endpoint))
}

// == Canonical Query ==
/// Serializes a product listing query in a fixed field order.
///
/// The query is normalized first: defaults are filled in, blank search text is
/// dropped, prices are normalized (`10.00` == `10`) and multi-valued filters
/// are sorted and de-duplicated.
pub fn canonical_query_string(query: &ProductListQuery) -> String {
    let query = query.normalized();
    let mut out = form_urlencoded::Serializer::new(String::new());

    if let Some(search) = &query.search {
        out.append_pair("search", search);
    }
    if let Some(min) = query.min_price {
        out.append_pair("minPrice", &min.to_string());
    }
    if let Some(max) = query.max_price {
        out.append_pair("maxPrice", &max.to_string());
    }
    for category in &query.categories {
        out.append_pair("category", category);
    }
    for color in &query.colors {
        out.append_pair("color", color);
    }
    out.append_pair("page", &query.page.unwrap_or_default().to_string());
    out.append_pair("limit", &query.limit.unwrap_or_default().to_string());
    out.append_pair("sort", query.sort.unwrap_or_default().as_str());
    out.append_pair("order", query.order.unwrap_or_default().as_str());

    out.finish()
}

// == Cart Content Hash ==
/// Order-independent digest of cart contents.
///
/// Each line becomes `productId:quantity:colorId:sizeId` (blank for absent
/// color or size, every field percent-encoded); the strings are sorted, joined
/// and hashed with SHA-256.
pub fn cart_content_hash(lines: &[CartLine]) -> String {
    let mut canonical: Vec<String> = lines.iter().map(canonical_cart_line).collect();
    canonical.sort_unstable();

    let digest = Sha256::digest(canonical.join(CART_LINE_SEPARATOR).as_bytes());
    hex::encode(digest)
}

fn canonical_cart_line(line: &CartLine) -> String {
    format!(
        "{}:{}:{}:{}",
        encode_segment(&line.product_id),
        line.quantity,
        line.color_id.as_deref().map(encode_segment).unwrap_or_default(),
        line.size_id.as_deref().map(encode_segment).unwrap_or_default(),
    )
}

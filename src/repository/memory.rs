//! In-memory system of record, used by the demo binary and by tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::debug;

use super::StorefrontRepository;
use crate::error::{AppError, Result};
use crate::models::{
    AddToCartRequest, Campaign, CartLine, Category, Customer, NewCampaign, Product,
    ProductListQuery, ProductPage, ProductUpdate, SortField, SortOrder, UpdateCartItemRequest,
    MAX_LINE_QUANTITY,
};

#[derive(Debug, Default)]
struct State {
    products: BTreeMap<String, Product>,
    carts: HashMap<String, Vec<CartLine>>,
    campaigns: Vec<Campaign>,
    categories: Vec<Category>,
    customers: Vec<Customer>,
}

// == In-Memory Repository ==
/// A [`StorefrontRepository`] backed by process memory.
///
/// Counts calls per operation so tests can tell cache hits from database
/// reads, and can be switched to fail every call.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
    calls: StdMutex<HashMap<&'static str, usize>>,
    unavailable: AtomicBool,
    next_id: AtomicU64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small demo catalog with categories, campaigns and customers.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let product = |id: &str, name: &str, price: i64, category: &str, colors: &[&str], age_days: i64| Product {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("{name} from the demo catalog"),
            price: Decimal::from(price),
            category_id: category.to_string(),
            color_ids: colors.iter().map(|c| c.to_string()).collect(),
            size_ids: vec!["s".into(), "m".into(), "l".into()],
            stock: 25,
            created_at: now - ChronoDuration::days(age_days),
        };

        let state = State {
            products: [
                product("1", "Linen shirt", 49, "shirts", &["white", "blue"], 3),
                product("2", "Oxford shirt", 59, "shirts", &["blue"], 10),
                product("3", "Chino trousers", 69, "trousers", &["beige", "black"], 7),
                product("4", "Wool sweater", 89, "knitwear", &["grey"], 1),
                product("5", "Canvas sneakers", 75, "shoes", &["white", "black"], 21),
            ]
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect(),
            categories: ["shirts", "trousers", "knitwear", "shoes"]
                .into_iter()
                .map(|slug| Category {
                    id: slug.to_string(),
                    name: slug[..1].to_uppercase() + &slug[1..],
                    slug: slug.to_string(),
                })
                .collect(),
            campaigns: vec![Campaign {
                id: "cmp_0".into(),
                name: "Launch week".into(),
                discount_percent: 10,
                starts_at: now - ChronoDuration::days(2),
                ends_at: Some(now + ChronoDuration::days(5)),
                active: true,
            }],
            customers: vec![Customer {
                id: "cus_0".into(),
                email: "ada@example.com".into(),
                name: "Ada".into(),
                order_count: 3,
            }],
            carts: HashMap::new(),
        };

        Self {
            state: RwLock::new(state),
            next_id: AtomicU64::new(1),
            ..Self::default()
        }
    }

    /// Inserts or replaces a product.
    pub async fn insert_product(&self, product: Product) {
        self.state
            .write()
            .await
            .products
            .insert(product.id.clone(), product);
    }

    /// Number of times `operation` (a trait method name) has been called.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn enter(&self, operation: &'static str) -> Result<()> {
        *self
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(operation)
            .or_default() += 1;
        debug!(operation, "repository call");

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Repository(format!(
                "{operation}: system of record unavailable"
            )));
        }
        Ok(())
    }
}

fn matches_filters(product: &Product, query: &ProductListQuery) -> bool {
    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        if !product.name.to_lowercase().contains(&needle)
            && !product.description.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    if query.min_price.is_some_and(|min| product.price < min) {
        return false;
    }
    if query.max_price.is_some_and(|max| product.price > max) {
        return false;
    }
    if !query.categories.is_empty() && !query.categories.contains(&product.category_id) {
        return false;
    }
    if !query.colors.is_empty() && !product.color_ids.iter().any(|c| query.colors.contains(c)) {
        return false;
    }
    true
}

#[async_trait]
impl StorefrontRepository for InMemoryRepository {
    async fn get_product(&self, id: &str) -> Result<Product> {
        self.enter("get_product")?;
        self.state
            .read()
            .await
            .products
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))
    }

    async fn list_products(&self, query: &ProductListQuery) -> Result<ProductPage> {
        self.enter("list_products")?;
        let query = query.normalized();
        let state = self.state.read().await;

        let mut matching: Vec<&Product> = state
            .products
            .values()
            .filter(|p| matches_filters(p, &query))
            .collect();

        matching.sort_by(|a, b| {
            let ordering = match query.sort.unwrap_or_default() {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::Price => a.price.cmp(&b.price),
                SortField::Name => a.name.cmp(&b.name),
            };
            match query.order.unwrap_or_default() {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(ProductListQuery::DEFAULT_LIMIT);
        let offset = (page as usize - 1).saturating_mul(limit as usize);

        Ok(ProductPage {
            total: matching.len(),
            items: matching
                .into_iter()
                .skip(offset)
                .take(limit as usize)
                .cloned()
                .collect(),
            page,
            limit,
        })
    }

    async fn update_product(&self, id: &str, update: &ProductUpdate) -> Result<Product> {
        self.enter("update_product")?;
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

        if let Some(name) = &update.name {
            product.name = name.clone();
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(stock) = update.stock {
            product.stock = stock;
        }
        Ok(product.clone())
    }

    async fn cart_lines(&self, cart_id: &str) -> Result<Vec<CartLine>> {
        self.enter("cart_lines")?;
        Ok(self
            .state
            .read()
            .await
            .carts
            .get(cart_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_cart_line(
        &self,
        cart_id: &str,
        request: &AddToCartRequest,
    ) -> Result<Vec<CartLine>> {
        self.enter("add_cart_line")?;
        let mut state = self.state.write().await;
        if !state.products.contains_key(&request.product_id) {
            return Err(AppError::NotFound(format!("product {}", request.product_id)));
        }

        let lines = state.carts.entry(cart_id.to_string()).or_default();
        let color = request.color_id.as_deref();
        let size = request.size_id.as_deref();
        match lines
            .iter_mut()
            .find(|line| line.same_variant(&request.product_id, color, size))
        {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(request.quantity)
                    .filter(|quantity| *quantity <= MAX_LINE_QUANTITY)
                    .ok_or_else(|| {
                        AppError::InvalidRequest(format!(
                            "Quantity of {} cannot exceed {MAX_LINE_QUANTITY}",
                            request.product_id
                        ))
                    })?;
            }
            None => lines.push(CartLine {
                product_id: request.product_id.clone(),
                quantity: request.quantity,
                color_id: request.color_id.clone(),
                size_id: request.size_id.clone(),
            }),
        }
        Ok(lines.clone())
    }

    async fn set_cart_quantity(
        &self,
        cart_id: &str,
        request: &UpdateCartItemRequest,
    ) -> Result<Vec<CartLine>> {
        self.enter("set_cart_quantity")?;
        let mut state = self.state.write().await;
        let lines = state.carts.entry(cart_id.to_string()).or_default();
        let color = request.color_id.as_deref();
        let size = request.size_id.as_deref();

        let position = lines
            .iter()
            .position(|line| line.same_variant(&request.product_id, color, size))
            .ok_or_else(|| {
                AppError::NotFound(format!("cart line {} in cart {cart_id}", request.product_id))
            })?;

        if request.quantity == 0 {
            lines.remove(position);
        } else if let Some(line) = lines.get_mut(position) {
            line.quantity = request.quantity;
        }
        Ok(lines.clone())
    }

    async fn clear_cart(&self, cart_id: &str) -> Result<()> {
        self.enter("clear_cart")?;
        self.state.write().await.carts.remove(cart_id);
        Ok(())
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        self.enter("list_campaigns")?;
        Ok(self.state.read().await.campaigns.clone())
    }

    async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign> {
        self.enter("create_campaign")?;
        let now = Utc::now();
        let starts_at = campaign.starts_at.unwrap_or(now);
        let created = Campaign {
            id: format!("cmp_{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: campaign.name.trim().to_string(),
            discount_percent: campaign.discount_percent,
            starts_at,
            ends_at: campaign.ends_at,
            active: starts_at <= now && campaign.ends_at.map_or(true, |end| end > now),
        };
        self.state.write().await.campaigns.push(created.clone());
        Ok(created)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.enter("list_categories")?;
        Ok(self.state.read().await.categories.clone())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        self.enter("list_customers")?;
        Ok(self.state.read().await.customers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn add(product_id: &str, quantity: u32) -> AddToCartRequest {
        AddToCartRequest {
            product_id: product_id.into(),
            quantity,
            color_id: Some("blue".into()),
            size_id: None,
        }
    }

    #[tokio::test]
    async fn test_empty_repository() {
        let repo = InMemoryRepository::new();
        assert!(matches!(repo.get_product("1").await, Err(AppError::NotFound(_))));
        assert_eq!(repo.list_products(&ProductListQuery::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_add_cart_line_caps_merged_quantity() {
        let repo = InMemoryRepository::seeded();
        repo.add_cart_line("c1", &add("1", MAX_LINE_QUANTITY)).await.unwrap();

        let result = repo.add_cart_line("c1", &add("1", 1)).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));

        let huge = repo.add_cart_line("c1", &add("1", u32::MAX)).await;
        assert!(matches!(huge, Err(AppError::InvalidRequest(_))));

        let lines = repo.cart_lines("c1").await.unwrap();
        assert_eq!(lines[0].quantity, MAX_LINE_QUANTITY);
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let repo = InMemoryRepository::seeded();

        let shirts = repo
            .list_products(&ProductListQuery {
                categories: vec!["shirts".into()],
                sort: Some(SortField::Price),
                order: Some(SortOrder::Asc),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(shirts.total, 2);
        assert_eq!(shirts.items[0].id, "1");

        let page_two = repo
            .list_products(&ProductListQuery {
                limit: Some(2),
                page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page_two.total, 5);
        assert_eq!(page_two.items.len(), 2);
    }

    #[tokio::test]
    async fn test_list_price_and_color_filters() {
        let repo = InMemoryRepository::seeded();

        let page = repo
            .list_products(&ProductListQuery {
                min_price: Some(Decimal::from_str("60").unwrap()),
                colors: vec!["black".into()],
                ..Default::default()
            })
            .await
            .unwrap();

        let ids: Vec<&str> = page.items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(page.total, 2);
        assert!(ids.contains(&"3") && ids.contains(&"5"));
    }

    #[tokio::test]
    async fn test_cart_add_merges_same_variant() {
        let repo = InMemoryRepository::seeded();
        let add = AddToCartRequest {
            product_id: "1".into(),
            quantity: 1,
            color_id: Some("white".into()),
            size_id: None,
        };

        repo.add_cart_line("c1", &add).await.unwrap();
        let lines = repo.add_cart_line("c1", &add).await.unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_cart_quantity_zero_removes_line() {
        let repo = InMemoryRepository::seeded();
        repo.add_cart_line(
            "c1",
            &AddToCartRequest {
                product_id: "2".into(),
                quantity: 3,
                color_id: None,
                size_id: None,
            },
        )
        .await
        .unwrap();

        let lines = repo
            .set_cart_quantity(
                "c1",
                &UpdateCartItemRequest {
                    product_id: "2".into(),
                    quantity: 0,
                    color_id: None,
                    size_id: None,
                },
            )
            .await
            .unwrap();

        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_fails_and_counts_calls() {
        let repo = InMemoryRepository::seeded();
        repo.set_unavailable(true);

        assert!(matches!(
            repo.get_product("1").await,
            Err(AppError::Repository(_))
        ));
        assert_eq!(repo.calls("get_product"), 1);
    }

    #[tokio::test]
    async fn test_create_campaign_assigns_ids() {
        let repo = InMemoryRepository::seeded();
        let campaign = repo
            .create_campaign(&NewCampaign {
                name: "Summer".into(),
                discount_percent: 15,
                starts_at: None,
                ends_at: None,
            })
            .await
            .unwrap();

        assert_eq!(campaign.id, "cmp_1");
        assert!(campaign.active);
        assert_eq!(repo.list_campaigns().await.unwrap().len(), 2);
    }
}

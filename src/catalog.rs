//! Catalog gateway: dish records, the backend trait, and a TTL cache front.
//!
//! The real backend is an external spreadsheet-like source and may be slow;
//! every read goes through [`CachedCatalog`], which memoizes category names
//! and per-category dish lists for a configurable TTL. The cache lock is
//! never held across a backend call, so concurrent users at worst duplicate
//! one fetch and never block each other.

use crate::error::BotResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// One dish row from the catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    /// Source row identifier. May arrive empty; the cache front assigns a
    /// 1-based row index in that case.
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Unit price in whole rubles.
    pub price: u32,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Read contract of the external catalog source.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Ordered category names (one per sheet).
    async fn list_categories(&self) -> BotResult<Vec<String>>;

    /// Dishes of one category.
    async fn list_dishes(&self, category: &str) -> BotResult<Vec<Dish>>;
}

struct Stamped<T> {
    fetched_at: Instant,
    value: T,
}

/// TTL-caching front over a [`CatalogSource`].
pub struct CachedCatalog<S> {
    source: S,
    ttl: Duration,
    categories: RwLock<Option<Stamped<Vec<String>>>>,
    dishes: RwLock<HashMap<String, Stamped<Vec<Dish>>>>,
}

impl<S: CatalogSource> CachedCatalog<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            categories: RwLock::new(None),
            dishes: RwLock::new(HashMap::new()),
        }
    }

    fn is_fresh<T>(&self, entry: &Stamped<T>) -> bool {
        entry.fetched_at.elapsed() < self.ttl
    }

    pub async fn categories(&self) -> BotResult<Vec<String>> {
        {
            let cached = self.categories.read().await;
            if let Some(entry) = cached.as_ref()
                && self.is_fresh(entry)
            {
                return Ok(entry.value.clone());
            }
        }

        let fresh = self.source.list_categories().await?;
        *self.categories.write().await = Some(Stamped {
            fetched_at: Instant::now(),
            value: fresh.clone(),
        });
        Ok(fresh)
    }

    pub async fn dishes(&self, category: &str) -> BotResult<Vec<Dish>> {
        {
            let cached = self.dishes.read().await;
            if let Some(entry) = cached.get(category)
                && self.is_fresh(entry)
            {
                return Ok(entry.value.clone());
            }
        }

        let mut fresh = self.source.list_dishes(category).await?;
        for (row, dish) in fresh.iter_mut().enumerate() {
            if dish.id.is_empty() {
                dish.id = (row + 1).to_string();
            }
        }
        self.dishes.write().await.insert(
            category.to_string(),
            Stamped {
                fetched_at: Instant::now(),
                value: fresh.clone(),
            },
        );
        Ok(fresh)
    }

    /// Drop everything; the next read refetches.
    pub async fn bust(&self) {
        *self.categories.write().await = None;
        self.dishes.write().await.clear();
    }
}

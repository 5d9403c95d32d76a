//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{CatalogRepository, CatalogStore, MemoryStore, OrderRepository, OrderStore};
use crate::services::{CatalogService, ChatRooms, OrderService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// services and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    orders: OrderService,
    catalog: CatalogService,
    chat: ChatRooms,
}

impl AppState {
    /// Create application state over the given stores.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        let order_service = OrderService::new(
            orders,
            Arc::clone(&catalog),
            config.transition_policy,
            config.verify_order_totals,
        );
        let catalog_service = CatalogService::new(catalog);
        let chat = ChatRooms::new(config.chat_history_limit);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                orders: order_service,
                catalog: catalog_service,
                chat,
            }),
        }
    }

    /// Application state backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(config: StorefrontConfig, pool: PgPool) -> Self {
        Self::new(
            config,
            Arc::new(OrderRepository::new(pool.clone())),
            Arc::new(CatalogRepository::new(pool)),
        )
    }

    /// Application state backed by a shared in-memory store.
    #[must_use]
    pub fn in_memory(config: StorefrontConfig, store: Arc<MemoryStore>) -> Self {
        Self::new(config, Arc::clone(&store) as Arc<dyn OrderStore>, store)
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Order workflow.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// Products and shopkeepers.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Product chat rooms.
    #[must_use]
    pub fn chat(&self) -> &ChatRooms {
        &self.inner.chat
    }
}

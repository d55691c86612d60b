//! The fetched product page and refresh-after-mutation.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::domain::{CollectionPage, ProductId, Session};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{error::ConsoleError, CatalogApi};

#[derive(Debug, Clone, Error)]
pub enum RemoveError {
    #[error("delete failed: {0}")]
    Delete(ConsoleError),
    #[error("refresh after delete failed: {0}")]
    Refresh(ConsoleError),
}

impl RemoveError {
    pub fn into_inner(self) -> ConsoleError {
        match self {
            Self::Delete(err) | Self::Refresh(err) => err,
        }
    }
}

#[derive(Default)]
struct ListState {
    page: CollectionPage,
    loaded: bool,
    applied_ticket: u64,
}

pub struct ListController {
    api: Arc<dyn CatalogApi>,
    state: Mutex<ListState>,
    tickets: AtomicU64,
}

impl ListController {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            state: Mutex::new(ListState::default()),
            tickets: AtomicU64::new(0),
        }
    }

    pub async fn snapshot(&self) -> CollectionPage {
        self.state.lock().await.page.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.loaded
    }

    /// Page used by refreshes; 1 until something has been fetched.
    pub async fn current_page(&self) -> u32 {
        let guard = self.state.lock().await;
        if guard.loaded {
            guard.page.pagination.current_page.max(1)
        } else {
            1
        }
    }

    /// Fetches `page` and replaces the whole collection on success. A failed
    /// fetch leaves the previous collection untouched. When two fetches race,
    /// the one requested last wins.
    pub async fn fetch(&self, session: &Session, page: u32) -> Result<CollectionPage, ConsoleError> {
        let page = page.max(1);
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let mut fetched = self.api.list_products(session, page).await?;
        if fetched.pagination.current_page == 0 {
            fetched.pagination.current_page = page;
        }

        let mut guard = self.state.lock().await;
        if ticket > guard.applied_ticket {
            guard.page = fetched.clone();
            guard.loaded = true;
            guard.applied_ticket = ticket;
            info!(
                page = fetched.pagination.current_page,
                total_pages = fetched.pagination.total_pages,
                products = fetched.products.len(),
                "product page loaded"
            );
        } else {
            debug!(page, ticket, "discarding stale product page");
        }
        Ok(fetched)
    }

    /// Deletes `id`, then re-fetches the current page. If that page no longer
    /// exists the last remaining page is fetched instead.
    pub async fn remove(
        &self,
        session: &Session,
        id: &ProductId,
    ) -> Result<CollectionPage, RemoveError> {
        self.api
            .delete_product(session, id)
            .await
            .map_err(RemoveError::Delete)?;
        info!(product_id = %id, "product deleted");

        let page = self.current_page().await;
        let refreshed = self
            .fetch(session, page)
            .await
            .map_err(RemoveError::Refresh)?;

        let total_pages = refreshed.pagination.total_pages;
        if refreshed.products.is_empty() && page > 1 && total_pages < page {
            let last = total_pages.max(1);
            debug!(page, last, "current page vanished after delete");
            return self.fetch(session, last).await.map_err(RemoveError::Refresh);
        }
        Ok(refreshed)
    }

    /// Page after the current one, or `None` on the last page.
    pub async fn next_target(&self) -> Option<u32> {
        let pagination = self.state.lock().await.page.pagination.clone();
        pagination
            .has_next
            .then(|| pagination.current_page.max(1).saturating_add(1))
    }

    /// Page before the current one, or `None` on the first page.
    pub async fn previous_target(&self) -> Option<u32> {
        let pagination = self.state.lock().await.page.pagination.clone();
        (pagination.has_previous && pagination.current_page > 1)
            .then(|| pagination.current_page - 1)
    }
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;

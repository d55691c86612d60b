//! In-memory `CatalogApi` used by the unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex as StdMutex,
    },
};

use async_trait::async_trait;
use shared::domain::{CollectionPage, Credentials, Pagination, Product, ProductId, Session};
use tokio::sync::{oneshot, Mutex};

use crate::{AssetUpload, CatalogApi, ConsoleError};

pub const VALID_TOKEN: &str = "valid-token";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SignIn(String),
    Verify,
    List(u32),
    Create(Product),
    Update(ProductId, Product),
    Delete(ProductId),
    Upload(String),
    EndSession,
}

pub struct FakeCatalog {
    products: StdMutex<Vec<Product>>,
    calls: StdMutex<Vec<Call>>,
    failures: StdMutex<HashMap<&'static str, ConsoleError>>,
    create_gate: Mutex<Option<oneshot::Receiver<()>>>,
    list_gate: Mutex<Option<oneshot::Receiver<()>>>,
    page_size: usize,
    next_id: AtomicU64,
}

impl FakeCatalog {
    pub fn new(page_size: usize) -> Self {
        Self {
            products: StdMutex::new(Vec::new()),
            calls: StdMutex::new(Vec::new()),
            failures: StdMutex::new(HashMap::new()),
            create_gate: Mutex::new(None),
            list_gate: Mutex::new(None),
            page_size,
            next_id: AtomicU64::new(100),
        }
    }

    pub fn with_products(self, count: usize) -> Self {
        {
            let mut products = self.products.lock().expect("products");
            for i in 0..count {
                products.push(Product {
                    id: Some(ProductId(format!("p{i}"))),
                    title: format!("Product {i}"),
                    ..Product::empty_template()
                });
            }
        }
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("calls").clear();
    }

    pub fn list_calls(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::List(page) => Some(page),
                _ => None,
            })
            .collect()
    }

    pub fn create_calls(&self) -> Vec<Product> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Create(product) => Some(product),
                _ => None,
            })
            .collect()
    }

    /// Makes every call of `operation` fail with `err` until cleared.
    pub fn fail(&self, operation: &'static str, err: ConsoleError) {
        self.failures
            .lock()
            .expect("failures")
            .insert(operation, err);
    }

    pub fn clear_failure(&self, operation: &'static str) {
        self.failures.lock().expect("failures").remove(operation);
    }

    /// Holds the next `create_product` call until the returned sender fires.
    pub async fn hold_next_create(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.create_gate.lock().await = Some(rx);
        tx
    }

    /// Holds the next `list_products` call until the returned sender fires.
    pub async fn hold_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.list_gate.lock().await = Some(rx);
        tx
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls").push(call);
    }

    fn check(&self, operation: &'static str, session: &Session) -> Result<(), ConsoleError> {
        if let Some(err) = self.failures.lock().expect("failures").get(operation) {
            return Err(err.clone());
        }
        if session.token != VALID_TOKEN {
            return Err(ConsoleError::SessionInvalid("token rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, ConsoleError> {
        self.record(Call::SignIn(credentials.username.clone()));
        if credentials.password != "secret" {
            return Err(ConsoleError::SessionInvalid("bad credentials".to_string()));
        }
        Ok(Session::new(VALID_TOKEN))
    }

    async fn verify_session(&self, session: &Session) -> Result<(), ConsoleError> {
        self.record(Call::Verify);
        self.check("verify", session)
    }

    async fn list_products(
        &self,
        session: &Session,
        page: u32,
    ) -> Result<CollectionPage, ConsoleError> {
        // Taken before recording so an observed call already owns the gate.
        let gate = self.list_gate.lock().await.take();
        self.record(Call::List(page));
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.check("list", session)?;
        let products = self.products.lock().expect("products").clone();
        let total_pages = products.len().div_ceil(self.page_size).max(1) as u32;
        let start = (page as usize - 1) * self.page_size;
        let items = products
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect::<Vec<_>>();
        Ok(CollectionPage {
            products: items,
            pagination: Pagination {
                current_page: page,
                total_pages,
                has_previous: page > 1,
                has_next: page < total_pages,
                ..Pagination::default()
            },
        })
    }

    async fn create_product(
        &self,
        session: &Session,
        payload: &Product,
    ) -> Result<Product, ConsoleError> {
        self.record(Call::Create(payload.clone()));
        let gate = self.create_gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.check("create", session)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = Product {
            id: Some(ProductId(format!("p{id}"))),
            ..payload.clone()
        };
        self.products
            .lock()
            .expect("products")
            .push(created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        session: &Session,
        id: &ProductId,
        payload: &Product,
    ) -> Result<Product, ConsoleError> {
        self.record(Call::Update(id.clone(), payload.clone()));
        self.check("update", session)?;
        let mut products = self.products.lock().expect("products");
        let slot = products
            .iter_mut()
            .find(|product| product.id.as_ref() == Some(id))
            .ok_or_else(|| ConsoleError::NotFound(format!("product {id}")))?;
        *slot = payload.clone();
        Ok(payload.clone())
    }

    async fn delete_product(&self, session: &Session, id: &ProductId) -> Result<(), ConsoleError> {
        self.record(Call::Delete(id.clone()));
        self.check("delete", session)?;
        let mut products = self.products.lock().expect("products");
        let before = products.len();
        products.retain(|product| product.id.as_ref() != Some(id));
        if products.len() == before {
            return Err(ConsoleError::NotFound(format!("product {id}")));
        }
        Ok(())
    }

    async fn upload_asset(
        &self,
        session: &Session,
        asset: &AssetUpload,
    ) -> Result<String, ConsoleError> {
        self.record(Call::Upload(asset.filename.clone()));
        self.check("upload", session)?;
        Ok(format!("https://cdn.test/{}", asset.filename))
    }

    async fn end_session(&self, session: &Session) -> Result<(), ConsoleError> {
        self.record(Call::EndSession);
        self.check("end_session", session)
    }
}

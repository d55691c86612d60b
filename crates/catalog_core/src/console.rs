//! The product console: binds the draft, the two dialogs and the product list
//! to the user-facing operations.
//!
//! Collaborator failures stop here. Each one is published as a
//! [`ConsoleEvent::Failed`] and handed back to the caller; session failures
//! additionally drop the credential and publish
//! [`ConsoleEvent::RedirectToSignIn`]. No lock is held across a call to the
//! API, so the draft stays editable while a request is pending.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::Utc;
use shared::domain::{CollectionPage, Credentials, Product, ProductId, Session};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{
    dialog::{DialogKind, DialogNotice, DialogState, DialogSurface, ModalLifecycleController},
    draft::{self, DraftStore, InputKind},
    error::{ConsoleError, ErrorCategory, Operation},
    list::{ListController, RemoveError},
    AssetUpload, CatalogApi,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Unset,
    Create,
    Edit,
}

#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    Notice {
        operation: Operation,
        message: String,
    },
    Failed {
        operation: Operation,
        category: ErrorCategory,
        message: String,
    },
    Loading(bool),
    ListUpdated(CollectionPage),
    DialogOpened(DialogKind),
    DialogClosed(DialogKind),
    DialogDismissed(DialogKind),
    RedirectToSignIn,
}

struct EditorState {
    draft: DraftStore,
    mode: EditorMode,
    /// Bumped on every open; a submit only closes the dialog it started from.
    generation: u64,
    dialog: ModalLifecycleController,
}

struct DetailState {
    product: Option<Product>,
    dialog: ModalLifecycleController,
}

/// Clears the submit flag when the submit finishes, however it finishes.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ProductConsole {
    api: Arc<dyn CatalogApi>,
    session: RwLock<Option<Session>>,
    list: ListController,
    editor: Mutex<EditorState>,
    detail: Mutex<DetailState>,
    submitting: AtomicBool,
    events: broadcast::Sender<ConsoleEvent>,
}

impl ProductConsole {
    pub fn new(api: Arc<dyn CatalogApi>, surface: &dyn DialogSurface) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            list: ListController::new(Arc::clone(&api)),
            api,
            session: RwLock::new(None),
            editor: Mutex::new(EditorState {
                draft: DraftStore::default(),
                mode: EditorMode::Unset,
                generation: 0,
                dialog: ModalLifecycleController::new(DialogKind::Editor, surface),
            }),
            detail: Mutex::new(DetailState {
                product: None,
                dialog: ModalLifecycleController::new(DialogKind::Detail, surface),
            }),
            submitting: AtomicBool::new(false),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ConsoleEvent) {
        let _ = self.events.send(event);
    }

    fn notice(&self, operation: Operation, message: impl Into<String>) {
        self.emit(ConsoleEvent::Notice {
            operation,
            message: message.into(),
        });
    }

    // ---- session -------------------------------------------------------

    pub async fn install_session(&self, session: Session) {
        *self.session.write().await = Some(session);
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    async fn require_session(&self) -> Result<Session, ConsoleError> {
        let session = self.session.read().await.clone();
        match session {
            None => Err(ConsoleError::not_signed_in()),
            Some(session) if session.is_expired(Utc::now()) => {
                Err(ConsoleError::SessionInvalid("session expired".to_string()))
            }
            Some(session) => Ok(session),
        }
    }

    async fn redirect_to_sign_in(&self) {
        let had_session = self.session.write().await.take().is_some();
        if had_session {
            info!("credential cleared");
        }
        self.emit(ConsoleEvent::RedirectToSignIn);
    }

    async fn report(&self, operation: Operation, err: &ConsoleError) {
        warn!(operation = operation.label(), error = %err, "operation failed");
        self.emit(ConsoleEvent::Failed {
            operation,
            category: err.category(),
            message: err.to_string(),
        });
        if err.requires_reauth() {
            self.redirect_to_sign_in().await;
        }
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Session, ConsoleError> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.api.sign_in(&credentials).await {
            Ok(session) => {
                self.install_session(session.clone()).await;
                info!(username, "signed in");
                self.notice(Operation::SignIn, "signed in");
                Ok(session)
            }
            Err(err) => {
                warn!(username, error = %err, "sign-in rejected");
                self.emit(ConsoleEvent::Failed {
                    operation: Operation::SignIn,
                    category: err.category(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Entry sequence for the product page: verify the stored credential, then
    /// load the first page.
    pub async fn start(&self) -> Result<CollectionPage, ConsoleError> {
        self.check_session().await?;
        self.load_page(1).await
    }

    pub async fn check_session(&self) -> Result<(), ConsoleError> {
        self.emit(ConsoleEvent::Loading(true));
        let result = match self.require_session().await {
            Ok(session) => self.api.verify_session(&session).await,
            Err(err) => Err(err),
        };
        self.emit(ConsoleEvent::Loading(false));
        match result {
            Ok(()) => {
                self.notice(Operation::VerifySession, "session is valid");
                Ok(())
            }
            Err(err) => {
                // Any failed verification means the credential cannot be trusted.
                let err = if err.requires_reauth() || matches!(err, ConsoleError::Transport(_)) {
                    err
                } else {
                    ConsoleError::SessionInvalid(err.to_string())
                };
                self.report(Operation::VerifySession, &err).await;
                Err(err)
            }
        }
    }

    /// Ends the remote session on a best-effort basis; the local credential is
    /// dropped either way.
    pub async fn sign_out(&self) {
        let session = self.session.write().await.take();
        if let Some(session) = session {
            if let Err(err) = self.api.end_session(&session).await {
                warn!(error = %err, "remote sign-out failed; local credential cleared anyway");
            }
        }
        self.close_editor().await;
        self.close_detail().await;
        self.notice(Operation::SignOut, "signed out");
        self.emit(ConsoleEvent::RedirectToSignIn);
    }

    // ---- list ----------------------------------------------------------

    /// Any list failure is treated as an unusable session.
    async fn load_page(&self, page: u32) -> Result<CollectionPage, ConsoleError> {
        let session = match self.require_session().await {
            Ok(session) => session,
            Err(err) => {
                self.report(Operation::ListProducts, &err).await;
                return Err(err);
            }
        };
        self.emit(ConsoleEvent::Loading(true));
        let result = self.list.fetch(&session, page).await;
        self.emit(ConsoleEvent::Loading(false));
        self.after_list_result(result).await
    }

    async fn after_list_result(
        &self,
        result: Result<CollectionPage, ConsoleError>,
    ) -> Result<CollectionPage, ConsoleError> {
        match result {
            Ok(page) => {
                self.emit(ConsoleEvent::ListUpdated(page.clone()));
                Ok(page)
            }
            Err(err) => {
                self.report(Operation::ListProducts, &err).await;
                if !err.requires_reauth() {
                    self.redirect_to_sign_in().await;
                }
                Err(err)
            }
        }
    }

    pub async fn refresh(&self) -> Result<CollectionPage, ConsoleError> {
        let page = self.list.current_page().await;
        self.load_page(page).await
    }

    pub async fn go_to_page(&self, page: u32) -> Result<CollectionPage, ConsoleError> {
        self.load_page(page).await
    }

    /// Returns `Ok(None)` at the last page.
    pub async fn next_page(&self) -> Result<Option<CollectionPage>, ConsoleError> {
        match self.list.next_target().await {
            Some(page) => self.load_page(page).await.map(Some),
            None => Ok(None),
        }
    }

    /// Returns `Ok(None)` at the first page.
    pub async fn previous_page(&self) -> Result<Option<CollectionPage>, ConsoleError> {
        match self.list.previous_target().await {
            Some(page) => self.load_page(page).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn products(&self) -> CollectionPage {
        self.list.snapshot().await
    }

    pub async fn find_product(&self, id: &ProductId) -> Option<Product> {
        self.list.snapshot().await.find(id).cloned()
    }

    pub async fn delete(&self, id: &ProductId) -> Result<CollectionPage, ConsoleError> {
        let session = match self.require_session().await {
            Ok(session) => session,
            Err(err) => {
                self.report(Operation::DeleteProduct, &err).await;
                return Err(err);
            }
        };
        match self.list.remove(&session, id).await {
            Ok(page) => {
                self.notice(Operation::DeleteProduct, format!("deleted product {id}"));
                self.emit(ConsoleEvent::ListUpdated(page.clone()));
                Ok(page)
            }
            Err(RemoveError::Delete(err)) => {
                self.report(Operation::DeleteProduct, &err).await;
                Err(err)
            }
            Err(RemoveError::Refresh(err)) => {
                self.notice(Operation::DeleteProduct, format!("deleted product {id}"));
                self.after_list_result(Err(err)).await
            }
        }
    }

    // ---- dialogs -------------------------------------------------------

    pub async fn open_for_create(&self) {
        let mut editor = self.editor.lock().await;
        editor.draft.reset(Product::empty_template());
        editor.mode = EditorMode::Create;
        editor.generation += 1;
        if editor.dialog.request_open() {
            self.emit(ConsoleEvent::DialogOpened(DialogKind::Editor));
        }
    }

    pub async fn open_for_edit(&self, product: Product) {
        let mut editor = self.editor.lock().await;
        debug!(product_id = ?product.id, "editing product");
        editor.draft.reset(product);
        editor.mode = EditorMode::Edit;
        editor.generation += 1;
        if editor.dialog.request_open() {
            self.emit(ConsoleEvent::DialogOpened(DialogKind::Editor));
        }
    }

    pub async fn open_detail(&self, product: Product) {
        let mut detail = self.detail.lock().await;
        detail.product = Some(product);
        if detail.dialog.request_open() {
            self.emit(ConsoleEvent::DialogOpened(DialogKind::Detail));
        }
    }

    pub async fn close_editor(&self) {
        if self.editor.lock().await.dialog.request_close() {
            self.emit(ConsoleEvent::DialogClosed(DialogKind::Editor));
        }
    }

    /// Closes the editor only if it has not been reopened since `generation`.
    async fn close_editor_from(&self, generation: u64) {
        let mut editor = self.editor.lock().await;
        if editor.generation != generation {
            debug!(
                started = generation,
                current = editor.generation,
                "editor reopened during submit; leaving it open"
            );
            return;
        }
        if editor.dialog.request_close() {
            self.emit(ConsoleEvent::DialogClosed(DialogKind::Editor));
        }
    }

    pub async fn close_detail(&self) {
        if self.detail.lock().await.dialog.request_close() {
            self.emit(ConsoleEvent::DialogClosed(DialogKind::Detail));
        }
    }

    pub async fn editor_state(&self) -> DialogState {
        self.editor.lock().await.dialog.state()
    }

    pub async fn detail_state(&self) -> DialogState {
        self.detail.lock().await.dialog.state()
    }

    pub async fn editor_mode(&self) -> EditorMode {
        self.editor.lock().await.mode
    }

    pub async fn detail_product(&self) -> Option<Product> {
        self.detail.lock().await.product.clone()
    }

    /// Processes widget-originated dismissals for both dialogs.
    pub async fn pump_dialogs(&self) -> Vec<DialogNotice> {
        let mut notices = self.editor.lock().await.dialog.drain_signals();
        notices.extend(self.detail.lock().await.dialog.drain_signals());
        for notice in &notices {
            let DialogNotice::Dismissed(kind) = *notice;
            self.emit(ConsoleEvent::DialogDismissed(kind));
        }
        notices
    }

    /// Permanently tears down both dialogs.
    pub async fn dispose(&self) {
        self.editor.lock().await.dialog.dispose();
        self.detail.lock().await.dialog.dispose();
    }

    // ---- draft ---------------------------------------------------------

    pub async fn draft(&self) -> Product {
        self.editor.lock().await.draft.snapshot()
    }

    pub async fn can_append_image(&self) -> bool {
        draft::can_append_image(self.editor.lock().await.draft.current())
    }

    pub async fn set_field(
        &self,
        name: &str,
        raw: &str,
        kind: InputKind,
    ) -> Result<Product, ConsoleError> {
        let result = self
            .editor
            .lock()
            .await
            .draft
            .set_field(name, raw, kind)
            .map(Product::clone);
        result.map_err(|err| {
            let err = ConsoleError::from(err);
            self.emit(ConsoleEvent::Failed {
                operation: Operation::EditDraft,
                category: err.category(),
                message: err.to_string(),
            });
            err
        })
    }

    pub async fn set_image_at(&self, index: usize, value: &str) -> Product {
        self.editor
            .lock()
            .await
            .draft
            .set_image_at(index, value)
            .clone()
    }

    pub async fn append_image(&self) -> Product {
        self.editor.lock().await.draft.append_image().clone()
    }

    pub async fn remove_last_image(&self) -> Product {
        self.editor.lock().await.draft.remove_last_image().clone()
    }

    // ---- mutations -----------------------------------------------------

    /// Creates or updates the draft depending on the editor mode. While one
    /// submit is pending further submits are refused.
    pub async fn submit(&self) -> Result<Product, ConsoleError> {
        let Some(_in_flight) = InFlight::acquire(&self.submitting) else {
            debug!("submit ignored; previous submit still pending");
            return Err(ConsoleError::SubmitInFlight);
        };

        let (mode, draft, generation) = {
            let editor = self.editor.lock().await;
            (editor.mode, editor.draft.snapshot(), editor.generation)
        };
        let operation = match mode {
            EditorMode::Edit => Operation::UpdateProduct,
            EditorMode::Create | EditorMode::Unset => Operation::CreateProduct,
        };

        let result = match self.require_session().await {
            Err(err) => Err(err),
            Ok(session) => match (mode, draft.id.as_ref()) {
                (EditorMode::Create, _) => {
                    self.api
                        .create_product(&session, &draft.without_id())
                        .await
                }
                (EditorMode::Edit, Some(id)) => {
                    self.api.update_product(&session, id, &draft).await
                }
                (EditorMode::Edit, None) => Err(ConsoleError::Validation(
                    "product under edit has no id".to_string(),
                )),
                (EditorMode::Unset, _) => Err(ConsoleError::Validation(
                    "nothing is being edited".to_string(),
                )),
            },
        };

        match result {
            Ok(saved) => {
                info!(operation = operation.label(), product_id = ?saved.id, "product saved");
                self.close_editor_from(generation).await;
                let message = match mode {
                    EditorMode::Edit => "product updated",
                    _ => "product created",
                };
                self.notice(operation, message);
                let _ = self.refresh().await;
                Ok(saved)
            }
            Err(err) => {
                self.report(operation, &err).await;
                Err(err)
            }
        }
    }

    /// Uploads an image and points the draft's main image at it. Size and type
    /// are checked locally first.
    pub async fn upload_image(&self, asset: AssetUpload) -> Result<String, ConsoleError> {
        if let Err(err) = asset.validate() {
            self.report(Operation::UploadAsset, &err).await;
            return Err(err);
        }
        let result = match self.require_session().await {
            Ok(session) => self.api.upload_asset(&session, &asset).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(url) => {
                // The main image field accepts any text, so this cannot fail.
                let _ = self
                    .editor
                    .lock()
                    .await
                    .draft
                    .set_field("imageUrl", &url, InputKind::Text);
                info!(filename = %asset.filename, size = asset.size(), "asset uploaded");
                self.notice(Operation::UploadAsset, "image uploaded");
                Ok(url)
            }
            Err(err) => {
                self.report(Operation::UploadAsset, &err).await;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/console_tests.rs"]
mod tests;

//! Text rendering and the terminal stand-in for dialog windows.

use std::{
    collections::HashMap,
    fmt::Write as _,
    sync::{Arc, Mutex},
};

use catalog_core::{ConsoleEvent, DialogKind, DialogSurface, DialogWidget, WidgetEvents};
use shared::domain::{CollectionPage, Product};

/// Mounts one [`TerminalWidget`] per dialog and keeps their event handles so
/// the shell can simulate the user closing a window.
#[derive(Clone, Default)]
pub struct TerminalSurface {
    handles: Arc<Mutex<HashMap<DialogKind, WidgetEvents>>>,
}

impl TerminalSurface {
    /// Acts like the window's own close button. Returns false when no widget
    /// is mounted for `kind` or its controller is gone.
    pub fn dismiss(&self, kind: DialogKind) -> bool {
        let Ok(handles) = self.handles.lock() else {
            return false;
        };
        handles.get(&kind).is_some_and(WidgetEvents::hidden)
    }
}

impl DialogSurface for TerminalSurface {
    fn mount(&self, kind: DialogKind, events: WidgetEvents) -> Option<Box<dyn DialogWidget>> {
        let mut handles = self.handles.lock().ok()?;
        handles.insert(kind, events.clone());
        Some(Box::new(TerminalWidget { kind, events }))
    }
}

pub struct TerminalWidget {
    kind: DialogKind,
    events: WidgetEvents,
}

impl DialogWidget for TerminalWidget {
    fn show(&mut self) {
        println!("┌─ {} window", self.kind.label());
        self.events.shown();
    }

    fn hide(&mut self) {
        println!("└─ {} window closed", self.kind.label());
        self.events.hidden();
    }
}

pub fn render_event(event: &ConsoleEvent) -> Option<String> {
    match event {
        ConsoleEvent::Notice { message, .. } => Some(format!("✔ {message}")),
        ConsoleEvent::Failed {
            operation,
            category,
            message,
        } => Some(format!(
            "✘ {} failed ({category:?}): {message}",
            operation.label()
        )),
        ConsoleEvent::Loading(true) => Some("… loading".to_string()),
        ConsoleEvent::Loading(false) => None,
        ConsoleEvent::ListUpdated(page) => Some(render_page(page)),
        ConsoleEvent::DialogOpened(_) | ConsoleEvent::DialogClosed(_) => None,
        ConsoleEvent::DialogDismissed(kind) => Some(format!("{} window dismissed", kind.label())),
        ConsoleEvent::RedirectToSignIn => {
            Some("session ended; sign in with: signin <username> <password>".to_string())
        }
    }
}

pub fn render_page(page: &CollectionPage) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "page {}/{} ({} products)",
        page.pagination.current_page,
        page.pagination.total_pages,
        page.products.len()
    );
    for product in &page.products {
        let id = product.id.as_ref().map(|id| id.as_str()).unwrap_or("-");
        let _ = writeln!(
            out,
            "  {id:<24} {:<20} {:>8} / {:<8} {}",
            product.title,
            product.origin_price,
            product.price,
            if product.is_enabled.is_enabled() {
                "enabled"
            } else {
                "disabled"
            }
        );
    }
    out.trim_end().to_string()
}

pub fn render_product(product: &Product) -> String {
    let mut out = String::new();
    if let Some(id) = &product.id {
        let _ = writeln!(out, "id           {id}");
    }
    let _ = writeln!(out, "title        {}", product.title);
    let _ = writeln!(out, "category     {}", product.category);
    let _ = writeln!(out, "unit         {}", product.unit);
    let _ = writeln!(out, "origin_price {}", product.origin_price);
    let _ = writeln!(out, "price        {}", product.price);
    let _ = writeln!(out, "trending     {}", product.trending);
    let _ = writeln!(out, "is_enabled   {}", product.is_enabled.as_int());
    let _ = writeln!(out, "description  {}", product.description);
    let _ = writeln!(out, "content      {}", product.content);
    let _ = writeln!(out, "imageUrl     {}", product.image_url);
    for (index, url) in product.images_url.iter().enumerate() {
        let _ = writeln!(out, "imagesUrl[{index}] {url}");
    }
    out.trim_end().to_string()
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;

//! Keeps a declarative "dialog open" intent in step with an imperative,
//! event-driven dialog widget.
//!
//! The controller is the single owner of the intent. The widget is mounted
//! once per controller and reports its own visibility changes through a
//! queued [`WidgetEvents`] channel, so a signal is never delivered while the
//! `request_open`/`request_close` call that caused it is still on the stack.
//! A `Hidden` signal only becomes a [`DialogNotice::Dismissed`] when the
//! intent is still `Open`; hides caused by `request_close` are swallowed.

use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    Editor,
    Detail,
}

impl DialogKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Detail => "detail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Closed,
    Open,
}

/// Visibility changes reported by a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetSignal {
    Shown,
    Hidden,
}

/// Emitted to the owner when the widget closed itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogNotice {
    Dismissed(DialogKind),
}

/// Event subscription handed to a widget when it is mounted.
#[derive(Debug, Clone)]
pub struct WidgetEvents {
    tx: mpsc::UnboundedSender<WidgetSignal>,
}

impl WidgetEvents {
    /// Returns `false` once the controller has been disposed.
    pub fn shown(&self) -> bool {
        self.tx.send(WidgetSignal::Shown).is_ok()
    }

    /// Returns `false` once the controller has been disposed.
    pub fn hidden(&self) -> bool {
        self.tx.send(WidgetSignal::Hidden).is_ok()
    }
}

pub trait DialogWidget: Send {
    fn show(&mut self);
    fn hide(&mut self);
    fn dispose(&mut self) {}
}

/// Where dialog widgets get mounted. Returning `None` means the surface has
/// nowhere to put the dialog; the controller then runs degraded.
pub trait DialogSurface {
    fn mount(&self, kind: DialogKind, events: WidgetEvents) -> Option<Box<dyn DialogWidget>>;
}

/// A surface that never mounts anything.
pub struct HeadlessSurface;

impl DialogSurface for HeadlessSurface {
    fn mount(&self, _kind: DialogKind, _events: WidgetEvents) -> Option<Box<dyn DialogWidget>> {
        None
    }
}

pub struct ModalLifecycleController {
    kind: DialogKind,
    intent: DialogState,
    widget: Option<Box<dyn DialogWidget>>,
    signals: Option<mpsc::UnboundedReceiver<WidgetSignal>>,
    pending: Vec<DialogNotice>,
    disposed: bool,
}

impl ModalLifecycleController {
    pub fn new(kind: DialogKind, surface: &dyn DialogSurface) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let widget = surface.mount(kind, WidgetEvents { tx });
        if widget.is_none() {
            warn!(
                dialog = kind.label(),
                "dialog widget unavailable; show/hide will be ignored"
            );
        }
        Self {
            kind,
            intent: DialogState::Closed,
            widget,
            signals: Some(rx),
            pending: Vec::new(),
            disposed: false,
        }
    }

    pub fn state(&self) -> DialogState {
        self.intent
    }

    pub fn is_open(&self) -> bool {
        self.intent == DialogState::Open
    }

    pub fn is_degraded(&self) -> bool {
        self.widget.is_none() && !self.disposed
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Returns whether the intent changed.
    pub fn request_open(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.absorb_signals();
        if self.intent == DialogState::Open {
            return false;
        }
        self.intent = DialogState::Open;
        debug!(dialog = self.kind.label(), "dialog open requested");
        if let Some(widget) = self.widget.as_mut() {
            widget.show();
        }
        true
    }

    /// Returns whether the intent changed.
    pub fn request_close(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.absorb_signals();
        if self.intent == DialogState::Closed {
            return false;
        }
        self.intent = DialogState::Closed;
        debug!(dialog = self.kind.label(), "dialog close requested");
        if let Some(widget) = self.widget.as_mut() {
            widget.hide();
        }
        true
    }

    /// Processes queued widget signals and returns the dismissals the owner
    /// has not seen yet.
    pub fn drain_signals(&mut self) -> Vec<DialogNotice> {
        self.absorb_signals();
        std::mem::take(&mut self.pending)
    }

    fn absorb_signals(&mut self) {
        let Some(signals) = self.signals.as_mut() else {
            return;
        };
        while let Ok(signal) = signals.try_recv() {
            match signal {
                WidgetSignal::Hidden if self.intent == DialogState::Open => {
                    self.intent = DialogState::Closed;
                    debug!(dialog = self.kind.label(), "dialog dismissed by widget");
                    self.pending.push(DialogNotice::Dismissed(self.kind));
                }
                WidgetSignal::Hidden | WidgetSignal::Shown => {}
            }
        }
    }

    /// Releases the widget and its event subscription. Runs at most once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.intent = DialogState::Closed;
        self.pending.clear();
        if let Some(mut widget) = self.widget.take() {
            widget.dispose();
        }
        if let Some(mut signals) = self.signals.take() {
            signals.close();
        }
        debug!(dialog = self.kind.label(), "dialog disposed");
    }
}

impl Drop for ModalLifecycleController {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[path = "tests/dialog_tests.rs"]
mod tests;

use super::*;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct WidgetLog {
    calls: Arc<Mutex<Vec<&'static str>>>,
    events: Arc<Mutex<Option<WidgetEvents>>>,
}

impl WidgetLog {
    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls").clone()
    }

    fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    /// Simulates the user closing the dialog from the widget itself.
    fn user_dismisses(&self) -> bool {
        self.events
            .lock()
            .expect("events")
            .as_ref()
            .map(WidgetEvents::hidden)
            .unwrap_or(false)
    }
}

/// Behaves like a real dialog: reports `Hidden` after every hide, including
/// the ones the controller asked for.
struct EchoingWidget {
    log: WidgetLog,
    events: WidgetEvents,
}

impl DialogWidget for EchoingWidget {
    fn show(&mut self) {
        self.log.calls.lock().expect("calls").push("show");
        self.events.shown();
    }

    fn hide(&mut self) {
        self.log.calls.lock().expect("calls").push("hide");
        self.events.hidden();
    }

    fn dispose(&mut self) {
        self.log.calls.lock().expect("calls").push("dispose");
    }
}

struct TestSurface {
    log: WidgetLog,
    available: bool,
}

impl DialogSurface for TestSurface {
    fn mount(&self, _kind: DialogKind, events: WidgetEvents) -> Option<Box<dyn DialogWidget>> {
        *self.log.events.lock().expect("events") = Some(events.clone());
        if !self.available {
            return None;
        }
        self.log.calls.lock().expect("calls").push("mount");
        Some(Box::new(EchoingWidget {
            log: self.log.clone(),
            events,
        }))
    }
}

fn controller() -> (ModalLifecycleController, WidgetLog) {
    let log = WidgetLog::default();
    let surface = TestSurface {
        log: log.clone(),
        available: true,
    };
    (
        ModalLifecycleController::new(DialogKind::Editor, &surface),
        log,
    )
}

#[test]
fn starts_closed_and_mounts_once() {
    let (dialog, log) = controller();
    assert_eq!(dialog.state(), DialogState::Closed);
    assert_eq!(log.calls(), vec!["mount"]);
}

#[test]
fn open_and_close_are_idempotent() {
    let (mut dialog, log) = controller();
    assert!(dialog.request_open());
    assert!(!dialog.request_open());
    assert!(dialog.request_close());
    assert!(!dialog.request_close());
    assert_eq!(log.count("show"), 1);
    assert_eq!(log.count("hide"), 1);
}

#[test]
fn widget_dismissal_yields_exactly_one_notice_and_reopens_cleanly() {
    let (mut dialog, log) = controller();
    dialog.request_open();
    dialog.drain_signals();

    assert!(log.user_dismisses());
    assert_eq!(
        dialog.drain_signals(),
        vec![DialogNotice::Dismissed(DialogKind::Editor)]
    );
    assert_eq!(dialog.state(), DialogState::Closed);
    assert!(dialog.drain_signals().is_empty());

    assert!(dialog.request_open());
    assert!(dialog.is_open());
    assert_eq!(log.count("show"), 2);
}

#[test]
fn repeated_hidden_signals_collapse_into_one_notice() {
    let (mut dialog, log) = controller();
    dialog.request_open();
    log.user_dismisses();
    log.user_dismisses();
    assert_eq!(dialog.drain_signals().len(), 1);
}

#[test]
fn programmatic_close_does_not_echo_a_dismissal() {
    let (mut dialog, log) = controller();
    dialog.request_open();
    dialog.request_close();
    assert!(dialog.drain_signals().is_empty());
    assert_eq!(log.count("hide"), 1);
}

#[test]
fn stale_hidden_signal_does_not_close_a_reopened_dialog() {
    let (mut dialog, _log) = controller();
    dialog.request_open();
    dialog.request_close();
    // The echo of the close above is still queued when the dialog reopens.
    dialog.request_open();
    assert!(dialog.drain_signals().is_empty());
    assert!(dialog.is_open());
}

#[test]
fn dismissal_before_programmatic_close_is_reported_once() {
    let (mut dialog, log) = controller();
    dialog.request_open();
    log.user_dismisses();
    // Owner has not drained yet and asks to close; the widget already closed.
    assert!(!dialog.request_close());
    assert_eq!(dialog.drain_signals().len(), 1);
    assert_eq!(log.count("hide"), 0);
}

#[test]
fn dispose_runs_once_and_detaches_events() {
    let (mut dialog, log) = controller();
    dialog.request_open();
    dialog.dispose();
    dialog.dispose();
    drop(dialog);

    assert_eq!(log.count("dispose"), 1);
    assert!(!log.user_dismisses());
}

#[test]
fn calls_after_dispose_are_ignored() {
    let (mut dialog, log) = controller();
    dialog.dispose();
    assert!(!dialog.request_open());
    assert!(!dialog.request_close());
    assert!(dialog.drain_signals().is_empty());
    assert_eq!(log.count("show"), 0);
    assert!(dialog.is_disposed());
}

#[test]
fn drop_disposes_widget() {
    let (dialog, log) = controller();
    drop(dialog);
    assert_eq!(log.count("dispose"), 1);
}

#[test]
fn missing_surface_degrades_silently() {
    let log = WidgetLog::default();
    let surface = TestSurface {
        log: log.clone(),
        available: false,
    };
    let mut dialog = ModalLifecycleController::new(DialogKind::Detail, &surface);
    assert!(dialog.is_degraded());
    assert!(dialog.request_open());
    assert!(dialog.is_open());
    assert!(dialog.request_close());
    assert!(log.calls().is_empty());
}

#[test]
fn headless_surface_mounts_nothing() {
    let mut dialog = ModalLifecycleController::new(DialogKind::Detail, &HeadlessSurface);
    assert!(dialog.is_degraded());
    dialog.request_open();
    assert!(dialog.drain_signals().is_empty());
}

//! Client-side driver for the access gate.
//!
//! A `Guard` wraps one protected view. It re-evaluates the gate whenever the session
//! changes and turns `DenyRedirect` decisions into a single `Navigator::replace` call
//! per transition into the denied state.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};

use crate::gate::{Decision, Fallback, Gate, GateRequest, Session};

/// Navigator
///
/// The router the guarded view lives in.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn replace(&self, path: &str);
}

impl<N: Navigator + ?Sized> Navigator for Arc<N> {
    fn current_path(&self) -> String {
        (**self).current_path()
    }

    fn replace(&self, path: &str) {
        (**self).replace(path)
    }
}

/// View
///
/// What the guarded subtree renders after an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Loading,
    Children,
    Fallback(Fallback),
    /// Nothing is rendered while a redirect is in flight (or was suppressed).
    Nothing,
}

pub struct Guard<N> {
    gate: Gate,
    request: GateRequest,
    navigator: N,
    // (from, to) of the last redirect actually issued. A suppressed redirect records nothing.
    redirected: Option<(String, String)>,
}

impl<N: Navigator> Guard<N> {
    pub fn new(gate: Gate, request: GateRequest, navigator: N) -> Self {
        Self {
            gate,
            request,
            navigator,
            redirected: None,
        }
    }

    /// update
    ///
    /// Evaluates the gate for `session` at the navigator's current path and performs the
    /// redirect side effect if this is a fresh transition into a denied state.
    pub fn update(&mut self, session: &Session) -> View {
        let current_path = self.navigator.current_path();
        match self.gate.evaluate(session, &self.request, &current_path) {
            Decision::Pending => {
                self.redirected = None;
                View::Loading
            }
            Decision::Allow => {
                self.redirected = None;
                View::Children
            }
            Decision::DenyRender { fallback } => {
                self.redirected = None;
                View::Fallback(fallback)
            }
            Decision::DenyRedirect { path } => {
                // Router has not moved yet since our replace: do not navigate twice.
                if let Some((from, to)) = &self.redirected {
                    if *from == current_path && *to == path {
                        return View::Nothing;
                    }
                }
                if current_path == path {
                    tracing::debug!(%path, "redirect suppressed, already on target");
                } else {
                    tracing::info!(from = %current_path, to = %path, "gate redirect");
                    self.navigator.replace(&path);
                    self.redirected = Some((current_path, path));
                }
                View::Nothing
            }
        }
    }
}

/// GuardHandle
///
/// Keeps a spawned guard alive. Dropping it unmounts the view and aborts the task.
pub struct GuardHandle {
    view: watch::Receiver<View>,
    task: JoinHandle<()>,
}

impl GuardHandle {
    pub fn view(&self) -> watch::Receiver<View> {
        self.view.clone()
    }
}

impl Drop for GuardHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// spawn_guard
///
/// Subscribes `guard` to the session provider. The current session is evaluated
/// immediately, then again on every change, until the provider goes away or the
/// returned handle is dropped.
pub fn spawn_guard<N>(mut guard: Guard<N>, mut sessions: watch::Receiver<Session>) -> GuardHandle
where
    N: Navigator + 'static,
{
    let session = sessions.borrow_and_update().clone();
    let initial = guard.update(&session);
    let (view_tx, view_rx) = watch::channel(initial);

    let task = tokio::spawn(async move {
        while sessions.changed().await.is_ok() {
            let session = sessions.borrow_and_update().clone();
            let view = guard.update(&session);
            view_tx.send_if_modified(|current| {
                if *current == view {
                    false
                } else {
                    *current = view;
                    true
                }
            });
        }
        tracing::debug!("session provider closed, guard stopped");
    });

    GuardHandle {
        view: view_rx,
        task,
    }
}

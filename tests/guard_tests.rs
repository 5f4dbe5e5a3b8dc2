use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tcf_prep_portal::{
    gate::{Fallback, Gate, GateRequest, Session},
    guard::{Guard, Navigator, View, spawn_guard},
    models::{Role, SessionUser, Tier},
};
use tokio::sync::watch;
use uuid::Uuid;

// --- Mock Router ---

/// Records every `replace` call and moves to the target like a real router would.
#[derive(Default)]
struct MockNavigator {
    path: Mutex<String>,
    replaced: Mutex<Vec<String>>,
}

impl MockNavigator {
    fn at(path: &str) -> Arc<Self> {
        Arc::new(Self {
            path: Mutex::new(path.to_string()),
            replaced: Mutex::new(Vec::new()),
        })
    }

    fn replaced(&self) -> Vec<String> {
        self.replaced.lock().unwrap().clone()
    }
}

impl Navigator for MockNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap().clone()
    }

    fn replace(&self, path: &str) {
        *self.path.lock().unwrap() = path.to_string();
        self.replaced.lock().unwrap().push(path.to_string());
    }
}

fn signed_in(role: Role, tier: Option<Tier>) -> Session {
    Session::authenticated(SessionUser {
        id: Uuid::from_u128(42),
        role: Some(role),
        tier,
    })
}

async fn wait_for(view: &mut watch::Receiver<View>, expected: View) {
    tokio::time::timeout(Duration::from_secs(1), view.wait_for(|v| *v == expected))
        .await
        .expect("view did not change in time")
        .expect("guard task stopped");
}

// --- Guard::update ---

#[test]
fn test_redirect_fires_once_per_denied_transition() {
    let nav = MockNavigator::at("/admin");
    let mut guard = Guard::new(Gate::default(), GateRequest::new().roles([Role::Admin]), nav.clone());
    let student = signed_in(Role::Student, None);

    assert_eq!(guard.update(&student), View::Nothing);
    assert_eq!(guard.update(&student), View::Nothing);
    assert_eq!(guard.update(&student), View::Nothing);

    assert_eq!(nav.replaced(), vec!["/home".to_string()]);
}

#[test]
fn test_no_redirect_when_already_on_target() {
    let nav = MockNavigator::at("/connexion");
    let mut guard = Guard::new(Gate::default(), GateRequest::new(), nav.clone());

    assert_eq!(guard.update(&Session::anonymous()), View::Nothing);
    assert!(nav.replaced().is_empty());
}

#[test]
fn test_loading_and_allow_have_no_side_effects() {
    let nav = MockNavigator::at("/home");
    let mut guard = Guard::new(Gate::default(), GateRequest::new(), nav.clone());

    assert_eq!(guard.update(&Session::loading()), View::Loading);
    assert_eq!(guard.update(&signed_in(Role::User, None)), View::Children);
    assert!(nav.replaced().is_empty());
}

#[test]
fn test_fallback_renders_without_navigation() {
    let nav = MockNavigator::at("/mock-exams");
    let request = GateRequest::new()
        .tiers([Tier::Premium, Tier::Pro])
        .fallback(Fallback::UpgradeRequired);
    let mut guard = Guard::new(Gate::default(), request, nav.clone());

    assert_eq!(
        guard.update(&signed_in(Role::Student, Some(Tier::Free))),
        View::Fallback(Fallback::UpgradeRequired)
    );
    assert!(nav.replaced().is_empty());
}

#[test]
fn test_redirect_fires_again_after_leaving_denied_state() {
    let nav = MockNavigator::at("/practice");
    let mut guard = Guard::new(Gate::default(), GateRequest::new(), nav.clone());

    // Sign-out sends the visitor to the login page...
    guard.update(&Session::anonymous());
    // ...the user navigates back and signs in...
    *nav.path.lock().unwrap() = "/practice".to_string();
    assert_eq!(guard.update(&signed_in(Role::User, None)), View::Children);
    // ...and a second sign-out is a new transition.
    guard.update(&Session::anonymous());

    assert_eq!(nav.replaced(), vec!["/connexion".to_string(), "/connexion".to_string()]);
}

#[test]
fn test_redirect_fires_after_a_suppressed_one() {
    // Mounted on the landing page itself: nothing to do.
    let nav = MockNavigator::at("/home");
    let mut guard = Guard::new(Gate::default(), GateRequest::new().roles([Role::Admin]), nav.clone());
    let student = signed_in(Role::Student, None);

    assert_eq!(guard.update(&student), View::Nothing);
    assert!(nav.replaced().is_empty());

    // The router then moves to another admin page under the same guard.
    *nav.path.lock().unwrap() = "/admin/users".to_string();
    assert_eq!(guard.update(&student), View::Nothing);

    assert_eq!(nav.replaced(), vec!["/home".to_string()]);
}

#[test]
fn test_redirect_fires_again_when_router_moves_to_another_denied_page() {
    let nav = MockNavigator::at("/admin");
    let mut guard = Guard::new(Gate::default(), GateRequest::new().roles([Role::Admin]), nav.clone());
    let student = signed_in(Role::Student, None);

    guard.update(&student);
    // Landed on /home: evaluating there must not navigate.
    guard.update(&student);
    *nav.path.lock().unwrap() = "/admin/users".to_string();
    guard.update(&student);

    assert_eq!(nav.replaced(), vec!["/home".to_string(), "/home".to_string()]);
}

#[test]
fn test_no_second_replace_before_router_moves() {
    // A router that records the navigation but has not applied it yet.
    struct LazyNavigator {
        replaced: Mutex<Vec<String>>,
    }

    impl Navigator for LazyNavigator {
        fn current_path(&self) -> String {
            "/mock-exams".to_string()
        }

        fn replace(&self, path: &str) {
            self.replaced.lock().unwrap().push(path.to_string());
        }
    }

    let nav = Arc::new(LazyNavigator {
        replaced: Mutex::new(Vec::new()),
    });
    let mut guard = Guard::new(Gate::default(), GateRequest::new().tiers([Tier::Pro]), nav.clone());
    let free = signed_in(Role::User, Some(Tier::Free));

    guard.update(&free);
    guard.update(&free);

    assert_eq!(*nav.replaced.lock().unwrap(), vec!["/subscription".to_string()]);
}

// --- spawn_guard ---

#[tokio::test]
async fn test_guard_follows_session_changes() {
    let nav = MockNavigator::at("/mock-exams");
    let guard = Guard::new(
        Gate::default(),
        GateRequest::new().tiers([Tier::Premium, Tier::Pro]),
        nav.clone(),
    );
    let (session_tx, session_rx) = watch::channel(Session::loading());

    let handle = spawn_guard(guard, session_rx);
    let mut view = handle.view();
    assert_eq!(*view.borrow(), View::Loading);

    session_tx.send(signed_in(Role::User, Some(Tier::Pro))).unwrap();
    wait_for(&mut view, View::Children).await;

    // Subscription lapses: one redirect to the plans page.
    session_tx.send(signed_in(Role::User, Some(Tier::Free))).unwrap();
    wait_for(&mut view, View::Nothing).await;
    session_tx.send(signed_in(Role::User, None)).unwrap();
    tokio::task::yield_now().await;

    assert_eq!(nav.replaced(), vec!["/subscription".to_string()]);
}

#[tokio::test]
async fn test_dropping_handle_stops_guard() {
    let nav = MockNavigator::at("/home");
    let guard = Guard::new(Gate::default(), GateRequest::new(), nav.clone());
    let (session_tx, session_rx) = watch::channel(signed_in(Role::Student, None));

    let handle = spawn_guard(guard, session_rx);
    let mut view = handle.view();
    drop(handle);

    // The task owned the view sender; once aborted the channel closes.
    tokio::time::timeout(Duration::from_secs(1), view.changed())
        .await
        .expect("guard task still running")
        .expect_err("view channel should be closed");

    let _ = session_tx.send(Session::anonymous());
    tokio::task::yield_now().await;
    assert!(nav.replaced().is_empty());
}

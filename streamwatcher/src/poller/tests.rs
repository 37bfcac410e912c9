use tokio::sync::Notify;
use watch_db::Database;

use super::*;
use crate::test_support::{Call, FakeBackend};

fn unauthorized() -> TwitchError {
    TwitchError::Unauthorized("invalid token".into())
}

struct Harness {
    poller: Arc<Poller>,
    backend: Arc<FakeBackend>,
    db: Database,
    events: mpsc::Receiver<WatchEvent>,
}

impl Harness {
    fn new(backend: FakeBackend) -> Self {
        let backend = Arc::new(backend);
        let db = Database::open_in_memory().unwrap();
        let (tx, events) = mpsc::channel(32);
        let poller = Arc::new(Poller::new(backend.clone(), Arc::new(db.clone()), tx));
        poller.set_channels(vec!["foo".into(), "BAR".into()]);
        Self {
            poller,
            backend,
            db,
            events,
        }
    }

    fn with_credentials(self, token: &str, secret: Option<&str>) -> Self {
        self.poller
            .commit_credentials(Credentials::new("clientid", token, secret))
            .unwrap();
        self
    }

    fn drain_events(&mut self) -> Vec<WatchEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

fn went_live_names(outcome: &PollOutcome) -> Vec<String> {
    match outcome {
        PollOutcome::Completed(report) => report.went_live.iter().map(|w| w.name.clone()).collect(),
        other => panic!("expected a completed poll, got {other:?}"),
    }
}

#[tokio::test]
async fn no_credentials_is_a_no_op() {
    let h = Harness::new(FakeBackend::default());
    assert_eq!(h.poller.poll_once().await.unwrap(), PollOutcome::NoCredentials);
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn mints_token_before_querying_when_only_secret_held() {
    let h = Harness::new(FakeBackend::default()).with_credentials("", Some("secret"));

    h.poller.poll_once().await.unwrap();

    assert_eq!(
        h.backend.calls(),
        vec![
            Call::Mint,
            Call::Fetch {
                token: "minted".into()
            }
        ]
    );
    assert_eq!(h.poller.credentials().unwrap().access_token, "minted");
    let stored = h.db.get_credentials().unwrap().unwrap();
    assert_eq!(stored.access_token, "minted");
    assert_eq!(stored.client_secret.as_deref(), Some("secret"));
}

#[tokio::test]
async fn unauthorized_with_secret_refreshes_and_retries_once() {
    let h = Harness::new(FakeBackend::default()).with_credentials("stale", Some("secret"));
    h.backend.script_fetch(Err(unauthorized()));
    h.backend.set_live(&["foo"]);

    let outcome = h.poller.poll_once().await.unwrap();

    assert_eq!(went_live_names(&outcome), vec!["foo"]);
    assert_eq!(
        h.backend.calls(),
        vec![
            Call::Fetch {
                token: "stale".into()
            },
            Call::Mint,
            Call::Fetch {
                token: "minted".into()
            },
        ]
    );
    assert_eq!(h.db.get_credentials().unwrap().unwrap().access_token, "minted");
}

#[tokio::test]
async fn second_unauthorized_propagates_and_keeps_credentials() {
    let mut h = Harness::new(FakeBackend::default()).with_credentials("stale", Some("secret"));
    h.backend.script_fetch(Err(unauthorized()));
    h.backend.script_fetch(Err(unauthorized()));

    let err = h.poller.poll_once().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(h.backend.calls().len(), 3);
    assert!(h.poller.credentials().is_some());
    assert!(h.db.get_credentials().unwrap().is_some());
    let events = h.drain_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], WatchEvent::CheckFailed { .. }));
}

#[tokio::test]
async fn failed_refresh_is_reported_as_refresh_failure() {
    let mut h = Harness::new(FakeBackend::default()).with_credentials("stale", Some("secret"));
    h.backend.script_fetch(Err(unauthorized()));
    h.backend
        .script_mint(Err(TwitchError::Auth("failed to generate token: 400".into())));

    let err = h.poller.poll_once().await.unwrap_err();

    match &err {
        TwitchError::Auth(message) => {
            assert!(message.starts_with("Failed to refresh token: "));
        }
        other => panic!("expected auth error, got {other:?}"),
    }
    assert_eq!(h.backend.calls(), vec![Call::Fetch { token: "stale".into() }, Call::Mint]);
    assert!(h.poller.credentials().is_some());
    let events = h.drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        WatchEvent::CheckFailed { message } => {
            assert!(message.contains("Failed to refresh token"));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_without_secret_clears_credentials() {
    let mut h = Harness::new(FakeBackend::default()).with_credentials("stale", None);
    let mut creds_rx = h.poller.subscribe_credentials();
    h.backend.script_fetch(Err(unauthorized()));

    let err = h.poller.poll_once().await.unwrap_err();

    match &err {
        TwitchError::Auth(message) => assert!(message.contains("invalid token")),
        other => panic!("expected auth error, got {other:?}"),
    }
    assert_eq!(h.backend.calls().len(), 1);
    assert!(h.poller.credentials().is_none());
    assert!(h.db.get_credentials().unwrap().is_none());
    assert!(creds_rx.has_changed().unwrap());
    assert!(creds_rx.borrow_and_update().is_none());
    let events = h.drain_events();
    assert!(matches!(events[0], WatchEvent::CheckFailed { .. }));
    assert_eq!(events[1], WatchEvent::CredentialsCleared);
}

#[tokio::test]
async fn missing_token_and_secret_fails_without_network() {
    let mut h = Harness::new(FakeBackend::default()).with_credentials("", None);

    let err = h.poller.poll_once().await.unwrap_err();

    assert!(matches!(err, TwitchError::Auth(_)));
    assert!(h.backend.calls().is_empty());
    assert!(h.poller.credentials().is_none());
    assert_eq!(
        h.drain_events(),
        vec![
            WatchEvent::AuthFailed {
                message: "Missing Access Token and Client Secret".into()
            },
            WatchEvent::CredentialsCleared,
        ]
    );
}

#[tokio::test]
async fn mint_failure_is_an_auth_error_and_keeps_credentials() {
    let mut h = Harness::new(FakeBackend::default()).with_credentials("", Some("secret"));
    h.backend
        .script_mint(Err(TwitchError::Auth("failed to generate token: 400".into())));

    let err = h.poller.poll_once().await.unwrap_err();

    assert!(matches!(err, TwitchError::Auth(_)));
    assert_eq!(h.backend.calls(), vec![Call::Mint]);
    assert!(h.poller.credentials().is_some());
    let events = h.drain_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], WatchEvent::AuthFailed { message } if message.starts_with("Could not generate token")));
}

#[tokio::test]
async fn api_error_leaves_state_and_credentials_untouched() {
    let mut h = Harness::new(FakeBackend::default()).with_credentials("tok", None);
    h.backend.set_live(&["foo"]);
    h.poller.poll_once().await.unwrap();
    h.drain_events();
    let before = h.poller.snapshot();

    h.backend.script_fetch(Err(TwitchError::ApiError {
        status: 503,
        message: "Service Unavailable".into(),
    }));
    let err = h.poller.poll_once().await.unwrap_err();

    assert!(matches!(err, TwitchError::ApiError { status: 503, .. }));
    assert!(Arc::ptr_eq(&before, &h.poller.snapshot()));
    assert!(h.poller.credentials().is_some());
    assert!(h.db.get_credentials().unwrap().is_some());
    assert_eq!(
        h.drain_events(),
        vec![WatchEvent::CheckFailed {
            message: err.to_string()
        }]
    );
    assert_eq!(h.poller.phase(), PollPhase::Idle);
}

#[tokio::test]
async fn foo_bar_alert_sequence() {
    let mut h = Harness::new(FakeBackend::default()).with_credentials("tok", None);

    h.backend.set_live(&["bar"]);
    let first = h.poller.poll_once().await.unwrap();
    assert_eq!(went_live_names(&first), vec!["BAR"]);
    let snapshot = h.poller.snapshot();
    assert!(snapshot.status("bar").unwrap().is_live);
    assert!(!snapshot.status("foo").unwrap().is_live);

    let second = h.poller.poll_once().await.unwrap();
    assert!(went_live_names(&second).is_empty());

    h.backend.set_live(&[]);
    let third = h.poller.poll_once().await.unwrap();
    assert!(went_live_names(&third).is_empty());
    assert!(!h.poller.snapshot().is_alerted("bar"));

    h.backend.set_live(&["bar"]);
    let fourth = h.poller.poll_once().await.unwrap();
    assert_eq!(went_live_names(&fourth), vec!["BAR"]);

    let alerts: Vec<WatchEvent> = h
        .drain_events()
        .into_iter()
        .filter(WatchEvent::is_went_live)
        .collect();
    assert_eq!(alerts.len(), 2);
}

#[tokio::test]
async fn overlapping_check_is_skipped() {
    let gate = Arc::new(Notify::new());
    let h = Harness::new(FakeBackend::with_gate(gate.clone())).with_credentials("tok", None);

    let poller = h.poller.clone();
    let first = tokio::spawn(async move { poller.poll_once().await });
    while h.poller.phase() == PollPhase::Idle {
        tokio::task::yield_now().await;
    }

    assert_eq!(h.poller.poll_once().await.unwrap(), PollOutcome::Skipped);
    gate.notify_one();

    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, PollOutcome::Completed(_)));
    assert_eq!(h.backend.calls().len(), 1);
    assert_eq!(h.poller.phase(), PollPhase::Idle);
}

#[tokio::test]
async fn clear_credentials_forgets_everything() {
    let h = Harness::new(FakeBackend::default()).with_credentials("tok", Some("secret"));
    h.poller.clear_credentials().unwrap();
    assert!(h.poller.credentials().is_none());
    assert!(h.db.get_credentials().unwrap().is_none());
}

#[tokio::test]
async fn validate_delegates_to_backend() {
    let h = Harness::new(FakeBackend::default());
    assert!(h.poller.validate("id", "good").await);
    assert!(!h.poller.validate("id", "bad").await);
}

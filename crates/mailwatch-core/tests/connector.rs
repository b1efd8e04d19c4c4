//! Tests for single connection attempts and the session they open.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Behavior, FakeImap, config, email, settings, within};
use mailwatch_core::{ConnectError, RunState, SessionConnector};

#[tokio::test]
async fn opens_mailbox_read_only_at_current_count() {
    let server = FakeImap::new().preload([email("a", "1").as_str(), email("b", "2").as_str()]);
    let connector = SessionConnector::new(server.transport(), config(), settings());

    let session = connector.connect().await.unwrap();
    assert_eq!(session.mailbox(), "INBOX");
    assert_eq!(session.exists(), 2);
    assert_eq!(session.seen(), 2);
    assert_eq!(server.log(), vec!["LOGIN", "EXAMINE INBOX"]);

    session.close().await;
    assert_eq!(
        server.log(),
        vec!["LOGIN", "EXAMINE INBOX", "CLOSE", "LOGOUT"]
    );
}

#[tokio::test]
async fn opens_configured_mailbox() {
    let server = FakeImap::new();
    let connector = SessionConnector::new(
        server.transport(),
        config(),
        settings().with_mailbox("Alerts"),
    );

    let session = connector.connect().await.unwrap();
    assert_eq!(session.mailbox(), "Alerts");
    assert!(server.log().contains(&"EXAMINE Alerts".to_string()));
}

#[tokio::test]
async fn rejected_login_is_an_auth_failure() {
    let server = FakeImap::new();
    server.script([Behavior::RejectLogin]);
    let connector = SessionConnector::new(server.transport(), config(), settings());

    let err = connector.connect().await.unwrap_err();
    assert!(matches!(err, ConnectError::Login(_)), "got {err:?}");
    assert!(err.is_auth_failure());
    assert_eq!(server.count("EXAMINE"), 0);
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let server = FakeImap::new();
    server.script([Behavior::Refuse]);
    let connector = SessionConnector::new(server.transport(), config(), settings());

    let err = connector.connect().await.unwrap_err();
    assert!(matches!(err, ConnectError::Transport(_)), "got {err:?}");
    assert!(!err.is_auth_failure());
}

#[tokio::test]
async fn missing_idle_logs_out() {
    let server = FakeImap::new();
    server.script([Behavior::NoIdle]);
    let connector = SessionConnector::new(server.transport(), config(), settings());

    let err = connector.connect().await.unwrap_err();
    assert!(matches!(err, ConnectError::IdleUnsupported), "got {err:?}");
    assert_eq!(server.log(), vec!["LOGIN", "CAPABILITY", "LOGOUT"]);
}

#[tokio::test(start_paused = true)]
async fn silent_server_times_out() {
    let server = FakeImap::new();
    server.script([Behavior::Silent]);
    let connector = SessionConnector::new(
        server.transport(),
        config(),
        settings().with_connect_timeout(Duration::from_secs(5)),
    );

    let err = connector.connect().await.unwrap_err();
    match err {
        ConnectError::Timeout { stage, after } => {
            assert_eq!(stage, "connect");
            assert_eq!(after, Duration::from_secs(5));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn next_batch_returns_pending_arrivals() {
    let server = FakeImap::new().preload([email("old", "x").as_str()]);
    let connector = SessionConnector::new(server.transport(), config(), settings());
    let mut session = connector.connect().await.unwrap();
    let run = RunState::new();

    server.deliver(&email("new", "fresh"));
    let batch = within(session.next_batch(&run)).await.unwrap().unwrap();

    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].seq.get(), 2);
    assert_eq!(batch[0].uid.map(|uid| uid.get()), Some(102));
    assert!(batch[0].raw.ends_with(b"fresh"));
    assert_eq!(session.seen(), 2);

    run.stop();
    assert!(session.next_batch(&run).await.unwrap().is_none());
    session.close().await;
    assert_eq!(server.count("LOGOUT"), 1);
}

#[tokio::test(start_paused = true)]
async fn expunge_while_ending_idle_keeps_new_arrival() {
    let server = FakeImap::new().preload([
        email("old 1", "a").as_str(),
        email("old 2", "b").as_str(),
        email("old 3", "c").as_str(),
        email("old 4", "d").as_str(),
        email("old 5", "e").as_str(),
    ]);
    server.expunge_on_done(2);
    let connector = SessionConnector::new(server.transport(), config(), settings());
    let mut session = connector.connect().await.unwrap();
    assert_eq!(session.seen(), 5);
    let run = RunState::new();

    // Announced as 6 EXISTS; DONE then reports 2 EXPUNGE, so the arrival
    // ends up at sequence 5 in a mailbox of 5.
    server.deliver(&email("new", "fresh"));
    let batch = within(session.next_batch(&run)).await.unwrap().unwrap();

    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].seq.get(), 5);
    assert!(batch[0].raw.ends_with(b"fresh"));
    assert_eq!(session.exists(), 5);
    assert_eq!(session.seen(), 5);
    assert_eq!(
        server.log(),
        vec![
            "LOGIN",
            "EXAMINE INBOX",
            "IDLE",
            "DONE",
            "FETCH 5 (UID BODY.PEEK[])"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn next_batch_ends_idle_on_stop() {
    let server = FakeImap::new();
    let connector = SessionConnector::new(server.transport(), config(), settings());
    let mut session = connector.connect().await.unwrap();
    let run = Arc::new(RunState::new());

    let stopper = {
        let server = server.clone();
        let run = Arc::clone(&run);
        tokio::spawn(async move {
            server.wait_for_command("IDLE", 1).await;
            run.stop();
        })
    };

    let outcome = within(session.next_batch(&run)).await.unwrap();
    assert!(outcome.is_none());
    stopper.await.unwrap();
    assert_eq!(server.log(), vec!["LOGIN", "EXAMINE INBOX", "IDLE", "DONE"]);
}

// SPDX-FileCopyrightText: 2026 Jobtalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end session behavior against mock transport and backend.

use std::sync::Arc;
use std::time::Duration;

use jobtalk_client::ChatSession;
use jobtalk_config::ChatConfig;
use jobtalk_core::{ConnectionState, DeliveryState, HubEvent, Message};
use jobtalk_test_utils::{wire_message, Invocation, MockChatApi, MockConnection, MockTransport};

fn start(transport: &Arc<MockTransport>, api: &Arc<MockChatApi>) -> Arc<ChatSession> {
    ChatSession::start(
        "c1",
        "s1",
        Arc::clone(api) as _,
        Arc::clone(transport) as _,
        &ChatConfig::default(),
    )
}

/// Wait until the session's message list satisfies `pred`.
async fn wait_for<F>(session: &ChatSession, pred: F)
where
    F: Fn(&[Message]) -> bool,
{
    let mut updates = session.updates();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if pred(&session.messages().await) {
                return;
            }
            updates.changed().await.expect("store dropped");
        }
    })
    .await
    .expect("condition never reached");
}

async fn wait_connected(session: &ChatSession) {
    let mut status = session.connection_status();
    // Generous guard: under paused time the full reconnect backoff schedule
    // (72 virtual seconds) must be able to elapse before this fires.
    tokio::time::timeout(Duration::from_secs(300), async {
        while *status.borrow() != ConnectionState::Connected {
            status.changed().await.expect("status dropped");
        }
    })
    .await
    .expect("never connected");
}

/// Acknowledge the room join and wait for the session to pick it up.
async fn ack_join(session: &ChatSession, connection: &Arc<MockConnection>) {
    connection
        .inject_event(HubEvent::JoinedConversation("c1".into()))
        .await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while !session.realtime_ready().await {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("join never acknowledged");
}

fn keys(messages: &[Message]) -> Vec<String> {
    messages.iter().map(|m| m.display_key()).collect()
}

// History seeds first, then realtime arrivals append in order.
#[tokio::test]
async fn history_then_realtime_appends_in_order() {
    let transport = Arc::new(MockTransport::new());
    let api = Arc::new(MockChatApi::new());
    api.push_history(vec![wire_message(Some("m1"), "c1", "s1", "hi")])
        .await;

    let session = start(&transport, &api);
    wait_connected(&session).await;
    wait_for(&session, |m| m.len() == 1).await;

    let connection = transport.latest_connection().await.unwrap();
    connection
        .inject_event(HubEvent::MessageReceived(wire_message(
            Some("m2"),
            "c1",
            "s2",
            "hello",
        )))
        .await;

    wait_for(&session, |m| m.len() == 2).await;
    assert_eq!(keys(&session.messages().await), vec!["m1", "m2"]);

    session.close().await;
}

// A realtime echo of the local user's own send merges into the pending
// entry instead of appearing twice.
#[tokio::test]
async fn own_echo_merges_into_pending_entry() {
    let transport = Arc::new(MockTransport::new());
    let api = Arc::new(MockChatApi::new());
    let session = start(&transport, &api);
    wait_connected(&session).await;

    let connection = transport.latest_connection().await.unwrap();
    ack_join(&session, &connection).await;

    session.send("see you").await;
    let pending = session.messages().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].delivery_state, DeliveryState::Pending);

    connection
        .inject_event(HubEvent::MessageReceived(wire_message(
            Some("m3"),
            "c1",
            "s1",
            "see you",
        )))
        .await;

    wait_for(&session, |m| {
        m.len() == 1 && m[0].delivery_state == DeliveryState::Sent
    })
    .await;
    let messages = session.messages().await;
    assert_eq!(messages[0].id.as_deref(), Some("m3"));
    assert!(api.sent_calls().await.is_empty());

    assert_eq!(
        connection.invocations().await.last().unwrap(),
        &Invocation::Send {
            conversation_id: "c1".into(),
            sender_id: "s1".into(),
            body: "see you".into(),
        }
    );

    session.close().await;
}

// Sends while disconnected go straight to REST and confirm from the
// response, never blocking on the realtime channel.
#[tokio::test(start_paused = true)]
async fn disconnected_send_confirms_via_rest() {
    let transport = Arc::new(MockTransport::new());
    transport.script_connect_failures(1000).await;
    let api = Arc::new(MockChatApi::new());
    let session = start(&transport, &api);

    let local_id = session.send("offline hello").await;

    let messages = session.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].delivery_state, DeliveryState::Sent);
    assert_eq!(messages[0].id.as_deref(), Some("rest-1"));
    assert_eq!(messages[0].local_id.as_deref(), Some(local_id.as_str()));
    assert_eq!(api.sent_calls().await.len(), 1);

    session.close().await;
}

// Each participant's own order is preserved across interleaving.
#[tokio::test]
async fn interleaved_traffic_preserves_per_sender_order() {
    let transport = Arc::new(MockTransport::new());
    let api = Arc::new(MockChatApi::new());
    let session = start(&transport, &api);
    wait_connected(&session).await;

    let connection = transport.latest_connection().await.unwrap();
    ack_join(&session, &connection).await;

    session.send("a1").await;
    session.send("a2").await;
    connection
        .inject_event(HubEvent::MessageReceived(wire_message(
            Some("r1"),
            "c1",
            "s2",
            "b1",
        )))
        .await;
    session.send("a3").await;
    connection
        .inject_event(HubEvent::MessageReceived(wire_message(
            Some("r2"),
            "c1",
            "s2",
            "b2",
        )))
        .await;

    wait_for(&session, |m| m.len() == 5).await;

    // Echo back the local sends; entries merge in place, order unchanged.
    for (id, body) in [("e1", "a1"), ("e2", "a2"), ("e3", "a3")] {
        connection
            .inject_event(HubEvent::MessageReceived(wire_message(
                Some(id),
                "c1",
                "s1",
                body,
            )))
            .await;
    }
    wait_for(&session, |m| {
        m.len() == 5 && m.iter().all(|x| x.delivery_state == DeliveryState::Sent)
    })
    .await;

    let messages = session.messages().await;
    let local: Vec<&str> = messages
        .iter()
        .filter(|m| m.sender_id == "s1")
        .map(|m| m.body.as_str())
        .collect();
    let remote: Vec<&str> = messages
        .iter()
        .filter(|m| m.sender_id == "s2")
        .map(|m| m.body.as_str())
        .collect();
    assert_eq!(local, vec!["a1", "a2", "a3"]);
    assert_eq!(remote, vec!["b1", "b2"]);

    session.close().await;
}

// Reconnect attempts follow the configured schedule: immediate, 2s, 10s,
// then 30s repeating, until the transport comes back.
#[tokio::test(start_paused = true)]
async fn reconnect_walks_backoff_schedule() {
    let transport = Arc::new(MockTransport::new());
    transport.script_connect_failures(5).await;
    let api = Arc::new(MockChatApi::new());
    let session = start(&transport, &api);

    wait_connected(&session).await;

    let times = transport.attempt_times().await;
    assert_eq!(times.len(), 6);
    let delays: Vec<u64> = times
        .windows(2)
        .map(|w| (w[1] - w[0]).as_secs())
        .collect();
    assert_eq!(delays, vec![0, 2, 10, 30, 30]);

    session.close().await;
}

// Realtime messages arriving before history resolves are held back and
// rendered after the historical ones.
#[tokio::test]
async fn early_realtime_waits_for_history() {
    let transport = Arc::new(MockTransport::new());
    let api = Arc::new(MockChatApi::new());
    api.hold_history().await;
    api.push_history(vec![wire_message(Some("m1"), "c1", "s1", "old")])
        .await;

    let session = start(&transport, &api);
    wait_connected(&session).await;

    let connection = transport.latest_connection().await.unwrap();
    connection
        .inject_event(HubEvent::MessageReceived(wire_message(
            Some("m2"),
            "c1",
            "s2",
            "early",
        )))
        .await;
    ack_join(&session, &connection).await;

    // Join ack observed after the injection, so the early message has been
    // ingested and is buffered, not rendered.
    assert!(session.messages().await.is_empty());

    api.release_history().await;
    wait_for(&session, |m| m.len() == 2).await;
    assert_eq!(keys(&session.messages().await), vec!["m1", "m2"]);

    session.close().await;
}

// A failed history load leaves the store alone and can be retried.
#[tokio::test]
async fn history_failure_is_retriable() {
    let transport = Arc::new(MockTransport::new());
    let api = Arc::new(MockChatApi::new());
    api.push_history_error("backend down").await;

    let session = start(&transport, &api);
    tokio::time::timeout(Duration::from_secs(5), async {
        while api.history_fetches() == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("initial history fetch never ran");

    api.push_history(vec![wire_message(Some("m1"), "c1", "s1", "hi")])
        .await;
    assert_eq!(session.reload_history().await.unwrap(), 1);
    assert_eq!(keys(&session.messages().await), vec!["m1"]);

    session.close().await;
}

// A failed send surfaces as FAILED and the retry entry point redelivers
// with the same local id.
#[tokio::test(start_paused = true)]
async fn failed_send_retries_with_same_key() {
    let transport = Arc::new(MockTransport::new());
    transport.script_connect_failures(1000).await;
    let api = Arc::new(MockChatApi::new());
    api.push_send_error("backend down").await;

    let session = start(&transport, &api);
    let local_id = session.send("hi").await;
    assert_eq!(
        session.messages().await[0].delivery_state,
        DeliveryState::Failed
    );

    session.retry_failed(&local_id).await;
    let messages = session.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].delivery_state, DeliveryState::Sent);
    assert_eq!(messages[0].local_id.as_deref(), Some(local_id.as_str()));

    session.close().await;
}

// Tearing down while the initial history fetch is still in flight does not
// panic; the abandoned fetch completes against the closed session silently.
#[tokio::test]
async fn close_during_history_fetch_is_safe() {
    let transport = Arc::new(MockTransport::new());
    let api = Arc::new(MockChatApi::new());
    api.hold_history().await;
    api.push_history(vec![wire_message(Some("m1"), "c1", "s1", "late")])
        .await;

    let session = start(&transport, &api);
    wait_connected(&session).await;
    assert_eq!(api.history_fetches(), 0);

    session.close().await;

    // Let the abandoned fetch resolve after teardown.
    api.release_history().await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while api.history_fetches() == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("abandoned history fetch never completed");

    // The late seed lands in the torn-down store without upsetting anything;
    // the session surface still answers.
    wait_for(&session, |m| m.len() == 1).await;
    assert_eq!(
        *session.connection_status().borrow(),
        ConnectionState::Disconnected
    );
}

// Closing the session leaves the room, closes the connection and settles
// the status badge on disconnected.
#[tokio::test]
async fn close_leaves_room_and_disconnects() {
    let transport = Arc::new(MockTransport::new());
    let api = Arc::new(MockChatApi::new());
    let session = start(&transport, &api);
    wait_connected(&session).await;

    session.close().await;

    let connection = transport.latest_connection().await.unwrap();
    assert!(connection.is_closed());
    assert!(connection
        .invocations()
        .await
        .contains(&Invocation::Leave("c1".into())));
    assert_eq!(
        *session.connection_status().borrow(),
        ConnectionState::Disconnected
    );

    // No reconnect after an orderly close.
    let attempts = transport.connect_attempts();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.connect_attempts(), attempts);
}

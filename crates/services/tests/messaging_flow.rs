mod common;

use assert_matches::assert_matches;
use fitup_core::error::CoreError;
use fitup_events::HubFrame;
use fitup_services::messaging::SendMessage;
use tokio::sync::mpsc;

use common::{coach, harness, user};

fn text_message(conversation_id: i64, text: &str) -> SendMessage {
    SendMessage {
        conversation_id,
        text: text.to_string(),
        reply_to_message_id: None,
        attachments: vec![],
    }
}

fn next_event(rx: &mut mpsc::Receiver<HubFrame>) -> serde_json::Value {
    match rx.try_recv() {
        Ok(HubFrame::Text(text)) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: a message reaches both connected participants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn message_is_broadcast_to_participants() {
    let h = harness();
    h.assign("coach1", "alice").await;
    let (trainer, alice) = (coach("coach1"), user("alice"));

    let conversation = h.services.messaging.create_conversation(&trainer, "alice").await.unwrap();
    let again = h.services.messaging.create_conversation(&alice, "coach1").await.unwrap();
    assert_eq!(again.id, conversation.id);
    assert_eq!(conversation.coach_id, "coach1");
    assert_eq!(conversation.client_id, "alice");

    let mut coach_rx = h.hub.connect("coach1").await.unwrap().receiver;
    let mut alice_rx = h.hub.connect("alice").await.unwrap().receiver;

    let message = h
        .services
        .messaging
        .send(&alice, text_message(conversation.id, "Legs are sore today"))
        .await
        .unwrap();

    for rx in [&mut coach_rx, &mut alice_rx] {
        let event = next_event(rx);
        assert_eq!(event["type"], "new_message");
        assert_eq!(event["conversationID"], conversation.id);
        assert_eq!(event["messageID"], message.id);
        assert_eq!(event["message"]["text"], "Legs are sore today");
    }

    assert!(h.services.messaging.mark_read(&trainer, message.id).await.unwrap());
    assert!(!h.services.messaging.mark_read(&trainer, message.id).await.unwrap());
    assert!(!h.services.messaging.mark_read(&alice, message.id).await.unwrap());
    let read = next_event(&mut alice_rx);
    assert_eq!(read["type"], "message_read");
    assert_eq!(read["readBy"], "coach1");
}

// ---------------------------------------------------------------------------
// Test: conversations require a coaching relationship and membership
// ---------------------------------------------------------------------------

#[tokio::test]
async fn outsiders_are_forbidden() {
    let h = harness();
    h.assign("coach1", "alice").await;
    let conversation = h
        .services
        .messaging
        .create_conversation(&coach("coach1"), "alice")
        .await
        .unwrap();
    let bob = user("bob");

    let err = h.services.messaging.create_conversation(&bob, "coach1").await.unwrap_err();
    assert_matches!(err, CoreError::Forbidden(_));

    let err = h
        .services
        .messaging
        .send(&bob, text_message(conversation.id, "hello"))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Forbidden(_));

    let channel = format!("conversation:{}", conversation.id);
    let err = h.services.messaging.subscribe("bob", &channel).await.unwrap_err();
    assert_matches!(err, CoreError::Forbidden(_));
    let err = h.services.messaging.subscribe("alice", "lobby").await.unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
    assert_eq!(
        h.services.messaging.subscribe("alice", &channel).await.unwrap(),
        conversation.id
    );
}

// ---------------------------------------------------------------------------
// Test: only the sender edits or deletes, deleted messages stay gone
// ---------------------------------------------------------------------------

#[tokio::test]
async fn edit_and_delete_are_sender_only() {
    let h = harness();
    h.assign("coach1", "alice").await;
    let (trainer, alice) = (coach("coach1"), user("alice"));
    let conversation = h.services.messaging.create_conversation(&trainer, "alice").await.unwrap();
    let message = h
        .services
        .messaging
        .send(&trainer, text_message(conversation.id, "Deload this week"))
        .await
        .unwrap();

    let err = h.services.messaging.edit(&alice, message.id, "nope").await.unwrap_err();
    assert_matches!(err, CoreError::Forbidden(_));

    let edited = h
        .services
        .messaging
        .edit(&trainer, message.id, "Deload next week")
        .await
        .unwrap();
    assert_eq!(edited.text, "Deload next week");
    assert!(edited.edited_at.is_some());

    h.services.messaging.delete(&trainer, message.id).await.unwrap();
    let err = h.services.messaging.edit(&trainer, message.id, "again").await.unwrap_err();
    assert_matches!(err, CoreError::NotFound { .. });
    assert!(!h.services.messaging.mark_read(&alice, message.id).await.unwrap());

    let summaries = h.services.messaging.list_conversations(&alice, false).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].unread_count, 0);
}

// ---------------------------------------------------------------------------
// Test: concurrent sends reach subscribers in commit order
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sends_are_broadcast_in_commit_order() {
    let h = harness();
    h.assign("coach1", "alice").await;
    let conversation = h
        .services
        .messaging
        .create_conversation(&coach("coach1"), "alice")
        .await
        .unwrap();
    let mut coach_rx = h.hub.connect("coach1").await.unwrap().receiver;

    let tasks: Vec<_> = (0..24)
        .map(|i| {
            let messaging = h.services.messaging.clone();
            let sender = if i % 2 == 0 { user("alice") } else { coach("coach1") };
            let conversation_id = conversation.id;
            tokio::spawn(async move {
                messaging
                    .send(&sender, text_message(conversation_id, &format!("message {i}")))
                    .await
                    .unwrap()
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let received: Vec<i64> = (0..24)
        .map(|_| next_event(&mut coach_rx)["messageID"].as_i64().unwrap())
        .collect();
    let mut in_commit_order = received.clone();
    in_commit_order.sort_unstable();
    assert_eq!(received, in_commit_order);
}

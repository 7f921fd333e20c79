//! Integration tests for the chats crate.

use chrono::{Duration, TimeZone, Utc};
use futures_util::future::join_all;
use parley_chats::{ChatError, ChatService, ChatStore};
use parley_common::{ErrorKind, ManualClock};
use parley_config::ChatConfig;
use std::collections::HashSet;
use std::sync::Arc;

fn create_test_service() -> ChatService {
    ChatService::from_config(&ChatConfig::default())
}

#[tokio::test]
async fn test_membership_gate() {
    let service = create_test_service();
    let chat = service
        .create_chat("alice", "room", &["bob".to_string()])
        .await
        .unwrap();

    let err = service
        .send_message(&chat.id, "carol", "hi")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(err, ChatError::forbidden(chat.id.clone(), "carol"));

    service.connect(&chat.id, "carol").await.unwrap();
    let message = service.send_message(&chat.id, "carol", "hi").await.unwrap();
    assert_eq!(message.user_id, "carol");
    assert_eq!(message.chat_id, chat.id);
}

#[tokio::test]
async fn test_non_members_cannot_read() {
    let service = create_test_service();
    let chat = service.create_chat("alice", "room", &[]).await.unwrap();
    service.send_message(&chat.id, "alice", "secret").await.unwrap();

    let err = service
        .get_messages(&chat.id, "mallory", None, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = service.get_chat(&chat.id, "mallory").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    assert_eq!(service.get_chat(&chat.id, "alice").await.unwrap(), chat);
}

#[tokio::test]
async fn test_pagination() {
    let service = create_test_service();
    let chat = service.create_chat("alice", "room", &[]).await.unwrap();
    for i in 0..5 {
        service
            .send_message(&chat.id, "alice", &format!("message {}", i))
            .await
            .unwrap();
    }

    let page = service
        .get_messages(&chat.id, "alice", Some(2), Some(4))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].content, "message 4");

    let page = service
        .get_messages(&chat.id, "alice", Some(2), Some(10))
        .await
        .unwrap();
    assert!(page.is_empty());

    let page = service
        .get_messages(&chat.id, "alice", None, None)
        .await
        .unwrap();
    assert_eq!(page.len(), 5);

    // The store applies the same bounds without the membership gate.
    let page = service.store().list_messages(&chat.id, 2, 4).await.unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_page_size_is_capped() {
    let service = create_test_service();
    let chat = service.create_chat("alice", "room", &[]).await.unwrap();
    for i in 0..120 {
        service
            .send_message(&chat.id, "alice", &format!("m{}", i))
            .await
            .unwrap();
    }

    let default_page = service
        .get_messages(&chat.id, "alice", None, None)
        .await
        .unwrap();
    assert_eq!(default_page.len(), 50);

    let capped = service
        .get_messages(&chat.id, "alice", Some(500), None)
        .await
        .unwrap();
    assert_eq!(capped.len(), 100);
}

#[tokio::test]
async fn test_idempotent_join() {
    let service = create_test_service();
    let chat = service
        .create_chat("alice", "room", &["bob".to_string()])
        .await
        .unwrap();

    let first = service.connect(&chat.id, "bob").await.unwrap();
    let second = service.connect(&chat.id, "bob").await.unwrap();

    assert_eq!(first.participants, second.participants);
    let bobs = second.participants.iter().filter(|p| *p == "bob").count();
    assert_eq!(bobs, 1);
    assert_eq!(second.participants.len(), 2);
}

#[tokio::test]
async fn test_participants_are_deduplicated() {
    let service = create_test_service();
    let chat = service
        .create_chat(
            "alice",
            "room",
            &["bob".to_string(), "alice".to_string(), "bob".to_string()],
        )
        .await
        .unwrap();

    let participants: Vec<_> = chat.participants.iter().cloned().collect();
    assert_eq!(participants, vec!["alice", "bob"]);
    assert_eq!(chat.creator_id, "alice");
}

#[tokio::test]
async fn test_unknown_chat_is_not_found() {
    let service = create_test_service();

    let err = service.connect("missing", "alice").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service
        .send_message("missing", "alice", "hi")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service
        .get_messages("missing", "alice", None, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_messages_come_back_in_creation_order() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let store = ChatStore::new().with_clock(clock.clone());
    let service = ChatService::new(store, &ChatConfig::default());

    let chat = service
        .create_chat("alice", "room", &["bob".to_string()])
        .await
        .unwrap();
    for i in 0..20 {
        let sender = if i % 2 == 0 { "alice" } else { "bob" };
        service
            .send_message(&chat.id, sender, &format!("{}", i))
            .await
            .unwrap();
        clock.advance(Duration::seconds(1));
    }

    let messages = service
        .get_messages(&chat.id, "alice", None, None)
        .await
        .unwrap();
    let contents: Vec<_> = messages.iter().map(|m| m.content.clone()).collect();
    let expected: Vec<_> = (0..20).map(|i| i.to_string()).collect();
    assert_eq!(contents, expected);
    assert!(messages
        .windows(2)
        .all(|pair| pair[0].created_at < pair[1].created_at));
}

#[tokio::test]
async fn test_list_chats_for_user() {
    let service = create_test_service();
    let first = service
        .create_chat("alice", "first", &["bob".to_string()])
        .await
        .unwrap();
    let second = service.create_chat("carol", "second", &[]).await.unwrap();
    service.connect(&second.id, "bob").await.unwrap();
    service.create_chat("carol", "third", &[]).await.unwrap();

    let ids: Vec<_> = service
        .list_chats("bob")
        .await
        .unwrap()
        .into_iter()
        .map(|chat| chat.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert!(service.list_chats("nobody").await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_from_distinct_members() {
    const MEMBERS: usize = 64;

    let service = Arc::new(create_test_service());
    let members: Vec<String> = (0..MEMBERS).map(|i| format!("user_{}", i)).collect();
    let chat = service.create_chat("owner", "busy", &members).await.unwrap();

    let sends = members.into_iter().map(|member| {
        let service = Arc::clone(&service);
        let chat_id = chat.id.clone();
        tokio::spawn(async move {
            service
                .send_message(&chat_id, &member, &format!("hello from {}", member))
                .await
        })
    });

    let results = join_all(sends).await;
    assert!(results.iter().all(|joined| matches!(joined, Ok(Ok(_)))));

    let messages = service
        .store()
        .list_messages(&chat.id, usize::MAX, 0)
        .await
        .unwrap();
    assert_eq!(messages.len(), MEMBERS);

    let ids: HashSet<_> = messages.iter().map(|m| m.id.clone()).collect();
    let senders: HashSet<_> = messages.iter().map(|m| m.user_id.clone()).collect();
    assert_eq!(ids.len(), MEMBERS);
    assert_eq!(senders.len(), MEMBERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_and_sends() {
    let service = Arc::new(create_test_service());
    let chat = service.create_chat("owner", "open", &[]).await.unwrap();

    let tasks = (0..32).map(|i| {
        let service = Arc::clone(&service);
        let chat_id = chat.id.clone();
        tokio::spawn(async move {
            let user = format!("guest_{}", i);
            service.connect(&chat_id, &user).await?;
            service.connect(&chat_id, &user).await?;
            service.send_message(&chat_id, &user, "joined").await
        })
    });

    for joined in join_all(tasks).await {
        joined.unwrap().unwrap();
    }

    let chat = service.get_chat(&chat.id, "owner").await.unwrap();
    assert_eq!(chat.participants.len(), 33);
    assert_eq!(service.store().message_count(&chat.id).await.unwrap(), 32);
}

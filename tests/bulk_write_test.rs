mod common;

use chrono::Utc;
use common::{hire, setup, setup_with};
use hrm_sync::model::{ChatGroup, GroupType, NotificationTemplate, NotificationType};
use hrm_sync::repository::WriteSet;
use hrm_sync::{MemoryStore, Policy, RepoError};

fn announcement() -> NotificationTemplate {
    NotificationTemplate::new(
        NotificationType::Announcement,
        "Office closed",
        "The office is closed on Friday.",
    )
}

fn group(created_by: &str) -> ChatGroup {
    ChatGroup {
        id: String::new(),
        name: "Platform".into(),
        description: String::new(),
        kind: GroupType::Project,
        created_by: created_by.to_string(),
        created_at: Utc::now(),
        is_active: true,
    }
}

#[tokio::test]
async fn fan_out_commits_in_ceiling_sized_batches() {
    let f = setup_with(MemoryStore::with_batch_limit(3), Policy::default());
    for i in 0..7 {
        hire(&f.ctx, &format!("EMP-{i:03}"), &format!("u{i}")).await;
    }
    assert_eq!(f.ctx.coordinator.ceiling(), 3);

    let report = f
        .ctx
        .coordinator
        .notify_all_active(&announcement())
        .await
        .unwrap();
    assert_eq!(report.written, 7);
    assert_eq!(report.batches, 3);
    assert_eq!(f.store.commit_count(), 3);
    assert_eq!(f.store.document_count("notifications"), 7);
}

#[tokio::test]
async fn configured_ceiling_below_the_store_limit_wins() {
    let policy = Policy {
        batch_ceiling: 2,
        ..Policy::default()
    };
    let f = setup_with(MemoryStore::new(), policy);
    let recipients: Vec<String> = (0..5).map(|i| format!("u{i}")).collect();

    let report = f
        .ctx
        .coordinator
        .fan_out(&announcement(), &recipients)
        .await
        .unwrap();
    assert_eq!(report.batches, 3);
    assert_eq!(report.written, 5);
}

#[tokio::test]
async fn fan_out_to_nobody_writes_nothing() {
    let f = setup();
    let report = f.ctx.coordinator.fan_out(&announcement(), &[]).await.unwrap();
    assert_eq!(report.written, 0);
    assert_eq!(report.batches, 0);
    assert_eq!(f.store.commit_count(), 0);
}

#[tokio::test]
async fn interrupted_fan_out_reports_what_is_durable() {
    let f = setup_with(MemoryStore::with_batch_limit(3), Policy::default());
    let recipients: Vec<String> = (0..7).map(|i| format!("u{i}")).collect();
    f.store.fail_commits_after(1);

    let err = f
        .ctx
        .coordinator
        .fan_out(&announcement(), &recipients)
        .await
        .unwrap_err();
    assert_eq!(err.committed, 3);
    assert_eq!(err.requested, 7);
    assert_eq!(err.batches, 1);
    assert!(matches!(err.source, RepoError::StoreUnavailable(_)));
    assert_eq!(f.store.document_count("notifications"), 3);
}

#[tokio::test]
async fn oversized_write_set_is_refused_before_the_store() {
    let f = setup_with(MemoryStore::with_batch_limit(3), Policy::default());
    let notifications = &f.ctx.notifications;
    let mut set = WriteSet::new();
    for i in 0..4 {
        notifications
            .stage_create(&mut set, &announcement().for_user(&format!("u{i}"), Utc::now()))
            .unwrap();
    }

    let err = notifications.records().writer().commit(set).await.unwrap_err();
    assert_eq!(err, RepoError::BatchLimitExceeded { ops: 4, limit: 3 });
    assert_eq!(f.store.document_count("notifications"), 0);
}

#[tokio::test]
async fn mark_all_read_clears_the_unread_list() {
    let policy = Policy {
        batch_ceiling: 2,
        ..Policy::default()
    };
    let f = setup_with(MemoryStore::new(), policy);
    for _ in 0..5 {
        f.ctx.notifications.notify("u1", &announcement()).await.unwrap();
    }
    f.ctx.notifications.notify("u2", &announcement()).await.unwrap();

    let report = f.ctx.coordinator.mark_all_read("u1").await.unwrap();
    assert_eq!(report.written, 5);
    assert_eq!(report.batches, 3);
    assert!(f.ctx.notifications.unread_for_user("u1").await.unwrap().is_empty());
    assert_eq!(f.ctx.notifications.unread_for_user("u2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_a_group_removes_members_and_messages() {
    let f = setup_with(MemoryStore::with_batch_limit(3), Policy::default());
    let a = hire(&f.ctx, "EMP-001", "ua").await;
    let b = hire(&f.ctx, "EMP-002", "ub").await;
    let chat = &f.ctx.chat;
    let created = f
        .ctx
        .coordinator
        .create_chat_group(group(&a.id), &[a.id.clone(), b.id.clone()])
        .await
        .unwrap();
    for text in ["hi", "hello", "standup?", "in 5"] {
        chat.send_message(&created.id, &a.id, &a.name, text).await.unwrap();
    }
    assert_eq!(chat.members_of(&created.id).await.unwrap().len(), 2);

    let report = f.ctx.coordinator.delete_chat_group(&created.id).await.unwrap();
    // 4 messages, 2 members, the group
    assert_eq!(report.written, 7);
    assert_eq!(report.batches, 3);
    assert_eq!(f.store.document_count("chatGroups"), 0);
    assert_eq!(f.store.document_count("groupMembers"), 0);
    assert_eq!(f.store.document_count("messages"), 0);
}

#[tokio::test]
async fn interrupted_group_delete_keeps_the_group_for_a_retry() {
    let f = setup_with(MemoryStore::with_batch_limit(3), Policy::default());
    let a = hire(&f.ctx, "EMP-001", "ua").await;
    let chat = &f.ctx.chat;
    let created = f
        .ctx
        .coordinator
        .create_chat_group(group(&a.id), &[])
        .await
        .unwrap();
    for text in ["one", "two", "three", "four"] {
        chat.send_message(&created.id, &a.id, &a.name, text).await.unwrap();
    }
    f.store.fail_commits_after(1);

    let err = f
        .ctx
        .coordinator
        .delete_chat_group(&created.id)
        .await
        .unwrap_err();
    assert_eq!(err.committed, 3);
    assert_eq!(err.requested, 6);
    assert!(chat.groups().get_by_id(&created.id).await.unwrap().is_some());

    f.store.clear_faults();
    let report = f.ctx.coordinator.delete_chat_group(&created.id).await.unwrap();
    assert_eq!(report.written, 3);
    assert!(chat.groups().get_by_id(&created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn large_group_is_created_in_ceiling_sized_batches() {
    let f = setup_with(MemoryStore::with_batch_limit(3), Policy::default());
    let creator = hire(&f.ctx, "EMP-001", "ua").await;
    let members: Vec<String> = (0..5).map(|i| format!("m{i}")).collect();

    let created = f
        .ctx
        .coordinator
        .create_chat_group(group(&creator.id), &members)
        .await
        .unwrap();
    // group, creator and five members
    assert_eq!(f.store.commit_count(), 3);
    assert_eq!(f.store.document_count("chatGroups"), 1);

    let stored = f.ctx.chat.members_of(&created.id).await.unwrap();
    assert_eq!(stored.len(), 6);
    assert!(stored.iter().any(|m| m.employee_id == creator.id && m.is_admin));
    assert_eq!(stored.iter().filter(|m| m.is_admin).count(), 1);
}

#[tokio::test]
async fn interrupted_group_create_keeps_the_group_and_creator() {
    let f = setup_with(MemoryStore::with_batch_limit(3), Policy::default());
    let creator = hire(&f.ctx, "EMP-001", "ua").await;
    let members: Vec<String> = (0..5).map(|i| format!("m{i}")).collect();
    f.store.fail_commits_after(1);

    let err = f
        .ctx
        .coordinator
        .create_chat_group(group(&creator.id), &members)
        .await
        .unwrap_err();
    assert_eq!(err.committed, 3);
    assert_eq!(err.requested, 7);
    assert_eq!(err.batches, 1);
    assert!(matches!(err.source, RepoError::StoreUnavailable(_)));

    let groups = f.ctx.chat.groups_for_employee(&creator.id).await.unwrap();
    assert_eq!(groups.len(), 1);
}

#[tokio::test]
async fn deleting_a_missing_group_is_not_found() {
    let f = setup();
    let err = f.ctx.coordinator.delete_chat_group("nope").await.unwrap_err();
    assert_eq!(err.committed, 0);
    assert!(err.source.is_not_found());
}

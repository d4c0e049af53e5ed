//! tests/store_tests.rs - Lifecycle, ordering and failure handling of the transaction store

#[cfg(test)]
mod tests {
    use crate::{
        db::{KeyValueBackend, MemoryBackend},
        models::{NewTransaction, Transaction, TransactionStatus, TransitionTarget},
        store::{StoreError, TransactionStore, DEFAULT_STORAGE_KEY},
        validation::ValidationError,
    };
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    const PAYEE: &str = "merchant@okaxis";

    /// Setup a store over a fresh in-memory backend
    fn setup() -> (TransactionStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = TransactionStore::new(backend.clone(), DEFAULT_STORAGE_KEY);
        (store, backend)
    }

    fn new_tx(amount: &str) -> NewTransaction {
        NewTransaction {
            payee_address: PAYEE.to_string(),
            payee_name: Some("Merchant".to_string()),
            amount: amount.to_string(),
            note: Some("groceries".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_returns_pending_record_listed_first() {
        let (store, _) = setup();

        let first = store.create(new_tx("10")).await.unwrap();
        let second = store.create(new_tx("20")).await.unwrap();

        assert_eq!(second.status, TransactionStatus::Pending);
        assert_eq!(second.deleted_at, None);
        assert_ne!(first.id, second.id);

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], second, "newest record should be listed first");
        assert_eq!(listed[1], first);
    }

    #[tokio::test]
    async fn test_n_creates_are_listed_in_reverse_order() {
        let (store, _) = setup();

        for i in 0..5 {
            store.create(new_tx(&i.to_string())).await.unwrap();
        }

        let amounts: Vec<String> = store.list().await.unwrap().into_iter().map(|tx| tx.amount).collect();
        assert_eq!(amounts, vec!["4", "3", "2", "1", "0"]);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields() {
        let (store, backend) = setup();

        let result = store.create(NewTransaction { amount: "5".to_string(), ..Default::default() }).await;
        assert!(matches!(
            result,
            Err(StoreError::Validation(ValidationError::MissingParameter(_)))
        ));
        assert!(backend.raw(DEFAULT_STORAGE_KEY).await.is_none(), "nothing should be written");
    }

    #[tokio::test]
    async fn test_display_date_and_time_derive_from_created_at() {
        let (store, _) = setup();
        let at = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();

        let tx = store.create_at(new_tx("1"), at).await.unwrap();

        assert_eq!(tx.created_at, at);
        assert_eq!(tx.date(), "2024-12-31");
        assert_eq!(tx.time(), "23:59:59");
    }

    #[tokio::test]
    async fn test_completed_transition() {
        let (store, _) = setup();
        let tx = store.create(new_tx("10")).await.unwrap();

        let done = store.transition(&tx.id, TransitionTarget::Completed).await.unwrap();
        assert_eq!(done.status, TransactionStatus::Completed);
        assert_eq!(done.deleted_at, None);

        // Completed is terminal
        let again = store.transition(&tx.id, TransitionTarget::Failed).await;
        assert!(matches!(
            again,
            Err(StoreError::InvalidTransition { from: TransactionStatus::Completed, .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_collapses_to_deleted() {
        let (store, _) = setup();
        let tx = store.create(new_tx("10")).await.unwrap();
        let at = Utc::now() + Duration::minutes(3);

        let failed = store.transition_at(&tx.id, TransitionTarget::Failed, at).await.unwrap();
        assert_eq!(failed.status, TransactionStatus::Deleted);
        assert_eq!(failed.deleted_at, Some(at));

        let stored = store.get(&tx.id).await.unwrap();
        assert_eq!(stored.status, TransactionStatus::Deleted);
        assert_eq!(stored.deleted_at, Some(at));
    }

    #[tokio::test]
    async fn test_restore_after_failure() {
        let (store, _) = setup();
        let tx = store.create(new_tx("10")).await.unwrap();
        store.transition(&tx.id, TransitionTarget::Failed).await.unwrap();

        let restored = store.restore(&tx.id).await.unwrap();
        assert_eq!(restored.status, TransactionStatus::Pending);
        assert_eq!(restored.deleted_at, None);

        // Restored records can be transitioned again
        let done = store.transition(&tx.id, TransitionTarget::Completed).await.unwrap();
        assert_eq!(done.status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn test_restore_requires_deleted() {
        let (store, _) = setup();
        let tx = store.create(new_tx("10")).await.unwrap();

        let result = store.restore(&tx.id).await;
        assert!(matches!(
            result,
            Err(StoreError::InvalidTransition { from: TransactionStatus::Pending, .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (store, _) = setup();
        store.create(new_tx("10")).await.unwrap();

        assert!(matches!(store.get("missing").await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.transition("missing", TransitionTarget::Completed).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.restore("missing").await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("missing").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_any_status() {
        let (store, _) = setup();
        let pending = store.create(new_tx("1")).await.unwrap();
        let completed = store.create(new_tx("2")).await.unwrap();
        let deleted = store.create(new_tx("3")).await.unwrap();
        store.transition(&completed.id, TransitionTarget::Completed).await.unwrap();
        store.transition(&deleted.id, TransitionTarget::Failed).await.unwrap();

        for id in [&pending.id, &completed.id, &deleted.id] {
            store.delete(id).await.unwrap();
        }

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (store, backend) = setup();
        for i in 0..3 {
            store.create(new_tx(&i.to_string())).await.unwrap();
        }

        assert_eq!(store.clear_all().await.unwrap(), 3);
        assert!(store.list().await.unwrap().is_empty());
        assert!(backend.raw(DEFAULT_STORAGE_KEY).await.is_none());
    }

    #[tokio::test]
    async fn test_list_by_status_keeps_order() {
        let (store, _) = setup();
        let a = store.create(new_tx("1")).await.unwrap();
        let b = store.create(new_tx("2")).await.unwrap();
        let c = store.create(new_tx("3")).await.unwrap();
        store.transition(&b.id, TransitionTarget::Completed).await.unwrap();

        let pending: Vec<String> = store
            .list_by_status(TransactionStatus::Pending)
            .await
            .unwrap()
            .into_iter()
            .map(|tx| tx.id)
            .collect();
        assert_eq!(pending, vec![c.id, a.id]);
    }

    #[tokio::test]
    async fn test_persisted_blob_shape() {
        let (store, backend) = setup();
        let kept = store.create(new_tx("1")).await.unwrap();
        let failed = store.create(new_tx("2")).await.unwrap();
        store.transition(&failed.id, TransitionTarget::Failed).await.unwrap();

        let blob = backend.raw(DEFAULT_STORAGE_KEY).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
        let records = value.as_array().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], failed.id.as_str());
        assert_eq!(records[0]["status"], "Deleted");
        assert!(records[0].get("deletedAt").is_some());
        assert_eq!(records[1]["id"], kept.id.as_str());
        assert_eq!(records[1]["payeeAddress"], PAYEE);
        assert!(records[1].get("deletedAt").is_none(), "deletedAt only present when deleted");
    }

    #[tokio::test]
    async fn test_existing_blob_is_loaded_lazily() {
        let existing = Transaction {
            id: "seeded".to_string(),
            created_at: Utc::now(),
            payee_address: PAYEE.to_string(),
            payee_name: None,
            amount: "42".to_string(),
            note: None,
            status: TransactionStatus::Completed,
            deleted_at: None,
        };
        let blob = serde_json::to_string(&vec![existing.clone()]).unwrap();
        let backend = Arc::new(MemoryBackend::with_entry(DEFAULT_STORAGE_KEY, &blob));
        let store = TransactionStore::new(backend, DEFAULT_STORAGE_KEY);

        let created = store.create(new_tx("1")).await.unwrap();
        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![created, existing]);
    }

    #[tokio::test]
    async fn test_list_surfaces_read_failures() {
        let (store, backend) = setup();
        backend.set_fail_reads(true);

        let result = store.list().await;
        assert!(
            matches!(result, Err(StoreError::StorageUnavailable(_))),
            "read failures must not look like an empty history"
        );
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state_unchanged() {
        let (store, backend) = setup();
        let tx = store.create(new_tx("1")).await.unwrap();
        backend.set_fail_writes(true);

        assert!(matches!(store.create(new_tx("2")).await, Err(StoreError::StorageUnavailable(_))));
        assert!(matches!(
            store.transition(&tx.id, TransitionTarget::Completed).await,
            Err(StoreError::StorageUnavailable(_))
        ));
        assert!(matches!(store.clear_all().await, Err(StoreError::StorageUnavailable(_))));

        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![tx]);
    }

    #[tokio::test]
    async fn test_corrupted_blob_is_reported() {
        let backend = Arc::new(MemoryBackend::with_entry(DEFAULT_STORAGE_KEY, "{not json"));
        let store = TransactionStore::new(backend, DEFAULT_STORAGE_KEY);

        assert!(matches!(store.list().await, Err(StoreError::Corrupted(_))));
    }

    #[tokio::test]
    async fn test_clear_all_recovers_from_corrupted_blob() {
        let backend = Arc::new(MemoryBackend::with_entry(DEFAULT_STORAGE_KEY, "{not json"));
        let store = TransactionStore::new(backend.clone(), DEFAULT_STORAGE_KEY);

        assert_eq!(store.clear_all().await.unwrap(), 0);
        assert!(backend.raw(DEFAULT_STORAGE_KEY).await.is_none());
        assert!(store.list().await.unwrap().is_empty());

        // The store is usable again afterwards
        let created = store.create(new_tx("5")).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_stray_deletion_time_is_dropped_on_load() {
        let seeded = Transaction {
            id: "seeded".to_string(),
            created_at: Utc::now(),
            payee_address: PAYEE.to_string(),
            payee_name: None,
            amount: "42".to_string(),
            note: None,
            status: TransactionStatus::Completed,
            deleted_at: Some(Utc::now() - Duration::days(90)),
        };
        let blob = serde_json::to_string(&vec![seeded]).unwrap();
        let backend = Arc::new(MemoryBackend::with_entry(DEFAULT_STORAGE_KEY, &blob));
        let store = TransactionStore::new(backend, DEFAULT_STORAGE_KEY);

        let loaded = store.get("seeded").await.unwrap();
        assert_eq!(loaded.status, TransactionStatus::Completed);
        assert_eq!(loaded.deleted_at, None);

        // A completed record is never swept, whatever the blob said
        assert_eq!(store.purge_deleted_before(Utc::now()).await.unwrap(), 0);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_are_all_persisted() {
        let (store, backend) = setup();
        let count = 50;

        let tasks = (0..count).map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.create(new_tx(&i.to_string())).await })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(store.list().await.unwrap().len(), count);

        // A fresh store over the same backend sees every record
        let reopened = TransactionStore::new(backend.clone(), DEFAULT_STORAGE_KEY);
        assert_eq!(reopened.list().await.unwrap().len(), count);
        assert!(backend.get(DEFAULT_STORAGE_KEY).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mixed_mutations_do_not_lose_updates() {
        let (store, _) = setup();
        let mut ids = Vec::new();
        for i in 0..20 {
            ids.push(store.create(new_tx(&i.to_string())).await.unwrap().id);
        }

        let tasks = ids.iter().enumerate().map(|(i, id)| {
            let store = store.clone();
            let id = id.clone();
            tokio::spawn(async move {
                let target = if i % 2 == 0 { TransitionTarget::Completed } else { TransitionTarget::Failed };
                store.transition(&id, target).await
            })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let completed = store.list_by_status(TransactionStatus::Completed).await.unwrap();
        let deleted = store.list_by_status(TransactionStatus::Deleted).await.unwrap();
        assert_eq!(completed.len(), 10);
        assert_eq!(deleted.len(), 10);
        assert!(deleted.iter().all(|tx| tx.deleted_at.is_some()));
    }
}

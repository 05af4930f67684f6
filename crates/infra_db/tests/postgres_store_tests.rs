//! PostgreSQL claim store tests
//!
//! These run against a throwaway container and need a Docker daemon:
//! `cargo test -p infra_db -- --ignored`

use core_kernel::{ClaimId, HealthCheckable};
use domain_claims::{ClaimEvent, ClaimPatch, ClaimStatus, ClaimStorePort, NewClaim, PhotoListChange};
use infra_db::PostgresClaimStore;
use rust_decimal_macros::dec;
use test_utils::{MemberFixtures, TemporalFixtures, TestDatabase, VehicleFixtures};

async fn store() -> (TestDatabase, PostgresClaimStore) {
    let db = TestDatabase::new().await.expect("postgres container");
    let store = PostgresClaimStore::new(db.pool().clone());
    (db, store)
}

fn jane_claim() -> NewClaim {
    NewClaim::new(VehicleFixtures::civic(), MemberFixtures::jane())
}

// ============================================================================
// Store Tests
// ============================================================================

mod store_tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_create_then_get_returns_draft() {
        let (_db, store) = store().await;

        let id = store.create(jane_claim()).await.unwrap();
        let claim = store.get(id).await.unwrap();

        assert!(claim.is_draft());
        assert_eq!(claim.id, id);
        assert_eq!(claim.vehicle.describe(), "2020 Honda Civic");
        assert!(claim.created_at.is_some());
        assert!(claim.photo_urls.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_get_unknown_claim_is_not_found() {
        let (_db, store) = store().await;

        let err = store.get(ClaimId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_merge_only_touches_given_fields() {
        let (_db, store) = store().await;
        let id = store.create(jane_claim()).await.unwrap();

        let patch = ClaimPatch {
            status: Some(ClaimStatus::Pending),
            amount: Some(dec!(500)),
            description: Some("Rear-ended".into()),
            date: Some(TemporalFixtures::incident_date()),
            ..ClaimPatch::default()
        };
        store.merge(id, patch).await.unwrap();
        let claim = store.merge(id, ClaimPatch::assigned_to("tow-7")).await.unwrap();

        assert_eq!(claim.status, Some(ClaimStatus::Pending));
        assert_eq!(claim.amount, Some(dec!(500)));
        assert_eq!(claim.description.as_deref(), Some("Rear-ended"));
        assert_eq!(claim.assigned_to.as_deref(), Some("tow-7"));
        assert!(claim.updated_at >= claim.created_at);
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_merge_unknown_claim_is_not_found() {
        let (_db, store) = store().await;

        let err = store
            .merge(ClaimId::new(), ClaimPatch::description("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_photo_changes_are_set_operations() {
        let (_db, store) = store().await;
        let id = store.create(jane_claim()).await.unwrap();

        for url in ["a", "b", "a"] {
            store
                .merge(id, ClaimPatch::photos(PhotoListChange::Append(url.into())))
                .await
                .unwrap();
        }
        assert_eq!(store.get(id).await.unwrap().photo_urls, vec!["a", "b"]);

        let claim = store
            .merge(id, ClaimPatch::photos(PhotoListChange::Remove("a".into())))
            .await
            .unwrap();
        assert_eq!(claim.photo_urls, vec!["b"]);
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_delete_is_idempotent() {
        let (_db, store) = store().await;
        let id = store.create(jane_claim()).await.unwrap();

        store.delete(id).await.unwrap();
        store.delete(id).await.unwrap();
        assert!(store.get(id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_list_by_owner_ignores_case() {
        let (_db, store) = store().await;
        store.create(jane_claim()).await.unwrap();
        store
            .create(NewClaim::new(VehicleFixtures::corolla(), MemberFixtures::john()))
            .await
            .unwrap();

        let mine = store.list_by_owner("JANE@x.com").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_writes_publish_events() {
        let (_db, store) = store().await;
        let mut events = store.subscribe();

        let id = store.create(jane_claim()).await.unwrap();
        store.merge(id, ClaimPatch::status(ClaimStatus::Pending)).await.unwrap();
        store.delete(id).await.unwrap();

        assert!(matches!(events.recv().await.unwrap(), ClaimEvent::Created { .. }));
        match events.recv().await.unwrap() {
            ClaimEvent::Updated { status, owner, .. } => {
                assert_eq!(status, Some(ClaimStatus::Pending));
                assert_eq!(owner, "jane@x.com");
            }
            other => panic!("expected update, got {:?}", other),
        }
        assert!(matches!(events.recv().await.unwrap(), ClaimEvent::Deleted { .. }));
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_health_check() {
        let (_db, store) = store().await;

        let result = store.health_check().await;
        assert!(result.is_healthy());
        assert_eq!(result.adapter_id, "postgres-claim-store");
    }
}

//! Comprehensive tests for domain_claims

use proptest::prelude::*;
use rust_decimal_macros::dec;

use std::sync::Arc;

use core_kernel::ClaimId;

use domain_claims::ports::mock::{InMemoryBlobStore, InMemoryClaimStore};
use domain_claims::{
    search, Actor, ClaimError, ClaimEvent, ClaimServices, ClaimStatus, ClaimStorePort,
    ClaimsConfig, SearchCriteria, SortBy,
};
use test_utils::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Moves a submitted claim to `status` through the admin transitions
async fn drive_to(harness: &ClaimsHarness, id: ClaimId, status: ClaimStatus) {
    let admin = MemberFixtures::admin();
    let moderation = &harness.services.moderation;
    match status {
        ClaimStatus::Pending => {}
        ClaimStatus::InReview => {
            moderation.transition(id, ClaimStatus::InReview, &admin).await.unwrap();
        }
        decided => {
            moderation.transition(id, ClaimStatus::InReview, &admin).await.unwrap();
            moderation.transition(id, decided, &admin).await.unwrap();
        }
    }
}

// ============================================================================
// Authoring Tests
// ============================================================================

mod authoring_tests {
    use super::*;

    #[tokio::test]
    async fn test_draft_and_submit_civic() {
        let harness = ClaimsHarness::new();
        let id = harness.jane_submitted().await;

        let claim = harness.store.get(id).await.unwrap();
        assert_status(&claim, ClaimStatus::Pending);
        assert_eq!(claim.amount, Some(dec!(500)));
        assert_eq!(claim.vehicle.vehicle_make, "Honda");
        assert_eq!(claim.description.as_deref(), Some("Rear-ended"));
        assert_eq!(claim.date, Some(TemporalFixtures::incident_date()));
        assert!(claim.updated_at > claim.created_at);
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_draft() {
        let harness = ClaimsHarness::new();
        let id = harness.jane_draft().await;

        let err = harness
            .services
            .authoring
            .submit(id, SubmissionFixtures::empty(), &MemberFixtures::jane_actor())
            .await
            .unwrap_err();

        assert_validation_fields(&err, &["description", "userPhoneNumber", "amount"]);
        assert!(harness.store.get(id).await.unwrap().is_draft());
    }

    #[tokio::test]
    async fn test_photos_attached_during_draft_survive_submission() {
        let harness = ClaimsHarness::new();
        let jane = MemberFixtures::jane_actor();
        let id = harness.jane_draft().await;
        let url = harness
            .services
            .self_service
            .add_photos(id, vec![PhotoFixtures::jpeg(1)], &jane)
            .await
            .unwrap()
            .remove(0)
            .unwrap();

        let claim = harness
            .services
            .authoring
            .submit(id, SubmissionFixtures::rear_ended(), &jane)
            .await
            .unwrap();
        assert_eq!(claim.photo_urls, vec![url]);
    }

    #[tokio::test]
    async fn test_vehicle_snapshot_is_a_copy() {
        let harness = ClaimsHarness::new();
        let mut vehicle = VehicleFixtures::civic();
        let id = harness
            .services
            .authoring
            .draft(vehicle.clone(), MemberFixtures::jane(), &MemberFixtures::jane_actor())
            .await
            .unwrap();

        vehicle.vehicle_model = "Accord".to_string();
        assert_eq!(harness.store.get(id).await.unwrap().vehicle.vehicle_model, "Civic");
    }

    #[tokio::test]
    async fn test_submission_cannot_borrow_another_members_photo() {
        let harness = ClaimsHarness::new();
        let jane = MemberFixtures::jane_actor();
        let john = MemberFixtures::john_actor();
        let draft = harness.jane_draft().await;
        let johns = harness.john_submitted("Hail").await;
        let johns_url = harness
            .services
            .self_service
            .add_photos(johns, vec![PhotoFixtures::jpeg(7)], &john)
            .await
            .unwrap()
            .remove(0)
            .unwrap();

        let mut submission = SubmissionFixtures::rear_ended();
        submission.photo_urls = Some(vec![johns_url.clone()]);
        let err = harness
            .services
            .authoring
            .submit(draft, submission, &jane)
            .await
            .unwrap_err();
        assert_validation_fields(&err, &["photoURLs"]);

        harness.services.self_service.remove_photo(johns, &johns_url, &john).await.unwrap();
        let mine = harness.store.get(draft).await.unwrap();
        assert!(mine.is_draft());
        assert!(mine.photo_urls.is_empty());
    }

    proptest! {
        #[test]
        fn submitted_incident_date_is_kept(date in incident_date_strategy()) {
            runtime().block_on(async {
                let harness = ClaimsHarness::new();
                let id = harness.jane_draft().await;
                let mut submission = SubmissionFixtures::rear_ended();
                submission.date = date;

                let claim = harness
                    .services
                    .authoring
                    .submit(id, submission, &MemberFixtures::jane_actor())
                    .await
                    .unwrap();
                assert_eq!(claim.date, Some(date));
            });
        }
    }
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_review_approve_then_cancel_fails() {
        let harness = ClaimsHarness::new();
        let admin = MemberFixtures::admin();
        let id = harness.jane_submitted().await;

        let claim = harness
            .services
            .moderation
            .transition(id, ClaimStatus::InReview, &admin)
            .await
            .unwrap();
        assert_status(&claim, ClaimStatus::InReview);

        let claim = harness
            .services
            .moderation
            .transition(id, ClaimStatus::Approved, &admin)
            .await
            .unwrap();
        assert_status(&claim, ClaimStatus::Approved);

        let err = harness
            .services
            .self_service
            .cancel(id, &MemberFixtures::jane_actor())
            .await
            .unwrap_err();
        assert_invalid_transition(&err);
        assert!(err.user_message().contains("already been processed"));
    }

    #[tokio::test]
    async fn test_direct_decision_from_pending() {
        let harness = ClaimsHarness::new();
        let id = harness.jane_submitted().await;
        let claim = harness
            .services
            .moderation
            .transition(id, ClaimStatus::Denied, &MemberFixtures::admin())
            .await
            .unwrap();
        assert_status(&claim, ClaimStatus::Denied);
    }

    #[tokio::test]
    async fn test_members_cannot_moderate() {
        let harness = ClaimsHarness::new();
        let jane = MemberFixtures::jane_actor();
        let id = harness.jane_submitted().await;

        assert_forbidden(
            &harness.services.moderation.transition(id, ClaimStatus::Approved, &jane).await.unwrap_err(),
        );
        assert_forbidden(&harness.services.moderation.delete(id, &jane).await.unwrap_err());
        assert_forbidden(&harness.services.moderation.assign(id, "p-1", &jane).await.unwrap_err());
        assert_invalid_transition(
            &harness.services.lifecycle.transition(id, ClaimStatus::Approved, &jane).await.unwrap_err(),
        );
    }

    #[tokio::test]
    async fn test_admin_delete_twice_is_fine() {
        let harness = ClaimsHarness::new();
        let admin = MemberFixtures::admin();
        let id = harness.jane_submitted().await;

        harness.services.moderation.delete(id, &admin).await.unwrap();
        harness.services.moderation.delete(id, &admin).await.unwrap();
        harness.store.delete(id).await.unwrap();
        assert_claim_not_found(&harness.services.self_service.view(id, &MemberFixtures::jane_actor()).await.unwrap_err());
    }

    #[tokio::test]
    async fn test_cancel_removes_photos() {
        let harness = ClaimsHarness::new();
        let jane = MemberFixtures::jane_actor();
        let id = harness.jane_submitted().await;
        let results = harness
            .services
            .self_service
            .add_photos(id, vec![PhotoFixtures::jpeg(1), PhotoFixtures::png(2)], &jane)
            .await
            .unwrap();
        assert!(results.iter().all(Result::is_ok));

        harness.services.self_service.cancel(id, &jane).await.unwrap();
        assert!(harness.blobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces() {
        let harness = ClaimsHarness::new();
        let id = harness.jane_submitted().await;
        harness.store.set_unavailable(true);

        let err = harness
            .services
            .moderation
            .transition(id, ClaimStatus::InReview, &MemberFixtures::admin())
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Transport(_)));
        assert!(err.user_message().contains("try again"));

        harness.store.set_unavailable(false);
        assert_status(&harness.store.get(id).await.unwrap(), ClaimStatus::Pending);
    }

    proptest! {
        #[test]
        fn terminal_claims_reject_every_move(
            terminal in terminal_status_strategy(),
            target in claim_status_strategy(),
        ) {
            runtime().block_on(async {
                let harness = ClaimsHarness::new();
                let id = harness.jane_submitted().await;
                drive_to(&harness, id, terminal).await;
                let before = harness.store.get(id).await.unwrap();

                let admin = MemberFixtures::admin();
                let jane = MemberFixtures::jane_actor();
                let moved = harness.services.moderation.transition(id, target, &admin).await;
                let cancelled = harness.services.self_service.cancel(id, &jane).await;

                assert!(moved.unwrap_err().is_invalid_transition());
                assert!(cancelled.unwrap_err().is_invalid_transition());
                assert_eq!(harness.store.get(id).await.unwrap(), before);
            });
        }

        #[test]
        fn open_claims_cancel_exactly_once(status in cancellable_status_strategy()) {
            runtime().block_on(async {
                let harness = ClaimsHarness::new();
                let jane = MemberFixtures::jane_actor();
                let id = harness.jane_submitted().await;
                drive_to(&harness, id, status).await;

                harness.services.self_service.cancel(id, &jane).await.unwrap();
                assert_claim_not_found(&harness.store.get(id).await.map_err(ClaimError::from).unwrap_err());
                assert_claim_not_found(&harness.services.self_service.cancel(id, &jane).await.unwrap_err());
            });
        }
    }
}

// ============================================================================
// Photo Tests
// ============================================================================

mod photo_tests {
    use super::*;

    #[tokio::test]
    async fn test_attach_twice() {
        let harness = ClaimsHarness::new();
        let id = harness.jane_submitted().await;
        let photos = &harness.services.photos;

        let first = photos.attach(id, PhotoFixtures::jpeg(1)).await.unwrap();
        let second = photos.attach(id, PhotoFixtures::jpeg(2)).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(harness.store.get(id).await.unwrap().photo_urls.len(), 2);
        assert_eq!(harness.blobs.fetch(&first).await, Some(PhotoFixtures::jpeg(1)));
        assert_eq!(harness.blobs.fetch(&second).await, Some(PhotoFixtures::jpeg(2)));
    }

    #[tokio::test]
    async fn test_cap_applies_per_claim() {
        let harness = ClaimsHarness::with_config(ClaimsConfig::default().with_max_photos(2));
        let jane = MemberFixtures::jane_actor();
        let id = harness.jane_submitted().await;

        let results = harness
            .services
            .self_service
            .add_photos(id, (1..=3).map(PhotoFixtures::jpeg).collect(), &jane)
            .await
            .unwrap();

        assert!(results[0].is_ok() && results[1].is_ok());
        assert!(matches!(results[2], Err(ClaimError::PhotoLimitReached(2))));
    }

    #[tokio::test]
    async fn test_non_image_upload_is_rejected() {
        let harness = ClaimsHarness::new();
        let id = harness.jane_submitted().await;

        let err = harness
            .services
            .photos
            .attach(id, PhotoFixtures::not_an_image())
            .await
            .unwrap_err();

        assert_validation_fields(&err, &["photo"]);
        assert!(harness.store.get(id).await.unwrap().photo_urls.is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_url_still_scoped() {
        let harness = ClaimsHarness::new();
        let jane = MemberFixtures::jane_actor();
        let id = harness.jane_submitted().await;

        harness
            .services
            .self_service
            .remove_photo(id, "memory://blobs/elsewhere/x.jpg", &jane)
            .await
            .unwrap();
        assert!(harness.store.get(id).await.unwrap().photo_urls.is_empty());
    }

    proptest! {
        #[test]
        fn add_then_remove_is_identity(
            existing in 0u8..3,
            noise in 0u8..4,
        ) {
            runtime().block_on(async {
                let harness = ClaimsHarness::new();
                let jane = MemberFixtures::jane_actor();
                let mine = harness.jane_submitted().await;
                let other = harness.john_submitted("Hail").await;
                let photos = &harness.services.photos;

                for seed in 0..existing {
                    photos.attach(mine, PhotoFixtures::jpeg(seed)).await.unwrap();
                }
                let before = harness.store.get(mine).await.unwrap().photo_urls;

                let url = harness
                    .services
                    .self_service
                    .add_photos(mine, vec![PhotoFixtures::jpeg(99)], &jane)
                    .await
                    .unwrap()
                    .remove(0)
                    .unwrap();
                for seed in 0..noise {
                    let foreign = photos.attach(other, PhotoFixtures::jpeg(seed)).await.unwrap();
                    if seed % 2 == 0 {
                        photos.detach(other, &foreign).await.unwrap();
                    }
                }
                harness.services.self_service.remove_photo(mine, &url, &jane).await.unwrap();

                assert_eq!(harness.store.get(mine).await.unwrap().photo_urls, before);
            });
        }
    }
}

// ============================================================================
// Moderation Tests
// ============================================================================

mod moderation_tests {
    use super::*;

    #[tokio::test]
    async fn test_search_civic() {
        let harness = ClaimsHarness::new();
        let civic = harness.jane_submitted().await;
        harness.john_submitted("Hail on the hood").await;

        let hits = harness
            .services
            .moderation
            .review_queue(&MemberFixtures::admin(), &SearchCriteria::new().with_text("civic"))
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, civic);
    }

    #[tokio::test]
    async fn test_review_queue_hides_drafts() {
        let harness = ClaimsHarness::new();
        harness.jane_draft().await;
        let submitted = harness.jane_submitted().await;

        let queue = harness
            .services
            .moderation
            .review_queue(&MemberFixtures::admin(), &SearchCriteria::new())
            .await
            .unwrap();
        assert_eq!(queue.iter().map(|c| c.id).collect::<Vec<_>>(), vec![submitted]);

        let mine = harness
            .services
            .self_service
            .my_claims(&MemberFixtures::jane_actor())
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert_newest_first(&mine);
    }

    #[tokio::test]
    async fn test_queue_over_existing_records() {
        let photographed = ClaimBuilder::new()
            .with_status(ClaimStatus::InReview)
            .with_photo("memory://blobs/claims/legacy/1.jpg")
            .build();
        let draft = ClaimBuilder::draft().with_description("never sent").build();
        let store = InMemoryClaimStore::with_claims(vec![draft, photographed.clone()]).await;
        let services = ClaimServices::new(
            Arc::new(store),
            Arc::new(InMemoryBlobStore::new()),
            ClaimsConfig::default(),
        );

        let queue = services
            .moderation
            .review_queue(&MemberFixtures::admin(), &SearchCriteria::new())
            .await
            .unwrap();

        assert_eq!(queue, vec![photographed]);
    }

    #[tokio::test]
    async fn test_queue_filters_by_lenient_status() {
        let harness = ClaimsHarness::new();
        let admin = MemberFixtures::admin();
        let reviewed = harness.jane_submitted().await;
        harness.john_submitted("Hail").await;
        drive_to(&harness, reviewed, ClaimStatus::InReview).await;

        let criteria = SearchCriteria::parse(Some("in_review"), None, Some("oldest")).unwrap();
        let queue = harness.services.moderation.review_queue(&admin, &criteria).await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, reviewed);

        assert!(SearchCriteria::parse(Some("closed"), None, None).is_err());
    }

    #[test]
    fn test_amount_sort() {
        let big = ClaimBuilder::new().with_amount(dec!(900)).build();
        let none = ClaimBuilder::new().build();
        let small = ClaimBuilder::new().with_amount(dec!(50)).build();

        let sorted = search(
            vec![none.clone(), small.clone(), big.clone()],
            &SearchCriteria::new().with_sort(SortBy::Amount),
        );
        assert_eq!(sorted, vec![big, small, none]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let a = ClaimBuilder::new().with_description("a").build();
        let b = ClaimBuilder::new().with_description("b").build();

        let newest = search(vec![a.clone(), b.clone()], &SearchCriteria::new());
        let oldest = search(vec![a.clone(), b.clone()], &SearchCriteria::new().with_sort(SortBy::Oldest));
        assert_eq!(newest, vec![a.clone(), b.clone()]);
        assert_eq!(oldest, vec![a, b]);
    }

    #[tokio::test]
    async fn test_admin_watch_sees_everything() {
        let harness = ClaimsHarness::new();
        let mut watch = harness.services.moderation.watch(&MemberFixtures::admin()).unwrap();
        let id = harness.john_submitted("Hail").await;

        assert!(matches!(watch.next().await, Some(ClaimEvent::Created { claim_id, .. }) if claim_id == id));
        assert!(matches!(
            watch.next().await,
            Some(ClaimEvent::Updated { status: Some(ClaimStatus::Pending), .. })
        ));
        assert_forbidden(&harness.services.moderation.watch(&Actor::member("jane@x.com")).unwrap_err());
    }

    proptest! {
        #[test]
        fn unfiltered_search_preserves_count(
            claims in claims_with_distinct_times_strategy(12),
            sort in sort_strategy(),
        ) {
            let results = search(claims.clone(), &SearchCriteria::new().with_sort(sort));
            prop_assert_eq!(results.len(), claims.len());
        }

        #[test]
        fn newest_is_reverse_of_oldest(claims in claims_with_distinct_times_strategy(12)) {
            let newest = search(claims.clone(), &SearchCriteria::new());
            let mut oldest = search(claims, &SearchCriteria::new().with_sort(SortBy::Oldest));
            oldest.reverse();
            prop_assert_eq!(newest, oldest);
        }

        #[test]
        fn filter_only_returns_matching_status(
            claims in claims_with_distinct_times_strategy(12),
            filter in status_filter_strategy(),
        ) {
            let results = search(claims, &SearchCriteria::new().with_status(filter));
            prop_assert!(results.iter().all(|c| filter.matches(c.status)));
        }

        #[test]
        fn legacy_spellings_normalise((status, spelled) in status_spelling_strategy()) {
            prop_assert_eq!(spelled.parse::<ClaimStatus>().unwrap(), status);
            prop_assert!(ClaimStatus::ALL.iter().any(|s| s.as_str() == status.to_string()));
        }
    }
}

//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating claim data that keeps the
//! domain invariants (canonical statuses, non-negative amounts).

use chrono::{Duration, NaiveDate};
use domain_claims::{Claim, ClaimStatus, SortBy, StatusFilter, VehicleSnapshot};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::builders::ClaimBuilder;
use crate::fixtures::TemporalFixtures;

/// Strategy for submitted statuses
pub fn claim_status_strategy() -> impl Strategy<Value = ClaimStatus> {
    prop::sample::select(ClaimStatus::ALL.to_vec())
}

/// Strategy for terminal statuses
pub fn terminal_status_strategy() -> impl Strategy<Value = ClaimStatus> {
    prop_oneof![Just(ClaimStatus::Approved), Just(ClaimStatus::Denied)]
}

/// Strategy for statuses a member may still cancel from
pub fn cancellable_status_strategy() -> impl Strategy<Value = ClaimStatus> {
    prop_oneof![Just(ClaimStatus::Pending), Just(ClaimStatus::InReview)]
}

/// Strategy for spellings of a status found in legacy documents
pub fn status_spelling_strategy() -> impl Strategy<Value = (ClaimStatus, String)> {
    (claim_status_strategy(), 0usize..4).prop_map(|(status, style)| {
        let canonical = status.as_str();
        let spelled = match style {
            0 => canonical.to_string(),
            1 => canonical.to_lowercase(),
            2 => canonical.to_uppercase().replace(' ', "_"),
            _ => canonical.replace(' ', "-").to_lowercase(),
        };
        (status, spelled)
    })
}

/// Strategy for status filters
pub fn status_filter_strategy() -> impl Strategy<Value = StatusFilter> {
    prop_oneof![
        Just(StatusFilter::All),
        Just(StatusFilter::Pending),
        Just(StatusFilter::InReview),
        Just(StatusFilter::Approved),
        Just(StatusFilter::Denied),
    ]
}

/// Strategy for listing orders
pub fn sort_strategy() -> impl Strategy<Value = SortBy> {
    prop_oneof![Just(SortBy::Newest), Just(SortBy::Oldest), Just(SortBy::Amount)]
}

/// Strategy for optional non-negative amounts in cents
pub fn amount_strategy() -> impl Strategy<Value = Option<Decimal>> {
    prop::option::of((0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2)))
}

/// Strategy for vehicle snapshots
pub fn vehicle_strategy() -> impl Strategy<Value = VehicleSnapshot> {
    (
        1990i32..2026i32,
        prop::sample::select(vec!["Honda", "Toyota", "Ford", "Subaru"]),
        prop::sample::select(vec!["Civic", "Corolla", "Focus", "Outback"]),
    )
        .prop_map(|(year, make, model)| VehicleSnapshot::new(year, make, model))
}

/// Strategy for a set of submitted claims whose creation times are all distinct
///
/// Some records carry no creation time but an incident date instead, on a
/// day no other record uses.
pub fn claims_with_distinct_times_strategy(max: usize) -> impl Strategy<Value = Vec<Claim>> {
    prop::collection::vec(
        (claim_status_strategy(), amount_strategy(), vehicle_strategy(), any::<bool>()),
        0..max,
    )
    .prop_flat_map(|specs| {
        let len = specs.len();
        (Just(specs), Just((0..len).collect::<Vec<usize>>()).prop_shuffle())
    })
    .prop_map(|(specs, slots)| {
        specs
            .into_iter()
            .zip(slots)
            .map(|((status, amount, vehicle, legacy), slot)| {
                let mut builder = ClaimBuilder::new()
                    .with_status(status)
                    .with_vehicle(vehicle);
                if let Some(amount) = amount {
                    builder = builder.with_amount(amount);
                }
                if legacy {
                    // Whole days before the epoch never collide with minute offsets after it
                    let day = TemporalFixtures::incident_date() - Duration::days(slot as i64 + 1);
                    builder = builder.without_timestamps().with_date(day);
                } else {
                    builder = builder.created_minutes_after_epoch(slot as i64);
                }
                builder.build()
            })
            .collect()
    })
}

/// Strategy for incident dates in recent years
pub fn incident_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..2000).prop_map(|days| TemporalFixtures::incident_date() - Duration::days(days))
}

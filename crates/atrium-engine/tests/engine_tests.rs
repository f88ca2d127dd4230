//! End-to-end tests for the reservation engine against an in-memory
//! database: oversell protection, atomicity, release idempotence, pricing,
//! lifecycle side effects, and the hold sweeper.

use chrono::{NaiveDate, Utc};

use atrium_core::{
    BookingChannel, BookingStatus, CancellationPolicy, CoreError, Hotel, PaymentStatus,
    RestrictionRule, Room, RoomStatus, RoomType, SeasonalRate, SettlementStatus, ValidationError,
};
use atrium_db::{Database, DayRateUpdate, DbConfig};
use atrium_engine::{Engine, EngineError, HoldSweeper, StayRequest, SweeperConfig};

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// Run with `RUST_LOG=debug` to see the engine's structured logs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Fixture {
    hotel: Hotel,
    room_type: RoomType,
}

impl Default for Fixture {
    fn default() -> Self {
        let now = Utc::now();
        Fixture {
            hotel: Hotel {
                id: "h1".into(),
                name: "Harborview".into(),
                tax_rate_bps: 1000,
                service_charge_bps: 0,
                auto_confirm_bookings: false,
                cancellation_policy: CancellationPolicy::Flexible,
                cancellation_hours: 48,
                pending_hold_minutes: 30,
                created_at: now,
                updated_at: now,
            },
            room_type: RoomType {
                id: "rt1".into(),
                hotel_id: "h1".into(),
                name: "Deluxe".into(),
                base_price_cents: 10000,
                weekend_price_cents: None,
                extra_person_charge_cents: 0,
                child_charge_cents: 0,
                base_occupancy: 2,
                max_occupancy: 4,
                total_rooms: 5,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        }
    }
}

async fn engine_with(fixture: Fixture) -> Engine {
    init_tracing();
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.hotels().insert(&fixture.hotel).await.unwrap();
    db.rooms().insert_room_type(&fixture.room_type).await.unwrap();
    Engine::new(db)
}

fn request(check_in: &str, check_out: &str) -> StayRequest {
    StayRequest {
        hotel_id: "h1".into(),
        guest_id: "g1".into(),
        room_type_id: "rt1".into(),
        check_in: d(check_in),
        check_out: d(check_out),
        adults: 2,
        children: 0,
        channel: BookingChannel::Direct,
    }
}

async fn booked_on(engine: &Engine, date: &str) -> (i64, i64) {
    let record = engine
        .database()
        .availability()
        .find_day("h1", "rt1", d(date))
        .await
        .unwrap()
        .expect("day should be materialized");
    assert!(record.invariant_holds(), "derivation invariant broken on {date}");
    (record.booked_rooms, record.available_rooms)
}

// =============================================================================
// Booking + Quote
// =============================================================================

#[tokio::test]
async fn book_reserves_span_and_freezes_quote() {
    let engine = engine_with(Fixture::default()).await;

    // 2 nights at 10000 + 10% tax
    let result = engine.book(request("2024-06-01", "2024-06-03")).await.unwrap();
    assert_eq!(result.quote.room_subtotal_cents, 20000);
    assert_eq!(result.quote.tax_cents, 2000);
    assert_eq!(result.quote.total_cents, 22000);
    assert_eq!(result.booking.quoted_total_cents, 22000);
    assert_eq!(result.booking.status, BookingStatus::Pending);
    assert_eq!(result.booking.nights, 2);
    assert!(result.booking.code.starts_with("BK-"));

    assert_eq!(booked_on(&engine, "2024-06-01").await, (1, 4));
    assert_eq!(booked_on(&engine, "2024-06-02").await, (1, 4));
    // Check-out day is not a sold night
    assert!(engine
        .database()
        .availability()
        .find_day("h1", "rt1", d("2024-06-03"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn auto_confirm_hotel_skips_pending() {
    let mut fixture = Fixture::default();
    fixture.hotel.auto_confirm_bookings = true;
    let engine = engine_with(fixture).await;

    let result = engine.book(request("2024-06-01", "2024-06-02")).await.unwrap();
    assert_eq!(result.booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn seasonal_rate_beats_weekend_beats_base() {
    let mut fixture = Fixture::default();
    fixture.hotel.tax_rate_bps = 0;
    fixture.room_type.base_price_cents = 10000;
    fixture.room_type.weekend_price_cents = Some(15000);
    let engine = engine_with(fixture).await;

    engine
        .database()
        .rooms()
        .insert_seasonal_rate(&SeasonalRate {
            id: "s1".into(),
            room_type_id: "rt1".into(),
            name: "High Season".into(),
            start_date: d("2024-06-01"),
            end_date: d("2024-06-01"),
            price_cents: 20000,
            position: 0,
        })
        .await
        .unwrap();

    // 2024-06-01 (Saturday) inside the window: seasonal 20000 wins
    let result = engine.book(request("2024-06-01", "2024-06-02")).await.unwrap();
    assert_eq!(result.quote.total_cents, 20000);

    // 2024-06-08 (Saturday) outside the window: weekend 15000
    let result = engine.book(request("2024-06-08", "2024-06-09")).await.unwrap();
    assert_eq!(result.quote.total_cents, 15000);

    // 2024-06-10 (Monday): base 10000
    let result = engine.book(request("2024-06-10", "2024-06-11")).await.unwrap();
    assert_eq!(result.quote.total_cents, 10000);
}

#[tokio::test]
async fn min_stay_rejection_leaves_ledger_untouched() {
    let engine = engine_with(Fixture::default()).await;

    engine
        .set_day_rate(
            "h1",
            "rt1",
            d("2024-06-01"),
            &DayRateUpdate {
                selling_rate_cents: 10000,
                min_stay: Some(3),
                max_stay: None,
                closed_to_arrival: false,
                closed_to_departure: false,
                stop_sell: false,
            },
        )
        .await
        .unwrap();

    let err = engine
        .book(request("2024-06-01", "2024-06-03"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::RateRestrictionViolation {
            rule: RestrictionRule::MinStay {
                required: 3,
                requested: 2
            },
            ..
        })
    ));

    assert_eq!(booked_on(&engine, "2024-06-01").await, (0, 5));

    // A 3-night stay satisfies the arrival-day rule
    engine.book(request("2024-06-01", "2024-06-04")).await.unwrap();
}

#[tokio::test]
async fn day_rate_override_beats_template_and_rejects_negative_rates() {
    let mut fixture = Fixture::default();
    fixture.hotel.tax_rate_bps = 0;
    let engine = engine_with(fixture).await;

    let record = engine
        .set_day_rate(
            "h1",
            "rt1",
            d("2024-06-03"),
            &DayRateUpdate {
                selling_rate_cents: 30000,
                min_stay: None,
                max_stay: None,
                closed_to_arrival: false,
                closed_to_departure: false,
                stop_sell: false,
            },
        )
        .await
        .unwrap();
    assert!(record.rate_overridden);

    // The overridden day prices at 30000 instead of the 10000 template
    let result = engine.book(request("2024-06-03", "2024-06-04")).await.unwrap();
    assert_eq!(result.quote.total_cents, 30000);

    let err = engine
        .set_day_rate(
            "h1",
            "rt1",
            d("2024-06-04"),
            &DayRateUpdate {
                selling_rate_cents: -100,
                min_stay: None,
                max_stay: None,
                closed_to_arrival: false,
                closed_to_departure: false,
                stop_sell: false,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::Validation(ValidationError::OutOfRange { .. }))
    ));
}

#[tokio::test]
async fn booking_code_lookup_validates_format() {
    let engine = engine_with(Fixture::default()).await;
    let booked = engine.book(request("2024-06-01", "2024-06-02")).await.unwrap();

    let found = engine.get_booking_by_code(&booked.booking.code).await.unwrap();
    assert_eq!(found.id, booked.booking.id);

    // Malformed codes never reach the database
    let err = engine.get_booking_by_code("not-a-code").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::Validation(ValidationError::InvalidFormat { .. }))
    ));

    // Well-formed but unknown codes are a not-found
    let err = engine.get_booking_by_code("BK-ZZZZZZ").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::BookingNotFound(_))
    ));
}

#[tokio::test]
async fn availability_calendar_resolves_rates_without_materializing() {
    let mut fixture = Fixture::default();
    fixture.room_type.weekend_price_cents = Some(15000);
    let engine = engine_with(fixture).await;

    engine.book(request("2024-06-03", "2024-06-04")).await.unwrap();

    // Mon 06-03 is materialized and booked; Sat 06-08 is rendered from
    // defaults with the weekend rate
    let days = engine
        .availability("h1", "rt1", d("2024-06-03"), d("2024-06-09"))
        .await
        .unwrap();
    assert_eq!(days.len(), 6);
    assert_eq!(days[0].booked_rooms, 1);
    assert_eq!(days[0].available_rooms, 4);
    assert_eq!(days[5].booked_rooms, 0);
    assert_eq!(days[5].rate.rate_cents, 15000);

    // The read did not materialize anything
    assert!(engine
        .database()
        .availability()
        .find_day("h1", "rt1", d("2024-06-08"))
        .await
        .unwrap()
        .is_none());
}

// =============================================================================
// Concurrency & Atomicity
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_bookings_never_oversell() {
    let mut fixture = Fixture::default();
    fixture.room_type.total_rooms = 3;
    let engine = engine_with(fixture).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let mut req = request("2024-06-01", "2024-06-02");
            req.guest_id = format!("g{i}");
            engine.book(req).await
        }));
    }

    let mut succeeded = 0;
    let mut unavailable = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(EngineError::Core(CoreError::RoomNotAvailable { .. })) => unavailable += 1,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(succeeded, 3, "exactly the physical capacity must succeed");
    assert_eq!(unavailable, 5);
    assert_eq!(booked_on(&engine, "2024-06-01").await, (3, 0));
}

#[tokio::test]
async fn multi_night_reserve_is_all_or_nothing() {
    let engine = engine_with(Fixture::default()).await;
    let availability = engine.database().availability();

    // Materialize the span, then block out the middle night entirely
    engine.book(request("2024-06-01", "2024-06-04")).await.unwrap();
    availability
        .set_blocked("h1", "rt1", d("2024-06-02"), 4)
        .await
        .unwrap();
    assert_eq!(booked_on(&engine, "2024-06-02").await, (1, 0));

    let err = engine
        .book(request("2024-06-01", "2024-06-04"))
        .await
        .unwrap_err();
    match err {
        EngineError::Core(CoreError::RoomNotAvailable { date, .. }) => {
            assert_eq!(date, d("2024-06-02"));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Nights 1 and 3 must not carry a partial decrement
    assert_eq!(booked_on(&engine, "2024-06-01").await, (1, 4));
    assert_eq!(booked_on(&engine, "2024-06-03").await, (1, 4));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn cancel_releases_once_and_double_cancel_conflicts() {
    let engine = engine_with(Fixture::default()).await;

    let booked = engine.book(request("2024-06-01", "2024-06-03")).await.unwrap();
    assert_eq!(booked_on(&engine, "2024-06-01").await, (1, 4));

    let outcome = engine.cancel(&booked.booking.id).await.unwrap();
    assert_eq!(outcome.booking.status, BookingStatus::Cancelled);
    assert!(outcome.booking.inventory_released);
    assert!(outcome.penalty.is_zero()); // flexible policy
    assert_eq!(booked_on(&engine, "2024-06-01").await, (0, 5));
    assert_eq!(booked_on(&engine, "2024-06-02").await, (0, 5));

    // Terminal state: the second cancel is a conflict, and the ledger does
    // not move again
    let err = engine.cancel(&booked.booking.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::BookingConflict {
            from: BookingStatus::Cancelled,
            ..
        })
    ));
    assert_eq!(booked_on(&engine, "2024-06-01").await, (0, 5));
}

#[tokio::test]
async fn strict_policy_charges_full_quote_inside_window() {
    let mut fixture = Fixture::default();
    fixture.hotel.cancellation_policy = CancellationPolicy::Strict;
    fixture.hotel.cancellation_hours = 24 * 365 * 10; // always inside
    let engine = engine_with(fixture).await;

    let booked = engine.book(request("2024-06-01", "2024-06-03")).await.unwrap();
    let outcome = engine.cancel(&booked.booking.id).await.unwrap();
    assert_eq!(outcome.penalty.cents(), booked.quote.total_cents);
    // Penalty is surfaced, inventory still comes back
    assert_eq!(booked_on(&engine, "2024-06-01").await, (0, 5));
}

#[tokio::test]
async fn no_show_retains_inventory_where_cancel_releases() {
    let mut fixture = Fixture::default();
    fixture.hotel.auto_confirm_bookings = true;
    let engine = engine_with(fixture).await;

    let kept = engine.book(request("2024-06-01", "2024-06-02")).await.unwrap();
    let freed = engine.book(request("2024-06-01", "2024-06-02")).await.unwrap();
    assert_eq!(booked_on(&engine, "2024-06-01").await, (2, 3));

    let no_show = engine.mark_no_show(&kept.booking.id).await.unwrap();
    assert_eq!(no_show.status, BookingStatus::NoShow);
    assert!(!no_show.inventory_released);
    assert_eq!(booked_on(&engine, "2024-06-01").await, (2, 3));

    engine.cancel(&freed.booking.id).await.unwrap();
    assert_eq!(booked_on(&engine, "2024-06-01").await, (1, 4));
}

#[tokio::test]
async fn no_show_is_rejected_before_the_arrival_day() {
    let mut fixture = Fixture::default();
    fixture.hotel.auto_confirm_bookings = true;
    let engine = engine_with(fixture).await;

    // Arrival far in the future: the guest cannot be a no-show yet
    let booked = engine.book(request("2093-06-01", "2093-06-02")).await.unwrap();
    let err = engine.mark_no_show(&booked.booking.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::NoShowBeforeCheckIn { .. })
    ));

    let booking = engine.get_booking(&booked.booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn check_in_assigns_room_and_check_out_frees_it() {
    let mut fixture = Fixture::default();
    fixture.hotel.auto_confirm_bookings = true;
    let engine = engine_with(fixture).await;
    let rooms = engine.database().rooms();

    rooms
        .insert_room(&Room {
            id: "r1".into(),
            hotel_id: "h1".into(),
            room_type_id: "rt1".into(),
            room_number: "101".into(),
            status: RoomStatus::Available,
            current_booking_id: None,
            current_guest_id: None,
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

    let booked = engine.book(request("2024-06-01", "2024-06-02")).await.unwrap();

    let checked_in = engine.check_in(&booked.booking.id).await.unwrap();
    assert_eq!(checked_in.status, BookingStatus::CheckedIn);
    assert_eq!(checked_in.room_id.as_deref(), Some("r1"));
    let room = rooms.find_room("r1").await.unwrap().unwrap();
    assert_eq!(room.status, RoomStatus::Occupied);
    assert_eq!(room.current_guest_id.as_deref(), Some("g1"));

    let checked_out = engine.check_out(&booked.booking.id).await.unwrap();
    assert_eq!(checked_out.status, BookingStatus::CheckedOut);
    let room = rooms.find_room("r1").await.unwrap().unwrap();
    assert_eq!(room.status, RoomStatus::Cleaning);
    assert!(room.current_booking_id.is_none());

    // Ledger untouched by check-out: the night is consumed history
    assert_eq!(booked_on(&engine, "2024-06-01").await, (1, 4));
}

#[tokio::test]
async fn check_in_without_clean_room_is_distinct_from_no_inventory() {
    let mut fixture = Fixture::default();
    fixture.hotel.auto_confirm_bookings = true;
    let engine = engine_with(fixture).await;

    // Ledger shows 5 rooms available, but no physical unit exists/is clean
    let booked = engine.book(request("2024-06-01", "2024-06-02")).await.unwrap();
    let err = engine.check_in(&booked.booking.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::NoCleanRoom { .. })
    ));

    // The booking stays confirmed, ready to retry once housekeeping
    // catches up
    let booking = engine.get_booking(&booked.booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
}

// =============================================================================
// Payments
// =============================================================================

#[tokio::test]
async fn settlements_drive_derived_payment_status() {
    let engine = engine_with(Fixture::default()).await;

    let booked = engine.book(request("2024-06-01", "2024-06-03")).await.unwrap();
    let total = booked.quote.total_cents;

    let booking = engine
        .on_payment_settled(&booked.booking.id, total / 2, SettlementStatus::Settled, Some("tx-1"))
        .await
        .unwrap();
    assert_eq!(booking.payment_status, PaymentStatus::Partial);

    let booking = engine
        .on_payment_settled(
            &booked.booking.id,
            total - total / 2,
            SettlementStatus::Settled,
            Some("tx-2"),
        )
        .await
        .unwrap();
    assert_eq!(booking.payment_status, PaymentStatus::Paid);

    // Payments never move inventory
    assert_eq!(booked_on(&engine, "2024-06-01").await, (1, 4));
}

#[tokio::test]
async fn failed_payment_on_pending_compensates_with_release() {
    let engine = engine_with(Fixture::default()).await;

    let booked = engine.book(request("2024-06-01", "2024-06-03")).await.unwrap();
    assert_eq!(booked.booking.status, BookingStatus::Pending);
    assert_eq!(booked_on(&engine, "2024-06-01").await, (1, 4));

    let err = engine
        .on_payment_settled(
            &booked.booking.id,
            booked.quote.total_cents,
            SettlementStatus::Failed,
            Some("tx-declined"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::PaymentFailed { .. })
    ));

    let booking = engine.get_booking(&booked.booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert!(booking.inventory_released);
    assert_eq!(booked_on(&engine, "2024-06-01").await, (0, 5));
}

#[tokio::test]
async fn failed_payment_on_confirmed_leaves_inventory_held() {
    let mut fixture = Fixture::default();
    fixture.hotel.auto_confirm_bookings = true;
    let engine = engine_with(fixture).await;

    let booked = engine.book(request("2024-06-01", "2024-06-02")).await.unwrap();
    let booking = engine
        .on_payment_settled(&booked.booking.id, 1000, SettlementStatus::Failed, None)
        .await
        .unwrap();

    // Only pending holds are compensated; a committed stay keeps its span
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booked_on(&engine, "2024-06-01").await, (1, 4));
}

// =============================================================================
// Hold Sweeper
// =============================================================================

#[tokio::test]
async fn sweeper_expires_lapsed_holds_through_the_release_path() {
    let engine = engine_with(Fixture::default()).await;

    let lapsed = engine.book(request("2024-06-01", "2024-06-03")).await.unwrap();
    let confirmed = engine.book(request("2024-06-01", "2024-06-03")).await.unwrap();
    engine.confirm(&confirmed.booking.id).await.unwrap();
    assert_eq!(booked_on(&engine, "2024-06-01").await, (2, 3));

    let (sweeper, _handle) = HoldSweeper::new(engine.clone(), SweeperConfig::default());

    // Both bookings are younger than the 30-minute hold; nothing expires
    assert_eq!(sweeper.run_once(Utc::now()).await.unwrap(), 0);

    // An hour later the pending one has lapsed; the confirmed one is kept
    let later = Utc::now() + chrono::Duration::hours(1);
    assert_eq!(sweeper.run_once(later).await.unwrap(), 1);

    let expired = engine.get_booking(&lapsed.booking.id).await.unwrap();
    assert_eq!(expired.status, BookingStatus::Cancelled);
    assert!(expired.inventory_released);
    assert_eq!(booked_on(&engine, "2024-06-01").await, (1, 4));

    // Idempotent: a second pass finds nothing
    assert_eq!(sweeper.run_once(later).await.unwrap(), 0);
}

#[tokio::test]
async fn sweeper_shuts_down_on_signal() {
    let engine = engine_with(Fixture::default()).await;
    let config = SweeperConfig::default().poll_interval(std::time::Duration::from_millis(10));
    let (sweeper, handle) = HoldSweeper::new(engine, config);

    let task = tokio::spawn(sweeper.run());
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
    handle.shutdown().await;

    tokio::time::timeout(std::time::Duration::from_secs(1), task)
        .await
        .expect("sweeper should stop after shutdown")
        .unwrap();
}

//! # Validation Module
//!
//! Input validation and stay-restriction checks.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Input shape (this module)                                    │
//! │  ├── date range has >= 1 night (StayRange::new)                        │
//! │  ├── occupancy within the room type's cap                              │
//! │  └── rates/counts are sane                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Stay restrictions (this module)                              │
//! │  ├── stop_sell on any night                                            │
//! │  ├── closed_to_arrival on the check-in day                             │
//! │  ├── closed_to_departure on the check-out day                          │
//! │  └── min/max stay from the ARRIVAL day's record only                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Inventory (the ledger's conditional UPDATE)                  │
//! │                                                                         │
//! │  Layers 1 and 2 fail before any inventory is touched.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, RestrictionRule, ValidationError};
use crate::pricing::Occupancy;
use crate::types::{AvailabilityRecord, RoomType, StayRange};
use crate::{BOOKING_CODE_PREFIX, BOOKING_CODE_SUFFIX_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Input Validators
// =============================================================================

/// Validates a requested party size against a room type.
///
/// ## Rules
/// - At least one adult
/// - Children cannot be negative
/// - Total guests within the type's `max_occupancy`
pub fn validate_occupancy(occupancy: Occupancy, room_type: &RoomType) -> ValidationResult<()> {
    if occupancy.adults <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "adults".to_string(),
        });
    }

    if occupancy.children < 0 {
        return Err(ValidationError::OutOfRange {
            field: "children".to_string(),
            min: 0,
            max: room_type.max_occupancy,
        });
    }

    if occupancy.total() > room_type.max_occupancy {
        return Err(ValidationError::OccupancyExceeded {
            requested: occupancy.total(),
            max: room_type.max_occupancy,
        });
    }

    Ok(())
}

/// Validates a rate in cents.
///
/// Zero is allowed (complimentary nights); negative rates are not.
pub fn validate_rate_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "rate".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates the shape of a booking code ("BK-" + alphanumeric suffix)
/// before any lookup hits the database.
pub fn validate_booking_code(code: &str) -> ValidationResult<()> {
    let suffix = code.strip_prefix(BOOKING_CODE_PREFIX).ok_or_else(|| {
        ValidationError::InvalidFormat {
            field: "booking code".to_string(),
            reason: format!("must start with {BOOKING_CODE_PREFIX}"),
        }
    })?;

    if suffix.len() != BOOKING_CODE_SUFFIX_LEN
        || !suffix.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ValidationError::InvalidFormat {
            field: "booking code".to_string(),
            reason: format!("suffix must be {BOOKING_CODE_SUFFIX_LEN} alphanumeric characters"),
        });
    }

    Ok(())
}

/// Validates an entity id.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Stay Restrictions
// =============================================================================

/// Checks a requested stay against the ledger's restriction flags.
///
/// ## Inputs
/// - `night_records`: materialized rows for the sold nights
///   `[check_in, check_out)`
/// - `departure_record`: the check-out day's row, if one exists (a missing
///   row means room-type defaults, i.e. no departure restriction)
///
/// ## Policy
/// - `stop_sell` fails the night it is set on, regardless of count
/// - `closed_to_arrival` rejects if check-in falls on that day
/// - `closed_to_departure` rejects if check-out falls on that day
/// - `min_stay`/`max_stay` are read from the **arrival day's** record only:
///   the policy that applies to the first night governs the whole stay
pub fn check_restrictions(
    range: &StayRange,
    night_records: &[AvailabilityRecord],
    departure_record: Option<&AvailabilityRecord>,
) -> CoreResult<()> {
    for record in night_records {
        if !range.contains(record.date) {
            continue;
        }

        if record.stop_sell {
            return Err(CoreError::RateRestrictionViolation {
                date: record.date,
                rule: RestrictionRule::StopSell,
            });
        }

        if record.date == range.check_in() {
            if record.closed_to_arrival {
                return Err(CoreError::RateRestrictionViolation {
                    date: record.date,
                    rule: RestrictionRule::ClosedToArrival,
                });
            }

            let nights = range.nights();
            if let Some(min_stay) = record.min_stay {
                if nights < min_stay {
                    return Err(CoreError::RateRestrictionViolation {
                        date: record.date,
                        rule: RestrictionRule::MinStay {
                            required: min_stay,
                            requested: nights,
                        },
                    });
                }
            }
            if let Some(max_stay) = record.max_stay {
                if nights > max_stay {
                    return Err(CoreError::RateRestrictionViolation {
                        date: record.date,
                        rule: RestrictionRule::MaxStay {
                            allowed: max_stay,
                            requested: nights,
                        },
                    });
                }
            }
        }
    }

    if let Some(record) = departure_record {
        if record.date == range.check_out() && record.closed_to_departure {
            return Err(CoreError::RateRestrictionViolation {
                date: record.date,
                rule: RestrictionRule::ClosedToDeparture,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn record(date: &str) -> AvailabilityRecord {
        AvailabilityRecord {
            id: format!("a-{date}"),
            hotel_id: "h1".into(),
            room_type_id: "rt1".into(),
            date: d(date),
            total_rooms: 5,
            booked_rooms: 0,
            blocked_rooms: 0,
            available_rooms: 5,
            base_rate_cents: 10000,
            selling_rate_cents: 10000,
            rate_overridden: false,
            min_stay: None,
            max_stay: None,
            closed_to_arrival: false,
            closed_to_departure: false,
            stop_sell: false,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    fn room_type() -> RoomType {
        RoomType {
            id: "rt1".into(),
            hotel_id: "h1".into(),
            name: "Deluxe".into(),
            base_price_cents: 10000,
            weekend_price_cents: None,
            extra_person_charge_cents: 0,
            child_charge_cents: 0,
            base_occupancy: 2,
            max_occupancy: 3,
            total_rooms: 5,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_occupancy() {
        let rt = room_type();
        assert!(validate_occupancy(Occupancy { adults: 2, children: 1 }, &rt).is_ok());
        assert!(validate_occupancy(Occupancy { adults: 0, children: 1 }, &rt).is_err());
        assert!(validate_occupancy(Occupancy { adults: 2, children: -1 }, &rt).is_err());
        assert!(validate_occupancy(Occupancy { adults: 3, children: 1 }, &rt).is_err());
    }

    #[test]
    fn test_validate_rate_cents() {
        assert!(validate_rate_cents(0).is_ok()); // complimentary night
        assert!(validate_rate_cents(9999).is_ok());
        assert!(matches!(
            validate_rate_cents(-1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_booking_code() {
        assert!(validate_booking_code("BK-A2B3C4").is_ok());
        assert!(matches!(
            validate_booking_code("A2B3C4"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            validate_booking_code("BK-A2B3"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            validate_booking_code("BK-A2B3C!"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_min_stay_on_arrival_day_governs_whole_stay() {
        let range = StayRange::new(d("2024-06-01"), d("2024-06-03")).unwrap();
        let mut arrival = record("2024-06-01");
        arrival.min_stay = Some(3);
        let records = vec![arrival, record("2024-06-02")];

        let err = check_restrictions(&range, &records, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::RateRestrictionViolation {
                rule: RestrictionRule::MinStay {
                    required: 3,
                    requested: 2
                },
                ..
            }
        ));
    }

    #[test]
    fn test_min_stay_on_second_night_is_ignored() {
        let range = StayRange::new(d("2024-06-01"), d("2024-06-03")).unwrap();
        let mut second = record("2024-06-02");
        second.min_stay = Some(5); // only the arrival day's record governs
        let records = vec![record("2024-06-01"), second];

        assert!(check_restrictions(&range, &records, None).is_ok());
    }

    #[test]
    fn test_max_stay() {
        let range = StayRange::new(d("2024-06-01"), d("2024-06-05")).unwrap();
        let mut arrival = record("2024-06-01");
        arrival.max_stay = Some(3);
        let records = vec![arrival];

        assert!(check_restrictions(&range, &records, None).is_err());
    }

    #[test]
    fn test_stop_sell_any_night_fails() {
        let range = StayRange::new(d("2024-06-01"), d("2024-06-04")).unwrap();
        let mut middle = record("2024-06-02");
        middle.stop_sell = true;
        let records = vec![record("2024-06-01"), middle, record("2024-06-03")];

        let err = check_restrictions(&range, &records, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::RateRestrictionViolation {
                rule: RestrictionRule::StopSell,
                ..
            }
        ));
    }

    #[test]
    fn test_closed_to_arrival() {
        let range = StayRange::new(d("2024-06-01"), d("2024-06-03")).unwrap();
        let mut arrival = record("2024-06-01");
        arrival.closed_to_arrival = true;

        let err = check_restrictions(&range, &[arrival], None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::RateRestrictionViolation {
                rule: RestrictionRule::ClosedToArrival,
                ..
            }
        ));
    }

    #[test]
    fn test_closed_to_departure_checks_checkout_day() {
        let range = StayRange::new(d("2024-06-01"), d("2024-06-03")).unwrap();
        let mut departure = record("2024-06-03");
        departure.closed_to_departure = true;

        let err = check_restrictions(
            &range,
            &[record("2024-06-01"), record("2024-06-02")],
            Some(&departure),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::RateRestrictionViolation {
                rule: RestrictionRule::ClosedToDeparture,
                ..
            }
        ));

        // closed_to_departure on a sold night (not the check-out day) is fine
        let mut middle = record("2024-06-02");
        middle.closed_to_departure = true;
        assert!(check_restrictions(&range, &[record("2024-06-01"), middle], None).is_ok());
    }
}

//! Seed derivation.
//!
//! A seed collapses (learner, exercise, calendar day) into an opaque hex
//! digest. Time of day is dropped so an exercise stays the same for a whole
//! day and changes the next. Each component is hashed behind its byte
//! length, so a separator inside an id cannot shift bytes between fields.

use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};

/// Derive the seed for a learner, exercise, and calendar day.
pub fn create_seed(user_id: &str, exercise_slug: &str, date: NaiveDate) -> String {
    let day = date.format("%Y-%m-%d").to_string();
    let mut hasher = Sha256::new();
    for part in [user_id, exercise_slug, day.as_str()] {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Derive the seed from an instant, using its UTC calendar day.
pub fn create_seed_at(user_id: &str, exercise_slug: &str, instant: DateTime<Utc>) -> String {
    create_seed(user_id, exercise_slug, instant.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn seed_is_fixed_length_hex() {
        let seed = create_seed("user-123", "string-slice-dynamic", day(2026, 1, 15));
        assert_eq!(seed.len(), 64);
        assert!(seed.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn seed_is_pinned() {
        assert_eq!(
            create_seed("user-123", "string-slice-dynamic", day(2026, 1, 15)),
            "1277643d48d52c2643aef4b729c3e4e869e7a6588e7d3005e774ecc099af3602"
        );
    }

    #[test]
    fn separators_in_ids_do_not_collide() {
        let d = day(2026, 1, 15);
        assert_ne!(create_seed("a:b", "c", d), create_seed("a", "b:c", d));
        assert_ne!(create_seed("a:", "b", d), create_seed("a", ":b", d));
        assert_ne!(create_seed("", "ab", d), create_seed("ab", "", d));
    }

    #[test]
    fn time_of_day_is_ignored() {
        let morning = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 1).unwrap();
        let night = Utc.with_ymd_and_hms(2026, 1, 15, 23, 59, 59).unwrap();
        assert_eq!(
            create_seed_at("user-123", "list-index", morning),
            create_seed_at("user-123", "list-index", night)
        );
        assert_eq!(
            create_seed_at("user-123", "list-index", morning),
            create_seed("user-123", "list-index", day(2026, 1, 15))
        );
    }

    #[test]
    fn each_component_changes_the_seed() {
        let base = create_seed("user-123", "list-index", day(2026, 1, 15));
        assert_ne!(base, create_seed("user-124", "list-index", day(2026, 1, 15)));
        assert_ne!(base, create_seed("user-123", "list-slice", day(2026, 1, 15)));
        assert_ne!(base, create_seed("user-123", "list-index", day(2026, 1, 16)));
    }

    proptest! {
        #[test]
        fn stable_within_a_day(user in "[a-z0-9-]{1,12}", slug in "[a-z-]{1,20}", h1 in 0u32..24, h2 in 0u32..24) {
            let a = Utc.with_ymd_and_hms(2026, 3, 9, h1, 0, 0).unwrap();
            let b = Utc.with_ymd_and_hms(2026, 3, 9, h2, 30, 0).unwrap();
            prop_assert_eq!(create_seed_at(&user, &slug, a), create_seed_at(&user, &slug, b));
        }
    }
}

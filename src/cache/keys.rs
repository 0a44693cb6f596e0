//! Cache Keys
//!
//! Every cached read has a variant here; keys render as
//! `"{namespace}:{suffix}"` where the namespace is the entity type name.

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

/// Operation-specific part of a cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    AllActive,
    ById(Uuid),
    ByModelAndType { model: String, car_type: String },
    WithDetails(Uuid),
    BetweenDates { from: DateTime<Utc>, to: DateTime<Utc> },
    ByCustomer(Uuid),
    /// Keyed by the UTC day the window ends on
    Last7Days(NaiveDate),
    ByCarAndDate { car_id: Uuid, date: NaiveDate },
    Scheduled { from: NaiveDate, to: NaiveDate },
    ByUser(String),
    WithServices(Uuid),
}

impl CacheKey {
    /// Full key within an entity namespace
    pub fn render(&self, namespace: &str) -> String {
        format!("{namespace}:{self}")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::AllActive => write!(f, "all-active"),
            CacheKey::ById(id) => write!(f, "by-id:{id}"),
            CacheKey::ByModelAndType { model, car_type } => {
                write!(f, "by-model:{model}+type:{car_type}")
            }
            CacheKey::WithDetails(id) => write!(f, "with-details:{id}"),
            CacheKey::BetweenDates { from, to } => write!(
                f,
                "between-dates:{}:{}",
                from.to_rfc3339_opts(SecondsFormat::Secs, true),
                to.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            CacheKey::ByCustomer(id) => write!(f, "by-customer:{id}"),
            CacheKey::Last7Days(day) => write!(f, "last-7-days:{day}"),
            CacheKey::ByCarAndDate { car_id, date } => write!(f, "by-car:{car_id}+date:{date}"),
            CacheKey::Scheduled { from, to } => write!(f, "scheduled:{from}:{to}"),
            CacheKey::ByUser(user_id) => write!(f, "by-user:{user_id}"),
            CacheKey::WithServices(id) => write!(f, "with-services:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_keys_are_namespaced_by_type() {
        let id = Uuid::nil();
        assert_eq!(CacheKey::AllActive.render("Car"), "Car:all-active");
        assert_eq!(
            CacheKey::ById(id).render("Rental"),
            format!("Rental:by-id:{id}")
        );
        assert_ne!(
            CacheKey::ById(id).render("Car"),
            CacheKey::ById(id).render("Customer")
        );
    }

    #[test]
    fn test_parameterized_suffixes() {
        let key = CacheKey::ByModelAndType {
            model: "Corolla".to_string(),
            car_type: "Sedan".to_string(),
        };
        assert_eq!(key.to_string(), "by-model:Corolla+type:Sedan");

        let key = CacheKey::BetweenDates {
            from: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2025, 3, 8, 12, 30, 0).unwrap(),
        };
        assert_eq!(
            key.to_string(),
            "between-dates:2025-03-01T00:00:00Z:2025-03-08T12:30:00Z"
        );

        let day = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        assert_eq!(CacheKey::Last7Days(day).to_string(), "last-7-days:2025-03-08");
    }
}

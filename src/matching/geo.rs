//! Distance and time-of-day helpers backing the route matcher.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two coordinates, standard
/// haversine formula. Total over finite inputs; range checks happen at the
/// matcher boundary, not here.
pub fn haversine_distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// A wall-clock time of day, parsed from strict "HH:MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    pub fn parse(value: &str) -> Option<TimeOfDay> {
        let (hour, minute) = value.split_once(':')?;
        if hour.len() != 2 || minute.len() != 2 {
            return None;
        }
        let hour: u8 = hour.parse().ok()?;
        let minute: u8 = minute.parse().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(TimeOfDay { hour, minute })
    }

    fn minutes_from_midnight(self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }
}

/// Absolute intraday difference in minutes between two times of day.
/// Symmetric, always in [0, 1439]; no wrap-around across midnight.
pub fn time_of_day_delta_minutes(a: TimeOfDay, b: TimeOfDay) -> i64 {
    (a.minutes_from_midnight() - b.minutes_from_midnight()).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_is_symmetric() {
        let d1 = haversine_distance_km(-23.550520, -46.633308, -23.561684, -46.655981);
        let d2 = haversine_distance_km(-23.561684, -46.655981, -23.550520, -46.633308);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_distance_to_self_is_zero() {
        assert_eq!(haversine_distance_km(10.0, 20.0, 10.0, 20.0), 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude along a meridian is ~111.19 km.
        let d = haversine_distance_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.1);
    }

    #[test]
    fn test_time_parse_strict() {
        assert_eq!(
            TimeOfDay::parse("07:30"),
            Some(TimeOfDay { hour: 7, minute: 30 })
        );
        assert_eq!(TimeOfDay::parse("00:00"), Some(TimeOfDay { hour: 0, minute: 0 }));
        assert_eq!(TimeOfDay::parse("24:00"), None);
        assert_eq!(TimeOfDay::parse("12:60"), None);
        assert_eq!(TimeOfDay::parse("7:30"), None);
        assert_eq!(TimeOfDay::parse("0730"), None);
        assert_eq!(TimeOfDay::parse(""), None);
    }

    #[test]
    fn test_time_delta_is_symmetric() {
        let a = TimeOfDay::parse("08:00").unwrap();
        let b = TimeOfDay::parse("08:25").unwrap();
        assert_eq!(time_of_day_delta_minutes(a, b), 25);
        assert_eq!(time_of_day_delta_minutes(b, a), 25);
    }

    #[test]
    fn test_time_delta_range() {
        let midnight = TimeOfDay::parse("00:00").unwrap();
        let last = TimeOfDay::parse("23:59").unwrap();
        // No wrap-around: the intraday delta is 1439, not 1.
        assert_eq!(time_of_day_delta_minutes(midnight, last), 1439);
        assert_eq!(time_of_day_delta_minutes(midnight, midnight), 0);
    }
}

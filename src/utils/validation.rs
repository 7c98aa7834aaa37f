use regex::Regex;

pub fn validate_email(email: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    re.is_match(email)
}

pub fn validate_latitude(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

pub fn validate_longitude(lng: f64) -> bool {
    lng.is_finite() && (-180.0..=180.0).contains(&lng)
}

/// Both legs of a route must stay on the globe.
pub fn validate_coordinates(lat: f64, lng: f64) -> bool {
    validate_latitude(lat) && validate_longitude(lng)
}

pub fn validate_time_of_day(value: &str) -> bool {
    let re = Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap();
    re.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("maria@email.com"));
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("@missing.local"));
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(-23.550520, -46.633308));
        assert!(!validate_coordinates(91.0, 0.0));
        assert!(!validate_coordinates(0.0, -180.5));
        assert!(!validate_coordinates(f64::NAN, 0.0));
        assert!(!validate_coordinates(0.0, f64::INFINITY));
    }

    #[test]
    fn test_validate_time_of_day() {
        assert!(validate_time_of_day("07:00"));
        assert!(validate_time_of_day("23:59"));
        assert!(!validate_time_of_day("24:00"));
        assert!(!validate_time_of_day("7:00"));
        assert!(!validate_time_of_day("12:60"));
        assert!(!validate_time_of_day("noonish"));
    }
}

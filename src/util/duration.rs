use std::cmp::Ordering;

/// Rounds to whole minutes, ties going to the even minute count (30s -> 0, 90s -> 120s).
pub fn round_to_minutes(seconds: i64) -> i64 {
    let minutes = seconds.div_euclid(60);
    let rest = seconds.rem_euclid(60);
    let rounded = match rest.cmp(&30) {
        Ordering::Less => minutes,
        Ordering::Greater => minutes + 1,
        Ordering::Equal if minutes % 2 == 0 => minutes,
        Ordering::Equal => minutes + 1,
    };
    rounded * 60
}

pub fn seconds_to_hours(seconds: i64) -> f64 {
    (seconds as f64 / 36.0).round() / 100.0
}

pub fn hours_to_seconds(hours: f64) -> i64 {
    (hours * 3600.0).round() as i64
}

/// Short human form used in chat summaries: `45 s`, `12 m`, `1.50 h`.
pub fn format_seconds(seconds: i64) -> String {
    if seconds < 60 {
        return format!("{seconds} s");
    }
    if seconds < 60 * 60 {
        return format!("{} m", round_to_minutes(seconds) / 60);
    }
    format!("{:.2} h", seconds as f64 / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_to_even() {
        assert_eq!(round_to_minutes(30), 0);
        assert_eq!(round_to_minutes(90), 120);
        assert_eq!(round_to_minutes(150), 120);
        assert_eq!(round_to_minutes(210), 240);
    }

    #[test]
    fn rounds_to_nearest_otherwise() {
        assert_eq!(round_to_minutes(0), 0);
        assert_eq!(round_to_minutes(29), 0);
        assert_eq!(round_to_minutes(31), 60);
        assert_eq!(round_to_minutes(3600), 3600);
        assert_eq!(round_to_minutes(3629), 3600);
        assert_eq!(round_to_minutes(3631), 3660);
    }

    #[test]
    fn hours_keep_two_decimals() {
        assert_eq!(seconds_to_hours(3600), 1.0);
        assert_eq!(seconds_to_hours(5400), 1.5);
        assert_eq!(seconds_to_hours(255), 0.07);
        assert_eq!(hours_to_seconds(1.5), 5400);
    }

    #[test]
    fn formats_by_magnitude() {
        assert_eq!(format_seconds(45), "45 s");
        assert_eq!(format_seconds(750), "12 m");
        assert_eq!(format_seconds(5400), "1.50 h");
    }
}

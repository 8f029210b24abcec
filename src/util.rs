/// Format seconds as M:SS, or H:MM:SS past an hour
pub fn format_clock(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock_under_a_minute() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(7.2), "0:07");
        assert_eq!(format_clock(59.4), "0:59");
    }

    #[test]
    fn test_format_clock_minutes() {
        assert_eq!(format_clock(60.0), "1:00");
        assert_eq!(format_clock(300.0), "5:00");
        assert_eq!(format_clock(754.0), "12:34");
    }

    #[test]
    fn test_format_clock_hours() {
        assert_eq!(format_clock(3600.0), "1:00:00");
        assert_eq!(format_clock(3725.0), "1:02:05");
    }

    #[test]
    fn test_format_clock_negative_clamps_to_zero() {
        assert_eq!(format_clock(-3.0), "0:00");
    }
}

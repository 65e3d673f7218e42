use super::cv;

/// Convert a retention time to seconds based on its unit accession or name
pub fn normalize_retention_time(value: f64, unit: Option<&str>) -> f64 {
    match unit {
        Some(cv::UNIT_MINUTE) | Some("minute") => value * 60.0,
        Some(cv::UNIT_MILLISECOND) | Some("millisecond") => value / 1000.0,
        _ => value, // Default to seconds
    }
}

/// Parse an `xs:duration` such as `PT1M30.5S` into seconds.
///
/// Plain numbers are taken as seconds. Year and month components are
/// rejected since they have no fixed length.
pub fn parse_duration_seconds(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(seconds) = text.parse::<f64>() {
        return Some(seconds);
    }

    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let body = text.strip_prefix('P')?;

    let mut seconds = 0.0;
    let mut in_time = false;
    let mut number = String::new();
    let mut any_component = false;

    for c in body.chars() {
        match c {
            'T' => in_time = true,
            '0'..='9' | '.' => number.push(c),
            unit => {
                let value: f64 = number.parse().ok()?;
                number.clear();
                any_component = true;
                seconds += match (in_time, unit) {
                    (false, 'D') => value * 86_400.0,
                    (true, 'H') => value * 3_600.0,
                    (true, 'M') => value * 60.0,
                    (true, 'S') => value,
                    _ => return None,
                };
            }
        }
    }

    if !number.is_empty() || !any_component {
        return None;
    }

    Some(if negative { -seconds } else { seconds })
}

/// CSV export of the working set
use crate::domain::{ApproachTime, CloseApproachEvent};

pub const CSV_HEADER: &str = "designation,close_approach_time,distance_au,v_rel_km_s,v_inf_km_s";
pub const CSV_FILE_NAME: &str = "close_approaches_data.csv";

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn number(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => x.to_string(),
        _ => String::new(),
    }
}

/// Render events as CSV with a header row. Absent numbers are empty cells and
/// unparseable dates keep their original text.
pub fn events_to_csv(events: &[CloseApproachEvent]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + events.len() * 64);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for e in events {
        let time = match &e.close_approach_time {
            ApproachTime::Valid(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
            ApproachTime::Invalid(raw) => raw.clone(),
        };
        let row = [
            escape(&e.designation),
            escape(&time),
            number(Some(e.distance_au)),
            number(e.relative_velocity),
            number(e.infinity_velocity),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parse_cad_time;
    use chrono::NaiveDateTime;

    /// Minimal reader for the exporter's own output
    fn parse_line(line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut quoted = false;
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match (c, quoted) {
                ('"', true) if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                ('"', _) => quoted = !quoted,
                (',', false) => fields.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        fields.push(current);
        fields
    }

    fn opt(cell: &str) -> Option<f64> {
        if cell.is_empty() {
            None
        } else {
            Some(cell.parse().unwrap())
        }
    }

    fn sample() -> Vec<CloseApproachEvent> {
        vec![
            CloseApproachEvent {
                designation: "2024 YR4".into(),
                close_approach_time: ApproachTime::Valid(parse_cad_time("2025-Jan-15 03:30").unwrap()),
                distance_au: 0.012_345_678_9,
                relative_velocity: Some(12.345),
                infinity_velocity: Some(12.3),
            },
            CloseApproachEvent {
                designation: "C/2023 A3 (Tsuchinshan, \"ATLAS\")".into(),
                close_approach_time: ApproachTime::Valid(parse_cad_time("2025-Oct-12 17:00").unwrap()),
                distance_au: 0.47,
                relative_velocity: None,
                infinity_velocity: Some(68.2),
            },
        ]
    }

    #[test]
    fn test_header_only_for_empty() {
        assert_eq!(events_to_csv(&[]), format!("{CSV_HEADER}\n"));
    }

    #[test]
    fn test_csv_round_trip() {
        let events = sample();
        let csv = events_to_csv(&events);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));

        let parsed: Vec<Vec<String>> = lines.map(parse_line).collect();
        assert_eq!(parsed.len(), events.len());
        for (row, e) in parsed.iter().zip(&events) {
            assert_eq!(row.len(), 5);
            assert_eq!(row[0], e.designation);
            let t = NaiveDateTime::parse_from_str(&row[1], "%Y-%m-%d %H:%M:%S").unwrap();
            assert_eq!(Some(t), e.close_approach_time.valid());
            assert!((row[2].parse::<f64>().unwrap() - e.distance_au).abs() < 1e-12);
            assert_eq!(opt(&row[3]), e.relative_velocity);
            assert_eq!(opt(&row[4]), e.infinity_velocity);
        }
    }

    #[test]
    fn test_absent_and_invalid_cells() {
        let events = vec![CloseApproachEvent {
            designation: "X".into(),
            close_approach_time: ApproachTime::Invalid("2025-??".into()),
            distance_au: f64::NAN,
            relative_velocity: None,
            infinity_velocity: None,
        }];
        let csv = events_to_csv(&events);
        assert_eq!(csv.lines().nth(1), Some("X,2025-??,,,"));
    }
}

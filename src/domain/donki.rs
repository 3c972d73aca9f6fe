//! DONKI space-weather event catalogue.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DonkiEventType {
    #[serde(rename = "CME")]
    Cme,
    #[serde(rename = "GST")]
    Gst,
    #[serde(rename = "FLR")]
    Flr,
    #[serde(rename = "SEP")]
    Sep,
    #[serde(rename = "IPS")]
    Ips,
    #[serde(rename = "RBE")]
    Rbe,
    #[serde(rename = "MPC")]
    Mpc,
    #[serde(rename = "HSS")]
    Hss,
    #[serde(rename = "notifications")]
    Notifications,
}

impl DonkiEventType {
    pub const ALL: [DonkiEventType; 9] = [
        DonkiEventType::Cme,
        DonkiEventType::Gst,
        DonkiEventType::Flr,
        DonkiEventType::Sep,
        DonkiEventType::Ips,
        DonkiEventType::Rbe,
        DonkiEventType::Mpc,
        DonkiEventType::Hss,
        DonkiEventType::Notifications,
    ];

    /// Path segment under `/DONKI/`
    pub fn api_code(self) -> &'static str {
        match self {
            DonkiEventType::Cme => "CME",
            DonkiEventType::Gst => "GST",
            DonkiEventType::Flr => "FLR",
            DonkiEventType::Sep => "SEP",
            DonkiEventType::Ips => "IPS",
            DonkiEventType::Rbe => "RBE",
            DonkiEventType::Mpc => "MPC",
            DonkiEventType::Hss => "HSS",
            DonkiEventType::Notifications => "notifications",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.api_code().eq_ignore_ascii_case(code))
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DonkiEventType::Cme => "CME (Coronal Mass Ejection)",
            DonkiEventType::Gst => "GST (Geomagnetic Storm)",
            DonkiEventType::Flr => "FLR (Solar Flare)",
            DonkiEventType::Sep => "SEP (Solar Energetic Particle)",
            DonkiEventType::Ips => "IPS (Interplanetary Shock)",
            DonkiEventType::Rbe => "RBE (Radiation Belt Enhancement)",
            DonkiEventType::Mpc => "MPC (Magnetopause Crossing)",
            DonkiEventType::Hss => "HSS (High Speed Stream)",
            DonkiEventType::Notifications => "Notifications",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DonkiEventType::Cme => "Coronal Mass Ejection (CME): A massive burst of solar wind and magnetic fields rising above the solar corona.",
            DonkiEventType::Gst => "Geomagnetic Storm (GST): Disturbances in Earth's magnetosphere caused by solar wind shocks.",
            DonkiEventType::Flr => "Solar Flare (FLR): A sudden flash of increased brightness on the Sun, usually observed near its surface.",
            DonkiEventType::Sep => "Solar Energetic Particle (SEP): High-energy particles emitted by the Sun, often associated with solar flares and CMEs.",
            DonkiEventType::Ips => "Interplanetary Shock (IPS): Shock waves traveling through space, often caused by CMEs or solar wind variations.",
            DonkiEventType::Rbe => "Radiation Belt Enhancement (RBE): An increase in the density of charged particles in Earth's radiation belts.",
            DonkiEventType::Mpc => "Magnetopause Crossing (MPC): When solar wind plasma crosses Earth's magnetopause, the boundary of the magnetosphere.",
            DonkiEventType::Hss => "High Speed Stream (HSS): Streams of fast-moving solar wind emanating from coronal holes on the Sun.",
            DonkiEventType::Notifications => "Notifications: General alerts and updates related to various space weather events.",
        }
    }

    /// Field carrying the event's timestamp in each record
    pub fn date_field(self) -> &'static str {
        match self {
            DonkiEventType::Cme | DonkiEventType::Gst => "startTime",
            DonkiEventType::Flr => "beginTime",
            DonkiEventType::Notifications => "messageIssueTime",
            DonkiEventType::Sep
            | DonkiEventType::Ips
            | DonkiEventType::Rbe
            | DonkiEventType::Mpc
            | DonkiEventType::Hss => "eventTime",
        }
    }

    pub fn y_label(self) -> &'static str {
        match self {
            DonkiEventType::Cme => "Number of CMEs",
            DonkiEventType::Gst => "Average Kp Index",
            DonkiEventType::Flr => "Number of Solar Flares",
            DonkiEventType::Sep => "Number of Solar Energetic Particles",
            DonkiEventType::Ips => "Number of Interplanetary Shocks",
            DonkiEventType::Rbe => "Number of Radiation Belt Enhancements",
            DonkiEventType::Mpc => "Number of Magnetopause Crossings",
            DonkiEventType::Hss => "Number of High Speed Streams",
            DonkiEventType::Notifications => "Number of Notifications",
        }
    }

    /// Extra query parameters the endpoint needs beyond the date range
    pub fn extra_params(self) -> &'static [(&'static str, &'static str)] {
        match self {
            DonkiEventType::Cme => &[
                ("mostAccurateOnly", "true"),
                ("completeEntryOnly", "true"),
                ("speed", "500"),
                ("halfAngle", "30"),
                ("catalog", "ALL"),
            ],
            DonkiEventType::Notifications => &[("type", "all")],
            _ => &[],
        }
    }
}

/// One glossary row
#[derive(Debug, Serialize)]
pub struct GlossaryEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub fn glossary() -> Vec<GlossaryEntry> {
    DonkiEventType::ALL
        .into_iter()
        .map(|e| GlossaryEntry {
            code: e.api_code(),
            name: e.display_name(),
            description: e.description(),
        })
        .collect()
}

/// Per-day value of a space-weather series: a count, or the mean Kp for storms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpaceWeatherSummary {
    pub event: DonkiEventType,
    pub name: &'static str,
    pub description: &'static str,
    pub y_label: &'static str,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Field the dates were read from, if one could be found
    pub date_field: Option<String>,
    pub record_count: usize,
    pub series: Vec<DailyPoint>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_case_insensitive() {
        assert_eq!(DonkiEventType::from_code("flr"), Some(DonkiEventType::Flr));
        assert_eq!(
            DonkiEventType::from_code("notifications"),
            Some(DonkiEventType::Notifications)
        );
        assert_eq!(DonkiEventType::from_code("XYZ"), None);
    }

    #[test]
    fn test_extra_params() {
        assert_eq!(DonkiEventType::Cme.extra_params().len(), 5);
        assert_eq!(
            DonkiEventType::Notifications.extra_params(),
            &[("type", "all")]
        );
        assert!(DonkiEventType::Hss.extra_params().is_empty());
    }

    #[test]
    fn test_glossary_covers_every_type() {
        let entries = glossary();
        assert_eq!(entries.len(), DonkiEventType::ALL.len());
        assert!(entries.iter().any(|e| e.code == "MPC"));
    }
}

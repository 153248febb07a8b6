//! Feed parsing and heart-rate classification.
//!
//! A feed sample is CSV text; the reading lives in the first non-blank row,
//! second column (first column when the second is missing or not numeric).

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBand {
    CriticalLow,
    BorderlineLow,
    Resting,
    Relaxed,
    Elevated,
    Cruising,
}

impl StatusBand {
    /// First matching rule wins; the order here is the authority.
    pub fn for_reading(bpm: f64) -> StatusBand {
        if bpm < 40.0 {
            StatusBand::CriticalLow
        } else if bpm < 50.0 {
            StatusBand::BorderlineLow
        } else if bpm < 60.0 {
            StatusBand::Resting
        } else if bpm < 75.0 {
            StatusBand::Relaxed
        } else if bpm >= 90.0 {
            StatusBand::Elevated
        } else {
            StatusBand::Cruising
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusBand::CriticalLow => "critical_low",
            StatusBand::BorderlineLow => "borderline_low",
            StatusBand::Resting => "resting",
            StatusBand::Relaxed => "relaxed",
            StatusBand::Elevated => "elevated",
            StatusBand::Cruising => "cruising",
        }
    }

    pub fn message(&self, bpm: f64) -> String {
        let v = format_reading(bpm);
        match self {
            StatusBand::CriticalLow => format!("Someone should check on our boy - {} bpm", v),
            StatusBand::BorderlineLow => format!("He's Probably fine? - {} bpm", v),
            StatusBand::Resting => format!("Alive - Probably Asleep - {} bpm", v),
            StatusBand::Relaxed => format!("Alive - Seems to be relaxed - {} bpm", v),
            StatusBand::Elevated => format!("Alive - Probably Checking on the chickens - {} bpm", v),
            StatusBand::Cruising => format!("Alive - Cruising | {} bpm", v),
        }
    }
}

/// Status line for a reading.
pub fn classify(bpm: f64) -> String {
    StatusBand::for_reading(bpm).message(bpm)
}

/// Whole readings print without a fractional part ("45", "72.5").
pub fn format_reading(bpm: f64) -> String {
    format!("{}", bpm)
}

/// Extracts the reading from one CSV sample.
pub fn parse_reading(text: &str) -> Option<f64> {
    let first = text.lines().find(|line| !line.trim().is_empty())?;
    let fields: Vec<String> = first
        .split(',')
        .map(|cell| cell.replace('"', "").trim().to_string())
        .collect();

    let numeric = |s: &String| s.parse::<f64>().ok().filter(|v| v.is_finite());
    fields
        .get(1)
        .and_then(numeric)
        .or_else(|| fields.first().and_then(numeric))
}

/// Drops readings that cannot be a pulse when `reject_non_positive` is set.
pub fn accept_reading(bpm: f64, reject_non_positive: bool) -> Option<f64> {
    if reject_non_positive && bpm <= 0.0 {
        None
    } else {
        Some(bpm)
    }
}

/// Seconds per beat, clamped to `[min, max]`. `None` leaves the current period in place.
pub fn animation_period(bpm: Option<f64>, min: f64, max: f64) -> Option<f64> {
    let bpm = bpm.filter(|v| v.is_finite() && *v > 0.0)?;
    Some((60.0 / bpm).clamp(min, max))
}

/// CSS duration value for the heartbeat animation.
pub fn format_period(secs: f64) -> String {
    format!("{:.2}s", secs)
}

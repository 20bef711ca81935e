use std::collections::HashSet;

use chrono::NaiveTime;

use crate::error::ProductionError;
use crate::model::{ShiftDefinition, TimeOfDay, MINUTES_PER_DAY};

/// Label of the first shift active at `at`, or `""` when none matches.
///
/// Bounds are inclusive on both ends. A shift whose end is earlier than
/// its start wraps past midnight.
pub fn resolve_shift(at: NaiveTime, shifts: &[ShiftDefinition]) -> &str {
    let t = TimeOfDay::from(at);
    shifts
        .iter()
        .find(|s| is_active(t, s.start_time, s.end_time))
        .map(|s| s.label.as_str())
        .unwrap_or("")
}

fn is_active(t: TimeOfDay, start: TimeOfDay, end: TimeOfDay) -> bool {
    if end < start {
        t >= start || t <= end
    } else {
        start <= t && t <= end
    }
}

/// Save-time validation of a shift table.
///
/// Labels must be present and distinct, and the durations must cover
/// exactly 24 hours.
pub fn validate_shift_table(shifts: &[ShiftDefinition]) -> Result<(), ProductionError> {
    let blank: Vec<String> = shifts
        .iter()
        .enumerate()
        .filter(|(_, s)| s.label.trim().is_empty())
        .map(|(i, _)| format!("shifts[{i}].label"))
        .collect();
    if !blank.is_empty() {
        return Err(ProductionError::validation("shift label must not be empty", blank));
    }

    let mut seen = HashSet::new();
    let duplicates: Vec<String> = shifts
        .iter()
        .filter(|s| !seen.insert(s.label.trim()))
        .map(|s| s.label.clone())
        .collect();
    if !duplicates.is_empty() {
        return Err(ProductionError::validation("duplicate shift label", duplicates));
    }

    let total: u32 = shifts.iter().map(|s| u32::from(s.duration_minutes())).sum();
    if total != u32::from(MINUTES_PER_DAY) {
        let hours = f64::from(total) / 60.0;
        return Err(ProductionError::validation(
            format!("shift durations must total 24 hours, got {hours:.2}"),
            shifts.iter().map(|s| s.label.clone()).collect(),
        ));
    }
    Ok(())
}

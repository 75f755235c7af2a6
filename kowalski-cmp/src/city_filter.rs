//! City filter extension
//!
//! Turns a list of one-way directions (`MOW-LED`) into a filter that also
//! matches the return flight and both round trips.

use kowalski_common::{Error, Result};
use std::collections::HashSet;

/// Filename offered for download when the caller names none
pub const DEFAULT_FILENAME: &str = "new_city_filter.txt";

/// Length of an `XXX-YYY` direction
const FILTER_DIRECTION_LEN: usize = 7;

/// Expand every direction of a filter file
///
/// Lines are trimmed, blank lines ignored and each line is cut to its first
/// `XXX-YYY`, so `LHE-KHI|KHI-LHE` reads as `LHE-KHI`. The output keeps
/// first-occurrence order and holds no duplicates.
///
/// # Errors
/// `InvalidInput` naming the first line that is not `XXX-YYY` shaped.
pub fn extend_city_filter(content: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut extended = Vec::new();

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let direction: String = line.chars().take(FILTER_DIRECTION_LEN).collect();
        let (departure, arrival) = split_direction(&direction).ok_or_else(|| {
            Error::InvalidInput(format!(
                "line {}: '{}' is not a direction like MOW-LED",
                number + 1,
                line
            ))
        })?;

        let reverse = format!("{}-{}", arrival, departure);
        let round_trip = format!("{}|{}", direction, reverse);
        let reverse_round_trip = format!("{}|{}", reverse, direction);
        for candidate in [direction, reverse, round_trip, reverse_round_trip] {
            if seen.insert(candidate.clone()) {
                extended.push(candidate);
            }
        }
    }

    Ok(extended)
}

/// `XXX-YYY` → `(XXX, YYY)`
fn split_direction(direction: &str) -> Option<(&str, &str)> {
    let (departure, arrival) = direction.split_once('-')?;
    let is_code = |code: &str| code.chars().count() == 3 && !code.contains(['-', '|']);
    (is_code(departure) && is_code(arrival)).then_some((departure, arrival))
}

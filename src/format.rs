//! Compact labels for round magnitudes (`1000000` → `1M`).

use crate::error::PipelineError;

const PREFIXES: [&str; 4] = ["", "K", "M", "G"];

/// Divide by `base` while the number is at least `base`, one suffix per step.
///
/// Tree sizes are always round magnitudes; a remainder at any step means the
/// input is not one and is rejected rather than truncated.
pub fn prefix_large_number(number: u64, base: u64) -> Result<String, PipelineError> {
    let not_exact = || PipelineError::NonExactMagnitude { number, base };
    if base < 2 {
        return Err(not_exact());
    }

    let mut n = number;
    let mut idx = 0;
    while n >= base {
        if n % base != 0 || idx + 1 >= PREFIXES.len() {
            return Err(not_exact());
        }
        n /= base;
        idx += 1;
    }
    Ok(format!("{}{}", n, PREFIXES[idx]))
}

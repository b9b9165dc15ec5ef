//! Wall clock plausibility

use crate::{Failure, JailConfig, Result, Verdict};
use std::ops::RangeInclusive;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the epoch a sane clock reports
pub const PLAUSIBLE_EPOCH_SECS: RangeInclusive<u64> = 1_400_000_001..=3_399_999_999;

pub fn clock_sanity(_config: &JailConfig) -> Result<Verdict> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());
    Ok(check_epoch_secs(secs).into())
}

fn check_epoch_secs(secs: u64) -> std::result::Result<(), Failure> {
    if PLAUSIBLE_EPOCH_SECS.contains(&secs) {
        Ok(())
    } else {
        Err(Failure::operation_failed(format!(
            "clock reads {secs}s since the epoch"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_clock_is_plausible() {
        assert!(clock_sanity(&JailConfig::default()).unwrap().is_pass());
    }

    #[test]
    fn bounds_are_exclusive() {
        assert!(check_epoch_secs(1_400_000_000).is_err());
        assert!(check_epoch_secs(3_400_000_000).is_err());
        assert!(check_epoch_secs(0).is_err());
        assert!(check_epoch_secs(1_700_000_000).is_ok());
    }
}

//! The privilege window: how many whole minutes of read-write capability
//! remain on the current token. Recomputed on a fixed tick while a window is
//! open; the tick stops as soon as no window is open.

use crate::features::access::uat::{Uat, UatPurpose};

/// Recompute cadence while a window is open.
pub const WINDOW_RECHECK_MS: u32 = 30_000;
/// A window closer than this to its expiry is treated as already closed, so
/// the UI never advertises an edit the server would reject moments later.
pub const SAFETY_MARGIN_MS: i64 = 60_000;

const MINUTE_MS: i64 = 60_000;

/// Whole minutes remaining on the read-write purpose, or `None` when the
/// token is read-only, the expiry is unreadable, or less than the safety
/// margin remains. Never returns less than one minute for an open window.
pub fn compute_window(uat: &Uat, now_ms: i64) -> Option<u32> {
    let UatPurpose::ReadWrite {
        expiry: Some(stamp),
    } = &uat.purpose
    else {
        return None;
    };

    let expiry_ms = stamp.epoch_millis()?;
    let remaining = expiry_ms - now_ms;
    if remaining <= SAFETY_MARGIN_MS {
        return None;
    }

    let minutes = (remaining + MINUTE_MS - 1) / MINUTE_MS;
    Some(minutes.max(1) as u32)
}

#[cfg(test)]
mod tests {
    use super::{SAFETY_MARGIN_MS, compute_window};
    use crate::features::access::uat::{ExpiryStamp, Uat, UatPurpose};

    fn readwrite_uat(expiry: ExpiryStamp) -> Uat {
        Uat {
            uuid: "00000000-0000-0000-0000-000000000001".to_string(),
            name: Some("alice".to_string()),
            displayname: None,
            purpose: UatPurpose::ReadWrite {
                expiry: Some(expiry),
            },
        }
    }

    #[test]
    fn readonly_purpose_has_no_window() {
        let uat = Uat {
            uuid: "00000000-0000-0000-0000-000000000001".to_string(),
            name: None,
            displayname: None,
            purpose: UatPurpose::ReadOnly,
        };
        assert_eq!(compute_window(&uat, 0), None);
    }

    #[test]
    fn window_closes_inside_the_safety_margin() {
        let now = 1_700_000_000_000;
        // 45 s remaining is inside the 60 s margin.
        let uat = readwrite_uat(ExpiryStamp::Epoch(now + 45_000));
        assert_eq!(compute_window(&uat, now), None);
        // Exactly the margin is still closed; one millisecond past it is open.
        let at_margin = readwrite_uat(ExpiryStamp::Epoch(now + SAFETY_MARGIN_MS));
        assert_eq!(compute_window(&at_margin, now), None);
        let past_margin = readwrite_uat(ExpiryStamp::Epoch(now + SAFETY_MARGIN_MS + 1));
        assert_eq!(compute_window(&past_margin, now), Some(2));
    }

    #[test]
    fn minutes_are_the_ceiling_of_remaining_time() {
        let now = 1_700_000_000_000;
        let uat = readwrite_uat(ExpiryStamp::Epoch(now + 5 * 60_000));
        assert_eq!(compute_window(&uat, now), Some(5));
        let uat = readwrite_uat(ExpiryStamp::Epoch(now + 4 * 60_000 + 1));
        assert_eq!(compute_window(&uat, now), Some(5));
    }

    #[test]
    fn window_is_monotonically_non_increasing_in_now() {
        let expiry = 1_700_000_600_000;
        let uat = readwrite_uat(ExpiryStamp::Epoch(expiry));
        let mut previous = u32::MAX;
        for now in (1_700_000_000_000..=expiry).step_by(10_000) {
            let minutes = compute_window(&uat, now).unwrap_or(0);
            assert!(minutes <= previous, "window grew at now={now}");
            previous = minutes;
        }
        // Past the margin the window stays closed.
        assert_eq!(compute_window(&uat, expiry - SAFETY_MARGIN_MS), None);
        assert_eq!(compute_window(&uat, expiry + 1), None);
    }

    #[test]
    fn iso_expiry_stamps_are_accepted() {
        let now = 1_700_000_000_000;
        // 2023-11-14T22:23:20Z is now + 10 minutes.
        let uat = readwrite_uat(ExpiryStamp::Text("2023-11-14T22:23:20Z".to_string()));
        assert_eq!(compute_window(&uat, now), Some(10));
    }

    #[test]
    fn seconds_encoded_expiry_matches_millis_encoded() {
        let now = 1_700_000_000_000;
        let seconds = readwrite_uat(ExpiryStamp::Epoch(1_700_000_300));
        let millis = readwrite_uat(ExpiryStamp::Epoch(1_700_000_300_000));
        assert_eq!(compute_window(&seconds, now), compute_window(&millis, now));
    }
}

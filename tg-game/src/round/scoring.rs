//! Points for a guess
//!
//! A correct answer is worth 500 points, minus 25 for every whole second of
//! listening, never dropping below 50. The floor is reached at 18 seconds.

/// Points for an instant correct answer
pub const MAX_POINTS: u32 = 500;

/// Lowest award for any correct answer
pub const MIN_POINTS: u32 = 50;

/// Points lost per whole second listened
pub const DECAY_PER_SECOND: u32 = 25;

/// Points for one guess
///
/// Any listening at all is charged at least one second; answering without
/// playing the preview earns the full [`MAX_POINTS`].
pub fn score(correct: bool, listened_ms: u64) -> u32 {
    if !correct {
        return 0;
    }

    let seconds = if listened_ms == 0 {
        0
    } else {
        (listened_ms / 1000).max(1)
    };
    let penalty = seconds.saturating_mul(u64::from(DECAY_PER_SECOND));

    let points = u64::from(MAX_POINTS).saturating_sub(penalty);
    // points <= MAX_POINTS, so the conversion cannot fail
    u32::try_from(points).unwrap_or(MAX_POINTS).max(MIN_POINTS)
}

//! Terminal lookup table.
//!
//! Every number on a European roulette wheel (0–36) maps to a fixed,
//! ordered set of "terminal" numbers. A round is won when a number drawn
//! after the trigger lands anywhere in the trigger's terminal set.
//!
//! The table is a total function over the wheel, initialised once and
//! never mutated. Rows are 12–16 numbers long and every row contains 0.

/// Highest number on a European roulette wheel.
pub const WHEEL_MAX: u8 = 36;

/// How many terminals are surfaced to players as the betting suggestion.
pub const SUGGESTION_LEN: usize = 3;

/// One row per trigger number 0–36.
static TERMINAL_TABLE: [&[u8]; 37] = [
    &[3, 6, 10, 13, 16, 20, 23, 26, 30, 33, 36, 0],                     // 0
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 1
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 2
    &[3, 6, 9, 10, 13, 16, 19, 20, 23, 26, 29, 30, 33, 36, 0],         // 3
    &[4, 7, 8, 10, 14, 17, 18, 20, 24, 27, 28, 30, 34, 0],             // 4
    &[5, 6, 9, 10, 15, 16, 19, 20, 25, 26, 29, 30, 35, 36, 0],         // 5
    &[3, 6, 9, 10, 13, 16, 19, 20, 23, 26, 29, 30, 33, 36, 0],         // 6
    &[4, 7, 8, 10, 14, 17, 18, 20, 24, 27, 28, 30, 34, 0],             // 7
    &[4, 7, 8, 10, 14, 17, 18, 20, 24, 27, 28, 30, 34, 0],             // 8
    &[5, 6, 9, 10, 15, 16, 19, 20, 25, 26, 29, 30, 35, 36, 0],         // 9
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 10
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 11
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 12
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 13
    &[4, 7, 8, 10, 14, 17, 18, 20, 24, 27, 28, 30, 34, 0],             // 14
    &[5, 6, 9, 10, 15, 16, 19, 20, 25, 26, 29, 30, 35, 36, 0],         // 15
    &[3, 6, 9, 10, 13, 16, 19, 20, 23, 26, 29, 30, 33, 36, 0],         // 16
    &[4, 7, 8, 10, 14, 17, 18, 20, 24, 27, 28, 30, 34, 0],             // 17
    &[4, 7, 8, 10, 14, 17, 18, 20, 24, 27, 28, 30, 34, 0],             // 18
    &[5, 6, 9, 10, 15, 16, 19, 20, 25, 26, 29, 30, 35, 36, 0],         // 19
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 20
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 21
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 22
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 23
    &[4, 7, 8, 10, 14, 17, 18, 20, 24, 27, 28, 30, 34, 0],             // 24
    &[5, 6, 9, 10, 15, 16, 19, 20, 25, 26, 29, 30, 35, 36, 0],         // 25
    &[3, 6, 9, 10, 13, 16, 19, 20, 23, 26, 29, 30, 33, 36, 0],         // 26
    &[4, 7, 8, 10, 14, 17, 18, 20, 24, 27, 28, 30, 34, 0],             // 27
    &[4, 7, 8, 10, 14, 17, 18, 20, 24, 27, 28, 30, 34, 0],             // 28
    &[5, 6, 9, 10, 15, 16, 19, 20, 25, 26, 29, 30, 35, 36, 0],         // 29
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 30
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 31
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 32
    &[1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31, 32, 33, 0],     // 33
    &[4, 7, 8, 10, 14, 17, 18, 20, 24, 27, 28, 30, 34, 0],             // 34
    &[5, 6, 9, 10, 15, 16, 19, 20, 25, 26, 29, 30, 35, 36, 0],         // 35
    &[3, 6, 9, 10, 13, 16, 19, 20, 23, 26, 29, 30, 33, 36, 0],         // 36
];

/// Terminal set for a trigger number.
///
/// Returns `None` for anything outside the wheel — this covers the -1
/// "unset" sentinel used by the analyzer and degrades gracefully should
/// the totality invariant ever be violated by a misconfigured table.
pub fn lookup(trigger: i8) -> Option<&'static [u8]> {
    if (0..=WHEEL_MAX as i8).contains(&trigger) {
        Some(TERMINAL_TABLE[trigger as usize])
    } else {
        None
    }
}

/// Whether `number` is a terminal of `trigger`. False when the trigger is
/// unset or has no row.
pub fn contains(trigger: i8, number: u8) -> bool {
    lookup(trigger).is_some_and(|terms| terms.contains(&number))
}

/// The display subset of a trigger's terminals (first [`SUGGESTION_LEN`]).
/// Empty when the trigger is unset.
pub fn suggestion(trigger: i8) -> &'static [u8] {
    match lookup(trigger) {
        Some(terms) => &terms[..terms.len().min(SUGGESTION_LEN)],
        None => &[],
    }
}

/// Sum of the trigger's full terminal row. Zero when the trigger is unset.
pub fn sum(trigger: i8) -> u32 {
    lookup(trigger)
        .map(|terms| terms.iter().map(|&n| u32::from(n)).sum())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

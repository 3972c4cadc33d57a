//! Placement score arithmetic.
//!
//! Scores are integers clamped to `[-INFINITY, INFINITY]`. Negative infinity
//! dominates every addition: once a node is banned, no positive score can
//! bring it back.

use tracing::warn;

/// The score treated as infinite.
pub const INFINITY: i32 = 1_000_000;

/// Parse a score string (`"INFINITY"`, `"+INFINITY"`, `"-INFINITY"` or an
/// integer). Finite values are clamped; unparsable input scores 0.
pub fn parse_score(value: &str) -> i32 {
    let value = value.trim();
    if value.eq_ignore_ascii_case("INFINITY") || value.eq_ignore_ascii_case("+INFINITY") {
        return INFINITY;
    }
    if value.eq_ignore_ascii_case("-INFINITY") {
        return -INFINITY;
    }
    match value.parse::<i64>() {
        Ok(n) => n.clamp(-i64::from(INFINITY), i64::from(INFINITY)) as i32,
        Err(_) => {
            warn!(value, "treating unparsable score as 0");
            0
        }
    }
}

/// Add two scores, honouring infinities. `-INFINITY` wins over `INFINITY`.
pub fn add_scores(a: i32, b: i32) -> i32 {
    if a <= -INFINITY || b <= -INFINITY {
        return -INFINITY;
    }
    if a >= INFINITY || b >= INFINITY {
        return INFINITY;
    }
    (i64::from(a) + i64::from(b)).clamp(-i64::from(INFINITY), i64::from(INFINITY)) as i32
}

/// Render a score the way configuration files spell it.
pub fn score_to_string(score: i32) -> String {
    if score >= INFINITY {
        "INFINITY".to_string()
    } else if score <= -INFINITY {
        "-INFINITY".to_string()
    } else {
        score.to_string()
    }
}

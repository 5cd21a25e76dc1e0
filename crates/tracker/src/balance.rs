//! Recommends how much more time each mode needs so that the totals reach
//! money : hacker : playboy = 2 : 1 : 1 without taking time away from any
//! mode.

use shared::domain::{Mode, TotalTime};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deficit {
    pub mode: Mode,
    pub seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// Mode whose total the others are scaled to. Its deficit is always zero.
    pub reference: Mode,
    /// Whole seconds, largest deficit first, ties in label order.
    pub entries: Vec<Deficit>,
}

impl Recommendation {
    pub fn seconds_for(&self, mode: Mode) -> f64 {
        self.entries
            .iter()
            .find(|entry| entry.mode == mode)
            .map(|entry| entry.seconds)
            .unwrap_or(0.0)
    }
}

fn sanitize(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// Picks the reference mode with the first matching rule:
///
/// 1. hacker, when `2h >= m` and `h >= p`
/// 2. money, when `m >= 2h` and `m >= 2p`
/// 3. playboy otherwise.
///
/// For non-negative inputs the third branch always satisfies `p >= h` and
/// `2p >= m`: failing rule 1 means either `2h < m` (and failing rule 2 then
/// forces `2p > m > 2h`) or `h < p` with `2h >= m`.
pub fn recommend(hacker: f64, money: f64, playboy: f64) -> Recommendation {
    let (h, m, p) = (sanitize(hacker), sanitize(money), sanitize(playboy));

    let (reference, [hacker_deficit, money_deficit, playboy_deficit]) =
        if 2.0 * h >= m && h >= p {
            (Mode::Hacker, [0.0, 2.0 * h - m, h - p])
        } else if m >= 2.0 * h && m >= 2.0 * p {
            (Mode::Money, [m / 2.0 - h, 0.0, m / 2.0 - p])
        } else {
            debug_assert!(p >= h && 2.0 * p >= m);
            (Mode::Playboy, [p - h, 2.0 * p - m, 0.0])
        };

    let mut entries: Vec<Deficit> = Mode::ALL
        .into_iter()
        .zip([hacker_deficit, money_deficit, playboy_deficit])
        .map(|(mode, seconds)| Deficit {
            mode,
            // Floored so the order agrees with what `format_hms` shows.
            seconds: seconds.max(0.0).floor(),
        })
        .collect();
    entries.sort_by(|a, b| {
        b.seconds
            .total_cmp(&a.seconds)
            .then_with(|| a.mode.cmp(&b.mode))
    });

    Recommendation { reference, entries }
}

pub fn recommend_totals(totals: &TotalTime) -> Recommendation {
    recommend(totals.hacker, totals.money, totals.playboy)
}

/// Renders whole seconds as `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_hms(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!(
        "{:02}:{:02}:{:02}",
        whole / 3600,
        (whole % 3600) / 60,
        whole % 60
    )
}

#[cfg(test)]
#[path = "tests/balance_tests.rs"]
mod tests;

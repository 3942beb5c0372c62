//! Relationship progression: diminishing-return gains and daily decay.
//!
//! Every function here is pure. Callers pass the current game day in, which
//! keeps progression testable without a clock.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::TierLadder;
use crate::config::ProgressionConfig;

/// Upper score boundary of every tier.
pub const MAX_SCORE: u32 = 100;

/// Progress of one character pair along the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipState {
    pub tier_index: usize,
    pub score: u32,
    /// Game day of the last gain, 0 when none happened yet.
    pub last_gain_day: u32,
    /// Score moved on `last_gain_day`, counted against the daily cap.
    pub gained_today: u32,
    /// Game day of the last decay pass, 0 when none happened yet.
    pub last_decay_day: u32,
}

impl RelationshipState {
    /// A fresh relationship sitting at the ladder's neutral tier.
    pub fn neutral(ladder: &TierLadder) -> Self {
        Self::at_tier(ladder.neutral())
    }

    pub fn at_tier(tier_index: usize) -> Self {
        Self {
            tier_index,
            ..Default::default()
        }
    }

    /// Idle days since the relationship last decayed or gained.
    pub fn pending_decay_days(&self, today: u32) -> u32 {
        let since = self.last_decay_day.max(self.last_gain_day);
        if since == 0 {
            0
        } else {
            today.saturating_sub(since)
        }
    }

    fn clamped(mut self, ladder: &TierLadder) -> Self {
        self.tier_index = self.tier_index.min(ladder.top());
        self.score = self.score.min(MAX_SCORE);
        self
    }
}

/// Inputs to [`add_slow`].
pub struct GainOptions<'a> {
    pub day: u32,
    pub stiffness: f64,
    pub daily_cap: u32,
    /// Decides tier gate flags. Without one every gated tier stays locked.
    pub gate_check: Option<&'a dyn Fn(&str) -> bool>,
}

impl<'a> GainOptions<'a> {
    /// Options for `day` using the default progression tuning.
    pub fn new(day: u32) -> Self {
        Self::from_config(day, &ProgressionConfig::default())
    }

    pub fn from_config(day: u32, config: &ProgressionConfig) -> Self {
        Self {
            day,
            stiffness: config.stiffness,
            daily_cap: config.daily_cap,
            gate_check: None,
        }
    }

    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn with_daily_cap(mut self, daily_cap: u32) -> Self {
        self.daily_cap = daily_cap;
        self
    }

    pub fn with_gate_check(mut self, gate_check: &'a dyn Fn(&str) -> bool) -> Self {
        self.gate_check = Some(gate_check);
        self
    }

    fn passes_gate(&self, flag: &str) -> bool {
        self.gate_check.map(|check| check(flag)).unwrap_or(false)
    }
}

/// Step size toward a boundary `remain` points away.
///
/// `ceil(remain * (|base_percent| / 100) ^ stiffness)`, clamped to
/// `[1, remain]`. Larger stiffness shrinks steps taken from far away, so
/// progress slows the further a score is from the boundary.
pub fn effective_gain(remain: u32, base_percent: f64, stiffness: f64) -> u32 {
    if remain == 0 {
        return 0;
    }

    let ratio = (base_percent.abs() / 100.0).powf(stiffness);
    let raw = (f64::from(remain) * ratio).ceil();
    if !raw.is_finite() || raw < 1.0 {
        return 1;
    }
    raw.min(f64::from(remain)) as u32
}

/// Whether the tier above `tier` may be entered.
pub fn can_advance_tier(ladder: &TierLadder, tier: usize, gate_check: impl Fn(&str) -> bool) -> bool {
    if tier >= ladder.top() {
        return false;
    }
    match ladder.get(tier + 1).and_then(|next| next.gate.as_ref()) {
        Some(gate) => gate_check(&gate.flag),
        None => true,
    }
}

/// Move the score by a diminishing step, respecting the daily cap.
///
/// Positive `base_percent` heads for 100, negative for 0. Reaching 100
/// promotes to the next tier at score 0 when the gate allows, otherwise the
/// score holds at 99 (or stays at 100 if it started there). Reaching 0 demotes to the previous tier at score 100,
/// or holds at 0 on the bottom tier.
pub fn add_slow(
    ladder: &TierLadder,
    cur: &RelationshipState,
    base_percent: f64,
    opts: &GainOptions<'_>,
) -> RelationshipState {
    let mut next = cur.clamped(ladder);
    if next.last_gain_day != opts.day {
        next.last_gain_day = opts.day;
        next.gained_today = 0;
    }

    if base_percent == 0.0 || !base_percent.is_finite() {
        return next;
    }
    let room = opts.daily_cap.saturating_sub(next.gained_today);
    if room == 0 {
        return next;
    }

    let rising = base_percent > 0.0;
    let distance = if rising {
        MAX_SCORE - next.score
    } else {
        next.score
    };
    let step = effective_gain(distance.min(room), base_percent, opts.stiffness);
    next.gained_today += step;

    if rising {
        let score = next.score + step;
        if score < MAX_SCORE {
            next.score = score;
        } else if can_advance_tier(ladder, next.tier_index, |flag| opts.passes_gate(flag)) {
            next.tier_index += 1;
            next.score = 0;
            tracing::debug!(tier = next.tier_index, day = opts.day, "Relationship promoted");
        } else {
            // A score already at 100 stays there; a step only lands on 99.
            next.score = next.score.max(MAX_SCORE - 1);
        }
    } else {
        let score = next.score - step;
        if score > 0 {
            next.score = score;
        } else if next.tier_index > 0 {
            next.tier_index -= 1;
            next.score = MAX_SCORE;
            tracing::debug!(tier = next.tier_index, day = opts.day, "Relationship demoted");
        } else {
            next.score = 0;
        }
    }

    next
}

/// Apply `days` of idle decay, one day at a time.
///
/// Each day moves the score toward the neutral tier by the current tier's
/// `decay_per_day`. Above neutral, a score that reaches 0 drops one tier only
/// when the score before that day's decay was already under the tier's
/// `drop_floor`; the lower tier is entered at the vacated tier's floor. Below
/// neutral the same rule is mirrored at 100, never climbing past neutral.
pub fn decay(ladder: &TierLadder, cur: &RelationshipState, days: u32, day: u32) -> RelationshipState {
    let mut next = cur.clamped(ladder);
    let neutral = ladder.neutral();

    for _ in 0..days {
        let Some(tier) = ladder.get(next.tier_index) else {
            break;
        };
        let rate = tier.decay_per_day;
        if rate == 0 {
            continue;
        }
        let floor = tier.drop_floor.min(MAX_SCORE);
        let prev = next.score;

        match next.tier_index.cmp(&neutral) {
            Ordering::Greater => {
                if prev > rate {
                    next.score = prev - rate;
                } else if prev < floor {
                    next.tier_index -= 1;
                    next.score = floor;
                    tracing::debug!(tier = next.tier_index, day, "Relationship decayed a tier");
                } else {
                    next.score = 0;
                }
            }
            Ordering::Less => {
                if prev + rate < MAX_SCORE {
                    next.score = prev + rate;
                } else if prev > MAX_SCORE - floor {
                    next.tier_index += 1;
                    next.score = MAX_SCORE - floor;
                    tracing::debug!(tier = next.tier_index, day, "Relationship recovered a tier");
                } else {
                    next.score = MAX_SCORE;
                }
            }
            Ordering::Equal => {
                next.score = prev.saturating_sub(rate);
            }
        }
    }

    next.last_decay_day = day;
    next
}

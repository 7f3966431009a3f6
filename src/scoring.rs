use serde::{Deserialize, Serialize};

/// Percentage a player needs to pass unless configured otherwise.
pub const DEFAULT_PASS_THRESHOLD: u32 = 50;

/// Qualitative grade bucket. Boundaries are checked highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Tier {
    #[strum(serialize = "A+")]
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    F,
}

impl Tier {
    pub fn message(&self) -> &'static str {
        match self {
            Tier::APlus => "Outstanding! You're a master!",
            Tier::A => "Great job! Well done!",
            Tier::B => "Good effort! You passed!",
            Tier::F => "Keep practicing! You'll get better!",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Tier::APlus => "🏆",
            Tier::A => "🎉",
            Tier::B => "👍",
            Tier::F => "💪",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub passed: bool,
    pub tier: Tier,
    pub message: &'static str,
    pub emoji: &'static str,
}

/// `round(100 * score / total)` with halves rounded up; zero when `total == 0`.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score.min(total));
    let total = u64::from(total);
    // floor(100s/t + 1/2) without going through floats
    ((200 * score + total) / (2 * total)) as u32
}

/// Grade an attempt. `score` is clamped into `0..=total`.
pub fn grade(score: u32, total: u32, pass_threshold: u32) -> Grade {
    let score = score.min(total);
    let percentage = percentage(score, total);
    let passed = percentage >= pass_threshold;

    let tier = if percentage >= 90 {
        Tier::APlus
    } else if percentage >= 70 {
        Tier::A
    } else if percentage >= pass_threshold {
        Tier::B
    } else {
        Tier::F
    };

    Grade {
        score,
        total,
        percentage,
        passed,
        tier,
        message: tier.message(),
        emoji: tier.emoji(),
    }
}

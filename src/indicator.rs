//! Indicator strength classification
//!
//! Turns a raw change percentage into the label, score and tone that the
//! market screen renders. Everything here is pure: the same input always
//! yields the same output, and nothing is stored between calls.

/// Change (in percent) at or beyond which a move counts as strong
pub const STRONG_MOVE_PERCENT: f64 = 2.0;

/// Half-width of the band around zero treated as flat
pub const FLAT_BAND_PERCENT: f64 = 0.25;

/// Change (in percent) that maps to a full strength score of 100
const FULL_SCALE_PERCENT: f64 = 5.0;

/// Ordered strength labels, from the strongest fall to the strongest rise
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrengthLabel {
    StrongDown,
    Down,
    Flat,
    Up,
    StrongUp,
}

impl StrengthLabel {
    /// Short display name
    pub fn as_str(&self) -> &'static str {
        match self {
            StrengthLabel::StrongDown => "Strong fall",
            StrengthLabel::Down => "Falling",
            StrengthLabel::Flat => "Steady",
            StrengthLabel::Up => "Rising",
            StrengthLabel::StrongUp => "Strong rise",
        }
    }

    /// Arrow glyph for compact rendering
    pub fn arrow(&self) -> &'static str {
        match self {
            StrengthLabel::StrongDown => "\u{21CA}", // ⇊
            StrengthLabel::Down => "\u{2193}",       // ↓
            StrengthLabel::Flat => "\u{2192}",       // →
            StrengthLabel::Up => "\u{2191}",         // ↑
            StrengthLabel::StrongUp => "\u{21C8}",   // ⇈
        }
    }

    /// Colour category of the label
    pub fn tone(&self) -> Tone {
        match self {
            StrengthLabel::StrongDown | StrengthLabel::Down => Tone::Negative,
            StrengthLabel::Flat => Tone::Neutral,
            StrengthLabel::Up | StrengthLabel::StrongUp => Tone::Positive,
        }
    }
}

/// Colour category of a derived indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Positive,
    Neutral,
    Negative,
}

/// Display facts derived from a change percentage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedIndicator {
    /// Strength bucket of the change
    pub label: StrengthLabel,
    /// Magnitude of the change on a 0-100 scale
    pub strength_score: f64,
    /// Colour category
    pub tone: Tone,
}

/// Classifies a change percentage
///
/// Total over every `f64`: infinities land in the strong buckets and NaN is
/// treated as no movement.
///
/// | Label        | Range                |
/// |--------------|----------------------|
/// | `StrongUp`   | `>= +2.0`            |
/// | `Up`         | `(+0.25, +2.0)`      |
/// | `Flat`       | `[-0.25, +0.25]`     |
/// | `Down`       | `(-2.0, -0.25)`      |
/// | `StrongDown` | `<= -2.0`            |
pub fn classify(change_percent: f64) -> DerivedIndicator {
    let label = label_for(change_percent);
    DerivedIndicator {
        label,
        strength_score: strength_score(change_percent),
        tone: label.tone(),
    }
}

fn label_for(change_percent: f64) -> StrengthLabel {
    if change_percent.is_nan() {
        StrengthLabel::Flat
    } else if change_percent >= STRONG_MOVE_PERCENT {
        StrengthLabel::StrongUp
    } else if change_percent > FLAT_BAND_PERCENT {
        StrengthLabel::Up
    } else if change_percent >= -FLAT_BAND_PERCENT {
        StrengthLabel::Flat
    } else if change_percent > -STRONG_MOVE_PERCENT {
        StrengthLabel::Down
    } else {
        StrengthLabel::StrongDown
    }
}

fn strength_score(change_percent: f64) -> f64 {
    if change_percent.is_nan() {
        return 0.0;
    }
    (change_percent.abs() / FULL_SCALE_PERCENT).min(1.0) * 100.0
}

//! Free-text budget phrases → canonical budget tiers.
//!
//! Resolution order for a phrase:
//! 1. any digit run wins and becomes [`BudgetSpec::Numeric`],
//! 2. an exact keyword match from [`KEYWORDS`],
//! 3. the first keyword (in table order) contained in the phrase.
//!
//! Step 3 is deliberately loose: `"lowkey fancy"` resolves to
//! [`Tier::Budget`] because `"low"` is listed before `"fancy"`. Callers that
//! need stricter matching should ask the user to pick a tier explicitly.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::error::TourError;

/// One of the four canonical price categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Budget,
    Mid,
    Upscale,
    Luxury,
}

impl Tier {
    pub const fn all() -> &'static [Tier] {
        &[Tier::Budget, Tier::Mid, Tier::Upscale, Tier::Luxury]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Budget => "budget",
            Tier::Mid => "mid",
            Tier::Upscale => "upscale",
            Tier::Luxury => "luxury",
        }
    }

    /// Price range per meal, in USD.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Tier::Budget => "under $15/meal",
            Tier::Mid => "$15-35/meal",
            Tier::Upscale => "$35-75/meal",
            Tier::Luxury => "$75+/meal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Budget => "budget-friendly",
            Tier::Mid => "mid-range",
            Tier::Upscale => "upscale",
            Tier::Luxury => "luxury",
        }
    }

    /// Bucket a per-meal amount into a tier.
    pub fn from_amount(amount: u64) -> Self {
        match amount {
            0..15 => Tier::Budget,
            15..35 => Tier::Mid,
            35..75 => Tier::Upscale,
            _ => Tier::Luxury,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered synonym table. Earlier entries win substring ties.
pub const KEYWORDS: &[(&str, Tier)] = &[
    ("budget", Tier::Budget),
    ("cheap", Tier::Budget),
    ("low", Tier::Budget),
    ("affordable", Tier::Budget),
    ("inexpensive", Tier::Budget),
    ("economical", Tier::Budget),
    ("frugal", Tier::Budget),
    ("tight", Tier::Budget),
    ("mid", Tier::Mid),
    ("middle", Tier::Mid),
    ("medium", Tier::Mid),
    ("moderate", Tier::Mid),
    ("average", Tier::Mid),
    ("standard", Tier::Mid),
    ("normal", Tier::Mid),
    ("regular", Tier::Mid),
    ("reasonable", Tier::Mid),
    ("high", Tier::Upscale),
    ("expensive", Tier::Upscale),
    ("upscale", Tier::Upscale),
    ("fancy", Tier::Upscale),
    ("nice", Tier::Upscale),
    ("good", Tier::Upscale),
    ("quality", Tier::Upscale),
    ("fine", Tier::Upscale),
    ("elevated", Tier::Upscale),
    ("luxury", Tier::Luxury),
    ("premium", Tier::Luxury),
    ("deluxe", Tier::Luxury),
    ("exclusive", Tier::Luxury),
    ("elite", Tier::Luxury),
    ("top", Tier::Luxury),
    ("best", Tier::Luxury),
    ("finest", Tier::Luxury),
    ("gourmet", Tier::Luxury),
    ("michelin", Tier::Luxury),
    ("splurge", Tier::Luxury),
    ("extravagant", Tier::Luxury),
];

/// A resolved budget preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum BudgetSpec {
    Tier(Tier),
    /// Literal per-meal amount in USD. Always positive.
    Numeric(u64),
}

impl Default for BudgetSpec {
    fn default() -> Self {
        BudgetSpec::Tier(Tier::Mid)
    }
}

impl BudgetSpec {
    /// Tier this budget falls into; numeric amounts are bucketed.
    pub fn tier(&self) -> Tier {
        match self {
            BudgetSpec::Tier(tier) => *tier,
            BudgetSpec::Numeric(amount) => Tier::from_amount(*amount),
        }
    }

    pub fn descriptor(&self) -> &'static str {
        self.tier().descriptor()
    }

    /// Phrase used when building AI prompts, e.g.
    /// `mid-range ($15-35/meal)` or `about $50 per meal (upscale, $35-75/meal)`.
    pub fn prompt_context(&self) -> String {
        let tier = self.tier();
        match self {
            BudgetSpec::Tier(_) => format!("{} ({})", tier.label(), tier.descriptor()),
            BudgetSpec::Numeric(amount) => {
                format!("about ${amount} per meal ({}, {})", tier.label(), tier.descriptor())
            }
        }
    }
}

impl fmt::Display for BudgetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetSpec::Tier(tier) => write!(f, "{} ({})", tier.label(), tier.descriptor()),
            BudgetSpec::Numeric(amount) => write!(f, "${amount}/meal"),
        }
    }
}

impl FromStr for BudgetSpec {
    type Err = TourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s).ok_or_else(|| {
            TourError::invalid_input(format!(
                "could not understand budget '{}'. Try an amount like \"$30\" or a word like \
                 \"cheap\", \"mid-range\", \"fancy\" or \"luxury\".",
                s.trim()
            ))
        })
    }
}

/// Resolve free text into a [`BudgetSpec`], or `None` if nothing matches.
pub fn normalize(input: &str) -> Option<BudgetSpec> {
    let cleaned: String = input
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '/'))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return None;
    }

    if let Some(digits) = leading_digit_run(cleaned) {
        // Runs too long for u64 saturate; zero is not a usable amount.
        let amount = digits.parse::<u64>().unwrap_or(u64::MAX);
        return (amount > 0).then_some(BudgetSpec::Numeric(amount));
    }

    if let Some((_, tier)) = KEYWORDS.iter().find(|(keyword, _)| *keyword == cleaned) {
        return Some(BudgetSpec::Tier(*tier));
    }

    KEYWORDS
        .iter()
        .find(|(keyword, _)| cleaned.contains(keyword))
        .map(|(_, tier)| BudgetSpec::Tier(*tier))
}

/// First run of ASCII digits in `s`.
fn leading_digit_run(s: &str) -> Option<&str> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    Some(&rest[..end])
}

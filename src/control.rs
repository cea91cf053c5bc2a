//! Control identifier classification and key extraction.
//!
//! A raw identifier is whitespace-collapsed and then matched against four
//! shapes in fixed precedence order; the first match wins. Each shape knows
//! how to derive the control key and the single narrative fragment the row
//! contributes.

use crate::catalog::{ControlEntry, ControlKey, NarrativeEntry};
use crate::error::ControlError;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

struct Patterns {
    whitespace: Regex,
    simple: Regex,
    enhanced: Regex,
    sub_control: Regex,
    sub_enhanced: Regex,
    sub_enhancement_suffix: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    whitespace: compile(r"\s+"),
    // AC-1
    simple: compile(r"^([A-Z]+)-([0-9]+)$"),
    // AC-2a. / AC-2a.1.
    enhanced: compile(r"^([A-Z]+)-([0-9]+)([a-z]\.(?:[1-9]\.)?)$"),
    // AC-2 (1) / AC-2 (21)
    sub_control: compile(r"^([A-Z]+)-([0-9]+) (\([0-9]+\))$"),
    // AC-3 (3)(a) and anything trailing, e.g. AC-3 (3)(b)(1)
    sub_enhanced: compile(r"^([A-Z]+)-([0-9]+) (\([0-9]+\))\(([a-z])\)(.*)$"),
    sub_enhancement_suffix: compile(r"^\(([0-9a-z]+)\)"),
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("control pattern compiles")
}

/// How trailing parts after a sub-control enhancement letter are treated.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubEnhancementPolicy {
    /// `AC-3 (3)(b)(1)` and `AC-3 (3)(b)(2)` both yield narrative key `b`.
    #[default]
    Collapse,
    /// `AC-3 (3)(b)(2)` yields narrative key `b.2` with the "plus" placeholder.
    Compound,
}

/// Lexical shape of a whitespace-collapsed control identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlShape<'a> {
    /// `AC-1`
    Simple { family: &'a str, number: &'a str },
    /// `AC-2a.`, `AC-2a.1.`; `enhancement` keeps its trailing period.
    Enhanced {
        family: &'a str,
        number: &'a str,
        enhancement: &'a str,
    },
    /// `AC-2 (21)`; `sub_control` includes the parentheses.
    SubControl {
        family: &'a str,
        number: &'a str,
        sub_control: &'a str,
    },
    /// `AC-3 (3)(a)`, with whatever followed the letter in `trailing`.
    SubEnhanced {
        family: &'a str,
        number: &'a str,
        sub_control: &'a str,
        enhancement: &'a str,
        trailing: &'a str,
    },
}

impl ControlShape<'_> {
    /// Canonical key: family letters, number, and sub-control if present.
    pub fn control_key(&self) -> ControlKey {
        match self {
            ControlShape::Simple { family, number }
            | ControlShape::Enhanced { family, number, .. } => {
                ControlKey(format!("{family}-{number}"))
            }
            ControlShape::SubControl {
                family,
                number,
                sub_control,
            }
            | ControlShape::SubEnhanced {
                family,
                number,
                sub_control,
                ..
            } => ControlKey(format!("{family}-{number} {sub_control}")),
        }
    }

    /// The narrative fragment this identifier contributes.
    pub fn narrative(&self, policy: SubEnhancementPolicy) -> NarrativeEntry {
        match self {
            ControlShape::Simple { .. } | ControlShape::SubControl { .. } => {
                NarrativeEntry::text_only()
            }
            ControlShape::Enhanced { enhancement, .. } => {
                NarrativeEntry::for_enhancement(enhancement.trim_end_matches('.'))
            }
            ControlShape::SubEnhanced {
                enhancement,
                trailing,
                ..
            } => match (policy, sub_enhancement(trailing)) {
                (SubEnhancementPolicy::Compound, Some(sub)) => {
                    NarrativeEntry::for_enhancement_plus(format!("{enhancement}.{sub}"))
                }
                _ => NarrativeEntry::for_enhancement(*enhancement),
            },
        }
    }
}

fn sub_enhancement(trailing: &str) -> Option<&str> {
    PATTERNS
        .sub_enhancement_suffix
        .captures(trailing)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Collapse internal whitespace runs to a single space.
pub fn collapse_whitespace(raw: &str) -> String {
    PATTERNS.whitespace.replace_all(raw, " ").into_owned()
}

/// Classify an already whitespace-collapsed identifier.
///
/// Patterns are tried in precedence order: simple control, control with
/// enhancement, simple sub-control, sub-control with enhancement.
pub fn classify(cleaned: &str) -> Option<ControlShape<'_>> {
    let p = &*PATTERNS;

    if let Some(caps) = p.simple.captures(cleaned) {
        return Some(ControlShape::Simple {
            family: group(&caps, 1),
            number: group(&caps, 2),
        });
    }
    if let Some(caps) = p.enhanced.captures(cleaned) {
        return Some(ControlShape::Enhanced {
            family: group(&caps, 1),
            number: group(&caps, 2),
            enhancement: group(&caps, 3),
        });
    }
    if let Some(caps) = p.sub_control.captures(cleaned) {
        return Some(ControlShape::SubControl {
            family: group(&caps, 1),
            number: group(&caps, 2),
            sub_control: group(&caps, 3),
        });
    }
    if let Some(caps) = p.sub_enhanced.captures(cleaned) {
        return Some(ControlShape::SubEnhanced {
            family: group(&caps, 1),
            number: group(&caps, 2),
            sub_control: group(&caps, 3),
            enhancement: group(&caps, 4),
            trailing: group(&caps, 5),
        });
    }
    None
}

fn group<'h>(caps: &Captures<'h>, idx: usize) -> &'h str {
    caps.get(idx).map_or("", |m| m.as_str())
}

/// Parser configured with a sub-enhancement policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlParser {
    policy: SubEnhancementPolicy,
}

impl ControlParser {
    pub fn new(policy: SubEnhancementPolicy) -> Self {
        Self { policy }
    }

    /// Parse a raw spreadsheet identifier into a single-fragment entry.
    ///
    /// Fails with [`ControlError::Malformed`] carrying the untouched input when
    /// no shape matches.
    pub fn parse(&self, raw: &str) -> Result<ControlEntry, ControlError> {
        let cleaned = collapse_whitespace(raw);
        let shape = classify(&cleaned).ok_or_else(|| ControlError::Malformed {
            raw: raw.to_string(),
        })?;
        Ok(ControlEntry::with_narrative(
            shape.control_key(),
            shape.narrative(self.policy),
        ))
    }
}

/// Parse with the default (collapsing) sub-enhancement policy.
pub fn parse_control(raw: &str) -> Result<ControlEntry, ControlError> {
    ControlParser::default().parse(raw)
}

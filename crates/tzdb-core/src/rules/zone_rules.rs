//! The complete rule set for one zone

use crate::error::{CoreError, Result};
use crate::rules::TransitionRule;
use crate::types::ZoneOffset;
use serde::{Deserialize, Serialize};

/// Upper bound on recurring rules per zone, matching the TZDB compiler
pub const MAX_LAST_RULES: usize = 16;

/// All historical and scheduled offset transitions for one zone.
///
/// The layout follows the TZDB compiled form:
///
/// - `standard_transitions[i]` is the instant the standard offset changes
///   from `standard_offsets[i]` to `standard_offsets[i + 1]`
/// - `savings_transitions[i]` is the instant the wall offset changes from
///   `wall_offsets[i]` to `wall_offsets[i + 1]`
/// - `last_rules` generate the transitions after the final savings instant
///
/// Both transition arrays are strictly ascending epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ZoneRulesRaw")]
pub struct ZoneRules {
    standard_transitions: Vec<i64>,
    standard_offsets: Vec<ZoneOffset>,
    savings_transitions: Vec<i64>,
    wall_offsets: Vec<ZoneOffset>,
    last_rules: Vec<TransitionRule>,
}

impl ZoneRules {
    /// Build a rule set, checking the structural invariants above
    pub fn new(
        standard_transitions: Vec<i64>,
        standard_offsets: Vec<ZoneOffset>,
        savings_transitions: Vec<i64>,
        wall_offsets: Vec<ZoneOffset>,
        last_rules: Vec<TransitionRule>,
    ) -> Result<Self> {
        check_offsets("standard", &standard_transitions, &standard_offsets)?;
        check_offsets("savings", &savings_transitions, &wall_offsets)?;
        check_ascending("standard", &standard_transitions)?;
        check_ascending("savings", &savings_transitions)?;
        if last_rules.len() > MAX_LAST_RULES {
            return Err(CoreError::MalformedRules(format!(
                "too many transition rules: {} (max {})",
                last_rules.len(),
                MAX_LAST_RULES
            )));
        }

        Ok(Self {
            standard_transitions,
            standard_offsets,
            savings_transitions,
            wall_offsets,
            last_rules,
        })
    }

    /// Rules for a zone that has always used a single offset
    pub fn fixed(offset: ZoneOffset) -> Self {
        Self {
            standard_transitions: Vec::new(),
            standard_offsets: vec![offset],
            savings_transitions: Vec::new(),
            wall_offsets: vec![offset],
            last_rules: Vec::new(),
        }
    }

    pub fn standard_transitions(&self) -> &[i64] {
        &self.standard_transitions
    }

    pub fn standard_offsets(&self) -> &[ZoneOffset] {
        &self.standard_offsets
    }

    pub fn savings_transitions(&self) -> &[i64] {
        &self.savings_transitions
    }

    pub fn wall_offsets(&self) -> &[ZoneOffset] {
        &self.wall_offsets
    }

    pub fn last_rules(&self) -> &[TransitionRule] {
        &self.last_rules
    }

    pub fn is_fixed_offset(&self) -> bool {
        self.savings_transitions.is_empty() && self.last_rules.is_empty()
    }
}

/// Unchecked wire form; deserialization goes through [`ZoneRules::new`]
#[derive(Deserialize)]
struct ZoneRulesRaw {
    standard_transitions: Vec<i64>,
    standard_offsets: Vec<ZoneOffset>,
    savings_transitions: Vec<i64>,
    wall_offsets: Vec<ZoneOffset>,
    last_rules: Vec<TransitionRule>,
}

impl TryFrom<ZoneRulesRaw> for ZoneRules {
    type Error = CoreError;

    fn try_from(raw: ZoneRulesRaw) -> Result<Self> {
        Self::new(
            raw.standard_transitions,
            raw.standard_offsets,
            raw.savings_transitions,
            raw.wall_offsets,
            raw.last_rules,
        )
    }
}

fn check_offsets(kind: &str, transitions: &[i64], offsets: &[ZoneOffset]) -> Result<()> {
    if offsets.len() != transitions.len() + 1 {
        return Err(CoreError::MalformedRules(format!(
            "{} offsets: expected {} entries for {} transitions, got {}",
            kind,
            transitions.len() + 1,
            transitions.len(),
            offsets.len()
        )));
    }
    Ok(())
}

fn check_ascending(kind: &str, transitions: &[i64]) -> Result<()> {
    if let Some(pos) = transitions.windows(2).position(|pair| pair[0] >= pair[1]) {
        return Err(CoreError::MalformedRules(format!(
            "{} transitions not strictly ascending at index {}",
            kind,
            pos + 1
        )));
    }
    Ok(())
}

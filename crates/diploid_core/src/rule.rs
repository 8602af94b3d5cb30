//! Elementary rule tables in Wolfram numbering.
//!
//! A rule number's bit `k` is the next state of a cell whose neighborhood
//! `(left, center, right)` encodes to `k = 4*left + 2*center + right`.
//! Written MSB first, the 8-bit expansion of the rule lists the outputs for
//! codes 7 down to 0.

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};

/// Number of distinct radius-1 binary neighborhoods.
pub const NEIGHBORHOODS: usize = 8;

/// Lookup from neighborhood code to next cell state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleTable {
    rule: u8,
    entries: [u8; NEIGHBORHOODS],
}

impl RuleTable {
    #[must_use]
    pub fn new(rule: u8) -> Self {
        let mut entries = [0u8; NEIGHBORHOODS];
        for (code, entry) in entries.iter_mut().enumerate() {
            *entry = (rule >> code) & 1;
        }
        Self { rule, entries }
    }

    #[must_use]
    pub fn rule_number(&self) -> u8 {
        self.rule
    }

    /// Outputs indexed by neighborhood code `0..=7`.
    #[must_use]
    pub fn entries(&self) -> &[u8; NEIGHBORHOODS] {
        &self.entries
    }

    /// Next state for a neighborhood code. Only the low three bits are read.
    #[inline(always)]
    #[must_use]
    pub fn lookup(&self, code: u8) -> u8 {
        self.entries[(code & 0b111) as usize]
    }

    /// State a gated-out cell takes, i.e. the output for code 0.
    #[must_use]
    pub fn quiescent(&self) -> u8 {
        self.entries[0]
    }

    /// The rule as its MSB-first 8-bit expansion, e.g. `"01101110"` for 110.
    #[must_use]
    pub fn binary_string(&self) -> String {
        format!("{:08b}", self.rule)
    }
}

impl From<u8> for RuleTable {
    fn from(rule: u8) -> Self {
        Self::new(rule)
    }
}

/// Builds the table for `rule_number`, rejecting anything above 255.
pub fn build_rule_table(rule_number: u32) -> Result<RuleTable> {
    let rule = u8::try_from(rule_number).map_err(|_| SimError::InvalidRule(rule_number))?;
    Ok(RuleTable::new(rule))
}

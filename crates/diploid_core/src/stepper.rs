//! One synchronous update of a periodic row.
//!
//! Every cell reads its left and right neighbors with wrap-around, encodes the
//! neighborhood as `4*left + 2*center + right`, multiplies that code by its
//! gate bit and looks the result up in the rule table. A closed gate therefore
//! routes the cell through entry 0 of the table.
//!
//! Only the low bit of each state and gate value is read.

use crate::error::{Result, SimError};
use crate::rule::RuleTable;
use diploid_data::CellRow;

fn check_shapes(state: &[u8], gate_row: &[u8]) -> Result<()> {
    if state.is_empty() {
        return Err(SimError::invalid_parameter("state must hold at least one cell"));
    }
    if state.len() != gate_row.len() {
        return Err(SimError::invalid_parameter(format!(
            "gate row has {} entries but state has {} cells",
            gate_row.len(),
            state.len()
        )));
    }
    Ok(())
}

#[inline(always)]
fn code_at(state: &[u8], i: usize) -> u8 {
    let n = state.len();
    let left = state[(i + n - 1) % n] & 1;
    let right = state[(i + 1) % n] & 1;
    4 * left + 2 * (state[i] & 1) + right
}

/// Un-gated neighborhood codes for every cell.
#[must_use]
pub fn neighborhood_codes(state: &[u8]) -> Vec<u8> {
    (0..state.len()).map(|i| code_at(state, i)).collect()
}

/// Computes the next row without touching `state`.
pub fn step(state: &[u8], rule_table: &RuleTable, gate_row: &[u8]) -> Result<CellRow> {
    let mut next = vec![0u8; state.len()];
    step_into(state, rule_table, gate_row, &mut next)?;
    Ok(next)
}

/// Same as [`step`] but writes into `out`, which is resized to fit.
pub fn step_into(
    state: &[u8],
    rule_table: &RuleTable,
    gate_row: &[u8],
    out: &mut CellRow,
) -> Result<()> {
    check_shapes(state, gate_row)?;
    out.resize(state.len(), 0);
    for (i, (cell, &gate)) in out.iter_mut().zip(gate_row).enumerate() {
        *cell = rule_table.lookup(code_at(state, i) * (gate & 1));
    }
    Ok(())
}

//! Decoding satisfying assignments into blocks

use crate::error::{CffError, Result};
use crate::sat::VariableLayout;

/// One member set of the family: 1-indexed universe elements in row order
pub type Block = Vec<usize>;

/// Rebuild the `n` blocks from the first `n * t` literals of `assignment`.
///
/// A positive literal `x` places element `(x - 1) / n + 1` into block
/// `(x - 1) % n`. Literals past `n * t` are indicators and are ignored.
/// Blocks come back ordered by ascending element sum; ties keep column order.
pub fn decode(assignment: &[i32], n: usize, t: usize) -> Result<Vec<Block>> {
    let layout = VariableLayout::new(t, n).ok_or_else(|| {
        CffError::MalformedModel(format!("a {} x {} matrix does not fit 32-bit literals", t, n))
    })?;
    let primary = layout.primary_count();
    if assignment.len() < primary {
        return Err(CffError::MalformedModel(format!(
            "assignment has {} literals, expected at least {}",
            assignment.len(),
            primary
        )));
    }

    let mut blocks: Vec<Block> = vec![Vec::new(); n];
    for &x in assignment[..primary].iter().filter(|&&x| x > 0) {
        let (row, col) = layout.position(x).ok_or_else(|| {
            CffError::MalformedModel(format!(
                "literal {} is not a matrix variable (n={}, t={})",
                x, n, t
            ))
        })?;
        blocks[col].push(row + 1);
    }

    blocks.sort_by_key(|block| block.iter().sum::<usize>());
    Ok(blocks)
}

/// Inverse of [`decode`]: the signed matrix assignment in which exactly the
/// given memberships hold.
#[cfg(test)]
pub(crate) fn encode_assignment(blocks: &[Block], t: usize) -> Vec<i32> {
    let n = blocks.len();
    let mut assignment: Vec<i32> = (1..=(n * t) as i32).map(|var| -var).collect();
    for (col, block) in blocks.iter().enumerate() {
        for &element in block {
            if (1..=t).contains(&element) {
                let index = (element - 1) * n + col;
                assignment[index] = index as i32 + 1;
            }
        }
    }
    assignment
}

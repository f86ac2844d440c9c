//! Brute-force certification of the cover-free property

use super::decoder::Block;
use crate::error::{CffError, Result};
use rayon::prelude::*;

/// Default ceiling on the number of blocks; work grows as n * 2^n.
pub const DEFAULT_MAX_BLOCKS: usize = 24;

/// Largest ceiling a verifier accepts; higher requests are clamped to it
pub const MAX_BLOCKS_LIMIT: usize = 30;

/// Outcome of a verification run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    CoverFree,
    /// `blocks[block]` lies inside the union of `blocks[c]` for every `c` in `by`
    Covered { block: usize, by: Vec<usize> },
}

impl Verdict {
    pub fn is_cover_free(&self) -> bool {
        matches!(self, Verdict::CoverFree)
    }
}

/// Checks families by enumerating every d-subset of the other blocks.
///
/// Independent of the encoder and solver; meant for certifying results and
/// for tests, never for the search loop.
#[derive(Debug, Clone)]
pub struct CoverFreeVerifier {
    max_blocks: usize,
}

impl CoverFreeVerifier {
    /// Create a verifier refusing families above `max_blocks`,
    /// clamped to [`MAX_BLOCKS_LIMIT`]
    pub fn new(max_blocks: usize) -> Self {
        Self {
            max_blocks: max_blocks.min(MAX_BLOCKS_LIMIT),
        }
    }

    pub fn max_blocks(&self) -> usize {
        self.max_blocks
    }

    /// Verify `blocks` against `d`, naming a covered block on failure
    pub fn verify(&self, blocks: &[Block], d: usize) -> Result<Verdict> {
        let n = blocks.len();
        if n > self.max_blocks {
            return Err(CffError::VerifierLimit {
                blocks: n,
                max: self.max_blocks,
            });
        }

        let sets: Vec<BitSet> = blocks.iter().map(|b| BitSet::from_block(b)).collect();
        let masks = 1u64 << n;

        let covered = (0..n).into_par_iter().find_map_first(|i| {
            let own_bit = 1u64 << i;
            (0..masks)
                .filter(|mask| mask & own_bit == 0 && mask.count_ones() as usize == d)
                .find(|&mask| {
                    let union = BitSet::union_of(&sets, mask);
                    sets[i].is_subset(&union)
                })
                .map(|mask| Verdict::Covered {
                    block: i,
                    by: (0..n).filter(|k| mask & (1u64 << k) != 0).collect(),
                })
        });

        Ok(covered.unwrap_or(Verdict::CoverFree))
    }
}

impl Default for CoverFreeVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BLOCKS)
    }
}

/// Whether no block is covered by the union of any `d` others
pub fn is_cover_free(blocks: &[Block], d: usize) -> Result<bool> {
    CoverFreeVerifier::default()
        .verify(blocks, d)
        .map(|verdict| verdict.is_cover_free())
}

/// Dense set of universe elements
#[derive(Debug, Clone, Default)]
struct BitSet {
    words: Vec<u64>,
}

impl BitSet {
    fn from_block(block: &[usize]) -> Self {
        let mut set = BitSet::default();
        for &element in block {
            set.insert(element);
        }
        set
    }

    fn insert(&mut self, element: usize) {
        let word = element / 64;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (element % 64);
    }

    fn union_with(&mut self, other: &BitSet) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            *mine |= theirs;
        }
    }

    fn union_of(sets: &[BitSet], mask: u64) -> BitSet {
        let mut union = BitSet::default();
        for (k, set) in sets.iter().enumerate() {
            if mask & (1u64 << k) != 0 {
                union.union_with(set);
            }
        }
        union
    }

    fn is_subset(&self, other: &BitSet) -> bool {
        self.words.iter().enumerate().all(|(i, &word)| {
            let theirs = other.words.get(i).copied().unwrap_or(0);
            word & !theirs == 0
        })
    }
}

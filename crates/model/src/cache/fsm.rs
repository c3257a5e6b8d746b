//! LRU replacement as a precomputed permutation state machine.
//!
//! A row's recency order over its ways is a permutation; promoting a way to
//! most-recently-used maps one permutation to another. Enumerating all `ways!`
//! permutations once at construction yields a transition table that replaces a
//! general LRU list with a single table walk per access:
//!
//! - each state holds `ways + 1` entries;
//! - entry 0 is the **miss/insert** transition: its way is the state's
//!   least-recently-used way (the victim) and its next state promotes that
//!   way to most-recently-used;
//! - entries `1..=ways` are the **hit** transitions in scan order, most
//!   recent first: entry *k* names the way at recency position *k − 1* and
//!   its next state promotes that way, preserving the relative order of the
//!   others.
//!
//! State 0 is the identity permutation, the canonical initial state of every
//! row. Note that entry 0 and entry `ways` coincide: hitting the LRU way is
//! the same promotion as inserting over it.

use std::collections::HashMap;

use crate::common::ModelError;
use crate::config::MAX_WAYS;

/// One transition: the way to examine and the state reached on a hit there.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FsmEntry {
    /// Way index to compare (or, for entry 0, the victim way).
    pub way: u16,
    /// Next LRU state after promoting that way.
    pub next: u16,
}

/// The full `ways! × (ways + 1)` transition table.
#[derive(Debug)]
pub(crate) struct LruFsm {
    ways: usize,
    table: Vec<FsmEntry>,
}

impl LruFsm {
    /// Enumerates all recency permutations and precomputes every transition.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] when `ways` is outside `1..=MAX_WAYS`.
    pub fn build(ways: usize) -> Result<Self, ModelError> {
        if ways == 0 || ways > MAX_WAYS {
            return Err(ModelError::Config(format!(
                "associativity must be in 1..={MAX_WAYS}, got {ways}"
            )));
        }

        // Lexicographic enumeration puts the identity permutation at id 0.
        let perms = permutations(ways);
        let ids: HashMap<Vec<u8>, u16> = perms
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i as u16))
            .collect();

        let mut table = Vec::with_capacity(perms.len() * (ways + 1));
        for perm in &perms {
            let victim_pos = ways - 1;
            table.push(FsmEntry {
                way: u16::from(perm[victim_pos]),
                next: ids[&promoted(perm, victim_pos)],
            });
            for pos in 0..ways {
                table.push(FsmEntry {
                    way: u16::from(perm[pos]),
                    next: ids[&promoted(perm, pos)],
                });
            }
        }

        Ok(Self { ways, table })
    }

    /// Number of states (`ways!`).
    pub fn states(&self) -> usize {
        self.table.len() / (self.ways + 1)
    }

    /// The `ways + 1` transition entries of one state.
    #[inline]
    pub fn block(&self, state: u16) -> &[FsmEntry] {
        let start = state as usize * (self.ways + 1);
        &self.table[start..start + self.ways + 1]
    }
}

/// `perm` with the element at `pos` moved to the front.
fn promoted(perm: &[u8], pos: usize) -> Vec<u8> {
    let mut next = Vec::with_capacity(perm.len());
    next.push(perm[pos]);
    next.extend(perm.iter().enumerate().filter(|&(i, _)| i != pos).map(|(_, &w)| w));
    next
}

/// All permutations of `0..ways`, in lexicographic order.
fn permutations(ways: usize) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(ways);
    let mut used = vec![false; ways];
    build(&mut current, &mut used, &mut out);
    out
}

fn build(current: &mut Vec<u8>, used: &mut [bool], out: &mut Vec<Vec<u8>>) {
    if current.len() == used.len() {
        out.push(current.clone());
        return;
    }
    for way in 0..used.len() {
        if !used[way] {
            used[way] = true;
            current.push(way as u8);
            build(current, used, out);
            let _ = current.pop();
            used[way] = false;
        }
    }
}

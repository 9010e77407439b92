//! The deterministic tokenizer automaton and its compacted transitions.
//!
//! A [`Dfa`] is produced once by the generator and is immutable afterwards;
//! any number of tokenizer runs may share it by reference. Transition maps
//! are not stored per state but interned in a [`TransArrayPool`], so states
//! with identical outgoing edges share one array.

use std::collections::{BTreeMap, HashMap};

use crate::define_id;
use crate::store::{IndexedStore, LookupError};

define_id!(
    /// Identity of a word definition registered with the generator.
    pub WordId, "word"
);
define_id!(
    /// Identity of a deterministic automaton state.
    pub DfaStateId, "dfa-state"
);
define_id!(
    /// Identity of an interned transition array.
    pub TransArrayId, "trans-array"
);

/// Deduplicated `symbol -> next state` mappings shared across states.
///
/// Two maps with equal content always resolve to the same id, keyed by the
/// sorted `(symbol, target)` sequence.
#[derive(Debug, Clone, Default)]
pub struct TransArrayPool {
    arrays: IndexedStore<TransArrayId, BTreeMap<char, DfaStateId>>,
    interned: HashMap<Vec<(char, DfaStateId)>, TransArrayId>,
}

impl TransArrayPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `map`, returning the id of the unique array with its content.
    pub fn intern(&mut self, map: BTreeMap<char, DfaStateId>) -> TransArrayId {
        let key: Vec<(char, DfaStateId)> = map.iter().map(|(&c, &s)| (c, s)).collect();
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let id = self.arrays.insert(map);
        self.interned.insert(key, id);
        id
    }

    /// Looks up the transition for `symbol` in the given array.
    pub fn lookup(&self, id: TransArrayId, symbol: char) -> Result<Option<DfaStateId>, LookupError> {
        Ok(self.arrays.get(id)?.get(&symbol).copied())
    }

    /// The full content of an interned array.
    pub fn get(&self, id: TransArrayId) -> Result<&BTreeMap<char, DfaStateId>, LookupError> {
        self.arrays.get(id)
    }

    /// Number of distinct arrays interned.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

/// Accept metadata of a DFA state: the winning word among the accepting
/// members of the underlying subset (minimum priority).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptData<P> {
    pub word: WordId,
    pub priority: usize,
    pub payload: P,
}

/// One deterministic state: an interned transition array plus optional
/// accept metadata.
#[derive(Debug, Clone)]
pub struct DfaState<P> {
    pub trans: TransArrayId,
    pub accept: Option<AcceptData<P>>,
}

/// A deterministic finite automaton over characters.
#[derive(Debug, Clone)]
pub struct Dfa<P> {
    states: IndexedStore<DfaStateId, DfaState<P>>,
    pool: TransArrayPool,
    start: DfaStateId,
}

impl<P> Dfa<P> {
    /// Assembles a finished automaton. Intended for table generators; the
    /// states must reference arrays interned in `pool`, and `start` must be
    /// a state id minted by `states`.
    pub fn new(
        states: IndexedStore<DfaStateId, DfaState<P>>,
        pool: TransArrayPool,
        start: DfaStateId,
    ) -> Self {
        Self {
            states,
            pool,
            start,
        }
    }

    pub fn start(&self) -> DfaStateId {
        self.start
    }

    pub fn state(&self, id: DfaStateId) -> Result<&DfaState<P>, LookupError> {
        self.states.get(id)
    }

    /// Follows the transition for `symbol` out of `state`, if any.
    pub fn step(&self, state: DfaStateId, symbol: char) -> Result<Option<DfaStateId>, LookupError> {
        let state = self.states.get(state)?;
        self.pool.lookup(state.trans, symbol)
    }

    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// The transition-array pool backing this automaton.
    pub fn pool(&self) -> &TransArrayPool {
        &self.pool
    }
}

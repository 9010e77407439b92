//! Subset construction: NFA to DFA.
//!
//! Worklist construction over epsilon-closed subsets of NFA nodes. Each
//! distinct subset (canonical sorted key, structural dedup) becomes one DFA
//! state; transition maps are interned through the runtime's
//! [`TransArrayPool`] as states are sealed. Termination is guaranteed by
//! the finite powerset of NFA nodes.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use lexlr::dfa::{AcceptData, Dfa, DfaState, DfaStateId, TransArrayPool};
use lexlr::store::{IndexedStore, StoreId};

use crate::error::GenerationError;
use crate::nfa::{NfaGraph, NfaNodeId};

/// Runs the subset construction for `nfa`.
///
/// Accept metadata of each DFA state is the minimum-priority accepting
/// member of its subset — this is what lets a keyword word out-rank a
/// generic identifier word over the same text. Two distinct words accepting
/// with the same minimal priority in one subset make the lexicon ambiguous
/// and abort generation.
pub fn construct<P: Clone>(nfa: &NfaGraph<P>) -> Result<Dfa<P>, GenerationError> {
    let mut keys: HashMap<BTreeSet<NfaNodeId>, DfaStateId> = HashMap::new();
    let mut subsets: Vec<BTreeSet<NfaNodeId>> = Vec::new();
    let mut transitions: Vec<BTreeMap<char, DfaStateId>> = Vec::new();
    let mut worklist: VecDeque<DfaStateId> = VecDeque::new();

    let start_set = nfa.eps_closure([nfa.head()])?;
    let start = DfaStateId::from_usize(0);
    keys.insert(start_set.clone(), start);
    subsets.push(start_set);
    transitions.push(BTreeMap::new());
    worklist.push_back(start);

    while let Some(id) = worklist.pop_front() {
        let subset = subsets[id.as_usize()].clone();
        let mut row = BTreeMap::new();
        for symbol in nfa.alphabet_of(&subset)? {
            let target_set = nfa.eps_closure(nfa.step(&subset, symbol)?)?;
            if target_set.is_empty() {
                continue;
            }
            let target = match keys.get(&target_set) {
                Some(&existing) => existing,
                None => {
                    let fresh = DfaStateId::from_usize(subsets.len());
                    keys.insert(target_set.clone(), fresh);
                    subsets.push(target_set);
                    transitions.push(BTreeMap::new());
                    worklist.push_back(fresh);
                    fresh
                }
            };
            row.insert(symbol, target);
        }
        transitions[id.as_usize()] = row;
    }

    let mut pool = TransArrayPool::new();
    let mut states: IndexedStore<DfaStateId, DfaState<P>> = IndexedStore::new();
    for (subset, row) in subsets.iter().zip(transitions) {
        let accept = resolve_accept(nfa, subset)?;
        let trans = pool.intern(row);
        states.insert(DfaState { trans, accept });
    }

    log::debug!(
        "subset construction: {} NFA nodes -> {} DFA states, {} distinct transition arrays",
        nfa.n_nodes(),
        states.len(),
        pool.len()
    );
    Ok(Dfa::new(states, pool, start))
}

/// Picks the accept metadata for one subset: the minimum-priority accepting
/// member, escalating equal-priority ties between distinct words.
fn resolve_accept<P: Clone>(
    nfa: &NfaGraph<P>,
    subset: &BTreeSet<NfaNodeId>,
) -> Result<Option<AcceptData<P>>, GenerationError> {
    let mut best: Option<AcceptData<P>> = None;
    for &id in subset {
        let Some(accept) = nfa.accept_of(id)? else {
            continue;
        };
        match &best {
            None => {
                best = Some(AcceptData {
                    word: accept.word,
                    priority: accept.priority,
                    payload: accept.payload.clone(),
                });
            }
            Some(current) if accept.priority < current.priority => {
                best = Some(AcceptData {
                    word: accept.word,
                    priority: accept.priority,
                    payload: accept.payload.clone(),
                });
            }
            Some(current)
                if accept.priority == current.priority && accept.word != current.word =>
            {
                return Err(GenerationError::AmbiguousWords {
                    first: current.word,
                    second: accept.word,
                    priority: accept.priority,
                });
            }
            Some(_) => {}
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern;
    use lexlr::dfa::WordId;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn dfa_for(words: &[(&str, usize)]) -> Result<Dfa<usize>, GenerationError> {
        let mut nfa = NfaGraph::new();
        for (i, &(text, priority)) in words.iter().enumerate() {
            let pat = pattern::parse(text).unwrap();
            nfa.add_word(WordId::from_usize(i), &pat, priority, i);
        }
        construct(&nfa)
    }

    /// Runs the DFA to the end of `input`, returning the accept payload.
    fn accept_payload(dfa: &Dfa<usize>, input: &str) -> Option<usize> {
        let mut state = dfa.start();
        for c in input.chars() {
            state = dfa.step(state, c).unwrap()?;
        }
        dfa.state(state)
            .unwrap()
            .accept
            .as_ref()
            .map(|a| a.payload)
    }

    #[test]
    fn deterministic_over_overlapping_words() {
        init_logger();
        let dfa = dfa_for(&[("ab", 0), ("a[a-z]+", 1)]).unwrap();
        assert_eq!(accept_payload(&dfa, "ab"), Some(0));
        assert_eq!(accept_payload(&dfa, "ax"), Some(1));
        assert_eq!(accept_payload(&dfa, "x"), None);
    }

    #[test]
    fn priority_tie_break_prefers_minimum() {
        init_logger();
        let dfa = dfa_for(&[("if", 0), ("[a-z]+", 1)]).unwrap();
        assert_eq!(accept_payload(&dfa, "if"), Some(0));
        assert_eq!(accept_payload(&dfa, "iffy"), Some(1));
        assert_eq!(accept_payload(&dfa, "of"), Some(1));
    }

    #[test]
    fn equal_priority_overlap_is_escalated() {
        init_logger();
        let err = dfa_for(&[("[a-z]+", 1), ("[a-m]+", 1)]).unwrap_err();
        match err {
            GenerationError::AmbiguousWords { priority, .. } => assert_eq!(priority, 1),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn same_word_reaching_a_subset_twice_is_fine() {
        init_logger();
        // Both alternation branches accept for the same word.
        let dfa = dfa_for(&[("ab|ab?", 0)]).unwrap();
        assert_eq!(accept_payload(&dfa, "ab"), Some(0));
        assert_eq!(accept_payload(&dfa, "a"), Some(0));
    }

    #[test]
    fn empty_lexicon_builds_an_inert_automaton() {
        init_logger();
        let dfa = dfa_for(&[]).unwrap();
        assert_eq!(dfa.n_states(), 1);
        assert_eq!(accept_payload(&dfa, ""), None);
        assert_eq!(dfa.step(dfa.start(), 'a').unwrap(), None);
    }

    #[test]
    fn identical_rows_share_one_transition_array() {
        init_logger();
        let dfa = dfa_for(&[("ab", 0), ("cb", 1)]).unwrap();
        // Five states (start, two middles, two accepts), but the accept
        // states both have the empty row: four distinct arrays.
        assert_eq!(dfa.n_states(), 5);
        assert_eq!(dfa.pool().len(), 4);
    }
}

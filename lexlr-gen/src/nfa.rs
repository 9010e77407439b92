//! Thompson-style NFA construction from word patterns.
//!
//! All word automata share one start node; each registered word is spliced
//! in behind an epsilon edge and terminates in its own accepting node
//! carrying `(priority, payload)`. Nodes live in an arena and refer to each
//! other by [`NfaNodeId`] only — repetition makes the graph cyclic, so
//! direct references are never held.

use std::collections::BTreeSet;

use lexlr::define_id;
use lexlr::dfa::WordId;
use lexlr::store::{IndexedStore, LookupError};

use crate::pattern::{Pattern, Repeat};

define_id!(
    /// Identity of a nondeterministic automaton node.
    pub NfaNodeId, "nfa-node"
);

/// Accept metadata stored on a word's final node.
#[derive(Debug, Clone)]
pub struct NfaAccept<P> {
    pub word: WordId,
    pub priority: usize,
    pub payload: P,
}

/// One NFA node: labeled edges (possibly several targets per symbol, since
/// alternation branches share their endpoints) plus epsilon edges.
#[derive(Debug, Clone, Default)]
pub struct NfaNode<P> {
    edges: std::collections::BTreeMap<char, BTreeSet<NfaNodeId>>,
    eps: BTreeSet<NfaNodeId>,
    accept: Option<NfaAccept<P>>,
}

impl<P> NfaNode<P> {
    fn new() -> Self {
        Self {
            edges: Default::default(),
            eps: BTreeSet::new(),
            accept: None,
        }
    }
}

/// The shared NFA under construction.
#[derive(Debug)]
pub struct NfaGraph<P> {
    nodes: IndexedStore<NfaNodeId, NfaNode<P>>,
    head: NfaNodeId,
}

impl<P> NfaGraph<P> {
    pub fn new() -> Self {
        let mut nodes = IndexedStore::new();
        let head = nodes.insert(NfaNode::new());
        Self { nodes, head }
    }

    /// The start node every word automaton hangs off.
    pub fn head(&self) -> NfaNodeId {
        self.head
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn accept_of(&self, id: NfaNodeId) -> Result<Option<&NfaAccept<P>>, LookupError> {
        Ok(self.nodes.get(id)?.accept.as_ref())
    }

    fn add_node(&mut self) -> NfaNodeId {
        self.nodes.insert(NfaNode::new())
    }

    fn add_edge(&mut self, from: NfaNodeId, symbol: char, to: NfaNodeId) {
        self.nodes
            .get_mut(from)
            .expect("edge source minted by this graph")
            .edges
            .entry(symbol)
            .or_default()
            .insert(to);
    }

    fn add_eps(&mut self, from: NfaNodeId, to: NfaNodeId) {
        self.nodes
            .get_mut(from)
            .expect("edge source minted by this graph")
            .eps
            .insert(to);
    }

    /// Splices a word automaton into the graph: a fresh sub-automaton for
    /// `pattern` reachable from the head via epsilon, accepting with
    /// `(priority, payload)`.
    pub fn add_word(&mut self, word: WordId, pattern: &Pattern, priority: usize, payload: P) {
        let start = self.add_node();
        let end = self.add_node();
        self.lower(pattern, start, end);
        self.add_eps(self.head, start);
        self.nodes
            .get_mut(end)
            .expect("accept node minted by this graph")
            .accept = Some(NfaAccept {
            word,
            priority,
            payload,
        });
        log::debug!(
            "word {word:?} spliced, graph now holds {} nodes",
            self.nodes.len()
        );
    }

    /// Lowers `pattern` between two existing nodes.
    fn lower(&mut self, pattern: &Pattern, start: NfaNodeId, end: NfaNodeId) {
        match pattern {
            Pattern::Empty => self.add_eps(start, end),
            Pattern::Literal(c) => self.add_edge(start, *c, end),
            Pattern::Class(class) => {
                for c in class.chars() {
                    self.add_edge(start, c, end);
                }
            }
            Pattern::Concat(parts) => match parts.split_last() {
                None => self.add_eps(start, end),
                Some((last, init)) => {
                    // Chain through fresh intermediate nodes; the last
                    // part lands on the expected end node.
                    let mut current = start;
                    for part in init {
                        let next = self.add_node();
                        self.lower(part, current, next);
                        current = next;
                    }
                    self.lower(last, current, end);
                }
            },
            Pattern::Alt(branches) => {
                for branch in branches {
                    self.lower(branch, start, end);
                }
            }
            Pattern::Repeat(inner, op) => match op {
                Repeat::ZeroOrMore => {
                    // The loop is confined to a fresh hub so that cycling
                    // never re-enters `start`, which may carry edges of
                    // sibling branches.
                    let hub = self.add_node();
                    self.add_eps(start, hub);
                    self.add_eps(hub, end);
                    self.lower(inner, hub, hub);
                }
                Repeat::OneOrMore => {
                    let entry = self.add_node();
                    let exit = self.add_node();
                    self.add_eps(start, entry);
                    self.lower(inner, entry, exit);
                    self.add_eps(exit, entry);
                    self.add_eps(exit, end);
                }
                Repeat::ZeroOrOne => {
                    self.add_eps(start, end);
                    self.lower(inner, start, end);
                }
            },
        }
    }

    /// Epsilon closure of a seed set; cycles are expected.
    pub fn eps_closure(
        &self,
        seed: impl IntoIterator<Item = NfaNodeId>,
    ) -> Result<BTreeSet<NfaNodeId>, LookupError> {
        let mut closure: BTreeSet<NfaNodeId> = seed.into_iter().collect();
        let mut worklist: Vec<NfaNodeId> = closure.iter().copied().collect();
        while let Some(id) = worklist.pop() {
            for &next in &self.nodes.get(id)?.eps {
                if closure.insert(next) {
                    worklist.push(next);
                }
            }
        }
        Ok(closure)
    }

    /// Union of symbol successors of `set` on `symbol` (no closure).
    pub fn step(
        &self,
        set: &BTreeSet<NfaNodeId>,
        symbol: char,
    ) -> Result<BTreeSet<NfaNodeId>, LookupError> {
        let mut out = BTreeSet::new();
        for &id in set {
            if let Some(targets) = self.nodes.get(id)?.edges.get(&symbol) {
                out.extend(targets.iter().copied());
            }
        }
        Ok(out)
    }

    /// All symbols with a labeled edge out of `set`.
    pub fn alphabet_of(&self, set: &BTreeSet<NfaNodeId>) -> Result<BTreeSet<char>, LookupError> {
        let mut out = BTreeSet::new();
        for &id in set {
            out.extend(self.nodes.get(id)?.edges.keys().copied());
        }
        Ok(out)
    }
}

impl<P> Default for NfaGraph<P> {
    fn default() -> Self {
        Self::new()
    }
}

//! LR item sets and the canonical state collection.
//!
//! An item is a production with a dot marking the matched-so-far position.
//! The implicit augmented production `$accept -> Start` carries the
//! reserved [`AUGMENTED`] id and is never stored in the grammar; its body
//! is the single start symbol, so dot position 1 is its reduce/accept
//! position. States are deduplicated structurally: two derivation paths
//! reaching the same closed item set share one state.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use lexlr::store::{IndexedStore, StoreId};
use lexlr::table::{ParserStateId, ProductionId, SymbolId};

use crate::error::GenerationError;
use crate::grammar::Grammar;

/// Sentinel id of the implicit augmented start production.
pub const AUGMENTED: ProductionId = ProductionId::INVALID;

/// A production paired with a dot position in its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    pub prod: ProductionId,
    pub dot: usize,
}

impl Item {
    pub fn start(prod: ProductionId) -> Self {
        Self { prod, dot: 0 }
    }

    pub fn advanced(self) -> Self {
        Self {
            prod: self.prod,
            dot: self.dot + 1,
        }
    }
}

/// The symbol immediately after the item's dot, if any.
pub fn symbol_after_dot(grammar: &Grammar, item: Item) -> Result<Option<SymbolId>, GenerationError> {
    if item.prod == AUGMENTED {
        return Ok(match item.dot {
            0 => grammar.start_symbol(),
            _ => None,
        });
    }
    let prod = grammar.production(item.prod)?;
    Ok(prod.body.get(item.dot).copied())
}

/// Is the dot at the end of the item's body?
pub fn is_complete(grammar: &Grammar, item: Item) -> Result<bool, GenerationError> {
    Ok(symbol_after_dot(grammar, item)?.is_none())
}

/// One canonical parser state.
#[derive(Debug, Clone)]
pub struct LrState {
    /// Closure-complete item set; identity of the state is this content.
    pub items: BTreeSet<Item>,
    /// Goto/shift transitions to successor states.
    pub transitions: BTreeMap<SymbolId, ParserStateId>,
}

/// The canonical collection of parser states.
#[derive(Debug)]
pub struct LrAutomaton {
    pub states: IndexedStore<ParserStateId, LrState>,
    pub start: ParserStateId,
}

/// Closes `items` in place: for every dot before a nonterminal, add that
/// nonterminal's productions with the dot at 0, to fixpoint.
pub fn close(grammar: &Grammar, items: &mut BTreeSet<Item>) -> Result<(), GenerationError> {
    let mut worklist: Vec<Item> = items.iter().copied().collect();
    while let Some(item) = worklist.pop() {
        let Some(symbol) = symbol_after_dot(grammar, item)? else {
            continue;
        };
        if grammar.is_terminal(symbol) {
            continue;
        }
        for &prod in grammar.productions_of(symbol) {
            let fresh = Item::start(prod);
            if items.insert(fresh) {
                worklist.push(fresh);
            }
        }
    }
    Ok(())
}

/// The closed successor set of `items` across `symbol`.
pub fn goto(
    grammar: &Grammar,
    items: &BTreeSet<Item>,
    symbol: SymbolId,
) -> Result<BTreeSet<Item>, GenerationError> {
    let mut moved = BTreeSet::new();
    for &item in items {
        if symbol_after_dot(grammar, item)? == Some(symbol) {
            moved.insert(item.advanced());
        }
    }
    close(grammar, &mut moved)?;
    Ok(moved)
}

/// Builds the canonical collection for `grammar`.
pub fn construct(grammar: &Grammar) -> Result<LrAutomaton, GenerationError> {
    let mut states: IndexedStore<ParserStateId, LrState> = IndexedStore::new();
    let mut keys: HashMap<BTreeSet<Item>, ParserStateId> = HashMap::new();
    let mut worklist: VecDeque<ParserStateId> = VecDeque::new();

    let mut start_items = BTreeSet::from([Item::start(AUGMENTED)]);
    close(grammar, &mut start_items)?;
    let start = states.insert(LrState {
        items: start_items.clone(),
        transitions: BTreeMap::new(),
    });
    keys.insert(start_items, start);
    worklist.push_back(start);

    while let Some(id) = worklist.pop_front() {
        let items = states.get(id)?.items.clone();

        // Outgoing symbols, deterministically ordered.
        let mut symbols: BTreeSet<SymbolId> = BTreeSet::new();
        for &item in &items {
            if let Some(symbol) = symbol_after_dot(grammar, item)? {
                symbols.insert(symbol);
            }
        }

        for symbol in symbols {
            let successor = goto(grammar, &items, symbol)?;
            if successor.is_empty() {
                continue;
            }
            let target = match keys.get(&successor) {
                Some(&existing) => existing,
                None => {
                    let fresh = states.insert(LrState {
                        items: successor.clone(),
                        transitions: BTreeMap::new(),
                    });
                    keys.insert(successor, fresh);
                    worklist.push_back(fresh);
                    fresh
                }
            };
            states.get_mut(id)?.transitions.insert(symbol, target);
        }
    }

    log::debug!(
        "canonical collection: {} states over {} productions",
        states.len(),
        grammar.n_productions()
    );
    Ok(LrAutomaton { states, start })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Assoc;
    use lexlr::table::ActionId;

    fn action(i: usize) -> ActionId {
        ActionId::from_usize(i)
    }

    /// `E -> E + E | num`
    fn sum_grammar() -> Grammar {
        let mut g = Grammar::new();
        let expr = g.nonterminal("Expr").unwrap();
        let plus = g.terminal("plus").unwrap();
        let num = g.terminal("num").unwrap();
        g.define_production(
            expr,
            vec![expr, plus, expr],
            Some((1, Assoc::Left)),
            action(0),
        )
        .unwrap();
        g.define_production(expr, vec![num], None, action(1))
            .unwrap();
        g
    }

    #[test]
    fn closure_pulls_in_nonterminal_productions() {
        let g = sum_grammar();
        let mut items = BTreeSet::from([Item::start(AUGMENTED)]);
        close(&g, &mut items).unwrap();
        // Augmented item plus both Expr productions at dot 0.
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn goto_advances_and_closes() {
        let g = sum_grammar();
        let expr = g.start_symbol().unwrap();
        let mut items = BTreeSet::from([Item::start(AUGMENTED)]);
        close(&g, &mut items).unwrap();
        let after_expr = goto(&g, &items, expr).unwrap();
        // `$accept -> Expr .` and `Expr -> Expr . + Expr`.
        assert_eq!(after_expr.len(), 2);
        assert!(after_expr.contains(&Item {
            prod: AUGMENTED,
            dot: 1
        }));
    }

    #[test]
    fn canonical_states_are_deduplicated() {
        let g = sum_grammar();
        let automaton = construct(&g).unwrap();
        // num is shifted from the start state and from after `+`; both
        // paths reach the single `Expr -> num .` state.
        let mut num_states = 0;
        for (_, state) in automaton.states.iter() {
            let complete_num = state.items.iter().any(|&item| {
                item.prod == ProductionId::from_usize(1)
                    && is_complete(&g, item).unwrap()
            });
            if complete_num {
                num_states += 1;
            }
        }
        assert_eq!(num_states, 1);
    }

    #[test]
    fn collection_is_finite_and_small_here() {
        let g = sum_grammar();
        let automaton = construct(&g).unwrap();
        // start, after-num, after-Expr, after-plus, after-Expr-plus-Expr
        assert_eq!(automaton.states.len(), 5);
    }

    #[test]
    fn empty_grammar_yields_one_inert_state() {
        let g = Grammar::new();
        let automaton = construct(&g).unwrap();
        assert_eq!(automaton.states.len(), 1);
        let state = automaton.states.get(automaton.start).unwrap();
        assert!(state.transitions.is_empty());
        assert_eq!(
            state.items.iter().copied().collect::<Vec<_>>(),
            vec![Item::start(AUGMENTED)]
        );
    }
}

//! Action-table synthesis and conflict resolution.
//!
//! Converts the canonical state collection into exactly one action per
//! (state, symbol). Shift entries come from terminal transitions, goto
//! entries from nonterminal transitions; every complete item registers its
//! production as a reduce candidate on all terminal columns, and the
//! completed augmented item registers acceptance on end-of-input.
//!
//! Conflicts are resolved at build time:
//!
//! * shift/reduce — the reducible production's priority against the shift
//!   symbol's operator priority (the strongest priority declared on the
//!   shift items for that symbol); greater binds tighter and wins. Equal
//!   priority falls back to the reducing production's associativity: left
//!   reduces, right shifts, none is an error. A missing priority on either
//!   side is an error — there is no signal to resolve on.
//! * reduce/reduce — the earliest-declared production wins; the dropped
//!   candidate is logged.

use lexlr::store::{IndexedStore, StoreId};
use lexlr::table::{ParseAction, ParserStateId, ProdData, ProductionId, SymbolId, SyntaxTable};

use crate::error::{GenerationError, GrammarError};
use crate::grammar::{Assoc, Grammar};
use crate::items::{self, Item, LrAutomaton, LrState, AUGMENTED};

/// Synthesizes the syntax table for a validated grammar.
pub fn build(grammar: &Grammar, automaton: &LrAutomaton) -> Result<SyntaxTable, GenerationError> {
    let n_symbols = grammar.n_symbols();
    let end = grammar.end_symbol();
    let mut rows: Vec<Vec<ParseAction>> = Vec::with_capacity(automaton.states.len());

    for (state_id, state) in automaton.states.iter() {
        let mut row = vec![ParseAction::Error; n_symbols];

        for (&symbol, &target) in &state.transitions {
            row[usize::from(symbol)] = if grammar.is_terminal(symbol) {
                ParseAction::Shift(target)
            } else {
                ParseAction::Goto(target)
            };
        }

        for &item in &state.items {
            if item.prod == AUGMENTED {
                if item.dot == 1 {
                    place(&mut row, end, ParseAction::Accept, state_id, grammar);
                }
                continue;
            }
            if !items::is_complete(grammar, item)? {
                continue;
            }
            for terminal in grammar.terminals() {
                place(
                    &mut row,
                    terminal,
                    ParseAction::Reduce(item.prod),
                    state_id,
                    grammar,
                );
            }
        }

        resolve_row(grammar, state_id, state, &mut row)?;
        rows.push(row);
    }

    // A grammar with no productions still accepts the empty input.
    if grammar.start_symbol().is_none() {
        rows[usize::from(automaton.start)][usize::from(end)] = ParseAction::Accept;
    }

    let mut prods: IndexedStore<ProductionId, ProdData> = IndexedStore::new();
    for (_, prod) in grammar.productions() {
        prods.insert(ProdData {
            head: prod.head,
            body_len: prod.body.len(),
            action: prod.action,
        });
    }

    log::debug!(
        "syntax table: {} states x {} symbols, {} productions",
        rows.len(),
        n_symbols,
        prods.len()
    );
    Ok(SyntaxTable::new(rows, prods, automaton.start, end, n_symbols))
}

/// Merges `incoming` into the cell for `symbol`, recording shift/reduce
/// pairs for the resolution pass and applying the declaration-order rule to
/// reduce/reduce collisions.
fn place(
    row: &mut [ParseAction],
    symbol: SymbolId,
    incoming: ParseAction,
    state: ParserStateId,
    grammar: &Grammar,
) {
    let cell = &mut row[usize::from(symbol)];
    *cell = match (*cell, incoming) {
        (ParseAction::Error, action) => action,

        (ParseAction::Shift(shift), ParseAction::Reduce(reduce)) => {
            ParseAction::ShiftReduce { shift, reduce }
        }

        (ParseAction::Reduce(first), ParseAction::Reduce(second)) => {
            let (winner, loser) = if first <= second {
                (first, second)
            } else {
                (second, first)
            };
            log::warn!(
                "reduce/reduce conflict in {state:?} on {}: {winner:?} wins over {loser:?} \
                 by declaration order",
                grammar.symbol_name(symbol),
            );
            ParseAction::Reduce(winner)
        }

        (ParseAction::ShiftReduce { shift, reduce }, ParseAction::Reduce(second)) => {
            let winner = reduce.min(second);
            if winner != reduce {
                log::warn!(
                    "reduce/reduce conflict in {state:?} on {}: {winner:?} wins over {reduce:?} \
                     by declaration order",
                    grammar.symbol_name(symbol),
                );
            }
            ParseAction::ShiftReduce {
                shift,
                reduce: winner,
            }
        }

        // The augmented completion owns the end-of-input column.
        (ParseAction::Accept, ParseAction::Reduce(dropped)) => {
            log::warn!(
                "reduce/accept conflict in {state:?} on {}: accept wins over {dropped:?}",
                grammar.symbol_name(symbol),
            );
            ParseAction::Accept
        }
        (ParseAction::Reduce(dropped), ParseAction::Accept) => {
            log::warn!(
                "reduce/accept conflict in {state:?} on {}: accept wins over {dropped:?}",
                grammar.symbol_name(symbol),
            );
            ParseAction::Accept
        }

        (existing, action) => {
            // Shift/shift or goto collisions cannot arise from one
            // transition map; keep the first action if they somehow do.
            log::warn!(
                "unexpected action collision in {state:?} on {}: {existing:?} vs {action:?}",
                grammar.symbol_name(symbol),
            );
            existing
        }
    };
}

/// Rewrites every `ShiftReduce` cell of `row` using the precedence policy.
fn resolve_row(
    grammar: &Grammar,
    state_id: ParserStateId,
    state: &LrState,
    row: &mut [ParseAction],
) -> Result<(), GenerationError> {
    for symbol_index in 0..row.len() {
        let ParseAction::ShiftReduce { shift, reduce } = row[symbol_index] else {
            continue;
        };
        let symbol = SymbolId::from_usize(symbol_index);
        let resolved = resolve_conflict(grammar, state_id, state, symbol, shift, reduce)?;
        row[symbol_index] = resolved;
    }
    Ok(())
}

/// Applies priority, then associativity, to one shift/reduce pair.
fn resolve_conflict(
    grammar: &Grammar,
    state_id: ParserStateId,
    state: &LrState,
    symbol: SymbolId,
    shift: ParserStateId,
    reduce: ProductionId,
) -> Result<ParseAction, GenerationError> {
    let conflict = |reason: &'static str| {
        GenerationError::Grammar(GrammarError::Conflict {
            state: state_id,
            symbol,
            symbol_name: grammar.symbol_name(symbol),
            production: reduce,
            reason,
        })
    };

    // Operator priority of the shift symbol: the strongest priority
    // declared on the productions whose items shift it here.
    let mut shift_priority: Option<usize> = None;
    for &item in &state.items {
        if item.prod == AUGMENTED || items::symbol_after_dot(grammar, item)? != Some(symbol) {
            continue;
        }
        if let Some((priority, _)) = grammar.production(item.prod)?.prec {
            shift_priority = Some(shift_priority.map_or(priority, |p| p.max(priority)));
        }
    }

    let reduce_prec = grammar.production(reduce)?.prec;

    match (reduce_prec, shift_priority) {
        (Some((rp, _)), Some(sp)) if rp > sp => Ok(ParseAction::Reduce(reduce)),
        (Some((rp, _)), Some(sp)) if rp < sp => Ok(ParseAction::Shift(shift)),
        (Some((_, assoc)), Some(_)) => match assoc {
            Assoc::Left => Ok(ParseAction::Reduce(reduce)),
            Assoc::Right => Ok(ParseAction::Shift(shift)),
            Assoc::None => Err(conflict("equal priority and no associativity")),
        },
        _ => Err(conflict("no precedence signal on either side")),
    }
}

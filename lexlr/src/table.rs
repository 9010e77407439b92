//! The LR action/goto table driven by the shift-reduce engine.
//!
//! One row per parser state, one column per grammar symbol. Terminal
//! columns hold shift/reduce/accept/error decisions; nonterminal columns
//! hold the goto transition taken after a reduction. The table is built
//! once by the generator and never mutated afterwards.

use crate::define_id;
use crate::store::{IndexedStore, LookupError, StoreId};

define_id!(
    /// Identity of a grammar symbol (terminal or nonterminal).
    pub SymbolId, "symbol"
);
define_id!(
    /// Identity of a production.
    pub ProductionId, "production"
);
define_id!(
    /// Identity of a parser state.
    pub ParserStateId, "parser-state"
);
define_id!(
    /// Identity of a registered semantic action.
    pub ActionId, "semantic-action"
);

/// One table cell.
///
/// `ShiftReduce` carries both candidates of an unresolved shift-reduce
/// conflict; it exists only while the table builder runs its resolution
/// pass and never survives into a finished table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseAction {
    Error,
    Accept,
    Shift(ParserStateId),
    Reduce(ProductionId),
    ShiftReduce {
        shift: ParserStateId,
        reduce: ProductionId,
    },
    Goto(ParserStateId),
}

/// Per-production metadata the engine needs at reduction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProdData {
    /// Head nonterminal.
    pub head: SymbolId,
    /// Number of body symbols popped on reduction.
    pub body_len: usize,
    /// Semantic action dispatched with the popped values.
    pub action: ActionId,
}

/// A finished action/goto table.
#[derive(Debug, Clone)]
pub struct SyntaxTable {
    /// `rows[state][symbol]`; every row has `n_symbols` entries.
    rows: Vec<Vec<ParseAction>>,
    prods: IndexedStore<ProductionId, ProdData>,
    start_state: ParserStateId,
    end_symbol: SymbolId,
    n_symbols: usize,
}

impl SyntaxTable {
    /// Assembles a finished table. Intended for table generators; every row
    /// must have exactly `n_symbols` entries and reference only states and
    /// productions that exist.
    pub fn new(
        rows: Vec<Vec<ParseAction>>,
        prods: IndexedStore<ProductionId, ProdData>,
        start_state: ParserStateId,
        end_symbol: SymbolId,
        n_symbols: usize,
    ) -> Self {
        Self {
            rows,
            prods,
            start_state,
            end_symbol,
            n_symbols,
        }
    }

    /// The single action for `(state, symbol)`.
    pub fn action(
        &self,
        state: ParserStateId,
        symbol: SymbolId,
    ) -> Result<ParseAction, LookupError> {
        let row = self.rows.get(state.as_usize()).ok_or(LookupError {
            domain: ParserStateId::DOMAIN,
            index: state.as_usize(),
            len: self.rows.len(),
        })?;
        row.get(symbol.as_usize()).copied().ok_or(LookupError {
            domain: SymbolId::DOMAIN,
            index: symbol.as_usize(),
            len: row.len(),
        })
    }

    pub fn production(&self, id: ProductionId) -> Result<&ProdData, LookupError> {
        self.prods.get(id)
    }

    pub fn start_state(&self) -> ParserStateId {
        self.start_state
    }

    /// The reserved end-of-input terminal.
    pub fn end_symbol(&self) -> SymbolId {
        self.end_symbol
    }

    pub fn n_states(&self) -> usize {
        self.rows.len()
    }

    pub fn n_symbols(&self) -> usize {
        self.n_symbols
    }

    pub fn n_productions(&self) -> usize {
        self.prods.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_lookup_is_bounds_checked() {
        let table = SyntaxTable::new(
            vec![vec![ParseAction::Accept]],
            IndexedStore::new(),
            ParserStateId::from_usize(0),
            SymbolId::from_usize(0),
            1,
        );
        assert_eq!(
            table
                .action(ParserStateId::from_usize(0), SymbolId::from_usize(0))
                .unwrap(),
            ParseAction::Accept
        );
        assert!(
            table
                .action(ParserStateId::from_usize(1), SymbolId::from_usize(0))
                .is_err()
        );
        assert!(
            table
                .action(ParserStateId::from_usize(0), SymbolId::from_usize(9))
                .is_err()
        );
        assert!(
            table
                .action(ParserStateId::INVALID, SymbolId::from_usize(0))
                .is_err()
        );
    }
}

//! Generation-time error kinds.
//!
//! Any of these aborts generation wholesale: `build` never hands out a
//! partial table.

use smartstring::alias::String;
use thiserror::Error;

use lexlr::store::LookupError;
use lexlr::table::{ParserStateId, ProductionId, SymbolId};
use lexlr::dfa::WordId;

/// A word pattern that could not be parsed into an operator tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed pattern {pattern:?} at offset {position}: {reason}")]
pub struct PatternError {
    /// The offending pattern text.
    pub pattern: String,
    /// Character offset of the failure within the pattern.
    pub position: usize,
    pub reason: &'static str,
}

/// A defect in the registered grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A name was interned both as a terminal and as a nonterminal.
    #[error("symbol {name:?} is already defined with a different kind")]
    KindMismatch { name: String },

    /// A production body references a nonterminal that has no productions.
    #[error("nonterminal {name:?} is used but never defined")]
    UndefinedSymbol { name: String },

    /// A production head must be a nonterminal.
    #[error("production head {name:?} is not a nonterminal")]
    HeadNotNonterminal { name: String },

    /// The reserved end-of-input symbol may not appear in a body.
    #[error("reserved symbol {name:?} may not appear in a production body")]
    ReservedSymbol { name: String },

    /// A production can never partake in a derivation from the start symbol.
    #[error("production {production:?} ({head:?}) is unreachable from the start symbol")]
    Unreachable {
        production: ProductionId,
        head: String,
    },

    /// A shift-reduce conflict with no precedence signal on either side, or
    /// with equal priorities and no associativity to break the tie.
    #[error(
        "unresolvable shift/reduce conflict in {state:?} on {symbol_name:?} \
         (shift vs reduce by {production:?}): {reason}"
    )]
    Conflict {
        state: ParserStateId,
        symbol: SymbolId,
        symbol_name: String,
        production: ProductionId,
        reason: &'static str,
    },
}

/// Top-level generation failure returned by `Generator::build`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// Two equal-priority words accept in the same DFA state, so some
    /// maximal text is claimed by both. Never silently resolved.
    #[error("words {first:?} and {second:?} both match with priority {priority}")]
    AmbiguousWords {
        first: WordId,
        second: WordId,
        priority: usize,
    },

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// An internal store lookup failed while assembling tables.
    #[error("generation bookkeeping failed: {0}")]
    Lookup(#[from] LookupError),
}

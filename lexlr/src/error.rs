//! Runtime error kinds.
//!
//! Generation-side errors live in the generator crate; everything here can
//! occur while driving finished tables. A runtime error aborts only the
//! current call — the shared tables stay valid for subsequent calls.

use thiserror::Error;

use crate::cursor::{CursorError, Position, Span};
use crate::store::LookupError;
use crate::table::{ParserStateId, SymbolId};

/// Tokenization failure.
#[derive(Debug, Error)]
pub enum LexicalError {
    /// No accepting state was ever reached for the text starting at
    /// `position`.
    #[error("no word matches input at {position:?} (offset {offset})")]
    NoMatch {
        /// Position of the first character of the failed match attempt.
        position: Position,
        /// Character offset of that position from the start of the input.
        offset: usize,
        /// The character that could not extend any match, if input remained.
        found: Option<char>,
    },

    /// The automaton referenced an id outside its own tables.
    #[error("tokenizer table corrupt: {0}")]
    Table(#[from] LookupError),

    /// Pushback bookkeeping failed.
    #[error("tokenizer cursor desynchronized: {0}")]
    Cursor(#[from] CursorError),

    /// The automaton violated a structural invariant the builder guarantees.
    #[error("tokenizer table corrupt: {0}")]
    Corrupt(&'static str),
}

impl LexicalError {
    /// The input position the error reports, where known.
    pub fn position(&self) -> Option<Position> {
        match self {
            LexicalError::NoMatch { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Parsing failure.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The action table holds an error entry for (state, symbol).
    #[error("unexpected {symbol:?} in {state:?} at {span}")]
    Syntax {
        state: ParserStateId,
        symbol: SymbolId,
        span: Span,
    },

    /// A semantic-action callback failed; the reduction is abandoned.
    #[error("semantic action failed: {0}")]
    Action(#[source] anyhow::Error),

    /// The table referenced an id outside its own stores.
    #[error("syntax table corrupt: {0}")]
    Table(#[from] LookupError),

    /// The table violated a structural invariant the builder guarantees.
    #[error("syntax table corrupt: {0}")]
    Corrupt(&'static str),
}

//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Runtime core of the `lexlr` frontend toolkit.
//!
//! `lexlr` holds everything needed to *execute* generated tables:
//!  * [`store`] — arenas with domain-tagged identities,
//!  * [`dfa`] — the deterministic tokenizer automaton with interned
//!    transition arrays, and [`tokenizer`] — its maximal-munch driver,
//!  * [`table`] — the LR action/goto table, and [`engine`] — the
//!    shift-reduce driver with the semantic-action seam,
//!  * [`cursor`] / [`token`] / [`error`] — spans, tokens, and the runtime
//!    error kinds.
//!
//! Tables are built by the companion `lexlr-gen` crate. Generation is
//! strictly build-once: a finished [`dfa::Dfa`] or [`table::SyntaxTable`]
//! is immutable and may be shared by reference across any number of
//! concurrent tokenizer or parser runs, each of which owns only its private
//! cursor and stacks.

pub mod cursor;
pub mod dfa;
pub mod engine;
pub mod error;
pub mod store;
pub mod table;
pub mod token;
pub mod tokenizer;

pub use crate::cursor::{Position, Span};
pub use crate::dfa::{AcceptData, Dfa, DfaState, DfaStateId, TransArrayId, TransArrayPool, WordId};
pub use crate::engine::{Actions, ParseStats, ParseToken};
pub use crate::error::{LexicalError, ParseError};
pub use crate::store::{IndexedStore, LookupError, StoreId};
pub use crate::table::{
    ActionId, ParseAction, ParserStateId, ProdData, ProductionId, SymbolId, SyntaxTable,
};
pub use crate::token::Token;
pub use crate::tokenizer::{Tokenizer, TokenizerStats};

//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Table generators for the `lexlr` frontend toolkit.
//!
//! `lexlr-gen` turns declarative definitions into the immutable tables the
//! runtime crate drives:
//!
//!  * word definitions (pattern, priority, payload) are parsed into
//!    operator trees ([`pattern`]), lowered into a shared Thompson NFA
//!    ([`nfa`]), and determinized by subset construction ([`subset`]) into
//!    a [`lexlr::dfa::Dfa`] with interned transition arrays;
//!  * productions with optional operator precedence ([`grammar`]) are
//!    expanded into the canonical LR item-set collection ([`items`]) and
//!    synthesized into a [`lexlr::table::SyntaxTable`] with build-time
//!    conflict resolution ([`table`]).
//!
//! The [`Generator`] facade ties both halves together behind
//! `define_word` / `define_production` / `build`. Generation is all or
//! nothing: any recorded error makes `build` fail and no partial table is
//! ever returned.

pub mod error;
pub mod grammar;
pub mod items;
pub mod nfa;
pub mod pattern;
pub mod subset;
pub mod table;

pub use crate::error::{GenerationError, GrammarError, PatternError};
pub use crate::grammar::{Assoc, Grammar};
pub use crate::pattern::Pattern;

use lexlr::dfa::{Dfa, WordId};
use lexlr::store::IndexedStore;
use lexlr::table::{ActionId, ProductionId, SymbolId, SyntaxTable};

/// A registered word definition. Immutable once registered.
#[derive(Debug, Clone)]
struct WordSpec<P> {
    pattern: Pattern,
    priority: usize,
    payload: P,
}

/// The combined generator: a lexicon of prioritized word definitions plus
/// a grammar of productions, compiled together by [`build`](Self::build).
///
/// A definition that fails poisons the generator: the error is returned
/// immediately *and* recorded, so a later `build` on the same instance
/// cannot succeed.
#[derive(Debug, Default)]
pub struct Generator<P> {
    words: IndexedStore<WordId, WordSpec<P>>,
    grammar: Grammar,
    poisoned: Option<GenerationError>,
}

impl<P: Clone> Generator<P> {
    pub fn new() -> Self {
        Self {
            words: IndexedStore::new(),
            grammar: Grammar::new(),
            poisoned: None,
        }
    }

    /// Registers a word: `pattern` is parsed eagerly, `priority` breaks
    /// ties between words matching the same text (lower is stronger), and
    /// `payload` rides on every token the word produces.
    pub fn define_word(
        &mut self,
        pattern: &str,
        priority: usize,
        payload: P,
    ) -> Result<WordId, PatternError> {
        match pattern::parse(pattern) {
            Ok(tree) => Ok(self.words.insert(WordSpec {
                pattern: tree,
                priority,
                payload,
            })),
            Err(err) => {
                self.poisoned.get_or_insert(err.clone().into());
                Err(err)
            }
        }
    }

    /// Interns a terminal symbol for use in production bodies.
    pub fn terminal(&mut self, name: &str) -> Result<SymbolId, GrammarError> {
        let result = self.grammar.terminal(name);
        self.record(result)
    }

    /// Interns a nonterminal symbol for use as heads and in bodies.
    pub fn nonterminal(&mut self, name: &str) -> Result<SymbolId, GrammarError> {
        let result = self.grammar.nonterminal(name);
        self.record(result)
    }

    /// Registers a production; the first production's head becomes the
    /// start symbol. `prec` is the operator priority/associativity pair
    /// consulted when a reduction by this production competes with a shift.
    pub fn define_production(
        &mut self,
        head: SymbolId,
        body: Vec<SymbolId>,
        prec: Option<(usize, Assoc)>,
        action: ActionId,
    ) -> Result<ProductionId, GrammarError> {
        let result = self.grammar.define_production(head, body, prec, action);
        self.record(result)
    }

    /// Read access to the registered grammar.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    fn record<T>(&mut self, result: Result<T, GrammarError>) -> Result<T, GrammarError> {
        if let Err(err) = &result {
            self.poisoned.get_or_insert(err.clone().into());
        }
        result
    }

    /// Compiles the lexicon and grammar into their runtime tables.
    ///
    /// Fails — returning no partial result — if any definition was
    /// rejected, the lexicon is ambiguous, the grammar is malformed, or a
    /// conflict has no precedence signal to resolve it.
    pub fn build(self) -> Result<(Dfa<P>, SyntaxTable), GenerationError> {
        if let Some(err) = self.poisoned {
            return Err(err);
        }

        let mut graph = nfa::NfaGraph::new();
        for (word, spec) in self.words.iter() {
            graph.add_word(word, &spec.pattern, spec.priority, spec.payload.clone());
        }
        let dfa = subset::construct(&graph)?;

        self.grammar.validate()?;
        let automaton = items::construct(&self.grammar)?;
        let syntax = table::build(&self.grammar, &automaton)?;

        Ok((dfa, syntax))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexlr::store::StoreId;
    use lexlr::table::ParseAction;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn action(i: usize) -> ActionId {
        ActionId::from_usize(i)
    }

    #[test]
    fn empty_generator_builds_inert_tables() {
        init_logger();
        let generator: Generator<()> = Generator::new();
        let (dfa, table) = generator.build().unwrap();
        assert_eq!(dfa.n_states(), 1);
        assert_eq!(
            table.action(table.start_state(), table.end_symbol()).unwrap(),
            ParseAction::Accept
        );
    }

    #[test]
    fn malformed_pattern_poisons_the_generator() {
        init_logger();
        let mut generator: Generator<u32> = Generator::new();
        generator.define_word("[a-z]+", 1, 0).unwrap();
        let err = generator.define_word("(oops", 1, 1).unwrap_err();
        assert_eq!(err.reason, "unbalanced '('");
        // A later, well-formed definition does not clear the poison.
        generator.define_word("x", 1, 2).unwrap();
        let err = generator.build().unwrap_err();
        assert!(matches!(err, GenerationError::Pattern(_)));
    }

    #[test]
    fn grammar_error_poisons_the_generator() {
        init_logger();
        let mut generator: Generator<u32> = Generator::new();
        let num = generator.terminal("num").unwrap();
        assert!(generator.define_production(num, vec![], None, action(0)).is_err());
        assert!(matches!(
            generator.build(),
            Err(GenerationError::Grammar(_))
        ));
    }

    #[test]
    fn build_produces_both_tables() {
        init_logger();
        let mut generator: Generator<&'static str> = Generator::new();
        generator.define_word("[0-9]+", 1, "num").unwrap();
        let expr = generator.nonterminal("Expr").unwrap();
        let num = generator.terminal("num").unwrap();
        generator
            .define_production(expr, vec![num], None, action(0))
            .unwrap();
        let (dfa, table) = generator.build().unwrap();
        assert!(dfa.n_states() > 1);
        assert!(table.n_states() > 1);
        assert_eq!(table.n_productions(), 1);
    }

    #[test]
    fn ambiguous_lexicon_fails_wholesale() {
        init_logger();
        let mut generator: Generator<u32> = Generator::new();
        generator.define_word("abc", 3, 0).unwrap();
        generator.define_word("a(bc)?", 3, 1).unwrap();
        assert!(matches!(
            generator.build(),
            Err(GenerationError::AmbiguousWords { .. })
        ));
    }
}

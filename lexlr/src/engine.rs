//! The shift-reduce engine.
//!
//! Executes a [`SyntaxTable`] against a token stream, dispatching to the
//! caller's semantic actions on every reduction. One pass, linear in input
//! length; the engine owns nothing but its two stacks, so any number of
//! parses may share one table.

use anyhow::Result;

use crate::cursor::Span;
use crate::error::ParseError;
use crate::table::{ActionId, ParseAction, ParserStateId, SymbolId, SyntaxTable};

/// A token as the engine sees it: a terminal symbol plus the semantic value
/// it contributes to the stack. The consumer maps lexical tokens (and drops
/// ignorable ones) before feeding the engine; the end-of-input symbol is
/// supplied by the engine itself.
#[derive(Debug, Clone)]
pub struct ParseToken<V> {
    pub symbol: SymbolId,
    pub value: V,
    pub span: Span,
}

/// The semantic-action registry: the seam where a language frontend
/// attaches its types, control flow, and AST construction.
///
/// `reduce` receives the action registered with the production, the head
/// nonterminal, and the popped values in body order. Its result becomes the
/// value pushed for the head. Errors abort the current parse only.
pub trait Actions<V> {
    fn reduce(&mut self, action: ActionId, head: SymbolId, children: Vec<V>) -> Result<V>;
}

/// Blanket impl so a closure can serve as the registry.
impl<V, F> Actions<V> for F
where
    F: FnMut(ActionId, SymbolId, Vec<V>) -> Result<V>,
{
    fn reduce(&mut self, action: ActionId, head: SymbolId, children: Vec<V>) -> Result<V> {
        self(action, head, children)
    }
}

/// Counters for one engine run.
#[derive(Debug, Clone, Default)]
pub struct ParseStats {
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
}

impl SyntaxTable {
    /// Parses `tokens` to completion.
    ///
    /// Returns the single value remaining on the stack at accept, or
    /// `None` when the grammar accepts empty input and nothing was ever
    /// shifted. Fails with [`ParseError::Syntax`] on an error entry and
    /// [`ParseError::Action`] when a semantic action fails.
    pub fn parse<V, I, A>(&self, tokens: I, actions: &mut A) -> Result<Option<V>, ParseError>
    where
        I: IntoIterator<Item = ParseToken<V>>,
        A: Actions<V>,
        V: std::fmt::Debug,
    {
        let mut input = tokens.into_iter();
        let mut states: Vec<ParserStateId> = vec![self.start_state()];
        let mut values: Vec<V> = Vec::new();
        let mut stats = ParseStats::default();

        let mut lookahead = input.next();
        let mut last_span = Span::default();
        if lookahead.is_some() {
            stats.tokens += 1;
        }

        loop {
            let top = *states
                .last()
                .ok_or(ParseError::Corrupt("state stack underflow"))?;
            let (symbol, span) = match &lookahead {
                Some(token) => (token.symbol, token.span),
                None => (self.end_symbol(), last_span),
            };

            match self.action(top, symbol)? {
                ParseAction::Shift(next) => {
                    let token = lookahead
                        .take()
                        .ok_or(ParseError::Corrupt("shift action on end of input"))?;
                    log::trace!("shift {:?} -> {:?}", token.symbol, next);
                    last_span = token.span;
                    values.push(token.value);
                    states.push(next);
                    stats.shifts += 1;
                    lookahead = input.next();
                    if lookahead.is_some() {
                        stats.tokens += 1;
                    }
                }

                ParseAction::Reduce(prod_id) => {
                    let prod = self.production(prod_id)?;
                    log::trace!("reduce {:?} (pops {})", prod_id, prod.body_len);
                    if values.len() < prod.body_len || states.len() <= prod.body_len {
                        return Err(ParseError::Corrupt("reduction pops past stack bottom"));
                    }
                    let children = values.split_off(values.len() - prod.body_len);
                    states.truncate(states.len() - prod.body_len);
                    let value = actions
                        .reduce(prod.action, prod.head, children)
                        .map_err(ParseError::Action)?;
                    let uncovered = *states
                        .last()
                        .ok_or(ParseError::Corrupt("state stack underflow"))?;
                    let ParseAction::Goto(next) = self.action(uncovered, prod.head)? else {
                        return Err(ParseError::Corrupt("missing goto after reduction"));
                    };
                    states.push(next);
                    values.push(value);
                    stats.reductions += 1;
                }

                ParseAction::Accept => {
                    log::trace!(
                        "accept after {} shifts, {} reductions",
                        stats.shifts,
                        stats.reductions
                    );
                    if values.len() > 1 {
                        return Err(ParseError::Corrupt("accept with values left behind"));
                    }
                    return Ok(values.pop());
                }

                ParseAction::Error => {
                    return Err(ParseError::Syntax {
                        state: top,
                        symbol,
                        span,
                    });
                }

                ParseAction::ShiftReduce { .. } => {
                    return Err(ParseError::Corrupt("unresolved shift/reduce entry"));
                }

                ParseAction::Goto(_) => {
                    return Err(ParseError::Corrupt("goto entry in terminal column"));
                }
            }

            if log::log_enabled!(log::Level::Trace) {
                log::trace!("stack {:?} / {:?}", states, values);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{IndexedStore, StoreId};
    use crate::table::ProdData;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn sym(i: usize) -> SymbolId {
        SymbolId::from_usize(i)
    }

    fn state(i: usize) -> ParserStateId {
        ParserStateId::from_usize(i)
    }

    /// Table for the grammar `S -> a`, columns: a=0, $end=1, S=2.
    fn single_rule_table() -> SyntaxTable {
        use ParseAction::*;
        let mut prods = IndexedStore::new();
        let p = prods.insert(ProdData {
            head: sym(2),
            body_len: 1,
            action: ActionId::from_usize(0),
        });
        SyntaxTable::new(
            vec![
                vec![Shift(state(2)), Error, Goto(state(1))],
                vec![Error, Accept, Error],
                vec![Reduce(p), Reduce(p), Error],
            ],
            prods,
            state(0),
            sym(1),
            3,
        )
    }

    #[test]
    fn single_token_parse_accepts() {
        init_logger();
        let table = single_rule_table();
        let tokens = vec![ParseToken {
            symbol: sym(0),
            value: 7i64,
            span: Span::default(),
        }];
        let mut actions = |_a: ActionId, _h: SymbolId, children: Vec<i64>| Ok(children[0] * 10);
        let result = table.parse(tokens, &mut actions).unwrap();
        assert_eq!(result, Some(70));
    }

    #[test]
    fn trailing_token_is_a_syntax_error() {
        init_logger();
        let table = single_rule_table();
        let tokens = vec![
            ParseToken {
                symbol: sym(0),
                value: 1i64,
                span: Span::default(),
            },
            ParseToken {
                symbol: sym(0),
                value: 2i64,
                span: Span::default(),
            },
        ];
        let mut actions = |_a: ActionId, _h: SymbolId, children: Vec<i64>| Ok(children[0]);
        let err = table.parse(tokens, &mut actions).unwrap_err();
        match err {
            ParseError::Syntax { symbol, .. } => assert_eq!(symbol, sym(0)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_a_syntax_error_here() {
        init_logger();
        let table = single_rule_table();
        let mut actions = |_a: ActionId, _h: SymbolId, children: Vec<i64>| Ok(children[0]);
        let err = table
            .parse(Vec::<ParseToken<i64>>::new(), &mut actions)
            .unwrap_err();
        match err {
            ParseError::Syntax { state: s, symbol, .. } => {
                assert_eq!(s, state(0));
                assert_eq!(symbol, sym(1));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn action_failure_aborts_the_parse() {
        init_logger();
        let table = single_rule_table();
        let tokens = vec![ParseToken {
            symbol: sym(0),
            value: 1i64,
            span: Span::default(),
        }];
        let mut actions =
            |_a: ActionId, _h: SymbolId, _c: Vec<i64>| anyhow::bail!("semantic rejection");
        let err = table.parse(tokens, &mut actions).unwrap_err();
        assert!(matches!(err, ParseError::Action(_)));
    }

    #[test]
    fn reparsing_the_same_input_is_deterministic() {
        init_logger();
        let table = single_rule_table();
        let run = || {
            let tokens = vec![ParseToken {
                symbol: sym(0),
                value: 3i64,
                span: Span::default(),
            }];
            let mut order = Vec::new();
            let mut actions = |a: ActionId, _h: SymbolId, children: Vec<i64>| {
                order.push(a);
                Ok(children[0])
            };
            let value = table.parse(tokens, &mut actions).unwrap();
            (value, order)
        };
        assert_eq!(run(), run());
    }
}

//! DFA-driven maximal-munch tokenizer.
//!
//! The driver advances through DFA transitions remembering the last
//! accepting state it saw. When a transition fails (or input ends) it emits
//! the token for that state and pushes the overrun characters back, so the
//! next call resumes right after the matched span. There is no other
//! backtracking.

use smartstring::alias::String;

use crate::cursor::ScanCursor;
use crate::dfa::{Dfa, DfaStateId};
use crate::error::LexicalError;
use crate::token::Token;

/// Scanning statistics, mostly for tracing and tests.
#[derive(Debug, Clone, Default)]
pub struct TokenizerStats {
    /// Characters pulled from the underlying input.
    pub chars: usize,
    /// Characters pushed back after an overrun.
    pub unreads: usize,
    /// Tokens emitted.
    pub tokens: usize,
}

/// A lazy token sequence over a character input.
///
/// Create with [`Dfa::tokenize`]. Each call to [`try_next`](Self::try_next)
/// scans exactly one token; the type also implements [`Iterator`] over
/// `Result<Token<P>, LexicalError>`.
pub struct Tokenizer<'d, I, P> {
    dfa: &'d Dfa<P>,
    input: I,
    /// Pushback stack; characters here are re-consumed before the input.
    unread: Vec<char>,
    buffer: String,
    cursor: ScanCursor,
    failed: bool,
    stats: TokenizerStats,
}

impl<P: Clone> Dfa<P> {
    /// Starts a lazy token sequence over `input`.
    pub fn tokenize<I>(&self, input: I) -> Tokenizer<'_, I::IntoIter, P>
    where
        I: IntoIterator<Item = char>,
    {
        Tokenizer {
            dfa: self,
            input: input.into_iter(),
            unread: Vec::new(),
            buffer: String::new(),
            cursor: ScanCursor::new(),
            failed: false,
            stats: TokenizerStats::default(),
        }
    }
}

impl<I, P> Tokenizer<'_, I, P>
where
    I: Iterator<Item = char>,
    P: Clone,
{
    /// Scans the next token, or `None` at a clean end of input.
    pub fn try_next(&mut self) -> Result<Option<Token<P>>, LexicalError> {
        self.buffer.clear();
        let mut state = self.dfa.start();
        let mut last_accept: Option<(DfaStateId, usize)> = None;
        let mut consumed = 0usize;

        loop {
            let c = match self.unread.pop() {
                Some(c) => c,
                None => match self.input.next() {
                    Some(c) => {
                        self.stats.chars += 1;
                        c
                    }
                    None => break,
                },
            };

            match self.dfa.step(state, c)? {
                Some(next) => {
                    self.buffer.push(c);
                    self.cursor.advance(c);
                    consumed += 1;
                    state = next;
                    // Zero-length accepts (an empty word pattern) are never
                    // emitted; a match must consume at least one character.
                    if self.dfa.state(state)?.accept.is_some() {
                        last_accept = Some((state, consumed));
                    }
                }
                None => {
                    self.unread.push(c);
                    return self.emit(last_accept, consumed, Some(c));
                }
            }
        }

        if consumed == 0 {
            return Ok(None);
        }
        self.emit(last_accept, consumed, None)
    }

    /// Seals the pending match: pushes overrun characters back, emits the
    /// token for the last accepting state, or reports the failure.
    fn emit(
        &mut self,
        last_accept: Option<(DfaStateId, usize)>,
        consumed: usize,
        found: Option<char>,
    ) -> Result<Option<Token<P>>, LexicalError> {
        let Some((accept_state, matched)) = last_accept else {
            return Err(LexicalError::NoMatch {
                position: self.cursor.span.start,
                offset: self.cursor.offset - consumed,
                found,
            });
        };

        for _ in matched..consumed {
            let c = self
                .buffer
                .pop()
                .ok_or(LexicalError::Corrupt("overrun exceeds scan buffer"))?;
            self.cursor.retreat(c)?;
            self.unread.push(c);
            self.stats.unreads += 1;
        }

        let accept = self
            .dfa
            .state(accept_state)?
            .accept
            .as_ref()
            .ok_or(LexicalError::Corrupt("accepting state lost its accept data"))?;
        let token = Token::new(
            accept.payload.clone(),
            std::mem::take(&mut self.buffer),
            self.cursor.span,
        );
        log::trace!(
            "matched {:?} as {:?} at {}",
            token.lexeme,
            accept.word,
            token.span
        );
        self.cursor.commit();
        self.stats.tokens += 1;
        Ok(Some(token))
    }

    pub fn stats(&self) -> &TokenizerStats {
        &self.stats
    }
}

impl<I, P> Iterator for Tokenizer<'_, I, P>
where
    I: Iterator<Item = char>,
    P: Clone,
{
    type Item = Result<Token<P>, LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.try_next() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::dfa::{AcceptData, DfaState, TransArrayPool, WordId};
    use crate::store::{IndexedStore, StoreId};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Hand-assembles a DFA from `(state, symbol, target)` edges and
    /// `(state, word, priority, payload)` accepts. State 0 is the start.
    fn build_dfa(
        n_states: usize,
        edges: &[(usize, char, usize)],
        accepts: &[(usize, usize, usize, &'static str)],
    ) -> Dfa<&'static str> {
        let mut pool = TransArrayPool::new();
        let mut states = IndexedStore::new();
        for s in 0..n_states {
            let map: BTreeMap<char, _> = edges
                .iter()
                .filter(|&&(src, _, _)| src == s)
                .map(|&(_, c, dst)| (c, DfaStateId::from_usize(dst)))
                .collect();
            let trans = pool.intern(map);
            let accept = accepts
                .iter()
                .find(|&&(st, _, _, _)| st == s)
                .map(|&(_, word, priority, payload)| AcceptData {
                    word: WordId::from_usize(word),
                    priority,
                    payload,
                });
            states.insert(DfaState { trans, accept });
        }
        Dfa::new(states, pool, DfaStateId::from_usize(0))
    }

    /// Words "a" and "ab": maximal munch takes the longer match.
    #[test]
    fn maximal_munch_prefers_longest() {
        init_logger();
        let dfa = build_dfa(
            3,
            &[(0, 'a', 1), (1, 'b', 2)],
            &[(1, 0, 1, "a"), (2, 1, 1, "ab")],
        );
        let tokens: Vec<_> = dfa
            .tokenize("ab".chars())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].payload, "ab");
        assert_eq!(&tokens[0].lexeme, "ab");
    }

    #[test]
    fn overrun_is_pushed_back_for_the_next_token() {
        init_logger();
        // words "a" and "abc"; input "ab" matches "a" and re-scans "b".
        let dfa = build_dfa(
            4,
            &[(0, 'a', 1), (1, 'b', 2), (2, 'c', 3)],
            &[(1, 0, 1, "a"), (3, 1, 1, "abc")],
        );
        let mut tok = dfa.tokenize("ab".chars());
        let first = tok.try_next().unwrap().unwrap();
        assert_eq!(first.payload, "a");
        // "b" alone matches nothing.
        let err = tok.try_next().unwrap_err();
        match err {
            LexicalError::NoMatch { found, offset, .. } => {
                assert_eq!(found, Some('b'));
                assert_eq!(offset, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn no_match_reports_start_position() {
        init_logger();
        let dfa = build_dfa(2, &[(0, 'a', 1)], &[(1, 0, 1, "a")]);
        let err = dfa.tokenize("x".chars()).next().unwrap().unwrap_err();
        match err {
            LexicalError::NoMatch {
                position, found, ..
            } => {
                assert_eq!(position.line, 0);
                assert_eq!(position.column, 0);
                assert_eq!(found, Some('x'));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn clean_end_of_input_yields_none() {
        init_logger();
        let dfa = build_dfa(2, &[(0, 'a', 1)], &[(1, 0, 1, "a")]);
        let mut tok = dfa.tokenize("aa".chars());
        assert!(tok.try_next().unwrap().is_some());
        assert!(tok.try_next().unwrap().is_some());
        assert!(tok.try_next().unwrap().is_none());
        assert_eq!(tok.stats().tokens, 2);
    }

    #[test]
    fn spans_advance_across_lines() {
        init_logger();
        let dfa = build_dfa(
            3,
            &[(0, 'a', 1), (0, '\n', 2)],
            &[(1, 0, 1, "a"), (2, 1, 1, "nl")],
        );
        let tokens: Vec<_> = dfa
            .tokenize("a\na".chars())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(tokens[2].span.start.line, 1);
        assert_eq!(tokens[2].span.start.column, 0);
    }
}

//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! A small calculator built on the `lexlr` generators and runtime.
//!
//! This crate is the worked example of the toolkit's consumer seam: it
//! registers a lexicon (numbers, identifiers, the `let` keyword,
//! operators, skipped whitespace) and an expression grammar with operator
//! precedence, then evaluates statements by attaching semantic actions to
//! the shift-reduce engine. One [`Calc`] instance holds the generated
//! tables; each [`eval`](Calc::eval) call is an independent parse sharing
//! a caller-provided [`SymTab`].
//!
//! ```rust
//! use lexlr_calc::{Calc, SymTab};
//!
//! let calc = Calc::new().unwrap();
//! let mut symtab = SymTab::new();
//! calc.eval("let x = 2 + 3", &mut symtab).unwrap();
//! assert_eq!(calc.eval("x * x", &mut symtab).unwrap(), 25);
//! ```

mod symtab;

pub use crate::symtab::{SymTab, SymTabError};

use anyhow::bail;
use smartstring::alias::String;
use thiserror::Error;

use lexlr::dfa::Dfa;
use lexlr::engine::{Actions, ParseToken};
use lexlr::error::{LexicalError, ParseError};
use lexlr::store::StoreId;
use lexlr::table::{ActionId, SymbolId, SyntaxTable};
use lexlr_gen::{Assoc, GenerationError, Generator};

/// How a matched word maps into the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokKind {
    /// Numeric literal; the lexeme becomes a value.
    Number,
    /// Identifier; the lexeme becomes a name.
    Ident,
    /// Structural terminal with no value of its own.
    Plain,
    /// Never reaches the parser (whitespace).
    Skip,
}

/// Word payload: the grammar terminal the word stands for, plus how to
/// derive the token's semantic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WordTag {
    sym: SymbolId,
    kind: TokKind,
}

/// Semantic values on the parse stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcValue {
    /// Tokens without data, and structural reductions.
    None,
    Num(i64),
    Name(String),
}

/// Everything that can go wrong while evaluating a statement.
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("unable to parse number: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error(transparent)]
    Lexical(#[from] LexicalError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("statement produced no value")]
    NoValue,
}

// Semantic-action dispatch codes, one per production.
const STAT_EXPR: usize = 0;
const ASSIGN: usize = 1;
const ADD: usize = 2;
const SUB: usize = 3;
const MUL: usize = 4;
const DIV: usize = 5;
const PAREN: usize = 6;
const NUM: usize = 7;
const VAR: usize = 8;

fn act(code: usize) -> ActionId {
    ActionId::from_usize(code)
}

/// The generated calculator frontend: a DFA lexicon and an LR table for
///
/// ```text
/// Stat -> let ident = Expr | Expr
/// Expr -> Expr + Expr | Expr - Expr     (priority 1, left)
///       | Expr * Expr | Expr / Expr    (priority 2, left)
///       | ( Expr ) | num | ident
/// ```
pub struct Calc {
    dfa: Dfa<WordTag>,
    table: SyntaxTable,
}

impl Calc {
    /// Generates the calculator's tables.
    pub fn new() -> Result<Self, GenerationError> {
        let mut generator: Generator<WordTag> = Generator::new();

        let t_let = generator.terminal("let")?;
        let t_ident = generator.terminal("ident")?;
        let t_num = generator.terminal("num")?;
        let t_plus = generator.terminal("plus")?;
        let t_minus = generator.terminal("minus")?;
        let t_star = generator.terminal("star")?;
        let t_slash = generator.terminal("slash")?;
        let t_lparen = generator.terminal("lparen")?;
        let t_rparen = generator.terminal("rparen")?;
        let t_eq = generator.terminal("eq")?;

        let plain = |sym| WordTag {
            sym,
            kind: TokKind::Plain,
        };
        // The keyword out-ranks the identifier pattern on the same text.
        generator.define_word("let", 0, plain(t_let))?;
        generator.define_word(
            "[a-z][a-z0-9]*",
            1,
            WordTag {
                sym: t_ident,
                kind: TokKind::Ident,
            },
        )?;
        generator.define_word(
            "[0-9]+",
            1,
            WordTag {
                sym: t_num,
                kind: TokKind::Number,
            },
        )?;
        generator.define_word(r"\+", 1, plain(t_plus))?;
        generator.define_word("-", 1, plain(t_minus))?;
        generator.define_word(r"\*", 1, plain(t_star))?;
        generator.define_word("/", 1, plain(t_slash))?;
        generator.define_word(r"\(", 1, plain(t_lparen))?;
        generator.define_word(r"\)", 1, plain(t_rparen))?;
        generator.define_word("=", 1, plain(t_eq))?;
        generator.define_word(
            "[ \t\n\r]+",
            1,
            WordTag {
                sym: SymbolId::INVALID,
                kind: TokKind::Skip,
            },
        )?;

        let stat = generator.nonterminal("Stat")?;
        let expr = generator.nonterminal("Expr")?;

        // Statement reductions yield to any pending operator.
        generator.define_production(stat, vec![expr], Some((0, Assoc::Left)), act(STAT_EXPR))?;
        generator.define_production(
            stat,
            vec![t_let, t_ident, t_eq, expr],
            Some((0, Assoc::Left)),
            act(ASSIGN),
        )?;
        generator.define_production(
            expr,
            vec![expr, t_plus, expr],
            Some((1, Assoc::Left)),
            act(ADD),
        )?;
        generator.define_production(
            expr,
            vec![expr, t_minus, expr],
            Some((1, Assoc::Left)),
            act(SUB),
        )?;
        generator.define_production(
            expr,
            vec![expr, t_star, expr],
            Some((2, Assoc::Left)),
            act(MUL),
        )?;
        generator.define_production(
            expr,
            vec![expr, t_slash, expr],
            Some((2, Assoc::Left)),
            act(DIV),
        )?;
        generator.define_production(expr, vec![t_lparen, expr, t_rparen], None, act(PAREN))?;
        generator.define_production(expr, vec![t_num], None, act(NUM))?;
        generator.define_production(expr, vec![t_ident], None, act(VAR))?;

        let (dfa, table) = generator.build()?;
        log::debug!(
            "calculator tables ready: {} DFA states, {} parser states",
            dfa.n_states(),
            table.n_states()
        );
        Ok(Self { dfa, table })
    }

    /// Evaluates one statement against `symtab`.
    pub fn eval(&self, input: &str, symtab: &mut SymTab) -> Result<i64, CalcError> {
        let mut tokens = Vec::new();
        for token in self.dfa.tokenize(input.chars()) {
            let token = token?;
            let value = match token.payload.kind {
                TokKind::Skip => continue,
                TokKind::Number => CalcValue::Num(token.lexeme.parse()?),
                TokKind::Ident => CalcValue::Name(token.lexeme),
                TokKind::Plain => CalcValue::None,
            };
            tokens.push(ParseToken {
                symbol: token.payload.sym,
                value,
                span: token.span,
            });
        }

        let mut actions = EvalActions { symtab };
        match self.table.parse(tokens, &mut actions)? {
            Some(CalcValue::Num(n)) => Ok(n),
            _ => Err(CalcError::NoValue),
        }
    }
}

/// The action registry: folds reductions into values and updates the
/// symbol table on assignment.
struct EvalActions<'s> {
    symtab: &'s mut SymTab,
}

fn num(value: &CalcValue) -> anyhow::Result<i64> {
    match value {
        CalcValue::Num(n) => Ok(*n),
        other => bail!("expected a numeric operand, got {other:?}"),
    }
}

impl Actions<CalcValue> for EvalActions<'_> {
    fn reduce(
        &mut self,
        action: ActionId,
        _head: SymbolId,
        mut children: Vec<CalcValue>,
    ) -> anyhow::Result<CalcValue> {
        match usize::from(action) {
            STAT_EXPR => Ok(children.swap_remove(0)),
            ASSIGN => {
                // let ident = Expr
                let value = num(&children[3])?;
                let CalcValue::Name(name) = &children[1] else {
                    bail!("assignment target is not a name");
                };
                self.symtab.set(name, value);
                Ok(CalcValue::Num(value))
            }
            ADD => Ok(CalcValue::Num(num(&children[0])? + num(&children[2])?)),
            SUB => Ok(CalcValue::Num(num(&children[0])? - num(&children[2])?)),
            MUL => Ok(CalcValue::Num(num(&children[0])? * num(&children[2])?)),
            DIV => {
                let divisor = num(&children[2])?;
                if divisor == 0 {
                    bail!("division by zero");
                }
                Ok(CalcValue::Num(num(&children[0])? / divisor))
            }
            PAREN => Ok(children.swap_remove(1)),
            NUM => Ok(children.swap_remove(0)),
            VAR => {
                let CalcValue::Name(name) = &children[0] else {
                    bail!("variable reference is not a name");
                };
                Ok(CalcValue::Num(self.symtab.get(name)?))
            }
            other => bail!("unknown semantic action {other}"),
        }
    }
}

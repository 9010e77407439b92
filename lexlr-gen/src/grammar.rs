//! The grammar registry: symbols, productions, precedence.
//!
//! Symbols are interned by name into one id space shared by terminals and
//! nonterminals; the reserved end-of-input terminal is interned at
//! construction. The head of the first registered production becomes the
//! start symbol (the augmented start production is implicit and never
//! stored). Productions keep their declaration order — the conflict
//! resolution policy depends on it.

use std::collections::HashMap;

use smartstring::alias::String;

use lexlr::store::{IndexedStore, LookupError};
use lexlr::table::{ActionId, ProductionId, SymbolId};

use crate::error::GrammarError;

/// Name of the reserved end-of-input terminal.
pub const END_NAME: &str = "$end";

/// Operator associativity used to break equal-priority conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    /// Reduce first: `a - b - c` groups as `(a - b) - c`.
    Left,
    /// Shift first: `a = b = c` groups as `a = (b = c)`.
    Right,
    /// Equal-priority conflicts are a grammar error.
    None,
}

/// What a symbol id stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
}

#[derive(Debug, Clone)]
pub struct SymbolData {
    pub name: String,
    pub kind: SymbolKind,
}

/// One production. `prec` is the operator priority/associativity pair used
/// against competing shifts; greater priority binds tighter.
#[derive(Debug, Clone)]
pub struct Production {
    pub head: SymbolId,
    pub body: Vec<SymbolId>,
    pub prec: Option<(usize, Assoc)>,
    pub action: ActionId,
}

/// A mutable grammar under registration.
#[derive(Debug)]
pub struct Grammar {
    symbols: IndexedStore<SymbolId, SymbolData>,
    names: HashMap<String, SymbolId>,
    prods: IndexedStore<ProductionId, Production>,
    by_head: HashMap<SymbolId, Vec<ProductionId>>,
    end: SymbolId,
    start: Option<SymbolId>,
}

impl Grammar {
    pub fn new() -> Self {
        let mut symbols = IndexedStore::new();
        let mut names = HashMap::new();
        let end = symbols.insert(SymbolData {
            name: END_NAME.into(),
            kind: SymbolKind::Terminal,
        });
        names.insert(String::from(END_NAME), end);
        Self {
            symbols,
            names,
            prods: IndexedStore::new(),
            by_head: HashMap::new(),
            end,
            start: None,
        }
    }

    fn intern(&mut self, name: &str, kind: SymbolKind) -> Result<SymbolId, GrammarError> {
        if let Some(&id) = self.names.get(name) {
            let data = self.symbols.get(id).expect("interned symbol exists");
            if data.kind != kind || name == END_NAME {
                return Err(GrammarError::KindMismatch { name: name.into() });
            }
            return Ok(id);
        }
        let id = self.symbols.insert(SymbolData {
            name: name.into(),
            kind,
        });
        self.names.insert(name.into(), id);
        Ok(id)
    }

    /// Interns a terminal symbol, returning the existing id on re-use.
    pub fn terminal(&mut self, name: &str) -> Result<SymbolId, GrammarError> {
        self.intern(name, SymbolKind::Terminal)
    }

    /// Interns a nonterminal symbol, returning the existing id on re-use.
    pub fn nonterminal(&mut self, name: &str) -> Result<SymbolId, GrammarError> {
        self.intern(name, SymbolKind::Nonterminal)
    }

    /// Registers a production. The first registered production's head
    /// becomes the start symbol.
    pub fn define_production(
        &mut self,
        head: SymbolId,
        body: Vec<SymbolId>,
        prec: Option<(usize, Assoc)>,
        action: ActionId,
    ) -> Result<ProductionId, GrammarError> {
        let head_data = self
            .symbols
            .get(head)
            .map_err(|_| GrammarError::UndefinedSymbol {
                name: format!("{head:?}").into(),
            })?;
        if head_data.kind != SymbolKind::Nonterminal {
            return Err(GrammarError::HeadNotNonterminal {
                name: head_data.name.clone(),
            });
        }
        for &sym in &body {
            if sym == self.end {
                return Err(GrammarError::ReservedSymbol {
                    name: END_NAME.into(),
                });
            }
            if self.symbols.get(sym).is_err() {
                return Err(GrammarError::UndefinedSymbol {
                    name: format!("{sym:?}").into(),
                });
            }
        }
        let id = self.prods.insert(Production {
            head,
            body,
            prec,
            action,
        });
        self.by_head.entry(head).or_default().push(id);
        self.start.get_or_insert(head);
        Ok(id)
    }

    pub fn start_symbol(&self) -> Option<SymbolId> {
        self.start
    }

    /// The reserved end-of-input terminal.
    pub fn end_symbol(&self) -> SymbolId {
        self.end
    }

    /// Upper bound on symbol ids; usable as a column count.
    pub fn n_symbols(&self) -> usize {
        self.symbols.len()
    }

    pub fn n_productions(&self) -> usize {
        self.prods.len()
    }

    pub fn symbol(&self, id: SymbolId) -> Result<&SymbolData, LookupError> {
        self.symbols.get(id)
    }

    pub fn symbol_name(&self, id: SymbolId) -> String {
        self.symbols
            .get(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|_| format!("{id:?}").into())
    }

    pub fn is_terminal(&self, id: SymbolId) -> bool {
        matches!(
            self.symbols.get(id),
            Ok(SymbolData {
                kind: SymbolKind::Terminal,
                ..
            })
        )
    }

    /// Terminal symbol ids, end-of-input included.
    pub fn terminals(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols
            .iter()
            .filter(|(_, data)| data.kind == SymbolKind::Terminal)
            .map(|(id, _)| id)
    }

    pub fn production(&self, id: ProductionId) -> Result<&Production, LookupError> {
        self.prods.get(id)
    }

    pub fn productions(&self) -> impl Iterator<Item = (ProductionId, &Production)> {
        self.prods.iter()
    }

    /// Productions for one head nonterminal, in declaration order.
    pub fn productions_of(&self, head: SymbolId) -> &[ProductionId] {
        self.by_head.get(&head).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Checks global well-formedness: every nonterminal appearing in a body
    /// derives something, and every production is reachable from the start
    /// symbol.
    pub fn validate(&self) -> Result<(), GrammarError> {
        for (_, prod) in self.prods.iter() {
            for &sym in &prod.body {
                let data = self.symbols.get(sym).expect("validated at definition");
                if data.kind == SymbolKind::Nonterminal && self.productions_of(sym).is_empty() {
                    return Err(GrammarError::UndefinedSymbol {
                        name: data.name.clone(),
                    });
                }
            }
        }

        let Some(start) = self.start else {
            return Ok(()); // empty grammar is valid
        };
        let mut reachable = vec![false; self.symbols.len()];
        let mut worklist = vec![start];
        reachable[usize::from(start)] = true;
        while let Some(head) = worklist.pop() {
            for &pid in self.productions_of(head) {
                let prod = self.prods.get(pid).expect("registered production");
                for &sym in &prod.body {
                    if !reachable[usize::from(sym)] {
                        reachable[usize::from(sym)] = true;
                        if !self.is_terminal(sym) {
                            worklist.push(sym);
                        }
                    }
                }
            }
        }
        for (pid, prod) in self.prods.iter() {
            if !reachable[usize::from(prod.head)] {
                return Err(GrammarError::Unreachable {
                    production: pid,
                    head: self.symbol_name(prod.head),
                });
            }
        }
        Ok(())
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

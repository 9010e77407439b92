//! Variable store for the calculator.

use std::collections::HashMap;

use smartstring::alias::String;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymTabError {
    #[error("variable {name:?} is not defined")]
    Undefined { name: String },
}

/// Named values shared across statements of one session.
#[derive(Debug, Default)]
pub struct SymTab {
    vars: HashMap<String, i64>,
}

impl SymTab {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: i64) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Result<i64, SymTabError> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| SymTabError::Undefined { name: name.into() })
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

use std::collections::HashMap;

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum PrecedenceError {
    #[error("operator '{0}' must have a positive precedence")]
    ZeroPrecedence(char),
    #[error("'{0}' cannot be used as a binary operator")]
    ReservedCharacter(char),
}

/// Binary operator precedences; higher binds tighter.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PrecedenceTable {
    operators: HashMap<char, u32>,
}

impl std::default::Default for PrecedenceTable {
    fn default() -> Self {
        let mut operators = HashMap::new();
        operators.insert('<', 1);
        operators.insert('+', 2);
        operators.insert('-', 2);
        operators.insert('*', 4);
        Self { operators }
    }
}

// never reach the parser as a lone operator token, or are claimed by the grammar
fn is_reserved(op: char) -> bool {
    op.is_ascii_alphanumeric()
        || op.is_whitespace()
        || matches!(op, '.' | '#' | '(' | ')' | ',' | ';')
}

impl PrecedenceTable {
    pub fn empty() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    /// Binds `op` to `precedence`, returning the previous binding if any.
    pub fn register(&mut self, op: char, precedence: u32) -> Result<Option<u32>, PrecedenceError> {
        if is_reserved(op) {
            return Err(PrecedenceError::ReservedCharacter(op));
        }
        if precedence == 0 {
            return Err(PrecedenceError::ZeroPrecedence(op));
        }
        Ok(self.operators.insert(op, precedence))
    }

    pub fn precedence(&self, op: char) -> Option<u32> {
        self.operators.get(&op).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, u32)> + '_ {
        self.operators.iter().map(|(&op, &precedence)| (op, precedence))
    }
}

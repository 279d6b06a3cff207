use std::{fmt, mem};

/// Name given to the implicit function wrapping a bare top-level expression.
/// `_` never starts an identifier, so no user function can take this name.
pub const ANONYMOUS_FUNCTION: &str = "__anon_expr";

#[derive(Debug, PartialEq, Clone)]
pub struct Prototype {
    pub name: String,
    pub args: Vec<String>,
}

impl Prototype {
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Literal(f64),
    Variable(String),
    Binary(char, Box<Expression>, Box<Expression>),
    Call(String, Vec<Expression>),
}

impl Expression {
    fn take_children(&mut self, stack: &mut Vec<Expression>) {
        match self {
            Expression::Binary(_, lhs, rhs) => {
                stack.push(mem::replace(lhs.as_mut(), Expression::Literal(0.0)));
                stack.push(mem::replace(rhs.as_mut(), Expression::Literal(0.0)));
            }
            Expression::Call(_, args) => stack.extend(args.drain(..)),
            Expression::Literal(_) | Expression::Variable(_) => {}
        }
    }
}

// long operator chains would otherwise overflow the stack in the derived drop
impl Drop for Expression {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        self.take_children(&mut stack);
        while let Some(mut expr) = stack.pop() {
            expr.take_children(&mut stack);
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Function {
    pub prototype: Prototype,
    pub body: Expression,
}

impl Function {
    /// Wraps a bare expression into a nullary function.
    pub fn anonymous(body: Expression) -> Self {
        Self {
            prototype: Prototype {
                name: ANONYMOUS_FUNCTION.to_string(),
                args: Vec::new(),
            },
            body,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.prototype.name == ANONYMOUS_FUNCTION && self.prototype.args.is_empty()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum ASTNode {
    Extern(Prototype),
    Function(Function),
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Binary(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op, rhs),
            Expression::Call(callee, args) => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(" "))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            write!(f, "{}", self.body)
        } else {
            write!(f, "def {} {}", self.prototype, self.body)
        }
    }
}

impl fmt::Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ASTNode::Extern(proto) => write!(f, "extern {}", proto),
            ASTNode::Function(func) => write!(f, "{}", func),
        }
    }
}

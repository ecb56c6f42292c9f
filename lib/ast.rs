use std::{fmt, rc::Rc};

use crate::token::Token;

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A function body and its parameter names. Shared between the AST and the
/// environment entry created when the definition executes.
#[derive(Debug, PartialEq, Clone)]
pub struct FunctionDef {
    pub parameters: Vec<String>,
    pub body: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Assign {
        name: String,
        value: Expression,
    },
    Print(Vec<Expression>),
    Read(String),
    If {
        condition: Expression,
        consequence: Vec<Statement>,
        alternative: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    For {
        init: Box<Statement>,
        condition: Expression,
        update: Box<Statement>,
        body: Vec<Statement>,
    },
    FunctionDef {
        name: String,
        function: Rc<FunctionDef>,
    },
    Return(Expression),
    Break,
    Continue,
    Expression(Expression),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    IntegerLiteral(i32),
    FloatLiteral(f32),
    /// Raw literal text as written in the source, quotes and escapes included.
    StringLiteral(String),
    BooleanLiteral(bool),
    Identifier(String),
    Prefix {
        operator: Token,
        right: Box<Expression>,
    },
    Infix {
        left: Box<Expression>,
        operator: Token,
        right: Box<Expression>,
    },
    Index {
        name: String,
        index: Box<Expression>,
    },
    Slice {
        name: String,
        start: Box<Expression>,
        end: Box<Expression>,
    },
    Length(String),
    Call {
        function: String,
        arguments: Vec<Expression>,
    },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Assign { name, value } => write!(f, "{} = {};", name, value),
            Statement::Print(arguments) => write!(f, "print({});", join(arguments)),
            Statement::Read(name) => write!(f, "read({});", name),
            Statement::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({}) {{ {} }}", condition, join_block(consequence))?;
                if let Some(alternative) = alternative {
                    write!(f, " else {{ {} }}", join_block(alternative))?;
                }
                Ok(())
            }
            Statement::While { condition, body } => {
                write!(f, "while ({}) {{ {} }}", condition, join_block(body))
            }
            Statement::For {
                init,
                condition,
                update,
                body,
            } => {
                let update = update.to_string();
                write!(
                    f,
                    "for ({} {}; {}) {{ {} }}",
                    init,
                    condition,
                    update.trim_end_matches(';'),
                    join_block(body)
                )
            }
            Statement::FunctionDef { name, function } => write!(
                f,
                "func {}({}) {{ {} }}",
                name,
                function.parameters.join(", "),
                join_block(&function.body)
            ),
            Statement::Return(value) => write!(f, "return {};", value),
            Statement::Break => write!(f, "break;"),
            Statement::Continue => write!(f, "continue;"),
            Statement::Expression(expression) => write!(f, "{};", expression),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::IntegerLiteral(value) => write!(f, "{}", value),
            Expression::FloatLiteral(value) => write!(f, "{:?}", value),
            Expression::StringLiteral(value) => write!(f, "{}", value),
            Expression::BooleanLiteral(value) => write!(f, "{}", value),
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::Prefix { operator, right } => match operator {
                Token::Minus => write!(f, "(-{})", right),
                _ => write!(f, "({} {})", operator, right),
            },
            Expression::Infix {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::Index { name, index } => write!(f, "{}[{}]", name, index),
            Expression::Slice { name, start, end } => write!(f, "{}[{}:{}]", name, start, end),
            Expression::Length(name) => write!(f, "len({})", name),
            Expression::Call {
                function,
                arguments,
            } => write!(f, "{}({})", function, join(arguments)),
        }
    }
}

fn join(expressions: &[Expression]) -> String {
    expressions
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

fn join_block(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<String>>()
        .join(" ")
}

use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Ident(String),
    Int(String),
    Float(String),
    String(String),
    Illegal(String),

    Assign,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Caret,

    And,
    Or,
    Not,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,

    Comma,
    Semicolon,
    Colon,

    Lparen,
    Rparen,
    Lbrace,
    Rbrace,
    Lbracket,
    Rbracket,

    Function,
    True,
    False,
    If,
    Else,
    While,
    For,
    Return,
    Break,
    Continue,
    Print,
    Read,
    Len,
}

impl Token {
    pub fn variant_eq(&self, other: Token) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(&other)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Ident(ident) => write!(f, "{}", ident),
            Token::Int(value) => write!(f, "{}", value),
            Token::Float(value) => write!(f, "{}", value),
            Token::String(value) => write!(f, "{}", value),
            Token::Illegal(value) => write!(f, "{}", value),

            Token::Assign => write!(f, "="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Asterisk => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),

            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::Eq => write!(f, "eq"),
            Token::NotEq => write!(f, "neq"),
            Token::Lt => write!(f, "lt"),
            Token::Le => write!(f, "le"),
            Token::Gt => write!(f, "gt"),
            Token::Ge => write!(f, "ge"),

            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),

            Token::Lparen => write!(f, "("),
            Token::Rparen => write!(f, ")"),
            Token::Lbrace => write!(f, "{{"),
            Token::Rbrace => write!(f, "}}"),
            Token::Lbracket => write!(f, "["),
            Token::Rbracket => write!(f, "]"),

            Token::Function => write!(f, "func"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::For => write!(f, "for"),
            Token::Return => write!(f, "return"),
            Token::Break => write!(f, "break"),
            Token::Continue => write!(f, "continue"),
            Token::Print => write!(f, "print"),
            Token::Read => write!(f, "read"),
            Token::Len => write!(f, "len"),
        }
    }
}

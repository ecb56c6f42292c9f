use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::token::Token;

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, Token> = HashMap::from([
        ("func", Token::Function),
        ("true", Token::True),
        ("false", Token::False),
        ("if", Token::If),
        ("else", Token::Else),
        ("while", Token::While),
        ("for", Token::For),
        ("return", Token::Return),
        ("break", Token::Break),
        ("continue", Token::Continue),
        ("print", Token::Print),
        ("read", Token::Read),
        ("len", Token::Len),
        ("and", Token::And),
        ("or", Token::Or),
        ("not", Token::Not),
        ("eq", Token::Eq),
        ("neq", Token::NotEq),
        ("lt", Token::Lt),
        ("le", Token::Le),
        ("gt", Token::Gt),
        ("ge", Token::Ge),
    ]);
}

pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    char: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let char = chars.first().copied();
        Self {
            chars,
            position: 0,
            char,
        }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();

        let token = match self.char {
            Some(char) => match char {
                '=' if self.is_next_char('=') => {
                    self.read_char();
                    Some(Token::Eq)
                }
                '=' => Some(Token::Assign),
                '!' if self.is_next_char('=') => {
                    self.read_char();
                    Some(Token::NotEq)
                }
                '!' => Some(Token::Not),
                '<' if self.is_next_char('=') => {
                    self.read_char();
                    Some(Token::Le)
                }
                '<' => Some(Token::Lt),
                '>' if self.is_next_char('=') => {
                    self.read_char();
                    Some(Token::Ge)
                }
                '>' => Some(Token::Gt),
                '&' if self.is_next_char('&') => {
                    self.read_char();
                    Some(Token::And)
                }
                '|' if self.is_next_char('|') => {
                    self.read_char();
                    Some(Token::Or)
                }
                '+' => Some(Token::Plus),
                '-' => Some(Token::Minus),
                '*' => Some(Token::Asterisk),
                '/' => Some(Token::Slash),
                '^' => Some(Token::Caret),
                ';' => Some(Token::Semicolon),
                ',' => Some(Token::Comma),
                ':' => Some(Token::Colon),
                '(' => Some(Token::Lparen),
                ')' => Some(Token::Rparen),
                '{' => Some(Token::Lbrace),
                '}' => Some(Token::Rbrace),
                '[' => Some(Token::Lbracket),
                ']' => Some(Token::Rbracket),
                '"' => Some(self.read_string()),
                _ if char.is_ascii_digit() => {
                    let literal = self.read_until(|char| !char.is_ascii_digit() && char != '.');
                    if literal.contains('.') {
                        Some(Token::Float(literal))
                    } else {
                        Some(Token::Int(literal))
                    }
                }
                _ if char.is_ascii_alphabetic() || char == '_' => {
                    let literal =
                        self.read_until(|char| !char.is_ascii_alphanumeric() && char != '_');
                    match KEYWORDS.get(literal.as_str()) {
                        Some(keyword) => Some(keyword.clone()),
                        None => Some(Token::Ident(literal)),
                    }
                }
                _ => Some(Token::Illegal(char.to_string())),
            },
            None => None,
        };

        self.read_char();

        token
    }

    fn read_char(&mut self) {
        self.position += 1;
        self.char = self.chars.get(self.position).copied();
    }

    fn is_next_char(&self, ch: char) -> bool {
        self.chars.get(self.position + 1).eq(&Some(&ch))
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.char {
                Some(char) if char.is_whitespace() => self.read_char(),
                Some('#') => {
                    while self.char.is_some_and(|char| char != '\n') {
                        self.read_char();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_until(&mut self, condition: impl Fn(char) -> bool) -> String {
        let mut literal = String::new();
        while let Some(char) = self.char {
            if condition(char) {
                self.position -= 1;
                break;
            }
            literal.push(char);
            self.read_char();
        }
        literal
    }

    /// Reads a string literal verbatim, surrounding quotes and escape
    /// sequences included. Leaves the cursor on the closing quote.
    fn read_string(&mut self) -> Token {
        let mut literal = String::from('"');
        self.read_char();
        loop {
            match self.char {
                Some('"') => {
                    literal.push('"');
                    return Token::String(literal);
                }
                Some('\\') => {
                    literal.push('\\');
                    self.read_char();
                    if let Some(escaped) = self.char {
                        literal.push(escaped);
                        self.read_char();
                    }
                }
                Some(char) => {
                    literal.push(char);
                    self.read_char();
                }
                None => return Token::Illegal(literal),
            }
        }
    }
}

use std::rc::Rc;

use anyhow::{anyhow, bail, Result};

use crate::{
    ast::{Expression, FunctionDef, Program, Statement},
    lexer::Lexer,
    token::Token,
};

#[derive(Debug, Clone, PartialOrd, PartialEq, Eq, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Equals,
    LessGreater,
    Sum,
    Product,
    Power,
    Prefix,
}

impl Precedence {
    fn from_token(token: Token) -> Self {
        match token {
            Token::Or => Precedence::Or,
            Token::And => Precedence::And,
            Token::Eq | Token::NotEq => Precedence::Equals,
            Token::Lt | Token::Le | Token::Gt | Token::Ge => Precedence::LessGreater,
            Token::Plus | Token::Minus => Precedence::Sum,
            Token::Asterisk | Token::Slash => Precedence::Product,
            Token::Caret => Precedence::Power,
            _ => Precedence::Lowest,
        }
    }
}

pub struct Parser {
    lexer: Lexer,
    cur_token: Option<Token>,
    peek_token: Option<Token>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        Self {
            cur_token: lexer.next_token(),
            peek_token: lexer.next_token(),
            lexer,
        }
    }

    pub fn parse_program(&mut self) -> Result<Program> {
        let mut statements: Vec<Statement> = Vec::new();
        while self.cur_token().is_some() {
            let statement = self.parse_statement()?;
            statements.push(statement);
            self.next_token();
        }
        Ok(Program { statements })
    }

    fn cur_token(&mut self) -> Option<Token> {
        self.cur_token.clone()
    }

    fn peek_token(&mut self) -> Option<Token> {
        self.peek_token.clone()
    }

    fn next_token(&mut self) -> &mut Self {
        self.cur_token = self.peek_token();
        self.peek_token = self.lexer.next_token();
        self
    }

    fn peek_precedence(&mut self) -> Result<Precedence> {
        Ok(Precedence::from_token(
            self.peek_token().ok_or(anyhow!("no token found"))?,
        ))
    }

    fn cur_precedence(&mut self) -> Result<Precedence> {
        Ok(Precedence::from_token(
            self.cur_token().ok_or(anyhow!("no token found"))?,
        ))
    }

    fn peek_is(&mut self, token: Token) -> bool {
        self.peek_token()
            .is_some_and(|peek_token| peek_token.variant_eq(token))
    }

    fn expect_peek(&mut self, exp_token: Token) -> Result<()> {
        let peek_token = self
            .peek_token()
            .ok_or(anyhow!("expected next token to be {exp_token}, found end of input"))?;
        if peek_token.variant_eq(exp_token.clone()) {
            self.next_token();
            Ok(())
        } else {
            bail!("expected next token to be {exp_token}, found {peek_token}",)
        }
    }

    fn expect_peek_ident(&mut self) -> Result<String> {
        match self
            .next_token()
            .cur_token()
            .ok_or(anyhow!("expected identifier, found end of input"))?
        {
            Token::Ident(name) => Ok(name),
            token => bail!("expected identifier, found {token}"),
        }
    }

    fn skip_semicolon(&mut self) {
        if self.peek_is(Token::Semicolon) {
            self.next_token();
        }
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let statement = match self.cur_token().ok_or(anyhow!("no token found"))? {
            Token::If => return self.parse_if_statement(),
            Token::While => return self.parse_while_statement(),
            Token::For => return self.parse_for_statement(),
            Token::Function => return self.parse_function_definition(),
            Token::Return => self.parse_return_statement()?,
            Token::Break => Statement::Break,
            Token::Continue => Statement::Continue,
            _ => self.parse_simple_statement()?,
        };
        self.skip_semicolon();
        Ok(statement)
    }

    /// Statements allowed in the init and update slots of a `for` header.
    fn parse_simple_statement(&mut self) -> Result<Statement> {
        match self.cur_token().ok_or(anyhow!("no token found"))? {
            Token::Ident(name) if self.peek_is(Token::Assign) => self.parse_assign_statement(name),
            Token::Print => self.parse_print_statement(),
            Token::Read => self.parse_read_statement(),
            _ => Ok(Statement::Expression(
                self.parse_expression(Precedence::Lowest)?,
            )),
        }
    }

    fn parse_assign_statement(&mut self, name: String) -> Result<Statement> {
        self.expect_peek(Token::Assign)?;

        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        Ok(Statement::Assign { name, value })
    }

    fn parse_print_statement(&mut self) -> Result<Statement> {
        self.expect_peek(Token::Lparen)?;
        let arguments = self.parse_expression_list(Token::Rparen)?;
        Ok(Statement::Print(arguments))
    }

    fn parse_read_statement(&mut self) -> Result<Statement> {
        self.expect_peek(Token::Lparen)?;
        let name = self.expect_peek_ident()?;
        self.expect_peek(Token::Rparen)?;
        Ok(Statement::Read(name))
    }

    fn parse_return_statement(&mut self) -> Result<Statement> {
        if self.peek_token().is_none() || self.peek_is(Token::Semicolon) || self.peek_is(Token::Rbrace)
        {
            return Ok(Statement::Return(Expression::IntegerLiteral(0)));
        }

        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        Ok(Statement::Return(value))
    }

    fn parse_if_statement(&mut self) -> Result<Statement> {
        self.expect_peek(Token::Lparen)?;

        self.next_token();

        let condition = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(Token::Rparen)?;

        self.expect_peek(Token::Lbrace)?;

        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_is(Token::Else) {
            self.next_token();
            if self.peek_is(Token::If) {
                self.next_token();
                Some(vec![self.parse_if_statement()?])
            } else {
                self.expect_peek(Token::Lbrace)?;
                Some(self.parse_block_statement()?)
            }
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            consequence,
            alternative,
        })
    }

    fn parse_while_statement(&mut self) -> Result<Statement> {
        self.expect_peek(Token::Lparen)?;

        self.next_token();

        let condition = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(Token::Rparen)?;

        self.expect_peek(Token::Lbrace)?;

        let body = self.parse_block_statement()?;

        Ok(Statement::While { condition, body })
    }

    fn parse_for_statement(&mut self) -> Result<Statement> {
        self.expect_peek(Token::Lparen)?;

        self.next_token();
        let init = self.parse_simple_statement()?;
        self.expect_peek(Token::Semicolon)?;

        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(Token::Semicolon)?;

        self.next_token();
        let update = self.parse_simple_statement()?;
        self.expect_peek(Token::Rparen)?;

        self.expect_peek(Token::Lbrace)?;

        let body = self.parse_block_statement()?;

        Ok(Statement::For {
            init: Box::new(init),
            condition,
            update: Box::new(update),
            body,
        })
    }

    fn parse_function_definition(&mut self) -> Result<Statement> {
        let name = self.expect_peek_ident()?;

        self.expect_peek(Token::Lparen)?;

        let parameters = self
            .parse_expression_list(Token::Rparen)?
            .into_iter()
            .map(|p| match p {
                Expression::Identifier(name) => Ok(name),
                _ => Err(anyhow!("expected parameter name, found {}", p)),
            })
            .collect::<Result<Vec<String>>>()?;

        self.expect_peek(Token::Lbrace)?;

        let body = self.parse_block_statement()?;

        Ok(Statement::FunctionDef {
            name,
            function: Rc::new(FunctionDef { parameters, body }),
        })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expression> {
        let cur_token = self.cur_token().ok_or(anyhow!("no token found"))?;

        let mut left_exp = match cur_token.clone() {
            Token::Ident(value) => self.parse_identifier(value)?,
            Token::Int(value) => self.parse_integer_literal(value)?,
            Token::Float(value) => self.parse_float_literal(value)?,
            Token::String(value) => Expression::StringLiteral(value),
            Token::True | Token::False => self.parse_boolean_literal(cur_token)?,
            Token::Not | Token::Minus => self.parse_prefix_expression(cur_token)?,
            Token::Lparen => self.parse_grouped_expression()?,
            Token::Len => self.parse_length_expression()?,
            token => bail!("no prefix parse function for {token}"),
        };

        while self.peek_token().is_some_and(|token| !token.variant_eq(Token::Semicolon))
            && precedence < self.peek_precedence()?
        {
            match self.peek_token().ok_or(anyhow!("no token found"))? {
                Token::Plus
                | Token::Minus
                | Token::Asterisk
                | Token::Slash
                | Token::Caret
                | Token::And
                | Token::Or
                | Token::Eq
                | Token::NotEq
                | Token::Lt
                | Token::Le
                | Token::Gt
                | Token::Ge => {
                    self.next_token();
                    left_exp = self.parse_infix_expression(left_exp)?;
                }
                _ => return Ok(left_exp),
            };
        }

        Ok(left_exp)
    }

    fn parse_prefix_expression(&mut self, token: Token) -> Result<Expression> {
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Ok(Expression::Prefix {
            operator: token,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Result<Expression> {
        let token = self.cur_token().ok_or(anyhow!("no token found"))?;
        // `^` is right associative: parse its right side one level lower.
        let precedence = match self.cur_precedence()? {
            Precedence::Power => Precedence::Product,
            precedence => precedence,
        };
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Ok(Expression::Infix {
            left: Box::new(left),
            operator: token,
            right: Box::new(right),
        })
    }

    fn parse_identifier(&mut self, name: String) -> Result<Expression> {
        if self.peek_is(Token::Lparen) {
            self.next_token();
            let arguments = self.parse_expression_list(Token::Rparen)?;
            return Ok(Expression::Call {
                function: name,
                arguments,
            });
        }
        if self.peek_is(Token::Lbracket) {
            self.next_token();
            return self.parse_index_expression(name);
        }
        Ok(Expression::Identifier(name))
    }

    fn parse_integer_literal(&mut self, literal: String) -> Result<Expression> {
        let value = literal
            .parse::<i32>()
            .map_err(|err| anyhow!("could not parse integer literal as i32: {err}"))?;
        Ok(Expression::IntegerLiteral(value))
    }

    fn parse_float_literal(&mut self, literal: String) -> Result<Expression> {
        let value = literal
            .parse::<f32>()
            .map_err(|err| anyhow!("could not parse float literal {literal}: {err}"))?;
        Ok(Expression::FloatLiteral(value))
    }

    fn parse_boolean_literal(&mut self, token: Token) -> Result<Expression> {
        let value = match token {
            Token::True => true,
            Token::False => false,
            _ => bail!("no boolean parse function for {token}"),
        };
        Ok(Expression::BooleanLiteral(value))
    }

    fn parse_grouped_expression(&mut self) -> Result<Expression> {
        self.next_token();
        let exp = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(Token::Rparen)?;
        Ok(exp)
    }

    fn parse_length_expression(&mut self) -> Result<Expression> {
        self.expect_peek(Token::Lparen)?;
        let name = self.expect_peek_ident()?;
        self.expect_peek(Token::Rparen)?;
        Ok(Expression::Length(name))
    }

    fn parse_expression_list(&mut self, end_token: Token) -> Result<Vec<Expression>> {
        let mut expressions: Vec<Expression> = Vec::new();

        if self.peek_is(end_token.clone()) {
            self.next_token();
            return Ok(expressions);
        }

        self.next_token();

        expressions.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(Token::Comma) {
            self.next_token();
            self.next_token();
            expressions.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end_token)?;

        Ok(expressions)
    }

    fn parse_block_statement(&mut self) -> Result<Vec<Statement>> {
        self.next_token();

        let mut statements: Vec<Statement> = Vec::new();

        loop {
            match self.cur_token() {
                Some(Token::Rbrace) => break,
                Some(_) => {
                    let statement = self.parse_statement()?;
                    statements.push(statement);
                    self.next_token();
                }
                None => bail!("expected }}, found end of input"),
            }
        }

        Ok(statements)
    }

    fn parse_index_expression(&mut self, name: String) -> Result<Expression> {
        self.next_token();
        let start = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(Token::Colon) {
            self.next_token();
            self.next_token();
            let end = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(Token::Rbracket)?;
            return Ok(Expression::Slice {
                name,
                start: Box::new(start),
                end: Box::new(end),
            });
        }
        self.expect_peek(Token::Rbracket)?;
        Ok(Expression::Index {
            name,
            index: Box::new(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn assign_statements() {
        let program = get_program(
            r#"
                x = 5;
                y = 2.5
                z = "hi";
            "#,
        );
        assert_eq!(program.statements.len(), 3);
        let cases = vec![
            ("x", Expression::IntegerLiteral(5)),
            ("y", Expression::FloatLiteral(2.5)),
            ("z", Expression::StringLiteral("\"hi\"".to_string())),
        ];
        let mut statements = program.statements.iter();
        for (name, value) in cases {
            let statement = statements.next().unwrap();
            assert_assign_statement(statement, name, value);
        }
    }

    #[test]
    fn return_statements() {
        let program = get_program("return 5; return;");
        assert_eq!(
            program.statements,
            vec![
                Statement::Return(Expression::IntegerLiteral(5)),
                Statement::Return(Expression::IntegerLiteral(0)),
            ]
        );
    }

    #[test]
    fn print_and_read_statements() {
        let program = get_program(r#"read(name); print("hi ", name, "\n"); print();"#);
        assert_eq!(
            program.statements,
            vec![
                Statement::Read("name".to_string()),
                Statement::Print(vec![
                    Expression::StringLiteral("\"hi \"".to_string()),
                    Expression::Identifier("name".to_string()),
                    Expression::StringLiteral("\"\\n\"".to_string()),
                ]),
                Statement::Print(vec![]),
            ]
        );
    }

    #[test]
    fn operator_precedence() {
        let cases = vec![
            ("-a * b", "((-a) * b)"),
            ("not -a", "(not (-a))"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b / c", "((a * b) / c)"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
            ("2 ^ 3 ^ 2", "(2 ^ (3 ^ 2))"),
            ("a * b ^ 2", "(a * (b ^ 2))"),
            ("5 > 4 == 3 < 4", "((5 gt 4) eq (3 lt 4))"),
            ("5 lt 4 neq 3 ge 4", "((5 lt 4) neq (3 ge 4))"),
            ("a or b and c", "(a or (b and c))"),
            ("a eq 1 && b le 2 || c", "(((a eq 1) and (b le 2)) or c)"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("!(true == true)", "(not (true eq true))"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
            (
                "add(a, b, 1, 2 * 3, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), add(6, (7 * 8)))",
            ),
            ("a * s[b * c] * d", "((a * s[(b * c)]) * d)"),
            ("s[1:i + 1] eq t[0]", "(s[1:(i + 1)] eq t[0])"),
            ("len(s) - 1", "(len(s) - 1)"),
        ];
        for (input, expected) in cases {
            let program = get_program(input);
            let expression = match program.statements.first() {
                Some(Statement::Expression(expression)) => expression,
                other => panic!("expected expression statement, found {:?}", other),
            };
            assert_eq!(expression.to_string(), expected);
        }
    }

    #[test]
    fn if_statements() {
        let program = get_program("if (x lt y) { x = 1; } else if (x gt y) { x = 2; } else { x = 3; }");
        let assign = |value| Statement::Assign {
            name: "x".to_string(),
            value: Expression::IntegerLiteral(value),
        };
        let compare = |operator| Expression::Infix {
            left: Box::new(Expression::Identifier("x".to_string())),
            operator,
            right: Box::new(Expression::Identifier("y".to_string())),
        };
        assert_eq!(
            program.statements,
            vec![Statement::If {
                condition: compare(Token::Lt),
                consequence: vec![assign(1)],
                alternative: Some(vec![Statement::If {
                    condition: compare(Token::Gt),
                    consequence: vec![assign(2)],
                    alternative: Some(vec![assign(3)]),
                }]),
            }]
        );
    }

    #[test]
    fn loop_statements() {
        let program = get_program(
            r#"
            while (i lt 3) { i = i + 1; continue; }
            for (i = 0; i lt 10; i = i + 1) { break; }
            "#,
        );
        assert_eq!(program.statements.len(), 2);
        assert_eq!(
            program.statements[0].to_string(),
            "while ((i lt 3)) { i = (i + 1); continue; }"
        );
        match &program.statements[1] {
            Statement::For {
                init,
                condition,
                update,
                body,
            } => {
                assert_assign_statement(init, "i", Expression::IntegerLiteral(0));
                assert_eq!(condition.to_string(), "(i lt 10)");
                assert_eq!(update.to_string(), "i = (i + 1);");
                assert_eq!(body, &vec![Statement::Break]);
            }
            other => panic!("expected for statement, found {other}"),
        }
    }

    #[test]
    fn function_definitions() {
        let cases = vec![
            ("func f() {}", "f", vec![], 0),
            ("func add(x, y) { return x + y; }", "add", vec!["x", "y"], 1),
        ];
        for (input, expected_name, expected_parameters, expected_statements) in cases {
            let program = get_program(input);
            match program.statements.first() {
                Some(Statement::FunctionDef { name, function }) => {
                    assert_eq!(name, expected_name);
                    assert_eq!(function.parameters, expected_parameters);
                    assert_eq!(function.body.len(), expected_statements);
                }
                other => panic!("expected function definition, found {:?}", other),
            }
        }
    }

    #[test]
    fn call_statement() {
        let program = get_program("greet(1, \"a\");");
        assert_eq!(
            program.statements,
            vec![Statement::Expression(Expression::Call {
                function: "greet".to_string(),
                arguments: vec![
                    Expression::IntegerLiteral(1),
                    Expression::StringLiteral("\"a\"".to_string()),
                ],
            })]
        );
    }

    #[test]
    fn parse_errors() {
        let cases = vec![
            ("x = ;", "no prefix parse function for ;"),
            ("if x lt 1 { }", "expected next token to be (, found x"),
            ("while (true) { x = 1;", "expected }, found end of input"),
            ("func (a) { }", "expected identifier, found ("),
            ("func f(1) { }", "expected parameter name, found 1"),
            ("x = 99999999999;", "could not parse integer literal as i32: number too large to fit in target type"),
            ("read(1);", "expected identifier, found 1"),
        ];
        for (input, expected) in cases {
            let lexer = Lexer::new(input);
            let mut parser = Parser::new(lexer);
            match parser.parse_program() {
                Ok(program) => panic!("no error returned for {input}: {program:?}"),
                Err(err) => assert_eq!(err.to_string(), expected),
            }
        }
    }

    fn get_program(input: &str) -> Program {
        let lexer = Lexer::new(input);
        let mut parser = Parser::new(lexer);
        match parser.parse_program() {
            Ok(program) => program,
            Err(err) => panic!("parse_program() returned an error: {}", err),
        }
    }

    fn assert_assign_statement(
        statement: &Statement,
        expected_name: &str,
        expected_value: Expression,
    ) {
        match statement {
            Statement::Assign { name, value } => {
                assert_eq!(name, expected_name);
                assert_eq!(*value, expected_value);
            }
            _ => panic!("expected assign statement, found {statement}"),
        }
    }
}

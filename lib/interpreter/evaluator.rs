use std::{
    io::{self, BufRead, Write},
    rc::Rc,
};

use tracing::debug;

use super::{
    environment::{Binding, Environment},
    error::{EvalError, EvalResult},
    value::{Operands, Value},
};
use crate::{
    ast::{Expression, Program, Statement},
    token::Token,
};

/// How a block finished. Every block evaluation hands this back to its caller
/// so `break`, `continue` and `return` reach the loop or call they belong to.
#[derive(Debug, PartialEq)]
enum Flow {
    Next,
    Break,
    Continue,
    Return(Value),
}

enum Input<'io> {
    Stdin(io::Stdin),
    Reader(Box<dyn BufRead + 'io>),
}

impl Input<'_> {
    fn read_line(&mut self, line: &mut String) -> io::Result<usize> {
        match self {
            Input::Stdin(stdin) => stdin.read_line(line),
            Input::Reader(reader) => reader.read_line(line),
        }
    }
}

pub struct Evaluator<'io> {
    env: Environment,
    input: Input<'io>,
    output: Box<dyn Write + 'io>,
}

impl Evaluator<'static> {
    /// An evaluator wired to the process's stdin and stdout.
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            input: Input::Stdin(io::stdin()),
            output: Box::new(io::stdout()),
        }
    }
}

impl Default for Evaluator<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'io> Evaluator<'io> {
    pub fn with_io(input: impl BufRead + 'io, output: impl Write + 'io) -> Self {
        Self {
            env: Environment::new(),
            input: Input::Reader(Box::new(input)),
            output: Box::new(output),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Runs a program against this evaluator's global scope.
    ///
    /// Returns the value of a top-level `return`, or else the value of the
    /// last top-level expression statement, if any.
    pub fn eval(&mut self, program: &Program) -> EvalResult<Option<Value>> {
        let result = self.eval_program(program);
        self.output.flush()?;
        result
    }

    fn eval_program(&mut self, program: &Program) -> EvalResult<Option<Value>> {
        let mut result = None;
        for statement in &program.statements {
            if let Statement::Expression(expression) = statement {
                result = Some(self.eval_expression(expression)?);
                continue;
            }
            match self.eval_statement(statement)? {
                Flow::Next => {}
                Flow::Return(value) => return Ok(Some(value)),
                Flow::Break => return Err(EvalError::ControlOutsideLoop("break")),
                Flow::Continue => return Err(EvalError::ControlOutsideLoop("continue")),
            }
        }
        Ok(result)
    }

    fn eval_statement(&mut self, statement: &Statement) -> EvalResult<Flow> {
        let flow = match statement {
            Statement::Assign { name, value } => {
                let value = self.eval_expression(value)?;
                self.env.bind(name, value);
                Flow::Next
            }
            Statement::Print(arguments) => {
                self.eval_print_statement(arguments)?;
                Flow::Next
            }
            Statement::Read(name) => {
                self.eval_read_statement(name)?;
                Flow::Next
            }
            Statement::If {
                condition,
                consequence,
                alternative,
            } => {
                if self.eval_condition(condition)? {
                    self.eval_scoped_block(consequence)?
                } else if let Some(alternative) = alternative {
                    self.eval_scoped_block(alternative)?
                } else {
                    Flow::Next
                }
            }
            Statement::While { condition, body } => self.eval_while_statement(condition, body)?,
            Statement::For {
                init,
                condition,
                update,
                body,
            } => self.eval_for_statement(init, condition, update, body)?,
            Statement::FunctionDef { name, function } => {
                self.env.bind_function(name, Rc::clone(function))?;
                debug!(function = %name, parameters = function.parameters.len(), "defined function");
                Flow::Next
            }
            Statement::Return(value) => Flow::Return(self.eval_expression(value)?),
            Statement::Break => Flow::Break,
            Statement::Continue => Flow::Continue,
            Statement::Expression(expression) => {
                self.eval_expression(expression)?;
                Flow::Next
            }
        };
        Ok(flow)
    }

    /// Runs statements in order until one of them signals something other
    /// than `Next`, and hands that signal back.
    fn eval_block(&mut self, statements: &[Statement]) -> EvalResult<Flow> {
        for statement in statements {
            let flow = self.eval_statement(statement)?;
            if flow != Flow::Next {
                return Ok(flow);
            }
        }
        Ok(Flow::Next)
    }

    fn eval_scoped_block(&mut self, statements: &[Statement]) -> EvalResult<Flow> {
        self.env.push_scope();
        let flow = self.eval_block(statements);
        self.env.pop_scope();
        flow
    }

    /// One pass over a loop body in its own scope. `Break` and `Continue`
    /// stop the pass wherever they come from inside the body.
    fn eval_loop_body(&mut self, body: &[Statement]) -> EvalResult<Flow> {
        self.eval_scoped_block(body)
    }

    fn eval_while_statement(
        &mut self,
        condition: &Expression,
        body: &[Statement],
    ) -> EvalResult<Flow> {
        while self.eval_condition(condition)? {
            match self.eval_loop_body(body)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Next | Flow::Continue => {}
            }
        }
        Ok(Flow::Next)
    }

    fn eval_for_statement(
        &mut self,
        init: &Statement,
        condition: &Expression,
        update: &Statement,
        body: &[Statement],
    ) -> EvalResult<Flow> {
        self.eval_statement(init)?;
        while self.eval_condition(condition)? {
            match self.eval_loop_body(body)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Next | Flow::Continue => {}
            }
            self.eval_statement(update)?;
        }
        Ok(Flow::Next)
    }

    fn eval_print_statement(&mut self, arguments: &[Expression]) -> EvalResult<()> {
        for argument in arguments {
            let value = self.eval_expression(argument)?;
            write!(self.output, "{}", value)?;
        }
        Ok(())
    }

    fn eval_read_statement(&mut self, name: &str) -> EvalResult<()> {
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        self.env.bind_string(name, line);
        Ok(())
    }

    fn eval_condition(&mut self, condition: &Expression) -> EvalResult<bool> {
        match self.eval_expression(condition)? {
            Value::Bool(value) => Ok(value),
            other => Err(EvalError::TypeMismatch(format!(
                "condition must be bool, got {}",
                other.type_name()
            ))),
        }
    }

    fn eval_expression(&mut self, expression: &Expression) -> EvalResult<Value> {
        let value = match expression {
            Expression::IntegerLiteral(value) => Value::make_int(*value),
            Expression::FloatLiteral(value) => Value::make_float(*value),
            Expression::StringLiteral(literal) => Value::make_string(literal)?,
            Expression::BooleanLiteral(value) => Value::make_bool(*value),
            Expression::Identifier(name) => self.eval_identifier_expression(name)?,
            Expression::Prefix { operator, right } => {
                let right = self.eval_expression(right)?;
                self.eval_prefix_expression(operator, right)?
            }
            Expression::Infix {
                left,
                operator,
                right,
            } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                self.eval_infix_expression(left, operator, right)?
            }
            Expression::Index { name, index } => {
                let index = self.eval_index_operand(index)?;
                self.eval_index_expression(name, index)?
            }
            Expression::Slice { name, start, end } => {
                let start = self.eval_index_operand(start)?;
                let end = self.eval_index_operand(end)?;
                self.eval_slice_expression(name, start, end)?
            }
            Expression::Length(name) => {
                let length = self.lookup_string(name)?.len();
                Value::make_int(length as i32)
            }
            Expression::Call {
                function,
                arguments,
            } => self.eval_call_expression(function, arguments)?,
        };
        Ok(value)
    }

    fn eval_identifier_expression(&self, name: &str) -> EvalResult<Value> {
        match self.env.lookup(name) {
            Some(Binding::Value(value)) => Ok(value.clone()),
            Some(Binding::Function(_)) => Err(EvalError::TypeMismatch(format!(
                "'{}' is a function, not a value",
                name
            ))),
            None => Err(EvalError::UndefinedVariable(name.to_string())),
        }
    }

    fn eval_prefix_expression(&self, operator: &Token, right: Value) -> EvalResult<Value> {
        match operator {
            Token::Not => match right.truth() {
                Some(truth) => Ok(Value::make_bool(!truth)),
                None => Err(EvalError::TypeMismatch(format!(
                    "{} {}",
                    operator,
                    right.type_name()
                ))),
            },
            Token::Minus => match right {
                Value::Int(value) => Ok(Value::make_int(value.wrapping_neg())),
                Value::Float(value) => Ok(Value::make_float(-value)),
                other => Err(EvalError::TypeMismatch(format!("-{}", other.type_name()))),
            },
            _ => Err(EvalError::UnknownOperator(operator.to_string())),
        }
    }

    fn eval_infix_expression(
        &self,
        left: Value,
        operator: &Token,
        right: Value,
    ) -> EvalResult<Value> {
        match operator {
            Token::Plus | Token::Minus | Token::Asterisk | Token::Slash | Token::Caret => {
                self.eval_arithmetic_expression(left, operator, right)
            }
            Token::And | Token::Or => match (left.truth(), right.truth()) {
                (Some(left), Some(right)) => Ok(Value::make_bool(match operator {
                    Token::And => left && right,
                    _ => left || right,
                })),
                _ => Err(type_mismatch(&left, operator, &right)),
            },
            Token::Eq | Token::NotEq => {
                let equal = self.eval_equality(&left, operator, &right)?;
                Ok(Value::make_bool(match operator {
                    Token::Eq => equal,
                    _ => !equal,
                }))
            }
            Token::Lt | Token::Le | Token::Gt | Token::Ge => {
                self.eval_comparison_expression(left, operator, right)
            }
            _ => Err(EvalError::UnknownOperator(operator.to_string())),
        }
    }

    fn eval_arithmetic_expression(
        &self,
        left: Value,
        operator: &Token,
        right: Value,
    ) -> EvalResult<Value> {
        match Operands::promote(&left, &right) {
            Some(Operands::Int(left, right)) => {
                self.eval_integer_arithmetic(left, operator, right)
            }
            Some(Operands::Float(left, right)) => {
                self.eval_float_arithmetic(left, operator, right)
            }
            None => Err(type_mismatch(&left, operator, &right)),
        }
    }

    fn eval_integer_arithmetic(&self, left: i32, operator: &Token, right: i32) -> EvalResult<Value> {
        let value = match operator {
            Token::Plus => left.wrapping_add(right),
            Token::Minus => left.wrapping_sub(right),
            Token::Asterisk => left.wrapping_mul(right),
            Token::Slash if right == 0 => return Err(EvalError::DivisionByZero),
            Token::Slash => left.wrapping_div(right),
            Token::Caret => integer_power(left, right)?,
            _ => return Err(EvalError::UnknownOperator(operator.to_string())),
        };
        Ok(Value::make_int(value))
    }

    fn eval_float_arithmetic(&self, left: f32, operator: &Token, right: f32) -> EvalResult<Value> {
        let value = match operator {
            Token::Plus => left + right,
            Token::Minus => left - right,
            Token::Asterisk => left * right,
            Token::Slash if right == 0.0 => return Err(EvalError::DivisionByZero),
            Token::Slash => left / right,
            Token::Caret if left == 0.0 && right < 0.0 => {
                return Err(EvalError::DivisionByZero)
            }
            Token::Caret => left.powf(right),
            _ => return Err(EvalError::UnknownOperator(operator.to_string())),
        };
        Ok(Value::make_float(value))
    }

    fn eval_equality(&self, left: &Value, operator: &Token, right: &Value) -> EvalResult<bool> {
        match (left, right) {
            (Value::String(left), Value::String(right)) => Ok(left.as_bytes() == right.as_bytes()),
            _ => match Operands::promote(left, right) {
                Some(Operands::Int(left, right)) => Ok(left == right),
                Some(Operands::Float(left, right)) => Ok(left == right),
                None => Err(type_mismatch(left, operator, right)),
            },
        }
    }

    fn eval_comparison_expression(
        &self,
        left: Value,
        operator: &Token,
        right: Value,
    ) -> EvalResult<Value> {
        let ordering = match Operands::promote(&left, &right) {
            Some(Operands::Int(left, right)) => left.partial_cmp(&right),
            Some(Operands::Float(left, right)) => left.partial_cmp(&right),
            None => return Err(type_mismatch(&left, operator, &right)),
        };
        let result = match ordering {
            Some(ordering) => match operator {
                Token::Lt => ordering.is_lt(),
                Token::Le => ordering.is_le(),
                Token::Gt => ordering.is_gt(),
                Token::Ge => ordering.is_ge(),
                _ => return Err(EvalError::UnknownOperator(operator.to_string())),
            },
            // NaN compares false both ways.
            None => false,
        };
        Ok(Value::make_bool(result))
    }

    fn eval_index_operand(&mut self, index: &Expression) -> EvalResult<i32> {
        match self.eval_expression(index)? {
            Value::Int(value) => Ok(value),
            other => Err(EvalError::TypeMismatch(format!(
                "index must be int, got {}",
                other.type_name()
            ))),
        }
    }

    fn lookup_string(&self, name: &str) -> EvalResult<&str> {
        match self.env.lookup(name) {
            Some(Binding::Value(Value::String(value))) => Ok(value.as_str()),
            Some(Binding::Value(other)) => Err(EvalError::TypeMismatch(format!(
                "'{}' is {}, not a string",
                name,
                other.type_name()
            ))),
            Some(Binding::Function(_)) => Err(EvalError::TypeMismatch(format!(
                "'{}' is a function, not a string",
                name
            ))),
            None => Err(EvalError::UndefinedVariable(name.to_string())),
        }
    }

    fn eval_index_expression(&self, name: &str, index: i32) -> EvalResult<Value> {
        let bytes = self.lookup_string(name)?.as_bytes();
        if index < 0 || index as usize >= bytes.len() {
            return Err(EvalError::IndexOutOfRange {
                name: name.to_string(),
                index,
                length: bytes.len(),
            });
        }
        let index = index as usize;
        Value::make_substring(&bytes[index..=index])
    }

    /// `name[start:end]`, inclusive at both ends.
    fn eval_slice_expression(&self, name: &str, start: i32, end: i32) -> EvalResult<Value> {
        let bytes = self.lookup_string(name)?.as_bytes();
        if start > end {
            return Err(EvalError::InvalidSliceRange {
                name: name.to_string(),
                start,
                end,
            });
        }
        if start < 0 || end as usize >= bytes.len() {
            return Err(EvalError::IndexOutOfRange {
                name: name.to_string(),
                index: if start < 0 { start } else { end },
                length: bytes.len(),
            });
        }
        Value::make_substring(&bytes[start as usize..=end as usize])
    }

    fn eval_call_expression(&mut self, name: &str, arguments: &[Expression]) -> EvalResult<Value> {
        let function = match self.env.lookup(name) {
            Some(Binding::Function(function)) => Rc::clone(function),
            _ => return Err(EvalError::UndefinedFunction(name.to_string())),
        };

        let arguments = arguments
            .iter()
            .map(|argument| self.eval_expression(argument))
            .collect::<EvalResult<Vec<Value>>>()?;

        if function.parameters.len() != arguments.len() {
            return Err(EvalError::WrongArgumentCount {
                name: name.to_string(),
                expected: function.parameters.len(),
                found: arguments.len(),
            });
        }

        debug!(function = %name, depth = self.env.depth(), "calling function");

        self.env.push_scope();
        for (parameter, argument) in function.parameters.iter().zip(arguments) {
            self.env.bind(parameter, argument);
        }
        let flow = self.eval_block(&function.body);
        self.env.pop_scope();

        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Next => Ok(Value::make_int(0)),
            Flow::Break => Err(EvalError::ControlOutsideLoop("break")),
            Flow::Continue => Err(EvalError::ControlOutsideLoop("continue")),
        }
    }
}

fn type_mismatch(left: &Value, operator: &Token, right: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "{} {} {}",
        left.type_name(),
        operator,
        right.type_name()
    ))
}

/// Integer power. A negative exponent gives the truncated reciprocal.
fn integer_power(base: i32, exponent: i32) -> EvalResult<i32> {
    if exponent >= 0 {
        return Ok(base.wrapping_pow(exponent as u32));
    }
    match base {
        0 => Err(EvalError::DivisionByZero),
        1 => Ok(1),
        -1 if exponent % 2 == 0 => Ok(1),
        -1 => Ok(-1),
        _ => Ok(0),
    }
}

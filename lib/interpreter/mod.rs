mod environment;
mod error;
mod evaluator;
mod value;

use std::io::{BufRead, Write};

use anyhow::Result;
pub use environment::{Binding, Environment};
pub use error::{EvalError, EvalResult};
pub use evaluator::Evaluator;
pub use value::{Operands, Value};

use crate::{Engine, Lexer, Parser};

pub fn new_engine() -> Box<dyn Engine> {
    Box::new(EngineImpl {
        evaluator: Evaluator::new(),
    })
}

/// An engine that reads `read(...)` input from `input` and writes program
/// output to `output` instead of the process's stdio.
pub fn new_engine_with_io<'io>(
    input: impl BufRead + 'io,
    output: impl Write + 'io,
) -> Box<dyn Engine + 'io> {
    Box::new(EngineImpl {
        evaluator: Evaluator::with_io(input, output),
    })
}

struct EngineImpl<'io> {
    evaluator: Evaluator<'io>,
}

impl Engine for EngineImpl<'_> {
    fn run(&mut self, source: &str) -> Result<Option<Value>> {
        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer);

        let program = parser.parse_program()?;

        let result = self.evaluator.eval(&program)?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_engine_keeps_state_between_runs() {
        let mut output = Vec::new();
        {
            let mut engine = new_engine_with_io(&b"world\n"[..], &mut output);
            assert_eq!(engine.run("greeting = \"hello\";").unwrap(), None);
            assert_eq!(
                engine.run("read(who); print(greeting, \", \", who);").unwrap(),
                None
            );
            assert_eq!(
                engine.run("len(greeting) + len(who)").unwrap(),
                Some(Value::Int(10))
            );
        }
        assert_eq!(String::from_utf8(output).unwrap(), "hello, world");
    }

    #[test]
    fn test_fizzbuzz_demo() {
        let mut output = Vec::new();
        {
            let mut engine = new_engine_with_io(&b""[..], &mut output);
            engine.run(include_str!("../../demos/fizzbuzz.bz")).unwrap();
        }
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "1 2 Fizz 4 Buzz Fizz 7 8 Fizz Buzz 11 Fizz 13 14 FizzBuzz \nbre has 6 letters\n"
        );
    }

    #[test]
    fn test_engine_reports_parse_and_eval_errors() {
        let mut output = Vec::new();
        let mut engine = new_engine_with_io(&b""[..], &mut output);

        let error = engine.run("x = ;").unwrap_err();
        assert_eq!(error.to_string(), "no prefix parse function for ;");

        let error = engine.run("x = 1 / 0;").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<EvalError>(),
            Some(EvalError::DivisionByZero)
        ));

        assert_eq!(engine.run("2 + 2").unwrap(), Some(Value::Int(4)));
    }
}

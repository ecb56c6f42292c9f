use std::io::{self, Write};

use breeze::new_interpreter;

const PROMPT: &str = "breeze> ";

pub fn start() {
    let mut engine = new_interpreter();

    loop {
        print!("{}", PROMPT);
        if io::stdout().flush().is_err() {
            return;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                println!();
                return;
            }
            Ok(_) => {}
            Err(err) => {
                eprintln!("failed to read line: {}", err);
                return;
            }
        }

        if input.trim().is_empty() {
            continue;
        }

        match engine.run(&input) {
            Ok(Some(value)) => println!("{}", value),
            Ok(None) => {}
            Err(err) => eprintln!("error: {}", err),
        }
    }
}

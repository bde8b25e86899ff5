//! `input`: read one line from the console, optionally printing a prompt.
//!
//! ```text
//! var name = input('name? ')
//! ```
use crate::ast::Value;
use crate::error::{ErrorKind, Result};
use crate::evaluator::Evaluator;
use crate::functions::Builtin;

pub struct Input;

impl Builtin for Input {
    fn call(&self, evaluator: &mut Evaluator, args: Vec<Value>) -> Result<Option<Value>> {
        if args.len() > 1 {
            return Err(ErrorKind::Builtin("input() takes 0 or 1 arguments".into()).into());
        }
        if let Some(prompt) = args.first() {
            evaluator.prompt(&prompt.text);
        }
        let line = evaluator.read_line()?;
        Ok(Some(Value::string(line)))
    }
}

pub fn register(eval: &mut Evaluator) {
    eval.register("input", Input);
}

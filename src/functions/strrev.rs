//! `strrev`: reverse a string.
//!
//! ```text
//! var r = strrev('abc')   # r = 'cba'
//! ```
use crate::ast::Value;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::functions::{expect_arity, expect_string, Builtin};

pub struct Strrev;

impl Builtin for Strrev {
    fn call(&self, _evaluator: &mut Evaluator, args: Vec<Value>) -> Result<Option<Value>> {
        expect_arity("strrev", &args, 1)?;
        let s = expect_string("strrev", &args[0])?;
        Ok(Some(Value::string(s.chars().rev().collect::<String>())))
    }
}

pub fn register(eval: &mut Evaluator) {
    eval.register("strrev", Strrev);
}

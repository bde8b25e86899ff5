//! `atoi` / `itoa`: switch the kind of a value between string and numeric.
//!
//! The text is kept as is; only the kind changes, which decides how
//! comparisons and `++`/`--` treat it afterwards.
//!
//! ```text
//! var n = atoi(line)   # n is numeric, line must hold a number
//! var s = itoa(n)      # s is a string
//! ```
use crate::ast::Value;
use crate::error::{ErrorKind, Result};
use crate::evaluator::Evaluator;
use crate::functions::{expect_arity, Builtin};
use crate::token::is_numeric;

pub struct Atoi;

impl Builtin for Atoi {
    fn call(&self, _evaluator: &mut Evaluator, args: Vec<Value>) -> Result<Option<Value>> {
        expect_arity("atoi", &args, 1)?;
        let text = args[0].text.trim();
        if !is_numeric(text) {
            return Err(ErrorKind::InvalidNumber(text.to_string()).into());
        }
        Ok(Some(Value::numeric(text)))
    }
}

pub struct Itoa;

impl Builtin for Itoa {
    fn call(&self, _evaluator: &mut Evaluator, args: Vec<Value>) -> Result<Option<Value>> {
        expect_arity("itoa", &args, 1)?;
        Ok(Some(Value::string(args[0].text.clone())))
    }
}

pub fn register(eval: &mut Evaluator) {
    eval.register("atoi", Atoi);
    eval.register("itoa", Itoa);
}

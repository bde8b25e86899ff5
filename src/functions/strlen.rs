//! `strlen`: number of characters in a string.
//!
//! ```text
//! var n = strlen('hello')   # n = 5
//! ```
use crate::ast::Value;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::functions::{expect_arity, expect_string, Builtin};

pub struct Strlen;

impl Builtin for Strlen {
    fn call(&self, _evaluator: &mut Evaluator, args: Vec<Value>) -> Result<Option<Value>> {
        expect_arity("strlen", &args, 1)?;
        let s = expect_string("strlen", &args[0])?;
        Ok(Some(Value::numeric(s.chars().count().to_string())))
    }
}

pub fn register(eval: &mut Evaluator) {
    eval.register("strlen", Strlen);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_characters_not_bytes() {
        let mut eval = Evaluator::new();
        let out = Strlen.call(&mut eval, vec![Value::string("héllo")]).unwrap();
        assert_eq!(out, Some(Value::numeric("5")));
    }

    #[test]
    fn rejects_numbers() {
        let mut eval = Evaluator::new();
        assert!(Strlen.call(&mut eval, vec![Value::numeric("12")]).is_err());
        assert!(Strlen.call(&mut eval, vec![]).is_err());
    }
}

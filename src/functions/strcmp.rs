//! `strcmp`: ordinal comparison of two strings.
//!
//! Returns `1` when a > b, `-1` when a < b, `0` when they are equal.
//!
//! ```text
//! var r = strcmp('b', 'a')   # r = 1
//! var r = strcmp('a', 'b')   # r = -1
//! ```
use std::cmp::Ordering;

use crate::ast::Value;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::functions::{expect_arity, expect_string, Builtin};

pub struct Strcmp;

impl Builtin for Strcmp {
    fn call(&self, _evaluator: &mut Evaluator, args: Vec<Value>) -> Result<Option<Value>> {
        expect_arity("strcmp", &args, 2)?;
        let a = expect_string("strcmp", &args[0])?;
        let b = expect_string("strcmp", &args[1])?;

        let result = match a.cmp(b) {
            Ordering::Greater => "1",
            Ordering::Less => "-1",
            Ordering::Equal => "0",
        };
        Ok(Some(Value::numeric(result)))
    }
}

pub fn register(eval: &mut Evaluator) {
    eval.register("strcmp", Strcmp);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_ordinally() {
        let mut eval = Evaluator::new();
        let cmp = |a: &str, b: &str, eval: &mut Evaluator| {
            Strcmp
                .call(eval, vec![Value::string(a), Value::string(b)])
                .unwrap()
                .unwrap()
                .text
        };
        assert_eq!(cmp("b", "a", &mut eval), "1");
        assert_eq!(cmp("B", "a", &mut eval), "-1");
        assert_eq!(cmp("x", "x", &mut eval), "0");
    }
}

use crate::ast::{Value, ValueKind};
use crate::error::{ErrorKind, Result};
use crate::evaluator::Evaluator;

// ---------------------------------------------------------------------------
// Core trait
// ---------------------------------------------------------------------------

/// A function implemented natively instead of with `def`.
///
/// `args` holds the arguments with names already substituted by their values.
///
/// Return `Ok(Some(value))` to hand a result back to `var x = f(...)`.
/// Return `Ok(None)` for a function without a result.
pub trait Builtin {
    fn call(&self, evaluator: &mut Evaluator, args: Vec<Value>) -> Result<Option<Value>>;
}

pub mod input;   // input
pub mod strcmp;  // strcmp
pub mod strconv; // atoi / itoa
pub mod strlen;  // strlen
pub mod strrev;  // strrev

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Register every builtin with the evaluator.
pub fn register_all(eval: &mut Evaluator) {
    input::register(eval);
    strcmp::register(eval);
    strconv::register(eval);
    strlen::register(eval);
    strrev::register(eval);
}

// ---------------------------------------------------------------------------
// Argument checks shared by the builtins
// ---------------------------------------------------------------------------

pub(crate) fn expect_arity(name: &str, args: &[Value], count: usize) -> Result<()> {
    if args.len() != count {
        let plural = if count == 1 { "argument" } else { "arguments" };
        return Err(ErrorKind::Builtin(format!("{}() takes {} {}", name, count, plural)).into());
    }
    Ok(())
}

pub(crate) fn expect_string<'a>(name: &str, value: &'a Value) -> Result<&'a str> {
    if value.kind != ValueKind::Str {
        return Err(ErrorKind::Builtin(format!("{}() takes string arguments", name)).into());
    }
    Ok(&value.text)
}

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

use nebula::fetch::{Fetcher, Response};
use nebula::{assemble, ErrorKind, Evaluator, NebulaError};

pub struct Outcome {
    pub eval: Evaluator,
    pub result: Result<(), NebulaError>,
}

impl Outcome {
    pub fn output(&self) -> Vec<&str> {
        self.eval.output_buffer.iter().map(String::as_str).collect()
    }

    pub fn error(&self) -> &ErrorKind {
        match &self.result {
            Err(e) => &e.kind,
            Ok(()) => panic!("expected the run to fail, output: {:?}", self.output()),
        }
    }

    pub fn assert_ok(&self) {
        if let Err(e) = &self.result {
            panic!("run failed: {} (output: {:?})", e, self.output());
        }
    }
}

/// A fetcher that never reaches anything.
pub fn offline(_endpoint: &str, _method: &str, _timeout_ms: u64) -> Response {
    Response::default()
}

pub fn response(status: u16, body: &str) -> Response {
    Response { body: Some(body.to_string()), status: Some(status) }
}

/// A fetcher answering every request with `status`/`body`, recording the
/// endpoints it was asked for.
pub fn recording(status: u16, body: &str) -> (impl Fetcher, Rc<RefCell<Vec<String>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&calls);
    let body = body.to_string();
    let fetcher = move |endpoint: &str, method: &str, timeout_ms: u64| {
        seen.borrow_mut().push(format!("{} {} {}", method, endpoint, timeout_ms));
        response(status, &body)
    };
    (fetcher, calls)
}

pub fn run(source: &str) -> Outcome {
    run_with(source, offline, "")
}

pub fn run_with_input(source: &str, input: &str) -> Outcome {
    run_with(source, offline, input)
}

pub fn run_with<F: Fetcher + 'static>(source: &str, fetcher: F, input: &str) -> Outcome {
    let mut eval = Evaluator::new()
        .quiet()
        .with_fetcher(fetcher)
        .with_input(Cursor::new(input.to_string()));
    let result = assemble(&mut eval, [("test.neb", source)]).and_then(|program| eval.run(&program));
    Outcome { eval, result }
}

use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::ast::{
    Call, CompareOp, Condition, Operand, OperandKind, Program, Statement, StmtKind, UseMode, Value,
    ValueKind,
};
use crate::config::{Modes, ENTRY_FUNCTION, MAX_CALL_DEPTH, STACK_GROW_SIZE, STACK_RED_ZONE};
use crate::diagnostics::{format_warning, render_stack_trace, Location, Warning};
use crate::error::{ErrorKind, NebulaError, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::functions::{self, Builtin};
use crate::store::SymbolStore;
use crate::token::is_numeric;

/// Outcome of executing one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    /// A `return` ran; the enclosing function stops here.
    Return,
}

/// The runtime context: symbol store, builtin registry, run modes and the
/// I/O the program talks to.
pub struct Evaluator {
    store: SymbolStore,
    builtins: HashMap<String, Arc<dyn Builtin>>,
    modes: Modes,
    /// Current `if`/`for` nesting level.
    depth: usize,
    /// Name of the executing function.
    scope: String,
    /// Callers of the executing function, outermost first.
    call_stack: Vec<String>,
    /// Declared return kind of the executing function.
    returns: Option<ValueKind>,
    return_stack: Vec<Value>,
    last_status: Option<u16>,
    /// Status of the latest fetch per request name.
    request_status: HashMap<String, Option<u16>>,
    /// Requests registered but never fetched, in registration order.
    unfetched: Vec<String>,
    executed: usize,
    location: Location,
    fetcher: Box<dyn Fetcher>,
    input: Box<dyn BufRead>,
    /// Every line the program printed, warnings included.
    pub output_buffer: Vec<String>,
    /// Also write output to stdout.
    echo: bool,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// An evaluator wired to stdin, stdout and the network, with every
    /// builtin registered.
    pub fn new() -> Self {
        let mut eval = Self {
            store: SymbolStore::new(),
            builtins: HashMap::new(),
            modes: Modes::default(),
            depth: 0,
            scope: ENTRY_FUNCTION.to_string(),
            call_stack: Vec::new(),
            returns: None,
            return_stack: Vec::new(),
            last_status: None,
            request_status: HashMap::new(),
            unfetched: Vec::new(),
            executed: 0,
            location: Location::default(),
            fetcher: Box::new(HttpFetcher),
            input: Box::new(io::BufReader::new(io::stdin())),
            output_buffer: Vec::new(),
            echo: true,
        };
        functions::register_all(&mut eval);
        eval
    }

    pub fn with_fetcher<F: Fetcher + 'static>(mut self, fetcher: F) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn with_input<R: BufRead + 'static>(mut self, input: R) -> Self {
        self.input = Box::new(input);
        self
    }

    /// Keep output in `output_buffer` only.
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    // -----------------------------------------------------------------------
    // Builtin registry
    // -----------------------------------------------------------------------

    pub fn register<F: Builtin + 'static>(&mut self, name: &str, func: F) {
        self.builtins.insert(name.to_string(), Arc::new(func));
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn store(&self) -> &SymbolStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SymbolStore {
        &mut self.store
    }

    /// Function that was executing when the run stopped.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn call_stack(&self) -> &[String] {
        &self.call_stack
    }

    /// Render `err` as a trace through the functions active when it was
    /// raised.
    pub fn stack_trace(&self, err: &NebulaError) -> String {
        let file = err
            .location
            .as_ref()
            .map(|loc| loc.file.as_str())
            .unwrap_or(self.location.file.as_str());
        render_stack_trace(&err.to_string(), file, &self.scope, &self.call_stack)
    }

    // -----------------------------------------------------------------------
    // Console I/O
    // -----------------------------------------------------------------------

    fn emit(&mut self, line: String) {
        if self.echo {
            println!("{}", line);
        }
        self.output_buffer.push(line);
    }

    fn warn(&mut self, warning: Warning) {
        if self.modes.warns {
            let line = format_warning(&warning, &self.location);
            self.emit(line);
        }
    }

    /// Print `text` without a newline ahead of a read.
    pub fn prompt(&mut self, text: &str) {
        if self.echo {
            print!("{}", text);
            let _ = io::stdout().flush();
        }
    }

    /// Read one line of input without its line terminator; `""` at end of
    /// input.
    pub fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    // -----------------------------------------------------------------------
    // Program entry
    // -----------------------------------------------------------------------

    /// Execute `Main`.
    ///
    /// On error the evaluator is left as it was when the error was raised,
    /// so [`Evaluator::stack_trace`] still sees the active call chain.
    pub fn run(&mut self, program: &Program) -> Result<()> {
        let main = program
            .function(ENTRY_FUNCTION)
            .ok_or_else(|| ErrorKind::UndeclaredFunction(ENTRY_FUNCTION.to_string()))?;
        if let Some(file) = program.statements.last().map(|s| s.location.file.clone()) {
            self.location.file = file;
        }

        debug!("entering {}", ENTRY_FUNCTION);
        self.scope = ENTRY_FUNCTION.to_string();
        self.returns = None;
        self.store.push_frame();
        self.execute_block(program, &main.body)?;

        self.location = main.location.clone();
        if self.modes.purge_scoped_symbols {
            self.store.scope_cleanup(self.depth);
        }
        for id in std::mem::take(&mut self.unfetched) {
            self.warn(Warning::MissingResCall(id));
        }
        if self.modes.debug {
            for line in self.store.dump() {
                self.emit(line);
            }
        }
        self.store.pop_frame()
    }

    fn execute_block(&mut self, program: &Program, body: &[Statement]) -> Result<Flow> {
        for (i, stmt) in body.iter().enumerate() {
            if self.execute(program, stmt)? == Flow::Return {
                if let Some(next) = body.get(i + 1) {
                    self.location = next.location.clone();
                    self.warn(Warning::UnreachableCode(self.scope.clone()));
                }
                return Ok(Flow::Return);
            }
        }
        Ok(Flow::Next)
    }

    fn execute(&mut self, program: &Program, stmt: &Statement) -> Result<Flow> {
        self.location = stmt.location.clone();
        self.executed += 1;
        trace!(line = stmt.location.line, keyword = stmt.kind.keyword(), "execute");
        // Blocks and calls recurse through here; grow the native stack so the
        // call-depth cap is what stops deep programs.
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.dispatch(program, stmt))
            .map_err(|e| e.at(&stmt.location))
    }

    fn dispatch(&mut self, program: &Program, stmt: &Statement) -> Result<Flow> {
        match &stmt.kind {
            StmtKind::Def(_) => {}
            StmtKind::Var(var) => {
                let value = self.resolve(&var.value)?;
                self.store.declare(&var.target, value, self.depth, var.constant, None)?;
            }
            StmtKind::If(cond) => {
                self.depth += 1;
                let branch = if self.condition(cond)? { &stmt.body } else { &stmt.alt };
                let flow = self.execute_block(program, branch)?;
                self.leave_block();
                return Ok(flow);
            }
            StmtKind::For(cond) => {
                self.depth += 1;
                while self.condition(cond)? {
                    if self.execute_block(program, &stmt.body)? == Flow::Return {
                        self.leave_block();
                        return Ok(Flow::Return);
                    }
                }
                self.leave_block();
            }
            StmtKind::Del { target } => {
                if !self.store.is_request(target, true) && !self.store.exists(target, true) {
                    return Err(ErrorKind::UndeclaredSymbol(target.clone()).into());
                }
            }
            StmtKind::Err { target, reference } => {
                let status = if self.store.is_request(reference, false) {
                    self.request_status.get(reference).copied().flatten()
                } else {
                    self.store.lookup(reference)?.status
                };
                let status = status.ok_or_else(|| ErrorKind::NoStatusCode(reference.clone()))?;
                self.store
                    .declare(target, Value::string(status.to_string()), self.depth, false, None)?;
            }
            StmtKind::Res { target, reference } => self.fetch(target, reference)?,
            StmtKind::Url(url) => {
                let mut url = url.clone();
                if !url.endpoint.contains('.') {
                    let resolved = &self.store.lookup(&url.endpoint)?.value.text;
                    url.endpoint = resolved.chars().filter(|c| !c.is_whitespace()).collect();
                }
                if !url.endpoint.contains("https") {
                    self.warn(Warning::ApiOverHttp);
                }
                debug!(request = %url.target, endpoint = %url.endpoint, "registering request");
                let id = url.target.clone();
                self.store.register_request(&id, url)?;
                self.unfetched.push(id);
            }
            StmtKind::Use(mode) => match mode {
                UseMode::Debug => self.modes.debug = true,
                UseMode::Scope => self.modes.purge_scoped_symbols = true,
                UseMode::Warns => {
                    if self.executed > 2 {
                        return Err(ErrorKind::InvalidUsePosition.into());
                    }
                    self.modes.warns = true;
                }
            },
            StmtKind::Print(operand) => {
                let value = self.resolve(operand)?;
                self.emit(value.text);
            }
            StmtKind::Read { target } => {
                let line = self.read_line()?;
                let value = if is_numeric(line.trim()) {
                    Value::numeric(line.trim())
                } else {
                    Value::string(line)
                };
                self.store.declare(target, value, self.depth, false, None)?;
            }
            StmtKind::Return(operand) => {
                if let Some(operand) = operand {
                    let value = self.resolve(operand)?;
                    if let Some(kind) = self.returns {
                        if value.kind != kind {
                            return Err(
                                ErrorKind::ReturnKindMismatch(self.scope.clone(), kind.to_string()).into()
                            );
                        }
                    }
                    self.return_stack.push(value);
                }
                return Ok(Flow::Return);
            }
            StmtKind::FunctionCall(call) => {
                let mark = self.return_stack.len();
                self.call(program, call)?;
                self.return_stack.truncate(mark);
            }
            StmtKind::FunctionCallWithResult { target, call } => {
                let mark = self.return_stack.len();
                self.call(program, call)?;
                if self.return_stack.len() <= mark {
                    return Err(ErrorKind::AccessVoidResult(call.name.clone()).into());
                }
                let value = self
                    .return_stack
                    .pop()
                    .ok_or_else(|| ErrorKind::AccessVoidResult(call.name.clone()))?;
                self.return_stack.truncate(mark);
                self.store.declare(target, value, self.depth, false, None)?;
            }
            StmtKind::Indexer { target, source, index } => {
                let symbol = self.store.lookup(source)?;
                if symbol.value.kind != ValueKind::Str {
                    return Err(ErrorKind::InvalidArgument(format!("indexer on numeric {}", source)).into());
                }
                let ch = symbol.value.text.chars().nth(*index).ok_or_else(|| {
                    ErrorKind::IndexOutOfRange { name: source.clone(), index: *index }
                })?;
                self.store
                    .declare(target, Value::string(ch.to_string()), self.depth, false, None)?;
            }
            StmtKind::UnaryIncrement { target } => self.step(target, 1.0)?,
            StmtKind::UnaryDecrement { target } => self.step(target, -1.0)?,
            StmtKind::Else { .. } | StmtKind::End => {
                return Err(ErrorKind::Invoke(stmt.kind.keyword().to_string()).into());
            }
        }
        Ok(Flow::Next)
    }

    fn leave_block(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.modes.purge_scoped_symbols {
            self.store.scope_cleanup(self.depth);
        }
    }

    // -----------------------------------------------------------------------
    // Values and conditions
    // -----------------------------------------------------------------------

    /// Substitute a name by its current value; literals pass through.
    fn resolve(&self, operand: &Operand) -> Result<Value> {
        Ok(match operand.kind {
            OperandKind::Name => self.store.lookup(&operand.text)?.value.clone(),
            OperandKind::Numeric => Value::numeric(operand.text.clone()),
            OperandKind::Str => Value::string(operand.text.clone()),
        })
    }

    fn condition(&mut self, cond: &Condition) -> Result<bool> {
        match cond {
            Condition::LastSuccess { negated } => {
                if self.modes.warns && self.last_status.is_none() {
                    return Ok(false);
                }
                Ok((self.last_status == Some(200)) != *negated)
            }
            Condition::Exists { name, negated } => Ok(self.store.exists(name, false) != *negated),
            Condition::Compare { lhs, op, rhs, negated } => {
                let lhs_value = self.resolve(lhs)?;
                let rhs_value = self.resolve(rhs)?;
                if lhs.kind != OperandKind::Name && rhs.kind != OperandKind::Name {
                    self.warn(Warning::ConditionConstants);
                }
                Ok(compare(&lhs_value, *op, &rhs_value)? != *negated)
            }
        }
    }

    fn step(&mut self, target: &str, delta: f64) -> Result<()> {
        let symbol = self.store.lookup(target)?;
        if symbol.value.kind != ValueKind::Numeric {
            return Err(ErrorKind::NotNumeric(target.to_string()).into());
        }
        if symbol.constant {
            return Err(ErrorKind::ConstantModification(target.to_string()).into());
        }
        let n = parse_number(&symbol.value.text)?;
        let depth = symbol.depth;
        self.store
            .declare(target, Value::numeric((n + delta).to_string()), depth, false, None)
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    fn fetch(&mut self, target: &str, reference: &str) -> Result<()> {
        let url = self.store.request(reference)?.clone();
        let response = self.fetcher.fetch(&url.endpoint, &url.method, url.timeout_ms);
        debug!(request = reference, status = ?response.status, "fetched");

        self.last_status = response.status;
        self.request_status.insert(reference.to_string(), response.status);
        self.unfetched.retain(|id| id != reference);

        if response.body.is_none() && self.modes.warns {
            return Err(ErrorKind::ApiRead(url.endpoint).into());
        }
        if response.status != Some(200) {
            self.warn(Warning::StatusNot200(url.endpoint));
        }

        let body = response.body.unwrap_or_default();
        self.store
            .declare(target, Value::string(body), self.depth, false, response.status)
    }

    // -----------------------------------------------------------------------
    // Function calls
    // -----------------------------------------------------------------------

    /// Invoke a builtin or user function. A produced value is left on the
    /// return stack for the caller to take.
    fn call(&mut self, program: &Program, call: &Call) -> Result<()> {
        let args = call
            .args
            .iter()
            .map(|arg| self.resolve(arg))
            .collect::<Result<Vec<_>>>()?;

        if let Some(builtin) = self.builtins.get(&call.name).cloned() {
            trace!(builtin = %call.name, "calling builtin");
            if let Some(value) = builtin.call(self, args)? {
                self.return_stack.push(value);
            }
            return Ok(());
        }

        let params = self.store.signature(&call.name)?.to_vec();
        let func = program
            .function(&call.name)
            .ok_or_else(|| ErrorKind::UndeclaredFunction(call.name.clone()))?;
        if params.len() != args.len() {
            return Err(ErrorKind::ArgCountMismatch(call.name.clone()).into());
        }
        if self.call_stack.len() >= MAX_CALL_DEPTH {
            return Err(ErrorKind::CallDepthExceeded(MAX_CALL_DEPTH).into());
        }
        let returns = match &func.kind {
            StmtKind::Def(def) => def.returns,
            _ => None,
        };

        self.store.push_frame();
        for (param, value) in params.iter().zip(args) {
            self.store.declare(param, value, self.depth, false, None)?;
        }

        debug!(function = %call.name, caller = %self.scope, "entering");
        let caller = std::mem::replace(&mut self.scope, call.name.clone());
        self.call_stack.push(caller);
        let caller_returns = std::mem::replace(&mut self.returns, returns);

        self.execute_block(program, &func.body)?;

        self.returns = caller_returns;
        if let Some(caller) = self.call_stack.pop() {
            self.scope = caller;
        }
        debug!(function = %call.name, "leaving");
        self.store.pop_frame()
    }
}

fn parse_number(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| ErrorKind::InvalidNumber(text.to_string()).into())
}

/// Apply a comparison operator to two values of the same kind.
///
/// `==`/`!=` compare the text. Ordering is ordinal for strings and numeric
/// otherwise.
pub fn compare(lhs: &Value, op: CompareOp, rhs: &Value) -> Result<bool> {
    if lhs.kind != rhs.kind {
        return Err(ErrorKind::KindMismatch.into());
    }

    let ordering = match op {
        CompareOp::Eq => return Ok(lhs.text == rhs.text),
        CompareOp::NotEq => return Ok(lhs.text != rhs.text),
        _ if lhs.kind == ValueKind::Str => lhs.text.cmp(&rhs.text),
        _ => {
            let (l, r) = (parse_number(&lhs.text)?, parse_number(&rhs.text)?);
            l.partial_cmp(&r)
                .ok_or_else(|| ErrorKind::InvalidNumber(format!("{} or {}", lhs.text, rhs.text)))?
        }
    };

    Ok(match op {
        CompareOp::Less => ordering == Ordering::Less,
        CompareOp::LessEq => ordering != Ordering::Greater,
        CompareOp::Greater => ordering == Ordering::Greater,
        CompareOp::GreaterEq => ordering != Ordering::Less,
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::NotEq => ordering != Ordering::Equal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_never_parses_numbers() {
        assert!(compare(&Value::numeric("1"), CompareOp::Eq, &Value::numeric("1")).unwrap());
        assert!(!compare(&Value::numeric("1"), CompareOp::Eq, &Value::numeric("1.0")).unwrap());
        assert!(compare(&Value::string("a"), CompareOp::NotEq, &Value::string("b")).unwrap());
    }

    #[test]
    fn ordering_depends_on_kind() {
        // Numeric: 10 > 9. Ordinal: "10" < "9".
        assert!(compare(&Value::numeric("10"), CompareOp::Greater, &Value::numeric("9")).unwrap());
        assert!(compare(&Value::string("10"), CompareOp::Less, &Value::string("9")).unwrap());
        assert!(compare(&Value::numeric("3"), CompareOp::LessEq, &Value::numeric("3")).unwrap());
        assert!(compare(&Value::string("b"), CompareOp::GreaterEq, &Value::string("a")).unwrap());
    }

    #[test]
    fn kinds_must_match() {
        let err = compare(&Value::numeric("1"), CompareOp::Eq, &Value::string("1")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::KindMismatch));
    }

    #[test]
    fn stack_trace_names_the_failing_function() {
        let mut eval = Evaluator::new().quiet();
        let mut asm = crate::assembler::Assembler::new();
        asm.append_source(
            &mut eval,
            "def Boom():\n print missing\n end\ndef Main():\n Boom()\n end",
            "trace.neb",
        )
        .unwrap();
        let program = asm.finish().unwrap();
        let err = eval.run(&program).unwrap_err();

        assert_eq!(eval.scope(), "Boom");
        assert_eq!(eval.call_stack(), ["Main".to_string()]);
        let trace = eval.stack_trace(&err);
        assert!(trace.starts_with("Stack trace -\nIn source file - trace.neb\n"));
        assert!(trace.contains("Boom() - Error L2 in trace.neb: undeclared symbol - missing."));
        assert!(trace.ends_with("Main()\n"));
    }
}

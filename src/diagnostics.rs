use std::fmt;

/// Source position of a statement: the global line counter and the file it
/// was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub file: String,
}

impl Location {
    pub fn new(line: usize, file: &str) -> Self {
        Self { line, file: file.to_string() }
    }
}

/// Non-fatal conditions, reported only when `use warns` is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The endpoint does not use HTTPS.
    ApiOverHttp,
    /// Both sides of a comparison are literals.
    ConditionConstants,
    /// A `res` call returned a status other than 200.
    StatusNot200(String),
    /// A request was registered but never fetched.
    MissingResCall(String),
    /// Statements follow a `return` in the same block.
    UnreachableCode(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiOverHttp => write!(f, "api may not be accessed over HTTPS"),
            Self::ConditionConstants => {
                write!(f, "condition depends on values that do not change at runtime")
            }
            Self::StatusNot200(endpoint) => write!(f, "error code for {} is not 200", endpoint),
            Self::MissingResCall(name) => write!(f, "missing res call to api endpoint - {}", name),
            Self::UnreachableCode(func) => write!(f, "unreachable code in function - {}", func),
        }
    }
}

/// Render a warning the way it is printed to standard output.
pub fn format_warning(warning: &Warning, location: &Location) -> String {
    format!("Warn L{} in {}: {}.", location.line, location.file, warning)
}

/// Build the stack-style trace printed when a run aborts.
///
/// `scope` is the function that was executing; `callers` is the call stack
/// with the outermost caller first.
pub fn render_stack_trace(err: &str, file: &str, scope: &str, callers: &[String]) -> String {
    let mut out = format!("Stack trace -\nIn source file - {}\n{}() - {}\n", file, scope, err);
    for caller in callers.iter().rev() {
        out.push_str(caller);
        out.push_str("()\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_carries_line_and_file() {
        let loc = Location::new(7, "demo.neb");
        assert_eq!(
            format_warning(&Warning::ApiOverHttp, &loc),
            "Warn L7 in demo.neb: api may not be accessed over HTTPS."
        );
    }

    #[test]
    fn stack_trace_lists_innermost_caller_first() {
        let callers = vec!["Main".to_string(), "Outer".to_string()];
        let trace = render_stack_trace("boom", "a.neb", "Inner", &callers);
        let lines: Vec<&str> = trace.lines().collect();
        assert_eq!(lines[2], "Inner() - boom");
        assert_eq!(lines[3], "Outer()");
        assert_eq!(lines[4], "Main()");
    }
}

use std::collections::HashMap;

use tracing::trace;

use crate::ast::{Url, Value};
use crate::error::{ErrorKind, Result};

/// A declared symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub value: Value,
    /// Block depth at which the symbol was first declared.
    pub depth: usize,
    pub constant: bool,
    /// Status code of the response this symbol was bound from (`res` only).
    pub status: Option<u16>,
}

/// One function activation's namespace.
type Frame = HashMap<String, Symbol>;

/// Symbol registered at `depth` in frame number `frame`, tracked for scope
/// cleanup.
#[derive(Debug, Clone)]
struct ScopeRecord {
    name: String,
    depth: usize,
    frame: usize,
}

/// Call frames, function signatures and pending API requests.
///
/// Lookups only ever consult the top frame: a called function cannot see its
/// caller's symbols.
#[derive(Debug, Default)]
pub struct SymbolStore {
    frames: Vec<Frame>,
    requests: HashMap<String, Url>,
    signatures: HashMap<String, Vec<String>>,
    scope_records: Vec<ScopeRecord>,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Frames
    // -----------------------------------------------------------------------

    pub fn push_frame(&mut self) {
        self.frames.push(Frame::new());
    }

    pub fn pop_frame(&mut self) -> Result<()> {
        if self.frames.pop().is_none() {
            return Err(ErrorKind::Internal("pop_frame with no active frame".into()).into());
        }
        let level = self.frames.len();
        self.scope_records.retain(|r| r.frame < level);
        Ok(())
    }

    fn current(&self) -> Result<&Frame> {
        self.frames
            .last()
            .ok_or_else(|| ErrorKind::Internal("no frames available; push a frame first".into()).into())
    }

    fn current_mut(&mut self) -> Result<&mut Frame> {
        self.frames
            .last_mut()
            .ok_or_else(|| ErrorKind::Internal("no frames available; push a frame first".into()).into())
    }

    // -----------------------------------------------------------------------
    // Symbols
    // -----------------------------------------------------------------------

    /// Register or overwrite `name` in the current frame.
    ///
    /// Overwriting keeps the depth of the first declaration so that a symbol
    /// declared outside a block survives the block's cleanup.
    pub fn declare(
        &mut self,
        name: &str,
        value: Value,
        depth: usize,
        constant: bool,
        status: Option<u16>,
    ) -> Result<()> {
        let frame_level = self.frames.len().saturating_sub(1);
        let frame = self.current_mut()?;

        let (depth, fresh) = match frame.get(name) {
            Some(existing) if existing.constant => {
                return Err(ErrorKind::ConstantModification(name.to_string()).into());
            }
            Some(existing) => (existing.depth, false),
            None => (depth, true),
        };

        frame.insert(name.to_string(), Symbol { value, depth, constant, status });
        // An overwrite is already tracked by its first declaration's record.
        if fresh {
            self.scope_records.push(ScopeRecord { name: name.to_string(), depth, frame: frame_level });
        }
        Ok(())
    }

    /// Fetch a plain symbol from the current frame.
    pub fn lookup(&self, name: &str) -> Result<&Symbol> {
        if self.requests.contains_key(name) {
            return Err(ErrorKind::NotAPlainValue(name.to_string()).into());
        }
        self.current()?
            .get(name)
            .ok_or_else(|| ErrorKind::UndeclaredSymbol(name.to_string()).into())
    }

    /// Whether `name` is declared in the current frame; removes it when
    /// `remove` is set.
    pub fn exists(&mut self, name: &str, remove: bool) -> bool {
        let level = self.frames.len().saturating_sub(1);
        let Some(frame) = self.frames.last_mut() else {
            return false;
        };
        if !remove {
            return frame.contains_key(name);
        }
        if frame.remove(name).is_none() {
            return false;
        }
        self.scope_records.retain(|r| r.frame != level || r.name != name);
        true
    }

    /// Drop every tracked symbol of the current frame declared deeper than
    /// `current_depth`.
    pub fn scope_cleanup(&mut self, current_depth: usize) {
        let level = self.frames.len().saturating_sub(1);
        let Some(frame) = self.frames.last_mut() else {
            return;
        };

        self.scope_records.retain(|record| {
            if record.frame != level || record.depth <= current_depth {
                return true;
            }
            if frame.get(&record.name).is_some_and(|s| s.depth > current_depth) {
                trace!(symbol = %record.name, depth = record.depth, "scope cleanup");
                frame.remove(&record.name);
            }
            false
        });
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    pub fn register_request(&mut self, id: &str, url: Url) -> Result<()> {
        if self.requests.contains_key(id) {
            return Err(ErrorKind::RequestRedeclaration(id.to_string()).into());
        }
        self.requests.insert(id.to_string(), url);
        Ok(())
    }

    pub fn request(&self, id: &str) -> Result<&Url> {
        self.requests
            .get(id)
            .ok_or_else(|| ErrorKind::UnregisteredRequest(id.to_string()).into())
    }

    /// Whether `id` names a pending request; removes it when `remove` is set.
    pub fn is_request(&mut self, id: &str, remove: bool) -> bool {
        if remove {
            self.requests.remove(id).is_some()
        } else {
            self.requests.contains_key(id)
        }
    }

    // -----------------------------------------------------------------------
    // Function signatures
    // -----------------------------------------------------------------------

    pub fn register_signature(&mut self, name: &str, params: Vec<String>) -> Result<()> {
        if self.signatures.contains_key(name) {
            return Err(ErrorKind::FunctionRedeclaration(name.to_string()).into());
        }
        self.signatures.insert(name.to_string(), params);
        Ok(())
    }

    pub fn signature(&self, name: &str) -> Result<&[String]> {
        self.signatures
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ErrorKind::UndeclaredFunction(name.to_string()).into())
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// List pending requests and current-frame symbols, sorted by name.
    pub fn dump(&self) -> Vec<String> {
        let mut requests: Vec<&String> = self.requests.keys().collect();
        requests.sort();
        let mut lines: Vec<String> = requests.into_iter().map(|id| format!("entry: {}", id)).collect();

        if let Some(frame) = self.frames.last() {
            let mut symbols: Vec<(&String, &Symbol)> = frame.iter().collect();
            symbols.sort_by(|a, b| a.0.cmp(b.0));
            for (name, symbol) in symbols {
                lines.push(format!(
                    "entry: {}, {} ({}){}",
                    name,
                    symbol.value.text,
                    symbol.value.kind,
                    if symbol.constant { " const" } else { "" }
                ));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SymbolStore {
        let mut s = SymbolStore::new();
        s.push_frame();
        s
    }

    fn url(endpoint: &str) -> Url {
        Url {
            target: "u".into(),
            endpoint: endpoint.into(),
            method: "GET".into(),
            timeout_ms: 100,
            halt: false,
        }
    }

    #[test]
    fn constants_cannot_be_overwritten() {
        let mut s = store();
        s.declare("k", Value::numeric("1"), 0, true, None).unwrap();
        let err = s.declare("k", Value::numeric("2"), 0, false, None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ConstantModification(_)));
        assert_eq!(s.lookup("k").unwrap().value.text, "1");
    }

    #[test]
    fn redeclaration_keeps_original_depth() {
        let mut s = store();
        s.declare("x", Value::numeric("1"), 0, false, None).unwrap();
        s.declare("x", Value::string("two"), 3, false, None).unwrap();
        let sym = s.lookup("x").unwrap();
        assert_eq!(sym.depth, 0);
        assert_eq!(sym.value, Value::string("two"));
    }

    #[test]
    fn frames_are_isolated() {
        let mut s = store();
        s.declare("x", Value::numeric("1"), 0, false, None).unwrap();
        s.push_frame();
        assert!(matches!(s.lookup("x").unwrap_err().kind, ErrorKind::UndeclaredSymbol(_)));
        s.pop_frame().unwrap();
        assert!(s.lookup("x").is_ok());
    }

    #[test]
    fn lookup_of_a_request_is_not_a_plain_value() {
        let mut s = store();
        s.register_request("u", url("https://x.com")).unwrap();
        assert!(matches!(s.lookup("u").unwrap_err().kind, ErrorKind::NotAPlainValue(_)));
        assert!(matches!(
            s.register_request("u", url("https://y.com")).unwrap_err().kind,
            ErrorKind::RequestRedeclaration(_)
        ));
        assert!(s.is_request("u", true));
        assert!(!s.is_request("u", false));
        assert!(s.request("u").is_err());
    }

    #[test]
    fn exists_can_remove() {
        let mut s = store();
        s.declare("x", Value::numeric("1"), 0, false, None).unwrap();
        assert!(s.exists("x", true));
        assert!(!s.exists("x", false));
    }

    #[test]
    fn scope_cleanup_drops_only_deeper_symbols() {
        let mut s = store();
        s.declare("outer", Value::numeric("1"), 0, false, None).unwrap();
        s.declare("inner", Value::numeric("2"), 1, false, None).unwrap();
        // Re-declared inside the block, still owned by depth 0.
        s.declare("outer", Value::numeric("3"), 1, false, None).unwrap();
        s.scope_cleanup(0);
        assert!(s.exists("outer", false));
        assert!(!s.exists("inner", false));
    }

    #[test]
    fn overwrites_do_not_grow_scope_records() {
        let mut s = store();
        s.declare("i", Value::numeric("0"), 0, false, None).unwrap();
        for n in 1..10_000 {
            s.declare("i", Value::numeric(n.to_string()), 0, false, None).unwrap();
            s.declare("t", Value::numeric("1"), 1, false, None).unwrap();
            s.scope_cleanup(0);
        }
        assert_eq!(s.scope_records.len(), 1);
        assert_eq!(s.lookup("i").unwrap().value.text, "9999");
        assert!(!s.exists("t", false));
    }

    #[test]
    fn removing_a_symbol_drops_its_record() {
        let mut s = store();
        for _ in 0..100 {
            s.declare("x", Value::numeric("1"), 0, false, None).unwrap();
            assert!(s.exists("x", true));
        }
        assert!(s.scope_records.is_empty());
    }

    #[test]
    fn scope_cleanup_ignores_other_frames() {
        let mut s = store();
        s.declare("a", Value::numeric("1"), 0, false, None).unwrap();
        s.push_frame();
        s.declare("a", Value::numeric("2"), 1, false, None).unwrap();
        s.pop_frame().unwrap();
        s.scope_cleanup(0);
        assert_eq!(s.lookup("a").unwrap().value.text, "1");
    }

    #[test]
    fn signatures_are_registered_once() {
        let mut s = SymbolStore::new();
        s.register_signature("F", vec!["a".into()]).unwrap();
        assert_eq!(s.signature("F").unwrap(), ["a".to_string()]);
        assert!(matches!(
            s.register_signature("F", vec![]).unwrap_err().kind,
            ErrorKind::FunctionRedeclaration(_)
        ));
        assert!(matches!(s.signature("G").unwrap_err().kind, ErrorKind::UndeclaredFunction(_)));
    }

    #[test]
    fn dump_lists_requests_then_symbols() {
        let mut s = store();
        s.register_request("u", url("https://x.com")).unwrap();
        s.declare("b", Value::string("hi"), 0, false, None).unwrap();
        s.declare("a", Value::numeric("1"), 0, true, None).unwrap();
        assert_eq!(
            s.dump(),
            vec!["entry: u", "entry: a, 1 (num) const", "entry: b, hi (str)"]
        );
    }
}

use tracing::debug;

use crate::ast::{Program, Statement, StmtKind};
use crate::diagnostics::Location;
use crate::error::{ErrorKind, NebulaError, Result};
use crate::evaluator::Evaluator;
use crate::lexer;
use crate::parser::parse_statement;
use crate::token::{classify, TokenKind};

/// Which child list of an open container receives new statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Body,
    Alt,
}

/// A container statement still waiting for its `end`.
#[derive(Debug)]
struct OpenBlock {
    stmt: Statement,
    branch: Branch,
    /// Opened by `else if`: its `end` also closes the enclosing `if`.
    closes_parent: bool,
}

/// Builds the program tree one tokenized line at a time.
///
/// Open containers are owned by the assembler until their `end` arrives,
/// then moved into their parent (or the top level). Lines are numbered with
/// a single counter across every file fed to the same assembler.
#[derive(Debug, Default)]
pub struct Assembler {
    statements: Vec<Statement>,
    open: Vec<OpenBlock>,
    inside_fn: bool,
    line: usize,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lex and append every line of `source`.
    pub fn append_source(&mut self, ctx: &mut Evaluator, source: &str, file: &str) -> Result<()> {
        for line in source.lines() {
            match lexer::tokenize_line(line) {
                Ok(tokens) => self.append(ctx, &tokens, file)?,
                Err(e) => {
                    self.line += 1;
                    return Err(e.at(&Location::new(self.line, file)));
                }
            }
        }
        Ok(())
    }

    /// Append one tokenized source line. Empty lines only advance the line
    /// counter.
    pub fn append(&mut self, ctx: &mut Evaluator, tokens: &[String], file: &str) -> Result<()> {
        self.line += 1;
        if tokens.is_empty() {
            return Ok(());
        }
        let location = Location::new(self.line, file);
        self.assemble(ctx, tokens, &location).map_err(|e| e.at(&location))
    }

    /// Close assembly and hand over the finished tree.
    pub fn finish(self) -> Result<Program> {
        if let Some(block) = self.open.last() {
            return Err(NebulaError::from(ErrorKind::OpenCodeBlock).at(&block.stmt.location));
        }
        debug!(functions = self.statements.len(), "assembly finished");
        Ok(Program { statements: self.statements })
    }

    fn assemble(&mut self, ctx: &mut Evaluator, tokens: &[String], location: &Location) -> Result<()> {
        let keyword = &tokens[0];
        if classify(keyword) == TokenKind::Comment {
            return Ok(());
        }

        let kind = parse_statement(tokens)?
            .ok_or_else(|| ErrorKind::UnexpectedKeyword(keyword.clone()))?;

        if let StmtKind::Def(def) = &kind {
            if self.inside_fn {
                return Err(ErrorKind::NestedFunction(def.name.clone()).into());
            }
            if ctx.is_builtin(&def.name) {
                return Err(ErrorKind::FunctionRedeclaration(def.name.clone()).into());
            }
            ctx.store_mut().register_signature(&def.name, def.params.clone())?;
            self.inside_fn = true;
        } else if !self.inside_fn {
            return Err(ErrorKind::DanglingStatement(keyword.clone()).into());
        }

        debug!(line = location.line, keyword = kind.keyword(), "assembling");
        match kind {
            StmtKind::Else { chained } => self.open_else(&chained, location),
            StmtKind::End => self.close(),
            kind => {
                let stmt = Statement::new(kind, location.clone());
                if stmt.kind.is_container() {
                    self.open.push(OpenBlock { stmt, branch: Branch::Body, closes_parent: false });
                } else {
                    self.attach(stmt);
                }
                Ok(())
            }
        }
    }

    /// Switch the enclosing `if` to its else-branch; `else if ...` also
    /// opens the chained `if` inside that branch.
    fn open_else(&mut self, chained: &[String], location: &Location) -> Result<()> {
        let unexpected = || ErrorKind::UnexpectedKeyword("else".into());
        let top = self.open.last_mut().ok_or_else(unexpected)?;
        if !matches!(top.stmt.kind, StmtKind::If(_)) || top.branch == Branch::Alt {
            return Err(unexpected().into());
        }
        top.branch = Branch::Alt;

        let Some(first) = chained.first() else {
            return Ok(());
        };
        if classify(first) != TokenKind::If {
            return Err(ErrorKind::Syntax(format!("expecting if after else instead of '{}'", first)).into());
        }
        let kind = parse_statement(chained)?
            .ok_or_else(|| ErrorKind::UnexpectedKeyword(first.clone()))?;
        self.open.push(OpenBlock {
            stmt: Statement::new(kind, location.clone()),
            branch: Branch::Body,
            closes_parent: true,
        });
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut block = self
            .open
            .pop()
            .ok_or_else(|| ErrorKind::UnexpectedKeyword("end".into()))?;

        loop {
            if matches!(block.stmt.kind, StmtKind::Def(_)) {
                self.inside_fn = false;
            }
            let closes_parent = block.closes_parent;
            self.attach(block.stmt);
            if !closes_parent {
                return Ok(());
            }
            block = self
                .open
                .pop()
                .ok_or_else(|| ErrorKind::Internal("else-if chain without an enclosing if".into()))?;
        }
    }

    fn attach(&mut self, stmt: Statement) {
        match self.open.last_mut() {
            Some(top) => match top.branch {
                Branch::Body => top.stmt.body.push(stmt),
                Branch::Alt => top.stmt.alt.push(stmt),
            },
            None => self.statements.push(stmt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Condition;

    fn assemble(source: &str) -> Result<Program> {
        let mut ctx = Evaluator::new();
        let mut asm = Assembler::new();
        asm.append_source(&mut ctx, source, "test.neb")?;
        asm.finish()
    }

    fn keywords(stmts: &[Statement]) -> Vec<&'static str> {
        stmts.iter().map(|s| s.kind.keyword()).collect()
    }

    #[test]
    fn if_else_fills_body_and_alt_in_order() {
        let program = assemble(
            "def Main():\n var x = 1\n if x == 1\n print 'a'\n print 'b'\n else\n print 'c'\n end\n end",
        )
        .unwrap();
        let main = program.function("Main").unwrap();
        assert_eq!(keywords(&main.body), ["var", "if"]);
        let branch = &main.body[1];
        assert_eq!(keywords(&branch.body), ["print", "print"]);
        assert_eq!(keywords(&branch.alt), ["print"]);
    }

    #[test]
    fn else_if_nests_inside_alt_and_shares_the_end() {
        let program = assemble(
            "def Main():\n var x = 2\n if x == 1\n print 'one'\n else if x == 2\n print 'two'\n else\n print 'many'\n end\n print 'after'\n end",
        )
        .unwrap();
        let main = program.function("Main").unwrap();
        assert_eq!(keywords(&main.body), ["var", "if", "print"]);

        let outer = &main.body[1];
        assert_eq!(keywords(&outer.alt), ["if"]);
        let inner = &outer.alt[0];
        assert!(matches!(inner.kind, StmtKind::If(Condition::Compare { .. })));
        assert_eq!(keywords(&inner.body), ["print"]);
        assert_eq!(keywords(&inner.alt), ["print"]);
    }

    #[test]
    fn line_numbers_span_blank_lines_and_files() {
        let mut ctx = Evaluator::new();
        let mut asm = Assembler::new();
        asm.append_source(&mut ctx, "def A():\n\n end", "a.neb").unwrap();
        asm.append_source(&mut ctx, "def Main():\n print 'x'\n end", "b.neb").unwrap();
        let program = asm.finish().unwrap();
        let main = program.function("Main").unwrap();
        assert_eq!(main.location, Location::new(4, "b.neb"));
        assert_eq!(main.body[0].location.line, 5);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let program = assemble("# header\ndef Main():\n\n # inside\n print 'x' # trailing\n end").unwrap();
        assert_eq!(keywords(&program.function("Main").unwrap().body), ["print"]);
    }

    #[test]
    fn statement_outside_a_function_dangles() {
        let err = assemble("var x = 1").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DanglingStatement(_)));
        assert_eq!(err.location, Some(Location::new(1, "test.neb")));
    }

    #[test]
    fn nested_def_is_rejected() {
        let err = assemble("def Main():\n def Inner():\n end\n end").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NestedFunction(ref name) if name == "Inner"));
        assert_eq!(err.location.unwrap().line, 2);
    }

    #[test]
    fn unclosed_block_fails_on_finish() {
        let err = assemble("def Main():\n if success\n print 'x'\n end").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::OpenCodeBlock));
    }

    #[test]
    fn misplaced_else_and_end() {
        let err = assemble("def Main():\n else\n end").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnexpectedKeyword(_)));

        let err = assemble("def Main():\n for x < 3\n else\n end\n end").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnexpectedKeyword(_)));

        let err = assemble("def Main():\n end\n end").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DanglingStatement(_)));
    }

    #[test]
    fn unknown_keyword() {
        let err = assemble("def Main():\n frobnicate x\n end").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnexpectedKeyword(ref k) if k == "frobnicate"));
    }

    #[test]
    fn function_names_are_unique() {
        let err = assemble("def F():\n end\n def F():\n end").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::FunctionRedeclaration(_)));

        let err = assemble("def strlen(s):\n end").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::FunctionRedeclaration(_)));
    }
}

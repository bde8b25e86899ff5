//! Nebula: an interpreter for small API-orchestration scripts.
//!
//! Source files are lexed line by line and fed to an [`Assembler`], which
//! checks block structure and builds a [`Program`] tree. An [`Evaluator`]
//! then runs the tree starting from `Main`.
//!
//! ```text
//! def Main():
//!     api u = { endpoint: 'https://example.com', method: 'GET' }
//!     res body = u::res
//!     if success
//!         print body
//!     end
//! end
//! ```
pub mod assembler;
pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod fetch;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod store;
pub mod token;

pub use assembler::Assembler;
pub use ast::Program;
pub use error::{ErrorKind, NebulaError, Result};
pub use evaluator::Evaluator;

/// Assemble `(file, source)` pairs, in order, into one program.
///
/// Function signatures are registered with `ctx` as they are seen, so the
/// same evaluator must run the result.
pub fn assemble<'a, I>(ctx: &mut Evaluator, sources: I) -> Result<Program>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut assembler = Assembler::new();
    for (file, source) in sources {
        assembler.append_source(ctx, source, file)?;
    }
    assembler.finish()
}

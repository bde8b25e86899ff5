/// Function every program starts executing from.
pub const ENTRY_FUNCTION: &str = "Main";

/// Only files with this extension are fed to the interpreter.
pub const SOURCE_EXTENSION: &str = "neb";

/// Timeout applied to a request that does not declare one.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Nesting limit for user function calls.
pub const MAX_CALL_DEPTH: usize = 255;

/// Remaining native stack below which evaluation switches to a new segment.
pub const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each native stack segment allocated during evaluation.
pub const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Environment variable holding the `tracing` filter for the binary.
pub const LOG_ENV: &str = "NEBULA_LOG";

/// Run modes switched on by `use` statements. All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modes {
    /// `use debug`: dump the symbol store when `Main` finishes.
    pub debug: bool,
    /// `use scope`: drop symbols declared inside a block when it exits.
    pub purge_scoped_symbols: bool,
    /// `use warns`: print warnings and treat unreadable responses as fatal.
    pub warns: bool,
}

//! nolan_script: compiler for Nolan narrative scripts.
//!
//! A script is read line by line; the first two characters of a line say
//! what it is:
//! - `== LABEL [LOC, tag;tag] ...` opens a tape with its initial state
//! - `++ (context)cost[match]->(payload){gain} #TEXT ...` adds a rule
//! - `--`, `---`, `-->` ... write the dialogue route of the rule above
//! - `## NAME text` adds text, `// ...` is a comment
//!
//! Any other non-blank line continues the line before it. The result is one
//! [`Tape`](nolan_data::Tape) per state declaration; see [`compile_script`].

pub mod compiler;
pub mod lines;
pub mod parser;
pub mod registry;
pub mod route;
pub mod text_bank;

pub use compiler::{CompiledScript, FALLBACK_ROUTE, Part, compile_script};
pub use lines::{LineKind, ScriptLine, split_lines};
pub use registry::TagRegistry;
pub use route::{RouteBuilder, RouteKnot, RouteLine};
pub use text_bank::{SequenceKind, TextBank};

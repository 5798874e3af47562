//! Shared data model for Nolan scripts.
//!
//! Everything here is a value: the compiler (`nolan_script`) produces these
//! types and the runtime (`nolan_engine`) consumes them. A compiled [`Tape`]
//! round-trips through serde unchanged.

pub mod error;
pub mod operation;
pub mod route;
pub mod rule;
pub mod state;
pub mod tag;
pub mod tag_set;
pub mod tape;
pub mod text;
pub mod validate;

pub use error::{ErrorKind, Phase, Result, ScriptError};
pub use operation::{Operation, OperationKind};
pub use route::{RouteNode, Stitch};
pub use rule::Rule;
pub use state::{DRAG, LOOP, Location, ONCE, WorldState, is_drag, is_reserved};
pub use tag::{METER_MAX, METER_MIN, Meter, Tag, TagOp};
pub use tag_set::TagSet;
pub use tape::Tape;
pub use text::{LineRange, TextBook, line_key};
pub use validate::{ValidationError, validate_tape};

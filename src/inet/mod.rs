// Interaction nets for the lambda calculus. A term is translated to a net of constructors,
// duplicators and erasers, reduced by local rewrites, then read back.

mod arena;
mod core;
mod gc;
mod rewrite;
mod schedule;
mod session;
mod syntax;

pub use self::arena::{Arena, EdgeId, Handle, NodeId, PortId};
pub use self::core::*;
pub use self::session::*;
pub use self::syntax::*;

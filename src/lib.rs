// Optimal reduction of lambda terms. A term is encoded as an interaction net, the net is rewritten
// until no active pair is left, and the normal form is read back.

pub mod config;
pub mod error;
pub mod inet;
pub mod term;

pub use config::{Config, Strategy};
pub use error::Error;
pub use inet::{show_net, Session, Stats};
pub use term::{from_string, normalize, normalize_with_stats, to_string, Term};

//! CLI commands module.

mod eval;
mod list;
mod query;
mod train;
mod util;

pub use eval::EvalCommand;
pub use list::ListCommand;
pub use query::QueryCommand;
pub use train::TrainCommand;

pub(crate) use util::*;

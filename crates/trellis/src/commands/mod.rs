//! CLI command implementations.

mod check;
mod rebuild;
mod serve;

pub(crate) use check::CheckArgs;
pub(crate) use rebuild::RebuildArgs;
pub(crate) use serve::ServeArgs;

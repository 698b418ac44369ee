//! Command handlers for the granary CLI.

pub(crate) mod limits;
pub(crate) mod run;
pub(crate) mod status;

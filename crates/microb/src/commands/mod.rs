//! CLI command implementations.

pub(crate) mod clean;
pub(crate) mod fetch;
pub(crate) mod import;
pub(crate) mod lines;

pub(crate) use clean::CleanArgs;
pub(crate) use fetch::{FetchArgs, query_key};
pub(crate) use import::ImportArgs;
pub(crate) use lines::{ExtractDomainsArgs, unique_lines};

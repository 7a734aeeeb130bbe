#![forbid(unsafe_code)]

mod ai;
mod args;
mod jsonrpc;
mod runtime;
mod time;
mod wire;

pub(crate) use ai::*;
pub(crate) use args::*;
pub(crate) use jsonrpc::*;
pub(crate) use runtime::*;
pub(crate) use time::*;
pub(crate) use wire::*;

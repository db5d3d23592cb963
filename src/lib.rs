#![allow(warnings)]
#![allow(dead_code)]

#[macro_use]
extern crate num_derive;

#[macro_use]
extern crate lazy_static;

pub mod api;
#[cfg(feature = "bench")]
pub mod bench;

mod def;
mod enc;
mod ipred;
mod itdq;
mod mc;
mod picman;
mod tbl;
mod tracer;
mod util;

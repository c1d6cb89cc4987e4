#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]
#![deny(
    unsafe_code,
    unused_imports,
    unused_variables,
    unused_must_use,
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

#[macro_use]
mod tracing_helpers;

mod node;
pub use node::{Color, Dir, LinkState, Linked, Links, NodeId, clear};

mod root;
pub use root::Root;

mod augment;
pub use augment::{Augment, NoAugment, Summarized, Summary};

mod rotate;
mod insert;
mod erase;

mod traverse;
pub use traverse::{Iter, Postorder, next, next_postorder, prev};

mod replace;

mod verify;
pub use verify::{Violation, verify};

#[cfg(test)]
mod test_support;

//! Library target for the `yakpurger` package.
//!
//! Holds the pieces of the CLI that stand on their own: the [`error::AppError`]
//! type the binary exits with, and [`utils::parse_headers`] for `--header`
//! values, whose usage example runs as a doctest.

#[doc(hidden)]
pub use yakpurger_engine;

pub mod error;
pub mod utils;

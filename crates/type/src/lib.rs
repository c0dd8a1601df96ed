// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! Value types and function signatures shared by the quarry crates.
//!
//! - [`Type`]: the closed set of types an expression can evaluate to
//! - [`SignatureTable`]: function name to ordered overloads, with the built-in table available through
//!   [`SignatureTable::standard`]

pub mod function;
pub mod value;

pub use function::{Signature, SignatureTable};
pub use value::Type;

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Compiles query requests over an object graph into relational statements.
//!
//! A request is a pipeline of [`Token`]s headed by its method (`get`, `count`, `sum`, `delete`,
//! `set`, `insert`, ...). Compilation optimizes the pipeline, follows joins speculatively under
//! rollback points and resolves function overloads against a [`SignatureTable`].

pub use quarry_type::{Signature, SignatureTable, Type};

pub mod analyze;
pub mod compile;
pub mod config;
pub mod context;
pub mod error;
pub mod expression;
pub mod infer;
pub mod optimize;
pub mod parameter;
pub mod resolve;
pub mod statement;
pub mod token;

pub use analyze::{Method, MethodProfile, analyze, top_level_function};
pub use compile::{CompiledStatement, Compiler, Output, Typed, compile};
pub use config::{CompilerConfig, OverloadPolicy};
pub use error::{ErrorKind, QueryError};
pub use optimize::optimize;
pub use parameter::{Argument, Requiredness};
pub use statement::Statement;
pub use token::{Request, Token};

pub type Result<T> = std::result::Result<T, QueryError>;

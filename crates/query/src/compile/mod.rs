// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Compiles a top-level request into a statement.
//!
//! [`Compiler`] holds what stays fixed between compilations. Each call to [`Compiler::compile`]
//! opens a `Session` owning the mutable state of that one compilation; the submodules add the
//! session's methods for pipelines, expressions and functions.

mod expression;
mod function;
mod pipeline;

use std::fmt::{self, Display, Formatter};

use quarry_type::{SignatureTable, Type};
use tracing::instrument;

pub use self::expression::Typed;
use crate::{
	Result,
	config::CompilerConfig,
	context::{ContextManager, Rollback},
	parameter::Argument,
	resolve::{ColumnResolver, PropertyResolver},
	statement::Statement,
	token::Token,
};

/// What executing a compiled statement produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
	/// Rows of the given type.
	List(Option<Type>),
	/// One value of the given type.
	Value(Option<Type>),
	/// Nothing; the statement writes.
	Mutation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
	pub statement: Statement,
	/// Arguments in ordinal order.
	pub parameters: Vec<Argument>,
	pub output: Output,
}

impl Display for CompiledStatement {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.statement)
	}
}

pub struct Compiler<'a> {
	signatures: &'a SignatureTable,
	config: CompilerConfig,
	resolver: &'a dyn PropertyResolver,
}

impl<'a> Compiler<'a> {
	pub fn new(signatures: &'a SignatureTable) -> Self {
		Self {
			signatures,
			config: CompilerConfig::default(),
			resolver: &ColumnResolver,
		}
	}

	pub fn with_config(mut self, config: CompilerConfig) -> Self {
		self.config = config;
		self
	}

	pub fn with_resolver(mut self, resolver: &'a dyn PropertyResolver) -> Self {
		self.resolver = resolver;
		self
	}

	pub fn config(&self) -> &CompilerConfig {
		&self.config
	}

	#[instrument(name = "query::compile", level = "trace", skip_all)]
	pub fn compile(&self, request: &[Token]) -> Result<CompiledStatement> {
		pipeline::compile_request(self, request)
	}
}

/// Compiles `request` with the default configuration and column resolver.
pub fn compile(request: &[Token], signatures: &SignatureTable) -> Result<CompiledStatement> {
	Compiler::new(signatures).compile(request)
}

pub(crate) struct Session<'a> {
	signatures: &'a SignatureTable,
	config: &'a CompilerConfig,
	resolver: &'a dyn PropertyResolver,
	manager: ContextManager,
}

impl<'a> Session<'a> {
	fn new(compiler: &'a Compiler<'_>, manager: ContextManager) -> Self {
		Self {
			signatures: compiler.signatures,
			config: &compiler.config,
			resolver: compiler.resolver,
			manager,
		}
	}
}

impl Rollback for Session<'_> {
	fn manager(&mut self) -> &mut ContextManager {
		&mut self.manager
	}
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::Type;

mod builtin;

static STANDARD: Lazy<SignatureTable> = Lazy::new(builtin::standard);

/// One overload of a function: the argument types it accepts and the type it returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
	pub arguments: Vec<Type>,
	pub returns: Type,
}

impl Signature {
	pub fn new(arguments: impl Into<Vec<Type>>, returns: Type) -> Self {
		Self {
			arguments: arguments.into(),
			returns,
		}
	}

	/// Returns true when every argument slot of this signature equals the type supplied at the
	/// same position. Supplied types beyond the last slot are not looked at; an untyped operand
	/// (`None`) never matches a slot.
	pub fn accepts(&self, supplied: &[Option<Type>]) -> bool {
		if supplied.len() < self.arguments.len() {
			return false;
		}

		self.arguments.iter().zip(supplied).all(|(expected, have)| *have == Some(*expected))
	}
}

impl Display for Signature {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let arguments = self.arguments.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ");
		write!(f, "({}) -> {}", arguments, self.returns)
	}
}

/// Maps a function name onto its overloads, kept in declaration order.
///
/// A table is assembled once and then only read; the compiler never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureTable {
	functions: IndexMap<String, Vec<Signature>>,
}

impl SignatureTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// The built-in overloads, constructed on first use.
	pub fn standard() -> &'static SignatureTable {
		&STANDARD
	}

	/// Appends overloads for `name` after any already declared.
	pub fn with(mut self, name: impl Into<String>, signatures: impl IntoIterator<Item = Signature>) -> Self {
		self.functions.entry(name.into()).or_default().extend(signatures);
		self
	}

	/// All overloads of `name` in declaration order; empty when the function is unknown.
	pub fn signatures_for(&self, name: &str) -> &[Signature] {
		self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
	}

	/// The overload whose argument tuple is exactly `arguments`.
	pub fn signature(&self, name: &str, arguments: &[Type]) -> Option<&Signature> {
		self.signatures_for(name).iter().find(|signature| signature.arguments == arguments)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.functions.contains_key(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.functions.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.functions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.functions.is_empty()
	}
}

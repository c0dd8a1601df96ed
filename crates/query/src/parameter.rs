// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

use indexmap::{IndexMap, IndexSet};
use quarry_type::Type;

/// What happens when the caller supplies no value for a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requiredness {
	/// Compilation succeeds but executing without a value fails.
	Required,
	/// A missing value binds to the zero value of the parameter type.
	DefaultsToZero,
}

/// One bound statement argument. Its position in the binder is its ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Argument {
	Named {
		name: String,
		requiredness: Requiredness,
		ty: Option<Type>,
	},
	/// `begin`
	SliceOffset {
		begin: String,
	},
	/// `end - begin`
	SliceLimit {
		begin: String,
		end: String,
	},
	/// `begin + 1`, positions counted from one.
	SubstringBegin {
		begin: String,
	},
	/// `end - begin`
	SubstringLength {
		begin: String,
		end: String,
	},
}

impl Argument {
	pub fn ty(&self) -> Option<Type> {
		match self {
			Argument::Named {
				ty,
				..
			} => *ty,
			_ => Some(Type::Integer),
		}
	}

	pub fn requiredness(&self) -> Requiredness {
		match self {
			Argument::Named {
				requiredness,
				..
			} => *requiredness,
			_ => Requiredness::Required,
		}
	}
}

impl Display for Argument {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Argument::Named {
				name,
				..
			} => write!(f, ":{}", name),
			Argument::SliceOffset {
				begin,
			} => write!(f, ":{}", begin),
			Argument::SliceLimit {
				begin,
				end,
			}
			| Argument::SubstringLength {
				begin,
				end,
			} => write!(f, ":{} - :{}", end, begin),
			Argument::SubstringBegin {
				begin,
			} => write!(f, ":{} + 1", begin),
		}
	}
}

/// Collects the arguments a statement needs, in first-use order.
///
/// Using the same argument twice yields the same ordinal. The binder is cloned to take a
/// snapshot, so restoring one forgets everything registered after it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBinder {
	types: IndexMap<String, Type>,
	arguments: IndexSet<Argument>,
}

impl ParameterBinder {
	pub fn new() -> Self {
		Self::default()
	}

	/// A binder that tags named arguments with the given inferred types.
	pub fn with_types(types: IndexMap<String, Type>) -> Self {
		Self {
			types,
			arguments: IndexSet::new(),
		}
	}

	pub fn use_argument(&mut self, name: &str, requiredness: Requiredness) -> Option<usize> {
		if !is_identifier(name) {
			return None;
		}

		let ty = self.types.get(name).copied();
		Some(self.bind(Argument::Named {
			name: name.to_string(),
			requiredness,
			ty,
		}))
	}

	pub fn use_slice_offset_argument(&mut self, begin: &str) -> Option<usize> {
		if !is_identifier(begin) {
			return None;
		}
		Some(self.bind(Argument::SliceOffset {
			begin: begin.to_string(),
		}))
	}

	pub fn use_slice_limit_argument(&mut self, begin: &str, end: &str) -> Option<usize> {
		if !is_identifier(begin) || !is_identifier(end) {
			return None;
		}
		Some(self.bind(Argument::SliceLimit {
			begin: begin.to_string(),
			end: end.to_string(),
		}))
	}

	pub fn use_substring_begin_argument(&mut self, begin: &str) -> Option<usize> {
		if !is_identifier(begin) {
			return None;
		}
		Some(self.bind(Argument::SubstringBegin {
			begin: begin.to_string(),
		}))
	}

	pub fn use_substring_end_argument(&mut self, begin: &str, end: &str) -> Option<usize> {
		if !is_identifier(begin) || !is_identifier(end) {
			return None;
		}
		Some(self.bind(Argument::SubstringLength {
			begin: begin.to_string(),
			end: end.to_string(),
		}))
	}

	fn bind(&mut self, argument: Argument) -> usize {
		self.arguments.insert_full(argument).0
	}

	/// The inferred type of the parameter `name`, if any.
	pub fn type_of(&self, name: &str) -> Option<Type> {
		self.types.get(name).copied()
	}

	pub fn arguments(&self) -> impl Iterator<Item = &Argument> {
		self.arguments.iter()
	}

	pub fn into_arguments(self) -> Vec<Argument> {
		self.arguments.into_iter().collect()
	}

	pub fn len(&self) -> usize {
		self.arguments.len()
	}

	pub fn is_empty(&self) -> bool {
		self.arguments.is_empty()
	}
}

fn is_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
		_ => return false,
	}
	chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

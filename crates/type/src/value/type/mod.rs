// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Serialize};

/// All types an expression or property can have
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
	/// A boolean: true or false.
	Boolean,
	/// A signed integer
	Integer,
	/// A floating point number
	Float,
	/// A UTF-8 encoded text.
	String,
	/// An ordered collection of rows
	List,
}

impl Type {
	pub fn is_number(&self) -> bool {
		matches!(self, Type::Integer | Type::Float)
	}

	pub fn is_boolean(&self) -> bool {
		matches!(self, Type::Boolean)
	}

	pub fn is_string(&self) -> bool {
		matches!(self, Type::String)
	}

	pub fn is_list(&self) -> bool {
		matches!(self, Type::List)
	}
}

impl Display for Type {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Type::Boolean => f.write_str("boolean"),
			Type::Integer => f.write_str("integer"),
			Type::Float => f.write_str("float"),
			Type::String => f.write_str("string"),
			Type::List => f.write_str("list"),
		}
	}
}

impl FromStr for Type {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"boolean" | "bool" => Ok(Type::Boolean),
			"integer" | "int" => Ok(Type::Integer),
			"float" => Ok(Type::Float),
			"string" | "text" => Ok(Type::String),
			"list" => Ok(Type::List),
			_ => Err(()),
		}
	}
}

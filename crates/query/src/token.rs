// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

use quarry_type::Type;
use serde::{Deserialize, Serialize};

/// An ordered pipeline of tokens. Order is meaningful.
pub type Request = Vec<Token>;

/// One node of a translated request.
///
/// Tokens are produced upstream and never mutated here; rewrites build new requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Token {
	Function(FunctionToken),
	Value(ValueToken),
	Parameter(ParameterToken),
	Join(JoinToken),
	Table(TableToken),
	AssignmentList(AssignmentListToken),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionToken {
	pub name: String,
	#[serde(default)]
	pub args: Vec<Request>,
}

/// A column of the table reached through the joins preceding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueToken {
	pub table: String,
	pub expression: String,
	#[serde(rename = "type")]
	pub ty: Type,
	#[serde(default)]
	pub has_zero: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterToken {
	pub name: String,
}

/// A relationship edge. `expression` is the join condition; `{parent}` and `{child}` stand for the
/// aliases of the two sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinToken {
	pub table_b: String,
	pub expression: String,
	#[serde(default)]
	pub is_contextual: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableToken {
	pub table: String,
	pub id: String,
	#[serde(default)]
	pub has_zero: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentListToken {
	pub pairs: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
	pub property: Request,
	pub value: Request,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	Function,
	Value,
	Parameter,
	Join,
	Table,
	AssignmentList,
	/// Nothing left in the request.
	End,
}

impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			TokenKind::Function => f.write_str("function"),
			TokenKind::Value => f.write_str("value"),
			TokenKind::Parameter => f.write_str("parameter"),
			TokenKind::Join => f.write_str("join"),
			TokenKind::Table => f.write_str("table"),
			TokenKind::AssignmentList => f.write_str("assignment list"),
			TokenKind::End => f.write_str("end of request"),
		}
	}
}

impl TokenKind {
	pub fn of(token: Option<&Token>) -> TokenKind {
		token.map(Token::kind).unwrap_or(TokenKind::End)
	}
}

impl Token {
	pub fn function(name: impl Into<String>, args: Vec<Request>) -> Self {
		Token::Function(FunctionToken {
			name: name.into(),
			args,
		})
	}

	pub fn value(table: impl Into<String>, expression: impl Into<String>, ty: Type) -> Self {
		Token::Value(ValueToken {
			table: table.into(),
			expression: expression.into(),
			ty,
			has_zero: false,
		})
	}

	pub fn parameter(name: impl Into<String>) -> Self {
		Token::Parameter(ParameterToken {
			name: name.into(),
		})
	}

	pub fn join(table_b: impl Into<String>, expression: impl Into<String>) -> Self {
		Token::Join(JoinToken {
			table_b: table_b.into(),
			expression: expression.into(),
			is_contextual: false,
		})
	}

	pub fn contextual_join(table_b: impl Into<String>, expression: impl Into<String>) -> Self {
		Token::Join(JoinToken {
			table_b: table_b.into(),
			expression: expression.into(),
			is_contextual: true,
		})
	}

	pub fn table(table: impl Into<String>, id: impl Into<String>) -> Self {
		Token::Table(TableToken {
			table: table.into(),
			id: id.into(),
			has_zero: false,
		})
	}

	pub fn assignments(pairs: Vec<Assignment>) -> Self {
		Token::AssignmentList(AssignmentListToken {
			pairs,
		})
	}

	pub fn kind(&self) -> TokenKind {
		match self {
			Token::Function(_) => TokenKind::Function,
			Token::Value(_) => TokenKind::Value,
			Token::Parameter(_) => TokenKind::Parameter,
			Token::Join(_) => TokenKind::Join,
			Token::Table(_) => TokenKind::Table,
			Token::AssignmentList(_) => TokenKind::AssignmentList,
		}
	}

	pub fn as_function(&self) -> Option<&FunctionToken> {
		match self {
			Token::Function(function) => Some(function),
			_ => None,
		}
	}

	pub fn as_parameter(&self) -> Option<&ParameterToken> {
		match self {
			Token::Parameter(parameter) => Some(parameter),
			_ => None,
		}
	}

	/// True when this is a call of `name`, whatever its arguments.
	pub fn is_call(&self, name: &str) -> bool {
		self.as_function().is_some_and(|function| function.name == name)
	}
}

impl FunctionToken {
	pub fn arity(&self) -> usize {
		self.args.len()
	}
}

impl Assignment {
	pub fn new(property: Request, value: Request) -> Self {
		Self {
			property,
			value,
		}
	}
}

/// The parameter name when `request` is exactly one parameter token.
pub fn bare_parameter(request: &[Token]) -> Option<&str> {
	match request {
		[Token::Parameter(parameter)] => Some(parameter.name.as_str()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_deserialize_request() {
		let request: Request = serde_json::from_str(
			r#"[
				{"kind": "table", "table": "people", "id": "id"},
				{"kind": "function", "name": "filter", "args": [[
					{"kind": "function", "name": "equal", "args": [
						[{"kind": "value", "table": "people", "expression": "age", "type": "integer"}],
						[{"kind": "parameter", "name": "minAge"}]
					]}
				]]}
			]"#,
		)
		.unwrap();

		assert_eq!(
			request,
			vec![
				Token::table("people", "id"),
				Token::function(
					"filter",
					vec![vec![Token::function(
						"equal",
						vec![
							vec![Token::value("people", "age", Type::Integer)],
							vec![Token::parameter("minAge")]
						]
					)]]
				),
			]
		);
	}

	#[test]
	fn test_function_without_args_deserializes() {
		let token: Token = serde_json::from_str(r#"{"kind": "function", "name": "fork"}"#).unwrap();
		assert_eq!(token, Token::function("fork", vec![]));
	}

	#[test]
	fn test_kind_of_nothing() {
		assert_eq!(TokenKind::of(None), TokenKind::End);
		assert_eq!(TokenKind::of(Some(&Token::parameter("p"))), TokenKind::Parameter);
	}

	#[test]
	fn test_bare_parameter() {
		assert_eq!(bare_parameter(&[Token::parameter("begin")]), Some("begin"));
		assert_eq!(bare_parameter(&[Token::join("b", "x"), Token::parameter("begin")]), None);
		assert_eq!(bare_parameter(&[]), None);
	}

	#[test]
	fn test_is_call() {
		assert!(Token::function("sort", vec![]).is_call("sort"));
		assert!(!Token::function("rsort", vec![]).is_call("sort"));
		assert!(!Token::parameter("sort").is_call("sort"));
	}
}

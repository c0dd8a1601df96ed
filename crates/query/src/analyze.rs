// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

use crate::{
	Result,
	error::QueryError,
	token::{Token, TokenKind},
};

/// The top-level operation of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	Get,
	Delete,
	Set,
	Insert,
	Count,
	/// Anything else; `sum`, `average`, `min` and `max` are the ones the compiler knows.
	Aggregate,
}

impl Method {
	pub fn classify(name: &str) -> Method {
		match name {
			"get" => Method::Get,
			"delete" => Method::Delete,
			"set" => Method::Set,
			"insert" => Method::Insert,
			"count" => Method::Count,
			_ => Method::Aggregate,
		}
	}

	pub fn is_scalar(&self) -> bool {
		matches!(self, Method::Count | Method::Aggregate)
	}

	pub fn is_write(&self) -> bool {
		matches!(self, Method::Delete | Method::Set | Method::Insert)
	}
}

impl Display for Method {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Method::Get => f.write_str("get"),
			Method::Delete => f.write_str("delete"),
			Method::Set => f.write_str("set"),
			Method::Insert => f.write_str("insert"),
			Method::Count => f.write_str("count"),
			Method::Aggregate => f.write_str("aggregate"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
	Filter,
	/// `sort` or `rsort`
	Sort,
	Slice,
}

impl Operation {
	pub fn of(token: &Token) -> Option<Operation> {
		match token.as_function()?.name.as_str() {
			"filter" => Some(Operation::Filter),
			"sort" | "rsort" => Some(Operation::Sort),
			"slice" => Some(Operation::Slice),
			_ => None,
		}
	}
}

/// What a pipeline does, derived from one snapshot of it.
///
/// Positions are token indices of the first occurrence of each operation. A profile describes
/// exactly the request it was computed from; the optimizer keeps it current through
/// [`MethodProfile::removed`] and [`MethodProfile::inserted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodProfile {
	pub method: Method,
	pub filter: Option<usize>,
	pub sort: Option<usize>,
	pub slice: Option<usize>,
}

impl MethodProfile {
	pub fn position(&self, operation: Operation) -> Option<usize> {
		match operation {
			Operation::Filter => self.filter,
			Operation::Sort => self.sort,
			Operation::Slice => self.slice,
		}
	}

	fn position_mut(&mut self, operation: Operation) -> &mut Option<usize> {
		match operation {
			Operation::Filter => &mut self.filter,
			Operation::Sort => &mut self.sort,
			Operation::Slice => &mut self.slice,
		}
	}

	pub fn has(&self, operation: Operation) -> bool {
		self.position(operation).is_some()
	}

	/// True when both operations are present and the first `a` sits later in the pipeline than
	/// the first `b`.
	pub fn occurs_after(&self, a: Operation, b: Operation) -> bool {
		match (self.position(a), self.position(b)) {
			(Some(a), Some(b)) => a > b,
			_ => false,
		}
	}

	/// Accounts for the token at `index` having been removed from `request`, which is the request
	/// after the removal.
	pub fn removed(&mut self, index: usize, request: &[Token]) {
		for operation in [Operation::Filter, Operation::Sort, Operation::Slice] {
			let slot = self.position_mut(operation);
			match *slot {
				Some(position) if position > index => *slot = Some(position - 1),
				Some(position) if position == index => {
					*slot = request[index..]
						.iter()
						.position(|token| Operation::of(token) == Some(operation))
						.map(|offset| index + offset);
				}
				_ => {}
			}
		}
	}

	/// Accounts for `token` having been inserted at `index`.
	pub fn inserted(&mut self, index: usize, token: &Token) {
		for operation in [Operation::Filter, Operation::Sort, Operation::Slice] {
			let slot = self.position_mut(operation);
			if let Some(position) = *slot {
				if position >= index {
					*slot = Some(position + 1);
				}
			}
		}

		if let Some(operation) = Operation::of(token) {
			let slot = self.position_mut(operation);
			if slot.is_none_or(|position| index < position) {
				*slot = Some(index);
			}
		}
	}
}

/// Classifies `name` and locates the first filter, sort and slice among the top-level tokens.
pub fn analyze(name: &str, request: &[Token]) -> MethodProfile {
	let mut profile = MethodProfile {
		method: Method::classify(name),
		filter: None,
		sort: None,
		slice: None,
	};

	for (index, token) in request.iter().enumerate() {
		if let Some(operation) = Operation::of(token) {
			profile.position_mut(operation).get_or_insert(index);
		}
	}

	profile
}

/// The name of the function heading a top-level request.
pub fn top_level_function(request: &[Token]) -> Result<&str> {
	match request.first() {
		None => Err(QueryError::EmptyRequest),
		Some(Token::Function(function)) => Ok(function.name.as_str()),
		Some(token) => Err(QueryError::ExpectedFunction {
			found: token.kind(),
		}),
	}
}

#[cfg(test)]
mod tests {
	use quarry_type::Type;

	use super::*;
	use crate::error::ErrorKind;

	fn sort() -> Token {
		Token::function("sort", vec![vec![Token::value("people", "name", Type::String)]])
	}

	fn filter() -> Token {
		Token::function("filter", vec![vec![Token::value("people", "active", Type::Boolean)]])
	}

	fn slice() -> Token {
		Token::function("slice", vec![vec![Token::parameter("begin")], vec![Token::parameter("end")]])
	}

	mod classify {
		use super::*;

		#[test]
		fn test_known_methods() {
			assert_eq!(Method::classify("get"), Method::Get);
			assert_eq!(Method::classify("delete"), Method::Delete);
			assert_eq!(Method::classify("set"), Method::Set);
			assert_eq!(Method::classify("insert"), Method::Insert);
			assert_eq!(Method::classify("count"), Method::Count);
		}

		#[test]
		fn test_everything_else_is_aggregate() {
			assert_eq!(Method::classify("sum"), Method::Aggregate);
			assert_eq!(Method::classify("median"), Method::Aggregate);
		}
	}

	mod profile {
		use super::*;

		#[test]
		fn test_first_positions() {
			let request = vec![Token::table("people", "id"), filter(), sort(), filter(), slice()];
			let profile = analyze("get", &request);

			assert_eq!(profile.filter, Some(1));
			assert_eq!(profile.sort, Some(2));
			assert_eq!(profile.slice, Some(4));
		}

		#[test]
		fn test_rsort_counts_as_sort() {
			let rsort = Token::function("rsort", vec![vec![Token::value("people", "age", Type::Integer)]]);
			let profile = analyze("get", &[Token::table("people", "id"), rsort]);
			assert_eq!(profile.sort, Some(1));
		}

		#[test]
		fn test_occurs_after_is_literal_index_comparison() {
			let profile = analyze("get", &[sort(), filter()]);
			assert!(profile.occurs_after(Operation::Filter, Operation::Sort));
			assert!(!profile.occurs_after(Operation::Sort, Operation::Filter));
		}

		#[test]
		fn test_occurs_after_needs_both() {
			let profile = analyze("get", &[sort()]);
			assert!(!profile.occurs_after(Operation::Sort, Operation::Slice));
			assert!(!profile.occurs_after(Operation::Slice, Operation::Sort));
		}

		#[test]
		fn test_removed_rescans_for_next_occurrence() {
			let mut request = vec![sort(), filter(), sort()];
			let mut profile = analyze("get", &request);

			request.remove(0);
			profile.removed(0, &request);

			assert_eq!(profile, analyze("get", &request));
		}

		#[test]
		fn test_inserted_shifts_positions() {
			let mut request = vec![Token::table("people", "id"), slice()];
			let mut profile = analyze("get", &request);

			request.insert(1, sort());
			profile.inserted(1, &request[1]);

			assert_eq!(profile, analyze("get", &request));
		}
	}

	mod top_level {
		use super::*;

		#[test]
		fn test_empty() {
			let err = top_level_function(&[]).unwrap_err();
			assert_eq!(err, QueryError::EmptyRequest);
			assert_eq!(err.kind(), ErrorKind::MalformedRequest);
		}

		#[test]
		fn test_not_a_function() {
			let err = top_level_function(&[Token::parameter("p")]).unwrap_err();
			assert_eq!(
				err,
				QueryError::ExpectedFunction {
					found: TokenKind::Parameter
				}
			);
		}

		#[test]
		fn test_name() {
			assert_eq!(top_level_function(&[Token::function("count", vec![vec![]])]).unwrap(), "count");
		}
	}
}

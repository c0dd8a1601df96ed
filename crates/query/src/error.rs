// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

use quarry_type::Type;

use crate::token::TokenKind;

/// The class of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// The request has a shape the compiler does not accept.
	MalformedRequest,
	/// An operand, property or parameter could not be compiled.
	UnresolvableExpression,
	/// No overload accepts the operand types.
	OverloadMismatch,
	/// Savepoints were left on the rollback stack. Always a compiler bug.
	RollbackDiscipline,
}

impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ErrorKind::MalformedRequest => f.write_str("malformed request"),
			ErrorKind::UnresolvableExpression => f.write_str("unresolvable expression"),
			ErrorKind::OverloadMismatch => f.write_str("overload mismatch"),
			ErrorKind::RollbackDiscipline => f.write_str("rollback discipline"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
	#[error("request is empty")]
	EmptyRequest,

	#[error("expected a function call at the head of the request, found {found}")]
	ExpectedFunction {
		found: TokenKind,
	},

	#[error("expected a table at the head of the pipeline, found {found}")]
	ExpectedTable {
		found: TokenKind,
	},

	#[error("unknown function `{name}` with {arity} argument(s)")]
	UnknownFunction {
		name: String,
		arity: usize,
	},

	#[error("function `{name}` expects {expected} argument(s), got {actual}")]
	ArityMismatch {
		name: String,
		expected: usize,
		actual: usize,
	},

	#[error("filter requires an argument")]
	MissingFilterArgument,

	#[error("argument {position} of `{name}` must be a parameter, found {found}")]
	ExpectedParameter {
		name: String,
		position: usize,
		found: TokenKind,
	},

	#[error("`{stage}` cannot follow `{previous}`")]
	UnexpectedStage {
		stage: String,
		previous: String,
	},

	#[error("`{method}` does not accept a `{stage}` stage")]
	UnsupportedStage {
		method: String,
		stage: String,
	},

	#[error("a forked request cannot be forked again")]
	NestedFork,

	#[error("{found} cannot be compiled as {role}")]
	UnsupportedToken {
		found: TokenKind,
		role: &'static str,
	},

	#[error("empty expression")]
	EmptyExpression,

	#[error("parameter `{name}` cannot be bound")]
	UnboundParameter {
		name: String,
	},

	#[error("property `{column}` of `{table}` cannot be resolved")]
	UnresolvedProperty {
		table: String,
		column: String,
	},

	#[error("expected a {expected} expression, found {actual}")]
	TypeMismatch {
		expected: Type,
		actual: Type,
	},

	#[error("no overload of `{name}` accepts ({arguments})")]
	OverloadMismatch {
		name: String,
		arguments: String,
	},

	#[error("{depth} rollback point(s) left unreleased")]
	RollbackDiscipline {
		depth: usize,
	},
}

impl QueryError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			QueryError::EmptyRequest
			| QueryError::ExpectedFunction {
				..
			}
			| QueryError::ExpectedTable {
				..
			}
			| QueryError::UnknownFunction {
				..
			}
			| QueryError::ArityMismatch {
				..
			}
			| QueryError::MissingFilterArgument
			| QueryError::ExpectedParameter {
				..
			}
			| QueryError::UnexpectedStage {
				..
			}
			| QueryError::UnsupportedStage {
				..
			}
			| QueryError::NestedFork
			| QueryError::UnsupportedToken {
				..
			} => ErrorKind::MalformedRequest,
			QueryError::EmptyExpression
			| QueryError::UnboundParameter {
				..
			}
			| QueryError::UnresolvedProperty {
				..
			}
			| QueryError::TypeMismatch {
				..
			} => ErrorKind::UnresolvableExpression,
			QueryError::OverloadMismatch {
				..
			} => ErrorKind::OverloadMismatch,
			QueryError::RollbackDiscipline {
				..
			} => ErrorKind::RollbackDiscipline,
		}
	}

	/// Stable diagnostic code of the error.
	pub fn code(&self) -> &'static str {
		match self {
			QueryError::EmptyRequest => "QUERY_001",
			QueryError::ExpectedFunction {
				..
			} => "QUERY_002",
			QueryError::ExpectedTable {
				..
			} => "QUERY_003",
			QueryError::UnknownFunction {
				..
			} => "QUERY_004",
			QueryError::ArityMismatch {
				..
			} => "QUERY_005",
			QueryError::MissingFilterArgument => "QUERY_006",
			QueryError::ExpectedParameter {
				..
			} => "QUERY_007",
			QueryError::UnexpectedStage {
				..
			} => "QUERY_008",
			QueryError::UnsupportedStage {
				..
			} => "QUERY_009",
			QueryError::NestedFork => "QUERY_010",
			QueryError::UnsupportedToken {
				..
			} => "QUERY_011",
			QueryError::EmptyExpression => "QUERY_020",
			QueryError::UnboundParameter {
				..
			} => "QUERY_021",
			QueryError::UnresolvedProperty {
				..
			} => "QUERY_022",
			QueryError::TypeMismatch {
				..
			} => "QUERY_023",
			QueryError::OverloadMismatch {
				..
			} => "QUERY_030",
			QueryError::RollbackDiscipline {
				..
			} => "QUERY_099",
		}
	}

	pub(crate) fn unknown_function(name: &str, arity: usize) -> Self {
		QueryError::UnknownFunction {
			name: name.to_string(),
			arity,
		}
	}

	pub(crate) fn arity(name: &str, expected: usize, actual: usize) -> Self {
		QueryError::ArityMismatch {
			name: name.to_string(),
			expected,
			actual,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_unknown_function_names_the_function() {
		let err = QueryError::unknown_function("foo", 1);
		assert_eq!(err.kind(), ErrorKind::MalformedRequest);
		assert_eq!(err.to_string(), "unknown function `foo` with 1 argument(s)");
	}

	#[test]
	fn test_kinds() {
		assert_eq!(QueryError::EmptyRequest.kind(), ErrorKind::MalformedRequest);
		assert_eq!(
			QueryError::UnboundParameter {
				name: "x".to_string()
			}
			.kind(),
			ErrorKind::UnresolvableExpression
		);
		assert_eq!(
			QueryError::OverloadMismatch {
				name: "plus".to_string(),
				arguments: "string, integer".to_string()
			}
			.kind(),
			ErrorKind::OverloadMismatch
		);
		assert_eq!(
			QueryError::RollbackDiscipline {
				depth: 1
			}
			.kind(),
			ErrorKind::RollbackDiscipline
		);
	}

	#[test]
	fn test_codes_are_unique() {
		let errors = [
			QueryError::EmptyRequest,
			QueryError::MissingFilterArgument,
			QueryError::NestedFork,
			QueryError::EmptyExpression,
			QueryError::unknown_function("foo", 1),
			QueryError::arity("slice", 2, 3),
		];
		let mut codes = errors.iter().map(QueryError::code).collect::<Vec<_>>();
		codes.sort();
		codes.dedup();
		assert_eq!(codes.len(), errors.len());
	}
}

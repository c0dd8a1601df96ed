// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::Type;
use tracing::instrument;

use super::Session;
use crate::{
	Result,
	context::Savepoint,
	error::QueryError,
	expression::Expression,
	parameter::Requiredness,
	statement::Context,
	token::Token,
};

/// A compiled expression and its type, when known.
#[derive(Debug, Clone, PartialEq)]
pub struct Typed {
	pub expression: Expression,
	pub ty: Option<Type>,
}

impl Typed {
	pub fn new(expression: Expression, ty: Option<Type>) -> Self {
		Self {
			expression,
			ty,
		}
	}
}

impl Session<'_> {
	/// Compiles `tokens` at `context`. Leading joins are followed under a savepoint, so a failure
	/// leaves the builder and binder as they were before the call.
	#[instrument(level = "trace", skip_all, fields(context = ?context))]
	pub(crate) fn compile_expression(
		&mut self,
		context: Option<Context>,
		tokens: &[Token],
		requiredness: Requiredness,
	) -> Result<Typed> {
		let Some((head, rest)) = tokens.split_first() else {
			return Err(QueryError::EmptyExpression);
		};

		if let Token::Join(join) = head {
			let mut savepoint = Savepoint::new(self, context);
			let next = savepoint.manager.handle_join(context, join);
			let result = savepoint.compile_expression(Some(next), rest, requiredness);
			return savepoint.finish(result);
		}

		if let Some(next) = rest.first() {
			return Err(QueryError::UnsupportedToken {
				found: next.kind(),
				role: "the continuation of an expression",
			});
		}

		match head {
			Token::Parameter(parameter) => {
				let binder = self.manager.binder_mut();
				let ordinal = binder.use_argument(&parameter.name, requiredness).ok_or_else(|| {
					QueryError::UnboundParameter {
						name: parameter.name.clone(),
					}
				})?;
				Ok(Typed::new(Expression::Parameter(ordinal), binder.type_of(&parameter.name)))
			}
			Token::Value(value) => {
				let (expression, ty) = self.resolver.resolve_property(value, context, self.manager.contextual())?;
				Ok(Typed::new(expression, Some(ty)))
			}
			Token::Function(function) => self.compile_function(context, function, requiredness),
			token => Err(QueryError::UnsupportedToken {
				found: token.kind(),
				role: "an expression",
			}),
		}
	}

	/// Compiles a leading single-argument `filter` into the predicate and returns what follows it.
	/// Any other request comes back unchanged.
	pub(crate) fn extract_leading_filter<'r>(
		&mut self,
		context: Option<Context>,
		request: &'r [Token],
	) -> Result<&'r [Token]> {
		let Some(Token::Function(function)) = request.first() else {
			return Ok(request);
		};
		if function.name != "filter" {
			return Ok(request);
		}

		match function.args.as_slice() {
			[] => Err(QueryError::MissingFilterArgument),
			[argument] => {
				let predicate = self.compile_predicate(context, argument)?;
				self.manager.builder_mut().set_where(predicate);
				Ok(&request[1..])
			}
			_ => Ok(request),
		}
	}

	/// Compiles a required boolean expression.
	pub(crate) fn compile_predicate(&mut self, context: Option<Context>, tokens: &[Token]) -> Result<Expression> {
		let typed = self.compile_expression(context, tokens, Requiredness::Required)?;
		match typed.ty {
			Some(ty) if ty != Type::Boolean => Err(QueryError::TypeMismatch {
				expected: Type::Boolean,
				actual: ty,
			}),
			_ => Ok(typed.expression),
		}
	}
}

#[cfg(test)]
mod tests {
	use quarry_type::SignatureTable;

	use super::*;
	use crate::{
		compile::Compiler,
		context::ContextManager,
		parameter::ParameterBinder,
		statement::QueryBuilder,
		token::TableToken,
	};

	fn with_session<R>(f: impl FnOnce(&mut Session<'_>) -> R) -> R {
		let compiler = Compiler::new(SignatureTable::standard());
		let manager = ContextManager::new(QueryBuilder::new("people"), ParameterBinder::new());
		let mut session = Session::new(&compiler, manager);
		f(&mut session)
	}

	fn age() -> Token {
		Token::value("cities", "population", Type::Integer)
	}

	#[test]
	fn test_empty_expression() {
		with_session(|session| {
			let err = session.compile_expression(None, &[], Requiredness::Required).unwrap_err();
			assert_eq!(err, QueryError::EmptyExpression);
		});
	}

	#[test]
	fn test_parameter() {
		with_session(|session| {
			let typed =
				session.compile_expression(None, &[Token::parameter("p")], Requiredness::DefaultsToZero).unwrap();
			assert_eq!(typed, Typed::new(Expression::Parameter(0), None));
			assert_eq!(session.manager.binder().arguments().next().unwrap().requiredness(), Requiredness::DefaultsToZero);
		});
	}

	#[test]
	fn test_join_then_value() {
		with_session(|session| {
			let tokens = [Token::join("cities", "{parent}.city = {child}.id"), age()];
			let typed = session.compile_expression(None, &tokens, Requiredness::Required).unwrap();

			assert_eq!(typed.expression.to_string(), "t1.population");
			assert_eq!(typed.ty, Some(Type::Integer));
			assert_eq!(session.manager.depth(), 0);
		});
	}

	#[test]
	fn test_failed_join_leaves_no_residue() {
		with_session(|session| {
			let tokens = [
				Token::join("cities", "{parent}.city = {child}.id"),
				Token::function("foo", vec![vec![Token::parameter("p")]]),
			];
			let before = session.manager.builder().clone();

			let err = session.compile_expression(None, &tokens, Requiredness::Required).unwrap_err();

			assert_eq!(err, QueryError::unknown_function("foo", 1));
			assert_eq!(session.manager.builder(), &before);
			assert!(session.manager.binder().is_empty());
			assert_eq!(session.manager.depth(), 0);
		});
	}

	#[test]
	fn test_table_is_not_an_expression() {
		with_session(|session| {
			let table = Token::Table(TableToken {
				table: "people".to_string(),
				id: "id".to_string(),
				has_zero: false,
			});
			let err = session.compile_expression(None, &[table], Requiredness::Required).unwrap_err();
			assert!(matches!(err, QueryError::UnsupportedToken { .. }));
		});
	}

	mod leading_filter {
		use super::*;

		#[test]
		fn test_extracted() {
			with_session(|session| {
				let filter = Token::function("filter", vec![vec![Token::value("people", "active", Type::Boolean)]]);
				let sort = Token::function("sort", vec![vec![age()]]);
				let request = [filter, sort.clone()];

				let rest = session.extract_leading_filter(None, &request).unwrap();

				assert_eq!(rest, &[sort]);
				assert_eq!(session.manager.builder().main().filter, Some(Expression::column(None, "active")));
			});
		}

		#[test]
		fn test_missing_argument() {
			with_session(|session| {
				let request = [Token::function("filter", vec![])];
				assert_eq!(session.extract_leading_filter(None, &request), Err(QueryError::MissingFilterArgument));
			});
		}

		#[test]
		fn test_other_head_is_unchanged() {
			with_session(|session| {
				let request = [Token::function("sort", vec![vec![age()]])];
				assert_eq!(session.extract_leading_filter(None, &request).unwrap(), &request);
				assert!(session.manager.builder().main().filter.is_none());
			});
		}

		#[test]
		fn test_non_boolean_predicate() {
			with_session(|session| {
				let request = [Token::function("filter", vec![vec![Token::value("people", "name", Type::String)]])];
				assert_eq!(
					session.extract_leading_filter(None, &request),
					Err(QueryError::TypeMismatch {
						expected: Type::Boolean,
						actual: Type::String
					})
				);
			});
		}
	}
}

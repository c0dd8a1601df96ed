// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::Type;
use tracing::debug;

use super::{Session, Typed};
use crate::{
	Result,
	config::OverloadPolicy,
	error::QueryError,
	expression::{BinaryOperator, Expression, UnaryOperator},
	parameter::Requiredness,
	statement::Context,
	token::{FunctionToken, Token, TokenKind, bare_parameter},
};

enum Binary {
	Operator(BinaryOperator),
	NotEqual,
}

fn binary(name: &str) -> Option<Binary> {
	let operator = match name {
		"plus" => BinaryOperator::Plus,
		"minus" => BinaryOperator::Minus,
		"times" => BinaryOperator::Times,
		"divides" => BinaryOperator::Divides,
		"and" => BinaryOperator::And,
		"or" => BinaryOperator::Or,
		"equal" => BinaryOperator::Equal,
		"less" => BinaryOperator::Less,
		"lessEqual" => BinaryOperator::LessEqual,
		"greater" => BinaryOperator::Greater,
		"greaterEqual" => BinaryOperator::GreaterEqual,
		"match" => BinaryOperator::RegexpBinary,
		"notEqual" => return Some(Binary::NotEqual),
		_ => return None,
	};
	Some(Binary::Operator(operator))
}

impl Session<'_> {
	pub(crate) fn compile_function(
		&mut self,
		context: Option<Context>,
		function: &FunctionToken,
		requiredness: Requiredness,
	) -> Result<Typed> {
		let name = function.name.as_str();
		match function.args.as_slice() {
			[operand] => self.compile_unary(context, name, operand, requiredness),
			[left, right] => self.compile_binary(context, name, left, right, requiredness),
			[string, begin, end] => self.compile_ternary(context, name, string, begin, end),
			arguments => Err(QueryError::unknown_function(name, arguments.len())),
		}
	}

	fn compile_unary(
		&mut self,
		context: Option<Context>,
		name: &str,
		operand: &[Token],
		requiredness: Requiredness,
	) -> Result<Typed> {
		let operator = match name {
			"length" => {
				let operand = self.compile_expression(context, operand, Requiredness::Required)?;
				return Ok(Typed::new(
					Expression::unary(UnaryOperator::CharLength, operand.expression),
					Some(Type::Integer),
				));
			}
			"uppercase" => UnaryOperator::Upper,
			"lowercase" => UnaryOperator::Lower,
			"not" => UnaryOperator::Not,
			_ => return Err(QueryError::unknown_function(name, 1)),
		};

		let operand = self.compile_expression(context, operand, requiredness)?;
		let ty = self.resolve_return_type(name, &[operand.ty])?;
		Ok(Typed::new(Expression::unary(operator, operand.expression), ty))
	}

	fn compile_binary(
		&mut self,
		context: Option<Context>,
		name: &str,
		left: &[Token],
		right: &[Token],
		requiredness: Requiredness,
	) -> Result<Typed> {
		let Some(operator) = binary(name) else {
			return Err(QueryError::unknown_function(name, 2));
		};

		let left = self.compile_expression(context, left, requiredness)?;
		let right = self.compile_expression(context, right, requiredness)?;
		let ty = self.resolve_return_type(name, &[left.ty, right.ty])?;

		let expression = match operator {
			Binary::Operator(BinaryOperator::Plus) if left.ty == Some(Type::String) => {
				Expression::binary(BinaryOperator::Concat, left.expression, right.expression)
			}
			Binary::Operator(operator) => Expression::binary(operator, left.expression, right.expression),
			Binary::NotEqual => {
				Expression::not(Expression::binary(BinaryOperator::Equal, left.expression, right.expression))
			}
		};
		Ok(Typed::new(expression, ty))
	}

	fn compile_ternary(
		&mut self,
		context: Option<Context>,
		name: &str,
		string: &[Token],
		begin: &[Token],
		end: &[Token],
	) -> Result<Typed> {
		if name != "substring" {
			return Err(QueryError::unknown_function(name, 3));
		}

		let string = self.compile_expression(context, string, Requiredness::Required)?;
		let begin = bound(name, 1, begin)?;
		let end = bound(name, 2, end)?;

		let binder = self.manager.binder_mut();
		let start = binder.use_substring_begin_argument(begin).ok_or_else(|| QueryError::UnboundParameter {
			name: begin.to_string(),
		})?;
		let length = binder.use_substring_end_argument(begin, end).ok_or_else(|| QueryError::UnboundParameter {
			name: end.to_string(),
		})?;

		Ok(Typed::new(
			Expression::Substring {
				string: Box::new(string.expression),
				begin: Box::new(Expression::Parameter(start)),
				length: Box::new(Expression::Parameter(length)),
			},
			Some(Type::String),
		))
	}

	/// The return type of the first overload of `name` accepting `arguments`.
	///
	/// Without a match the tolerant policy answers with the first declared overload and the strict
	/// policy fails. A function with no overloads at all has no known type.
	pub(crate) fn resolve_return_type(&self, name: &str, arguments: &[Option<Type>]) -> Result<Option<Type>> {
		let overloads = self.signatures.signatures_for(name);
		if let Some(signature) = overloads.iter().find(|signature| signature.accepts(arguments)) {
			return Ok(Some(signature.returns));
		}

		match (self.config.overload_policy, overloads.first()) {
			(OverloadPolicy::Tolerant, Some(first)) => {
				debug!(
					function = %name,
					arguments = %describe(arguments),
					returns = %first.returns,
					"No overload matched, using the first"
				);
				Ok(Some(first.returns))
			}
			(OverloadPolicy::Tolerant, None) => Ok(None),
			(OverloadPolicy::Strict, _) => Err(QueryError::OverloadMismatch {
				name: name.to_string(),
				arguments: describe(arguments),
			}),
		}
	}
}

/// The parameter name a slice or substring bound must consist of.
pub(super) fn bound<'t>(function: &str, position: usize, tokens: &'t [Token]) -> Result<&'t str> {
	bare_parameter(tokens).ok_or_else(|| QueryError::ExpectedParameter {
		name: function.to_string(),
		position,
		found: TokenKind::of(tokens.first()),
	})
}

fn describe(arguments: &[Option<Type>]) -> String {
	arguments
		.iter()
		.map(|ty| match ty {
			Some(ty) => ty.to_string(),
			None => "untyped".to_string(),
		})
		.collect::<Vec<_>>()
		.join(", ")
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{self, Display, Formatter};

use crate::statement::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
	Not,
	Upper,
	Lower,
	CharLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
	Plus,
	Concat,
	Minus,
	Times,
	Divides,
	Equal,
	And,
	Or,
	Less,
	LessEqual,
	Greater,
	GreaterEqual,
	RegexpBinary,
}

impl Display for BinaryOperator {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			BinaryOperator::Plus => "+",
			BinaryOperator::Concat => "CONCAT",
			BinaryOperator::Minus => "-",
			BinaryOperator::Times => "*",
			BinaryOperator::Divides => "/",
			BinaryOperator::Equal => "=",
			BinaryOperator::And => "AND",
			BinaryOperator::Or => "OR",
			BinaryOperator::Less => "<",
			BinaryOperator::LessEqual => "<=",
			BinaryOperator::Greater => ">",
			BinaryOperator::GreaterEqual => ">=",
			BinaryOperator::RegexpBinary => "REGEXP BINARY",
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
	Count,
	Sum,
	Average,
	Min,
	Max,
}

impl AggregateFunction {
	pub fn from_name(name: &str) -> Option<AggregateFunction> {
		match name {
			"count" => Some(AggregateFunction::Count),
			"sum" => Some(AggregateFunction::Sum),
			"average" => Some(AggregateFunction::Average),
			"min" => Some(AggregateFunction::Min),
			"max" => Some(AggregateFunction::Max),
			_ => None,
		}
	}
}

/// A compiled expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
	/// A column of the table at `context`; the root table when there is no context.
	Column {
		context: Option<Context>,
		name: String,
	},
	/// A reference to the statement argument with this ordinal.
	Parameter(usize),
	Unary {
		operator: UnaryOperator,
		operand: Box<Expression>,
	},
	Binary {
		operator: BinaryOperator,
		left: Box<Expression>,
		right: Box<Expression>,
	},
	Substring {
		string: Box<Expression>,
		begin: Box<Expression>,
		length: Box<Expression>,
	},
	/// `None` as argument counts rows.
	Aggregate {
		function: AggregateFunction,
		argument: Option<Box<Expression>>,
	},
	/// A column projected out of the derived table of a forked select.
	DerivedColumn(String),
}

impl Expression {
	pub fn column(context: Option<Context>, name: impl Into<String>) -> Self {
		Expression::Column {
			context,
			name: name.into(),
		}
	}

	pub fn unary(operator: UnaryOperator, operand: Expression) -> Self {
		Expression::Unary {
			operator,
			operand: Box::new(operand),
		}
	}

	pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Self {
		Expression::Binary {
			operator,
			left: Box::new(left),
			right: Box::new(right),
		}
	}

	pub fn not(operand: Expression) -> Self {
		Expression::unary(UnaryOperator::Not, operand)
	}

	pub fn and(left: Expression, right: Expression) -> Self {
		Expression::binary(BinaryOperator::And, left, right)
	}

	pub fn count() -> Self {
		Expression::Aggregate {
			function: AggregateFunction::Count,
			argument: None,
		}
	}

	pub fn aggregate(function: AggregateFunction, argument: Expression) -> Self {
		Expression::Aggregate {
			function,
			argument: Some(Box::new(argument)),
		}
	}

	fn is_compound(&self) -> bool {
		matches!(self, Expression::Binary { .. })
	}

	/// Rebuilds the tree with every column replaced by `f(column)`.
	pub fn map_columns<F>(self, f: &mut F) -> Expression
	where
		F: FnMut(Option<Context>, String) -> Expression,
	{
		match self {
			Expression::Column {
				context,
				name,
			} => f(context, name),
			Expression::Unary {
				operator,
				operand,
			} => Expression::unary(operator, operand.map_columns(f)),
			Expression::Binary {
				operator,
				left,
				right,
			} => {
				let left = left.map_columns(f);
				Expression::binary(operator, left, right.map_columns(f))
			}
			Expression::Substring {
				string,
				begin,
				length,
			} => Expression::Substring {
				string: Box::new(string.map_columns(f)),
				begin: Box::new(begin.map_columns(f)),
				length: Box::new(length.map_columns(f)),
			},
			Expression::Aggregate {
				function,
				argument,
			} => Expression::Aggregate {
				function,
				argument: argument.map(|argument| Box::new(argument.map_columns(f))),
			},
			expression @ (Expression::Parameter(_) | Expression::DerivedColumn(_)) => expression,
		}
	}
}

struct Operand<'a>(&'a Expression);

impl Display for Operand<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if self.0.is_compound() {
			write!(f, "({})", self.0)
		} else {
			write!(f, "{}", self.0)
		}
	}
}

impl Display for Expression {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Expression::Column {
				context: None,
				name,
			} => f.write_str(name),
			Expression::Column {
				context: Some(context),
				name,
			} => write!(f, "{}.{}", context, name),
			Expression::Parameter(_) => f.write_str("?"),
			Expression::Unary {
				operator,
				operand,
			} => match operator {
				UnaryOperator::Not => write!(f, "NOT {}", Operand(operand)),
				UnaryOperator::Upper => write!(f, "UPPER({})", operand),
				UnaryOperator::Lower => write!(f, "LOWER({})", operand),
				UnaryOperator::CharLength => write!(f, "CHAR_LENGTH({})", operand),
			},
			Expression::Binary {
				operator: BinaryOperator::Concat,
				left,
				right,
			} => write!(f, "CONCAT({}, {})", left, right),
			Expression::Binary {
				operator,
				left,
				right,
			} => write!(f, "{} {} {}", Operand(left), operator, Operand(right)),
			Expression::Substring {
				string,
				begin,
				length,
			} => write!(f, "SUBSTRING({} FROM {} FOR {})", string, begin, length),
			Expression::Aggregate {
				function,
				argument,
			} => {
				let name = match function {
					AggregateFunction::Count => "COUNT",
					AggregateFunction::Sum => "SUM",
					AggregateFunction::Average => "AVG",
					AggregateFunction::Min => "MIN",
					AggregateFunction::Max => "MAX",
				};
				match argument {
					Some(argument) => write!(f, "{}({})", name, argument),
					None => write!(f, "{}(*)", name),
				}
			}
			Expression::DerivedColumn(name) => f.write_str(name),
		}
	}
}

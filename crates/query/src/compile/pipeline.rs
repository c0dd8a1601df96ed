// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use quarry_type::Type;
use tracing::debug;

use super::{CompiledStatement, Compiler, Output, Session, function::bound};
use crate::{
	Result,
	analyze::{Method, top_level_function},
	context::ContextManager,
	error::QueryError,
	expression::{AggregateFunction, Expression},
	infer::infer_parameter_types,
	optimize::optimize,
	parameter::{ParameterBinder, Requiredness},
	statement::{Assignment, Context, QueryBuilder, Statement},
	token::{AssignmentListToken, FunctionToken, Request, Token, TokenKind},
};

/// Where a stage sits in a canonical pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
	Filter,
	Sort,
	Slice,
	Fork,
}

/// The statement a top-level method produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
	Get,
	Count,
	Aggregate(AggregateFunction),
	Delete,
	Set,
	Insert,
}

impl Terminal {
	fn of(method: &FunctionToken) -> Result<Terminal> {
		let name = method.name.as_str();
		let terminal = match Method::classify(name) {
			Method::Get => Terminal::Get,
			Method::Count => Terminal::Count,
			Method::Delete => Terminal::Delete,
			Method::Set => Terminal::Set,
			Method::Insert => Terminal::Insert,
			Method::Aggregate => match AggregateFunction::from_name(name) {
				Some(function) if function != AggregateFunction::Count => Terminal::Aggregate(function),
				_ => return Err(QueryError::unknown_function(name, method.arity())),
			},
		};

		let expected = match terminal {
			Terminal::Count | Terminal::Delete => 1,
			_ => 2,
		};
		if method.arity() != expected {
			return Err(QueryError::arity(name, expected, method.arity()));
		}
		Ok(terminal)
	}
}

pub(super) fn compile_request(compiler: &Compiler<'_>, request: &[Token]) -> Result<CompiledStatement> {
	let name = top_level_function(request)?;
	let Some(Token::Function(method)) = request.first() else {
		return Err(QueryError::ExpectedFunction {
			found: TokenKind::of(request.first()),
		});
	};
	let terminal = Terminal::of(method)?;
	debug!(method = %name, "Compiling request");

	let types = if compiler.config.infer_parameter_types {
		infer_parameter_types(request, compiler.signatures)
	} else {
		IndexMap::new()
	};

	if terminal == Terminal::Insert {
		return compile_insert(compiler, method, types);
	}

	let pipeline = optimize(name, &method.args[0]);
	let Some((Token::Table(table), rest)) = pipeline.split_first() else {
		return Err(QueryError::ExpectedTable {
			found: TokenKind::of(pipeline.first()),
		});
	};

	let manager = ContextManager::new(QueryBuilder::new(table.table.as_str()), ParameterBinder::with_types(types));
	let mut session = Session::new(compiler, manager);

	let mut context = None;
	let mut rest = rest;
	while let Some((Token::Join(join), tail)) = rest.split_first() {
		context = Some(session.manager.handle_join(context, join));
		rest = tail;
	}

	let rest = session.extract_leading_filter(context, rest)?;
	session.compile_stages(Method::classify(name), name, context, rest)?;

	let output = match terminal {
		Terminal::Get => {
			let projection = session.compile_expression(context, &method.args[1], Requiredness::Required)?;
			session.manager.builder_mut().add_projection(projection.expression);
			Output::List(projection.ty)
		}
		Terminal::Count => {
			let builder = session.manager.builder_mut();
			if builder.is_forked() {
				builder.expose(None, table.id.clone());
			}
			builder.add_projection(Expression::count());
			Output::Value(Some(Type::Integer))
		}
		Terminal::Aggregate(function) => {
			let argument = session.compile_expression(context, &method.args[1], Requiredness::Required)?;
			let ty = session.resolve_return_type(name, &[argument.ty])?;

			let builder = session.manager.builder_mut();
			let expression = argument.expression.map_columns(&mut |context, column| builder.expose(context, column));
			builder.add_projection(Expression::aggregate(function, expression));
			Output::Value(ty)
		}
		Terminal::Delete | Terminal::Set | Terminal::Insert => Output::Mutation,
	};

	let assignments = match terminal {
		Terminal::Set => session.compile_assignments(context, assignment_list(method)?)?,
		_ => Vec::new(),
	};

	let (builder, binder) = session.manager.finish()?;
	let (select, derived) = builder.into_parts();
	let statement = match terminal {
		Terminal::Delete => Statement::Delete {
			select,
		},
		Terminal::Set => Statement::Update {
			select,
			assignments,
		},
		_ => Statement::Select {
			select,
			derived,
		},
	};

	Ok(CompiledStatement {
		statement,
		parameters: binder.into_arguments(),
		output,
	})
}

fn compile_insert(
	compiler: &Compiler<'_>,
	method: &FunctionToken,
	types: IndexMap<String, Type>,
) -> Result<CompiledStatement> {
	let table = match method.args[0].as_slice() {
		[Token::Table(table)] => table,
		[Token::Table(_), stage, ..] => {
			return Err(QueryError::UnsupportedStage {
				method: method.name.clone(),
				stage: stage_name(stage),
			});
		}
		tokens => {
			return Err(QueryError::ExpectedTable {
				found: TokenKind::of(tokens.first()),
			});
		}
	};

	let manager = ContextManager::new(QueryBuilder::new(table.table.as_str()), ParameterBinder::with_types(types));
	let mut session = Session::new(compiler, manager);
	let assignments = session.compile_assignments(None, assignment_list(method)?)?;

	let (_, binder) = session.manager.finish()?;
	Ok(CompiledStatement {
		statement: Statement::Insert {
			table: table.table.clone(),
			assignments,
		},
		parameters: binder.into_arguments(),
		output: Output::Mutation,
	})
}

fn assignment_list(method: &FunctionToken) -> Result<&AssignmentListToken> {
	match method.args.get(1).map(Request::as_slice) {
		Some([Token::AssignmentList(list)]) => Ok(list),
		other => Err(QueryError::UnsupportedToken {
			found: TokenKind::of(other.and_then(<[Token]>::first)),
			role: "the assignments of a write",
		}),
	}
}

fn stage_name(token: &Token) -> String {
	match token {
		Token::Function(function) => function.name.clone(),
		token => token.kind().to_string(),
	}
}

impl Session<'_> {
	/// Consumes the stages left after the leading filter, in canonical order.
	fn compile_stages(&mut self, method: Method, name: &str, context: Option<Context>, stages: &[Token]) -> Result<()> {
		let mut reached = (Phase::Filter, "filter".to_string());

		for stage in stages {
			let Token::Function(function) = stage else {
				return Err(QueryError::UnsupportedToken {
					found: stage.kind(),
					role: "a pipeline stage",
				});
			};

			let phase = match function.name.as_str() {
				"filter" => Phase::Filter,
				"sort" | "rsort" => Phase::Sort,
				"slice" => Phase::Slice,
				"fork" => Phase::Fork,
				other => return Err(QueryError::unknown_function(other, function.arity())),
			};
			if phase < reached.0 || (phase == reached.0 && phase >= Phase::Slice) {
				return Err(QueryError::UnexpectedStage {
					stage: function.name.clone(),
					previous: reached.1,
				});
			}
			reached = (phase, function.name.clone());

			match phase {
				Phase::Filter => {
					let [argument] = function.args.as_slice() else {
						return Err(QueryError::arity("filter", 1, function.arity()));
					};
					let predicate = self.compile_predicate(context, argument)?;
					self.manager.builder_mut().and_where(predicate);
				}
				Phase::Sort => {
					let [argument] = function.args.as_slice() else {
						return Err(QueryError::arity(&function.name, 1, function.arity()));
					};
					let order = self.compile_expression(context, argument, Requiredness::Required)?;
					self.manager.builder_mut().add_order(order.expression, function.name == "rsort");
				}
				Phase::Slice => {
					let [begin, end] = function.args.as_slice() else {
						return Err(QueryError::arity("slice", 2, function.arity()));
					};
					let begin = bound("slice", 0, begin)?;
					let end = bound("slice", 1, end)?;

					let binder = self.manager.binder_mut();
					let offset = binder.use_slice_offset_argument(begin).ok_or_else(|| QueryError::UnboundParameter {
						name: begin.to_string(),
					})?;
					let count = binder.use_slice_limit_argument(begin, end).ok_or_else(|| QueryError::UnboundParameter {
						name: end.to_string(),
					})?;
					self.manager.builder_mut().set_limit(Expression::Parameter(offset), Expression::Parameter(count));
				}
				Phase::Fork => {
					if !method.is_scalar() {
						return Err(QueryError::UnsupportedStage {
							method: name.to_string(),
							stage: function.name.clone(),
						});
					}
					if function.arity() != 0 {
						return Err(QueryError::arity("fork", 0, function.arity()));
					}
					self.manager.builder_mut().fork()?;
				}
			}
		}
		Ok(())
	}

	/// Compiles `column = value` pairs. Each property must be a plain column of the written table.
	fn compile_assignments(&mut self, context: Option<Context>, list: &AssignmentListToken) -> Result<Vec<Assignment>> {
		let mut assignments = Vec::with_capacity(list.pairs.len());

		for pair in &list.pairs {
			let property = match pair.property.as_slice() {
				[Token::Value(property)] => property,
				tokens => {
					return Err(QueryError::UnsupportedToken {
						found: TokenKind::of(tokens.first()),
						role: "an assigned property",
					});
				}
			};
			let (column, ty) = self.resolver.resolve_property(property, None, None)?;
			let Expression::Column {
				context: None,
				name: column,
			} = column
			else {
				return Err(QueryError::UnresolvedProperty {
					table: property.table.clone(),
					column: property.expression.clone(),
				});
			};

			let requiredness = if property.has_zero {
				Requiredness::DefaultsToZero
			} else {
				Requiredness::Required
			};
			let value = self.compile_expression(context, &pair.value, requiredness)?;
			self.resolve_return_type("assign", &[Some(ty), value.ty])?;

			assignments.push(Assignment {
				column,
				value: value.expression,
			});
		}
		Ok(assignments)
	}
}

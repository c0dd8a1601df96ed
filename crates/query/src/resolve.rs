// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_type::Type;

use crate::{
	Result,
	context::ContextualJoin,
	error::QueryError,
	expression::Expression,
	statement::Context,
	token::ValueToken,
};

/// Turns a property token into a column expression.
pub trait PropertyResolver {
	fn resolve_property(
		&self,
		token: &ValueToken,
		context: Option<Context>,
		contextual: Option<&ContextualJoin>,
	) -> Result<(Expression, Type)>;
}

/// Resolves a property to the column named by its expression at the current context.
///
/// A property read at the root of an expression whose table is the one reached by the ambient
/// contextual join is read at that join instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnResolver;

impl PropertyResolver for ColumnResolver {
	fn resolve_property(
		&self,
		token: &ValueToken,
		context: Option<Context>,
		contextual: Option<&ContextualJoin>,
	) -> Result<(Expression, Type)> {
		if token.expression.trim().is_empty() {
			return Err(QueryError::UnresolvedProperty {
				table: token.table.clone(),
				column: token.expression.clone(),
			});
		}

		let context = match (context, contextual) {
			(None, Some(contextual)) if contextual.join.table_b == token.table => Some(contextual.context),
			(context, _) => context,
		};

		Ok((Expression::column(context, token.expression.as_str()), token.ty))
	}
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::{
	Result,
	error::QueryError,
	parameter::ParameterBinder,
	statement::{Context, QueryBuilder},
	token::JoinToken,
};

/// The join most recently followed with the contextual flag, and where it led.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextualJoin {
	pub join: JoinToken,
	pub context: Context,
}

#[derive(Debug, Clone)]
struct RollbackPoint {
	context: Option<Context>,
	contextual: Option<ContextualJoin>,
	binder: ParameterBinder,
	builder: QueryBuilder,
}

/// Owns the mutable state of one compilation: the statement builder, the parameter binder, the
/// ambient contextual join and the stack of rollback points.
///
/// The current context itself is not stored here. Callers thread it through as a value, and a
/// rollback hands back the one that was current when the point was set.
#[derive(Debug)]
pub struct ContextManager {
	builder: QueryBuilder,
	binder: ParameterBinder,
	contextual: Option<ContextualJoin>,
	rollback_points: Vec<RollbackPoint>,
}

impl ContextManager {
	pub fn new(builder: QueryBuilder, binder: ParameterBinder) -> Self {
		Self {
			builder,
			binder,
			contextual: None,
			rollback_points: Vec::new(),
		}
	}

	pub fn builder(&self) -> &QueryBuilder {
		&self.builder
	}

	pub fn builder_mut(&mut self) -> &mut QueryBuilder {
		&mut self.builder
	}

	pub fn binder(&self) -> &ParameterBinder {
		&self.binder
	}

	pub fn binder_mut(&mut self) -> &mut ParameterBinder {
		&mut self.binder
	}

	pub fn contextual(&self) -> Option<&ContextualJoin> {
		self.contextual.as_ref()
	}

	/// Follows `join` from `context` in the subquery when forked, else in the main select.
	pub fn handle_join(&mut self, context: Option<Context>, join: &JoinToken) -> Context {
		let next = self.builder.add_join(context, &join.table_b, &join.expression);
		trace!(from = ?context, to = %next, table = %join.table_b, contextual = join.is_contextual, "Join");

		if join.is_contextual {
			self.contextual = Some(ContextualJoin {
				join: join.clone(),
				context: next,
			});
		}
		next
	}

	pub fn set_rollback_point(&mut self, context: Option<Context>) {
		self.rollback_points.push(RollbackPoint {
			context,
			contextual: self.contextual.clone(),
			binder: self.binder.clone(),
			builder: self.builder.clone(),
		});
		trace!(depth = self.rollback_points.len(), "Set rollback point");
	}

	/// Drops the newest rollback point, keeping everything done since.
	pub fn clear_rollback_point(&mut self) -> Result<()> {
		self.rollback_points.pop().ok_or(QueryError::RollbackDiscipline {
			depth: 0,
		})?;
		trace!(depth = self.rollback_points.len(), "Cleared rollback point");
		Ok(())
	}

	/// Restores the newest rollback point and returns the context that was current when it was set.
	pub fn rollback(&mut self) -> Result<Option<Context>> {
		let point = self.rollback_points.pop().ok_or(QueryError::RollbackDiscipline {
			depth: 0,
		})?;

		self.contextual = point.contextual;
		self.binder = point.binder;
		self.builder = point.builder;
		trace!(depth = self.rollback_points.len(), context = ?point.context, "Rolled back");
		Ok(point.context)
	}

	pub fn depth(&self) -> usize {
		self.rollback_points.len()
	}

	/// Hands back the builder and binder; any rollback point still set is an error.
	pub fn finish(self) -> Result<(QueryBuilder, ParameterBinder)> {
		if !self.rollback_points.is_empty() {
			return Err(QueryError::RollbackDiscipline {
				depth: self.rollback_points.len(),
			});
		}
		Ok((self.builder, self.binder))
	}
}

/// Anything that owns a [`ContextManager`] and can therefore take a [`Savepoint`].
pub trait Rollback {
	fn manager(&mut self) -> &mut ContextManager;
}

impl Rollback for ContextManager {
	fn manager(&mut self) -> &mut ContextManager {
		self
	}
}

/// Scope guard over a rollback point.
///
/// [`Savepoint::finish`] keeps the work on success and restores on failure. A guard dropped without
/// finishing restores as well.
pub struct Savepoint<'a, T: Rollback> {
	owner: &'a mut T,
	armed: bool,
}

impl<'a, T: Rollback> Savepoint<'a, T> {
	pub fn new(owner: &'a mut T, context: Option<Context>) -> Self {
		owner.manager().set_rollback_point(context);
		Self {
			owner,
			armed: true,
		}
	}

	pub fn finish<R>(mut self, result: Result<R>) -> Result<R> {
		self.armed = false;
		match result {
			Ok(value) => {
				self.owner.manager().clear_rollback_point()?;
				Ok(value)
			}
			Err(err) => {
				self.owner.manager().rollback()?;
				Err(err)
			}
		}
	}
}

impl<T: Rollback> Deref for Savepoint<'_, T> {
	type Target = T;

	fn deref(&self) -> &T {
		self.owner
	}
}

impl<T: Rollback> DerefMut for Savepoint<'_, T> {
	fn deref_mut(&mut self) -> &mut T {
		self.owner
	}
}

impl<T: Rollback> Drop for Savepoint<'_, T> {
	fn drop(&mut self) {
		if self.armed {
			let _ = self.owner.manager().rollback();
		}
	}
}

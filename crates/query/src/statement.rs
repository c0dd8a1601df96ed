// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Statement trees and the builder the compiler assembles them with.
//!
//! `Display` renders a compact SQL-like explain form; dialect rendering happens elsewhere.

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;

use crate::{Result, error::QueryError, expression::Expression};

/// Position in the join graph of one select. The root table has no context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Context(pub u32);

impl Display for Context {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "t{}", self.0)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
	pub parent: Option<Context>,
	pub context: Context,
	pub table: String,
	/// Join condition with `{parent}` and `{child}` placeholders.
	pub on: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
	Table(String),
	/// The subquery of the enclosing statement.
	Derived,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
	pub expression: Expression,
	pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
	pub offset: Expression,
	pub count: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
	pub expression: Expression,
	pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
	pub source: Source,
	pub joins: Vec<Join>,
	pub filter: Option<Expression>,
	pub order: Vec<Order>,
	pub limit: Option<Limit>,
	pub projection: Vec<Projection>,
}

impl Select {
	pub fn new(source: Source) -> Self {
		Self {
			source,
			joins: Vec::new(),
			filter: None,
			order: Vec::new(),
			limit: None,
			projection: Vec::new(),
		}
	}

	/// Joins `table` onto `parent`, reusing an identical join when there is one.
	pub fn add_join(&mut self, parent: Option<Context>, table: &str, on: &str) -> Context {
		if let Some(join) =
			self.joins.iter().find(|join| join.parent == parent && join.table == table && join.on == on)
		{
			return join.context;
		}

		let context = Context(self.joins.len() as u32 + 1);
		self.joins.push(Join {
			parent,
			context,
			table: table.to_string(),
			on: on.to_string(),
		});
		context
	}

	fn root(&self) -> &str {
		match &self.source {
			Source::Table(table) => table,
			Source::Derived => DERIVED_ALIAS,
		}
	}

	fn alias(&self, context: Option<Context>) -> String {
		match context {
			Some(context) => context.to_string(),
			None => self.root().to_string(),
		}
	}

	fn fmt_joins(&self, f: &mut Formatter<'_>) -> fmt::Result {
		for join in &self.joins {
			let on = join.on.replace("{parent}", &self.alias(join.parent)).replace("{child}", &join.context.to_string());
			write!(f, " JOIN {} AS {} ON {}", join.table, join.context, on)?;
		}
		Ok(())
	}

	fn fmt_tail(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if let Some(filter) = &self.filter {
			write!(f, " WHERE {}", filter)?;
		}
		if !self.order.is_empty() {
			let order = self
				.order
				.iter()
				.map(|order| {
					if order.descending {
						format!("{} DESC", order.expression)
					} else {
						order.expression.to_string()
					}
				})
				.collect::<Vec<_>>()
				.join(", ");
			write!(f, " ORDER BY {}", order)?;
		}
		if let Some(limit) = &self.limit {
			write!(f, " LIMIT {} OFFSET {}", limit.count, limit.offset)?;
		}
		Ok(())
	}

	fn fmt_with(&self, f: &mut Formatter<'_>, derived: Option<&Select>) -> fmt::Result {
		f.write_str("SELECT ")?;
		if self.projection.is_empty() {
			f.write_str("*")?;
		}
		for (index, projection) in self.projection.iter().enumerate() {
			if index > 0 {
				f.write_str(", ")?;
			}
			match &projection.alias {
				Some(alias) => write!(f, "{} AS {}", projection.expression, alias)?,
				None => write!(f, "{}", projection.expression)?,
			}
		}

		match (&self.source, derived) {
			(Source::Table(table), _) => write!(f, " FROM {}", table)?,
			(Source::Derived, Some(derived)) => {
				f.write_str(" FROM (")?;
				derived.fmt_with(f, None)?;
				write!(f, ") AS {}", DERIVED_ALIAS)?;
			}
			(Source::Derived, None) => write!(f, " FROM {}", DERIVED_ALIAS)?,
		}

		self.fmt_joins(f)?;
		self.fmt_tail(f)
	}
}

impl Display for Select {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		self.fmt_with(f, None)
	}
}

const DERIVED_ALIAS: &str = "derived";

/// Builds the select of one statement, plus the subquery once forked.
///
/// Joins, filters, ordering and limits go to the subquery while one exists; projections always go
/// to the main select. Cloning is how callers take a snapshot for rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
	main: Select,
	subquery: Option<Select>,
	exposed: IndexMap<(Option<Context>, String), String>,
}

impl QueryBuilder {
	pub fn new(table: impl Into<String>) -> Self {
		Self {
			main: Select::new(Source::Table(table.into())),
			subquery: None,
			exposed: IndexMap::new(),
		}
	}

	pub fn is_forked(&self) -> bool {
		self.subquery.is_some()
	}

	fn active(&mut self) -> &mut Select {
		match &mut self.subquery {
			Some(subquery) => subquery,
			None => &mut self.main,
		}
	}

	pub fn add_join(&mut self, parent: Option<Context>, table: &str, on: &str) -> Context {
		self.active().add_join(parent, table, on)
	}

	pub fn set_where(&mut self, filter: Expression) {
		self.active().filter = Some(filter);
	}

	/// Adds `filter` to the predicate with `AND`.
	pub fn and_where(&mut self, filter: Expression) {
		let select = self.active();
		select.filter = Some(match select.filter.take() {
			Some(existing) => Expression::and(existing, filter),
			None => filter,
		});
	}

	pub fn add_order(&mut self, expression: Expression, descending: bool) {
		self.active().order.push(Order {
			expression,
			descending,
		});
	}

	pub fn set_limit(&mut self, offset: Expression, count: Expression) {
		self.active().limit = Some(Limit {
			offset,
			count,
		});
	}

	pub fn add_projection(&mut self, expression: Expression) {
		self.main.projection.push(Projection {
			expression,
			alias: None,
		});
	}

	/// Moves everything built so far into a subquery and continues with an outer select over it.
	pub fn fork(&mut self) -> Result<()> {
		if self.subquery.is_some() {
			return Err(QueryError::NestedFork);
		}

		let inner = std::mem::replace(&mut self.main, Select::new(Source::Derived));
		self.subquery = Some(inner);
		Ok(())
	}

	/// Projects a subquery column so the outer select can read it. Outside a fork the column is
	/// returned as is.
	pub fn expose(&mut self, context: Option<Context>, name: String) -> Expression {
		let Some(subquery) = &mut self.subquery else {
			return Expression::column(context, name);
		};

		let key = (context, name);
		if let Some(alias) = self.exposed.get(&key) {
			return Expression::DerivedColumn(alias.clone());
		}

		let alias = format!("c{}", self.exposed.len());
		subquery.projection.push(Projection {
			expression: Expression::column(key.0, key.1.clone()),
			alias: Some(alias.clone()),
		});
		self.exposed.insert(key, alias.clone());
		Expression::DerivedColumn(alias)
	}

	pub fn main(&self) -> &Select {
		&self.main
	}

	pub fn subquery(&self) -> Option<&Select> {
		self.subquery.as_ref()
	}

	pub fn into_parts(self) -> (Select, Option<Select>) {
		(self.main, self.subquery)
	}
}

/// A `column = value` pair of an update or insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
	pub column: String,
	pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
	Select {
		select: Select,
		derived: Option<Select>,
	},
	/// `select` carries the joins, predicate, ordering and limit of the rows to update.
	Update {
		select: Select,
		assignments: Vec<Assignment>,
	},
	Delete {
		select: Select,
	},
	Insert {
		table: String,
		assignments: Vec<Assignment>,
	},
}

impl Display for Statement {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Statement::Select {
				select,
				derived,
			} => select.fmt_with(f, derived.as_ref()),
			Statement::Update {
				select,
				assignments,
			} => {
				write!(f, "UPDATE {}", select.root())?;
				select.fmt_joins(f)?;
				let assignments = assignments
					.iter()
					.map(|assignment| format!("{} = {}", assignment.column, assignment.value))
					.collect::<Vec<_>>()
					.join(", ");
				write!(f, " SET {}", assignments)?;
				select.fmt_tail(f)
			}
			Statement::Delete {
				select,
			} => {
				write!(f, "DELETE FROM {}", select.root())?;
				select.fmt_joins(f)?;
				select.fmt_tail(f)
			}
			Statement::Insert {
				table,
				assignments,
			} => {
				let columns = assignments.iter().map(|a| a.column.as_str()).collect::<Vec<_>>().join(", ");
				let values = assignments.iter().map(|a| a.value.to_string()).collect::<Vec<_>>().join(", ");
				write!(f, "INSERT INTO {} ({}) VALUES ({})", table, columns, values)
			}
		}
	}
}

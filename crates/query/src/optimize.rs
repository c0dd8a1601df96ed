// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Request rewriting ahead of compilation.
//!
//! The rules run once, in order, over a working copy. Each rule reads the profile left behind by
//! the previous one, so the profile is patched on every insertion and removal instead of being
//! recomputed. Running [`optimize`] on its own output returns it unchanged.

use quarry_type::Type;
use tracing::debug;

use crate::{
	analyze::{Method, MethodProfile, Operation, analyze},
	token::{Request, Token, ValueToken},
};

pub fn optimize(name: &str, request: &[Token]) -> Request {
	let mut pipeline = Pipeline::new(name, request);

	pipeline.drop_redundant_ordering();
	pipeline.order_before_pagination();
	pipeline.isolate_aggregation();
	pipeline.filter_before_ordering();

	pipeline.tokens
}

struct Pipeline {
	tokens: Request,
	profile: MethodProfile,
}

impl Pipeline {
	fn new(name: &str, request: &[Token]) -> Self {
		Self {
			tokens: request.to_vec(),
			profile: analyze(name, request),
		}
	}

	fn remove(&mut self, index: usize) -> Token {
		let token = self.tokens.remove(index);
		self.profile.removed(index, &self.tokens);
		token
	}

	fn insert(&mut self, index: usize, token: Token) {
		self.tokens.insert(index, token);
		self.profile.inserted(index, &self.tokens[index]);
	}

	/// Ordering is invisible to a scalar result or a write, and to an unsliced set.
	fn drop_redundant_ordering(&mut self) {
		let profile = &self.profile;
		if !matches!(profile.method, Method::Count | Method::Aggregate | Method::Set | Method::Delete) {
			return;
		}

		let sort_after_slice = profile.occurs_after(Operation::Sort, Operation::Slice);
		let unsliced = profile.has(Operation::Sort) && !profile.has(Operation::Slice);
		if !sort_after_slice && !unsliced {
			return;
		}

		let mut removed = 0;
		while let Some(position) = self.profile.sort {
			self.remove(position);
			removed += 1;
		}
		debug!(method = %self.profile.method, removed, "Dropped redundant ordering");
	}

	/// A slice over a table scan is only deterministic with a stable order.
	fn order_before_pagination(&mut self) {
		let Some(Token::Table(table)) = self.tokens.first() else {
			return;
		};
		let Some(slice) = self.profile.slice else {
			return;
		};
		if self.profile.occurs_after(Operation::Slice, Operation::Sort) {
			return;
		}

		let key = Token::Value(ValueToken {
			table: table.table.clone(),
			expression: table.id.clone(),
			ty: Type::Integer,
			has_zero: table.has_zero,
		});
		debug!(table = %table.table, id = %table.id, "Ordering pagination by identifier");
		self.insert(slice, Token::function("sort", vec![vec![key]]));
	}

	/// Aggregates over a slice run on a derived table holding only the sliced rows.
	fn isolate_aggregation(&mut self) {
		if !self.profile.method.is_scalar() {
			return;
		}
		let Some(slice) = self.profile.slice else {
			return;
		};
		if self.tokens.get(slice + 1).is_some_and(|token| token.is_call("fork")) {
			return;
		}

		debug!(method = %self.profile.method, "Forking aggregation over slice");
		self.insert(slice + 1, Token::function("fork", vec![]));
	}

	/// Moves ordering behind the filter when no slice separates the two.
	fn filter_before_ordering(&mut self) {
		let profile = &self.profile;
		if !profile.occurs_after(Operation::Filter, Operation::Sort) {
			return;
		}
		if profile.has(Operation::Slice)
			&& profile.occurs_after(Operation::Filter, Operation::Slice)
				!= profile.occurs_after(Operation::Sort, Operation::Slice)
		{
			return;
		}
		let Some(filter) = profile.filter else {
			return;
		};

		let start = self.tokens[..filter]
			.iter()
			.rposition(|token| Operation::of(token) == Some(Operation::Slice))
			.map_or(0, |position| position + 1);

		let moving = (start..filter)
			.filter(|&index| Operation::of(&self.tokens[index]) == Some(Operation::Sort))
			.collect::<Vec<_>>();

		let mut sorts = Vec::with_capacity(moving.len());
		for &index in moving.iter().rev() {
			sorts.push(self.remove(index));
		}
		sorts.reverse();

		let mut at = filter - moving.len() + 1;
		for sort in sorts {
			self.insert(at, sort);
			at += 1;
		}
		debug!(moved = moving.len(), "Moved ordering after filter");
	}
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use quarry_type::{SignatureTable, Type};
use tracing::trace;

use crate::token::{Token, bare_parameter};

/// Assigns each parameter of a top-level request the type its position implies.
///
/// Slice and substring bounds are integers. A function operand takes its slot in the first
/// overload that agrees with the operand types already known, and an assigned value takes the
/// type of its property. The first inference for a name wins; parameters nothing constrains are
/// left out.
pub fn infer_parameter_types(request: &[Token], signatures: &SignatureTable) -> IndexMap<String, Type> {
	let mut inference = Inference {
		signatures,
		types: IndexMap::new(),
	};

	if let Some(Token::Function(method)) = request.first() {
		for argument in &method.args {
			inference.request(argument);
		}
	}

	inference.types
}

struct Inference<'a> {
	signatures: &'a SignatureTable,
	types: IndexMap<String, Type>,
}

impl Inference<'_> {
	fn assign(&mut self, name: &str, ty: Type) {
		if !self.types.contains_key(name) {
			trace!(parameter = %name, %ty, "Inferred parameter type");
			self.types.insert(name.to_string(), ty);
		}
	}

	/// The type of a request is the type of its last token, joins aside.
	fn request(&mut self, request: &[Token]) -> Option<Type> {
		let mut ty = None;
		for token in request.iter().filter(|token| !matches!(token, Token::Join(_))) {
			ty = self.token(token);
		}
		ty
	}

	fn integers(&mut self, arguments: &[Vec<Token>]) {
		for argument in arguments {
			match bare_parameter(argument) {
				Some(name) => self.assign(name, Type::Integer),
				None => {
					self.request(argument);
				}
			}
		}
	}

	fn token(&mut self, token: &Token) -> Option<Type> {
		match token {
			Token::Value(value) => Some(value.ty),
			Token::Parameter(parameter) => self.types.get(&parameter.name).copied(),
			Token::Table(_) => Some(Type::List),
			Token::Join(_) => None,
			Token::AssignmentList(list) => {
				for pair in &list.pairs {
					let property = self.request(&pair.property);
					match (bare_parameter(&pair.value), property) {
						(Some(name), Some(ty)) => self.assign(name, ty),
						_ => {
							self.request(&pair.value);
						}
					}
				}
				None
			}
			Token::Function(function) => match (function.name.as_str(), function.args.as_slice()) {
				("slice", arguments) => {
					self.integers(arguments);
					Some(Type::List)
				}
				("filter" | "sort" | "rsort" | "fork", arguments) => {
					for argument in arguments {
						self.request(argument);
					}
					Some(Type::List)
				}
				("substring", [string, bounds @ ..]) => {
					self.request(string);
					self.integers(bounds);
					Some(Type::String)
				}
				("length", [string]) => {
					self.request(string);
					Some(Type::Integer)
				}
				(name, arguments) => self.operator(name, arguments),
			},
		}
	}

	fn operator(&mut self, name: &str, arguments: &[Vec<Token>]) -> Option<Type> {
		let known = arguments.iter().map(|argument| self.request(argument)).collect::<Vec<_>>();

		let signatures = self.signatures;
		let chosen = signatures.signatures_for(name).iter().find(|signature| {
			signature.arguments.len() == known.len()
				&& signature.arguments.iter().zip(&known).all(|(slot, have)| have.is_none() || *have == Some(*slot))
		})?;

		for (argument, slot) in arguments.iter().zip(&chosen.arguments) {
			if let Some(parameter) = bare_parameter(argument) {
				self.assign(parameter, *slot);
			}
		}
		Some(chosen.returns)
	}
}

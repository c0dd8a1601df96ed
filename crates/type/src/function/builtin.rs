// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use crate::{
	Signature, SignatureTable,
	Type::{Boolean, Float, Integer, List, String},
};

pub(super) fn standard() -> SignatureTable {
	SignatureTable::new()
		.with("get", anything_to_list())
		.with("average", aggregator())
		.with("sum", aggregator())
		.with("min", aggregator())
		.with("max", aggregator())
		.with("filter", [Signature::new([List, Boolean], List)])
		.with("sort", anything_to_list())
		.with("slice", [Signature::new([List, Integer, Integer], List)])
		.with("not", [Signature::new([Boolean], Boolean)])
		.with("plus", plus())
		.with("minus", numeric())
		.with("times", numeric())
		.with("divides", divides())
		.with("equal", strict_comparison())
		.with("and", binary_boolean())
		.with("or", binary_boolean())
		.with("notEqual", strict_comparison())
		.with("less", comparison())
		.with("lessEqual", comparison())
		.with("greater", comparison())
		.with("greaterEqual", comparison())
		.with("match", [Signature::new([String, String], Boolean)])
		.with("lowercase", string_function())
		.with("uppercase", string_function())
		.with("substring", [Signature::new([String, Integer, Integer], String)])
		.with("length", [Signature::new([String], Integer)])
		// used internally when typing the values of set/insert assignments
		.with("assign", strict_comparison())
}

fn anything_to_list() -> Vec<Signature> {
	vec![
		Signature::new([List, Boolean], List),
		Signature::new([List, Integer], List),
		Signature::new([List, Float], List),
		Signature::new([List, String], List),
	]
}

fn aggregator() -> Vec<Signature> {
	vec![Signature::new([Integer], Float), Signature::new([Float], Float)]
}

fn plus() -> Vec<Signature> {
	let mut signatures = numeric();
	signatures.push(Signature::new([String, String], String));
	signatures
}

fn numeric() -> Vec<Signature> {
	vec![
		Signature::new([Integer, Integer], Integer),
		Signature::new([Float, Integer], Float),
		Signature::new([Integer, Float], Float),
		Signature::new([Float, Float], Float),
	]
}

fn divides() -> Vec<Signature> {
	vec![
		Signature::new([Integer, Integer], Float),
		Signature::new([Float, Integer], Float),
		Signature::new([Integer, Float], Float),
		Signature::new([Float, Float], Float),
	]
}

fn strict_comparison() -> Vec<Signature> {
	vec![
		Signature::new([Boolean, Boolean], Boolean),
		Signature::new([Integer, Integer], Boolean),
		Signature::new([Float, Float], Boolean),
		Signature::new([String, String], Boolean),
	]
}

fn binary_boolean() -> Vec<Signature> {
	vec![Signature::new([Boolean, Boolean], Boolean)]
}

fn comparison() -> Vec<Signature> {
	vec![
		Signature::new([Integer, Integer], Boolean),
		Signature::new([Float, Integer], Boolean),
		Signature::new([Integer, Float], Boolean),
		Signature::new([Float, Float], Boolean),
		Signature::new([String, String], Boolean),
	]
}

fn string_function() -> Vec<Signature> {
	vec![Signature::new([String], String)]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_declaration_order_is_kept() {
		let table = standard();
		let first = &table.signatures_for("plus")[0];
		assert_eq!(first, &Signature::new([Integer, Integer], Integer));

		let last = table.signatures_for("plus").last().unwrap();
		assert_eq!(last, &Signature::new([String, String], String));
	}

	#[test]
	fn test_divides_always_returns_float() {
		let table = standard();
		assert!(table.signatures_for("divides").iter().all(|s| s.returns == Float));
	}

	#[test]
	fn test_every_operator_is_declared() {
		let table = standard();
		for name in [
			"not", "uppercase", "lowercase", "length", "plus", "minus", "times", "divides", "equal",
			"notEqual", "and", "or", "less", "lessEqual", "greater", "greaterEqual", "match", "substring",
		] {
			assert!(table.contains(name), "{} is missing", name);
		}
	}
}

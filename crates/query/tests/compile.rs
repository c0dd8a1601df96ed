// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use quarry_query::{
	Argument, CompilerConfig, Compiler, ErrorKind, Output, QueryError, Requiredness, SignatureTable, Token, Type,
	compile,
	context::{ContextManager, Savepoint},
	parameter::ParameterBinder,
	statement::QueryBuilder,
	token::{Assignment, JoinToken},
};

fn people() -> Token {
	Token::table("people", "id")
}

fn property(table: &str, column: &str, ty: Type) -> Vec<Token> {
	vec![Token::value(table, column, ty)]
}

fn parameter(name: &str) -> Vec<Token> {
	vec![Token::parameter(name)]
}

fn call(name: &str, args: Vec<Vec<Token>>) -> Token {
	Token::function(name, args)
}

#[test]
fn test_get_with_equality_filter() {
	let filter = call("filter", vec![vec![call("equal", vec![property("people", "age", Type::Integer), parameter("minAge")])]]);
	let request = vec![call("get", vec![vec![people(), filter], property("people", "name", Type::String)])];

	let compiled = compile(&request, SignatureTable::standard()).unwrap();

	assert_eq!(compiled.to_string(), "SELECT name FROM people WHERE age = ?");
	assert_eq!(
		compiled.parameters,
		vec![Argument::Named {
			name: "minAge".to_string(),
			requiredness: Requiredness::Required,
			ty: Some(Type::Integer),
		}]
	);
}

#[test]
fn test_unknown_function_is_named() {
	let filter = call("filter", vec![vec![call("foo", vec![property("people", "age", Type::Integer)])]]);
	let request = vec![call("get", vec![vec![people(), filter], property("people", "name", Type::String)])];

	let err = compile(&request, SignatureTable::standard()).unwrap_err();

	assert_eq!(err.kind(), ErrorKind::MalformedRequest);
	assert!(err.to_string().contains("foo"), "{}", err);
}

#[test]
fn test_unknown_function_in_projection() {
	let projection = vec![call("foo", vec![property("people", "name", Type::String)])];
	let request = vec![call("get", vec![vec![people()], projection])];

	let err = compile(&request, SignatureTable::standard()).unwrap_err();
	assert_eq!(
		err,
		QueryError::UnknownFunction {
			name: "foo".to_string(),
			arity: 1
		}
	);
}

#[test]
fn test_empty_request() {
	let err = compile(&[], SignatureTable::standard()).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::MalformedRequest);
}

#[test]
fn test_joined_filter() {
	let city = Token::join("cities", "{parent}.city = {child}.id");
	let filter = call(
		"filter",
		vec![vec![call("equal", vec![vec![city, Token::value("cities", "name", Type::String)], parameter("city")])]],
	);
	let request = vec![call("get", vec![vec![people(), filter], property("people", "name", Type::String)])];

	let compiled = compile(&request, SignatureTable::standard()).unwrap();
	assert_eq!(
		compiled.to_string(),
		"SELECT name FROM people JOIN cities AS t1 ON people.city = t1.id WHERE t1.name = ?"
	);
}

#[test]
fn test_count_over_slice() {
	let slice = call("slice", vec![parameter("begin"), parameter("end")]);
	let request = vec![call("count", vec![vec![people(), slice]])];

	let compiled = compile(&request, SignatureTable::standard()).unwrap();

	assert_eq!(
		compiled.to_string(),
		"SELECT COUNT(*) FROM (SELECT id AS c0 FROM people ORDER BY id LIMIT ? OFFSET ?) AS derived"
	);
	assert_eq!(compiled.output, Output::Value(Some(Type::Integer)));
}

#[test]
fn test_substring_projection() {
	let substring = call("substring", vec![property("people", "name", Type::String), parameter("from"), parameter("to")]);
	let request = vec![call("get", vec![vec![people()], vec![call("uppercase", vec![vec![substring]])]])];

	let compiled = compile(&request, SignatureTable::standard()).unwrap();

	assert_eq!(compiled.to_string(), "SELECT UPPER(SUBSTRING(name FROM ? FOR ?)) FROM people");
	assert_eq!(compiled.output, Output::List(Some(Type::String)));
	assert_eq!(
		compiled.parameters,
		vec![
			Argument::SubstringBegin {
				begin: "from".to_string()
			},
			Argument::SubstringLength {
				begin: "from".to_string(),
				end: "to".to_string()
			},
		]
	);
}

#[test]
fn test_set_and_insert() {
	let assignments = || {
		Token::assignments(vec![Assignment::new(property("people", "name", Type::String), parameter("name"))])
	};

	let filter = call("filter", vec![vec![call("equal", vec![property("people", "id", Type::Integer), parameter("id")])]]);
	let update = vec![call("set", vec![vec![people(), filter], vec![assignments()]])];
	let compiled = compile(&update, SignatureTable::standard()).unwrap();
	assert_eq!(compiled.to_string(), "UPDATE people SET name = ? WHERE id = ?");
	assert_eq!(compiled.output, Output::Mutation);

	let insert = vec![call("insert", vec![vec![people()], vec![assignments()]])];
	let compiled = compile(&insert, SignatureTable::standard()).unwrap();
	assert_eq!(compiled.to_string(), "INSERT INTO people (name) VALUES (?)");
}

#[test]
fn test_delete_drops_ordering() {
	let sort = call("sort", vec![property("people", "name", Type::String)]);
	let request = vec![call("delete", vec![vec![people(), sort]])];

	let compiled = compile(&request, SignatureTable::standard()).unwrap();
	assert_eq!(compiled.to_string(), "DELETE FROM people");
}

#[test]
fn test_strict_policy_rejects_mismatched_operands() {
	let filter = call(
		"filter",
		vec![vec![call(
			"equal",
			vec![property("people", "age", Type::Integer), property("people", "name", Type::String)],
		)]],
	);
	let request = vec![call("get", vec![vec![people(), filter], property("people", "name", Type::String)])];
	let signatures = SignatureTable::standard();

	let tolerant = Compiler::new(signatures).compile(&request);
	assert!(tolerant.is_ok());

	let err = Compiler::new(signatures).with_config(CompilerConfig::new().strict()).compile(&request).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::OverloadMismatch);
}

#[test]
fn test_without_inference_parameters_are_untyped() {
	let filter = call("filter", vec![vec![call("equal", vec![property("people", "age", Type::Integer), parameter("minAge")])]]);
	let request = vec![call("get", vec![vec![people(), filter], property("people", "name", Type::String)])];

	let config = CompilerConfig::new().infer_parameter_types(false);
	let compiled = Compiler::new(SignatureTable::standard()).with_config(config).compile(&request).unwrap();
	assert_eq!(compiled.parameters[0].ty(), None);
}

#[test]
fn test_custom_signature_table() {
	let signatures: SignatureTable = serde_json::from_str(
		r#"{"greater": [{"arguments": ["integer", "integer"], "returns": "boolean"}]}"#,
	)
	.unwrap();
	let filter = call("filter", vec![vec![call("greater", vec![property("people", "age", Type::Integer), parameter("min")])]]);
	let request = vec![call("count", vec![vec![people(), filter]])];

	let compiled = compile(&request, &signatures).unwrap();
	assert_eq!(compiled.to_string(), "SELECT COUNT(*) FROM people WHERE age > ?");
}

mod rollback {
	use super::*;

	fn join() -> JoinToken {
		JoinToken {
			table_b: "cities".to_string(),
			expression: "{parent}.city = {child}.id".to_string(),
			is_contextual: true,
		}
	}

	#[test]
	fn test_failed_join_then_expression_leaves_no_residue() {
		let mut manager = ContextManager::new(QueryBuilder::new("people"), ParameterBinder::new());
		manager.binder_mut().use_argument("kept", Requiredness::Required);
		let builder = manager.builder().clone();
		let binder = manager.binder().clone();

		let result: quarry_query::Result<()> = {
			let mut savepoint = Savepoint::new(&mut manager, None);
			let context = savepoint.handle_join(None, &join());
			savepoint.handle_join(Some(context), &join());
			savepoint.binder_mut().use_argument("dropped", Requiredness::Required);
			savepoint.finish(Err(QueryError::EmptyExpression))
		};

		assert!(result.is_err());
		assert_eq!(manager.builder(), &builder);
		assert_eq!(manager.binder(), &binder);
		assert!(manager.contextual().is_none());
		assert_eq!(manager.depth(), 0);
	}

	#[test]
	fn test_failed_compile_is_balanced() {
		let city = Token::join("cities", "{parent}.city = {child}.id");
		let projection = vec![city, call("foo", vec![parameter("p")])];
		let request = vec![call("get", vec![vec![people()], projection])];

		let err = compile(&request, SignatureTable::standard()).unwrap_err();
		assert_ne!(err.kind(), ErrorKind::RollbackDiscipline);
	}
}

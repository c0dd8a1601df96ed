// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::Deserialize;

/// What to do when no overload of a function accepts the operand types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverloadPolicy {
	/// Fall back to the return type of the first declared overload.
	#[default]
	Tolerant,
	/// Fail with an overload mismatch.
	Strict,
}

/// Configuration for a [`Compiler`](crate::Compiler)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
	pub overload_policy: OverloadPolicy,
	/// Type parameters from their position before compiling
	pub infer_parameter_types: bool,
}

impl Default for CompilerConfig {
	fn default() -> Self {
		Self {
			overload_policy: OverloadPolicy::Tolerant,
			infer_parameter_types: true,
		}
	}
}

impl CompilerConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn overload_policy(mut self, policy: OverloadPolicy) -> Self {
		self.overload_policy = policy;
		self
	}

	pub fn strict(self) -> Self {
		self.overload_policy(OverloadPolicy::Strict)
	}

	pub fn infer_parameter_types(mut self, enabled: bool) -> Self {
		self.infer_parameter_types = enabled;
		self
	}
}

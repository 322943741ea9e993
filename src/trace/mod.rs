// Copyright 2015-2019 Parity Technologies (UK) Ltd.
// This file is part of Parity Ethereum.

// Parity Ethereum is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Parity Ethereum is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Parity Ethereum.  If not, see <http://www.gnu.org/licenses/>.

//! Tracing.

mod executive_tracer;
mod instructions;
mod noop_tracer;
mod standard_tracer;
pub mod trace;

pub use self::executive_tracer::ExecutiveTracer;
pub use self::instructions::name as instruction_name;
pub use self::noop_tracer::{NoopTracer, NoopVMTracer};
pub use self::standard_tracer::{StandardTraceOptions, StandardTracer, VMStep, VMTrace};
pub use self::trace::{Action, Call, CallResult, Create, CreateResult, FlatTrace, Res, Suicide};
pub use self::trace::Error as TraceError;

use ethereum_types::{Address, U256};

use vm::ActionParams;
use vm;

/// This trait is used by executive to build traces.
pub trait Tracer: Send {
	/// Data returned when draining the Tracer.
	type Output;

	/// Prepares call trace for given params. Would panic if prepare/done
	/// pairs are not balanced.
	fn prepare_trace_call(&mut self, params: &ActionParams, depth: usize, is_builtin: bool);

	/// Prepares create trace for given params.
	fn prepare_trace_create(&mut self, params: &ActionParams);

	/// Stores trace call info.
	fn done_trace_call(&mut self, gas_used: U256, output: &[u8]);

	/// Stores trace create info.
	fn done_trace_create(&mut self, gas_used: U256, code: &[u8], address: Address);

	/// Stores failed call/create trace.
	fn done_trace_failed(&mut self, error: &vm::Error);

	/// Stores suicide info.
	fn trace_suicide(&mut self, address: Address, balance: U256, refund_address: Address);

	/// Consumes self and returns all traces.
	fn drain(self) -> Vec<Self::Output>;
}

/// Used by the executive and the machine to build a trace of executed
/// instructions, one callback pair per step.
pub trait VMTracer: Send {
	/// Data returned when draining the VMTracer.
	type Output;

	/// Trace the progression of interpreter to next instruction.
	/// If tracer returns `false` it won't be called again.
	fn trace_next_instruction(&mut self, _pc: usize, _instruction: u8, _current_gas: U256) -> bool { false }

	/// Trace the preparation to execute a single valid instruction.
	/// `depth` is the host's current frame depth.
	fn trace_prepare_execute(&mut self, _pc: usize, _instruction: u8, _gas_cost: U256, _depth: usize) {}

	/// Trace the finalised execution of a single valid instruction.
	/// `stack` is the full machine stack, bottom first; `store_diff` is
	/// the storage write made by the instruction, if any.
	fn trace_executed(&mut self, _gas_left: U256, _stack: &[U256], _mem: &[u8], _store_diff: Option<(U256, U256)>) {}

	/// Spawn subtracer which will be used to trace deeper levels of
	/// execution.
	fn prepare_subtrace(&mut self, _code: &[u8]) {}

	/// Finalize subtracer.
	fn done_subtrace(&mut self) {}

	/// Consumes self and returns the VM trace.
	fn drain(self) -> Option<Self::Output>;
}

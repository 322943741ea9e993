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

//! Standard per-step VM tracer.

use bytes::Bytes;
use ethereum_types::U256;

use trace::instructions;
use trace::VMTracer;

/// What the standard tracer captures per step.
#[derive(Debug, Clone, Copy)]
pub struct StandardTraceOptions {
	/// Leave the machine stack out of the records.
	pub disable_stack: bool,
	/// Leave memory out of the records.
	pub disable_memory: bool,
	/// Leave storage writes out of the records.
	pub disable_storage: bool,
}

impl Default for StandardTraceOptions {
	fn default() -> Self {
		StandardTraceOptions {
			disable_stack: false,
			disable_memory: false,
			disable_storage: false,
		}
	}
}

/// One record per executed instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct VMStep {
	/// Running step counter across the whole transaction.
	pub step: usize,
	/// Frame depth the instruction executed at.
	pub depth: usize,
	/// Program counter.
	pub pc: usize,
	/// The raw opcode.
	pub instruction: u8,
	/// The opcode mnemonic.
	pub op: &'static str,
	/// Gas charged for the step.
	pub gas_cost: U256,
	/// Gas remaining after the step.
	pub gas_left: U256,
	/// Machine stack, top first. Empty when stack capture is disabled.
	pub stack: Vec<U256>,
	/// Memory contents, if captured; renderers show it as 32-byte rows.
	pub memory: Option<Bytes>,
	/// Storage write made by the step, if captured.
	pub storage: Option<(U256, U256)>,
}

/// The full per-step event stream of a transaction.
pub type VMTrace = Vec<VMStep>;

struct PendingStep {
	pc: usize,
	instruction: u8,
	gas_cost: U256,
	depth: usize,
}

/// Standard VM tracer: emits one `VMStep` per opcode, inferring frame
/// transitions from the depth reported by the host.
#[derive(Default)]
pub struct StandardTracer {
	options: StandardTraceOptions,
	steps: Vec<VMStep>,
	step: usize,
	// the last instruction seen in each open frame
	last_inst: Vec<u8>,
	pending: Option<PendingStep>,
}

impl StandardTracer {
	/// Create a tracer with the given capture options.
	pub fn with_options(options: StandardTraceOptions) -> Self {
		StandardTracer {
			options,
			..Default::default()
		}
	}
}

impl VMTracer for StandardTracer {
	type Output = VMTrace;

	fn trace_next_instruction(&mut self, _pc: usize, _instruction: u8, _current_gas: U256) -> bool {
		true
	}

	fn trace_prepare_execute(&mut self, pc: usize, instruction: u8, gas_cost: U256, depth: usize) {
		// Track frame transitions against the host's reported depth. A
		// jump of more than one frame between steps is a trace-layer
		// anomaly, never a consensus fault; recover by resizing.
		if self.last_inst.len() == depth {
			// starting a new context
			self.last_inst.push(instruction);
		} else if self.last_inst.len() == depth + 2 {
			// returned from a child frame
			self.last_inst.pop();
		} else if self.last_inst.len() == depth + 1 {
			// continuing in the current context
			if let Some(last) = self.last_inst.last_mut() {
				*last = instruction;
			}
		} else {
			warn!(target: "trace", "More than one new/deleted stack frame between steps; attempting naive recovery");
			self.last_inst.resize(depth + 1, 0x00);
		}

		self.pending = Some(PendingStep { pc, instruction, gas_cost, depth });
	}

	fn trace_executed(&mut self, gas_left: U256, stack: &[U256], mem: &[u8], store_diff: Option<(U256, U256)>) {
		if let Some(pending) = self.pending.take() {
			let record = VMStep {
				step: self.step,
				depth: pending.depth,
				pc: pending.pc,
				instruction: pending.instruction,
				op: instructions::name(pending.instruction),
				gas_cost: pending.gas_cost,
				gas_left,
				stack: match self.options.disable_stack {
					true => vec![],
					false => stack.iter().rev().cloned().collect(),
				},
				memory: match self.options.disable_memory {
					true => None,
					false => Some(mem.to_vec()),
				},
				storage: match self.options.disable_storage {
					true => None,
					false => store_diff,
				},
			};
			self.step += 1;
			self.steps.push(record);
		}
	}

	fn drain(self) -> Option<VMTrace> {
		Some(self.steps)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn records_steps_in_order() {
		let mut tracer = StandardTracer::default();
		tracer.trace_prepare_execute(0, 0x60, 3.into(), 0);
		tracer.trace_executed(97.into(), &[1.into()], &[], None);
		tracer.trace_prepare_execute(2, 0x55, 5000.into(), 0);
		tracer.trace_executed(92.into(), &[], &[], Some((1.into(), 2.into())));

		let steps = tracer.drain().unwrap();
		assert_eq!(steps.len(), 2);
		assert_eq!(steps[0].op, "PUSH1");
		assert_eq!(steps[0].gas_cost, 3.into());
		assert_eq!(steps[0].gas_left, 97.into());
		assert_eq!(steps[1].op, "SSTORE");
		assert_eq!(steps[1].storage, Some((1.into(), 2.into())));
		assert_eq!(steps[1].step, 1);
	}

	#[test]
	fn stack_is_recorded_top_first() {
		let mut tracer = StandardTracer::default();
		tracer.trace_prepare_execute(0, 0x01, 3.into(), 0);
		tracer.trace_executed(10.into(), &[1.into(), 2.into(), 3.into()], &[], None);

		let steps = tracer.drain().unwrap();
		assert_eq!(steps[0].stack, vec![U256::from(3), U256::from(2), U256::from(1)]);
	}

	#[test]
	fn depth_transitions_are_tracked() {
		let mut tracer = StandardTracer::default();
		tracer.trace_prepare_execute(0, 0xf1, 700.into(), 0);
		tracer.trace_executed(1000.into(), &[], &[], None);
		// child frame
		tracer.trace_prepare_execute(0, 0x60, 3.into(), 1);
		tracer.trace_executed(500.into(), &[], &[], None);
		// back in the parent
		tracer.trace_prepare_execute(1, 0x00, 0.into(), 0);
		tracer.trace_executed(400.into(), &[], &[], None);

		let steps = tracer.drain().unwrap();
		assert_eq!(steps.iter().map(|s| s.depth).collect::<Vec<_>>(), vec![0, 1, 0]);
	}

	#[test]
	fn recovers_from_depth_jumps() {
		let mut tracer = StandardTracer::default();
		tracer.trace_prepare_execute(0, 0x60, 3.into(), 0);
		tracer.trace_executed(97.into(), &[], &[], None);
		// the host jumps two frames at once; the tracer resyncs
		tracer.trace_prepare_execute(0, 0x60, 3.into(), 3);
		tracer.trace_executed(94.into(), &[], &[], None);

		let steps = tracer.drain().unwrap();
		assert_eq!(steps.len(), 2);
		assert_eq!(steps[1].depth, 3);
	}

	#[test]
	fn options_suppress_captures() {
		let mut tracer = StandardTracer::with_options(StandardTraceOptions {
			disable_stack: true,
			disable_memory: true,
			disable_storage: true,
		});
		tracer.trace_prepare_execute(0, 0x55, 5000.into(), 0);
		tracer.trace_executed(1.into(), &[7.into()], &[1, 2, 3], Some((1.into(), 2.into())));

		let steps = tracer.drain().unwrap();
		assert!(steps[0].stack.is_empty());
		assert_eq!(steps[0].memory, None);
		assert_eq!(steps[0].storage, None);
	}
}

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

//! Simple executive tracer.

use ethereum_types::{Address, U256};

use trace::trace::{Action, Call, CallResult, Create, CreateResult, FlatTrace, Res, Suicide};
use trace::Tracer;
use vm;
use vm::ActionParams;

/// Simple executive tracer. Traces all calls and creates.
#[derive(Default)]
pub struct ExecutiveTracer {
	traces: Vec<FlatTrace>,
	index_stack: Vec<usize>,
	vecindex_stack: Vec<usize>,
	sublen_stack: Vec<usize>,
	skip_one: bool,
}

impl Tracer for ExecutiveTracer {
	type Output = FlatTrace;

	fn prepare_trace_call(&mut self, params: &ActionParams, depth: usize, is_builtin: bool) {
		assert!(!self.skip_one, "skip_one is used only for builtin contracts that do not have subsequent calls; in prepare_trace_call it cannot be true; qed");

		if depth != 0 && is_builtin && params.value.value() == U256::zero() {
			self.skip_one = true;
			return;
		}

		if let Some(parentlen) = self.sublen_stack.last_mut() {
			*parentlen += 1;
		}

		let trace = FlatTrace {
			trace_address: self.index_stack.clone(),
			subtraces: self.sublen_stack.last().cloned().unwrap_or(0),
			action: Action::Call(Call::from(params.clone())),
			result: Res::Call(CallResult {
				gas_used: U256::zero(),
				output: Vec::new(),
			}),
		};
		self.vecindex_stack.push(self.traces.len());
		self.traces.push(trace);
		self.index_stack.push(0);
		self.sublen_stack.push(0);
	}

	fn prepare_trace_create(&mut self, params: &ActionParams) {
		assert!(!self.skip_one, "skip_one is used only for builtin contracts that do not have subsequent calls; in prepare_trace_create it cannot be true; qed");

		if let Some(parentlen) = self.sublen_stack.last_mut() {
			*parentlen += 1;
		}

		let trace = FlatTrace {
			trace_address: self.index_stack.clone(),
			subtraces: self.sublen_stack.last().cloned().unwrap_or(0),
			action: Action::Create(Create::from(params.clone())),
			result: Res::Create(CreateResult {
				gas_used: U256::zero(),
				code: Vec::new(),
				address: Address::zero(),
			}),
		};
		self.vecindex_stack.push(self.traces.len());
		self.traces.push(trace);
		self.index_stack.push(0);
		self.sublen_stack.push(0);
	}

	fn done_trace_call(&mut self, gas_used: U256, output: &[u8]) {
		if self.skip_one {
			self.skip_one = false;
			return;
		}

		let vecindex = self.vecindex_stack.pop().expect("Executive invoked prepare_trace_call before this function; vecindex_stack is never empty; qed");
		let sublen = self.sublen_stack.pop().expect("Executive invoked prepare_trace_call before this function; sublen_stack is never empty; qed");
		self.index_stack.pop();

		self.traces[vecindex].result = Res::Call(CallResult {
			gas_used,
			output: output.into(),
		});
		self.traces[vecindex].subtraces = sublen;

		if let Some(index) = self.index_stack.last_mut() {
			*index += 1;
		}
	}

	fn done_trace_create(&mut self, gas_used: U256, code: &[u8], address: Address) {
		assert!(!self.skip_one, "skip_one is only set with prepare_trace_call for builtin contracts; they never hit done_trace_create; qed");

		let vecindex = self.vecindex_stack.pop().expect("Executive invoked prepare_trace_create before this function; vecindex_stack is never empty; qed");
		let sublen = self.sublen_stack.pop().expect("Executive invoked prepare_trace_create before this function; sublen_stack is never empty; qed");
		self.index_stack.pop();

		self.traces[vecindex].result = Res::Create(CreateResult {
			gas_used,
			code: code.into(),
			address,
		});
		self.traces[vecindex].subtraces = sublen;

		if let Some(index) = self.index_stack.last_mut() {
			*index += 1;
		}
	}

	fn done_trace_failed(&mut self, error: &vm::Error) {
		if self.skip_one {
			self.skip_one = false;
			return;
		}

		let vecindex = self.vecindex_stack.pop().expect("Executive invoked prepare_trace_call/create before this function; vecindex_stack is never empty; qed");
		let sublen = self.sublen_stack.pop().expect("Executive invoked prepare_trace_call/create before this function; sublen_stack is never empty; qed");
		self.index_stack.pop();

		let is_create = match self.traces[vecindex].action {
			Action::Create(_) => true,
			_ => false,
		};

		self.traces[vecindex].result = match is_create {
			true => Res::FailedCreate(error.into()),
			false => Res::FailedCall(error.into()),
		};
		self.traces[vecindex].subtraces = sublen;

		if let Some(index) = self.index_stack.last_mut() {
			*index += 1;
		}
	}

	fn trace_suicide(&mut self, address: Address, balance: U256, refund_address: Address) {
		if let Some(parentlen) = self.sublen_stack.last_mut() {
			*parentlen += 1;
		}

		let trace = FlatTrace {
			subtraces: 0,
			action: Action::Suicide(Suicide { address, refund_address, balance }),
			result: Res::None,
			trace_address: self.index_stack.clone(),
		};
		debug!(target: "trace", "Traced suicide {:?}", trace);
		self.traces.push(trace);

		if let Some(index) = self.index_stack.last_mut() {
			*index += 1;
		}
	}

	fn drain(self) -> Vec<FlatTrace> {
		self.traces
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use trace::trace::{Action, Res};

	fn params(value: U256) -> ActionParams {
		let mut params = ActionParams::default();
		params.value = ::vm::ActionValue::Transfer(value);
		params
	}

	#[test]
	fn should_trace_nested_calls() {
		let mut tracer = ExecutiveTracer::default();
		tracer.prepare_trace_call(&params(0.into()), 0, false);
		tracer.prepare_trace_call(&params(0.into()), 1, false);
		tracer.done_trace_call(U256::from(10), &[]);
		tracer.prepare_trace_call(&params(0.into()), 1, false);
		tracer.done_trace_call(U256::from(20), &[]);
		tracer.done_trace_call(U256::from(90), &[]);

		let traces = tracer.drain();
		assert_eq!(traces.len(), 3);
		assert_eq!(traces[0].trace_address, Vec::<usize>::new());
		assert_eq!(traces[0].subtraces, 2);
		assert_eq!(traces[1].trace_address, vec![0]);
		assert_eq!(traces[2].trace_address, vec![1]);
	}

	#[test]
	fn should_skip_builtin_calls_below_top_level() {
		let mut tracer = ExecutiveTracer::default();
		tracer.prepare_trace_call(&params(0.into()), 0, false);
		tracer.prepare_trace_call(&params(0.into()), 1, true);
		tracer.done_trace_call(U256::from(3000), &[]);
		tracer.done_trace_call(U256::from(10000), &[]);

		let traces = tracer.drain();
		assert_eq!(traces.len(), 1);
		assert_eq!(traces[0].subtraces, 0);
	}

	#[test]
	fn should_mark_failed_calls() {
		let mut tracer = ExecutiveTracer::default();
		tracer.prepare_trace_call(&params(0.into()), 0, false);
		tracer.done_trace_failed(&vm::Error::OutOfGas);

		let traces = tracer.drain();
		assert_eq!(traces.len(), 1);
		match traces[0].result {
			Res::FailedCall(::trace::trace::Error::OutOfGas) => {},
			ref other => panic!("unexpected result: {:?}", other),
		}
		match traces[0].action {
			Action::Call(_) => {},
			ref other => panic!("unexpected action: {:?}", other),
		}
	}
}

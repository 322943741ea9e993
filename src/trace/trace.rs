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

//! Tracing data types.

use bytes::Bytes;
use ethereum_types::{Address, U256};

use vm;
use vm::{ActionParams, ActionValue, CallType};

/// Trace-level classification of an execution failure. A compressed
/// mirror of `vm::Error` carrying no payload, suitable for storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
	/// Execution ran out of gas.
	OutOfGas,
	/// Jump position was invalid.
	BadJumpDestination,
	/// Instruction was invalid.
	BadInstruction,
	/// Stack underflowed.
	StackUnderflow,
	/// Stack limit was exceeded.
	OutOfStack,
	/// A built-in failed.
	BuiltIn,
	/// State mutation inside a static context.
	MutableCallInStaticContext,
	/// The frame reverted.
	Reverted,
	/// Host failure.
	Internal,
}

impl<'a> From<&'a vm::Error> for Error {
	fn from(err: &'a vm::Error) -> Self {
		match *err {
			vm::Error::OutOfGas => Error::OutOfGas,
			vm::Error::BadJumpDestination { .. } => Error::BadJumpDestination,
			vm::Error::BadInstruction { .. } => Error::BadInstruction,
			vm::Error::StackUnderflow { .. } => Error::StackUnderflow,
			vm::Error::OutOfStack { .. } => Error::OutOfStack,
			vm::Error::BuiltIn(_) => Error::BuiltIn,
			vm::Error::MutableCallInStaticContext => Error::MutableCallInStaticContext,
			vm::Error::Reverted => Error::Reverted,
			vm::Error::Internal(_) => Error::Internal,
		}
	}
}

/// Description of a call action, either a `CALL` operation or a message
/// transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
	/// The sending account.
	pub from: Address,
	/// The destination account.
	pub to: Address,
	/// The value transferred to the destination account.
	pub value: U256,
	/// The gas available for executing the call.
	pub gas: U256,
	/// The input data provided to the call.
	pub input: Bytes,
	/// The type of the call.
	pub call_type: CallType,
}

impl From<ActionParams> for Call {
	fn from(p: ActionParams) -> Self {
		match p.call_type {
			CallType::DelegateCall | CallType::CallCode => Call {
				from: p.address,
				to: p.code_address,
				value: p.value.value(),
				gas: p.gas,
				input: p.data.unwrap_or_else(Vec::new),
				call_type: p.call_type,
			},
			_ => Call {
				from: p.sender,
				to: p.address,
				value: p.value.value(),
				gas: p.gas,
				input: p.data.unwrap_or_else(Vec::new),
				call_type: p.call_type,
			},
		}
	}
}

/// Description of a create action, either a `CREATE` operation or a create
/// transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Create {
	/// The address of the creator.
	pub from: Address,
	/// The value with which the new account is endowed.
	pub value: U256,
	/// The gas available for the creation init code.
	pub gas: U256,
	/// The init code.
	pub init: Bytes,
}

impl From<ActionParams> for Create {
	fn from(p: ActionParams) -> Self {
		Create {
			from: p.sender,
			value: match p.value {
				ActionValue::Transfer(v) | ActionValue::Apparent(v) => v,
			},
			gas: p.gas,
			init: p.code.map_or_else(Vec::new, |c| (*c).clone()),
		}
	}
}

/// Suicide action.
#[derive(Debug, Clone, PartialEq)]
pub struct Suicide {
	/// Suicided address.
	pub address: Address,
	/// Suicided contract heir.
	pub refund_address: Address,
	/// Balance of the contract just before suicide.
	pub balance: U256,
}

/// Description of an action that we trace.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
	/// It's a call action.
	Call(Call),
	/// It's a create action.
	Create(Create),
	/// Suicide.
	Suicide(Suicide),
}

/// Call result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallResult {
	/// Gas used by call.
	pub gas_used: U256,
	/// Call Output.
	pub output: Bytes,
}

/// Create result.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateResult {
	/// Gas used by create.
	pub gas_used: U256,
	/// Code of the newly created contract.
	pub code: Bytes,
	/// Address of the newly created contract.
	pub address: Address,
}

/// Description of the result of an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Res {
	/// Successful call action result.
	Call(CallResult),
	/// Successful create action result.
	Create(CreateResult),
	/// Failed call.
	FailedCall(Error),
	/// Failed create.
	FailedCreate(Error),
	/// None.
	None,
}

/// A flat trace: one record per action, in depth-first order, addressed by
/// its path in the call tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTrace {
	/// Type of action performed by a transaction.
	pub action: Action,
	/// Result of this action.
	pub result: Res,
	/// Number of subtraces.
	pub subtraces: usize,
	/// Exact location of trace.
	///
	/// [index in root, index in first CALL, index in second CALL, ...]
	pub trace_address: Vec<usize>,
}

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

//! VM errors module.

use std::fmt;

use trie::TrieError;

/// VM errors.
///
/// Except for `Internal`, all of these are recovered at the call frame that
/// raised them: gas is zeroed (or preserved for an explicit revert), the
/// frame's state changes are rolled back, and the parent observes a failure
/// return. `Internal` means the host itself failed and must not be
/// recovered from.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// `OutOfGas` is returned when transaction execution runs out of gas.
	/// It does not mean the transaction was invalid: the up-front gas cost
	/// stays paid and the nonce stays consumed.
	OutOfGas,
	/// Execution tried to jump to a position not marked with JUMPDEST.
	BadJumpDestination {
		/// Position the code tried to jump to.
		destination: usize,
	},
	/// An unrecognized instruction was executed.
	BadInstruction {
		/// Unrecognized opcode.
		instruction: u8,
	},
	/// Not enough stack elements to execute an instruction.
	StackUnderflow {
		/// Invoked instruction.
		instruction: &'static str,
		/// How many stack elements the instruction requested.
		wanted: usize,
		/// How many elements were on the stack.
		on_stack: usize,
	},
	/// Execution would exceed the defined stack limit.
	OutOfStack {
		/// Invoked instruction.
		instruction: &'static str,
		/// How many stack elements the instruction wanted to push.
		wanted: usize,
		/// What the stack limit is.
		limit: usize,
	},
	/// A built-in (precompiled) contract failed on the given input.
	BuiltIn(&'static str),
	/// A state-mutating operation ran inside a static context.
	MutableCallInStaticContext,
	/// The frame executed the REVERT instruction. Remaining gas is
	/// returned to the caller; the frame's state changes are discarded.
	Reverted,
	/// An internal host failure, such as database trouble or a broken
	/// invariant. Never ignored: continuing would mean silent chain
	/// divergence.
	Internal(String),
}

impl From<Box<TrieError>> for Error {
	fn from(err: Box<TrieError>) -> Self {
		Error::Internal(format!("Internal error: {}", err))
	}
}

impl From<::state::Error> for Error {
	fn from(err: ::state::Error) -> Self {
		match err {
			::state::Error::Trie(err) => err.into(),
			other => Error::Internal(format!("Internal error: {}", other)),
		}
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::Error::*;
		match *self {
			OutOfGas => write!(f, "Out of gas"),
			BadJumpDestination { destination } => write!(f, "Bad jump destination {:x}", destination),
			BadInstruction { instruction } => write!(f, "Bad instruction {:x}", instruction),
			StackUnderflow { instruction, wanted, on_stack } =>
				write!(f, "Stack underflow {} {}/{}", instruction, wanted, on_stack),
			OutOfStack { instruction, wanted, limit } =>
				write!(f, "Out of stack {} {}/{}", instruction, wanted, limit),
			BuiltIn(name) => write!(f, "Built-in failed: {}", name),
			MutableCallInStaticContext => write!(f, "Mutable call in static context"),
			Reverted => write!(f, "Reverted by bytecode"),
			Internal(ref msg) => write!(f, "Internal error: {}", msg),
		}
	}
}

/// A specialized version of Result over VM errors.
pub type Result<T> = ::std::result::Result<T, Error>;

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

//! Transaction execution format module.

use std::fmt;

use bytes::Bytes;
use ethereum_types::{Address, U256, U512};

use log_entry::LogEntry;
use vm;

/// Transaction execution receipt.
#[derive(Debug, PartialEq, Clone)]
pub struct Executed<T = (), V = ()> {
	/// True if the outer call/create resulted in an exceptional exit.
	pub exception: Option<vm::Error>,

	/// Gas paid up front for execution of transaction.
	pub gas: U256,

	/// Gas used during execution of transaction.
	pub gas_used: U256,

	/// Gas refunded after the execution of transaction.
	/// To get gas that was required up front, add `refunded` and
	/// `gas_used`.
	pub refunded: U256,

	/// Cumulative gas used in current block so far.
	///
	/// `cumulative_gas_used = gas_used(t0) + gas_used(t1) + ... gas_used(tn)`
	///
	/// where `tn` is current transaction.
	pub cumulative_gas_used: U256,

	/// Transaction output.
	pub output: Bytes,

	/// Any logs.
	pub logs: Vec<LogEntry>,

	/// Addresses of contracts created during execution of transaction.
	/// Ordered from earliest creation.
	pub contracts_created: Vec<Address>,

	/// The trace of this transaction.
	pub trace: Vec<T>,

	/// The VM trace of this transaction.
	pub vm_trace: Option<V>,
}

impl<T, V> Executed<T, V> {
	/// The receipt-level classification of this execution's failure, if it
	/// failed.
	pub fn transaction_exception(&self) -> Option<TransactionException> {
		self.exception.as_ref().map(Into::into)
	}
}

/// Result of executing the transaction.
#[derive(PartialEq, Debug, Clone)]
pub enum ExecutionError {
	/// Returned when the transaction does not fit into the current block.
	BlockGasLimitReached {
		/// Gas limit of block for transaction.
		gas_limit: U256,
		/// Gas used in block prior to transaction.
		gas_used: U256,
		/// Amount of gas in block.
		gas: U256,
	},
	/// Returned when transaction gas does not cover its intrinsic cost.
	NotEnoughBaseGas {
		/// Absolute minimum gas required.
		required: U256,
		/// Gas provided.
		got: U256,
	},
	/// Returned when transaction nonce does not match the state nonce.
	InvalidNonce {
		/// Nonce expected.
		expected: U256,
		/// Nonce found.
		got: U256,
	},
	/// Returned when the cost of transaction (value + gas_price * gas)
	/// exceeds the current sender balance.
	NotEnoughCash {
		/// Minimum required balance.
		required: U512,
		/// Actual balance.
		got: U512,
	},
	/// Returned when the transaction is structurally wrong, e.g. its gas
	/// arithmetic overflows.
	TransactionMalformed(String),
	/// Returned when an internal (host or database) error happened; never
	/// recovered from.
	Internal(String),
}

impl From<Box<::trie::TrieError>> for ExecutionError {
	fn from(err: Box<::trie::TrieError>) -> Self {
		ExecutionError::Internal(format!("{}", err))
	}
}

impl From<::state::Error> for ExecutionError {
	fn from(err: ::state::Error) -> Self {
		ExecutionError::Internal(format!("{}", err))
	}
}

impl fmt::Display for ExecutionError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::ExecutionError::*;
		match *self {
			BlockGasLimitReached { ref gas_limit, ref gas_used, ref gas } =>
				write!(f, "Block gas limit reached. The limit is {}, {} has already been used, and {} more is required", gas_limit, gas_used, gas),
			NotEnoughBaseGas { ref required, ref got } =>
				write!(f, "Not enough base gas. {} is required, but only {} paid", required, got),
			InvalidNonce { ref expected, ref got } =>
				write!(f, "Invalid transaction nonce: expected {}, found {}", expected, got),
			NotEnoughCash { ref required, ref got } =>
				write!(f, "Cost of transaction exceeds sender balance. {} is required but the sender only has {}", required, got),
			TransactionMalformed(ref err) => write!(f, "Malformed transaction: {}", err),
			Internal(ref msg) => write!(f, "Internal error: {}", msg),
		}
	}
}

/// The receipt-level classification of a failed (or failing) transaction,
/// covering both pre-execution rejections and machine faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionException {
	/// Transaction did not fit into the block's remaining gas.
	BlockGasLimitReached,
	/// Gas did not cover the intrinsic cost (or an up-front built-in
	/// cost).
	OutOfGasBase,
	/// Sender recovery failed upstream.
	InvalidSignature,
	/// Transaction nonce did not match the account nonce.
	InvalidNonce,
	/// Sender balance could not cover value plus gas.
	NotEnoughCash,
	/// Execution ran out of gas.
	OutOfGas,
	/// Jump to a position not marked JUMPDEST.
	BadJumpDestination,
	/// Unrecognized instruction.
	BadInstruction,
	/// Not enough stack elements.
	StackUnderflow,
	/// Stack limit exceeded.
	OutOfStack,
	/// The REVERT instruction was executed.
	Revert,
	/// A mutating operation ran inside a static context.
	StaticModeViolation,
	/// Internal host failure; fatal.
	Internal,
}

impl<'a> From<&'a vm::Error> for TransactionException {
	fn from(err: &'a vm::Error) -> Self {
		match *err {
			vm::Error::OutOfGas | vm::Error::BuiltIn(_) => TransactionException::OutOfGas,
			vm::Error::BadJumpDestination { .. } => TransactionException::BadJumpDestination,
			vm::Error::BadInstruction { .. } => TransactionException::BadInstruction,
			vm::Error::StackUnderflow { .. } => TransactionException::StackUnderflow,
			vm::Error::OutOfStack { .. } => TransactionException::OutOfStack,
			vm::Error::MutableCallInStaticContext => TransactionException::StaticModeViolation,
			vm::Error::Reverted => TransactionException::Revert,
			vm::Error::Internal(_) => TransactionException::Internal,
		}
	}
}

impl<'a> From<&'a ExecutionError> for TransactionException {
	fn from(err: &'a ExecutionError) -> Self {
		match *err {
			ExecutionError::BlockGasLimitReached { .. } => TransactionException::BlockGasLimitReached,
			ExecutionError::NotEnoughBaseGas { .. } => TransactionException::OutOfGasBase,
			ExecutionError::InvalidNonce { .. } => TransactionException::InvalidNonce,
			ExecutionError::NotEnoughCash { .. } => TransactionException::NotEnoughCash,
			ExecutionError::TransactionMalformed(_) | ExecutionError::Internal(_) => TransactionException::Internal,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exception_classification() {
		assert_eq!(TransactionException::from(&vm::Error::Reverted), TransactionException::Revert);
		assert_eq!(
			TransactionException::from(&vm::Error::MutableCallInStaticContext),
			TransactionException::StaticModeViolation
		);
		let err = ExecutionError::NotEnoughBaseGas { required: 21000.into(), got: 20999.into() };
		assert_eq!(TransactionException::from(&err), TransactionException::OutOfGasBase);
	}
}

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

//! Transaction data structure.
//!
//! Wire decoding and signature recovery happen upstream; the executor only
//! ever sees a `SignedTransaction`, which pairs the plain transaction with
//! its recovered sender.

use std::ops::Deref;

use bytes::Bytes;
use ethereum_types::{Address, U256};

use vm::Schedule;

/// Transaction action: a plain message call, or the creation of a new
/// contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
	/// Create creates new contract.
	Create,
	/// Calls contract at given address.
	/// In the case of a transfer, this is the receiver's address.
	Call(Address),
}

impl Default for Action {
	fn default() -> Action {
		Action::Create
	}
}

/// A set of information describing an externally-originating message call
/// or contract creation operation.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
	/// Nonce.
	pub nonce: U256,
	/// Gas price.
	pub gas_price: U256,
	/// Gas paid up front for transaction execution.
	pub gas: U256,
	/// Action, may be create or call.
	pub action: Action,
	/// Transferred value.
	pub value: U256,
	/// Transaction data.
	pub data: Bytes,
}

/// The intrinsic gas a transaction pays before any code runs: a fixed cost
/// depending on whether it creates a contract, plus a per-byte cost on its
/// data.
pub fn gas_required_for(is_create: bool, data: &[u8], schedule: &Schedule) -> u64 {
	data.iter().fold(
		(if is_create { schedule.tx_create_gas } else { schedule.tx_gas }) as u64,
		|g, b| {
			g + (match *b {
				0 => schedule.tx_data_zero_gas,
				_ => schedule.tx_data_non_zero_gas,
			}) as u64
		},
	)
}

impl Transaction {
	/// The intrinsic gas required by this transaction under `schedule`.
	pub fn gas_required(&self, schedule: &Schedule) -> u64 {
		gas_required_for(self.action == Action::Create, &self.data, schedule)
	}

	/// Attach a known sender, producing a `SignedTransaction` without a
	/// real signature. Legitimate only for test and internal-call
	/// contexts where signature checking does not matter.
	pub fn fake_sign(self, sender: Address) -> SignedTransaction {
		SignedTransaction {
			transaction: self,
			sender,
		}
	}
}

/// A transaction whose sender has been recovered (or, for internal calls
/// and tests, fixed without a signature).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	transaction: Transaction,
	sender: Address,
}

impl Deref for SignedTransaction {
	type Target = Transaction;

	fn deref(&self) -> &Transaction {
		&self.transaction
	}
}

impl SignedTransaction {
	/// Returns transaction sender.
	pub fn sender(&self) -> Address {
		self.sender
	}

	/// Consume and return the plain transaction.
	pub fn into_unsigned(self) -> Transaction {
		self.transaction
	}
}

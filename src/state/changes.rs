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

//! Reversible atomic state mutations.
//!
//! Every mutation of the account cache appends exactly one `Change` to the
//! state changelog, carrying whatever is needed to undo it. Rolling back to
//! a savepoint pops entries and applies their inverses in reverse order,
//! which restores the cache bit-for-bit without cloning it.

use std::sync::Arc;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

/// A single reversible mutation recorded by the state changelog.
#[derive(Debug, Clone)]
pub enum Change {
	/// Balance changed; `amount` was added (wrapping, so a debit is logged
	/// as the two's-complement of the value). Undo subtracts it back.
	Balance {
		/// Changed account.
		address: Address,
		/// Amount added to the balance.
		amount: U256,
	},
	/// Storage slot written. Undo restores `had_value` into the overlay;
	/// a zero is an explicit slot clear.
	Storage {
		/// Changed account.
		address: Address,
		/// Storage key written.
		key: H256,
		/// Value the slot held before the write.
		had_value: H256,
	},
	/// Nonce incremented by one. Undo decrements.
	Nonce {
		/// Changed account.
		address: Address,
	},
	/// Account created where none existed. Undo purges it from the cache
	/// and re-marks the address non-existing.
	Create {
		/// Created account.
		address: Address,
	},
	/// Code installed by a create frame. Undo restores the previous code,
	/// hash and pending-insertion flag.
	NewCode {
		/// Changed account.
		address: Address,
		/// Code hash before the change.
		had_code_hash: H256,
		/// Code before the change.
		had_code: Arc<Bytes>,
		/// Whether code insertion was already pending before the change.
		had_new_code: bool,
	},
	/// Account touched for the first time in this transaction. Undo
	/// removes it from the touched set.
	Touch {
		/// Touched account.
		address: Address,
	},
}

impl Change {
	/// The account the change concerns.
	pub fn address(&self) -> &Address {
		match *self {
			Change::Balance { ref address, .. }
			| Change::Storage { ref address, .. }
			| Change::Nonce { ref address }
			| Change::Create { ref address }
			| Change::NewCode { ref address, .. }
			| Change::Touch { ref address } => address,
		}
	}
}

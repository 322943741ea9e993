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

//! Return data structures.

use ethereum_types::U256;

/// Return data buffer. Held by the machine and copied into the caller's
/// view without reallocating.
#[derive(Debug, PartialEq)]
pub struct ReturnData {
	mem: Vec<u8>,
	offset: usize,
	size: usize,
}

impl ::std::ops::Deref for ReturnData {
	type Target = [u8];
	fn deref(&self) -> &[u8] {
		&self.mem[self.offset..self.offset + self.size]
	}
}

impl ReturnData {
	/// Create empty `ReturnData`.
	pub fn empty() -> Self {
		ReturnData {
			mem: Vec::new(),
			offset: 0,
			size: 0,
		}
	}

	/// Create `ReturnData` from a buffer and a window into it.
	pub fn new(mem: Vec<u8>, offset: usize, size: usize) -> Self {
		ReturnData { mem, offset, size }
	}

	/// Copy the visible window out into a standalone buffer.
	pub fn to_vec(&self) -> Vec<u8> {
		self[..].to_vec()
	}
}

/// Gas left after execution: either a known value, or a value that still
/// needs the return instruction processed by the host.
#[derive(Debug)]
pub enum GasLeft {
	/// Known gas left.
	Known(U256),
	/// Return or revert instruction must be processed.
	NeedsReturn {
		/// Amount of gas left.
		gas_left: U256,
		/// Return data buffer.
		data: ReturnData,
		/// Whether the frame's state changes apply. `false` on revert.
		apply_state: bool,
	},
}

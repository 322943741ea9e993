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

//! Standard built-in contracts.
//!
//! A built-in is an address whose "code" is a native routine with a fixed
//! cost function. The chain oracle decides which addresses carry built-ins
//! and from which block they are active; the table is pluggable, so a seal
//! engine can register whatever native routines its chain defines.

use bytes::BytesRef;
use ethereum_types::U256;

use vm::BlockNumber;

/// Execution error.
pub type Error = &'static str;

/// Costs a built-in invocation for a given input.
pub trait Pricer: Send + Sync {
	/// The gas cost of running this built-in for the given input data.
	fn cost(&self, input: &[u8]) -> U256;
}

/// A linear pricing model: `base + word * ceil(len / 32)`.
pub struct Linear {
	/// Cost charged on every invocation.
	pub base: usize,
	/// Cost charged per 32-byte word of input.
	pub word: usize,
}

impl Pricer for Linear {
	fn cost(&self, input: &[u8]) -> U256 {
		U256::from(self.base) + U256::from(input.len() + 31) / U256::from(32) * U256::from(self.word)
	}
}

/// Native implementation of a built-in contract.
pub trait Implementation: Send + Sync {
	/// Execute the built-in on `input`, writing the result into `output`.
	fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), Error>;
}

/// The identity built-in: copies its input to its output.
pub struct Identity;

impl Implementation for Identity {
	fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), Error> {
		output.write(0, input);
		Ok(())
	}
}

/// A built-in contract: pricing model, native routine and activation block.
pub struct Builtin {
	pricer: Box<dyn Pricer>,
	native: Box<dyn Implementation>,
	activate_at: BlockNumber,
}

impl Builtin {
	/// Create a built-in from its parts.
	pub fn new(pricer: Box<dyn Pricer>, native: Box<dyn Implementation>, activate_at: BlockNumber) -> Builtin {
		Builtin { pricer, native, activate_at }
	}

	/// The identity built-in at its mainnet pricing.
	pub fn identity(activate_at: BlockNumber) -> Builtin {
		Builtin::new(Box::new(Linear { base: 15, word: 3 }), Box::new(Identity), activate_at)
	}

	/// Simple forwarder for cost.
	pub fn cost(&self, input: &[u8]) -> U256 {
		self.pricer.cost(input)
	}

	/// Simple forwarder for execute.
	pub fn execute(&self, input: &[u8], output: &mut BytesRef) -> Result<(), Error> {
		self.native.execute(input, output)
	}

	/// Whether the built-in is active at the given block.
	pub fn is_active(&self, at: BlockNumber) -> bool {
		at >= self.activate_at
	}
}

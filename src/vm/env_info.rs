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

//! Environment information for transaction execution.

use std::sync::Arc;

use ethereum_types::{Address, H256, U256};

/// A block number.
pub type BlockNumber = u64;

/// Simple vector of hashes. At most 256 items large, can be smaller when
/// the block number is below 257. The hash at index 0 belongs to the parent
/// block.
pub type LastHashes = Vec<H256>;

/// Information concerning the execution environment for a
/// message-call/contract-creation.
#[derive(Debug, Clone)]
pub struct EnvInfo {
	/// The block number.
	pub number: BlockNumber,
	/// The block author.
	pub author: Address,
	/// The block timestamp.
	pub timestamp: u64,
	/// The block difficulty.
	pub difficulty: U256,
	/// The block gas limit.
	pub gas_limit: U256,
	/// The last 256 block hashes.
	pub last_hashes: Arc<LastHashes>,
	/// The gas used by previous transactions in the block.
	pub gas_used: U256,
}

impl Default for EnvInfo {
	fn default() -> Self {
		EnvInfo {
			number: 0,
			author: Address::zero(),
			timestamp: 0,
			difficulty: U256::zero(),
			gas_limit: U256::zero(),
			last_hashes: Arc::new(vec![]),
			gas_used: U256::zero(),
		}
	}
}

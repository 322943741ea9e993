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

//! Chain oracle: per-block schedules, built-in contracts and fork
//! activation queries, plus the VM factory the executor draws machines
//! from. This is the executor-facing face of the consensus engine; sealing
//! itself lives elsewhere.

use std::collections::BTreeMap;

use ethereum_types::{Address, U256};

use builtin::Builtin;
use vm::{BlockNumber, CreateContractAddress, Exec, Schedule, VmFactory};

/// Parameters common to ethereum-like chains.
pub struct CommonParams {
	/// The nonce newly created accounts start at.
	pub account_start_nonce: U256,
	/// Homestead transition block number.
	pub homestead_transition: BlockNumber,
	/// EIP-150 (gas repricing) transition block number.
	pub eip150_transition: BlockNumber,
	/// EIP-158/161 (state clearing) transition block number.
	pub eip158_transition: BlockNumber,
	/// Byzantium transition block number (REVERT, STATICCALL,
	/// RETURNDATA).
	pub byzantium_transition: BlockNumber,
	/// EIP-658 transition block number (status codes in receipts).
	pub eip658_transition: BlockNumber,
	/// Maximum size of a deployed contract.
	pub max_code_size: usize,
}

impl Default for CommonParams {
	/// A mainnet-flavoured parameter set with every fork live from
	/// genesis.
	fn default() -> CommonParams {
		CommonParams {
			account_start_nonce: U256::zero(),
			homestead_transition: 0,
			eip150_transition: 0,
			eip158_transition: 0,
			byzantium_transition: 0,
			eip658_transition: 0,
			max_code_size: 24576,
		}
	}
}

/// An ethereum-like state machine: answers every question the executor has
/// for the chain, and hands out VM instances.
pub struct Machine {
	params: CommonParams,
	builtins: BTreeMap<Address, Builtin>,
	vm_factory: Box<dyn VmFactory>,
}

impl Machine {
	/// Create a machine from chain parameters, a built-in registry and a
	/// VM factory.
	pub fn new(params: CommonParams, builtins: BTreeMap<Address, Builtin>, vm_factory: Box<dyn VmFactory>) -> Machine {
		Machine { params, builtins, vm_factory }
	}

	/// Get the general parameters of the chain.
	pub fn params(&self) -> &CommonParams {
		&self.params
	}

	/// The gas schedule active at the given block.
	pub fn schedule(&self, block_number: BlockNumber) -> Schedule {
		let params = &self.params;
		if block_number >= params.byzantium_transition {
			Schedule::new_byzantium(params.max_code_size)
		} else if block_number >= params.eip158_transition {
			Schedule::new_post_eip150(params.max_code_size, true, true, true)
		} else if block_number >= params.eip150_transition {
			Schedule::new_post_eip150(usize::max_value(), false, false, false)
		} else if block_number >= params.homestead_transition {
			Schedule::new_homestead()
		} else {
			Schedule::new_frontier()
		}
	}

	/// Attempt to get a handle to a built-in contract, active at the given
	/// block.
	pub fn builtin(&self, a: &Address, block_number: BlockNumber) -> Option<&Builtin> {
		self.builtins.get(a).and_then(|b| if b.is_active(block_number) { Some(b) } else { None })
	}

	/// The scheme new contract addresses are derived with at the given
	/// block.
	pub fn create_address_scheme(&self, _number: BlockNumber) -> CreateContractAddress {
		CreateContractAddress::FromSenderAndNonce
	}

	/// Whether receipts carry status codes at the given block (EIP-658).
	pub fn eip658(&self, block_number: BlockNumber) -> bool {
		block_number >= self.params.eip658_transition
	}

	/// Build a VM instance for a call frame.
	pub fn vm(&self, schedule: &Schedule, depth: usize) -> Box<dyn Exec> {
		self.vm_factory.create(schedule, depth)
	}
}

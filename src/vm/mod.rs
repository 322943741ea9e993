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

//! Virtual machine interface.
//!
//! The executor is agnostic to the concrete machine: anything that can run
//! bytecode against an `Ext` fits behind the `Exec` trait, and a
//! `VmFactory` selects the engine (interpreter, JIT) per call frame.

mod action_params;
mod call_type;
mod env_info;
mod error;
mod ext;
mod return_data;
mod schedule;

pub use self::action_params::{ActionParams, ActionValue};
pub use self::call_type::CallType;
pub use self::env_info::{BlockNumber, EnvInfo, LastHashes};
pub use self::error::{Error, Result};
pub use self::ext::{ContractCreateResult, CreateContractAddress, Ext, MessageCallResult};
pub use self::return_data::{GasLeft, ReturnData};
pub use self::schedule::Schedule;

use ethereum_types::U256;

/// Virtual machine interface.
pub trait Exec {
	/// This function should be used to execute a transaction's code.
	/// It returns either an error, a known amount of gas left, or
	/// parameters to be used to compute the final gas left.
	fn exec(&mut self, params: ActionParams, ext: &mut dyn Ext) -> Result<GasLeft>;
}

/// Virtual machine factory: builds the concrete machine for a call frame.
pub trait VmFactory {
	/// Build a VM instance for a frame with the given schedule and depth.
	fn create(&self, schedule: &Schedule, depth: usize) -> Box<dyn Exec>;
}

/// Gas left with the frame outcome folded in: `apply_state` is false when
/// the frame reverted.
#[derive(Debug)]
pub struct FinalizationResult {
	/// How much gas is left after the frame.
	pub gas_left: U256,
	/// Whether the frame's state changes apply.
	pub apply_state: bool,
	/// The frame's return data.
	pub return_data: ReturnData,
}

/// Types that can be "finalized" against an `Ext`, processing a pending
/// return instruction into a final gas figure.
pub trait Finalize {
	/// Consume the externalities, call `ret` if necessary, and produce the
	/// final result.
	fn finalize<E: Ext>(self, ext: E) -> Result<FinalizationResult>;
}

impl Finalize for Result<GasLeft> {
	fn finalize<E: Ext>(self, ext: E) -> Result<FinalizationResult> {
		match self {
			Ok(GasLeft::Known(gas_left)) => Ok(FinalizationResult {
				gas_left,
				apply_state: true,
				return_data: ReturnData::empty(),
			}),
			Ok(GasLeft::NeedsReturn { gas_left, data, apply_state }) => {
				ext.ret(&gas_left, &data, apply_state).map(|gas_left| FinalizationResult {
					gas_left,
					apply_state,
					return_data: data,
				})
			},
			Err(err) => Err(err),
		}
	}
}

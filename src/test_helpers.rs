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

//! Test helpers: in-memory states, a ready-made machine, and a scripted
//! stand-in for the virtual machine.
//!
//! The machine proper is external to this crate, so executor tests drive
//! the host interface with `ScriptedVm`: a fake `Exec` that performs a
//! fixed sequence of host operations. It mirrors the classic fake-ext
//! testing device with the roles swapped: here the host is real and the
//! machine is scripted.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use ethereum_types::{Address, BigEndianHash, H256, U256};

use builtin::Builtin;
use db::MemoryDB;
use machine::{CommonParams, Machine};
use state::State;
use vm::{
	self, ActionParams, CallType, ContractCreateResult, CreateContractAddress, Exec, Ext,
	GasLeft, MessageCallResult, ReturnData, Schedule, VmFactory,
};

/// Set up logging for test output. Safe to call repeatedly.
pub fn init_log() {
	let _ = ::env_logger::builder().is_test(true).try_init();
}

/// Fresh in-memory state with a zero account start nonce.
pub fn new_state() -> State<MemoryDB> {
	State::new(MemoryDB::new(), U256::zero())
}

/// A machine with every fork live from genesis, the identity built-in at
/// address 4 and no scripted machines queued.
pub fn new_machine() -> Machine {
	machine_with_vms(vec![])
}

/// Like `new_machine`, with scripted machines queued for the frames the
/// test will spawn, in depth-first spawn order.
pub fn machine_with_vms(vms: Vec<ScriptedVm>) -> Machine {
	let mut builtins = BTreeMap::new();
	builtins.insert(Address::from_low_u64_be(4), Builtin::identity(0));
	Machine::new(CommonParams::default(), builtins, Box::new(ScriptedFactory::new(vms)))
}

/// A machine that starts on the Frontier schedule and activates every
/// later fork at `transition`.
pub fn new_frontier_machine(transition: u64) -> Machine {
	let params = CommonParams {
		homestead_transition: transition,
		eip150_transition: transition,
		eip158_transition: transition,
		byzantium_transition: transition,
		eip658_transition: transition,
		..Default::default()
	};
	Machine::new(params, BTreeMap::new(), Box::new(ScriptedFactory::new(vec![])))
}

/// One scripted host operation.
pub enum Op {
	/// Burn the given amount of gas; out-of-gas when it does not fit.
	UseGas(u64),
	/// Read a storage slot and discard the value.
	SLoad(H256),
	/// Write a storage slot, counting SSTORE clears for the refund.
	SStore(H256, H256),
	/// Emit a log.
	Log(Vec<H256>, Vec<u8>),
	/// Re-enter the host with a message call, forwarding the given gas.
	Call {
		/// Gas forwarded to the callee.
		gas: u64,
		/// Callee address (also the code address).
		to: Address,
		/// Transferred value; `None` keeps the apparent value.
		value: Option<U256>,
		/// Call data.
		data: Vec<u8>,
		/// Kind of call.
		call_type: CallType,
	},
	/// Re-enter the host with a contract creation.
	Create {
		/// Gas forwarded to the init frame.
		gas: u64,
		/// Endowment.
		value: U256,
		/// Init code.
		code: Vec<u8>,
	},
	/// Self-destruct in favour of the given heir and halt.
	Suicide(Address),
	/// Halt returning the given data.
	Return(Vec<u8>),
	/// Revert with the given data.
	Revert(Vec<u8>),
	/// Halt with the given machine error.
	Fail(vm::Error),
}

impl Op {
	fn opcode(&self) -> u8 {
		match *self {
			Op::UseGas(_) => 0x5b,
			Op::SLoad(..) => 0x54,
			Op::SStore(..) => 0x55,
			Op::Log(..) => 0xa1,
			Op::Call { .. } => 0xf1,
			Op::Create { .. } => 0xf0,
			Op::Suicide(_) => 0xff,
			Op::Return(_) => 0xf3,
			Op::Revert(_) => 0xfd,
			Op::Fail(_) => 0xfe,
		}
	}
}

/// A fake machine executing a fixed script of host operations.
pub struct ScriptedVm {
	ops: Vec<Op>,
}

impl ScriptedVm {
	/// Build a machine that will run the given script.
	pub fn new(ops: Vec<Op>) -> ScriptedVm {
		ScriptedVm { ops }
	}
}

impl Exec for ScriptedVm {
	fn exec(&mut self, params: ActionParams, ext: &mut dyn Ext) -> vm::Result<GasLeft> {
		let mut gas = params.gas;
		let ops = ::std::mem::replace(&mut self.ops, Vec::new());
		for (pc, op) in ops.into_iter().enumerate() {
			let cost = match op {
				Op::UseGas(n) => U256::from(n),
				_ => U256::zero(),
			};
			ext.trace_prepare_execute(pc, op.opcode(), cost);
			let mut store_diff = None;
			match op {
				Op::UseGas(n) => {
					let n = U256::from(n);
					if gas < n {
						return Err(vm::Error::OutOfGas);
					}
					gas = gas - n;
				},
				Op::SLoad(key) => {
					ext.storage_at(&key)?;
				},
				Op::SStore(key, value) => {
					let prev = ext.storage_at(&key)?;
					if !prev.is_zero() && value.is_zero() {
						ext.inc_sstore_clears();
					}
					ext.set_storage(key, value)?;
					store_diff = Some((key.into_uint(), value.into_uint()));
				},
				Op::Log(topics, data) => {
					ext.log(topics, &data)?;
				},
				Op::Call { gas: call_gas, to, value, data, call_type } => {
					let call_gas = U256::from(call_gas);
					if gas < call_gas {
						return Err(vm::Error::OutOfGas);
					}
					gas = gas - call_gas;
					match ext.call(&call_gas, &params.address, &to, value, &data, &to, call_type) {
						MessageCallResult::Success(gas_left, _)
						| MessageCallResult::Reverted(gas_left, _) => {
							gas = gas + gas_left;
						},
						MessageCallResult::Failed => {},
					}
				},
				Op::Create { gas: create_gas, value, code } => {
					let create_gas = U256::from(create_gas);
					if gas < create_gas {
						return Err(vm::Error::OutOfGas);
					}
					gas = gas - create_gas;
					match ext.create(&create_gas, &value, &code, CreateContractAddress::FromSenderAndNonce) {
						ContractCreateResult::Created(_, gas_left)
						| ContractCreateResult::Reverted(gas_left, _) => {
							gas = gas + gas_left;
						},
						ContractCreateResult::Failed => {},
					}
				},
				Op::Suicide(refund) => {
					ext.suicide(&refund)?;
					ext.trace_executed(gas, &[], &[], None);
					return Ok(GasLeft::Known(gas));
				},
				Op::Return(data) => {
					let len = data.len();
					return Ok(GasLeft::NeedsReturn {
						gas_left: gas,
						data: ReturnData::new(data, 0, len),
						apply_state: true,
					});
				},
				Op::Revert(data) => {
					let len = data.len();
					return Ok(GasLeft::NeedsReturn {
						gas_left: gas,
						data: ReturnData::new(data, 0, len),
						apply_state: false,
					});
				},
				Op::Fail(err) => return Err(err),
			}
			ext.trace_executed(gas, &[], &[], store_diff);
		}
		Ok(GasLeft::Known(gas))
	}
}

/// Hands out queued `ScriptedVm`s, one per spawned frame.
pub struct ScriptedFactory {
	vms: RefCell<VecDeque<ScriptedVm>>,
}

impl ScriptedFactory {
	/// Queue the given machines.
	pub fn new(vms: Vec<ScriptedVm>) -> ScriptedFactory {
		ScriptedFactory {
			vms: RefCell::new(vms.into_iter().collect()),
		}
	}
}

impl VmFactory for ScriptedFactory {
	fn create(&self, _schedule: &Schedule, _depth: usize) -> Box<dyn Exec> {
		Box::new(
			self.vms
				.borrow_mut()
				.pop_front()
				.expect("a scripted machine is queued for every frame the test spawns"),
		)
	}
}

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

//! Transaction Execution environment.

use std::cmp;
use std::sync::Arc;

use ethereum_types::{Address, H256, U256};

use db::Backend;
use executive::{contract_address, Executive};
use log_entry::LogEntry;
use machine::Machine;
use state::State;
use substate::Substate;
use trace::{Tracer, VMTracer};
use vm::{
	self, ActionParams, ActionValue, CallType, ContractCreateResult, CreateContractAddress,
	EnvInfo, Ext, FinalizationResult, MessageCallResult, ReturnData, Schedule,
};

/// Policy for handling output data on `RETURN` opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPolicy {
	/// Return reference to fixed sized output.
	/// Used for message calls.
	Return,
	/// Init new contract as soon as `RETURN` is called.
	InitContract,
}

/// Transaction properties that externalities need to know about.
#[derive(Debug)]
pub struct OriginInfo {
	address: Address,
	origin: Address,
	gas_price: U256,
	value: U256,
}

impl OriginInfo {
	/// Populates origin info from action params.
	pub fn from(params: &ActionParams) -> Self {
		OriginInfo {
			address: params.address,
			origin: params.origin,
			gas_price: params.gas_price,
			value: params.value.value(),
		}
	}
}

/// Implementation of evm Externalities.
///
/// One instance backs one call frame; nested frames spawn a child
/// `Executive` which builds its own instance against the same state.
pub struct Externalities<'a, T: 'a, V: 'a, B: 'a>
	where T: Tracer, V: VMTracer, B: Backend
{
	state: &'a mut State<B>,
	env_info: &'a EnvInfo,
	machine: &'a Machine,
	schedule: &'a Schedule,
	depth: usize,
	origin_info: OriginInfo,
	substate: &'a mut Substate,
	output: OutputPolicy,
	static_flag: bool,
	tracer: &'a mut T,
	vm_tracer: &'a mut V,
}

impl<'a, T: 'a, V: 'a, B: 'a> Externalities<'a, T, V, B>
	where T: Tracer, V: VMTracer, B: Backend
{
	/// Basic `Externalities` constructor.
	pub fn new(
		state: &'a mut State<B>,
		env_info: &'a EnvInfo,
		machine: &'a Machine,
		schedule: &'a Schedule,
		depth: usize,
		origin_info: OriginInfo,
		substate: &'a mut Substate,
		output: OutputPolicy,
		static_flag: bool,
		tracer: &'a mut T,
		vm_tracer: &'a mut V,
	) -> Self {
		Externalities {
			state,
			env_info,
			machine,
			schedule,
			depth,
			origin_info,
			substate,
			output,
			static_flag,
			tracer,
			vm_tracer,
		}
	}
}

impl<'a, T: 'a, V: 'a, B: 'a> Ext for Externalities<'a, T, V, B>
	where T: Tracer, V: VMTracer, B: Backend
{
	fn storage_at(&self, key: &H256) -> vm::Result<H256> {
		self.state.storage_at(&self.origin_info.address, key).map_err(Into::into)
	}

	fn set_storage(&mut self, key: H256, value: H256) -> vm::Result<()> {
		if self.static_flag {
			Err(vm::Error::MutableCallInStaticContext)
		} else {
			self.state.set_storage(&self.origin_info.address, key, value).map_err(Into::into)
		}
	}

	fn exists(&self, address: &Address) -> vm::Result<bool> {
		self.state.exists(address).map_err(Into::into)
	}

	fn exists_and_not_null(&self, address: &Address) -> vm::Result<bool> {
		self.state.exists_and_not_null(address).map_err(Into::into)
	}

	fn origin_balance(&self) -> vm::Result<U256> {
		self.balance(&self.origin_info.address)
	}

	fn balance(&self, address: &Address) -> vm::Result<U256> {
		self.state.balance(address).map_err(Into::into)
	}

	fn blockhash(&self, number: &U256) -> H256 {
		if *number < U256::from(self.env_info.number)
			&& number.low_u64() >= cmp::max(256, self.env_info.number) - 256
		{
			let index = self.env_info.number - number.low_u64() - 1;
			assert!(
				index < self.env_info.last_hashes.len() as u64,
				"Inconsistent env_info, should contain at least {} last hashes",
				index + 1
			);
			let r = self.env_info.last_hashes[index as usize];
			trace!(target: "ext", "blockhash({}) -> {} self.env_info.number={}", number, r, self.env_info.number);
			r
		} else {
			trace!(target: "ext", "blockhash({}) -> null self.env_info.number={}", number, self.env_info.number);
			H256::zero()
		}
	}

	fn create(&mut self, gas: &U256, value: &U256, code: &[u8], address_scheme: CreateContractAddress) -> ContractCreateResult {
		// derive the address of the new contract from the creator's nonce
		let (address, code_hash) = match self.state.nonce(&self.origin_info.address) {
			Ok(nonce) => contract_address(address_scheme, &self.origin_info.address, &nonce, code),
			Err(e) => {
				debug!(target: "ext", "Database corruption encountered: {:?}", e);
				return ContractCreateResult::Failed;
			},
		};

		let params = ActionParams {
			code_address: address,
			address,
			sender: self.origin_info.address,
			origin: self.origin_info.origin,
			gas: *gas,
			gas_price: self.origin_info.gas_price,
			value: ActionValue::Transfer(*value),
			code: Some(Arc::new(code.to_vec())),
			code_hash,
			data: None,
			call_type: CallType::None,
		};

		if let Err(e) = self.state.inc_nonce(&self.origin_info.address) {
			debug!(target: "ext", "Database corruption encountered: {:?}", e);
			return ContractCreateResult::Failed;
		}

		let mut ex = Executive::from_parent(self.state, self.env_info, self.machine, self.schedule, self.depth, self.static_flag);
		match ex.create(params, self.substate, self.tracer, self.vm_tracer) {
			Ok(FinalizationResult { gas_left, apply_state: true, .. }) => {
				self.substate.contracts_created.push(address);
				ContractCreateResult::Created(address, gas_left)
			},
			Ok(FinalizationResult { gas_left, apply_state: false, return_data }) => {
				ContractCreateResult::Reverted(gas_left, return_data)
			},
			Err(vm::Error::Internal(msg)) => {
				// continuing after a host failure would diverge from the chain
				panic!("Internal error during contract creation: {}", msg);
			},
			Err(_) => ContractCreateResult::Failed,
		}
	}

	fn call(
		&mut self,
		gas: &U256,
		sender_address: &Address,
		receive_address: &Address,
		value: Option<U256>,
		data: &[u8],
		code_address: &Address,
		call_type: CallType,
	) -> MessageCallResult {
		trace!(target: "externalities", "call");

		let code_res = self.state.code(code_address)
			.and_then(|code| self.state.code_hash(code_address).map(|hash| (code, hash)));
		let (code, code_hash) = match code_res {
			Ok((code, hash)) => (code, hash),
			Err(_) => return MessageCallResult::Failed,
		};

		let mut params = ActionParams {
			sender: *sender_address,
			address: *receive_address,
			value: ActionValue::Apparent(self.origin_info.value),
			code_address: *code_address,
			origin: self.origin_info.origin,
			gas: *gas,
			gas_price: self.origin_info.gas_price,
			code,
			code_hash: Some(code_hash),
			data: Some(data.to_vec()),
			call_type,
		};

		if let Some(value) = value {
			params.value = ActionValue::Transfer(value);
		}

		let static_flag = self.static_flag || call_type == CallType::StaticCall;
		let mut ex = Executive::from_parent(self.state, self.env_info, self.machine, self.schedule, self.depth, static_flag);
		match ex.call(params, self.substate, self.tracer, self.vm_tracer) {
			Ok(FinalizationResult { gas_left, apply_state: true, return_data }) => {
				MessageCallResult::Success(gas_left, return_data)
			},
			Ok(FinalizationResult { gas_left, apply_state: false, return_data }) => {
				MessageCallResult::Reverted(gas_left, return_data)
			},
			Err(vm::Error::Internal(msg)) => {
				// continuing after a host failure would diverge from the chain
				panic!("Internal error during message call: {}", msg);
			},
			Err(_) => MessageCallResult::Failed,
		}
	}

	fn extcode(&self, address: &Address) -> vm::Result<Option<Arc<Vec<u8>>>> {
		self.state.code(address).map_err(Into::into)
	}

	fn extcodesize(&self, address: &Address) -> vm::Result<Option<usize>> {
		self.state.code_size(address).map_err(Into::into)
	}

	fn log(&mut self, topics: Vec<H256>, data: &[u8]) -> vm::Result<()> {
		if self.static_flag {
			return Err(vm::Error::MutableCallInStaticContext);
		}
		let address = self.origin_info.address;
		self.substate.logs.push(LogEntry {
			address,
			topics,
			data: data.to_vec(),
		});
		Ok(())
	}

	fn ret(self, gas: &U256, data: &ReturnData, apply_state: bool) -> vm::Result<U256>
		where Self: Sized
	{
		match self.output {
			OutputPolicy::Return => Ok(*gas),
			OutputPolicy::InitContract if apply_state => {
				// deployed code above the cap fails outright
				if data.len() > self.schedule.create_data_limit {
					return Err(vm::Error::OutOfGas);
				}
				let return_cost = U256::from(data.len()) * U256::from(self.schedule.create_data_gas);
				if return_cost > *gas {
					return match self.schedule.exceptional_failed_code_deposit {
						true => Err(vm::Error::OutOfGas),
						// the deposit failed quietly: the frame keeps its
						// gas but no code lands at the address
						false => Ok(*gas),
					};
				}
				self.state.init_code(&self.origin_info.address, data.to_vec())?;
				Ok(*gas - return_cost)
			},
			OutputPolicy::InitContract => Ok(*gas),
		}
	}

	fn suicide(&mut self, refund_address: &Address) -> vm::Result<()> {
		let address = self.origin_info.address;
		let balance = self.balance(&address)?;
		if &address == refund_address {
			// a self-refunding suicide burns the balance
			self.state.sub_balance(&address, &balance)?;
		} else {
			trace!(target: "ext", "Suiciding {} -> {} (xfer: {})", address, refund_address, balance);
			self.state.transfer_balance(&address, refund_address, &balance)?;
		}

		self.tracer.trace_suicide(address, balance, *refund_address);
		self.substate.suicides.insert(address);

		Ok(())
	}

	fn schedule(&self) -> &Schedule {
		self.schedule
	}

	fn env_info(&self) -> &EnvInfo {
		self.env_info
	}

	fn depth(&self) -> usize {
		self.depth
	}

	fn inc_sstore_clears(&mut self) {
		self.substate.sstore_clears_count = self.substate.sstore_clears_count + U256::one();
	}

	fn is_static(&self) -> bool {
		self.static_flag
	}

	fn trace_next_instruction(&mut self, pc: usize, instruction: u8, current_gas: U256) -> bool {
		self.vm_tracer.trace_next_instruction(pc, instruction, current_gas)
	}

	fn trace_prepare_execute(&mut self, pc: usize, instruction: u8, gas_cost: U256) {
		self.vm_tracer.trace_prepare_execute(pc, instruction, gas_cost, self.depth)
	}

	fn trace_executed(&mut self, gas_left: U256, stack: &[U256], mem: &[u8], store_diff: Option<(U256, U256)>) {
		self.vm_tracer.trace_executed(gas_left, stack, mem, store_diff)
	}
}

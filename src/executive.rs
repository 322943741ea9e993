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

//! Transaction executor.
//!
//! `Executive` drives one transaction through validation, the up-front gas
//! purchase, CREATE or CALL dispatch, machine execution and finalization.
//! Sub-calls re-enter through `Externalities`, each frame taking its own
//! changelog savepoint so that any failure rolls the world back to the
//! frame boundary while the frames above it keep going.

use std::cmp;
use std::sync::Arc;

use bytes::{Bytes, BytesRef};
use ethereum_types::{Address, H256, U256, U512};
use hash::keccak;

use db::Backend;
use executed::{Executed, ExecutionError};
use externalities::{Externalities, OriginInfo, OutputPolicy};
use machine::Machine;
use state::State;
use substate::Substate;
use trace::{ExecutiveTracer, NoopTracer, NoopVMTracer, StandardTracer, Tracer, VMTracer};
use transaction::{Action, SignedTransaction};
use vm::{
	self, ActionParams, ActionValue, CallType, CreateContractAddress, EnvInfo, Finalize,
	FinalizationResult, ReturnData, Schedule,
};

/// Returns new address created from address, nonce and code hash.
pub fn contract_address(
	address_scheme: CreateContractAddress,
	sender: &Address,
	nonce: &U256,
	code: &[u8],
) -> (Address, Option<H256>) {
	use rlp::RlpStream;

	match address_scheme {
		CreateContractAddress::FromSenderAndNonce => {
			let mut stream = RlpStream::new_list(2);
			stream.append(sender);
			stream.append(nonce);
			(Address::from_slice(&keccak(stream.as_raw())[12..]), None)
		},
		CreateContractAddress::FromSenderSaltAndCodeHash(salt) => {
			let code_hash = keccak(code);
			let mut buffer = [0u8; 1 + 20 + 32 + 32];
			buffer[0] = 0xff;
			buffer[1..(1 + 20)].copy_from_slice(&sender[..]);
			buffer[(1 + 20)..(1 + 20 + 32)].copy_from_slice(&salt[..]);
			buffer[(1 + 20 + 32)..].copy_from_slice(&code_hash[..]);
			(Address::from_slice(&keccak(&buffer[..])[12..]), Some(code_hash))
		},
		CreateContractAddress::FromSenderAndCodeHash => {
			let code_hash = keccak(code);
			let mut buffer = [0u8; 20 + 32];
			buffer[..20].copy_from_slice(&sender[..]);
			buffer[20..].copy_from_slice(&code_hash[..]);
			(Address::from_slice(&keccak(&buffer[..])[12..]), Some(code_hash))
		},
	}
}

/// Transaction execution options.
pub struct TransactOptions<T, V> {
	/// Enable call tracing.
	pub tracer: T,
	/// Enable VM tracing.
	pub vm_tracer: V,
	/// Check transaction nonce before execution.
	pub check_nonce: bool,
	/// Records the output from init contract calls.
	pub output_from_init_contract: bool,
}

impl<T, V> TransactOptions<T, V> {
	/// Create new `TransactOptions` with given tracer and VM tracer.
	pub fn new(tracer: T, vm_tracer: V) -> Self {
		TransactOptions {
			tracer,
			vm_tracer,
			check_nonce: true,
			output_from_init_contract: false,
		}
	}

	/// Disables the nonce check.
	pub fn dont_check_nonce(mut self) -> Self {
		self.check_nonce = false;
		self
	}

	/// Saves the output from contract creation.
	pub fn save_output_from_contract(mut self) -> Self {
		self.output_from_init_contract = true;
		self
	}
}

impl TransactOptions<ExecutiveTracer, StandardTracer> {
	/// Creates new `TransactOptions` with default tracing and VM tracing.
	pub fn with_tracing_and_vm_tracing() -> Self {
		Self::new(ExecutiveTracer::default(), StandardTracer::default())
	}
}

impl TransactOptions<ExecutiveTracer, NoopVMTracer> {
	/// Creates new `TransactOptions` with default tracing and no VM
	/// tracing.
	pub fn with_tracing() -> Self {
		Self::new(ExecutiveTracer::default(), NoopVMTracer)
	}
}

impl TransactOptions<NoopTracer, StandardTracer> {
	/// Creates new `TransactOptions` with no tracing and default VM
	/// tracing.
	pub fn with_vm_tracing() -> Self {
		Self::new(NoopTracer, StandardTracer::default())
	}
}

impl TransactOptions<NoopTracer, NoopVMTracer> {
	/// Creates new `TransactOptions` without any tracing.
	pub fn with_no_tracing() -> Self {
		Self::new(NoopTracer, NoopVMTracer)
	}
}

/// Transaction executor.
pub struct Executive<'a, B: 'a + Backend> {
	state: &'a mut State<B>,
	info: &'a EnvInfo,
	machine: &'a Machine,
	schedule: &'a Schedule,
	depth: usize,
	static_flag: bool,
}

impl<'a, B: 'a + Backend> Executive<'a, B> {
	/// Basic constructor.
	pub fn new(state: &'a mut State<B>, info: &'a EnvInfo, machine: &'a Machine, schedule: &'a Schedule) -> Self {
		Executive {
			state,
			info,
			machine,
			schedule,
			depth: 0,
			static_flag: false,
		}
	}

	/// Populates executive from parent properties. Increments executive
	/// depth.
	pub fn from_parent(
		state: &'a mut State<B>,
		info: &'a EnvInfo,
		machine: &'a Machine,
		schedule: &'a Schedule,
		parent_depth: usize,
		static_flag: bool,
	) -> Self {
		Executive {
			state,
			info,
			machine,
			schedule,
			depth: parent_depth + 1,
			static_flag,
		}
	}

	/// This function should be used to execute a transaction.
	pub fn transact<T, V>(
		&mut self,
		t: &SignedTransaction,
		options: TransactOptions<T, V>,
	) -> Result<Executed<T::Output, V::Output>, ExecutionError>
		where T: Tracer, V: VMTracer,
	{
		let mut tracer = options.tracer;
		let mut vm_tracer = options.vm_tracer;
		let sender = t.sender();

		// validate if the transaction fits into the given block
		if self.info.gas_used + t.gas > self.info.gas_limit {
			return Err(ExecutionError::BlockGasLimitReached {
				gas_limit: self.info.gas_limit,
				gas_used: self.info.gas_used,
				gas: t.gas,
			});
		}

		let schedule = self.schedule;
		let base_gas_required = U256::from(t.gas_required(schedule));
		if t.gas < base_gas_required {
			return Err(ExecutionError::NotEnoughBaseGas {
				required: base_gas_required,
				got: t.gas,
			});
		}
		let init_gas = t.gas - base_gas_required;

		// validate transaction nonce
		let nonce = self.state.nonce(&sender)?;
		if options.check_nonce && t.nonce != nonce {
			return Err(ExecutionError::InvalidNonce { expected: nonce, got: t.nonce });
		}

		// avoid unaffordable transactions
		let balance = self.state.balance(&sender)?;
		let gas_cost_512 = t.gas.full_mul(t.gas_price);
		let total_cost = U512::from(t.value) + gas_cost_512;
		let balance_512 = U512::from(balance);
		if balance_512 < total_cost {
			return Err(ExecutionError::NotEnoughCash { required: total_cost, got: balance_512 });
		}

		let mut substate = Substate::new();

		// NOTE: there can be no invalid transactions from this point; the
		// gas purchase pays for inclusion whatever the outcome, so it is
		// made before any savepoint and never reverted.
		let gas_cost = t.gas * t.gas_price;
		trace!(target: "executive", "Paying {} from sender for gas ({} gas at {})", gas_cost, t.gas, t.gas_price);
		self.state.sub_balance(&sender, &gas_cost)?;

		let (result, output) = match t.action {
			Action::Create => {
				let (new_address, code_hash) = contract_address(
					self.machine.create_address_scheme(self.info.number),
					&sender,
					&nonce,
					&t.data,
				);
				self.state.inc_nonce(&sender)?;
				let params = ActionParams {
					code_address: new_address,
					code_hash,
					address: new_address,
					sender,
					origin: sender,
					gas: init_gas,
					gas_price: t.gas_price,
					value: ActionValue::Transfer(t.value),
					code: Some(Arc::new(t.data.clone())),
					data: None,
					call_type: CallType::None,
				};
				let res = self.create(params, &mut substate, &mut tracer, &mut vm_tracer);
				let out = match &res {
					Ok(res) if options.output_from_init_contract => res.return_data.to_vec(),
					_ => Vec::new(),
				};
				(res, out)
			},
			Action::Call(ref address) => {
				self.state.inc_nonce(&sender)?;
				let params = ActionParams {
					code_address: *address,
					address: *address,
					sender,
					origin: sender,
					gas: init_gas,
					gas_price: t.gas_price,
					value: ActionValue::Transfer(t.value),
					code: self.state.code(address)?,
					code_hash: Some(self.state.code_hash(address)?),
					data: Some(t.data.clone()),
					call_type: CallType::Call,
				};
				let res = self.call(params, &mut substate, &mut tracer, &mut vm_tracer);
				let out = match &res {
					Ok(res) => res.return_data.to_vec(),
					_ => Vec::new(),
				};
				(res, out)
			},
		};

		self.finalize(t, substate, result, output, tracer.drain(), vm_tracer.drain())
	}

	/// Calls contract function with given contract params. Does not
	/// finalize the transaction (no refunds, no suicides). Modifies the
	/// substate and returns either the frame result or a `vm::Error`.
	pub fn call<T, V>(
		&mut self,
		params: ActionParams,
		substate: &mut Substate,
		tracer: &mut T,
		vm_tracer: &mut V,
	) -> vm::Result<FinalizationResult>
		where T: Tracer, V: VMTracer,
	{
		trace!(target: "executive", "Executive::call(params={:?}) self.env_info={:?}, static={}", params, self.info, self.static_flag);

		let is_builtin = self.machine.builtin(&params.code_address, self.info.number).is_some();
		tracer.prepare_trace_call(&params, self.depth, is_builtin);
		vm_tracer.prepare_subtrace(params.code.as_ref().map_or(&[] as &[u8], |c| &c[..]));

		let gas = params.gas;
		let result = self.call_inner(params, substate, tracer, vm_tracer);

		match result {
			Ok(ref val) if val.apply_state => tracer.done_trace_call(gas - val.gas_left, &val.return_data),
			Ok(_) => tracer.done_trace_failed(&vm::Error::Reverted),
			Err(ref err) => tracer.done_trace_failed(err),
		}
		vm_tracer.done_subtrace();

		result
	}

	fn call_inner<T, V>(
		&mut self,
		params: ActionParams,
		substate: &mut Substate,
		tracer: &mut T,
		vm_tracer: &mut V,
	) -> vm::Result<FinalizationResult>
		where T: Tracer, V: VMTracer,
	{
		Self::check_static_flag(&params, self.static_flag, false)?;
		let savepoint = self.state.savepoint();

		if let Some(builtin) = self.machine.builtin(&params.code_address, self.info.number) {
			let default = [];
			let data = if let Some(ref d) = params.data { d as &[u8] } else { &default as &[u8] };

			let cost = builtin.cost(data);
			if cost > params.gas {
				// An up-front shortfall still marks the built-in's address
				// as touched from EIP-158 on, so the empty-account sweep
				// can purge it. The frame is not rolled back.
				if self.schedule.kill_empty {
					self.state.add_balance(&params.code_address, &U256::zero())?;
				}
				return Err(vm::Error::OutOfGas);
			}

			let mut builtin_out_buffer = Vec::new();
			let result = {
				let mut builtin_output = BytesRef::Flexible(&mut builtin_out_buffer);
				builtin.execute(data, &mut builtin_output)
			};

			// the value moves even when the native routine failed
			if let ActionValue::Transfer(val) = params.value {
				self.state.transfer_balance(&params.sender, &params.address, &val)?;
			}

			match result {
				Ok(()) => {
					let out_len = builtin_out_buffer.len();
					Ok(FinalizationResult {
						gas_left: params.gas - cost,
						apply_state: true,
						return_data: ReturnData::new(builtin_out_buffer, 0, out_len),
					})
				},
				Err(err) => {
					debug!(target: "executive", "Built-in failed: {}", err);
					Err(vm::Error::BuiltIn(err))
				},
			}
		} else if params.code.is_some() {
			let origin_info = OriginInfo::from(&params);
			let mut unconfirmed_substate = Substate::new();

			// transfer ether before the code runs
			if let ActionValue::Transfer(val) = params.value {
				self.state.transfer_balance(&params.sender, &params.address, &val)?;
			}

			let res = {
				let mut vm = self.machine.vm(self.schedule, self.depth);
				let mut ext = Externalities::new(
					self.state, self.info, self.machine, self.schedule, self.depth, origin_info,
					&mut unconfirmed_substate, OutputPolicy::Return, self.static_flag, tracer, vm_tracer,
				);
				vm.exec(params, &mut ext).finalize(ext)
			};

			self.enact_result(&res, substate, unconfirmed_substate, savepoint);
			res
		} else {
			// accountless frame: a plain value transfer
			if let ActionValue::Transfer(val) = params.value {
				self.state.transfer_balance(&params.sender, &params.address, &val)?;
			}
			Ok(FinalizationResult {
				gas_left: params.gas,
				apply_state: true,
				return_data: ReturnData::empty(),
			})
		}
	}

	/// Creates contract with given contract params. Does not finalize the
	/// transaction (no refunds, no suicides). Modifies the substate.
	pub fn create<T, V>(
		&mut self,
		params: ActionParams,
		substate: &mut Substate,
		tracer: &mut T,
		vm_tracer: &mut V,
	) -> vm::Result<FinalizationResult>
		where T: Tracer, V: VMTracer,
	{
		trace!(target: "executive", "Executive::create(params={:?}) self.env_info={:?}, static={}", params, self.info, self.static_flag);

		tracer.prepare_trace_create(&params);
		vm_tracer.prepare_subtrace(params.code.as_ref().map_or(&[] as &[u8], |c| &c[..]));

		let gas = params.gas;
		let address = params.address;
		let result = self.create_inner(params, substate, tracer, vm_tracer);

		match result {
			Ok(ref val) if val.apply_state => tracer.done_trace_create(gas - val.gas_left, &val.return_data, address),
			Ok(_) => tracer.done_trace_failed(&vm::Error::Reverted),
			Err(ref err) => tracer.done_trace_failed(err),
		}
		vm_tracer.done_subtrace();

		result
	}

	fn create_inner<T, V>(
		&mut self,
		params: ActionParams,
		substate: &mut Substate,
		tracer: &mut T,
		vm_tracer: &mut V,
	) -> vm::Result<FinalizationResult>
		where T: Tracer, V: VMTracer,
	{
		Self::check_static_flag(&params, self.static_flag, true)?;
		let savepoint = self.state.savepoint();

		// The endowment transfer creates the account when it is absent. A
		// synthetic address collision keeps the prior balance and nonce.
		if let ActionValue::Transfer(val) = params.value {
			self.state.transfer_balance(&params.sender, &params.address, &val)?;
		}

		// fresh contracts start at nonce one from EIP-161 on; this also
		// guards colliding creates against replayed nonces
		if self.schedule.no_empty {
			self.state.inc_nonce(&params.address)?;
		}

		if params.code.as_ref().map_or(false, |code| !code.is_empty()) {
			let origin_info = OriginInfo::from(&params);
			let mut unconfirmed_substate = Substate::new();

			let res = {
				let mut vm = self.machine.vm(self.schedule, self.depth);
				let mut ext = Externalities::new(
					self.state, self.info, self.machine, self.schedule, self.depth, origin_info,
					&mut unconfirmed_substate, OutputPolicy::InitContract, self.static_flag, tracer, vm_tracer,
				);
				vm.exec(params, &mut ext).finalize(ext)
			};

			self.enact_result(&res, substate, unconfirmed_substate, savepoint);
			res
		} else {
			// A create with empty init code into an address that already
			// holds code overwrites it with nothing.
			if self.state.address_has_code(&params.address)? {
				self.state.init_code(&params.address, vec![])?;
			}
			Ok(FinalizationResult {
				gas_left: params.gas,
				apply_state: true,
				return_data: ReturnData::empty(),
			})
		}
	}

	fn check_static_flag(params: &ActionParams, static_flag: bool, is_create: bool) -> vm::Result<()> {
		if is_create {
			if static_flag {
				return Err(vm::Error::MutableCallInStaticContext);
			}
		} else if static_flag
			&& (params.call_type == CallType::StaticCall || params.call_type == CallType::Call)
			&& params.value.value() > U256::zero()
		{
			return Err(vm::Error::MutableCallInStaticContext);
		}

		Ok(())
	}

	fn enact_result(
		&mut self,
		result: &vm::Result<FinalizationResult>,
		substate: &mut Substate,
		un_substate: Substate,
		savepoint: usize,
	) {
		match *result {
			Err(vm::Error::OutOfGas)
			| Err(vm::Error::BadJumpDestination { .. })
			| Err(vm::Error::BadInstruction { .. })
			| Err(vm::Error::StackUnderflow { .. })
			| Err(vm::Error::OutOfStack { .. })
			| Err(vm::Error::BuiltIn(..))
			| Err(vm::Error::MutableCallInStaticContext)
			| Err(vm::Error::Reverted)
			| Ok(FinalizationResult { apply_state: false, .. }) => {
				self.state.rollback(savepoint);
			},
			Ok(_) | Err(vm::Error::Internal(_)) => {
				substate.accrue(un_substate);
			},
		}
	}

	/// Finalizes the transaction: refunds, fees and suicides.
	fn finalize<T, V>(
		&mut self,
		t: &SignedTransaction,
		substate: Substate,
		result: vm::Result<FinalizationResult>,
		output: Bytes,
		trace: Vec<T>,
		vm_trace: Option<V>,
	) -> Result<Executed<T, V>, ExecutionError> {
		let schedule = self.schedule;

		// refunds from SSTORE nonzero -> zero, then from suicides; the cap
		// is computed before the refund is added, and the truncating
		// division must stay in this order
		let sstore_refunds = substate.sstore_clears_count * U256::from(schedule.sstore_refund_gas);
		let suicide_refunds = U256::from(schedule.suicide_refund_gas) * U256::from(substate.suicides.len());
		let refunds_bound = sstore_refunds + suicide_refunds;

		let gas_left_prerefund = match result {
			Ok(FinalizationResult { gas_left, .. }) => gas_left,
			_ => 0.into(),
		};
		let refunded = cmp::min(refunds_bound, (t.gas - gas_left_prerefund) >> 1);
		let gas_left = gas_left_prerefund + refunded;

		let gas_used = t.gas - gas_left;
		let (refund_value, overflow_1) = gas_left.overflowing_mul(t.gas_price);
		let (fees_value, overflow_2) = gas_used.overflowing_mul(t.gas_price);
		if overflow_1 || overflow_2 {
			return Err(ExecutionError::TransactionMalformed("U256 Overflow".to_string()));
		}

		trace!(target: "executive", "exec::finalize: t.gas={}, sstore_refunds={}, suicide_refunds={}, refunds_bound={}, gas_left_prerefund={}, refunded={}, gas_left={}, gas_used={}, refund_value={}, fees_value={}",
			t.gas, sstore_refunds, suicide_refunds, refunds_bound, gas_left_prerefund, refunded, gas_left, gas_used, refund_value, fees_value);

		let sender = t.sender();
		trace!(target: "executive", "exec::finalize: Refunding refund_value={}, sender={}", refund_value, sender);
		self.state.add_balance(&sender, &refund_value)?;
		trace!(target: "executive", "exec::finalize: Compensating author: fees_value={}, author={}", fees_value, self.info.author);
		self.state.add_balance(&self.info.author, &fees_value)?;

		// perform suicides
		for address in &substate.suicides {
			self.state.kill_account(address)?;
		}

		match result {
			Err(vm::Error::Internal(msg)) => Err(ExecutionError::Internal(msg)),
			Err(exception) => Ok(Executed {
				exception: Some(exception),
				gas: t.gas,
				gas_used: t.gas,
				refunded: U256::zero(),
				cumulative_gas_used: self.info.gas_used + t.gas,
				output,
				logs: vec![],
				contracts_created: vec![],
				trace,
				vm_trace,
			}),
			Ok(r) => Ok(Executed {
				exception: if r.apply_state { None } else { Some(vm::Error::Reverted) },
				gas: t.gas,
				gas_used,
				refunded,
				cumulative_gas_used: self.info.gas_used + gas_used,
				output,
				logs: substate.logs,
				contracts_created: substate.contracts_created,
				trace,
				vm_trace,
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ethereum_types::BigEndianHash;
	use rustc_hex::FromHex;
	use state::CommitBehaviour;
	use test_helpers::{init_log, machine_with_vms, new_machine, new_state, Op, ScriptedVm};
	use trace::{FlatTrace, VMTrace};
	use transaction::Transaction;

	fn sender() -> Address {
		Address::from_low_u64_be(0x5e4d)
	}

	fn coinbase() -> Address {
		Address::from_low_u64_be(0xc0ffee)
	}

	fn test_env_info() -> EnvInfo {
		EnvInfo {
			number: 100,
			author: coinbase(),
			gas_limit: 8_000_000.into(),
			..Default::default()
		}
	}

	fn transact_with(
		machine: &Machine,
		state: &mut State<::db::MemoryDB>,
		t: &SignedTransaction,
	) -> Result<Executed<FlatTrace, VMTrace>, ExecutionError> {
		let info = test_env_info();
		let schedule = machine.schedule(info.number);
		let mut ex = Executive::new(state, &info, machine, &schedule);
		ex.transact(t, TransactOptions::with_no_tracing())
	}

	#[test]
	fn pure_transfer_with_sufficient_funds() {
		let machine = new_machine();
		let mut state = new_state();
		let a = sender();
		let b = Address::from_low_u64_be(0xb);
		state.add_balance(&a, &1_000_000.into()).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 21_000.into(),
			action: Action::Call(b),
			value: 1000.into(),
			data: vec![],
		}.fake_sign(a);

		let executed = transact_with(&machine, &mut state, &t).unwrap();

		assert_eq!(executed.exception, None);
		assert_eq!(executed.gas_used, U256::from(21_000));
		assert_eq!(executed.refunded, U256::zero());
		assert_eq!(state.balance(&a).unwrap(), U256::from(1_000_000 - 1000 - 21_000));
		assert_eq!(state.balance(&b).unwrap(), U256::from(1000));
		assert_eq!(state.balance(&coinbase()).unwrap(), U256::from(21_000));
		assert_eq!(state.nonce(&a).unwrap(), 1.into());
		assert_eq!(state.nonce(&b).unwrap(), 0.into());
	}

	#[test]
	fn insufficient_intrinsic_gas_changes_nothing() {
		let machine = new_machine();
		let mut state = new_state();
		let a = sender();
		state.add_balance(&a, &1_000_000.into()).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 20_999.into(),
			action: Action::Call(Address::from_low_u64_be(0xb)),
			value: 1000.into(),
			data: vec![],
		}.fake_sign(a);

		match transact_with(&machine, &mut state, &t) {
			Err(ExecutionError::NotEnoughBaseGas { required, got }) => {
				assert_eq!(required, U256::from(21_000));
				assert_eq!(got, U256::from(20_999));
			},
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(state.balance(&a).unwrap(), U256::from(1_000_000));
		assert_eq!(state.nonce(&a).unwrap(), 0.into());
	}

	#[test]
	fn nonce_mismatch_changes_nothing() {
		let machine = new_machine();
		let mut state = new_state();
		let a = sender();
		state.add_balance(&a, &1_000_000.into()).unwrap();
		for _ in 0..5 {
			state.inc_nonce(&a).unwrap();
		}

		let t = Transaction {
			nonce: 4.into(),
			gas_price: 1.into(),
			gas: 21_000.into(),
			action: Action::Call(Address::from_low_u64_be(0xb)),
			value: 0.into(),
			data: vec![],
		}.fake_sign(a);

		match transact_with(&machine, &mut state, &t) {
			Err(ExecutionError::InvalidNonce { expected, got }) => {
				assert_eq!(expected, U256::from(5));
				assert_eq!(got, U256::from(4));
			},
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(state.balance(&a).unwrap(), U256::from(1_000_000));
	}

	#[test]
	fn block_gas_limit_is_enforced() {
		let machine = new_machine();
		let mut state = new_state();
		let a = sender();
		state.add_balance(&a, &1_000_000.into()).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 9_000_000.into(),
			action: Action::Call(Address::from_low_u64_be(0xb)),
			value: 0.into(),
			data: vec![],
		}.fake_sign(a);

		match transact_with(&machine, &mut state, &t) {
			Err(ExecutionError::BlockGasLimitReached { .. }) => {},
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn unaffordable_transaction_is_rejected() {
		let machine = new_machine();
		let mut state = new_state();
		let a = sender();
		state.add_balance(&a, &21_999.into()).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 21_000.into(),
			action: Action::Call(Address::from_low_u64_be(0xb)),
			value: 1000.into(),
			data: vec![],
		}.fake_sign(a);

		match transact_with(&machine, &mut state, &t) {
			Err(ExecutionError::NotEnoughCash { required, .. }) => {
				assert_eq!(required, U512::from(22_000));
			},
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(state.balance(&a).unwrap(), U256::from(21_999));
	}

	#[test]
	fn create_with_empty_init_code() {
		let machine = new_machine();
		let mut state = new_state();
		let a = sender();
		state.add_balance(&a, &1_000_000.into()).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 53_000.into(),
			action: Action::Create,
			value: 0.into(),
			data: vec![],
		}.fake_sign(a);

		let (new_address, _) = contract_address(CreateContractAddress::FromSenderAndNonce, &a, &0.into(), &[]);
		let executed = transact_with(&machine, &mut state, &t).unwrap();

		assert_eq!(executed.exception, None);
		assert_eq!(executed.gas_used, U256::from(53_000));
		assert_eq!(state.exists(&new_address).unwrap(), true);
		assert_eq!(state.balance(&new_address).unwrap(), 0.into());
		// contracts start at nonce one under EIP-161
		assert_eq!(state.nonce(&new_address).unwrap(), 1.into());
		assert_eq!(state.address_has_code(&new_address).unwrap(), false);
		assert_eq!(state.nonce(&a).unwrap(), 1.into());
	}

	#[test]
	fn create_address_is_deterministic() {
		let a = sender();
		let (addr1, _) = contract_address(CreateContractAddress::FromSenderAndNonce, &a, &7.into(), &[]);
		let (addr2, _) = contract_address(CreateContractAddress::FromSenderAndNonce, &a, &7.into(), &[0xff]);
		let (addr3, _) = contract_address(CreateContractAddress::FromSenderAndNonce, &a, &8.into(), &[]);
		assert_eq!(addr1, addr2);
		assert_ne!(addr1, addr3);
	}

	#[test]
	fn nested_revert_discards_only_the_child() {
		init_log();

		let a = sender();
		let c = Address::from_low_u64_be(0xc);
		let d = Address::from_low_u64_be(0xd);

		let slot = |n: u64| H256::from_low_u64_be(n);
		let topic_c = H256::from_low_u64_be(0xcc);
		let topic_d = H256::from_low_u64_be(0xdd);

		let c_vm = ScriptedVm::new(vec![
			Op::SStore(slot(1), H256::from_low_u64_be(0x11)),
			Op::SLoad(slot(1)),
			Op::Log(vec![topic_c], vec![1]),
			Op::Call { gas: 10_000, to: d, value: Some(U256::zero()), data: vec![], call_type: CallType::Call },
			Op::SStore(slot(2), H256::from_low_u64_be(0x22)),
		]);
		let d_vm = ScriptedVm::new(vec![
			Op::SStore(slot(7), H256::from_low_u64_be(42)),
			Op::Log(vec![topic_d], vec![2]),
			Op::Revert(vec![]),
		]);

		let machine = machine_with_vms(vec![c_vm, d_vm]);
		let mut state = new_state();
		state.add_balance(&a, &1_000_000.into()).unwrap();
		state.init_code(&c, "6000".from_hex().unwrap()).unwrap();
		state.init_code(&d, "6001".from_hex().unwrap()).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 100_000.into(),
			action: Action::Call(c),
			value: 0.into(),
			data: vec![],
		}.fake_sign(a);

		let executed = transact_with(&machine, &mut state, &t).unwrap();

		assert_eq!(executed.exception, None);
		// the child frame's write is gone, the parent's survive
		assert_eq!(state.storage_at(&d, &slot(7)).unwrap(), H256::zero());
		assert_eq!(state.storage_at(&c, &slot(1)).unwrap(), H256::from_low_u64_be(0x11));
		assert_eq!(state.storage_at(&c, &slot(2)).unwrap(), H256::from_low_u64_be(0x22));
		// only the parent's log made it out
		assert_eq!(executed.logs.len(), 1);
		assert_eq!(executed.logs[0].address, c);
		assert_eq!(executed.logs[0].topics, vec![topic_c]);
	}

	#[test]
	fn suicide_refund_is_capped() {
		init_log();

		let a = sender();
		let x = Address::from_low_u64_be(0xdead);
		let heir = Address::from_low_u64_be(0xbeef);

		let x_vm = ScriptedVm::new(vec![
			Op::UseGas(40_000),
			Op::Suicide(heir),
		]);

		let machine = machine_with_vms(vec![x_vm]);
		let mut state = new_state();
		state.add_balance(&a, &1_000_000.into()).unwrap();
		state.init_code(&x, "6000".from_hex().unwrap()).unwrap();
		state.add_balance(&x, &555.into()).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 100_000.into(),
			action: Action::Call(x),
			value: 0.into(),
			data: vec![],
		}.fake_sign(a);

		let sender_before = state.balance(&a).unwrap();
		let executed = transact_with(&machine, &mut state, &t).unwrap();

		// refund = min((100000 - 39000) / 2, 24000) = 24000
		assert_eq!(executed.refunded, U256::from(24_000));
		assert_eq!(executed.gas_used, U256::from(37_000));
		// gas accounting: gas_used + gas_left + refund adds back up
		assert_eq!(executed.gas_used + executed.refunded, t.gas - U256::from(39_000));
		assert_eq!(state.balance(&a).unwrap(), sender_before - U256::from(37_000));
		assert_eq!(state.balance(&coinbase()).unwrap(), U256::from(37_000));
		// the account is gone, its funds went to the heir
		assert_eq!(state.exists(&x).unwrap(), false);
		assert_eq!(state.balance(&heir).unwrap(), U256::from(555));
	}

	#[test]
	fn vm_failure_consumes_all_gas_and_rolls_back() {
		let a = sender();
		let c = Address::from_low_u64_be(0xc);

		let c_vm = ScriptedVm::new(vec![
			Op::SStore(H256::from_low_u64_be(1), H256::from_low_u64_be(3)),
			Op::UseGas(1_000_000),
		]);

		let machine = machine_with_vms(vec![c_vm]);
		let mut state = new_state();
		state.add_balance(&a, &1_000_000.into()).unwrap();
		state.init_code(&c, vec![0x60, 0x00]).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 50_000.into(),
			action: Action::Call(c),
			value: 77.into(),
			data: vec![],
		}.fake_sign(a);

		let executed = transact_with(&machine, &mut state, &t).unwrap();

		assert_eq!(executed.exception, Some(vm::Error::OutOfGas));
		assert_eq!(executed.transaction_exception(), Some(::executed::TransactionException::OutOfGas));
		assert_eq!(executed.gas_used, t.gas);
		// the frame's storage write and value transfer were rolled back
		assert_eq!(state.storage_at(&c, &H256::from_low_u64_be(1)).unwrap(), H256::zero());
		assert_eq!(state.balance(&c).unwrap(), 0.into());
		// the gas purchase was not
		assert_eq!(state.balance(&a).unwrap(), U256::from(1_000_000 - 50_000));
		assert_eq!(state.balance(&coinbase()).unwrap(), U256::from(50_000));
		// the nonce stays consumed
		assert_eq!(state.nonce(&a).unwrap(), 1.into());
	}

	#[test]
	fn inner_create_from_a_contract() {
		let a = sender();
		let c = Address::from_low_u64_be(0xc);

		let c_vm = ScriptedVm::new(vec![
			Op::Create { gas: 30_000, value: 0.into(), code: vec![] },
		]);

		let machine = machine_with_vms(vec![c_vm]);
		let mut state = new_state();
		state.add_balance(&a, &1_000_000.into()).unwrap();
		state.init_code(&c, "6000".from_hex().unwrap()).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 100_000.into(),
			action: Action::Call(c),
			value: 0.into(),
			data: vec![],
		}.fake_sign(a);

		// the child lands at the address derived from C and its nonce
		let (child, _) = contract_address(CreateContractAddress::FromSenderAndNonce, &c, &0.into(), &[]);
		let executed = transact_with(&machine, &mut state, &t).unwrap();

		assert_eq!(executed.exception, None);
		assert_eq!(executed.contracts_created, vec![child]);
		assert_eq!(state.exists(&child).unwrap(), true);
		assert_eq!(state.nonce(&child).unwrap(), 1.into());
		// the creator's nonce moved with the create
		assert_eq!(state.nonce(&c).unwrap(), 1.into());
		// an empty init frame returns all forwarded gas
		assert_eq!(executed.gas_used, U256::from(21_000));
	}

	#[test]
	fn vm_bad_instruction_is_classified() {
		let a = sender();
		let c = Address::from_low_u64_be(0xc);

		let c_vm = ScriptedVm::new(vec![
			Op::Fail(vm::Error::BadInstruction { instruction: 0xef }),
		]);

		let machine = machine_with_vms(vec![c_vm]);
		let mut state = new_state();
		state.add_balance(&a, &1_000_000.into()).unwrap();
		state.init_code(&c, "6000".from_hex().unwrap()).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 30_000.into(),
			action: Action::Call(c),
			value: 0.into(),
			data: vec![],
		}.fake_sign(a);

		let executed = transact_with(&machine, &mut state, &t).unwrap();

		assert_eq!(executed.exception, Some(vm::Error::BadInstruction { instruction: 0xef }));
		assert_eq!(
			executed.transaction_exception(),
			Some(::executed::TransactionException::BadInstruction)
		);
		assert_eq!(executed.gas_used, t.gas);
	}

	#[test]
	fn precompile_executes_and_charges() {
		let machine = new_machine();
		let mut state = new_state();
		let a = sender();
		let identity = Address::from_low_u64_be(4);
		state.add_balance(&a, &1_000_000.into()).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 22_000.into(),
			action: Action::Call(identity),
			value: 0.into(),
			data: vec![1, 2, 3],
		}.fake_sign(a);

		let executed = transact_with(&machine, &mut state, &t).unwrap();

		assert_eq!(executed.exception, None);
		assert_eq!(executed.output, vec![1, 2, 3]);
		// 21000 + 3 non-zero bytes at 68, plus the built-in's 15 + 3
		assert_eq!(executed.gas_used, U256::from(21_000 + 3 * 68 + 18));
	}

	#[test]
	fn precompile_oog_still_touches_the_account() {
		let machine = new_machine();
		let mut state = new_state();
		let a = sender();
		let identity = Address::from_low_u64_be(4);
		state.add_balance(&a, &1_000_000.into()).unwrap();

		// 10 gas past the intrinsic cost cannot pay the built-in's 15
		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 21_010.into(),
			action: Action::Call(identity),
			value: 0.into(),
			data: vec![],
		}.fake_sign(a);

		let executed = transact_with(&machine, &mut state, &t).unwrap();

		assert_eq!(executed.exception, Some(vm::Error::OutOfGas));
		assert_eq!(executed.gas_used, t.gas);
		// the touch survives the failure so commit can purge the account
		assert!(state.touched().contains(&identity));
		assert_eq!(state.exists(&identity).unwrap(), true);
		state.commit(CommitBehaviour::RemoveEmptyAccounts).unwrap();
		assert_eq!(state.exists(&identity).unwrap(), false);
	}

	#[test]
	fn sstore_clear_refund_applies() {
		let a = sender();
		let c = Address::from_low_u64_be(0xc);
		let slot = H256::from_low_u64_be(5);

		let c_vm = ScriptedVm::new(vec![
			Op::UseGas(10_000),
			Op::SStore(slot, H256::zero()),
		]);

		let machine = machine_with_vms(vec![c_vm]);
		let mut state = new_state();
		state.add_balance(&a, &1_000_000.into()).unwrap();
		state.init_code(&c, vec![0x60, 0x00]).unwrap();
		state.set_storage(&c, slot, H256::from_uint(&U256::from(9))).unwrap();
		state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 40_000.into(),
			action: Action::Call(c),
			value: 0.into(),
			data: vec![],
		}.fake_sign(a);

		let executed = transact_with(&machine, &mut state, &t).unwrap();

		// clearing one slot refunds 15000, capped at gas_used / 2
		let gas_used_prerefund = U256::from(21_000 + 10_000);
		let cap = gas_used_prerefund / 2;
		assert_eq!(executed.refunded, ::std::cmp::min(U256::from(15_000), cap));
		assert_eq!(state.storage_at(&c, &slot).unwrap(), H256::zero());
	}

	#[test]
	fn create_collision_with_empty_init_overwrites_code() {
		let machine = new_machine();
		let mut state = new_state();
		let a = sender();
		state.add_balance(&a, &1_000_000.into()).unwrap();

		// plant an account at the address the create will land on
		let (collision, _) = contract_address(CreateContractAddress::FromSenderAndNonce, &a, &0.into(), &[]);
		state.init_code(&collision, vec![0x60, 0x00]).unwrap();
		state.add_balance(&collision, &99.into()).unwrap();

		let t = Transaction {
			nonce: 0.into(),
			gas_price: 1.into(),
			gas: 53_000.into(),
			action: Action::Create,
			value: 5.into(),
			data: vec![],
		}.fake_sign(a);

		let executed = transact_with(&machine, &mut state, &t).unwrap();

		assert_eq!(executed.exception, None);
		// code is wiped, prior balance is kept, endowment is added
		assert_eq!(state.address_has_code(&collision).unwrap(), false);
		assert_eq!(state.balance(&collision).unwrap(), U256::from(99 + 5));
	}
}

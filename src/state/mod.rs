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

//! A mutable state representation suitable to execute transactions.
//! Generic over a `Backend`. Deals with `Account`s.
//!
//! Every atomic mutation of an account appends a `Change` to the state
//! changelog before (or atomically with) the cache update. Reverting means
//! popping entries above a savepoint and applying their inverses in reverse
//! order, so a rollback restores the cache bit-for-bit. The changelog is
//! managed by `savepoint()`, `rollback()` and `commit()`.

mod account;
mod changes;

pub use self::account::{Account, Filth};
pub use self::changes::Change;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use hash::{KECCAK_EMPTY, KECCAK_NULL_RLP};
use lru_cache::LruCache;
use parking_lot::Mutex;
use std::sync::Arc;

use db::Backend;
use executed::{Executed, ExecutionError};
use executive::{Executive, TransactOptions};
use machine::Machine;
use receipt::{Receipt, TransactionOutcome};
use trace::{FlatTrace, Tracer, VMStep, VMTracer};
use transaction::SignedTransaction;
use trie;
use trie::{SecTrieDB, SecTrieDBMut, TrieError};
use vm::EnvInfo;

const CODE_SIZE_CACHE_ITEMS: usize = 65536;

// Soft cap on clean cache entries before unchanged ones are evicted.
const MAX_UNCHANGED_CACHE_ITEMS: usize = 8 * 1024;

lazy_static! {
	// Process-wide cache of code sizes by code hash. Insertion at commit is
	// idempotent under hash equality.
	static ref CODE_SIZE_CACHE: Mutex<LruCache<H256, usize>> =
		Mutex::new(LruCache::new(CODE_SIZE_CACHE_ITEMS));
}

/// Whether `commit` purges touched empty accounts (EIP-158) or keeps them.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CommitBehaviour {
	/// Empty accounts stay in the trie.
	KeepEmptyAccounts,
	/// Touched empty accounts are removed before serialization.
	RemoveEmptyAccounts,
}

/// Errors concerning state access and mutation.
#[derive(Debug)]
pub enum Error {
	/// Backing trie failure.
	Trie(Box<TrieError>),
	/// Attempted to debit more funds than the account holds.
	NotEnoughCash {
		/// Amount the debit asked for.
		required: U256,
		/// Balance actually held.
		got: U256,
	},
	/// Transaction-level execution failure, surfaced through `apply`.
	Execution(ExecutionError),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			Error::Trie(ref err) => write!(f, "{}", err),
			Error::NotEnoughCash { ref required, ref got } =>
				write!(f, "Got balance of only {}, required at least {}", got, required),
			Error::Execution(ref err) => write!(f, "{}", err),
		}
	}
}

impl From<Box<TrieError>> for Error {
	fn from(err: Box<TrieError>) -> Self {
		Error::Trie(err)
	}
}

impl From<ExecutionError> for Error {
	fn from(err: ExecutionError) -> Self {
		Error::Execution(err)
	}
}

/// Used to return information about a `State::apply` operation.
pub struct ApplyOutcome<T, V> {
	/// The receipt for the applied transaction.
	pub receipt: Receipt,
	/// The output of the applied transaction.
	pub output: Bytes,
	/// The trace for the applied transaction, empty if tracing was off.
	pub trace: Vec<T>,
	/// The VM trace for the applied transaction, None if tracing was off.
	pub vm_trace: Option<V>,
}

/// Result type for the execution ("application") of a transaction.
pub type ApplyResult<T, V> = Result<ApplyOutcome<T, V>, Error>;

/// Representation of the entire state of all accounts in the system.
///
/// Caching: present accounts live in `cache`; addresses known to be absent
/// are remembered in `non_existing` so repeated misses skip the trie.
/// Clean, untouched entries are evicted once the cache grows past a soft
/// cap. The `touched` set records every account mutated during the current
/// transaction; with `CommitBehaviour::RemoveEmptyAccounts`, touched null
/// accounts are purged at commit.
pub struct State<B: Backend> {
	db: B,
	root: H256,
	cache: RefCell<HashMap<Address, Account>>,
	non_existing: RefCell<HashSet<Address>>,
	unchanged: RefCell<Vec<Address>>,
	touched: HashSet<Address>,
	change_log: Vec<Change>,
	account_start_nonce: U256,
}

impl<B: Backend> State<B> {
	/// Creates new state with an empty state root.
	pub fn new(mut db: B, account_start_nonce: U256) -> State<B> {
		let mut root = H256::zero();
		{
			// init trie and reset root to null
			let _ = SecTrieDBMut::new(db.as_hash_store_mut(), &mut root);
		}
		State {
			db,
			root,
			cache: RefCell::new(HashMap::new()),
			non_existing: RefCell::new(HashSet::new()),
			unchanged: RefCell::new(Vec::new()),
			touched: HashSet::new(),
			change_log: Vec::new(),
			account_start_nonce,
		}
	}

	/// Creates new state with an existing state root.
	pub fn from_existing(db: B, root: H256, account_start_nonce: U256) -> trie::Result<State<B>> {
		if root != KECCAK_NULL_RLP && !db.as_hash_store().contains(&root) {
			return Err(Box::new(TrieError::InvalidStateRoot(root)));
		}
		Ok(State {
			db,
			root,
			cache: RefCell::new(HashMap::new()),
			non_existing: RefCell::new(HashSet::new()),
			unchanged: RefCell::new(Vec::new()),
			touched: HashSet::new(),
			change_log: Vec::new(),
			account_start_nonce,
		})
	}

	/// Destroy the current object and return root and database.
	pub fn drop(self) -> (H256, B) {
		(self.root, self.db)
	}

	/// Return reference to root.
	pub fn root(&self) -> &H256 {
		&self.root
	}

	/// The nonce newly created accounts start at.
	pub fn account_start_nonce(&self) -> &U256 {
		&self.account_start_nonce
	}

	/// Accounts mutated since the last commit.
	pub fn touched(&self) -> &HashSet<Address> {
		&self.touched
	}

	/// Determine whether an account exists.
	pub fn exists(&self, a: &Address) -> Result<bool, Error> {
		self.ensure_cached(a, false, |a| a.is_some())
	}

	/// Determine whether an account exists and is not null (has a nonce,
	/// balance or code).
	pub fn exists_and_not_null(&self, a: &Address) -> Result<bool, Error> {
		self.ensure_cached(a, false, |a| a.map_or(false, |a| !a.is_null()))
	}

	/// Get the balance of account `a`; zero if it does not exist.
	pub fn balance(&self, a: &Address) -> Result<U256, Error> {
		self.ensure_cached(a, false, |a| a.map_or(U256::zero(), |account| *account.balance()))
	}

	/// Get the nonce of account `a`; `account_start_nonce` if it does not
	/// exist.
	pub fn nonce(&self, a: &Address) -> Result<U256, Error> {
		let start_nonce = self.account_start_nonce;
		self.ensure_cached(a, false, |a| a.map_or(start_nonce, |account| *account.nonce()))
	}

	/// Get the value of storage slot `key` of account `address`; zero when
	/// the account or the slot does not exist.
	pub fn storage_at(&self, address: &Address, key: &H256) -> Result<H256, Error> {
		let db = &self.db;
		let result = self.ensure_cached(address, false, |a| match a {
			Some(account) => account.storage_at(db.as_hash_store(), key),
			None => Ok(H256::zero()),
		})?;
		result.map_err(Into::into)
	}

	/// Get the code of account `a`, loading it from the database on first
	/// access; `None` when the account is absent.
	pub fn code(&self, a: &Address) -> Result<Option<Arc<Bytes>>, Error> {
		self.ensure_cached(a, true, |a| a.and_then(|account| account.code()))
	}

	/// Get the code hash of account `a`; the hash of empty when absent or
	/// code-less.
	pub fn code_hash(&self, a: &Address) -> Result<H256, Error> {
		self.ensure_cached(a, false, |a| a.map_or(KECCAK_EMPTY, |account| account.code_hash()))
	}

	/// Get the code size of account `a`, served from the process-wide
	/// code-size cache where possible.
	pub fn code_size(&self, a: &Address) -> Result<Option<usize>, Error> {
		let db = &self.db;
		self.ensure_cached(a, false, |a| a.and_then(|account| {
			if let Some(size) = account.code_size() {
				return Some(size);
			}
			let hash = account.code_hash();
			if hash == KECCAK_EMPTY {
				return Some(0);
			}
			if let Some(size) = CODE_SIZE_CACHE.lock().get_mut(&hash) {
				return Some(*size);
			}
			db.as_hash_store().get(&hash).map(|code| {
				CODE_SIZE_CACHE.lock().insert(hash, code.len());
				code.len()
			})
		}))
	}

	/// Whether account `a` exists and carries executable code.
	pub fn address_has_code(&self, a: &Address) -> Result<bool, Error> {
		self.ensure_cached(a, false, |a| a.map_or(false, |account| account.code_hash() != KECCAK_EMPTY))
	}

	/// Add `incr` to the balance of account `a`, creating it if it does
	/// not exist. A zero increment still touches the account.
	pub fn add_balance(&mut self, a: &Address, incr: &U256) -> Result<(), Error> {
		let old = self.balance(a)?;
		trace!(target: "state", "add_balance({}, {}): {}", a, incr, old);
		self.touch(a);
		let start_nonce = self.account_start_nonce;
		self.require_or_from(a, false, || Account::new_basic(U256::zero(), start_nonce))?
			.add_balance(incr);
		if !incr.is_zero() {
			self.change_log.push(Change::Balance { address: *a, amount: *incr });
		}
		Ok(())
	}

	/// Subtract `decr` from the balance of account `a`. Fails with
	/// `NotEnoughCash` when the balance cannot cover the debit; nothing is
	/// logged in that case.
	pub fn sub_balance(&mut self, a: &Address, decr: &U256) -> Result<(), Error> {
		if decr.is_zero() {
			return Ok(());
		}
		let balance = self.balance(a)?;
		trace!(target: "state", "sub_balance({}, {}): {}", a, decr, balance);
		if balance < *decr {
			return Err(Error::NotEnoughCash { required: *decr, got: balance });
		}
		self.touch(a);
		self.require(a, false)?.sub_balance(decr);
		// logged as the amount "added", wrapping
		let amount = U256::zero().overflowing_sub(*decr).0;
		self.change_log.push(Change::Balance { address: *a, amount });
		Ok(())
	}

	/// Subtract `by` from the balance of `from` and add it to `to`.
	/// Atomic: a failed debit leaves no trace in the changelog.
	pub fn transfer_balance(&mut self, from: &Address, to: &Address, by: &U256) -> Result<(), Error> {
		self.sub_balance(from, by)?;
		self.add_balance(to, by)
	}

	/// Increment the nonce of account `a` by one, creating the account if
	/// it does not exist.
	pub fn inc_nonce(&mut self, a: &Address) -> Result<(), Error> {
		self.touch(a);
		if self.exists(a)? {
			self.require(a, false)?.inc_nonce();
			self.change_log.push(Change::Nonce { address: *a });
		} else {
			// possible if a transaction has gas price zero
			let start_nonce = self.account_start_nonce;
			self.require_or_from(a, false, || Account::new_basic(U256::zero(), start_nonce + U256::one()))?;
		}
		Ok(())
	}

	/// Write `value` into storage slot `key` of account `a`, logging the
	/// previous value for undo.
	pub fn set_storage(&mut self, a: &Address, key: H256, value: H256) -> Result<(), Error> {
		trace!(target: "state", "set_storage({}: {:?} to {:?})", a, key, value);
		let had_value = self.storage_at(a, &key)?;
		self.touch(a);
		self.change_log.push(Change::Storage { address: *a, key, had_value });
		let start_nonce = self.account_start_nonce;
		self.require_or_from(a, false, || Account::new_basic(U256::zero(), start_nonce))?
			.set_storage(key, value);
		Ok(())
	}

	/// Create a new contract account at address `contract` with the given
	/// balance. The address must not be in use.
	pub fn new_contract(&mut self, contract: &Address, balance: U256) -> Result<(), Error> {
		debug_assert!(!self.exists(contract)?, "account must not exist prior to new_contract; qed");
		self.touch(contract);
		let account = Account::new_contract(balance, self.account_start_nonce);
		self.create_account(contract, account);
		Ok(())
	}

	/// Initialise the code of account `a`, creating the account when
	/// necessary. The previous code is logged so the change can be undone.
	pub fn init_code(&mut self, a: &Address, code: Bytes) -> Result<(), Error> {
		self.touch(a);
		let start_nonce = self.account_start_nonce;
		let (had_code_hash, had_code, had_new_code) = {
			let account = self.require_or_from(a, true, || Account::new_contract(U256::zero(), start_nonce))?;
			(
				account.code_hash(),
				account.code().unwrap_or_else(|| Arc::new(vec![])),
				account.has_new_code(),
			)
		};
		self.change_log.push(Change::NewCode { address: *a, had_code_hash, had_code, had_new_code });
		self.require(a, false)?.init_code(code);
		Ok(())
	}

	/// Remove an existing account; used for processing suicides. The trie
	/// entry disappears at commit.
	pub fn kill_account(&mut self, a: &Address) -> Result<(), Error> {
		self.ensure_cached(a, false, |_| ())?;
		if let Some(account) = self.cache.get_mut().get_mut(a) {
			account.kill();
		}
		Ok(())
	}

	/// Take a savepoint in the changelog, to `rollback` to later.
	pub fn savepoint(&self) -> usize {
		self.change_log.len()
	}

	/// Revert all changes made after the given savepoint, in reverse
	/// order.
	pub fn rollback(&mut self, savepoint: usize) {
		while self.change_log.len() > savepoint {
			let change = self.change_log.pop().expect("length checked against savepoint above; qed");
			match change {
				Change::Balance { address, amount } => {
					let cache = self.cache.get_mut();
					let account = cache.get_mut(&address)
						.expect("balance changes are logged against cached accounts; qed");
					let balance = *account.balance();
					account.set_balance(balance.overflowing_sub(amount).0);
				},
				Change::Storage { address, key, had_value } => {
					self.cache.get_mut().get_mut(&address)
						.expect("storage changes are logged against cached accounts; qed")
						.set_storage(key, had_value);
				},
				Change::Nonce { address } => {
					self.cache.get_mut().get_mut(&address)
						.expect("nonce changes are logged against cached accounts; qed")
						.dec_nonce();
				},
				Change::Create { address } => {
					self.cache.get_mut().remove(&address);
					self.non_existing.get_mut().insert(address);
				},
				Change::NewCode { address, had_code_hash, had_code, had_new_code } => {
					self.cache.get_mut().get_mut(&address)
						.expect("code changes are logged against cached accounts; qed")
						.revert_code(had_code_hash, had_code, had_new_code);
				},
				Change::Touch { address } => {
					self.touched.remove(&address);
				},
			}
		}
	}

	/// Commits our cached account changes into the trie. With
	/// `RemoveEmptyAccounts`, touched null accounts are purged first. The
	/// changelog, the touched set and the caches are cleared afterwards.
	pub fn commit(&mut self, behaviour: CommitBehaviour) -> Result<(), Error> {
		if behaviour == CommitBehaviour::RemoveEmptyAccounts {
			self.remove_empty_accounts();
		}
		{
			let State { ref mut db, ref mut root, ref mut cache, .. } = *self;
			let cache = cache.get_mut();

			// first, commit the sub-trees and pending code
			for (_, account) in cache.iter_mut().filter(|&(_, ref a)| a.is_dirty() && a.is_alive()) {
				account.commit_storage(db.as_hash_store_mut())?;
				account.commit_code(db.as_hash_store_mut());
			}

			let mut trie = SecTrieDBMut::from_existing(db.as_hash_store_mut(), root)?;
			for (address, account) in cache.iter().filter(|&(_, ref a)| a.is_dirty()) {
				match account.is_alive() {
					true => trie.insert(address.as_bytes(), &account.rlp())?,
					false => trie.remove(address.as_bytes())?,
				}
			}
		}
		self.change_log.clear();
		self.touched.clear();
		self.cache.get_mut().clear();
		self.non_existing.get_mut().clear();
		self.unchanged.get_mut().clear();
		Ok(())
	}

	/// Execute a given transaction, producing a receipt and optional
	/// traces. This changes the state accordingly and commits it, purging
	/// empty accounts when the active schedule says so.
	pub fn apply(
		&mut self,
		env_info: &EnvInfo,
		machine: &Machine,
		t: &SignedTransaction,
		tracing: bool,
	) -> ApplyResult<FlatTrace, Vec<VMStep>> {
		if tracing {
			let options = TransactOptions::with_tracing_and_vm_tracing();
			self.apply_with_tracing(env_info, machine, t, options.tracer, options.vm_tracer)
		} else {
			let options = TransactOptions::with_no_tracing();
			self.apply_with_tracing(env_info, machine, t, options.tracer, options.vm_tracer)
		}
	}

	/// Execute a given transaction with the given tracers, producing a
	/// receipt and optional traces. This changes the state accordingly.
	pub fn apply_with_tracing<T, V>(
		&mut self,
		env_info: &EnvInfo,
		machine: &Machine,
		t: &SignedTransaction,
		tracer: T,
		vm_tracer: V,
	) -> ApplyResult<T::Output, V::Output>
		where T: Tracer, V: VMTracer,
	{
		let e = self.execute(env_info, machine, t, TransactOptions::new(tracer, vm_tracer))?;
		let schedule = machine.schedule(env_info.number);
		let behaviour = match schedule.kill_empty {
			true => CommitBehaviour::RemoveEmptyAccounts,
			false => CommitBehaviour::KeepEmptyAccounts,
		};
		self.commit(behaviour)?;

		let outcome = match machine.eip658(env_info.number) {
			true => TransactionOutcome::StatusCode(if e.exception.is_some() { 0 } else { 1 }),
			false => TransactionOutcome::StateRoot(*self.root()),
		};
		let output = e.output;
		let receipt = Receipt::new(outcome, e.cumulative_gas_used, e.logs);
		trace!(target: "state", "Transaction receipt: {:?}", receipt);

		Ok(ApplyOutcome { receipt, output, trace: e.trace, vm_trace: e.vm_trace })
	}

	// Execute a given transaction without committing changes.
	fn execute<T, V>(
		&mut self,
		env_info: &EnvInfo,
		machine: &Machine,
		t: &SignedTransaction,
		options: TransactOptions<T, V>,
	) -> Result<Executed<T::Output, V::Output>, ExecutionError>
		where T: Tracer, V: VMTracer,
	{
		let schedule = machine.schedule(env_info.number);
		let mut e = Executive::new(self, env_info, machine, &schedule);
		e.transact(t, options)
	}

	// Record the first mutation of an account in this transaction.
	fn touch(&mut self, a: &Address) {
		if self.touched.insert(*a) {
			self.change_log.push(Change::Touch { address: *a });
		}
	}

	// Turn all touched null accounts into non-alive accounts.
	fn remove_empty_accounts(&mut self) {
		let State { ref touched, ref mut cache, .. } = *self;
		let cache = cache.get_mut();
		for address in touched {
			if let Some(account) = cache.get_mut(address) {
				if account.is_alive() && account.is_null() {
					trace!(target: "state", "purging empty account {}", address);
					account.kill();
				}
			}
		}
	}

	fn create_account(&mut self, a: &Address, mut account: Account) {
		account.set_dirty();
		self.non_existing.get_mut().remove(a);
		self.change_log.push(Change::Create { address: *a });
		self.cache.get_mut().insert(*a, account);
	}

	// Pull account `a` into the cache from the trie and pass it to `f`.
	// Negative results are cached too; killed accounts read as absent.
	// `require_code` makes sure the code is loaded alongside.
	fn ensure_cached<F, U>(&self, a: &Address, require_code: bool, f: F) -> Result<U, Error>
		where F: FnOnce(Option<&Account>) -> U
	{
		if self.non_existing.borrow().contains(a) {
			return Ok(f(None));
		}
		if !self.cache.borrow().contains_key(a) {
			self.clear_cache_if_large();
			let db = SecTrieDB::new(self.db.as_hash_store(), &self.root)?;
			match db.get(a.as_bytes())? {
				Some(blob) => {
					let account = Account::from_rlp(&blob).map_err(|e| Box::new(TrieError::Decoder(e)))?;
					self.cache.borrow_mut().insert(*a, account);
					self.unchanged.borrow_mut().push(*a);
				},
				None => {
					self.non_existing.borrow_mut().insert(*a);
					return Ok(f(None));
				},
			}
		}
		if require_code {
			if let Some(account) = self.cache.borrow_mut().get_mut(a) {
				account.cache_code(self.db.as_hash_store());
			}
		}
		let cache = self.cache.borrow();
		Ok(f(cache.get(a).filter(|account| account.is_alive())))
	}

	// Evict clean, untouched cache entries once the cache grows too big.
	fn clear_cache_if_large(&self) {
		let mut unchanged = self.unchanged.borrow_mut();
		if unchanged.len() < MAX_UNCHANGED_CACHE_ITEMS {
			return;
		}
		let mut cache = self.cache.borrow_mut();
		for address in unchanged.drain(..) {
			if self.touched.contains(&address) {
				continue;
			}
			let evictable = cache.get(&address).map_or(false, |account| !account.is_dirty());
			if evictable {
				cache.remove(&address);
			}
		}
	}

	// Pull account `a` into the cache, creating it from `default` when
	// absent, and return a mutable reference. Creation is logged.
	fn require_or_from<F>(&mut self, a: &Address, require_code: bool, default: F) -> Result<&mut Account, Error>
		where F: FnOnce() -> Account
	{
		// killed accounts still sit in the cache, but read as absent
		let cached = self.cache.get_mut().get(a).map(|account| account.is_alive());
		let exists = match cached {
			Some(alive) => alive,
			None => {
				if self.non_existing.get_mut().contains(a) {
					false
				} else {
					let db = SecTrieDB::new(self.db.as_hash_store(), &self.root)?;
					match db.get(a.as_bytes())? {
						Some(blob) => {
							let account = Account::from_rlp(&blob).map_err(|e| Box::new(TrieError::Decoder(e)))?;
							self.cache.get_mut().insert(*a, account);
							true
						},
						None => false,
					}
				}
			},
		};
		if !exists {
			self.create_account(a, default());
		}

		let State { ref mut cache, ref db, .. } = *self;
		let account = cache.get_mut().get_mut(a).expect("entry ensured above; qed");
		if require_code {
			account.cache_code(db.as_hash_store());
		}
		Ok(account)
	}

	// Pull account `a` into the cache, creating a basic account when
	// absent, and return a mutable reference.
	fn require(&mut self, a: &Address, require_code: bool) -> Result<&mut Account, Error> {
		let start_nonce = self.account_start_nonce;
		self.require_or_from(a, require_code, || Account::new_basic(U256::zero(), start_nonce))
	}
}

impl<B: Backend> fmt::Debug for State<B> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{:?}", self.cache.borrow())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use db::MemoryDB;
	use test_helpers::new_state;
	use std::str::FromStr;

	fn address_from_u64(n: u64) -> Address {
		Address::from_low_u64_be(n)
	}

	#[test]
	fn alter_balance() {
		let mut state = new_state();
		let a = Address::zero();
		let b = address_from_u64(1);
		state.add_balance(&a, &69.into()).unwrap();
		assert_eq!(state.balance(&a).unwrap(), 69.into());
		state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
		assert_eq!(state.balance(&a).unwrap(), 69.into());
		state.sub_balance(&a, &42.into()).unwrap();
		assert_eq!(state.balance(&a).unwrap(), 27.into());
		state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
		assert_eq!(state.balance(&a).unwrap(), 27.into());
		state.transfer_balance(&a, &b, &18.into()).unwrap();
		assert_eq!(state.balance(&a).unwrap(), 9.into());
		assert_eq!(state.balance(&b).unwrap(), 18.into());
		state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
		assert_eq!(state.balance(&a).unwrap(), 9.into());
		assert_eq!(state.balance(&b).unwrap(), 18.into());
	}

	#[test]
	fn alter_nonce() {
		let mut state = new_state();
		let a = Address::zero();
		state.inc_nonce(&a).unwrap();
		assert_eq!(state.nonce(&a).unwrap(), 1.into());
		state.inc_nonce(&a).unwrap();
		assert_eq!(state.nonce(&a).unwrap(), 2.into());
		state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
		assert_eq!(state.nonce(&a).unwrap(), 2.into());
		state.inc_nonce(&a).unwrap();
		assert_eq!(state.nonce(&a).unwrap(), 3.into());
	}

	#[test]
	fn balance_nonce_of_absent_account() {
		let mut state = new_state();
		let a = Address::zero();
		assert_eq!(state.balance(&a).unwrap(), 0.into());
		assert_eq!(state.nonce(&a).unwrap(), 0.into());
		state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
		assert_eq!(state.balance(&a).unwrap(), 0.into());
		assert_eq!(state.nonce(&a).unwrap(), 0.into());
	}

	#[test]
	fn not_enough_cash() {
		let mut state = new_state();
		let a = Address::zero();
		state.add_balance(&a, &5.into()).unwrap();
		match state.sub_balance(&a, &6.into()) {
			Err(Error::NotEnoughCash { required, got }) => {
				assert_eq!(required, 6.into());
				assert_eq!(got, 5.into());
			},
			_ => panic!("expected NotEnoughCash"),
		}
		// nothing was logged for the failed debit
		let sp = state.savepoint();
		state.rollback(sp);
		assert_eq!(state.balance(&a).unwrap(), 5.into());
	}

	#[test]
	fn transfer_is_atomic() {
		let mut state = new_state();
		let a = Address::zero();
		let b = address_from_u64(1);
		state.add_balance(&a, &10.into()).unwrap();
		let sp = state.savepoint();
		assert!(state.transfer_balance(&a, &b, &11.into()).is_err());
		assert_eq!(state.savepoint(), sp);
		assert_eq!(state.balance(&a).unwrap(), 10.into());
		assert_eq!(state.balance(&b).unwrap(), 0.into());
	}

	#[test]
	fn remove() {
		let mut state = new_state();
		let a = Address::zero();
		assert_eq!(state.exists(&a).unwrap(), false);
		state.inc_nonce(&a).unwrap();
		assert_eq!(state.exists(&a).unwrap(), true);
		assert_eq!(state.nonce(&a).unwrap(), 1.into());
		state.kill_account(&a).unwrap();
		assert_eq!(state.exists(&a).unwrap(), false);
		assert_eq!(state.nonce(&a).unwrap(), 0.into());
	}

	#[test]
	fn remove_from_database() {
		let a = Address::zero();
		let (root, db) = {
			let mut state = new_state();
			state.inc_nonce(&a).unwrap();
			state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
			assert_eq!(state.exists(&a).unwrap(), true);
			state.drop()
		};

		let (root, db) = {
			let mut state = State::from_existing(db, root, U256::zero()).unwrap();
			assert_eq!(state.exists(&a).unwrap(), true);
			assert_eq!(state.nonce(&a).unwrap(), 1.into());
			state.kill_account(&a).unwrap();
			state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
			assert_eq!(state.exists(&a).unwrap(), false);
			state.drop()
		};

		let state = State::from_existing(db, root, U256::zero()).unwrap();
		assert_eq!(state.exists(&a).unwrap(), false);
		assert_eq!(state.nonce(&a).unwrap(), 0.into());
	}

	#[test]
	fn get_from_database() {
		let a = Address::zero();
		let (root, db) = {
			let mut state = new_state();
			state.inc_nonce(&a).unwrap();
			state.add_balance(&a, &69.into()).unwrap();
			state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
			assert_eq!(state.balance(&a).unwrap(), 69.into());
			state.drop()
		};

		let state = State::from_existing(db, root, U256::zero()).unwrap();
		assert_eq!(state.balance(&a).unwrap(), 69.into());
		assert_eq!(state.nonce(&a).unwrap(), 1.into());
	}

	#[test]
	fn code_from_database() {
		let a = Address::zero();
		let (root, db) = {
			let mut state = new_state();
			state.init_code(&a, vec![1, 2, 3]).unwrap();
			assert_eq!(state.code(&a).unwrap(), Some(Arc::new(vec![1u8, 2, 3])));
			state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
			assert_eq!(state.code(&a).unwrap(), Some(Arc::new(vec![1u8, 2, 3])));
			state.drop()
		};

		let state = State::from_existing(db, root, U256::zero()).unwrap();
		assert_eq!(state.code(&a).unwrap(), Some(Arc::new(vec![1u8, 2, 3])));
		assert_eq!(state.code_size(&a).unwrap(), Some(3));
	}

	#[test]
	fn storage_at_from_database() {
		let a = Address::zero();
		let (root, db) = {
			let mut state = new_state();
			state.set_storage(&a, H256::from_low_u64_be(1), H256::from_low_u64_be(69)).unwrap();
			state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
			state.drop()
		};

		let state = State::from_existing(db, root, U256::zero()).unwrap();
		assert_eq!(
			state.storage_at(&a, &H256::from_low_u64_be(1)).unwrap(),
			H256::from_low_u64_be(69)
		);
	}

	#[test]
	fn savepoint_basic() {
		let mut state = new_state();
		let a = Address::zero();
		let sp = state.savepoint();
		state.add_balance(&a, &69.into()).unwrap();
		assert_eq!(state.balance(&a).unwrap(), 69.into());
		let sp2 = state.savepoint();
		state.add_balance(&a, &1.into()).unwrap();
		assert_eq!(state.balance(&a).unwrap(), 70.into());
		state.rollback(sp2);
		assert_eq!(state.balance(&a).unwrap(), 69.into());
		state.rollback(sp);
		assert_eq!(state.balance(&a).unwrap(), 0.into());
		assert_eq!(state.exists(&a).unwrap(), false);
	}

	#[test]
	fn savepoint_nested() {
		let mut state = new_state();
		let a = Address::zero();
		let outer = state.savepoint();
		state.inc_nonce(&a).unwrap();
		let inner = state.savepoint();
		state.add_balance(&a, &69.into()).unwrap();
		state.set_storage(&a, H256::from_low_u64_be(7), H256::from_low_u64_be(42)).unwrap();
		state.rollback(inner);
		assert_eq!(state.balance(&a).unwrap(), 0.into());
		assert_eq!(state.storage_at(&a, &H256::from_low_u64_be(7)).unwrap(), H256::zero());
		assert_eq!(state.nonce(&a).unwrap(), 1.into());
		state.rollback(outer);
		assert_eq!(state.exists(&a).unwrap(), false);
	}

	#[test]
	fn rollback_restores_code() {
		let mut state = new_state();
		let a = Address::zero();
		state.init_code(&a, vec![1, 2, 3]).unwrap();
		let sp = state.savepoint();
		state.init_code(&a, vec![4, 5]).unwrap();
		assert_eq!(state.code(&a).unwrap(), Some(Arc::new(vec![4u8, 5])));
		state.rollback(sp);
		assert_eq!(state.code(&a).unwrap(), Some(Arc::new(vec![1u8, 2, 3])));
	}

	#[test]
	fn rollback_yields_identical_root() {
		let mut state = new_state();
		let a = Address::zero();
		let b = address_from_u64(1);
		state.add_balance(&a, &69.into()).unwrap();
		state.set_storage(&a, H256::from_low_u64_be(1), H256::from_low_u64_be(2)).unwrap();
		state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
		let root_before = *state.root();

		let sp = state.savepoint();
		state.inc_nonce(&a).unwrap();
		state.transfer_balance(&a, &b, &30.into()).unwrap();
		state.set_storage(&a, H256::from_low_u64_be(1), H256::zero()).unwrap();
		state.set_storage(&a, H256::from_low_u64_be(9), H256::from_low_u64_be(9)).unwrap();
		state.rollback(sp);

		state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
		assert_eq!(*state.root(), root_before);
	}

	#[test]
	fn touched_empty_accounts_are_purged() {
		let mut state = new_state();
		let a = address_from_u64(0xa);
		// an empty account makes it into the trie under the old rules
		state.add_balance(&a, &0.into()).unwrap();
		state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
		assert_eq!(state.exists(&a).unwrap(), true);

		// a later touch purges it under the new rules
		state.add_balance(&a, &0.into()).unwrap();
		assert!(state.touched().contains(&a));
		state.commit(CommitBehaviour::RemoveEmptyAccounts).unwrap();
		assert_eq!(state.exists(&a).unwrap(), false);
	}

	#[test]
	fn untouched_empty_accounts_survive() {
		let mut state = new_state();
		let a = address_from_u64(0xa);
		let b = address_from_u64(0xb);
		state.add_balance(&a, &0.into()).unwrap();
		state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();

		state.add_balance(&b, &1.into()).unwrap();
		state.commit(CommitBehaviour::RemoveEmptyAccounts).unwrap();
		assert_eq!(state.exists(&a).unwrap(), true);
	}

	#[test]
	fn negative_cache_avoids_reload() {
		let mut state = new_state();
		let a = address_from_u64(0xdead);
		assert_eq!(state.exists(&a).unwrap(), false);
		// a second miss is served from the negative cache
		assert_eq!(state.exists(&a).unwrap(), false);
		// creation clears the negative entry
		state.add_balance(&a, &1.into()).unwrap();
		assert_eq!(state.exists(&a).unwrap(), true);
	}

	#[test]
	fn new_contract_starts_blank() {
		let mut state = new_state();
		let a = address_from_u64(0xa);
		let sp = state.savepoint();
		state.new_contract(&a, 42.into()).unwrap();
		assert_eq!(state.balance(&a).unwrap(), 42.into());
		assert_eq!(state.nonce(&a).unwrap(), 0.into());
		assert_eq!(state.address_has_code(&a).unwrap(), false);
		state.rollback(sp);
		assert_eq!(state.exists(&a).unwrap(), false);
	}

	#[test]
	fn create_empty() {
		let mut state = new_state();
		state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
		assert_eq!(
			*state.root(),
			H256::from_str("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421").unwrap()
		);
	}

	#[test]
	fn ensure_cached_root() {
		let mut state = new_state();
		let a = Address::zero();
		state.add_balance(&a, &0.into()).unwrap();
		state.commit(CommitBehaviour::KeepEmptyAccounts).unwrap();
		assert_eq!(
			*state.root(),
			H256::from_str("0ce23f3c809de377b008a4a3ee94a0834aac8bec1f86e28ffe4fdb5a15b0c785").unwrap()
		);
	}

	#[test]
	fn from_existing_rejects_unknown_root() {
		let db = MemoryDB::new();
		let root = H256::from_low_u64_be(1);
		assert!(State::from_existing(db, root, U256::zero()).is_err());
	}
}

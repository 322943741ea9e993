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

//! Single account in the system.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use ethereum_types::{BigEndianHash, H256, U256};
use hash::{keccak, KECCAK_EMPTY, KECCAK_NULL_RLP};
use lru_cache::LruCache;
use rlp::{DecoderError, Rlp, RlpStream};

use db::HashStore;
use trie;
use trie::{SecTrieDB, SecTrieDBMut};

use super::CODE_SIZE_CACHE;

const STORAGE_CACHE_ITEMS: usize = 8192;

/// Boolean type for clean/dirty status.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Filth {
	/// Data has not been changed.
	Clean,
	/// Data has been changed.
	Dirty,
}

/// Single account in the system. Keeps track of uncommitted changes to
/// storage and code; those are folded into the backing tries by
/// `commit_storage` and `commit_code`.
pub struct Account {
	// Balance of the account.
	balance: U256,
	// Nonce of the account.
	nonce: U256,
	// Root of the committed storage trie.
	storage_root: H256,
	// LRU cache of clean, committed storage reads.
	storage_cache: RefCell<LruCache<H256, H256>>,
	// Uncommitted slot writes. A zero value is an explicit delete at
	// commit. Takes precedence over `storage_cache` and the trie.
	storage_overlay: HashMap<H256, H256>,
	// Code hash of the account.
	code_hash: H256,
	// Size of the account code, when known.
	code_size: Option<usize>,
	// Code cache of the account.
	code_cache: Arc<Bytes>,
	// Code pending insertion into the database at commit.
	has_new_code: bool,
	// Whether the account exists in the world; killed accounts are purged
	// from the trie at commit.
	alive: bool,
	// Mutated since the last commit.
	filth: Filth,
}

impl Account {
	fn empty_storage_cache() -> RefCell<LruCache<H256, H256>> {
		RefCell::new(LruCache::new(STORAGE_CACHE_ITEMS))
	}

	/// Create a new account with the given balance and nonce.
	pub fn new_basic(balance: U256, nonce: U256) -> Account {
		Account {
			balance,
			nonce,
			storage_root: KECCAK_NULL_RLP,
			storage_cache: Self::empty_storage_cache(),
			storage_overlay: HashMap::new(),
			code_hash: KECCAK_EMPTY,
			code_size: Some(0),
			code_cache: Arc::new(vec![]),
			has_new_code: false,
			alive: true,
			filth: Filth::Clean,
		}
	}

	/// Create a new contract account ready for `init_code`.
	pub fn new_contract(balance: U256, nonce: U256) -> Account {
		let mut account = Account::new_basic(balance, nonce);
		account.code_size = None;
		account
	}

	/// Decode an account from its trie representation.
	pub fn from_rlp(rlp: &[u8]) -> Result<Account, DecoderError> {
		let rlp = Rlp::new(rlp);
		Ok(Account {
			nonce: rlp.val_at(0)?,
			balance: rlp.val_at(1)?,
			storage_root: rlp.val_at(2)?,
			storage_cache: Self::empty_storage_cache(),
			storage_overlay: HashMap::new(),
			code_hash: rlp.val_at(3)?,
			code_size: None,
			code_cache: Arc::new(vec![]),
			has_new_code: false,
			alive: true,
			filth: Filth::Clean,
		})
	}

	/// Export to the trie representation: `rlp([nonce, balance,
	/// storage_root, code_hash])`.
	pub fn rlp(&self) -> Bytes {
		let mut stream = RlpStream::new_list(4);
		stream.append(&self.nonce);
		stream.append(&self.balance);
		stream.append(&self.storage_root);
		stream.append(&self.code_hash);
		stream.out()
	}

	/// Balance of the account.
	pub fn balance(&self) -> &U256 { &self.balance }

	/// Nonce of the account.
	pub fn nonce(&self) -> &U256 { &self.nonce }

	/// Hash of the account code.
	pub fn code_hash(&self) -> H256 { self.code_hash }

	/// Whether the account still exists in the world.
	pub fn is_alive(&self) -> bool { self.alive }

	/// Whether the account has been mutated since the last commit.
	pub fn is_dirty(&self) -> bool { self.filth == Filth::Dirty }

	/// Mark the account as mutated.
	pub fn set_dirty(&mut self) { self.filth = Filth::Dirty; }

	/// An account is null when it has zero nonce, zero balance and no
	/// code; post-EIP-158 a null touched account is purged at commit.
	pub fn is_null(&self) -> bool {
		self.balance.is_zero() && self.nonce.is_zero() && self.code_hash == KECCAK_EMPTY
	}

	/// Whether the account carries executable code.
	pub fn is_basic(&self) -> bool {
		self.code_hash == KECCAK_EMPTY
	}

	/// The committed storage root, or `None` while overlay writes are
	/// pending.
	pub fn storage_root(&self) -> Option<&H256> {
		if self.storage_is_clean() { Some(&self.storage_root) } else { None }
	}

	/// The storage root last committed, regardless of pending writes.
	pub fn base_storage_root(&self) -> &H256 { &self.storage_root }

	/// Uncommitted storage writes.
	pub fn storage_overlay(&self) -> &HashMap<H256, H256> { &self.storage_overlay }

	/// Whether there are no uncommitted storage writes.
	pub fn storage_is_clean(&self) -> bool { self.storage_overlay.is_empty() }

	/// Write `value` at `key` into the overlay.
	pub fn set_storage(&mut self, key: H256, value: H256) {
		self.storage_overlay.insert(key, value);
		self.filth = Filth::Dirty;
	}

	/// Read storage at `key`: the overlay wins, then the read cache, then
	/// the committed trie.
	pub fn storage_at(&self, db: &dyn HashStore, key: &H256) -> trie::Result<H256> {
		if let Some(value) = self.cached_storage_at(key) {
			return Ok(value);
		}
		let db = SecTrieDB::new(db, &self.storage_root)?;
		let item: U256 = match db.get(key.as_bytes())? {
			Some(value) => Rlp::new(&value).as_val()?,
			None => U256::zero(),
		};
		let value = H256::from_uint(&item);
		self.storage_cache.borrow_mut().insert(*key, value);
		Ok(value)
	}

	/// Cached storage value, if any.
	pub fn cached_storage_at(&self, key: &H256) -> Option<H256> {
		if let Some(value) = self.storage_overlay.get(key) {
			return Some(*value);
		}
		if let Some(value) = self.storage_cache.borrow_mut().get_mut(key) {
			return Some(*value);
		}
		None
	}

	/// Increment the nonce of the account by one.
	pub fn inc_nonce(&mut self) {
		self.nonce = self.nonce + U256::one();
		self.filth = Filth::Dirty;
	}

	/// Decrement the nonce of the account by one. Only rollback does this.
	pub fn dec_nonce(&mut self) {
		self.nonce = self.nonce - U256::one();
	}

	/// Increase account balance.
	pub fn add_balance(&mut self, x: &U256) {
		self.balance = self.balance + *x;
		self.filth = Filth::Dirty;
	}

	/// Decrease account balance. The caller has checked that the balance
	/// suffices.
	pub fn sub_balance(&mut self, x: &U256) {
		assert!(self.balance >= *x);
		self.balance = self.balance - *x;
		self.filth = Filth::Dirty;
	}

	/// Overwrite the balance; used when undoing a logged balance change.
	pub fn set_balance(&mut self, balance: U256) {
		self.balance = balance;
	}

	/// Install freshly deployed code. It reaches the database at commit.
	pub fn init_code(&mut self, code: Bytes) {
		self.code_hash = keccak(&code);
		self.code_cache = Arc::new(code);
		self.code_size = Some(self.code_cache.len());
		self.has_new_code = true;
		self.filth = Filth::Dirty;
	}

	/// Restore a previous code state; used when undoing a logged code
	/// change.
	pub fn revert_code(&mut self, code_hash: H256, code: Arc<Bytes>, had_new_code: bool) {
		self.code_size = Some(code.len());
		self.code_hash = code_hash;
		self.code_cache = code;
		self.has_new_code = had_new_code;
	}

	/// Whether code is pending insertion into the database.
	pub fn has_new_code(&self) -> bool { self.has_new_code }

	/// The account's code, when cached. `None` means the cache needs
	/// filling via `cache_code`.
	pub fn code(&self) -> Option<Arc<Bytes>> {
		if self.code_hash != KECCAK_EMPTY && self.code_cache.is_empty() {
			return None;
		}
		Some(self.code_cache.clone())
	}

	/// The account's code size, when known.
	pub fn code_size(&self) -> Option<usize> {
		self.code_size
	}

	/// Is the code cache valid, such that `code()` will return `Some`?
	pub fn is_cached(&self) -> bool {
		!self.code_cache.is_empty() || (self.code_cache.is_empty() && self.code_hash == KECCAK_EMPTY)
	}

	/// Load the code from the database by hash, if it is not cached yet.
	pub fn cache_code(&mut self, db: &dyn HashStore) -> Option<Arc<Bytes>> {
		if self.is_cached() {
			return Some(self.code_cache.clone());
		}
		match db.get(&self.code_hash) {
			Some(code) => {
				self.code_size = Some(code.len());
				self.code_cache = Arc::new(code);
				Some(self.code_cache.clone())
			},
			_ => {
				warn!(target: "account", "Failed reverse get of {}", self.code_hash);
				None
			},
		}
	}

	/// Mark the account as removed from the world. The trie entry goes
	/// away at commit.
	pub fn kill(&mut self) {
		self.alive = false;
		self.storage_overlay.clear();
		self.storage_root = KECCAK_NULL_RLP;
		self.code_hash = KECCAK_EMPTY;
		self.code_cache = Arc::new(vec![]);
		self.code_size = Some(0);
		self.has_new_code = false;
		self.balance = U256::zero();
		self.nonce = U256::zero();
		self.filth = Filth::Dirty;
	}

	/// Fold the storage overlay into the storage trie and update the
	/// storage root. Zero values delete their slot.
	pub fn commit_storage(&mut self, db: &mut dyn HashStore) -> trie::Result<()> {
		let mut trie = SecTrieDBMut::from_existing(db, &mut self.storage_root)?;
		for (key, value) in self.storage_overlay.drain() {
			match value.is_zero() {
				true => trie.remove(key.as_bytes())?,
				false => trie.insert(key.as_bytes(), &::rlp::encode(&value.into_uint()))?,
			};
			self.storage_cache.borrow_mut().insert(key, value);
		}
		Ok(())
	}

	/// Write pending code into the database and note its size in the
	/// process-wide code-size cache.
	pub fn commit_code(&mut self, db: &mut dyn HashStore) {
		if !self.has_new_code {
			return;
		}
		if self.code_cache.is_empty() {
			self.code_size = Some(0);
		} else {
			db.emplace(self.code_hash, (*self.code_cache).clone());
			self.code_size = Some(self.code_cache.len());
			CODE_SIZE_CACHE.lock().insert(self.code_hash, self.code_cache.len());
		}
		self.has_new_code = false;
	}
}

impl fmt::Debug for Account {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Account")
			.field("balance", &self.balance)
			.field("nonce", &self.nonce)
			.field("code_hash", &self.code_hash)
			.field("storage_root", &self.storage_root)
			.field("alive", &self.alive)
			.finish()
	}
}

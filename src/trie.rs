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

//! Secure trie views over a `HashStore`.
//!
//! `SecTrieDB`/`SecTrieDBMut` expose the path-keyed interface the state
//! needs: `get`/`insert`/`remove` plus a `root()` that is the canonical
//! secure-trie root (keys hashed with keccak before insertion, computed by
//! `triehash`). Node-level trie layout is not this crate's business. A
//! trie's content lives behind its root hash in the `HashStore`, and only
//! the root is consensus-visible.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use ethereum_types::H256;
use hash::KECCAK_NULL_RLP;
use keccak_hasher::KeccakHasher;
use rlp::{DecoderError, Rlp, RlpStream};

use db::{DBValue, HashStore};

/// Failures surfaced by trie access.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TrieError {
	/// No trie content found under the given root.
	InvalidStateRoot(H256),
	/// The backing database lost a blob it was expected to hold.
	IncompleteDatabase(H256),
	/// Stored trie content failed to decode.
	Decoder(DecoderError),
}

impl fmt::Display for TrieError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			TrieError::InvalidStateRoot(ref root) => write!(f, "Invalid state root: {}", root),
			TrieError::IncompleteDatabase(ref key) => write!(f, "Database missing expected key: {}", key),
			TrieError::Decoder(ref err) => write!(f, "Decoding failed with {}", err),
		}
	}
}

impl From<DecoderError> for Box<TrieError> {
	fn from(err: DecoderError) -> Self {
		Box::new(TrieError::Decoder(err))
	}
}

/// Trie operation result.
pub type Result<T> = ::std::result::Result<T, Box<TrieError>>;

fn load_entries(db: &dyn HashStore, root: &H256) -> Result<BTreeMap<Bytes, Bytes>> {
	if *root == KECCAK_NULL_RLP {
		return Ok(BTreeMap::new());
	}
	let blob = db.get(root).ok_or_else(|| Box::new(TrieError::InvalidStateRoot(*root)))?;
	let rlp = Rlp::new(&blob);
	let mut entries = BTreeMap::new();
	for row in rlp.iter() {
		let key: Bytes = row.val_at(0)?;
		let value: Bytes = row.val_at(1)?;
		entries.insert(key, value);
	}
	Ok(entries)
}

fn store_entries(db: &mut dyn HashStore, entries: &BTreeMap<Bytes, Bytes>) -> H256 {
	if entries.is_empty() {
		return KECCAK_NULL_RLP;
	}
	let root = H256(::triehash::sec_trie_root::<KeccakHasher, _, _, _>(entries.iter()));
	let mut stream = RlpStream::new_list(entries.len());
	for (key, value) in entries {
		stream.begin_list(2);
		stream.append(key);
		stream.append(value);
	}
	db.emplace(root, stream.out());
	root
}

/// Read-only secure trie view rooted at a fixed hash.
pub struct SecTrieDB {
	entries: BTreeMap<Bytes, Bytes>,
	root: H256,
}

impl SecTrieDB {
	/// Open the trie rooted at `root`. Fails with `InvalidStateRoot` when
	/// the database has no content for a non-null root.
	pub fn new(db: &dyn HashStore, root: &H256) -> Result<SecTrieDB> {
		Ok(SecTrieDB {
			entries: load_entries(db, root)?,
			root: *root,
		})
	}

	/// The root this view was opened at.
	pub fn root(&self) -> &H256 {
		&self.root
	}

	/// Look up a value by unhashed key.
	pub fn get(&self, key: &[u8]) -> Result<Option<DBValue>> {
		Ok(self.entries.get(key).cloned())
	}

	/// Whether the trie holds a value for `key`.
	pub fn contains(&self, key: &[u8]) -> Result<bool> {
		Ok(self.entries.contains_key(key))
	}

	/// Whether the trie holds no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterate over (key, value) pairs in key order.
	pub fn iter(&self) -> impl Iterator<Item = (&Bytes, &Bytes)> {
		self.entries.iter()
	}
}

/// Mutable secure trie view. Changes are committed back to the store and
/// the caller's root on drop, mirroring how the state code scopes its trie
/// borrows.
pub struct SecTrieDBMut<'db> {
	db: &'db mut dyn HashStore,
	root: &'db mut H256,
	entries: BTreeMap<Bytes, Bytes>,
	dirty: bool,
}

impl<'db> SecTrieDBMut<'db> {
	/// Create a fresh, empty trie; resets `root` to the null-trie root.
	pub fn new(db: &'db mut dyn HashStore, root: &'db mut H256) -> SecTrieDBMut<'db> {
		*root = KECCAK_NULL_RLP;
		SecTrieDBMut {
			db,
			root,
			entries: BTreeMap::new(),
			dirty: false,
		}
	}

	/// Open an existing trie rooted at `*root`.
	pub fn from_existing(db: &'db mut dyn HashStore, root: &'db mut H256) -> Result<SecTrieDBMut<'db>> {
		let entries = load_entries(&*db, root)?;
		Ok(SecTrieDBMut {
			db,
			root,
			entries,
			dirty: false,
		})
	}

	/// Look up a value by unhashed key.
	pub fn get(&self, key: &[u8]) -> Result<Option<DBValue>> {
		Ok(self.entries.get(key).cloned())
	}

	/// Insert `value` under `key`, replacing any previous value.
	pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
		self.entries.insert(key.to_vec(), value.to_vec());
		self.dirty = true;
		Ok(())
	}

	/// Remove the value under `key`, if any.
	pub fn remove(&mut self, key: &[u8]) -> Result<()> {
		if self.entries.remove(key).is_some() {
			self.dirty = true;
		}
		Ok(())
	}

	/// Recompute the root and write the trie content back to the store.
	/// Called implicitly on drop.
	pub fn commit(&mut self) {
		if !self.dirty {
			return;
		}
		*self.root = store_entries(self.db, &self.entries);
		self.dirty = false;
	}
}

impl<'db> Drop for SecTrieDBMut<'db> {
	fn drop(&mut self) {
		self.commit();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use db::MemoryDB;
	use ethereum_types::H256;
	use std::str::FromStr;

	#[test]
	fn empty_root_is_null_rlp() {
		let mut db = MemoryDB::new();
		let mut root = H256::zero();
		SecTrieDBMut::new(&mut db, &mut root);
		assert_eq!(root, KECCAK_NULL_RLP);
		assert_eq!(
			root,
			H256::from_str("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421").unwrap()
		);
	}

	#[test]
	fn insert_and_reopen() {
		let mut db = MemoryDB::new();
		let mut root = H256::zero();
		{
			let mut trie = SecTrieDBMut::new(&mut db, &mut root);
			trie.insert(b"dog", b"puppy").unwrap();
			trie.insert(b"cat", b"kitten").unwrap();
		}
		assert_ne!(root, KECCAK_NULL_RLP);
		let trie = SecTrieDB::new(&db, &root).unwrap();
		assert_eq!(trie.get(b"dog").unwrap(), Some(b"puppy".to_vec()));
		assert_eq!(trie.get(b"fish").unwrap(), None);
	}

	#[test]
	fn remove_restores_prior_root() {
		let mut db = MemoryDB::new();
		let mut root = H256::zero();
		{
			let mut trie = SecTrieDBMut::new(&mut db, &mut root);
			trie.insert(b"dog", b"puppy").unwrap();
		}
		let one_entry_root = root;
		{
			let mut trie = SecTrieDBMut::from_existing(&mut db, &mut root).unwrap();
			trie.insert(b"cat", b"kitten").unwrap();
		}
		{
			let mut trie = SecTrieDBMut::from_existing(&mut db, &mut root).unwrap();
			trie.remove(b"cat").unwrap();
		}
		assert_eq!(root, one_entry_root);
	}

	#[test]
	fn unknown_root_is_an_error() {
		let db = MemoryDB::new();
		let root = H256::from_low_u64_be(1);
		match SecTrieDB::new(&db, &root) {
			Err(ref err) if **err == TrieError::InvalidStateRoot(root) => {},
			other => panic!("expected InvalidStateRoot, got {:?}", other.is_ok()),
		}
	}
}

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

//! Hash-addressed storage backing the state.
//!
//! The account trie, the per-account storage tries and the code space all
//! read and write through a single `HashStore`. `MemoryDB` is the
//! reference-counted in-memory implementation used by tests and by anything
//! that wants a throwaway state.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use bytes::Bytes;
use ethereum_types::H256;
use hash::keccak;

/// Value type handed out by a `HashStore`.
pub type DBValue = Bytes;

/// Key-value store addressed by the keccak of the stored value.
pub trait HashStore {
	/// Look up a previously inserted blob.
	fn get(&self, key: &H256) -> Option<DBValue>;

	/// Whether the store holds a live entry under `key`.
	fn contains(&self, key: &H256) -> bool;

	/// Insert a blob, keyed by its keccak. Returns the key.
	fn insert(&mut self, value: &[u8]) -> H256;

	/// Insert a blob under an externally computed key. The key must be the
	/// keccak of the value; this exists so callers that already hashed the
	/// value do not hash it twice.
	fn emplace(&mut self, key: H256, value: DBValue);

	/// Drop one reference to the blob under `key`.
	fn remove(&mut self, key: &H256);
}

/// State backend seam: whatever the surrounding client keeps around a hash
/// store (caches, journals) hides behind this.
pub trait Backend {
	/// Immutable view of the underlying hash store.
	fn as_hash_store(&self) -> &dyn HashStore;

	/// Mutable view of the underlying hash store.
	fn as_hash_store_mut(&mut self) -> &mut dyn HashStore;
}

/// Reference-counted in-memory `HashStore`. Inserting the same blob twice
/// bumps a counter; removal only forgets the data once every insertion has
/// been matched by a removal.
#[derive(Default, Clone)]
pub struct MemoryDB {
	data: HashMap<H256, (DBValue, i32)>,
}

impl MemoryDB {
	/// Create a new, empty store.
	pub fn new() -> MemoryDB {
		MemoryDB::default()
	}

	/// Number of live entries.
	pub fn len(&self) -> usize {
		self.data.values().filter(|&&(_, rc)| rc > 0).count()
	}

	/// Whether the store holds no live entries.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl HashStore for MemoryDB {
	fn get(&self, key: &H256) -> Option<DBValue> {
		match self.data.get(key) {
			Some(&(ref value, rc)) if rc > 0 => Some(value.clone()),
			_ => None,
		}
	}

	fn contains(&self, key: &H256) -> bool {
		self.data.get(key).map_or(false, |&(_, rc)| rc > 0)
	}

	fn insert(&mut self, value: &[u8]) -> H256 {
		let key = keccak(value);
		self.emplace(key, value.to_vec());
		key
	}

	fn emplace(&mut self, key: H256, value: DBValue) {
		match self.data.entry(key) {
			Entry::Occupied(mut entry) => {
				let &mut (ref mut stored, ref mut rc) = entry.get_mut();
				if *rc <= 0 {
					*stored = value;
				}
				*rc += 1;
			},
			Entry::Vacant(entry) => {
				entry.insert((value, 1));
			},
		}
	}

	fn remove(&mut self, key: &H256) {
		let entry = self.data.entry(*key).or_insert_with(|| (DBValue::new(), 0));
		entry.1 -= 1;
	}
}

impl Backend for MemoryDB {
	fn as_hash_store(&self) -> &dyn HashStore {
		self
	}

	fn as_hash_store_mut(&mut self) -> &mut dyn HashStore {
		self
	}
}

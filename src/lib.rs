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

#![warn(missing_docs)]

//! Transaction execution and state transition core.
//!
//! Two cooperating pieces live here: `state::State`, an account model over a
//! trie-backed database with an append-only changelog of reversible
//! mutations (savepoint/rollback/commit), and `executive::Executive`, the
//! transaction driver that validates a transaction, meters gas, dispatches
//! contract creation or message calls, re-enters the virtual machine through
//! `externalities::Externalities` and finalizes refunds and fees.
//!
//! The virtual machine itself, the consensus engine and the persistent
//! database are external: they plug in through `vm::Exec`, `machine::Machine`
//! and `db::Backend` respectively.

extern crate ethereum_types;
extern crate keccak_hash as hash;
extern crate keccak_hasher;
extern crate lru_cache;
extern crate parity_bytes as bytes;
extern crate parking_lot;
extern crate rlp;
extern crate triehash;

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

#[cfg(test)]
extern crate env_logger;
#[cfg(test)]
extern crate rustc_hex;

pub mod builtin;
pub mod db;
pub mod executed;
pub mod executive;
pub mod externalities;
pub mod log_entry;
pub mod machine;
pub mod receipt;
pub mod state;
pub mod substate;
pub mod trace;
pub mod transaction;
pub mod trie;
pub mod vm;

#[cfg(test)]
mod test_helpers;

pub use executed::{Executed, ExecutionError, TransactionException};
pub use executive::{contract_address, Executive, TransactOptions};
pub use machine::Machine;
pub use state::{CommitBehaviour, State};

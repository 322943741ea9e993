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

//! Log entry type definition.

use bytes::Bytes;
use ethereum_types::{Address, Bloom, BloomInput, H256};
use rlp::{DecoderError, Decodable, Encodable, Rlp, RlpStream};

/// A record of execution for a `LOG` operation.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
	/// The address of the contract executing at the point of the `LOG`
	/// operation.
	pub address: Address,
	/// The topics associated with the `LOG` operation.
	pub topics: Vec<H256>,
	/// The data associated with the `LOG` operation.
	pub data: Bytes,
}

impl Encodable for LogEntry {
	fn rlp_append(&self, s: &mut RlpStream) {
		s.begin_list(3);
		s.append(&self.address);
		s.append_list(&self.topics);
		s.append(&self.data);
	}
}

impl Decodable for LogEntry {
	fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
		Ok(LogEntry {
			address: rlp.val_at(0)?,
			topics: rlp.list_at(1)?,
			data: rlp.val_at(2)?,
		})
	}
}

impl LogEntry {
	/// Create a new log entry.
	pub fn new(address: Address, topics: Vec<H256>, data: Bytes) -> LogEntry {
		LogEntry { address, topics, data }
	}

	/// Calculates the bloom of this log entry.
	pub fn bloom(&self) -> Bloom {
		self.topics.iter().fold(
			Bloom::from(BloomInput::Raw(self.address.as_bytes())),
			|mut b, t| {
				b.accrue(BloomInput::Raw(t.as_bytes()));
				b
			},
		)
	}
}

#[cfg(test)]
mod tests {
	use super::LogEntry;
	use ethereum_types::{Address, Bloom};
	use std::str::FromStr;

	#[test]
	fn test_empty_log_bloom() {
		let bloom = Bloom::from_str("00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000008800000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000800000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000").unwrap();
		let address = Address::from_str("0f572e5295c57f15886f9b263e2f6d2d6c7b5ec6").unwrap();
		let log = LogEntry::new(address, vec![], vec![]);
		assert_eq!(log.bloom(), bloom);
	}

	#[test]
	fn rlp_round_trip() {
		let address = Address::from_low_u64_be(0xa);
		let log = LogEntry::new(address, vec![::ethereum_types::H256::from_low_u64_be(5)], vec![1, 2, 3]);
		let encoded = ::rlp::encode(&log);
		let decoded: LogEntry = ::rlp::decode(&encoded).unwrap();
		assert_eq!(log, decoded);
	}
}

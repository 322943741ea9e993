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

//! Receipt

use ethereum_types::{Bloom, H256, U256};
use rlp::{DecoderError, Decodable, Encodable, Rlp, RlpStream};

use log_entry::LogEntry;

/// Transaction outcome store in the receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
	/// Status and state root are unknown under EIP-98 rules.
	Unknown,
	/// State root is known. Pre EIP-98.
	StateRoot(H256),
	/// Status code is known. EIP-658 rules.
	StatusCode(u8),
}

/// Information describing execution of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
	/// The total gas used in the block following execution of the
	/// transaction.
	pub gas_used: U256,
	/// The OR-wide combination of all logs' blooms for this transaction.
	pub log_bloom: Bloom,
	/// The logs stemming from this transaction.
	pub logs: Vec<LogEntry>,
	/// Transaction outcome.
	pub outcome: TransactionOutcome,
}

impl Receipt {
	/// Create a new receipt.
	pub fn new(outcome: TransactionOutcome, gas_used: U256, logs: Vec<LogEntry>) -> Receipt {
		Receipt {
			gas_used,
			log_bloom: logs.iter().fold(Bloom::default(), |mut b, l| {
				b.accrue_bloom(&l.bloom());
				b
			}),
			logs,
			outcome,
		}
	}
}

impl Encodable for Receipt {
	fn rlp_append(&self, s: &mut RlpStream) {
		match self.outcome {
			TransactionOutcome::Unknown => {
				s.begin_list(3);
			},
			TransactionOutcome::StateRoot(ref root) => {
				s.begin_list(4);
				s.append(root);
			},
			TransactionOutcome::StatusCode(ref status_code) => {
				s.begin_list(4);
				s.append(status_code);
			},
		}
		s.append(&self.gas_used);
		s.append(&self.log_bloom);
		s.append_list(&self.logs);
	}
}

impl Decodable for Receipt {
	fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
		if rlp.item_count()? == 3 {
			Ok(Receipt {
				outcome: TransactionOutcome::Unknown,
				gas_used: rlp.val_at(0)?,
				log_bloom: rlp.val_at(1)?,
				logs: rlp.list_at(2)?,
			})
		} else {
			Ok(Receipt {
				gas_used: rlp.val_at(1)?,
				log_bloom: rlp.val_at(2)?,
				logs: rlp.list_at(3)?,
				outcome: {
					let first = rlp.at(0)?;
					if first.is_data() && first.data()?.len() <= 1 {
						TransactionOutcome::StatusCode(first.as_val()?)
					} else {
						TransactionOutcome::StateRoot(first.as_val()?)
					}
				},
			})
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{Receipt, TransactionOutcome};
	use ethereum_types::{H256, U256};
	use log_entry::LogEntry;
	use ethereum_types::Address;

	fn sample_logs() -> Vec<LogEntry> {
		vec![LogEntry {
			address: Address::from_low_u64_be(0xdcb1),
			topics: vec![],
			data: vec![0; 32],
		}]
	}

	#[test]
	fn state_root_receipt_round_trip() {
		let r = Receipt::new(
			TransactionOutcome::StateRoot(H256::from_low_u64_be(9)),
			U256::from(0x40cae),
			sample_logs(),
		);
		let encoded = ::rlp::encode(&r);
		let decoded: Receipt = ::rlp::decode(&encoded).unwrap();
		assert_eq!(decoded, r);
	}

	#[test]
	fn status_code_receipt_round_trip() {
		let r = Receipt::new(TransactionOutcome::StatusCode(0), U256::from(0x40cae), sample_logs());
		let encoded = ::rlp::encode(&r);
		let decoded: Receipt = ::rlp::decode(&encoded).unwrap();
		assert_eq!(decoded, r);
	}

	#[test]
	fn bloom_covers_logs() {
		let r = Receipt::new(TransactionOutcome::StatusCode(1), U256::zero(), sample_logs());
		assert!(r.log_bloom.contains_bloom(&sample_logs()[0].bloom()));
	}
}

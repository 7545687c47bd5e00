// SPDX-License-Identifier: GPL-3.0-or-later WITH Classpath-exception-2.0
// This file is part of Frontier.
//
// Copyright (c) 2022 Parity Technologies (UK) Ltd.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use std::{collections::BTreeMap, ops::Deref};

use ethereum_types::{Address, Bloom, H256, H64, U256, U64};
use serde::{ser::Error, Serialize, Serializer};

use crate::types::{Bytes, Transaction};

/// Block Transactions
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BlockTransactions {
	/// Only hashes
	Hashes(Vec<H256>),
	/// Full transactions
	Full(Vec<Transaction>),
}

impl BlockTransactions {
	pub fn len(&self) -> usize {
		match self {
			Self::Hashes(hashes) => hashes.len(),
			Self::Full(txs) => txs.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Block representation
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
	#[serde(flatten)]
	pub header: Header,
	pub transactions: BlockTransactions,
	pub uncles: Vec<H256>,
	pub size: U256,
}

/// Block header representation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
	pub number: U256,
	pub hash: H256,
	pub parent_hash: H256,
	#[serde(rename = "sha3Uncles")]
	pub uncles_hash: H256,
	pub nonce: H64,
	pub miner: Address,
	pub state_root: H256,
	pub transactions_root: H256,
	pub receipts_root: H256,
	pub logs_bloom: Bloom,
	pub gas_limit: U256,
	pub gas_used: U256,
	pub timestamp: U64,
	pub extra_data: Bytes,
	pub difficulty: U256,
	pub total_difficulty: U256,
	pub mix_hash: H256,
	/// Absent for blocks without fee market data.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub base_fee_per_gas: Option<U256>,
}

/// Block representation with additional info.
pub type RichBlock = Rich<Block>;

/// Value representation with additional info
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rich<T> {
	/// Standard value.
	pub inner: T,
	/// Engine-specific fields, flattened into the serialized object.
	pub extra_info: BTreeMap<String, String>,
}

impl<T> Rich<T> {
	pub fn new(inner: T) -> Self {
		Self {
			inner,
			extra_info: BTreeMap::new(),
		}
	}
}

impl<T> Deref for Rich<T> {
	type Target = T;
	fn deref(&self) -> &Self::Target {
		&self.inner
	}
}

impl<T: Serialize> Serialize for Rich<T> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		use serde_json::{to_value, Value};

		let serialized = (to_value(&self.inner), to_value(&self.extra_info));
		if let (Ok(Value::Object(mut value)), Ok(Value::Object(extras))) = serialized {
			// join two objects
			value.extend(extras);
			value.serialize(serializer)
		} else {
			Err(S::Error::custom(
				"Unserializable structures: expected objects",
			))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn header() -> Header {
		Header {
			number: U256::from(7),
			hash: H256::repeat_byte(0xaa),
			parent_hash: H256::repeat_byte(0xbb),
			uncles_hash: H256::zero(),
			nonce: H64::zero(),
			miner: Address::zero(),
			state_root: H256::zero(),
			transactions_root: H256::zero(),
			receipts_root: H256::zero(),
			logs_bloom: Bloom::zero(),
			gas_limit: U256::from(30_000_000),
			gas_used: U256::zero(),
			timestamp: U64::from(1_700_000_000),
			extra_data: Bytes::default(),
			difficulty: U256::zero(),
			total_difficulty: U256::zero(),
			mix_hash: H256::zero(),
			base_fee_per_gas: None,
		}
	}

	#[test]
	fn rich_block_flattens_extra_info() {
		let mut block = Rich::new(Block {
			header: header(),
			transactions: BlockTransactions::Hashes(vec![H256::repeat_byte(1)]),
			uncles: vec![],
			size: U256::from(512),
		});
		block
			.extra_info
			.insert("hashSource".to_string(), "synthetic".to_string());

		let value = serde_json::to_value(&block).unwrap();
		assert_eq!(value["number"], "0x7");
		assert_eq!(value["gasLimit"], "0x1c9c380");
		assert_eq!(value["hashSource"], "synthetic");
		assert_eq!(value["transactions"].as_array().unwrap().len(), 1);
		assert!(value.get("sha3Uncles").is_some());
		assert!(value.get("baseFeePerGas").is_none());
		assert_eq!(block.transactions.len(), 1);
	}
}

// This file is part of Frontier.

// Copyright (C) Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: Apache-2.0

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Raw consensus-layer block data as returned by the consensus client.

use ethereum_types::H256;

/// Event type emitted once per Ethereum-shaped sub-message.
pub const EVENT_TYPE_ETHEREUM_TX: &str = "ethereum_tx";
/// Generic message event, carrying the executing module and the sender.
pub const EVENT_TYPE_MESSAGE: &str = "message";
/// End-block event carrying the block logs bloom.
pub const EVENT_TYPE_BLOCK_BLOOM: &str = "block_bloom";
/// Begin-block event carrying the block base fee.
pub const EVENT_TYPE_FEE_MARKET: &str = "fee_market";
/// Per sub-message event carrying the emitted logs.
pub const EVENT_TYPE_TX_LOG: &str = "tx_log";

pub const ATTRIBUTE_KEY_ETHEREUM_TX_HASH: &str = "ethereumTxHash";
pub const ATTRIBUTE_KEY_TX_INDEX: &str = "txIndex";
pub const ATTRIBUTE_KEY_TX_GAS_USED: &str = "txGasUsed";
pub const ATTRIBUTE_KEY_ETHEREUM_TX_FAILED: &str = "ethereumTxFailed";
pub const ATTRIBUTE_KEY_MODULE: &str = "module";
pub const ATTRIBUTE_KEY_SENDER: &str = "sender";
pub const ATTRIBUTE_KEY_BLOOM: &str = "bloom";
pub const ATTRIBUTE_KEY_BASE_FEE: &str = "base_fee";
pub const ATTRIBUTE_KEY_TX_LOG: &str = "txLog";

/// Module name that owns Ethereum-shaped transactions.
pub const EVM_MODULE: &str = "evm";

/// Result code reported when a transaction ran out of gas.
pub const CODE_OUT_OF_GAS: u32 = 11;

const BLOCK_GAS_LIMIT_EXCEEDED_LOG: &str = "out of gas in location: block gas meter; gasWanted:";
const NO_BLOCK_GAS_LEFT_LOG: &str = "no block gas left to run tx: out of gas";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventAttribute {
	pub key: String,
	pub value: String,
}

impl EventAttribute {
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			value: value.into(),
		}
	}
}

/// A typed event with a flat attribute list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Event {
	pub kind: String,
	pub attributes: Vec<EventAttribute>,
}

impl Event {
	pub fn new(kind: impl Into<String>, attributes: Vec<EventAttribute>) -> Self {
		Self {
			kind: kind.into(),
			attributes,
		}
	}

	/// Value of the first attribute with the given key.
	pub fn attribute(&self, key: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|attr| attr.key == key)
			.map(|attr| attr.value.as_str())
	}
}

/// Execution result of one consensus-level transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecTxResult {
	pub code: u32,
	pub log: String,
	pub gas_wanted: i64,
	pub gas_used: i64,
	pub events: Vec<Event>,
}

impl ExecTxResult {
	pub fn is_ok(&self) -> bool {
		self.code == 0
	}

	/// The transaction was rejected because the block gas meter ran dry.
	pub fn exceeds_block_gas_limit(&self) -> bool {
		self.log.contains(BLOCK_GAS_LIMIT_EXCEEDED_LOG)
	}

	/// The reported gas used must not be added to the block total: the block
	/// gas limit was already hit before this transaction started.
	pub fn should_ignore_gas_used(&self) -> bool {
		self.code == CODE_OUT_OF_GAS && self.log.contains(NO_BLOCK_GAS_LEFT_LOG)
	}

	/// Whether the Ethereum-shaped messages of this transaction were admitted
	/// into the block.
	pub fn success_or_exceeds_block_gas_limit(&self) -> bool {
		self.is_ok() || self.exceeds_block_gas_limit()
	}

	/// Gas used, clamped to zero for malformed negative values.
	pub fn gas_used(&self) -> u64 {
		u64::try_from(self.gas_used).unwrap_or_default()
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawHeader {
	pub height: u64,
	/// Block time, in seconds since the unix epoch.
	pub time: u64,
	/// Authoritative block hash, when the consensus client stores one.
	pub hash: Option<H256>,
	pub last_block_hash: H256,
	/// Merkle root of the block transactions, `None` for an empty block.
	pub data_hash: Option<H256>,
	pub app_hash: H256,
	pub proposer_address: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawBlock {
	pub header: RawHeader,
	/// Opaque transaction bytes in block order.
	pub txs: Vec<Vec<u8>>,
}

/// Execution results of a whole block, `txs_results` aligned with `RawBlock::txs`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockResults {
	pub height: u64,
	pub txs_results: Vec<ExecTxResult>,
	pub begin_block_events: Vec<Event>,
	pub end_block_events: Vec<Event>,
}

/// One hit of a transaction search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxSearchResult {
	pub hash: H256,
	pub height: u64,
	/// Position of the consensus-level transaction in its block.
	pub index: u32,
	pub tx_result: ExecTxResult,
	pub tx: Vec<u8>,
}

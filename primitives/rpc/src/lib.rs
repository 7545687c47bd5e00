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

#![warn(unused_crate_dependencies)]

mod block;
mod transaction;

use std::fmt;

use ethereum_types::{H160, H256, U256};

pub use self::{block::*, transaction::*};

/// Block selector understood by the consensus client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockId {
	Number(u64),
	Hash(H256),
}

/// Transaction search queries issued against the consensus indexer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxQuery {
	/// The transaction whose events carry the given Ethereum hash.
	EthereumHash(H256),
	/// The transaction at `height` whose events carry the given block-wide
	/// Ethereum transaction index.
	EthereumIndex { height: u64, index: u32 },
}

impl fmt::Display for TxQuery {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::EthereumHash(hash) => write!(
				f,
				"{}.{}='{:?}'",
				EVENT_TYPE_ETHEREUM_TX, ATTRIBUTE_KEY_ETHEREUM_TX_HASH, hash
			),
			Self::EthereumIndex { height, index } => write!(
				f,
				"tx.height={} AND {}.{}={}",
				height, EVENT_TYPE_ETHEREUM_TX, ATTRIBUTE_KEY_TX_INDEX, index
			),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
	#[error("block {0:?} not found")]
	BlockNotFound(BlockId),
	#[error("block results at height {0} not found")]
	ResultsNotFound(u64),
	#[error("consensus client request failed: {0}")]
	Request(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
	#[error("invalid transaction encoding: {0}")]
	Invalid(String),
	#[error("unsupported message type {0}")]
	UnsupportedMessage(String),
}

/// Read-only access to the consensus layer.
///
/// Implementations are shared between concurrent requests and must not
/// assume any call ordering.
#[async_trait::async_trait]
pub trait ConsensusClient: Send + Sync {
	/// Height of the most recent committed block.
	async fn latest_height(&self) -> Result<u64, ClientError>;

	async fn block(&self, id: BlockId) -> Result<RawBlock, ClientError>;

	async fn block_results(&self, height: u64) -> Result<BlockResults, ClientError>;

	async fn tx_search(&self, query: &TxQuery) -> Result<Vec<TxSearchResult>, ClientError>;

	/// Base fee stored by the fee market module at `height`, `None` before
	/// the fee market existed.
	async fn base_fee(&self, height: u64) -> Result<Option<U256>, ClientError>;

	/// Consensus block gas limit at `height`, `-1` meaning unlimited.
	async fn block_max_gas(&self, height: u64) -> Result<i64, ClientError>;

	/// Ethereum account of the validator identified by its consensus address.
	async fn validator_account(
		&self,
		height: u64,
		proposer_address: &[u8],
	) -> Result<H160, ClientError>;
}

/// Turns opaque consensus transaction bytes into structured messages.
pub trait TxDecoder: Send + Sync {
	fn decode(&self, raw: &[u8]) -> Result<DecodedTx, DecodeError>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use hex_literal::hex;

	#[test]
	fn tx_query_format() {
		let hash = H256(hex!(
			"7ea2ef5ed5d6a6b7f84bdd9785a8e4ab6e0bc0c4a0e75c7b16bf3c0a0bd6cb55"
		));
		assert_eq!(
			TxQuery::EthereumHash(hash).to_string(),
			"ethereum_tx.ethereumTxHash='0x7ea2ef5ed5d6a6b7f84bdd9785a8e4ab6e0bc0c4a0e75c7b16bf3c0a0bd6cb55'"
		);
		assert_eq!(
			TxQuery::EthereumIndex {
				height: 12,
				index: 3
			}
			.to_string(),
			"tx.height=12 AND ethereum_tx.txIndex=3"
		);
	}
}

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

use ep_rpc::{
	BlockId, BlockResults, ConsensusClient, Event, MsgEthereumTx, RawBlock, TxDecoder,
	ATTRIBUTE_KEY_BASE_FEE, ATTRIBUTE_KEY_BLOOM, EVENT_TYPE_BLOCK_BLOOM, EVENT_TYPE_FEE_MARKET,
};
use ethereum_types::{Bloom, H160, H256, H64, U256};

use ec_rpc_core::types::BlockNumberOrTag;

use crate::{
	error::{Error, FieldError},
	eth::Eth,
	events::ParsedTxs,
	LOG_TARGET,
};

/// Keccak of the RLP encoding of an empty uncle list.
pub const EMPTY_UNCLE_HASH: H256 = H256([
	0x1d, 0xcc, 0x4d, 0xe8, 0xde, 0xc7, 0x5d, 0x7a, 0xab, 0x85, 0xb5, 0x67, 0xb6, 0xcc, 0xd4, 0x1a,
	0xd3, 0x12, 0x45, 0x1b, 0x94, 0x8a, 0x74, 0x13, 0xf0, 0xa1, 0x42, 0xfd, 0x40, 0xd4, 0x93, 0x47,
]);

/// Root of an empty trie.
pub const EMPTY_ROOT_HASH: H256 = H256([
	0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
	0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);

/// Origin of a translated block hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockHash {
	/// Read from the consensus block.
	Stored(H256),
	/// Computed from the translated header. Not retrievable from storage.
	Synthetic(H256),
}

impl BlockHash {
	pub fn hash(&self) -> H256 {
		match self {
			Self::Stored(hash) | Self::Synthetic(hash) => *hash,
		}
	}

	pub fn is_synthetic(&self) -> bool {
		matches!(self, Self::Synthetic(_))
	}
}

/// Block fields fetched from the consensus client rather than read from the
/// block itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockContext {
	pub base_fee: Result<U256, FieldError>,
	/// Consensus block gas limit, unlimited already mapped to `u32::MAX`.
	pub gas_limit: i64,
	pub miner: H160,
}

/// An Ethereum transaction positioned in its block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTransaction {
	pub msg: MsgEthereumTx,
	/// Position of the owning consensus transaction in the block.
	pub tx_index: usize,
	/// Position among the Ethereum messages of the owning consensus transaction.
	pub msg_index: usize,
	/// Position among the Ethereum transactions of the block.
	pub eth_tx_index: usize,
	pub gas_used: u64,
	pub failed: bool,
}

/// An Ethereum view of one consensus block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslatedBlock {
	pub header: ethereum::Header,
	pub hash: BlockHash,
	pub base_fee: Result<U256, FieldError>,
	pub bloom: Result<Bloom, FieldError>,
	pub gas_limit: i64,
	pub size: u64,
	pub transactions: Vec<BlockTransaction>,
}

impl TranslatedBlock {
	pub fn number(&self) -> u64 {
		self.header.number.low_u64()
	}

	pub fn gas_used(&self) -> u64 {
		self.header.gas_used.low_u64()
	}

	pub fn transaction_by_hash(&self, hash: &H256) -> Option<&BlockTransaction> {
		self.transactions.iter().find(|tx| tx.msg.hash == *hash)
	}

	pub fn transaction_by_position(
		&self,
		tx_index: usize,
		msg_index: usize,
	) -> Option<&BlockTransaction> {
		self.transactions
			.iter()
			.find(|tx| tx.tx_index == tx_index && tx.msg_index == msg_index)
	}
}

/// Builds the Ethereum view of `block`.
///
/// Consensus transactions that failed for any reason other than the block
/// gas limit are left out, as are transactions that cannot be decoded. Gas
/// used sums the remaining successful transactions and stops accumulating at
/// the first transaction that hit the block gas limit.
pub fn translate_block<D: TxDecoder + ?Sized>(
	decoder: &D,
	block: &RawBlock,
	results: &BlockResults,
	context: BlockContext,
) -> Result<TranslatedBlock, Error> {
	let height = block.header.height;
	if block.txs.len() != results.txs_results.len() {
		return Err(Error::ResultsMismatch {
			height,
			txs: block.txs.len(),
			results: results.txs_results.len(),
		});
	}

	let bloom = block_bloom(&results.end_block_events);
	if let Err(err) = &bloom {
		log::debug!(target: LOG_TARGET, "Block {height} bloom unavailable: {err}");
	}
	if let Err(err) = &context.base_fee {
		log::debug!(target: LOG_TARGET, "Block {height} base fee unavailable: {err}");
	}

	let mut gas_used = 0u64;
	let mut gas_exhausted = false;
	let mut transactions = Vec::new();

	for (tx_index, (raw, result)) in block.txs.iter().zip(&results.txs_results).enumerate() {
		if result.exceeds_block_gas_limit() || result.should_ignore_gas_used() {
			gas_exhausted = true;
		}

		if !result.success_or_exceeds_block_gas_limit() {
			continue;
		}

		let decoded = match decoder.decode(raw) {
			Ok(decoded) => decoded,
			Err(err) => {
				log::warn!(
					target: LOG_TARGET,
					"Skip undecodable tx #{tx_index} in block {height}: {err}",
				);
				continue;
			}
		};
		if !gas_exhausted && result.is_ok() {
			gas_used = gas_used.saturating_add(result.gas_used());
		}

		let parsed = match ParsedTxs::parse(result, Some(&decoded)) {
			Ok(parsed) => Some(parsed),
			Err(err) => {
				log::warn!(
					target: LOG_TARGET,
					"Failed to parse events of tx #{tx_index} in block {height}: {err}",
				);
				None
			}
		};

		let message_count = decoded.ethereum_messages().count();
		// Without events the split of the gas between messages is unknown.
		let unparsed_gas_used = match message_count {
			1 => result.gas_used(),
			_ => 0,
		};
		if parsed.is_none() && message_count > 1 {
			log::debug!(
				target: LOG_TARGET,
				"Tx #{tx_index} in block {height} has {message_count} messages, reporting zero gas each",
			);
		}

		for (msg_index, msg) in decoded.ethereum_messages().enumerate() {
			let parsed_tx = parsed
				.as_ref()
				.and_then(|parsed| parsed.get_tx_by_msg_index(msg_index));
			let (gas_used, failed) = match parsed_tx {
				Some(tx) => (tx.gas_used, tx.failed),
				None => (unparsed_gas_used, !result.is_ok()),
			};
			transactions.push(BlockTransaction {
				msg: msg.clone(),
				tx_index,
				msg_index,
				eth_tx_index: transactions.len(),
				gas_used,
				failed,
			});
		}
	}

	let partial_header = ethereum::PartialHeader {
		parent_hash: block.header.last_block_hash,
		beneficiary: context.miner,
		state_root: block.header.app_hash,
		receipts_root: EMPTY_ROOT_HASH,
		logs_bloom: bloom.clone().unwrap_or_default(),
		difficulty: U256::zero(),
		number: U256::from(height),
		gas_limit: U256::from(u64::try_from(context.gas_limit).unwrap_or_default()),
		gas_used: U256::from(gas_used),
		timestamp: block.header.time,
		extra_data: Vec::new(),
		mix_hash: H256::default(),
		nonce: H64::default(),
	};
	let transactions_root = match block.header.data_hash {
		Some(data_hash) if !block.txs.is_empty() => data_hash,
		_ => EMPTY_ROOT_HASH,
	};
	let header = ethereum::Header::new(partial_header, EMPTY_UNCLE_HASH, transactions_root);

	let hash = match block.header.hash {
		Some(hash) => BlockHash::Stored(hash),
		None => {
			let hash = header.hash();
			log::warn!(
				target: LOG_TARGET,
				"Block {height} has no stored hash, using synthetic hash {hash:?}",
			);
			BlockHash::Synthetic(hash)
		}
	};

	let size = block
		.txs
		.iter()
		.fold(rlp::encode(&header).len() as u64, |size, tx| {
			size.saturating_add(tx.len() as u64)
		});

	Ok(TranslatedBlock {
		header,
		hash,
		base_fee: context.base_fee,
		bloom,
		gas_limit: context.gas_limit,
		size,
		transactions,
	})
}

/// Logs bloom carried by the end-block `block_bloom` event.
pub fn block_bloom(end_block_events: &[Event]) -> Result<Bloom, FieldError> {
	let value = end_block_events
		.iter()
		.filter(|event| event.kind == EVENT_TYPE_BLOCK_BLOOM)
		.find_map(|event| event.attribute(ATTRIBUTE_KEY_BLOOM))
		.ok_or(FieldError::Missing(EVENT_TYPE_BLOCK_BLOOM))?;
	let malformed = |reason: String| FieldError::Malformed {
		attribute: ATTRIBUTE_KEY_BLOOM,
		reason,
	};
	let bytes = const_hex::decode(value).map_err(|err| malformed(err.to_string()))?;
	if bytes.len() != Bloom::len_bytes() {
		return Err(malformed(format!("expected 256 bytes, got {}", bytes.len())));
	}
	Ok(Bloom::from_slice(&bytes))
}

/// Base fee carried by the last begin-block `fee_market` event.
pub fn base_fee_from_events(begin_block_events: &[Event]) -> Result<U256, FieldError> {
	let value = begin_block_events
		.iter()
		.rev()
		.find(|event| event.kind == EVENT_TYPE_FEE_MARKET)
		.and_then(|event| event.attribute(ATTRIBUTE_KEY_BASE_FEE))
		.ok_or(FieldError::Missing(EVENT_TYPE_FEE_MARKET))?;
	U256::from_dec_str(value).map_err(|err| FieldError::Malformed {
		attribute: ATTRIBUTE_KEY_BASE_FEE,
		reason: format!("{err:?}"),
	})
}

impl<C, D> Eth<C, D>
where
	C: ConsensusClient,
	D: TxDecoder,
{
	/// Fetches and translates the block identified by `id`.
	pub async fn translate(&self, id: BlockId) -> Result<TranslatedBlock, Error> {
		let block = self.client.block(id).await?;
		let results = self.client.block_results(block.header.height).await?;
		let context = self.block_context(&block, &results).await;
		translate_block(self.decoder.as_ref(), &block, &results, context)
	}

	/// Translates the block at `number`. Heights past the chain head are not found.
	pub async fn translate_by_number(
		&self,
		number: BlockNumberOrTag,
	) -> Result<TranslatedBlock, Error> {
		let latest = self.client.latest_height().await?;
		let height = number.resolve(latest);
		if height > latest {
			return Err(Error::BlockNotFound);
		}
		self.translate(BlockId::Number(height)).await
	}

	pub async fn block_context(&self, block: &RawBlock, results: &BlockResults) -> BlockContext {
		let height = block.header.height;
		BlockContext {
			base_fee: self.base_fee(height, results).await,
			gas_limit: self.block_gas_limit(height).await,
			miner: self.miner(block).await,
		}
	}

	/// Base fee from the fee market state, falling back to the begin-block
	/// event when the state is pruned or the query fails.
	pub async fn base_fee(&self, height: u64, results: &BlockResults) -> Result<U256, FieldError> {
		match self.client.base_fee(height).await {
			Ok(Some(base_fee)) => return Ok(base_fee),
			Ok(None) => {}
			Err(err) => {
				log::debug!(target: LOG_TARGET, "Base fee query at {height} failed: {err}");
			}
		}
		base_fee_from_events(&results.begin_block_events)
	}

	async fn block_gas_limit(&self, height: u64) -> i64 {
		let default_gas_limit = i64::from(u32::MAX);
		match self.client.block_max_gas(height).await {
			Ok(-1) => default_gas_limit,
			Ok(gas_limit) => gas_limit,
			Err(err) => {
				log::warn!(target: LOG_TARGET, "Block max gas query at {height} failed: {err}");
				default_gas_limit
			}
		}
	}

	async fn miner(&self, block: &RawBlock) -> H160 {
		let header = &block.header;
		self.client
			.validator_account(header.height, &header.proposer_address)
			.await
			.unwrap_or_else(|err| {
				log::debug!(
					target: LOG_TARGET,
					"Validator account query at {} failed: {err}",
					header.height,
				);
				H160::zero()
			})
	}
}

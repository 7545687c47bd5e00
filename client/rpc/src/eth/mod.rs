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

mod block;
mod fee;
mod transaction;

use std::sync::Arc;

use ep_rpc::{BlockId, ConsensusClient, MsgEthereumTx, TxDecoder, TxFee};
use ethereum_types::{H256, U256, U64};
use jsonrpsee::core::{async_trait, RpcResult};

use ec_rpc_core::{types::*, EthApiServer};

use crate::{config::EthConfiguration, error::not_found_as_none};

pub use self::{
	block::{
		base_fee_from_events, block_bloom, translate_block, BlockContext, BlockHash,
		BlockTransaction, TranslatedBlock, EMPTY_ROOT_HASH, EMPTY_UNCLE_HASH,
	},
	fee::{calc_next_base_fee, process_block, OneFeeHistory},
	transaction::TxResult,
};

/// Eth API implementation over a consensus client.
pub struct Eth<C, D> {
	client: Arc<C>,
	decoder: Arc<D>,
	config: EthConfiguration,
}

impl<C, D> Eth<C, D> {
	pub fn new(client: Arc<C>, decoder: Arc<D>, config: EthConfiguration) -> Self {
		Self {
			client,
			decoder,
			config,
		}
	}

	pub fn config(&self) -> &EthConfiguration {
		&self.config
	}
}

/// Where a mined transaction sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TxLocation {
	pub block_hash: H256,
	pub block_number: u64,
	pub index: u64,
}

pub(crate) fn transaction_build(
	msg: &MsgEthereumTx,
	location: Option<TxLocation>,
	base_fee: Option<U256>,
	chain_id: u64,
) -> Transaction {
	let data = &msg.data;
	let (max_fee_per_gas, max_priority_fee_per_gas) = match data.fee {
		TxFee::DynamicFee {
			gas_tip_cap,
			gas_fee_cap,
		} => (Some(gas_fee_cap), Some(gas_tip_cap)),
		TxFee::Legacy { .. } | TxFee::AccessList { .. } => (None, None),
	};
	let gas_price = match (data.fee, location) {
		// Not mined yet, the fee cap is the best known price.
		(TxFee::DynamicFee { gas_fee_cap, .. }, None) => gas_fee_cap,
		(fee, _) => fee.effective_gas_price(base_fee),
	};
	let typed = !matches!(data.fee, TxFee::Legacy { .. });

	Transaction {
		tx_type: TxType::from(data.fee.tx_type()),
		hash: msg.hash,
		nonce: data.nonce,
		block_hash: location.map(|location| location.block_hash),
		block_number: location.map(|location| U256::from(location.block_number)),
		transaction_index: location.map(|location| U256::from(location.index)),
		from: msg.from,
		to: data.to(),
		value: data.value,
		input: Bytes::from(data.input.as_slice()),
		gas: U256::from(data.gas_limit),
		gas_price,
		max_fee_per_gas,
		max_priority_fee_per_gas,
		chain_id: data
			.chain_id
			.or(typed.then_some(chain_id))
			.map(U64::from),
		access_list: typed.then(|| {
			data.access_list
				.iter()
				.map(|item| AccessListItem {
					address: item.address,
					storage_keys: item.storage_keys.clone(),
				})
				.collect()
		}),
		v: U256::from(data.signature.v),
		r: U256::from_big_endian(data.signature.r.as_bytes()),
		s: U256::from_big_endian(data.signature.s.as_bytes()),
	}
}

pub(crate) fn rich_block_build(
	block: &TranslatedBlock,
	full_transactions: bool,
	chain_id: u64,
) -> RichBlock {
	let header = &block.header;
	let hash = block.hash.hash();
	let base_fee = block.base_fee.as_ref().ok().copied();

	let transactions = if full_transactions {
		BlockTransactions::Full(
			block
				.transactions
				.iter()
				.map(|tx| {
					let location = TxLocation {
						block_hash: hash,
						block_number: block.number(),
						index: tx.eth_tx_index as u64,
					};
					transaction_build(&tx.msg, Some(location), base_fee, chain_id)
				})
				.collect(),
		)
	} else {
		BlockTransactions::Hashes(block.transactions.iter().map(|tx| tx.msg.hash).collect())
	};

	let mut rich = Rich::new(Block {
		header: Header {
			number: header.number,
			hash,
			parent_hash: header.parent_hash,
			uncles_hash: header.ommers_hash,
			nonce: header.nonce,
			miner: header.beneficiary,
			state_root: header.state_root,
			transactions_root: header.transactions_root,
			receipts_root: header.receipts_root,
			logs_bloom: header.logs_bloom,
			gas_limit: header.gas_limit,
			gas_used: header.gas_used,
			timestamp: U64::from(header.timestamp),
			extra_data: Bytes::from(header.extra_data.as_slice()),
			difficulty: header.difficulty,
			total_difficulty: U256::zero(),
			mix_hash: header.mix_hash,
			base_fee_per_gas: base_fee,
		},
		transactions,
		uncles: vec![],
		size: U256::from(block.size),
	});
	if block.hash.is_synthetic() {
		rich.extra_info
			.insert("hashSource".to_string(), "synthetic".to_string());
	}
	rich
}

#[async_trait]
impl<C, D> EthApiServer for Eth<C, D>
where
	C: ConsensusClient + 'static,
	D: TxDecoder + 'static,
{
	async fn block_number(&self) -> RpcResult<U64> {
		let height = self.client.latest_height().await.map_err(crate::Error::from)?;
		Ok(U64::from(height))
	}

	async fn block_by_hash(&self, hash: H256, full: bool) -> RpcResult<Option<RichBlock>> {
		let block = not_found_as_none(self.translate(BlockId::Hash(hash)).await)?;
		Ok(block.map(|block| rich_block_build(&block, full, self.config.chain_id)))
	}

	async fn block_by_number(
		&self,
		number: BlockNumberOrTag,
		full: bool,
	) -> RpcResult<Option<RichBlock>> {
		let block = not_found_as_none(self.translate_by_number(number).await)?;
		Ok(block.map(|block| rich_block_build(&block, full, self.config.chain_id)))
	}

	async fn block_transaction_count_by_hash(&self, hash: H256) -> RpcResult<Option<U256>> {
		let block = not_found_as_none(self.translate(BlockId::Hash(hash)).await)?;
		Ok(block.map(|block| U256::from(block.transactions.len())))
	}

	async fn block_transaction_count_by_number(
		&self,
		number: BlockNumberOrTag,
	) -> RpcResult<Option<U256>> {
		let block = not_found_as_none(self.translate_by_number(number).await)?;
		Ok(block.map(|block| U256::from(block.transactions.len())))
	}

	async fn transaction_by_hash(&self, hash: H256) -> RpcResult<Option<Transaction>> {
		Ok(not_found_as_none(self.transaction_by_eth_hash(hash).await)?)
	}

	async fn transaction_by_block_hash_and_index(
		&self,
		hash: H256,
		index: Index,
	) -> RpcResult<Option<Transaction>> {
		Ok(not_found_as_none(
			self.transaction_by_block_and_index(BlockId::Hash(hash), index.value())
				.await,
		)?)
	}

	async fn transaction_by_block_number_and_index(
		&self,
		number: BlockNumberOrTag,
		index: Index,
	) -> RpcResult<Option<Transaction>> {
		let latest = self.client.latest_height().await.map_err(crate::Error::from)?;
		let height = number.resolve(latest);
		if height > latest {
			return Ok(None);
		}
		Ok(not_found_as_none(
			self.transaction_by_block_and_index(BlockId::Number(height), index.value())
				.await,
		)?)
	}

	async fn transaction_receipt(&self, hash: H256) -> RpcResult<Option<Receipt>> {
		Ok(not_found_as_none(self.receipt(hash).await)?)
	}

	async fn fee_history(
		&self,
		block_count: U256,
		newest_block: BlockNumberOrTag,
		reward_percentiles: Option<Vec<f64>>,
	) -> RpcResult<FeeHistory> {
		Ok(self
			.fee_history(block_count, newest_block, reward_percentiles)
			.await?)
	}
}

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

use ep_rpc::{BlockId, ConsensusClient, TxDecoder, TxQuery, TxSearchResult};
use ethereum_types::{BloomInput, H160, H256, U256, U64};
use tiny_keccak::{Hasher, Keccak};

use ec_rpc_core::types::{Bloom, Log, Receipt, Transaction, TxType};

use crate::{
	error::Error,
	eth::{transaction_build, Eth, TxLocation},
	events::{tx_logs_from_events, ParsedTx, ParsedTxs},
	LOG_TARGET,
};

/// Position and outcome of an Ethereum transaction, as recorded by the
/// consensus transaction indexer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxResult {
	pub from: H160,
	pub height: u64,
	/// Position of the consensus transaction in the block.
	pub tx_index: u32,
	/// Position of the message in the consensus transaction.
	pub msg_index: usize,
	/// Position among the Ethereum transactions of the block, `-1` if the
	/// events never reported it.
	pub eth_tx_index: i32,
	pub failed: bool,
	pub gas_used: u64,
	/// Gas used by this and the preceding messages of the same consensus
	/// transaction.
	pub cumulative_gas_used: u64,
}

impl TxResult {
	fn new(hit: &TxSearchResult, parsed: &ParsedTxs, tx: &ParsedTx) -> Self {
		Self {
			from: tx.from,
			height: hit.height,
			tx_index: hit.index,
			msg_index: tx.msg_index,
			eth_tx_index: tx.eth_tx_index,
			failed: tx.failed,
			gas_used: tx.gas_used,
			cumulative_gas_used: parsed.accumulative_gas_used(tx.msg_index),
		}
	}
}

impl<C, D> Eth<C, D>
where
	C: ConsensusClient,
	D: TxDecoder,
{
	/// Resolves an Ethereum transaction hash through the consensus indexer.
	pub async fn tx_by_eth_hash(&self, hash: H256) -> Result<TxResult, Error> {
		let (hit, parsed) = self.query_tx_indexer(&TxQuery::EthereumHash(hash)).await?;
		let tx = parsed.get_tx_by_hash(&hash).ok_or(Error::TxNotFound)?;
		Ok(TxResult::new(&hit, &parsed, tx))
	}

	/// Resolves the Ethereum transaction at `index` in the block at `height`.
	pub async fn tx_by_tx_index(&self, height: u64, index: i32) -> Result<TxResult, Error> {
		let query = TxQuery::EthereumIndex {
			height,
			index: u32::try_from(index).map_err(|_| Error::TxNotFound)?,
		};
		let (hit, parsed) = self.query_tx_indexer(&query).await?;
		let tx = parsed.get_tx_by_tx_index(index)?.ok_or(Error::TxNotFound)?;
		Ok(TxResult::new(&hit, &parsed, tx))
	}

	async fn query_tx_indexer(&self, query: &TxQuery) -> Result<(TxSearchResult, ParsedTxs), Error> {
		let hit = self
			.client
			.tx_search(query)
			.await?
			.into_iter()
			.next()
			.ok_or(Error::TxNotFound)?;

		// Only the block gas limit failure leaves Ethereum transactions in a block.
		if !hit.tx_result.success_or_exceeds_block_gas_limit() {
			log::debug!(
				target: LOG_TARGET,
				"Tx matching {query} failed with code {}, not an ethereum tx",
				hit.tx_result.code,
			);
			return Err(Error::TxNotFound);
		}

		let decoded = if hit.tx_result.is_ok() {
			None
		} else {
			Some(self.decoder.decode(&hit.tx)?)
		};
		let parsed = ParsedTxs::parse(&hit.tx_result, decoded.as_ref())?;
		Ok((hit, parsed))
	}

	pub async fn transaction_by_eth_hash(&self, hash: H256) -> Result<Transaction, Error> {
		let res = self.tx_by_eth_hash(hash).await?;
		let block = self.translate(BlockId::Number(res.height)).await?;
		let tx = block
			.transaction_by_position(res.tx_index as usize, res.msg_index)
			.ok_or_else(|| {
				log::warn!(
					target: LOG_TARGET,
					"Indexed tx {hash:?} missing from translated block {}",
					res.height,
				);
				Error::TxNotFound
			})?;
		let location = TxLocation {
			block_hash: block.hash.hash(),
			block_number: res.height,
			index: eth_tx_index(&res, tx.eth_tx_index),
		};
		Ok(transaction_build(
			&tx.msg,
			Some(location),
			block.base_fee.as_ref().ok().copied(),
			self.config.chain_id,
		))
	}

	/// Transaction at the block-wide Ethereum `index`, looked up through the
	/// indexer first and the translated block otherwise.
	pub async fn transaction_by_block_and_index(
		&self,
		id: BlockId,
		index: usize,
	) -> Result<Transaction, Error> {
		let block = self.translate(id).await?;
		let height = block.number();

		let indexed = match i32::try_from(index) {
			Ok(index) => match self.tx_by_tx_index(height, index).await {
				Ok(res) => block.transaction_by_position(res.tx_index as usize, res.msg_index),
				Err(err) if err.is_not_found() => None,
				Err(err) => return Err(err),
			},
			Err(_) => None,
		};
		let tx = match indexed {
			Some(tx) => tx,
			None => block.transactions.get(index).ok_or(Error::TxNotFound)?,
		};

		let location = TxLocation {
			block_hash: block.hash.hash(),
			block_number: height,
			index: index as u64,
		};
		Ok(transaction_build(
			&tx.msg,
			Some(location),
			block.base_fee.as_ref().ok().copied(),
			self.config.chain_id,
		))
	}

	pub async fn receipt(&self, hash: H256) -> Result<Receipt, Error> {
		let res = self.tx_by_eth_hash(hash).await?;
		let results = self.client.block_results(res.height).await?;
		let block = self.translate(BlockId::Number(res.height)).await?;
		let tx = block
			.transaction_by_position(res.tx_index as usize, res.msg_index)
			.ok_or(Error::TxNotFound)?;
		let tx_index = res.tx_index as usize;

		let cumulative_gas_used = results
			.txs_results
			.iter()
			.take(tx_index)
			.fold(res.cumulative_gas_used, |acc, result| {
				acc.saturating_add(result.gas_used())
			});

		let block_hash = block.hash.hash();
		let index = eth_tx_index(&res, tx.eth_tx_index);
		let events = results
			.txs_results
			.get(tx_index)
			.map(|result| result.events.as_slice())
			.unwrap_or_default();
		let logs: Vec<Log> = tx_logs_from_events(events, res.msg_index)?
			.into_iter()
			.enumerate()
			.map(|(position, log)| Log {
				address: log.address,
				topics: log.topics,
				data: log.data,
				block_hash: Some(block_hash),
				block_number: Some(U256::from(res.height)),
				transaction_hash: Some(hash),
				transaction_index: Some(U256::from(index)),
				log_index: Some(U256::from(log.index.unwrap_or(position as u64))),
				removed: false,
			})
			.collect();

		let data = &tx.msg.data;
		let contract_address = match data.to() {
			Some(_) => None,
			None => Some(contract_address(res.from, data.nonce)),
		};

		Ok(Receipt {
			tx_type: TxType::from(data.fee.tx_type()),
			transaction_hash: hash,
			transaction_index: U256::from(index),
			block_hash,
			block_number: U256::from(res.height),
			from: res.from,
			to: data.to(),
			gas_used: U256::from(res.gas_used),
			cumulative_gas_used: U256::from(cumulative_gas_used),
			contract_address,
			logs_bloom: logs_bloom(&logs),
			logs,
			status: if res.failed { U64::zero() } else { U64::one() },
			effective_gas_price: data
				.fee
				.effective_gas_price(block.base_fee.as_ref().ok().copied()),
		})
	}
}

/// The indexed position, or the block position when events never carried one.
fn eth_tx_index(res: &TxResult, block_position: usize) -> u64 {
	u64::try_from(res.eth_tx_index).unwrap_or(block_position as u64)
}

fn logs_bloom(logs: &[Log]) -> Bloom {
	let mut bloom = Bloom::default();
	for log in logs {
		bloom.accrue(BloomInput::Raw(log.address.as_bytes()));
		for topic in &log.topics {
			bloom.accrue(BloomInput::Raw(topic.as_bytes()));
		}
	}
	bloom
}

fn keccak_256(data: &[u8]) -> [u8; 32] {
	let mut keccak = Keccak::v256();
	let mut output = [0u8; 32];
	keccak.update(data);
	keccak.finalize(&mut output);
	output
}

/// Address of a contract created by `sender` at `nonce`.
pub(crate) fn contract_address(sender: H160, nonce: U256) -> H160 {
	let mut stream = rlp::RlpStream::new_list(2);
	stream.append(&sender);
	stream.append(&nonce);
	H160::from_slice(&keccak_256(&stream.out())[12..])
}

#[cfg(test)]
mod tests {
	use super::*;
	use ec_rpc_core::types::Bytes;
	use hex_literal::hex;

	#[test]
	fn contract_address_works() {
		let sender = H160(hex!("6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0"));
		assert_eq!(
			contract_address(sender, U256::zero()),
			H160(hex!("cd234a471b72ba2f1ccf0a70fcaba648a5eecd8d"))
		);
		assert_eq!(
			contract_address(sender, U256::one()),
			H160(hex!("343c43a37d37dff08ae8c4a11544c718abb4fcf8"))
		);
	}

	#[test]
	fn logs_bloom_contains_addresses_and_topics() {
		let log = Log {
			address: H160::repeat_byte(1),
			topics: vec![H256::repeat_byte(2)],
			data: Bytes::default(),
			block_hash: None,
			block_number: None,
			transaction_hash: None,
			transaction_index: None,
			log_index: None,
			removed: false,
		};
		let bloom = logs_bloom(&[log]);
		assert!(bloom.contains_input(BloomInput::Raw(H160::repeat_byte(1).as_bytes())));
		assert!(bloom.contains_input(BloomInput::Raw(H256::repeat_byte(2).as_bytes())));
		assert_eq!(logs_bloom(&[]), Bloom::default());
	}
}

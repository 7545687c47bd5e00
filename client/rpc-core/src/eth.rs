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

//! Eth rpc interface.

use ethereum_types::{H256, U256, U64};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};

use crate::types::*;

/// Eth rpc interface, restricted to what can be reconstructed from consensus
/// blocks and execution results.
#[rpc(server, namespace = "eth")]
#[async_trait]
pub trait EthApi {
	/// Returns highest block number.
	#[method(name = "blockNumber")]
	async fn block_number(&self) -> RpcResult<U64>;

	// ########################################################################
	// Block
	// ########################################################################

	/// Returns block with given hash.
	#[method(name = "getBlockByHash")]
	async fn block_by_hash(&self, hash: H256, full: bool) -> RpcResult<Option<RichBlock>>;

	/// Returns block with given number.
	#[method(name = "getBlockByNumber")]
	async fn block_by_number(
		&self,
		number: BlockNumberOrTag,
		full: bool,
	) -> RpcResult<Option<RichBlock>>;

	/// Returns the number of transactions in a block with given hash.
	#[method(name = "getBlockTransactionCountByHash")]
	async fn block_transaction_count_by_hash(&self, hash: H256) -> RpcResult<Option<U256>>;

	/// Returns the number of transactions in a block with given block number.
	#[method(name = "getBlockTransactionCountByNumber")]
	async fn block_transaction_count_by_number(
		&self,
		number: BlockNumberOrTag,
	) -> RpcResult<Option<U256>>;

	// ########################################################################
	// Transaction
	// ########################################################################

	/// Get transaction by its hash.
	#[method(name = "getTransactionByHash")]
	async fn transaction_by_hash(&self, hash: H256) -> RpcResult<Option<Transaction>>;

	/// Returns transaction at given block hash and index.
	#[method(name = "getTransactionByBlockHashAndIndex")]
	async fn transaction_by_block_hash_and_index(
		&self,
		hash: H256,
		index: Index,
	) -> RpcResult<Option<Transaction>>;

	/// Returns transaction by given block number and index.
	#[method(name = "getTransactionByBlockNumberAndIndex")]
	async fn transaction_by_block_number_and_index(
		&self,
		number: BlockNumberOrTag,
		index: Index,
	) -> RpcResult<Option<Transaction>>;

	/// Returns transaction receipt by transaction hash.
	#[method(name = "getTransactionReceipt")]
	async fn transaction_receipt(&self, hash: H256) -> RpcResult<Option<Receipt>>;

	// ########################################################################
	// Fee
	// ########################################################################

	/// Introduced in EIP-1559 for getting information on the appropriate priority fee to use.
	#[method(name = "feeHistory")]
	async fn fee_history(
		&self,
		block_count: U256,
		newest_block: BlockNumberOrTag,
		reward_percentiles: Option<Vec<f64>>,
	) -> RpcResult<FeeHistory>;
}

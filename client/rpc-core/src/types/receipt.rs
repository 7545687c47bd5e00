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

use ethereum_types::{Address, Bloom, H256, U256, U64};
use serde::Serialize;

use crate::types::{Log, TxType};

/// Receipt
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
	#[serde(rename = "type")]
	pub tx_type: TxType,
	pub transaction_hash: H256,
	pub transaction_index: U256,
	pub block_hash: H256,
	pub block_number: U256,
	pub from: Address,
	pub to: Option<Address>,
	/// Gas used by this transaction alone.
	pub gas_used: U256,
	/// Gas used by this and every earlier transaction of the block.
	pub cumulative_gas_used: U256,
	/// Contract address created, `None` unless the transaction is a creation.
	pub contract_address: Option<Address>,
	pub logs: Vec<Log>,
	pub logs_bloom: Bloom,
	/// `1` for success, `0` for failure.
	pub status: U64,
	pub effective_gas_price: U256,
}

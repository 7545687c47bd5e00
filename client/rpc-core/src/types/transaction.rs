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

use ethereum_types::{Address, H256, U256, U64};
use serde::Serialize;

use crate::types::Bytes;

/// [EIP-2718](https://eips.ethereum.org/EIPS/eip-2718) transaction type.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum TxType {
	#[default]
	Legacy,
	/// [EIP-2930](https://eips.ethereum.org/EIPS/eip-2930)
	AccessList,
	/// [EIP-1559](https://eips.ethereum.org/EIPS/eip-1559)
	DynamicFee,
}

impl From<u8> for TxType {
	fn from(value: u8) -> Self {
		match value {
			1 => Self::AccessList,
			2 => Self::DynamicFee,
			_ => Self::Legacy,
		}
	}
}

impl Serialize for TxType {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(match self {
			Self::Legacy => "0x0",
			Self::AccessList => "0x1",
			Self::DynamicFee => "0x2",
		})
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
	pub address: Address,
	pub storage_keys: Vec<H256>,
}

/// Transaction
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
	#[serde(rename = "type")]
	pub tx_type: TxType,
	pub hash: H256,
	pub nonce: U256,
	pub block_hash: Option<H256>,
	pub block_number: Option<U256>,
	pub transaction_index: Option<U256>,
	pub from: Address,
	pub to: Option<Address>,
	pub value: U256,
	pub input: Bytes,
	/// Gas limit
	pub gas: U256,
	/// Effective gas price once mined, the fee cap otherwise.
	pub gas_price: U256,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_fee_per_gas: Option<U256>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_priority_fee_per_gas: Option<U256>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chain_id: Option<U64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub access_list: Option<Vec<AccessListItem>>,
	pub v: U256,
	pub r: U256,
	pub s: U256,
}

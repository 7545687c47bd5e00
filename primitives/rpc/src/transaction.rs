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

//! Decoded consensus transactions and their Ethereum-shaped payloads.

use ethereum::TransactionAction;
use ethereum_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};

/// Type URL of the Ethereum-shaped message.
pub const MSG_ETHEREUM_TX_TYPE_URL: &str = "/ethermint.evm.v1.MsgEthereumTx";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
	pub address: H160,
	pub storage_keys: Vec<H256>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransactionSignature {
	pub v: u64,
	pub r: H256,
	pub s: H256,
}

/// Fee fields, one variant per envelope type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxFee {
	Legacy { gas_price: U256 },
	AccessList { gas_price: U256 },
	DynamicFee { gas_tip_cap: U256, gas_fee_cap: U256 },
}

impl TxFee {
	/// EIP-2718 envelope type.
	pub fn tx_type(&self) -> u8 {
		match self {
			Self::Legacy { .. } => 0,
			Self::AccessList { .. } => 1,
			Self::DynamicFee { .. } => 2,
		}
	}

	/// Priority fee paid per gas on top of `base_fee`, never negative.
	pub fn effective_gas_tip(&self, base_fee: Option<U256>) -> U256 {
		match (self, base_fee) {
			(Self::Legacy { gas_price } | Self::AccessList { gas_price }, None) => *gas_price,
			(Self::Legacy { gas_price } | Self::AccessList { gas_price }, Some(base_fee)) => {
				gas_price.saturating_sub(base_fee)
			}
			(Self::DynamicFee { gas_tip_cap, .. }, None) => *gas_tip_cap,
			(
				Self::DynamicFee {
					gas_tip_cap,
					gas_fee_cap,
				},
				Some(base_fee),
			) => (*gas_tip_cap).min(gas_fee_cap.saturating_sub(base_fee)),
		}
	}

	/// Price per gas actually paid once included in a block.
	pub fn effective_gas_price(&self, base_fee: Option<U256>) -> U256 {
		match self {
			Self::Legacy { gas_price } | Self::AccessList { gas_price } => *gas_price,
			Self::DynamicFee { gas_fee_cap, .. } => match base_fee {
				Some(base_fee) => base_fee
					.saturating_add(self.effective_gas_tip(Some(base_fee)))
					.min(*gas_fee_cap),
				None => *gas_fee_cap,
			},
		}
	}

	pub fn gas_price(&self) -> Option<U256> {
		match self {
			Self::Legacy { gas_price } | Self::AccessList { gas_price } => Some(*gas_price),
			Self::DynamicFee { .. } => None,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxData {
	pub nonce: U256,
	pub gas_limit: u64,
	pub action: TransactionAction,
	pub value: U256,
	pub input: Vec<u8>,
	pub access_list: Vec<AccessListItem>,
	pub chain_id: Option<u64>,
	pub fee: TxFee,
	pub signature: TransactionSignature,
}

impl TxData {
	pub fn to(&self) -> Option<H160> {
		match self.action {
			TransactionAction::Call(to) => Some(to),
			TransactionAction::Create => None,
		}
	}
}

/// An Ethereum transaction wrapped as a consensus-level message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgEthereumTx {
	pub hash: H256,
	pub from: H160,
	pub data: TxData,
}

impl MsgEthereumTx {
	pub fn gas_limit(&self) -> u64 {
		self.data.gas_limit
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubMessage {
	Ethereum(MsgEthereumTx),
	Other { type_url: String },
}

impl SubMessage {
	pub fn type_url(&self) -> &str {
		match self {
			Self::Ethereum(_) => MSG_ETHEREUM_TX_TYPE_URL,
			Self::Other { type_url } => type_url,
		}
	}

	pub fn as_ethereum(&self) -> Option<&MsgEthereumTx> {
		match self {
			Self::Ethereum(msg) => Some(msg),
			Self::Other { .. } => None,
		}
	}
}

/// A decoded consensus-level transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedTx {
	pub messages: Vec<SubMessage>,
}

impl DecodedTx {
	pub fn ethereum_messages(&self) -> impl Iterator<Item = &MsgEthereumTx> {
		self.messages.iter().filter_map(SubMessage::as_ethereum)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn effective_gas_tip_works() {
		let legacy = TxFee::Legacy {
			gas_price: U256::from(150),
		};
		assert_eq!(legacy.effective_gas_tip(Some(U256::from(100))), U256::from(50));
		assert_eq!(legacy.effective_gas_tip(Some(U256::from(200))), U256::zero());
		assert_eq!(legacy.effective_gas_tip(None), U256::from(150));

		let dynamic = TxFee::DynamicFee {
			gas_tip_cap: U256::from(30),
			gas_fee_cap: U256::from(120),
		};
		assert_eq!(dynamic.effective_gas_tip(Some(U256::from(100))), U256::from(20));
		assert_eq!(dynamic.effective_gas_tip(Some(U256::from(50))), U256::from(30));
		assert_eq!(dynamic.effective_gas_tip(Some(U256::from(500))), U256::zero());
		assert_eq!(dynamic.effective_gas_tip(None), U256::from(30));
	}

	#[test]
	fn effective_gas_price_works() {
		let dynamic = TxFee::DynamicFee {
			gas_tip_cap: U256::from(30),
			gas_fee_cap: U256::from(120),
		};
		assert_eq!(dynamic.effective_gas_price(Some(U256::from(100))), U256::from(120));
		assert_eq!(dynamic.effective_gas_price(Some(U256::from(50))), U256::from(80));
		assert_eq!(dynamic.effective_gas_price(None), U256::from(120));

		let access_list = TxFee::AccessList {
			gas_price: U256::from(7),
		};
		assert_eq!(access_list.effective_gas_price(Some(U256::from(100))), U256::from(7));
		assert_eq!(access_list.tx_type(), 1);
	}

	#[test]
	fn only_ethereum_messages_are_extracted() {
		let msg = MsgEthereumTx {
			hash: H256::repeat_byte(1),
			from: H160::repeat_byte(2),
			data: TxData {
				nonce: U256::zero(),
				gas_limit: 21_000,
				action: TransactionAction::Create,
				value: U256::zero(),
				input: vec![],
				access_list: vec![],
				chain_id: None,
				fee: TxFee::Legacy {
					gas_price: U256::one(),
				},
				signature: TransactionSignature::default(),
			},
		};
		let tx = DecodedTx {
			messages: vec![
				SubMessage::Other {
					type_url: "/cosmos.bank.v1beta1.MsgSend".to_string(),
				},
				SubMessage::Ethereum(msg.clone()),
			],
		};
		let found: Vec<_> = tx.ethereum_messages().collect();
		assert_eq!(found, vec![&msg]);
		assert_eq!(tx.messages[1].type_url(), MSG_ETHEREUM_TX_TYPE_URL);
		assert_eq!(msg.data.to(), None);
	}
}

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

//! Recovery of Ethereum transaction facts from consensus execution events.
//!
//! Two encodings of the `ethereum_tx` event exist on chain. The combined
//! encoding emits one event per message carrying every field. The split
//! encoding first emits a registration event per message with only the hash
//! and the block index, then one full event per message, in the same order,
//! once execution finished. The encoding is chosen per consensus transaction
//! by the shape of its first `ethereum_tx` event.

use std::collections::HashMap;

use ep_rpc::{
	DecodedTx, Event, EventAttribute, ExecTxResult, ATTRIBUTE_KEY_ETHEREUM_TX_FAILED,
	ATTRIBUTE_KEY_ETHEREUM_TX_HASH, ATTRIBUTE_KEY_MODULE, ATTRIBUTE_KEY_SENDER,
	ATTRIBUTE_KEY_TX_GAS_USED, ATTRIBUTE_KEY_TX_INDEX, ATTRIBUTE_KEY_TX_LOG,
	EVENT_TYPE_ETHEREUM_TX, EVENT_TYPE_MESSAGE, EVENT_TYPE_TX_LOG, EVM_MODULE,
};
use ethereum_types::{H160, H256};
use serde::Deserialize;

use ec_rpc_core::types::Bytes;

use crate::{error::EventError, LOG_TARGET};

/// One Ethereum transaction carried by one message of a consensus transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedTx {
	/// Position of the message inside its consensus transaction.
	pub msg_index: usize,
	pub from: H160,
	pub hash: H256,
	/// Position among the Ethereum transactions of the block, `-1` while unknown.
	pub eth_tx_index: i32,
	pub gas_used: u64,
	pub failed: bool,
}

impl ParsedTx {
	fn new(msg_index: usize) -> Self {
		Self {
			msg_index,
			eth_tx_index: -1,
			..Default::default()
		}
	}

	/// Populates the fields carried by an `ethereum_tx` attribute list.
	/// Unknown keys are ignored. Returns whether a gas value was present.
	fn fill(&mut self, attributes: &[EventAttribute]) -> Result<bool, EventError> {
		let mut gas_reported = false;
		for attr in attributes {
			match attr.key.as_str() {
				ATTRIBUTE_KEY_ETHEREUM_TX_HASH => {
					self.hash = parse_hash(ATTRIBUTE_KEY_ETHEREUM_TX_HASH, &attr.value)?;
				}
				ATTRIBUTE_KEY_TX_INDEX => {
					self.eth_tx_index = parse_tx_index(&attr.value)?;
				}
				ATTRIBUTE_KEY_TX_GAS_USED => {
					self.gas_used = attr.value.parse::<u64>().map_err(|err| {
						invalid_attribute(ATTRIBUTE_KEY_TX_GAS_USED, &attr.value, err)
					})?;
					gas_reported = true;
				}
				ATTRIBUTE_KEY_ETHEREUM_TX_FAILED => {
					self.failed = !attr.value.is_empty();
				}
				_ => {}
			}
		}
		Ok(gas_reported)
	}
}

/// Encoding of the `ethereum_tx` events of one consensus transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EventFormat {
	Combined,
	Split,
}

/// Shape of a single `ethereum_tx` event.
enum EthereumTxEvent<'a> {
	/// Hash and block index only.
	Registration(&'a [EventAttribute]),
	/// Every field.
	Full(&'a [EventAttribute]),
}

impl<'a> EthereumTxEvent<'a> {
	fn classify(event: &'a Event) -> Self {
		if event.attributes.len() == 2 {
			Self::Registration(&event.attributes)
		} else {
			Self::Full(&event.attributes)
		}
	}

	fn format(&self) -> EventFormat {
		match self {
			Self::Registration(_) => EventFormat::Split,
			Self::Full(_) => EventFormat::Combined,
		}
	}
}

/// Ethereum transactions of one consensus transaction, in message order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedTxs {
	pub txs: Vec<ParsedTx>,
	pub tx_hashes: HashMap<H256, usize>,
	gas_reported: bool,
	/// Full events of the split encoding seen so far.
	full_events: usize,
}

impl ParsedTxs {
	/// Parses the execution result of one consensus transaction.
	///
	/// `decoded` is only needed for failed transactions, where the declared
	/// gas limit of each message replaces the metered gas.
	pub fn parse(result: &ExecTxResult, decoded: Option<&DecodedTx>) -> Result<Self, EventError> {
		let mut parsed = Self::default();
		let mut detected = None;

		for event in result
			.events
			.iter()
			.filter(|event| event.kind == EVENT_TYPE_ETHEREUM_TX)
		{
			let event = EthereumTxEvent::classify(event);
			let format = *detected.get_or_insert_with(|| event.format());
			parsed.apply(format, event)?;
		}

		parsed.fill_senders(&result.events);

		if parsed.txs.len() == 1 && !parsed.gas_reported {
			parsed.txs[0].gas_used = result.gas_used();
		}

		if !result.is_ok() {
			if let Some(decoded) = decoded {
				parsed.apply_block_gas_limit_failure(decoded);
			}
		}

		Ok(parsed)
	}

	fn apply(&mut self, format: EventFormat, event: EthereumTxEvent) -> Result<(), EventError> {
		match (format, event) {
			(_, EthereumTxEvent::Registration(attributes))
			| (EventFormat::Combined, EthereumTxEvent::Full(attributes)) => self.push(attributes),
			(EventFormat::Split, EthereumTxEvent::Full(attributes)) => {
				let index = self.full_events;
				self.full_events += 1;
				self.update(index, attributes)
			}
		}
	}

	fn push(&mut self, attributes: &[EventAttribute]) -> Result<(), EventError> {
		let msg_index = self.txs.len();
		let mut tx = ParsedTx::new(msg_index);
		self.gas_reported |= tx.fill(attributes)?;
		self.tx_hashes.insert(tx.hash, msg_index);
		self.txs.push(tx);
		Ok(())
	}

	/// The full event of the split encoding is authoritative, including its hash.
	fn update(&mut self, index: usize, attributes: &[EventAttribute]) -> Result<(), EventError> {
		let mut tx = ParsedTx::new(index);
		self.gas_reported |= tx.fill(attributes)?;
		let current = self
			.txs
			.get_mut(index)
			.ok_or(EventError::UnregisteredEvent { index })?;
		if current.hash != tx.hash {
			self.tx_hashes.insert(tx.hash, index);
		}
		*current = tx;
		Ok(())
	}

	/// All messages of a consensus transaction share the sender reported by
	/// the evm module `message` event.
	fn fill_senders(&mut self, events: &[Event]) {
		let sender = events
			.iter()
			.filter(|event| event.kind == EVENT_TYPE_MESSAGE)
			.filter(|event| event.attribute(ATTRIBUTE_KEY_MODULE) == Some(EVM_MODULE))
			.filter_map(|event| event.attribute(ATTRIBUTE_KEY_SENDER))
			.last();
		let Some(sender) = sender else {
			return;
		};
		match parse_address(sender) {
			Ok(from) => self.txs.iter_mut().for_each(|tx| tx.from = from),
			Err(err) => log::debug!(target: LOG_TARGET, "Ignore sender attribute: {err}"),
		}
	}

	/// A failed consensus transaction carrying Ethereum messages was rejected
	/// by the block gas meter. The declared gas limit was deducted.
	fn apply_block_gas_limit_failure(&mut self, decoded: &DecodedTx) {
		let mut messages = decoded.ethereum_messages();
		for tx in self.txs.iter_mut() {
			tx.failed = true;
			match messages.next() {
				Some(msg) => tx.gas_used = msg.gas_limit(),
				None => log::warn!(
					target: LOG_TARGET,
					"No decoded message for eth tx {:?} at msg index {}",
					tx.hash,
					tx.msg_index,
				),
			}
		}
	}

	pub fn len(&self) -> usize {
		self.txs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.txs.is_empty()
	}

	pub fn get_tx_by_hash(&self, hash: &H256) -> Option<&ParsedTx> {
		self.tx_hashes
			.get(hash)
			.and_then(|index| self.get_tx_by_msg_index(*index))
	}

	pub fn get_tx_by_msg_index(&self, msg_index: usize) -> Option<&ParsedTx> {
		self.txs.get(msg_index)
	}

	/// Finds the transaction at the given block-wide Ethereum index.
	///
	/// Assumes the Ethereum indices of this consensus transaction are
	/// contiguous from its first message, and fails if the entry found does
	/// not carry the requested index.
	pub fn get_tx_by_tx_index(&self, tx_index: i32) -> Result<Option<&ParsedTx>, EventError> {
		let Some(first) = self.txs.first() else {
			return Ok(None);
		};
		let Ok(msg_index) = usize::try_from(i64::from(tx_index) - i64::from(first.eth_tx_index))
		else {
			return Ok(None);
		};
		match self.get_tx_by_msg_index(msg_index) {
			Some(tx) if tx.eth_tx_index != tx_index => Err(EventError::NonContiguousTxIndex {
				requested: tx_index,
				found: tx.eth_tx_index,
			}),
			found => Ok(found),
		}
	}

	/// Gas used by the messages up to and including `msg_index`.
	pub fn accumulative_gas_used(&self, msg_index: usize) -> u64 {
		self.txs
			.iter()
			.take(msg_index.saturating_add(1))
			.fold(0u64, |acc, tx| acc.saturating_add(tx.gas_used))
	}
}

/// A log as serialized into a `txLog` attribute.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TxLog {
	pub address: H160,
	#[serde(default)]
	pub topics: Vec<H256>,
	#[serde(default)]
	pub data: Bytes,
	/// Block-wide position, when the emitter recorded it.
	#[serde(default, rename = "logIndex")]
	pub index: Option<u64>,
}

/// Logs emitted by the message at `msg_index`, read from the matching
/// `tx_log` event. A message without such event emitted no logs.
pub fn tx_logs_from_events(events: &[Event], msg_index: usize) -> Result<Vec<TxLog>, EventError> {
	let Some(event) = events
		.iter()
		.filter(|event| event.kind == EVENT_TYPE_TX_LOG)
		.nth(msg_index)
	else {
		return Ok(Vec::new());
	};
	event
		.attributes
		.iter()
		.filter(|attr| attr.key == ATTRIBUTE_KEY_TX_LOG)
		.map(|attr| {
			serde_json::from_str::<TxLog>(&attr.value)
				.map_err(|err| EventError::InvalidLog(err.to_string()))
		})
		.collect()
}

fn invalid_attribute(key: &'static str, value: &str, reason: impl ToString) -> EventError {
	EventError::InvalidAttribute {
		key,
		value: value.to_string(),
		reason: reason.to_string(),
	}
}

fn parse_tx_index(value: &str) -> Result<i32, EventError> {
	let index = value
		.parse::<u32>()
		.map_err(|err| invalid_attribute(ATTRIBUTE_KEY_TX_INDEX, value, err))?;
	i32::try_from(index).map_err(|err| invalid_attribute(ATTRIBUTE_KEY_TX_INDEX, value, err))
}

fn parse_hash(key: &'static str, value: &str) -> Result<H256, EventError> {
	let bytes = const_hex::decode(value).map_err(|err| invalid_attribute(key, value, err))?;
	if bytes.len() != H256::len_bytes() {
		return Err(invalid_attribute(key, value, "expected 32 bytes"));
	}
	Ok(H256::from_slice(&bytes))
}

fn parse_address(value: &str) -> Result<H160, EventError> {
	let bytes =
		const_hex::decode(value).map_err(|err| invalid_attribute(ATTRIBUTE_KEY_SENDER, value, err))?;
	if bytes.len() != H160::len_bytes() {
		return Err(invalid_attribute(ATTRIBUTE_KEY_SENDER, value, "expected 20 bytes"));
	}
	Ok(H160::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
	use super::*;
	use ep_rpc::{
		MsgEthereumTx, SubMessage, TransactionSignature, TxData, TxFee, CODE_OUT_OF_GAS,
	};
	use ethereum::TransactionAction;
	use ethereum_types::U256;

	fn hash(byte: u8) -> H256 {
		H256::repeat_byte(byte)
	}

	fn full_event(hash: H256, index: u32, gas_used: u64, failed: bool) -> Event {
		let mut attributes = vec![
			EventAttribute::new(ATTRIBUTE_KEY_ETHEREUM_TX_HASH, format!("{hash:?}")),
			EventAttribute::new(ATTRIBUTE_KEY_TX_INDEX, index.to_string()),
			EventAttribute::new(ATTRIBUTE_KEY_TX_GAS_USED, gas_used.to_string()),
		];
		if failed {
			attributes.push(EventAttribute::new(
				ATTRIBUTE_KEY_ETHEREUM_TX_FAILED,
				"execution reverted",
			));
		}
		Event::new(EVENT_TYPE_ETHEREUM_TX, attributes)
	}

	fn registration_event(hash: H256, index: u32) -> Event {
		Event::new(
			EVENT_TYPE_ETHEREUM_TX,
			vec![
				EventAttribute::new(ATTRIBUTE_KEY_ETHEREUM_TX_HASH, format!("{hash:?}")),
				EventAttribute::new(ATTRIBUTE_KEY_TX_INDEX, index.to_string()),
			],
		)
	}

	fn message_event(module: &str, sender: H160) -> Event {
		Event::new(
			EVENT_TYPE_MESSAGE,
			vec![
				EventAttribute::new(ATTRIBUTE_KEY_MODULE, module),
				EventAttribute::new(ATTRIBUTE_KEY_SENDER, format!("{sender:?}")),
			],
		)
	}

	fn result_with(events: Vec<Event>) -> ExecTxResult {
		ExecTxResult {
			gas_used: 90_000,
			events,
			..Default::default()
		}
	}

	fn eth_msg(hash: H256, gas_limit: u64) -> SubMessage {
		SubMessage::Ethereum(MsgEthereumTx {
			hash,
			from: H160::zero(),
			data: TxData {
				nonce: U256::zero(),
				gas_limit,
				action: TransactionAction::Create,
				value: U256::zero(),
				input: vec![],
				access_list: vec![],
				chain_id: Some(9000),
				fee: TxFee::Legacy {
					gas_price: U256::from(10),
				},
				signature: TransactionSignature::default(),
			},
		})
	}

	#[test]
	fn combined_format_yields_one_tx_per_event() {
		let result = result_with(vec![
			full_event(hash(1), 4, 21_000, false),
			full_event(hash(2), 5, 30_000, true),
		]);
		let parsed = ParsedTxs::parse(&result, None).unwrap();

		assert_eq!(parsed.len(), 2);
		assert_eq!(
			parsed.txs[0],
			ParsedTx {
				msg_index: 0,
				from: H160::zero(),
				hash: hash(1),
				eth_tx_index: 4,
				gas_used: 21_000,
				failed: false,
			}
		);
		assert_eq!(parsed.txs[1].msg_index, 1);
		assert!(parsed.txs[1].failed);
		assert_eq!(parsed.get_tx_by_hash(&hash(2)).unwrap().eth_tx_index, 5);
	}

	#[test]
	fn split_format_second_event_is_authoritative() {
		let result = result_with(vec![
			registration_event(hash(1), 0),
			registration_event(hash(2), 1),
			full_event(hash(1), 0, 21_000, false),
			full_event(hash(9), 1, 40_000, false),
		]);
		let parsed = ParsedTxs::parse(&result, None).unwrap();

		assert_eq!(parsed.len(), 2);
		assert_eq!(parsed.txs[0].gas_used, 21_000);
		assert_eq!(parsed.txs[1].hash, hash(9));
		assert_eq!(parsed.txs[1].gas_used, 40_000);
		assert_eq!(parsed.get_tx_by_hash(&hash(9)).unwrap().msg_index, 1);
		// The registration hash keeps resolving to the same message.
		assert_eq!(parsed.get_tx_by_hash(&hash(2)).unwrap().msg_index, 1);
	}

	#[test]
	fn split_format_without_full_events_keeps_registration() {
		let result = result_with(vec![registration_event(hash(1), 3)]);
		let parsed = ParsedTxs::parse(&result, None).unwrap();
		assert_eq!(parsed.txs[0].eth_tx_index, 3);
		// Gas never reported, backfilled from the consensus result.
		assert_eq!(parsed.txs[0].gas_used, 90_000);
	}

	#[test]
	fn unmatched_full_event_is_rejected() {
		let result = result_with(vec![
			registration_event(hash(1), 0),
			full_event(hash(1), 0, 21_000, false),
			full_event(hash(2), 1, 21_000, false),
		]);
		assert!(matches!(
			ParsedTxs::parse(&result, None),
			Err(EventError::UnregisteredEvent { index: 1 })
		));
	}

	#[test]
	fn malformed_attributes_abort_parsing() {
		let overflow = result_with(vec![Event::new(
			EVENT_TYPE_ETHEREUM_TX,
			vec![
				EventAttribute::new(ATTRIBUTE_KEY_ETHEREUM_TX_HASH, format!("{:?}", hash(1))),
				EventAttribute::new(ATTRIBUTE_KEY_TX_INDEX, "2147483648"),
				EventAttribute::new(ATTRIBUTE_KEY_TX_GAS_USED, "1"),
			],
		)]);
		assert!(matches!(
			ParsedTxs::parse(&overflow, None),
			Err(EventError::InvalidAttribute {
				key: ATTRIBUTE_KEY_TX_INDEX,
				..
			})
		));

		let bad_gas = result_with(vec![Event::new(
			EVENT_TYPE_ETHEREUM_TX,
			vec![
				EventAttribute::new(ATTRIBUTE_KEY_ETHEREUM_TX_HASH, format!("{:?}", hash(1))),
				EventAttribute::new(ATTRIBUTE_KEY_TX_INDEX, "0"),
				EventAttribute::new(ATTRIBUTE_KEY_TX_GAS_USED, "lots"),
			],
		)]);
		assert!(ParsedTxs::parse(&bad_gas, None).is_err());

		let mut bad_hash = result_with(vec![registration_event(hash(1), 0)]);
		bad_hash.events[0].attributes[0].value = "0x1234".to_string();
		assert!(ParsedTxs::parse(&bad_hash, None).is_err());
	}

	#[test]
	fn unknown_attributes_are_ignored() {
		let mut event = full_event(hash(1), 0, 21_000, false);
		event
			.attributes
			.push(EventAttribute::new("recipient", "not an address"));
		event
			.attributes
			.push(EventAttribute::new(ATTRIBUTE_KEY_ETHEREUM_TX_FAILED, ""));
		let parsed = ParsedTxs::parse(&result_with(vec![event]), None).unwrap();
		assert_eq!(parsed.txs[0].gas_used, 21_000);
		assert!(!parsed.txs[0].failed);
	}

	#[test]
	fn sender_is_shared_by_all_messages() {
		let sender = H160::repeat_byte(0x42);
		let result = result_with(vec![
			full_event(hash(1), 0, 21_000, false),
			full_event(hash(2), 1, 21_000, false),
			message_event("bank", H160::repeat_byte(0x11)),
			message_event(EVM_MODULE, sender),
		]);
		let parsed = ParsedTxs::parse(&result, None).unwrap();
		assert!(parsed.txs.iter().all(|tx| tx.from == sender));
	}

	#[test]
	fn exceeded_block_gas_limit_reports_gas_limit() {
		let mut result = result_with(vec![
			full_event(hash(1), 0, 5_000, false),
			full_event(hash(2), 1, 7_000, false),
		]);
		result.code = CODE_OUT_OF_GAS;
		result.log = "out of gas in location: block gas meter; gasWanted: 150000".to_string();
		let decoded = DecodedTx {
			messages: vec![eth_msg(hash(1), 50_000), eth_msg(hash(2), 100_000)],
		};

		let parsed = ParsedTxs::parse(&result, Some(&decoded)).unwrap();
		assert!(parsed.txs.iter().all(|tx| tx.failed));
		assert_eq!(parsed.txs[0].gas_used, 50_000);
		assert_eq!(parsed.txs[1].gas_used, 100_000);

		// Without the decoded body the metered values are kept.
		let parsed = ParsedTxs::parse(&result, None).unwrap();
		assert_eq!(parsed.txs[1].gas_used, 7_000);
		assert!(!parsed.txs[1].failed);
	}

	#[test]
	fn lookup_by_block_tx_index() {
		let result = result_with(vec![
			full_event(hash(1), 7, 1, false),
			full_event(hash(2), 8, 1, false),
		]);
		let parsed = ParsedTxs::parse(&result, None).unwrap();
		assert_eq!(parsed.get_tx_by_tx_index(8).unwrap().unwrap().hash, hash(2));
		assert!(parsed.get_tx_by_tx_index(6).unwrap().is_none());
		assert!(parsed.get_tx_by_tx_index(9).unwrap().is_none());

		let gap = result_with(vec![
			full_event(hash(1), 7, 1, false),
			full_event(hash(2), 9, 1, false),
		]);
		let parsed = ParsedTxs::parse(&gap, None).unwrap();
		assert!(matches!(
			parsed.get_tx_by_tx_index(8),
			Err(EventError::NonContiguousTxIndex {
				requested: 8,
				found: 9
			})
		));
	}

	#[test]
	fn accumulative_gas_is_monotonic() {
		let result = result_with(vec![
			full_event(hash(1), 0, 100, false),
			full_event(hash(2), 1, 0, false),
			full_event(hash(3), 2, 300, false),
		]);
		let parsed = ParsedTxs::parse(&result, None).unwrap();
		let cumulative: Vec<u64> = (0..3).map(|i| parsed.accumulative_gas_used(i)).collect();
		assert_eq!(cumulative, vec![100, 100, 400]);
		assert_eq!(parsed.accumulative_gas_used(10), 400);
	}

	#[test]
	fn tx_logs_are_read_per_message() {
		let log = r#"{"address":"0x1111111111111111111111111111111111111111","topics":["0x2222222222222222222222222222222222222222222222222222222222222222"],"data":"0xabcd","blockNumber":5,"index":0}"#;
		let events = vec![
			Event::new(EVENT_TYPE_TX_LOG, vec![]),
			Event::new(
				EVENT_TYPE_TX_LOG,
				vec![
					EventAttribute::new(ATTRIBUTE_KEY_TX_LOG, log),
					EventAttribute::new(ATTRIBUTE_KEY_TX_LOG, log),
				],
			),
		];

		assert!(tx_logs_from_events(&events, 0).unwrap().is_empty());
		let logs = tx_logs_from_events(&events, 1).unwrap();
		assert_eq!(logs.len(), 2);
		assert_eq!(logs[0].address, H160::repeat_byte(0x11));
		assert_eq!(logs[0].topics, vec![hash(0x22)]);
		assert_eq!(logs[0].data, Bytes::new(vec![0xab, 0xcd]));
		assert!(tx_logs_from_events(&events, 2).unwrap().is_empty());

		let broken = vec![Event::new(
			EVENT_TYPE_TX_LOG,
			vec![EventAttribute::new(ATTRIBUTE_KEY_TX_LOG, "{")],
		)];
		assert!(tx_logs_from_events(&broken, 0).is_err());
	}
}

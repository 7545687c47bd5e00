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

//! Ethereum JSON-RPC types served by the compatibility layer.

mod block;
mod block_number;
mod bytes;
mod fee;
mod index;
mod log;
mod receipt;
mod transaction;

pub use self::{
	block::{Block, BlockTransactions, Header, Rich, RichBlock},
	block_number::BlockNumberOrTag,
	bytes::Bytes,
	fee::FeeHistory,
	index::Index,
	log::Log,
	receipt::Receipt,
	transaction::{AccessListItem, Transaction, TxType},
};
pub use ethereum_types::{Address, Bloom, H256, H64, U256, U64};

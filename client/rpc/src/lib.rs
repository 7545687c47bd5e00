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

#![warn(unused_crate_dependencies)]

mod config;
mod error;
mod eth;
mod events;

pub use self::{
	config::EthConfiguration,
	error::{Error, EventError, FieldError},
	eth::{
		base_fee_from_events, block_bloom, calc_next_base_fee, process_block, translate_block,
		BlockContext, BlockHash, BlockTransaction, Eth, OneFeeHistory, TranslatedBlock, TxResult,
		EMPTY_ROOT_HASH, EMPTY_UNCLE_HASH,
	},
	events::{tx_logs_from_events, ParsedTx, ParsedTxs, TxLog},
};
pub use ec_rpc_core::EthApiServer;

use jsonrpsee::types::{
	error::{INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE},
	ErrorObject, ErrorObjectOwned,
};

pub(crate) const LOG_TARGET: &str = "ethermint-rpc";

pub fn err<T: ToString>(code: i32, message: T, data: Option<&[u8]>) -> ErrorObjectOwned {
	ErrorObject::owned(
		code,
		message.to_string(),
		data.map(const_hex::encode_prefixed),
	)
}

pub fn internal_err<T: ToString>(message: T) -> ErrorObjectOwned {
	err(INTERNAL_ERROR_CODE, message, None)
}

pub fn invalid_params_err<T: ToString>(message: T) -> ErrorObjectOwned {
	err(INVALID_PARAMS_CODE, message, None)
}

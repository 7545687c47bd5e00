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

use ep_rpc::{ClientError, DecodeError};
use jsonrpsee::types::ErrorObjectOwned;

use crate::{internal_err, invalid_params_err};

/// Failure to decode the execution events of one consensus transaction.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
	#[error("invalid {key} attribute {value:?}: {reason}")]
	InvalidAttribute {
		key: &'static str,
		value: String,
		reason: String,
	},
	#[error("ethereum tx event #{index} has no matching registration event")]
	UnregisteredEvent { index: usize },
	#[error("eth tx index {requested} resolved to an entry with index {found}")]
	NonContiguousTxIndex { requested: i32, found: i32 },
	#[error("invalid tx log: {0}")]
	InvalidLog(String),
}

/// Why a block-level field could not be recovered.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
	#[error("no {0} event in block")]
	Missing(&'static str),
	#[error("malformed {attribute} attribute: {reason}")]
	Malformed {
		attribute: &'static str,
		reason: String,
	},
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("ethereum tx not found")]
	TxNotFound,
	#[error("block not found")]
	BlockNotFound,
	#[error("invalid gas limit {gas_limit} at height {height}")]
	InvalidGasLimit { height: u64, gas_limit: i64 },
	#[error("invalid reward percentiles: {0}")]
	InvalidPercentiles(String),
	#[error("block {height} has {actual} rewards, expected {expected}")]
	RewardCountMismatch {
		height: u64,
		expected: usize,
		actual: usize,
	},
	#[error("block {height} has {txs} txs but {results} results")]
	ResultsMismatch {
		height: u64,
		txs: usize,
		results: usize,
	},
	#[error(transparent)]
	Event(#[from] EventError),
	#[error(transparent)]
	Client(#[from] ClientError),
	#[error(transparent)]
	Decode(#[from] DecodeError),
}

impl Error {
	/// Whether the queried object simply does not exist.
	pub fn is_not_found(&self) -> bool {
		matches!(
			self,
			Self::TxNotFound | Self::BlockNotFound | Self::Client(ClientError::BlockNotFound(_))
		)
	}
}

impl From<Error> for ErrorObjectOwned {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidPercentiles(_) => invalid_params_err(err),
			err => internal_err(err),
		}
	}
}

/// Maps "does not exist" to `None`, keeping every other failure.
pub(crate) fn not_found_as_none<T>(result: Result<T, Error>) -> Result<Option<T>, Error> {
	match result {
		Ok(value) => Ok(Some(value)),
		Err(err) if err.is_not_found() => Ok(None),
		Err(err) => Err(err),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use jsonrpsee::types::error::{INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE};

	#[test]
	fn rpc_error_codes() {
		let err: ErrorObjectOwned = Error::InvalidPercentiles("101".into()).into();
		assert_eq!(err.code(), INVALID_PARAMS_CODE);

		let err: ErrorObjectOwned = Error::InvalidGasLimit {
			height: 3,
			gas_limit: 0,
		}
		.into();
		assert_eq!(err.code(), INTERNAL_ERROR_CODE);
		assert_eq!(err.message(), "invalid gas limit 0 at height 3");
	}

	#[test]
	fn not_found_is_not_an_error() {
		assert_eq!(not_found_as_none::<u8>(Err(Error::TxNotFound)).unwrap(), None);
		assert_eq!(
			not_found_as_none::<u8>(Err(ClientError::BlockNotFound(ep_rpc::BlockId::Number(4)).into()))
				.unwrap(),
			None
		);
		assert!(not_found_as_none::<u8>(Err(Error::BlockNotFound)).unwrap().is_none());
		assert!(not_found_as_none::<u8>(Err(Error::InvalidPercentiles(String::new()))).is_err());
	}
}

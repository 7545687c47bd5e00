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

/// Node configuration of the Ethereum RPC layer.
#[derive(Clone, Debug, PartialEq, Eq, clap::Parser)]
pub struct EthConfiguration {
	/// Maximum number of blocks served by a single `eth_feeHistory` request.
	/// Larger requests are clamped.
	#[arg(long, default_value = "100")]
	pub fee_history_cap: u64,

	/// Height at which the EIP-1559 fee market activates.
	#[arg(long, default_value = "0")]
	pub london_block: u64,

	/// Bounds the amount the base fee can change between blocks.
	#[arg(long, default_value = "8")]
	pub base_fee_change_denominator: u64,

	/// Bounds the maximum gas limit an EIP-1559 block may have.
	#[arg(long, default_value = "2")]
	pub elasticity_multiplier: u64,

	/// Base fee of the first London block.
	#[arg(long, default_value = "1000000000")]
	pub initial_base_fee: u64,

	/// EIP-155 chain id reported on transactions.
	#[arg(long, default_value = "9000")]
	pub chain_id: u64,
}

impl Default for EthConfiguration {
	fn default() -> Self {
		Self {
			fee_history_cap: 100,
			london_block: 0,
			base_fee_change_denominator: 8,
			elasticity_multiplier: 2,
			initial_base_fee: 1_000_000_000,
			chain_id: 9000,
		}
	}
}

impl EthConfiguration {
	pub fn is_london(&self, height: u64) -> bool {
		height >= self.london_block
	}
}

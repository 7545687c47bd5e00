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

use ep_rpc::{BlockId, ConsensusClient, TxDecoder};
use ethereum_types::U256;

use ec_rpc_core::types::{BlockNumberOrTag, FeeHistory};

use crate::{
	config::EthConfiguration,
	error::Error,
	eth::{Eth, TranslatedBlock},
	LOG_TARGET,
};

/// Fee statistics of a single block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OneFeeHistory {
	/// Base fee of the block, zero when unknown.
	pub base_fee: U256,
	/// Projected base fee of the following block.
	pub next_base_fee: U256,
	pub gas_used_ratio: f64,
	/// Priority fee per requested percentile.
	pub reward: Vec<U256>,
}

/// Projects the base fee of the block following `parent` with the EIP-1559
/// adjustment rule.
pub fn calc_next_base_fee(
	config: &EthConfiguration,
	parent_number: u64,
	parent_gas_limit: u64,
	parent_gas_used: u64,
	parent_base_fee: U256,
) -> U256 {
	if !config.is_london(parent_number) {
		return U256::from(config.initial_base_fee);
	}

	let target = parent_gas_limit / config.elasticity_multiplier.max(1);
	if parent_gas_used == target || target == 0 {
		return parent_base_fee;
	}
	let denominator = U256::from(config.base_fee_change_denominator.max(1));

	if parent_gas_used > target {
		let delta = U256::from(parent_gas_used - target);
		let change = (parent_base_fee.saturating_mul(delta) / target / denominator).max(U256::one());
		parent_base_fee.saturating_add(change)
	} else {
		let delta = U256::from(target - parent_gas_used);
		let change = parent_base_fee.saturating_mul(delta) / target / denominator;
		parent_base_fee.saturating_sub(change)
	}
}

/// Computes the fee statistics of `block`.
pub fn process_block(
	block: &TranslatedBlock,
	reward_percentiles: &[f64],
	config: &EthConfiguration,
) -> Result<OneFeeHistory, Error> {
	let height = block.number();
	let gas_limit = match u64::try_from(block.gas_limit) {
		Ok(gas_limit) if gas_limit > 0 => gas_limit,
		_ => {
			return Err(Error::InvalidGasLimit {
				height,
				gas_limit: block.gas_limit,
			})
		}
	};
	let base_fee = block.base_fee.as_ref().ok().copied();
	let gas_used = block.gas_used();

	let next_base_fee = if config.is_london(height.saturating_add(1)) {
		calc_next_base_fee(config, height, gas_limit, gas_used, base_fee.unwrap_or_default())
	} else {
		U256::zero()
	};

	let reward = if reward_percentiles.is_empty() {
		Vec::new()
	} else {
		block_rewards(block, base_fee, reward_percentiles)
	};

	Ok(OneFeeHistory {
		base_fee: base_fee.unwrap_or_default(),
		next_base_fee,
		gas_used_ratio: gas_used as f64 / gas_limit as f64,
		reward,
	})
}

/// Gas weighted priority fee percentiles of the block transactions.
fn block_rewards(block: &TranslatedBlock, base_fee: Option<U256>, percentiles: &[f64]) -> Vec<U256> {
	let mut rewards = vec![U256::zero(); percentiles.len()];

	let mut sorter: Vec<(u64, U256)> = block
		.transactions
		.iter()
		.map(|tx| (tx.gas_used, tx.msg.data.fee.effective_gas_tip(base_fee)))
		.collect();
	sorter.sort_unstable_by_key(|(_, reward)| *reward);
	let Some(&(first_gas_used, _)) = sorter.first() else {
		return rewards;
	};

	let block_gas_used = block.gas_used() as f64;
	let mut index = 0;
	let mut sum_gas_used = first_gas_used;
	for (reward, percentile) in rewards.iter_mut().zip(percentiles) {
		let threshold = (block_gas_used * percentile / 100.0) as u64;
		while sum_gas_used < threshold && index < sorter.len() - 1 {
			index += 1;
			sum_gas_used = sum_gas_used.saturating_add(sorter[index].0);
		}
		*reward = sorter[index].1;
	}
	rewards
}

fn validate_percentiles(percentiles: &[f64]) -> Result<(), Error> {
	let mut previous = 0.0;
	for &percentile in percentiles {
		if !(0.0..=100.0).contains(&percentile) {
			return Err(Error::InvalidPercentiles(format!(
				"{percentile} is outside [0, 100]"
			)));
		}
		if percentile < previous {
			return Err(Error::InvalidPercentiles(format!(
				"{percentile} follows {previous}, percentiles must be non-decreasing"
			)));
		}
		previous = percentile;
	}
	Ok(())
}

impl<C, D> Eth<C, D>
where
	C: ConsensusClient,
	D: TxDecoder,
{
	/// Fee statistics of up to `block_count` blocks ending at `newest_block`.
	/// The window is clamped to the configured cap and to the chain start.
	pub async fn fee_history(
		&self,
		block_count: U256,
		newest_block: BlockNumberOrTag,
		reward_percentiles: Option<Vec<f64>>,
	) -> Result<FeeHistory, Error> {
		let percentiles = reward_percentiles.unwrap_or_default();
		validate_percentiles(&percentiles)?;

		let latest = self.client.latest_height().await?;
		let newest = newest_block.resolve(latest);
		if newest > latest {
			return Err(Error::BlockNotFound);
		}

		let requested = if block_count > U256::from(u64::MAX) {
			u64::MAX
		} else {
			block_count.low_u64()
		};
		let block_count = requested
			.min(self.config.fee_history_cap)
			.min(newest.saturating_add(1));
		if block_count < requested {
			log::debug!(
				target: LOG_TARGET,
				"Fee history of {requested} blocks clamped to {block_count}",
			);
		}
		let oldest = newest.saturating_add(1) - block_count;

		let mut base_fee_per_gas = Vec::with_capacity(block_count as usize + 1);
		let mut gas_used_ratio = Vec::with_capacity(block_count as usize);
		let mut reward = Vec::with_capacity(block_count as usize);

		for height in oldest..=newest {
			let block = self.translate(BlockId::Number(height)).await?;
			let one = process_block(&block, &percentiles, &self.config)?;
			if one.reward.len() != percentiles.len() {
				return Err(Error::RewardCountMismatch {
					height,
					expected: percentiles.len(),
					actual: one.reward.len(),
				});
			}

			base_fee_per_gas.push(one.base_fee);
			if height == newest {
				base_fee_per_gas.push(one.next_base_fee);
			}
			gas_used_ratio.push(one.gas_used_ratio);
			reward.push(one.reward);
		}

		Ok(FeeHistory {
			oldest_block: U256::from(oldest),
			base_fee_per_gas,
			gas_used_ratio,
			reward: (!percentiles.is_empty()).then_some(reward),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::eth::{BlockHash, BlockTransaction, EMPTY_ROOT_HASH, EMPTY_UNCLE_HASH};
	use ep_rpc::{MsgEthereumTx, TransactionSignature, TxData, TxFee};
	use ethereum::TransactionAction;
	use ethereum_types::{H160, H256, H64};

	const GWEI: u64 = 1_000_000_000;

	fn tx(gas_used: u64, fee: TxFee) -> BlockTransaction {
		BlockTransaction {
			msg: MsgEthereumTx {
				hash: H256::from_low_u64_be(gas_used),
				from: H160::zero(),
				data: TxData {
					nonce: U256::zero(),
					gas_limit: gas_used,
					action: TransactionAction::Create,
					value: U256::zero(),
					input: vec![],
					access_list: vec![],
					chain_id: None,
					fee,
					signature: TransactionSignature::default(),
				},
			},
			tx_index: 0,
			msg_index: 0,
			eth_tx_index: 0,
			gas_used,
			failed: false,
		}
	}

	fn legacy(gas_price: u64) -> TxFee {
		TxFee::Legacy {
			gas_price: U256::from(gas_price),
		}
	}

	fn block(
		number: u64,
		gas_limit: i64,
		gas_used: u64,
		base_fee: U256,
		transactions: Vec<BlockTransaction>,
	) -> TranslatedBlock {
		let partial_header = ethereum::PartialHeader {
			parent_hash: H256::zero(),
			beneficiary: Default::default(),
			state_root: H256::zero(),
			receipts_root: EMPTY_ROOT_HASH,
			logs_bloom: Default::default(),
			difficulty: U256::zero(),
			number: U256::from(number),
			gas_limit: U256::from(gas_limit.max(0)),
			gas_used: U256::from(gas_used),
			timestamp: 0,
			extra_data: Vec::new(),
			mix_hash: H256::zero(),
			nonce: H64::zero(),
		};
		TranslatedBlock {
			header: ethereum::Header::new(partial_header, EMPTY_UNCLE_HASH, EMPTY_ROOT_HASH),
			hash: BlockHash::Stored(H256::repeat_byte(number as u8)),
			base_fee: Ok(base_fee),
			bloom: Ok(Default::default()),
			gas_limit,
			size: 0,
			transactions,
		}
	}

	#[test]
	fn rewards_are_gas_weighted() {
		let base_fee = U256::from(GWEI);
		let zero_tip = TxFee::DynamicFee {
			gas_tip_cap: U256::zero(),
			gas_fee_cap: U256::from(2 * GWEI),
		};
		let tipping = TxFee::Legacy {
			gas_price: U256::from(3 * GWEI),
		};
		let block = block(
			10,
			1_000,
			600,
			base_fee,
			vec![tx(300, tipping), tx(100, zero_tip), tx(200, zero_tip)],
		);

		let one = process_block(&block, &[10.0, 50.0, 90.0], &EthConfiguration::default()).unwrap();
		assert_eq!(
			one.reward,
			vec![U256::zero(), U256::zero(), U256::from(2 * GWEI)]
		);
		assert_eq!(one.base_fee, base_fee);
		assert_eq!(one.gas_used_ratio, 0.6);
	}

	#[test]
	fn rewards_follow_tip_order_not_block_order() {
		let base_fee = U256::from(10);
		let block = block(
			10,
			2_000,
			1_000,
			base_fee,
			vec![
				tx(500, legacy(110)),
				tx(100, legacy(10)),
				tx(400, legacy(60)),
			],
		);

		let one = process_block(&block, &[10.0, 50.0], &EthConfiguration::default()).unwrap();
		assert_eq!(one.reward, vec![U256::zero(), U256::from(50)]);

		let one = process_block(&block, &[60.0, 100.0], &EthConfiguration::default()).unwrap();
		assert_eq!(one.reward, vec![U256::from(100), U256::from(100)]);
	}

	#[test]
	fn last_reward_repeats_when_threshold_not_reached() {
		let fee = TxFee::Legacy {
			gas_price: U256::from(5),
		};
		// Header gas exceeds what the transactions report.
		let block = block(1, 1_000, 900, U256::from(1), vec![tx(100, fee)]);
		let one = process_block(&block, &[0.0, 99.0, 100.0], &EthConfiguration::default()).unwrap();
		assert_eq!(one.reward, vec![U256::from(4); 3]);
	}

	#[test]
	fn empty_block_has_zero_rewards() {
		let block = block(1, 1_000, 0, U256::from(7), vec![]);
		let one = process_block(&block, &[25.0, 75.0], &EthConfiguration::default()).unwrap();
		assert_eq!(one.reward, vec![U256::zero(); 2]);
		assert_eq!(one.gas_used_ratio, 0.0);

		let one = process_block(&block, &[], &EthConfiguration::default()).unwrap();
		assert!(one.reward.is_empty());
	}

	#[test]
	fn non_positive_gas_limit_fails() {
		for gas_limit in [0, -5] {
			let block = block(4, gas_limit, 0, U256::zero(), vec![]);
			assert!(matches!(
				process_block(&block, &[], &EthConfiguration::default()),
				Err(Error::InvalidGasLimit { height: 4, .. })
			));
		}
	}

	#[test]
	fn missing_base_fee_reports_zero() {
		let mut block = block(3, 1_000, 500, U256::zero(), vec![]);
		block.base_fee = Err(crate::FieldError::Missing("fee_market"));
		let one = process_block(&block, &[], &EthConfiguration::default()).unwrap();
		assert_eq!(one.base_fee, U256::zero());
		assert_eq!(one.next_base_fee, U256::zero());
	}

	#[test]
	fn next_base_fee_follows_eip1559() {
		let config = EthConfiguration::default();
		let base_fee = U256::from(GWEI);

		// At target.
		assert_eq!(calc_next_base_fee(&config, 5, 1_000, 500, base_fee), base_fee);
		// Full block raises the fee by 1/8.
		assert_eq!(
			calc_next_base_fee(&config, 5, 1_000, 1_000, base_fee),
			U256::from(1_125_000_000u64)
		);
		// Empty block lowers it by 1/8.
		assert_eq!(
			calc_next_base_fee(&config, 5, 1_000, 0, base_fee),
			U256::from(875_000_000u64)
		);
		// Increase is at least one.
		assert_eq!(
			calc_next_base_fee(&config, 5, 1_000, 501, U256::from(8)),
			U256::from(9)
		);
	}

	#[test]
	fn next_base_fee_around_london() {
		let config = EthConfiguration {
			london_block: 10,
			..Default::default()
		};

		// The block right before activation projects the initial fee.
		assert_eq!(
			calc_next_base_fee(&config, 9, 1_000, 1_000, U256::zero()),
			U256::from(config.initial_base_fee)
		);
		let block_before = block(9, 1_000, 1_000, U256::zero(), vec![]);
		let one = process_block(&block_before, &[], &config).unwrap();
		assert_eq!(one.next_base_fee, U256::from(config.initial_base_fee));

		let block_early = block(5, 1_000, 1_000, U256::zero(), vec![]);
		let one = process_block(&block_early, &[], &config).unwrap();
		assert_eq!(one.next_base_fee, U256::zero());
	}

	#[test]
	fn percentiles_are_validated() {
		assert!(validate_percentiles(&[]).is_ok());
		assert!(validate_percentiles(&[0.0, 50.0, 50.0, 100.0]).is_ok());
		assert!(matches!(
			validate_percentiles(&[101.0]),
			Err(Error::InvalidPercentiles(_))
		));
		assert!(matches!(
			validate_percentiles(&[-1.0]),
			Err(Error::InvalidPercentiles(_))
		));
		assert!(matches!(
			validate_percentiles(&[60.0, 40.0]),
			Err(Error::InvalidPercentiles(_))
		));
	}
}

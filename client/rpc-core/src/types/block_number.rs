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

use std::str::FromStr;

/// A block number or tag.
///
/// The consensus layer has instant finality, so `finalized`, `safe` and
/// `pending` all resolve to the latest committed block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Hash)]
pub enum BlockNumberOrTag {
	#[default]
	Latest,
	Finalized,
	Safe,
	Earliest,
	Pending,
	Number(u64),
}

impl BlockNumberOrTag {
	/// Concrete height given the current chain head.
	pub fn resolve(&self, latest: u64) -> u64 {
		match self {
			Self::Number(number) => *number,
			Self::Earliest => 0,
			Self::Latest | Self::Finalized | Self::Safe | Self::Pending => latest,
		}
	}
}

impl From<u64> for BlockNumberOrTag {
	fn from(value: u64) -> Self {
		Self::Number(value)
	}
}

impl FromStr for BlockNumberOrTag {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"latest" => Self::Latest,
			"finalized" => Self::Finalized,
			"safe" => Self::Safe,
			"earliest" => Self::Earliest,
			"pending" => Self::Pending,
			_ => match s.strip_prefix("0x") {
				Some(hex) => {
					Self::Number(u64::from_str_radix(hex, 16).map_err(|err| err.to_string())?)
				}
				None => return Err(format!("invalid block number or tag: {s}")),
			},
		})
	}
}

impl serde::Serialize for BlockNumberOrTag {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		match self {
			Self::Latest => serializer.serialize_str("latest"),
			Self::Finalized => serializer.serialize_str("finalized"),
			Self::Safe => serializer.serialize_str("safe"),
			Self::Earliest => serializer.serialize_str("earliest"),
			Self::Pending => serializer.serialize_str("pending"),
			Self::Number(num) => serializer.serialize_str(&format!("0x{num:x}")),
		}
	}
}

impl<'de> serde::Deserialize<'de> for BlockNumberOrTag {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?.to_lowercase();
		s.parse().map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn block_number_or_tag_serde() {
		let cases = [
			(r#""latest""#, BlockNumberOrTag::Latest),
			(r#""earliest""#, BlockNumberOrTag::Earliest),
			(r#""pending""#, BlockNumberOrTag::Pending),
			(r#""0x2a""#, BlockNumberOrTag::Number(42)),
		];
		for (raw, typed) in cases {
			assert_eq!(serde_json::from_str::<BlockNumberOrTag>(raw).unwrap(), typed);
			assert_eq!(serde_json::to_string(&typed).unwrap(), raw);
		}
		assert_eq!(
			serde_json::from_str::<BlockNumberOrTag>(r#""SAFE""#).unwrap(),
			BlockNumberOrTag::Safe
		);
		assert!(serde_json::from_str::<BlockNumberOrTag>(r#""42""#).is_err());
	}

	#[test]
	fn tags_resolve_against_head() {
		assert_eq!(BlockNumberOrTag::Latest.resolve(9), 9);
		assert_eq!(BlockNumberOrTag::Finalized.resolve(9), 9);
		assert_eq!(BlockNumberOrTag::Earliest.resolve(9), 0);
		assert_eq!(BlockNumberOrTag::Number(3).resolve(9), 3);
	}
}

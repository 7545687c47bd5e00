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

use std::fmt;

/// Position argument of the `*AndIndex` methods.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Hash)]
pub struct Index(usize);

impl Index {
	pub fn value(&self) -> usize {
		self.0
	}
}

impl From<usize> for Index {
	fn from(value: usize) -> Self {
		Self(value)
	}
}

impl<'de> serde::Deserialize<'de> for Index {
	fn deserialize<D>(deserializer: D) -> Result<Index, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		use serde::de;

		struct IndexVisitor;

		impl<'de> de::Visitor<'de> for IndexVisitor {
			type Value = Index;

			fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
				formatter.write_str("hex-encoded or decimal index")
			}

			fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
			where
				E: de::Error,
			{
				usize::try_from(value).map(Index).map_err(de::Error::custom)
			}

			fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
			where
				E: de::Error,
			{
				match value.strip_prefix("0x") {
					Some(hex) => usize::from_str_radix(hex, 16),
					None => value.parse::<usize>(),
				}
				.map(Index)
				.map_err(de::Error::custom)
			}
		}

		deserializer.deserialize_any(IndexVisitor)
	}
}

impl serde::Serialize for Index {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(&format!("0x{:x}", self.0))
	}
}

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

use std::{fmt, ops};

/// Variable length byte string, hex encoded with a `0x` prefix on the wire.
#[derive(Clone, Default, Eq, PartialEq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
	pub fn new(bytes: Vec<u8>) -> Self {
		Self(bytes)
	}

	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}
}

impl fmt::Debug for Bytes {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&const_hex::encode_prefixed(&self.0))
	}
}

impl ops::Deref for Bytes {
	type Target = [u8];

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl From<Vec<u8>> for Bytes {
	fn from(bytes: Vec<u8>) -> Bytes {
		Bytes(bytes)
	}
}

impl From<&[u8]> for Bytes {
	fn from(bytes: &[u8]) -> Bytes {
		Bytes(bytes.to_vec())
	}
}

impl serde::Serialize for Bytes {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&const_hex::encode_prefixed(&self.0))
	}
}

impl<'de> serde::Deserialize<'de> for Bytes {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let value = String::deserialize(deserializer)?;
		if !value.starts_with("0x") {
			return Err(serde::de::Error::custom(
				"hex string without 0x prefix",
			));
		}
		const_hex::decode(&value)
			.map(Bytes)
			.map_err(|err| serde::de::Error::custom(format!("invalid hex string: {err}")))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bytes_serde_works() {
		let bytes = Bytes::new(vec![0xde, 0xad, 0xbe, 0xef]);
		assert_eq!(serde_json::to_string(&bytes).unwrap(), r#""0xdeadbeef""#);
		assert_eq!(serde_json::to_string(&Bytes::default()).unwrap(), r#""0x""#);

		let decoded: Bytes = serde_json::from_str(r#""0x0123""#).unwrap();
		assert_eq!(decoded, Bytes(vec![0x01, 0x23]));
		assert!(serde_json::from_str::<Bytes>(r#""0123""#).is_err());
		assert!(serde_json::from_str::<Bytes>(r#""0xzz""#).is_err());
	}
}

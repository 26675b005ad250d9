// UTXO (Unspent Transaction Output) identifiers and records

use crate::ledger::state::NodeId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing ledger identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Malformed output id {0:?}: expected \"<tx_id>:<index>\"")]
    MalformedOutputId(String),

    #[error("Invalid output index in {0:?}")]
    InvalidIndex(String),
}

/// Identifier of an output: the creating transaction id plus the output index
///
/// The textual form is `"<tx_id>:<index>"`. Transaction ids may contain `:`
/// themselves (genesis ids look like `GEN:4`), so parsing splits on the last
/// colon only.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId {
    tx_id: String,
    index: u32,
}

impl OutputId {
    /// Create an output id
    pub fn new(tx_id: impl Into<String>, index: u32) -> Self {
        Self {
            tx_id: tx_id.into(),
            index,
        }
    }

    /// Id of the transaction that created the output
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Position of the output in its creating transaction
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.index)
    }
}

impl FromStr for OutputId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tx_id, index) = s
            .rsplit_once(':')
            .ok_or_else(|| LedgerError::MalformedOutputId(s.to_string()))?;
        if tx_id.is_empty() {
            return Err(LedgerError::MalformedOutputId(s.to_string()));
        }
        let index = index
            .parse::<u32>()
            .map_err(|_| LedgerError::InvalidIndex(s.to_string()))?;
        Ok(Self::new(tx_id, index))
    }
}

impl Serialize for OutputId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OutputId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Opaque owner token attached to an output
///
/// Ownership is not authenticated; the token only says who an output was
/// created for. Encoded as base64 in human-readable formats and as raw bytes
/// in binary ones.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OwnerToken(Vec<u8>);

impl OwnerToken {
    /// Create a token from raw bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The token used for outputs owned by a node
    ///
    /// The id's big-endian bytes without leading zeros (at least one byte),
    /// so nodes below 256 get the single byte `[n]`.
    pub fn for_node(node_id: NodeId) -> Self {
        let bytes = node_id.as_u32().to_be_bytes();
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
        Self(bytes[start..].to_vec())
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for OwnerToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            use base64::{engine::general_purpose::STANDARD, Engine};
            serializer.serialize_str(&STANDARD.encode(&self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for OwnerToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            use base64::{engine::general_purpose::STANDARD, Engine};
            let encoded = String::deserialize(deserializer)?;
            STANDARD
                .decode(encoded.as_bytes())
                .map(Self)
                .map_err(serde::de::Error::custom)
        } else {
            let bytes: Vec<u8> = serde_bytes_compat::deserialize(deserializer)?;
            Ok(Self(bytes))
        }
    }
}

// postcard encodes `serialize_bytes` as a length-prefixed byte run, which a
// plain `Vec<u8>` sequence visitor cannot read back; accept both shapes.
mod serde_bytes_compat {
    use serde::de::{Deserializer, SeqAccess, Visitor};
    use std::fmt;

    struct BytesVisitor;

    impl<'de> Visitor<'de> for BytesVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a byte buffer")
        }

        fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
            Ok(v.to_vec())
        }

        fn visit_borrowed_bytes<E: serde::de::Error>(self, v: &'de [u8]) -> Result<Self::Value, E> {
            Ok(v.to_vec())
        }

        fn visit_byte_buf<E: serde::de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(b) = seq.next_element::<u8>()? {
                out.push(b);
            }
            Ok(out)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        deserializer.deserialize_bytes(BytesVisitor)
    }
}

/// An unspent output - an atomic unit of value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Id of the transaction that created this output
    tx_id: String,
    /// Position within the creating transaction
    index: u32,
    /// Value held by this output
    amount: u64,
    /// Who the output was created for
    owner: OwnerToken,
}

impl Output {
    /// Create a new output
    pub fn new(tx_id: impl Into<String>, index: u32, amount: u64, owner: OwnerToken) -> Self {
        Self {
            tx_id: tx_id.into(),
            index,
            amount,
            owner,
        }
    }

    /// Get the id of this output
    pub fn id(&self) -> OutputId {
        OutputId::new(self.tx_id.clone(), self.index)
    }

    /// Id of the creating transaction
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Output index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Get the amount
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Get the owner token
    pub fn owner(&self) -> &OwnerToken {
        &self.owner
    }

    /// Check if the output belongs to a node
    pub fn is_owned_by(&self, node_id: NodeId) -> bool {
        self.owner == OwnerToken::for_node(node_id)
    }
}

//! Object ids and the two chain boundaries the client talks through.
//!
//! Transactions go out through a [`TransactionExecutor`] (something that can
//! sign), state comes back through a [`StateSource`] (something that can read
//! a full node). Neither knows about the other.

use crate::{
    items::OwnedItem,
    snapshot::{
        PlayerSnapshot,
        RunObject,
    },
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use std::{
    fmt,
    future::Future,
    str::FromStr,
};

/// 32-byte Sui object id. Addresses share the same encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId([u8; 32]);

pub type SuiAddress = ObjectId;

impl ObjectId {
    pub const LENGTH: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x1234…abcd`, for places where the full id does not fit.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}…{}", &full[..6], &full[full.len() - 4..])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id '{raw}': {reason}")]
pub struct ParseObjectIdError {
    raw: String,
    reason: &'static str,
}

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let err = |reason| ParseObjectIdError {
            raw: raw.to_string(),
            reason,
        };
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(err("empty"));
        }
        if digits.len() > Self::LENGTH * 2 {
            return Err(err("longer than 32 bytes"));
        }
        // Sui prints short ids such as 0x2 and 0x8 without leading zeros.
        let padded = format!("{digits:0>64}");
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(padded, &mut bytes).map_err(|_| err("not hex"))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({self})")
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionDigest(pub String);

impl fmt::Display for TransactionDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Acknowledgement that the signer accepted and executed a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub digest: TransactionDigest,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("could not reach {endpoint}: {message}")]
    Transport { endpoint: String, message: String },
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("transaction {0} not visible after waiting")]
    ConfirmationTimeout(TransactionDigest),
}

impl ChainError {
    /// Text suitable for a status line.
    pub fn user_message(&self) -> String {
        match self {
            ChainError::Rejected(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

/// Argument of a Move call. `SplitCoin` refers to the coin split from gas
/// for the call's `payment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Object(ObjectId),
    U8(u8),
    SplitCoin,
}

/// A single Move call, optionally paid for with a coin split from gas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCall {
    pub package: ObjectId,
    pub module: &'static str,
    pub function: &'static str,
    pub arguments: Vec<CallArg>,
    pub payment_mist: Option<u64>,
}

impl MoveCall {
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

pub trait TransactionExecutor {
    fn submit(
        &self,
        call: &MoveCall,
    ) -> impl Future<Output = Result<Confirmation, ChainError>> + Send;

    fn wait_for_confirmation(
        &self,
        confirmation: &Confirmation,
    ) -> impl Future<Output = Result<(), ChainError>> + Send;
}

pub trait StateSource {
    /// `Ok(None)` when the account has not created a player yet.
    fn player(
        &self,
        owner: &SuiAddress,
    ) -> impl Future<Output = Result<Option<PlayerSnapshot>, ChainError>> + Send;

    /// `Ok(None)` when there is no active run.
    fn run(
        &self,
        owner: &SuiAddress,
    ) -> impl Future<Output = Result<Option<RunObject>, ChainError>> + Send;

    fn owned_items(
        &self,
        owner: &SuiAddress,
    ) -> impl Future<Output = Result<Vec<OwnedItem>, ChainError>> + Send;
}

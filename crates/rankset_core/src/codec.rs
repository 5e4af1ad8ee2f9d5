//! Member codecs.
//!
//! The store only sees strings. A codec turns caller values into the string
//! stored as a sorted-set member and back.

use crate::error::{CoreError, CoreResult};
use crate::types::ScoreEntry;
use rankset_store::ScoredMember;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// Converts members to and from their stored string form.
///
/// Encoding must be deterministic: equal values must produce identical
/// strings, otherwise the same logical member ends up stored twice.
pub trait MemberCodec: Send + Sync {
    /// The caller-facing member type.
    type Member;

    /// Encodes a member to its stored form.
    fn encode(&self, member: &Self::Member) -> CoreResult<String>;

    /// Decodes a stored member.
    fn decode(&self, raw: &str) -> CoreResult<Self::Member>;
}

/// Stores `String` members verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl MemberCodec for StringCodec {
    type Member = String;

    fn encode(&self, member: &String) -> CoreResult<String> {
        Ok(member.clone())
    }

    fn decode(&self, raw: &str) -> CoreResult<String> {
        Ok(raw.to_string())
    }
}

/// Stores any serde type as compact JSON.
///
/// Field order follows the type's `Serialize` impl, so structs encode
/// deterministically. Avoid members containing hash maps.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Creates a JSON codec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCodec")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> MemberCodec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Member = T;

    fn encode(&self, member: &T) -> CoreResult<String> {
        serde_json::to_string(member).map_err(|e| CoreError::codec(e.to_string()))
    }

    fn decode(&self, raw: &str) -> CoreResult<T> {
        serde_json::from_str(raw).map_err(|e| CoreError::codec(format!("{e}: {raw:?}")))
    }
}

/// Decodes raw store results into entries.
pub(crate) fn decode_entries<C: MemberCodec>(
    codec: &C,
    raw: Vec<ScoredMember>,
) -> CoreResult<Vec<ScoreEntry<C::Member>>> {
    raw.into_iter()
        .map(|entry| Ok(ScoreEntry::new(codec.decode(&entry.member)?, entry.score)))
        .collect()
}

/// Decodes raw store members.
pub(crate) fn decode_members<C: MemberCodec>(codec: &C, raw: Vec<String>) -> CoreResult<Vec<C::Member>> {
    raw.iter().map(|member| codec.decode(member)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Player {
        id: u64,
        name: String,
    }

    #[test]
    fn string_codec_is_verbatim() {
        let codec = StringCodec;
        let raw = codec.encode(&"alice".to_string()).unwrap();
        assert_eq!(raw, "alice");
        assert_eq!(codec.decode(&raw).unwrap(), "alice");
    }

    #[test]
    fn json_codec_is_deterministic() {
        let codec = JsonCodec::<Player>::new();
        let player = Player {
            id: 7,
            name: "bob".into(),
        };
        let first = codec.encode(&player).unwrap();
        let second = codec.encode(&player.clone()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, r#"{"id":7,"name":"bob"}"#);
        assert_eq!(codec.decode(&first).unwrap(), player);
    }

    #[test]
    fn json_codec_rejects_garbage() {
        let codec = JsonCodec::<Player>::new();
        let result = codec.decode("not json");
        assert!(matches!(result, Err(CoreError::Codec { .. })));
    }
}

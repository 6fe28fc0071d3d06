use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// API version stamped on every envelope this server produces.
pub const API_VERSION: &str = "v1";

/// Bits reserved below the millisecond timestamp for the per-millisecond sequence.
const SEQUENCE_BITS: u32 = 22;

/// Server-assigned resource identifier.
///
/// Serialised as a decimal string (`"932309487992184832"`), the way clients
/// see it in every response and URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(u64);

/// A path segment that is not a resource id at all (contains non-digits).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedId(pub String);

impl ResourceId {
    /// Placeholder carried by payloads that have not been admitted yet.
    pub const UNASSIGNED: ResourceId = ResourceId(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }

    /// Parse an id taken from a URL.
    ///
    /// - `Err(MalformedId)` when the segment is empty or has a non-digit.
    /// - `Ok(None)` when it is all digits but can never have been assigned
    ///   (zero, or too large for the id space).
    /// - `Ok(Some(id))` otherwise.
    pub fn parse(raw: &str) -> Result<Option<ResourceId>, MalformedId> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MalformedId(raw.to_string()));
        }
        match raw.parse::<u64>() {
            Ok(0) | Err(_) => Ok(None),
            Ok(value) => Ok(Some(ResourceId(value))),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_assigned() {
            serializer.collect_str(&self.0)
        } else {
            serializer.serialize_str("")
        }
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    /// Client supplied ids are never trusted, so anything that is not a
    /// usable id collapses to `UNASSIGNED` instead of failing the body.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let id = match value {
            serde_json::Value::Number(n) => n.as_u64().map(ResourceId).unwrap_or_default(),
            serde_json::Value::String(s) => ResourceId::parse(&s)
                .ok()
                .flatten()
                .unwrap_or_default(),
            _ => ResourceId::UNASSIGNED,
        };
        Ok(id)
    }
}

/// Hands out strictly increasing, snowflake shaped ids:
/// `milliseconds since the Unix epoch << 22 | sequence`.
///
/// Safe to share between tasks; uniqueness never depends on the wall clock
/// moving forward.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> ResourceId {
        let floor = (chrono::Utc::now().timestamp_millis().max(0) as u64) << SEQUENCE_BITS;
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = floor.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return ResourceId(candidate),
                Err(observed) => current = observed,
            }
        }
    }
}

/// RFC 3339 timestamp in UTC, the format used for every `*_at` field.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

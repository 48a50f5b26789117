use std::fmt::{Display, Formatter};

use riskcli_core::UtcDateTime;
use serde::Serialize;
use uuid::Uuid;

/// Request identifier (UUID v4) stamped on every export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Provenance written alongside exported metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    pub request_id: RequestId,
    pub generated_at: UtcDateTime,
}

impl RunMetadata {
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new_v4(),
            generated_at: UtcDateTime::now(),
        }
    }
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_unique_hyphenated_uuids() {
        let first = RequestId::new_v4().to_string();
        let second = RequestId::new_v4().to_string();

        assert_eq!(first.len(), 36);
        assert_eq!(first.matches('-').count(), 4);
        assert_ne!(first, second);
    }
}

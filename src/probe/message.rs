//! Probe payloads and the responses they expect

use chrono::Utc;

/// Payload sent to the backend: `Time is <nanoseconds>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeMessage {
    bytes: Vec<u8>,
}

impl ProbeMessage {
    /// Message stamped with the current wall-clock time
    pub fn now() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self::at(nanos)
    }

    /// Message stamped with a fixed nanosecond value
    pub fn at(nanos: i64) -> Self {
        Self {
            bytes: format!("Time is {}", nanos).into_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `<backend_id>:<message>`, the exact bytes a correct backend returns
    pub fn expected_response(&self, backend_id: &str) -> Vec<u8> {
        let mut expected = Vec::with_capacity(backend_id.len() + 1 + self.bytes.len());
        expected.extend_from_slice(backend_id.as_bytes());
        expected.push(b':');
        expected.extend_from_slice(&self.bytes);
        expected
    }
}

impl std::fmt::Display for ProbeMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

//! Structured-document codec used by the JSON converters and by leftover
//! collection.

use std::fmt;

use crate::error::Result;

/// Encodes and decodes structured documents.
pub trait DocumentCodec: Send + Sync + fmt::Debug {
    fn encode(&self, value: &serde_json::Value) -> Result<String>;
    fn decode(&self, text: &str) -> Result<serde_json::Value>;
}

/// The default codec: compact JSON through serde_json.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeJsonCodec;

impl DocumentCodec for SerdeJsonCodec {
    fn encode(&self, value: &serde_json::Value) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode(&self, text: &str) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(text)?)
    }
}

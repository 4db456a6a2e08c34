//! Utility functions shared by the tool handlers

use std::str::FromStr;

use ethers::{types::Address, utils::to_checksum};
use serde::de::DeserializeOwned;
use serde_json::{from_value, Value};

use crate::tools::ToolError;

/// Deserialize a tool's input object into its typed form.
///
/// Models occasionally send the input as a JSON-encoded string instead of an
/// object; that form is accepted too.
pub fn parse_tool_input<T: DeserializeOwned>(tool: &str, input: &Value) -> Result<T, ToolError> {
    let value = match input {
        Value::String(raw) => serde_json::from_str(raw).map_err(|e| ToolError::InvalidInput {
            tool: tool.to_string(),
            reason: format!("input is not a JSON object: {}", e),
        })?,
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };

    from_value(value).map_err(|e| ToolError::InvalidInput {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Validate a `0x`-prefixed hex address. Mixed-case input must carry a valid
/// EIP-55 checksum.
pub fn parse_address(raw: &str) -> Result<Address, ToolError> {
    let trimmed = raw.trim();
    let invalid = || ToolError::InvalidAddress(trimmed.to_string());

    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(invalid)?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let address = Address::from_str(&format!("0x{}", hex)).map_err(|_| invalid())?;

    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower && &to_checksum(&address, None)[2..] != hex {
        return Err(invalid());
    }

    Ok(address)
}

/// EIP-55 checksummed form of an address
pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}

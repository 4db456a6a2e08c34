use serde_json::{json, Value};

use super::GetChainIdInput;
use crate::chains;

/// `get_chain_id`: numeric id for a network name, or null when unknown
pub fn get_chain_id(input: &GetChainIdInput) -> Value {
    json!(chains::chain_id_for_name(&input.chain_name))
}

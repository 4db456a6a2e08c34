//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use serde_json::{json, Value};
use tokio::sync::watch;

use wallet_chat::{
    chat::{ChatBackend, ChatError},
    relay::protocol::{Message, ModelResponse},
    wallet::{TxReceipt, TxStatus, WalletError, WalletProvider},
};

pub const ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const RECIPIENT: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

pub fn account() -> Address {
    ACCOUNT.parse().unwrap()
}

/// In-memory wallet that records what the tools asked of it
pub struct MockWallet {
    account: Mutex<Option<Address>>,
    chain: watch::Sender<Option<u64>>,
    switching: bool,
    confirm_switch: bool,
    balance: U256,
    pub switch_requests: Mutex<Vec<u64>>,
    pub sent: Mutex<Vec<(u64, Address, U256)>>,
}

impl MockWallet {
    /// Connected to `chain`, switching supported and confirmed
    pub fn connected(chain: u64) -> Self {
        Self {
            account: Mutex::new(Some(account())),
            chain: watch::channel(Some(chain)).0,
            switching: true,
            confirm_switch: true,
            balance: U256::exp10(18),
            switch_requests: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn disconnected() -> Self {
        let wallet = Self::connected(1);
        *wallet.account.lock().unwrap() = None;
        wallet.chain.send_replace(None);
        wallet
    }

    pub fn without_switching(mut self) -> Self {
        self.switching = false;
        self
    }

    /// Accepts switch requests but never reports the new chain
    pub fn ignoring_switches(mut self) -> Self {
        self.confirm_switch = false;
        self
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn connect(&self) -> Result<Address, WalletError> {
        *self.account.lock().unwrap() = Some(account());
        Ok(account())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        *self.account.lock().unwrap() = None;
        Ok(())
    }

    async fn account(&self) -> Option<Address> {
        *self.account.lock().unwrap()
    }

    async fn chain_id(&self) -> Option<u64> {
        *self.chain.borrow()
    }

    fn subscribe_chain(&self) -> watch::Receiver<Option<u64>> {
        self.chain.subscribe()
    }

    fn supports_switching(&self) -> bool {
        self.switching
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        self.switch_requests.lock().unwrap().push(chain_id);
        if self.confirm_switch {
            self.chain.send_replace(Some(chain_id));
        }
        Ok(())
    }

    async fn get_balance(&self, _chain_id: u64, _address: Address) -> Result<U256, WalletError> {
        Ok(self.balance)
    }

    async fn send_transaction(
        &self,
        chain_id: u64,
        to: Address,
        value: U256,
    ) -> Result<H256, WalletError> {
        self.sent.lock().unwrap().push((chain_id, to, value));
        Ok(H256::from_low_u64_be(0xbeef))
    }

    async fn wait_for_receipt(&self, _chain_id: u64, hash: H256) -> Result<TxReceipt, WalletError> {
        Ok(TxReceipt {
            hash,
            status: TxStatus::Success,
            block_number: Some(19_000_000),
            transaction_index: 3,
        })
    }
}

/// Backend that replays canned responses and keeps every request it saw
#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<ModelResponse, ChatError>>>,
    pub requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<Value>) -> Self {
        let responses = responses
            .into_iter()
            .map(|value| Ok(serde_json::from_value(value).unwrap()))
            .collect();
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push_error(&self, error: ChatError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn request(&self, index: usize) -> Vec<Message> {
        self.requests.lock().unwrap()[index].clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, conversation: &[Message]) -> Result<ModelResponse, ChatError> {
        self.requests.lock().unwrap().push(conversation.to_vec());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::Decode("script exhausted".into())))
    }
}

pub fn text_response(text: &str, input_tokens: u64, output_tokens: u64) -> Value {
    json!({
        "id": "msg_text",
        "model": "claude-3-sonnet-20240229",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": input_tokens, "output_tokens": output_tokens}
    })
}

pub fn tool_response(
    id: &str,
    name: &str,
    input: Value,
    input_tokens: u64,
    output_tokens: u64,
) -> Value {
    json!({
        "id": "msg_tool",
        "model": "claude-3-sonnet-20240229",
        "content": [
            {"type": "text", "text": "Let me check."},
            {"type": "tool_use", "id": id, "name": name, "input": input}
        ],
        "stop_reason": "tool_use",
        "usage": {"input_tokens": input_tokens, "output_tokens": output_tokens}
    })
}

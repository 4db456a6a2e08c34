// src/tools/dispatcher.rs

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{error, info};

use super::{address, balance, chain, manifest, transfer, ToolCall, ToolError, ToolKind};
use crate::{
    relay::protocol::{ContentBlock, ToolInvocation},
    wallet::WalletProvider,
};

/// Result of one tool invocation, correlated by the invocation id
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn into_block(self) -> ContentBlock {
        ContentBlock::ToolResult {
            tool_use_id: self.tool_use_id,
            content: self.content,
            is_error: self.is_error,
        }
    }
}

/// Executes tool calls against an explicit wallet context.
#[derive(Clone)]
pub struct ToolDispatcher {
    wallet: Arc<dyn WalletProvider>,
    switch_timeout: Duration,
}

impl ToolDispatcher {
    /// Fails if the advertised manifest names a tool without a handler.
    pub fn new(
        wallet: Arc<dyn WalletProvider>,
        switch_timeout: Duration,
    ) -> Result<Self, ToolError> {
        if let Some(orphan) = manifest()
            .into_iter()
            .find(|d| ToolKind::from_name(&d.name).is_none())
        {
            return Err(ToolError::ToolNotFound(orphan.name));
        }

        Ok(Self {
            wallet,
            switch_timeout,
        })
    }

    pub fn wallet(&self) -> &Arc<dyn WalletProvider> {
        &self.wallet
    }

    /// Run one invocation. Errors never escape; they become error-flagged results.
    pub async fn execute(&self, invocation: ToolInvocation<'_>) -> ToolResult {
        info!("Executing tool: {} ({})", invocation.name, invocation.id);

        let outcome = async {
            let call = ToolCall::parse(invocation.name, invocation.input)?;
            let value = self.run(call).await?;
            Ok::<String, ToolError>(serde_json::to_string(&value)?)
        }
        .await;

        match outcome {
            Ok(content) => ToolResult {
                tool_use_id: invocation.id.to_string(),
                content,
                is_error: false,
            },
            Err(e) => {
                error!("Tool {} failed: {}", invocation.name, e);
                ToolResult {
                    tool_use_id: invocation.id.to_string(),
                    content: e.to_string(),
                    is_error: true,
                }
            }
        }
    }

    async fn run(&self, call: ToolCall) -> Result<Value, ToolError> {
        let wallet = self.wallet.as_ref();
        match call {
            ToolCall::GetWalletAddress => Ok(address::get_wallet_address(wallet).await),
            ToolCall::GetBalance(input) => {
                let output = balance::get_balance(wallet, &input).await?;
                Ok(serde_json::to_value(output)?)
            }
            ToolCall::SendEth(input) => {
                Ok(transfer::send_eth(wallet, &input, self.switch_timeout).await)
            }
            ToolCall::GetChainId(input) => Ok(chain::get_chain_id(&input)),
        }
    }
}

//! Tests for the client tool loop and the wallet tools

mod common;

use std::sync::Arc;
use std::time::Duration;

use ethers::types::U256;
use serde_json::{json, Value};

use common::{tool_response, text_response, MockWallet, ScriptedBackend, RECIPIENT};
use wallet_chat::{
    chat::{ChatError, ChatSession},
    relay::protocol::{ContentBlock, Message, MessageContent, Role, ToolInvocation},
    tools::{ToolDispatcher, ToolResult},
    wallet::WalletProvider,
};

fn session_with(wallet: Arc<MockWallet>, backend: Arc<ScriptedBackend>) -> ChatSession {
    let wallet: Arc<dyn WalletProvider> = wallet;
    let dispatcher = ToolDispatcher::new(wallet, Duration::from_secs(2)).unwrap();
    ChatSession::new(backend, dispatcher, Some("Be brief.".into()), 8)
}

async fn run_tool(wallet: Arc<MockWallet>, name: &str, input: Value) -> ToolResult {
    let wallet: Arc<dyn WalletProvider> = wallet;
    let dispatcher = ToolDispatcher::new(wallet, Duration::from_secs(2)).unwrap();
    dispatcher
        .execute(ToolInvocation {
            id: "toolu_1",
            name,
            input: &input,
        })
        .await
}

fn send_eth_outcome(result: &ToolResult) -> Value {
    assert!(!result.is_error, "send_eth reports failures in its result value");
    serde_json::from_str(&result.content).unwrap()
}

fn tool_results(message: &Message) -> Vec<(String, String, bool)> {
    match &message.content {
        MessageContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => Some((tool_use_id.clone(), content.clone(), *is_error)),
                _ => None,
            })
            .collect(),
        MessageContent::Text(_) => Vec::new(),
    }
}

#[tokio::test]
async fn plain_reply_is_appended_to_conversation() {
    let backend = Arc::new(ScriptedBackend::new(vec![text_response("Hello!", 10, 3)]));
    let mut session = session_with(Arc::new(MockWallet::connected(1)), backend.clone());

    let outcome = session.send_message("hi").await.unwrap();

    assert_eq!(outcome.reply.as_deref(), Some("Hello!"));
    assert_eq!(outcome.rounds, 0);
    assert_eq!(
        session.conversation().messages(),
        &[Message::user("hi"), Message::assistant("Hello!")]
    );
    assert_eq!(backend.request(0), vec![Message::system("Be brief."), Message::user("hi")]);
}

#[tokio::test]
async fn tool_result_is_sent_back_correlated_by_id() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        tool_response("toolu_42", "get_wallet_address", json!({}), 20, 5),
        text_response("Your address is 0xf39F...2266.", 30, 8),
    ]));
    let mut session = session_with(Arc::new(MockWallet::connected(1)), backend.clone());

    let outcome = session.send_message("what is my address?").await.unwrap();

    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.reply.as_deref(), Some("Let me check.\n\nYour address is 0xf39F...2266."));

    let follow_up = backend.request(1);
    assert_eq!(follow_up.len(), 4);
    assert_eq!(follow_up[2].role, Role::Assistant);
    let results = tool_results(&follow_up[3]);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, "toolu_42");
    assert_eq!(results[0].1, format!("\"{}\"", common::ACCOUNT));
    assert!(!results[0].2);

    // the tool exchange is not part of the visible conversation
    assert_eq!(session.conversation().len(), 2);
}

#[tokio::test]
async fn unknown_tool_yields_error_result_and_turn_continues() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        tool_response("toolu_7", "drain_wallet", json!({}), 1, 1),
        text_response("I can't do that.", 1, 1),
    ]));
    let mut session = session_with(Arc::new(MockWallet::connected(1)), backend.clone());

    let outcome = session.send_message("drain it").await.unwrap();

    assert_eq!(outcome.tool_results.len(), 1);
    let result = &outcome.tool_results[0];
    assert_eq!(result.tool_use_id, "toolu_7");
    assert!(result.is_error);
    assert!(result.content.contains("drain_wallet"));
    assert!(outcome.reply.unwrap().contains("can't"));
}

#[tokio::test]
async fn non_positive_amounts_never_reach_the_wallet() {
    for value in ["0", "-1"] {
        let wallet = Arc::new(MockWallet::connected(1));
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_response("toolu_1", "send_eth", json!({"to": RECIPIENT, "value": value}), 1, 1),
            text_response("That amount is invalid.", 1, 1),
        ]));
        let mut session = session_with(wallet.clone(), backend);

        let outcome = session.send_message("send it").await.unwrap();

        let content: Value = serde_json::from_str(&outcome.tool_results[0].content).unwrap();
        assert_eq!(content["success"], false, "value {}", value);
        assert_eq!(wallet.sent_count(), 0);
    }
}

#[tokio::test]
async fn send_eth_switches_network_before_submitting() {
    let wallet = Arc::new(MockWallet::connected(1));
    let backend = Arc::new(ScriptedBackend::new(vec![
        tool_response(
            "toolu_1",
            "send_eth",
            json!({"to": RECIPIENT, "value": "0.01", "chain_name": "Polygon"}),
            1,
            1,
        ),
        text_response("Sent.", 1, 1),
    ]));
    let mut session = session_with(wallet.clone(), backend);

    let outcome = session.send_message("send 0.01 on polygon").await.unwrap();

    let content: Value = serde_json::from_str(&outcome.tool_results[0].content).unwrap();
    assert_eq!(content["success"], true);
    assert_eq!(content["result"]["status"], "success");
    assert_eq!(content["result"]["blockNumber"], "19000000");

    assert_eq!(*wallet.switch_requests.lock().unwrap(), vec![137]);
    let sent = wallet.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 137);
    assert_eq!(sent[0].2, U256::exp10(16));
}

#[tokio::test]
async fn unsupported_switching_is_reported() {
    let wallet = Arc::new(MockWallet::connected(1).without_switching());
    let backend = Arc::new(ScriptedBackend::new(vec![
        tool_response(
            "toolu_1",
            "send_eth",
            json!({"to": RECIPIENT, "value": "1", "chain_id": 10}),
            1,
            1,
        ),
        text_response("Could not switch.", 1, 1),
    ]));
    let mut session = session_with(wallet.clone(), backend);

    let outcome = session.send_message("send 1 on optimism").await.unwrap();

    let content: Value = serde_json::from_str(&outcome.tool_results[0].content).unwrap();
    assert_eq!(content, json!({"success": false, "result": "Network switching not supported"}));
    assert_eq!(wallet.sent_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_switch_times_out_without_sending() {
    let wallet = Arc::new(MockWallet::connected(1).ignoring_switches());
    let backend = Arc::new(ScriptedBackend::new(vec![
        tool_response(
            "toolu_1",
            "send_eth",
            json!({"to": RECIPIENT, "value": 0.5, "chain_name": "base"}),
            1,
            1,
        ),
        text_response("The switch timed out.", 1, 1),
    ]));
    let mut session = session_with(wallet.clone(), backend);

    let outcome = session.send_message("send on base").await.unwrap();

    let content: Value = serde_json::from_str(&outcome.tool_results[0].content).unwrap();
    assert_eq!(content["success"], false);
    assert_eq!(content["result"], "Timed out waiting for network switch to chain 8453");
    assert_eq!(*wallet.switch_requests.lock().unwrap(), vec![8453]);
    assert_eq!(wallet.sent_count(), 0);
}

#[tokio::test]
async fn get_balance_without_wallet_is_an_error_result() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        tool_response("toolu_1", "get_balance", json!({"chain_id": 1}), 1, 1),
        text_response("Connect a wallet first.", 1, 1),
    ]));
    let mut session = session_with(Arc::new(MockWallet::disconnected()), backend);

    let outcome = session.send_message("balance?").await.unwrap();

    let result = &outcome.tool_results[0];
    assert!(result.is_error);
    assert_eq!(result.content, "No address provided and no wallet connected");
}

#[tokio::test]
async fn get_balance_reports_wei_as_decimal_string() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        tool_response("toolu_1", "get_balance", json!({}), 1, 1),
        text_response("You have 1 ETH.", 1, 1),
    ]));
    let mut session = session_with(Arc::new(MockWallet::connected(1)), backend);

    let outcome = session.send_message("balance?").await.unwrap();

    let content: Value = serde_json::from_str(&outcome.tool_results[0].content).unwrap();
    assert_eq!(content["wei"], "1000000000000000000");
    assert_eq!(content["chain_id"], 1);
    assert_eq!(content["symbol"], "ETH");
    assert_eq!(content["address"], common::ACCOUNT);
}

#[tokio::test]
async fn get_chain_id_is_case_insensitive() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        json!({
            "content": [
                {
                    "type": "tool_use",
                    "id": "a",
                    "name": "get_chain_id",
                    "input": {"chain_name": "Ethereum"}
                },
                {
                    "type": "tool_use",
                    "id": "b",
                    "name": "get_chain_id",
                    "input": {"chain_name": "ethereum"}
                },
                {
                    "type": "tool_use",
                    "id": "c",
                    "name": "get_chain_id",
                    "input": {"chain_name": "not-a-chain"}
                }
            ]
        }),
        text_response("Done.", 1, 1),
    ]));
    let mut session = session_with(Arc::new(MockWallet::connected(1)), backend);

    let outcome = session.send_message("chain ids").await.unwrap();

    let contents: Vec<&str> = outcome.tool_results.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["1", "1", "null"]);
}

#[tokio::test]
async fn usage_accumulates_across_follow_ups() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        tool_response("toolu_1", "get_wallet_address", json!({}), 100, 20),
        text_response("Done.", 150, 10),
        text_response("Anything else?", 40, 5),
    ]));
    let mut session = session_with(Arc::new(MockWallet::connected(1)), backend);

    session.send_message("address?").await.unwrap();
    session.send_message("thanks").await.unwrap();

    let usage = session.usage();
    assert_eq!(usage.input_tokens, 290);
    assert_eq!(usage.output_tokens, 35);
    assert_eq!(usage.requests, 3);
}

#[tokio::test]
async fn relay_failure_keeps_user_message_and_merges_on_resend() {
    let backend = Arc::new(ScriptedBackend::default());
    backend.push_error(ChatError::Status {
        status: 500,
        details: "upstream down".into(),
    });
    let mut session = session_with(Arc::new(MockWallet::connected(1)), backend.clone());

    let err = session.send_message("first").await.unwrap_err();
    assert!(matches!(err, ChatError::Status { status: 500, .. }));
    assert_eq!(session.conversation().messages(), &[Message::user("first")]);

    // script is exhausted now; only the request shape matters
    let _ = session.send_message("second").await;
    assert_eq!(
        backend.request(1),
        vec![Message::system("Be brief."), Message::user("first\nsecond")]
    );
}

#[tokio::test]
async fn tool_rounds_are_bounded() {
    let responses = (0..3)
        .map(|i| tool_response(&format!("toolu_{}", i), "get_wallet_address", json!({}), 1, 1))
        .collect();
    let backend = Arc::new(ScriptedBackend::new(responses));
    let wallet: Arc<dyn WalletProvider> = Arc::new(MockWallet::connected(1));
    let dispatcher = ToolDispatcher::new(wallet, Duration::from_secs(1)).unwrap();
    let mut session = ChatSession::new(backend.clone(), dispatcher, None, 2);

    let outcome = session.send_message("loop forever").await.unwrap();

    assert_eq!(outcome.rounds, 2);
    assert_eq!(backend.request_count(), 3);
}

#[tokio::test]
async fn reset_clears_conversation_and_usage() {
    let backend = Arc::new(ScriptedBackend::new(vec![text_response("Hi.", 5, 5)]));
    let mut session = session_with(Arc::new(MockWallet::connected(1)), backend);

    session.send_message("hello").await.unwrap();
    session.reset();

    assert!(session.conversation().is_empty());
    assert_eq!(session.usage().requests, 0);
    assert_eq!(session.conversation().system_prompt(), Some("Be brief."));
}

#[tokio::test]
async fn get_balance_without_any_chain_fails() {
    let result = run_tool(
        Arc::new(MockWallet::disconnected()),
        "get_balance",
        json!({"address": RECIPIENT}),
    )
    .await;

    assert!(result.is_error);
    assert_eq!(result.content, "No chain specified and no active chain");
}

#[tokio::test]
async fn get_balance_rejects_malformed_address() {
    let result = run_tool(
        Arc::new(MockWallet::connected(1)),
        "get_balance",
        json!({"address": "0x1234", "chain_id": 1}),
    )
    .await;

    assert!(result.is_error);
    assert_eq!(result.content, "Invalid address: 0x1234");
}

#[tokio::test]
async fn get_balance_rejects_unknown_chain_name() {
    let result = run_tool(
        Arc::new(MockWallet::connected(1)),
        "get_balance",
        json!({"chain_name": "narnia"}),
    )
    .await;

    assert!(result.is_error);
    assert_eq!(result.content, "Unsupported chain: narnia");
}

#[tokio::test]
async fn chain_name_wins_over_chain_id_and_chain_id_over_active_chain() {
    let wallet = Arc::new(MockWallet::connected(1));

    let by_name = run_tool(
        wallet.clone(),
        "get_balance",
        json!({"chain_name": "polygon", "chain_id": 10}),
    )
    .await;
    let by_id = run_tool(wallet.clone(), "get_balance", json!({"chain_id": 10})).await;
    let by_wallet = run_tool(wallet, "get_balance", json!({})).await;

    let chain_of = |result: &ToolResult| {
        assert!(!result.is_error, "{}", result.content);
        serde_json::from_str::<Value>(&result.content).unwrap()["chain_id"].clone()
    };
    assert_eq!(chain_of(&by_name), 137);
    assert_eq!(chain_of(&by_id), 10);
    assert_eq!(chain_of(&by_wallet), 1);
}

#[tokio::test]
async fn send_eth_chain_name_wins_over_chain_id() {
    let wallet = Arc::new(MockWallet::connected(137));

    let result = run_tool(
        wallet.clone(),
        "send_eth",
        json!({"to": RECIPIENT, "value": "1", "chain_name": "polygon", "chain_id": 10}),
    )
    .await;

    assert_eq!(send_eth_outcome(&result)["success"], true);
    assert!(wallet.switch_requests.lock().unwrap().is_empty());
    assert_eq!(wallet.sent.lock().unwrap()[0].0, 137);
}

#[tokio::test]
async fn send_eth_rejects_unknown_chain_name() {
    let wallet = Arc::new(MockWallet::connected(1));

    let result = run_tool(
        wallet.clone(),
        "send_eth",
        json!({"to": RECIPIENT, "value": "1", "chain_name": "narnia"}),
    )
    .await;

    assert_eq!(
        send_eth_outcome(&result),
        json!({"success": false, "result": "Unsupported chain: narnia"})
    );
    assert_eq!(wallet.sent_count(), 0);
}

#[tokio::test]
async fn send_eth_requires_a_recipient() {
    let wallet = Arc::new(MockWallet::connected(1));

    let result = run_tool(wallet.clone(), "send_eth", json!({"value": "1"})).await;

    assert_eq!(
        send_eth_outcome(&result),
        json!({
            "success": false,
            "result": "Recipient address for ETH transfer is undefined or empty"
        })
    );
    assert_eq!(wallet.sent_count(), 0);
}

#[tokio::test]
async fn send_eth_rejects_invalid_recipient() {
    let wallet = Arc::new(MockWallet::connected(1));

    let result = run_tool(
        wallet.clone(),
        "send_eth",
        json!({"to": "0x123", "value": "1"}),
    )
    .await;

    assert_eq!(
        send_eth_outcome(&result),
        json!({"success": false, "result": "Invalid recipient address: 0x123"})
    );
    assert_eq!(wallet.sent_count(), 0);
}

#[tokio::test]
async fn send_eth_requires_a_connected_wallet() {
    let wallet = Arc::new(MockWallet::disconnected());

    let result = run_tool(
        wallet.clone(),
        "send_eth",
        json!({"to": RECIPIENT, "value": "1", "chain_id": 1}),
    )
    .await;

    assert_eq!(
        send_eth_outcome(&result),
        json!({"success": false, "result": "Wallet is not connected"})
    );
    assert_eq!(wallet.sent_count(), 0);
}

#[tokio::test]
async fn send_eth_accepts_tiny_numeric_amounts() {
    let wallet = Arc::new(MockWallet::connected(1));

    let result = run_tool(
        wallet.clone(),
        "send_eth",
        json!({"to": RECIPIENT, "value": 0.0000005}),
    )
    .await;

    assert_eq!(send_eth_outcome(&result)["success"], true);
    assert_eq!(wallet.sent.lock().unwrap()[0].2, U256::from(500_000_000_000u64));
}

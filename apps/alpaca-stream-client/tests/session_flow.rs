//! Stream Session Integration Tests
//!
//! Drives a `StreamClient` end to end over a fake transport: handshake,
//! subscription restore, record dispatch and shutdown.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use alpaca_stream_client::{ConnectionState, StreamClient, StreamError, SubscriptionType};
use common::{FakeConnector, config, wait_until};
use parking_lot::Mutex;
use serde_json::json;
use tokio_util::sync::CancellationToken;

const AUTHENTICATED: &str = r#"[{"T":"success","msg":"connected"},{"T":"success","msg":"authenticated"}]"#;

#[tokio::test]
async fn handshake_sends_auth_then_restores_subscriptions() {
    let connector = FakeConnector::default();
    let client = StreamClient::with_connector(config(), connector.clone());
    let handle = client.handle();

    handle.subscribe_for_trades(["AAPL"]).unwrap();
    handle.subscribe_for_quotes(["FB"]).unwrap();
    handle.connect().unwrap();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(client.run(cancel.clone()));

    wait_until(|| connector.opens() == 1).await;
    assert!(connector.sent().is_empty());

    connector.sink(0).open();
    wait_until(|| connector.sent().len() == 1).await;
    assert_eq!(
        connector.sent()[0],
        json!({"action":"auth","key":"key","secret":"secret"})
    );

    connector.sink(0).message(AUTHENTICATED);
    wait_until(|| connector.sent().len() == 2).await;
    assert_eq!(
        connector.sent()[1],
        json!({"action":"subscribe","trades":["AAPL"],"quotes":["FB"],"bars":[]})
    );
    assert_eq!(handle.state(), ConnectionState::Authenticated);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn records_reach_their_observers_in_order() {
    let connector = FakeConnector::default();
    let mut client = StreamClient::with_connector(config(), connector.clone());

    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let trades = Arc::clone(&seen);
        let quotes = Arc::clone(&seen);
        let bars = Arc::clone(&seen);
        client
            .on_trade(move |t| trades.lock().push(format!("t:{}", t.symbol)))
            .on_quote(move |q| quotes.lock().push(format!("q:{}", q.symbol)))
            .on_bar(move |b| bars.lock().push(format!("b:{}", b.symbol)));
    }

    let handle = client.handle();
    handle.connect().unwrap();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(client.run(cancel.clone()));

    wait_until(|| connector.opens() == 1).await;
    let sink = connector.sink(0);
    sink.open();
    sink.message(AUTHENTICATED);
    sink.message(
        r#"[
            {"T":"q","S":"AMD","bx":"U","bp":87.66,"bs":1,"ax":"Q","ap":87.68,"as":4,"t":"2021-02-22T15:51:45.335689322Z","c":["R"],"z":"C"},
            {"T":"t","i":96921,"S":"AAPL","x":"D","p":126.55,"s":1,"t":"2021-02-22T15:51:44.208Z","c":["@","I"],"z":"C"},
            {"T":"b","S":"SPY","o":388.985,"h":389.13,"l":388.975,"c":389.12,"v":49378,"n":461,"vw":389.062639,"t":"2021-02-22T19:15:00Z"}
        ]"#,
    );

    wait_until(|| seen.lock().len() == 3).await;
    assert_eq!(
        *seen.lock(),
        vec!["q:AMD".to_string(), "t:AAPL".to_string(), "b:SPY".to_string()]
    );

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn errors_surface_without_dropping_the_connection() {
    let connector = FakeConnector::default();
    let mut client = StreamClient::with_connector(config(), connector.clone());

    let errors = Arc::new(Mutex::new(Vec::new()));
    {
        let errors = Arc::clone(&errors);
        client.on_error(move |e| errors.lock().push(e.clone()));
    }

    let handle = client.handle();
    handle.connect().unwrap();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(client.run(cancel.clone()));

    wait_until(|| connector.opens() == 1).await;
    let sink = connector.sink(0);
    sink.open();
    sink.message(AUTHENTICATED);
    sink.message(r#"[{"T":"error","code":405,"msg":"symbol limit exceeded"}]"#);
    sink.message(r#"[{"T":"x"}]"#);

    wait_until(|| errors.lock().len() == 2).await;
    assert_eq!(
        *errors.lock(),
        vec![
            StreamError::Server {
                code: 405,
                reason: "symbol limit exceeded".to_string()
            },
            StreamError::UnexpectedMessage {
                message_type: "x".to_string()
            },
        ]
    );
    assert_eq!(handle.state(), ConnectionState::Authenticated);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn confirmation_overwrites_tracked_subscriptions() {
    let connector = FakeConnector::default();
    let client = StreamClient::with_connector(config(), connector.clone());
    let handle = client.handle();

    handle.subscribe_for_trades(["AAPL", "MSFT"]).unwrap();
    handle.subscribe_for_bars(["SPY"]).unwrap();
    handle.connect().unwrap();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(client.run(cancel.clone()));

    wait_until(|| connector.opens() == 1).await;
    let sink = connector.sink(0);
    sink.open();
    sink.message(AUTHENTICATED);
    sink.message(r#"[{"T":"subscription","trades":["X"],"quotes":[],"bars":[]}]"#);

    wait_until(|| handle.subscriptions().trades() == ["X"]).await;
    let subscriptions = handle.subscriptions();
    assert!(subscriptions.symbols(SubscriptionType::Bars).is_empty());
    assert_eq!(subscriptions.len(), 1);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn partial_messages_after_authentication() {
    let connector = FakeConnector::default();
    let client = StreamClient::with_connector(config(), connector.clone());
    let handle = client.handle();
    handle.connect().unwrap();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(client.run(cancel.clone()));

    wait_until(|| connector.opens() == 1).await;
    let sink = connector.sink(0);
    sink.open();
    sink.message(AUTHENTICATED);
    wait_until(|| handle.state() == ConnectionState::Authenticated).await;

    handle.subscribe_for_trades(["AAPL"]).unwrap();
    handle.subscribe_for_quotes(["FB"]).unwrap();
    handle.unsubscribe_from_trades(["AAPL"]).unwrap();

    wait_until(|| connector.sent().len() == 4).await;
    let sent = connector.sent();
    assert_eq!(
        sent[1..],
        [
            json!({"action":"subscribe","trades":["AAPL"],"quotes":[],"bars":[]}),
            json!({"action":"subscribe","trades":[],"quotes":["FB"],"bars":[]}),
            json!({"action":"unsubscribe","trades":["AAPL"],"quotes":[],"bars":[]}),
        ]
    );
    assert!(handle.subscriptions().contains(SubscriptionType::Trades, "AAPL"));

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn cancellation_disconnects_and_stops() {
    let connector = FakeConnector::default();
    let client = StreamClient::with_connector(config(), connector.clone());
    let handle = client.handle();
    handle.connect().unwrap();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(client.run(cancel.clone()));

    wait_until(|| connector.opens() == 1).await;
    connector.sink(0).open();
    wait_until(|| handle.state() == ConnectionState::Authenticating).await;

    cancel.cancel();
    task.await.unwrap();

    assert_eq!(connector.wire.lock().closed, 1);
    assert_eq!(handle.state(), ConnectionState::Disconnected);
    assert!(handle.is_stopped());
}

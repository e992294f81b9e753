//! End-to-end tests for `ThrowdownClient`.
//!
//! Most tests drive the client over an in-memory connection and play the
//! server by hand with raw JSON frames. One test goes over a real
//! WebSocket.

use std::sync::Mutex;
use std::time::Duration;

use throwdown::prelude::*;
use throwdown::protocol::{ClientMessage, Codec, JsonCodec};
use throwdown::transport::{Connection, MemoryConnection, Transport, TransportError};
use throwdown::ServerConnection;

// =========================================================================
// Helpers
// =========================================================================

/// Generous: most waits finish in microseconds, but the countdown test
/// runs on a paused clock where this is virtual time.
const WAIT: Duration = Duration::from_secs(60);

fn spawn_client(config: SessionConfig) -> (ThrowdownClient, MemoryConnection) {
    let (client_end, server_end) = MemoryConnection::pair();
    let connection = ServerConnection::attach(client_end, JsonCodec);
    (ThrowdownClient::spawn(connection, config), server_end)
}

async fn push(server: &MemoryConnection, json: &str) {
    server
        .send(json.as_bytes().to_vec())
        .await
        .expect("client end should be open");
}

/// The next message the client sent, or `None` if it closed.
async fn next_sent(server: &MemoryConnection) -> Option<ClientMessage> {
    let frame = tokio::time::timeout(WAIT, server.recv())
        .await
        .expect("timed out waiting for client frame")
        .expect("recv failed")?;
    Some(JsonCodec.decode(&frame).expect("client sent invalid JSON"))
}

async fn wait_for<F>(client: &ThrowdownClient, mut predicate: F) -> SessionState
where
    F: FnMut(&SessionState) -> bool,
{
    let mut updates = client.subscribe();
    let state = tokio::time::timeout(WAIT, updates.wait_for(|s| predicate(s)))
        .await
        .expect("timed out waiting for state")
        .expect("driver stopped");
    state.clone()
}

/// Returns once the driver and pump have nothing left to do.
///
/// Only meaningful on a paused clock, where time advances only when every
/// task is idle.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// A ranked client that has been matched against bob.
async fn matched() -> (ThrowdownClient, MemoryConnection) {
    let (client, server) = spawn_client(SessionConfig::default());
    client.join_queue(true);
    assert_eq!(
        next_sent(&server).await,
        Some(ClientMessage::JoinQueue { ranked: true })
    );
    push(&server, r#"{"type":"queued"}"#).await;
    push(
        &server,
        r#"{"type":"match_found","opponent":{"username":"bob","elo":1200},"session_id":"m-7"}"#,
    )
    .await;
    wait_for(&client, |s| s.phase == Phase::Playing).await;
    (client, server)
}

// =========================================================================
// Scenarios
// =========================================================================

#[tokio::test]
async fn test_join_queue_and_match_found() {
    let (client, _server) = matched().await;

    let state = client.state();
    assert_eq!(state.current_round, 1);
    assert_eq!(state.score, Score::default());
    assert_eq!(state.ranked, Some(true));
    assert_eq!(state.session_id.as_deref(), Some("m-7"));
    let opponent = state.opponent.unwrap();
    assert_eq!(opponent.username, "bob");
    assert_eq!(opponent.rating, 1200);
}

#[tokio::test]
async fn test_choice_is_sent_once_per_round() {
    let (client, server) = matched().await;
    push(&server, r#"{"type":"round_start","round":1,"timeout_secs":15}"#).await;
    wait_for(&client, |s| s.current_round == 1).await;

    client.submit_choice(Choice::Rock);
    client.submit_choice(Choice::Paper);
    assert_eq!(
        next_sent(&server).await,
        Some(ClientMessage::Choice { choice: Choice::Rock })
    );

    push(
        &server,
        r#"{"type":"round_result","round":1,"your_choice":"rock","opponent_choice":"scissors","winner":"you","your_score":1,"opponent_score":0}"#,
    )
    .await;
    push(&server, r#"{"type":"round_start","round":2,"timeout_secs":15}"#).await;
    wait_for(&client, |s| s.current_round == 2).await;

    client.submit_choice(Choice::Scissors);
    // The duplicate from round 1 never went out, so this is the next frame.
    assert_eq!(
        next_sent(&server).await,
        Some(ClientMessage::Choice {
            choice: Choice::Scissors
        })
    );
}

#[tokio::test]
async fn test_round_result_and_replacement() {
    let (client, server) = matched().await;
    push(&server, r#"{"type":"round_start","round":2,"timeout_secs":15}"#).await;
    push(
        &server,
        r#"{"type":"round_result","round":2,"your_choice":"rock","opponent_choice":"scissors","winner":"you","your_score":2,"opponent_score":1}"#,
    )
    .await;

    let state = wait_for(&client, |s| s.phase == Phase::RoundResolved).await;
    assert_eq!(state.score, Score { mine: 2, opponent: 1 });
    assert_eq!(state.history_entry(2).unwrap().outcome, RoundWinner::You);

    push(
        &server,
        r#"{"type":"round_result","round":2,"your_choice":"rock","opponent_choice":"paper","winner":"opponent","your_score":1,"opponent_score":2}"#,
    )
    .await;

    let state = wait_for(&client, |s| s.score.opponent == 2).await;
    assert_eq!(state.move_history.len(), 1);
    let entry = state.history_entry(2).unwrap();
    assert_eq!(entry.opponent_choice, Reveal::Paper);
    assert_eq!(entry.outcome, RoundWinner::Opponent);
}

#[tokio::test(start_paused = true)]
async fn test_opponent_disconnect_fails_until_reset() {
    let (client, server) = matched().await;

    push(&server, r#"{"type":"opponent_disconnected"}"#).await;
    let state = wait_for(&client, |s| s.is_failed()).await;
    assert_eq!(state.failure.as_deref(), Some("Opponent disconnected"));

    push(&server, r#"{"type":"round_start","round":2,"timeout_secs":15}"#).await;
    client.submit_choice(Choice::Rock);
    settle().await;

    assert_eq!(client.state(), state);
    assert_eq!(client.state().current_round, 1);
    assert_eq!(client.state().my_pending_choice, None);

    client.reset();
    let state = wait_for(&client, |s| s.phase == Phase::Idle).await;
    assert!(state.failure.is_none());
    assert!(state.opponent.is_none());

    client.join_queue(false);
    // Nothing was sent while failed, so the join is the next frame.
    assert_eq!(
        next_sent(&server).await,
        Some(ClientMessage::JoinQueue { ranked: false })
    );
}

#[tokio::test]
async fn test_drawn_match_completes_without_rating() {
    let (client, server) = matched().await;
    push(
        &server,
        r#"{"type":"match_complete","result":"draw","your_score":1,"opponent_score":1,"elo_change":null,"new_elo":null}"#,
    )
    .await;

    let state = wait_for(&client, |s| s.phase == Phase::MatchComplete).await;
    let outcome = state.match_outcome.unwrap();
    assert_eq!(outcome.result, MatchResult::Draw);
    assert_eq!(outcome.elo_change, None);
    assert_eq!(outcome.new_elo, None);
}

#[tokio::test]
async fn test_server_error_is_shown_as_failure() {
    let (client, server) = spawn_client(SessionConfig::default());
    push(&server, r#"{"type":"error","message":"Already in queue"}"#).await;
    let state = wait_for(&client, |s| s.is_failed()).await;
    assert_eq!(state.failure.as_deref(), Some("Already in queue"));
}

// =========================================================================
// Countdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_runs_down_without_resolving_round() {
    let (client, server) = matched().await;
    push(&server, r#"{"type":"round_start","round":1,"timeout_secs":3}"#).await;

    let state = wait_for(&client, |s| s.seconds_remaining == 0).await;
    assert_eq!(state.phase, Phase::Playing);
    assert!(state.last_round_outcome.is_none());

    // Long after zero, nothing else happens on its own.
    tokio::time::sleep(Duration::from_secs(30)).await;
    let later = client.state();
    assert_eq!(later.phase, Phase::Playing);
    assert_eq!(later.seconds_remaining, 0);
    assert!(later.move_history.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_countdown_stops_when_round_resolves() {
    let (client, server) = matched().await;
    push(&server, r#"{"type":"round_start","round":1,"timeout_secs":10}"#).await;
    wait_for(&client, |s| s.seconds_remaining <= 8).await;

    push(
        &server,
        r#"{"type":"round_result","round":1,"your_choice":"none","opponent_choice":"rock","winner":"opponent","your_score":0,"opponent_score":1}"#,
    )
    .await;
    let resolved = wait_for(&client, |s| s.phase == Phase::RoundResolved).await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(client.state().seconds_remaining, resolved.seconds_remaining);
    assert_eq!(
        resolved.history_entry(1).unwrap().my_choice,
        Reveal::None
    );
}

// =========================================================================
// Connection lifecycle
// =========================================================================

#[tokio::test]
async fn test_shutdown_closes_connection_and_ignores_later_intents() {
    let (client, server) = spawn_client(SessionConfig::default());
    assert!(client.connected());

    client.shutdown();
    client.shutdown();

    let mut connected = client.watch_connected();
    tokio::time::timeout(WAIT, connected.wait_for(|c| !*c))
        .await
        .expect("timed out")
        .expect("sender dropped");
    assert_eq!(next_sent(&server).await, None);

    client.join_queue(true);
    assert_eq!(client.state().phase, Phase::Idle);
}

#[tokio::test]
async fn test_server_close_keeps_state() {
    let (client, server) = matched().await;

    server.close().await.unwrap();

    let mut connected = client.watch_connected();
    tokio::time::timeout(WAIT, connected.wait_for(|c| !*c))
        .await
        .expect("timed out")
        .expect("sender dropped");
    assert!(!client.connected());
    assert_eq!(client.state().phase, Phase::Playing);
}

#[tokio::test]
async fn test_dropping_client_closes_connection() {
    let (client, server) = spawn_client(SessionConfig::default());
    drop(client);
    assert_eq!(next_sent(&server).await, None);
}

// =========================================================================
// Connecting with an identity
// =========================================================================

/// Hands out one pre-made in-memory connection and records the URL.
struct MemoryTransport {
    connection: Mutex<Option<MemoryConnection>>,
    dialed: Mutex<Option<String>>,
}

impl MemoryTransport {
    fn new() -> (Self, MemoryConnection) {
        let (client_end, server_end) = MemoryConnection::pair();
        let transport = Self {
            connection: Mutex::new(Some(client_end)),
            dialed: Mutex::new(None),
        };
        (transport, server_end)
    }

    fn dialed(&self) -> Option<String> {
        self.dialed.lock().unwrap().clone()
    }
}

impl Transport for MemoryTransport {
    type Connection = MemoryConnection;
    type Error = TransportError;

    async fn connect(&self, url: &str) -> Result<MemoryConnection, TransportError> {
        *self.dialed.lock().unwrap() = Some(url.to_owned());
        let connection = self.connection.lock().unwrap().take();
        connection.ok_or_else(|| TransportError::ConnectionClosed("already used".into()))
    }
}

#[tokio::test]
async fn test_pending_identity_refuses_to_connect() {
    let (transport, _server) = MemoryTransport::new();
    let result = ThrowdownClient::connect_with(
        &transport,
        &ClientConfig::new("ws://game.test"),
        &StaticIdentity(Identity::Pending),
    )
    .await;

    assert!(matches!(
        result,
        Err(ThrowdownError::Session(throwdown::session::SessionError::IdentityPending))
    ));
    assert_eq!(transport.dialed(), None);
}

#[tokio::test]
async fn test_guest_refused_when_not_allowed() {
    let (transport, _server) = MemoryTransport::new();
    let config = ClientConfig::new("ws://game.test").allow_guest(false);
    let result =
        ThrowdownClient::connect_with(&transport, &config, &StaticIdentity::guest()).await;

    assert!(matches!(
        result,
        Err(ThrowdownError::Transport(TransportError::IdentityRequired))
    ));
    assert_eq!(transport.dialed(), None);
}

#[tokio::test]
async fn test_token_identity_dials_with_token() {
    let (transport, server) = MemoryTransport::new();
    let client = ThrowdownClient::connect_with(
        &transport,
        &ClientConfig::new("ws://game.test"),
        &StaticIdentity::token("jwt.abc"),
    )
    .await
    .expect("should connect");

    assert_eq!(
        transport.dialed().as_deref(),
        Some("ws://game.test/ws?token=jwt.abc")
    );
    client.join_queue(true);
    assert_eq!(
        next_sent(&server).await,
        Some(ClientMessage::JoinQueue { ranked: true })
    );
}

#[tokio::test]
async fn test_guest_dials_without_token_and_queues_casual() {
    let (transport, server) = MemoryTransport::new();
    let client = ThrowdownClient::connect_with(
        &transport,
        &ClientConfig::new("ws://game.test"),
        &StaticIdentity::guest(),
    )
    .await
    .expect("should connect");

    assert_eq!(transport.dialed().as_deref(), Some("ws://game.test/ws"));
    client.join_queue(true);
    assert_eq!(
        next_sent(&server).await,
        Some(ClientMessage::JoinQueue { ranked: false })
    );
}

// =========================================================================
// Real WebSocket
// =========================================================================

#[tokio::test]
async fn test_match_found_over_websocket() {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let base = format!("ws://{}", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("should accept");
        let mut ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("handshake should succeed");

        let join = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break text,
                Some(Ok(_)) => continue,
                other => panic!("expected join_queue, got {other:?}"),
            }
        };
        let join: serde_json::Value = serde_json::from_str(join.as_str()).unwrap();
        assert_eq!(join, serde_json::json!({"type": "join_queue", "ranked": false}));

        ws.send(Message::Text(r#"{"type":"queued"}"#.into())).await.unwrap();
        ws.send(Message::Text(
            r#"{"type":"match_found","opponent":{"username":"bob","elo":1200}}"#.into(),
        ))
        .await
        .unwrap();
        ws
    });

    let client = ThrowdownClient::connect(&ClientConfig::new(base), &StaticIdentity::guest())
        .await
        .expect("should connect");
    client.join_queue(false);

    let state = wait_for(&client, |s| s.phase == Phase::Playing).await;
    assert_eq!(state.opponent.unwrap().username, "bob");
    assert!(client.connected());

    let _server_ws = server.await.unwrap();
}

//! Integration tests for the WebSocket client transport.
//!
//! These tests spin up a real `tokio-tungstenite` server on a random port
//! and connect a `ConnectionHandle` to it, so frames actually cross a TCP
//! socket.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use throwdown_protocol::{Choice, ClientMessage, JsonCodec, ServerMessage};
    use throwdown_transport::{
        ConnectParams, ConnectionHandle, TransportError, WebSocketTransport,
    };
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::handshake::server::{
        ErrorResponse, Request, Response,
    };
    use tokio_tungstenite::tungstenite::Message;

    type Handle = ConnectionHandle<ServerMessage, ClientMessage>;
    type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    /// Binds a listener on a random port and returns it with its
    /// `ws://` base URL.
    async fn bind() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("should bind");
        let addr = listener.local_addr().unwrap();
        (listener, format!("ws://{addr}"))
    }

    /// Accepts one WebSocket client, recording the request URI.
    async fn accept(listener: &TcpListener, uri: Arc<Mutex<String>>) -> ServerWs {
        let (stream, _) = listener.accept().await.expect("should accept");
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            *uri.lock().unwrap() = req.uri().to_string();
            Ok(resp)
        };
        tokio_tungstenite::accept_hdr_async(stream, callback)
            .await
            .expect("handshake should succeed")
    }

    async fn within<T>(fut: impl std::future::Future<Output = T>) -> T {
        tokio::time::timeout(Duration::from_secs(5), fut)
            .await
            .expect("timed out")
    }

    #[tokio::test]
    async fn test_token_is_sent_as_query_parameter() {
        let (listener, base) = bind().await;
        let uri = Arc::new(Mutex::new(String::new()));

        let server_uri = Arc::clone(&uri);
        let server = tokio::spawn(async move { accept(&listener, server_uri).await });

        let params = ConnectParams::authenticated(base, "tok123");
        let handle = Handle::open(&WebSocketTransport, &params, JsonCodec)
            .await
            .expect("should connect");
        let _server_ws = server.await.unwrap();

        assert!(handle.is_connected());
        assert_eq!(*uri.lock().unwrap(), "/ws?token=tok123");
    }

    #[tokio::test]
    async fn test_guest_connects_without_token() {
        let (listener, base) = bind().await;
        let uri = Arc::new(Mutex::new(String::new()));

        let server_uri = Arc::clone(&uri);
        let server = tokio::spawn(async move { accept(&listener, server_uri).await });

        let handle = Handle::open(&WebSocketTransport, &ConnectParams::guest(base), JsonCodec)
            .await
            .expect("should connect");
        let _server_ws = server.await.unwrap();

        assert!(handle.is_connected());
        assert_eq!(*uri.lock().unwrap(), "/ws");
    }

    #[tokio::test]
    async fn test_messages_flow_and_garbage_is_swallowed() {
        let (listener, base) = bind().await;
        let uri = Arc::new(Mutex::new(String::new()));
        let server = tokio::spawn(async move { accept(&listener, uri).await });

        let handle = Handle::open(&WebSocketTransport, &ConnectParams::guest(base), JsonCodec)
            .await
            .expect("should connect");
        let mut server_ws = server.await.unwrap();

        // Two listeners, both see everything.
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let _a = handle.add_listener(move |m: &ServerMessage| {
            let _ = tx_a.send(m.clone());
        });
        let _b = handle.add_listener(move |m: &ServerMessage| {
            let _ = tx_b.send(m.clone());
        });

        // --- Client sends, server receives a text frame ---
        handle.send(&ClientMessage::Choice { choice: Choice::Scissors });
        let frame = within(server_ws.next()).await.unwrap().unwrap();
        assert!(frame.is_text(), "server expects JSON text frames");
        assert_eq!(
            frame.into_text().unwrap().as_str(),
            r#"{"type":"choice","choice":"scissors"}"#
        );

        // --- Server sends garbage then a real message ---
        server_ws.send(Message::Text("}{".into())).await.unwrap();
        server_ws
            .send(Message::Text(r#"{"type":"opponent_chose"}"#.into()))
            .await
            .unwrap();

        assert_eq!(within(rx_a.recv()).await, Some(ServerMessage::OpponentChose));
        assert_eq!(within(rx_b.recv()).await, Some(ServerMessage::OpponentChose));
        assert!(handle.is_connected(), "garbage must not kill the connection");
    }

    #[tokio::test]
    async fn test_server_close_flips_connectivity() {
        let (listener, base) = bind().await;
        let uri = Arc::new(Mutex::new(String::new()));
        let server = tokio::spawn(async move { accept(&listener, uri).await });

        let handle = Handle::open(&WebSocketTransport, &ConnectParams::guest(base), JsonCodec)
            .await
            .expect("should connect");
        let mut server_ws = server.await.unwrap();
        let mut connected = handle.watch_connected();

        server_ws.close(None).await.unwrap();

        within(connected.wait_for(|c| !*c)).await.unwrap();
        assert!(!handle.is_connected());
    }

    #[tokio::test]
    async fn test_connect_to_nothing_fails() {
        // Bind then drop to get a port nobody listens on.
        let (listener, base) = bind().await;
        drop(listener);

        let result = Handle::open(&WebSocketTransport, &ConnectParams::guest(base), JsonCodec).await;
        assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
    }
}

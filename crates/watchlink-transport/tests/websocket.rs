//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener and a `tokio-tungstenite` client to
//! verify frames actually cross the network, including the control
//! frames the liveness logic depends on.

#[cfg(feature = "websocket")]
mod websocket {
    use watchlink_transport::{
        Connection, Incoming, Transport, WebSocketTransport,
    };

    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on port 0, connects a client, and returns both ends.
    async fn connected_pair() -> (
        watchlink_transport::WebSocketConnection,
        ClientWs,
    ) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let (client_ws, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("client should connect");

        let server_conn =
            server_handle.await.expect("task should complete");
        (server_conn, client_ws)
    }

    #[tokio::test]
    async fn test_text_frames_flow_both_ways() {
        let (server_conn, mut client_ws) = connected_pair().await;

        assert!(server_conn.id().into_inner() > 0);

        // Server sends, client receives.
        server_conn
            .send(r#"{"type":"connected"}"#)
            .await
            .expect("send should succeed");

        let msg = client_ws.next().await.unwrap().unwrap();
        match msg {
            Message::Text(text) => {
                assert_eq!(text.as_str(), r#"{"type":"connected"}"#);
            }
            other => panic!("expected text frame, got {other:?}"),
        }

        // Client sends, server receives.
        client_ws
            .send(Message::Text(
                r#"{"type":"register-slave"}"#.to_string().into(),
            ))
            .await
            .unwrap();

        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have a frame");
        assert_eq!(
            received,
            Incoming::Frame(r#"{"type":"register-slave"}"#.to_string())
        );

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_binary_utf8_frame_is_accepted_as_text() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws
            .send(Message::Binary(b"{\"a\":1}".to_vec().into()))
            .await
            .unwrap();

        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, Incoming::Frame("{\"a\":1}".to_string()));
    }

    #[tokio::test]
    async fn test_pong_is_surfaced_to_caller() {
        let (server_conn, mut client_ws) = connected_pair().await;

        server_conn.ping().await.expect("ping should succeed");

        // Reply with an explicit pong so the test does not depend on the
        // client library's automatic pong timing.
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(matches!(msg, Message::Ping(_)));
        client_ws
            .send(Message::Pong(Vec::new().into()))
            .await
            .unwrap();

        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, Incoming::Pong);
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws.send(Message::Close(None)).await.unwrap();

        let result =
            server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_concurrent_send_while_recv_is_pending() {
        // The relay's writer task sends while the reader waits in recv;
        // the split stream must not serialize the two.
        let (server_conn, mut client_ws) = connected_pair().await;
        let server_conn = std::sync::Arc::new(server_conn);

        let reader = {
            let conn = std::sync::Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };

        // Give the reader time to park inside recv, then send.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        server_conn.send("while-reading").await.expect("send");

        let msg = client_ws.next().await.unwrap().unwrap();
        match msg {
            Message::Text(text) => assert_eq!(text.as_str(), "while-reading"),
            other => panic!("expected text frame, got {other:?}"),
        }

        // Unblock the reader.
        client_ws
            .send(Message::Text("done".to_string().into()))
            .await
            .unwrap();
        let received = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(received, Incoming::Frame("done".to_string()));
    }
}

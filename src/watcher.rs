//! Push channel announcing filesystem changes on the backend.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    event::{AppEvent, ChannelStatus},
    model::ChangeEvent,
    paths,
};

/// Keep one connection open, reconnecting after `retry` forever. Returns
/// only when the UI side has gone away.
pub async fn run_change_notifier(url: Url, retry: Duration, events: UnboundedSender<AppEvent>) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((mut socket, _)) => {
                info!(%url, "change notifier connected");
                if events.send(AppEvent::Notifier(ChannelStatus::Connected)).is_err() {
                    return;
                }
                while let Some(message) = socket.next().await {
                    match message {
                        Ok(Message::Text(text)) => {
                            if let Some(path) = parse_change(text.as_str()) {
                                if events.send(AppEvent::PathChanged(path)).is_err() {
                                    return;
                                }
                            }
                        }
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(err) => {
                            warn!(%err, "change notifier error");
                            break;
                        }
                    }
                }
                info!(?retry, "change notifier disconnected, reconnecting");
                if events.send(AppEvent::Notifier(ChannelStatus::Disconnected)).is_err() {
                    return;
                }
            }
            Err(err) => {
                warn!(%url, %err, ?retry, "change notifier connect failed");
                if events.send(AppEvent::Notifier(ChannelStatus::Disconnected)).is_err() {
                    return;
                }
            }
        }
        if events.is_closed() {
            return;
        }
        tokio::time::sleep(retry).await;
    }
}

/// Changed path from a `{path}` message; None for anything else.
pub fn parse_change(text: &str) -> Option<String> {
    match serde_json::from_str::<ChangeEvent>(text) {
        Ok(event) if !event.path.is_empty() => Some(paths::normalize(&event.path)),
        Ok(_) => None,
        Err(err) => {
            debug!(%err, "ignoring unrecognized change message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::SinkExt;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
    use tokio_tungstenite::accept_async;

    async fn next_event(events: &mut UnboundedReceiver<AppEvent>) -> AppEvent {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    fn status(event: AppEvent) -> ChannelStatus {
        match event {
            AppEvent::Notifier(status) => status,
            other => panic!("expected notifier status, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn reconnects_after_the_server_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("ws://{}/file_updates", listener.local_addr().unwrap())).unwrap();
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            ws.send(Message::text(r#"{"path":"/srv/x"}"#)).await.unwrap();
            ws.close(None).await.unwrap();
            while ws.next().await.is_some() {}

            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            ws.send(Message::text(r#"{"path":"/srv/y"}"#)).await.unwrap();
            while ws.next().await.is_some() {}
        });

        let (tx, mut rx) = unbounded_channel();
        let notifier = tokio::spawn(run_change_notifier(url, Duration::from_millis(20), tx));

        assert_eq!(status(next_event(&mut rx).await), ChannelStatus::Connected);
        assert!(matches!(next_event(&mut rx).await, AppEvent::PathChanged(p) if p == "/srv/x"));
        assert_eq!(status(next_event(&mut rx).await), ChannelStatus::Disconnected);
        assert_eq!(status(next_event(&mut rx).await), ChannelStatus::Connected);
        assert!(matches!(next_event(&mut rx).await, AppEvent::PathChanged(p) if p == "/srv/y"));

        notifier.abort();
        server.abort();
    }

    #[tokio::test]
    async fn failed_connect_reports_offline_and_retries() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("ws://{}/file_updates", listener.local_addr().unwrap())).unwrap();
        drop(listener);

        let (tx, mut rx) = unbounded_channel();
        let notifier = tokio::spawn(run_change_notifier(url, Duration::from_millis(20), tx));
        assert_eq!(status(next_event(&mut rx).await), ChannelStatus::Disconnected);
        assert_eq!(status(next_event(&mut rx).await), ChannelStatus::Disconnected);

        drop(rx);
        tokio::time::timeout(Duration::from_secs(5), notifier)
            .await
            .expect("notifier stops once the UI is gone")
            .unwrap();
    }

    #[test]
    fn parses_change_messages() {
        assert_eq!(parse_change(r#"{"path":"C:\\data\\x"}"#).as_deref(), Some("C:/data/x"));
        assert_eq!(parse_change(r#"{"path":""}"#), None);
        assert_eq!(parse_change(r#"{"event":"ping"}"#), None);
        assert_eq!(parse_change("not json"), None);
    }
}

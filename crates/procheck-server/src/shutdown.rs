//! Serving with graceful shutdown and a hard grace-period deadline.

use std::{
  future::{Future, IntoFuture},
  net::SocketAddr,
  sync::Arc,
  time::Duration,
};

use axum::Router;
use tokio::{net::TcpListener, sync::Notify};

/// How serving ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// All in-flight requests finished after the shutdown signal.
  Drained,
  /// The grace period elapsed with requests still in flight.
  TimedOut,
}

/// Serve `app` until `signal` resolves, then stop accepting connections and
/// wait up to `grace` for in-flight requests.
pub async fn serve_until(
  listener: TcpListener,
  app: Router,
  signal: impl Future<Output = ()> + Send + 'static,
  grace: Duration,
) -> std::io::Result<Outcome> {
  let triggered = Arc::new(Notify::new());
  let notify = triggered.clone();

  let server = axum::serve(
    listener,
    app.into_make_service_with_connect_info::<SocketAddr>(),
  )
  .with_graceful_shutdown(async move {
    signal.await;
    notify.notify_one();
  })
  .into_future();

  let deadline = async {
    triggered.notified().await;
    tokio::time::sleep(grace).await;
  };

  tokio::select! {
    result = server => {
      result?;
      Ok(Outcome::Drained)
    }
    _ = deadline => Ok(Outcome::TimedOut),
  }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
  use tokio::signal;

  let ctrl_c = async {
    match signal::ctrl_c().await {
      Ok(()) => tracing::info!("received SIGINT"),
      Err(e) => {
        tracing::error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
        tracing::info!("received SIGTERM");
      }
      Err(e) => {
        tracing::error!("failed to install SIGTERM handler: {e}");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }

  tracing::info!("starting graceful shutdown");
}

#[cfg(test)]
mod tests {
  use axum::routing::get;

  use super::*;

  #[tokio::test]
  async fn idle_server_drains_immediately() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let app = Router::new().route("/", get(|| async { "ok" }));

    let outcome = serve_until(listener, app, async {}, Duration::from_secs(5))
      .await
      .unwrap();
    assert_eq!(outcome, Outcome::Drained);
  }

  #[tokio::test]
  async fn stuck_request_hits_the_deadline() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route(
      "/slow",
      get(|| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        "late"
      }),
    );

    let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
    let signal = async move {
      let _ = started_rx.await;
      // Give the request time to reach the handler.
      tokio::time::sleep(Duration::from_millis(200)).await;
    };

    let client = tokio::spawn(async move {
      use tokio::io::AsyncWriteExt as _;
      let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
      stream
        .write_all(b"GET /slow HTTP/1.1\r\nhost: localhost\r\n\r\n")
        .await
        .unwrap();
      let _ = started_tx.send(());
      // Keep the connection open until the test finishes.
      tokio::time::sleep(Duration::from_secs(30)).await;
      drop(stream);
    });

    let outcome = serve_until(listener, app, signal, Duration::from_millis(300))
      .await
      .unwrap();
    assert_eq!(outcome, Outcome::TimedOut);
    client.abort();
  }
}

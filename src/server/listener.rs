use axum::{extract::Request, Router};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceExt;

use crate::config::ListenerConfig;
use crate::error::ServerError;
use crate::infra;

/// Binds `addr` and serves `router` over HTTPS or plain HTTP.
///
/// `on_listening` runs once the socket is bound, with the bound address.
pub(crate) async fn serve<F>(
    router: Router,
    addr: SocketAddr,
    listener: &ListenerConfig,
    on_listening: F,
) -> Result<(), ServerError>
where
    F: FnOnce(SocketAddr) + Send + 'static,
{
    if listener.enable_ssl {
        tracing::debug!("Starting the server in SSL mode");
        let key = listener.ssl_key.as_deref().ok_or(ServerError::MissingTlsKey)?;
        let cert = listener.ssl_cert.as_deref().ok_or(ServerError::MissingTlsCert)?;
        let config = infra::build_server_config(
            cert.as_bytes(),
            key.as_bytes(),
            listener.ssl_key_passphrase.as_deref(),
        )?;

        let tcp = TcpListener::bind(addr).await?;
        let local = tcp.local_addr()?;
        tracing::info!("Listening on https://{}", local);
        on_listening(local);

        serve_tls(tcp, router, infra::acceptor(config)).await
    } else {
        tracing::debug!("Starting the server in a non SSL mode");
        let tcp = TcpListener::bind(addr).await?;
        let local = tcp.local_addr()?;
        tracing::info!("Listening on http://{}", local);
        on_listening(local);

        axum::serve(tcp, router).await?;
        Ok(())
    }
}

async fn serve_tls(
    tcp: TcpListener,
    router: Router,
    acceptor: tokio_rustls::TlsAcceptor,
) -> Result<(), ServerError> {
    loop {
        let (stream, peer) = match tcp.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to accept connection");
                continue;
            }
        };

        let acceptor = acceptor.clone();
        let router = router.clone();
        tokio::spawn(async move {
            let stream = match acceptor.accept(stream).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::debug!(%peer, error = %e, "TLS handshake failed");
                    return;
                }
            };

            let service = hyper::service::service_fn(move |request: Request<Incoming>| {
                router.clone().oneshot(request)
            });

            if let Err(e) = auto::Builder::new(TokioExecutor::new())
                .serve_connection_with_upgrades(TokioIo::new(stream), service)
                .await
            {
                tracing::debug!(%peer, error = %e, "Connection closed with error");
            }
        });
    }
}

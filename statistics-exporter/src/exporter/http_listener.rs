use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use http_body_util::Full;
use hyper::{
    body::{self, Bytes, Incoming},
    header::{HeaderValue, CONTENT_TYPE},
    server::conn::http1::Builder as HyperHttpBuilder,
    service::service_fn,
    Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use ipnet::IpNet;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, warn};

use crate::{common::BuildError, ExporterError, ExporterFuture, ExpositionHandle};

/// Content type of the Prometheus text exposition format.
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

struct HttpListeningExporter {
    inner: Arc<Inner>,
}

struct Inner {
    handle: ExpositionHandle,
    allowed_addresses: Option<Vec<IpNet>>,
}

impl HttpListeningExporter {
    async fn serve(&self, listener: std::net::TcpListener) -> Result<(), ExporterError> {
        let listener = TcpListener::from_std(listener)
            .map_err(|e| ExporterError::HttpListener(e.to_string()))?;

        loop {
            let stream = match listener.accept().await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!("Error accepting connection. Ignoring request. Error: {:?}", e);
                    continue;
                }
            };

            let remote_addr = match stream.peer_addr() {
                Ok(remote_address) => remote_address.ip(),
                Err(e) => {
                    warn!("Error obtaining remote address. Ignoring request. Error: {:?}", e);
                    continue;
                }
            };

            self.process_stream(stream, remote_addr).await;
        }
    }

    async fn process_stream(&self, stream: TcpStream, remote_address: IpAddr) {
        let inner = self.inner.clone();
        let service = service_fn(move |req: Request<body::Incoming>| {
            let inner = inner.clone();
            async move { Self::handle_http_request(&inner, remote_address, &req) }
        });

        tokio::task::spawn(async move {
            if let Err(err) =
                HyperHttpBuilder::new().serve_connection(TokioIo::new(stream), service).await
            {
                warn!("Error serving connection.  Error: {:?}", err);
            };
        });
    }

    fn handle_http_request(
        inner: &Arc<Inner>,
        remote_address: IpAddr,
        req: &Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let is_allowed = match &inner.allowed_addresses {
            Some(addresses) => addresses.iter().any(|address| address.contains(&remote_address)),
            None => true,
        };

        if !is_allowed {
            return Ok(new_response(StatusCode::FORBIDDEN, String::new()));
        }

        Ok(match req.uri().path() {
            "/health" => new_response(StatusCode::OK, "OK".to_owned()),
            _ => match inner.handle.render() {
                Ok(body) => new_response(StatusCode::OK, body),
                Err(e) => {
                    error!(error = %e, "Failed to render statistics snapshot.");
                    new_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                }
            },
        })
    }
}

fn new_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(EXPOSITION_CONTENT_TYPE));
    response
}

/// Creates an `ExporterFuture` implementing a http listener that serves statistics snapshots.
///
/// # Errors
/// Will return Err if it cannot bind to the listen address
pub(crate) fn new_http_listener(
    handle: ExpositionHandle,
    listen_address: SocketAddr,
    allowed_addresses: Option<Vec<IpNet>>,
) -> Result<ExporterFuture, BuildError> {
    let listener = std::net::TcpListener::bind(listen_address)
        .and_then(|listener| {
            listener.set_nonblocking(true)?;
            Ok(listener)
        })
        .map_err(|e| BuildError::FailedToCreateHTTPListener(e.to_string()))?;

    let exporter = HttpListeningExporter { inner: Arc::new(Inner { handle, allowed_addresses }) };

    Ok(Box::pin(async move { exporter.serve(listener).await }))
}

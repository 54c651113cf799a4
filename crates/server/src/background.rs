//! Runs the server on a dedicated thread for tests and local demos.

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::thread::JoinHandle;

use error_stack::{Report, ResultExt};
use tokio::sync::oneshot;

use signed_request_common::error::SigningError;
use signed_request_common::settings::Settings;

use crate::app::create_router;

/// A server bound to a real socket, stopped on [`BackgroundServer::stop`] or drop.
///
/// The socket is bound before this returns, so requests can be sent
/// immediately. Binding to port 0 picks a free port; see [`Self::local_addr`].
pub struct BackgroundServer {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundServer {
    /// # Errors
    ///
    /// Returns a configuration error if the bind address is invalid or in use,
    /// or if the router cannot be built.
    pub fn start(settings: &Settings) -> Result<Self, Report<SigningError>> {
        let router = create_router(settings)?;
        let bind_address = settings.server.bind_address.as_str();

        let listener =
            StdTcpListener::bind(bind_address).change_context(SigningError::Configuration {
                message: format!("Failed to bind {}", bind_address),
            })?;
        listener
            .set_nonblocking(true)
            .change_context(SigningError::Configuration {
                message: "Failed to make listener non-blocking".into(),
            })?;
        let local_addr = listener
            .local_addr()
            .change_context(SigningError::Configuration {
                message: "Failed to read listener address".into(),
            })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .change_context(SigningError::Configuration {
                message: "Failed to build server runtime".into(),
            })?;

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let handle = std::thread::spawn(move || {
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        log::error!("Failed to adopt listener: {}", e);
                        return;
                    }
                };

                let served = axum::serve(listener, router)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await;
                if let Err(e) = served {
                    log::error!("Background server stopped with error: {}", e);
                }
            });
        });

        log::debug!("Background server listening on {}", local_addr);

        Ok(Self {
            local_addr,
            shutdown: Some(shutdown),
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `http://{local_addr}` with no trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Signals shutdown and waits for in-flight requests to finish.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Background server thread panicked");
            }
        }
    }
}

impl Drop for BackgroundServer {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

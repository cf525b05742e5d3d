use crate::credentials::CredentialStore;
use crate::registry::Registry;
use crate::session::ClientSession;
use log::error;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ChatServer {
    registry: Arc<Registry>,
    credentials: Arc<CredentialStore>,
}

impl ChatServer {
    pub fn new(credentials: CredentialStore) -> Self {
        ChatServer {
            registry: Arc::new(Registry::new()),
            credentials: Arc::new(credentials),
        }
    }

    /// Accepts connections forever. Every accepted socket gets its own
    /// session task and the loop resumes immediately, so no handshake or
    /// session lifetime ever delays the next accept. Accept errors are
    /// logged and skipped.
    pub async fn serve(&self, listener: TcpListener) {
        loop {
            let socket = match listener.accept().await {
                Ok((socket, _)) => socket,
                Err(error) => {
                    error!("Could not get socket from accepted connection: {error}");
                    continue;
                }
            };

            let session = ClientSession::new(self.registry.clone(), self.credentials.clone());
            tokio::spawn(session.handle(socket));
        }
    }
}

use crate::broadcast::broadcast;
use crate::credentials::CredentialStore;
use crate::errors::session_error::SessionError;
use crate::message::Message;
use crate::registry::{Registry, SessionId};
use log::{info, trace};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc::{self, UnboundedReceiver};

pub const EXIT_COMMAND: &str = "/exit";

const USERNAME_PROMPT: &str = "Enter username:";
const PASSWORD_PROMPT: &str = "Enter password:";
const DUPLICATE_LOGIN: &str = "User is already logged in. Connection refused.";
const AUTHENTICATION_FAILED: &str = "Authentication failed. Closing connection.";

/// One connected client, from accept to teardown. Drives the handshake
/// (username prompt, reservation, password prompt, verification), then the
/// active loop, then the terminal cleanup. Strictly forward; a session never
/// re-authenticates or changes its name.
pub struct ClientSession {
    id: SessionId,
    registry: Arc<Registry>,
    credentials: Arc<CredentialStore>,
    username: Option<String>,
    active: bool,
}

impl ClientSession {
    pub fn new(registry: Arc<Registry>, credentials: Arc<CredentialStore>) -> Self {
        let id = registry.next_session_id();

        ClientSession {
            id,
            registry,
            credentials,
            username: None,
            active: false,
        }
    }

    pub async fn handle(mut self, socket: TcpStream) {
        match self.run(socket).await {
            Ok(()) => info!("Session {} closed", self.id),
            Err(error) => info!("Session {} ended: {error}", self.id),
        }
        // Dropping self runs the terminal cleanup for every exit path.
    }

    async fn run(&mut self, socket: TcpStream) -> Result<(), SessionError> {
        let (rd, mut wr) = socket.into_split();
        let mut lines = BufReader::new(rd).lines();

        send_line(&mut wr, USERNAME_PROMPT).await?;
        let candidate = next_line(&mut lines).await?;

        if !self.registry.try_reserve(&candidate) {
            send_line(&mut wr, DUPLICATE_LOGIN).await?;
            return Ok(());
        }
        self.username = Some(candidate.clone());

        send_line(&mut wr, PASSWORD_PROMPT).await?;
        let password = next_line(&mut lines).await?;

        if !self.credentials.verify(&candidate, &password) {
            send_line(&mut wr, AUTHENTICATION_FAILED).await?;
            return Ok(());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.registry.add_live(self.id, tx);
        self.active = true;

        send_line(&mut wr, &format!("Welcome to the chat, {candidate}!")).await?;
        broadcast(&self.registry, self.id, &Message::Joined(candidate.clone()));
        info!("User {candidate} joined on session {}", self.id);

        self.active_loop(lines, wr, rx, &candidate).await
    }

    async fn active_loop(
        &mut self,
        mut lines: Lines<BufReader<OwnedReadHalf>>,
        mut wr: OwnedWriteHalf,
        mut rx: UnboundedReceiver<Message>,
        username: &str,
    ) -> Result<(), SessionError> {
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => return Err(SessionError::Disconnected),
                        Err(error) => return Err(SessionError::Read(error)),
                    };

                    trace!("C {username}: {line}");
                    if line.trim().eq_ignore_ascii_case(EXIT_COMMAND) {
                        return Ok(());
                    }

                    broadcast(&self.registry, self.id, &Message::Chat {
                        sender: username.to_string(),
                        text: line,
                    });
                }

                message = rx.recv() => {
                    // The registry holds the only sender clone, so the queue
                    // stays open until the terminal cleanup removes it.
                    let Some(message) = message else {
                        return Err(SessionError::Disconnected);
                    };

                    send_line(&mut wr, &message.render()).await?;
                }
            }
        }
    }

    /// Terminal cleanup, safe to run more than once: drop out of the live
    /// set, give the username back, and announce the departure if this
    /// session ever reached the active phase. The connection itself closes
    /// when the socket halves drop.
    fn finish(&mut self) {
        self.registry.remove_live(self.id);

        if let Some(username) = self.username.take() {
            self.registry.release(&username);

            if self.active {
                self.active = false;
                broadcast(&self.registry, self.id, &Message::Left(username.clone()));
                info!("User {username} left the chat");
            }
        }
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.finish();
    }
}

async fn send_line(wr: &mut OwnedWriteHalf, line: &str) -> Result<(), SessionError> {
    wr.write_all(line.as_bytes())
        .await
        .map_err(SessionError::Write)?;
    wr.write_all(b"\n").await.map_err(SessionError::Write)?;

    trace!("S: {line}");
    Ok(())
}

async fn next_line(
    lines: &mut Lines<BufReader<OwnedReadHalf>>,
) -> Result<String, SessionError> {
    match lines.next_line().await {
        Ok(Some(line)) => Ok(line),
        Ok(None) => Err(SessionError::Disconnected),
        Err(error) => Err(SessionError::Read(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::ClientSession;
    use crate::credentials::CredentialStore;
    use crate::message::Message;
    use crate::registry::Registry;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[test]
    fn finish_is_idempotent() {
        let registry = Arc::new(Registry::new());
        let credentials = Arc::new(CredentialStore::parse("alice secret"));
        let (tx, _rx) = mpsc::unbounded_channel();

        let mut session = ClientSession::new(registry.clone(), credentials);
        assert!(registry.try_reserve("alice"));
        session.username = Some("alice".to_string());
        registry.add_live(session.id, tx);
        session.active = true;

        let (observer_tx, mut observer_rx) = mpsc::unbounded_channel();
        registry.add_live(u64::MAX, observer_tx);

        session.finish();
        session.finish();
        drop(session);

        // Exactly one departure notice despite the repeated cleanup.
        assert_eq!(
            observer_rx.try_recv().unwrap(),
            Message::Left("alice".to_string())
        );
        assert!(observer_rx.try_recv().is_err());

        // The name is free again.
        assert!(registry.try_reserve("alice"));
    }
}

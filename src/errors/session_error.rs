use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Client disconnected")]
    Disconnected,
    #[error("Could not read from client: {0}")]
    Read(std::io::Error),
    #[error("Could not send to client over socket: {0}")]
    Write(std::io::Error),
}

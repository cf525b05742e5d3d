/// In-flight value pushed onto per-session outbound queues. Never stored;
/// rendered to a wire line right before the recipient's socket write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Chat { sender: String, text: String },

    Joined(String),

    Left(String),
}

impl Message {
    pub fn render(&self) -> String {
        match self {
            Message::Chat { sender, text } => format!("{sender}: {text}"),
            Message::Joined(username) => format!("{username} joined the chat."),
            Message::Left(username) => format!("{username} left the chat."),
        }
    }
}

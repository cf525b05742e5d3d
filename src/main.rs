use chatroomd::credentials::CredentialStore;
use chatroomd::server::ChatServer;
use dotenvy::dotenv;
use env_logger::Env;
use log::info;
use std::env;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let bind = env::var("CHAT_BIND").unwrap_or_else(|_| "0.0.0.0:9643".to_string());
    let credentials_file =
        env::var("CREDENTIALS_FILE").unwrap_or_else(|_| "users_credentials.txt".to_string());

    let credentials = CredentialStore::load(&credentials_file);

    let listener = TcpListener::bind(&bind)
        .await
        .expect("Could not bind chat server");

    info!("Chat server listening on {bind}");
    ChatServer::new(credentials).serve(listener).await;
}

#[tokio::main]
async fn main() -> Result<(), guestbook_server::error::AppError> {
    guestbook_server::start_server().await
}

#[tokio::main]
async fn main() {
    roadside::start_server().await;
}

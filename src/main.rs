#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    review_backend::run().await;
}

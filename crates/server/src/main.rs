#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mealforge_server::start().await
}

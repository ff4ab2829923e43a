#[tokio::main]
async fn main() -> anyhow::Result<()> {
    carecompare_server::run().await
}

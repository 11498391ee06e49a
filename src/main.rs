#[tokio::main]
async fn main() -> anyhow::Result<()> {
    statusdeck::bootstrapper::run().await
}

use edge_agent::runtime::{boot, watch};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let booted = boot::boot()?;
    watch::run(booted).await
}

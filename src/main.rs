/*
 * Responsibility
 * - tokio runtime startup
 * - call app::run() (no logic here)
 */
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    edge_gateway::app::run().await
}

use anyhow::Result;
use tracing::info;

use guidely_admin::{catalog, memory::MemoryStore, web};

const ADDRESS: &str = concat!("0.0.0.0", ":", "8080");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // Table store loop; handles talk to it over the channel inside.
    let schemas = catalog::schemas();
    let store = MemoryStore::with_tables(schemas.iter().map(|s| s.table)).spawn();

    let app = web::router(store);
    let listener = tokio::net::TcpListener::bind(ADDRESS).await?;
    info!("guidely admin on {ADDRESS}");
    axum::serve(listener, app).await?;

    Ok(())
}

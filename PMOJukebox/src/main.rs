use pmojukebox::JukeboxExt;
use pmoserver::{LoggingOptions, ServerBuilder};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ========== PHASE 1 : Infrastructure HTTP ==========
    let mut server = ServerBuilder::new_configured().build();
    server.init_logging(LoggingOptions::from_config()).await;

    let server_info = server.info();
    server
        .add_route("/info", move || {
            let server_info = server_info.clone();
            async move { server_info }
        })
        .await;

    // ========== PHASE 2 : Jukebox ==========
    info!("🎵 Initializing jukebox...");
    let jukebox = server.init_jukebox_configured().await?;
    let state = jukebox.snapshot().await;
    info!(
        "✅ Jukebox restored: {} track(s) queued, playing={}",
        state.playlist.len(),
        state.is_playing
    );

    // ========== PHASE 3 : Démarrage du serveur ==========
    info!("🌐 Starting HTTP server...");
    server.start().await;

    let server_info = server.info();
    info!(
        "✅ PMOJukebox is ready at {}:{}",
        server_info.base_url, server_info.http_port
    );
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}

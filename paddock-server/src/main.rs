use anyhow::Context;
use tracing_subscriber::EnvFilter;

use paddock_core::track::Track;
use paddock_core::GLOBAL_CONFIG;
use paddock_server::replay::{ReplayServer, SessionScript};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("paddock_server=info,paddock_core=info")),
        )
        .init();

    let track = Track::load(&GLOBAL_CONFIG.track_file).context("loading track")?;
    let script = SessionScript::load(&GLOBAL_CONFIG.session_file).context("loading session")?;

    // kick off the race loop
    let mut server = ReplayServer::new(track, script, &GLOBAL_CONFIG)?;
    server.start_loop()?;

    let standings = server.director().standings();
    println!("{}", serde_json::to_string_pretty(&standings)?);
    Ok(())
}

//! Serve command - run the backend server until Ctrl+C.

use std::net::SocketAddr;

use bustrack::backend::{BackendServer, BackendState};
use bustrack::store::InMemoryLocationStore;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the serve command.
pub fn run(bind: Option<String>, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("serve");
    let config = runner.config();

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| CliError::Config(format!("Invalid bind address '{}': {}", bind, e)))?;
    let data_dir = config.server.data_dir.clone();

    runner.block_on(async {
        let state = BackendState::new(InMemoryLocationStore::new(), &data_dir);
        let server = BackendServer::start(addr, state).await?;

        println!("BusTrack Backend v{}", bustrack::VERSION);
        println!("======================");
        println!();
        println!("Listening:     {}", server.url());
        println!("Attendance:    {}", server.state().logs().attendance_path().display());
        println!("Notifications: {}", server.state().logs().notifications_path().display());
        println!();
        println!("Press Ctrl+C to stop");

        tokio::signal::ctrl_c().await.map_err(CliError::Runtime)?;

        println!();
        println!("Shutting down...");
        server.shutdown().await?;
        Ok(())
    })
}

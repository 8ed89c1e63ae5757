//! Shared test utilities for cohortwatch-server integration tests

pub mod client;

use std::net::SocketAddr;
use std::sync::Arc;

use cohortwatch_bus::{InMemoryBus, TopicNaming};
use cohortwatch_server::{AppState, RelayServer, ServerConfig};
use tokio::net::TcpListener;

/// Topic naming used by the integration tests
#[allow(dead_code)]
pub fn naming() -> TopicNaming {
    TopicNaming {
        prefix: "cohort.".to_string(),
        suffix: ".topic".to_string(),
    }
}

/// Creates a test server backed by an in-memory bus, returns state and address
#[allow(dead_code)]
pub async fn create_test_server(bus: &InMemoryBus) -> (Arc<AppState>, SocketAddr) {
    let state = Arc::new(AppState::new(Arc::new(bus.clone()), naming(), 64));

    let server = RelayServer::with_state(ServerConfig::default(), Arc::clone(&state));
    let addr = spawn_server(server).await;

    (state, addr)
}

/// Spawns server in background task, returns bound address
async fn spawn_server(server: RelayServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    addr
}

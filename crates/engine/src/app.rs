//! Application state shared by the HTTP and WebSocket handlers.

use std::sync::Arc;

use crate::hub::Hub;
use crate::infrastructure::ports::GameStore;

/// Passed to handlers via Axum state.
pub struct App {
    pub hub: Arc<Hub>,
    /// Read side of the results store; the hub writes through its own handle
    pub store: Arc<dyn GameStore>,
}

impl App {
    pub fn new(hub: Arc<Hub>, store: Arc<dyn GameStore>) -> Self {
        Self { hub, store }
    }
}

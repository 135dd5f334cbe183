// Interface adapters: wire protocol, connection handling and HTTP routes.

pub mod handlers;
pub mod http;
pub mod hub;
pub mod net;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod utils;

// Interface adapters: wire protocol, connection handling and outbound service clients.

pub mod clients;
pub mod net;
pub mod protocol;
pub mod state;
pub mod utils;

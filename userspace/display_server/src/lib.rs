pub mod backend;
pub mod channel;
pub mod compositor;
pub mod config;
pub mod consts;
pub mod cursor;
pub mod damage;
pub mod error;
pub mod frame_buffer;
pub mod logger;
pub mod manager;
pub mod preview;
pub mod rect;
pub mod registry;
pub mod router;
pub mod server;
pub mod window;

pub mod http_handler;

pub use http_handler::function_handler;

pub mod http;
pub mod push;
pub mod scheduler;

pub mod client;
pub mod results;

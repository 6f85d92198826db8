/// Helpers for exercising clients, servers, and handlers without a network.
pub mod test;

mod memory_conn;
pub use self::memory_conn::*;

mod error;
pub use self::error::*;

mod addr;
pub use self::addr::*;

mod ethernet;
pub use self::ethernet::*;

mod arp;
pub use self::arp::*;

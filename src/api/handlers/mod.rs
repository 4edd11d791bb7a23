pub mod health;
pub mod logout;
pub mod proxy;

pub use self::health::health;
pub use self::logout::{logout, CookiePolicy};
pub use self::proxy::{forward, Upstream};

pub mod client;
pub mod session;
pub mod store;

pub use client::AuthClient;
pub use session::{AuthSession, LogNavigator, Navigator};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

//! Route protection.
//!
//! Flow Overview:
//! - [`edge`] protects the initial document fetch using the `token` cookie.
//! - [`client`] protects client-side navigation after the page is rendered,
//!   using auth-state notifications from the client session manager.
//!
//! The two gates never talk to each other; they only share a [`RouteTable`].

pub mod client;
pub mod edge;
pub mod routes;

pub use client::{ClientGate, Navigator, ShellView};
pub use edge::{Denial, EdgeDecision, EdgeGate};
pub use routes::{RouteClass, RouteTable, RouteTableError};

//! Subcommand implementations.

pub mod cart;
pub mod catalog;
pub mod checkout;

use cartsync_engine::Session;
use cartsync_engine::remote::HttpClient;

/// Session type the CLI runs against.
pub type CliSession = Session<HttpClient, HttpClient>;

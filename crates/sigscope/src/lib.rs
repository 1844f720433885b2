//! Scoped-HMAC signing and verification of HTTP requests.
//!
//! This crate implements a symmetric-secret request-authentication scheme in
//! the AWS Signature Version 4 family, parameterized by a vendor prefix
//! (default `EMS`). A signature binds a canonical rendering of the request
//! to a credential scope — access key, day, region, service, and request
//! type — and travels either in an authorization header or as presigned
//! query parameters on a GET URL.
//!
//! Signing and verification are pure functions of their inputs: the caller
//! supplies the request data, the signing date, and (on the server side) the
//! current time and a secret lookup. No I/O happens inside the crate, so
//! both sides are safe to call concurrently from any number of threads.
//!
//! # Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use sigscope::{Client, ClientCredential, Party, RequestView, Server, StaticKeyProvider};
//!
//! let party = Party::new("us-east-1", "files", "ems_request");
//! let client = Client::new(ClientCredential::new("AKID", "secret"), party.clone());
//!
//! let date = Utc.with_ymd_and_hms(2024, 5, 4, 12, 0, 0).unwrap();
//! let headers = client
//!     .sign_headers("POST", "https://files.example.com/upload", b"{}", &[], &[], date)
//!     .unwrap();
//!
//! let server = Server::new(
//!     party,
//!     Box::new(StaticKeyProvider::new([("AKID".to_owned(), "secret".to_owned())])),
//! );
//! let request = RequestView {
//!     method: "POST".to_owned(),
//!     uri: "/upload".to_owned(),
//!     scheme: "https".to_owned(),
//!     server_name: "files.example.com".to_owned(),
//!     port: None,
//!     headers,
//!     timestamp: date,
//! };
//! assert_eq!(server.authenticate(&request, b"{}").unwrap(), "AKID");
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request construction
//! - [`client`] - The signing side: authorization headers and presigned URLs
//! - [`config`] - Vendor prefix, algorithm, and header-name configuration
//! - [`credentials`] - Secret key lookup trait and in-memory implementation
//! - [`error`] - Authentication error types
//! - [`parse`] - Extraction of signature material from requests
//! - [`request`] - The server-side request view
//! - [`scope`] - Party and credential scope model
//! - [`sign`] - Key derivation and signature computation
//! - [`time`] - Compact UTC timestamp handling
//! - [`verify`] - The server-side verification pipeline

pub mod canonical;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod parse;
pub mod request;
pub mod scope;
pub mod sign;
pub mod time;
pub mod verify;

pub use client::{Client, ClientCredential};
pub use config::AuthConfig;
pub use credentials::{KeyProvider, StaticKeyProvider};
pub use error::AuthError;
pub use parse::{AuthElements, AuthSource};
pub use request::RequestView;
pub use scope::{Credential, Party};
pub use sign::{HashAlgo, UNSIGNED_PAYLOAD};
pub use verify::Server;

//! # fotocrib
//!
//! Client for the fotocrib image-processing service. The service does the
//! pixel work; this crate turns a typed operation into a validated request,
//! fetches the result, and writes it to `<name>.<format>` on disk.
//!
//! # Flow
//!
//! ```text
//! Operation ──validate──▶ query (s, q, params) ──▶ URL ──Transport──▶ bytes
//!                                                                     │
//!                          <name>.<format> ◀──write── encode ◀── decode
//! ```
//!
//! Each operation is one round trip and one output file. The service never
//! sees a chain of operations; calling `blur` then `sobel` runs `sobel` on
//! the original source.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`operation`] | The 18 operations, their wire codes, parameter order and argument checks |
//! | [`request`] | Validated source / file name / format state and URL construction |
//! | [`transport`] | [`Transport`] trait and the blocking HTTP implementation |
//! | [`codec`] | Source-format detection, decode, re-encode and atomic write |
//! | [`client`] | [`Fotocrib`]: state + config + transport, one method per operation |
//! | [`config`] | `fotocrib.toml` loading layered over stock defaults |
//! | [`output`] | CLI output formatting |
//! | [`error`] | The crate-wide [`Error`] type |
//!
//! # Design Decisions
//!
//! ## One Generic Path
//!
//! The operation methods on [`Fotocrib`] all build an [`Operation`] and call
//! [`Fotocrib::apply`]. Validation and serialization are driven by a single
//! per-variant field table in [`operation`], so adding an operation is one
//! enum variant and one table row.
//!
//! ## Numbers as Text
//!
//! Numeric arguments are [`Numeric`] values that keep the caller's text. The
//! service receives exactly what was typed, and non-numeric input is rejected
//! with [`Error::NonNumericArgument`] before any request is made. Ranges are
//! not enforced.
//!
//! ## Sniffing Over Trusting the URL
//!
//! By default the response's format is read from its magic bytes. When that
//! fails the response `Content-Type` is tried, then the source URL's
//! extension. [`DecodeStrategy::SourceExtension`]
//! trusts the URL instead, for services that return unrecognisable bodies.
//! Both the source URL and the destination file name are matched the same
//! way: a case-insensitive extension suffix.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod operation;
pub mod output;
pub mod request;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::Fotocrib;
pub use codec::{DecodeStrategy, Format, SaveOutcome};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use operation::{Location, Numeric, Operation};
pub use request::ImageRequestState;
pub use transport::{FetchedImage, HttpTransport, Transport, TransportError};

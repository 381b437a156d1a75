//! jenq: Jenkins build queries.
//!
//! Lists a job's builds, fetches them in parallel while keeping Jenkins'
//! ordering, and filters them with a small boolean query language.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fields;
pub mod pool;
pub mod query;
pub mod reorder;
pub mod schema;

pub use client::{Builds, Client, HttpTransport, Transport};
pub use config::Config;
pub use credentials::{CredentialProvider, Credentials};
pub use error::{Error, Result};
pub use fields::{resolve_field, BuildFields};
pub use pool::{fetch_all, FetchResult, FetchStream, Locator, PoolOptions};
pub use query::{compile, parse_query, tokenize, Expression, FieldResolver, Predicate, QueryError, Token};
pub use reorder::Reorder;
pub use schema::{Action, Build, BuildResult, Cause, Parameter, Parameters};

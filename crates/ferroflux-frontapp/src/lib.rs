//! # FerroFlux Frontapp Connector
//!
//! Translates (resource, operation) selections into calls against the
//! Frontapp REST API and returns exactly one result record per input item.
//!
//! The host supplies the items and the token; this crate owns the route
//! table, the retrying transport and per-item error isolation.
//!
//! ```no_run
//! use ferroflux_frontapp::{Dispatcher, InputItem};
//!
//! # async fn demo() -> Result<(), ferroflux_frontapp::DispatchError> {
//! let dispatcher = Dispatcher::from_env()?;
//! let items = vec![InputItem::new().with("resource", "tag").with("operation", "list")];
//! let records = dispatcher.run(&items).await;
//! assert_eq!(records.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod params;
pub mod processor;
pub mod routes;
pub mod schema;
pub mod transport;

pub use config::FrontappConfig;
pub use credentials::{CredentialProvider, EnvCredentials, StaticCredentials};
pub use error::{DispatchError, DispatchResult};
pub use params::{InputItem, ParameterSource, Params};
pub use processor::{ApiResult, Dispatcher, ItemStage};
pub use routes::{Resource, Route, UnknownRoute};
pub use transport::{
    ApiResponse, HttpMethod, HttpTransport, RequestDescriptor, RetryMode, RetryPolicy,
    RetryingTransport, Transport, TransportFailure,
};

//! HTTP facade and transfer coordination for tokendrop.
//!
//! The server exposes a small set of endpoints: token creation and listing
//! (session-gated), and an open transfer surface for anyone holding a valid
//! token. All orchestration between the metadata store and the blob store
//! lives in [`transfer::TransferCoordinator`]; handlers only translate
//! between HTTP and coordinator calls.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod transfer;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use transfer::{TransferCoordinator, TransferError};

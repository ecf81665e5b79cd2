//! HTTP/2 protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (hyper HTTP/2 driver, one task per stream)
//!     → headers.rs (pseudo-headers + regular fields)
//!     → stream.rs (request body in, response slot out)
//!     → [dispatch layer runs middleware and the route handler]
//!     → response.rs (render the reply onto the stream)
//!     → Send to client
//! ```

pub mod headers;
pub mod response;
pub mod server;
pub mod stream;

pub use headers::Headers;
pub use response::Reply;
pub use server::Server;
pub use stream::{ResponseReceiver, Stream, WireResponse};

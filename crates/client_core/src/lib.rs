//! Client side of the incident desk: keeps a rendered incident table in step
//! with the server.

pub mod controller;
pub mod error;
pub mod render;
pub mod store;
pub mod transport;

pub use controller::{CommandLoop, IncidentForm, MutationController, UiCommand};
pub use error::TransportError;
pub use render::{
    IncidentRow, RenderSurface, Renderer, SelectionHandler, StatusOption, StatusSelector,
    TableSurface,
};
pub use store::IncidentStoreProxy;
pub use transport::{HttpTransport, Method, Transport};

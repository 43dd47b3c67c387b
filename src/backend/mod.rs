//! Backend collaborators: the loader and submit contract and its local store

mod error;
mod store;
mod traits;

pub use error::BackendError;
pub use store::LocalStore;
pub use traits::{EntityBackend, ReferenceOption};

#[cfg(test)]
pub use traits::MockEntityBackend;

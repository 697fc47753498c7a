//! # External Collaborator Ports
//!
//! The interfaces NoiseFS consumes but does not implement (beyond test
//! doubles): the storage backend, the randomizer provider, the password
//! provider, and the progress reporter. See spec §6.

pub mod backend;
pub mod password;
pub mod progress;
pub mod randomizer;

pub use backend::Backend;
pub use password::PasswordProvider;
pub use progress::{ProgressInfo, ProgressReporter};
pub use randomizer::{RandomizerProvider, SelectedRandomizers};

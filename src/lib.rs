#[macro_use]
extern crate tracing;

pub mod layout;
pub mod script;
mod utils;

pub use panetree_ipc as ipc;

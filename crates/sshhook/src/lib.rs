// ABOUTME: Library root for the sshhook callback service.
// ABOUTME: Exports the wire schema, the dispatcher and the server entry points.

pub mod dispatcher;
pub mod server;
pub mod wire;

pub use dispatcher::Dispatcher;
pub use server::{run, serve};

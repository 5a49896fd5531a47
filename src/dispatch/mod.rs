pub mod context;
pub mod dispatcher;
pub mod log;
pub mod notify;

pub use context::{AppContext, DispatchOptions};
pub use dispatcher::send;

//! Advisory domain: the session context and the value types it carries.

mod architecture;
mod context;
mod critique;
mod document;
mod facts;
mod priorities;
mod requirements;

pub use architecture::*;
pub use context::*;
pub use critique::*;
pub use document::*;
pub use facts::*;
pub use priorities::*;
pub use requirements::*;

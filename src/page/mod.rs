//! Page side of the system: protocol, driver seam, executor and process.

pub mod driver;
pub mod executor;
pub mod process;
pub mod protocol;

pub use driver::{ElementKind, Interaction, PageDriver};
pub use executor::{ActionExecutor, SettleDelays};
pub use process::{FollowLinks, PageProcess, PageScript, ScriptEffect, Site};
pub use protocol::{ActionResult, ContentRequest, ContentResponse, PageAction, ScrollDirection};

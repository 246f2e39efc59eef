pub mod access;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod forum;
pub mod patterns;
pub mod payload;
pub mod render;
pub mod router;
pub mod scope;
pub mod search;
pub mod startup;
pub mod tags;
pub mod title;

pub use access::*;
pub use commands::*;
pub use config::*;
pub use dispatch::*;
pub use errors::*;
pub use forum::*;
pub use patterns::*;
pub use payload::*;
pub use render::*;
pub use router::*;
pub use scope::*;
pub use search::*;
pub use startup::*;
pub use tags::*;
pub use title::*;

pub use kotatsu_provider::{LookupError, MediaCatalog};

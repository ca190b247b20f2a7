//! Conversion engine between persistence-model graphs and plain domain-entity
//! graphs.
//!
//! Both sides are stored in arenas ([`Arena`]) and relations are typed handles
//! into them, so cyclic graphs (a user following a user who follows back) are
//! ordinary data. A conversion reads one arena and writes a fresh one owned by
//! the caller; it either returns a complete graph or an error, never a partial
//! result.

pub mod arena;
pub mod collection;
pub mod config;
pub mod export;
pub mod graph;
pub mod mapper;

pub use arena::{Arena, Handle};
pub use collection::{Collection, CollectionKey};
pub use config::{MapperConfig, UnknownFieldPolicy};
pub use graph::{
    DomainCollection, DomainEntity, EntityGraph, EntityRef, Model, ModelCollection, ModelGraph,
    ModelRef, Related,
};
pub use mapper::{Converted, Mapper};

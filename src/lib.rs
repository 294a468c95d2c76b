pub mod config;
pub mod ecs;

pub use config::{ConfigError, RegistryConfig, RemovalPolicy, TransformConfig};
pub use ecs::{Component, ComponentSet, ComponentTypeId, EntityId, Registry, RegistryError, ValueBox};

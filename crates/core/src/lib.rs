#![warn(clippy::all, missing_docs)]

//! Core domain logic for the fleetyard container registry.
//!
//! This crate hosts the container and ship models, the registry that moves
//! containers between the free pool and ships, hazard notification, the
//! refrigerated product catalog and configuration handling used by the
//! terminal UI and any future frontends.

pub mod config;
pub mod container;
pub mod error;
pub mod hazard;
pub mod products;
pub mod registry;
pub mod ship;

pub use config::{AppConfig, FleetConfig};
pub use container::{Container, ContainerKind, ContainerSpec, SerialNumber, SerialSequence, TypeCode};
pub use error::{ErrorKind, FleetError, Result};
pub use hazard::{HazardEvent, HazardLog, HazardNotifier, SilentNotifier, TracingNotifier};
pub use products::ProductCatalog;
pub use registry::{ContainerRef, Location, Registry};
pub use ship::{Ship, ShipConfig, ShipId};

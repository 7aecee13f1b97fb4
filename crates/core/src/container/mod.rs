//! Cargo containers and their variant-specific loading rules.

mod serial;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{FleetError, Result},
    hazard::{HazardEvent, HazardNotifier},
};

pub use serial::{SerialNumber, SerialSequence, TypeCode, SERIAL_PREFIX};

/// Variant-specific payload of a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Liquid cargo; dangerous cargo may only fill half the capacity.
    Liquid {
        /// Whether the cargo is hazardous.
        dangerous: bool,
    },
    /// Pressurised gas; emptying leaves a residue.
    Gas {
        /// Internal pressure in atmospheres.
        pressure_atm: f64,
    },
    /// Temperature-controlled cargo.
    Refrigerated {
        /// Product carried, e.g. `Bananas`.
        product: String,
        /// Temperature the container keeps, in °C.
        maintained_temperature_c: i32,
        /// Lowest temperature the product tolerates, in °C.
        minimum_temperature_c: i32,
    },
}

impl ContainerKind {
    /// Type code used in serial numbers.
    pub fn code(&self) -> TypeCode {
        match self {
            Self::Liquid { .. } => TypeCode::Liquid,
            Self::Gas { .. } => TypeCode::Gas,
            Self::Refrigerated { .. } => TypeCode::Refrigerated,
        }
    }

    /// Human-readable variant name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Liquid { .. } => "Liquid",
            Self::Gas { .. } => "Gas",
            Self::Refrigerated { .. } => "Refrigerated",
        }
    }

    /// Whether the variant reports rejected overfills to a hazard notifier.
    pub fn is_hazard_capable(&self) -> bool {
        matches!(self, Self::Liquid { .. } | Self::Gas { .. })
    }

    fn validate(&self) -> Result<()> {
        if let Self::Refrigerated {
            maintained_temperature_c,
            minimum_temperature_c,
            product,
        } = self
        {
            if maintained_temperature_c < minimum_temperature_c {
                return Err(FleetError::validation(format!(
                    "{product} must be kept at {minimum_temperature_c}°C or warmer, got {maintained_temperature_c}°C"
                )));
            }
        }
        Ok(())
    }
}

/// Parameters for constructing a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Tare mass in kilograms.
    pub empty_mass_kg: u64,
    /// Height in centimetres.
    pub height_cm: u32,
    /// Depth in centimetres.
    pub depth_cm: u32,
    /// Maximum cargo mass in kilograms.
    pub max_load_kg: u64,
    /// Variant payload.
    pub kind: ContainerKind,
}

/// A cargo container tracked by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    serial: SerialNumber,
    empty_mass_kg: u64,
    height_cm: u32,
    depth_cm: u32,
    max_load_kg: u64,
    cargo_mass_kg: u64,
    kind: ContainerKind,
}

impl Container {
    /// Construct an empty container, drawing its serial number from `sequence`.
    ///
    /// Variant validation runs first, so a rejected container does not
    /// consume a number.
    pub fn new(spec: ContainerSpec, sequence: &mut SerialSequence) -> Result<Self> {
        spec.kind.validate()?;
        let serial = sequence.issue(spec.kind.code());
        Ok(Self {
            serial,
            empty_mass_kg: spec.empty_mass_kg,
            height_cm: spec.height_cm,
            depth_cm: spec.depth_cm,
            max_load_kg: spec.max_load_kg,
            cargo_mass_kg: 0,
            kind: spec.kind,
        })
    }

    /// Stable identity of the container.
    pub fn serial(&self) -> SerialNumber {
        self.serial
    }

    /// Variant payload.
    pub fn kind(&self) -> &ContainerKind {
        &self.kind
    }

    /// Cargo currently loaded, in kilograms.
    pub fn cargo_mass_kg(&self) -> u64 {
        self.cargo_mass_kg
    }

    /// Tare mass in kilograms.
    pub fn empty_mass_kg(&self) -> u64 {
        self.empty_mass_kg
    }

    /// Nominal cargo capacity in kilograms.
    pub fn max_load_kg(&self) -> u64 {
        self.max_load_kg
    }

    /// Height in centimetres.
    pub fn height_cm(&self) -> u32 {
        self.height_cm
    }

    /// Depth in centimetres.
    pub fn depth_cm(&self) -> u32 {
        self.depth_cm
    }

    /// Cargo plus tare, the mass a ship has to carry.
    pub fn gross_mass_kg(&self) -> u64 {
        self.cargo_mass_kg.saturating_add(self.empty_mass_kg)
    }

    /// Highest cargo mass [`Container::load_cargo`] accepts.
    pub fn allowed_load_kg(&self) -> u64 {
        match self.kind {
            ContainerKind::Liquid { dangerous: true } => self.max_load_kg / 2,
            ContainerKind::Liquid { dangerous: false } => {
                self.max_load_kg / 10 * 9 + self.max_load_kg % 10 * 9 / 10
            }
            ContainerKind::Gas { .. } | ContainerKind::Refrigerated { .. } => self.max_load_kg,
        }
    }

    /// Set the cargo mass to `mass_kg`.
    ///
    /// The mass replaces the current cargo rather than adding to it. Above the
    /// allowed threshold hazard-capable variants notify first, then every
    /// variant fails with [`FleetError::Overfill`] leaving the cargo unchanged.
    pub fn load_cargo(&mut self, mass_kg: u64, notifier: &dyn HazardNotifier) -> Result<()> {
        let allowed_kg = self.allowed_load_kg();
        if mass_kg > allowed_kg {
            if self.kind.is_hazard_capable() {
                notifier.notify(&HazardEvent::overfill(self.serial, mass_kg, allowed_kg));
            }
            return Err(FleetError::Overfill {
                serial: self.serial,
                attempted_kg: mass_kg,
                allowed_kg,
            });
        }
        debug!(container = %self.serial, mass_kg, "Cargo loaded");
        self.cargo_mass_kg = mass_kg;
        Ok(())
    }

    /// Empty the container. Gas keeps 5% of its cargo (rounded down).
    pub fn empty_cargo(&mut self) {
        self.cargo_mass_kg = match self.kind {
            ContainerKind::Gas { .. } => self.cargo_mass_kg / 20,
            ContainerKind::Liquid { .. } | ContainerKind::Refrigerated { .. } => 0,
        };
        debug!(container = %self.serial, remaining_kg = self.cargo_mass_kg, "Cargo emptied");
    }

    /// One-line description for lists.
    pub fn summary(&self) -> String {
        format!(
            "{} {} {}/{}kg",
            self.serial,
            self.kind.name(),
            self.cargo_mass_kg,
            self.max_load_kg
        )
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Container {}", self.serial)?;
        writeln!(f, "Type: {}", self.kind.name())?;
        writeln!(f, "Cargo Mass: {}kg", self.cargo_mass_kg)?;
        writeln!(f, "Container Mass: {}kg", self.empty_mass_kg)?;
        writeln!(f, "Height: {}cm", self.height_cm)?;
        writeln!(f, "Depth: {}cm", self.depth_cm)?;
        write!(f, "Max Load: {}kg", self.max_load_kg)?;
        match &self.kind {
            ContainerKind::Liquid { dangerous } => {
                write!(f, "\nDangerous Cargo: {}", if *dangerous { "yes" } else { "no" })
            }
            ContainerKind::Gas { pressure_atm } => write!(f, "\nPressure: {pressure_atm} atm"),
            ContainerKind::Refrigerated {
                product,
                maintained_temperature_c,
                minimum_temperature_c,
            } => {
                write!(f, "\nProduct: {product}")?;
                write!(f, "\nTemperature: {maintained_temperature_c}°C")?;
                write!(f, "\nMinimum Temperature: {minimum_temperature_c}°C")
            }
        }
    }
}

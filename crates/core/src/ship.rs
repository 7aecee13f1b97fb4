//! Container ships and their admission control.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    container::{Container, SerialNumber},
    error::{FleetError, Result},
    hazard::HazardNotifier,
};

/// Stable ship identifier issued by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipId(u32);

impl ShipId {
    /// Wrap a raw id.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw numeric id.
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parameters for a new ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipConfig {
    /// Display name; blank names are replaced by `Ship <id>`.
    pub name: String,
    /// Top speed in knots. Informational only.
    pub max_speed_knots: f64,
    /// Maximum number of containers aboard.
    pub max_containers: usize,
    /// Maximum gross container weight in metric tons.
    pub max_weight_tons: u64,
}

/// A ship and the containers it currently carries, in loading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    id: ShipId,
    name: String,
    max_speed_knots: f64,
    max_containers: usize,
    max_weight_kg: u64,
    containers: Vec<Container>,
}

impl Ship {
    /// Empty ship built from `config`.
    pub fn new(id: ShipId, config: ShipConfig) -> Self {
        let name = match config.name.trim() {
            "" => format!("Ship {}", id.value()),
            trimmed => trimmed.to_string(),
        };
        Self {
            id,
            name,
            max_speed_knots: config.max_speed_knots,
            max_containers: config.max_containers,
            max_weight_kg: config.max_weight_tons.saturating_mul(1000),
            containers: Vec::new(),
        }
    }

    /// Registry-issued identifier.
    pub fn id(&self) -> ShipId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top speed in knots.
    pub fn max_speed_knots(&self) -> f64 {
        self.max_speed_knots
    }

    /// Container count limit.
    pub fn max_containers(&self) -> usize {
        self.max_containers
    }

    /// Gross weight limit in kilograms.
    pub fn max_weight_kg(&self) -> u64 {
        self.max_weight_kg
    }

    /// Containers aboard, in loading order.
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Container aboard with this serial.
    pub fn container(&self, serial: SerialNumber) -> Option<&Container> {
        self.containers.iter().find(|c| c.serial() == serial)
    }

    pub(crate) fn container_mut(&mut self, serial: SerialNumber) -> Option<&mut Container> {
        self.containers.iter_mut().find(|c| c.serial() == serial)
    }

    /// Whether the container is aboard.
    pub fn contains(&self, serial: SerialNumber) -> bool {
        self.container(serial).is_some()
    }

    /// Sum of cargo and tare mass of every container aboard.
    pub fn total_weight_kg(&self) -> u64 {
        self.containers
            .iter()
            .fold(0, |total: u64, c| total.saturating_add(c.gross_mass_kg()))
    }

    /// Containers that still fit by count.
    pub fn free_slots(&self) -> usize {
        self.max_containers.saturating_sub(self.containers.len())
    }

    /// Kilograms left before the weight limit.
    pub fn remaining_weight_kg(&self) -> u64 {
        self.max_weight_kg.saturating_sub(self.total_weight_kg())
    }

    /// Check whether `container` would be admitted without taking it.
    pub fn check_admission(&self, container: &Container) -> Result<()> {
        if self.containers.len() >= self.max_containers {
            return Err(FleetError::Capacity {
                ship: self.id,
                max_containers: self.max_containers,
            });
        }
        self.check_weight(self.total_weight_kg(), container.gross_mass_kg())
    }

    /// Append a container after admission control.
    ///
    /// On rejection the container is handed back with the error so the caller
    /// keeps ownership. The ship does not verify that the container is not
    /// tracked elsewhere.
    pub fn add_container(
        &mut self,
        container: Container,
    ) -> std::result::Result<(), (FleetError, Container)> {
        match self.check_admission(&container) {
            Ok(()) => {
                self.containers.push(container);
                Ok(())
            }
            Err(err) => Err((err, container)),
        }
    }

    /// Remove and return the container with this serial, if aboard.
    pub fn remove_container(&mut self, serial: SerialNumber) -> Option<Container> {
        let position = self.containers.iter().position(|c| c.serial() == serial)?;
        Some(self.containers.remove(position))
    }

    /// Overwrite the slot holding `serial` with `replacement`, keeping the order.
    ///
    /// No admission check is made; see [`Ship::check_replacement`]. When the
    /// serial is absent the replacement is handed back.
    pub fn replace_container(
        &mut self,
        serial: SerialNumber,
        replacement: Container,
    ) -> std::result::Result<Container, Container> {
        match self.containers.iter().position(|c| c.serial() == serial) {
            Some(position) => Ok(std::mem::replace(
                &mut self.containers[position],
                replacement,
            )),
            None => Err(replacement),
        }
    }

    /// Weight check for swapping the container `serial` for `replacement`.
    ///
    /// The count is unchanged by a swap, so only the weight limit applies.
    pub fn check_replacement(&self, serial: SerialNumber, replacement: &Container) -> Result<()> {
        let outgoing = self
            .container(serial)
            .ok_or(FleetError::NotOnShip { serial, ship: self.id })?;
        let current_kg = self.total_weight_kg().saturating_sub(outgoing.gross_mass_kg());
        self.check_weight(current_kg, replacement.gross_mass_kg())
    }

    /// Set the cargo of a container aboard, keeping the ship within its
    /// weight limit.
    ///
    /// The container's own threshold is checked first, so an overfill is
    /// reported (and notified) before any weight error. Lowering the cargo is
    /// always allowed.
    pub fn load_cargo(
        &mut self,
        serial: SerialNumber,
        mass_kg: u64,
        notifier: &dyn HazardNotifier,
    ) -> Result<()> {
        let container = self
            .container(serial)
            .ok_or(FleetError::NotOnShip { serial, ship: self.id })?;
        if mass_kg <= container.allowed_load_kg() && mass_kg > container.cargo_mass_kg() {
            let others_kg = self
                .total_weight_kg()
                .saturating_sub(container.gross_mass_kg());
            self.check_weight(
                others_kg,
                container.empty_mass_kg().saturating_add(mass_kg),
            )?;
        }
        match self.container_mut(serial) {
            Some(container) => container.load_cargo(mass_kg, notifier),
            None => Err(FleetError::NotOnShip { serial, ship: self.id }),
        }
    }

    fn check_weight(&self, current_kg: u64, added_kg: u64) -> Result<()> {
        match current_kg.checked_add(added_kg) {
            Some(total) if total <= self.max_weight_kg => Ok(()),
            _ => Err(FleetError::Weight {
                ship: self.id,
                current_kg,
                added_kg,
                max_kg: self.max_weight_kg,
            }),
        }
    }

    pub(crate) fn take_all(&mut self) -> Vec<Container> {
        std::mem::take(&mut self.containers)
    }
}

impl fmt::Display for Ship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ship {} {}", self.id, self.name)?;
        writeln!(f, "Max Speed: {} knots", self.max_speed_knots)?;
        writeln!(
            f,
            "Containers: {}/{}",
            self.containers.len(),
            self.max_containers
        )?;
        write!(
            f,
            "Weight: {}kg/{}kg",
            self.total_weight_kg(),
            self.max_weight_kg
        )?;
        for container in &self.containers {
            write!(f, "\n  {}", container.summary())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        container::{ContainerKind, ContainerSpec, SerialSequence},
        hazard::SilentNotifier,
    };

    fn ship(max_containers: usize, max_weight_tons: u64) -> Ship {
        Ship::new(
            ShipId::new(1),
            ShipConfig {
                name: "Aurora".to_string(),
                max_speed_knots: 18.5,
                max_containers,
                max_weight_tons,
            },
        )
    }

    fn liquid(sequence: &mut SerialSequence, empty_mass_kg: u64) -> Container {
        Container::new(
            ContainerSpec {
                empty_mass_kg,
                height_cm: 250,
                depth_cm: 600,
                max_load_kg: 2000,
                kind: ContainerKind::Liquid { dangerous: false },
            },
            sequence,
        )
        .expect("liquid containers always validate")
    }

    #[test]
    fn full_ship_rejects_further_containers() {
        let mut sequence = SerialSequence::new();
        let mut ship = ship(1, 1);
        ship.add_container(liquid(&mut sequence, 500))
            .expect("first container fits");

        let second = liquid(&mut sequence, 1);
        let serial = second.serial();
        let (err, returned) = ship.add_container(second).unwrap_err();
        assert_eq!(
            err,
            FleetError::Capacity {
                ship: ShipId::new(1),
                max_containers: 1
            }
        );
        assert_eq!(returned.serial(), serial);
        assert_eq!(ship.containers().len(), 1);
    }

    #[test]
    fn weight_limit_counts_cargo_and_tare() -> anyhow::Result<()> {
        let mut sequence = SerialSequence::new();
        let mut ship = ship(5, 2);
        let mut heavy = liquid(&mut sequence, 500);
        heavy.load_cargo(1000, &SilentNotifier)?;
        ship.add_container(heavy).map_err(|(err, _)| err)?;
        assert_eq!(ship.total_weight_kg(), 1500);

        let (err, _) = ship
            .add_container(liquid(&mut sequence, 501))
            .unwrap_err();
        assert!(matches!(err, FleetError::Weight { current_kg: 1500, added_kg: 501, max_kg: 2000, .. }));
        ship.add_container(liquid(&mut sequence, 500))
            .map_err(|(err, _)| err)?;
        assert_eq!(ship.remaining_weight_kg(), 0);
        assert_eq!(ship.free_slots(), 3);
        Ok(())
    }

    #[test]
    fn admission_math_saturates_on_huge_values() {
        let mut sequence = SerialSequence::new();
        let roomy = ship(2, u64::MAX / 100);
        assert_eq!(roomy.max_weight_kg(), u64::MAX);

        let mut small = ship(2, 1);
        small.add_container(liquid(&mut sequence, 100)).expect("fits");
        let (err, _) = small
            .add_container(liquid(&mut sequence, u64::MAX))
            .unwrap_err();
        assert_eq!(
            err,
            FleetError::Weight {
                ship: ShipId::new(1),
                current_kg: 100,
                added_kg: u64::MAX,
                max_kg: 1000
            }
        );
        assert_eq!(small.total_weight_kg(), 100);
    }

    #[test]
    fn loading_aboard_checks_the_weight_limit() -> anyhow::Result<()> {
        let mut sequence = SerialSequence::new();
        let mut ship = ship(2, 2);
        let container = liquid(&mut sequence, 500);
        let serial = container.serial();
        ship.add_container(container).map_err(|(err, _)| err)?;
        ship.add_container(liquid(&mut sequence, 600))
            .map_err(|(err, _)| err)?;

        let err = ship.load_cargo(serial, 901, &SilentNotifier).unwrap_err();
        assert!(matches!(err, FleetError::Weight { current_kg: 600, added_kg: 1401, .. }));
        assert_eq!(ship.container(serial).map(Container::cargo_mass_kg), Some(0));

        ship.load_cargo(serial, 900, &SilentNotifier)?;
        assert_eq!(ship.remaining_weight_kg(), 0);
        let err = ship.load_cargo(serial, 2000, &SilentNotifier).unwrap_err();
        assert!(matches!(err, FleetError::Overfill { .. }));
        ship.load_cargo(serial, 100, &SilentNotifier)?;
        assert_eq!(ship.total_weight_kg(), 1200);
        Ok(())
    }

    #[test]
    fn remove_returns_matching_container_only() {
        let mut sequence = SerialSequence::new();
        let mut ship = ship(3, 10);
        let first = liquid(&mut sequence, 100);
        let first_serial = first.serial();
        ship.add_container(first).expect("fits");

        let missing = SerialNumber::new(first_serial.code(), 99);
        assert!(ship.remove_container(missing).is_none());
        let removed = ship.remove_container(first_serial).expect("aboard");
        assert_eq!(removed.serial(), first_serial);
        assert!(ship.containers().is_empty());
    }

    #[test]
    fn replace_keeps_slot_order() {
        let mut sequence = SerialSequence::new();
        let mut ship = ship(3, 10);
        let serials: Vec<_> = (0..3)
            .map(|_| {
                let container = liquid(&mut sequence, 100);
                let serial = container.serial();
                ship.add_container(container).expect("fits");
                serial
            })
            .collect();

        let replacement = liquid(&mut sequence, 200);
        let replacement_serial = replacement.serial();
        let old = ship
            .replace_container(serials[1], replacement)
            .expect("middle container aboard");
        assert_eq!(old.serial(), serials[1]);
        let order: Vec<_> = ship.containers().iter().map(Container::serial).collect();
        assert_eq!(order, vec![serials[0], replacement_serial, serials[2]]);

        let stray = liquid(&mut sequence, 100);
        assert!(ship.replace_container(serials[1], stray).is_err());
    }

    #[test]
    fn replacement_check_discounts_outgoing_container() {
        let mut sequence = SerialSequence::new();
        let mut ship = ship(2, 1);
        let outgoing = liquid(&mut sequence, 600);
        let serial = outgoing.serial();
        ship.add_container(outgoing).expect("fits");

        assert!(ship.check_replacement(serial, &liquid(&mut sequence, 1000)).is_ok());
        let err = ship
            .check_replacement(serial, &liquid(&mut sequence, 1001))
            .unwrap_err();
        assert!(matches!(err, FleetError::Weight { .. }));
    }

    #[test]
    fn rendering_lists_containers() {
        let mut sequence = SerialSequence::new();
        let mut ship = ship(2, 3);
        ship.add_container(liquid(&mut sequence, 100)).expect("fits");
        let text = ship.to_string();
        assert!(text.starts_with("Ship #1 Aurora"));
        assert!(text.contains("Containers: 1/2"));
        assert!(text.contains("Weight: 100kg/3000kg"));
        assert!(text.contains("KON-L-1 Liquid 0/2000kg"));
    }
}

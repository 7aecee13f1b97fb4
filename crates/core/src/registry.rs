//! Fleet registry owning every ship and every unassigned container.
//!
//! Each container lives in exactly one place: the free pool or a single
//! ship. All movement between those places goes through [`Registry`], and
//! every operation either completes or leaves both pools untouched.

use std::{collections::HashSet, sync::Arc};

use tracing::{debug, info};

use crate::{
    config::FleetConfig,
    container::{Container, ContainerSpec, SerialNumber, SerialSequence},
    error::{FleetError, Result},
    hazard::{HazardNotifier, TracingNotifier},
    ship::{Ship, ShipConfig, ShipId},
};

/// Where a container currently resides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Waiting in the free pool.
    Free,
    /// Aboard the given ship.
    Ship(ShipId),
}

/// Borrowed view of a tracked container together with its location.
#[derive(Debug, Clone, Copy)]
pub struct ContainerRef<'a> {
    /// The container itself.
    pub container: &'a Container,
    /// Where it resides.
    pub location: Location,
}

/// In-memory fleet controller.
pub struct Registry {
    ships: Vec<Ship>,
    free: Vec<Container>,
    sequence: SerialSequence,
    last_ship_id: u32,
    notifier: Arc<dyn HazardNotifier>,
    config: FleetConfig,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Empty registry with default policy, logging hazards through tracing.
    pub fn new() -> Self {
        Self::with_config(FleetConfig::default())
    }

    /// Empty registry using the given policy.
    pub fn with_config(config: FleetConfig) -> Self {
        Self {
            ships: Vec::new(),
            free: Vec::new(),
            sequence: SerialSequence::new(),
            last_ship_id: 0,
            notifier: Arc::new(TracingNotifier),
            config,
        }
    }

    /// Replace the hazard observer.
    pub fn with_notifier(mut self, notifier: impl HazardNotifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Replace the serial number source.
    pub fn with_sequence(mut self, sequence: SerialSequence) -> Self {
        self.sequence = sequence;
        self
    }

    /// Active policy.
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Ships in creation order.
    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// Ship with this id, if it exists.
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.iter().find(|ship| ship.id() == id)
    }

    /// Containers not assigned to any ship, in arrival order.
    pub fn free_containers(&self) -> &[Container] {
        &self.free
    }

    /// Number of containers tracked anywhere.
    pub fn container_count(&self) -> usize {
        self.free.len() + self.ships.iter().map(|s| s.containers().len()).sum::<usize>()
    }

    /// Create an empty ship and return its id.
    pub fn add_ship(&mut self, config: ShipConfig) -> ShipId {
        self.last_ship_id += 1;
        let id = ShipId::new(self.last_ship_id);
        let ship = Ship::new(id, config);
        info!(ship = %id, name = ship.name(), "Ship added");
        self.ships.push(ship);
        id
    }

    /// Discard a ship after returning its containers to the free pool in order.
    pub fn remove_ship(&mut self, id: ShipId) -> Result<()> {
        let index = self.ship_index(id)?;
        let mut ship = self.ships.remove(index);
        let returned = ship.take_all();
        info!(ship = %id, returned = returned.len(), "Ship removed");
        self.free.extend(returned);
        Ok(())
    }

    /// Construct a container and put it in the free pool.
    pub fn create_container(&mut self, spec: ContainerSpec) -> Result<SerialNumber> {
        let container = Container::new(spec, &mut self.sequence).map_err(|err| {
            debug!(%err, "Container rejected");
            err
        })?;
        let serial = container.serial();
        info!(container = %serial, kind = container.kind().name(), "Container created");
        self.free.push(container);
        Ok(serial)
    }

    /// Load cargo into a container wherever it resides.
    ///
    /// Aboard a ship the new cargo must also fit the ship's weight limit.
    pub fn load_into(&mut self, serial: SerialNumber, mass_kg: u64) -> Result<()> {
        let notifier = Arc::clone(&self.notifier);
        if let Some(container) = self.free.iter_mut().find(|c| c.serial() == serial) {
            container.load_cargo(mass_kg, notifier.as_ref())?;
        } else {
            let ship = self
                .ships
                .iter_mut()
                .find(|ship| ship.contains(serial))
                .ok_or(FleetError::ContainerNotFound(serial))?;
            if let Err(err) = ship.load_cargo(serial, mass_kg, notifier.as_ref()) {
                debug!(%err, container = %serial, ship = %ship.id(), "Load rejected");
                return Err(err);
            }
        }
        info!(container = %serial, mass_kg, "Cargo loaded");
        Ok(())
    }

    /// Empty a container wherever it resides.
    pub fn unload(&mut self, serial: SerialNumber) -> Result<()> {
        let container = self
            .container_mut(serial)
            .ok_or(FleetError::ContainerNotFound(serial))?;
        container.empty_cargo();
        info!(container = %serial, remaining_kg = container.cargo_mass_kg(), "Cargo emptied");
        Ok(())
    }

    /// Move a free container aboard a ship.
    pub fn place_on_ship(&mut self, serial: SerialNumber, ship_id: ShipId) -> Result<()> {
        let ship_index = self.ship_index(ship_id)?;
        let free_index = self.free_index(serial)?;
        if let Err(err) = self.ships[ship_index].check_admission(&self.free[free_index]) {
            debug!(%err, container = %serial, ship = %ship_id, "Placement rejected");
            return Err(err);
        }
        let container = self.free.remove(free_index);
        if let Err((err, container)) = self.ships[ship_index].add_container(container) {
            self.free.insert(free_index, container);
            return Err(err);
        }
        info!(container = %serial, ship = %ship_id, "Container placed");
        Ok(())
    }

    /// Place several free containers, each attempt independent of the others.
    ///
    /// Results come back in the order the serials were given.
    pub fn place_many_on_ship(
        &mut self,
        serials: &[SerialNumber],
        ship_id: ShipId,
    ) -> Vec<(SerialNumber, Result<()>)> {
        serials
            .iter()
            .map(|&serial| (serial, self.place_on_ship(serial, ship_id)))
            .collect()
    }

    /// Take a container off a ship and return it to the free pool.
    pub fn remove_from_ship(&mut self, ship_id: ShipId, serial: SerialNumber) -> Result<()> {
        let ship_index = self.ship_index(ship_id)?;
        let container = match self.ships[ship_index].remove_container(serial) {
            Some(container) => container,
            None => return Err(self.missing_from_ship(serial, ship_id)),
        };
        self.free.push(container);
        info!(container = %serial, ship = %ship_id, "Container unloaded to free pool");
        Ok(())
    }

    /// Swap a container aboard a ship for one from the free pool.
    ///
    /// The outgoing container stops being tracked and is handed to the
    /// caller. With [`FleetConfig::revalidate_replacements`] set, a swap that
    /// would overload the ship fails with [`FleetError::Weight`].
    pub fn replace_on_ship(
        &mut self,
        ship_id: ShipId,
        old: SerialNumber,
        new: SerialNumber,
    ) -> Result<Container> {
        let ship_index = self.ship_index(ship_id)?;
        if !self.ships[ship_index].contains(old) {
            return Err(self.missing_from_ship(old, ship_id));
        }
        let free_index = self.free_index(new)?;
        if self.config.revalidate_replacements {
            self.ships[ship_index].check_replacement(old, &self.free[free_index])?;
        }

        let replacement = self.free.remove(free_index);
        match self.ships[ship_index].replace_container(old, replacement) {
            Ok(outgoing) => {
                info!(ship = %ship_id, old = %old, new = %new, "Container replaced");
                Ok(outgoing)
            }
            Err(replacement) => {
                self.free.insert(free_index, replacement);
                Err(FleetError::NotOnShip {
                    serial: old,
                    ship: ship_id,
                })
            }
        }
    }

    /// Move a container from one ship to another.
    ///
    /// The destination's admission control runs first; on rejection the
    /// container stays on the source ship.
    pub fn transfer_between_ships(
        &mut self,
        source: ShipId,
        serial: SerialNumber,
        destination: ShipId,
    ) -> Result<()> {
        if source == destination {
            return Err(FleetError::SameShip(source));
        }
        let source_index = self.ship_index(source)?;
        let destination_index = self.ship_index(destination)?;
        let container = self.ships[source_index]
            .container(serial)
            .ok_or_else(|| self.missing_from_ship(serial, source))?;
        if let Err(err) = self.ships[destination_index].check_admission(container) {
            debug!(%err, container = %serial, from = %source, to = %destination, "Transfer rejected");
            return Err(err);
        }

        let container = self.ships[source_index]
            .remove_container(serial)
            .ok_or(FleetError::NotOnShip {
                serial,
                ship: source,
            })?;
        if let Err((err, container)) = self.ships[destination_index].add_container(container) {
            self.ships[source_index]
                .add_container(container)
                .map_err(|(restore_err, _)| restore_err)?;
            return Err(err);
        }
        info!(container = %serial, from = %source, to = %destination, "Container transferred");
        Ok(())
    }

    /// Look a container up in the free pool, then each ship in order.
    pub fn find_container(&self, serial: SerialNumber) -> Option<ContainerRef<'_>> {
        if let Some(container) = self.free.iter().find(|c| c.serial() == serial) {
            return Some(ContainerRef {
                container,
                location: Location::Free,
            });
        }
        self.ships.iter().find_map(|ship| {
            ship.container(serial).map(|container| ContainerRef {
                container,
                location: Location::Ship(ship.id()),
            })
        })
    }

    pub fn locate(&self, serial: SerialNumber) -> Option<Location> {
        self.find_container(serial).map(|found| found.location)
    }

    /// Verify that every container is tracked once and every ship is within
    /// its limits.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let all = self
            .free
            .iter()
            .chain(self.ships.iter().flat_map(|ship| ship.containers()));
        for container in all {
            if !seen.insert(container.serial()) {
                return Err(FleetError::validation(format!(
                    "container {} is tracked more than once",
                    container.serial()
                )));
            }
        }
        for ship in &self.ships {
            if ship.containers().len() > ship.max_containers() {
                return Err(FleetError::Capacity {
                    ship: ship.id(),
                    max_containers: ship.max_containers(),
                });
            }
            if ship.total_weight_kg() > ship.max_weight_kg() {
                return Err(FleetError::Weight {
                    ship: ship.id(),
                    current_kg: ship.total_weight_kg(),
                    added_kg: 0,
                    max_kg: ship.max_weight_kg(),
                });
            }
        }
        Ok(())
    }

    fn ship_index(&self, id: ShipId) -> Result<usize> {
        self.ships
            .iter()
            .position(|ship| ship.id() == id)
            .ok_or(FleetError::ShipNotFound(id))
    }

    fn free_index(&self, serial: SerialNumber) -> Result<usize> {
        match self.free.iter().position(|c| c.serial() == serial) {
            Some(index) => Ok(index),
            None if self.locate(serial).is_some() => Err(FleetError::NotInFreePool(serial)),
            None => Err(FleetError::ContainerNotFound(serial)),
        }
    }

    fn missing_from_ship(&self, serial: SerialNumber, ship: ShipId) -> FleetError {
        match self.locate(serial) {
            Some(_) => FleetError::NotOnShip { serial, ship },
            None => FleetError::ContainerNotFound(serial),
        }
    }

    fn container_mut(&mut self, serial: SerialNumber) -> Option<&mut Container> {
        if let Some(index) = self.free.iter().position(|c| c.serial() == serial) {
            return self.free.get_mut(index);
        }
        self.ships
            .iter_mut()
            .find_map(|ship| ship.container_mut(serial))
    }
}

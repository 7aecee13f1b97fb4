//! Error taxonomy shared by every fleet operation.

use thiserror::Error;

use crate::{container::SerialNumber, ship::ShipId};

/// Result alias for fleet operations.
pub type Result<T> = std::result::Result<T, FleetError>;

/// Coarse classification of a [`FleetError`], used by frontends to pick a
/// presentation without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A load request exceeded the container's allowed threshold.
    Overfill,
    /// A ship already holds its maximum number of containers.
    Capacity,
    /// A ship's aggregate weight would exceed its tonnage limit.
    Weight,
    /// Parameters violate a construction or operation precondition.
    Validation,
    /// An identifier does not resolve to a tracked entity.
    NotFound,
}

/// Errors returned by containers, ships and the registry.
///
/// All variants are recoverable; a failed operation leaves the registry in the
/// state it had before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FleetError {
    /// Requested cargo mass is above the variant-specific limit.
    #[error("cannot load {attempted_kg}kg into {serial}: allowed maximum is {allowed_kg}kg")]
    Overfill {
        /// Container that refused the load.
        serial: SerialNumber,
        /// Requested cargo mass.
        attempted_kg: u64,
        /// Highest mass the container accepts.
        allowed_kg: u64,
    },

    /// Ship is already at its container count limit.
    #[error("ship {ship} already carries the maximum of {max_containers} containers")]
    Capacity {
        /// Ship that is full.
        ship: ShipId,
        /// Its container count limit.
        max_containers: usize,
    },

    /// Adding the container would push the ship over its weight limit.
    #[error(
        "ship {ship} cannot take {added_kg}kg more: {current_kg}kg of {max_kg}kg already loaded"
    )]
    Weight {
        /// Ship whose limit would be exceeded.
        ship: ShipId,
        /// Weight aboard that stays in place.
        current_kg: u64,
        /// Weight the operation would add.
        added_kg: u64,
        /// The ship's limit.
        max_kg: u64,
    },

    /// Invalid construction or operation parameters.
    #[error("invalid parameters: {0}")]
    Validation(String),

    /// No container with this serial number is tracked.
    #[error("container {0} not found")]
    ContainerNotFound(SerialNumber),

    /// No ship with this id exists.
    #[error("ship {0} not found")]
    ShipNotFound(ShipId),

    /// The container exists but is not waiting in the free pool.
    #[error("container {0} is not in the free pool")]
    NotInFreePool(SerialNumber),

    /// The container exists but is not aboard the given ship.
    #[error("container {serial} is not aboard ship {ship}")]
    NotOnShip {
        /// Container looked up.
        serial: SerialNumber,
        /// Ship it was expected on.
        ship: ShipId,
    },

    /// Transfer source and destination are the same ship.
    #[error("cannot transfer within ship {0}: source and destination must differ")]
    SameShip(ShipId),
}

impl FleetError {
    /// Classify the error into the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Overfill { .. } => ErrorKind::Overfill,
            Self::Capacity { .. } => ErrorKind::Capacity,
            Self::Weight { .. } => ErrorKind::Weight,
            Self::Validation(_) | Self::SameShip(_) => ErrorKind::Validation,
            Self::ContainerNotFound(_)
            | Self::ShipNotFound(_)
            | Self::NotInFreePool(_)
            | Self::NotOnShip { .. } => ErrorKind::NotFound,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::TypeCode;

    #[test]
    fn not_found_variants_share_a_kind() {
        let serial = SerialNumber::new(TypeCode::Liquid, 7);
        let ship = ShipId::new(2);
        assert_eq!(FleetError::ContainerNotFound(serial).kind(), ErrorKind::NotFound);
        assert_eq!(FleetError::ShipNotFound(ship).kind(), ErrorKind::NotFound);
        assert_eq!(FleetError::NotInFreePool(serial).kind(), ErrorKind::NotFound);
        assert_eq!(
            FleetError::NotOnShip { serial, ship }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(FleetError::SameShip(ship).kind(), ErrorKind::Validation);
    }

    #[test]
    fn overfill_message_names_both_masses() {
        let err = FleetError::Overfill {
            serial: SerialNumber::new(TypeCode::Gas, 3),
            attempted_kg: 1200,
            allowed_kg: 1000,
        };
        let message = err.to_string();
        assert!(message.contains("KON-G-3"));
        assert!(message.contains("1200kg"));
        assert!(message.contains("1000kg"));
    }
}

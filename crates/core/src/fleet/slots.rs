//! Module installation, removal and swapping on a single ship.

use tracing::debug;

use super::FleetError;
use crate::models::slot::{
    compartment_size, hardpoint_size, sort_compartments, sort_hardpoints,
};
use crate::models::{Compartment, Hardpoint, Module, Ship, SlotKind};

fn compartment_index(ship: &mut Ship, slot: &str) -> Result<usize, FleetError> {
    if let Some(index) = ship
        .compartments
        .iter()
        .position(|compartment| compartment.name.eq_ignore_ascii_case(slot))
    {
        return Ok(index);
    }
    let size = compartment_size(slot, ship.military_size).ok_or_else(|| {
        FleetError::UnknownSlotSize {
            ship_id: ship.local_id,
            slot: slot.to_string(),
        }
    })?;
    ship.compartments.push(Compartment {
        name: slot.to_string(),
        size,
        module: None,
    });
    Ok(ship.compartments.len() - 1)
}

fn hardpoint_index(ship: &mut Ship, slot: &str) -> Result<usize, FleetError> {
    if let Some(index) = ship
        .hardpoints
        .iter()
        .position(|hardpoint| hardpoint.name.eq_ignore_ascii_case(slot))
    {
        return Ok(index);
    }
    let size = hardpoint_size(slot).ok_or_else(|| FleetError::UnknownSlotSize {
        ship_id: ship.local_id,
        slot: slot.to_string(),
    })?;
    ship.hardpoints.push(Hardpoint {
        name: slot.to_string(),
        size,
        module: None,
    });
    Ok(ship.hardpoints.len() - 1)
}

/// Refuse a compartment module whose size class exceeds the compartment.
fn check_fits(ship: &Ship, index: usize, module: &Module) -> Result<(), FleetError> {
    let compartment = &ship.compartments[index];
    if module.class > compartment.size {
        return Err(FleetError::UnsupportedSlot {
            ship_id: ship.local_id,
            slot: compartment.name.clone(),
            module: module.edname.clone(),
        });
    }
    Ok(())
}

/// Install `module` into `slot`, creating the slot when it has not been seen yet.
pub(crate) fn install(ship: &mut Ship, slot: &str, module: Module) -> Result<(), FleetError> {
    match SlotKind::classify(slot) {
        SlotKind::Core(core) => {
            ship.core.set(core, Some(module));
        }
        SlotKind::PaintJob => ship.paintjob = Some(module.edname),
        SlotKind::Compartment => {
            let index = compartment_index(ship, slot)?;
            check_fits(ship, index, &module)?;
            ship.compartments[index].module = Some(module);
            sort_compartments(&mut ship.compartments);
        }
        SlotKind::Hardpoint => {
            let index = hardpoint_index(ship, slot)?;
            ship.hardpoints[index].module = Some(module);
            sort_hardpoints(&mut ship.hardpoints);
        }
        SlotKind::Cosmetic => {
            debug!(ship_id = %ship.local_id, slot, "Ignoring cosmetic slot");
        }
    }
    Ok(())
}

/// Empty `slot`, putting `replacement` there in the same step. Returns the removed module.
///
/// Emptied compartments and hardpoints stay in place with no module.
pub(crate) fn remove(
    ship: &mut Ship,
    slot: &str,
    replacement: Option<Module>,
) -> Result<Option<Module>, FleetError> {
    let removed = match SlotKind::classify(slot) {
        SlotKind::Core(core) => ship.core.set(core, replacement),
        SlotKind::PaintJob => {
            ship.paintjob = replacement.map(|module| module.edname);
            None
        }
        SlotKind::Compartment => {
            let existing = ship
                .compartments
                .iter()
                .position(|compartment| compartment.name.eq_ignore_ascii_case(slot));
            let index = match (existing, &replacement) {
                (Some(index), _) => index,
                (None, Some(_)) => compartment_index(ship, slot)?,
                (None, None) => return Ok(None),
            };
            if let Some(module) = &replacement {
                check_fits(ship, index, module)?;
            }
            let removed = std::mem::replace(&mut ship.compartments[index].module, replacement);
            sort_compartments(&mut ship.compartments);
            removed
        }
        SlotKind::Hardpoint => {
            let existing = ship
                .hardpoints
                .iter()
                .position(|hardpoint| hardpoint.name.eq_ignore_ascii_case(slot));
            let index = match (existing, &replacement) {
                (Some(index), _) => index,
                (None, Some(_)) => hardpoint_index(ship, slot)?,
                (None, None) => return Ok(None),
            };
            let removed = std::mem::replace(&mut ship.hardpoints[index].module, replacement);
            sort_hardpoints(&mut ship.hardpoints);
            removed
        }
        SlotKind::Cosmetic => None,
    };
    Ok(removed)
}

/// Exchange the modules of two compartments or two hardpoints.
pub(crate) fn swap(ship: &mut Ship, from: &str, to: &str) -> Result<(), FleetError> {
    match (SlotKind::classify(from), SlotKind::classify(to)) {
        (SlotKind::Compartment, SlotKind::Compartment) => {
            let a = compartment_index(ship, from)?;
            let b = compartment_index(ship, to)?;
            if a != b {
                let taken = ship.compartments[a].module.take();
                ship.compartments[a].module = ship.compartments[b].module.take();
                ship.compartments[b].module = taken;
            }
            sort_compartments(&mut ship.compartments);
            Ok(())
        }
        (SlotKind::Hardpoint, SlotKind::Hardpoint) => {
            let a = hardpoint_index(ship, from)?;
            let b = hardpoint_index(ship, to)?;
            if a != b {
                let taken = ship.hardpoints[a].module.take();
                ship.hardpoints[a].module = ship.hardpoints[b].module.take();
                ship.hardpoints[b].module = taken;
            }
            sort_hardpoints(&mut ship.hardpoints);
            Ok(())
        }
        _ => Err(FleetError::IncompatibleSwap {
            ship_id: ship.local_id,
            from_slot: from.to_string(),
            to_slot: to.to_string(),
        }),
    }
}

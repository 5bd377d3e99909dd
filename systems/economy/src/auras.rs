//! Aura pass: support structures heal, shield and buff their surroundings.

use gridfort_core::{
    cells_within, level_multiplier, AuraBuffs, BuildingSnapshot, BuildingView, CellCoord, Command,
};
use gridfort_registry::{AuraKind, Registry};
use gridfort_system_hooks::{AuraTickEvent, HookChain};

/// Aura system that projects every powered support structure's effect.
#[derive(Debug, Default)]
pub struct Auras {
    range_bonus: Vec<(CellCoord, f32)>,
}

impl Auras {
    /// Creates a new aura system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits repair, shield and buff commands for the current economic tick.
    ///
    /// Always ends with exactly one `Command::SetAuraBuffs`, replacing the
    /// buffs of the previous tick.
    pub fn handle(
        &mut self,
        registry: &Registry,
        grid_size: u32,
        level_scaling: f32,
        buildings: &BuildingView,
        out: &mut Vec<Command>,
    ) {
        self.range_bonus.clear();
        let mut global_damage = 0.0;
        let mut global_fire_rate = 0.0;

        for building in buildings.iter().filter(|building| building.powered) {
            let Some(profile) = registry.building(building.kind).support else {
                continue;
            };
            let seed = AuraTickEvent {
                building: *building,
                radius: profile.radius,
                strength: profile.strength_at(level_multiplier(building.level, level_scaling)),
            };
            let aura = HookChain::for_building(registry, building).dispatch(seed);
            let strength = aura.strength.max(0.0);

            match profile.aura {
                AuraKind::Heal => {
                    for target in neighbours(building, aura.radius, grid_size, buildings) {
                        if target.health < target.max_health {
                            out.push(Command::RepairCell {
                                cell: target.cell,
                                amount: strength,
                            });
                        }
                    }
                }
                AuraKind::ShieldRefresh => {
                    for target in neighbours(building, aura.radius, grid_size, buildings) {
                        out.push(Command::ChargeShield {
                            cell: target.cell,
                            amount: strength,
                        });
                    }
                }
                AuraKind::RangeBuff => {
                    for target in neighbours(building, aura.radius, grid_size, buildings) {
                        if registry.building(target.kind).weapon.is_some() {
                            self.raise_range_bonus(target.cell, strength);
                        }
                    }
                }
                AuraKind::GlobalDamage => global_damage += strength,
                AuraKind::GlobalFireRate => global_fire_rate += strength,
                AuraKind::GlobalHeal => {
                    for target in buildings.iter() {
                        if target.health < target.max_health {
                            out.push(Command::RepairCell {
                                cell: target.cell,
                                amount: strength,
                            });
                        }
                    }
                }
                AuraKind::SlowField => {}
            }
        }

        out.push(Command::SetAuraBuffs {
            buffs: AuraBuffs::new(
                std::mem::take(&mut self.range_bonus),
                global_damage,
                global_fire_rate,
            ),
        });
    }

    fn raise_range_bonus(&mut self, cell: CellCoord, bonus: f32) {
        match self.range_bonus.iter_mut().find(|(candidate, _)| *candidate == cell) {
            Some(entry) => entry.1 = entry.1.max(bonus),
            None => self.range_bonus.push((cell, bonus)),
        }
    }
}

/// Structures whose cells lie within `radius` of `source`, row-major.
fn neighbours<'a>(
    source: &BuildingSnapshot,
    radius: f32,
    grid_size: u32,
    buildings: &'a BuildingView,
) -> impl Iterator<Item = &'a BuildingSnapshot> + 'a {
    cells_within(source.cell.center(), radius, grid_size).filter_map(move |cell| buildings.get(cell))
}

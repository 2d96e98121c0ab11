//! Production recipes and assembly costs.
//!
//! All manufacturing conversions in the game are fixed recipes. Factories
//! convert inputs to outputs via [`recipe`]; supply units and combat units
//! have their own assembly costs. Extraction at Fields costs credits
//! rather than goods.

use std::collections::BTreeMap;

use burnrate_types::{Resource, UnitKind};

/// Credits charged per unit extracted at a Field.
pub const EXTRACTION_COST_PER_UNIT: i64 = 5;

/// The input goods required to produce one unit of a manufactured
/// resource, or `None` for raw resources (which are extracted, not made).
pub fn recipe(output: Resource) -> Option<BTreeMap<Resource, u32>> {
    let mut inputs = BTreeMap::new();
    match output {
        Resource::Ore | Resource::Fuel | Resource::Grain | Resource::Fiber => return None,
        Resource::Metal => {
            inputs.insert(Resource::Ore, 2);
            inputs.insert(Resource::Fuel, 1);
        }
        Resource::Chemicals => {
            inputs.insert(Resource::Ore, 1);
            inputs.insert(Resource::Fuel, 2);
        }
        Resource::Rations => {
            inputs.insert(Resource::Grain, 3);
            inputs.insert(Resource::Fuel, 1);
        }
        Resource::Textiles => {
            inputs.insert(Resource::Fiber, 2);
            inputs.insert(Resource::Chemicals, 1);
        }
        Resource::Ammo => {
            inputs.insert(Resource::Metal, 1);
            inputs.insert(Resource::Chemicals, 1);
        }
        Resource::Medkits => {
            inputs.insert(Resource::Chemicals, 1);
            inputs.insert(Resource::Textiles, 1);
        }
        Resource::Parts => {
            inputs.insert(Resource::Metal, 1);
            inputs.insert(Resource::Textiles, 1);
        }
        Resource::Comms => {
            inputs.insert(Resource::Metal, 1);
            inputs.insert(Resource::Chemicals, 1);
            inputs.insert(Resource::Parts, 1);
        }
    }
    Some(inputs)
}

/// The goods consumed to assemble `amount` supply units:
/// 2 rations + 1 fuel + 1 parts + 1 ammo per SU.
pub fn supply_unit_cost(amount: u32) -> BTreeMap<Resource, u32> {
    let mut inputs = BTreeMap::new();
    inputs.insert(Resource::Rations, amount.saturating_mul(2));
    inputs.insert(Resource::Fuel, amount);
    inputs.insert(Resource::Parts, amount);
    inputs.insert(Resource::Ammo, amount);
    inputs
}

/// The goods consumed to build one combat unit.
pub fn unit_build_cost(kind: UnitKind) -> BTreeMap<Resource, u32> {
    let mut inputs = BTreeMap::new();
    match kind {
        UnitKind::Escort => {
            inputs.insert(Resource::Metal, 2);
            inputs.insert(Resource::Parts, 1);
            inputs.insert(Resource::Rations, 1);
        }
        UnitKind::Raider => {
            inputs.insert(Resource::Metal, 2);
            inputs.insert(Resource::Parts, 2);
            inputs.insert(Resource::Comms, 1);
        }
    }
    inputs
}

/// Multiply a recipe by a batch quantity, saturating on overflow.
pub fn scale(inputs: &BTreeMap<Resource, u32>, batches: u32) -> BTreeMap<Resource, u32> {
    inputs
        .iter()
        .map(|(r, q)| (*r, q.saturating_mul(batches)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn raw_resources_have_no_recipe() {
        for raw in Resource::RAW {
            assert!(recipe(raw).is_none());
        }
    }

    #[test]
    fn every_manufactured_resource_has_a_recipe() {
        for resource in Resource::ALL {
            if !resource.is_raw() {
                assert!(recipe(resource).is_some(), "{resource:?} missing recipe");
            }
        }
    }

    #[test]
    fn comms_recipe_matches_design() {
        let inputs = recipe(Resource::Comms).unwrap();
        assert_eq!(inputs.get(&Resource::Metal), Some(&1));
        assert_eq!(inputs.get(&Resource::Chemicals), Some(&1));
        assert_eq!(inputs.get(&Resource::Parts), Some(&1));
    }

    #[test]
    fn supply_unit_cost_scales_with_amount() {
        let cost = supply_unit_cost(3);
        assert_eq!(cost.get(&Resource::Rations), Some(&6));
        assert_eq!(cost.get(&Resource::Fuel), Some(&3));
        assert_eq!(cost.get(&Resource::Parts), Some(&3));
        assert_eq!(cost.get(&Resource::Ammo), Some(&3));
    }

    #[test]
    fn scale_multiplies_every_input() {
        let metal = recipe(Resource::Metal).unwrap();
        let batch = scale(&metal, 4);
        assert_eq!(batch.get(&Resource::Ore), Some(&8));
        assert_eq!(batch.get(&Resource::Fuel), Some(&4));
    }
}

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The seven atomic dimensions every declared unit eventually expands to.
pub const BASE_UNITS: [&str; 7] = ["s", "m", "kg", "A", "K", "mol", "cd"];

/// Declared unit name -> its definition.
pub type UnitTable = HashMap<String, UnitType>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Unit {
    pub name: String,
    pub power: i32,
}

impl Unit {
    pub fn new(name: &str, power: i32) -> Self {
        Self {
            name: name.to_string(),
            power,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.power == 1 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}^{}", self.name, self.power)
        }
    }
}

/// A unit vector such as `kg*m*s^-2`. Equality derived here is structural;
/// dimensional equality goes through [`equivalent`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitType {
    pub units: Vec<Unit>,
}

impl UnitType {
    pub fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    pub fn dimensionless() -> Self {
        Self::default()
    }

    pub fn is_dimensionless(&self) -> Result<bool, UnitError> {
        Ok(normalize(&self.units)?.is_empty())
    }

    /// Compares two vectors as unordered multisets, after combining duplicate
    /// names and dropping zero powers. Names are not expanded.
    pub fn same_multiset(&self, other: &UnitType) -> Result<bool, UnitError> {
        let mut left = normalize(&self.units)?;
        let mut right = normalize(&other.units)?;
        left.sort();
        right.sort();
        Ok(left == right)
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.units.iter().map(|unit| unit.to_string()).collect();
        write!(f, "[{}]", terms.join("*"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    Undeclared(String),
    Recursive(String),
    /// A power of the named unit left the `i32` range.
    PowerOverflow(String),
}

fn overflow(name: &str) -> UnitError {
    UnitError::PowerOverflow(name.to_string())
}

/// Folds entries with equal names together and drops zero powers, keeping
/// first-occurrence order.
pub fn normalize(units: &[Unit]) -> Result<Vec<Unit>, UnitError> {
    let mut result: Vec<Unit> = Vec::with_capacity(units.len());
    for unit in units {
        match result.iter_mut().find(|existing| existing.name == unit.name) {
            Some(existing) => {
                existing.power = existing
                    .power
                    .checked_add(unit.power)
                    .ok_or_else(|| overflow(&unit.name))?
            }
            None => result.push(unit.clone()),
        }
    }
    result.retain(|unit| unit.power != 0);
    Ok(result)
}

/// Combines equal-named entries of `left` and `right` with `combine_power`;
/// entries present on only one side are carried over unchanged. Zero powers
/// are dropped from the result. `combine_power` returns `None` on overflow.
pub fn merge<F>(left: &[Unit], right: &[Unit], combine_power: F) -> Result<Vec<Unit>, UnitError>
where
    F: Fn(i32, i32) -> Option<i32>,
{
    let mut result = normalize(left)?;
    for unit in normalize(right)? {
        match result.iter_mut().find(|existing| existing.name == unit.name) {
            Some(existing) => {
                existing.power = combine_power(existing.power, unit.power)
                    .ok_or_else(|| overflow(&unit.name))?
            }
            None => result.push(unit),
        }
    }
    result.retain(|unit| unit.power != 0);
    Ok(result)
}

pub fn multiply(left: &UnitType, right: &UnitType) -> Result<UnitType, UnitError> {
    merge(&left.units, &right.units, i32::checked_add).map(UnitType::new)
}

pub fn divide(left: &UnitType, right: &UnitType) -> Result<UnitType, UnitError> {
    let inverted = right
        .units
        .iter()
        .map(|unit| match unit.power.checked_neg() {
            Some(power) => Ok(Unit::new(&unit.name, power)),
            None => Err(overflow(&unit.name)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    merge(&left.units, &inverted, i32::checked_add).map(UnitType::new)
}

/// Raises a unit vector to an integer power.
pub fn scale(unit: &UnitType, factor: i32) -> Result<UnitType, UnitError> {
    let scaled = unit
        .units
        .iter()
        .map(|u| match u.power.checked_mul(factor) {
            Some(power) => Ok(Unit::new(&u.name, power)),
            None => Err(overflow(&u.name)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    normalize(&scaled).map(UnitType::new)
}

/// Square root of a unit vector, if every power is even.
pub fn halve(unit: &UnitType) -> Option<UnitType> {
    let units = normalize(&unit.units).ok()?;
    if units.iter().any(|u| u.power % 2 != 0) {
        return None;
    }
    Some(UnitType::new(
        units.iter().map(|u| Unit::new(&u.name, u.power / 2)).collect(),
    ))
}

/// Substitutes declared units by their definitions until only base units
/// remain. Declared names shadow base names.
pub fn expand(unit: &UnitType, table: &UnitTable) -> Result<UnitType, UnitError> {
    let mut visiting = Vec::new();
    let mut expanded = Vec::new();
    expand_into(&unit.units, 1, table, &mut visiting, &mut expanded)?;
    normalize(&expanded).map(UnitType::new)
}

fn expand_into(
    units: &[Unit],
    factor: i32,
    table: &UnitTable,
    visiting: &mut Vec<String>,
    out: &mut Vec<Unit>,
) -> Result<(), UnitError> {
    for unit in units {
        let power = unit
            .power
            .checked_mul(factor)
            .ok_or_else(|| overflow(&unit.name))?;
        if let Some(definition) = table.get(&unit.name) {
            if visiting.contains(&unit.name) {
                return Err(UnitError::Recursive(unit.name.clone()));
            }
            visiting.push(unit.name.clone());
            expand_into(&definition.units, power, table, visiting, out)?;
            visiting.pop();
        } else if BASE_UNITS.contains(&unit.name.as_str()) {
            out.push(Unit::new(&unit.name, power));
        } else {
            return Err(UnitError::Undeclared(unit.name.clone()));
        }
    }
    Ok(())
}

/// Dimensional equality: both sides are expanded to base units and compared
/// as multisets.
pub fn equivalent(left: &UnitType, right: &UnitType, table: &UnitTable) -> Result<bool, UnitError> {
    expand(left, table)?.same_multiset(&expand(right, table)?)
}

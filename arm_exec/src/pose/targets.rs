//! Object drop-off targets

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use super::CalibError;
use comms_if::eqpt::arm::JointPose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The drop-off pose for one object class, as written in parameter files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectTarget {
    /// Object class id, as reported by the detection host.
    pub id: u8,

    /// Pose in which the object is released.
    pub pose: JointPose,
}

/// Lookup of the drop-off pose for each object class.
///
/// Built once from parameters and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTargetTable {
    targets: BTreeMap<u8, JointPose>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ObjectTargetTable {
    /// Build the table, rejecting duplicate ids and the reserved id 0.
    pub fn new(targets: &[ObjectTarget]) -> Result<Self, CalibError> {
        let mut map = BTreeMap::new();

        for t in targets {
            if t.id == 0 {
                return Err(CalibError::InvalidObjectId);
            }
            if map.insert(t.id, t.pose).is_some() {
                return Err(CalibError::DuplicateObject(t.id));
            }
        }

        Ok(Self { targets: map })
    }

    /// Drop-off pose for the given object class, if known.
    pub fn get(&self, id: u8) -> Option<&JointPose> {
        self.targets.get(&id)
    }

    pub fn contains(&self, id: u8) -> bool {
        self.targets.contains_key(&id)
    }

    /// All known object class ids, in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.targets.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::pose::Params;

    #[test]
    fn test_factory_table() {
        let table = ObjectTargetTable::new(&Params::default().objects).unwrap();

        assert_eq!(table.len(), 6);
        assert_eq!(table.ids().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(
            table.get(1),
            Some(&JointPose::new(180, 120, 130, 160, 60, 10))
        );
        assert_eq!(table.get(4).map(|p| p.base), Some(0));
        assert!(table.get(7).is_none());
        assert!(!table.contains(0));
    }

    #[test]
    fn test_invalid_tables() {
        let pose = JointPose::new(90, 90, 90, 90, 90, 40);

        let dup = [
            ObjectTarget { id: 2, pose },
            ObjectTarget { id: 2, pose },
        ];
        assert!(matches!(
            ObjectTargetTable::new(&dup),
            Err(CalibError::DuplicateObject(2))
        ));

        let zero = [ObjectTarget { id: 0, pose }];
        assert!(matches!(
            ObjectTargetTable::new(&zero),
            Err(CalibError::InvalidObjectId)
        ));

        assert!(ObjectTargetTable::new(&[]).unwrap().is_empty());
    }
}

//! Student population hierarchy: Branch → TutorialGroup (TD) → PracticalGroup (TP).
//!
//! Sessions reference population ids at the three levels independently. The
//! ancestry needed to cascade membership upward is looked up through a
//! [`PopulationHierarchy`] collaborator at query time and captured in a
//! [`PopulationClosure`].

use std::collections::BTreeSet;

use crate::error::{ConflictError, Result};
use crate::model::{BranchId, PopulationRefs, PracticalGroupId, TutorialGroupId};

/// Read access to group ancestry.
pub trait PopulationHierarchy {
    /// Whether `branch` exists.
    fn branch_exists(&self, branch: BranchId) -> Result<bool>;

    /// The branch a tutorial group belongs to.
    fn branch_of(&self, group: TutorialGroupId) -> Result<BranchId>;

    /// The tutorial group and branch a practical group belongs to.
    fn parents_of(&self, group: PracticalGroupId) -> Result<(TutorialGroupId, BranchId)>;
}

impl<H: PopulationHierarchy + ?Sized> PopulationHierarchy for &H {
    fn branch_exists(&self, branch: BranchId) -> Result<bool> {
        (**self).branch_exists(branch)
    }

    fn branch_of(&self, group: TutorialGroupId) -> Result<BranchId> {
        (**self).branch_of(group)
    }

    fn parents_of(&self, group: PracticalGroupId) -> Result<(TutorialGroupId, BranchId)> {
        (**self).parents_of(group)
    }
}

/// A session's population references together with every ancestor they
/// imply.
///
/// `direct` is what the session was assigned to. `covered` additionally
/// holds the ancestors of each direct group: a TP session covers its TD and
/// branch, a TD session covers its branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationClosure {
    pub direct: PopulationRefs,
    pub covered: PopulationRefs,
}

impl PopulationClosure {
    /// Resolve the ancestry of every directly referenced group.
    ///
    /// Fails with [`ConflictError::NotFound`] for any unknown branch, TD,
    /// or TP id.
    pub fn resolve<H: PopulationHierarchy>(refs: &PopulationRefs, hierarchy: &H) -> Result<Self> {
        if refs.is_empty() {
            return Ok(Self::default());
        }

        for &branch in &refs.branches {
            if !hierarchy.branch_exists(branch)? {
                return Err(ConflictError::not_found(branch));
            }
        }
        let mut covered = refs.clone();

        for &td in &refs.tutorial_groups {
            covered.branches.insert(hierarchy.branch_of(td)?);
        }
        for &tp in &refs.practical_groups {
            let (td, branch) = hierarchy.parents_of(tp)?;
            covered.tutorial_groups.insert(td);
            covered.branches.insert(branch);
        }

        Ok(Self {
            direct: refs.clone(),
            covered,
        })
    }

    /// Branches shared with `other`: a branch one side is assigned to
    /// directly that the other side covers.
    pub fn shared_branches(&self, other: &Self) -> BTreeSet<BranchId> {
        shared(
            &self.direct.branches,
            &self.covered.branches,
            &other.direct.branches,
            &other.covered.branches,
        )
    }

    /// Tutorial groups shared with `other`, same rule as [`Self::shared_branches`].
    pub fn shared_tutorial_groups(&self, other: &Self) -> BTreeSet<TutorialGroupId> {
        shared(
            &self.direct.tutorial_groups,
            &self.covered.tutorial_groups,
            &other.direct.tutorial_groups,
            &other.covered.tutorial_groups,
        )
    }

    /// Practical groups assigned directly on both sides.
    pub fn shared_practical_groups(&self, other: &Self) -> BTreeSet<PracticalGroupId> {
        self.direct
            .practical_groups
            .intersection(&other.direct.practical_groups)
            .copied()
            .collect()
    }
}

/// `(direct_a ∩ covered_b) ∪ (covered_a ∩ direct_b)`.
///
/// Two sibling groups under the same parent cover that parent on both
/// sides, yet neither is assigned to it; they do not share it.
fn shared<T: Ord + Copy>(
    direct_a: &BTreeSet<T>,
    covered_a: &BTreeSet<T>,
    direct_b: &BTreeSet<T>,
    covered_b: &BTreeSet<T>,
) -> BTreeSet<T> {
    direct_a
        .intersection(covered_b)
        .chain(covered_a.intersection(direct_b))
        .copied()
        .collect()
}

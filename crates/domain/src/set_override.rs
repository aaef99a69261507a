//! Set Override Store
//!
//! Client-local patches keyed by set identity. A patch holds the completion flag of a set and
//! pending edits that were not yet confirmed by the server. Patches are never written into the
//! set records themselves, they are merged over them at read time (see [`crate::decorate`]).
//!
//! The store belongs to exactly one workout session. Switching the session replaces the whole
//! content with the entries persisted for the new session.

use std::collections::{BTreeMap, BTreeSet};

use crate::{SetID, SetPatch, WorkoutID};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetOverride {
    pub done: Option<bool>,
    pub edit: SetPatch,
}

impl SetOverride {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.done.is_none() && self.edit.is_empty()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideStore {
    session: Option<WorkoutID>,
    overrides: BTreeMap<SetID, SetOverride>,
}

impl OverrideStore {
    #[must_use]
    pub fn new(session: Option<WorkoutID>, overrides: BTreeMap<SetID, SetOverride>) -> Self {
        Self {
            session,
            overrides: if session.is_some() {
                overrides
            } else {
                BTreeMap::new()
            },
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<WorkoutID> {
        self.session
    }

    /// Replace the content by the persisted entries of another session.
    pub fn reload(&mut self, session: Option<WorkoutID>, overrides: BTreeMap<SetID, SetOverride>) {
        *self = Self::new(session, overrides);
    }

    #[must_use]
    pub fn get(&self, id: SetID) -> Option<&SetOverride> {
        self.overrides.get(&id)
    }

    #[must_use]
    pub fn overrides(&self) -> &BTreeMap<SetID, SetOverride> {
        &self.overrides
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Merge pending edits into the existing patch of a set.
    pub fn apply_patch(&mut self, id: SetID, patch: SetPatch) {
        if patch.is_empty() {
            return;
        }
        self.overrides.entry(id).or_default().edit.merge(patch);
    }

    /// Flip the completion flag and return the new value.
    pub fn toggle_done(&mut self, id: SetID) -> bool {
        let entry = self.overrides.entry(id).or_default();
        let done = !entry.is_done();
        entry.done = Some(done);
        done
    }

    /// Remove pending edits but keep the completion flag.
    pub fn clear_edit(&mut self, id: SetID) {
        if let Some(entry) = self.overrides.get_mut(&id) {
            entry.edit = SetPatch::default();
            if entry.is_empty() {
                self.overrides.remove(&id);
            }
        }
    }

    pub fn drop_overrides_for(&mut self, ids: impl IntoIterator<Item = SetID>) {
        for id in ids {
            self.overrides.remove(&id);
        }
    }

    /// Remove all entries of sets that are not part of the session anymore.
    pub fn retain_existing(&mut self, existing: &BTreeSet<SetID>) {
        self.overrides.retain(|id, _| existing.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{Reps, Weight};

    use super::*;

    fn store() -> OverrideStore {
        OverrideStore::new(Some(WorkoutID::from(1)), BTreeMap::new())
    }

    #[test]
    fn test_get_empty() {
        assert_eq!(store().get(1.into()), None);
    }

    #[test]
    fn test_apply_patch_merges() {
        let mut store = store();
        store.apply_patch(
            1.into(),
            SetPatch {
                reps: Some(Reps::new(8)),
                ..SetPatch::default()
            },
        );
        store.apply_patch(
            1.into(),
            SetPatch {
                reps: Some(Reps::new(9)),
                weight: Some(Weight::new(50.0).unwrap()),
                ..SetPatch::default()
            },
        );
        assert_eq!(
            store.get(1.into()),
            Some(&SetOverride {
                done: None,
                edit: SetPatch {
                    reps: Some(Reps::new(9)),
                    weight: Some(Weight::new(50.0).unwrap()),
                    ..SetPatch::default()
                }
            })
        );
    }

    #[test]
    fn test_apply_empty_patch() {
        let mut store = store();
        store.apply_patch(1.into(), SetPatch::default());
        assert!(store.is_empty());
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some(false), true)]
    #[case(Some(true), false)]
    fn test_toggle_done(#[case] done: Option<bool>, #[case] expected: bool) {
        let mut store = OverrideStore::new(
            Some(WorkoutID::from(1)),
            BTreeMap::from([(
                SetID::from(1),
                SetOverride {
                    done,
                    edit: SetPatch::default(),
                },
            )]),
        );
        assert_eq!(store.toggle_done(1.into()), expected);
        assert_eq!(store.get(1.into()).unwrap().done, Some(expected));
    }

    #[test]
    fn test_toggle_done_twice() {
        let mut store = store();
        let original = store.get(1.into()).is_some_and(SetOverride::is_done);
        store.toggle_done(1.into());
        store.toggle_done(1.into());
        assert_eq!(store.get(1.into()).unwrap().is_done(), original);
    }

    #[test]
    fn test_clear_edit_keeps_done() {
        let mut store = store();
        store.toggle_done(1.into());
        store.apply_patch(
            1.into(),
            SetPatch {
                reps: Some(Reps::new(3)),
                ..SetPatch::default()
            },
        );
        store.apply_patch(
            2.into(),
            SetPatch {
                reps: Some(Reps::new(4)),
                ..SetPatch::default()
            },
        );
        store.clear_edit(1.into());
        store.clear_edit(2.into());
        assert_eq!(
            store.get(1.into()),
            Some(&SetOverride {
                done: Some(true),
                edit: SetPatch::default()
            })
        );
        assert_eq!(store.get(2.into()), None);
    }

    #[test]
    fn test_drop_overrides_for() {
        let mut store = store();
        store.toggle_done(1.into());
        store.toggle_done(2.into());
        store.toggle_done(3.into());
        store.drop_overrides_for([1.into(), 3.into()]);
        assert_eq!(store.get(1.into()), None);
        assert_eq!(store.get(3.into()), None);
        assert!(store.get(2.into()).is_some());

        // a new set reusing a dropped identity starts without override
        assert_eq!(store.get(1.into()), None);
    }

    #[test]
    fn test_retain_existing() {
        let mut store = store();
        store.toggle_done(1.into());
        store.toggle_done(2.into());
        store.retain_existing(&BTreeSet::from([2.into(), 5.into()]));
        assert_eq!(
            store.overrides().keys().copied().collect::<Vec<_>>(),
            vec![SetID::from(2)]
        );
    }

    #[test]
    fn test_reload() {
        let mut store = store();
        store.toggle_done(1.into());
        store.reload(
            Some(2.into()),
            BTreeMap::from([(SetID::from(7), SetOverride::default())]),
        );
        assert_eq!(store.session(), Some(2.into()));
        assert_eq!(store.get(1.into()), None);
        assert!(store.get(7.into()).is_some());
    }

    #[test]
    fn test_without_session() {
        let store = OverrideStore::new(
            None,
            BTreeMap::from([(SetID::from(7), SetOverride::default())]),
        );
        assert!(store.is_empty());
    }
}

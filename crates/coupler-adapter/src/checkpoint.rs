//! Iteration checkpoints for implicit coupling.
//!
//! In an implicit scheme the coupling library may reject a time window and
//! ask every participant to repeat it. [`CheckpointStore`] keeps one
//! [`Checkpoint`]: owned copies of the caller's time-dependent state
//! vectors plus the simulation time and step counter. Saving overwrites the previous
//! snapshot; restoring copies it back into the caller's vectors in place.
//!
//! The caller must pass its vectors in the same order to save and restore;
//! position is the only correlation.

use log::debug;

use crate::error::ConsistencyError;

/// A saved copy of caller state.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint<V> {
    states: Vec<V>,
    time: f64,
    step: u64,
}

impl<V> Checkpoint<V> {
    /// The saved state vectors, in save order.
    pub fn states(&self) -> &[V] {
        &self.states
    }

    /// The saved simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The saved step counter.
    pub fn step(&self) -> u64 {
        self.step
    }
}

/// Holder of at most one live [`Checkpoint`].
#[derive(Clone, Debug, PartialEq)]
pub struct CheckpointStore<V> {
    snapshot: Option<Checkpoint<V>>,
    saves: u64,
    restores: u64,
}

impl<V> Default for CheckpointStore<V> {
    fn default() -> Self {
        Self {
            snapshot: None,
            saves: 0,
            restores: 0,
        }
    }
}

impl<V: Clone> CheckpointStore<V> {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `states`, `time` and `step` into the store, replacing any
    /// previous snapshot.
    ///
    /// Storage of a previous snapshot is reused through
    /// [`Clone::clone_from`], so repeated saves of equally sized vectors
    /// do not reallocate.
    pub fn save(&mut self, states: &[&V], time: f64, step: u64) {
        let snapshot = self.snapshot.get_or_insert_with(|| Checkpoint {
            states: Vec::with_capacity(states.len()),
            time,
            step,
        });
        snapshot.states.truncate(states.len());
        for (i, &state) in states.iter().enumerate() {
            match snapshot.states.get_mut(i) {
                Some(slot) => slot.clone_from(state),
                None => snapshot.states.push(state.clone()),
            }
        }
        snapshot.time = time;
        snapshot.step = step;
        self.saves += 1;
        debug!("checkpoint saved: {} state vectors at t = {time}", states.len());
    }

    /// Overwrite `states` from the snapshot and return the saved time and
    /// step.
    ///
    /// The snapshot stays in place, so a window can be repeated more than
    /// once.
    pub fn restore(&mut self, states: &mut [&mut V]) -> Result<(f64, u64), ConsistencyError> {
        let snapshot = self.snapshot.as_ref().ok_or(ConsistencyError::NoCheckpoint)?;
        if snapshot.states.len() != states.len() {
            return Err(ConsistencyError::CheckpointLengthMismatch {
                stored: snapshot.states.len(),
                supplied: states.len(),
            });
        }
        for (target, saved) in states.iter_mut().zip(&snapshot.states) {
            (**target).clone_from(saved);
        }
        self.restores += 1;
        debug!(
            "checkpoint restored: {} state vectors, t = {}",
            states.len(),
            snapshot.time
        );
        Ok((snapshot.time, snapshot.step))
    }
}

impl<V> CheckpointStore<V> {
    /// The live snapshot, if any.
    pub fn snapshot(&self) -> Option<&Checkpoint<V>> {
        self.snapshot.as_ref()
    }

    /// Number of saves performed.
    pub fn saves(&self) -> u64 {
        self.saves
    }

    /// Number of restores performed.
    pub fn restores(&self) -> u64 {
        self.restores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn save_mutate_restore_round_trip() {
        let mut store = CheckpointStore::new();
        let mut a = vec![1.0, 2.0, 3.0];
        let mut b = vec![4.0, 5.0];
        store.save(&[&a, &b], 0.5, 5);

        a.fill(9.0);
        b.fill(9.0);
        let (t, step) = store.restore(&mut [&mut a, &mut b]).unwrap();

        assert_eq!(a, vec![1.0, 2.0, 3.0]);
        assert_eq!(b, vec![4.0, 5.0]);
        assert_eq!(t, 0.5);
        assert_eq!(step, 5);
    }

    #[test]
    fn restore_before_save_fails() {
        let mut store: CheckpointStore<Vec<f64>> = CheckpointStore::new();
        let mut a = vec![1.0];
        assert_eq!(
            store.restore(&mut [&mut a]),
            Err(ConsistencyError::NoCheckpoint)
        );
        assert_eq!(a, vec![1.0]);
    }

    #[test]
    fn restore_with_different_count_fails_without_touching_state() {
        let mut store = CheckpointStore::new();
        let a = vec![1.0];
        let b = vec![2.0];
        store.save(&[&a, &b], 0.0, 0);

        let mut c = vec![7.0];
        assert_eq!(
            store.restore(&mut [&mut c]),
            Err(ConsistencyError::CheckpointLengthMismatch {
                stored: 2,
                supplied: 1
            })
        );
        assert_eq!(c, vec![7.0]);
    }

    #[test]
    fn newer_save_replaces_the_snapshot() {
        let mut store = CheckpointStore::new();
        let a = vec![1.0, 1.0];
        let b = vec![2.0];
        store.save(&[&a, &b], 1.0, 1);
        let c = vec![3.0, 3.0, 3.0];
        store.save(&[&c], 2.0, 2);

        let snap = store.snapshot().unwrap();
        assert_eq!(snap.states(), &[vec![3.0, 3.0, 3.0]]);
        assert_eq!(snap.time(), 2.0);
        assert_eq!(snap.step(), 2);
        assert_eq!(store.saves(), 2);
    }

    #[test]
    fn empty_state_list_round_trips_time() {
        let mut store: CheckpointStore<Vec<f64>> = CheckpointStore::new();
        store.save(&[], 3.25, 13);
        assert_eq!(store.restore(&mut []), Ok((3.25, 13)));
        assert_eq!(store.restores(), 1);
    }

    #[test]
    fn restore_can_repeat() {
        let mut store = CheckpointStore::new();
        let mut a = vec![1.0];
        store.save(&[&a], 0.0, 0);
        for _ in 0..3 {
            a[0] += 1.0;
            store.restore(&mut [&mut a]).unwrap();
            assert_eq!(a, vec![1.0]);
        }
    }

    proptest! {
        #[test]
        fn restore_reproduces_any_saved_state(
            states in prop::collection::vec(prop::collection::vec(-1e6f64..1e6, 0..16), 0..8),
            time in 0.0f64..100.0,
            step in 0u64..1_000,
            noise in -1e3f64..1e3,
        ) {
            let mut store = CheckpointStore::new();
            let mut live = states.clone();
            {
                let refs: Vec<&Vec<f64>> = live.iter().collect();
                store.save(&refs, time, step);
            }
            for v in &mut live {
                for x in v.iter_mut() {
                    *x += noise + 1.0;
                }
                v.push(noise);
            }
            let mut refs: Vec<&mut Vec<f64>> = live.iter_mut().collect();
            let restored = store.restore(&mut refs).unwrap();
            prop_assert_eq!(restored, (time, step));
            prop_assert_eq!(live, states);
        }
    }
}

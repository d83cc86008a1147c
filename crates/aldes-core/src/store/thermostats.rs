// ── Thermostat registry ──
//
// Thermostats discovered at connect time, keyed by id. Poll cycles
// refresh entries that are already tracked and never add new ones;
// a thermostat that appears later stays invisible until the next
// discovery.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{Temperature, Thermostat, ThermostatId};
use crate::stream::SnapshotStream;

type Snapshot = Arc<Vec<Arc<Thermostat>>>;

/// Concurrent id → thermostat map with a sorted snapshot for subscribers.
pub struct ThermostatRegistry {
    by_id: DashMap<ThermostatId, Arc<Thermostat>>,
    snapshot: watch::Sender<Snapshot>,
}

impl ThermostatRegistry {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_id: DashMap::new(),
            snapshot,
        }
    }

    /// Start tracking a thermostat. Returns `true` if the id was new.
    pub fn track(&self, thermostat: Thermostat) -> bool {
        let is_new = self
            .by_id
            .insert(thermostat.thermostat_id, Arc::new(thermostat))
            .is_none();
        self.rebuild_snapshot();
        is_new
    }

    /// Apply fetched values to tracked thermostats.
    ///
    /// Unknown ids are skipped. Returns the ids whose values changed.
    pub fn refresh(&self, fetched: &[Thermostat]) -> Vec<ThermostatId> {
        let mut changed = Vec::new();
        for thermostat in fetched {
            // Guard must drop before `rebuild_snapshot` iterates the map.
            if let Some(mut entry) = self.by_id.get_mut(&thermostat.thermostat_id) {
                if **entry != *thermostat {
                    *entry = Arc::new(thermostat.clone());
                    changed.push(thermostat.thermostat_id);
                }
            }
        }
        if !changed.is_empty() {
            self.rebuild_snapshot();
        }
        changed
    }

    /// Record a confirmed setpoint locally. `None` if the id is untracked.
    pub fn set_setpoint(&self, id: ThermostatId, target: Temperature) -> Option<Arc<Thermostat>> {
        let updated = {
            let mut entry = self.by_id.get_mut(&id)?;
            let mut next = (**entry).clone();
            next.temperature_set = Some(target);
            let next = Arc::new(next);
            *entry = Arc::clone(&next);
            next
        };
        self.rebuild_snapshot();
        Some(updated)
    }

    pub fn get(&self, id: ThermostatId) -> Option<Arc<Thermostat>> {
        self.by_id.get(&id).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, id: ThermostatId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Tracked thermostats ordered by `Order`, then id.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.snapshot.borrow())
    }

    pub fn subscribe(&self) -> SnapshotStream<Vec<Arc<Thermostat>>> {
        SnapshotStream::new(self.snapshot.subscribe())
    }

    pub fn clear(&self) {
        self.by_id.clear();
        self.rebuild_snapshot();
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn rebuild_snapshot(&self) {
        let mut values: Vec<Arc<Thermostat>> =
            self.by_id.iter().map(|r| Arc::clone(r.value())).collect();
        values.sort_by_key(|t| (t.order.unwrap_or(i64::MAX), t.thermostat_id));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

impl Default for ThermostatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn thermostat(id: u64, order: i64, setpoint: i32) -> Thermostat {
        serde_json::from_value(serde_json::json!({
            "ThermostatId": id,
            "Name": format!("Room {id}"),
            "Order": order,
            "TemperatureSet": setpoint,
        }))
        .unwrap()
    }

    #[test]
    fn track_reports_new_ids() {
        let registry = ThermostatRegistry::new();
        assert!(registry.track(thermostat(1, 0, 20)));
        assert!(!registry.track(thermostat(1, 0, 21)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn refresh_ignores_unknown_ids() {
        let registry = ThermostatRegistry::new();
        registry.track(thermostat(1, 0, 20));

        let changed = registry.refresh(&[thermostat(1, 0, 22), thermostat(99, 1, 18)]);

        assert_eq!(changed, vec![ThermostatId(1)]);
        assert!(!registry.contains(ThermostatId(99)));
        assert_eq!(
            registry.get(ThermostatId(1)).unwrap().temperature_set,
            Some(Temperature::from_degrees(22))
        );
    }

    #[test]
    fn refresh_with_same_values_changes_nothing() {
        let registry = ThermostatRegistry::new();
        registry.track(thermostat(1, 0, 20));
        assert!(registry.refresh(&[thermostat(1, 0, 20)]).is_empty());
    }

    #[test]
    fn snapshot_is_ordered() {
        let registry = ThermostatRegistry::new();
        registry.track(thermostat(30, 2, 20));
        registry.track(thermostat(10, 1, 20));
        registry.track(thermostat(20, 1, 20));

        let ids: Vec<u64> = registry
            .snapshot()
            .iter()
            .map(|t| t.thermostat_id.0)
            .collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn set_setpoint_updates_tracked_only() {
        let registry = ThermostatRegistry::new();
        registry.track(thermostat(1, 0, 20));

        let updated = registry
            .set_setpoint(ThermostatId(1), Temperature::from_tenths(215))
            .unwrap();
        assert_eq!(updated.temperature_set, Some(Temperature::from_tenths(215)));
        assert!(
            registry
                .set_setpoint(ThermostatId(2), Temperature::from_degrees(19))
                .is_none()
        );
    }
}

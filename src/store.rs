use crate::types::WorkoutRecord;

/// Workouts in creation order, which is also display order.
#[derive(Debug, Default)]
pub struct WorkoutStore {
    records: Vec<WorkoutRecord>,
}

impl WorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: WorkoutRecord) {
        self.records.push(record);
    }

    /// Drop everything and adopt `records` in the given order. Derived values
    /// are taken as they are.
    pub fn replace_all(&mut self, records: Vec<WorkoutRecord>) {
        self.records = records;
    }

    pub fn find_by_id(&self, id: &str) -> Option<&WorkoutRecord> {
        self.records.iter().find(|r| r.id().as_str() == id)
    }

    pub fn all(&self) -> &[WorkoutRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::WorkoutFactory;
    use crate::types::{Coords, WorkoutKind};

    fn running(f: &mut WorkoutFactory, distance: &str) -> WorkoutRecord {
        f.create(WorkoutKind::Running, distance, "30", Coords::new(1.0, 2.0), "180")
            .unwrap()
            .into()
    }

    #[test]
    fn append_keeps_order_and_find_returns_the_record() {
        let mut f = WorkoutFactory::new();
        let mut store = WorkoutStore::new();
        let a = running(&mut f, "5");
        let b = running(&mut f, "10");
        store.append(a.clone());
        store.append(b.clone());

        assert_eq!(store.len(), 2);
        assert_eq!(store.all(), &[a.clone(), b.clone()]);
        assert_eq!(store.find_by_id(b.id().as_str()), Some(&b));
        assert_eq!(store.find_by_id(a.id().as_str()), Some(&a));
        assert_eq!(store.find_by_id("missing"), None);
    }

    #[test]
    fn replace_all_discards_previous_contents() {
        let mut f = WorkoutFactory::new();
        let mut store = WorkoutStore::new();
        let old = running(&mut f, "5");
        store.append(old.clone());

        let restored: Vec<WorkoutRecord> = vec![running(&mut f, "7").to_stored().into()];
        store.replace_all(restored.clone());

        assert_eq!(store.all(), restored.as_slice());
        assert!(store.find_by_id(old.id().as_str()).is_none());

        store.replace_all(Vec::new());
        assert!(store.is_empty());
    }
}

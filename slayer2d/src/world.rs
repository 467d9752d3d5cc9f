use std::collections::BTreeMap;

/// Unique identifier for an entity in a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u32);

impl EntityId {
    /// Get the underlying integer ID (useful for debugging or logging).
    pub fn to_u32(self) -> u32 {
        self.0
    }
}

/// Hands out level-wide unique ids. Ids only grow, so ordering by id is
/// spawn order.
#[derive(Debug)]
pub struct EntityAllocator {
    next_id: u32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Reserve the next id.
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Anything a [`Group`] can store. The group uses the flag to sweep
/// destroyed members at the end of a tick.
pub trait Member {
    fn is_alive(&self) -> bool;
}

/// Owning collection of one kind of entity.
///
/// The group is the only place entities of its kind live: iteration,
/// lookup and destruction all go through it. Iteration is in spawn order.
#[derive(Debug)]
pub struct Group<T> {
    members: BTreeMap<EntityId, T>,
}

impl<T> Group<T> {
    /// Create a new, empty group.
    pub fn new() -> Self {
        Self {
            members: BTreeMap::new(),
        }
    }

    /// Insert an entity under an id obtained from an [`EntityAllocator`].
    pub fn insert(&mut self, id: EntityId, member: T) {
        self.members.insert(id, member);
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.members.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.members.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains_key(&id)
    }

    /// Remove an entity immediately, returning it if it existed.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        self.members.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.members.iter().map(|(&id, member)| (id, member))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.members.iter_mut().map(|(&id, member)| (id, member))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.members.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.members.values_mut()
    }

    /// Snapshot of the current ids, for loops that need to borrow the
    /// group mutably one member at a time.
    pub fn ids(&self) -> Vec<EntityId> {
        self.members.keys().copied().collect()
    }
}

impl<T: Member> Group<T> {
    /// Physically drop every member whose alive flag is cleared. Returns
    /// the removed ids in spawn order.
    pub fn sweep(&mut self) -> Vec<EntityId> {
        let dead: Vec<EntityId> = self
            .members
            .iter()
            .filter(|(_, member)| !member.is_alive())
            .map(|(&id, _)| id)
            .collect();
        for id in &dead {
            self.members.remove(id);
        }
        dead
    }

    /// Number of members that are still alive.
    pub fn live_count(&self) -> usize {
        self.members.values().filter(|m| m.is_alive()).count()
    }
}

impl<T> Default for Group<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy(bool);

    impl Member for Dummy {
        fn is_alive(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn iteration_follows_spawn_order() {
        let mut ids = EntityAllocator::new();
        let mut group = Group::new();
        let a = ids.allocate();
        let b = ids.allocate();
        let c = ids.allocate();
        group.insert(c, Dummy(true));
        group.insert(a, Dummy(true));
        group.insert(b, Dummy(true));
        let order: Vec<EntityId> = group.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn sweep_drops_only_dead_members() {
        let mut ids = EntityAllocator::new();
        let mut group = Group::new();
        let keep = ids.allocate();
        let drop = ids.allocate();
        group.insert(keep, Dummy(true));
        group.insert(drop, Dummy(false));
        assert_eq!(group.sweep(), vec![drop]);
        assert!(group.contains(keep));
        assert_eq!(group.len(), 1);
    }
}

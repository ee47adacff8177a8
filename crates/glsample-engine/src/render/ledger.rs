use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// Kinds of GPU handle the ledger counts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
    Sampler,
    BindGroup,
    RenderPipeline,
    ComputePipeline,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Buffer,
        ResourceKind::Texture,
        ResourceKind::Sampler,
        ResourceKind::BindGroup,
        ResourceKind::RenderPipeline,
        ResourceKind::ComputePipeline,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::Texture => "texture",
            ResourceKind::Sampler => "sampler",
            ResourceKind::BindGroup => "bind group",
            ResourceKind::RenderPipeline => "render pipeline",
            ResourceKind::ComputePipeline => "compute pipeline",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Default)]
struct Counts {
    live: [Cell<usize>; ResourceKind::ALL.len()],
}

/// Live-handle counter for one sample.
///
/// Cloning shares the counts. Handles are registered through [`Ledger::track`]
/// and unregister themselves when dropped.
#[derive(Clone, Default)]
pub struct Ledger {
    counts: Rc<Counts>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track<T>(&self, kind: ResourceKind, value: T) -> Tracked<T> {
        let cell = &self.counts.live[kind.slot()];
        cell.set(cell.get() + 1);
        Tracked {
            value,
            kind,
            counts: Rc::clone(&self.counts),
        }
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.counts.live[kind.slot()].get()
    }

    pub fn outstanding(&self) -> usize {
        self.counts.live.iter().map(Cell::get).sum()
    }

    /// Kinds with a non-zero live count.
    pub fn leaks(&self) -> Vec<(ResourceKind, usize)> {
        ResourceKind::ALL
            .into_iter()
            .map(|k| (k, self.count(k)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in ResourceKind::ALL {
            map.entry(&kind.name(), &self.count(kind));
        }
        map.finish()
    }
}

/// A GPU handle registered with a [`Ledger`].
pub struct Tracked<T> {
    value: T,
    kind: ResourceKind,
    counts: Rc<Counts>,
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        let cell = &self.counts.live[self.kind.slot()];
        cell.set(cell.get().saturating_sub(1));
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("kind", &self.kind)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_and_drop_balance() {
        let ledger = Ledger::new();
        let a = ledger.track(ResourceKind::Buffer, 1u32);
        let b = ledger.track(ResourceKind::Buffer, 2u32);
        let t = ledger.track(ResourceKind::Texture, "tex");

        assert_eq!(ledger.count(ResourceKind::Buffer), 2);
        assert_eq!(ledger.outstanding(), 3);
        assert_eq!(*a + *b, 3);

        drop(a);
        drop(t);
        assert_eq!(ledger.outstanding(), 1);
        assert_eq!(ledger.leaks(), vec![(ResourceKind::Buffer, 1)]);

        drop(b);
        assert_eq!(ledger.outstanding(), 0);
        assert!(ledger.leaks().is_empty());
    }

    #[test]
    fn clones_share_counts() {
        let ledger = Ledger::new();
        let other = ledger.clone();
        let _s = other.track(ResourceKind::Sampler, ());
        assert_eq!(ledger.count(ResourceKind::Sampler), 1);
    }

    #[test]
    fn replacing_a_handle_keeps_count_stable() {
        let ledger = Ledger::new();
        let mut slot = ledger.track(ResourceKind::Texture, 0);
        for i in 1..5 {
            slot = ledger.track(ResourceKind::Texture, i);
            assert_eq!(ledger.count(ResourceKind::Texture), 1);
        }
        assert_eq!(*slot, 4);
    }

    #[test]
    fn handle_outliving_ledger_still_decrements() {
        let ledger = Ledger::new();
        let observer = ledger.clone();
        let h = ledger.track(ResourceKind::RenderPipeline, ());
        drop(ledger);
        drop(h);
        assert_eq!(observer.outstanding(), 0);
    }
}

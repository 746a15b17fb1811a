//! Region Registry: the translator-internal (`T`) and
//! guest-admitted-executable (`V`) memory range sets that every `mmap`,
//! `mmap2` and `mprotect` authorizer consults before granting a request.

use std::sync::RwLock;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RegionKind {
    /// Belongs to the translator: code cache, hash tables, signal-handler
    /// stacks. Any guest overlap is a translator-safety violation.
    TranslatorInternal,
    /// Made executable by the guest (e.g. its own JIT) and admitted by an
    /// authorizer. Later translation requests inside this range are legal.
    GuestExecutableValidated,
}

#[derive(Copy, Clone, Debug)]
pub struct Region {
    pub start: usize,
    pub size: usize,
    pub kind: RegionKind,
}

impl Region {
    fn end(&self) -> usize {
        self.start + self.size
    }

    fn overlaps(&self, start: usize, size: usize) -> bool {
        let other_end = start + size;
        self.start.max(start) < self.end().min(other_end)
    }
}

/// `T` is populated once at translator init and is append-only afterward, so
/// it is safe to snapshot-read without holding the lock across a whole scan;
/// `V` grows for the life of a long-running guest and is read just as often
/// as it's written. Both sets share one lock because both stay small enough
/// for a linear scan, up to roughly a thousand entries, and because a
/// `mmap`/`mprotect` authorizer that admits to `V` must publish that update
/// before it returns GRANTED/EMULATED, so there is no benefit to splitting
/// them into independent locks.
#[derive(Default)]
pub struct RegionRegistry {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    translator: Vec<Region>,
    validated: Vec<Region>,
}

impl RegionRegistry {
    pub fn new() -> RegionRegistry {
        RegionRegistry::default()
    }

    /// Register a range as belonging to the translator. Called only during
    /// translator init; not part of the per-syscall hot path.
    pub fn reserve_translator_range(&self, start: usize, size: usize) {
        self.inner.write().unwrap().translator.push(Region {
            start,
            size,
            kind: RegionKind::TranslatorInternal,
        });
    }

    /// True if any byte of `[start, start+size)` intersects `T`.
    pub fn overlaps_translator(&self, start: usize, size: usize) -> bool {
        self.inner
            .read()
            .unwrap()
            .translator
            .iter()
            .any(|r| r.overlaps(start, size))
    }

    /// Admit `[start, start+size)` to `V`. Adding the same range twice is
    /// idempotent in effect (both readers and the overlap predicate only
    /// care about membership, not multiplicity), which is what lets
    /// concurrent authorizers in different threads admit overlapping
    /// self-modifying-code regions without extra coordination.
    pub fn admit_executable(&self, start: usize, size: usize) {
        self.inner.write().unwrap().validated.push(Region {
            start,
            size,
            kind: RegionKind::GuestExecutableValidated,
        });
    }

    /// Membership test against `T` only.
    pub fn is_translator_range(&self, p: usize) -> bool {
        self.inner
            .read()
            .unwrap()
            .translator
            .iter()
            .any(|r| r.start <= p && p < r.end())
    }

    /// True if `p` falls inside a range the guest has legitimately made
    /// executable.
    pub fn is_validated_executable(&self, p: usize) -> bool {
        self.inner
            .read()
            .unwrap()
            .validated
            .iter()
            .any(|r| r.start <= p && p < r.end())
    }

    pub fn translator_region_count(&self) -> usize {
        self.inner.read().unwrap().translator.len()
    }

    pub fn validated_region_count(&self) -> usize {
        self.inner.read().unwrap().validated.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn overlap_soundness_against_reference_predicate() {
        fn reference_overlap(a: (usize, usize), b: (usize, usize)) -> bool {
            let (a_start, a_size) = a;
            let (b_start, b_size) = b;
            a_start.max(b_start) < (a_start + a_size).min(b_start + b_size)
        }

        let cases: &[((usize, usize), (usize, usize))] = &[
            ((0x1000, 0x1000), (0x1500, 0x100)),
            ((0x1000, 0x1000), (0x2000, 0x1000)),
            ((0x1000, 0x1000), (0x2000, 0x0)),
            ((0x1000, 0x1000), (0x0, 0x1000)),
            ((0x1000, 0x1000), (0x1fff, 0x10)),
            ((0x0, 0x100000), (0x80000, 0x1)),
        ];

        for &(t_range, probe) in cases {
            let registry = RegionRegistry::new();
            registry.reserve_translator_range(t_range.0, t_range.1);
            let expected = reference_overlap(t_range, probe);
            assert_eq!(
                registry.overlaps_translator(probe.0, probe.1),
                expected,
                "t={:?} probe={:?}",
                t_range,
                probe
            );
        }
    }

    #[test]
    fn admitted_regions_do_not_affect_translator_overlap() {
        let registry = RegionRegistry::new();
        registry.admit_executable(0x10000, 0x1000);
        assert!(!registry.overlaps_translator(0x10000, 0x1000));
        assert!(registry.is_validated_executable(0x10500));
        assert!(!registry.is_translator_range(0x10500));
    }

    #[test]
    fn translator_range_membership_is_half_open() {
        let registry = RegionRegistry::new();
        registry.reserve_translator_range(0x1000, 0x100);
        assert!(registry.is_translator_range(0x1000));
        assert!(registry.is_translator_range(0x10ff));
        assert!(!registry.is_translator_range(0x1100));
    }

    #[test]
    fn duplicate_admits_of_the_same_range_are_idempotent_in_effect() {
        let registry = RegionRegistry::new();
        registry.admit_executable(0x20000, 0x1000);
        registry.admit_executable(0x20000, 0x1000);
        assert!(registry.is_validated_executable(0x20500));
    }
}

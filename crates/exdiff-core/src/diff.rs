/// Upper bound (exclusive) of the byte values eligible for a result set. The
/// tables track the full byte domain, but the reported window stops here.
pub const RESULT_WINDOW: usize = 128;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Inclusion {
    #[default]
    Unknown,
    Included,
    Excluded,
}

/// Tri-state presence table for one side, indexed by byte value.
///
/// Exclusion is sticky: once a value is excluded it stays excluded no matter
/// how often later chunks include it. Inclusion carries no such guarantee.
#[derive(Clone, Debug)]
pub struct InclusionTable {
    states: [Inclusion; 256],
}

impl InclusionTable {
    pub fn new() -> Self {
        InclusionTable {
            states: [Inclusion::Unknown; 256],
        }
    }

    /// Marks every value occurring in `chunk` as included, unless it is
    /// already excluded.
    pub fn include(&mut self, chunk: &[u8]) {
        for &value in chunk {
            let state = &mut self.states[value as usize];
            if *state != Inclusion::Excluded {
                *state = Inclusion::Included;
            }
        }
    }

    /// Marks every value occurring in `chunk` as excluded, overriding any
    /// earlier or simultaneous inclusion.
    pub fn exclude(&mut self, chunk: &[u8]) {
        for &value in chunk {
            self.states[value as usize] = Inclusion::Excluded;
        }
    }

    pub fn state(&self, value: u8) -> Inclusion {
        self.states[value as usize]
    }

    /// Collects the included values below `RESULT_WINDOW`, ascending. The
    /// output is sorted and duplicate-free by construction.
    pub fn result_set(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for value in 0..RESULT_WINDOW {
            if self.states[value] == Inclusion::Included {
                out.push(value as u8);
            }
        }
        out
    }
}

impl Default for InclusionTable {
    fn default() -> Self {
        InclusionTable::new()
    }
}

/// Streaming two-sided byte-set difference.
///
/// Feeds chunks from side A via `observe_a` and from side B via `observe_b`,
/// in any interleaving and with any chunking; a chunk includes its values in
/// its own side's table and excludes them from the peer table. Because
/// exclusion is sticky the final tables do not depend on arrival order, so
/// the two sides may also be drained one after the other.
#[derive(Clone, Debug, Default)]
pub struct DiffAccumulator {
    side_a: InclusionTable,
    side_b: InclusionTable,
}

impl DiffAccumulator {
    pub fn new() -> Self {
        DiffAccumulator::default()
    }

    pub fn observe_a(&mut self, chunk: &[u8]) {
        self.side_a.include(chunk);
        self.side_b.exclude(chunk);
    }

    pub fn observe_b(&mut self, chunk: &[u8]) {
        self.side_b.include(chunk);
        self.side_a.exclude(chunk);
    }

    /// Derives the per-side result sets: values seen on that side and never
    /// on the other, restricted to the result window.
    pub fn finish(self) -> (Vec<u8>, Vec<u8>) {
        (self.side_a.result_set(), self.side_b.result_set())
    }
}

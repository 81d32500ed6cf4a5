//! Position mapping through document changes.
//!
//! Every step reports the ranges it replaced as a [`StepMap`]; a
//! [`Mapping`] chains the maps of several steps so that a position in the
//! starting document can be carried to the matching position in the final
//! one.

/// Which side a position sitting exactly on a changed range sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    Before,
    #[default]
    After,
}

/// A mapped position, plus whether the content on the associated side of
/// it was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    pub deleted: bool,
}

/// One replaced range: where it starts and its size before and after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedRange {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

/// The ranges replaced by a single step, sorted by start position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<ChangedRange>,
}

impl StepMap {
    pub fn new(ranges: Vec<ChangedRange>) -> Self {
        Self { ranges }
    }

    /// A map for a step that replaced `old_size` positions at `start` with
    /// `new_size` new ones. No-op replacements produce an empty map.
    pub fn replaced(start: usize, old_size: usize, new_size: usize) -> Self {
        if old_size == 0 && new_size == 0 {
            return Self::empty();
        }
        Self::new(vec![ChangedRange {
            start,
            old_size,
            new_size,
        }])
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[ChangedRange] {
        &self.ranges
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut diff: isize = 0;
        for range in &self.ranges {
            if range.start > pos {
                break;
            }
            let end = range.start + range.old_size;
            if pos <= end {
                let before = if range.old_size == 0 {
                    assoc == Assoc::Before
                } else if pos == range.start {
                    true
                } else if pos == end {
                    false
                } else {
                    assoc == Assoc::Before
                };
                let base = offset(range.start, diff);
                let mapped = if before { base } else { base + range.new_size };
                let deleted = match assoc {
                    Assoc::Before => pos != range.start,
                    Assoc::After => pos != end,
                };
                return MapResult {
                    pos: mapped,
                    deleted,
                };
            }
            diff += range.new_size as isize - range.old_size as isize;
        }
        MapResult {
            pos: offset(pos, diff),
            deleted: false,
        }
    }

    /// The map that undoes this one.
    pub fn invert(&self) -> StepMap {
        let mut diff: isize = 0;
        let ranges = self
            .ranges
            .iter()
            .map(|range| {
                let inverted = ChangedRange {
                    start: offset(range.start, diff),
                    old_size: range.new_size,
                    new_size: range.old_size,
                };
                diff += range.new_size as isize - range.old_size as isize;
                inverted
            })
            .collect();
        StepMap { ranges }
    }
}

fn offset(pos: usize, diff: isize) -> usize {
    pos.saturating_add_signed(diff)
}

/// A sequence of step maps applied in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn append_map(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.maps.iter().fold(pos, |pos, map| map.map(pos, assoc))
    }

    /// Map through every step; `deleted` is set if any step deleted the
    /// position.
    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        self.maps.iter().fold(
            MapResult {
                pos,
                deleted: false,
            },
            |acc, map| {
                let step = map.map_result(acc.pos, assoc);
                MapResult {
                    pos: step.pos,
                    deleted: acc.deleted || step.deleted,
                }
            },
        )
    }

    /// The mapping that carries positions back to the starting document.
    pub fn invert(&self) -> Mapping {
        Mapping {
            maps: self.maps.iter().rev().map(StepMap::invert).collect(),
        }
    }
}

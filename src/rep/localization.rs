//! Fault localization — suspiciousness weights over atoms
//!
//! Weights bias which atoms a search strategy picks as mutation sites.
//! A store holds at most one weight per atom; atoms without an entry take
//! the configured default weight in the full view and are absent from the
//! filtered view.

use super::{AtomId, RepError};
use log::{info, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// A single (atom, weight) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalizationEntry {
    pub atom: AtomId,
    pub weight: f64,
}

/// How weights are computed for a program
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum FaultScheme {
    /// Every atom is equally suspicious
    #[default]
    Uniform,
    /// Coverage paths recorded while running positive and negative tests
    Path { pos_path: PathBuf, neg_path: PathBuf },
    /// Explicit `atom,weight` lines
    Weighted { path: PathBuf },
}

impl FaultScheme {
    /// Build the localization for a program with `max_atom` atoms
    pub fn compute(&self, max_atom: usize, positive_path_weight: f64) -> Result<FaultLocalization, RepError> {
        let loc = match self {
            FaultScheme::Uniform => FaultLocalization::uniform(max_atom),
            FaultScheme::Path { pos_path, neg_path } => {
                let pos = parse_path_file(&read(pos_path)?, max_atom);
                let neg = parse_path_file(&read(neg_path)?, max_atom);
                FaultLocalization::from_paths(&pos, &neg, positive_path_weight)
            }
            FaultScheme::Weighted { path } => {
                FaultLocalization::from_entries(parse_weight_file(&read(path)?, max_atom)?)
            }
        };
        info!(
            "Fault localization: {} weighted atoms of {} (total weight {:.2})",
            loc.len(), max_atom, loc.total_weight()
        );
        Ok(loc)
    }
}

fn read(path: &Path) -> Result<String, RepError> {
    Ok(std::fs::read_to_string(path)?)
}

/// Parse a coverage path file: one atom id per line, `#` starts a comment
pub fn parse_path_file(text: &str, max_atom: usize) -> Vec<AtomId> {
    let mut ids = Vec::new();
    for line in content_lines(text) {
        match line.parse::<AtomId>() {
            Ok(id) if id.get() <= max_atom => ids.push(id),
            Ok(id) => warn!("Ignoring path atom {} beyond max atom {}", id, max_atom),
            Err(_) => warn!("Ignoring malformed path line '{}'", line),
        }
    }
    ids
}

/// Parse `atom,weight` lines
pub fn parse_weight_file(text: &str, max_atom: usize) -> Result<Vec<LocalizationEntry>, RepError> {
    let mut entries = Vec::new();
    for line in content_lines(text) {
        let (atom, weight) = line
            .split_once(',')
            .ok_or_else(|| RepError::Localization(format!("expected 'atom,weight', got '{}'", line)))?;
        let atom: AtomId = atom
            .parse()
            .map_err(|_| RepError::Localization(format!("bad atom id in '{}'", line)))?;
        let weight: f64 = weight
            .trim()
            .parse()
            .map_err(|_| RepError::Localization(format!("bad weight in '{}'", line)))?;
        if atom.get() > max_atom {
            warn!("Ignoring weight for atom {} beyond max atom {}", atom, max_atom);
            continue;
        }
        entries.push(LocalizationEntry { atom, weight });
    }
    Ok(entries)
}

fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|l| l.split('#').next().unwrap_or("").trim())
        .filter(|l| !l.is_empty())
}

/// Per-representation weight store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultLocalization {
    weights: BTreeMap<AtomId, f64>,
}

impl FaultLocalization {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight 1.0 for every atom
    pub fn uniform(max_atom: usize) -> Self {
        Self {
            weights: AtomId::all(max_atom).map(|id| (id, 1.0)).collect(),
        }
    }

    /// Atoms only on the negative path are fully suspicious; atoms also
    /// visited by passing runs get `positive_path_weight`
    pub fn from_paths(pos: &[AtomId], neg: &[AtomId], positive_path_weight: f64) -> Self {
        let pos: HashSet<AtomId> = pos.iter().copied().collect();
        let mut loc = Self::new();
        for &id in neg {
            let weight = if pos.contains(&id) { positive_path_weight } else { 1.0 };
            loc.set(id, weight);
        }
        loc
    }

    /// Later entries for the same atom replace earlier ones
    pub fn from_entries(entries: impl IntoIterator<Item = LocalizationEntry>) -> Self {
        let mut loc = Self::new();
        for e in entries {
            loc.set(e.atom, e.weight);
        }
        loc
    }

    /// Set an atom's weight, clamped into [0, 1]
    pub fn set(&mut self, atom: AtomId, weight: f64) {
        let weight = if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) };
        self.weights.insert(atom, weight);
    }

    pub fn get(&self, atom: AtomId) -> Option<f64> {
        self.weights.get(&atom).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Entries with a positive weight, in atom order
    pub fn filtered(&self) -> Vec<LocalizationEntry> {
        self.weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(&atom, &weight)| LocalizationEntry { atom, weight })
            .collect()
    }

    /// One entry per atom in 1..=max_atom
    pub fn full(&self, max_atom: usize, default_weight: f64) -> Vec<LocalizationEntry> {
        AtomId::all(max_atom)
            .map(|atom| LocalizationEntry {
                atom,
                weight: self.get(atom).unwrap_or(default_weight),
            })
            .collect()
    }

    /// Follow a compacting delete: drop `removed`, shift later atoms down
    pub fn shift_after_delete(&mut self, removed: AtomId) {
        self.weights = std::mem::take(&mut self.weights)
            .into_iter()
            .filter_map(|(id, w)| match id.cmp(&removed) {
                Ordering::Less => Some((id, w)),
                Ordering::Equal => None,
                Ordering::Greater => id.prev().map(|p| (p, w)),
            })
            .collect();
    }

    /// Make room for a new atom at `inserted`: atoms at or after it move up
    pub fn shift_for_insert(&mut self, inserted: AtomId) {
        self.weights = std::mem::take(&mut self.weights)
            .into_iter()
            .map(|(id, w)| if id >= inserted { (id.next(), w) } else { (id, w) })
            .collect();
    }

    /// Draw an atom with probability proportional to its weight
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<AtomId> {
        let entries = self.filtered();
        let dist = WeightedIndex::new(entries.iter().map(|e| e.weight)).ok()?;
        Some(entries[dist.sample(rng)].atom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn id(n: usize) -> AtomId {
        AtomId::new(n).unwrap()
    }

    #[test]
    fn test_path_weighting() {
        let pos = vec![id(1), id(2), id(3)];
        let neg = vec![id(2), id(3), id(4), id(5)];
        let loc = FaultLocalization::from_paths(&pos, &neg, 0.1);
        assert_eq!(loc.get(id(1)), None);
        assert_eq!(loc.get(id(2)), Some(0.1));
        assert_eq!(loc.get(id(4)), Some(1.0));
        assert_eq!(loc.len(), 4);
    }

    #[test]
    fn test_full_view_covers_every_atom() {
        let loc = FaultLocalization::from_entries(vec![
            LocalizationEntry { atom: id(2), weight: 0.5 },
        ]);
        let full = loc.full(4, 0.0);
        assert_eq!(full.len(), 4);
        assert_eq!(full[0].weight, 0.0);
        assert_eq!(full[1].weight, 0.5);
        assert_eq!(loc.filtered().len(), 1);
    }

    #[test]
    fn test_weights_clamped() {
        let mut loc = FaultLocalization::new();
        loc.set(id(1), 3.0);
        loc.set(id(2), -1.0);
        loc.set(id(3), f64::NAN);
        assert_eq!(loc.get(id(1)), Some(1.0));
        assert_eq!(loc.get(id(2)), Some(0.0));
        assert_eq!(loc.get(id(3)), Some(0.0));
        assert_eq!(loc.filtered().len(), 1);
    }

    #[test]
    fn test_shift_after_delete() {
        let mut loc = FaultLocalization::from_entries(vec![
            LocalizationEntry { atom: id(1), weight: 0.1 },
            LocalizationEntry { atom: id(5), weight: 0.5 },
            LocalizationEntry { atom: id(7), weight: 0.7 },
        ]);
        loc.shift_after_delete(id(5));
        assert_eq!(loc.get(id(1)), Some(0.1));
        assert_eq!(loc.get(id(5)), None);
        assert_eq!(loc.get(id(6)), Some(0.7));
        assert_eq!(loc.get(id(7)), None);
    }

    #[test]
    fn test_shift_for_insert() {
        let mut loc = FaultLocalization::from_entries(vec![
            LocalizationEntry { atom: id(3), weight: 0.3 },
            LocalizationEntry { atom: id(4), weight: 0.4 },
        ]);
        loc.shift_for_insert(id(4));
        assert_eq!(loc.get(id(3)), Some(0.3));
        assert_eq!(loc.get(id(4)), None);
        assert_eq!(loc.get(id(5)), Some(0.4));
    }

    #[test]
    fn test_choose_respects_weights() {
        let loc = FaultLocalization::from_entries(vec![
            LocalizationEntry { atom: id(1), weight: 0.0 },
            LocalizationEntry { atom: id(2), weight: 1.0 },
        ]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(loc.choose(&mut rng), Some(id(2)));
        }
        assert_eq!(FaultLocalization::new().choose(&mut rng), None);
    }

    #[test]
    fn test_parse_files() {
        let path = "# negative run\n3\n4\n\n99\nbogus\n";
        assert_eq!(parse_path_file(path, 10), vec![id(3), id(4)]);

        let weights = "1,0.5\n2, 1.0 # hot\n20,1.0\n";
        let entries = parse_weight_file(weights, 10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].weight, 1.0);
        assert!(parse_weight_file("1;0.5", 10).is_err());
    }
}

//! Dense 5x5 grid of customers keyed by (frequency score, monetary score).

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::types::{Score, ScoredCustomer};
use crate::errors::DomainError;

pub const GRID_SIZE: usize = 5;
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// Grid coordinate: x is the frequency score, y is the monetary score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridKey {
    pub frequency: Score,
    pub monetary: Score,
}

impl GridKey {
    pub fn new(frequency: Score, monetary: Score) -> Self {
        Self { frequency, monetary }
    }

    pub fn of(customer: &ScoredCustomer) -> Self {
        Self::new(customer.frequency_score, customer.monetary_score)
    }

    /// All 25 keys, frequency-major.
    pub fn all() -> impl Iterator<Item = GridKey> {
        Score::all()
            .into_iter()
            .flat_map(|frequency| Score::all().into_iter().map(move |m| GridKey::new(frequency, m)))
    }

    fn index(self) -> usize {
        usize::from(self.frequency.value() - 1) * GRID_SIZE + usize::from(self.monetary.value() - 1)
    }

    pub fn segment(self) -> Segment {
        Segment::for_key(self)
    }

    pub fn tier(self) -> CellTier {
        CellTier::for_key(self)
    }
}

impl fmt::Display for GridKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.frequency, self.monetary)
    }
}

impl FromStr for GridKey {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidGridKey(raw.to_string());
        let (frequency, monetary) = raw.trim().split_once('-').ok_or_else(invalid)?;
        let frequency = frequency.trim().parse::<u8>().map_err(|_| invalid())?;
        let monetary = monetary.trim().parse::<u8>().map_err(|_| invalid())?;
        Ok(Self::new(
            Score::new(frequency).map_err(|_| invalid())?,
            Score::new(monetary).map_err(|_| invalid())?,
        ))
    }
}

impl Serialize for GridKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Named customer segment for a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Champions,
    LoyalCustomers,
    PotentialLoyalists,
    NewCustomers,
    Promising,
    NeedsAttention,
    AtRisk,
    Lost,
}

impl Segment {
    /// First matching rule wins.
    pub fn for_key(key: GridKey) -> Self {
        let (x, y) = (key.frequency.value(), key.monetary.value());
        match (x, y) {
            (4.., 4..) => Self::Champions,
            (4.., 2..) => Self::LoyalCustomers,
            (3.., 3..) => Self::PotentialLoyalists,
            (3.., _) => Self::NewCustomers,
            (2.., 3..) => Self::Promising,
            (2.., _) => Self::NeedsAttention,
            (_, 3..) => Self::AtRisk,
            _ => Self::Lost,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Champions => "Champions",
            Self::LoyalCustomers => "Loyal Customers",
            Self::PotentialLoyalists => "Potential Loyalists",
            Self::NewCustomers => "New Customers",
            Self::Promising => "Promising",
            Self::NeedsAttention => "Needs Attention",
            Self::AtRisk => "At Risk",
            Self::Lost => "Lost",
        }
    }
}

/// Value gradient of a cell derived from `(frequency + monetary) / 10`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellTier {
    Bottom,
    Low,
    Mid,
    High,
    Top,
}

impl CellTier {
    pub fn for_key(key: GridKey) -> Self {
        let intensity = f64::from(key.frequency.value() + key.monetary.value()) / 10.0;
        if intensity >= 0.8 {
            Self::Top
        } else if intensity >= 0.6 {
            Self::High
        } else if intensity >= 0.4 {
            Self::Mid
        } else if intensity >= 0.2 {
            Self::Low
        } else {
            Self::Bottom
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Top => "tier-top",
            Self::High => "tier-high",
            Self::Mid => "tier-mid",
            Self::Low => "tier-low",
            Self::Bottom => "tier-bottom",
        }
    }
}

/// All 25 grid cells, each holding customers in input order.
#[derive(Clone, Debug, PartialEq)]
pub struct GridBuckets {
    cells: [Vec<ScoredCustomer>; CELL_COUNT],
}

impl GridBuckets {
    pub fn empty() -> Self {
        Self { cells: std::array::from_fn(|_| Vec::new()) }
    }

    pub fn get(&self, key: GridKey) -> &[ScoredCustomer] {
        &self.cells[key.index()]
    }

    /// Always 25.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridKey, &[ScoredCustomer])> {
        GridKey::all().map(move |key| (key, self.get(key)))
    }

    pub fn customer_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Keys in rendering order: rows from monetary 5 down to 1, columns by frequency 1 to 5.
    pub fn display_rows() -> Vec<Vec<GridKey>> {
        Score::all()
            .into_iter()
            .rev()
            .map(|monetary| {
                Score::all().into_iter().map(|frequency| GridKey::new(frequency, monetary)).collect()
            })
            .collect()
    }
}

impl Default for GridBuckets {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for GridBuckets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CELL_COUNT))?;
        for (key, customers) in self.iter() {
            map.serialize_entry(&key.to_string(), customers)?;
        }
        map.end()
    }
}

/// Groups scored customers into the 25 grid cells.
pub fn organize_grid(customers: &[ScoredCustomer]) -> GridBuckets {
    let mut buckets = GridBuckets::empty();
    for customer in customers {
        buckets.cells[GridKey::of(customer).index()].push(customer.clone());
    }
    buckets
}

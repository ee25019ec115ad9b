//! Dashboard state: the loaded dataset, the active filters, and the selection.
//!
//! State is a plain value. Loading a data source replaces the dataset, resets
//! the filters to the dataset's own ranges, and clears the selection; every
//! view (`filtered`, `grid`, `cells`, `summary`) is recomputed from it.

use serde::Serialize;

use crate::dataset::{DataSource, DatasetError};
use crate::rfm::{
    derive_ranges, filter_customers, organize_grid, CellTier, CustomerMetrics, GridBuckets,
    GridKey, RangeFilters, ScoreCalculator, ScoredCustomer, Segment,
};

/// Selected customer ids, unique, in the order they were selected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::new();
        for id in ids {
            selection.insert(id.into());
        }
        selection
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|selected| selected == id)
    }

    fn insert(&mut self, id: String) {
        if !self.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn toggle_customer(&mut self, id: &str) {
        if self.contains(id) {
            self.remove(id);
        } else {
            self.ids.push(id.to_string());
        }
    }

    /// Deselects the whole cell if all of it is selected, otherwise selects the rest of it.
    pub fn toggle_cell<'a>(&mut self, cell_ids: impl IntoIterator<Item = &'a str> + Clone) {
        let all_selected = cell_ids.clone().into_iter().all(|id| self.contains(id));
        if all_selected {
            let cell: Vec<&str> = cell_ids.into_iter().collect();
            self.ids.retain(|selected| !cell.contains(&selected.as_str()));
        } else {
            for id in cell_ids {
                self.insert(id.to_string());
            }
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.retain(|selected| selected != id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn into_ids(self) -> Vec<String> {
        self.ids
    }
}

/// Rounded averages over the selected customers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectionSummary {
    pub count: usize,
    pub average_recency: f64,
    pub average_frequency: f64,
    pub average_monetary: f64,
}

impl SelectionSummary {
    pub fn of(customers: &[ScoredCustomer]) -> Option<Self> {
        if customers.is_empty() {
            return None;
        }
        let count = customers.len();
        let mean = |value: fn(&CustomerMetrics) -> f64| {
            (customers.iter().map(|c| value(&c.metrics)).sum::<f64>() / count as f64).round()
        };
        Some(Self {
            count,
            average_recency: mean(|m: &CustomerMetrics| m.recency),
            average_frequency: mean(|m: &CustomerMetrics| m.frequency),
            average_monetary: mean(|m: &CustomerMetrics| m.monetary),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub total: usize,
    pub filtered: usize,
    pub selected: usize,
}

/// Render-ready view of one grid cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GridCellView {
    pub key: GridKey,
    pub segment: Segment,
    pub segment_label: &'static str,
    pub tier: CellTier,
    pub customer_ids: Vec<String>,
    pub customer_count: usize,
    pub selected_count: usize,
}

#[derive(Clone, Debug)]
pub struct DashboardState {
    source: DataSource,
    customers: Vec<ScoredCustomer>,
    filters: RangeFilters,
    selection: Selection,
}

impl DashboardState {
    /// Loads and scores a data source. Unseeded synthetic sources are pinned first.
    pub fn load(source: DataSource, calculator: &ScoreCalculator) -> Result<Self, DatasetError> {
        let source = source.resolve();
        let records = source.load()?;
        Ok(Self::from_scored(source, calculator.score_all(&records)))
    }

    pub fn from_scored(source: DataSource, customers: Vec<ScoredCustomer>) -> Self {
        let filters = derive_ranges(&customers);
        Self { source, customers, filters, selection: Selection::new() }
    }

    /// Replaces the dataset and resets filters and selection.
    pub fn reload(
        &mut self,
        source: DataSource,
        calculator: &ScoreCalculator,
    ) -> Result<(), DatasetError> {
        *self = Self::load(source, calculator)?;
        Ok(())
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn customers(&self) -> &[ScoredCustomer] {
        &self.customers
    }

    pub fn filters(&self) -> RangeFilters {
        self.filters
    }

    pub fn set_filters(&mut self, filters: RangeFilters) {
        self.filters = filters;
    }

    pub fn reset_filters(&mut self) {
        self.filters = self.ranges();
    }

    /// Slider bounds: the observed ranges of the full dataset.
    pub fn ranges(&self) -> RangeFilters {
        derive_ranges(&self.customers)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn filtered(&self) -> Vec<ScoredCustomer> {
        filter_customers(&self.customers, &self.filters)
    }

    pub fn grid(&self) -> GridBuckets {
        organize_grid(&self.filtered())
    }

    /// Toggles every filtered customer in the given cell.
    pub fn toggle_cell(&mut self, key: GridKey) {
        let grid = self.grid();
        let ids: Vec<&str> = grid.get(key).iter().map(ScoredCustomer::id).collect();
        if !ids.is_empty() {
            self.selection.toggle_cell(ids.iter().copied());
        }
    }

    /// Selected customers that are still visible under the current filters.
    pub fn selected_customers(&self) -> Vec<ScoredCustomer> {
        self.filtered().into_iter().filter(|c| self.selection.contains(c.id())).collect()
    }

    pub fn summary(&self) -> Option<SelectionSummary> {
        SelectionSummary::of(&self.selected_customers())
    }

    pub fn counts(&self) -> DashboardCounts {
        DashboardCounts {
            total: self.customers.len(),
            filtered: self.filtered().len(),
            selected: self.selection.len(),
        }
    }

    /// Cells in rendering order, top row first.
    pub fn cells(&self) -> Vec<Vec<GridCellView>> {
        let grid = self.grid();
        GridBuckets::display_rows()
            .into_iter()
            .map(|row| row.into_iter().map(|key| self.cell_view(&grid, key)).collect())
            .collect()
    }

    fn cell_view(&self, grid: &GridBuckets, key: GridKey) -> GridCellView {
        let customers = grid.get(key);
        let segment = key.segment();
        GridCellView {
            key,
            segment,
            segment_label: segment.label(),
            tier: key.tier(),
            customer_ids: customers.iter().map(|c| c.id().to_string()).collect(),
            customer_count: customers.len(),
            selected_count: customers.iter().filter(|c| self.selection.contains(c.id())).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DashboardState, Selection, SelectionSummary};
    use crate::dataset::DataSource;
    use crate::rfm::{
        calculate_scores, CustomerMetrics, Dimension, DimensionRange, GridKey, RangeFilters,
        ScoreCalculator,
    };

    fn state() -> DashboardState {
        let records = vec![
            CustomerMetrics::new("c1", 10.0, 5.0, 100.0),
            CustomerMetrics::new("c2", 100.0, 50.0, 10_000.0),
            CustomerMetrics::new("c3", 10.0, 5.0, 100.0),
            CustomerMetrics::new("c4", 40.0, 20.0, 3_000.0),
        ];
        DashboardState::from_scored(DataSource::Fixture, calculate_scores(&records))
    }

    #[test]
    fn toggle_customer_adds_then_removes() {
        let mut selection = Selection::new();
        selection.toggle_customer("c1");
        selection.toggle_customer("c2");
        assert_eq!(selection.ids(), ["c1", "c2"]);
        selection.toggle_customer("c1");
        assert_eq!(selection.ids(), ["c2"]);
    }

    #[test]
    fn toggle_cell_selects_missing_then_deselects_when_complete() {
        let mut selection = Selection::from_ids(["c1", "x"]);
        selection.toggle_cell(["c1", "c3"]);
        assert_eq!(selection.ids(), ["c1", "x", "c3"]);

        selection.toggle_cell(["c1", "c3"]);
        assert_eq!(selection.ids(), ["x"]);
    }

    #[test]
    fn from_ids_deduplicates() {
        assert_eq!(Selection::from_ids(["a", "b", "a"]).len(), 2);
    }

    #[test]
    fn load_initializes_filters_to_dataset_ranges_and_clears_selection() {
        let calculator = ScoreCalculator::new();
        let mut dashboard =
            DashboardState::load(DataSource::Fixture, &calculator).expect("fixture loads");
        assert_eq!(dashboard.filters(), dashboard.ranges());
        assert_eq!(dashboard.counts().total, 150);
        assert_eq!(dashboard.counts().filtered, 150);

        dashboard.selection_mut().toggle_customer("customer_001");
        dashboard
            .reload(DataSource::Synthetic { seed: Some(5) }, &calculator)
            .expect("synthetic loads");
        assert!(dashboard.selection().is_empty());
        assert_eq!(dashboard.source(), DataSource::Synthetic { seed: Some(5) });
        assert_eq!(dashboard.filters(), dashboard.ranges());
    }

    #[test]
    fn unseeded_synthetic_load_records_its_seed() {
        let dashboard =
            DashboardState::load(DataSource::Synthetic { seed: None }, &ScoreCalculator::new())
                .expect("synthetic loads");
        assert!(dashboard.source().seed().is_some());
    }

    #[test]
    fn toggle_cell_uses_filtered_grid() {
        let mut dashboard = state();
        let key = GridKey::of(&dashboard.customers()[0]);
        dashboard.toggle_cell(key);
        assert_eq!(dashboard.selection().ids(), ["c1", "c3"]);
        dashboard.toggle_cell(key);
        assert!(dashboard.selection().is_empty());
    }

    #[test]
    fn selected_customers_are_limited_to_visible_ones() {
        let mut dashboard = state().with_selection(Selection::from_ids(["c1", "c2"]));
        assert_eq!(dashboard.selected_customers().len(), 2);

        let filters =
            RangeFilters::FALLBACK.with(Dimension::Frequency, DimensionRange::new(0.0, 10.0));
        dashboard.set_filters(filters);
        let visible: Vec<String> =
            dashboard.selected_customers().iter().map(|c| c.id().to_string()).collect();
        assert_eq!(visible, vec!["c1".to_string()]);
        assert_eq!(dashboard.counts().selected, 2);

        dashboard.reset_filters();
        assert_eq!(dashboard.counts().filtered, 4);
    }

    #[test]
    fn summary_rounds_averages() {
        let dashboard = state().with_selection(Selection::from_ids(["c1", "c4"]));
        let summary = dashboard.summary().expect("selection is not empty");
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average_recency, 25.0);
        assert_eq!(summary.average_frequency, 13.0);
        assert_eq!(summary.average_monetary, 1_550.0);
        assert_eq!(SelectionSummary::of(&[]), None);
    }

    #[test]
    fn cells_cover_grid_and_count_selection() {
        let dashboard = state().with_selection(Selection::from_ids(["c1"]));
        let cells = dashboard.cells();
        assert_eq!(cells.len(), 5);
        assert!(cells.iter().all(|row| row.len() == 5));

        let total: usize = cells.iter().flatten().map(|cell| cell.customer_count).sum();
        assert_eq!(total, 4);
        let selected: usize = cells.iter().flatten().map(|cell| cell.selected_count).sum();
        assert_eq!(selected, 1);
    }
}

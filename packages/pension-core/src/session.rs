//! Dashboard session: loading, selection, recompute, sorting and export.

use crate::config::DashboardConfig;
use crate::dataset::Dataset;
use crate::engine::{sort_rows, DetailColumn, StatsColumn};
use crate::export;
use crate::i18n::I18n;
use crate::offline::{Fetch, OfflineCache};
use crate::store::Store;
use crate::types::{DetailRow, StatRow};
use crate::view::{derive_view, DerivedView, ViewState};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use tracing::{info, warn};

/// Result of restoring the last upload on startup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Restored { records: usize },
    UploadRequired,
}

/// Result of reloading the data resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Refreshed {
    pub records: usize,
    /// The resource could not be fetched and the cached copy was used
    pub from_cache: bool,
}

/// One dashboard: a dataset, the user's selection and the last derived view.
#[derive(Debug, Clone)]
pub struct Dashboard {
    config: DashboardConfig,
    i18n: I18n,
    dataset: Dataset,
    view: ViewState,
    derived: Option<DerivedView>,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let i18n = I18n::new(&config.locale());
        Self {
            config,
            i18n,
            dataset: Dataset::default(),
            view: ViewState::default(),
            derived: None,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Last derived view, if it is still current.
    pub fn derived(&self) -> Option<&DerivedView> {
        self.derived.as_ref()
    }

    /// Restore the last upload from the store.
    ///
    /// Persistence failures are logged and reported as `UploadRequired`.
    pub fn start<S: Store + ?Sized>(&mut self, store: &mut S) -> LoadOutcome {
        if let Err(e) = store.init() {
            warn!(error = %e, "store unavailable, upload required");
            return LoadOutcome::UploadRequired;
        }

        match store.get() {
            Ok(Some(document)) => match self.load_document(&document) {
                Ok(records) => {
                    info!(records, "restored last upload");
                    LoadOutcome::Restored { records }
                }
                Err(e) => {
                    warn!(error = %e, "stored document could not be loaded");
                    LoadOutcome::UploadRequired
                }
            },
            Ok(None) => LoadOutcome::UploadRequired,
            Err(e) => {
                warn!(error = %e, "failed to read store, upload required");
                LoadOutcome::UploadRequired
            }
        }
    }

    /// Load an uploaded JSON text and persist the original document.
    ///
    /// Invalid JSON leaves the current dataset untouched. A failed save is
    /// logged and does not fail the upload.
    pub fn upload<S: Store + ?Sized>(&mut self, text: &str, store: &mut S) -> Result<usize> {
        let document: Value =
            serde_json::from_str(text).map_err(|e| Error::Parse(e.to_string()))?;
        let records = self.load_document(&document)?;
        info!(records, managers = self.dataset.managers().len(), "loaded upload");

        if let Err(e) = store.save(&document) {
            warn!(error = %e, "failed to persist upload");
        }
        Ok(records)
    }

    /// Replace the dataset wholesale and reset the selection to its defaults.
    pub fn load_document(&mut self, document: &Value) -> Result<usize> {
        let dataset = Dataset::from_document(document)?;
        self.view = ViewState::for_dataset(&dataset, &self.config);
        self.dataset = dataset;
        self.derived = None;
        Ok(self.dataset.records().len())
    }

    /// Reload the configured data resource through the offline cache.
    pub fn refresh<F: Fetch, S: Store + ?Sized>(
        &mut self,
        cache: &mut OfflineCache<F>,
        store: &mut S,
    ) -> Result<Refreshed> {
        let fetched = cache.get(self.config.data_resource())?;
        let document: Value =
            serde_json::from_str(&fetched.body).map_err(|e| Error::Parse(e.to_string()))?;
        let records = self.load_document(&document)?;
        info!(records, from_cache = fetched.from_cache, "refreshed data resource");

        if let Err(e) = store.save(&document) {
            warn!(error = %e, "failed to persist refreshed document");
        }
        Ok(Refreshed {
            records,
            from_cache: fetched.from_cache,
        })
    }

    /// Forget the dataset and clear the store.
    pub fn reset<S: Store + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        self.dataset = Dataset::default();
        self.view = ViewState::default();
        self.derived = None;
        store.clear()
    }

    pub fn set_view(&mut self, view: ViewState) {
        self.view = view;
        self.derived = None;
    }

    /// Derive the view for the current selection.
    ///
    /// When the start boundary is after the end boundary the start is moved
    /// onto the end and the error is returned without a view.
    pub fn recompute(&mut self) -> Result<&DerivedView> {
        match derive_view(&self.dataset, &self.view, &self.i18n) {
            Ok(derived) => Ok(self.derived.insert(derived)),
            Err(Error::RangeOrder { start, end }) => {
                warn!(start, end, "start boundary after end boundary, resetting start");
                self.view.start_index = self.view.end_index;
                self.derived = None;
                Err(Error::RangeOrder { start, end })
            }
            Err(e) => {
                self.derived = None;
                Err(e)
            }
        }
    }

    fn ensure_derived(&mut self) -> Result<()> {
        if self.derived.is_none() {
            self.recompute()?;
        }
        Ok(())
    }

    /// Click on a statistics table header.
    pub fn sort_stats(&mut self, column: StatsColumn) -> Result<&[StatRow]> {
        if !column.applies_to(self.view.data_type) {
            return Err(Error::UnknownColumn(format!(
                "{column:?} is not shown for {:?}",
                self.view.data_type
            )));
        }
        self.ensure_derived()?;
        self.view.stats_sort = self.view.stats_sort.toggled(column);

        let state = self.view.stats_sort;
        let derived = self.derived.as_mut().ok_or(Error::EmptyDataset)?;
        sort_rows(&mut derived.stats, &state);
        Ok(&derived.stats)
    }

    /// Click on a detail table header.
    pub fn sort_detail(&mut self, column: DetailColumn) -> Result<&[DetailRow]> {
        self.ensure_derived()?;
        self.view.detail_sort = self.view.detail_sort.toggled(column);

        let state = self.view.detail_sort;
        let derived = self.derived.as_mut().ok_or(Error::EmptyDataset)?;
        sort_rows(&mut derived.detail, &state);
        Ok(&derived.detail)
    }

    /// Returns false for names not in the dataset.
    pub fn toggle_manager(&mut self, manager: &str) -> bool {
        let changed = self.view.toggle_manager(&self.dataset, manager);
        if changed {
            self.derived = None;
        }
        changed
    }

    pub fn select_all_managers(&mut self) {
        self.view.select_all_managers(&self.dataset);
        self.derived = None;
    }

    pub fn clear_managers(&mut self) {
        self.view.clear_managers();
        self.derived = None;
    }

    /// Write the filtered records as CSV. Returns the number of data rows.
    pub fn export_csv<W: Write>(&mut self, writer: W) -> Result<usize> {
        self.ensure_derived()?;
        let derived = self.derived.as_ref().ok_or(Error::EmptyDataset)?;
        export::write_csv(
            writer,
            &derived.records,
            self.view.data_type,
            self.view.asset_class,
            &self.i18n,
        )
    }

    /// Render the current chart as SVG.
    pub fn export_svg(&mut self) -> Result<String> {
        self.ensure_derived()?;
        let derived = self.derived.as_ref().ok_or(Error::EmptyDataset)?;
        Ok(export::render_svg(
            &derived.chart,
            self.view.data_type,
            &self.i18n,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::FileFetcher;
    use crate::store::{FileStore, MemoryStore};
    use crate::types::DataType;
    use serde_json::json;
    use tempfile::TempDir;

    /// Store whose every operation fails.
    struct BrokenStore;

    impl Store for BrokenStore {
        fn init(&mut self) -> Result<()> {
            Err(Error::Persistence("store is read-only".to_string()))
        }

        fn save(&mut self, _document: &Value) -> Result<()> {
            Err(Error::Persistence("store is read-only".to_string()))
        }

        fn get(&self) -> Result<Option<Value>> {
            Err(Error::Persistence("store is read-only".to_string()))
        }

        fn clear(&mut self) -> Result<()> {
            Err(Error::Persistence("store is read-only".to_string()))
        }
    }

    fn document() -> Value {
        json!({
            "华夏": {
                "收益率（单季）_整体_固定收益类": {
                    "2024-09-30": 10.0, "2024-12-31": -10.0, "2025-03-31": 5.0
                },
                "组合数_整体_整体": { "2024-09-30": 100, "2024-12-31": 110, "2025-03-31": 120 }
            },
            "南方": {
                "收益率（单季）_整体_固定收益类": {
                    "2024-09-30": 20.0, "2024-12-31": -50.0, "2025-03-31": 30.0
                },
                "组合数_整体_整体": { "2024-12-31": 300, "2025-03-31": 330 }
            }
        })
    }

    fn dashboard() -> Dashboard {
        let config = DashboardConfig {
            locale: Some("en".to_string()),
            ..DashboardConfig::default()
        };
        Dashboard::new(config)
    }

    #[test]
    fn test_start_without_upload() {
        let mut dashboard = dashboard();
        let mut store = MemoryStore::new();
        assert_eq!(dashboard.start(&mut store), LoadOutcome::UploadRequired);
        assert!(matches!(dashboard.recompute(), Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_upload_then_restore() {
        let mut store = MemoryStore::new();
        let mut first = dashboard();
        let records = first.upload(&document().to_string(), &mut store).unwrap();
        assert_eq!(records, 11);

        // the original nested document is what gets persisted
        assert_eq!(store.get().unwrap(), Some(document()));

        let mut second = dashboard();
        assert_eq!(
            second.start(&mut store),
            LoadOutcome::Restored { records: 11 }
        );
        assert_eq!(second.dataset().dates().len(), 3);
    }

    #[test]
    fn test_parse_error_keeps_dataset() {
        let mut dashboard = dashboard();
        let mut store = MemoryStore::new();
        dashboard.upload(&document().to_string(), &mut store).unwrap();

        let result = dashboard.upload("{ not json", &mut store);
        assert!(matches!(result, Err(Error::Parse(_))));
        assert_eq!(dashboard.dataset().records().len(), 11);
        assert_eq!(store.get().unwrap(), Some(document()));
    }

    #[test]
    fn test_persistence_errors_are_not_fatal() {
        let mut dashboard = dashboard();
        let mut store = BrokenStore;
        assert_eq!(dashboard.start(&mut store), LoadOutcome::UploadRequired);

        let records = dashboard.upload(&document().to_string(), &mut store).unwrap();
        assert_eq!(records, 11);
        assert_eq!(dashboard.recompute().unwrap().stats.len(), 2);
    }

    #[test]
    fn test_range_order_resets_start() {
        let mut dashboard = dashboard();
        dashboard
            .upload(&document().to_string(), &mut MemoryStore::new())
            .unwrap();

        let mut view = dashboard.view().clone();
        view.start_index = 0;
        view.end_index = 1;
        dashboard.set_view(view);

        assert!(matches!(
            dashboard.recompute(),
            Err(Error::RangeOrder { start: 0, end: 1 })
        ));
        assert!(dashboard.derived().is_none());
        assert_eq!(dashboard.view().start_index, 1);
        assert!(dashboard.recompute().is_ok());
    }

    #[test]
    fn test_out_of_range_end_leaves_start_alone() {
        let mut dashboard = dashboard();
        dashboard
            .upload(&document().to_string(), &mut MemoryStore::new())
            .unwrap();

        let mut view = dashboard.view().clone();
        view.start_index = 1;
        view.end_index = 5;
        dashboard.set_view(view);

        assert!(matches!(
            dashboard.recompute(),
            Err(Error::IndexOutOfRange { index: 5, len: 3 })
        ));
        assert_eq!(dashboard.view().start_index, 1);

        let mut view = dashboard.view().clone();
        view.end_index = 0;
        dashboard.set_view(view);
        assert!(dashboard.recompute().is_ok());
    }

    #[test]
    fn test_sort_stats_toggles_persisted_state() {
        let mut dashboard = dashboard();
        dashboard
            .upload(&document().to_string(), &mut MemoryStore::new())
            .unwrap();

        let ranked: Vec<String> = dashboard
            .recompute()
            .unwrap()
            .stats
            .iter()
            .map(|r| r.manager().to_string())
            .collect();
        assert_eq!(ranked, vec!["华夏", "南方"]);

        let rows = dashboard.sort_stats(StatsColumn::MaxDrawdown).unwrap();
        assert_eq!(rows[0].manager(), "南方");
        assert_eq!(rows[0].rank(), 1);

        let rows = dashboard.sort_stats(StatsColumn::MaxDrawdown).unwrap();
        assert_eq!(rows[0].manager(), "华夏");
        assert_eq!(
            dashboard.view().stats_sort.direction,
            crate::engine::SortDirection::Ascending
        );

        assert!(matches!(
            dashboard.sort_stats(StatsColumn::StartValue),
            Err(Error::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_sort_detail_and_selection() {
        let mut dashboard = dashboard();
        dashboard
            .upload(&document().to_string(), &mut MemoryStore::new())
            .unwrap();

        let rows = dashboard.sort_detail(DetailColumn::Value).unwrap();
        assert_eq!(rows[0].value, 30.0);

        assert!(dashboard.toggle_manager("南方"));
        assert!(dashboard.derived().is_none());
        assert!(!dashboard.toggle_manager("unknown"));
        let view = dashboard.recompute().unwrap();
        assert!(view.records.iter().all(|r| r.manager == "华夏"));

        dashboard.clear_managers();
        assert!(dashboard.recompute().unwrap().stats.is_empty());
        dashboard.select_all_managers();
        assert_eq!(dashboard.recompute().unwrap().stats.len(), 2);
    }

    #[test]
    fn test_level_type_missing_manager() {
        let mut dashboard = dashboard();
        dashboard
            .upload(&document().to_string(), &mut MemoryStore::new())
            .unwrap();

        let mut view = dashboard.view().clone();
        view.data_type = DataType::Scale;
        view.start_index = 2;
        view.end_index = 2;
        dashboard.set_view(view);

        let derived = dashboard.recompute().unwrap();
        assert_eq!(derived.stats.len(), 1);
        assert_eq!(derived.missing_managers, vec!["南方".to_string()]);
    }

    #[test]
    fn test_refresh_and_reset() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::write(data_dir.join("pension_data.json"), document().to_string()).unwrap();

        let mut store = FileStore::with_path(temp_dir.path().join("store.json"));
        let mut cache = OfflineCache::new(FileFetcher::new(&data_dir), "pension_data.json");
        let mut dashboard = dashboard();

        let refreshed = dashboard.refresh(&mut cache, &mut store).unwrap();
        assert_eq!(refreshed.records, 11);
        assert!(!refreshed.from_cache);
        assert!(store.get().unwrap().is_some());

        // source gone: the cached copy is served
        std::fs::remove_file(data_dir.join("pension_data.json")).unwrap();
        let refreshed = dashboard.refresh(&mut cache, &mut store).unwrap();
        assert!(refreshed.from_cache);

        dashboard.reset(&mut store).unwrap();
        assert!(dashboard.dataset().is_empty());
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn test_exports() {
        let mut dashboard = dashboard();
        dashboard
            .upload(&document().to_string(), &mut MemoryStore::new())
            .unwrap();

        let mut buffer = Vec::new();
        let rows = dashboard.export_csv(&mut buffer).unwrap();
        assert_eq!(rows, 6);
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("Date,Manager,Value,Type"));

        let svg = dashboard.export_svg().unwrap();
        assert!(svg.starts_with("<svg"));
    }
}

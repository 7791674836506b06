//! View state and fetch sequencing.
//!
//! The explorer owns the current data epoch: the parsed "tree" and
//! "tangling" documents of one successful refresh. A refresh builds a new
//! epoch off to the side and swaps it in whole; a failed refresh leaves the
//! previous epoch in place. Every projection reads one epoch snapshot and
//! never mutates it.
//!
//! Nothing renders before the first refresh succeeds.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, FormatError, Result, ViewError};
use crate::models::{ChartView, FeatureNode, FeatureSnapshot, GraphMode};
use crate::projector::{
    to_tangling_graph, to_tree_shape, to_treemap_shape, FeatureDetail, TanglingGraph,
    TreeShapeNode, TreemapNode,
};
use crate::scattering::{self, ScatteringGraph};
use crate::search::{SearchIndex, SearchMatches, SearchMode};
use crate::source::{DatasetKey, FeatureSource, HostCommand};
use crate::timeline::{
    deleted_feature_rows, DeletedFeatureRow, TimelinePoint, TimelineSelection, TimelineView,
};
use crate::tree::{FeatureTree, TanglingDataset, ValidationPolicy};

/// Datasets fetched by one refresh, in order.
const REFRESH_TASKS: [DatasetKey; 2] = [DatasetKey::Tangling, DatasetKey::Tree];

/// User display preferences that change how views are decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPrefs {
    pub show_identifiers: bool,
    pub tangling_mode: GraphMode,
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            show_identifiers: true,
            tangling_mode: GraphMode::Circular,
        }
    }
}

/// Partial preference update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefsUpdate {
    pub show_identifiers: Option<bool>,
    pub tangling_mode: Option<GraphMode>,
}

/// The documents of one successful refresh.
#[derive(Debug)]
pub struct DataEpoch {
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
    /// Root features, for the tree and treemap views.
    pub tree: FeatureTree,
    /// Every feature at top level, for graph views, search and lookups.
    pub tangling: TanglingDataset,
}

impl DataEpoch {
    /// Look a feature up, preferring the tangling document.
    pub fn find(&self, id: &str) -> Option<&FeatureNode> {
        self.tangling
            .tree
            .find_by_id(id)
            .or_else(|| self.tree.find_by_id(id))
    }
}

/// The last feature history fetched.
#[derive(Debug)]
struct HistoryEpoch {
    snapshot: FeatureSnapshot,
    timeline: TimelineView,
}

/// A rendered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum ViewModel {
    Tree(Vec<TreeShapeNode>),
    Treemap(Vec<TreemapNode>),
    Tangling(TanglingGraph),
    /// `None` while no feature is selected.
    Scattering(Option<ScatteringGraph>),
    Timeline(TimelineView),
    Deleted(Vec<DeletedFeatureRow>),
}

#[derive(Debug, Clone, Default)]
struct UiState {
    current: ChartView,
    prefs: DisplayPrefs,
    selected: Option<String>,
}

/// Snapshot of the explorer for status displays.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerStatus {
    pub initialized: bool,
    pub current_view: ChartView,
    pub generation: Option<u64>,
    pub features: usize,
    pub prefs: DisplayPrefs,
    pub fetch_label: String,
}

/// Label describing how long ago data was fetched.
pub fn fetch_age_label(elapsed: chrono::Duration) -> String {
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        "Last fetch few seconds ago".to_string()
    } else if minutes < 2 {
        "Last fetch 1 minute ago".to_string()
    } else {
        format!("Last fetch {} minutes ago", minutes)
    }
}

/// Raised while a fetch is in flight; lowered on drop, so a cancelled
/// refresh never leaves the status stuck at "fetching...".
struct FetchingFlag<'a>(&'a AtomicBool);

impl<'a> FetchingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for FetchingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Explorer {
    source: Arc<dyn FeatureSource>,
    policy: ValidationPolicy,
    epoch: RwLock<Option<Arc<DataEpoch>>>,
    history: RwLock<Option<Arc<HistoryEpoch>>>,
    ui: RwLock<UiState>,
    /// Serializes fetches so one key never has two requests in flight.
    fetch_lock: tokio::sync::Mutex<()>,
    fetching: AtomicBool,
    generation: AtomicU64,
}

impl Explorer {
    pub fn new(
        source: Arc<dyn FeatureSource>,
        policy: ValidationPolicy,
        prefs: DisplayPrefs,
    ) -> Self {
        Self {
            source,
            policy,
            epoch: RwLock::new(None),
            history: RwLock::new(None),
            ui: RwLock::new(UiState {
                prefs,
                ..UiState::default()
            }),
            fetch_lock: tokio::sync::Mutex::new(()),
            fetching: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    // ============================================================
    // Data epochs
    // ============================================================

    /// Fetch the tangling and tree documents and swap in a new epoch.
    ///
    /// On failure the previous epoch stays current.
    pub async fn refresh(&self) -> Result<Arc<DataEpoch>> {
        let _guard = self.fetch_lock.lock().await;
        let result = {
            let _fetching = FetchingFlag::raise(&self.fetching);
            self.build_epoch().await
        };

        match result {
            Ok(epoch) => {
                let epoch = Arc::new(epoch);
                *self.epoch.write().expect("epoch lock poisoned") = Some(epoch.clone());
                tracing::info!(
                    "Data epoch {} ready: {} features, {} tangling links",
                    epoch.generation,
                    epoch.tangling.tree.len(),
                    epoch.tangling.links.len()
                );
                Ok(epoch)
            }
            Err(e) => {
                tracing::warn!("Refresh failed, keeping previous data: {}", e);
                Err(e)
            }
        }
    }

    async fn build_epoch(&self) -> Result<DataEpoch> {
        let mut tangling = None;
        let mut tree = None;
        for key in REFRESH_TASKS {
            let raw = self.source.fetch(key).await?;
            match key {
                DatasetKey::Tangling => {
                    tangling = Some(
                        TanglingDataset::parse_with(&raw, self.policy).map_err(document(key))?,
                    );
                }
                DatasetKey::Tree => {
                    tree = Some(
                        FeatureTree::parse_with(&raw, self.policy).map_err(document(key))?,
                    );
                }
                DatasetKey::FeatureHistory => {}
            }
        }

        Ok(DataEpoch {
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
            fetched_at: Utc::now(),
            tree: tree.unwrap_or_default(),
            tangling: tangling.unwrap_or_default(),
        })
    }

    /// Fetch the feature history afresh and replace the stored one.
    async fn refresh_history(&self) -> Result<Arc<HistoryEpoch>> {
        let _guard = self.fetch_lock.lock().await;
        let key = DatasetKey::FeatureHistory;
        let raw = self.source.fetch(key).await?;
        let snapshot: FeatureSnapshot = serde_json::from_str(&raw)
            .map_err(FormatError::from)
            .map_err(document(key))?;
        let timeline = TimelineView::from_snapshot(&snapshot).map_err(document(key))?;

        let history = Arc::new(HistoryEpoch { snapshot, timeline });
        *self.history.write().expect("history lock poisoned") = Some(history.clone());
        Ok(history)
    }

    /// The current epoch, or `NotInitialized` before the first refresh.
    pub fn epoch(&self) -> Result<Arc<DataEpoch>, ViewError> {
        self.epoch
            .read()
            .expect("epoch lock poisoned")
            .clone()
            .ok_or(ViewError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.epoch.read().expect("epoch lock poisoned").is_some()
    }

    fn stored_history(&self) -> Result<Arc<HistoryEpoch>, ViewError> {
        self.history
            .read()
            .expect("history lock poisoned")
            .clone()
            .ok_or(ViewError::NotInitialized)
    }

    // ============================================================
    // Views
    // ============================================================

    pub fn current_view(&self) -> ChartView {
        self.ui.read().expect("ui lock poisoned").current
    }

    pub fn prefs(&self) -> DisplayPrefs {
        self.ui.read().expect("ui lock poisoned").prefs
    }

    /// Switch to `view` and render it.
    ///
    /// History views fetch the feature history on every activation.
    pub async fn activate(&self, view: ChartView) -> Result<ViewModel> {
        self.epoch()?;
        if view.needs_history() {
            self.refresh_history().await?;
        }
        let model = self.render(view)?;
        self.ui.write().expect("ui lock poisoned").current = view;
        tracing::debug!("Activated {} view", view.as_str());
        Ok(model)
    }

    /// Render `view` from the current epoch without switching to it.
    pub fn render(&self, view: ChartView) -> Result<ViewModel> {
        let epoch = self.epoch()?;
        let ui = self.ui.read().expect("ui lock poisoned").clone();

        let model = match view {
            ChartView::Tree => ViewModel::Tree(to_tree_shape(&epoch.tree)),
            ChartView::Treemap => ViewModel::Treemap(to_treemap_shape(&epoch.tree)),
            ChartView::TanglingGraph => ViewModel::Tangling(to_tangling_graph(
                epoch.tangling.tree.features(),
                &epoch.tangling.links,
                ui.prefs.tangling_mode,
                ui.prefs.show_identifiers,
            )),
            ChartView::Scattering => ViewModel::Scattering(
                ui.selected
                    .as_deref()
                    .and_then(|id| epoch.find(id))
                    .map(scattering::assemble_feature),
            ),
            ChartView::Timeline => ViewModel::Timeline(self.stored_history()?.timeline.clone()),
            ChartView::DeletedFeatures => {
                ViewModel::Deleted(deleted_feature_rows(&self.stored_history()?.snapshot))
            }
        };
        Ok(model)
    }

    /// Apply a preference change. Returns the re-rendered tangling view when
    /// it is the current view and the change affects it.
    pub fn update_prefs(&self, update: PrefsUpdate) -> Result<Option<ViewModel>> {
        let (before, after, current) = {
            let mut ui = self.ui.write().expect("ui lock poisoned");
            let before = ui.prefs;
            if let Some(show) = update.show_identifiers {
                ui.prefs.show_identifiers = show;
            }
            if let Some(mode) = update.tangling_mode {
                ui.prefs.tangling_mode = mode;
            }
            (before, ui.prefs, ui.current)
        };
        tracing::debug!(
            "Display preferences: identifiers {}, tangling {}",
            if after.show_identifiers { "shown" } else { "hidden" },
            after.tangling_mode.as_str()
        );

        if before != after && current == ChartView::TanglingGraph && self.is_initialized() {
            return self.render(ChartView::TanglingGraph).map(Some);
        }
        Ok(None)
    }

    // ============================================================
    // Queries
    // ============================================================

    /// Resolve a search against the current view.
    pub fn search(&self, text: &str, mode: SearchMode) -> Result<SearchMatches, ViewError> {
        let epoch = self.epoch()?;
        let ui = self.ui.read().expect("ui lock poisoned").clone();
        let index =
            SearchIndex::for_view(&epoch.tangling.tree, ui.current, ui.prefs.show_identifiers);
        Ok(index.query(text, mode))
    }

    pub fn feature_detail(&self, id: &str) -> Result<FeatureDetail> {
        let epoch = self.epoch()?;
        epoch
            .find(id)
            .map(FeatureDetail::from)
            .ok_or_else(|| Error::UnknownFeature(id.to_string()))
    }

    /// Show a feature in the detail panel. Later scattering renders use it.
    pub fn select_feature(&self, id: &str) -> Result<FeatureDetail> {
        let detail = self.feature_detail(id)?;
        self.ui.write().expect("ui lock poisoned").selected = Some(id.to_string());
        Ok(detail)
    }

    pub fn selected_feature(&self) -> Option<String> {
        self.ui.read().expect("ui lock poisoned").selected.clone()
    }

    /// Scattering graph for `id`; `None` for the empty selection.
    pub fn scattering(&self, id: &str) -> Result<Option<ScatteringGraph>> {
        let epoch = self.epoch()?;
        if id.is_empty() || id == scattering::NO_SELECTION {
            return Ok(None);
        }
        let feature = epoch
            .find(id)
            .ok_or_else(|| Error::UnknownFeature(id.to_string()))?;
        Ok(Some(scattering::assemble_feature(feature)))
    }

    /// Restrict the last fetched timeline to `selected` features.
    pub fn filter_timeline(
        &self,
        selected: &[String],
    ) -> Result<TimelineSelection<TimelinePoint>> {
        let history = self.stored_history()?;
        Ok(history.timeline.select(selected))
    }

    // ============================================================
    // Host commands
    // ============================================================

    pub async fn dispatch(&self, command: HostCommand) -> Result<()> {
        tracing::debug!("Dispatching {}", command.request_string());
        self.source.dispatch(&command).await?;
        Ok(())
    }

    pub async fn highlight_feature(&self, id: &str) -> Result<()> {
        self.feature_detail(id)?;
        self.dispatch(HostCommand::HighlightFeature { id: id.to_string() })
            .await
    }

    /// Ask the host to open the editor at the feature's declaration.
    pub async fn reveal_declaration(&self, id: &str) -> Result<()> {
        self.feature_detail(id)?;
        self.dispatch(HostCommand::HighlightPsiElement { id: id.to_string() })
            .await
    }

    // ============================================================
    // Status
    // ============================================================

    pub fn status(&self) -> ExplorerStatus {
        self.status_at(Utc::now())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> ExplorerStatus {
        let epoch = self.epoch().ok();
        let ui = self.ui.read().expect("ui lock poisoned").clone();
        let fetch_label = if self.fetching.load(Ordering::SeqCst) {
            "fetching...".to_string()
        } else {
            match &epoch {
                Some(epoch) => fetch_age_label(now - epoch.fetched_at),
                None => "Never fetched".to_string(),
            }
        };

        ExplorerStatus {
            initialized: epoch.is_some(),
            current_view: ui.current,
            generation: epoch.as_ref().map(|e| e.generation),
            features: epoch.as_ref().map_or(0, |e| e.tangling.tree.len()),
            prefs: ui.prefs,
            fetch_label,
        }
    }

    /// Refresh every `every` until the task is aborted.
    pub fn spawn_auto_fetch(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = self.refresh().await {
                    tracing::warn!("Automatic refresh failed: {}", e);
                }
            }
        })
    }
}

fn document(key: DatasetKey) -> impl Fn(FormatError) -> Error {
    move |source| Error::Document { key, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_labels() {
        assert_eq!(
            fetch_age_label(chrono::Duration::seconds(59)),
            "Last fetch few seconds ago"
        );
        assert_eq!(
            fetch_age_label(chrono::Duration::seconds(90)),
            "Last fetch 1 minute ago"
        );
        assert_eq!(
            fetch_age_label(chrono::Duration::minutes(12)),
            "Last fetch 12 minutes ago"
        );
    }
}

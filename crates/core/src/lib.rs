pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{debug, info, warn};
use models::{
    history::{ChartPoint, HistoryMode, SessionHistory},
    holding::{normalize_symbol, Holding},
    metrics::{HoldingMetrics, PortfolioMetrics, SortColumn, SortDirection},
    portfolio::Portfolio,
    price::{PriceCache, PriceQuote},
    project::{normalize_tag, Project},
    settings::Settings,
    snapshot::{Snapshot, SnapshotTrigger},
    transaction::Transaction,
};
use providers::registry::PriceProviderRegistry;
use services::{
    history_service::HistoryService, ledger_service::LedgerService,
    metrics_service::MetricsService, price_service::PriceService,
    snapshot_service::SnapshotService,
};
use storage::{config::StorageConfig, manager::StorageManager, traits::Storage};
use uuid::Uuid;

use errors::CoreError;

/// A rendered daily-history export, ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryExport {
    pub filename: String,
    pub csv: String,
}

/// Main entry point for the portfolio tracker core.
///
/// Owns the whole session: the live ledger, the price cache, the session
/// history and the retained snapshots, plus the services and storage that
/// operate on them. There are no module-level singletons, so several trackers
/// (e.g. in parallel tests) never share state.
///
/// Ledger mutations take `&mut self`; there is exactly one mutator.
#[must_use]
pub struct PortfolioTracker {
    portfolio: Portfolio,
    transactions: Vec<Transaction>,
    projects: Vec<Project>,
    settings: Settings,
    price_cache: PriceCache,
    session_history: SessionHistory,
    /// Most recent snapshots, oldest first, capped at `settings.snapshot_retention`
    snapshots: Vec<Snapshot>,
    storage: StorageManager,
    price_service: PriceService,
    ledger_service: LedgerService,
    metrics_service: MetricsService,
    snapshot_service: SnapshotService,
    history_service: HistoryService,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("holdings", &self.portfolio.holdings.len())
            .field("cost_override", &self.portfolio.total_cost_override)
            .field("transactions", &self.transactions.len())
            .field("snapshots", &self.snapshots.len())
            .field("history", &self.session_history.len())
            .field("cached_prices", &self.price_cache.len())
            .field("storage", &self.storage.backend_name())
            .finish()
    }
}

impl PortfolioTracker {
    /// Open a tracker on `backend` with the default price providers.
    ///
    /// Runs pending schema migrations, then loads settings, ledger,
    /// transactions, projects and the most recent snapshots.
    pub async fn open(backend: Box<dyn Storage>) -> Result<Self, CoreError> {
        let storage = StorageManager::new(backend);
        storage.migrate().await?;
        let settings = storage.load_settings().await?;
        let registry = PriceProviderRegistry::new_with_defaults(&settings.api_keys);
        Self::load(storage, settings, registry).await
    }

    /// Open a tracker with a caller-supplied provider registry.
    pub async fn open_with_registry(
        backend: Box<dyn Storage>,
        registry: PriceProviderRegistry,
    ) -> Result<Self, CoreError> {
        let storage = StorageManager::new(backend);
        storage.migrate().await?;
        let settings = storage.load_settings().await?;
        Self::load(storage, settings, registry).await
    }

    /// Open a tracker on the backend described by `config`.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, CoreError> {
        Self::open(config.build()).await
    }

    // ── Ledger ──────────────────────────────────────────────────────

    /// Add a purchase, merging into an existing `(symbol, note)` holding.
    ///
    /// Records a buy transaction and persists before returning.
    pub async fn add_holding(
        &mut self,
        symbol: &str,
        amount: f64,
        purchase_price: f64,
        note: &str,
    ) -> Result<Holding, CoreError> {
        let (holding, tx) = self.ledger_service.add_or_merge_holding(
            &mut self.portfolio,
            symbol,
            amount,
            purchase_price,
            note,
        )?;
        self.transactions.push(tx);
        self.persist_ledger().await?;
        self.recompute_metrics();
        Ok(holding)
    }

    /// Remove the `(symbol, note)` holding. `Ok(None)` if there was none.
    ///
    /// A sell transaction is recorded only when a holding was removed.
    pub async fn remove_holding(
        &mut self,
        symbol: &str,
        note: &str,
    ) -> Result<Option<Holding>, CoreError> {
        let live_price = self.price_cache.get_price(&normalize_symbol(symbol));
        let Some((removed, tx)) =
            self.ledger_service
                .remove_holding(&mut self.portfolio, symbol, note, live_price)
        else {
            debug!("No holding {symbol} / '{note}' to remove");
            return Ok(None);
        };
        self.transactions.push(tx);
        self.persist_ledger().await?;
        self.recompute_metrics();
        Ok(Some(removed))
    }

    /// Empty the ledger. Confirmation is the caller's job.
    pub async fn clear_holdings(&mut self) -> Result<usize, CoreError> {
        let removed = self.ledger_service.clear(&mut self.portfolio);
        self.persist_ledger().await?;
        self.recompute_metrics();
        Ok(removed)
    }

    /// Override the aggregate cost and record a snapshot of it.
    pub async fn set_cost_override(&mut self, value: f64) -> Result<Snapshot, CoreError> {
        self.ledger_service
            .set_cost_override(&mut self.portfolio, value)?;
        self.persist_portfolio().await?;
        self.recompute_metrics();
        self.take_snapshot(None, SnapshotTrigger::CostOverride, Utc::now())
            .await
    }

    /// Drop the cost override and record a snapshot of the per-holding sum.
    pub async fn reset_cost_override(&mut self) -> Result<Snapshot, CoreError> {
        self.ledger_service
            .reset_cost_override(&mut self.portfolio)?;
        self.persist_portfolio().await?;
        self.recompute_metrics();
        self.take_snapshot(None, SnapshotTrigger::CostReset, Utc::now())
            .await
    }

    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        &self.portfolio.holdings
    }

    #[must_use]
    pub fn find_holding(&self, symbol: &str, note: &str) -> Option<&Holding> {
        self.portfolio.find(symbol, note)
    }

    #[must_use]
    pub fn cost_override(&self) -> Option<f64> {
        self.portfolio.total_cost_override
    }

    #[must_use]
    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Transaction log, oldest first.
    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    // ── Prices & Metrics ────────────────────────────────────────────

    /// Fetch fresh quotes for every held symbol and recompute metrics.
    /// Returns how many quotes arrived.
    ///
    /// On failure the previous quotes stay in place; missing prices value
    /// holdings at zero rather than failing.
    pub async fn refresh_prices(&mut self) -> Result<usize, CoreError> {
        let symbols = self.portfolio.symbols();
        if symbols.is_empty() {
            return Ok(0);
        }
        let quotes = self.price_service.fetch_prices(&symbols).await?;
        let count = quotes.len();
        self.price_cache.merge(quotes, Utc::now());
        self.recompute_metrics();
        Ok(count)
    }

    /// Put a quote into the cache by hand (offline use, tests).
    pub fn set_price(&mut self, symbol: &str, quote: PriceQuote) {
        self.price_cache.set_quote(symbol, quote);
    }

    #[must_use]
    pub fn price_cache(&self) -> &PriceCache {
        &self.price_cache
    }

    /// Current metrics. Pure: does not touch the session history.
    #[must_use]
    pub fn metrics(&self) -> PortfolioMetrics {
        self.metrics_service
            .compute(&self.portfolio, self.price_cache.quotes())
    }

    /// Recompute metrics and append a session history entry.
    pub fn recompute_metrics(&mut self) -> PortfolioMetrics {
        let metrics = self.metrics();
        let entry = self
            .history_service
            .entry_from_metrics(&metrics, &self.portfolio, Utc::now());
        self.session_history.push(entry);
        metrics
    }

    /// Holding rows sorted for display.
    #[must_use]
    pub fn sorted_rows(&self, column: SortColumn, direction: SortDirection) -> Vec<HoldingMetrics> {
        let mut rows = self.metrics().rows;
        self.metrics_service.sort_rows(&mut rows, column, direction);
        rows
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// Take a manual snapshot of the current state.
    pub async fn create_snapshot(&mut self, description: Option<String>) -> Result<Snapshot, CoreError> {
        self.take_snapshot(description, SnapshotTrigger::Manual, Utc::now())
            .await
    }

    /// Page-load hook: refresh prices, then propose an automatic snapshot.
    /// No snapshot is taken when the price refresh fails.
    pub async fn on_page_load(&mut self) -> Result<Option<Snapshot>, CoreError> {
        self.refresh_prices().await?;
        self.maybe_auto_snapshot_at(Utc::now()).await
    }

    /// Take an automatic snapshot unless the latest one is younger than the
    /// configured interval (one hour by default).
    pub async fn maybe_auto_snapshot(&mut self) -> Result<Option<Snapshot>, CoreError> {
        self.maybe_auto_snapshot_at(Utc::now()).await
    }

    /// [`Self::maybe_auto_snapshot`] with an explicit wall-clock time.
    pub async fn maybe_auto_snapshot_at(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<Snapshot>, CoreError> {
        let latest = SnapshotService::latest_timestamp(&self.snapshots);
        let interval = auto_snapshot_interval(self.settings.auto_snapshot_interval_minutes)?;
        if !self
            .snapshot_service
            .should_auto_snapshot(latest, now, interval)
        {
            debug!("Automatic snapshot suppressed; latest is from {latest:?}");
            return Ok(None);
        }
        self.take_snapshot(None, SnapshotTrigger::Automatic, now)
            .await
            .map(Some)
    }

    /// Retained snapshots, oldest first.
    #[must_use]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Re-read snapshots from storage (keeps the most recent ones).
    pub async fn reload_snapshots(&mut self) -> Result<usize, CoreError> {
        let mut snapshots = self.storage.load_snapshots().await?;
        SnapshotService::retain_recent(&mut snapshots, self.settings.snapshot_retention);
        self.snapshots = snapshots;
        Ok(self.snapshots.len())
    }

    /// Delete one snapshot. `Ok(false)` if it did not exist.
    pub async fn delete_snapshot(&mut self, id: Uuid) -> Result<bool, CoreError> {
        let removed = self.storage.delete_snapshot(id).await?;
        let before = self.snapshots.len();
        self.snapshots.retain(|s| s.id != id);
        Ok(removed || self.snapshots.len() != before)
    }

    /// Delete every snapshot. Returns how many were removed from storage.
    pub async fn delete_all_snapshots(&mut self) -> Result<usize, CoreError> {
        let removed = self.storage.delete_all_snapshots().await?;
        self.snapshots.clear();
        info!("Deleted {removed} snapshots");
        Ok(removed)
    }

    // ── History ─────────────────────────────────────────────────────

    #[must_use]
    pub fn session_history(&self) -> &SessionHistory {
        &self.session_history
    }

    /// Mode the user selected.
    #[must_use]
    pub fn history_mode(&self) -> HistoryMode {
        self.settings.history_mode
    }

    /// Mode actually feeding the chart, given which timelines have data.
    #[must_use]
    pub fn effective_history_mode(&self) -> HistoryMode {
        self.history_service
            .effective_mode(self.settings.history_mode, !self.snapshots.is_empty())
    }

    pub async fn set_history_mode(&mut self, mode: HistoryMode) -> Result<(), CoreError> {
        self.settings.history_mode = mode;
        self.storage.save_settings(&self.settings).await
    }

    /// Chart series for the effective timeline.
    #[must_use]
    pub fn chart_series(&self) -> Vec<ChartPoint> {
        self.history_service.chart_series(
            self.settings.history_mode,
            &self.session_history,
            &self.snapshots,
        )
    }

    /// Daily CSV export over `[start, end]`, read from every stored snapshot
    /// (not only the retained ones).
    pub async fn export_history(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<HistoryExport, CoreError> {
        let snapshots = self.storage.load_snapshots().await?;
        let csv = self.history_service.export_csv(&snapshots, start, end)?;
        Ok(HistoryExport {
            filename: self.history_service.export_filename(start, end),
            csv,
        })
    }

    // ── Projects ────────────────────────────────────────────────────

    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Track a new project.
    pub async fn add_project(&mut self, name: &str, tags: &[&str]) -> Result<Project, CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::validation("Project name is required"));
        }
        let mut project = Project::new(name);
        for tag in tags {
            project.add_tag(tag);
        }
        self.projects.push(project.clone());
        self.storage.save_projects(&self.projects).await?;
        Ok(project)
    }

    /// Stop tracking a project. `Ok(false)` if it was not tracked.
    pub async fn remove_project(&mut self, id: Uuid) -> Result<bool, CoreError> {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == before {
            return Ok(false);
        }
        self.storage.save_projects(&self.projects).await?;
        Ok(true)
    }

    /// Tag a project. `Ok(false)` if it already carried the tag.
    pub async fn tag_project(&mut self, id: Uuid, tag: &str) -> Result<bool, CoreError> {
        let project = self.project_mut(id)?;
        if !project.add_tag(tag) {
            return Ok(false);
        }
        self.storage.save_projects(&self.projects).await?;
        Ok(true)
    }

    /// Untag a project. `Ok(false)` if it did not carry the tag.
    pub async fn untag_project(&mut self, id: Uuid, tag: &str) -> Result<bool, CoreError> {
        let project = self.project_mut(id)?;
        if !project.remove_tag(tag) {
            return Ok(false);
        }
        self.storage.save_projects(&self.projects).await?;
        Ok(true)
    }

    /// Projects carrying `tag` (case-insensitive).
    #[must_use]
    pub fn projects_with_tag(&self, tag: &str) -> Vec<&Project> {
        let tag = normalize_tag(tag);
        self.projects.iter().filter(|p| p.tags.contains(&tag)).collect()
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings and persist them.
    /// Rebuilds the price providers if API keys changed.
    pub async fn update_settings(&mut self, settings: Settings) -> Result<(), CoreError> {
        if settings.history_capacity == 0 || settings.snapshot_retention == 0 {
            return Err(CoreError::validation(
                "History capacity and snapshot retention must be at least 1",
            ));
        }
        auto_snapshot_interval(settings.auto_snapshot_interval_minutes)?;

        if settings.api_keys != self.settings.api_keys {
            let registry = PriceProviderRegistry::new_with_defaults(&settings.api_keys);
            self.price_service = PriceService::new(registry);
        }
        if settings.history_capacity != self.session_history.capacity() {
            let mut resized = SessionHistory::with_capacity(settings.history_capacity);
            for entry in self.session_history.iter() {
                resized.push(entry.clone());
            }
            self.session_history = resized;
        }
        SnapshotService::retain_recent(&mut self.snapshots, settings.snapshot_retention);

        self.settings = settings;
        self.storage.save_settings(&self.settings).await
    }

    // ── Internal ────────────────────────────────────────────────────

    async fn load(
        storage: StorageManager,
        settings: Settings,
        registry: PriceProviderRegistry,
    ) -> Result<Self, CoreError> {
        let portfolio = storage.load_portfolio().await?;
        let transactions = storage.load_transactions().await?;
        let projects = storage.load_projects().await?;
        let mut snapshots = storage.load_snapshots().await?;
        SnapshotService::retain_recent(&mut snapshots, settings.snapshot_retention);

        info!(
            "Opened {} storage: {} holdings, {} snapshots",
            storage.backend_name(),
            portfolio.holdings.len(),
            snapshots.len()
        );

        Ok(Self {
            portfolio,
            transactions,
            projects,
            session_history: SessionHistory::with_capacity(settings.history_capacity),
            settings,
            price_cache: PriceCache::new(),
            snapshots,
            storage,
            price_service: PriceService::new(registry),
            ledger_service: LedgerService::new(),
            metrics_service: MetricsService::new(),
            snapshot_service: SnapshotService::new(),
            history_service: HistoryService::new(),
        })
    }

    async fn take_snapshot(
        &mut self,
        description: Option<String>,
        trigger: SnapshotTrigger,
        at: DateTime<Utc>,
    ) -> Result<Snapshot, CoreError> {
        let snapshot = self.snapshot_service.capture(
            &self.portfolio,
            self.price_cache.quotes(),
            &self.projects,
            description,
            trigger,
            at,
        );
        if let Err(e) = self.storage.save_snapshot(&snapshot).await {
            warn!("Failed to persist snapshot {}: {e}", snapshot.id);
            return Err(e);
        }
        self.snapshots.push(snapshot.clone());
        SnapshotService::retain_recent(&mut self.snapshots, self.settings.snapshot_retention);
        Ok(snapshot)
    }

    /// Save holdings and the transaction log. In-memory state is kept even
    /// when this fails.
    async fn persist_ledger(&self) -> Result<(), CoreError> {
        self.persist_portfolio().await?;
        if let Err(e) = self.storage.save_transactions(&self.transactions).await {
            warn!("Failed to persist transactions: {e}");
            return Err(e);
        }
        Ok(())
    }

    async fn persist_portfolio(&self) -> Result<(), CoreError> {
        if let Err(e) = self.storage.save_portfolio(&self.portfolio).await {
            warn!("Failed to persist portfolio: {e}");
            return Err(e);
        }
        Ok(())
    }

    fn project_mut(&mut self, id: Uuid) -> Result<&mut Project, CoreError> {
        self.projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("project {id}")))
    }
}

/// Automatic snapshot interval as a duration. Rejects negative values and
/// values too large to represent.
fn auto_snapshot_interval(minutes: i64) -> Result<Duration, CoreError> {
    if minutes < 0 {
        return Err(CoreError::validation(
            "Automatic snapshot interval cannot be negative",
        ));
    }
    Duration::try_minutes(minutes).ok_or_else(|| {
        CoreError::validation(format!(
            "Automatic snapshot interval of {minutes} minutes is out of range"
        ))
    })
}

pub mod history_service;
pub mod ledger_service;
pub mod metrics_service;
pub mod price_service;
pub mod snapshot_service;

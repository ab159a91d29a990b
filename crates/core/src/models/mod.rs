pub mod history;
pub mod holding;
pub mod metrics;
pub mod portfolio;
pub mod price;
pub mod project;
pub mod settings;
pub mod snapshot;
pub mod transaction;

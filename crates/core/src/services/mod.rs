pub mod conversion_service;
pub mod metrics_service;
pub mod performance_service;
pub mod valuation_service;

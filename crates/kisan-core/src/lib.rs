//! Kisan Core - advisory backend for farmers
//!
//! This crate provides the UI-agnostic advisory functionality:
//! - Data gateways over farm records (market prices, soil cards, scans)
//! - Specialist flows (soil, market, profitability, history, field health)
//! - The advisory orchestrator and a direct advisor
//! - LLM providers (Gemini, Ollama)
//! - Configuration loading
//! - Markdown presentation
//!
//! Any front end (HTTP server, CLI) consumes this crate through `AdvisoryService`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ AdvisoryRequest ┌──────────────────┐   tools   ┌─────────────┐
//! │  server/CLI  │ ───────────────→│  AdvisoryService │ ─────────→│ specialists │
//! │              │ ←───────────────│  (orchestrator)  │ ←─────────│  + gateways │
//! └──────────────┘ AdvisoryResponse└──────────────────┘           └─────────────┘
//! ```

// Public API modules
pub mod error;
pub mod types;

pub mod config;

// Farm records and gateways
pub mod data;

// Deterministic arithmetic handed to the model
pub mod finance;

// LLM provider system
pub mod llm;

// Specialist flows and orchestration
pub mod flows;
pub mod orchestration;

pub mod presentation;

// Re-export commonly used types
pub use error::{KisanError, Result};
pub use types::Language;

pub use config::{AdvisoryConfig, AdvisoryMode, KisanConfig, LlmConfig, ProviderConfig};

pub use data::{FarmStore, FarmerHistory, MarketQuote, MemoryStore};
pub use flows::{FarmerContext, SpecialistKind, SpecialistRegistry};
pub use orchestration::{
    AdvisoryRequest, AdvisoryResponse, AdvisoryService, OutcomeStatus, SpecialistOutcome,
};
pub use presentation::{AdviceSegment, RenderedAdvice};

/// Crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

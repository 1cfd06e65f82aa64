//! Advisory orchestration
//!
//! - Multi-agent advisor: the model calls specialists as tools
//! - Direct advisor: prefetched context, single call
//! - `AdvisoryService`: provider resolution, mode selection, deadline
//!
//! # Example
//!
//! ```no_run
//! use kisan_core::{AdvisoryRequest, AdvisoryService, KisanConfig, Language};
//!
//! # async fn run() -> kisan_core::Result<()> {
//! let service = AdvisoryService::new(KisanConfig::default())?;
//! let request = AdvisoryRequest::new("Should I sell my onions now?", "farmer-42")
//!     .with_language(Language::Marathi);
//! let response = service.advise(request).await?;
//! println!("{}", response.advice_text);
//! # Ok(())
//! # }
//! ```

mod direct;
mod orchestrator;
mod service;
mod types;

pub use direct::advise_direct;
pub use orchestrator::{advise_multi_agent, Synthesis};
pub use service::AdvisoryService;
pub use types::{AdvisoryRequest, AdvisoryResponse, OutcomeStatus, SpecialistOutcome};

//! Unit test infrastructure for covsearch
//!
//! Tests are organized by concern:
//! - `helpers` - shared model and sequence fixtures
//! - `model_io` - model file parsing
//! - `pipeline_scenarios` - end-to-end cascade behavior
//! - `truncation` - boundary-truncation recovery

mod helpers;
mod model_io;
mod pipeline_scenarios;
mod truncation;

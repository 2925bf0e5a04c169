//! Client for the AI Mastering API.
//!
//! A run uploads the input (and optional reference) audio, submits a
//! mastering, polls it to a terminal status, downloads the mastered audio
//! and optional video, then removes the mastering from the service.
//! [`orchestrator::MasteringOrchestrator`] drives the whole sequence against
//! any [`api::MasteringApi`] implementation.

pub mod api;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod options;
pub mod orchestrator;
pub mod poller;
pub mod retriever;
pub mod state_machine;
pub mod ui;
pub mod uploader;

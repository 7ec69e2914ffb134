//! NestQuest - Adaptive Questionnaire Flow Engine
//!
//! This crate implements the preference questionnaire for the NestQuest
//! apartment search application: a dynamically branching question flow with
//! two-stage progress tracking, periodic continuation prompts, and
//! offline-tolerant synchronization against the remote session service.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;

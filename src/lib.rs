//! Error normalization and best-effort activity logging for the academy
//! front end.
//!
//! UI code hands any raised value to an [`ErrorHandler`](services::ErrorHandler)
//! or the [`ErrorService`](services::ErrorService). The value is classified
//! into a closed [`ErrorKind`](error::ErrorKind), the user is notified once,
//! and an `"error"` entry is queued for the append-only activity table without
//! the caller waiting on it. Page visits reach the same table through the
//! [`VisitRecorder`](activity::VisitRecorder).

pub mod activity;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod navigation;
pub mod pipeline;
pub mod services;
pub mod storage;

#[cfg(test)]
mod tests;

use displaydoc::Display;
use thiserror::Error;

use super::init::InitError;

/// Top level error type for the running application.
#[derive(Debug, Error, Display)]
pub enum RuntimeError {
    /// Initialization failed: {0}
    Init(#[from] InitError),
    /// Server error: {0}
    Serve(#[from] std::io::Error),
}

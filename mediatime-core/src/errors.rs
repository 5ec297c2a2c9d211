// Mediatime
// Copyright (c) 2024 The Project Mediatime Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Mediatime.
///
/// Two outcomes are not errors: an unknown timestamp is represented by an invalid
/// [`Timestamp`](crate::units::Timestamp), and a resample buffer that does not yet hold enough
/// samples reports `Ok(false)` from its pop operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An operation requiring configuration was invoked before configuration completed.
    NotInitialized,
    /// The format, sample rate, or channel layout of an input buffer does not match the
    /// configured source specification.
    InputFormatChanged,
    /// The format, sample rate, or channel layout of an output buffer does not match the
    /// configured destination specification.
    OutputFormatChanged,
    /// Construction was attempted with an undefined channel layout, a zero sample rate, or
    /// otherwise unusable parameters.
    InvalidParameters(&'static str),
    /// The underlying sample converter failed. The code is opaque and specific to the converter.
    ConversionError(i32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::NotInitialized => write!(f, "not initialized"),
            Error::InputFormatChanged => {
                write!(f, "input format changed: buffer does not match the source specification")
            }
            Error::OutputFormatChanged => {
                write!(
                    f,
                    "output format changed: buffer does not match the destination specification"
                )
            }
            Error::InvalidParameters(msg) => write!(f, "invalid parameters: {}", msg),
            Error::ConversionError(code) => write!(f, "conversion error: code {}", code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create a not initialized error.
pub fn not_initialized_error<T>() -> Result<T> {
    Err(Error::NotInitialized)
}

/// Convenience function to create an invalid parameters error.
pub fn invalid_parameters_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::InvalidParameters(desc))
}

/// Convenience function to create a conversion error.
pub fn conversion_error<T>(code: i32) -> Result<T> {
    Err(Error::ConversionError(code))
}

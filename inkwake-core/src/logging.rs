//! Logging macros
//!
//! With the `defmt` feature the defmt macros are used directly; otherwise the
//! `log` facade. Call sites stick to `{}`/`{:?}` placeholders so both back
//! ends accept the same format strings.

#![allow(unused_imports)]

#[cfg(feature = "defmt")]
pub(crate) use defmt::{debug, error, info, trace, warn};

#[cfg(not(feature = "defmt"))]
pub(crate) use log::{debug, error, info, trace, warn};

use error_stack::Report;
use kernel::KernelError;

use crate::error::ConvertError;

pub mod config;
pub mod database;
mod error;

pub(crate) fn env(key: &str) -> error_stack::Result<String, KernelError> {
    dotenvy::var(key)
        .convert_error()
        .map_err(|report| report.attach_printable(format!("{key} is not set")))
}

pub(crate) fn env_or<T>(key: &str, default: T) -> error_stack::Result<T, KernelError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match dotenvy::var(key) {
        Ok(raw) => raw.parse::<T>().map_err(|error| {
            Report::new(KernelError::InvalidArgument)
                .attach_printable(format!("{key}={raw} could not be parsed: {error}"))
        }),
        Err(dotenvy::Error::EnvVar(std::env::VarError::NotPresent)) => Ok(default),
        Err(error) => Err(error).convert_error(),
    }
}

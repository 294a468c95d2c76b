//! Fail-fast enforcement of registry preconditions
//!
//! Registry operations compute their precondition checks as
//! `Result<_, RegistryError>`. The `try_*` entry points hand that result to
//! the caller; the plain entry points pass it through [`enforce`], which turns
//! a violation into a panic pointing at the offending call site.

use log::error;

use super::RegistryError;

/// Prefix carried by every contract-violation panic message.
pub const VIOLATION_PREFIX: &str = "contract violation";

#[track_caller]
pub(crate) fn enforce<T>(result: Result<T, RegistryError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => violation(err),
    }
}

#[cold]
#[track_caller]
pub(crate) fn violation(err: RegistryError) -> ! {
    let location = std::panic::Location::caller();
    error!("{VIOLATION_PREFIX} at {location}: {err}");
    panic!("{VIOLATION_PREFIX}: {err}");
}

//! Logging shim: `defmt` on the keyboard, `log` on the host where tests run

#[cfg(not(target_arch = "x86_64"))]
pub use defmt::*;

#[cfg(target_arch = "x86_64")]
pub use log::*;

#[cfg(target_arch = "x86_64")]
use std::fmt;

#[cfg(target_arch = "x86_64")]
/// Wrapper to implement Display for Debug, mirrors `defmt::Debug2Format`
pub struct Debug2Format<'a, T: fmt::Debug + ?Sized>(pub &'a T);

#[cfg(target_arch = "x86_64")]
impl<T: fmt::Debug + ?Sized> fmt::Display for Debug2Format<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Route test logs to stderr, can be called from every test
#[cfg(test)]
pub fn init_test_logger() {
    let _ = lovely_env_logger::try_init_default();
}

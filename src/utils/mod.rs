pub mod commission;

#[cfg(feature = "cli")]
pub mod logging;

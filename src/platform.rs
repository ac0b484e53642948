//! Platform-specific marker traits for cross-platform compatibility.
//!
//! Some traits abstract over `Send`/`Sync` requirements that differ between
//! native platforms and WASM. The clock used for canonical-request
//! timestamps is also re-exported here so wasm32 targets get a working
//! `SystemTime`.

#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
pub use std::time::{Duration, SystemTime};

#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
pub use web_time::{Duration, SystemTime};

/// Marker trait for types that may be `Send`, depending on platform.
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
pub trait MaybeSend: Send {}
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
impl<T: Send> MaybeSend for T {}

/// Marker trait for types that may be `Send`, depending on platform.
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
pub trait MaybeSend {}
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
impl<T> MaybeSend for T {}

/// Marker trait for types that may be `Send + Sync`, depending on platform.
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
pub trait MaybeSendSync: Send + Sync {}
#[cfg(not(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none"))))]
impl<T: Send + Sync> MaybeSendSync for T {}

/// Marker trait for types that may be `Send + Sync`, depending on platform.
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
pub trait MaybeSendSync {}
#[cfg(all(target_arch = "wasm32", any(target_os = "unknown", target_os = "none")))]
impl<T> MaybeSendSync for T {}

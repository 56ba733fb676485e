#![no_std]

// Shared DCF77 decoding logic.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library. Hardware access (edge capture, the RTC bus, displays)
// lives behind the collaborator traits exposed here.

pub mod clock;
pub mod commit;
pub mod decoder;
pub mod diagnostics;
pub mod frame;
pub mod mailbox;
pub mod pulse;
#[cfg(feature = "synth")]
pub mod synth;

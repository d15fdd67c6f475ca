//! Filter Designer.
//!
//! Produces the complex bandpass/lowpass FIR tap banks each decimation
//! stage needs. Stage 1 is a bank of complex bandpass filters, one per
//! receive frequency, built by modulating a common baseband lowpass
//! prototype. Stages 2 and 3 use a single real-valued lowpass filter
//! (stored as complex with zero imaginary), folding frequency into the
//! antenna dimension so the same kernel variants serve every stage.

mod design;

pub use design::{build_lowpass_stage_filter, build_stage1_filters, build_stage_filters, ideal_filter_length};

#[cfg(test)]
mod tests;

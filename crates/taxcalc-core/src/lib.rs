//! # Taxcalc Core
//!
//! Pure calculation domain for the tax calculator service.
//!
//! This crate captures the calculation contract that the served
//! calculator page implements: given a pre-tax bill and a tax rate
//! percentage, compute the tax amount and the total. It has no I/O and
//! no state, so the contract can be tested natively without the HTTP
//! layer.
//!
//! ## Example
//!
//! ```rust
//! use taxcalc_core::calculate;
//!
//! let result = calculate(100.0, 10.0).unwrap();
//! assert_eq!(result.tax_amount, 10.0);
//! assert_eq!(result.total, 110.0);
//! ```

#![doc(html_root_url = "https://docs.rs/taxcalc-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod calc;

pub use calc::{calculate, CalcError, Calculation, CalculationInput};

//! Bill/tax calculation.
//!
//! The contract is deliberately small: `tax_amount = bill * rate / 100`
//! and `total = bill + tax_amount`. Negative inputs never produce a
//! numeric result; they yield a typed error instead. No rounding is
//! applied here — presentation-layer rounding, if any, happens in the
//! page that renders the numbers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input to a tax calculation.
///
/// # Example
///
/// ```rust
/// use taxcalc_core::CalculationInput;
///
/// let input = CalculationInput {
///     bill: 250.0,
///     tax_rate_percent: 8.25,
/// };
/// assert!(input.calculate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    /// Pre-tax amount entered by the user.
    pub bill: f64,

    /// Percentage applied to the bill to compute the tax amount.
    pub tax_rate_percent: f64,
}

impl CalculationInput {
    /// Runs the calculation for this input.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError`] if the bill or the tax rate is negative.
    pub fn calculate(&self) -> Result<Calculation, CalcError> {
        calculate(self.bill, self.tax_rate_percent)
    }
}

/// Result of a successful tax calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    /// Computed tax amount (`bill * tax_rate_percent / 100`).
    pub tax_amount: f64,

    /// Bill plus tax amount.
    pub total: f64,
}

/// The invalid marker: why an input produced no numeric result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CalcError {
    /// The bill amount was negative.
    #[error("bill amount must not be negative")]
    NegativeBill,

    /// The tax rate was negative.
    #[error("tax rate must not be negative")]
    NegativeTaxRate,
}

/// Computes the tax amount and total for a bill.
///
/// Pure function, no state. A negative `bill` or a negative
/// `tax_rate_percent` yields an error — no numeric result is produced
/// for invalid input.
///
/// # Example
///
/// ```rust
/// use taxcalc_core::calculate;
///
/// let result = calculate(1000.0, 0.0).unwrap();
/// assert_eq!(result.tax_amount, 0.0);
/// assert_eq!(result.total, 1000.0);
///
/// assert!(calculate(-1.0, 10.0).is_err());
/// ```
///
/// # Errors
///
/// Returns [`CalcError::NegativeBill`] or [`CalcError::NegativeTaxRate`]
/// for negative inputs.
pub fn calculate(bill: f64, tax_rate_percent: f64) -> Result<Calculation, CalcError> {
    if bill < 0.0 {
        return Err(CalcError::NegativeBill);
    }
    if tax_rate_percent < 0.0 {
        return Err(CalcError::NegativeTaxRate);
    }

    let tax_amount = bill * tax_rate_percent / 100.0;
    Ok(Calculation {
        tax_amount,
        total: bill + tax_amount,
    })
}

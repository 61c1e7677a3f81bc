// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Input rules shared by expenses, recurring definitions and budgets.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::AppError;

pub const MAX_AMOUNT: i64 = 1_000_000;
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Positive, at most 1,000,000, at most two fractional digits.
pub fn amount(v: Decimal) -> Result<Decimal, AppError> {
    if v <= Decimal::ZERO {
        return Err(AppError::validation("Amount must be positive"));
    }
    if v > Decimal::from(MAX_AMOUNT) {
        return Err(AppError::validation("Amount cannot exceed 1,000,000"));
    }
    if v.normalize().scale() > 2 {
        return Err(AppError::validation(
            "Amount can have at most 2 decimal places",
        ));
    }
    Ok(v)
}

/// Trims; blank becomes `None`.
pub fn description(v: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(s) = v.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if s.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(AppError::validation(
            "Description cannot exceed 200 characters",
        ));
    }
    Ok(Some(s.to_string()))
}

pub fn expense_date(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, AppError> {
    if date > today {
        return Err(AppError::validation("Date cannot be in the future"));
    }
    Ok(date)
}

pub fn alert_threshold(v: Decimal) -> Result<Decimal, AppError> {
    if v < Decimal::ZERO || v > Decimal::ONE_HUNDRED {
        return Err(AppError::validation(
            "Alert threshold must be between 0 and 100",
        ));
    }
    Ok(v)
}

pub fn date_range(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), AppError> {
    match end {
        Some(e) if e < start => Err(AppError::validation(format!(
            "End date {} is before start date {}",
            e, start
        ))),
        _ => Ok(()),
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Lowercase and collapse everything that is not alphanumeric, so that
/// "Food & Dining", "food-dining" and "FOOD_DINING" compare equal.
fn slug_key(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Food & Dining")]
    FoodDining,
    Transportation,
    Entertainment,
    #[serde(rename = "Housing/Rent")]
    HousingRent,
    Utilities,
    Shopping,
    Healthcare,
    Education,
    Travel,
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::FoodDining,
        Category::Transportation,
        Category::Entertainment,
        Category::HousingRent,
        Category::Utilities,
        Category::Shopping,
        Category::Healthcare,
        Category::Education,
        Category::Travel,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::FoodDining => "Food & Dining",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::HousingRent => "Housing/Rent",
            Category::Utilities => "Utilities",
            Category::Shopping => "Shopping",
            Category::Healthcare => "Healthcare",
            Category::Education => "Education",
            Category::Travel => "Travel",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = slug_key(s);
        Category::ALL
            .into_iter()
            .find(|c| slug_key(c.label()) == key)
            .ok_or_else(|| AppError::validation(format!("Unknown category '{}'", s.trim())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    #[serde(rename = "Digital Wallet")]
    DigitalWallet,
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::Cash,
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::BankTransfer,
        PaymentMethod::DigitalWallet,
        PaymentMethod::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::DebitCard => "Debit Card",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::DigitalWallet => "Digital Wallet",
            PaymentMethod::Other => "Other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = slug_key(s);
        PaymentMethod::ALL
            .into_iter()
            .find(|p| slug_key(p.label()) == key)
            .ok_or_else(|| AppError::validation(format!("Unknown payment method '{}'", s.trim())))
    }
}

/// How often a recurring definition comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    /// Reads a frequency back from storage. Unrecognised values schedule
    /// monthly; callers at input boundaries use `FromStr` instead, which rejects them.
    pub fn from_stored(s: &str) -> Frequency {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!(frequency = %s, "unknown stored frequency, scheduling monthly");
            Frequency::Monthly
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(AppError::validation(format!(
                "Invalid frequency '{}', expected daily|weekly|monthly|yearly",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
            BudgetPeriod::Custom => "custom",
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(BudgetPeriod::Weekly),
            "monthly" => Ok(BudgetPeriod::Monthly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            "custom" => Ok(BudgetPeriod::Custom),
            other => Err(AppError::validation(format!(
                "Invalid period '{}', expected weekly|monthly|yearly|custom",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub payment_method: String,
    pub is_recurring: bool,
    pub recurring_id: Option<i64>,
    /// Due date the scheduler created this expense for; `date` may be edited later.
    pub occurrence_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringDefinition {
    pub id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub payment_method: String,
    pub frequency: String,
    pub day_of_month: Option<i64>,
    pub day_of_week: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub next_due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category: Option<String>, // None = all categories
    pub amount: Decimal,
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub alert_threshold: Option<Decimal>, // percent
}

//! Dashboard aggregates over the order history.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::{OrderStatus, ParseEnumError};

/// Reporting window of the admin dashboard, anchored at the start of the
/// current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Today,
    Week,
    Month,
    Year,
}

impl DateRange {
    /// Lower bound of the window: today's midnight, pushed back by the
    /// range length.
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let start_of_day = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        match self {
            DateRange::Today => start_of_day,
            DateRange::Week => start_of_day - Duration::days(7),
            DateRange::Month => start_of_day
                .checked_sub_months(Months::new(1))
                .unwrap_or(start_of_day),
            DateRange::Year => start_of_day
                .checked_sub_months(Months::new(12))
                .unwrap_or(start_of_day),
        }
    }
}

impl FromStr for DateRange {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(DateRange::Today),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            "year" => Ok(DateRange::Year),
            other => Err(ParseEnumError {
                kind: "date range",
                value: other.to_string(),
            }),
        }
    }
}

/// Order and revenue aggregates for the admin dashboard. "Period" figures
/// cover the selected [`DateRange`]; totals cover the whole history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub period_orders: i64,
    pub total_revenue: Decimal,
    pub period_revenue: Decimal,
    pub status_counts: BTreeMap<OrderStatus, i64>,
    /// Top sellers of the period by quantity, at most five.
    pub popular_items: Vec<PopularItem>,
    /// Per-day order count and revenue within the period, oldest first.
    pub daily: Vec<DailyStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopularItem {
    pub name: String,
    pub count: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub orders: i64,
    pub revenue: Decimal,
}

//! Money owed or earned for a single attendance record.

use serde::{Deserialize, Serialize};

use crate::entity::attendance_record;

/// Per-minute rates, in whole currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    pub late_penalty_per_minute: i64,
    pub early_leave_penalty_per_minute: i64,
    pub overtime_bonus_per_minute: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualKind {
    LatePenalty,
    EarlyLeavePenalty,
    OvertimeBonus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualLine {
    pub kind: AccrualKind,
    pub minutes: i64,
    pub rate: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accrual {
    pub penalty_amount: i64,
    pub bonus_amount: i64,
    pub breakdown: Vec<AccrualLine>,
}

impl Accrual {
    fn push(&mut self, kind: AccrualKind, minutes: i32, rate: i64) {
        let minutes = i64::from(minutes.max(0));
        if minutes == 0 {
            return;
        }

        let amount = minutes * rate;
        match kind {
            AccrualKind::OvertimeBonus => self.bonus_amount += amount,
            AccrualKind::LatePenalty | AccrualKind::EarlyLeavePenalty => self.penalty_amount += amount,
        }

        self.breakdown.push(AccrualLine { kind, minutes, rate, amount });
    }
}

/// Converts the derived minute fields of `record` into penalties and bonuses
pub fn calculate(record: &attendance_record::Model, rates: &RateTable) -> Accrual {
    let mut accrual = Accrual::default();

    accrual.push(AccrualKind::LatePenalty, record.late_minutes, rates.late_penalty_per_minute);
    accrual.push(AccrualKind::EarlyLeavePenalty, record.early_leave_minutes, rates.early_leave_penalty_per_minute);
    accrual.push(AccrualKind::OvertimeBonus, record.overtime_minutes, rates.overtime_bonus_per_minute);

    accrual
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{attendance::tests::record_at, settings::Settings};

    use super::*;

    #[test]
    fn test_late_arrival_penalty() {
        let mut record = record_at(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        record.late_minutes = 20;

        let accrual = calculate(&record, &Settings::default().rates);

        assert_eq!(accrual.penalty_amount, 10_000);
        assert_eq!(accrual.bonus_amount, 0);
        assert_eq!(accrual.breakdown, vec![AccrualLine { kind: AccrualKind::LatePenalty, minutes: 20, rate: 500, amount: 10_000 }]);
    }

    #[test]
    fn test_overtime_bonus() {
        let mut record = record_at(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        record.overtime_minutes = 45;

        let accrual = calculate(&record, &Settings::default().rates);

        assert_eq!(accrual.penalty_amount, 0);
        assert_eq!(accrual.bonus_amount, 33_750);
    }

    #[test]
    fn test_combined_and_deterministic() {
        let mut record = record_at(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        record.late_minutes = 5;
        record.early_leave_minutes = 30;

        let rates = RateTable {
            late_penalty_per_minute: 100,
            early_leave_penalty_per_minute: 200,
            overtime_bonus_per_minute: 300,
        };
        let before = record.clone();

        let first = calculate(&record, &rates);
        let second = calculate(&record, &rates);

        assert_eq!(first, second);
        assert_eq!(first.penalty_amount, 5 * 100 + 30 * 200);
        assert_eq!(first.breakdown.len(), 2);
        assert_eq!(record, before);
    }
}

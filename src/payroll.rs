//! Monthly payroll aggregation and the payroll lifecycle (`draft -> approved -> paid`).

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{audit::{Actor, AuditEvent, AuditSink}, entity::{attendance_record, fine, payroll, payroll_history, sea_orm_active_enums::{AttendanceStatus, PayrollStatus, SubjectType}, staff}, error::{CoreError, CoreResult, StateConflict}, penalty::{self, Accrual, RateTable}, store::{Store, StoreError}, utils::Month};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAccrual {
    pub record_id: Uuid,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub accrual: Accrual,
}

/// Value object produced by [`aggregate`]; persisted by the generator or merged on recalculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayrollSummary {
    pub staff_id: Uuid,
    pub month: Month,
    pub accrual: i64,
    pub bonuses: i64,
    pub attendance_penalties: i64,
    pub fines: i64,
    pub penalties: i64,
    pub total: i64,
    pub completed_days: u64,
    pub days: Vec<DayAccrual>,
}

/// Sums base salary, attendance bonuses/penalties of completed days and approved fines in `month`
pub fn aggregate(
    member: &staff::Model,
    month: Month,
    records: &[attendance_record::Model],
    fines: &[fine::Model],
    rates: &RateTable,
) -> PayrollSummary {
    let days = records.iter()
        .filter(|r| r.subject_type == SubjectType::Staff && r.subject_id == member.id)
        .filter(|r| r.status == AttendanceStatus::Completed && month.contains(r.date))
        .map(|r| DayAccrual {
            record_id: r.id,
            date: r.date,
            accrual: penalty::calculate(r, rates),
        })
        .collect::<Vec<_>>();

    let bonuses = days.iter().map(|d| d.accrual.bonus_amount).sum::<i64>();
    let attendance_penalties = days.iter().map(|d| d.accrual.penalty_amount).sum::<i64>();

    let fines = fines.iter()
        .filter(|f| f.staff_id == member.id && f.approved && month.contains(f.date))
        .map(|f| f.amount)
        .sum::<i64>();

    let accrual = member.salary.unwrap_or_default();
    let penalties = attendance_penalties + fines;

    PayrollSummary {
        staff_id: member.id,
        month,
        accrual,
        bonuses,
        attendance_penalties,
        fines,
        penalties,
        total: accrual + bonuses - penalties,
        completed_days: days.len() as u64,
        days,
    }
}

/// Loads the month's records and fines of a staff member and aggregates them
pub async fn summarize<S: Store>(store: &S, rates: &RateTable, member: &staff::Model, month: Month) -> CoreResult<PayrollSummary> {
    let (from, to) = month.range();

    let records = store.attendance_between(SubjectType::Staff, member.id, from, to).await?;
    let fines = store.fines_between(member.id, from, to).await?;

    Ok(aggregate(member, month, &records, &fines, rates))
}

pub async fn preview<S: Store>(store: &S, rates: &RateTable, staff_id: Uuid, month: Month) -> CoreResult<PayrollSummary> {
    let member = store.find_staff(staff_id).await?.ok_or(CoreError::NotFound("staff member"))?;

    summarize(store, rates, &member, month).await
}

pub fn history_entry(payroll_id: Uuid, action: &str, amount: i64, comment: Option<String>, actor: &Actor) -> payroll_history::Model {
    payroll_history::Model {
        id: Uuid::new_v4(),
        payroll_id,
        timestamp: Local::now().fixed_offset(),
        action: action.to_owned(),
        amount,
        comment,
        actor_id: Some(actor.id),
    }
}

/// Creates the draft payroll of one staff member for `month`.
///
/// Fails with [`CoreError::DuplicatePeriod`] when the month is already covered, whether that is
/// seen up front or reported by the store's unique key.
pub async fn create<S: Store, A: AuditSink>(store: &S, audit: &A, rates: &RateTable, actor: &Actor, member: &staff::Model, month: Month) -> CoreResult<payroll::Model> {
    let duplicate = || CoreError::DuplicatePeriod { entity: "staff member", entity_id: member.id, month };

    if store.find_payroll_for(member.id, &month).await?.is_some() {
        return Err(duplicate());
    }

    let summary = summarize(store, rates, member, month).await?;

    let now = Local::now().fixed_offset();
    let payroll = payroll::Model {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        created_by: Some(actor.id),
        updated_by: Some(actor.id),
        staff_id: member.id,
        month: month.label(),
        accrual: summary.accrual,
        bonuses: summary.bonuses,
        penalties: summary.penalties,
        total: summary.total,
        status: PayrollStatus::Draft,
    };
    let entry = history_entry(payroll.id, "created", summary.total, None, actor);

    let payroll = match store.insert_payroll(payroll, entry).await {
        Ok(payroll) => payroll,
        Err(StoreError::Duplicate) => return Err(duplicate()),
        Err(err) => return Err(err.into()),
    };

    info!(payroll_id = %payroll.id, staff_id = %member.id, %month, total = payroll.total, "Payroll created");
    audit.record(
        AuditEvent::new(actor, "create", "payroll", payroll.id, format!("{} {month}", member.display_name))
            .with_changes(format!("total={}", payroll.total))
    );

    Ok(payroll)
}

pub async fn find<S: Store>(store: &S, payroll_id: Uuid) -> CoreResult<payroll::Model> {
    store.find_payroll(payroll_id).await?.ok_or(CoreError::NotFound("payroll"))
}

pub async fn history<S: Store>(store: &S, payroll_id: Uuid) -> CoreResult<Vec<payroll_history::Model>> {
    find(store, payroll_id).await?;

    let mut entries = store.payroll_history(payroll_id).await?;
    entries.sort_by_key(|e| e.timestamp);

    Ok(entries)
}

async fn transition<S: Store, A: AuditSink>(
    store: &S,
    audit: &A,
    actor: &Actor,
    payroll_id: Uuid,
    (from, to): (PayrollStatus, PayrollStatus),
    (verb, action): (&'static str, &'static str),
) -> CoreResult<payroll::Model> {
    let mut payroll = find(store, payroll_id).await?;
    if payroll.status != from {
        return Err(StateConflict::payroll(payroll.status, verb).into());
    }

    payroll.status = to;
    payroll.updated_at = Local::now().fixed_offset();
    payroll.updated_by = Some(actor.id);
    let entry = history_entry(payroll.id, action, payroll.total, None, actor);

    let payroll = match store.update_payroll(payroll, from, entry).await {
        Ok(payroll) => payroll,
        Err(StoreError::Stale) => return Err(StateConflict::payroll(from, verb).into()),
        Err(err) => return Err(err.into()),
    };

    info!(payroll_id = %payroll.id, status = ?payroll.status, "Payroll {action}");
    audit.record(
        AuditEvent::new(actor, action, "payroll", payroll.id, payroll.month.clone())
            .with_changes(format!("{from:?} -> {to:?}"))
    );

    Ok(payroll)
}

pub async fn approve<S: Store, A: AuditSink>(store: &S, audit: &A, actor: &Actor, payroll_id: Uuid) -> CoreResult<payroll::Model> {
    transition(store, audit, actor, payroll_id, (PayrollStatus::Draft, PayrollStatus::Approved), ("approve", "approved")).await
}

pub async fn mark_paid<S: Store, A: AuditSink>(store: &S, audit: &A, actor: &Actor, payroll_id: Uuid) -> CoreResult<payroll::Model> {
    transition(store, audit, actor, payroll_id, (PayrollStatus::Approved, PayrollStatus::Paid), ("pay", "paid")).await
}

/// Re-runs the aggregation for a draft payroll, e.g. after attendance corrections or new fines
pub async fn recalculate<S: Store, A: AuditSink>(store: &S, audit: &A, rates: &RateTable, actor: &Actor, payroll_id: Uuid) -> CoreResult<payroll::Model> {
    let mut payroll = find(store, payroll_id).await?;
    if payroll.status != PayrollStatus::Draft {
        return Err(StateConflict::payroll(payroll.status, "recalculate").into());
    }

    let month = payroll.month.parse::<Month>()?;
    let member = store.find_staff(payroll.staff_id).await?.ok_or(CoreError::NotFound("staff member"))?;
    let summary = summarize(store, rates, &member, month).await?;

    let previous_total = payroll.total;
    payroll.accrual = summary.accrual;
    payroll.bonuses = summary.bonuses;
    payroll.penalties = summary.penalties;
    payroll.total = summary.total;
    payroll.updated_at = Local::now().fixed_offset();
    payroll.updated_by = Some(actor.id);

    let comment = Some(format!("previous total {previous_total}"));
    let entry = history_entry(payroll.id, "recalculated", summary.total, comment, actor);

    let payroll = match store.update_payroll(payroll, PayrollStatus::Draft, entry).await {
        Ok(payroll) => payroll,
        Err(StoreError::Stale) => return Err(StateConflict::payroll(PayrollStatus::Draft, "recalculate").into()),
        Err(err) => return Err(err.into()),
    };

    info!(payroll_id = %payroll.id, previous_total, total = payroll.total, "Payroll recalculated");
    audit.record(
        AuditEvent::new(actor, "recalculate", "payroll", payroll.id, format!("{} {month}", member.display_name))
            .with_changes(format!("total {previous_total} -> {}", payroll.total))
    );

    Ok(payroll)
}

//! Monthly tuition records of children.

use chrono::Local;
use tracing::info;
use uuid::Uuid;

use crate::{audit::{Actor, AuditEvent, AuditSink}, entity::{child, child_payment, sea_orm_active_enums::ChildPaymentStatus}, error::{CoreError, CoreResult, StateConflict}, store::{Store, StoreError}, utils::Month};

/// Creates the pending payment of `child` for `month`.
///
/// The amount is carried forward from the previous month's record when there is one, so custom
/// pricing sticks; otherwise `default_amount` applies.
pub async fn create<S: Store, A: AuditSink>(store: &S, audit: &A, default_amount: i64, actor: &Actor, child: &child::Model, month: Month) -> CoreResult<child_payment::Model> {
    let duplicate = || CoreError::DuplicatePeriod { entity: "child", entity_id: child.id, month };

    if store.find_child_payment_for(child.id, &month).await?.is_some() {
        return Err(duplicate());
    }

    let previous = store.find_child_payment_for(child.id, &month.previous()).await?;
    let (amount, total, comments) = match &previous {
        Some(previous) => (previous.amount, previous.total, Some(format!("carried forward from {}", previous.month))),
        None => (default_amount, default_amount, None),
    };

    let (period_start, period_end) = month.range();
    let now = Local::now().fixed_offset();
    let payment = child_payment::Model {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        child_id: child.id,
        month: month.label(),
        period_start,
        period_end,
        amount,
        total,
        status: ChildPaymentStatus::Pending,
        comments,
    };

    let payment = match store.insert_child_payment(payment).await {
        Ok(payment) => payment,
        Err(StoreError::Duplicate) => return Err(duplicate()),
        Err(err) => return Err(err.into()),
    };

    info!(payment_id = %payment.id, child_id = %child.id, %month, amount, carried_forward = previous.is_some(), "Child payment created");
    audit.record(
        AuditEvent::new(actor, "create", "child_payment", payment.id, format!("{} {month}", child.full_name))
            .with_changes(format!("amount={amount}"))
    );

    Ok(payment)
}

pub async fn mark_paid<S: Store, A: AuditSink>(store: &S, audit: &A, actor: &Actor, payment_id: Uuid) -> CoreResult<child_payment::Model> {
    let mut payment = store.find_child_payment(payment_id).await?.ok_or(CoreError::NotFound("child payment"))?;
    if payment.status != ChildPaymentStatus::Pending {
        return Err(StateConflict::InvalidTransition { from: format!("{:?}", payment.status), action: "pay" }.into());
    }

    payment.status = ChildPaymentStatus::Paid;
    payment.updated_at = Local::now().fixed_offset();

    let payment = match store.update_child_payment(payment, ChildPaymentStatus::Pending).await {
        Ok(payment) => payment,
        Err(StoreError::Stale) => return Err(StateConflict::InvalidTransition { from: "Pending".to_owned(), action: "pay" }.into()),
        Err(err) => return Err(err.into()),
    };

    info!(payment_id = %payment.id, "Child payment marked as paid");
    audit.record(AuditEvent::new(actor, "paid", "child_payment", payment.id, payment.month.clone()));

    Ok(payment)
}

#[cfg(test)]
mod tests {
    use crate::{audit::tests::{admin, RecordingAudit}, store::memory::MemoryStore};

    use super::*;

    #[actix_web::test]
    async fn test_default_then_carry_forward() {
        let store = MemoryStore::new();
        let audit = RecordingAudit::default();
        let child = store.add_child("Alice");
        let may: Month = "2025-05".parse().unwrap();

        let first = create(&store, &audit, 35_000, &admin(), &child, may).await.unwrap();
        assert_eq!((first.amount, first.total), (35_000, 35_000));
        assert_eq!(first.comments, None);

        let err = create(&store, &audit, 35_000, &admin(), &child, may).await.unwrap_err();
        assert!(matches!(err, CoreError::DuplicatePeriod { .. }));

        let june = create(&store, &audit, 50_000, &admin(), &child, may.next()).await.unwrap();
        assert_eq!(june.amount, 35_000);
        assert_eq!(june.comments.as_deref(), Some("carried forward from 2025-05"));
        assert_eq!(june.period_start.to_string(), "2025-06-01");
        assert_eq!(june.period_end.to_string(), "2025-06-30");
    }

    #[actix_web::test]
    async fn test_mark_paid() {
        let store = MemoryStore::new();
        let audit = RecordingAudit::default();
        let child = store.add_child("Alice");

        let payment = create(&store, &audit, 35_000, &admin(), &child, "2025-06".parse().unwrap()).await.unwrap();

        let paid = mark_paid(&store, &audit, &admin(), payment.id).await.unwrap();
        assert_eq!(paid.status, ChildPaymentStatus::Paid);

        let err = mark_paid(&store, &audit, &admin(), payment.id).await.unwrap_err();
        assert!(matches!(err, CoreError::StateConflict(_)));

        let err = mark_paid(&store, &audit, &admin(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}

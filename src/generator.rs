//! Idempotent monthly batch runs.
//!
//! Each run gives every active staff member (or child) exactly one record for the month. Existing
//! records are skipped, never overwritten, so re-running after a crash or timeout is the recovery
//! path. Entities are processed concurrently and a failure on one of them is reported in the
//! result without stopping the others.

use std::future::Future;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{audit::{Actor, AuditSink}, child_payment, entity::{child, staff}, error::{CoreError, CoreResult}, payroll, settings::Settings, store::Store, utils::Month};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationFailure {
    pub entity_id: Uuid,
    pub entity_name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub month: Month,
    pub created_count: u64,
    pub skipped_count: u64,
    pub errors: Vec<GenerationFailure>,
}

enum Outcome {
    Created,
    Skipped,
}

/// A covered period found by the existence check or by the store's unique key is a skip
fn settle(result: CoreResult<()>) -> CoreResult<Outcome> {
    match result {
        Ok(()) => Ok(Outcome::Created),
        Err(CoreError::DuplicatePeriod { .. }) => Ok(Outcome::Skipped),
        Err(err) => Err(err),
    }
}

async fn run<F>(kind: &'static str, month: Month, tasks: impl IntoIterator<Item = (Uuid, String, F)>) -> GenerationReport
where
    F: Future<Output = CoreResult<Outcome>>,
{
    let (ids, futures): (Vec<_>, Vec<_>) = tasks.into_iter()
        .map(|(id, name, future)| ((id, name), future))
        .unzip();

    let mut report = GenerationReport {
        month,
        created_count: 0,
        skipped_count: 0,
        errors: Vec::new(),
    };

    for ((entity_id, entity_name), outcome) in ids.into_iter().zip(join_all(futures).await) {
        match outcome {
            Ok(Outcome::Created) => report.created_count += 1,
            Ok(Outcome::Skipped) => report.skipped_count += 1,
            Err(err) => {
                warn!(kind, %entity_id, %month, error = %err, "Generation failed for entity");
                report.errors.push(GenerationFailure { entity_id, entity_name, message: err.to_string() });
            }
        }
    }

    info!(
        kind,
        %month,
        created = report.created_count,
        skipped = report.skipped_count,
        failed = report.errors.len(),
        "Generation finished"
    );

    report
}

async fn payroll_for<S: Store, A: AuditSink>(store: &S, audit: &A, settings: &Settings, actor: &Actor, member: &staff::Model, month: Month) -> CoreResult<Outcome> {
    if store.find_payroll_for(member.id, &month).await?.is_some() {
        return Ok(Outcome::Skipped);
    }

    settle(payroll::create(store, audit, &settings.rates, actor, member, month).await.map(drop))
}

async fn child_payment_for<S: Store, A: AuditSink>(store: &S, audit: &A, settings: &Settings, actor: &Actor, child: &child::Model, month: Month) -> CoreResult<Outcome> {
    if store.find_child_payment_for(child.id, &month).await?.is_some() {
        return Ok(Outcome::Skipped);
    }

    settle(child_payment::create(store, audit, settings.child_payment_default, actor, child, month).await.map(drop))
}

/// Creates the missing draft payrolls of `month` for every active staff member
pub async fn generate_payrolls<S: Store, A: AuditSink>(store: &S, audit: &A, settings: &Settings, actor: &Actor, month: Month) -> CoreResult<GenerationReport> {
    let members = store.active_staff().await?;

    let tasks = members.iter()
        .map(|member| (member.id, member.display_name.clone(), payroll_for(store, audit, settings, actor, member, month)));

    Ok(run("payroll", month, tasks).await)
}

/// Creates the missing payments of `month` for every active child, carrying amounts forward
pub async fn generate_child_payments<S: Store, A: AuditSink>(store: &S, audit: &A, settings: &Settings, actor: &Actor, month: Month) -> CoreResult<GenerationReport> {
    let children = store.active_children().await?;

    let tasks = children.iter()
        .map(|child| (child.id, child.full_name.clone(), child_payment_for(store, audit, settings, actor, child, month)));

    Ok(run("child_payment", month, tasks).await)
}

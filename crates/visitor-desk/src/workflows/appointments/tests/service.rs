use super::common::*;
use crate::workflows::appointments::{
    AppointmentFilter, AppointmentId, AppointmentPatch, AppointmentRepository, AppointmentWorkflow,
    ApprovalStatus, DecisionDraft, LocationId,
};
use crate::workflows::memory::InMemoryAppointmentStore;
use crate::workflows::WorkflowError;
use chrono::Duration;
use std::sync::Arc;

#[test]
fn confirm_approval_assigns_location() {
    let (workflow, _) = build_workflow();
    let a1 = pending(&workflow, "Jane Smith");

    let approved = workflow
        .confirm_approval(&a1.id, Some(LocationId("LOC-3".to_string())))
        .expect("approval succeeds");

    assert_eq!(approved.approval_status, ApprovalStatus::Approved);
    assert_eq!(approved.location_id, Some(LocationId("LOC-3".to_string())));
    assert_eq!(approved.decline_comment, None);
}

#[test]
fn confirm_approval_without_location_leaves_record_pending() {
    let (workflow, store) = build_workflow();
    let record = pending(&workflow, "Jane Smith");

    for missing in [None, Some(LocationId("   ".to_string()))] {
        match workflow.confirm_approval(&record.id, missing) {
            Err(WorkflowError::Validation(_)) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    let stored = store.find(&record.id).expect("find").expect("present");
    assert_eq!(stored.approval_status, ApprovalStatus::Pending);
    assert_eq!(stored.location_id, None);
}

#[test]
fn confirm_approval_rejects_locations_outside_the_hosts_directory() {
    let (workflow, store) = build_workflow();
    let record = pending(&workflow, "Jane Smith");

    let result = workflow.confirm_approval(&record.id, Some(LocationId("LOC-99".to_string())));
    assert!(matches!(result, Err(WorkflowError::Validation(_))));

    let stored = store.find(&record.id).expect("find").expect("present");
    assert_eq!(stored.approval_status, ApprovalStatus::Pending);
}

#[test]
fn request_approval_offers_host_locations_and_cancel_is_idempotent() {
    let (workflow, store) = build_workflow();
    let record = pending(&workflow, "Jane Smith");

    let prompt = workflow.request_approval(&record.id).expect("prompt opens");
    assert_eq!(prompt.locations.len(), 3);
    assert_eq!(
        workflow.draft(&record.id).expect("draft readable"),
        Some(DecisionDraft::AwaitingLocation)
    );

    workflow.cancel_approval(&record.id).expect("cancel");
    workflow.cancel_approval(&record.id).expect("second cancel");
    assert_eq!(workflow.draft(&record.id).expect("draft readable"), None);

    let stored = store.find(&record.id).expect("find").expect("present");
    assert_eq!(stored.approval_status, ApprovalStatus::Pending);
}

#[test]
fn cancel_decline_leaves_an_open_approval_draft_alone() {
    let (workflow, _) = build_workflow();
    let record = pending(&workflow, "Jane Smith");

    workflow.request_approval(&record.id).expect("prompt opens");
    workflow.cancel_decline(&record.id).expect("cancel decline");
    assert_eq!(
        workflow.draft(&record.id).expect("draft readable"),
        Some(DecisionDraft::AwaitingLocation)
    );
}

#[test]
fn confirming_clears_any_open_draft() {
    let (workflow, _) = build_workflow();
    let record = pending(&workflow, "Jane Smith");

    workflow.request_decline(&record.id).expect("decline prompt");
    workflow
        .confirm_approval(&record.id, Some(LocationId("LOC-1".to_string())))
        .expect("approval succeeds");
    assert_eq!(workflow.draft(&record.id).expect("draft readable"), None);
}

#[test]
fn request_requires_a_pending_appointment() {
    let (workflow, _) = build_workflow();
    let record = pending(&workflow, "Jane Smith");
    workflow
        .confirm_decline(&record.id, "Host unavailable")
        .expect("decline succeeds");

    assert!(matches!(
        workflow.request_approval(&record.id),
        Err(WorkflowError::NotFound(_))
    ));
    assert!(matches!(
        workflow.request_decline(&AppointmentId("apt-missing".to_string())),
        Err(WorkflowError::NotFound(_))
    ));
}

#[test]
fn blank_decline_comment_is_rejected() {
    let (workflow, store) = build_workflow();
    let record = pending(&workflow, "Jane Smith");

    for comment in ["", "   ", "\n\t"] {
        assert!(matches!(
            workflow.confirm_decline(&record.id, comment),
            Err(WorkflowError::Validation(_))
        ));
    }

    let stored = store.find(&record.id).expect("find").expect("present");
    assert_eq!(stored.approval_status, ApprovalStatus::Pending);
    assert_eq!(stored.decline_comment, None);
}

#[test]
fn decline_stores_trimmed_comment() {
    let (workflow, _) = build_workflow();
    let record = pending(&workflow, "Jane Smith");

    let declined = workflow
        .confirm_decline(&record.id, "  Host is travelling  ")
        .expect("decline succeeds");

    assert_eq!(declined.approval_status, ApprovalStatus::Declined);
    assert_eq!(declined.decline_comment.as_deref(), Some("Host is travelling"));
    assert_eq!(declined.location_id, None);
}

#[test]
fn resolved_appointments_do_not_transition_again() {
    let (workflow, store) = build_workflow();
    let record = pending(&workflow, "Jane Smith");
    workflow
        .confirm_approval(&record.id, Some(LocationId("LOC-2".to_string())))
        .expect("approval succeeds");

    assert!(matches!(
        workflow.confirm_decline(&record.id, "Changed my mind"),
        Err(WorkflowError::Conflict(_))
    ));
    assert!(matches!(
        workflow.confirm_approval(&record.id, Some(LocationId("LOC-1".to_string()))),
        Err(WorkflowError::Conflict(_))
    ));

    let stored = store.find(&record.id).expect("find").expect("present");
    assert_eq!(stored.location_id, Some(LocationId("LOC-2".to_string())));
}

#[test]
fn concurrent_decisions_have_exactly_one_winner() {
    let (workflow, store) = build_workflow();
    let record = pending(&workflow, "Jane Smith");
    let workflow = Arc::new(workflow);

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|attempt| {
                let workflow = Arc::clone(&workflow);
                let id = record.id.clone();
                scope.spawn(move || {
                    if attempt % 2 == 0 {
                        workflow.confirm_approval(&id, Some(LocationId("LOC-1".to_string())))
                    } else {
                        workflow.confirm_decline(&id, "Room unavailable")
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .collect()
    });

    let winners = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .all(|error| matches!(error, WorkflowError::Conflict(_))));

    let stored = store.find(&record.id).expect("find").expect("present");
    assert!(stored.check_invariant().is_ok());
    assert!(stored.approval_status.is_terminal());
}

#[test]
fn search_counts_every_match_regardless_of_window() {
    let (workflow, _) = build_workflow();
    pending(&workflow, "Jane Smith");
    pending(&workflow, "Kay SMITH");
    pending(&workflow, "Alice Jones");
    let approved = pending(&workflow, "Bob Smithson");
    workflow
        .confirm_approval(&approved.id, Some(LocationId("LOC-1".to_string())))
        .expect("approval succeeds");

    let filter = AppointmentFilter {
        search: Some("smith".to_string()),
        page_size: 1,
        page: 2,
        ..AppointmentFilter::with_status(ApprovalStatus::Pending)
    };
    let page = workflow.list_by_status(&filter).expect("listing succeeds");

    assert_eq!(page.total, 2);
    assert_eq!(page.rows.len(), 1);
    assert!(page.rows.iter().all(|row| {
        row.approval_status == ApprovalStatus::Pending
            && row.requester.name.to_lowercase().contains("smith")
    }));
}

#[test]
fn date_filter_matches_calendar_day() {
    let (workflow, _) = build_workflow();
    workflow
        .create(new_appointment("Jane Smith", meeting_day(), 9))
        .expect("created");
    workflow
        .create(new_appointment("Jane Smith", meeting_day(), 16))
        .expect("created");
    workflow
        .create(new_appointment(
            "Jane Smith",
            meeting_day() + Duration::days(1),
            9,
        ))
        .expect("created");

    let filter = AppointmentFilter {
        date: Some(meeting_day()),
        ..AppointmentFilter::default()
    };
    let page = workflow.list_by_status(&filter).expect("listing succeeds");

    assert_eq!(page.total, 2);
    assert!(page.rows.iter().all(|row| row.requested_date == meeting_day()));
    assert!(page.rows[0].requested_time < page.rows[1].requested_time);
}

#[test]
fn list_rejects_invalid_windows() {
    let (workflow, _) = build_workflow();
    for (page, page_size) in [(0, 10), (1, 0), (1, 500)] {
        let filter = AppointmentFilter {
            page,
            page_size,
            ..AppointmentFilter::default()
        };
        assert!(matches!(
            workflow.list_by_status(&filter),
            Err(WorkflowError::Validation(_))
        ));
    }
}

#[test]
fn create_requires_core_fields() {
    let (workflow, _) = build_workflow();

    let mut missing_purpose = new_appointment("Jane Smith", meeting_day(), 9);
    missing_purpose.purpose = "  ".to_string();
    assert!(matches!(
        workflow.create(missing_purpose),
        Err(WorkflowError::Validation(_))
    ));

    let mut zero_duration = new_appointment("Jane Smith", meeting_day(), 9);
    zero_duration.duration_minutes = Some(0);
    assert!(matches!(
        workflow.create(zero_duration),
        Err(WorkflowError::Validation(_))
    ));

    let created = workflow
        .create(new_appointment("Jane Smith", meeting_day(), 9))
        .expect("created");
    assert_eq!(created.approval_status, ApprovalStatus::Pending);
    assert!(created.id.0.starts_with("apt-"));
}

#[test]
fn store_outages_surface_without_retry() {
    let workflow = AppointmentWorkflow::new(Arc::new(UnavailableStore), Arc::new(directory()));

    assert!(matches!(
        workflow.confirm_approval(
            &AppointmentId("apt-1".to_string()),
            Some(LocationId("LOC-1".to_string()))
        ),
        Err(WorkflowError::Store(_))
    ));
    assert!(matches!(
        workflow.list_by_status(&AppointmentFilter::default()),
        Err(WorkflowError::Store(_))
    ));
}

#[test]
fn host_without_locations_cannot_approve() {
    let store = Arc::new(InMemoryAppointmentStore::default());
    let workflow = AppointmentWorkflow::new(store, Arc::new(EmptyDirectory));
    let record = workflow
        .create(new_appointment("Jane Smith", meeting_day(), 9))
        .expect("created");

    let prompt = workflow.request_approval(&record.id).expect("prompt opens");
    assert!(prompt.locations.is_empty());
    assert!(matches!(
        workflow.confirm_approval(&record.id, Some(LocationId("LOC-1".to_string()))),
        Err(WorkflowError::Validation(_))
    ));
}

#[test]
fn every_stored_record_satisfies_the_status_invariant() {
    let (workflow, store) = build_workflow();
    let approved = pending(&workflow, "Jane Smith");
    let declined = pending(&workflow, "Kay Smith");
    pending(&workflow, "Alice Jones");

    workflow
        .confirm_approval(&approved.id, Some(LocationId("LOC-3".to_string())))
        .expect("approved");
    let _ = workflow.confirm_decline(&declined.id, " ");
    workflow
        .confirm_decline(&declined.id, "Duplicate request")
        .expect("declined");

    let filter = AppointmentFilter {
        page_size: 200,
        ..AppointmentFilter::default()
    };
    let page = store.list(&filter).expect("list");
    assert_eq!(page.total, 3);
    for record in page.rows {
        assert!(record.check_invariant().is_ok(), "{record:?}");
        assert_eq!(
            record.location_id.is_some(),
            record.approval_status == ApprovalStatus::Approved
        );
        assert_eq!(
            record.decline_comment.is_some(),
            record.approval_status == ApprovalStatus::Declined
        );
    }
}

#[test]
fn create_rejects_an_end_outside_the_calendar() {
    let (workflow, _) = build_workflow();
    let mut far_future = new_appointment("Jane Smith", chrono::NaiveDate::MAX, 23);
    far_future.duration_minutes = Some(u32::MAX);

    assert!(matches!(
        workflow.create(far_future),
        Err(WorkflowError::Validation(_))
    ));
}

#[test]
fn drafts_do_not_outlive_the_pending_state() {
    let (workflow, store) = build_workflow();
    let record = pending(&workflow, "Jane Smith");
    workflow
        .request_approval(&record.id)
        .expect("approval requested");

    store
        .update(
            &record.id,
            AppointmentPatch::decline("Double booked".to_string()),
        )
        .expect("resolved elsewhere");

    assert_eq!(workflow.draft(&record.id).expect("draft lookup"), None);
}

#[test]
fn conflicting_confirm_discards_the_stale_draft() {
    let (workflow, store) = build_workflow();
    let record = pending(&workflow, "Jane Smith");
    workflow
        .request_decline(&record.id)
        .expect("decline requested");
    store
        .update(&record.id, AppointmentPatch::approve(LocationId("LOC-2".to_string())))
        .expect("approved elsewhere");

    assert!(matches!(
        workflow.confirm_decline(&record.id, "Host unavailable"),
        Err(WorkflowError::Conflict(_))
    ));
    assert_eq!(workflow.draft(&record.id).expect("draft lookup"), None);
}

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use shared::{domain::OrganisationFields, error::ValidationError};
use tokio::sync::oneshot;

use super::*;

fn settle_counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let hook = {
        let count = Arc::clone(&count);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    };
    (count, hook)
}

async fn wait_past(delay: Duration) {
    tokio::time::sleep(delay + Duration::from_millis(10)).await;
    tokio::task::yield_now().await;
}

#[tokio::test(start_paused = true)]
async fn success_settles_back_to_idle_and_fires_hook_once() {
    let controller = SubmissionController::new();
    let (settled, hook) = settle_counter();

    let state = controller
        .submit(
            || async { Ok::<_, anyhow::Error>("Organisation successfully added.".to_string()) },
            hook,
        )
        .await
        .expect("accepted");

    assert_eq!(
        state,
        SubmissionState::Succeeded("Organisation successfully added.".into())
    );
    assert_eq!(
        controller.message().as_deref(),
        Some("Organisation successfully added.")
    );
    assert_eq!(settled.load(Ordering::SeqCst), 0);

    wait_past(DEFAULT_SETTLE_DELAY).await;

    assert_eq!(controller.state(), SubmissionState::Idle);
    assert_eq!(settled.load(Ordering::SeqCst), 1);

    wait_past(DEFAULT_SETTLE_DELAY).await;
    assert_eq!(settled.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn settle_waits_for_configured_delay() {
    let controller = SubmissionController::with_settle_delay(Duration::from_millis(1200));
    let (settled, hook) = settle_counter();

    controller
        .submit(|| async { Ok::<_, anyhow::Error>("Translation added.".to_string()) }, hook)
        .await
        .expect("accepted");

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(matches!(controller.state(), SubmissionState::Succeeded(_)));

    wait_past(Duration::from_millis(100)).await;
    assert_eq!(controller.state(), SubmissionState::Idle);
    assert_eq!(settled.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn submit_while_submitting_is_rejected_without_running_operation() {
    let controller = SubmissionController::new();
    let calls = AtomicUsize::new(0);
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let calls_ref = &calls;
    let controller_ref = &controller;

    let first = controller_ref.submit(
        move || async move {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            let _ = release_rx.await;
            Ok::<_, anyhow::Error>("saved".to_string())
        },
        || {},
    );
    let second = async move {
        tokio::task::yield_now().await;
        assert!(controller_ref.is_submitting());
        let outcome = controller_ref
            .submit(
                move || async move {
                    calls_ref.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>("saved twice".to_string())
                },
                || {},
            )
            .await;
        let _ = release_tx.send(());
        outcome
    };

    let (first, second) = tokio::join!(first, second);

    assert_eq!(first, Ok(SubmissionState::Succeeded("saved".into())));
    assert_eq!(second, Err(InvalidState::AlreadySubmitting));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn failure_is_immediate_and_retry_is_accepted() {
    let controller = SubmissionController::new();

    let state = controller
        .submit(|| async { Err::<String, _>(anyhow!("duplicate INN")) }, || {})
        .await
        .expect("accepted");
    assert_eq!(
        state,
        SubmissionState::Failed(FormError::Operation("duplicate INN".into()))
    );

    // No deferred reset on failure.
    wait_past(DEFAULT_SETTLE_DELAY).await;
    assert_eq!(
        controller.state(),
        SubmissionState::Failed(FormError::Operation("duplicate INN".into()))
    );

    let (release_tx, release_rx) = oneshot::channel::<()>();
    let controller_ref = &controller;
    let retry = controller_ref.submit(
        move || async move {
            let _ = release_rx.await;
            Ok::<_, anyhow::Error>("Organisation successfully added.".to_string())
        },
        || {},
    );
    let observe = async move {
        tokio::task::yield_now().await;
        let seen = controller_ref.state();
        let _ = release_tx.send(());
        seen
    };
    let (retried, seen) = tokio::join!(retry, observe);

    assert_eq!(seen, SubmissionState::Submitting);
    assert!(matches!(retried, Ok(SubmissionState::Succeeded(_))));
}

#[tokio::test(start_paused = true)]
async fn submit_is_rejected_until_success_settles() {
    let controller = SubmissionController::new();
    controller
        .submit(|| async { Ok::<_, anyhow::Error>("done".to_string()) }, || {})
        .await
        .expect("accepted");

    let again = controller
        .submit(|| async { Ok::<_, anyhow::Error>("again".to_string()) }, || {})
        .await;
    assert_eq!(again, Err(InvalidState::AwaitingSettle));

    wait_past(DEFAULT_SETTLE_DELAY).await;
    assert!(controller
        .submit(|| async { Ok::<_, anyhow::Error>("again".to_string()) }, || {})
        .await
        .is_ok());
}

#[tokio::test(start_paused = true)]
async fn invalid_fields_fail_without_calling_operation() {
    let controller = SubmissionController::new();
    let calls = AtomicUsize::new(0);
    let calls_ref = &calls;

    let state = controller
        .submit_validated(
            OrganisationFields::new("UZBEKENERGO LTD", ""),
            move |_fields| async move {
                calls_ref.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>("created".to_string())
            },
            || {},
        )
        .await
        .expect("accepted");

    assert_eq!(
        state,
        SubmissionState::Failed(FormError::Validation(ValidationError::MissingField(
            "partner_inn"
        )))
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let state = controller
        .submit_validated(
            OrganisationFields::new("UZBEKENERGO LTD", "123456789"),
            |fields| async move { Ok::<_, anyhow::Error>(format!("{} created", fields.partner_name)) },
            || {},
        )
        .await
        .expect("accepted");
    assert_eq!(
        state,
        SubmissionState::Succeeded("UZBEKENERGO LTD created".into())
    );
}

#[tokio::test(start_paused = true)]
async fn dispose_suppresses_pending_settle() {
    let controller = SubmissionController::new();
    let (settled, hook) = settle_counter();

    controller
        .submit(|| async { Ok::<_, anyhow::Error>("saved".to_string()) }, hook)
        .await
        .expect("accepted");
    controller.dispose();

    wait_past(DEFAULT_SETTLE_DELAY).await;

    assert_eq!(settled.load(Ordering::SeqCst), 0);
    assert_eq!(controller.state(), SubmissionState::Idle);
    assert_eq!(
        controller
            .submit(|| async { Ok::<_, anyhow::Error>("again".to_string()) }, || {})
            .await,
        Err(InvalidState::Disposed)
    );
}

#[tokio::test(start_paused = true)]
async fn dispose_mid_flight_drops_late_result() {
    let controller = SubmissionController::new();
    let (settled, hook) = settle_counter();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let controller_ref = &controller;

    let submit = controller_ref.submit(
        move || async move {
            let _ = release_rx.await;
            Ok::<_, anyhow::Error>("late".to_string())
        },
        hook,
    );
    let teardown = async move {
        tokio::task::yield_now().await;
        controller_ref.dispose();
        let _ = release_tx.send(());
    };
    let (outcome, ()) = tokio::join!(submit, teardown);

    assert_eq!(outcome, Ok(SubmissionState::Idle));
    wait_past(DEFAULT_SETTLE_DELAY).await;
    assert_eq!(settled.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn reset_cancels_settle_but_keeps_controller_usable() {
    let controller = SubmissionController::new();
    let (settled, hook) = settle_counter();

    controller
        .submit(|| async { Ok::<_, anyhow::Error>("saved".to_string()) }, hook)
        .await
        .expect("accepted");
    controller.reset();
    wait_past(DEFAULT_SETTLE_DELAY).await;
    assert_eq!(settled.load(Ordering::SeqCst), 0);

    let state = controller
        .submit(|| async { Ok::<_, anyhow::Error>("saved again".to_string()) }, || {})
        .await
        .expect("accepted");
    assert_eq!(state, SubmissionState::Succeeded("saved again".into()));
}

#[tokio::test(start_paused = true)]
async fn reset_mid_flight_keeps_second_submit_out() {
    let controller = SubmissionController::new();
    let (settled, hook) = settle_counter();
    let running = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let running_ref = &running;
    let peak_ref = &peak;
    let controller_ref = &controller;

    let first = controller_ref.submit(
        move || async move {
            let now = running_ref.fetch_add(1, Ordering::SeqCst) + 1;
            peak_ref.fetch_max(now, Ordering::SeqCst);
            let _ = release_rx.await;
            running_ref.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, anyhow::Error>("first".to_string())
        },
        hook,
    );
    let second = async move {
        tokio::task::yield_now().await;
        controller_ref.reset();
        assert!(controller_ref.is_submitting());
        let outcome = controller_ref
            .submit(
                move || async move {
                    let now = running_ref.fetch_add(1, Ordering::SeqCst) + 1;
                    peak_ref.fetch_max(now, Ordering::SeqCst);
                    running_ref.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>("second".to_string())
                },
                || {},
            )
            .await;
        let _ = release_tx.send(());
        outcome
    };

    let (first, second) = tokio::join!(first, second);

    assert_eq!(second, Err(InvalidState::AlreadySubmitting));
    assert_eq!(first, Ok(SubmissionState::Idle));
    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(controller.state(), SubmissionState::Idle);

    wait_past(DEFAULT_SETTLE_DELAY).await;
    assert_eq!(settled.load(Ordering::SeqCst), 0);

    let state = controller
        .submit(|| async { Ok::<_, anyhow::Error>("after reset".to_string()) }, || {})
        .await
        .expect("accepted");
    assert_eq!(state, SubmissionState::Succeeded("after reset".into()));
}

#[tokio::test]
async fn operation_error_keeps_context_chain() {
    let controller = SubmissionController::new();

    let state = controller
        .submit(
            || async {
                Err::<String, _>(
                    anyhow!("static access token was rejected").context("session refresh failed"),
                )
            },
            || {},
        )
        .await
        .expect("accepted");

    assert_eq!(
        state,
        SubmissionState::Failed(FormError::Operation(
            "session refresh failed: static access token was rejected".into()
        ))
    );
}

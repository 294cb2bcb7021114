//! Deactivation cascade and reactivation tests over the in-memory store.

mod common;

use common::{seed_user, test_context};
use praxis_backend::error::AppError;
use praxis_backend::models::assignment::AssignableKind;
use praxis_backend::store::UserStore;

#[tokio::test]
async fn deactivation_unassigns_and_reports_counts_per_kind() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;
    let user = seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;

    ctx.store.seed_assignments(AssignableKind::Processos, user.id, 3);
    ctx.store.seed_assignments(AssignableKind::Audiencias, user.id, 1);

    let counts = ctx.state.users.deactivate(user.id, admin.id).await.unwrap();

    assert_eq!(counts.processos, 3);
    assert_eq!(counts.audiencias, 1);
    assert_eq!(counts.pendentes, 0);
    assert_eq!(counts.expedientes_manuais, 0);
    assert_eq!(counts.contratos, 0);
    assert_eq!(counts.total(), 4);

    // No business record still references the user, and the flag flipped
    assert_eq!(ctx.store.assignments_referencing(user.id), 0);
    let user = ctx.store.find_by_id(user.id).await.unwrap().unwrap();
    assert!(!user.active);
}

#[tokio::test]
async fn other_users_assignments_are_untouched() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;
    let leaving = seed_user(&ctx, "sai@escritorio.adv.br", "senha123", false).await;
    let staying = seed_user(&ctx, "fica@escritorio.adv.br", "senha123", false).await;

    ctx.store.seed_assignments(AssignableKind::Contratos, leaving.id, 2);
    ctx.store.seed_assignments(AssignableKind::Contratos, staying.id, 5);

    let counts = ctx.state.users.deactivate(leaving.id, admin.id).await.unwrap();
    assert_eq!(counts.contratos, 2);
    assert_eq!(ctx.store.assignments_referencing(staying.id), 5);
}

#[tokio::test]
async fn second_deactivation_is_a_noop_with_zero_counts() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;
    let user = seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;
    ctx.store.seed_assignments(AssignableKind::Processos, user.id, 3);

    let first = ctx.state.users.deactivate(user.id, admin.id).await.unwrap();
    assert_eq!(first.total(), 3);

    let second = ctx.state.users.deactivate(user.id, admin.id).await.unwrap();
    assert_eq!(second.total(), 0);
    assert_eq!(second.processos, 0);
}

#[tokio::test]
async fn reactivation_flips_flag_without_restoring_assignments() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;
    let user = seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;
    ctx.store.seed_assignments(AssignableKind::Audiencias, user.id, 2);

    ctx.state.users.deactivate(user.id, admin.id).await.unwrap();
    let reactivated = ctx.state.users.reactivate(user.id, admin.id).await.unwrap();

    assert!(reactivated.active);
    // Previously unassigned records stay unassigned
    assert_eq!(ctx.store.assignments_referencing(user.id), 0);
}

#[tokio::test]
async fn deactivating_unknown_user_is_not_found() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;

    let err = ctx.state.users.deactivate(999, admin.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn self_deactivation_is_rejected() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;

    let err = ctx
        .state
        .users
        .deactivate(admin.id, admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn removing_own_super_admin_flag_is_rejected() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;

    let err = ctx
        .state
        .users
        .update(
            admin.id,
            praxis_backend::services::user_service::UpdateUser {
                is_super_admin: Some(false),
                ..Default::default()
            },
            admin.id,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn deactivation_emits_audit_record_with_counts() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;
    let user = seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;
    ctx.store.seed_assignments(AssignableKind::Processos, user.id, 3);

    ctx.state.users.deactivate(user.id, admin.id).await.unwrap();

    let records = ctx.audit.records();
    let deactivation = records
        .iter()
        .find(|r| r.action.as_str() == "USER_DEACTIVATED")
        .expect("audit record present");
    assert_eq!(deactivation.acting_user_id, Some(admin.id));
    assert_eq!(deactivation.target_user_id, Some(user.id));
    let summary = deactivation.summary.as_ref().expect("summary");
    assert_eq!(summary["processos"], 3);
}

#[tokio::test]
async fn created_user_can_log_in() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;

    let (user, generated) = ctx
        .state
        .users
        .create(
            praxis_backend::services::user_service::CreateUser {
                full_name: "Bruno Lima".into(),
                display_name: "Bruno".into(),
                email: "Bruno@Escritorio.adv.br".into(),
                password: None,
                is_super_admin: false,
            },
            admin.id,
        )
        .await
        .unwrap();

    // Email is normalized on the way in
    assert_eq!(user.email, "bruno@escritorio.adv.br");
    let password = generated.expect("password generated");

    let (logged_in, issued) = ctx
        .state
        .sessions
        .login("bruno@escritorio.adv.br", &password)
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);
    assert!(!issued.token.is_empty());
}

#[tokio::test]
async fn login_fails_for_deactivated_user() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;
    let user = seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;

    ctx.state.users.deactivate(user.id, admin.id).await.unwrap();

    let err = ctx
        .state
        .sessions
        .login("ana@escritorio.adv.br", "senha123")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthenticated(_)));
}

#[tokio::test]
async fn login_fails_with_wrong_password() {
    let ctx = test_context();
    seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;

    let err = ctx
        .state
        .sessions
        .login("ana@escritorio.adv.br", "errada")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthenticated(_)));
}

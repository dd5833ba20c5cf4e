use super::*;

#[test]
fn test_only_lock_timeout_is_retryable() {
    assert!(AppError::LockTimeout("wallet busy".into()).is_retryable());
    assert!(!AppError::NotFound("Wallet".into()).is_retryable());
    assert!(!AppError::Validation("bad amount".into()).is_retryable());
    assert!(!AppError::Database("connection reset".into()).is_retryable());
}

#[test]
fn test_client_message_hides_storage_details() {
    let err = AppError::Database("duplicate key value violates constraint wallets_pkey".into());
    assert_eq!(err.client_message(), "An error occurred");

    let err = AppError::Internal("poisoned".into());
    assert_eq!(err.client_message(), "An error occurred");
}

#[test]
fn test_client_message_not_found_names_entity_only() {
    let err = AppError::NotFound("Wallet".into());
    assert_eq!(err.client_message(), "Wallet not found");
}

#[test]
fn test_client_message_passes_validation_text() {
    let err = AppError::Validation("Amount has more than 2 decimal places".into());
    assert_eq!(err.client_message(), "Amount has more than 2 decimal places");
}

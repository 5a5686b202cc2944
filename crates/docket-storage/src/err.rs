use docket_core::errors::DocketError;

pub(crate) fn to_storage_err(message: impl Into<String>) -> DocketError {
    DocketError::DatabaseNotConfigured {
        message: message.into(),
    }
}

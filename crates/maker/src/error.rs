use {
    crate::{
        confirmation::WaitError,
        keychain::KeyError,
        signer::SignError,
        validator::{Unfillable, ValidationError},
    },
    alloy::primitives::{Address, B256, TxHash},
    model::asset_data::InvalidAddress,
    relayer::Rejection,
    std::time::Duration,
    thiserror::Error,
};

/// Everything that can stop the order flow. Each variant carries enough
/// context to decide between retrying and giving up.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddress),

    /// The relayer could not be reached or failed internally. Safe to retry.
    #[error("relayer unavailable (status {status:?}): {body}")]
    RelayerUnavailable { status: Option<u16>, body: String },

    /// The relayer refused the order. Retrying requires changing the order.
    #[error("relayer rejected order: {0}")]
    SubmissionRejected(Rejection),

    #[error("unexpected relayer response: {0}")]
    InvalidRelayerResponse(String),

    #[error("signing rejected for {address}: {reason}")]
    SigningRejected { address: Address, reason: String },

    #[error("no key available for {0}")]
    UnknownSigner(Address),

    /// Advisory: the order might become fillable after remediation.
    #[error("order {hash} is not fillable: {}", format_reasons(.reasons))]
    OrderNotFillable { hash: B256, reasons: Vec<Unfillable> },

    /// The transaction may still be mined later.
    #[error("transaction {tx} not mined within {timeout:?}")]
    ConfirmationTimeout { tx: TxHash, timeout: Duration },

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error("cancelled")]
    Cancelled,

    #[error("need a maker and a taker account, found {0}")]
    Accounts(usize),

    #[error("blockchain error: {0:#}")]
    Chain(#[from] anyhow::Error),
}

fn format_reasons(reasons: &[Unfillable]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Whether the same step can simply be attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RelayerUnavailable { .. } | Self::ConfirmationTimeout { .. } | Self::Chain(_)
        )
    }
}

impl From<relayer::Error> for Error {
    fn from(err: relayer::Error) -> Self {
        match err {
            relayer::Error::Unavailable { status, body } => Self::RelayerUnavailable { status, body },
            relayer::Error::Rejected(rejection) => Self::SubmissionRejected(rejection),
            err @ relayer::Error::InvalidResponse { .. } => {
                Self::InvalidRelayerResponse(err.to_string())
            }
        }
    }
}

impl From<KeyError> for Error {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::UnknownSigner(address) => Self::UnknownSigner(address),
            KeyError::Rejected { address, reason } => Self::SigningRejected { address, reason },
        }
    }
}

impl From<SignError> for Error {
    fn from(err: SignError) -> Self {
        match err {
            SignError::Key(err) => err.into(),
            err @ SignError::WrongSigner { expected, .. } => Self::SigningRejected {
                address: expected,
                reason: err.to_string(),
            },
        }
    }
}

impl From<WaitError> for Error {
    fn from(err: WaitError) -> Self {
        match err {
            WaitError::Timeout { tx, timeout } => Self::ConfirmationTimeout { tx, timeout },
            WaitError::Reverted(tx) => Self::Reverted(tx),
            WaitError::Cancelled(_) => Self::Cancelled,
            WaitError::Chain(err) => Self::Chain(err),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::NotFillable { hash, reasons } => {
                Self::OrderNotFillable { hash, reasons }
            }
            ValidationError::Chain(err) => Self::Chain(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, relayer::ErrorCode};

    #[test]
    fn relayer_errors_keep_their_kind() {
        let unavailable: Error = relayer::Error::Unavailable {
            status: Some(502),
            body: "bad gateway".into(),
        }
        .into();
        assert!(matches!(
            unavailable,
            Error::RelayerUnavailable {
                status: Some(502),
                ..
            }
        ));
        assert!(unavailable.is_retryable());

        let rejected: Error = relayer::Error::Rejected(Rejection::parse(
            400,
            r#"{"code":"InsufficientAllowance"}"#,
        ))
        .into();
        let Error::SubmissionRejected(rejection) = &rejected else {
            panic!("unexpected error {rejected:?}");
        };
        assert_eq!(
            rejection.code,
            Some(ErrorCode::Name("InsufficientAllowance".into()))
        );
        assert!(!rejected.is_retryable());
    }

    #[test]
    fn key_errors_map_to_signing_errors() {
        let address = Address::repeat_byte(1);
        assert!(matches!(
            Error::from(KeyError::UnknownSigner(address)),
            Error::UnknownSigner(a) if a == address
        ));
        assert!(matches!(
            Error::from(KeyError::Rejected {
                address,
                reason: "declined".into()
            }),
            Error::SigningRejected { .. }
        ));
    }

    #[test]
    fn not_fillable_lists_reasons() {
        let err = Error::OrderNotFillable {
            hash: B256::ZERO,
            reasons: vec![
                Unfillable::Expired {
                    expiration: 1,
                    now: 2,
                },
                Unfillable::InvalidSignature("wrong signer".into()),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("expired"), "{message}");
        assert!(message.contains("wrong signer"), "{message}");
    }
}

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use alloy_primitives::Address;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::InterfaceError;

/// An interaction request the user completes by scanning a QR code with their wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrRequest {
    pub request_key: String,
    pub qr_url: String,
    /// Unix timestamp after which the wallet no longer accepts the request.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// Outcome of a confirmed QR interaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrConfirmation {
    pub tx_hash: Option<String>,
}

/// Wallet that signs contract calls out of band through a QR code.
#[async_trait]
pub trait QrSigner: Send + Sync {
    /// Registers a contract execution and returns the request to render as a QR code.
    async fn request_contract_interaction(
        &self,
        to: Address,
        abi: &str,
        params: &str,
        value: &str,
    ) -> Result<QrRequest, InterfaceError>;

    /// Resolves once the user confirmed the request in their wallet.
    async fn await_confirmation(&self, request: &QrRequest) -> Result<QrConfirmation, InterfaceError>;
}

/// The modal the interface shows while a QR interaction is in progress.
pub trait SigningModal: Send + Sync {
    fn open(&self);
    fn show_request(&self, request: &QrRequest);
    fn close(&self);
}

/// A connected QR-signing wallet together with the modal used to drive it.
///
/// The confirmation wait can be bounded with a timeout and aborted with [`KlipSession::cancel`].
/// Several approvals may wait on the same session at once; each wait holds a child of the
/// session's cancellation token.
pub struct KlipSession {
    signer: Arc<dyn QrSigner>,
    modal: Arc<dyn SigningModal>,
    timeout: Option<Duration>,
    cancel_root: Mutex<CancellationToken>,
    in_flight: AtomicUsize,
}

/// Counts a confirmation wait for as long as it is alive.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl KlipSession {
    pub fn new(signer: Arc<dyn QrSigner>, modal: Arc<dyn SigningModal>) -> Self {
        Self {
            signer,
            modal,
            timeout: None,
            cancel_root: Mutex::new(CancellationToken::new()),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// True while at least one confirmation is being awaited.
    pub fn is_awaiting_confirmation(&self) -> bool {
        self.pending_confirmations() > 0
    }

    pub fn pending_confirmations(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Aborts every confirmation currently awaited. Waits started afterwards are unaffected.
    pub fn cancel(&self) -> bool {
        let mut root = self.cancel_root.lock();
        let previous = std::mem::replace(&mut *root, CancellationToken::new());
        previous.cancel();
        self.pending_confirmations() > 0
    }

    /// Opens the modal, requests the interaction and waits for its confirmation. The modal is
    /// closed once the wait is over, whatever its outcome.
    pub async fn execute_contract(
        &self,
        to: Address,
        abi: &str,
        params: &str,
        value: &str,
    ) -> Result<QrConfirmation, InterfaceError> {
        self.modal.open();
        let result = self
            .request_and_confirm(to, abi, params, value)
            .await;
        self.modal.close();
        result
    }

    async fn request_and_confirm(
        &self,
        to: Address,
        abi: &str,
        params: &str,
        value: &str,
    ) -> Result<QrConfirmation, InterfaceError> {
        let request = self
            .signer
            .request_contract_interaction(to, abi, params, value)
            .await?;
        self.modal.show_request(&request);
        debug!(request_key = %request.request_key, "Waiting for QR confirmation");

        let token = {
            let root = self.cancel_root.lock();
            root.child_token()
        };
        let result = {
            let _in_flight = InFlight::enter(&self.in_flight);
            tokio::select! {
                _ = token.cancelled() => Err(InterfaceError::Cancelled(format!(
                    "QR request {} was cancelled",
                    request.request_key
                ))),
                result = self.bounded_confirmation(&request) => result,
            }
        };

        if let Err(err) = &result {
            warn!(%err, request_key = %request.request_key, "QR interaction did not complete");
        }
        result
    }

    async fn bounded_confirmation(
        &self,
        request: &QrRequest,
    ) -> Result<QrConfirmation, InterfaceError> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.signer.await_confirmation(request))
                .await
                .map_err(|_| {
                    InterfaceError::Timeout(format!(
                        "QR request {} was not confirmed within {:?}",
                        request.request_key, timeout
                    ))
                })?,
            None => self.signer.await_confirmation(request).await,
        }
    }
}

/// How the user's wallet is connected.
pub enum WalletConnector {
    /// A browser-injected provider that signs `eth_sendTransaction` itself.
    Injected,
    WalletConnect,
    /// Klip, which signs through a scanned QR code.
    Klip(KlipSession),
}

impl WalletConnector {
    pub fn is_qr_signing(&self) -> bool {
        matches!(self, WalletConnector::Klip(_))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use tokio::sync::Notify;

    use super::*;

    /// Records the modal calls in order.
    #[derive(Default)]
    pub(crate) struct RecordingModal {
        pub(crate) events: Mutex<Vec<String>>,
    }

    impl SigningModal for RecordingModal {
        fn open(&self) {
            self.events.lock().push("open".to_string());
        }

        fn show_request(&self, request: &QrRequest) {
            self.events
                .lock()
                .push(format!("show:{}", request.request_key));
        }

        fn close(&self) {
            self.events.lock().push("close".to_string());
        }
    }

    /// QR signer whose confirmation resolves only when `confirm` is notified. With
    /// `confirm_immediately` it resolves at once.
    pub(crate) struct MockQrSigner {
        pub(crate) requests: Mutex<Vec<(Address, String, String, String)>>,
        pub(crate) confirm: Notify,
        pub(crate) confirm_immediately: bool,
        pub(crate) modal: Option<Arc<RecordingModal>>,
    }

    impl MockQrSigner {
        pub(crate) fn new(confirm_immediately: bool) -> Self {
            Self {
                requests: Mutex::new(vec![]),
                confirm: Notify::new(),
                confirm_immediately,
                modal: None,
            }
        }
    }

    #[async_trait]
    impl QrSigner for MockQrSigner {
        async fn request_contract_interaction(
            &self,
            to: Address,
            abi: &str,
            params: &str,
            value: &str,
        ) -> Result<QrRequest, InterfaceError> {
            self.requests.lock().push((
                to,
                abi.to_string(),
                params.to_string(),
                value.to_string(),
            ));
            Ok(QrRequest {
                request_key: "key-1".to_string(),
                qr_url: "https://klipwallet.com/?target=/a2a?request_key=key-1".to_string(),
                expires_at: None,
            })
        }

        async fn await_confirmation(
            &self,
            _request: &QrRequest,
        ) -> Result<QrConfirmation, InterfaceError> {
            if !self.confirm_immediately {
                self.confirm.notified().await;
            }
            if let Some(modal) = &self.modal {
                modal
                    .events
                    .lock()
                    .push("confirmed".to_string());
            }
            Ok(QrConfirmation { tx_hash: Some("0xabc".to_string()) })
        }
    }

    fn session(signer: MockQrSigner) -> (Arc<KlipSession>, Arc<RecordingModal>) {
        let modal = Arc::new(RecordingModal::default());
        let mut signer = signer;
        signer.modal = Some(modal.clone());
        (Arc::new(KlipSession::new(Arc::new(signer), modal.clone())), modal)
    }

    #[tokio::test]
    async fn test_modal_closes_after_confirmation() {
        let (session, modal) = session(MockQrSigner::new(true));

        let confirmation = session
            .execute_contract(Address::repeat_byte(1), "{}", "[]", "0")
            .await
            .unwrap();

        assert_eq!(confirmation.tx_hash.as_deref(), Some("0xabc"));
        assert_eq!(
            *modal.events.lock(),
            vec!["open", "show:key-1", "confirmed", "close"]
        );
        assert!(!session.is_awaiting_confirmation());
    }

    #[tokio::test]
    async fn test_cancel_pending_confirmation() {
        let (session, modal) = session(MockQrSigner::new(false));
        assert!(!session.cancel());

        let running = {
            let session = session.clone();
            tokio::spawn(async move {
                session
                    .execute_contract(Address::repeat_byte(1), "{}", "[]", "0")
                    .await
            })
        };
        while !session.is_awaiting_confirmation() {
            tokio::task::yield_now().await;
        }
        assert!(session.cancel());

        let result = running.await.unwrap();
        assert!(matches!(result, Err(InterfaceError::Cancelled(_))));
        assert_eq!(*modal.events.lock(), vec!["open", "show:key-1", "close"]);
    }

    #[tokio::test]
    async fn test_concurrent_confirmations_stay_cancellable() {
        let signer = Arc::new(MockQrSigner::new(false));
        let modal = Arc::new(RecordingModal::default());
        let session = Arc::new(KlipSession::new(signer.clone(), modal));

        let running: Vec<_> = (0..2)
            .map(|_| {
                let session = session.clone();
                tokio::spawn(async move {
                    session
                        .execute_contract(Address::repeat_byte(1), "{}", "[]", "0")
                        .await
                })
            })
            .collect();
        while session.pending_confirmations() < 2 {
            tokio::task::yield_now().await;
        }

        signer.confirm.notify_one();
        while session.pending_confirmations() > 1 {
            tokio::task::yield_now().await;
        }
        assert!(session.is_awaiting_confirmation());
        assert!(session.cancel());

        let mut confirmed = 0;
        let mut cancelled = 0;
        for task in running {
            match task.await.unwrap() {
                Ok(_) => confirmed += 1,
                Err(InterfaceError::Cancelled(_)) => cancelled += 1,
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
        assert_eq!((confirmed, cancelled), (1, 1));
        assert!(!session.is_awaiting_confirmation());
        assert!(!session.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_timeout() {
        let modal = Arc::new(RecordingModal::default());
        let session = KlipSession::new(Arc::new(MockQrSigner::new(false)), modal.clone())
            .with_timeout(Duration::from_secs(30));

        let result = session
            .execute_contract(Address::repeat_byte(1), "{}", "[]", "0")
            .await;

        assert!(matches!(result, Err(InterfaceError::Timeout(_))));
        assert_eq!(modal.events.lock().last().map(String::as_str), Some("close"));
    }

    #[test]
    fn test_connector_kind() {
        let modal = Arc::new(RecordingModal::default());
        let klip = WalletConnector::Klip(KlipSession::new(Arc::new(MockQrSigner::new(true)), modal));
        assert!(klip.is_qr_signing());
        assert!(!WalletConnector::Injected.is_qr_signing());
        assert!(!WalletConnector::WalletConnect.is_qr_signing());
    }
}

//! # Mock Store
//!
//! Utilities for testing store consumers (controllers, dashboard) without the
//! real [`StoreActor`](crate::framework::StoreActor).
//!
//! Use [`MockStore`] to script responses with a fluent API, or
//! [`create_mock_client`] to get a client and a raw receiver and answer the
//! requests by hand with helpers like [`expect_create`].

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use crate::framework::{Record, ResourceRequest, Response, StoreClient, StoreError, StoreRequest};
use crate::model::{Collection, InventoryDocument, RecordId};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

type Responder = Box<dyn FnOnce(StoreRequest) -> Result<(), String> + Send>;
type Route<R> = Box<dyn FnOnce(StoreRequest, Result<R, StoreError>) -> Result<(), String> + Send>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A store double that answers requests from a queue of expectations.
///
/// Requests must arrive in the order the expectations were registered. A
/// request that does not match the next expectation gets no reply (the caller
/// sees [`StoreError::ActorDropped`]) and is reported by [`MockStore::verify`].
///
/// # Example
/// ```ignore
/// let mock = MockStore::new();
/// mock.expect_list::<Category>().return_ok(vec![]);
/// mock.expect_delete::<Category>(RecordId(9)).return_err(not_found);
///
/// let client = mock.client();
/// // Use client in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct MockStore {
    client: StoreClient,
    expectations: Arc<Mutex<VecDeque<Responder>>>,
    failures: Arc<Mutex<Vec<String>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockStore {
    /// Creates a mock store with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<StoreRequest>(100);
        let expectations: Arc<Mutex<VecDeque<Responder>>> = Arc::new(Mutex::new(VecDeque::new()));
        let failures = Arc::new(Mutex::new(Vec::new()));

        let queue = expectations.clone();
        let failed = failures.clone();
        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let next = lock(&queue).pop_front();
                let outcome = match next {
                    Some(responder) => responder(request),
                    None => Err(format!("no expectation left for {request:?}")),
                };
                if let Err(failure) = outcome {
                    lock(&failed).push(failure);
                }
            }
        });

        Self {
            client: StoreClient::new(sender),
            expectations,
            failures,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> StoreClient {
        self.client.clone()
    }

    pub fn expect_list<T: Record>(&self) -> Expectation<Vec<T>> {
        self.expect(|request, response| match typed::<T>(request)? {
            ResourceRequest::List { respond_to } => reply(respond_to, response),
            other => unexpected(other),
        })
    }

    pub fn expect_get<T: Record>(&self, expected: RecordId) -> Expectation<Option<T>> {
        self.expect(move |request, response| match typed::<T>(request)? {
            ResourceRequest::Get { id, respond_to } if id == expected => reply(respond_to, response),
            other => unexpected(other),
        })
    }

    pub fn expect_create<T: Record>(&self) -> Expectation<T> {
        self.expect(|request, response| match typed::<T>(request)? {
            ResourceRequest::Create { respond_to, .. } => reply(respond_to, response),
            other => unexpected(other),
        })
    }

    pub fn expect_update<T: Record>(&self, expected: RecordId) -> Expectation<T> {
        self.expect(move |request, response| match typed::<T>(request)? {
            ResourceRequest::Update { id, respond_to, .. } if id == expected => reply(respond_to, response),
            other => unexpected(other),
        })
    }

    pub fn expect_delete<T: Record>(&self, expected: RecordId) -> Expectation<()> {
        self.expect(move |request, response| match typed::<T>(request)? {
            ResourceRequest::Delete { id, respond_to } if id == expected => reply(respond_to, response),
            other => unexpected(other),
        })
    }

    pub fn expect_labels(&self, expected: Collection) -> Expectation<Vec<(RecordId, String)>> {
        self.expect(move |request, response| match request {
            StoreRequest::Labels { collection, respond_to } if collection == expected => reply(respond_to, response),
            other => unexpected(other),
        })
    }

    pub fn expect_snapshot(&self) -> Expectation<InventoryDocument> {
        self.expect(|request, response| match request {
            StoreRequest::Snapshot { respond_to } => reply(respond_to, response),
            other => unexpected(other),
        })
    }

    fn expect<R>(
        &self,
        route: impl FnOnce(StoreRequest, Result<R, StoreError>) -> Result<(), String> + Send + 'static,
    ) -> Expectation<R> {
        Expectation {
            route: Box::new(route),
            expectations: self.expectations.clone(),
        }
    }

    /// Verifies that all expectations were met and no request was unexpected.
    pub fn verify(&self) {
        let failures = lock(&self.failures);
        if !failures.is_empty() {
            panic!("Unexpected store requests: {failures:?}");
        }
        let remaining = lock(&self.expectations).len();
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered-but-unanswered expectation; pick the response to complete it.
#[must_use = "an expectation is only queued once a response is chosen"]
pub struct Expectation<R> {
    route: Route<R>,
    expectations: Arc<Mutex<VecDeque<Responder>>>,
}

impl<R: Send + 'static> Expectation<R> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: StoreError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<R, StoreError>) {
        let route = self.route;
        lock(&self.expectations).push_back(Box::new(move |request| route(request, response)));
    }
}

fn typed<T: Record>(request: StoreRequest) -> Result<ResourceRequest<T>, String> {
    T::unwrap(request).map_err(|other| format!("expected a {} request, got {other:?}", T::COLLECTION))
}

fn reply<R>(respond_to: Response<R>, response: Result<R, StoreError>) -> Result<(), String> {
    let _ = respond_to.send(response);
    Ok(())
}

fn unexpected(request: impl Debug) -> Result<(), String> {
    Err(format!("unexpected request: {request:?}"))
}

// =============================================================================
// RAW RECEIVER HELPERS
// =============================================================================

/// Creates a store client and the receiver its requests land on.
///
/// # Testing Strategy
/// Instead of spinning up a full store, the test drives the other end of the
/// channel: it inspects each request as it arrives and answers it, which makes
/// failures and delays deterministic.
///
/// **Note**: Consider using [`MockStore`] for a more fluent API.
pub fn create_mock_client(buffer_size: usize) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request for `T`.
pub async fn expect_create<T: Record>(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(T::Fields, Response<T>)> {
    match T::unwrap(receiver.recv().await?) {
        Ok(ResourceRequest::Create { fields, respond_to }) => Some((fields, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Update request for `T`.
pub async fn expect_update<T: Record>(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(RecordId, T::Fields, Response<T>)> {
    match T::unwrap(receiver.recv().await?) {
        Ok(ResourceRequest::Update { id, fields, respond_to }) => Some((id, fields, respond_to)),
        _ => None,
    }
}

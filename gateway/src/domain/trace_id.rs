//! Correlation identifier shared by gateway logs, error bodies and backend calls.
//!
//! The trace middleware adopts a caller-supplied `trace-id` header or mints a
//! fresh UUID, then runs the handler inside [`TraceId::scope`]. Anything on
//! that task can ask for [`TraceId::current`]: the error responder echoes it,
//! and the backend client forwards it so practice-backend logs line up with
//! ours.
//!
//! The value lives in a Tokio task-local and does not follow `tokio::spawn`;
//! wrap spawned futures in [`TraceId::scope`] to keep correlation.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

/// Header used both on gateway responses and on outbound backend requests.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    pub(crate) static TRACE_ID: TraceId;
}

/// UUID naming one inbound request.
///
/// # Examples
/// ```
/// use gateway::domain::TraceId;
///
/// let id: TraceId = "6f1c2d4e-8a9b-4c3d-9e0f-1a2b3c4d5e6f".parse().expect("uuid");
/// assert_eq!(id.to_string(), "6f1c2d4e-8a9b-4c3d-9e0f-1a2b3c4d5e6f");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(pub(crate) Uuid);

impl TraceId {
    /// Mint an identifier for a request that arrived without one.
    #[must_use]
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Identifier of the request being served on this task, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Run `fut` with `trace_id` visible to [`TraceId::current`].
    ///
    /// # Examples
    /// ```
    /// use gateway::domain::TraceId;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let id: TraceId = "00000000-0000-0000-0000-000000000000".parse().expect("uuid");
    /// let seen = TraceId::scope(id, async { TraceId::current() }).await;
    /// assert_eq!(seen, Some(id));
    /// # });
    /// ```
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn nested_futures_see_the_request_id() {
        let request = TraceId::generate();
        let seen = TraceId::scope(request, async {
            let inner = async { TraceId::current() };
            inner.await
        })
        .await;
        assert_eq!(seen, Some(request));
    }

    #[tokio::test]
    async fn spawned_tasks_need_their_own_scope() {
        let request = TraceId::generate();
        let (bare, scoped) = TraceId::scope(request, async move {
            let bare = tokio::spawn(async { TraceId::current() });
            let scoped = tokio::spawn(TraceId::scope(request, async { TraceId::current() }));
            (bare.await.expect("join"), scoped.await.expect("join"))
        })
        .await;
        assert_eq!(bare, None);
        assert_eq!(scoped, Some(request));
    }

    #[tokio::test]
    async fn nothing_is_in_scope_between_requests() {
        assert!(TraceId::current().is_none());
    }

    #[rstest]
    #[case("")]
    #[case("not-a-uuid")]
    #[case("00000000-0000-0000-0000")]
    fn malformed_header_values_are_rejected(#[case] raw: &str) {
        assert!(raw.parse::<TraceId>().is_err());
    }
}

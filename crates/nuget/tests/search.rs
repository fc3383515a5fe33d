use async_trait::async_trait;
use dotport_core::{CancellationSource, CancellationToken};
use dotport_msbuild::NuGetReference;
use dotport_nuget::{
    NuGetError, NuGetVersion, PackageSearcher, PackageSource, RegistryError, RetryPolicy,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays scripted responses, then keeps answering with the last one.
struct ScriptedSource {
    name: String,
    responses: Mutex<VecDeque<Result<Vec<&'static str>, RegistryError>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(name: &str, responses: Vec<Result<Vec<&'static str>, RegistryError>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PackageSource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_versions(&self, _package_id: &str) -> Result<Vec<NuGetVersion>, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap()
        };
        response.map(|versions| {
            versions
                .into_iter()
                .map(|v| NuGetVersion::parse(v).unwrap())
                .collect()
        })
    }
}

fn transient(name: &str) -> RegistryError {
    RegistryError::Transient {
        source_name: name.to_string(),
        message: "HTTP 503".to_string(),
    }
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
    }
}

fn searcher(sources: &[Arc<ScriptedSource>], policy: RetryPolicy) -> PackageSearcher {
    PackageSearcher::new(
        sources
            .iter()
            .map(|s| s.clone() as Arc<dyn PackageSource>)
            .collect(),
        policy,
    )
}

#[tokio::test]
async fn test_transient_errors_are_retried_on_the_same_source() {
    let a = ScriptedSource::new(
        "a",
        vec![Err(transient("a")), Err(transient("a")), Ok(vec!["1.0.0", "2.0.0"])],
    );
    let b = ScriptedSource::new("b", vec![Ok(vec!["9.9.9"])]);
    let searcher = searcher(&[a.clone(), b.clone()], fast_policy(3));

    let found = searcher
        .get_versions("Foo", &CancellationToken::none())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.source, "a");
    assert_eq!(found.versions.len(), 2);
    assert_eq!(a.calls(), 3);
    assert_eq!(b.calls(), 0);
}

#[tokio::test]
async fn test_exhausted_retries_fall_through_to_next_source() {
    let a = ScriptedSource::new("a", vec![Err(transient("a"))]);
    let b = ScriptedSource::new("b", vec![Ok(vec!["3.0.0"])]);
    let searcher = searcher(&[a.clone(), b.clone()], fast_policy(3));

    let found = searcher
        .get_versions("Foo", &CancellationToken::none())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.source, "b");
    assert_eq!(a.calls(), 3);
    assert_eq!(b.calls(), 1);
}

#[tokio::test]
async fn test_non_transient_errors_are_not_retried() {
    let a = ScriptedSource::new(
        "a",
        vec![Err(RegistryError::Http {
            source_name: "a".to_string(),
            message: "HTTP 401".to_string(),
            status_code: Some(401),
        })],
    );
    let b = ScriptedSource::new(
        "b",
        vec![Err(RegistryError::NotFound {
            source_name: "b".to_string(),
            package: "Foo".to_string(),
        })],
    );
    let searcher = searcher(&[a.clone(), b.clone()], fast_policy(3));

    let found = searcher.get_versions("Foo", &CancellationToken::none()).await.unwrap();
    assert!(found.is_none());
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
}

#[tokio::test]
async fn test_newer_versions_filter_and_sort() {
    let a = ScriptedSource::new(
        "a",
        vec![Ok(vec!["5.0.0", "4.0.0", "4.2.0", "6.0.0-preview.1", "3.9.0", "4.2.0"])],
    );
    let searcher = searcher(&[a], fast_policy(1));
    let token = CancellationToken::none();

    let reference = NuGetReference::new("Foo", "4.*");
    let stable = searcher.get_newer_versions(&reference, false, &token).await.unwrap();
    let stable: Vec<String> = stable.iter().map(|v| v.to_string()).collect();
    assert_eq!(stable, vec!["4.2.0", "5.0.0"]);

    let latest = searcher.get_latest_version(&reference, true, &token).await.unwrap();
    assert_eq!(latest.map(|v| v.to_string()).as_deref(), Some("6.0.0-preview.1"));

    let unversioned = NuGetReference::new("Foo", "$(FooVersion)");
    let all = searcher.get_newer_versions(&unversioned, false, &token).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn test_cancellation_stops_search() {
    let a = ScriptedSource::new("a", vec![Ok(vec!["1.0.0"])]);
    let searcher = searcher(&[a.clone()], fast_policy(3));
    let source = CancellationSource::new();
    source.cancel();

    let result = searcher.get_versions("Foo", &source.token()).await;
    assert!(matches!(result, Err(NuGetError::Cancelled)));
    assert_eq!(a.calls(), 0);
}

#[tokio::test]
async fn test_empty_package_id_is_rejected() {
    let searcher = searcher(&[], fast_policy(1));
    let result = searcher.get_versions("", &CancellationToken::none()).await;
    assert!(matches!(result, Err(NuGetError::InvalidArgument { name: "package_id", .. })));
}

//! Command execution.
//!
//! Stores only *describe* fetches; this module runs them.  Every command is
//! executed on its own `tokio` task against an [`Upstream`], and its outcome
//! is sent back to the UI loop over an unbounded channel as a
//! [`Completion`] that the loop dispatches into the owning store.
//!
//! Nothing is cancelled or de-duplicated here.  A superseded request still
//! completes and is delivered; whether it is applied is the reducer's call.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::Upstream;
use crate::store::news::{NewsAction, NewsCommand};
use crate::store::school::{FetchSchools, SchoolAction};

/// A side effect requested by one of the stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    School(FetchSchools),
    News(NewsCommand),
}

/// Outcome of a command, addressed to the store that asked for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    School(SchoolAction),
    News(NewsAction),
}

/// Runs commands against `U` and reports back over a channel.
pub struct Effects<U> {
    upstream: Arc<U>,
    tx: mpsc::UnboundedSender<Completion>,
}

impl<U> Clone for Effects<U> {
    fn clone(&self) -> Self {
        Self {
            upstream: Arc::clone(&self.upstream),
            tx: self.tx.clone(),
        }
    }
}

/// Create a runner and the receiver the UI loop should drain every tick.
pub fn channel<U: Upstream>(upstream: Arc<U>) -> (Effects<U>, mpsc::UnboundedReceiver<Completion>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Effects { upstream, tx }, rx)
}

impl<U: Upstream> Effects<U> {
    /// Spawn one task per command.  Must be called inside a `tokio` runtime.
    pub fn run(&self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            let upstream = Arc::clone(&self.upstream);
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let completion = execute(upstream.as_ref(), command).await;
                // The receiver is gone once the UI loop has exited.
                if tx.send(completion).is_err() {
                    tracing::debug!("completion dropped after shutdown");
                }
            });
        }
    }
}

/// Execute a single command to completion.
pub async fn execute<U: Upstream>(upstream: &U, command: Command) -> Completion {
    match command {
        Command::School(FetchSchools {
            generation,
            page,
            per_page,
            query,
        }) => {
            let result = upstream.fetch_schools(page, per_page, query.as_deref()).await;
            tracing::debug!(generation, page, ok = result.is_ok(), "school fetch settled");
            Completion::School(SchoolAction::Loaded {
                generation,
                page,
                per_page,
                result,
            })
        }
        Command::News(NewsCommand::FetchSources) => {
            let result = upstream.fetch_news_sources().await;
            tracing::debug!(ok = result.is_ok(), "news catalog fetch settled");
            Completion::News(NewsAction::SourcesLoaded(result))
        }
        Command::News(NewsCommand::FetchPosts {
            source,
            category,
            sweep,
        }) => {
            let result = upstream.fetch_news(&source, &category).await;
            tracing::debug!(%source, %category, ok = result.is_ok(), "news fetch settled");
            Completion::News(NewsAction::PostsLoaded {
                source,
                category,
                sweep,
                result,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use crate::api::{
        make_school, make_source, EndpointKind, FailureKind, FetchFailure, NewsChannel, NewsPayload,
        SchoolPage, SourceCatalog,
    };

    /// Scripted upstream: records calls and answers from canned data.
    #[derive(Default)]
    struct FakeUpstream {
        calls: Mutex<Vec<String>>,
        /// Per-page artificial latency, to force out-of-order completion.
        slow_pages: Vec<u32>,
        fail_news: bool,
    }

    impl Upstream for FakeUpstream {
        async fn fetch_schools(
            &self,
            page: u32,
            per_page: u32,
            query: Option<&str>,
        ) -> Result<SchoolPage, FetchFailure> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("schools {page} {per_page} {query:?}"));
            if self.slow_pages.contains(&page) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Ok(SchoolPage {
                schools: vec![make_school(&page.to_string(), "SMA", "Bali")],
                total_data: 30,
                page,
                per_page,
            })
        }

        async fn fetch_news_sources(&self) -> Result<SourceCatalog, FetchFailure> {
            self.calls.lock().unwrap().push("catalog".into());
            Ok(SourceCatalog {
                endpoints: vec![make_source("antara", &["terbaru"])],
            })
        }

        async fn fetch_news(&self, source: &str, category: &str) -> Result<NewsPayload, FetchFailure> {
            self.calls.lock().unwrap().push(format!("news {source}/{category}"));
            if self.fail_news {
                return Err(FetchFailure::new(
                    EndpointKind::NewsPosts,
                    FailureKind::HttpStatus(404),
                    "upstream responded with HTTP 404",
                ));
            }
            Ok(NewsPayload {
                data: NewsChannel::default(),
            })
        }
    }

    #[tokio::test]
    async fn execute_wraps_school_results_with_request_identity() {
        let upstream = FakeUpstream::default();
        let completion = execute(
            &upstream,
            Command::School(FetchSchools {
                generation: 7,
                page: 2,
                per_page: 20,
                query: Some("bali".into()),
            }),
        )
        .await;

        match completion {
            Completion::School(SchoolAction::Loaded {
                generation,
                page,
                per_page,
                result,
            }) => {
                assert_eq!((generation, page, per_page), (7, 2, 20));
                assert_eq!(result.unwrap().page, 2);
            }
            other => panic!("unexpected completion {other:?}"),
        }
        assert_eq!(
            upstream.calls.lock().unwrap().as_slice(),
            ["schools 2 20 Some(\"bali\")"]
        );
    }

    #[tokio::test]
    async fn execute_carries_news_failures_as_results() {
        let upstream = FakeUpstream {
            fail_news: true,
            ..FakeUpstream::default()
        };
        let completion = execute(
            &upstream,
            Command::News(NewsCommand::FetchPosts {
                source: "antara".into(),
                category: "terbaru".into(),
                sweep: Some(3),
            }),
        )
        .await;

        match completion {
            Completion::News(NewsAction::PostsLoaded { sweep, result, .. }) => {
                assert_eq!(sweep, Some(3));
                assert_eq!(result.unwrap_err().kind, FailureKind::HttpStatus(404));
            }
            other => panic!("unexpected completion {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_delivers_every_completion_in_settle_order() {
        let upstream = Arc::new(FakeUpstream {
            slow_pages: vec![1],
            ..FakeUpstream::default()
        });
        let (effects, mut rx) = channel(Arc::clone(&upstream));

        effects.run([
            Command::School(FetchSchools { generation: 1, page: 1, per_page: 10, query: None }),
            Command::School(FetchSchools { generation: 2, page: 2, per_page: 10, query: None }),
            Command::News(NewsCommand::FetchSources),
        ]);

        let mut generations = Vec::new();
        let mut saw_catalog = false;
        for _ in 0..3 {
            match rx.recv().await.unwrap() {
                Completion::School(SchoolAction::Loaded { generation, .. }) => generations.push(generation),
                Completion::News(NewsAction::SourcesLoaded(Ok(_))) => saw_catalog = true,
                other => panic!("unexpected completion {other:?}"),
            }
        }

        assert!(saw_catalog);
        assert_eq!(generations, vec![2, 1], "the slow, older request settles last");
    }
}

//! Shared fixtures: a scripted site served through fake page sessions

use async_trait::async_trait;
use movie_harvester::crawler::{
    BatchSettings, LoadedPage, MovieExtractor, Orchestrator, PageSession, Pacing, SelectorSet,
    SessionFactory, TaskError, TaskRunner,
};
use movie_harvester::storage::JsonFileStore;
use movie_harvester::url::ContentFilter;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE: &str = "https://films.example";

pub fn movie_url(slug: &str) -> String {
    format!("{}/movie/{}", BASE, slug)
}

pub fn series_url(slug: &str) -> String {
    format!("{}/tv/{}", BASE, slug)
}

/// A well-formed content page
pub fn content_page(title: &str) -> String {
    format!(
        r#"<html><body>
             <img class="film-poster-img" src="/poster/{title}.jpg">
             <h2 class="heading-name">{title}</h2>
             <button class="btn-imdb">IMDB: 7.1</button>
             <div class="description">The story of {title}.</div>
             <div class="row-line">Released: 2001-01-01</div>
             <div class="row-line">Genre: <a href="/genre/drama">Drama</a>, <a href="/genre/war">War</a></div>
           </body></html>"#
    )
}

/// How the scripted site answers for one URL
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Serve this body
    Serve(String),

    /// Fail this many loads, then serve the body
    FlakyThenServe(usize, String),

    /// Always fail
    AlwaysFail,

    /// Never answer
    Stall,
}

/// Scripted site with session accounting
#[derive(Default)]
pub struct ScriptedSite {
    behaviors: Mutex<HashMap<String, Behavior>>,
    loads: Mutex<HashMap<String, usize>>,
    active: Arc<AtomicUsize>,
    max_active: AtomicUsize,
    opened: AtomicUsize,
    delay: Duration,
}

impl ScriptedSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every load waits `delay` before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn set(&self, url: &str, behavior: Behavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(url.to_string(), behavior);
    }

    /// Serves a normal content page for each URL
    pub fn serve_all(&self, urls: &[String]) {
        for url in urls {
            let slug = url.rsplit('/').next().unwrap_or("page");
            self.set(url, Behavior::Serve(content_page(slug)));
        }
    }

    pub fn loads_of(&self, url: &str) -> usize {
        self.loads.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.loads.lock().unwrap().values().sum()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn respond(&self, url: &str) -> Option<Result<String, TaskError>> {
        let attempt = {
            let mut loads = self.loads.lock().unwrap();
            let count = loads.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let behavior = self.behaviors.lock().unwrap().get(url).cloned();
        match behavior {
            Some(Behavior::Serve(body)) => Some(Ok(body)),
            Some(Behavior::FlakyThenServe(failures, body)) => {
                if attempt <= failures {
                    Some(Err(TaskError::Network("connection reset".to_string())))
                } else {
                    Some(Ok(body))
                }
            }
            Some(Behavior::AlwaysFail) | None => Some(Err(TaskError::HttpStatus(503))),
            Some(Behavior::Stall) => None,
        }
    }
}

/// Factory handing out sessions onto a shared `ScriptedSite`
pub struct ScriptedFactory(pub Arc<ScriptedSite>);

struct ScriptedSession {
    site: Arc<ScriptedSite>,
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.site.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn open(&self) -> Result<Box<dyn PageSession>, TaskError> {
        let site = &self.0;
        site.opened.fetch_add(1, Ordering::SeqCst);
        let now = site.active.fetch_add(1, Ordering::SeqCst) + 1;
        site.max_active.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            site: Arc::clone(site),
        }))
    }
}

#[async_trait]
impl PageSession for ScriptedSession {
    async fn load(&mut self, url: &str) -> Result<LoadedPage, TaskError> {
        if !self.site.delay.is_zero() {
            tokio::time::sleep(self.site.delay).await;
        }

        match self.site.respond(url) {
            Some(Ok(body)) => Ok(LoadedPage {
                url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                body,
            }),
            Some(Err(e)) => Err(e),
            None => {
                std::future::pending::<()>().await;
                Err(TaskError::Aborted)
            }
        }
    }
}

pub fn extractor() -> MovieExtractor {
    let filter = ContentFilter::new(&["movie".to_string(), "tv".to_string()], "tv").unwrap();
    MovieExtractor::new(&SelectorSet::default(), filter).unwrap()
}

pub fn runner(site: &Arc<ScriptedSite>, task_timeout: Duration) -> TaskRunner {
    TaskRunner::new(
        Arc::new(ScriptedFactory(Arc::clone(site))),
        Arc::new(extractor()),
        Pacing::none(),
        task_timeout,
    )
}

pub fn orchestrator(
    site: &Arc<ScriptedSite>,
    output: &Path,
    batch_size: usize,
    concurrency: usize,
) -> Orchestrator<JsonFileStore> {
    Orchestrator::new(
        runner(site, Duration::from_secs(10)),
        JsonFileStore::new(output),
        BatchSettings {
            batch_size,
            concurrency,
            retry_concurrency: concurrency.min(3),
        },
    )
}

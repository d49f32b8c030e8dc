//! A single in-flight recognition, observed as a finite event sequence.
//!
//! The sequence is zero or more `Progress` events followed by exactly one
//! terminal `Completed` or `Failed`, after which it yields `None`. Dropping
//! the job abandons it: the engine finishes on its worker and the result is
//! discarded.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::Stream;
use tracing::{debug, warn};

use crate::recognizer::{OcrBackend, OcrError, ProgressSink};
use crate::types::{NormalizedImage, RecognitionProgress, RecognizedText};

const PROGRESS_CAPACITY: usize = 64;

#[derive(Debug)]
pub enum RecognitionEvent {
    Progress(RecognitionProgress),
    Completed(RecognizedText),
    Failed(OcrError),
}

impl RecognitionEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RecognitionEvent::Progress(_))
    }
}

type Outcome = Result<String, OcrError>;

pub struct RecognitionJob {
    progress: mpsc::Receiver<RecognitionProgress>,
    outcome: Option<oneshot::Receiver<Outcome>>,
    pending: Option<RecognitionEvent>,
}

impl RecognitionJob {
    /// Start recognizing `image` on a blocking worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<R>(backend: Arc<R>, image: NormalizedImage, locale: impl Into<String>) -> Self
    where
        R: OcrBackend + ?Sized + 'static,
    {
        let locale = locale.into();
        let (sink, progress) = ProgressSink::channel(PROGRESS_CAPACITY);
        let (done_tx, outcome) = oneshot::channel();

        tokio::task::spawn_blocking(move || {
            sink.report(RecognitionProgress::Initializing);
            debug!("Recognizing {}x{} image (locale {locale})", image.width, image.height);
            let result = backend.recognize(&image, &locale, &sink);
            // Closing the progress channel before the outcome is sent keeps
            // every progress event ahead of the terminal one.
            drop(sink);
            if done_tx.send(result).is_err() {
                debug!("Recognition result discarded, job was dropped");
            }
        });

        Self { progress, outcome: Some(outcome), pending: None }
    }

    /// Next event, or `None` once the terminal event has been delivered.
    pub async fn next(&mut self) -> Option<RecognitionEvent> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }
        if let Some(p) = self.progress.recv().await {
            return Some(RecognitionEvent::Progress(p));
        }
        let outcome = self.outcome.take()?;
        Some(self.settle(outcome.await.ok()))
    }

    /// Blocking counterpart of [`next`](Self::next). Must not be called from
    /// inside an async context.
    pub fn blocking_next(&mut self) -> Option<RecognitionEvent> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }
        if let Some(p) = self.progress.blocking_recv() {
            return Some(RecognitionEvent::Progress(p));
        }
        let outcome = self.outcome.take()?;
        Some(self.settle(outcome.blocking_recv().ok()))
    }

    /// Drive the job to its end, handing each progress update to `on_progress`.
    pub async fn finish<F>(mut self, mut on_progress: F) -> Result<RecognizedText, OcrError>
    where
        F: FnMut(RecognitionProgress),
    {
        while let Some(event) = self.next().await {
            match event {
                RecognitionEvent::Progress(p) => on_progress(p),
                RecognitionEvent::Completed(text) => return Ok(text),
                RecognitionEvent::Failed(e) => return Err(e),
            }
        }
        Err(worker_lost())
    }

    /// Subscribe to the events as a stream.
    pub fn into_stream(mut self) -> impl Stream<Item = RecognitionEvent> {
        async_stream::stream! {
            while let Some(event) = self.next().await {
                yield event;
            }
        }
    }

    /// On success a `Done` progress event precedes `Completed`.
    fn settle(&mut self, outcome: Option<Outcome>) -> RecognitionEvent {
        match outcome {
            Some(Ok(text)) => {
                self.pending = Some(RecognitionEvent::Completed(RecognizedText::from(text)));
                RecognitionEvent::Progress(RecognitionProgress::Done)
            }
            Some(Err(e)) => {
                warn!("Recognition failed: {e}");
                RecognitionEvent::Failed(e)
            }
            None => RecognitionEvent::Failed(worker_lost()),
        }
    }
}

fn worker_lost() -> OcrError {
    OcrError::Engine("recognition worker stopped before reporting a result".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::MockRecognizer;
    use tokio_stream::StreamExt;

    fn blank() -> NormalizedImage {
        NormalizedImage { bytes: vec![], mime: "image/png".into(), width: 1, height: 1 }
    }

    async fn collect(mut job: RecognitionJob) -> Vec<RecognitionEvent> {
        let mut events = Vec::new();
        while let Some(e) = job.next().await {
            events.push(e);
        }
        events
    }

    fn percents(events: &[RecognitionEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                RecognitionEvent::Progress(RecognitionProgress::Recognizing(p)) => Some(*p),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn successful_job_event_order() {
        let backend = Arc::new(MockRecognizer::new("Total 10,00"));
        let events = collect(RecognitionJob::spawn(backend, blank(), "spa")).await;

        assert!(matches!(
            events.first(),
            Some(RecognitionEvent::Progress(RecognitionProgress::Initializing))
        ));
        assert_eq!(percents(&events), vec![0, 25, 50, 75, 100]);

        let n = events.len();
        assert!(matches!(events[n - 2], RecognitionEvent::Progress(RecognitionProgress::Done)));
        match &events[n - 1] {
            RecognitionEvent::Completed(text) => assert_eq!(text.as_str(), "Total 10,00"),
            other => panic!("unexpected terminal event {other:?}"),
        }
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn failed_job_ends_with_failure() {
        let backend = Arc::new(MockRecognizer::failing("engine crashed").with_steps(&[0, 40]));
        let events = collect(RecognitionJob::spawn(backend, blank(), "spa")).await;

        assert_eq!(percents(&events), vec![0, 40]);
        assert!(matches!(events.last(), Some(RecognitionEvent::Failed(OcrError::Engine(_)))));
        assert!(!events
            .iter()
            .any(|e| matches!(e, RecognitionEvent::Progress(RecognitionProgress::Done))));
    }

    #[tokio::test]
    async fn sequence_stays_finished() {
        let mut job = RecognitionJob::spawn(Arc::new(MockRecognizer::new("")), blank(), "spa");
        while job.next().await.is_some() {}
        assert!(job.next().await.is_none());
    }

    #[tokio::test]
    async fn finish_reports_progress_and_text() {
        let backend = Arc::new(MockRecognizer::new("IVA 21,00").with_steps(&[5, 95]));
        let mut seen = Vec::new();
        let text = RecognitionJob::spawn(backend, blank(), "spa")
            .finish(|p| seen.push(p))
            .await
            .unwrap();
        assert_eq!(text.as_str(), "IVA 21,00");
        assert_eq!(seen.last(), Some(&RecognitionProgress::Done));
        assert!(seen.contains(&RecognitionProgress::Recognizing(95)));
    }

    #[tokio::test]
    async fn dyn_backend_is_accepted() {
        let backend: Arc<dyn OcrBackend> = Arc::new(MockRecognizer::new("neto 3"));
        let text = RecognitionJob::spawn(backend, blank(), "spa").finish(|_| {}).await.unwrap();
        assert_eq!(text.as_str(), "neto 3");
    }

    #[tokio::test]
    async fn stream_subscription_yields_same_events() {
        let job = RecognitionJob::spawn(Arc::new(MockRecognizer::new("x")), blank(), "spa");
        let events: Vec<RecognitionEvent> = job.into_stream().collect().await;
        assert!(matches!(events.last(), Some(RecognitionEvent::Completed(_))));
    }

    #[tokio::test]
    async fn dropped_job_does_not_disturb_later_jobs() {
        let backend = Arc::new(MockRecognizer::new("total 1"));
        drop(RecognitionJob::spawn(backend.clone(), blank(), "spa"));
        let text = RecognitionJob::spawn(backend, blank(), "spa").finish(|_| {}).await.unwrap();
        assert_eq!(text.as_str(), "total 1");
    }

    #[test]
    fn blocking_iteration() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut job = {
            let _guard = rt.enter();
            RecognitionJob::spawn(Arc::new(MockRecognizer::new("base 2")), blank(), "spa")
        };
        let mut last = None;
        while let Some(e) = job.blocking_next() {
            last = Some(e);
        }
        assert!(matches!(last, Some(RecognitionEvent::Completed(ref t)) if t.as_str() == "base 2"));
    }
}

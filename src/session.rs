//! Supervision of timeline builds.
//!
//! A new script supersedes whatever build is still running. The old task is
//! aborted; its speech requests are dropped wherever they are and its
//! partial buffers never reach the new build.

use crate::error::Result;
use crate::progress::ProgressSink;
use crate::timeline::{Timeline, TimelineBuilder};
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinHandle};

pub struct BuildSession {
    builder: Arc<TimelineBuilder>,
    in_flight: Option<AbortHandle>,
}

impl BuildSession {
    pub fn new(builder: TimelineBuilder) -> Self {
        Self {
            builder: Arc::new(builder),
            in_flight: None,
        }
    }

    /// Start building `script`, aborting any build already running.
    pub fn spawn_build(
        &mut self,
        script: impl Into<String>,
        progress: Arc<dyn ProgressSink>,
    ) -> JoinHandle<Result<Timeline>> {
        self.cancel();

        let builder = Arc::clone(&self.builder);
        let script = script.into();
        let handle = tokio::spawn(async move {
            builder.build_timeline(&script, progress.as_ref()).await
        });
        self.in_flight = Some(handle.abort_handle());
        handle
    }

    /// Abort the running build, if any.
    pub fn cancel(&mut self) {
        if let Some(previous) = self.in_flight.take()
            && !previous.is_finished()
        {
            tracing::info!("superseding in-flight timeline build");
            previous.abort();
        }
    }

    pub fn is_building(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for BuildSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::StaticAssetLoader;
    use crate::audio::buffer::DecodedBuffer;
    use crate::audio::wav;
    use crate::progress::NullSink;
    use crate::script::ScriptParser;
    use crate::timeline::{MarkKind, SegmentSynthesizer};
    use crate::tts::MockSpeechSynthesizer;
    use std::time::Duration;

    const RATE: u32 = 8000;

    fn session(speech: MockSpeechSynthesizer) -> BuildSession {
        let bell = DecodedBuffer::silence_for(RATE, 0.1).unwrap();
        let loader = StaticAssetLoader::new(wav::to_wav_bytes(&bell).unwrap());
        let synth = SegmentSynthesizer::new(Arc::new(speech), Arc::new(loader), RATE);
        BuildSession::new(TimelineBuilder::new(ScriptParser::default(), synth))
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_build_supersedes_old() {
        let speech = MockSpeechSynthesizer::new(RATE)
            .with_fixed_duration(0.1)
            .with_delay(Duration::from_secs(5));
        let mut session = session(speech);

        let first = session.spawn_build("Old script.", Arc::new(NullSink));
        tokio::task::yield_now().await;
        let second = session.spawn_build("New script.", Arc::new(NullSink));

        let first = first.await;
        assert!(first.unwrap_err().is_cancelled());

        let timeline = second.await.unwrap().unwrap();
        let spoken: Vec<&MarkKind> = timeline
            .marks()
            .iter()
            .filter(|m| matches!(m.kind, MarkKind::Speech { .. }))
            .map(|m| &m.kind)
            .collect();
        assert_eq!(
            spoken,
            vec![&MarkKind::Speech {
                text: "New script.".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_finished_build_is_not_building() {
        let mut session = session(MockSpeechSynthesizer::new(RATE).with_fixed_duration(0.05));
        let handle = session.spawn_build("Hello.", Arc::new(NullSink));
        assert!(handle.await.unwrap().is_ok());
        assert!(!session.is_building());
    }
}

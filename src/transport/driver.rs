//! Periodic polling of a shared transport.

use crate::transport::controller::Transport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Transport shared between the progress loop and whoever issues commands.
///
/// Holding the lock is the transition critical section: no two transitions
/// run at once.
pub type SharedTransport = Arc<Mutex<Transport>>;

pub fn shared(transport: Transport) -> SharedTransport {
    Arc::new(Mutex::new(transport))
}

/// Tick `transport` every `interval` until the last handle to it is dropped.
pub fn spawn_progress_loop(transport: &SharedTransport, interval: Duration) -> JoinHandle<()> {
    let weak = Arc::downgrade(transport);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let Some(transport) = weak.upgrade() else {
                tracing::debug!("transport dropped, progress loop exiting");
                break;
            };
            transport.lock().await.tick();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::DecodedBuffer;
    use crate::audio::playback::{ManualClock, MockPlaybackDevice};
    use crate::progress::CollectorSink;
    use crate::timeline::{MarkKind, assemble};
    use crate::transport::state::Phase;

    fn transport(clock: &ManualClock) -> Transport {
        let buffers = vec![Arc::new(DecodedBuffer::silence_for(1000, 2.0).unwrap())];
        let timeline = assemble(&buffers, vec![MarkKind::Bell]).unwrap();
        let device = MockPlaybackDevice::new().with_clock(clock.clone());
        Transport::new(Arc::new(timeline), Box::new(device))
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_detects_natural_end() {
        let clock = ManualClock::new();
        let shared = shared(transport(&clock));
        let sink = CollectorSink::new();
        shared.lock().await.on_progress(Arc::new(sink.clone()));
        shared.lock().await.play().unwrap();
        let handle = spawn_progress_loop(&shared, Duration::from_millis(100));

        clock.advance(1.0);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(shared.lock().await.phase(), Phase::Playing);

        clock.advance(1.0);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(shared.lock().await.phase(), Phase::Stopped);
        assert_eq!(sink.last(), Some((100.0, "Finished".to_string())));

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_exits_when_transport_dropped() {
        let clock = ManualClock::new();
        let shared = shared(transport(&clock));
        let handle = spawn_progress_loop(&shared, Duration::from_millis(100));

        drop(shared);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should exit")
            .unwrap();
    }
}

//! Quiet-period debouncing for values that change faster than they should be
//! acted on, such as search text typed into a filter box.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

/// Clock-agnostic debounce state. The caller supplies the current instant,
/// which keeps the timing rules testable without a runtime.
#[derive(Debug)]
pub struct DebounceTimer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> DebounceTimer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending value and restarts the quiet period at `now`.
    pub fn observe(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the pending value once its quiet period has fully elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.deadline().is_some_and(|deadline| deadline <= now) {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    /// Drops the pending value; it will never be emitted.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[derive(Debug)]
enum Command<T> {
    Observe(T),
    Cancel,
}

/// Input side of a running debouncer. Dropping every handle tears the
/// debouncer down and discards whatever was still waiting.
#[derive(Debug)]
pub struct DebounceHandle<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
}

impl<T> Clone for DebounceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> DebounceHandle<T> {
    /// Returns `false` once the debouncer has shut down.
    pub fn observe(&self, value: T) -> bool {
        self.tx.send(Command::Observe(value)).is_ok()
    }

    /// Suppresses the pending emission, if any.
    pub fn cancel(&self) {
        let _ = self.tx.send(Command::Cancel);
    }
}

/// Output side: settled values in the order they settled.
#[derive(Debug)]
pub struct Settled<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Settled<T> {
    /// `None` after the debouncer shut down.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

/// Spawns a debouncer on the current tokio runtime.
pub fn spawn<T: Send + 'static>(delay: Duration) -> (DebounceHandle<T>, Settled<T>) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    tokio::spawn(run(DebounceTimer::new(delay), cmd_rx, out_tx));
    (DebounceHandle { tx: cmd_tx }, Settled { rx: out_rx })
}

async fn run<T>(
    mut timer: DebounceTimer<T>,
    mut commands: mpsc::UnboundedReceiver<Command<T>>,
    out: mpsc::UnboundedSender<T>,
) {
    loop {
        let command = match timer.deadline() {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    command = commands.recv() => command,
                    () = sleep_until(deadline) => {
                        if let Some(value) = timer.poll(Instant::now()) {
                            trace!("debounced value settled");
                            if out.send(value).is_err() {
                                break;
                            }
                        }
                        continue;
                    }
                }
            }
            None => commands.recv().await,
        };

        match command {
            Some(Command::Observe(value)) => timer.observe(value, Instant::now()),
            Some(Command::Cancel) => timer.cancel(),
            None => {
                if timer.is_pending() {
                    trace!("debouncer torn down with a pending value; dropping it");
                }
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn emits_once_after_the_last_change_settles() {
        let t0 = Instant::now();
        let inputs = [(0, "a"), (100, "ab"), (600, "abc")];
        let mut timer = DebounceTimer::new(DELAY);
        let mut emitted = Vec::new();

        for tick in 0..=2_000u64 {
            let now = t0 + ms(tick);
            for (at, value) in inputs {
                if at == tick {
                    timer.observe(value, now);
                }
            }
            if let Some(value) = timer.poll(now) {
                emitted.push((tick, value));
            }
        }

        assert_eq!(emitted, vec![(1_100, "abc")]);
    }

    #[test]
    fn cancel_discards_the_pending_value() {
        let t0 = Instant::now();
        let mut timer = DebounceTimer::new(DELAY);
        timer.observe(1, t0);
        timer.cancel();
        assert_eq!(timer.poll(t0 + ms(10_000)), None);
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_debouncer_restarts_on_change() {
        let (handle, mut settled) = spawn::<String>(DELAY);
        let start = Instant::now();

        handle.observe("a".into());
        tokio::time::sleep(ms(100)).await;
        handle.observe("ab".into());
        tokio::time::sleep(ms(450)).await;
        handle.observe("abc".into());

        let value = settled.recv().await.expect("one settled value");
        assert_eq!(value, "abc");
        assert_eq!(start.elapsed(), ms(1_050));

        drop(handle);
        assert_eq!(settled.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_suppresses_pending_emission() {
        let (handle, mut settled) = spawn::<u32>(DELAY);
        handle.observe(7);
        tokio::time::sleep(ms(200)).await;
        drop(handle);

        assert_eq!(settled.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_cancel_keeps_the_debouncer_usable() {
        let (handle, mut settled) = spawn::<u32>(DELAY);
        handle.observe(1);
        tokio::time::sleep(ms(200)).await;
        handle.cancel();
        tokio::time::sleep(ms(1_000)).await;

        handle.observe(2);
        assert_eq!(settled.recv().await, Some(2));
    }
}

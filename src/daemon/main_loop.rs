//! Daemon event loop
//!
//! Sleeps in `poll(2)` on the event source's descriptor, waking at least every
//! [`POLL_TIMEOUT_MS`] so finished children are reaped and a pending shutdown
//! is noticed even when no input arrives.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::dispatcher::DispatchEngine;
use super::spawn::CommandSpawner;
use crate::constants::event_loop::POLL_TIMEOUT_MS;
use crate::input::backend::{EventSource, KeyGrabber};

/// Flag set by SIGINT or SIGTERM
pub fn shutdown_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&flag))
            .with_context(|| format!("Failed to install handler for signal {}", signal))?;
    }
    Ok(flag)
}

/// Dispatch events until `shutdown` is set, then release all grabs
pub fn run<E, G, S>(
    source: &E,
    engine: &mut DispatchEngine<G, S>,
    shutdown: &AtomicBool,
) -> Result<()>
where
    E: EventSource,
    G: KeyGrabber,
    S: CommandSpawner,
{
    info!("Entering event loop");

    while !shutdown.load(Ordering::Relaxed) {
        wait_readable(source.raw_fd())?;

        // Drain unconditionally: replies read earlier may have queued events
        while let Some(event) = source.next_event()? {
            debug!(event = ?event, "Input event");
            engine.handle_event(event)?;
        }

        engine.reap();
    }

    info!("Shutdown requested, releasing key grabs");
    engine.release()
}

/// Block until `fd` is readable or the timeout expires
#[allow(unsafe_code)] // Required for libc::poll() system call
fn wait_readable(fd: std::os::unix::io::RawFd) -> Result<()> {
    let mut poll_fds = [libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    }];

    // SAFETY: `poll_fds` is a valid pointer to a stack-allocated array of `pollfd`.
    // The array length is 1, which matches the second argument.
    let poll_result = unsafe { libc::poll(poll_fds.as_mut_ptr(), 1, POLL_TIMEOUT_MS) };

    if poll_result < 0 {
        let err = io::Error::last_os_error();
        // A signal arrived; the caller re-checks the shutdown flag
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(());
        }
        return Err(err).context("poll() failed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{loader, parser};
    use crate::input::backend::InputEvent;
    use crate::testing::{FakeLayout, GrabCall, RecordingGrabber, RecordingSpawner};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::os::unix::io::AsRawFd;
    use std::os::unix::net::UnixStream;

    /// Replays queued events, then requests shutdown once drained
    struct ScriptedSource<'a> {
        socket: UnixStream,
        events: RefCell<VecDeque<InputEvent>>,
        shutdown: &'a AtomicBool,
    }

    impl EventSource for ScriptedSource<'_> {
        fn raw_fd(&self) -> std::os::unix::io::RawFd {
            self.socket.as_raw_fd()
        }

        fn next_event(&self) -> Result<Option<InputEvent>> {
            let event = self.events.borrow_mut().pop_front();
            if event.is_none() {
                self.shutdown.store(true, Ordering::Relaxed);
            }
            Ok(event)
        }
    }

    #[test]
    fn test_loop_dispatches_then_releases() {
        let layout = FakeLayout::new().key(38, &[&[0x61, 0x41]]);
        let parsed = parser::parse("m { ctrl+a { one }\n mod4+a { two } }").unwrap();
        let (modes, _) = loader::load(&parsed, &layout);
        let mut engine =
            DispatchEngine::new(modes, RecordingGrabber::default(), RecordingSpawner::default());

        let (socket, _peer) = UnixStream::pair().unwrap();
        let shutdown = AtomicBool::new(false);
        let source = ScriptedSource {
            socket,
            events: RefCell::new(VecDeque::from([
                InputEvent::KeyPress {
                    keycode: 38,
                    state: 0x04,
                },
                InputEvent::MappingChanged,
                InputEvent::KeyPress {
                    keycode: 38,
                    state: 0x40,
                },
            ])),
            shutdown: &shutdown,
        };

        run(&source, &mut engine, &shutdown).unwrap();

        assert_eq!(engine.spawner().spawned, vec!["one", "two"]);
        assert_eq!(engine.spawner().reaps, 1);
        assert_eq!(
            engine.grabber().calls,
            vec![GrabCall::UngrabAll, GrabCall::Flush]
        );
    }

    #[test]
    fn test_loop_exits_immediately_when_flag_set() {
        let mut engine = DispatchEngine::new(
            Default::default(),
            RecordingGrabber::default(),
            RecordingSpawner::default(),
        );
        let (socket, _peer) = UnixStream::pair().unwrap();
        let shutdown = AtomicBool::new(true);
        let source = ScriptedSource {
            socket,
            events: RefCell::new(VecDeque::new()),
            shutdown: &shutdown,
        };

        run(&source, &mut engine, &shutdown).unwrap();
        assert_eq!(engine.spawner().reaps, 0);
        assert_eq!(engine.grabber().calls.len(), 2);
    }
}

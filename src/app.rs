// src/app.rs - Cooperative main loop and shutdown handling
use std::io::{self, Write};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Notify;

use crate::config::ConfigError;
use crate::control::ControlLoop;
use crate::hardware::{AnalogInput, HardwareError, HeaterOutput};
use crate::input::{Dispatch, InputDispatcher};
use crate::render::{RenderEngine, RenderState};
use crate::terminal::Console;
use crate::timer::TimerSubsystem;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Terminal error: {0}")]
    Terminal(#[from] io::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}

#[derive(Debug, Default)]
struct ShutdownInner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cancellation flag shared between the loop and the signal listener.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    inner: Arc<ShutdownInner>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Cancel `token` on SIGINT or SIGTERM.
pub fn listen_for_signals(token: ShutdownToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Cannot listen for SIGTERM: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => tracing::info!("Interrupt received"),
                Err(e) => {
                    tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                    return;
                }
            },
            _ = terminate => tracing::info!("Termination signal received"),
        }
        token.cancel();
    })
}

/// The controller: one loop driving sensing, control, timer, screen and keyboard in turn.
pub struct App<A, H, C, W>
where
    A: AnalogInput,
    H: HeaterOutput,
    C: Console,
    W: Write,
{
    control: ControlLoop<A, H>,
    timer: TimerSubsystem,
    render: RenderEngine<W>,
    console: C,
    input: InputDispatcher,
    shutdown: ShutdownToken,
    interval: Duration,
}

impl<A, H, C, W> App<A, H, C, W>
where
    A: AnalogInput,
    H: HeaterOutput,
    C: Console,
    W: Write,
{
    pub fn new(
        control: ControlLoop<A, H>,
        render: RenderEngine<W>,
        console: C,
        shutdown: ShutdownToken,
        interval: Duration,
    ) -> Self {
        Self {
            control,
            timer: TimerSubsystem::new(),
            render,
            console,
            input: InputDispatcher::new(),
            shutdown,
            interval,
        }
    }

    pub fn control(&self) -> &ControlLoop<A, H> {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut ControlLoop<A, H> {
        &mut self.control
    }

    pub fn timer(&self) -> &TimerSubsystem {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut TimerSubsystem {
        &mut self.timer
    }

    pub fn render(&self) -> &RenderEngine<W> {
        &self.render
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn shutdown_token(&self) -> &ShutdownToken {
        &self.shutdown
    }

    /// Run until quit or cancellation. The heater is commanded off on every way out.
    pub async fn run(&mut self) -> Result<(), AppError> {
        tracing::info!(
            "Controller running, setpoint {:.1}°C, interval {:?}",
            self.control.state().desired,
            self.interval
        );
        let result = self.run_loop().await;
        if let Err(e) = &result {
            tracing::error!("Controller stopped on error: {}", e);
        }
        self.control.shutdown();
        result
    }

    async fn run_loop(&mut self) -> Result<(), AppError> {
        while !self.shutdown.is_cancelled() {
            if self.step(Instant::now()).await?.is_break() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {}
            }
        }
        Ok(())
    }

    /// One iteration: sensor and control, timer, screen, then pending keys.
    pub async fn step(&mut self, now: Instant) -> Result<ControlFlow<()>, AppError> {
        self.control.tick(now).await;
        self.timer.update(now);

        let state = RenderState::capture(self.control.state(), &self.timer);
        self.render.render(&state)?;

        self.poll_input()
    }

    fn poll_input(&mut self) -> Result<ControlFlow<()>, AppError> {
        while let Some(event) = self.console.poll_event()? {
            // Taken per event: a prompt may have blocked for a while
            let now = Instant::now();
            let dispatch = self.input.dispatch(
                event,
                &mut self.console,
                &mut self.control,
                &mut self.timer,
                now,
            )?;
            match dispatch {
                Dispatch::Ignored => {}
                Dispatch::Quit => {
                    tracing::info!("Quit requested");
                    return Ok(ControlFlow::Break(()));
                }
                Dispatch::Interrupt => {
                    tracing::info!("Interrupted from keyboard");
                    self.shutdown.cancel();
                    return Ok(ControlFlow::Break(()));
                }
                Dispatch::Redraw => {
                    // The prompt is still on screen; repaint now rather than after the sleep
                    let geometry = self.console.geometry()?;
                    self.render.resize(geometry);
                    let state = RenderState::capture(self.control.state(), &self.timer);
                    self.render.render(&state)?;
                }
                Dispatch::Resize(geometry) => self.render.resize(geometry),
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_wakes_waiter() {
        let token = ShutdownToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        tokio::task::yield_now().await;
        token.cancel();
        handle.await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_returns_when_already_cancelled() {
        let token = ShutdownToken::new();
        token.cancel();
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .unwrap();
    }
}

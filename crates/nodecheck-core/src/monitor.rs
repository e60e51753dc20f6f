//! Sensor reconnection monitor
//!
//! Keeps a two-state view of the sensor link and tries to bring a dropped
//! sensor back without flooding the console.
//!
//! A detached MPU6050 does not announce itself; on these boards it simply
//! reads back as all zeros. The monitor therefore treats an all-zero reading
//! (or a bus error, which is what produces those zeros) as a lost link. A
//! sensor that genuinely measures zero on all six axes is reported as lost
//! too.
//!
//! ```text
//!            all-zero reading
//!  Connected ────────────────▶ Lost ──┐ all-zero: reinitialize, wait, retry
//!      ▲                        │ ◀───┘
//!      └────────────────────────┘
//!   reinitialize ok, or any non-zero reading
//! ```

use embedded_hal_async::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::ImuNodeConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::StartupError;
use crate::sensors::{ImuSensor, MotionReading};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Lost,
}

/// What one [`ReconnectMonitor::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// A valid reading was printed.
    Reading(MotionReading),
    /// The reading was all zero; a reconnection was attempted.
    Lost {
        /// This poll is the one that noticed the loss.
        first_detection: bool,
        /// The reconnection attempt succeeded.
        reconnected: bool,
    },
}

pub struct ReconnectMonitor<S> {
    sensor: S,
    config: ImuNodeConfig,
    state: LinkState,
}

impl<S: ImuSensor> ReconnectMonitor<S> {
    /// Boot the sensor once.
    ///
    /// A sensor that does not answer here is fatal: the error is returned
    /// and nothing retries it.
    pub async fn start<D, K>(
        mut sensor: S,
        config: ImuNodeConfig,
        delay: &mut D,
        sink: &mut K,
    ) -> Result<Self, StartupError>
    where
        D: DelayNs,
        K: DiagnosticSink,
    {
        delay.delay_ms(config.console_settle_ms).await;
        sink.emit(Diagnostic::ImuBanner);
        sink.emit(Diagnostic::Initializing);

        if let Err(e) = sensor.initialize().await {
            sink.emit(Diagnostic::ImuNotFound);
            return Err(StartupError::SensorNotFound(e));
        }

        sink.emit(Diagnostic::ImuFound);
        sink.emit(Diagnostic::BlankLine);

        if let Err(e) = sensor.configure(&config.settings).await {
            warn!("Sensor settings not applied: {}", e);
        }

        sink.emit(Diagnostic::ReadingStarted);
        delay.delay_ms(config.post_init_ms).await;

        Ok(Self {
            sensor,
            config,
            state: LinkState::Connected,
        })
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn connection_lost(&self) -> bool {
        self.state == LinkState::Lost
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn into_sensor(self) -> S {
        self.sensor
    }

    /// One loop iteration: read, classify, print or reconnect, then wait.
    ///
    /// Exactly one fixed delay is taken per call.
    pub async fn poll<D, K>(&mut self, delay: &mut D, sink: &mut K) -> PollOutcome
    where
        D: DelayNs,
        K: DiagnosticSink,
    {
        let reading = match self.sensor.read().await {
            Ok(reading) => reading,
            Err(e) => {
                debug!("Read failed, treating as zero sample: {}", e);
                MotionReading::ZERO
            }
        };

        if !reading.is_all_zero() {
            self.state = LinkState::Connected;
            sink.emit(Diagnostic::Reading(reading));
            delay.delay_ms(self.config.poll_interval_ms).await;
            return PollOutcome::Reading(reading);
        }

        let first_detection = self.state == LinkState::Connected;
        if first_detection {
            self.state = LinkState::Lost;
            sink.emit(Diagnostic::Reading(MotionReading::ZERO));
            sink.emit(Diagnostic::ConnectionLost);
        }

        let reconnected = self.try_reconnect(sink).await;
        delay.delay_ms(self.config.retry_delay_ms).await;

        PollOutcome::Lost {
            first_detection,
            reconnected,
        }
    }

    async fn try_reconnect<K: DiagnosticSink>(&mut self, sink: &mut K) -> bool {
        match self.sensor.initialize().await {
            Ok(()) => {
                sink.emit(Diagnostic::Reconnected);
                if let Err(e) = self.sensor.configure(&self.config.settings).await {
                    warn!("Sensor settings not re-applied: {}", e);
                }
                self.state = LinkState::Connected;
                true
            }
            Err(e) => {
                debug!("Reconnect attempt failed: {}", e);
                false
            }
        }
    }

    /// Poll forever.
    pub async fn run<D, K>(&mut self, delay: &mut D, sink: &mut K) -> !
    where
        D: DelayNs,
        K: DiagnosticSink,
    {
        info!("Monitoring sensor link");
        loop {
            self.poll(delay, sink).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImuSettings;
    use crate::sensors::{Axes, SensorError};
    use crate::test_support::{RecordingDelay, RecordingSink};
    use embassy_futures::block_on;
    use std::collections::VecDeque;
    use std::vec::Vec;

    const BUS_FAULT: SensorError = SensorError::Bus {
        sensor: "scripted",
        operation: "read",
    };

    /// Sensor that replays scripted readings and init results.
    #[derive(Default)]
    struct ScriptedImu {
        readings: VecDeque<Result<MotionReading, SensorError>>,
        init_results: VecDeque<bool>,
        init_calls: usize,
        configured: Vec<ImuSettings>,
    }

    impl ScriptedImu {
        fn new(init_results: &[bool], readings: &[MotionReading]) -> Self {
            Self {
                readings: readings.iter().copied().map(Ok).collect(),
                init_results: init_results.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    impl ImuSensor for ScriptedImu {
        async fn initialize(&mut self) -> Result<(), SensorError> {
            self.init_calls += 1;
            match self.init_results.pop_front() {
                Some(true) => Ok(()),
                _ => Err(SensorError::NotFound {
                    sensor: "scripted",
                    found: 0,
                }),
            }
        }

        async fn configure(&mut self, settings: &ImuSettings) -> Result<(), SensorError> {
            self.configured.push(*settings);
            Ok(())
        }

        async fn read(&mut self) -> Result<MotionReading, SensorError> {
            self.readings.pop_front().expect("reading script exhausted")
        }
    }

    fn ax(x: f32) -> MotionReading {
        MotionReading::new(Axes::new(x, 0.0, 0.0), Axes::ZERO)
    }

    const ZERO: MotionReading = MotionReading::ZERO;

    fn started(
        imu: ScriptedImu,
    ) -> (
        ReconnectMonitor<ScriptedImu>,
        RecordingDelay,
        RecordingSink,
    ) {
        let mut delay = RecordingDelay::default();
        let mut sink = RecordingSink::default();
        let monitor = block_on(ReconnectMonitor::start(
            imu,
            ImuNodeConfig::DEFAULT,
            &mut delay,
            &mut sink,
        ))
        .unwrap_or_else(|e| panic!("startup failed: {e}"));
        delay.waits_ms.clear();
        sink.lines.clear();
        (monitor, delay, sink)
    }

    #[test]
    fn test_startup_failure_is_fatal() {
        let imu = ScriptedImu::new(&[false], &[]);
        let mut delay = RecordingDelay::default();
        let mut sink = RecordingSink::default();

        let result = block_on(ReconnectMonitor::start(
            imu,
            ImuNodeConfig::DEFAULT,
            &mut delay,
            &mut sink,
        ));

        assert!(matches!(result, Err(StartupError::SensorNotFound(_))));
        assert_eq!(
            sink.lines,
            [
                Diagnostic::ImuBanner,
                Diagnostic::Initializing,
                Diagnostic::ImuNotFound
            ]
        );
        assert_eq!(delay.waits_ms, [2000]);
    }

    #[test]
    fn test_startup_applies_bringup_settings() {
        let imu = ScriptedImu::new(&[true], &[]);
        let mut delay = RecordingDelay::default();
        let mut sink = RecordingSink::default();

        let monitor = block_on(ReconnectMonitor::start(
            imu,
            ImuNodeConfig::DEFAULT,
            &mut delay,
            &mut sink,
        ))
        .unwrap_or_else(|e| panic!("startup failed: {e}"));

        assert_eq!(monitor.state(), LinkState::Connected);
        assert_eq!(monitor.sensor().configured, [ImuSettings::BRINGUP]);
        assert_eq!(
            sink.lines,
            [
                Diagnostic::ImuBanner,
                Diagnostic::Initializing,
                Diagnostic::ImuFound,
                Diagnostic::BlankLine,
                Diagnostic::ReadingStarted,
            ]
        );
        assert_eq!(delay.waits_ms, [2000, 1000]);
    }

    #[test]
    fn test_good_reading_is_printed_and_paced() {
        let (mut monitor, mut delay, mut sink) =
            started(ScriptedImu::new(&[true], &[ax(0.25)]));

        let outcome = block_on(monitor.poll(&mut delay, &mut sink));

        assert_eq!(outcome, PollOutcome::Reading(ax(0.25)));
        assert_eq!(sink.lines, [Diagnostic::Reading(ax(0.25))]);
        assert_eq!(delay.waits_ms, [500]);
        assert!(!monitor.connection_lost());
    }

    #[test]
    fn test_loss_then_recovery_sequence() {
        // startup ok, first reconnect fails, second succeeds
        let imu = ScriptedImu::new(&[true, false, true], &[ax(1.0), ZERO, ZERO, ax(2.0)]);
        let (mut monitor, mut delay, mut sink) = started(imu);

        let outcomes: Vec<_> = (0..4)
            .map(|_| block_on(monitor.poll(&mut delay, &mut sink)))
            .collect();

        assert_eq!(
            outcomes,
            [
                PollOutcome::Reading(ax(1.0)),
                PollOutcome::Lost {
                    first_detection: true,
                    reconnected: false
                },
                PollOutcome::Lost {
                    first_detection: false,
                    reconnected: true
                },
                PollOutcome::Reading(ax(2.0)),
            ]
        );
        assert_eq!(
            sink.lines,
            [
                Diagnostic::Reading(ax(1.0)),
                Diagnostic::Reading(ZERO),
                Diagnostic::ConnectionLost,
                Diagnostic::Reconnected,
                Diagnostic::Reading(ax(2.0)),
            ]
        );
        assert!(!monitor.connection_lost());
    }

    #[test]
    fn test_loss_is_reported_once_across_failed_retries() {
        // five failed reconnects, the sixth succeeds
        let imu = ScriptedImu::new(
            &[true, false, false, false, false, false, true],
            &[ZERO; 6],
        );
        let (mut monitor, mut delay, mut sink) = started(imu);

        for attempt in 1..=5 {
            block_on(monitor.poll(&mut delay, &mut sink));
            assert!(monitor.connection_lost(), "recovered early at {attempt}");
        }
        assert_eq!(sink.count(&Diagnostic::ConnectionLost), 1);
        assert_eq!(sink.count(&Diagnostic::Reconnected), 0);

        let outcome = block_on(monitor.poll(&mut delay, &mut sink));

        assert_eq!(
            outcome,
            PollOutcome::Lost {
                first_detection: false,
                reconnected: true
            }
        );
        assert!(!monitor.connection_lost());
        assert_eq!(sink.count(&Diagnostic::ConnectionLost), 1);
        assert_eq!(sink.lines.last(), Some(&Diagnostic::Reconnected));
        assert_eq!(monitor.sensor().init_calls, 7);
    }

    #[test]
    fn test_each_attempt_waits_exactly_once() {
        let imu = ScriptedImu::new(&[true, false, false, true], &[ZERO, ZERO, ZERO, ax(3.0)]);
        let (mut monitor, mut delay, mut sink) = started(imu);

        for _ in 0..4 {
            block_on(monitor.poll(&mut delay, &mut sink));
        }

        assert_eq!(delay.waits_ms, [500, 500, 500, 500]);
    }

    #[test]
    fn test_long_outage_prints_one_diagnostic() {
        let imu = ScriptedImu::new(&[true], &[ZERO; 50]);
        let (mut monitor, mut delay, mut sink) = started(imu);

        for _ in 0..50 {
            block_on(monitor.poll(&mut delay, &mut sink));
        }

        assert_eq!(sink.count(&Diagnostic::ConnectionLost), 1);
        assert_eq!(sink.count_matching(|d| matches!(d, Diagnostic::Reading(_))), 1);
        assert_eq!(monitor.state(), LinkState::Lost);
    }

    #[test]
    fn test_nonzero_reading_clears_loss_without_reconnect() {
        let imu = ScriptedImu::new(&[true, false], &[ZERO, ax(-0.5)]);
        let (mut monitor, mut delay, mut sink) = started(imu);

        block_on(monitor.poll(&mut delay, &mut sink));
        assert!(monitor.connection_lost());

        block_on(monitor.poll(&mut delay, &mut sink));

        assert!(!monitor.connection_lost());
        assert_eq!(monitor.sensor().init_calls, 2);
    }

    #[test]
    fn test_read_error_counts_as_zero_reading() {
        let mut imu = ScriptedImu::new(&[true], &[]);
        imu.readings.push_back(Err(BUS_FAULT));
        let (mut monitor, mut delay, mut sink) = started(imu);

        let outcome = block_on(monitor.poll(&mut delay, &mut sink));

        assert_eq!(
            outcome,
            PollOutcome::Lost {
                first_detection: true,
                reconnected: false
            }
        );
        assert_eq!(sink.count(&Diagnostic::Reading(ZERO)), 1);
    }

    #[test]
    fn test_reconnect_reapplies_settings() {
        let imu = ScriptedImu::new(&[true, true], &[ZERO]);
        let (mut monitor, mut delay, mut sink) = started(imu);

        block_on(monitor.poll(&mut delay, &mut sink));

        assert_eq!(
            monitor.into_sensor().configured,
            [ImuSettings::BRINGUP, ImuSettings::BRINGUP]
        );
    }
}

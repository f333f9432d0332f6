//! The windowing controller: decides chunk boundaries, manages carry-over
//! samples and decoding context, and drives the two operating modes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use murmur_audio::SampleSource;
use murmur_stt::{DecodeOptions, Segment, SttEngine, TokenId, STT_SAMPLE_RATE};
use murmur_vad::EnergyVad;

use crate::config::{ConfigError, StreamConfig};
use crate::queue::SentenceQueue;
use crate::signal::StopSignal;
use crate::sink::TranscriptSink;

/// Retry delay between capture polls in fixed-step mode.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Sleep between probes while idle in VAD mode.
const IDLE_INTERVAL: Duration = Duration::from_millis(100);

/// Minimum time between accepted chunks in VAD mode.
const VAD_COOLDOWN: Duration = Duration::from_millis(2000);

/// Probe window duration for voice activity detection.
const VAD_PROBE: Duration = Duration::from_millis(2000);

/// Detection sub-window within the probe, in milliseconds.
const VAD_LAST_MS: u32 = 1000;

/// Mutable state carried across loop iterations of one streaming session.
struct RunState {
    n_iter: usize,
    /// Trailing audio from the previous window, prepended to the next one.
    carry_over: Vec<f32>,
    /// Decoding prompt rebuilt at each boundary reset.
    prompt_tokens: Vec<TokenId>,
    t_start: Instant,
    /// Time of the last accepted chunk (VAD mode cool-down clock).
    t_last: Instant,
}

impl RunState {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            n_iter: 0,
            carry_over: Vec::new(),
            prompt_tokens: Vec::new(),
            t_start: now,
            // start with the cool-down already elapsed so the first probe
            // does not wait
            t_last: now.checked_sub(VAD_COOLDOWN).unwrap_or(now),
        }
    }
}

/// Drives one streaming session: pulls from the capture source, gates via
/// VAD when configured, invokes the engine and hands finalized text to the
/// sink and the sentence queue.
///
/// Single-flow per run: at most one inference call is in flight, enforced by
/// the sequential loop. The stop signal is honored at every suspension point;
/// once observed, no new inference call starts.
pub struct StreamController {
    config: StreamConfig,
    engine: Arc<dyn SttEngine>,
    source: Arc<dyn SampleSource>,
    queue: Arc<SentenceQueue>,
    stop: StopSignal,
}

impl StreamController {
    pub fn new(
        config: StreamConfig,
        engine: Arc<dyn SttEngine>,
        source: Arc<dyn SampleSource>,
        queue: Arc<SentenceQueue>,
        stop: StopSignal,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: config.normalized(),
            engine,
            source,
            queue,
            stop,
        })
    }

    /// Effective (normalized) configuration of this session.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Run with a sink built from the configuration: stdout, plus the
    /// configured output file when one is set.
    pub fn run(&self) -> crate::Result<()> {
        let mut sink = TranscriptSink::stdout();
        if let Some(path) = &self.config.output_path {
            sink.open_output_file(path)
                .map_err(|source| ConfigError::OutputFile {
                    path: path.clone(),
                    source,
                })?;
        }
        self.run_with_sink(&mut sink)
    }

    /// Run the streaming loop until the stop signal is observed or the
    /// engine fails. The sentence queue is closed on the way out either way.
    pub fn run_with_sink(&self, sink: &mut TranscriptSink) -> crate::Result<()> {
        let result = self.run_loop(sink);
        self.queue.close();
        result
    }

    fn run_loop(&self, sink: &mut TranscriptSink) -> crate::Result<()> {
        let use_vad = self.config.use_vad();
        let n_new_line = self.config.n_new_line();

        tracing::info!(
            step_ms = self.config.step_ms,
            window_ms = self.config.window_ms,
            keep_ms = self.config.keep_ms,
            n_threads = self.config.n_threads,
            language = %self.config.language,
            task = if self.config.translate {
                "translate"
            } else {
                "transcribe"
            },
            mode = if use_vad { "vad" } else { "fixed-step" },
            "starting streaming session"
        );
        if !use_vad {
            tracing::info!(
                n_new_line,
                keep_context = self.config.keep_context,
                "fixed-step cadence"
            );
        }

        let vad = EnergyVad::new(self.config.vad_threshold, self.config.freq_cutoff);
        let mut state = RunState::new();

        while !self.stop.is_stopped() {
            if use_vad {
                self.vad_iteration(&vad, &mut state, sink)?;
            } else {
                self.step_iteration(n_new_line, &mut state, sink)?;
            }
        }

        tracing::info!(iterations = state.n_iter, "streaming session stopped");
        Ok(())
    }

    /// One fixed-step iteration: poll a step of new audio, prepend carry-over,
    /// transcribe, emit, and reset at window boundaries.
    fn step_iteration(
        &self,
        n_new_line: usize,
        state: &mut RunState,
        sink: &mut TranscriptSink,
    ) -> crate::Result<()> {
        let Some(new_samples) = self.poll_step() else {
            return Ok(()); // stop observed while polling
        };
        let n_new = new_samples.len();

        // Prepend enough of the previous window to preserve word-boundary
        // context without letting the window grow past keep + window.
        let budget = (self.config.keep_samples() + self.config.window_samples()).saturating_sub(n_new);
        let take = state.carry_over.len().min(budget);

        let mut window = Vec::with_capacity(take + n_new);
        window.extend_from_slice(&state.carry_over[state.carry_over.len() - take..]);
        window.extend_from_slice(&new_samples);

        tracing::debug!(
            take,
            new = n_new,
            carry = state.carry_over.len(),
            "assembled window"
        );

        let options = self.decode_options(false, &state.prompt_tokens);
        let segments = self.engine.transcribe(&window, &options)?;

        for segment in &segments {
            sink.write_segment(segment, !self.config.no_timestamps)?;
        }
        sink.end_chunk()?;

        // The full window is the carry-over basis until the next boundary.
        state.carry_over = window;
        state.n_iter += 1;

        if state.n_iter % n_new_line == 0 {
            self.boundary_reset(state, &segments);
        }
        Ok(())
    }

    /// Poll the capture source until a full step of new audio is available.
    ///
    /// Returns `None` when the stop signal is observed. Accumulating more
    /// than twice the step means the consumer cannot keep up; the buffered
    /// audio is dropped and polling restarts, trading a coverage gap for
    /// bounded latency.
    fn poll_step(&self) -> Option<Vec<f32>> {
        let step_samples = self.config.step_samples();
        let step = Duration::from_millis(self.config.step_ms.max(0) as u64);
        let mut pending: Vec<f32> = Vec::new();

        loop {
            if self.stop.is_stopped() {
                return None;
            }

            let got = self.source.acquire(step);
            pending.extend_from_slice(&got);

            if pending.len() > 2 * step_samples {
                tracing::warn!(
                    buffered = pending.len(),
                    step_samples,
                    "cannot process audio fast enough, dropping buffered audio"
                );
                self.source.clear();
                pending.clear();
                if self.stop.wait_for(POLL_INTERVAL) {
                    return None;
                }
                continue;
            }

            if pending.len() >= step_samples {
                self.source.clear();
                return Some(pending);
            }

            if self.stop.wait_for(POLL_INTERVAL) {
                return None;
            }
        }
    }

    /// Boundary reset: hand the last sentence downstream, shrink carry-over
    /// to the keep window, rebuild the decoding prompt.
    fn boundary_reset(&self, state: &mut RunState, segments: &[Segment]) {
        match segments.last() {
            Some(last) => self.queue.push(last.text.clone()),
            None => tracing::debug!("boundary chunk produced no segments, nothing to enqueue"),
        }

        // Only the trailing keep window survives the boundary.
        let keep = self.config.keep_samples().min(state.carry_over.len());
        let tail_start = state.carry_over.len() - keep;
        state.carry_over = state.carry_over.split_off(tail_start);

        if self.config.keep_context {
            state.prompt_tokens = segments
                .iter()
                .flat_map(|s| s.tokens.iter().copied())
                .collect();
        }
    }

    /// One VAD-gated iteration: throttle while idle, probe for speech, and
    /// transcribe a full window as a single independent utterance.
    fn vad_iteration(
        &self,
        vad: &EnergyVad,
        state: &mut RunState,
        sink: &mut TranscriptSink,
    ) -> crate::Result<()> {
        if state.t_last.elapsed() < VAD_COOLDOWN {
            self.stop.wait_for(IDLE_INTERVAL);
            return Ok(());
        }

        let probe = self.source.acquire(VAD_PROBE);
        if !vad.detect(&probe, STT_SAMPLE_RATE, VAD_LAST_MS) {
            tracing::debug!("no speech detected, waiting");
            self.stop.wait_for(IDLE_INTERVAL);
            return Ok(());
        }

        tracing::debug!("speech detected, pulling transcription window");
        let window = self
            .source
            .acquire(Duration::from_millis(self.config.window_ms.max(0) as u64));
        state.t_last = Instant::now();

        let options = self.decode_options(true, &[]);
        let segments = self.engine.transcribe(&window, &options)?;

        let t1 = state.t_last.duration_since(state.t_start).as_millis() as u64;
        let t0 = t1.saturating_sub((window.len() as u64 * 1000) / STT_SAMPLE_RATE as u64);

        sink.write_line(&format!(
            "### Transcription {} START | t0 = {} ms | t1 = {} ms",
            state.n_iter, t0, t1
        ))?;
        for segment in &segments {
            sink.write_segment(segment, false)?;
        }
        sink.write_line(&format!("### Transcription {} END", state.n_iter))?;
        sink.end_chunk()?;

        state.n_iter += 1;
        Ok(())
    }

    fn decode_options(&self, single_segment: bool, prompt_tokens: &[TokenId]) -> DecodeOptions {
        DecodeOptions {
            language: if self.config.language == "auto" {
                None
            } else {
                Some(self.config.language.clone())
            },
            translate: self.config.translate,
            single_segment,
            max_tokens: self.config.max_tokens,
            prompt_tokens: if self.config.keep_context {
                prompt_tokens.to_vec()
            } else {
                Vec::new()
            },
            n_threads: self.config.n_threads,
            audio_ctx: self.config.audio_ctx,
            diarize: self.config.diarize,
            temperature_fallback: !self.config.no_fallback,
            print_special: self.config.print_special,
            speed_up: self.config.speed_up,
        }
    }
}

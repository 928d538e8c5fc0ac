//! Sound player implementation using rodio.
//!
//! The rodio output stream cannot move between threads, so it lives on a
//! dedicated audio thread. `RodioSoundPlayer` only holds the sending half of
//! a crossbeam channel; `play` queues a request and returns immediately.

use std::fs::File;
use std::io::BufReader;
use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::error::SoundError;
use super::source::{chime, SoundSource};

/// Handle to the audio thread. Dropping the last handle stops the thread.
#[derive(Debug)]
pub struct RodioSoundPlayer {
    requests: Sender<SoundSource>,
}

impl RodioSoundPlayer {
    /// Opens the default audio device and starts the audio thread.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no output device can be
    /// opened, and `SoundError::AudioThread` if the thread cannot start.
    pub fn new() -> Result<Self, SoundError> {
        let (requests, request_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);

        thread::Builder::new()
            .name("focustimer-audio".to_string())
            .spawn(move || audio_thread(ready_tx, request_rx))
            .map_err(|e| SoundError::AudioThread(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|e| SoundError::AudioThread(e.to_string()))??;

        debug!("audio output ready");
        Ok(Self { requests })
    }

    /// Queues `source` for playback.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::AudioThread` if the audio thread has exited.
    pub fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        self.requests
            .send(source.clone())
            .map_err(|_| SoundError::AudioThread("request channel closed".to_string()))
    }
}

/// Runs until every `RodioSoundPlayer` sender is dropped.
fn audio_thread(ready: Sender<Result<(), SoundError>>, requests: Receiver<SoundSource>) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => {
            let _ = ready.send(Ok(()));
            pair
        }
        Err(e) => {
            let _ = ready.send(Err(SoundError::DeviceNotAvailable(e.to_string())));
            return;
        }
    };

    for source in requests.iter() {
        if let Err(e) = play_on(&handle, &source) {
            warn!("サウンド再生に失敗しました ({}): {}", source.name(), e);
        }
    }

    debug!("audio thread exiting");
}

fn play_on(handle: &OutputStreamHandle, source: &SoundSource) -> Result<(), SoundError> {
    let sink = Sink::try_new(handle).map_err(|e| SoundError::Sink(e.to_string()))?;

    match source {
        SoundSource::Chime => sink.append(chime()),
        SoundSource::File { path } => match open_decoder(path) {
            Ok(decoder) => sink.append(decoder),
            Err(e) if e.should_fallback_to_chime() => {
                warn!("{}, falling back to chime", e);
                sink.append(chime());
            }
            Err(e) => return Err(e),
        },
    }

    sink.detach();
    Ok(())
}

fn open_decoder(path: &std::path::Path) -> Result<Decoder<BufReader<File>>, SoundError> {
    let file = File::open(path)
        .map_err(|_| SoundError::FileNotFound(path.to_path_buf()))?;
    Decoder::new(BufReader::new(file)).map_err(|e| SoundError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Opens the audio device, or logs why sound is off and returns `None`.
#[must_use]
pub fn try_create_player() -> Option<RodioSoundPlayer> {
    RodioSoundPlayer::new()
        .map_err(|e| warn!("サウンドを無効にします: {} ({})", e, e.suggestion()))
        .ok()
}

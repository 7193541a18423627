use std::{
    io::Cursor,
    path::Path,
    sync::{
        mpsc::{self, Sender},
        Arc, Mutex,
    },
    thread,
};

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::host::{AlertSound, PlaybackError};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "[audio]";

use crate::log_info;

type PlayReply = mpsc::Sender<Result<(), PlaybackError>>;

enum AudioCommand {
    /// Restart the asset; the thread answers once the sink is playing or has failed.
    PlayFromStart(PlayReply),
}

/// Plays the alert asset on a dedicated audio thread.
///
/// The asset is held in memory and decoded afresh for each play, so every play
/// starts from the beginning and cuts off a play still in progress. A play only
/// counts once the audio thread confirms that output started.
pub struct AlertPlayer {
    asset: Arc<[u8]>,
    volume: f32,
    tx: Mutex<Option<Sender<AudioCommand>>>,
}

impl AlertPlayer {
    /// Loads the asset and checks that rodio can decode it.
    pub fn from_file(path: &Path, volume: f32) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read alert asset {}", path.display()))?;
        Self::from_bytes(bytes, volume)
            .with_context(|| format!("Unsupported alert asset {}", path.display()))
    }

    pub fn from_bytes(bytes: Vec<u8>, volume: f32) -> Result<Self> {
        let asset: Arc<[u8]> = Arc::from(bytes);
        Decoder::new(Cursor::new(asset.clone())).context("Failed to decode alert audio")?;
        Ok(Self {
            asset,
            volume: volume.clamp(0.0, 1.0),
            tx: Mutex::new(None),
        })
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>, PlaybackError> {
        let mut guard = match self.tx.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();
        let asset = Arc::clone(&self.asset);
        let volume = self.volume;

        // rodio output objects are not Send, so they live and die on this thread.
        thread::Builder::new()
            .name("alert-audio".to_string())
            .spawn(move || {
                let mut output: Option<(OutputStream, OutputStreamHandle)> = None;
                let mut sink: Option<Sink> = None;

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::PlayFromStart(reply) => {
                            if let Some(previous) = sink.take() {
                                previous.stop();
                            }
                            let result = match start_play(&mut output, &asset, volume) {
                                Ok(new_sink) => {
                                    sink = Some(new_sink);
                                    Ok(())
                                }
                                Err(err) => {
                                    // The device may have gone away; reopen on the next play.
                                    output = None;
                                    Err(err)
                                }
                            };
                            // The caller may have given up waiting.
                            let _ = reply.send(result);
                        }
                    }
                }
                log_info!("audio thread exiting");
            })
            .map_err(|e| PlaybackError::Output(e.to_string()))?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    fn forget_thread(&self) {
        let mut guard = match self.tx.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }
}

impl AlertSound for AlertPlayer {
    fn play_from_start(&self) -> Result<(), PlaybackError> {
        let tx = self.ensure_thread()?;
        let (reply_tx, reply_rx) = mpsc::channel();
        if tx.send(AudioCommand::PlayFromStart(reply_tx)).is_err() {
            // Thread is gone; the next play starts a fresh one.
            self.forget_thread();
            return Err(PlaybackError::Output("audio thread stopped".into()));
        }
        reply_rx
            .recv()
            .map_err(|_| PlaybackError::Output("audio thread dropped the request".into()))?
    }
}

fn start_play(
    output: &mut Option<(OutputStream, OutputStreamHandle)>,
    asset: &Arc<[u8]>,
    volume: f32,
) -> Result<Sink, PlaybackError> {
    if output.is_none() {
        let opened = OutputStream::try_default()
            .map_err(|e| PlaybackError::Output(format!("no output stream: {e}")))?;
        *output = Some(opened);
    }
    let Some((_, handle)) = output.as_ref() else {
        return Err(PlaybackError::Output("no output stream".into()));
    };

    let sink = Sink::try_new(handle)
        .map_err(|e| PlaybackError::Output(format!("no audio sink: {e}")))?;
    let source = Decoder::new(Cursor::new(Arc::clone(asset)))
        .map_err(|e| PlaybackError::Output(format!("decode failed: {e}")))?;
    sink.set_volume(volume);
    sink.append(source);
    Ok(sink)
}

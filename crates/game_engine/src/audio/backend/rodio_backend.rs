//! Rodio audio backend
//!
//! Pure-Rust playback of WAV, OGG Vorbis, MP3 and FLAC through the default
//! output device.

use std::any::Any;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::{AudioBackend, AudioBackendConfig, SoundHandle};
use crate::audio::AudioError;

struct RodioSound {
    sink: Sink,
    data: Arc<[u8]>,
    looping: bool,
}

/// Rodio-based audio backend
pub struct RodioBackend {
    /// Must outlive every sink
    _output_stream: Option<OutputStream>,
    stream_handle: Option<OutputStreamHandle>,
    active_sounds: HashMap<SoundHandle, RodioSound>,
    next_id: u32,
    initialized: bool,
}

impl RodioBackend {
    /// Create an uninitialized backend
    pub fn new() -> Self {
        Self {
            _output_stream: None,
            stream_handle: None,
            active_sounds: HashMap::new(),
            next_id: 0,
            initialized: false,
        }
    }

    fn next_handle(&mut self) -> SoundHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        SoundHandle::new(id, 0)
    }

    fn start_sink(&self, data: &Arc<[u8]>, looping: bool) -> Result<Sink, AudioError> {
        let stream_handle = self.stream_handle.as_ref().ok_or(AudioError::BackendNotInitialized)?;
        let sink = Sink::try_new(stream_handle)
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to create sink: {e}")))?;
        let source = Decoder::new(Cursor::new(Arc::clone(data)))
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to decode audio: {e}")))?;
        if looping {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }
        Ok(sink)
    }

    fn sound(&self, handle: SoundHandle) -> Result<&RodioSound, AudioError> {
        self.active_sounds.get(&handle).ok_or(AudioError::InvalidHandle)
    }
}

impl AudioBackend for RodioBackend {
    fn name(&self) -> &str {
        "rodio"
    }

    fn initialize(&mut self, _config: &AudioBackendConfig) -> Result<(), AudioError> {
        if self.initialized {
            return Ok(());
        }
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AudioError::BackendInitFailed(format!("Failed to create audio output: {e}")))?;

        self._output_stream = Some(stream);
        self.stream_handle = Some(stream_handle);
        self.initialized = true;
        log::info!("Rodio audio backend initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.stop_all();
        self.stream_handle = None;
        self._output_stream = None;
        self.initialized = false;
        log::info!("Rodio audio backend shutdown");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn update(&mut self) {
        self.active_sounds.retain(|_, sound| !sound.sink.empty());
    }

    fn play_sound(&mut self, data: &[u8], looping: bool) -> Result<SoundHandle, AudioError> {
        let data: Arc<[u8]> = Arc::from(data);
        let sink = self.start_sink(&data, looping)?;
        let handle = self.next_handle();
        self.active_sounds.insert(handle, RodioSound { sink, data, looping });
        Ok(handle)
    }

    fn pause(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        self.sound(handle)?.sink.pause();
        Ok(())
    }

    fn resume(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        self.sound(handle)?.sink.play();
        Ok(())
    }

    fn stop(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        if let Some(sound) = self.active_sounds.remove(&handle) {
            sound.sink.stop();
        }
        Ok(())
    }

    fn stop_all(&mut self) {
        for (_, sound) in self.active_sounds.drain() {
            sound.sink.stop();
        }
    }

    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError> {
        self.sound(handle)?.sink.set_volume(volume.max(0.0));
        Ok(())
    }

    fn get_volume(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        Ok(self.sound(handle)?.sink.volume())
    }

    /// Rodio decides repetition when the source is queued, so switching
    /// restarts the sound from the beginning.
    fn set_looping(&mut self, handle: SoundHandle, looping: bool) -> Result<(), AudioError> {
        let sound = self.sound(handle)?;
        if sound.looping == looping {
            return Ok(());
        }
        let (volume, paused, data) = (sound.sink.volume(), sound.sink.is_paused(), Arc::clone(&sound.data));
        let sink = self.start_sink(&data, looping)?;
        sink.set_volume(volume);
        if paused {
            sink.pause();
        }
        if let Some(old) = self.active_sounds.insert(handle, RodioSound { sink, data, looping }) {
            old.sink.stop();
        }
        Ok(())
    }

    fn is_playing(&self, handle: SoundHandle) -> bool {
        self.active_sounds
            .get(&handle)
            .is_some_and(|sound| !sound.sink.is_paused() && !sound.sink.empty())
    }

    fn active_count(&self) -> usize {
        self.active_sounds.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}

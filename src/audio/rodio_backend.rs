use super::{AudioBackend, SoundBuffer, Voice};
use anyhow::Context;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

pub struct RodioBackend {
    // Dropping the stream silences every sink.
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioBackend {
    pub fn new() -> anyhow::Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("Failed to open default audio output")?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl Voice for Sink {
    fn is_playing(&self) -> bool {
        !self.empty() && !self.is_paused()
    }
}

impl AudioBackend for RodioBackend {
    fn play(&mut self, buffer: &SoundBuffer) -> anyhow::Result<Box<dyn Voice>> {
        let sink = Sink::try_new(&self.handle).context("Failed to create audio sink")?;
        sink.append(Decoder::new(buffer.reader()).context("Failed to decode sound")?);
        sink.play();
        Ok(Box::new(sink))
    }
}

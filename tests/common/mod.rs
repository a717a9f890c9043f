#![allow(dead_code)]

use serial_input::transport::{BaudRate, DeviceRegistry, PortBackend, SerialLink};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::TempDir;

pub enum ReadStep {
    Data(Vec<u8>),
    TimedOut,
    Fail(io::ErrorKind),
}

#[derive(Default)]
pub struct Recorder {
    pub opens: Vec<(PathBuf, u32)>,
    pub writes: Vec<Vec<u8>>,
    pub reads: VecDeque<ReadStep>,
    pub read_calls: usize,
    pub drains: usize,
    pub live_handles: usize,
    pub closed_handles: usize,
    pub write_limit: Option<usize>,
    pub open_error: Option<io::ErrorKind>,
}

/// In-memory backend that records everything done to its links
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<Recorder>>,
}

impl ScriptedBackend {
    pub fn state(&self) -> MutexGuard<'_, Recorder> {
        self.state.lock().unwrap()
    }

    pub fn queue_read(&self, bytes: &[u8]) {
        self.state().reads.push_back(ReadStep::Data(bytes.to_vec()));
    }

    pub fn queue_step(&self, step: ReadStep) {
        self.state().reads.push_back(step);
    }

    pub fn written(&self) -> Vec<u8> {
        self.state().writes.concat()
    }
}

impl PortBackend for ScriptedBackend {
    fn open(&self, path: &Path, baud: BaudRate) -> io::Result<Box<dyn SerialLink>> {
        let mut state = self.state();
        if let Some(kind) = state.open_error {
            return Err(io::Error::new(kind, "scripted open failure"));
        }
        state.opens.push((path.to_path_buf(), baud.bps()));
        state.live_handles += 1;
        Ok(Box::new(ScriptedLink {
            state: Arc::clone(&self.state),
        }))
    }
}

struct ScriptedLink {
    state: Arc<Mutex<Recorder>>,
}

impl SerialLink for ScriptedLink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        let accepted = state.write_limit.map_or(bytes.len(), |limit| limit.min(bytes.len()));
        state.writes.push(bytes[..accepted].to_vec());
        Ok(accepted)
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        state.read_calls += 1;
        match state.reads.pop_front() {
            Some(ReadStep::Data(mut chunk)) => {
                let n = chunk.len().min(buffer.len());
                buffer[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    let rest = chunk.split_off(n);
                    state.reads.push_front(ReadStep::Data(rest));
                }
                Ok(n)
            }
            Some(ReadStep::TimedOut) => Err(io::Error::new(io::ErrorKind::TimedOut, "poll")),
            Some(ReadStep::Fail(kind)) => Err(io::Error::new(kind, "scripted read failure")),
            // an exhausted script would otherwise block forever
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "script exhausted")),
        }
    }

    fn drain(&mut self) -> io::Result<()> {
        self.state.lock().unwrap().drains += 1;
        Ok(())
    }
}

impl Drop for ScriptedLink {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.live_handles -= 1;
            state.closed_handles += 1;
        }
    }
}

/// Directory populated with empty files standing in for device nodes
pub fn dev_dir(names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in names {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }
    dir
}

pub fn registry(names: &[&str]) -> (TempDir, ScriptedBackend, DeviceRegistry) {
    let dir = dev_dir(names);
    let backend = ScriptedBackend::default();
    let registry = DeviceRegistry::new(backend.clone()).with_dev_dir(dir.path());
    (dir, backend, registry)
}

/// Name of the `n`th device with the platform's first prefix, e.g. `ttyACM0`
pub fn device(n: usize) -> String {
    format!("{}{}", serial_input::transport::DEVICE_PREFIXES[0], n)
}

//! In-memory stand-in for the serial port.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct FakePort {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    replies: Arc<Mutex<VecDeque<u8>>>,
}

#[allow(dead_code)]
impl FakePort {
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().unwrap().clone()
    }

    pub fn take_frames(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.frames.lock().unwrap())
    }

    pub fn reply(&self, bytes: &[u8]) {
        self.replies.lock().unwrap().extend(bytes);
    }
}

impl Read for FakePort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
        }
        let n = buf.len().min(replies.len());
        for slot in buf.iter_mut().take(n) {
            *slot = replies.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for FakePort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.frames.lock().unwrap().push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
